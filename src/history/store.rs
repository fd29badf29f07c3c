use crate::history::reconcile::RefreshOutcome;
use crate::models::record::{RecordState, ShortLinkRecord, HISTORY_CAP};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("slot unavailable: {0}")]
    Unavailable(String),
}

/// The one durable slot holding the serialized history.
pub trait RecordSlot: Send {
    fn read(&self) -> Result<Option<String>, StoreError>;
    fn write(&self, raw: &str) -> Result<(), StoreError>;
}

/// Bounded, newest-first history of created links backed by a [`RecordSlot`].
///
/// Reads and writes to the slot never fail the caller: a missing or corrupt
/// slot loads as an empty history, and a failed write is logged while the
/// in-memory records keep serving.
pub struct HistoryStore {
    records: Vec<ShortLinkRecord>,
    slot: Box<dyn RecordSlot>,
}

impl HistoryStore {
    pub fn load(slot: Box<dyn RecordSlot>) -> Self {
        let records = match slot.read() {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ShortLinkRecord>>(&raw) {
                Ok(records) => sanitize(records),
                Err(e) => {
                    log::warn!("history slot is corrupt, starting empty: {e}");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                log::warn!("could not read history slot, starting empty: {e}");
                Vec::new()
            }
        };
        Self { records, slot }
    }

    pub fn records(&self) -> &[ShortLinkRecord] {
        &self.records
    }

    pub fn snapshot(&self) -> Vec<ShortLinkRecord> {
        self.records.clone()
    }

    pub fn get(&self, short_code: &str) -> Option<&ShortLinkRecord> {
        self.records.iter().find(|r| r.short_code == short_code)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Prepend `record`, replacing any entry with the same short code, and
    /// evict the oldest entries beyond [`HISTORY_CAP`].
    pub fn insert(&mut self, record: ShortLinkRecord) {
        self.records.retain(|r| r.short_code != record.short_code);
        self.records.insert(0, record);
        self.records.truncate(HISTORY_CAP);
        self.persist();
    }

    /// Returns whether a record was removed. Absent codes are a no-op.
    pub fn remove(&mut self, short_code: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.short_code != short_code);
        self.persist();
        self.records.len() != before
    }

    pub fn remove_by_id(&mut self, id: &str) -> bool {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        self.persist();
        self.records.len() != before
    }

    /// Store a freshly fetched count for one code. Returns whether the code is
    /// still in the history.
    pub fn record_count(&mut self, short_code: &str, visit_count: u64) -> bool {
        let Some(current) = self.records.iter_mut().find(|r| r.short_code == short_code) else {
            return false;
        };
        if current.visit_count != visit_count {
            current.visit_count = visit_count;
            self.persist();
        }
        true
    }

    /// Merge a settled refresh batch into the current records.
    ///
    /// Only `visit_count` is written, and only for codes that reconciled and
    /// are still present. Records deleted while the batch was in flight stay
    /// deleted, and a failed fetch never overwrites a count stored meanwhile.
    pub fn apply_refresh(&mut self, outcome: &RefreshOutcome) {
        let pruned: HashSet<&str> = outcome.pruned.iter().map(String::as_str).collect();
        self.records
            .retain(|r| !pruned.contains(r.short_code.as_str()));

        let reconciled = outcome.records.iter().filter(|fresh| {
            outcome.states.get(&fresh.short_code) == Some(&RecordState::Reconciled)
        });
        for fresh in reconciled {
            if let Some(current) = self
                .records
                .iter_mut()
                .find(|r| r.short_code == fresh.short_code)
            {
                current.visit_count = fresh.visit_count;
            }
        }
        self.persist();
    }

    /// Best-effort write of the full collection. Returns whether it landed.
    pub fn persist(&self) -> bool {
        let raw = match serde_json::to_string(&self.records) {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("could not serialize history: {e}");
                return false;
            }
        };
        match self.slot.write(&raw) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("could not save history, keeping in-memory copy: {e}");
                false
            }
        }
    }
}

fn sanitize(records: Vec<ShortLinkRecord>) -> Vec<ShortLinkRecord> {
    let mut seen = HashSet::new();
    let mut out: Vec<ShortLinkRecord> = records
        .into_iter()
        .filter(|r| seen.insert(r.short_code.clone()))
        .collect();
    out.truncate(HISTORY_CAP);
    out
}
