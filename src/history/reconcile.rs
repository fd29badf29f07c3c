use crate::models::record::{RecordState, ShortLinkRecord};
use crate::remote::{LinkCount, RemoteApi, RemoteError};
use futures::future::join_all;
use std::collections::HashMap;

/// Result of one settled refresh batch.
#[derive(Debug, Clone, Default)]
pub struct RefreshOutcome {
    /// Input records minus the pruned ones, with fresh counts where the query succeeded.
    pub records: Vec<ShortLinkRecord>,
    /// Codes the remote no longer recognizes.
    pub pruned: Vec<String>,
    /// Codes whose query failed for any other reason; their counts are unchanged.
    pub failed: Vec<String>,
    pub states: HashMap<String, RecordState>,
}

impl RefreshOutcome {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl RecordState {
    /// Transition out of `Refreshing` once the remote query has settled.
    pub fn settle<T>(self, result: &Result<T, RemoteError>) -> RecordState {
        match (self, result) {
            (RecordState::Refreshing, Ok(_)) => RecordState::Reconciled,
            (RecordState::Refreshing, Err(e)) if e.is_not_found() => RecordState::StalePruned,
            (RecordState::Refreshing, Err(_)) => RecordState::Cached,
            (state, _) => state,
        }
    }
}

/// Query every record's count concurrently and wait for all of them to settle.
///
/// One record's failure never cancels or delays another's query; the batch
/// itself never fails.
pub async fn refresh_all(remote: &dyn RemoteApi, records: &[ShortLinkRecord]) -> RefreshOutcome {
    let queries = records.iter().map(|record| async move {
        let result = remote.visit_count(&record.short_code).await;
        (record, result)
    });
    let settled = join_all(queries).await;

    let mut outcome = RefreshOutcome {
        records: Vec::with_capacity(records.len()),
        ..RefreshOutcome::default()
    };

    for (record, result) in settled {
        let state = RecordState::Refreshing.settle(&result);
        outcome.states.insert(record.short_code.clone(), state);

        match (state, result) {
            (RecordState::Reconciled, Ok(count)) => {
                let mut updated = record.clone();
                updated.visit_count = count.visit_count;
                outcome.records.push(updated);
            }
            (RecordState::StalePruned, _) => {
                log::info!("pruning {}: unknown to the remote service", record.short_code);
                outcome.pruned.push(record.short_code.clone());
            }
            (_, Err(e)) => {
                log::warn!("could not refresh {}: {e}", record.short_code);
                outcome.failed.push(record.short_code.clone());
                outcome.records.push(record.clone());
            }
            (_, Ok(_)) => outcome.records.push(record.clone()),
        }
    }

    outcome
}

/// Single-record refresh for an explicit analytics request. The caller
/// branches on [`RemoteError::is_not_found`] to prune.
pub async fn refresh_one(remote: &dyn RemoteApi, short_code: &str) -> Result<LinkCount, RemoteError> {
    let result = remote.visit_count(short_code).await;
    if let Err(e) = &result {
        log::debug!("refresh of {short_code} failed: {e}");
    }
    result
}
