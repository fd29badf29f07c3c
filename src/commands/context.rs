use crate::commands::db::{self, SqliteSlot};
use crate::commands::error::CommandError;
use crate::commands::settings::{load_client_settings, ClientSettings};
use crate::history::{HistoryStore, RecordSlot};
use crate::models::analytics::DailySeries;
use crate::remote::{HttpRemote, RemoteApi};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChartHandle(pub u64);

/// Rendering side of the analytics chart, supplied by the front end.
pub trait ChartSurface: Send + Sync {
    fn create(&self, short_code: &str, series: &DailySeries) -> ChartHandle;
    fn destroy(&self, handle: ChartHandle);
}

/// Surface for headless use; only hands out handles.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    next: AtomicU64,
}

impl ChartSurface for HeadlessSurface {
    fn create(&self, _short_code: &str, _series: &DailySeries) -> ChartHandle {
        ChartHandle(self.next.fetch_add(1, Ordering::Relaxed) + 1)
    }

    fn destroy(&self, _handle: ChartHandle) {}
}

/// Everything a command needs, owned by the caller and passed explicitly.
pub struct AppContext {
    pub settings: ClientSettings,
    remote: Arc<dyn RemoteApi>,
    history: tokio::sync::Mutex<HistoryStore>,
    surface: Arc<dyn ChartSurface>,
    chart: Mutex<Option<ChartHandle>>,
}

impl AppContext {
    pub fn new(
        settings: ClientSettings,
        remote: Arc<dyn RemoteApi>,
        slot: Box<dyn RecordSlot>,
        surface: Arc<dyn ChartSurface>,
    ) -> Self {
        Self {
            settings,
            remote,
            history: tokio::sync::Mutex::new(HistoryStore::load(slot)),
            surface,
            chart: Mutex::new(None),
        }
    }

    /// Open the client state under `data_dir`: settings file, SQLite slot and
    /// an HTTP remote. An unusable database falls back to an in-memory slot.
    pub fn open(data_dir: &Path) -> Result<Self, CommandError> {
        let settings = load_client_settings(data_dir);
        let remote = HttpRemote::new(&settings.api_base_url, settings.request_timeout)
            .map_err(|e| CommandError::Validation(e.to_string()))?;

        let slot = match SqliteSlot::open(data_dir) {
            Ok(slot) => slot,
            Err(e) => {
                log::warn!("history database unavailable, history will not survive restart: {e}");
                let conn = rusqlite::Connection::open_in_memory()
                    .and_then(|conn| db::initialize_schema(&conn).map(|_| conn))
                    .map_err(|e| CommandError::Storage(e.to_string()))?;
                SqliteSlot::new(conn, db::HISTORY_SLOT)
            }
        };

        Ok(Self::new(
            settings,
            Arc::new(remote),
            Box::new(slot),
            Arc::new(HeadlessSurface::default()),
        ))
    }

    pub fn with_surface(mut self, surface: Arc<dyn ChartSurface>) -> Self {
        self.surface = surface;
        self
    }

    pub fn remote(&self) -> &dyn RemoteApi {
        self.remote.as_ref()
    }

    pub fn history(&self) -> &tokio::sync::Mutex<HistoryStore> {
        &self.history
    }

    /// Destroy the live chart, if any, then create the next one.
    pub(crate) fn replace_chart(&self, short_code: &str, series: &DailySeries) -> ChartHandle {
        let mut chart = self.chart.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = chart.take() {
            self.surface.destroy(previous);
        }
        let handle = self.surface.create(short_code, series);
        *chart = Some(handle);
        handle
    }

    /// Returns whether a chart was live.
    pub(crate) fn close_chart(&self) -> bool {
        let mut chart = self.chart.lock().unwrap_or_else(|e| e.into_inner());
        match chart.take() {
            Some(handle) => {
                self.surface.destroy(handle);
                true
            }
            None => false,
        }
    }
}
