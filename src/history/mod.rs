pub mod reconcile;
pub mod store;

pub use reconcile::{refresh_all, refresh_one, RefreshOutcome};
pub use store::{HistoryStore, RecordSlot, StoreError};
