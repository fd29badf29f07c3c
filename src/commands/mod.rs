pub mod analytics;
pub mod context;
pub mod db;
pub mod error;
pub mod links;
pub mod settings;
pub mod validation;

pub use context::AppContext;
pub use error::CommandError;
