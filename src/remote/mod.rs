pub mod dto;
pub mod error;
pub mod http;

use crate::models::click::ClickSample;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

pub use error::{FailureKind, RemoteError};
pub use http::HttpRemote;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedLink {
    pub short_code: String,
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCount {
    pub short_code: String,
    pub original_url: String,
    pub visit_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailedRange {
    pub daily_clicks: HashMap<String, u64>,
    pub mobile_percentage: u32,
}

/// The short-link service as consumed by this client.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    async fn create_link(
        &self,
        url: &str,
        custom_alias: Option<&str>,
    ) -> Result<CreatedLink, RemoteError>;

    async fn visit_count(&self, short_code: &str) -> Result<LinkCount, RemoteError>;

    async fn detailed_range(
        &self,
        short_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DetailedRange, RemoteError>;

    async fn recent_clicks(
        &self,
        short_code: &str,
        limit: usize,
    ) -> Result<Vec<ClickSample>, RemoteError>;

    /// Public URL a short code redirects from.
    fn short_url(&self, short_code: &str) -> String;
}
