//! Wire shapes of the short-link service.

use crate::models::click::{ClickSample, DeviceClass};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Serialize)]
pub struct ShortenRequest<'a> {
    pub url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct ShortenResponse {
    pub short: String,
    #[serde(default)]
    pub expires: i64,
}

#[derive(Debug, Deserialize)]
pub struct AnalyticsResponse {
    pub short: String,
    #[serde(default)]
    pub original: String,
    #[serde(default)]
    pub visit_count: u64,
}

#[derive(Debug, Deserialize)]
pub struct DetailedAnalyticsResponse {
    #[serde(default)]
    pub daily_clicks: HashMap<String, u64>,
    #[serde(default)]
    pub mobile_percentage: u32,
}

#[derive(Debug, Deserialize)]
pub struct RecentClicksResponse {
    #[serde(default)]
    pub clicks: Vec<ClickData>,
}

#[derive(Debug, Deserialize)]
pub struct ClickData {
    pub occurred_at: String,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub referrer: Option<String>,
    #[serde(default)]
    pub device: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: String,
}

impl ClickData {
    /// `None` when the timestamp is not RFC 3339.
    pub fn into_sample(self) -> Option<ClickSample> {
        let occurred_at = DateTime::parse_from_rfc3339(&self.occurred_at)
            .ok()?
            .with_timezone(&Utc);
        Some(ClickSample {
            occurred_at,
            device_class: DeviceClass::from_label(self.device.as_deref()),
            referrer: non_empty(self.referrer),
            origin_ip: non_empty(self.ip),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}
