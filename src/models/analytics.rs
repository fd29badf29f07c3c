use crate::models::click::RecentClick;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyBucket {
    pub date: NaiveDate,
    pub count: u64,
}

/// Fixed-length, zero-filled per-day series, oldest day first.
pub type DailySeries = Vec<DailyBucket>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub short_code: String,
    pub original_url: String,
    pub total_clicks: u64,
    pub today_clicks: u64,
    pub mobile_percent: u32,
    pub window_days: u32,
    pub daily: DailySeries,
    pub monthly: DailySeries,
    pub recent: Vec<RecentClick>,
    pub detail_available: bool,
    pub recent_available: bool,
}
