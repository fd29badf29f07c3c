use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
}

impl DeviceClass {
    /// Unknown or missing labels count as desktop.
    pub fn from_label(label: Option<&str>) -> Self {
        match label.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("mobile") => Self::Mobile,
            Some("tablet") => Self::Tablet,
            _ => Self::Desktop,
        }
    }
}

/// One click event as reported by the remote service. Never persisted locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickSample {
    pub occurred_at: DateTime<Utc>,
    pub device_class: DeviceClass,
    pub referrer: Option<String>,
    pub origin_ip: Option<String>,
}

/// Age of a click, floored to the largest unit that fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum RelativeAge {
    Seconds(i64),
    Minutes(i64),
    Hours(i64),
    Days(i64),
}

impl std::fmt::Display for RelativeAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seconds(n) => write!(f, "{n}s ago"),
            Self::Minutes(n) => write!(f, "{n}m ago"),
            Self::Hours(n) => write!(f, "{n}h ago"),
            Self::Days(n) => write!(f, "{n}d ago"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentClick {
    pub click: ClickSample,
    pub age: RelativeAge,
    pub label: String,
}
