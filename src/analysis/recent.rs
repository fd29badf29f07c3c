use crate::models::click::{ClickSample, RecentClick, RelativeAge};
use chrono::{DateTime, Utc};

/// Floor the age of `occurred_at` to seconds, minutes, hours or days.
/// Timestamps in the future count as 0 seconds old.
pub fn relative_age(occurred_at: DateTime<Utc>, now: DateTime<Utc>) -> RelativeAge {
    let secs = (now - occurred_at).num_seconds().max(0);
    if secs < 60 {
        RelativeAge::Seconds(secs)
    } else if secs < 3_600 {
        RelativeAge::Minutes(secs / 60)
    } else if secs < 86_400 {
        RelativeAge::Hours(secs / 3_600)
    } else {
        RelativeAge::Days(secs / 86_400)
    }
}

/// Most recent `limit` clicks, newest first, aged against the current time.
pub fn recent_clicks_view(clicks: &[ClickSample], limit: usize) -> Vec<RecentClick> {
    recent_clicks_view_at(clicks, limit, Utc::now())
}

pub fn recent_clicks_view_at(
    clicks: &[ClickSample],
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<RecentClick> {
    let mut sorted: Vec<&ClickSample> = clicks.iter().collect();
    sorted.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));

    sorted
        .into_iter()
        .take(limit)
        .map(|click| {
            let age = relative_age(click.occurred_at, now);
            RecentClick {
                click: click.clone(),
                age,
                label: age.to_string(),
            }
        })
        .collect()
}
