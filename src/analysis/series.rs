use crate::models::analytics::{DailyBucket, DailySeries};
use chrono::{Days, NaiveDate};
use std::collections::HashMap;

/// Date key format used by the remote per-day click map.
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Sparse per-day clicks as reported by the server: "YYYY-MM-DD" → count
pub type ClickMap = HashMap<String, u64>;

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Build a zero-filled series of exactly `window_days` calendar days ending at
/// `reference_date` (inclusive), oldest first.
pub fn build_daily_series(raw: &ClickMap, window_days: u32, reference_date: NaiveDate) -> DailySeries {
    if window_days == 0 {
        return Vec::new();
    }

    let by_day = normalize_keys(raw);
    let start = reference_date
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);

    start
        .iter_days()
        .take(window_days as usize)
        .map(|date| DailyBucket {
            date,
            count: by_day.get(&date).copied().unwrap_or(0),
        })
        .collect()
}

/// Clicks recorded on `reference_date`, 0 when the server has no entry.
pub fn today_count(raw: &ClickMap, reference_date: NaiveDate) -> u64 {
    raw.get(&date_key(reference_date)).copied().unwrap_or(0)
}

fn normalize_keys(raw: &ClickMap) -> HashMap<NaiveDate, u64> {
    let mut by_day = HashMap::with_capacity(raw.len());
    for (key, count) in raw {
        match NaiveDate::parse_from_str(key.trim(), DATE_KEY_FORMAT) {
            Ok(date) => *by_day.entry(date).or_insert(0) += *count,
            Err(_) => log::debug!("ignoring unparseable day bucket {key:?}"),
        }
    }
    by_day
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn map(entries: &[(&str, u64)]) -> ClickMap {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn week_window_places_sparse_counts_and_zero_fills() {
        let raw = map(&[("2024-05-01", 3), ("2024-05-03", 5)]);
        let series = build_daily_series(&raw, 7, day(2024, 5, 3));

        assert_eq!(series.len(), 7);
        assert_eq!(series.first().map(|b| b.date), Some(day(2024, 4, 27)));
        assert_eq!(series.last().map(|b| b.date), Some(day(2024, 5, 3)));
        let counts: Vec<u64> = series.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![0, 0, 0, 0, 3, 0, 5]);
    }

    #[test]
    fn empty_map_still_yields_full_window() {
        let series = build_daily_series(&ClickMap::new(), 30, day(2024, 1, 15));
        assert_eq!(series.len(), 30);
        assert!(series.iter().all(|b| b.count == 0));
    }

    #[test]
    fn window_crosses_year_and_leap_day_by_calendar() {
        let series = build_daily_series(&ClickMap::new(), 7, day(2024, 1, 2));
        assert_eq!(series[0].date, day(2023, 12, 27));

        let series = build_daily_series(&ClickMap::new(), 3, day(2024, 3, 1));
        let dates: Vec<NaiveDate> = series.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(2024, 2, 28), day(2024, 2, 29), day(2024, 3, 1)]);
    }

    #[test]
    fn sum_equals_in_window_entries_only() {
        let raw = map(&[
            ("2024-04-20", 100),
            ("2024-04-27", 2),
            ("2024-05-02", 4),
            ("2024-05-04", 50),
            ("garbage", 9),
        ]);
        let series = build_daily_series(&raw, 7, day(2024, 5, 3));
        let total: u64 = series.iter().map(|b| b.count).sum();
        assert_eq!(total, 6);
    }

    #[test]
    fn identical_inputs_give_identical_series() {
        let raw = map(&[("2024-05-01", 3)]);
        let a = build_daily_series(&raw, 30, day(2024, 5, 3));
        let b = build_daily_series(&raw, 30, day(2024, 5, 3));
        assert_eq!(a, b);
    }

    #[test]
    fn today_count_defaults_to_zero() {
        let raw = map(&[("2024-05-03", 5)]);
        assert_eq!(today_count(&raw, day(2024, 5, 3)), 5);
        assert_eq!(today_count(&raw, day(2024, 5, 4)), 0);
    }
}
