use async_trait::async_trait;
use chrono::{Days, Duration, NaiveDate, Utc};
use serde_json::json;
use shortlens_lib::commands::analytics::{close_analytics, view_analytics};
use shortlens_lib::commands::context::{ChartHandle, ChartSurface};
use shortlens_lib::commands::db::SqliteSlot;
use shortlens_lib::commands::links::{
    delete_link, delete_link_by_id, list_history, refresh_history, shorten_link,
};
use shortlens_lib::commands::settings::{get_settings, save_settings, ClientSettings};
use shortlens_lib::commands::{AppContext, CommandError};
use shortlens_lib::models::analytics::DailySeries;
use shortlens_lib::models::click::{ClickSample, DeviceClass};
use shortlens_lib::models::record::HISTORY_CAP;
use shortlens_lib::remote::{CreatedLink, DetailedRange, LinkCount, RemoteApi, RemoteError};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone, Copy)]
enum CountReply {
    Visits(u64),
    Gone,
    TimedOut,
    Broken,
    /// Fails after a delay on the first call; later calls see the count.
    SlowFailThen(u64),
}

/// In-process stand-in for the short-link service.
#[derive(Default)]
struct FakeRemote {
    counts: Mutex<HashMap<String, CountReply>>,
    /// (days before `to`, clicks) pairs served by the detailed range.
    daily: Vec<(u64, u64)>,
    mobile_percentage: u32,
    clicks: Vec<ClickSample>,
    detail_down: bool,
    ranges: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    calls: AtomicUsize,
    next_code: AtomicUsize,
}

impl FakeRemote {
    fn set(&self, code: &str, reply: CountReply) {
        self.counts.lock().unwrap().insert(code.to_string(), reply);
    }
}

#[async_trait]
impl RemoteApi for FakeRemote {
    async fn create_link(
        &self,
        _url: &str,
        custom_alias: Option<&str>,
    ) -> Result<CreatedLink, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let code = match custom_alias {
            Some(alias) => alias.to_string(),
            None => format!("c{}", self.next_code.fetch_add(1, Ordering::SeqCst)),
        };
        self.set(&code, CountReply::Visits(0));
        Ok(CreatedLink {
            short_code: code,
            expires_at: Some(1_900_000_000),
        })
    }

    async fn visit_count(&self, short_code: &str) -> Result<LinkCount, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.counts.lock().unwrap().get(short_code).copied();
        if let Some(CountReply::SlowFailThen(n)) = reply {
            self.set(short_code, CountReply::Visits(n));
            tokio::time::sleep(std::time::Duration::from_millis(200)).await;
            return Err(RemoteError::Network("request timed out".into()));
        }
        match reply {
            Some(CountReply::Visits(n)) => Ok(LinkCount {
                short_code: short_code.to_string(),
                original_url: format!("https://example.com/{short_code}"),
                visit_count: n,
            }),
            Some(CountReply::Gone) | None => Err(RemoteError::NotFound),
            Some(CountReply::TimedOut) => {
                tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                Err(RemoteError::Network("request timed out".into()))
            }
            Some(CountReply::Broken) | Some(CountReply::SlowFailThen(_)) => {
                Err(RemoteError::Server {
                    status: 500,
                    message: "internal error".into(),
                })
            }
        }
    }

    async fn detailed_range(
        &self,
        _short_code: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<DetailedRange, RemoteError> {
        self.ranges.lock().unwrap().push((from, to));
        if self.detail_down {
            return Err(RemoteError::Network("connection reset".into()));
        }
        let daily_clicks = self
            .daily
            .iter()
            .filter_map(|&(back, n)| {
                let day = to.checked_sub_days(Days::new(back))?;
                Some((day.format("%Y-%m-%d").to_string(), n))
            })
            .collect();
        Ok(DetailedRange {
            daily_clicks,
            mobile_percentage: self.mobile_percentage,
        })
    }

    async fn recent_clicks(
        &self,
        _short_code: &str,
        _limit: usize,
    ) -> Result<Vec<ClickSample>, RemoteError> {
        Ok(self.clicks.clone())
    }

    fn short_url(&self, short_code: &str) -> String {
        format!("https://sho.rt/s/{short_code}")
    }
}

/// Records create/destroy calls in order.
#[derive(Default)]
struct RecordingSurface {
    events: Mutex<Vec<String>>,
    next: AtomicUsize,
}

impl ChartSurface for RecordingSurface {
    fn create(&self, short_code: &str, series: &DailySeries) -> ChartHandle {
        let id = self.next.fetch_add(1, Ordering::SeqCst) as u64 + 1;
        self.events
            .lock()
            .unwrap()
            .push(format!("create:{id}:{short_code}:{}", series.len()));
        ChartHandle(id)
    }

    fn destroy(&self, handle: ChartHandle) {
        self.events.lock().unwrap().push(format!("destroy:{}", handle.0));
    }
}

fn open_context(dir: &Path, remote: Arc<FakeRemote>, surface: Arc<RecordingSurface>) -> AppContext {
    let slot = SqliteSlot::open(dir).expect("open sqlite slot");
    AppContext::new(ClientSettings::default(), remote, Box::new(slot), surface)
}

fn setup(remote: FakeRemote) -> (TempDir, Arc<FakeRemote>, Arc<RecordingSurface>, AppContext) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let remote = Arc::new(remote);
    let surface = Arc::new(RecordingSurface::default());
    let ctx = open_context(dir.path(), remote.clone(), surface.clone());
    (dir, remote, surface, ctx)
}

fn click(minutes_ago: i64, device_class: DeviceClass) -> ClickSample {
    ClickSample {
        occurred_at: Utc::now() - Duration::minutes(minutes_ago),
        device_class,
        referrer: None,
        origin_ip: Some("203.0.113.7".to_string()),
    }
}

#[tokio::test]
async fn shorten_records_link_first_and_survives_reopen() {
    let (dir, remote, surface, ctx) = setup(FakeRemote::default());

    shorten_link(&ctx, "https://example.com/a".into(), None)
        .await
        .expect("first link");
    let second = shorten_link(&ctx, "https://example.com/b".into(), Some("my-alias".into()))
        .await
        .expect("second link");

    assert_eq!(second.short_code, "my-alias");
    assert_eq!(second.short_url, "https://sho.rt/s/my-alias");
    assert_eq!(second.visit_count, 0);
    assert_eq!(second.expires_at, Some(1_900_000_000));

    drop(ctx);
    let reopened = open_context(dir.path(), remote, surface);
    let history = list_history(&reopened).await.expect("list");
    let codes: Vec<&str> = history.iter().map(|r| r.short_code.as_str()).collect();
    assert_eq!(codes, vec!["my-alias", "c0"]);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_remote_call() {
    let (_dir, remote, _surface, ctx) = setup(FakeRemote::default());

    let err = shorten_link(&ctx, "not a url".into(), None)
        .await
        .expect_err("invalid url");
    assert!(matches!(err, CommandError::Validation(_)));

    let err = shorten_link(&ctx, "https://example.com".into(), Some("a!".into()))
        .await
        .expect_err("invalid alias");
    assert!(matches!(err, CommandError::Validation(_)));

    assert_eq!(remote.calls.load(Ordering::SeqCst), 0);
    assert!(list_history(&ctx).await.expect("list").is_empty());
}

#[tokio::test]
async fn history_never_exceeds_cap() {
    let (_dir, _remote, _surface, ctx) = setup(FakeRemote::default());

    for i in 0..(HISTORY_CAP + 5) {
        shorten_link(&ctx, format!("https://example.com/{i}"), None)
            .await
            .expect("shorten");
    }

    let history = list_history(&ctx).await.expect("list");
    assert_eq!(history.len(), HISTORY_CAP);
    assert_eq!(history[0].short_code, format!("c{}", HISTORY_CAP + 4));
}

#[tokio::test]
async fn refresh_prunes_unknown_links_and_persists_removal() {
    let (dir, remote, surface, ctx) = setup(FakeRemote::default());
    shorten_link(&ctx, "https://example.com/keep".into(), Some("keep".into()))
        .await
        .expect("keep");
    shorten_link(&ctx, "https://example.com/abc".into(), Some("abc".into()))
        .await
        .expect("abc");
    remote.set("abc", CountReply::Gone);
    remote.set("keep", CountReply::Visits(4));

    let summary = refresh_history(&ctx).await.expect("refresh");

    assert_eq!(summary.pruned, vec!["abc".to_string()]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.records.len(), 1);
    assert_eq!(summary.records[0].visit_count, 4);

    drop(ctx);
    let reopened = open_context(dir.path(), remote, surface);
    let history = list_history(&reopened).await.expect("list");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].short_code, "keep");
    assert_eq!(history[0].visit_count, 4);
}

#[tokio::test]
async fn refresh_isolates_a_timed_out_record() {
    let (_dir, remote, _surface, ctx) = setup(FakeRemote::default());
    shorten_link(&ctx, "https://example.com/slow".into(), Some("slow".into()))
        .await
        .expect("slow");
    shorten_link(&ctx, "https://example.com/fast".into(), Some("fast".into()))
        .await
        .expect("fast");
    remote.set("slow", CountReply::TimedOut);
    remote.set("fast", CountReply::Visits(9));

    let summary = refresh_history(&ctx).await.expect("batch never errors");

    let by_code: HashMap<&str, u64> = summary
        .records
        .iter()
        .map(|r| (r.short_code.as_str(), r.visit_count))
        .collect();
    assert_eq!(by_code["fast"], 9);
    assert_eq!(by_code["slow"], 0);
    assert_eq!(summary.failed, vec!["slow".to_string()]);
    assert!(summary.message.is_some());
}

#[tokio::test]
async fn analytics_for_unknown_link_prunes_it() {
    let (_dir, remote, _surface, ctx) = setup(FakeRemote::default());
    shorten_link(&ctx, "https://example.com/x".into(), Some("gone".into()))
        .await
        .expect("shorten");
    remote.set("gone", CountReply::Gone);

    let err = view_analytics(&ctx, "gone".into()).await.expect_err("not found");

    assert_eq!(err, CommandError::NotFound { short_code: "gone".into() });
    assert!(list_history(&ctx).await.expect("list").is_empty());
}

#[tokio::test]
async fn analytics_server_error_is_retryable_and_keeps_record() {
    let (_dir, remote, _surface, ctx) = setup(FakeRemote::default());
    shorten_link(&ctx, "https://example.com/x".into(), Some("flaky".into()))
        .await
        .expect("shorten");
    remote.set("flaky", CountReply::Broken);

    let err = view_analytics(&ctx, "flaky".into()).await.expect_err("server error");

    assert!(err.is_retryable());
    assert_eq!(list_history(&ctx).await.expect("list").len(), 1);
}

#[tokio::test]
async fn analytics_builds_report_and_replaces_chart() {
    // Keyed off the requested `to` date so the test holds across midnight.
    let daily = vec![(0, 5), (2, 3), (60, 40)];
    let clicks: Vec<ClickSample> = (0..15)
        .map(|m| click(m, if m % 2 == 0 { DeviceClass::Mobile } else { DeviceClass::Desktop }))
        .rev()
        .collect();
    let (_dir, remote, surface, ctx) = setup(FakeRemote {
        daily,
        mobile_percentage: 62,
        clicks,
        ..FakeRemote::default()
    });
    shorten_link(&ctx, "https://example.com/x".into(), Some("stats".into()))
        .await
        .expect("shorten");
    remote.set("stats", CountReply::Visits(8));

    let report = view_analytics(&ctx, "stats".into()).await.expect("report");

    let (from, to) = remote.ranges.lock().unwrap()[0];
    assert_eq!(report.daily.last().map(|b| b.date), Some(to));
    assert_eq!(to - from, Duration::days(30));

    assert_eq!(report.total_clicks, 8);
    assert_eq!(report.today_clicks, 5);
    assert_eq!(report.mobile_percent, 62);
    assert_eq!(report.daily.len(), 7);
    assert_eq!(report.daily.last().map(|b| b.count), Some(5));
    assert_eq!(report.daily[4].count, 3);
    assert_eq!(report.monthly.len(), 30);
    assert_eq!(report.monthly.iter().map(|b| b.count).sum::<u64>(), 8);
    assert_eq!(report.recent.len(), 10);
    assert!(report
        .recent
        .windows(2)
        .all(|w| w[0].click.occurred_at >= w[1].click.occurred_at));
    assert!(report.detail_available && report.recent_available);

    let history = list_history(&ctx).await.expect("list");
    assert_eq!(history[0].visit_count, 8);

    view_analytics(&ctx, "stats".into()).await.expect("second open");
    assert!(close_analytics(&ctx).await.expect("close"));
    assert!(!close_analytics(&ctx).await.expect("close again"));

    let events = surface.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "create:1:stats:7".to_string(),
            "destroy:1".to_string(),
            "create:2:stats:7".to_string(),
            "destroy:2".to_string(),
        ]
    );
}

#[tokio::test]
async fn failed_refresh_does_not_overwrite_count_from_concurrent_view() {
    let (_dir, remote, _surface, ctx) = setup(FakeRemote::default());
    shorten_link(&ctx, "https://example.com/abc".into(), Some("abc".into()))
        .await
        .expect("shorten");
    remote.set("abc", CountReply::SlowFailThen(42));

    let (summary, report) = tokio::join!(refresh_history(&ctx), async {
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        view_analytics(&ctx, "abc".into()).await
    });

    let summary = summary.expect("batch never errors");
    let report = report.expect("report");
    assert_eq!(summary.failed, vec!["abc".to_string()]);
    assert_eq!(report.total_clicks, 42);

    let history = list_history(&ctx).await.expect("list");
    assert_eq!(history[0].visit_count, 42);
}

#[tokio::test]
async fn analytics_degrades_when_detailed_range_fails() {
    let clicks = vec![
        click(1, DeviceClass::Mobile),
        click(2, DeviceClass::Mobile),
        click(3, DeviceClass::Mobile),
        click(4, DeviceClass::Tablet),
    ];
    let (_dir, remote, _surface, ctx) = setup(FakeRemote {
        clicks,
        detail_down: true,
        ..FakeRemote::default()
    });
    remote.set("partial", CountReply::Visits(4));

    let report = view_analytics(&ctx, "partial".into()).await.expect("report");

    assert!(!report.detail_available);
    assert_eq!(report.today_clicks, 0);
    assert!(report.daily.iter().all(|b| b.count == 0));
    assert_eq!(report.mobile_percent, 75);
    assert_eq!(report.recent[0].label, "1m ago");
}

#[tokio::test]
async fn delete_commands_remove_exactly_one_record() {
    let (_dir, _remote, _surface, ctx) = setup(FakeRemote::default());
    let first = shorten_link(&ctx, "https://example.com/1".into(), None)
        .await
        .expect("first");
    shorten_link(&ctx, "https://example.com/2".into(), None)
        .await
        .expect("second");
    shorten_link(&ctx, "https://example.com/3".into(), None)
        .await
        .expect("third");

    assert!(delete_link(&ctx, "c1".into()).await.expect("delete by code"));
    assert!(!delete_link(&ctx, "missing".into()).await.expect("absent is a no-op"));
    assert!(delete_link_by_id(&ctx, first.id.clone()).await.expect("delete by id"));

    let history = list_history(&ctx).await.expect("list");
    let codes: Vec<&str> = history.iter().map(|r| r.short_code.as_str()).collect();
    assert_eq!(codes, vec!["c2"]);

    let err = delete_link(&ctx, "  ".into()).await.expect_err("blank code");
    assert!(matches!(err, CommandError::Validation(_)));
}

#[tokio::test]
async fn settings_commands_round_trip_and_merge_partial_updates() {
    let dir = tempfile::tempdir().expect("create temp dir");

    let initial = get_settings(dir.path()).await.expect("load settings");
    assert_eq!(initial["chartWindowDays"], json!(7));

    let saved = save_settings(
        dir.path(),
        json!({
            "chartWindowDays": 30,
            "apiBaseUrl": "https://sho.rt/"
        }),
    )
    .await
    .expect("save settings");

    assert_eq!(saved["chartWindowDays"], json!(30));
    assert_eq!(saved["apiBaseUrl"], json!("https://sho.rt"));
    assert_eq!(saved["recentClicksLimit"], initial["recentClicksLimit"]);

    let ctx = AppContext::open(dir.path()).expect("open context");
    assert_eq!(ctx.settings.chart_window_days, 30);
    assert_eq!(ctx.settings.api_base_url, "https://sho.rt");
}
