use crate::analysis::devices::device_share;
use crate::analysis::recent::recent_clicks_view;
use crate::analysis::series::{build_daily_series, today_count, ClickMap};
use crate::commands::context::AppContext;
use crate::commands::error::CommandError;
use crate::commands::validation::validate_short_code;
use crate::history::refresh_one;
use crate::models::analytics::AnalyticsReport;
use chrono::{Days, Utc};

const MONTH_WINDOW_DAYS: u32 = 30;

/// Load analytics for one link.
///
/// The authoritative count decides the outcome: an unknown code is pruned
/// from the history and reported as [`CommandError::NotFound`], any other
/// failure as a retryable [`CommandError::Network`]. The per-day range and
/// recent clicks are fetched together afterwards and each degrades to empty
/// data on its own.
pub async fn view_analytics(ctx: &AppContext, short_code: String) -> Result<AnalyticsReport, CommandError> {
    let code = validate_short_code(&short_code)?;

    let count = match refresh_one(ctx.remote(), &code).await {
        Ok(count) => count,
        Err(e) if e.is_not_found() => {
            if ctx.history().lock().await.remove(&code) {
                log::info!("pruned {code}: unknown to the remote service");
            }
            return Err(CommandError::NotFound { short_code: code });
        }
        Err(e) => return Err(CommandError::from_remote(e, &code)),
    };

    let cached_url = {
        let mut history = ctx.history().lock().await;
        history.record_count(&code, count.visit_count);
        history.get(&code).map(|r| r.original_url.clone())
    };

    let settings = &ctx.settings;
    let today = Utc::now().date_naive();
    // Range is inclusive at both ends: `detailRangeDays` back plus today.
    let from = today
        .checked_sub_days(Days::new(u64::from(settings.detail_range_days)))
        .unwrap_or(today);

    let (detail, recent) = tokio::join!(
        ctx.remote().detailed_range(&code, from, today),
        ctx.remote().recent_clicks(&code, settings.recent_clicks_limit),
    );

    let (raw, server_mobile, detail_available) = match detail {
        Ok(range) => (range.daily_clicks, Some(range.mobile_percentage), true),
        Err(e) => {
            log::warn!("detailed analytics for {code} unavailable: {e}");
            (ClickMap::new(), None, false)
        }
    };
    let (clicks, recent_available) = match recent {
        Ok(clicks) => (clicks, true),
        Err(e) => {
            log::warn!("recent clicks for {code} unavailable: {e}");
            (Vec::new(), false)
        }
    };

    let daily = build_daily_series(&raw, settings.chart_window_days, today);
    ctx.replace_chart(&code, &daily);

    let original_url = if count.original_url.is_empty() {
        cached_url.unwrap_or_default()
    } else {
        count.original_url
    };

    Ok(AnalyticsReport {
        short_code: code,
        original_url,
        total_clicks: count.visit_count,
        today_clicks: today_count(&raw, today),
        mobile_percent: server_mobile.unwrap_or_else(|| device_share(&clicks)),
        window_days: settings.chart_window_days,
        monthly: build_daily_series(&raw, MONTH_WINDOW_DAYS, today),
        daily,
        recent: recent_clicks_view(&clicks, settings.recent_clicks_limit),
        detail_available,
        recent_available,
    })
}

/// Release the chart of the analytics view. Returns whether one was open.
pub async fn close_analytics(ctx: &AppContext) -> Result<bool, CommandError> {
    Ok(ctx.close_chart())
}
