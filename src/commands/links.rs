use crate::commands::context::AppContext;
use crate::commands::error::CommandError;
use crate::commands::validation::{validate_custom_alias, validate_short_code, validate_target_url};
use crate::history::refresh_all;
use crate::models::record::{RefreshSummary, ShortLinkRecord};

/// Create a short link and record it at the top of the history.
pub async fn shorten_link(
    ctx: &AppContext,
    url: String,
    custom_alias: Option<String>,
) -> Result<ShortLinkRecord, CommandError> {
    let target = validate_target_url(&url)?;
    let alias = validate_custom_alias(custom_alias.as_deref())?;

    let created = ctx
        .remote()
        .create_link(&target, alias.as_deref())
        .await
        .map_err(|e| CommandError::from_remote(e, alias.as_deref().unwrap_or_default()))?;

    let record = ShortLinkRecord::new(
        created.short_code.clone(),
        target,
        ctx.remote().short_url(&created.short_code),
        chrono::Utc::now().timestamp(),
        created.expires_at,
    );

    ctx.history().lock().await.insert(record.clone());
    log::info!("created short link {}", record.short_code);
    Ok(record)
}

pub async fn list_history(ctx: &AppContext) -> Result<Vec<ShortLinkRecord>, CommandError> {
    Ok(ctx.history().lock().await.snapshot())
}

/// Refresh every cached count, prune links the server no longer knows, and
/// report one aggregate outcome.
pub async fn refresh_history(ctx: &AppContext) -> Result<RefreshSummary, CommandError> {
    let snapshot = ctx.history().lock().await.snapshot();
    if snapshot.is_empty() {
        return Ok(RefreshSummary {
            records: Vec::new(),
            pruned: Vec::new(),
            failed: Vec::new(),
            message: None,
        });
    }

    let outcome = refresh_all(ctx.remote(), &snapshot).await;

    let records = {
        let mut history = ctx.history().lock().await;
        history.apply_refresh(&outcome);
        history.snapshot()
    };

    let message = match (outcome.failed.len(), outcome.pruned.len()) {
        (0, 0) => None,
        (0, pruned) => Some(format!("{pruned} expired link(s) removed from history")),
        (failed, _) => Some(format!(
            "{failed} of {} link(s) could not be refreshed",
            snapshot.len()
        )),
    };

    Ok(RefreshSummary {
        records,
        pruned: outcome.pruned,
        failed: outcome.failed,
        message,
    })
}

/// Returns whether the code was in the history.
pub async fn delete_link(ctx: &AppContext, short_code: String) -> Result<bool, CommandError> {
    let code = validate_short_code(&short_code)?;
    Ok(ctx.history().lock().await.remove(&code))
}

pub async fn delete_link_by_id(ctx: &AppContext, id: String) -> Result<bool, CommandError> {
    Ok(ctx.history().lock().await.remove_by_id(id.trim()))
}
