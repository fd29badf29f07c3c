use crate::commands::error::CommandError;
use url::Url;

pub const MAX_URL_LEN: usize = 2048;

/// Accept only absolute http(s) URLs with a host.
pub fn validate_target_url(raw: &str) -> Result<String, CommandError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Validation("url cannot be empty".to_string()));
    }
    if trimmed.len() > MAX_URL_LEN {
        return Err(CommandError::Validation(format!(
            "url is too long (max {MAX_URL_LEN} characters)"
        )));
    }
    let parsed = Url::parse(trimmed)
        .map_err(|e| CommandError::Validation(format!("not a valid url: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(CommandError::Validation(format!(
                "url must use http or https, got {other}"
            )))
        }
    }
    if parsed.host().is_none() {
        return Err(CommandError::Validation("url must have a host".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Blank aliases mean "let the server pick".
pub fn validate_custom_alias(raw: Option<&str>) -> Result<Option<String>, CommandError> {
    let Some(alias) = raw.map(str::trim).filter(|a| !a.is_empty()) else {
        return Ok(None);
    };
    let len = alias.chars().count();
    if !(3..=50).contains(&len) {
        return Err(CommandError::Validation(format!(
            "custom alias must be between 3 and 50 characters, got {len}"
        )));
    }
    if !alias
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(CommandError::Validation(
            "custom alias can only contain letters, numbers, dashes and underscores".to_string(),
        ));
    }
    Ok(Some(alias.to_string()))
}

pub fn validate_short_code(raw: &str) -> Result<String, CommandError> {
    let code = raw.trim();
    if code.is_empty() {
        return Err(CommandError::Validation("short code cannot be empty".to_string()));
    }
    Ok(code.to_string())
}
