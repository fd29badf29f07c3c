use crate::commands::analytics::view_analytics;
use crate::commands::links::{delete_link, delete_link_by_id, list_history, refresh_history, shorten_link};
use crate::commands::settings::{get_settings, save_settings};
use crate::commands::{AppContext, CommandError};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "shortlens", version, about = "Short links with a local history and click analytics")]
pub struct Cli {
    /// Directory holding state.db and settings.json (default: ~/.shortlens)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a short link
    Shorten {
        url: String,
        #[arg(long)]
        alias: Option<String>,
    },
    /// Show the local history
    History {
        /// Refresh click counts from the server first
        #[arg(long)]
        refresh: bool,
    },
    /// Show click analytics for one link
    Analytics { short_code: String },
    /// Remove a link from the history
    Delete {
        short_code: Option<String>,
        #[arg(long, conflicts_with = "short_code")]
        id: Option<String>,
    },
    /// Show settings, or update them with --set key=value
    Settings {
        #[arg(long = "set", value_parser = parse_key_value)]
        set: Vec<(String, Value)>,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got {raw}"))?;
    let value = serde_json::from_str(value).unwrap_or_else(|_| json!(value));
    Ok((key.trim().to_string(), value))
}

pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".shortlens")
}

pub async fn dispatch(cli: Cli) -> Result<Value, CommandError> {
    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);

    // Settings commands work on settings.json alone and never open state.db.
    match cli.command {
        Command::Settings { set } if set.is_empty() => get_settings(&data_dir).await,
        Command::Settings { set } => {
            let update: Map<String, Value> = set.into_iter().collect();
            save_settings(&data_dir, Value::Object(update)).await
        }
        Command::Shorten { url, alias } => {
            let ctx = AppContext::open(&data_dir)?;
            to_json(shorten_link(&ctx, url, alias).await?)
        }
        Command::History { refresh } => {
            let ctx = AppContext::open(&data_dir)?;
            if refresh {
                to_json(refresh_history(&ctx).await?)
            } else {
                to_json(list_history(&ctx).await?)
            }
        }
        Command::Analytics { short_code } => {
            let ctx = AppContext::open(&data_dir)?;
            to_json(view_analytics(&ctx, short_code).await?)
        }
        Command::Delete { short_code, id } => {
            let ctx = AppContext::open(&data_dir)?;
            match id {
                Some(id) => to_json(delete_link_by_id(&ctx, id).await?),
                None => to_json(delete_link(&ctx, short_code.unwrap_or_default()).await?),
            }
        }
    }
}

fn to_json<T: Serialize>(value: T) -> Result<Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Storage(e.to_string()))
}
