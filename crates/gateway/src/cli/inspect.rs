//! One-shot commands that read or reset the durable stores directly.
//!
//! Each command renders to a `String` so the output is testable; `main`
//! only prints it.

use sara_quota::QuotaInfo;

use crate::bootstrap::Stores;
use crate::cli::{CacheCommand, HistoryCommand};

/// `sara quota`
pub fn quota(stores: &Stores, json: bool) -> anyhow::Result<String> {
    let quotas = stores.quota.snapshot();
    if json {
        return Ok(serde_json::to_string_pretty(&quotas)?);
    }
    Ok(quota_table(&quotas))
}

fn quota_table(quotas: &[QuotaInfo]) -> String {
    let mut out = format!(
        "{:<12} {:>8} {:>8} {:>10}  {}\n",
        "SERVICE", "USED", "CEILING", "REMAINING", "RESETS AT (UTC)"
    );
    for q in quotas {
        out.push_str(&format!(
            "{:<12} {:>8} {:>8} {:>10}  {}\n",
            q.service,
            q.used,
            q.ceiling,
            q.remaining,
            q.reset_at.format("%Y-%m-%d %H:%M:%S"),
        ));
    }
    out
}

/// `sara cache ...`
pub fn cache(stores: &Stores, cmd: &CacheCommand) -> anyhow::Result<String> {
    match cmd {
        CacheCommand::Stats => Ok(serde_json::to_string_pretty(&stores.cache.stats())?),
        CacheCommand::Clear => {
            stores.cache.clear()?;
            Ok("cache cleared".into())
        }
    }
}

/// `sara history ...`
pub fn history(stores: &Stores, cmd: &HistoryCommand) -> anyhow::Result<String> {
    match cmd {
        HistoryCommand::List { favorites } => {
            let entries = if *favorites {
                stores.history.favorites()
            } else {
                stores.history.entries()
            };
            if entries.is_empty() {
                return Ok("history is empty".into());
            }
            Ok(entries
                .iter()
                .map(|e| {
                    format!(
                        "{} {} {:>3}% {}  {}",
                        if e.favorite { "★" } else { " " },
                        e.video_id,
                        e.reading_progress,
                        e.viewed_at.format("%Y-%m-%d %H:%M"),
                        e.title,
                    )
                })
                .collect::<Vec<_>>()
                .join("\n"))
        }
        HistoryCommand::Export => Ok(stores.history.export_history()?),
        HistoryCommand::Clear => {
            stores.history.clear_history()?;
            Ok("history cleared".into())
        }
    }
}
