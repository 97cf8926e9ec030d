pub mod config;
pub mod inspect;

use clap::{Parser, Subcommand};

/// sara — quota-aware transcript, article and summary gateway.
#[derive(Debug, Parser)]
#[command(name = "sara", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the HTTP server (default when no subcommand is given).
    Serve,
    /// Print usage, ceiling and next reset for every quota service.
    Quota {
        /// Output JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Result cache utilities.
    #[command(subcommand)]
    Cache(CacheCommand),
    /// Viewing history utilities.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Configuration utilities.
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Print version information.
    Version,
}

#[derive(Debug, Subcommand)]
pub enum CacheCommand {
    /// Print cache statistics as JSON.
    Stats,
    /// Drop every cached entry.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// List entries, most recent first.
    List {
        /// Only show favorites.
        #[arg(long)]
        favorites: bool,
    },
    /// Print the full history record as JSON.
    Export,
    /// Delete the whole history.
    Clear,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Parse the config file and report any errors.
    Validate,
    /// Dump the resolved configuration (with defaults) as TOML.
    Show,
}

// ── Config loading helper ─────────────────────────────────────────────

/// Load the configuration from the path specified by `SARA_CONFIG` (or
/// `config.toml` by default).  Returns the parsed [`Config`] and the
/// path that was used. A missing file yields the defaults.
///
/// [`Config`]: sara_domain::config::Config
pub fn load_config() -> anyhow::Result<(sara_domain::config::Config, String)> {
    let config_path = std::env::var("SARA_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        sara_domain::config::Config::default()
    };

    Ok((config, config_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_subcommand_means_serve() {
        let cli = Cli::try_parse_from(["sara"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from(["sara", "history", "list", "--favorites"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::History(HistoryCommand::List { favorites: true }))
        ));
        let cli = Cli::try_parse_from(["sara", "cache", "clear"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Cache(CacheCommand::Clear))));
    }
}
