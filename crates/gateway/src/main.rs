use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use clap::Parser;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use sara_domain::config::{Config, CorsConfig, ObservabilityConfig};
use sara_gateway::api;
use sara_gateway::bootstrap;
use sara_gateway::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        // Default to serve when no subcommand is given.
        None | Some(Command::Serve) => {
            let (config, _config_path) = cli::load_config()?;
            init_tracing(&config.observability);
            run_server(Arc::new(config)).await
        }
        Some(Command::Quota { json }) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let stores = bootstrap::open_stores(&config)?;
            println!("{}", cli::inspect::quota(&stores, json)?);
            Ok(())
        }
        Some(Command::Cache(cmd)) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let stores = bootstrap::open_stores(&config)?;
            println!("{}", cli::inspect::cache(&stores, &cmd)?);
            Ok(())
        }
        Some(Command::History(cmd)) => {
            init_cli_tracing();
            let (config, _) = cli::load_config()?;
            let stores = bootstrap::open_stores(&config)?;
            println!("{}", cli::inspect::history(&stores, &cmd)?);
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Validate)) => {
            let (config, config_path) = cli::load_config()?;
            let (report, valid) = cli::config::validation_report(&config, &config_path);
            print!("{report}");
            if !valid {
                std::process::exit(1);
            }
            Ok(())
        }
        Some(Command::Config(ConfigCommand::Show)) => {
            let (config, _config_path) = cli::load_config()?;
            print!("{}", cli::config::show(&config)?);
            Ok(())
        }
        Some(Command::Version) => {
            println!("sara {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Initialize tracing for the `serve` command.
///
/// `RUST_LOG` wins over `observability.log_filter` when set.
fn init_tracing(obs: &ObservabilityConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&obs.log_filter));

    let registry = tracing_subscriber::registry().with(env_filter);
    if obs.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }
}

/// Initialize compact stderr-only tracing for CLI one-shot commands.
///
/// Defaults to `warn` level so diagnostic output does not pollute stdout.
fn init_cli_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

/// Start the HTTP server with the given configuration.
async fn run_server(config: Arc<Config>) -> anyhow::Result<()> {
    tracing::info!("sara starting");

    let state = bootstrap::build_app_state(config.clone())?;

    // ── CORS layer (config-aware) ────────────────────────────────────
    let cors_layer = build_cors_layer(&config.server.cors);

    // ── Concurrency limit (backpressure protection) ────────────────
    let max_concurrent = config.server.max_concurrent_requests;
    tracing::info!(max_concurrent, "concurrency limit set");

    let app = api::router()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_concurrent))
        .with_state(state);

    // ── Bind ─────────────────────────────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;

    tracing::info!(addr = %addr, "sara listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("axum server error")?;

    tracing::info!("shutdown complete");
    Ok(())
}

/// Wait for SIGINT or SIGTERM, then return to trigger graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    {
        let sigterm = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut sig) => {
                    sig.recv().await;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to register SIGTERM handler");
                    std::future::pending::<()>().await;
                }
            }
        };

        tokio::select! {
            _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
            _ = sigterm => tracing::info!("received SIGTERM, shutting down"),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await;
        tracing::info!("received SIGINT, shutting down");
    }
}

/// Build a [`CorsLayer`] that admits the configured origins.
fn build_cors_layer(cors: &CorsConfig) -> CorsLayer {
    let rules: Vec<OriginRule> = cors
        .allowed_origins
        .iter()
        .filter_map(|o| OriginRule::parse(o))
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .is_ok_and(|origin| rules.iter().any(|rule| rule.matches(origin)))
        }))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
}

/// One `server.cors.allowed_origins` entry: an exact origin, or
/// `scheme://host:*` for any port on that host.
#[derive(Debug, PartialEq)]
enum OriginRule {
    Exact(String),
    AnyPort(String),
}

impl OriginRule {
    fn parse(origin: &str) -> Option<Self> {
        if origin == "*" {
            tracing::warn!("CORS origin \"*\" is not supported, ignoring");
            return None;
        }
        Some(match origin.strip_suffix(":*") {
            Some(host) => Self::AnyPort(format!("{host}:")),
            None => Self::Exact(origin.to_owned()),
        })
    }

    fn matches(&self, origin: &str) -> bool {
        match self {
            Self::Exact(exact) => exact == origin,
            Self::AnyPort(prefix) => origin
                .strip_prefix(prefix.as_str())
                .is_some_and(|port| !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit())),
        }
    }
}
