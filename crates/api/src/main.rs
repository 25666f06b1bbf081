//! `dscommerce-api`: the shop's HTTP entry point.
//!
//! Reads its settings from the environment, connects to Postgres and serves
//! the catalog, order and token endpoints until SIGINT or SIGTERM. The schema
//! must already be in place; `dsc-cli migrate` applies it.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;

use sentry::integrations::tracing::{self as sentry_tracing, EventFilter};
use sentry_tower::{NewSentryLayer, SentryHttpLayer};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use dscommerce_api::{ApiConfig, AppState, ConfigError, Stores, app, db};

const DEFAULT_LOG_FILTER: &str = "dscommerce_api=info,tower_http=debug";

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
    #[error("listener: {0}")]
    Io(#[from] std::io::Error),
}

/// Start Sentry when `SENTRY_DSN` is set. The guard flushes events on drop.
fn start_error_reporting(config: &ApiConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_deref()?;
    let options = sentry::ClientOptions {
        release: sentry::release_name!(),
        environment: config.sentry_environment.clone().map(Into::into),
        sample_rate: config.sentry_sample_rate,
        traces_sample_rate: config.sentry_traces_sample_rate,
        attach_stacktrace: true,
        ..Default::default()
    };
    Some(sentry::init((dsn, options)))
}

/// Warnings and errors become Sentry events; info and debug ride along as breadcrumbs.
fn sentry_level(metadata: &tracing::Metadata<'_>) -> EventFilter {
    let level = *metadata.level();
    if level <= tracing::Level::WARN {
        EventFilter::Event
    } else if level <= tracing::Level::DEBUG {
        EventFilter::Breadcrumb
    } else {
        EventFilter::Ignore
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_level))
        .init();
}

async fn serve(config: ApiConfig) -> Result<(), StartupError> {
    let pool = db::create_pool(&config.database_url).await?;
    let addr = config.socket_addr();
    let router = app(AppState::new(config, Stores::postgres(pool)))
        .layer(NewSentryLayer::new_from_top())
        .layer(SentryHttpLayer::new().enable_transaction());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "dscommerce api ready");

    axum::serve(listener, router)
        .with_graceful_shutdown(stop_requested())
        .await?;
    tracing::info!("dscommerce api stopped");
    Ok(())
}

/// Resolves on Ctrl+C, or SIGTERM on unix.
async fn stop_requested() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {},
        () = terminate => {},
    }
    tracing::info!("draining in-flight requests");
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ApiConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging();
            tracing::error!(error = %StartupError::from(e), "dscommerce api failed");
            return ExitCode::FAILURE;
        }
    };

    // Sentry has to be up before the tracing layer that feeds it.
    let _sentry = start_error_reporting(&config);
    init_logging();

    match serve(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "dscommerce api failed");
            ExitCode::FAILURE
        }
    }
}
