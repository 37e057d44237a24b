//! # Codewars Kata Server
//!
//! Serves user profiles and random katas from Codewars, keeping a local
//! Postgres record of everything it has served.
//!
//! Startup order: config, logging, database (migrations then ping), upstream
//! client, kata buffer warm-up, HTTP listener. Ctrl-C or SIGTERM stops new
//! connections; in-flight requests get `SERVER_IDLE_TIMEOUT` seconds to finish.

use anyhow::{Context, Result};
use lib_common::connections::db_postgres::Database;
use lib_common::core::KataBuffer;
use lib_common::markets::codewars::{ApiCallCodewars, CodewarsApi};
use servers::kata_logic::config::{self, EnvFile};
use servers::kata_logic::repository::postgres::MIGRATOR;
use servers::kata_logic::repository::{PgKataRepository, PgUserRepository};
use servers::kata_logic::service::{KataService, UserService};
use servers::kata_logic::state::AppState;
use servers::kata_logic::{logger, routes};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let (config, env_file) = config::load_config().context("invalid configuration")?;
    let _log_guard = logger::setup_logging(&config)?;

    match &env_file {
        EnvFile::Loaded(path) => info!(path = %path.display(), "loaded env file"),
        EnvFile::Missing(path) => info!(path = %path.display(), "env file not found, using environment only"),
        EnvFile::Invalid(path, reason) => warn!(path = %path.display(), %reason, "ignoring unreadable env file"),
    }
    info!(environment = %config.environment, "starting server_kata");

    let db = Database::new(&config.db_dsn, &config.pool_settings())
        .await
        .context("failed to connect to database")?;
    db.migrate(&MIGRATOR).await.context("failed to run migrations")?;
    db.ping().await.context("database ping failed")?;
    info!("database ready");

    let api: Arc<dyn CodewarsApi> = Arc::new(
        ApiCallCodewars::new(&config.codewars_settings()).context("invalid Codewars settings")?,
    );
    let buffer = KataBuffer::start(Arc::clone(&api), config.buffer_settings());

    let katas = KataService::new(
        Arc::new(PgKataRepository::new(db.pool.clone())),
        Arc::clone(&api),
        Arc::clone(&buffer),
    );
    let users = UserService::new(Arc::new(PgUserRepository::new(db.pool.clone())), api);
    let state = AppState::new(katas, users, buffer);
    let app = routes::router(state, config.request_timeout());

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    let (stop_tx, mut stop_rx) = watch::channel(());
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        joined = &mut server => {
            joined.context("server task panicked")?.context("server error")?;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    let _ = stop_tx.send(());
    let grace = config.shutdown_grace();
    match tokio::time::timeout(grace, server).await {
        Ok(Ok(Ok(()))) => info!("shutdown complete"),
        Ok(Ok(Err(e))) => error!(error = %e, "server error during shutdown"),
        Ok(Err(e)) => error!(error = %e, "server task failed during shutdown"),
        Err(_) => warn!(grace_secs = grace.as_secs(), "shutdown grace period elapsed, dropping connections"),
    }

    db.pool.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
        info!("Ctrl-C received, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
                info!("SIGTERM received, initiating shutdown");
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
