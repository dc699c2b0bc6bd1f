//! rewire-server — process entry point. Reads config from the
//! environment (§6), opens the SQLite store, spawns the CheckerLoop
//! alongside the HTTP listener, and shuts down cooperatively on SIGINT.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use rewire_core::checker::CheckerLoop;
use rewire_core::clock::SystemClock;
use rewire_server::config::Config;
use rewire_server::middleware::auth::AdminToken;
use rewire_server::router::build_router;
use rewire_server::state::AppState;
use rewire_store::SqliteStore;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,rewire_server=debug".into()),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("fatal init failure: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    let store = Arc::new(SqliteStore::connect(&config.db_path).await?);
    let clock = Arc::new(SystemClock);
    let notifier = rewire_notify::build_notifier(
        &config.notify,
        Duration::from_secs((config.check_every_s / 2).max(1)),
    )?;

    let shutdown = CancellationToken::new();

    let checker = CheckerLoop::new(
        Arc::clone(&store),
        Arc::clone(&notifier),
        Arc::clone(&clock),
        config.check_every_s,
        config.renotify_after_s,
        config.base_url.clone(),
    );
    let checker_shutdown = shutdown.clone();
    let checker_task = tokio::spawn(async move { checker.run(checker_shutdown).await });

    let state = AppState {
        store: store as Arc<dyn rewire_core::ports::Store>,
        clock: clock as Arc<dyn rewire_core::clock::Clock>,
    };
    let app = build_router(state, AdminToken(config.admin_token.clone()));

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("rewire-server listening on {bind_addr}");

    let serve_shutdown = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("received shutdown signal");
            serve_shutdown.cancel();
        })
        .await?;

    shutdown.cancel();
    let _ = checker_task.await;
    Ok(())
}
