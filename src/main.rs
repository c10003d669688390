//! Quiz Rally Back binary entrypoint wiring REST, WebSocket, and storage layers.

use std::{env, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tokio::time::interval;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quiz_rally_back::{
    config::AppConfig,
    dao::{memory::MemoryStore, question_bank::StaticQuestionBank},
    routes,
    services::{game_service, lobby_service},
    state::{AppState, SharedState},
};

/// Environment variable pointing at the question set JSON file.
const QUESTIONS_PATH_ENV: &str = "QUIZ_RALLY_BACK_QUESTIONS_PATH";
/// Default question set file location.
const DEFAULT_QUESTIONS_PATH: &str = "config/questions.json";

/// How often the background sweeper looks for expired lobbies and stale
/// sessions.
const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = AppConfig::load();
    let question_bank = load_question_bank()?;
    let app_state = AppState::new(config, question_bank);

    // The in-process store keeps the engine self-contained; a database-backed
    // implementation can be installed here instead without touching services.
    app_state.install_store(Arc::new(MemoryStore::new())).await;

    tokio::spawn(run_sweeper(app_state.clone()));
    tokio::spawn(watch_degraded(app_state.clone()));
    let app = build_router(app_state);

    let port = env::var("PORT")
        .or_else(|_| env::var("SERVER_PORT"))
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "starting server");

    let listener = TcpListener::bind(addr).await.context("binding server")?;
    let service = app.into_make_service();
    axum::serve(listener, service)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving axum")?;

    Ok(())
}

/// Load the static question bank from disk; an absent file yields an empty
/// bank so the server can still run its lobby surface.
fn load_question_bank() -> anyhow::Result<Arc<StaticQuestionBank>> {
    let path = env::var(QUESTIONS_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_QUESTIONS_PATH));

    if !path.exists() {
        warn!(path = %path.display(), "question set file not found; starting with an empty bank");
        return Ok(Arc::new(StaticQuestionBank::default()));
    }

    let bank = StaticQuestionBank::load(&path).context("loading question sets")?;
    Ok(Arc::new(bank))
}

/// Periodically expire stale lobbies and abandon fully disconnected sessions.
async fn run_sweeper(state: SharedState) {
    let mut ticker = interval(SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        lobby_service::cleanup_expired(&state).await;
        game_service::abandon_stale_sessions(&state).await;
    }
}

/// Log degraded-mode transitions as storage backends come and go.
async fn watch_degraded(state: SharedState) {
    let mut watcher = state.degraded_watcher();
    while watcher.changed().await.is_ok() {
        if *watcher.borrow() {
            warn!("no storage backend installed; running in degraded mode");
        } else {
            info!("storage backend installed; leaving degraded mode");
        }
    }
}

/// Build the top-level router and attach cross-cutting middleware layers.
fn build_router(state: SharedState) -> Router<()> {
    routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,tower_http=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Wait for Ctrl+C or SIGTERM and shut the server down gracefully.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut term = signal(SignalKind::terminate()).expect("install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
