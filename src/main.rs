use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bets_api::AppState;
use bets_api::config::Settings;
use bets_api::repository::session::{EngineOptions, SessionManager};
use bets_api::routes;
use bets_api::services::liveness::{DatabaseProbe, LivenessProbe, LivenessProbeService};

#[tokio::main]
async fn main() {
    let settings = Settings::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(if settings.debug { "debug" } else { "info" })
        }))
        .init();

    let sessions = Arc::new(SessionManager::new());
    sessions
        .initialize(
            &settings.database.url(),
            EngineOptions {
                echo: settings.debug,
                ..EngineOptions::default()
            },
        )
        .expect("failed to initialize the database engine");

    let mut resources: HashMap<&'static str, Box<dyn LivenessProbe>> = HashMap::new();
    resources.insert("db", Box::new(DatabaseProbe::new(sessions.clone())));
    let liveness = Arc::new(LivenessProbeService::new(resources));

    let state = Arc::new(AppState {
        sessions: sessions.clone(),
        liveness,
        settings: settings.clone(),
    });

    let app = routes::build_routes().with_state(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr)
        .await
        .expect("failed to bind listener");
    info!(addr = %settings.bind_addr, environment = %settings.environment, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    if let Err(err) = sessions.close().await {
        warn!(error = %err, "failed to dispose the database engine");
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to install the shutdown handler");
    }
}
