//! VYBGO ride-hailing demo backend.
//!
//! HTTP surface under `/api`: auth (register/login/whoami), rides
//! (CRUD plus the lifecycle simulation), vibes catalog, FCM device
//! tokens, and a health check. Persistence is either the Supabase
//! PostgREST adapter or an in-memory store for keyless runs.

use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::Method;
use axum::Router;
use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use vybgo_core::scheduler::{Scheduler, TokioScheduler};

pub mod auth;
pub mod config;
pub mod error;
pub mod fcm;
pub mod routes;
pub mod state;
pub mod store;

use config::Config;
use state::AppState;
use store::{MemoryStore, SupabaseStore};

/// Build the application router for the given state.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    routes::api_router().layer(cors).with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading configuration...");
    let config = Config::load();
    let port = config.port;

    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler);
    let state = match config.supabase.clone() {
        Some(supabase) => {
            info!("Using Supabase store at {}", supabase.url);
            AppState::new(config, Arc::new(SupabaseStore::new(&supabase)), scheduler)
        }
        None => {
            info!("No Supabase configuration found, using in-memory store");
            AppState::new(config, Arc::new(MemoryStore::new()), scheduler)
        }
    };

    let app = app(state);

    let address = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&address).await.expect("failed to bind");
    info!("VYBGO API server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    info!("Server shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
