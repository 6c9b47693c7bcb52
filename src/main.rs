//! Incident intake - conversational bot for recording incidents
//!
//! A Rust backend implementing a per-user dialogue state machine for
//! logging, exporting and deleting incident records.

mod api;
mod config;
mod db;
mod domain;
mod export;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::IntakeConfig;
use db::Database;
use runtime::{DatabaseStore, Dispatcher, InMemorySessionStore, ProductionRuntime, SystemClock};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "incident_intake=info,tower_http=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    // Configuration
    let config = IntakeConfig::from_env()?;

    // Ensure database directory exists
    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Initialize database
    tracing::info!(path = %config.db_path.display(), "Opening database");
    let db = Database::open(&config.db_path)?;
    tracing::info!(records = db.count_records()?, "Record store ready");

    tracing::info!(
        assistants = ?config.assistants,
        levels = ?config.level_labels,
        all_label = %config.all_label,
        "Intake dialogue configured"
    );

    // Create the runtime and its dispatcher
    let runtime: ProductionRuntime = runtime::IntakeRuntime::new(
        config.intake_context(),
        DatabaseStore::new(db, SystemClock),
        InMemorySessionStore::new(),
    );
    let state = AppState::new(Dispatcher::spawn(Arc::new(runtime)));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Incident intake server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
