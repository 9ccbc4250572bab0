//! # SlotBook API
//!
//! The API crate provides the web server for the SlotBook booking service.
//! Participants list timeslots, occupy one by email, look up their own slot,
//! and follow claims live over server-sent events.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Implement request processing logic
//! - **Middleware**: Error mapping to HTTP responses
//! - **Config**: Handle environment and application configuration
//!
//! Storage is reached only through [`slotbook_db::TimeslotRepository`], so the
//! router runs the same over PostgreSQL or the in-memory registry.

/// Configuration module for API settings
pub mod config;
/// Request extractors with JSON error bodies
pub mod extract;
/// Request handlers that implement business logic
pub mod handlers;
/// Error mapping for handlers
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::{sync::Arc, time::Duration};

use axum::Router;
use eyre::Result;
use slotbook_core::models::events::TimeslotEvent;
use slotbook_db::TimeslotRepository;
use tokio::{net::TcpListener, sync::broadcast};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    /// Registry holding the timeslots
    pub repository: Arc<dyn TimeslotRepository>,
    /// Fan-out of claim and release notifications to `/sse` subscribers
    pub events: broadcast::Sender<TimeslotEvent>,
}

impl ApiState {
    pub fn new(repository: Arc<dyn TimeslotRepository>, event_capacity: usize) -> Self {
        let (events, _rx) = broadcast::channel(event_capacity);
        Self { repository, events }
    }
}

/// Builds the application router with all routes and layers attached
pub fn app(state: Arc<ApiState>, config: &config::ApiConfig) -> Router {
    let app = Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Timeslot listing and claims
        .merge(routes::timeslots::routes())
        // Live event stream
        .merge(routes::events::routes())
        // Frontend build for everything else
        .fallback_service(ServeDir::new(&config.static_dir))
        .with_state(state);

    let cors = match &config.cors_origins {
        Some(origins) => {
            let origins: Vec<_> = origins
                .iter()
                .filter_map(|origin| match origin.parse::<axum::http::HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin: {}", origin);
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_methods([
                    axum::http::Method::GET,
                    axum::http::Method::POST,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_origin(AllowOrigin::list(origins))
        }
        None => CorsLayer::permissive(),
    };

    app.layer(
        tower::ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    )
}

/// Starts the API server with the provided configuration and repository
///
/// # Example
///
/// ```no_run
/// # async fn run() -> eyre::Result<()> {
/// use std::sync::Arc;
/// use slotbook_api::config::ApiConfig;
/// use slotbook_db::{create_pool, PgTimeslotRepository};
///
/// let config = ApiConfig::from_env()?;
/// let pool = create_pool(&config.database_url).await?;
/// slotbook_api::start_server(config, Arc::new(PgTimeslotRepository::new(pool))).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(
    config: config::ApiConfig,
    repository: Arc<dyn TimeslotRepository>,
) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let state = Arc::new(ApiState::new(repository, config.event_capacity));
    let app = app(state, &config);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
