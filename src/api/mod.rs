use axum::{
    Json, Router,
    extract::State,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::{AuthService, Clock, HabitService};
use crate::state::SharedState;

pub mod auth;
mod error;
mod habits;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn auth_service(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }

    #[must_use]
    pub fn habit_service(&self) -> &Arc<dyn HabitService> {
        &self.shared.habit_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

/// Same as [`create_app_state_from_config`] with an injected clock.
pub async fn create_app_state_with_clock(
    config: Config,
    clock: Arc<dyn Clock>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_clock(config, clock).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.config().server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let cors_layer = if cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(observability::get_metrics))
        .with_state(state)
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route(
            "/habits",
            get(habits::list_habits).post(habits::create_habit),
        )
        .route("/habits/{id}", get(habits::get_habit))
        .route("/habits/{id}/complete", post(habits::complete_habit))
        .route("/habits/{id}/miss", post(habits::miss_habit))
        .route("/habits/{id}/progress", get(habits::get_progress))
        .route("/habits/{id}/entries", get(habits::list_entries))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}

/// GET /
async fn root() -> Json<ApiResponse<RootInfoDto>> {
    Json(ApiResponse::success(RootInfoDto {
        message: "Welcome to the Habit Tracker API".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthDto>> {
    tracing::debug!(uptime_secs = state.start_time.elapsed().as_secs(), "Health check");
    Json(ApiResponse::success(HealthDto {
        status: "ok".to_string(),
    }))
}
