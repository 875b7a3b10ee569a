use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, State},
    http::{HeaderValue, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::auth::JwtKeys;
use crate::config::{AppConfig, Environment};
use crate::database::{CompanyStore, JobStore, PgStore};
use crate::error::ApiError;
use crate::handlers::{companies, jobs};
use crate::middleware::{authenticate_jwt, ensure_admin};

/// Dependencies shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub jobs: Arc<dyn JobStore>,
    pub companies: Arc<dyn CompanyStore>,
    pub keys: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(jobs: Arc<dyn JobStore>, companies: Arc<dyn CompanyStore>, keys: JwtKeys) -> Self {
        Self {
            jobs,
            companies,
            keys: Arc::new(keys),
        }
    }

    /// Both stores backed by the same Postgres pool
    pub fn with_pg(store: PgStore, keys: JwtKeys) -> Self {
        let store = Arc::new(store);
        Self::new(store.clone(), store, keys)
    }
}

/// Application routes with authentication attached
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(job_routes())
        .merge(company_routes())
        .fallback(fallback)
        .layer(from_fn_with_state(state.clone(), authenticate_jwt))
        .with_state(state)
}

/// Transport-level layers driven by configuration
pub fn with_http_layers(router: Router, config: &AppConfig) -> Router {
    let mut router = router.layer(DefaultBodyLimit::max(config.api.max_request_size_bytes));
    if config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    if !config.security.enable_cors {
        return router;
    }
    if config.environment == Environment::Development {
        return router.layer(CorsLayer::permissive());
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    router.layer(CorsLayer::new().allow_origin(AllowOrigin::list(origins)))
}

fn job_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/jobs",
            get(jobs::list).merge(post(jobs::create).route_layer(from_fn(ensure_admin))),
        )
        .route(
            "/jobs/:id",
            get(jobs::get).merge(
                patch(jobs::update)
                    .delete(jobs::remove)
                    .route_layer(from_fn(ensure_admin)),
            ),
        )
}

fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/companies", get(companies::list))
        .route("/companies/:handle", get(companies::get))
}

async fn root() -> Json<Value> {
    Json(json!({
        "name": "Jobly API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "jobs": "/jobs[/:id]",
            "companies": "/companies[/:handle]",
            "health": "/health"
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.jobs.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "timestamp": now, "database": "ok" })),
        ),
        Err(e) => {
            tracing::warn!("health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "timestamp": now, "database": "unavailable" })),
            )
        }
    }
}

async fn fallback() -> ApiError {
    ApiError::not_found("Not Found")
}
