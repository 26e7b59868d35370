use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use shared::jwt::{JwtError, JwtVerifier};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Config, SecurityConfig};
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_identity,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{attendance, health, sessions};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub jwt_verifier: Arc<JwtVerifier>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Result<Self, JwtError> {
        let jwt_verifier = Arc::new(config.identity.build_verifier()?);

        // rate_limit_per_minute = 0 disables limiting
        let rate_limiter = (config.security.rate_limit_per_minute > 0)
            .then(|| Arc::new(RateLimiterState::new(config.security.rate_limit_per_minute)));

        Ok(Self {
            pool,
            config: Arc::new(config),
            rate_limiter,
            jwt_verifier,
        })
    }
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if security.cors_origins.is_empty() {
        // Development default
        layer.allow_origin(Any)
    } else {
        let origins: Vec<_> = security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        layer.allow_origin(AllowOrigin::list(origins))
    }
}

/// Builds the router. Fails only if the identity key cannot be loaded.
pub fn create_app(config: Config, pool: PgPool) -> Result<Router, JwtError> {
    let state = AppState::new(config, pool)?;
    let config = state.config.clone();

    // Middleware order: identity runs first, then rate limiting (keyed on identity)
    let authenticated_routes = Router::new()
        .route(
            "/api/v1/sessions",
            post(sessions::create_session).get(sessions::list_sessions),
        )
        .route("/api/v1/sessions/:session_id", get(sessions::get_session))
        .route(
            "/api/v1/sessions/:session_id/attendance",
            get(sessions::get_attendance_report),
        )
        .route("/api/v1/attendance", post(attendance::mark_attendance))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_identity,
        ));

    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Ok(Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        // Global middleware (bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors_layer(&config.security))
        .with_state(state))
}
