use crate::config::CorsPolicy;
use crate::errors::AppError;
use crate::handlers::{self, AppState};
use axum::{
    error_handling::HandleErrorLayer,
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post, put},
    BoxError, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Builds the full application router.
///
/// Business routes live under `/api`; health and docs sit at the root.
pub fn build_router(state: Arc<AppState>) -> Router {
    let config = state.config.clone();

    let api_routes = Router::new()
        .route("/clients/search", get(handlers::search_clients))
        .route("/client/:id", get(handlers::get_client))
        .route("/submit-form", post(handlers::submit_form))
        .route("/users", get(handlers::list_users))
        .route("/update-user/:id", put(handlers::update_user))
        .route("/work-score", post(handlers::work_score))
        .route("/delete-user/:id", delete(handlers::delete_user));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/docs", get(handlers::serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(handlers::serve_openapi_spec))
        .nest("/api", api_routes)
        .with_state(state)
        // Oversized bodies surface through the `Json` extractor as a 413 `AppError`.
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(config.request_timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&config.cors))
}

/// Turns middleware failures into the same JSON error bodies handlers return.
async fn handle_middleware_error(err: BoxError) -> AppError {
    if err.is::<tower::timeout::error::Elapsed>() {
        tracing::warn!("Request timed out");
        AppError::Timeout
    } else {
        AppError::Internal(format!("unhandled middleware error: {}", err))
    }
}

fn cors_layer(policy: &CorsPolicy) -> CorsLayer {
    match policy {
        CorsPolicy::Any => CorsLayer::permissive(),
        CorsPolicy::Origin(origin) => CorsLayer::new()
            .allow_origin(origin.clone())
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers(Any),
    }
}
