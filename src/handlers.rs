use crate::client_storage::ClientStore;
use crate::config::Config;
use crate::errors::AppError;
use crate::models::*;
use crate::scoring;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

/// OpenAPI document describing the routes below, compiled into the binary.
const OPENAPI_YAML: &str = include_str!("../openapi.yml");

/// Shared application state injected into handlers.
pub struct AppState {
    /// Client record store.
    pub store: ClientStore,
    /// Application configuration.
    pub config: Config,
}

/// Health check endpoint.
///
/// Reports the number of stored records, so a broken document shows up here
/// as a 500 rather than on the first user request.
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let records = state.store.count().await?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "records": records
        })),
    ))
}

/// GET /api/clients/search?firstName=
///
/// Case-insensitive exact match on first name. No match is an empty array.
pub async fn search_clients(
    State(state): State<Arc<AppState>>,
    query: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<Vec<ClientRecord>>, AppError> {
    let Query(params) = query?;
    tracing::info!("GET /clients/search - params: {:?}", params);

    let first_name = params
        .first_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::BadRequest("Name query parameter is required".to_string()))?;

    let matches = state.store.find_by_first_name(&first_name).await?;
    tracing::info!("Found {} client(s) named '{}'", matches.len(), first_name);

    Ok(Json(matches))
}

/// GET /api/client/:id
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ClientRecord>, AppError> {
    tracing::info!("GET /client/{}", id);

    let record = state.store.get_by_id(&id).await?;
    Ok(Json(record))
}

/// POST /api/submit-form
///
/// Stores a new intake submission as sent. The body is the record without an
/// `id`; one is generated here.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionResponse>), AppError> {
    let Json(fields) = payload?;
    let submission = state.store.insert(ClientRecord::from_fields(fields)).await?;
    tracing::info!(
        "POST /submit-form - stored client {}",
        submission.id().unwrap_or_default()
    );

    Ok((
        StatusCode::CREATED,
        Json(SubmissionResponse {
            message: "Form submitted successfully".to_string(),
            submission,
        }),
    ))
}

/// GET /api/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ClientRecord>>, AppError> {
    let records = state.store.list_all().await?;
    tracing::info!("GET /users - {} record(s)", records.len());

    Ok(Json(records))
}

/// PUT /api/update-user/:id
///
/// Merges the body into the stored record and echoes the body back.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let Json(updated_data) = payload?;
    tracing::info!(
        "PUT /update-user/{} - fields: {:?}",
        id,
        updated_data.keys().collect::<Vec<_>>()
    );

    state.store.update_partial(&id, &updated_data).await?;

    Ok(Json(UpdateResponse {
        message: "User updated successfully".to_string(),
        user_id: id,
        updated_data,
    }))
}

/// POST /api/work-score
///
/// Scores the posted fields without storing anything.
pub async fn work_score(
    payload: Result<Json<ClientRecord>, JsonRejection>,
) -> Result<Json<WorkScore>, AppError> {
    let Json(record) = payload?;
    let result = scoring::score(&record);
    tracing::info!("POST /work-score - baseline {}", result.baseline);

    Ok(Json(result))
}

/// DELETE /api/delete-user/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    tracing::info!("DELETE /delete-user/{}", id);

    state.store.delete_by_id(&id).await?;

    Ok(Json(DeleteResponse {
        message: "User deleted successfully".to_string(),
        user_id: id,
    }))
}

/// Serves the OpenAPI specification YAML.
pub async fn serve_openapi_spec() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/yaml; charset=utf-8")],
        OPENAPI_YAML,
    )
}

/// Serves a Swagger UI page pointed at [`serve_openapi_spec`].
pub async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Case Intake API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}
