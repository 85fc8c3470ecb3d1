//! HTTP surface: the `/graphql` route family, health route, CORS, static
//! fallback, and the error-to-status mapping.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::error;

use crate::application::forwarder::GraphqlForwarder;
use crate::config::Settings;
use crate::domain::envelope::GraphqlRequest;
use crate::domain::role::RoleScope;
use crate::error::GatewayError;
use crate::presentation::middleware;

#[derive(Clone)]
pub struct AppState {
    pub forwarder: Arc<GraphqlForwarder>,
    /// Role-scoping variant serving `POST /graphql`, fixed at startup.
    pub variant: RoleScope,
    pub service: String,
    pub version: String,
    pub started_at: Instant,
}

pub fn app(state: AppState, settings: &Settings) -> Router {
    // The schema download is served by the admin deployment only; the other
    // variants answer 405 on GET.
    let graphql = if state.variant == RoleScope::Admin {
        post(execute_graphql).get(download_schema)
    } else {
        post(execute_graphql)
    };
    let api = Router::new()
        .route("/graphql", graphql)
        .route("/health", get(health))
        .with_state(state);

    let router = if settings.mount_path.is_empty() {
        api
    } else {
        Router::new().nest(&settings.mount_path, api)
    };

    // Layers go on last so the static fallback is logged and CORS-covered
    // like every API route.
    router
        .fallback_service(
            ServeDir::new(&settings.static_dir).append_index_html_on_directories(true),
        )
        .layer(axum::middleware::from_fn(middleware::request_logger))
        .layer(cors_layer())
}

/// Wide-open development posture. Wildcard origins exclude credentialed
/// requests at this layer.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

async fn execute_graphql(
    State(state): State<AppState>,
    Json(request): Json<GraphqlRequest>,
) -> Result<Json<Value>, GatewayError> {
    let result = state.forwarder.forward(state.variant, &request).await?;
    Ok(Json(result))
}

async fn download_schema(State(state): State<AppState>) -> Result<Response, GatewayError> {
    let document = state.forwarder.export_schema().await?;
    let body = serde_json::to_string_pretty(&document)
        .map_err(|e| GatewayError::Envelope(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/json"),
            (
                header::CONTENT_DISPOSITION,
                r#"attachment; filename="schema.gql""#,
            ),
        ],
        body,
    )
        .into_response())
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": state.service,
        "version": state.version,
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    }))
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GatewayError::PoolExhausted(_) => (StatusCode::SERVICE_UNAVAILABLE, "POOL_EXHAUSTED"),
            GatewayError::Connection(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DATABASE_UNAVAILABLE")
            }
            GatewayError::IdentityNotFound(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "IDENTITY_NOT_FOUND")
            }
            GatewayError::SessionState(_) => (StatusCode::INTERNAL_SERVER_ERROR, "SESSION_STATE"),
            GatewayError::RemoteExecution(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "REMOTE_EXECUTION")
            }
            GatewayError::Envelope(_) => (StatusCode::BAD_REQUEST, "INVALID_ENVELOPE"),
        };
        if status.is_server_error() {
            error!(code, error = %self, "request failed");
        }
        let body = Json(json!({ "error": self.to_string(), "code": code }));
        (status, body).into_response()
    }
}
