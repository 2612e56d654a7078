//! HTTP API server for taskplan.

// Allow clippy lint triggered by utoipa's OpenApi derive macro
#![allow(clippy::needless_for_each)]

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::core::storage::{PlanRecord, PlanStore, StorageError};
use crate::core::{Error, PlanOutcome, PlanService, Task, validate_prompt};

/// Shared application state.
pub struct AppState {
    /// Generation pipeline (absent when no API key is configured).
    pub service: Option<PlanService>,

    /// Plan history.
    pub store: Option<PlanStore>,

    /// Save successful generations to the store.
    pub save: bool,

    /// API token for authentication (if configured).
    pub token: Option<String>,
}

impl AppState {
    /// Build state from configuration, tolerating a missing API key.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let service = config
            .create_service()
            .inspect_err(|e| tracing::warn!(error = %e, "plan generation disabled"))
            .ok();

        let store = PlanStore::open_default()
            .inspect_err(|e| tracing::warn!(error = %e, "plan history disabled"))
            .ok();

        Self {
            service,
            store,
            save: config.planner.save_last,
            token: config.api.token(),
        }
    }
}

type SharedState = Arc<AppState>;

/// `OpenAPI` documentation.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "taskplan API",
        description = "Generate timed task lists from natural-language requests",
        version = "0.1.0",
        license(name = "MIT")
    ),
    paths(health, generate_plan, last_plan, list_plans),
    components(schemas(GenerateRequest, PlanOutcome, PlanRecord, Task, ErrorBody))
)]
struct ApiDoc;

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable description.
    pub message: String,
}

/// An error response.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    fn not_configured(what: &str) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "not_configured",
            format!("{what} is not configured"),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code.to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        if e.is_invalid_input() {
            return Self::new(StatusCode::BAD_REQUEST, "invalid_prompt", e.to_string());
        }

        match e {
            Error::ApiKeyMissing => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "not_configured",
                e.to_string(),
            ),
            Error::Storage(e) => e.into(),
            e => Self::new(StatusCode::BAD_GATEWAY, "upstream_error", e.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            rejection.body_text(),
        )
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(_) => {
                Self::new(StatusCode::NOT_FOUND, "not_found", e.to_string())
            }
            e => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "storage_error",
                e.to_string(),
            ),
        }
    }
}

/// Authentication middleware.
///
/// Validates the `Authorization: Bearer <token>` header if a token is configured.
async fn auth_middleware(
    State(state): State<SharedState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    // If no token configured, allow all requests (localhost-only mode)
    let Some(expected_token) = state.token.as_deref() else {
        return next.run(request).await;
    };

    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match auth_header {
        Some(token) if token == expected_token => next.run(request).await,
        _ => ApiError::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "Missing or invalid Authorization header. Use: Bearer <token>",
        )
        .into_response(),
    }
}

/// Build the application router.
pub fn router(state: SharedState) -> Router {
    let protected_routes = Router::new()
        .route("/generate-plan", post(generate_plan))
        .route("/api/plans", get(list_plans))
        .route("/api/plans/last", get(last_plan))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public_routes = Router::new()
        .route("/health", get(health))
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP API server.
///
/// # Errors
///
/// Returns an error if the server fails to bind or start.
pub async fn serve(config: &Config, host: &str, port: u16) -> anyhow::Result<()> {
    let state: SharedState = Arc::new(AppState::from_config(config));
    let auth_enabled = state.token.is_some();

    let app = router(state);

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    if auth_enabled {
        tracing::info!(addr = %addr, "starting HTTP API server (auth enabled)");
    } else {
        tracing::warn!(addr = %addr, "starting HTTP API server (NO AUTH - localhost only recommended)");
    }
    eprintln!("taskplan API listening on http://{addr} (docs at /api/docs)");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service healthy", body = String))
)]
async fn health() -> &'static str {
    "ok"
}

/// Request body for plan generation.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct GenerateRequest {
    /// What to plan.
    #[serde(default)]
    pub prompt: String,
}

/// Generate a plan from a natural-language request.
#[utoipa::path(
    post,
    path = "/generate-plan",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "Plan generated", body = PlanOutcome),
        (status = 400, description = "Malformed body, empty or oversized prompt", body = ErrorBody),
        (status = 502, description = "Model call failed", body = ErrorBody),
        (status = 503, description = "No API key configured", body = ErrorBody)
    )
)]
async fn generate_plan(
    State(state): State<SharedState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<PlanOutcome>, ApiError> {
    let Json(req) = body?;
    let prompt = validate_prompt(&req.prompt)?;

    let service = state
        .service
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("Gemini API key"))?;

    let outcome = service.generate(&prompt).await?;

    if state.save {
        if let Some(store) = &state.store {
            let record = PlanRecord::new(prompt, &outcome.model, outcome.tasks.clone());
            if let Err(e) = store.save(&record) {
                tracing::warn!(error = %e, "failed to save plan");
            }
        }
    }

    Ok(Json(outcome))
}

/// Query parameters for listing plans.
#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Maximum number of plans to return.
    pub limit: Option<usize>,
}

/// Get the most recently saved plan.
#[utoipa::path(
    get,
    path = "/api/plans/last",
    responses(
        (status = 200, description = "Last saved plan", body = PlanRecord),
        (status = 404, description = "No plan saved yet", body = ErrorBody)
    )
)]
async fn last_plan(State(state): State<SharedState>) -> Result<Json<PlanRecord>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("plan history"))?;

    store
        .last()?
        .map(Json)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "not_found", "no plan saved yet"))
}

/// List saved plans, newest first.
#[utoipa::path(
    get,
    path = "/api/plans",
    params(ListParams),
    responses((status = 200, description = "Saved plans", body = Vec<PlanRecord>))
)]
async fn list_plans(
    State(state): State<SharedState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PlanRecord>>, ApiError> {
    let store = state
        .store
        .as_ref()
        .ok_or_else(|| ApiError::not_configured("plan history"))?;

    Ok(Json(store.list(params.limit.unwrap_or(20))?))
}
