//! HTTP tool server.
//!
//! Exposes the practice through a small JSON API. Every operation is a
//! [`Tool`](crate::traits::Tool) in one [`ToolRegistry`], dispatched by the
//! same `POST /tools/{name}` handler.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/tools/list` | List all registered tools with schemas |
//! | `POST` | `/tools/{name}` | Call any registered tool by name |
//! | `GET`  | `/health` | Health check (returns version and document count) |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `tool_error` (500).
//!
//! # CORS
//!
//! All origins, methods and headers are permitted so browser clients can
//! call the API directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::ingest::{load_practice, Practice};
use crate::traits::{validate_params, ToolContext, ToolInfo, ToolRegistry};

#[derive(Clone)]
struct AppState {
    ctx: ToolContext,
    practice: Arc<Mutex<Practice>>,
    tools: Arc<ToolRegistry>,
}

/// Load the practice and serve the built-in tools.
///
/// This is the entry point used by `brief serve`.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    run_server_with_extensions(config, ToolRegistry::new()).await
}

/// Like [`run_server`], with extra tools served after the built-ins.
///
/// # Example
///
/// ```rust,no_run
/// use brieflens::server::run_server_with_extensions;
/// use brieflens::traits::ToolRegistry;
///
/// # async fn example(config: &brieflens::config::Config) -> anyhow::Result<()> {
/// let mut tools = ToolRegistry::new();
/// // tools.register(Box::new(MyTool::new()));
/// run_server_with_extensions(config, tools).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_server_with_extensions(
    config: &Config,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    let mut practice = load_practice(config)?;
    practice.refresh_index();
    serve_practice(config, practice, extra_tools).await
}

/// Serve an already-loaded practice.
pub async fn serve_practice(
    config: &Config,
    practice: Practice,
    extra_tools: ToolRegistry,
) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    let app = build_router(config, practice, extra_tools);

    tracing::info!(addr = %listener.local_addr()?, "tool server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Build the axum router over `practice`.
pub fn build_router(config: &Config, practice: Practice, extra_tools: ToolRegistry) -> Router {
    let mut registry = ToolRegistry::with_builtins();
    registry.extend(extra_tools);
    for t in registry.tools() {
        let tag = if t.is_builtin() { "builtin" } else { "rust" };
        tracing::debug!(tool = t.name(), kind = tag, "registered tool");
    }

    let practice = Arc::new(Mutex::new(practice));
    let state = AppState {
        ctx: ToolContext::new(Arc::new(config.clone()), practice.clone()),
        practice,
        tools: Arc::new(registry),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/tools/list", get(handle_list_tools))
        .route("/tools/{name}", post(handle_tool_call))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found",
        message: message.into(),
    }
}

fn tool_error(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "tool_error",
        message: message.into(),
    }
}

/// Map tool failures to HTTP statuses by message, so tools can signal
/// client errors without a custom error type in the `Tool` trait.
fn classify_tool_error(tool_name: &str, err: anyhow::Error) -> AppError {
    let msg = err.to_string();
    let message = format!("{}: {}", tool_name, msg);

    if msg.contains("not found") {
        not_found(message)
    } else if msg.contains("must not be empty")
        || msg.contains("invalid")
        || msg.contains("already exists")
    {
        bad_request(message)
    } else {
        tool_error(message)
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    documents: usize,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let documents = state.practice.lock().await.registry.documents().len();
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        documents,
    })
}

// ============ GET /tools/list ============

#[derive(Serialize)]
struct ToolListResponse {
    tools: Vec<ToolInfo>,
}

async fn handle_list_tools(State(state): State<AppState>) -> Json<ToolListResponse> {
    let tools = state
        .tools
        .tools()
        .iter()
        .map(|t| ToolInfo::of(t.as_ref()))
        .collect();
    Json(ToolListResponse { tools })
}

// ============ POST /tools/{name} ============

async fn handle_tool_call(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(params): Json<serde_json::Value>,
) -> Result<Json<serde_json::Value>, AppError> {
    let tool = state
        .tools
        .find(&name)
        .ok_or_else(|| not_found(format!("no tool registered with name: {}", name)))?;

    let validated = validate_params(&tool.parameters_schema(), &params)
        .map_err(|e| bad_request(e.to_string()))?;

    let result = tool
        .execute(validated, &state.ctx)
        .await
        .map_err(|e| classify_tool_error(&name, e))?;

    Ok(Json(serde_json::json!({ "result": result })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_tool_error() {
        let e = classify_tool_error("ask", anyhow::anyhow!("query must not be empty"));
        assert_eq!(e.status, StatusCode::BAD_REQUEST);
        let e = classify_tool_error("x", anyhow::anyhow!("client not found: Zed"));
        assert_eq!(e.status, StatusCode::NOT_FOUND);
        let e = classify_tool_error("x", anyhow::anyhow!("disk on fire"));
        assert_eq!(e.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code, "tool_error");
    }
}
