//! HTTP transport implementation.
//!
//! Exposes the gateway over plain JSON/HTTP:
//! - `POST /mcp/gateway` - the uniform dispatch endpoint (envelope protocol)
//! - `GET /mcp/manifest` - machine-readable description of every tool
//! - `GET /health` - liveness check
//! - `/tool/<tool>/...` - conventional per-action routes that bypass the
//!   envelope but share the gateway's validation and handlers
//!
//! Status mapping on the gateway path: 200 on success, 400 when tool or
//! action is missing at the boundary, 500 for every handler-level failure
//! (including user errors raised inside handlers) - a compatibility choice
//! kept from the original wire behavior. The direct routes return 400 on
//! any failure.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, instrument};

use super::{TransportError, TransportResult, config::HttpConfig};
use crate::core::server::GatewayServer;
use crate::domains::tools::Parameters;

/// HTTP transport handler.
pub struct HttpTransport {
    config: HttpConfig,
}

/// Body of a gateway dispatch request.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayRequest {
    #[serde(default)]
    pub tool: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub parameters: Option<Value>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given config.
    pub fn new(config: HttpConfig) -> Self {
        Self { config }
    }

    /// Get the bind address.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Run the HTTP transport until shutdown.
    pub async fn run(self, server: GatewayServer) -> TransportResult<()> {
        let addr = self.address();
        let app = router(server, self.config.enable_cors);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        let cors_status = if self.config.enable_cors {
            "enabled"
        } else {
            "disabled"
        };
        info!("Ready - listening on {} (CORS {})", addr, cors_status);
        info!("  → Gateway:  POST /mcp/gateway");
        info!("  → Manifest: GET /mcp/manifest");
        info!("  → Health:   GET /health");

        axum::serve(listener, app)
            .await
            .map_err(|e| TransportError::http(e.to_string()))?;

        Ok(())
    }
}

/// Build the full router over a gateway server.
pub fn router(server: GatewayServer, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/mcp/gateway", post(handle_gateway))
        .route("/mcp/manifest", get(handle_manifest))
        // github
        .route("/tool/github/listRepos", get(github_list_repos))
        .route("/tool/github/getRepo/{owner}/{repo}", get(github_get_repo))
        .route("/tool/github/searchRepos", get(github_search_repos))
        .route("/tool/github/getIssues/{owner}/{repo}", get(github_get_issues))
        .route("/tool/github/createIssue/{owner}/{repo}", post(github_create_issue))
        // gitlab
        .route("/tool/gitlab/listProjects", get(gitlab_list_projects))
        .route("/tool/gitlab/getProject/{project_id}", get(gitlab_get_project))
        .route("/tool/gitlab/searchProjects", get(gitlab_search_projects))
        .route("/tool/gitlab/getIssues/{project_id}", get(gitlab_get_issues))
        .route("/tool/gitlab/createIssue/{project_id}", post(gitlab_create_issue))
        .route("/tool/gitlab/getPipelines/{project_id}", get(gitlab_get_pipelines))
        // gmaps
        .route("/tool/gmaps/geocode", get(gmaps_geocode))
        .route("/tool/gmaps/reverseGeocode", get(gmaps_reverse_geocode))
        .route("/tool/gmaps/getDirections", get(gmaps_get_directions))
        .route("/tool/gmaps/searchPlaces", get(gmaps_search_places))
        .route("/tool/gmaps/getPlaceDetails", get(gmaps_get_place_details))
        // memory
        .route("/tool/memory/get", get(memory_get))
        .route("/tool/memory/set", post(memory_set))
        .route("/tool/memory/delete", delete(memory_delete))
        .route("/tool/memory/list", get(memory_list))
        .route("/tool/memory/search", get(memory_search))
        // puppeteer
        .route("/tool/puppeteer/screenshot", post(puppeteer_screenshot))
        .route("/tool/puppeteer/pdf", post(puppeteer_pdf))
        .route("/tool/puppeteer/extract", post(puppeteer_extract))
        .layer(TraceLayer::new_for_http())
        .with_state(server);

    if enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Root handler - provides API info.
async fn root_handler(State(server): State<GatewayServer>) -> impl IntoResponse {
    Json(json!({
        "name": server.name(),
        "version": server.version(),
        "endpoints": {
            "gateway": "/mcp/gateway",
            "manifest": "/mcp/manifest",
            "health": "/health"
        }
    }))
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Manifest endpoint.
async fn handle_manifest(State(server): State<GatewayServer>) -> impl IntoResponse {
    Json(server.manifest())
}

/// The gateway dispatch endpoint.
#[instrument(skip_all)]
async fn handle_gateway(
    State(server): State<GatewayServer>,
    body: Result<Json<GatewayRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Request body is required" })),
        )
            .into_response();
    };

    let params = Parameters::from_value(request.parameters.unwrap_or(Value::Null));
    let envelope = server
        .dispatch(request.tool.as_deref(), request.action.as_deref(), params)
        .await;

    let status = if envelope.is_success() {
        StatusCode::OK
    } else if matches!(envelope.error_kind(), Some("MissingTool" | "MissingAction")) {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(envelope)).into_response()
}

// ============================================================================
// Per-tool direct routes
// ============================================================================

fn query_to_params(query: HashMap<String, String>) -> Parameters {
    let mut params = Parameters::new();
    for (name, value) in query {
        params.insert(name, Value::String(value));
    }
    params
}

fn body_to_params(body: Result<Json<Value>, JsonRejection>) -> Parameters {
    Parameters::from_value(body.map(|Json(v)| v).unwrap_or(Value::Null))
}

/// Run an action through the shared dispatch pipeline and shape the raw
/// (non-envelope) response the direct routes return.
async fn run_direct(
    server: &GatewayServer,
    tool: &str,
    action: &str,
    params: Parameters,
    success_status: StatusCode,
) -> Response {
    match server.run_action(tool, action, params).await {
        Ok(value) => (success_status, Json(value)).into_response(),
        Err(err) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": err.message() })),
        )
            .into_response(),
    }
}

async fn github_list_repos(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "github", "listRepos", query_to_params(query), StatusCode::OK).await
}

async fn github_get_repo(
    State(server): State<GatewayServer>,
    Path((owner, repo)): Path<(String, String)>,
) -> Response {
    let mut params = Parameters::new();
    params.insert("owner", json!(owner));
    params.insert("repo", json!(repo));
    run_direct(&server, "github", "getRepo", params, StatusCode::OK).await
}

async fn github_search_repos(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "github", "searchRepos", query_to_params(query), StatusCode::OK).await
}

async fn github_get_issues(
    State(server): State<GatewayServer>,
    Path((owner, repo)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut params = query_to_params(query);
    params.insert("owner", json!(owner));
    params.insert("repo", json!(repo));
    run_direct(&server, "github", "getIssues", params, StatusCode::OK).await
}

async fn github_create_issue(
    State(server): State<GatewayServer>,
    Path((owner, repo)): Path<(String, String)>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let mut params = body_to_params(body);
    params.insert("owner", json!(owner));
    params.insert("repo", json!(repo));
    run_direct(&server, "github", "createIssue", params, StatusCode::CREATED).await
}

async fn gitlab_list_projects(State(server): State<GatewayServer>) -> Response {
    run_direct(&server, "gitlab", "listProjects", Parameters::new(), StatusCode::OK).await
}

async fn gitlab_get_project(
    State(server): State<GatewayServer>,
    Path(project_id): Path<String>,
) -> Response {
    let mut params = Parameters::new();
    params.insert("projectId", json!(project_id));
    run_direct(&server, "gitlab", "getProject", params, StatusCode::OK).await
}

async fn gitlab_search_projects(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gitlab", "searchProjects", query_to_params(query), StatusCode::OK).await
}

async fn gitlab_get_issues(
    State(server): State<GatewayServer>,
    Path(project_id): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let mut params = query_to_params(query);
    params.insert("projectId", json!(project_id));
    run_direct(&server, "gitlab", "getIssues", params, StatusCode::OK).await
}

async fn gitlab_create_issue(
    State(server): State<GatewayServer>,
    Path(project_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    let mut params = body_to_params(body);
    params.insert("projectId", json!(project_id));
    run_direct(&server, "gitlab", "createIssue", params, StatusCode::CREATED).await
}

async fn gitlab_get_pipelines(
    State(server): State<GatewayServer>,
    Path(project_id): Path<String>,
) -> Response {
    let mut params = Parameters::new();
    params.insert("projectId", json!(project_id));
    run_direct(&server, "gitlab", "getPipelines", params, StatusCode::OK).await
}

async fn gmaps_geocode(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gmaps", "geocode", query_to_params(query), StatusCode::OK).await
}

async fn gmaps_reverse_geocode(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gmaps", "reverseGeocode", query_to_params(query), StatusCode::OK).await
}

async fn gmaps_get_directions(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gmaps", "getDirections", query_to_params(query), StatusCode::OK).await
}

async fn gmaps_search_places(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gmaps", "searchPlaces", query_to_params(query), StatusCode::OK).await
}

async fn gmaps_get_place_details(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "gmaps", "getPlaceDetails", query_to_params(query), StatusCode::OK).await
}

async fn memory_get(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "memory", "get", query_to_params(query), StatusCode::OK).await
}

async fn memory_set(
    State(server): State<GatewayServer>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    run_direct(&server, "memory", "set", body_to_params(body), StatusCode::OK).await
}

async fn memory_delete(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "memory", "delete", query_to_params(query), StatusCode::OK).await
}

async fn memory_list(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "memory", "list", query_to_params(query), StatusCode::OK).await
}

async fn memory_search(
    State(server): State<GatewayServer>,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    run_direct(&server, "memory", "search", query_to_params(query), StatusCode::OK).await
}

async fn puppeteer_screenshot(
    State(server): State<GatewayServer>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    run_direct(&server, "puppeteer", "screenshot", body_to_params(body), StatusCode::OK).await
}

async fn puppeteer_pdf(
    State(server): State<GatewayServer>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    run_direct(&server, "puppeteer", "pdf", body_to_params(body), StatusCode::OK).await
}

async fn puppeteer_extract(
    State(server): State<GatewayServer>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    run_direct(&server, "puppeteer", "extract", body_to_params(body), StatusCode::OK).await
}
