//! LoanGuard API Module
//! Decision-only REST API over the loan policy, with OpenAPI documentation.
//!
//! Handlers answer questions; they never touch loan records. Callers must
//! run the check and their own write as one unit.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;
use utoipa::{OpenApi, ToSchema};

use crate::engine::catalog::{LoanStatus, Permission, Role};
use crate::engine::pipeline::PipelineSummary;
use crate::engine::rbac::{Capabilities, Enforcer, Policy, RawAccessRequest};

#[derive(Clone)]
pub struct ApiState {
    pub policy: Arc<Policy>,
}

impl ApiState {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_roles,
        role_permissions,
        role_capabilities,
        decide,
        pipeline_summary,
    ),
    components(schemas(
        Role,
        Permission,
        LoanStatus,
        Capabilities,
        RawAccessRequest,
        DecisionResponse,
        PipelineSummary,
    )),
    tags(
        (name = "catalog", description = "Roles and permissions"),
        (name = "decisions", description = "Authorization decisions"),
        (name = "pipeline", description = "Pipeline dashboard helpers"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/roles", get(list_roles))
        .route("/api/roles/{role}/permissions", get(role_permissions))
        .route("/api/roles/{role}/capabilities", get(role_capabilities))
        .route("/api/decisions", post(decide))
        .route("/api/pipeline/summary", post(pipeline_summary))
        .route("/api/openapi.json", get(openapi_document))
        .route("/api/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn openapi_document() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

fn not_found(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": message })))
}

#[utoipa::path(
    get,
    path = "/api/roles",
    responses(
        (status = 200, description = "Role catalog", body = Value)
    ),
    tag = "catalog"
)]
async fn list_roles() -> Json<Value> {
    let roles: Vec<Value> = Role::ALL
        .iter()
        .map(|role| {
            json!({
                "role": role,
                "label": role.label(),
                "description": role.description(),
            })
        })
        .collect();
    Json(Value::Array(roles))
}

#[utoipa::path(
    get,
    path = "/api/roles/{role}/permissions",
    params(
        ("role" = String, Path, description = "Role token"),
    ),
    responses(
        (status = 200, description = "Assigned permission tokens; empty for unknown roles", body = Vec<Permission>)
    ),
    tag = "catalog"
)]
async fn role_permissions(State(state): State<ApiState>, Path(role): Path<String>) -> Json<Value> {
    let enforcer = Enforcer::new(&state.policy);
    Json(json!(enforcer.user_permissions_for(&role)))
}

#[derive(Deserialize)]
pub struct CapabilitiesQuery {
    status: String,
}

#[utoipa::path(
    get,
    path = "/api/roles/{role}/capabilities",
    params(
        ("role" = String, Path, description = "Role token"),
        ("status" = String, Query, description = "Current loan status token"),
    ),
    responses(
        (status = 200, description = "What the role may do with a loan in this status", body = Capabilities),
        (status = 404, description = "Unknown role or status", body = Value)
    ),
    tag = "decisions"
)]
async fn role_capabilities(
    State(state): State<ApiState>,
    Path(role): Path<String>,
    Query(params): Query<CapabilitiesQuery>,
) -> Result<Json<Capabilities>, (StatusCode, Json<Value>)> {
    let role = Role::parse_token(&role).ok_or_else(|| not_found(format!("Unknown role: {}", role)))?;
    let status = LoanStatus::parse_token(&params.status)
        .ok_or_else(|| not_found(format!("Unknown status: {}", params.status)))?;

    let enforcer = Enforcer::new(&state.policy);
    Ok(Json(enforcer.capabilities(role, status)))
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecisionResponse {
    pub allowed: bool,
}

#[utoipa::path(
    post,
    path = "/api/decisions",
    request_body = RawAccessRequest,
    responses(
        (status = 200, description = "Decision; a denial is `allowed: false`", body = DecisionResponse),
        (status = 422, description = "Malformed request body")
    ),
    tag = "decisions"
)]
async fn decide(
    State(state): State<ApiState>,
    Json(request): Json<RawAccessRequest>,
) -> Json<DecisionResponse> {
    let enforcer = Enforcer::new(&state.policy);
    let allowed = enforcer.evaluate_raw(&request);
    debug!(role = %request.role(), allowed, ?request, "policy decision");
    Json(DecisionResponse { allowed })
}

#[utoipa::path(
    post,
    path = "/api/pipeline/summary",
    request_body = Vec<String>,
    responses(
        (status = 200, description = "Status counts rolled up for the dashboard", body = PipelineSummary)
    ),
    tag = "pipeline"
)]
async fn pipeline_summary(Json(statuses): Json<Vec<String>>) -> Json<PipelineSummary> {
    let summary =
        PipelineSummary::from_statuses(statuses.iter().filter_map(|s| LoanStatus::parse_token(s)));
    Json(summary)
}
