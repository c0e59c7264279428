use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    http::{HeaderMap, Uri},
    response::Json,
    Extension,
};
use serde_json::Value;
use tracing::{debug, info};
use utoipa::OpenApi;

use crate::api::rest::dto::{HealthDto, ToolInfoDto, ToolListDto, ToolResponse};
use crate::api::rest::error::{from_def, map_tool_error, TOOLS_BAD_ARGUMENTS, TOOLS_UNKNOWN};
use crate::api::rest::openapi::ApiDoc;
use crate::api::rest::request_id;
use crate::api::rest::tools::ToolRegistry;
use crate::domain::service::Service;
use http_problem::ProblemResponse;

pub const SERVICE_NAME: &str = "user-store";

/// Liveness probe
#[utoipa::path(
    get,
    path = "/mcp/health",
    responses((status = 200, description = "Service is up", body = HealthDto))
)]
pub async fn health() -> Json<HealthDto> {
    Json(HealthDto {
        status: "UP".to_string(),
        service: SERVICE_NAME.to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Every registered tool
#[utoipa::path(
    get,
    path = "/mcp/tools",
    responses((status = 200, description = "Registered tools", body = ToolListDto))
)]
pub async fn list_tools(Extension(registry): Extension<ToolRegistry>) -> Json<ToolListDto> {
    let tools: Vec<ToolInfoDto> = registry
        .iter()
        .map(|t| ToolInfoDto {
            name: t.name.to_string(),
            description: t.description.to_string(),
        })
        .collect();
    Json(ToolListDto {
        count: tools.len(),
        tools,
        server: SERVICE_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn openapi_doc() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Empty bodies mean "no arguments".
fn parse_arguments(body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(v @ Value::Object(_)) => Ok(v),
        Ok(_) => Err("arguments must be a JSON object".to_string()),
        Err(e) => Err(format!("malformed JSON: {e}")),
    }
}

/// Invoke a tool by name
#[utoipa::path(
    post,
    path = "/mcp/{tool}",
    params(("tool" = String, Path, description = "Tool name as listed by /mcp/tools")),
    responses(
        (status = 200, description = "Tool succeeded", body = ToolResponse),
        (status = 400, description = "Invalid arguments or validation failure", body = http_problem::Problem),
        (status = 404, description = "Unknown tool or user", body = http_problem::Problem),
        (status = 409, description = "Email already in use", body = http_problem::Problem),
        (status = 500, description = "Storage failure", body = http_problem::Problem)
    )
)]
pub async fn call_tool(
    Extension(svc): Extension<Arc<Service>>,
    Extension(registry): Extension<ToolRegistry>,
    Path(tool): Path<String>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ToolResponse>, ProblemResponse> {
    let rid = request_id::from_headers(&headers);

    let Some(def) = registry.find(&tool) else {
        info!(tool = %tool, "Unknown tool requested");
        return Err(from_def(
            &TOOLS_UNKNOWN,
            format!("Tool '{tool}' is not registered"),
            uri.path(),
            rid,
        ));
    };

    let args = parse_arguments(&body)
        .map_err(|msg| from_def(&TOOLS_BAD_ARGUMENTS, msg, uri.path(), rid))?;

    debug!(tool = def.name, "Invoking tool");
    match (def.handler)(svc, args).await {
        Ok(out) => Ok(Json(ToolResponse {
            tool: def.name.to_string(),
            status: "success".to_string(),
            result: out.result,
            count: out.count,
        })),
        Err(e) => {
            info!(tool = def.name, "Tool failed: {}", e);
            Err(map_tool_error(&e, uri.path(), rid))
        }
    }
}
