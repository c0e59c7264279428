use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tracing::info;

use crate::api::rest::handlers;
use crate::api::rest::tools::ToolRegistry;
use crate::domain::service::Service;

/// Register the `/mcp` routes. Middleware is applied by the caller.
pub fn register_routes(router: Router, service: Arc<Service>) -> Router {
    let registry = ToolRegistry::builtin();
    for tool in registry.iter() {
        tracing::debug!(tool = tool.name, "registered tool");
    }
    info!(tools = registry.len(), "Registering user_store tool routes");

    router
        .route("/mcp/health", get(handlers::health))
        .route("/mcp/tools", get(handlers::list_tools))
        .route("/mcp/openapi.json", get(handlers::openapi_doc))
        .route("/mcp/{tool}", post(handlers::call_tool))
        .layer(Extension(registry))
        .layer(Extension(service))
}
