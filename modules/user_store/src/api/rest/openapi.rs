use utoipa::OpenApi;

use crate::api::rest::dto::{
    BatchUsersReq, CreateUserReq, DepartmentArgs, EntityMetadataDto, FieldMetadataDto,
    HealthDto, PaginationReq, SearchUsersReq, StorageInfoDto, ToolInfoDto, ToolListDto,
    ToolResponse, UpdateUserReq, UserDto, UserIdArgs,
};
use crate::api::rest::handlers;
use http_problem::{FieldError, Problem};

#[derive(OpenApi)]
#[openapi(
    info(title = "User Store", description = "Tool-style CRUD surface over users"),
    paths(handlers::health, handlers::list_tools, handlers::call_tool),
    components(schemas(
        UserDto,
        CreateUserReq,
        UpdateUserReq,
        UserIdArgs,
        DepartmentArgs,
        SearchUsersReq,
        PaginationReq,
        BatchUsersReq,
        ToolResponse,
        ToolInfoDto,
        ToolListDto,
        HealthDto,
        StorageInfoDto,
        FieldMetadataDto,
        EntityMetadataDto,
        Problem,
        FieldError
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_tool_routes_and_schemas() {
        let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
        assert!(doc["paths"].get("/mcp/{tool}").is_some());
        assert!(doc["paths"].get("/mcp/health").is_some());
        assert!(doc["components"]["schemas"].get("UserDto").is_some());
        assert!(doc["components"]["schemas"].get("Problem").is_some());
    }
}
