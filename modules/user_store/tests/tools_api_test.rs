//! The `/mcp` HTTP surface, driven through the full middleware stack.

use anyhow::Result;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use user_store::config::{StorageBackend, UserStoreConfig};
use user_store::UserStore;

async fn router_with(cfg: UserStoreConfig) -> Router {
    UserStore::init(cfg)
        .await
        .expect("Failed to initialize user store")
        .router()
}

async fn router() -> Router {
    router_with(UserStoreConfig::default()).await
}

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    request_id: Option<String>,
    body: Value,
}

async fn send(router: &Router, req: Request<Body>) -> Result<Reply> {
    let resp = router.clone().oneshot(req).await?;
    let status = resp.status();
    let header = |name: &str| {
        resp.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    };
    let content_type = header("content-type");
    let request_id = header("x-request-id");
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok(Reply {
        status,
        content_type,
        request_id,
        body,
    })
}

async fn call(router: &Router, tool: &str, args: Value) -> Result<Reply> {
    let req = Request::builder()
        .method("POST")
        .uri(format!("/mcp/{tool}"))
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&args)?))?;
    send(router, req).await
}

async fn get(router: &Router, path: &str) -> Result<Reply> {
    let req = Request::builder().uri(path).body(Body::empty())?;
    send(router, req).await
}

fn ana() -> Value {
    json!({
        "name": "Ana García",
        "email": "ana@x.com",
        "department": "IT",
        "role": "Developer"
    })
}

#[tokio::test]
async fn health_reports_up() -> Result<()> {
    let router = router().await;
    let reply = get(&router, "/mcp/health").await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["status"], "UP");
    assert_eq!(reply.body["service"], "user-store");
    Ok(())
}

#[tokio::test]
async fn tools_are_listed() -> Result<()> {
    let router = router().await;
    let reply = get(&router, "/mcp/tools").await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 14);
    let names: Vec<_> = reply.body["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"create_user".to_string()));
    assert!(names.contains(&"execute_count_by_department".to_string()));
    Ok(())
}

#[tokio::test]
async fn create_then_find() -> Result<()> {
    let router = router().await;

    let created = call(&router, "create_user", ana()).await?;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["tool"], "create_user");
    assert_eq!(created.body["status"], "success");
    assert_eq!(created.body["result"]["id"], 1);
    assert_eq!(created.body["result"]["active"], true);
    assert!(created.body["result"]["createdAt"].is_string());
    assert!(created.body.get("count").is_none());
    assert!(created.request_id.is_some());

    let found = call(&router, "find_user_by_id", json!({ "userId": 1 })).await?;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["result"]["email"], "ana@x.com");
    Ok(())
}

#[tokio::test]
async fn duplicate_email_is_a_conflict_problem() -> Result<()> {
    let router = router().await;
    call(&router, "create_user", ana()).await?;

    let reply = call(&router, "create_user", ana()).await?;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(
        reply.content_type.as_deref(),
        Some("application/problem+json")
    );
    assert_eq!(reply.body["code"], "USERS_EMAIL_CONFLICT");
    assert_eq!(reply.body["instance"], "/mcp/create_user");
    Ok(())
}

#[tokio::test]
async fn validation_problem_points_at_every_field() -> Result<()> {
    let router = router().await;
    let reply = call(&router, "create_user", json!({ "name": "A", "email": "nope" })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "USERS_VALIDATION");

    let pointers: Vec<_> = reply.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["pointer"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(pointers, vec!["/name", "/email", "/department", "/role"]);
    Ok(())
}

#[tokio::test]
async fn unknown_user_and_unknown_tool_are_not_found() -> Result<()> {
    let router = router().await;

    let reply = call(&router, "find_user_by_id", json!({ "userId": 99 })).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["code"], "USERS_NOT_FOUND");

    let reply = call(&router, "drop_everything", json!({})).await?;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["code"], "TOOLS_UNKNOWN");
    Ok(())
}

#[tokio::test]
async fn malformed_arguments_are_bad_requests() -> Result<()> {
    let router = router().await;

    let reply = call(&router, "find_user_by_id", json!({ "userId": "seven" })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "TOOLS_BAD_ARGUMENTS");

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/create_user")
        .body(Body::from("{not json"))?;
    let reply = send(&router, req).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], "TOOLS_BAD_ARGUMENTS");
    Ok(())
}

#[tokio::test]
async fn empty_body_means_no_arguments() -> Result<()> {
    let router = router().await;
    call(&router, "create_user", ana()).await?;

    let req = Request::builder()
        .method("POST")
        .uri("/mcp/find_all_users")
        .body(Body::empty())?;
    let reply = send(&router, req).await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["count"], 1);
    assert_eq!(reply.body["result"].as_array().unwrap().len(), 1);
    Ok(())
}

#[tokio::test]
async fn update_delete_and_count() -> Result<()> {
    let router = router().await;
    call(&router, "create_user", ana()).await?;

    let reply = call(
        &router,
        "update_user",
        json!({ "userId": 1, "role": "Team Lead" }),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["result"]["role"], "Team Lead");
    assert_eq!(reply.body["result"]["name"], "Ana García");

    let count = call(
        &router,
        "execute_count_by_department",
        json!({ "department": "IT" }),
    )
    .await?;
    assert_eq!(count.body["result"]["activeUsers"], 1);

    let deleted = call(&router, "delete_user", json!({ "userId": 1 })).await?;
    assert_eq!(deleted.body["result"]["deleted"], true);
    let again = call(&router, "delete_user", json!({ "userId": 1 })).await?;
    assert_eq!(again.status, StatusCode::OK);
    assert_eq!(again.body["result"]["deleted"], false);
    Ok(())
}

#[tokio::test]
async fn batch_problem_points_into_the_list() -> Result<()> {
    let router = router().await;
    let reply = call(
        &router,
        "batch_insert_users",
        json!({ "users": [ana(), { "name": "B", "email": "b@x.com", "department": "IT", "role": "Dev" }] }),
    )
    .await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["errors"][0]["pointer"], "/users/1/name");

    let all = call(&router, "find_all_users", json!({})).await?;
    assert_eq!(all.body["count"], 0);

    let ok = call(&router, "transfer_data", json!({ "users": [ana()] })).await?;
    assert_eq!(ok.status, StatusCode::OK);
    assert_eq!(ok.body["result"]["transferred"], true);
    Ok(())
}

#[tokio::test]
async fn search_and_pagination_report_counts() -> Result<()> {
    let router = router_with(UserStoreConfig {
        seed_sample_users: true,
        ..Default::default()
    })
    .await;

    let reply = call(
        &router,
        "find_users_by_department",
        json!({ "department": "IT" }),
    )
    .await?;
    let names: Vec<_> = reply.body["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["Juan Pérez", "Luis Rodríguez", "María García"]);

    let reply = call(&router, "search_users", json!({ "department": "HR", "limit": 1 })).await?;
    assert_eq!(reply.body["count"], 1);

    let reply = call(
        &router,
        "find_users_with_pagination",
        json!({ "page": 1, "size": 3 }),
    )
    .await?;
    let ids: Vec<_> = reply.body["result"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![4, 5, 6]);

    let reply = call(&router, "find_users_with_pagination", json!({ "size": 0 })).await?;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn request_id_is_propagated_into_problems() -> Result<()> {
    let router = router().await;
    let req = Request::builder()
        .method("POST")
        .uri("/mcp/find_user_by_id")
        .header("x-request-id", "req-123")
        .body(Body::from(r#"{"userId": 5}"#))?;
    let reply = send(&router, req).await?;
    assert_eq!(reply.request_id.as_deref(), Some("req-123"));
    assert_eq!(reply.body["request_id"], "req-123");
    Ok(())
}

#[tokio::test]
async fn introspection_tools() -> Result<()> {
    let router = router().await;

    let reply = call(&router, "test_storage", json!({})).await?;
    assert_eq!(reply.body["result"]["reachable"], true);

    let reply = call(&router, "get_storage_info", json!({})).await?;
    assert_eq!(reply.body["result"]["backend"], "memory");
    assert_eq!(reply.body["result"]["userCount"], 0);

    let reply = call(&router, "get_entity_metadata", json!({})).await?;
    assert_eq!(reply.body["result"]["table"], "users");
    assert_eq!(reply.body["result"]["fields"].as_array().unwrap().len(), 8);

    let reply = get(&router, "/mcp/openapi.json").await?;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body["paths"].get("/mcp/{tool}").is_some());
    Ok(())
}

#[tokio::test]
async fn sqlite_backend_serves_the_same_tools() -> Result<()> {
    let cfg = UserStoreConfig {
        backend: StorageBackend::Sqlite,
        ..Default::default()
    };
    let router = router_with(cfg).await;

    let created = call(&router, "create_user", ana()).await?;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["result"]["id"], 1);

    let dup = call(&router, "create_user", ana()).await?;
    assert_eq!(dup.status, StatusCode::CONFLICT);

    let info = call(&router, "get_storage_info", json!({})).await?;
    assert_eq!(info.body["result"]["backend"], "sqlite");
    assert_eq!(info.body["result"]["location"], "sqlite::memory:");
    Ok(())
}
