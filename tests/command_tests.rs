use std::sync::Arc;

use serde_json::json;
use taskhub::api::{ApiClient, TaskFilter};
use taskhub::commands::*;
use taskhub::error::ApiError;
use taskhub::http::HttpClient;
use taskhub::session::{MemorySessionStore, SessionStore, StoredSession};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn logged_in(server: &MockServer, user_id: &str) -> (ApiClient, Arc<MemorySessionStore>) {
    let store = Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", user_id)));
    let http = HttpClient::new(&server.uri(), store.clone()).unwrap();
    (ApiClient::new(http), store)
}

fn user_json(id: i64, name: &str, is_admin: bool) -> serde_json::Value {
    json!({ "id": id, "name": name, "email": format!("{}@example.com", name), "isAdmin": is_admin })
}

fn task_json(id: i64, completed: bool, user_id: i64) -> serde_json::Value {
    json!({ "id": id, "title": format!("Task {}", id), "completed": completed, "userId": user_id })
}

async fn mount_user(server: &MockServer, id: i64, name: &str, is_admin: bool) {
    Mock::given(method("GET"))
        .and(path(format!("/api/user/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(id, name, is_admin)))
        .mount(server)
        .await;
}

async fn mount_task(server: &MockServer, task: serde_json::Value) {
    let id = task["id"].as_i64().unwrap();
    Mock::given(method("GET"))
        .and(path(format!("/api/task/{}", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(task))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_by_owner_falls_back_for_regular_users() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(1, false, 7)])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/byuser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_list(&api, TaskFilter::GroupedByOwner).await.unwrap();
}

#[tokio::test]
async fn test_list_by_owner_for_admins() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", true).await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/byuser"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(1, false, 7), task_json(2, true, 9)])))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_list(&api, TaskFilter::GroupedByOwner).await.unwrap();
}

#[tokio::test]
async fn test_list_reports_server_error() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("GET"))
        .and(path("/api/tasks/pending"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    let err = cmd_list(&api, TaskFilter::Pending).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch tasks");
}

#[tokio::test]
async fn test_list_requires_login() {
    let server = MockServer::start().await;
    let api = ApiClient::new(HttpClient::new(&server.uri(), Arc::new(MemorySessionStore::new())).unwrap());

    assert!(matches!(cmd_list(&api, TaskFilter::All).await, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_add_sends_title_and_due_date() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/task/create"))
        .and(body_json(json!({ "title": "Write report", "dueDate": "2025-12-01T00:00:00Z" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(task_json(3, false, 7)))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_add(&api, "Write report".into(), Some("  ".into()), Some("2025-12-01".into())).await.unwrap();
}

#[tokio::test]
async fn test_add_rejects_bad_input_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    let err = cmd_add(&api, "   ".into(), None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Title is required");

    let err = cmd_add(&api, "Task".into(), None, Some("01/12/2025".into())).await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_edit_rejects_blank_fields() {
    let server = MockServer::start().await;
    mount_task(&server, json!({ "id": 5, "title": "T", "description": "old text", "completed": false, "userId": 7 })).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    let err = cmd_edit(&api, 5, None, Some("".into()), None).await.unwrap_err();
    assert_eq!(err.to_string(), "Description cannot be blank");

    let err = cmd_edit(&api, 5, None, None, Some(" ".into())).await.unwrap_err();
    assert_eq!(err.to_string(), "Due date cannot be blank");
}

#[tokio::test]
async fn test_edit_sends_changed_fields() {
    let server = MockServer::start().await;
    mount_task(&server, json!({ "id": 5, "title": "T", "description": "old text", "completed": false, "userId": 7 })).await;
    Mock::given(method("PUT"))
        .and(path("/api/task/update/5"))
        .and(body_json(json!({
            "title": "T",
            "description": "new text",
            "dueDate": "2026-01-15T00:00:00Z",
            "completed": false
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_edit(&api, 5, None, Some("new text".into()), Some("2026-01-15".into())).await.unwrap();
}

#[tokio::test]
async fn test_edit_with_nothing_to_change() {
    let server = MockServer::start().await;
    mount_task(&server, task_json(5, false, 7)).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_edit(&api, 5, Some("Task 5".into()), None, None).await.unwrap();
}

#[tokio::test]
async fn test_edit_reports_server_refusal() {
    let server = MockServer::start().await;
    mount_task(&server, task_json(5, false, 7)).await;
    Mock::given(method("PUT"))
        .and(path("/api/task/update/5"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Not your task" })))
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    let err = cmd_edit(&api, 5, Some("Renamed".into()), None, None).await.unwrap_err();
    assert_eq!(err.to_string(), "Not your task");
}

#[tokio::test]
async fn test_complete_and_remove() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/task/complete/5"))
        .and(body_json(json!({ "completed": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/task/delete/5"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_complete(&api, 5, false).await.unwrap();
    cmd_remove(&api, 5, true).await.unwrap();
}

#[tokio::test]
async fn test_promote_skips_admins() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", true).await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            user_json(7, "ana", true),
            user_json(8, "bia", false)
        ])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/promote/8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_promote(&api, 8).await.unwrap();
    // Already an admin: no request.
    cmd_promote(&api, 7).await.unwrap();
}

#[tokio::test]
async fn test_profile_edit_defaults_to_acting_user() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("PUT"))
        .and(path("/api/user/update/7"))
        .and(body_json(json!({ "name": "ana", "email": "ana@example.com", "password": "n3w" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_profile_edit(&api, None, None, None, Some("n3w".into())).await.unwrap();
    // Same values as loaded: nothing is sent.
    cmd_profile_edit(&api, None, Some("ana".into()), None, None).await.unwrap();
}

#[tokio::test]
async fn test_profile_delete_self_logs_out() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/delete/7"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, store) = logged_in(&server, "7");

    cmd_profile_delete(&api, None, true).await.unwrap();
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_admin_removing_other_user_keeps_session() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", true).await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/delete/8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let (api, store) = logged_in(&server, "7");

    cmd_profile_delete(&api, Some(8), true).await.unwrap();
    assert_eq!(store.get(), Some(StoredSession::new("t1", "7")));
}

#[tokio::test]
async fn test_profile_delete_failure_is_an_error() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/delete/8"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({ "message": "Forbidden" })))
        .mount(&server)
        .await;
    let (api, store) = logged_in(&server, "7");

    let err = cmd_profile_delete(&api, Some(8), true).await.unwrap_err();
    assert_eq!(err.to_string(), "Forbidden");
    assert!(store.get().is_some());
}

#[tokio::test]
async fn test_logout_error_still_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let (api, store) = logged_in(&server, "7");

    let err = cmd_logout(&api).await.unwrap_err();
    assert_eq!(err.to_string(), "local session cleared, but the server reported: Failed to logout");
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_login_command_stores_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "x" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t2", "id": 7 })))
        .mount(&server)
        .await;
    let store = Arc::new(MemorySessionStore::new());
    let api = ApiClient::new(HttpClient::new(&server.uri(), store.clone()).unwrap());

    cmd_login(&api, "a@b.com".into(), "x".into()).await.unwrap();
    assert_eq!(store.get(), Some(StoredSession::new("t2", "7")));
}

#[tokio::test]
async fn test_sessions_command() {
    let server = MockServer::start().await;
    mount_user(&server, 7, "ana", false).await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "token": "0123456789abcdef", "userId": 7, "expiresAt": "2025-01-01T00:00:00Z" }
        ])))
        .expect(1)
        .mount(&server)
        .await;
    let (api, _) = logged_in(&server, "7");

    cmd_sessions(&api).await.unwrap();
}
