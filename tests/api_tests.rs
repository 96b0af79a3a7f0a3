use std::sync::Arc;

use serde_json::json;
use taskhub::api::{ApiClient, TaskFilter};
use taskhub::error::ApiError;
use taskhub::http::HttpClient;
use taskhub::models::{NewTask, TaskUpdate};
use taskhub::session::{MemorySessionStore, SessionStore, StoredSession};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

fn client(server: &MockServer, store: Arc<MemorySessionStore>) -> ApiClient {
    let http = HttpClient::new(&server.uri(), store).unwrap();
    ApiClient::new(http)
}

fn user_json(id: i64, is_admin: bool) -> serde_json::Value {
    json!({
        "id": id,
        "name": "Ana",
        "email": "a@b.com",
        "createdAt": "2024-10-01T12:00:00.000Z",
        "isAdmin": is_admin
    })
}

fn task_json(id: i64, completed: bool, user_id: i64) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Task {}", id),
        "dueDate": "2025-12-01T00:00:00.000Z",
        "completed": completed,
        "createdAt": "2025-11-01T10:00:00.000Z",
        "updatedAt": "2025-11-02T10:00:00.000Z",
        "userId": user_id
    })
}

#[tokio::test]
async fn test_login_persists_session_and_sends_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .and(body_json(json!({ "email": "a@b.com", "password": "x" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t1", "id": 7 })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/user/7"))
        .and(header("Authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json(7, false)))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let api = client(&server, store.clone());

    api.login("a@b.com", "x").await.unwrap();
    assert_eq!(store.get(), Some(StoredSession::new("t1", "7")));

    let user = api.get_current_user().await.unwrap();
    assert_eq!(user.id, 7);
    assert!(!user.is_admin);
}

#[tokio::test]
async fn test_login_failure_persists_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "message": "Invalid credentials",
            "details": ["email not found"]
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let api = client(&server, store.clone());

    let err = api.login("a@b.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials: email not found");
    assert!(matches!(err, ApiError::RequestFailed(_)));
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_requests_without_session_are_unauthenticated() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/tasks"))
        .respond_with(|req: &Request| {
            if req.headers.contains_key("authorization") {
                ResponseTemplate::new(500)
            } else {
                ResponseTemplate::new(200).set_body_json(json!([]))
            }
        })
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::new()));
    assert!(api.get_tasks().await.unwrap().is_empty());
    assert!(matches!(api.get_current_user().await, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_logout_clears_session_even_when_server_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .and(header("Authorization", "Bearer t1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7")));
    let api = client(&server, store.clone());

    let err = api.logout().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to logout");
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_logout_success_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "ok" })))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7")));
    let api = client(&server, store.clone());

    api.logout().await.unwrap();
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_create_task_omits_empty_optionals() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/task/create"))
        .and(body_json(json!({ "title": "Only a title" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 11,
            "title": "Only a title",
            "completed": false,
            "userId": 7
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/task/11"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 11,
            "title": "Only a title",
            "completed": false,
            "userId": 7
        })))
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7"))));
    let created = api
        .create_task(&NewTask { title: "Only a title".into(), description: None, due_date: None })
        .await
        .unwrap();
    let fetched = api.get_task(created.id).await.unwrap();
    assert_eq!(fetched.description, None);
    assert_eq!(fetched.due_date, None);
}

#[tokio::test]
async fn test_validation_fails_before_any_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::new()));

    let err = api
        .create_task(&NewTask { title: "   ".into(), description: None, due_date: None })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));
    assert_eq!(err.to_string(), "Title is required");

    let err = api.create_user("Ana", "", "secret").await.unwrap_err();
    assert_eq!(err.to_string(), "Email is required");

    let err = api.login("a@b.com", "").await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationFailed(_)));
}

#[tokio::test]
async fn test_each_filter_hits_its_endpoint() {
    let server = MockServer::start().await;
    for (p, id) in [
        ("/api/tasks", 1),
        ("/api/tasks/pending", 2),
        ("/api/tasks/completed", 3),
        ("/api/tasks/byuser", 4),
    ] {
        Mock::given(method("GET"))
            .and(path(p))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([task_json(id, false, 7)])))
            .expect(1)
            .mount(&server)
            .await;
    }

    let api = client(&server, Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7"))));
    assert_eq!(api.list_tasks(TaskFilter::All).await.unwrap()[0].id, 1);
    assert_eq!(api.list_tasks(TaskFilter::Pending).await.unwrap()[0].id, 2);
    assert_eq!(api.list_tasks(TaskFilter::Completed).await.unwrap()[0].id, 3);
    assert_eq!(api.list_tasks(TaskFilter::GroupedByOwner).await.unwrap()[0].id, 4);
}

#[tokio::test]
async fn test_update_and_complete_payloads() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/task/update/5"))
        .and(body_json(json!({ "title": "Renamed", "completed": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(task_json(5, true, 7)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/task/complete/5"))
        .and(body_json(json!({ "completed": false })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7"))));
    api.update_task(5, &TaskUpdate { title: "Renamed".into(), description: None, due_date: None, completed: true })
        .await
        .unwrap();
    api.complete_task(5, false).await.unwrap();
}

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Session expired" })))
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_session(StoredSession::new("old", "7")));
    let api = client(&server, store.clone());

    let err = api.list_sessions().await.unwrap_err();
    assert_eq!(err.to_string(), "Session expired");
    assert_eq!(store.get(), None);
}

#[tokio::test]
async fn test_user_admin_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([user_json(7, true), user_json(8, false)])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/users/promote/8"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/user/delete/8"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "User not found" })))
        .mount(&server)
        .await;

    let api = client(&server, Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7"))));
    assert_eq!(api.list_users().await.unwrap().len(), 2);
    api.promote_user(8).await.unwrap();
    assert_eq!(api.delete_user(8).await.unwrap_err().to_string(), "User not found");
}

#[tokio::test]
async fn test_rejected_login_keeps_existing_session() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "message": "Invalid credentials" })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::with_session(StoredSession::new("t1", "7")));
    let api = client(&server, store.clone());

    let err = api.login("other@b.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(store.get(), Some(StoredSession::new("t1", "7")));
}
