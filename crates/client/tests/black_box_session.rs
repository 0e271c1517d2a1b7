use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use mizan_auth::{AccessLevel, Credentials, Module};
use mizan_client::token_store::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use mizan_client::types::{Announcement, Transaction};
use mizan_client::{ApiClient, ClientError, ListView, MemoryTokenStore, PermissionSession, ViewState};

const ACCESS: &str = "access-1";
const REFRESH: &str = "refresh-1";

/// Canned backend state, configurable per test.
#[derive(Clone)]
struct Backend {
    profile: Value,
    staff: Value,
    role_permissions: Value,
    transactions: Value,
    log: Arc<Mutex<Vec<String>>>,
}

impl Backend {
    fn treasurer() -> Self {
        Self {
            profile: json!({"id": 7, "is_superuser": false, "username": "treasurer"}),
            staff: json!([{"id": 1, "user": 2, "role": 1}, {"id": 2, "user": 7, "role": 3}]),
            role_permissions: json!({"finance": "write"}),
            transactions: json!([{"id": 1, "amount": "150.00", "transaction_type": "INCOME"}]),
            log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {ACCESS}") || v == "Bearer access-2")
}

fn record(state: &Backend, entry: impl Into<String>) {
    state.log.lock().unwrap().push(entry.into());
}

async fn token(State(state): State<Backend>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    record(&state, "token");
    if body["username"] == "treasurer" && body["password"] == "secret" {
        Ok(Json(json!({"access": ACCESS, "refresh": REFRESH})))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn token_refresh(State(state): State<Backend>, Json(body): Json<Value>) -> Result<Json<Value>, StatusCode> {
    record(&state, "token-refresh");
    if body["refresh"] == REFRESH {
        Ok(Json(json!({"access": "access-2"})))
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

async fn profile(State(state): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    record(&state, "profile");
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.profile.clone()))
}

async fn staff_members(State(state): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    record(&state, "staff");
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.staff.clone()))
}

async fn staff_role(
    State(state): State<Backend>,
    Path(id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<Value>, StatusCode> {
    record(&state, format!("role:{id}"));
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if id != 3 {
        return Err(StatusCode::NOT_FOUND);
    }
    Ok(Json(json!({"id": 3, "name": "Treasurer", "permissions": state.role_permissions})))
}

async fn transactions(State(state): State<Backend>, headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
    record(&state, "transactions");
    if !bearer_ok(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(Json(state.transactions.clone()))
}

async fn announcements(State(state): State<Backend>) -> StatusCode {
    record(&state, "announcements");
    StatusCode::INTERNAL_SERVER_ERROR
}

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(backend: Backend) -> Self {
        let app = Router::new()
            .route("/api/token/", post(token))
            .route("/api/token/refresh/", post(token_refresh))
            .route("/api/user/profile/", get(profile))
            .route("/api/jamath/staff-members/", get(staff_members))
            .route("/api/jamath/staff-roles/:id/", get(staff_role))
            .route("/api/jamath/transactions/", get(transactions))
            .route("/api/portal/announcements/", get(announcements))
            .with_state(backend);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    fn client(&self) -> ApiClient {
        ApiClient::new(self.base_url.clone(), Arc::new(MemoryTokenStore::new()))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn signed_in(server: &TestServer) -> ApiClient {
    let client = server.client();
    client
        .login(&Credentials::new("treasurer", "secret"))
        .await
        .expect("login should succeed");
    client
}

#[tokio::test]
async fn login_stores_both_tokens() {
    let server = TestServer::spawn(Backend::treasurer()).await;
    let client = signed_in(&server).await;

    assert!(client.is_authenticated());
    assert_eq!(client.tokens().get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some(ACCESS));
    assert_eq!(client.tokens().get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some(REFRESH));
}

#[tokio::test]
async fn bad_credentials_surface_status_and_store_nothing() {
    let server = TestServer::spawn(Backend::treasurer()).await;
    let client = server.client();

    let err = client
        .login(&Credentials::new("treasurer", "wrong"))
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert!(!client.is_authenticated());
}

#[tokio::test]
async fn treasurer_session_over_http() {
    let backend = Backend::treasurer();
    let server = TestServer::spawn(backend.clone()).await;
    let client = signed_in(&server).await;

    let session = PermissionSession::initialize(client).await;

    assert_eq!(session.profile().and_then(|p| p.username.as_deref()), Some("treasurer"));
    assert!(session.has_permission("finance", AccessLevel::Write));
    assert!(!session.has_permission("finance", AccessLevel::Admin));
    assert!(!session.has_permission("welfare", AccessLevel::Read));
    assert_eq!(backend.requests(), vec!["token", "profile", "staff", "role:3"]);
}

#[tokio::test]
async fn superuser_over_http_skips_staff_lookup() {
    let mut backend = Backend::treasurer();
    backend.profile = json!({"id": 1, "is_superuser": true});
    let server = TestServer::spawn(backend.clone()).await;
    let client = signed_in(&server).await;

    let session = PermissionSession::initialize(client).await;

    for module in Module::ALL {
        assert!(session.has_permission(module, AccessLevel::Admin));
    }
    assert_eq!(backend.requests(), vec!["token", "profile"]);
}

#[tokio::test]
async fn missing_staff_entry_over_http_means_no_access() {
    let mut backend = Backend::treasurer();
    backend.staff = json!([{"user": 2, "role": 1}]);
    let server = TestServer::spawn(backend.clone()).await;
    let client = signed_in(&server).await;

    let session = PermissionSession::initialize(client).await;

    assert!(session.permissions().is_empty());
    assert_eq!(backend.requests(), vec!["token", "profile", "staff"]);
}

#[tokio::test]
async fn unauthenticated_session_has_no_access() {
    let backend = Backend::treasurer();
    let server = TestServer::spawn(backend.clone()).await;

    let session = PermissionSession::initialize(server.client()).await;

    assert!(session.profile().is_none());
    assert!(!session.can_read("finance"));
    assert_eq!(backend.requests(), vec!["profile"]);
}

#[tokio::test]
async fn refresh_token_replaces_access_token() {
    let server = TestServer::spawn(Backend::treasurer()).await;
    let client = signed_in(&server).await;

    client.refresh_access_token().await.unwrap();

    assert_eq!(client.tokens().get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("access-2"));
    assert_eq!(client.tokens().get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some(REFRESH));

    // The new token is accepted by the backend.
    let session = PermissionSession::initialize(client).await;
    assert!(session.can_read("finance"));
}

#[tokio::test]
async fn logout_clears_tokens() {
    let server = TestServer::spawn(Backend::treasurer()).await;
    let client = signed_in(&server).await;

    client.logout().unwrap();

    assert!(!client.is_authenticated());
    let err = client.refresh_access_token().await.unwrap_err();
    assert!(matches!(err, ClientError::NotAuthenticated));
}

#[tokio::test]
async fn gated_view_loads_with_access() {
    let backend = Backend::treasurer();
    let server = TestServer::spawn(backend.clone()).await;
    let client = signed_in(&server).await;
    let session = PermissionSession::initialize(client.clone()).await;

    let mut view = ListView::<Transaction>::new();
    view.load_gated(&session, &client).await;

    assert_eq!(view.state(), ViewState::Populated);
    assert_eq!(view.items()[0].amount, "150.00");
    assert_eq!(backend.requests().last().map(String::as_str), Some("transactions"));
}

#[tokio::test]
async fn gated_view_without_access_makes_no_request() {
    let mut backend = Backend::treasurer();
    backend.role_permissions = json!({"welfare": "read"});
    let server = TestServer::spawn(backend.clone()).await;
    let client = signed_in(&server).await;
    let session = PermissionSession::initialize(client.clone()).await;

    let mut view = ListView::<Transaction>::new();
    view.load_gated(&session, &client).await;

    assert_eq!(view.state(), ViewState::Forbidden);
    assert!(!backend.requests().contains(&"transactions".to_string()));
}

#[tokio::test]
async fn server_error_renders_generic_message() {
    let server = TestServer::spawn(Backend::treasurer()).await;
    let client = signed_in(&server).await;

    let view = ListView::<Announcement>::fetch(&client).await;

    assert_eq!(view.state(), ViewState::Failed);
    assert!(view.items().is_empty());
    assert!(view.render().contains("Could not load announcements."));
}
