//! In-process stand-in for the IVTS backend.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use ivts_console::{Console, config::Config, store::CredentialStore};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const PASSWORD: &str = "secret";
pub const REFRESH_COOKIE: &str = "refresh_token=R1";
pub const OPERATOR_URL: &str = "http://ivts.example/operator";

pub struct Behavior {
    /// Bearer token the protected routes accept.
    pub valid_token: String,
    /// Token minted by a refresh; `None` makes refresh fail.
    pub refresh_token: Option<String>,
    pub refresh_delay: Duration,
    /// Refresh only succeeds when the login cookie comes back.
    pub require_cookie: bool,
    pub login_role: String,
    pub reject_status: StatusCode,
    /// Reject every protected call, whatever token it carries.
    pub always_reject: bool,
    pub logout_status: StatusCode,
    /// Canned failure for `GET /users` once authorized.
    pub users_failure: Option<(StatusCode, Value)>,
    pub users_delay: Duration,
}

impl Default for Behavior {
    fn default() -> Self {
        Self {
            valid_token: "T1".to_string(),
            refresh_token: Some("T2".to_string()),
            refresh_delay: Duration::ZERO,
            require_cookie: false,
            login_role: "ADMIN".to_string(),
            reject_status: StatusCode::UNAUTHORIZED,
            always_reject: false,
            logout_status: StatusCode::OK,
            users_failure: None,
            users_delay: Duration::ZERO,
        }
    }
}

#[derive(Default)]
pub struct MockState {
    pub behavior: Mutex<Behavior>,
    pub login_calls: AtomicUsize,
    pub refresh_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub user_reads: AtomicUsize,
    pub user_writes: AtomicUsize,
    pub session_reads: AtomicUsize,
    /// `Authorization` headers seen by protected routes, in order.
    pub seen_tokens: Mutex<Vec<String>>,
    pub last_query: Mutex<Option<String>>,
    pub last_body: Mutex<Option<Value>>,
}

impl MockState {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Self {
        Self::with(Behavior::default()).await
    }

    pub async fn with(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior: Mutex::new(behavior),
            ..Default::default()
        });

        let app = Router::new()
            .route("/auth/login", post(login))
            .route("/auth/refresh-token", get(refresh))
            .route("/auth/logout", post(logout))
            .route("/users", get(list_users).post(create_user))
            .route("/users/{id}", put(write_user).delete(delete_user))
            .route("/users/{id}/reset-password", post(write_user))
            .route("/sessions", get(list_sessions))
            .route("/getIvtsOperatorUrl", get(operator_url))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}"),
            state,
        }
    }

    pub fn config(&self) -> Config {
        Config::new(self.base_url.clone())
    }

    pub fn console(&self, store: Arc<dyn CredentialStore>) -> Console {
        Console::new(self.config(), store).unwrap()
    }

    pub fn behave(&self, change: impl FnOnce(&mut Behavior)) {
        change(&mut self.state.behavior.lock());
    }

    pub fn seen_tokens(&self) -> Vec<String> {
        self.state.seen_tokens.lock().clone()
    }
}

fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Response> {
    let presented = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.seen_tokens.lock().push(presented.clone());

    let behavior = state.behavior.lock();
    let expected = format!("Bearer {}", behavior.valid_token);
    if behavior.always_reject || presented != expected {
        return Err((behavior.reject_status, Json(json!({ "message": "Unauthorized" }))).into_response());
    }
    Ok(())
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["password"] != PASSWORD || body["username"].as_str().unwrap_or_default().is_empty() {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Invalid credentials" }))).into_response();
    }
    let behavior = state.behavior.lock();
    (
        [(header::SET_COOKIE, format!("{REFRESH_COOKIE}; HttpOnly; Path=/"))],
        Json(json!({ "accessToken": behavior.valid_token, "role": behavior.login_role })),
    )
        .into_response()
}

async fn refresh(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = state.behavior.lock().refresh_delay;
    tokio::time::sleep(delay).await;

    let has_cookie = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains(REFRESH_COOKIE));

    let mut behavior = state.behavior.lock();
    match behavior.refresh_token.clone() {
        Some(token) if has_cookie || !behavior.require_cookie => {
            behavior.valid_token = token.clone();
            Json(json!({ "accessToken": token })).into_response()
        }
        _ => (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Refresh token expired" }))).into_response(),
    }
}

async fn logout(State(state): State<Arc<MockState>>) -> Response {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    state.behavior.lock().logout_status.into_response()
}

async fn list_users(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.user_reads.fetch_add(1, Ordering::SeqCst);
    let delay = state.behavior.lock().users_delay;
    tokio::time::sleep(delay).await;
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    if let Some((status, body)) = state.behavior.lock().users_failure.clone() {
        return (status, Json(body)).into_response();
    }
    Json(json!([
        { "id": 1, "name": "Jane Admin", "username": "jane@ivts.io", "role": "ADMIN" },
        { "id": 2, "name": "Omar Operator", "username": "omar@ivts.io", "role": "OPERATOR" }
    ]))
    .into_response()
}

async fn create_user(State(state): State<Arc<MockState>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    state.user_writes.fetch_add(1, Ordering::SeqCst);
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    let duplicate = body["username"] == "jane@ivts.io";
    *state.last_body.lock() = Some(body);
    if duplicate {
        return (StatusCode::CONFLICT, Json(json!({ "error": "Username already exists" }))).into_response();
    }
    StatusCode::CREATED.into_response()
}

async fn write_user(
    State(state): State<Arc<MockState>>,
    Path(_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.user_writes.fetch_add(1, Ordering::SeqCst);
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    *state.last_body.lock() = Some(body);
    StatusCode::OK.into_response()
}

async fn delete_user(State(state): State<Arc<MockState>>, Path(_id): Path<i64>, headers: HeaderMap) -> Response {
    state.user_writes.fetch_add(1, Ordering::SeqCst);
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_sessions(State(state): State<Arc<MockState>>, headers: HeaderMap, RawQuery(query): RawQuery) -> Response {
    state.session_reads.fetch_add(1, Ordering::SeqCst);
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    *state.last_query.lock() = query;
    Json(json!([
        { "userId": 1, "name": "Jane Admin", "loginTime": "2024-03-01T08:00:00Z", "logoutTime": "2024-03-01T09:30:00Z" },
        { "userId": 2, "name": "Omar Operator", "loginTime": "2024-03-02T10:15:00Z", "logoutTime": null }
    ]))
    .into_response()
}

async fn operator_url(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if let Err(rejection) = authorize(&state, &headers) {
        return rejection;
    }
    Json(json!({ "url": OPERATOR_URL })).into_response()
}
