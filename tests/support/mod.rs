//! In-process fake of a Sanctum-style cookie-session backend.
//!
//! Mirrors the parts of the real backend the client depends on: a priming
//! endpoint that issues a session cookie plus a URL-encoded `XSRF-TOKEN`
//! cookie, a CSRF check on every `POST` (`X-XSRF-TOKEN` must match the
//! session's token, else 419), and session-bound login state.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde_json::{Value, json};

const SESSION_COOKIE: &str = "fake_session";

#[derive(Default)]
struct Session {
    csrf_token: String,
    user: Option<Value>,
}

struct Account {
    email: String,
    password: String,
    user: Value,
}

#[derive(Default)]
struct Inner {
    csrf_hits: AtomicUsize,
    next_id: AtomicUsize,
    fail_priming: AtomicBool,
    break_user_endpoint: AtomicBool,
    sessions: Mutex<HashMap<String, Session>>,
    accounts: Mutex<Vec<Account>>,
    log: Mutex<Vec<String>>,
}

#[derive(Clone, Default)]
pub struct Backend {
    inner: Arc<Inner>,
}

impl Backend {
    /// A backend with one account: `a@b.com` / `x` → `{id: 1, name: "A"}`.
    pub fn new() -> Self {
        let backend = Self::default();
        backend.inner.next_id.store(2, Ordering::SeqCst);
        backend.accounts().push(Account {
            email: "a@b.com".into(),
            password: "x".into(),
            user: json!({ "id": 1, "name": "A" }),
        });
        backend
    }

    /// Serve on an ephemeral localhost port and return the base URL.
    pub async fn spawn(&self) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake backend");
        let addr = listener.local_addr().expect("fake backend addr");
        let app = self.router();
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("fake backend failed");
        });
        format!("http://{addr}")
    }

    pub fn csrf_hits(&self) -> usize {
        self.inner.csrf_hits.load(Ordering::SeqCst)
    }

    pub fn fail_priming(&self, fail: bool) {
        self.inner.fail_priming.store(fail, Ordering::SeqCst);
    }

    pub fn break_user_endpoint(&self, broken: bool) {
        self.inner.break_user_endpoint.store(broken, Ordering::SeqCst);
    }

    /// `"METHOD path"` for each request, with `" csrf-ok"` / `" csrf-bad"` on POSTs.
    pub fn log(&self) -> Vec<String> {
        self.inner
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The decoded CSRF token the backend issued to `session_id`.
    pub fn issued_token(&self, session_id: &str) -> Option<String> {
        self.sessions()
            .get(session_id)
            .map(|session| session.csrf_token.clone())
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/sanctum/csrf-cookie", get(csrf_cookie))
            .route("/login", post(login))
            .route("/register", post(register))
            .route("/logout", post(logout))
            .route("/api/user", get(current_user))
            .route("/api/notes", post(create_note))
            .with_state(self.clone())
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        self.inner.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn accounts(&self) -> std::sync::MutexGuard<'_, Vec<Account>> {
        self.inner.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, entry: String) {
        self.inner
            .log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Session id from the request cookie, if the backend knows it.
    fn session_id(&self, jar: &CookieJar) -> Option<String> {
        let id = jar.get(SESSION_COOKIE)?.value().to_owned();
        self.sessions().contains_key(&id).then_some(id)
    }

    /// Laravel-style CSRF verification for state-changing requests.
    fn verify_csrf(&self, path: &str, jar: &CookieJar, headers: &HeaderMap) -> Result<String, Response> {
        let header = headers
            .get("x-xsrf-token")
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned);
        let verified = self.session_id(jar).filter(|id| {
            self.sessions()
                .get(id)
                .is_some_and(|session| Some(&session.csrf_token) == header.as_ref())
        });
        match verified {
            Some(id) => {
                self.record(format!("POST {path} csrf-ok"));
                Ok(id)
            }
            None => {
                self.record(format!("POST {path} csrf-bad"));
                Err(message(StatusCode::from_u16(419).expect("419 is a valid status"), "CSRF token mismatch."))
            }
        }
    }
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn csrf_cookie(State(backend): State<Backend>, jar: CookieJar) -> Response {
    backend.inner.csrf_hits.fetch_add(1, Ordering::SeqCst);
    backend.record("GET /sanctum/csrf-cookie".into());
    if backend.inner.fail_priming.load(Ordering::SeqCst) {
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Server Error");
    }

    let n = backend.inner.next_id.fetch_add(1, Ordering::SeqCst);
    let id = backend
        .session_id(&jar)
        .unwrap_or_else(|| format!("s{n}"));
    // Characters that must survive cookie URL-encoding and decoding.
    let token = format!("tok={n}+/x");
    backend.sessions().entry(id.clone()).or_default().csrf_token = token.clone();

    let cookies = AppendHeaders([
        (SET_COOKIE, format!("{SESSION_COOKIE}={id}; Path=/; HttpOnly")),
        (SET_COOKIE, format!("XSRF-TOKEN={}; Path=/", urlencoding::encode(&token))),
    ]);
    (StatusCode::NO_CONTENT, cookies).into_response()
}

async fn login(State(backend): State<Backend>, jar: CookieJar, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let id = match backend.verify_csrf("/login", &jar, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body.get("password").and_then(Value::as_str).unwrap_or_default();

    if email == "silent@b.com" {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let user = backend
        .accounts()
        .iter()
        .find(|account| account.email == email && account.password == password)
        .map(|account| account.user.clone());
    match user {
        Some(user) => {
            if let Some(session) = backend.sessions().get_mut(&id) {
                session.user = Some(user);
            }
            StatusCode::NO_CONTENT.into_response()
        }
        None => message(StatusCode::UNPROCESSABLE_ENTITY, "Invalid credentials"),
    }
}

async fn register(
    State(backend): State<Backend>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let id = match backend.verify_csrf("/register", &jar, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let field = |name: &str| body.get(name).and_then(Value::as_str).unwrap_or_default().to_owned();
    let (name, email, password) = (field("name"), field("email"), field("password"));

    if password != field("password_confirmation") {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "The password field confirmation does not match.");
    }
    if backend.accounts().iter().any(|account| account.email == email) {
        return message(StatusCode::UNPROCESSABLE_ENTITY, "The email has already been taken.");
    }

    let user_id = backend.inner.next_id.fetch_add(1, Ordering::SeqCst);
    let user = json!({ "id": user_id, "name": name, "email": email });
    backend.accounts().push(Account { email, password, user: user.clone() });
    if let Some(session) = backend.sessions().get_mut(&id) {
        session.user = Some(user);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn logout(State(backend): State<Backend>, jar: CookieJar, headers: HeaderMap, Json(_): Json<Value>) -> Response {
    let id = match backend.verify_csrf("/logout", &jar, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    if let Some(session) = backend.sessions().get_mut(&id) {
        session.user = None;
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn current_user(State(backend): State<Backend>, jar: CookieJar) -> Response {
    backend.record("GET /api/user".into());
    if backend.inner.break_user_endpoint.load(Ordering::SeqCst) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let user = backend
        .session_id(&jar)
        .and_then(|id| backend.sessions().get(&id).and_then(|session| session.user.clone()));
    match user {
        Some(user) => Json(user).into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Unauthenticated."),
    }
}

/// An app endpoint outside the auth flow: CSRF-checked and session-bound.
async fn create_note(State(backend): State<Backend>, jar: CookieJar, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    let id = match backend.verify_csrf("/api/notes", &jar, &headers) {
        Ok(id) => id,
        Err(rejection) => return rejection,
    };
    let author = backend.sessions().get(&id).and_then(|session| session.user.clone());
    match author {
        Some(author) => (StatusCode::CREATED, Json(json!({ "note": body, "author": author }))).into_response(),
        None => message(StatusCode::UNAUTHORIZED, "Unauthenticated."),
    }
}
