//! # HTTP Transport
//!
//! Authenticated requests to the PharmaDesk backend.
//!
//! ## Request Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Request Lifecycle                                 │
//! │                                                                         │
//! │  ApiRequest ──► token? ──no──► public endpoint? ──no──► NotAuthenticated│
//! │                   │                   │ yes                (no I/O)     │
//! │                   │ yes               ▼                                 │
//! │                   └──────────► Authorization: Bearer <token>            │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                              JSON body or multipart                     │
//! │                                       │                                 │
//! │                                       ▼                                 │
//! │                ┌──────────────── status ────────────────┐               │
//! │                │                    │                   │               │
//! │               2xx                  401               other              │
//! │                │                    │                   │               │
//! │           JSON value      force_logout(Unauthorized)  Api{message}      │
//! │                           then Err(Unauthorized)      or fallback       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The session is cleared *before* the 401 error reaches the caller, so any
//! retry made in response fails fast instead of looping.

use reqwest::header::CONTENT_TYPE;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use pharmadesk_core::{ApiEnvelope, ImageUpload, FALLBACK_ERROR_MESSAGE};

use crate::error::{ClientError, ClientResult};
use crate::session::{SessionStore, SignOutReason};

/// Endpoints reachable without a session.
const PUBLIC_ENDPOINTS: &[(Method, &str)] = &[(Method::Post, "/auth/login")];

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// Multipart form: text fields plus at most one file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    pub fields: Vec<(String, String)>,
    pub file: Option<(String, ImageUpload)>,
}

impl FormPayload {
    pub fn text(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn file(mut self, key: impl Into<String>, upload: ImageUpload) -> Self {
        self.file = Some((key.into(), upload));
        self
    }

    fn into_form(self) -> ClientResult<Form> {
        let mut form = Form::new();
        for (key, value) in self.fields {
            form = form.text(key, value);
        }
        if let Some((key, upload)) = self.file {
            let part = Part::bytes(upload.bytes)
                .file_name(upload.file_name)
                .mime_str(&upload.content_type)
                .map_err(|e| ClientError::Serialization(e.to_string()))?;
            form = form.part(key, part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    None,
    Json(Value),
    Multipart(FormPayload),
}

/// One backend call, independent of how it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path below the base URL, starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        ApiRequest {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> ClientResult<Self> {
        self.body = RequestBody::Json(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn multipart(mut self, form: FormPayload) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// True for endpoints that work without a session (login).
    pub fn is_public(&self) -> bool {
        PUBLIC_ENDPOINTS
            .iter()
            .any(|(method, path)| *method == self.method && *path == self.path)
    }
}

// =============================================================================
// Transport Trait
// =============================================================================

/// Sends requests to the backend.
///
/// `HttpTransport` is the production implementation; tests substitute an
/// in-memory fake.
pub trait Transport: Send + Sync + 'static {
    /// Sends the request and returns the response body on 2xx.
    fn send(&self, request: ApiRequest) -> impl Future<Output = ClientResult<Value>> + Send;

    /// Sends the request and unwraps `data` from the response envelope.
    fn data<T>(&self, request: ApiRequest) -> impl Future<Output = ClientResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move { decode_data(self.send(request).await?) }
    }

    fn get_data<T>(&self, path: &str) -> impl Future<Output = ClientResult<T>> + Send
    where
        T: DeserializeOwned + Send,
    {
        self.data(ApiRequest::get(path))
    }
}

/// Unwraps `{success, data, message}`.
///
/// A 2xx response that reports `success: false` becomes an `Api` error
/// carrying the server message.
pub fn decode_data<T: DeserializeOwned>(body: Value) -> ClientResult<T> {
    let envelope: ApiEnvelope<T> = serde_json::from_value(body)?;
    envelope
        .into_data()
        .map_err(|message| ClientError::Api {
            status: 200,
            message,
        })
}

/// Accepts a body that carries no `data`, rejecting `success: false`.
pub fn ensure_success(body: Value) -> ClientResult<Value> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(FALLBACK_ERROR_MESSAGE)
            .to_string();
        return Err(ClientError::Api {
            status: 200,
            message,
        });
    }
    Ok(body)
}

/// Picks `message` out of an error body, or the generic fallback.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .and_then(Value::as_str)
                .filter(|m| !m.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}

// =============================================================================
// HTTP Transport
// =============================================================================

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
}

impl HttpTransport {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> ClientResult<Self> {
        Url::parse(base_url)?;
        let client = reqwest::Client::builder().build()?;

        Ok(HttpTransport {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn builder(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        match method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        }
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
        let token = self.session.token();
        let public = request.is_public();

        if token.is_none() && !public {
            debug!(method = %request.method, path = %request.path, "No session, request not sent");
            return Err(ClientError::NotAuthenticated);
        }

        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.builder(request.method, &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(token) = &token {
            builder = builder.bearer_auth(token);
        }

        builder = match request.body {
            RequestBody::None => builder.header(CONTENT_TYPE, "application/json"),
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::Multipart(form) => builder.multipart(form.into_form()?),
        };

        let response = builder.send().await.map_err(|e| {
            warn!(method = %request.method, path = %request.path, error = %e, "Backend unreachable");
            ClientError::Network(e.to_string())
        })?;

        let status = response.status();
        info!(method = %request.method, path = %request.path, status = status.as_u16(), "API request");

        if status == reqwest::StatusCode::UNAUTHORIZED && !public {
            self.session.force_logout(SignOutReason::Unauthorized);
            return Err(ClientError::Unauthorized);
        }

        let body = response.text().await?;

        if status.is_success() {
            if body.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&body).map_err(ClientError::from);
        }

        let message = error_message(&body);
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(message));
        }
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

// =============================================================================
// Test Transport
// =============================================================================

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::Notify;

    type Responder = Box<dyn Fn(&ApiRequest) -> ClientResult<Value> + Send + Sync>;
    type Filter = Box<dyn Fn(&ApiRequest) -> bool + Send + Sync>;

    /// Records every request and answers from a closure.
    pub struct FakeTransport {
        calls: Mutex<Vec<ApiRequest>>,
        responder: Responder,
        hold: Option<(Arc<Notify>, Filter)>,
    }

    impl FakeTransport {
        pub fn new<F>(responder: F) -> Self
        where
            F: Fn(&ApiRequest) -> ClientResult<Value> + Send + Sync + 'static,
        {
            FakeTransport {
                calls: Mutex::new(Vec::new()),
                responder: Box::new(responder),
                hold: None,
            }
        }

        /// Parks every request until `gate.notify_one()`.
        pub fn held(self, gate: Arc<Notify>) -> Self {
            self.held_matching(gate, |_| true)
        }

        /// Parks only the requests `filter` selects.
        pub fn held_matching<F>(mut self, gate: Arc<Notify>, filter: F) -> Self
        where
            F: Fn(&ApiRequest) -> bool + Send + Sync + 'static,
        {
            self.hold = Some((gate, Box::new(filter)));
            self
        }

        pub fn calls(&self) -> Vec<ApiRequest> {
            self.calls.lock().unwrap().clone()
        }

        pub fn count(&self, method: Method, path: &str) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.method == method && r.path == path)
                .count()
        }
    }

    impl Transport for FakeTransport {
        async fn send(&self, request: ApiRequest) -> ClientResult<Value> {
            self.calls.lock().unwrap().push(request.clone());
            if let Some((gate, filter)) = &self.hold {
                if filter(&request) {
                    gate.notified().await;
                }
            }
            (self.responder)(&request)
        }
    }

    pub fn ok(data: Value) -> ClientResult<Value> {
        Ok(serde_json::json!({ "success": true, "data": data }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::fixtures;
    use axum::extract::RawQuery;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use pharmadesk_core::{BillReceipt, Role};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::net::TcpListener;

    /// Stub backend on an ephemeral port; returns its `/api` base URL.
    async fn serve(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/api", addr)
    }

    fn auth_header(headers: &HeaderMap) -> String {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    }

    #[test]
    fn test_public_endpoints() {
        assert!(ApiRequest::post("/auth/login").is_public());
        assert!(!ApiRequest::get("/auth/login").is_public());
        assert!(!ApiRequest::post("/bills").is_public());
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"message": "Out of stock"}"#), "Out of stock");
        assert_eq!(error_message(r#"{"message": ""}"#), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message("<html>502</html>"), FALLBACK_ERROR_MESSAGE);
        assert_eq!(error_message(""), FALLBACK_ERROR_MESSAGE);
    }

    #[test]
    fn test_decode_data() {
        let n: i64 = decode_data(json!({"success": true, "data": 3})).unwrap();
        assert_eq!(n, 3);

        let err = decode_data::<i64>(json!({"success": false, "message": "Nope"})).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 200, ref message } if message == "Nope"));
    }

    #[test]
    fn test_decode_data_into_receipt() {
        let receipt: BillReceipt = decode_data(json!({
            "success": true,
            "data": { "bill_id": 5, "bill_number": 1042, "total_amount": "67.20" }
        }))
        .unwrap();
        assert_eq!(receipt.bill_number, "1042");
        assert_eq!(receipt.total_amount.minor(), 6720);

        let err = decode_data::<BillReceipt>(json!({ "success": true })).unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 200, .. }));
    }

    #[test]
    fn test_ensure_success() {
        assert!(ensure_success(json!({"message": "Medicine deleted"})).is_ok());
        assert!(ensure_success(json!({"success": true})).is_ok());

        let err = ensure_success(json!({"success": false})).unwrap_err();
        assert_eq!(err.to_string(), FALLBACK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn test_bearer_token_and_query_are_sent() {
        let app = Router::new().route(
            "/api/medicines",
            get(|headers: HeaderMap, RawQuery(query): RawQuery| async move {
                Json(json!({
                    "success": true,
                    "data": { "auth": auth_header(&headers), "query": query }
                }))
            }),
        );
        let base = serve(app).await;

        let session = Arc::new(fixtures::signed_in(Role::Staff));
        let token = session.token().unwrap();
        let transport = HttpTransport::new(&base, session).unwrap();

        let data: Value = transport
            .data(ApiRequest::get("/medicines").query("search", "dolo 650"))
            .await
            .unwrap();
        assert_eq!(data["auth"], format!("Bearer {}", token));
        assert_eq!(data["query"], "search=dolo+650");
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session_before_error() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new().route(
            "/api/bills",
            post(move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    (StatusCode::UNAUTHORIZED, Json(json!({"message": "jwt expired"})))
                }
            }),
        );
        let base = serve(app).await;

        let session = Arc::new(fixtures::signed_in(Role::Staff));
        let events = session.subscribe();
        let transport = HttpTransport::new(&base, session.clone()).unwrap();

        let err = transport
            .send(ApiRequest::post("/bills").json(&json!({})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(session.token().is_none());
        assert!(!events.borrow().is_signed_in());

        // the retry never reaches the backend
        let err = transport
            .send(ApiRequest::post("/bills").json(&json!({})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_server_message_and_fallback() {
        let app = Router::new()
            .route(
                "/api/bills",
                post(|| async {
                    (
                        StatusCode::BAD_REQUEST,
                        Json(json!({"success": false, "message": "Insufficient stock for Dolo 650"})),
                    )
                }),
            )
            .route(
                "/api/reports/sales",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream crashed") }),
            );
        let base = serve(app).await;
        let transport = HttpTransport::new(&base, Arc::new(fixtures::signed_in(Role::Admin))).unwrap();

        let err = transport.send(ApiRequest::post("/bills")).await.unwrap_err();
        assert!(
            matches!(err, ClientError::Api { status: 400, ref message } if message == "Insufficient stock for Dolo 650")
        );

        let err = transport
            .send(ApiRequest::get("/reports/sales"))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ClientError::Api { status: 500, ref message } if message == FALLBACK_ERROR_MESSAGE)
        );

        let err = transport.send(ApiRequest::get("/nowhere")).await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_login_is_public_and_keeps_its_401_message() {
        let app = Router::new().route(
            "/api/auth/login",
            post(|headers: HeaderMap| async move {
                assert!(auth_header(&headers).is_empty());
                (StatusCode::UNAUTHORIZED, Json(json!({"message": "Invalid credentials"})))
            }),
        );
        let base = serve(app).await;
        let transport = HttpTransport::new(&base, Arc::new(SessionStore::in_memory())).unwrap();

        let err = transport
            .send(ApiRequest::post("/auth/login").json(&json!({"email": "a@b.c"})).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Api { status: 401, ref message } if message == "Invalid credentials"));
    }

    #[tokio::test]
    async fn test_multipart_body_is_not_json() {
        let app = Router::new().route(
            "/api/medicines",
            post(|headers: HeaderMap| async move {
                let content_type = headers
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or_default()
                    .to_string();
                Json(json!({"success": true, "data": content_type}))
            }),
        );
        let base = serve(app).await;
        let transport = HttpTransport::new(&base, Arc::new(fixtures::signed_in(Role::Admin))).unwrap();

        let form = FormPayload::default()
            .text("medicine_name", "ORS Sachet")
            .file(
                "image",
                ImageUpload {
                    file_name: "ors.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![0x89, 0x50, 0x4e, 0x47],
                },
            );
        let content_type: String = transport
            .data(ApiRequest::post("/medicines").multipart(form))
            .await
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        // bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let transport = HttpTransport::new(
            &format!("http://{}/api", addr),
            Arc::new(fixtures::signed_in(Role::Staff)),
        )
        .unwrap();
        let err = transport.send(ApiRequest::get("/medicines")).await.unwrap_err();
        assert!(matches!(err, ClientError::Network(_)));
    }
}
