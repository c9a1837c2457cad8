//! Route table and the HTTP-facing request handler.
//!
//! Routes are tried in registration order and the first one whose method and
//! path pattern both match serves the request.
//!
//! ```text
//! request ──► RouteTable lookup ──► HandlerInfo::parse ──► HandlerInfo::invoke ──► 200 JSON
//!                   │                      │                       │
//!                   ▼                      ▼                       ▼
//!              404 / 405            StatusPolicy status      RestError category status
//! ```

use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{HeaderValue, ALLOW};
use http::{Method, Request, StatusCode};
use keyrest_codec::RawRequest;
use keyrest_core::{ErrorCategory, ErrorEnvelope, RequestContext};
use keyrest_telemetry::metrics as telemetry;

use crate::policy::StatusPolicy;
use crate::response::{error_response, json_response, HttpResponse};
use crate::route::RouteInfo;

/// Operation label used for requests that matched no route.
pub const UNMATCHED_OPERATION: &str = "unmatched";

/// Outcome of looking a request up in a [`RouteTable`].
pub enum RouteLookup<'a, S> {
    /// A route matched both method and path.
    Found(&'a RouteInfo<S>),
    /// Some route matched the path, but none for this method.
    MethodNotAllowed(Vec<Method>),
    /// No route matched the path.
    NotFound,
}

impl<S> std::fmt::Debug for RouteLookup<'_, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Found(route) => f.debug_tuple("Found").field(route).finish(),
            Self::MethodNotAllowed(allowed) => {
                f.debug_tuple("MethodNotAllowed").field(allowed).finish()
            }
            Self::NotFound => f.write_str("NotFound"),
        }
    }
}

/// Ordered list of routes.
///
/// Built once at startup and then shared read-only between requests.
///
/// # Example
///
/// ```rust
/// use keyrest_server::{routes, RouteLookup, RouteTable};
/// use http::Method;
/// # use keyrest_core::{KeyDirectory, RequestContext, RestResult};
/// # use keyrest_core::messages::*;
/// # struct Dir;
/// # impl KeyDirectory for Dir {
/// #     async fn get_user(&self, _: &RequestContext, r: GetUserRequest) -> RestResult<User> { Ok(User::default()) }
/// #     async fn create_key(&self, _: &RequestContext, _: CreateKeyRequest) -> RestResult<KeyEntry> { Ok(KeyEntry::default()) }
/// #     async fn update_key(&self, _: &RequestContext, _: UpdateKeyRequest) -> RestResult<KeyEntry> { Ok(KeyEntry::default()) }
/// #     async fn delete_key(&self, _: &RequestContext, _: DeleteKeyRequest) -> RestResult<Empty> { Ok(Empty {}) }
/// # }
///
/// let table: RouteTable<Dir> = routes::key_directory_routes();
/// assert_eq!(table.len(), 4);
///
/// match table.lookup(&Method::GET, "/v1/users/alice@example.com") {
///     RouteLookup::Found(route) => assert_eq!(route.operation(), "GetUser"),
///     other => panic!("unexpected lookup result: {other:?}"),
/// }
/// ```
pub struct RouteTable<S> {
    routes: Vec<RouteInfo<S>>,
}

impl<S> RouteTable<S> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self { routes: Vec::new() }
    }

    /// Appends a route. Duplicates are kept; the earlier one wins.
    pub fn register(&mut self, route: RouteInfo<S>) {
        tracing::debug!(
            method = %route.method(),
            pattern = route.pattern(),
            operation = route.operation(),
            "route registered"
        );
        self.routes.push(route);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with_route(mut self, route: RouteInfo<S>) -> Self {
        self.register(route);
        self
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Registered routes in order.
    pub fn routes(&self) -> impl Iterator<Item = &RouteInfo<S>> {
        self.routes.iter()
    }

    /// Finds the route for a method and path.
    #[must_use]
    pub fn lookup(&self, method: &Method, path: &str) -> RouteLookup<'_, S> {
        let mut allowed = Vec::new();
        for route in self.routes.iter().filter(|r| r.matches_path(path)) {
            if route.method() == method {
                return RouteLookup::Found(route);
            }
            if !allowed.contains(route.method()) {
                allowed.push(route.method().clone());
            }
        }

        if allowed.is_empty() {
            RouteLookup::NotFound
        } else {
            RouteLookup::MethodNotAllowed(allowed)
        }
    }

    /// Freezes the table into a request handler serving `state`.
    #[must_use]
    pub fn into_handler(self, state: Arc<S>, policy: StatusPolicy) -> RestHandler<S> {
        RestHandler {
            routes: Arc::new(self),
            state,
            policy,
        }
    }
}

impl<S> Default for RouteTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for RouteTable<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.routes).finish()
    }
}

/// Serves requests against a frozen [`RouteTable`].
///
/// Cheap to clone; clones share the table and the state.
pub struct RestHandler<S> {
    routes: Arc<RouteTable<S>>,
    state: Arc<S>,
    policy: StatusPolicy,
}

impl<S> Clone for RestHandler<S> {
    fn clone(&self) -> Self {
        Self {
            routes: Arc::clone(&self.routes),
            state: Arc::clone(&self.state),
            policy: self.policy,
        }
    }
}

impl<S: Send + Sync + 'static> RestHandler<S> {
    /// The route table.
    #[must_use]
    pub fn routes(&self) -> &RouteTable<S> {
        &self.routes
    }

    /// The status policy for decode failures.
    #[must_use]
    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    /// Routes, decodes and dispatches one request with a collected body.
    pub async fn handle(&self, request: Request<Bytes>) -> HttpResponse {
        let started = Instant::now();
        let ctx = RequestContext::new();
        let request_id = ctx.request_id().to_string();

        tracing::debug!(
            request_id = %request_id,
            http.method = %request.method(),
            http.path = request.uri().path(),
            "request received"
        );

        let in_flight = telemetry::InFlight::enter();
        let (operation, response) = self.route(request, ctx, &request_id).await;
        drop(in_flight);

        let status = response.status();
        telemetry::record_request(operation, status.as_u16(), started.elapsed());
        tracing::debug!(
            request_id = %request_id,
            operation,
            http.status_code = status.as_u16(),
            duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "request completed"
        );

        response
    }

    async fn route(
        &self,
        request: Request<Bytes>,
        ctx: RequestContext,
        request_id: &str,
    ) -> (&'static str, HttpResponse) {
        let route = match self.routes.lookup(request.method(), request.uri().path()) {
            RouteLookup::Found(route) => route,
            RouteLookup::MethodNotAllowed(allowed) => {
                return (
                    UNMATCHED_OPERATION,
                    method_not_allowed(request.method(), &allowed, request_id),
                );
            }
            RouteLookup::NotFound => {
                return (
                    UNMATCHED_OPERATION,
                    not_found(request.uri().path(), request_id),
                );
            }
        };

        let operation = route.operation();
        let ctx = ctx.with_operation(operation);
        let raw = RawRequest::from(request);

        let mut info = route.handler_info();
        if let Err(error) = info.parse(&raw, route.bindings()) {
            let kind = error.kind();
            let status = self.policy.status_for(kind);
            tracing::warn!(
                request_id,
                operation,
                decode.kind = kind.code(),
                error = %error,
                "request rejected before dispatch"
            );
            telemetry::record_decode_failure(kind.code());
            let envelope =
                ErrorEnvelope::new(kind.code(), error.to_string()).with_request_id(request_id);
            return (operation, error_response(status, &envelope));
        }

        let response = match info.invoke_json(Arc::clone(&self.state), ctx).await {
            Ok(body) => json_response(StatusCode::OK, body),
            Err(error) => {
                if error.category() == ErrorCategory::Internal {
                    tracing::error!(request_id, operation, error = %error, "handler failed");
                } else {
                    tracing::debug!(request_id, operation, error = %error, "handler returned error");
                }
                error_response(error.status_code(), &error.to_envelope(Some(request_id)))
            }
        };

        (operation, response)
    }
}

fn not_found(path: &str, request_id: &str) -> HttpResponse {
    let envelope = ErrorEnvelope::new("NOT_FOUND", format!("no route for {path}"))
        .with_request_id(request_id);
    error_response(StatusCode::NOT_FOUND, &envelope)
}

fn method_not_allowed(method: &Method, allowed: &[Method], request_id: &str) -> HttpResponse {
    let allow = allowed
        .iter()
        .map(Method::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    let envelope = ErrorEnvelope::new(
        "METHOD_NOT_ALLOWED",
        format!("method {method} not allowed, expected one of: {allow}"),
    )
    .with_request_id(request_id);

    let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, &envelope);
    if let Ok(value) = HeaderValue::from_str(&allow) {
        response.headers_mut().insert(ALLOW, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use keyrest_codec::PathBindings;
    use keyrest_core::messages::{CreateKeyRequest, GetUserRequest, KeyEntry, User};
    use keyrest_core::RestError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Calls {
        get: AtomicUsize,
        create: AtomicUsize,
    }

    fn table() -> RouteTable<Calls> {
        RouteTable::new()
            .with_route(RouteInfo::new(
                Method::GET,
                "/v1/users/{user_id}",
                PathBindings::user(2),
                |calls: Arc<Calls>, _ctx: RequestContext, req: GetUserRequest| async move {
                    calls.get.fetch_add(1, Ordering::SeqCst);
                    if req.user_id == "ghost@example.com" {
                        return Err(RestError::not_found_resource("user", req.user_id));
                    }
                    if req.user_id == "broken@example.com" {
                        return Err(RestError::internal("directory offline"));
                    }
                    Ok(User {
                        user_id: req.user_id,
                        keys: Vec::new(),
                    })
                },
            ))
            .with_route(RouteInfo::new(
                Method::POST,
                "/v1/users/{user_id}/keys",
                PathBindings::user(2),
                |calls: Arc<Calls>, _ctx: RequestContext, req: CreateKeyRequest| async move {
                    calls.create.fetch_add(1, Ordering::SeqCst);
                    Ok(KeyEntry {
                        key_id: "k1".to_string(),
                        signed_key: req.signed_key.unwrap_or_default(),
                    })
                },
            ))
    }

    fn handler() -> (RestHandler<Calls>, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        (
            table().into_handler(Arc::clone(&calls), StatusPolicy::default()),
            calls,
        )
    }

    fn request(method: Method, uri: &str, body: &str) -> Request<Bytes> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Bytes::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: HttpResponse) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_lookup() {
        let table = table();
        assert!(matches!(
            table.lookup(&Method::GET, "/v1/users/a@b.com"),
            RouteLookup::Found(route) if route.operation() == "GetUser"
        ));
        assert!(matches!(
            table.lookup(&Method::GET, "/v1/groups/a"),
            RouteLookup::NotFound
        ));
        match table.lookup(&Method::DELETE, "/v1/users/a@b.com") {
            RouteLookup::MethodNotAllowed(allowed) => assert_eq!(allowed, vec![Method::GET]),
            other => panic!("unexpected lookup result: {other:?}"),
        }
    }

    #[test]
    fn test_first_registration_wins() {
        let table = table().with_route(RouteInfo::new(
            Method::GET,
            "/v1/users/{user_id}",
            PathBindings::user(2),
            |_calls: Arc<Calls>, _ctx: RequestContext, _req: GetUserRequest| async move {
                Err::<User, _>(RestError::internal("shadowed"))
            },
        ));
        assert_eq!(table.len(), 3);

        match table.lookup(&Method::GET, "/v1/users/a@b.com") {
            RouteLookup::Found(route) => assert!(std::ptr::eq(
                route,
                table.routes().next().unwrap()
            )),
            other => panic!("unexpected lookup result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success() {
        let (handler, calls) = handler();
        let response = handler
            .handle(request(Method::GET, "/v1/users/alice@example.com", ""))
            .await;

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["user_id"], "alice@example.com");
        assert_eq!(calls.get.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_bad_timestamp_never_reaches_handler() {
        let (handler, calls) = handler();
        let response = handler
            .handle(request(
                Method::POST,
                "/v1/users/alice@example.com/keys",
                r#"{"signed_key": {"key": {"creation_time": "invalid"}}}"#,
            ))
            .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "TIMESTAMP_FORMAT_ERROR");
        assert!(json["request_id"].is_string());
        assert_eq!(calls.create.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_policy_overrides_decode_status() {
        let calls = Arc::new(Calls::default());
        let policy = StatusPolicy::default().with_status(
            keyrest_codec::DecodeErrorKind::Body,
            StatusCode::UNPROCESSABLE_ENTITY,
        );
        let handler = table().into_handler(calls, policy);

        let response = handler
            .handle(request(Method::POST, "/v1/users/a@b.com/keys", "{oops"))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_handler_error_uses_category_status() {
        let (handler, _calls) = handler();

        let response = handler
            .handle(request(Method::GET, "/v1/users/ghost@example.com", ""))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["category"], "not_found");
        assert_eq!(json["error"]["details"]["resource_id"], "ghost@example.com");

        let response = handler
            .handle(request(Method::GET, "/v1/users/broken@example.com", ""))
            .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_not_found() {
        let (handler, _calls) = handler();
        let response = handler.handle(request(Method::GET, "/v2/anything", "")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_method_not_allowed() {
        let (handler, calls) = handler();
        let response = handler
            .handle(request(Method::PATCH, "/v1/users/a@b.com/keys", "{}"))
            .await;

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()[ALLOW], "POST");
        assert_eq!(calls.create.load(Ordering::SeqCst), 0);
    }
}
