//! Route descriptors.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use http::Method;
use keyrest_codec::{Decodable, PathBindings};
use keyrest_core::{RequestContext, RestResult};
use serde::Serialize;

use crate::dispatch::{BoxFuture, Dispatch, HandlerFn, HandlerInfo};

type Initializer<S> = Arc<dyn Fn() -> Box<dyn Dispatch<S>> + Send + Sync>;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PatternSegment {
    /// Must equal the request segment.
    Literal(String),
    /// `{name}`: any single non-empty segment.
    Param(String),
}

/// A registered route: method, path pattern, where its identifiers live in
/// the path, and how to build the per-request [`HandlerInfo`].
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use http::Method;
/// use keyrest_codec::PathBindings;
/// use keyrest_core::messages::{DeleteKeyRequest, Empty};
/// use keyrest_core::{RequestContext, RestResult};
/// use keyrest_server::RouteInfo;
///
/// struct Directory;
///
/// let route = RouteInfo::new(
///     Method::DELETE,
///     "/v1/users/{user_id}/keys/{key_id}",
///     PathBindings::user_and_key(2, 4),
///     |_dir: Arc<Directory>, _ctx: RequestContext, _req: DeleteKeyRequest| async move {
///         RestResult::Ok(Empty {})
///     },
/// );
///
/// assert_eq!(route.operation(), "DeleteKey");
/// assert!(route.matches_path("/v1/users/a@b.com/keys/k1"));
/// ```
pub struct RouteInfo<S> {
    method: Method,
    pattern: String,
    segments: Vec<PatternSegment>,
    bindings: PathBindings,
    operation: &'static str,
    initializer: Initializer<S>,
}

impl<S: Send + Sync + 'static> RouteInfo<S> {
    /// Creates a route whose requests decode into `Req` and are served by
    /// `handler`.
    pub fn new<Req, Res, F, Fut>(
        method: Method,
        pattern: impl Into<String>,
        bindings: PathBindings,
        handler: F,
    ) -> Self
    where
        Req: Decodable,
        Res: Serialize + Send + 'static,
        F: Fn(Arc<S>, RequestContext, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RestResult<Res>> + Send + 'static,
    {
        let pattern = pattern.into();
        let segments = parse_pattern(&pattern);

        let handler: HandlerFn<S, Req, Res> =
            Arc::new(move |state: Arc<S>, ctx: RequestContext, req: Req| -> BoxFuture<RestResult<Res>> {
                Box::pin(handler(state, ctx, req))
            });
        let initializer: Initializer<S> = Arc::new(move || {
            Box::new(HandlerInfo::new(Arc::clone(&handler))) as Box<dyn Dispatch<S>>
        });

        Self {
            method,
            pattern,
            segments,
            bindings,
            operation: Req::OPERATION,
            initializer,
        }
    }
}

impl<S> RouteInfo<S> {
    /// HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path pattern as registered.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Segment indices of the route's identifiers.
    #[must_use]
    pub fn bindings(&self) -> &PathBindings {
        &self.bindings
    }

    /// Operation name, taken from the record type.
    #[must_use]
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Builds a fresh, zero-valued [`HandlerInfo`] for one request.
    #[must_use]
    pub fn handler_info(&self) -> Box<dyn Dispatch<S>> {
        (self.initializer)()
    }

    /// Returns `true` if `path` has the pattern's shape.
    ///
    /// A single trailing slash on the request path is ignored.
    #[must_use]
    pub fn matches_path(&self, path: &str) -> bool {
        let path = path.strip_prefix('/').unwrap_or(path);
        let path = path.strip_suffix('/').unwrap_or(path);
        let mut request = path.split('/');

        for segment in &self.segments {
            let matched = match (segment, request.next()) {
                (PatternSegment::Literal(lit), Some(seg)) => lit == seg,
                (PatternSegment::Param(_), Some(seg)) => !seg.is_empty(),
                (_, None) => false,
            };
            if !matched {
                return false;
            }
        }

        request.next().is_none()
    }
}

impl<S> fmt::Debug for RouteInfo<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteInfo")
            .field("method", &self.method)
            .field("pattern", &self.pattern)
            .field("bindings", &self.bindings)
            .field("operation", &self.operation)
            .finish_non_exhaustive()
    }
}

fn parse_pattern(pattern: &str) -> Vec<PatternSegment> {
    let trimmed = pattern.strip_prefix('/').unwrap_or(pattern);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    trimmed
        .split('/')
        .map(|segment| {
            segment
                .strip_prefix('{')
                .and_then(|s| s.strip_suffix('}'))
                .map_or_else(
                    || PatternSegment::Literal(segment.to_string()),
                    |name| PatternSegment::Param(name.to_string()),
                )
        })
        .collect()
}
