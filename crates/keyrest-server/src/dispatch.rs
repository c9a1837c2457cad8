//! Per-request decode and invoke.
//!
//! Each matched request gets a fresh [`HandlerInfo`] from its route. The
//! info owns the zero-valued request record, fills it by decoding the raw
//! request ([`HandlerInfo::parse`]) and hands it to the business handler
//! ([`HandlerInfo::invoke`]). A record that fails to decode never reaches
//! the handler.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use keyrest_codec::{decode, Decodable, DecodeError, PathBindings, RawRequest};
use keyrest_core::{RequestContext, RestError, RestResult};
use serde::Serialize;

/// Type alias for a boxed, sendable future.
pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;

/// A type-erased business handler for one record type.
pub type HandlerFn<S, Req, Res> =
    Arc<dyn Fn(Arc<S>, RequestContext, Req) -> BoxFuture<RestResult<Res>> + Send + Sync>;

/// Decode-then-invoke state for a single request.
pub struct HandlerInfo<S, Req, Res> {
    argument: Req,
    handler: HandlerFn<S, Req, Res>,
}

impl<S, Req, Res> HandlerInfo<S, Req, Res>
where
    S: Send + Sync + 'static,
    Req: Decodable,
    Res: Serialize + Send + 'static,
{
    /// Creates an info holding a zero-valued record.
    #[must_use]
    pub fn new(handler: HandlerFn<S, Req, Res>) -> Self {
        Self {
            argument: Req::default(),
            handler,
        }
    }

    /// The record as decoded so far.
    #[must_use]
    pub fn argument(&self) -> &Req {
        &self.argument
    }

    /// Decodes `request` into the record.
    ///
    /// On error the record keeps its previous value.
    pub fn parse(&mut self, request: &RawRequest, bindings: &PathBindings) -> Result<(), DecodeError> {
        self.argument = decode::<Req>(request, bindings)?;
        Ok(())
    }

    /// Calls the business handler with the decoded record.
    pub async fn invoke(self, state: Arc<S>, ctx: RequestContext) -> RestResult<Res> {
        (self.handler)(state, ctx, self.argument).await
    }
}

/// Object-safe view of a [`HandlerInfo`], so routes with different record
/// types can share one table.
pub trait Dispatch<S>: Send {
    /// Operation name of the record type.
    fn operation(&self) -> &'static str;

    /// See [`HandlerInfo::parse`].
    fn parse(&mut self, request: &RawRequest, bindings: &PathBindings) -> Result<(), DecodeError>;

    /// Invokes the handler and JSON-encodes its result.
    fn invoke_json(self: Box<Self>, state: Arc<S>, ctx: RequestContext) -> BoxFuture<RestResult<Bytes>>;
}

impl<S, Req, Res> Dispatch<S> for HandlerInfo<S, Req, Res>
where
    S: Send + Sync + 'static,
    Req: Decodable,
    Res: Serialize + Send + 'static,
{
    fn operation(&self) -> &'static str {
        Req::OPERATION
    }

    fn parse(&mut self, request: &RawRequest, bindings: &PathBindings) -> Result<(), DecodeError> {
        HandlerInfo::parse(self, request, bindings)
    }

    fn invoke_json(self: Box<Self>, state: Arc<S>, ctx: RequestContext) -> BoxFuture<RestResult<Bytes>> {
        Box::pin(async move {
            let response = (*self).invoke(state, ctx).await?;
            serde_json::to_vec(&response)
                .map(Bytes::from)
                .map_err(|e| RestError::internal_with_source("failed to encode response", e))
        })
    }
}
