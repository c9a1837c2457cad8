//! The key-directory business contract.

use std::future::Future;

use crate::messages::{
    CreateKeyRequest, DeleteKeyRequest, Empty, GetUserRequest, KeyEntry, UpdateKeyRequest, User,
};
use crate::{RequestContext, RestResult};

/// Business logic behind the REST surface.
///
/// Implementations receive fully decoded records: identifiers are already
/// bound from the URL and timestamps are already structured. The REST layer
/// never inspects results beyond serializing them.
///
/// # Example
///
/// ```rust,ignore
/// use keyrest_core::{KeyDirectory, RequestContext, RestError, RestResult};
/// use keyrest_core::messages::*;
///
/// struct ReadOnly;
///
/// impl KeyDirectory for ReadOnly {
///     async fn get_user(&self, _ctx: &RequestContext, req: GetUserRequest) -> RestResult<User> {
///         Ok(User { user_id: req.user_id, keys: vec![] })
///     }
///     async fn create_key(&self, _ctx: &RequestContext, _req: CreateKeyRequest) -> RestResult<KeyEntry> {
///         Err(RestError::unavailable("read-only directory"))
///     }
///     // ...
/// }
/// ```
pub trait KeyDirectory: Send + Sync + 'static {
    /// Looks up a user and their keys.
    fn get_user(
        &self,
        ctx: &RequestContext,
        request: GetUserRequest,
    ) -> impl Future<Output = RestResult<User>> + Send;

    /// Publishes a new key for a user.
    fn create_key(
        &self,
        ctx: &RequestContext,
        request: CreateKeyRequest,
    ) -> impl Future<Output = RestResult<KeyEntry>> + Send;

    /// Replaces an existing key.
    fn update_key(
        &self,
        ctx: &RequestContext,
        request: UpdateKeyRequest,
    ) -> impl Future<Output = RestResult<KeyEntry>> + Send;

    /// Removes a key.
    fn delete_key(
        &self,
        ctx: &RequestContext,
        request: DeleteKeyRequest,
    ) -> impl Future<Output = RestResult<Empty>> + Send;
}
