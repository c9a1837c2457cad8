//! The key-directory REST surface.
//!
//! | Method | Path | Operation | Path bindings |
//! |--------|------|-----------|---------------|
//! | `GET` | `/v1/users/{user_id}` | `GetUser` | user 2 |
//! | `POST` | `/v1/users/{user_id}/keys` | `CreateKey` | user 2 |
//! | `PUT` | `/v1/users/{user_id}/keys/{key_id}` | `UpdateKey` | user 2, key 4 |
//! | `DELETE` | `/v1/users/{user_id}/keys/{key_id}` | `DeleteKey` | user 2, key 4 |
//!
//! Indices count the `/`-separated segments after the leading slash, so
//! `v1` is segment 0.

use std::sync::Arc;

use http::Method;
use keyrest_codec::PathBindings;
use keyrest_core::messages::{CreateKeyRequest, DeleteKeyRequest, GetUserRequest, UpdateKeyRequest};
use keyrest_core::{KeyDirectory, RequestContext};

use crate::route::RouteInfo;
use crate::router::RouteTable;

/// Path of a single user.
pub const USER_PATH: &str = "/v1/users/{user_id}";
/// Path of a user's key collection.
pub const KEYS_PATH: &str = "/v1/users/{user_id}/keys";
/// Path of a single key.
pub const KEY_PATH: &str = "/v1/users/{user_id}/keys/{key_id}";

const USER_SEGMENT: usize = 2;
const KEY_SEGMENT: usize = 4;

/// Builds the route table serving a [`KeyDirectory`].
#[must_use]
pub fn key_directory_routes<S: KeyDirectory>() -> RouteTable<S> {
    RouteTable::new()
        .with_route(RouteInfo::new(
            Method::GET,
            USER_PATH,
            PathBindings::user(USER_SEGMENT),
            |dir: Arc<S>, ctx: RequestContext, req: GetUserRequest| async move {
                dir.get_user(&ctx, req).await
            },
        ))
        .with_route(RouteInfo::new(
            Method::POST,
            KEYS_PATH,
            PathBindings::user(USER_SEGMENT),
            |dir: Arc<S>, ctx: RequestContext, req: CreateKeyRequest| async move {
                dir.create_key(&ctx, req).await
            },
        ))
        .with_route(RouteInfo::new(
            Method::PUT,
            KEY_PATH,
            PathBindings::user_and_key(USER_SEGMENT, KEY_SEGMENT),
            |dir: Arc<S>, ctx: RequestContext, req: UpdateKeyRequest| async move {
                dir.update_key(&ctx, req).await
            },
        ))
        .with_route(RouteInfo::new(
            Method::DELETE,
            KEY_PATH,
            PathBindings::user_and_key(USER_SEGMENT, KEY_SEGMENT),
            |dir: Arc<S>, ctx: RequestContext, req: DeleteKeyRequest| async move {
                dir.delete_key(&ctx, req).await
            },
        ))
}
