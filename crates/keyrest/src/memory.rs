//! In-memory key directory.

use std::collections::HashMap;

use keyrest_core::messages::{
    CreateKeyRequest, DeleteKeyRequest, Empty, GetUserRequest, KeyEntry, SignedKey,
    UpdateKeyRequest, User,
};
use keyrest_core::{KeyDirectory, RequestContext, RestError, RestResult, Timestamp};
use parking_lot::RwLock;
use uuid::Uuid;

/// A [`KeyDirectory`] that keeps everything in process memory.
///
/// Users come into existence with their first key. Key ids are UUIDv7, so
/// keys list in creation order. Nothing survives a restart.
///
/// # Example
///
/// ```rust
/// use keyrest::MemoryKeyDirectory;
/// use keyrest::core::messages::{CreateKeyRequest, GetUserRequest, Key, SignedKey};
/// use keyrest::core::{KeyDirectory, RequestContext};
///
/// # tokio_test::block_on(async {
/// let directory = MemoryKeyDirectory::new();
/// let ctx = RequestContext::new();
///
/// let created = directory
///     .create_key(&ctx, CreateKeyRequest {
///         user_id: "alice@example.com".to_string(),
///         signed_key: Some(SignedKey {
///             key: Some(Key { app_id: "gmail".to_string(), ..Key::default() }),
///             signature: "sig".to_string(),
///         }),
///     })
///     .await
///     .unwrap();
///
/// let user = directory
///     .get_user(&ctx, GetUserRequest { user_id: "alice@example.com".to_string(), ..Default::default() })
///     .await
///     .unwrap();
/// assert_eq!(user.keys, vec![created]);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct MemoryKeyDirectory {
    users: RwLock<HashMap<String, Vec<KeyEntry>>>,
}

impl MemoryKeyDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of users with at least one key.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.read().len()
    }

    /// Number of keys across all users.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.users.read().values().map(Vec::len).sum()
    }
}

fn user_not_found(user_id: &str) -> RestError {
    RestError::not_found_resource("user", user_id)
}

fn key_not_found(key_id: &str) -> RestError {
    RestError::not_found_resource("key", key_id)
}

/// Checks the submitted key and stamps a missing creation time.
fn accept_signed_key(signed_key: Option<SignedKey>) -> RestResult<SignedKey> {
    let mut signed_key =
        signed_key.ok_or_else(|| RestError::validation_field("signed_key", "signed_key is required"))?;
    let key = signed_key
        .key
        .as_mut()
        .ok_or_else(|| RestError::validation_field("signed_key.key", "key is required"))?;
    if key.app_id.is_empty() {
        return Err(RestError::validation_field(
            "signed_key.key.app_id",
            "app_id must not be empty",
        ));
    }
    if key.creation_time.is_none() {
        key.creation_time = Some(Timestamp::now());
    }
    Ok(signed_key)
}

impl KeyDirectory for MemoryKeyDirectory {
    async fn get_user(&self, _ctx: &RequestContext, request: GetUserRequest) -> RestResult<User> {
        let users = self.users.read();
        let keys = users
            .get(&request.user_id)
            .ok_or_else(|| user_not_found(&request.user_id))?;

        let keys = keys
            .iter()
            .filter(|entry| {
                let key = entry.signed_key.key.as_ref();
                let app_matches = request.app_id.is_empty()
                    || key.is_some_and(|k| k.app_id == request.app_id);
                let existed = match (request.time, key.and_then(|k| k.creation_time)) {
                    (Some(as_of), Some(created)) => created <= as_of,
                    _ => true,
                };
                app_matches && existed
            })
            .cloned()
            .collect();

        Ok(User {
            user_id: request.user_id,
            keys,
        })
    }

    async fn create_key(
        &self,
        ctx: &RequestContext,
        request: CreateKeyRequest,
    ) -> RestResult<KeyEntry> {
        let entry = KeyEntry {
            key_id: Uuid::now_v7().to_string(),
            signed_key: accept_signed_key(request.signed_key)?,
        };

        self.users
            .write()
            .entry(request.user_id.clone())
            .or_default()
            .push(entry.clone());

        tracing::info!(
            request_id = %ctx.request_id(),
            user_id = %request.user_id,
            key_id = %entry.key_id,
            "key created"
        );
        Ok(entry)
    }

    async fn update_key(
        &self,
        ctx: &RequestContext,
        request: UpdateKeyRequest,
    ) -> RestResult<KeyEntry> {
        let signed_key = accept_signed_key(request.signed_key)?;

        let mut users = self.users.write();
        let keys = users
            .get_mut(&request.user_id)
            .ok_or_else(|| user_not_found(&request.user_id))?;
        let entry = keys
            .iter_mut()
            .find(|entry| entry.key_id == request.key_id)
            .ok_or_else(|| key_not_found(&request.key_id))?;
        entry.signed_key = signed_key;

        tracing::info!(
            request_id = %ctx.request_id(),
            user_id = %request.user_id,
            key_id = %request.key_id,
            "key updated"
        );
        Ok(entry.clone())
    }

    async fn delete_key(&self, ctx: &RequestContext, request: DeleteKeyRequest) -> RestResult<Empty> {
        let mut users = self.users.write();
        let keys = users
            .get_mut(&request.user_id)
            .ok_or_else(|| user_not_found(&request.user_id))?;
        let position = keys
            .iter()
            .position(|entry| entry.key_id == request.key_id)
            .ok_or_else(|| key_not_found(&request.key_id))?;
        keys.remove(position);
        if keys.is_empty() {
            users.remove(&request.user_id);
        }

        tracing::info!(
            request_id = %ctx.request_id(),
            user_id = %request.user_id,
            key_id = %request.key_id,
            "key deleted"
        );
        Ok(Empty {})
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyrest_core::messages::Key;
    use keyrest_core::ErrorCategory;

    const ALICE: &str = "alice@example.com";

    fn signed(app_id: &str, created: Option<Timestamp>) -> Option<SignedKey> {
        Some(SignedKey {
            key: Some(Key {
                app_id: app_id.to_string(),
                key: "pubkey".to_string(),
                creation_time: created,
            }),
            signature: "sig".to_string(),
        })
    }

    async fn create(dir: &MemoryKeyDirectory, app_id: &str, created: Option<Timestamp>) -> KeyEntry {
        dir.create_key(
            &RequestContext::new(),
            CreateKeyRequest {
                user_id: ALICE.to_string(),
                signed_key: signed(app_id, created),
            },
        )
        .await
        .unwrap()
    }

    fn get(app_id: &str, time: Option<Timestamp>) -> GetUserRequest {
        GetUserRequest {
            user_id: ALICE.to_string(),
            app_id: app_id.to_string(),
            time,
        }
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let dir = MemoryKeyDirectory::new();
        let err = dir.get_user(&RequestContext::new(), get("", None)).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_create_stamps_missing_creation_time() {
        let dir = MemoryKeyDirectory::new();
        let entry = create(&dir, "gmail", None).await;

        assert!(!entry.key_id.is_empty());
        let key = entry.signed_key.key.unwrap();
        assert!(key.creation_time.is_some());
        assert_eq!(dir.user_count(), 1);
    }

    #[tokio::test]
    async fn test_create_requires_signed_key() {
        let dir = MemoryKeyDirectory::new();
        let err = dir
            .create_key(
                &RequestContext::new(),
                CreateKeyRequest {
                    user_id: ALICE.to_string(),
                    signed_key: None,
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(dir.key_count(), 0);
    }

    #[tokio::test]
    async fn test_get_user_filters() {
        let dir = MemoryKeyDirectory::new();
        let early = create(&dir, "gmail", Some(Timestamp::new(1_000, 0))).await;
        let late = create(&dir, "gmail", Some(Timestamp::new(2_000, 0))).await;
        let other = create(&dir, "chat", Some(Timestamp::new(1_500, 0))).await;
        let ctx = RequestContext::new();

        let all = dir.get_user(&ctx, get("", None)).await.unwrap();
        assert_eq!(all.keys, vec![early.clone(), late.clone(), other.clone()]);

        let gmail = dir.get_user(&ctx, get("gmail", None)).await.unwrap();
        assert_eq!(gmail.keys, vec![early.clone(), late]);

        let as_of = dir
            .get_user(&ctx, get("", Some(Timestamp::new(1_500, 0))))
            .await
            .unwrap();
        assert_eq!(as_of.keys, vec![early, other]);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let dir = MemoryKeyDirectory::new();
        let entry = create(&dir, "gmail", Some(Timestamp::new(1_000, 0))).await;
        let ctx = RequestContext::new();

        let updated = dir
            .update_key(
                &ctx,
                UpdateKeyRequest {
                    user_id: ALICE.to_string(),
                    key_id: entry.key_id.clone(),
                    signed_key: signed("chat", Some(Timestamp::new(3_000, 0))),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.key_id, entry.key_id);
        assert_eq!(updated.signed_key.key.unwrap().app_id, "chat");

        let delete = DeleteKeyRequest {
            user_id: ALICE.to_string(),
            key_id: entry.key_id.clone(),
        };
        dir.delete_key(&ctx, delete.clone()).await.unwrap();
        assert_eq!(dir.user_count(), 0);

        let err = dir.delete_key(&ctx, delete).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[tokio::test]
    async fn test_update_unknown_key() {
        let dir = MemoryKeyDirectory::new();
        create(&dir, "gmail", None).await;

        let err = dir
            .update_key(
                &RequestContext::new(),
                UpdateKeyRequest {
                    user_id: ALICE.to_string(),
                    key_id: "missing".to_string(),
                    signed_key: signed("gmail", None),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
        assert!(err.to_string().contains("missing"));
    }
}
