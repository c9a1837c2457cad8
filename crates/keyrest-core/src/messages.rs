//! Key-directory request and response records.
//!
//! All fields default to their zero value so that a record can be built
//! empty and then filled from the URL path, the query string and the JSON
//! body in turn.

use serde::{Deserialize, Serialize};

use crate::Timestamp;

/// A public key published by a user for one application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Key {
    /// Application the key is used with (e.g. `gmail`).
    pub app_id: String,
    /// Opaque key material.
    pub key: String,
    /// When the key was created.
    pub creation_time: Option<Timestamp>,
}

/// A key together with the signature that binds it to its owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignedKey {
    /// The signed key.
    pub key: Option<Key>,
    /// Opaque signature over `key`.
    pub signature: String,
}

/// A signed key as stored in the directory, with its identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyEntry {
    /// Key identifier, unique per user.
    pub key_id: String,
    /// The stored signed key.
    pub signed_key: SignedKey,
}

/// A user and the keys published for them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    /// User identifier (usually an email address).
    pub user_id: String,
    /// Published keys.
    pub keys: Vec<KeyEntry>,
}

/// `GET /v1/users/{user_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GetUserRequest {
    /// User to look up. Bound from the path.
    pub user_id: String,
    /// Restrict the result to keys of this application.
    pub app_id: String,
    /// Return the directory state as of this time.
    pub time: Option<Timestamp>,
}

/// `POST /v1/users/{user_id}/keys`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateKeyRequest {
    /// Owner of the new key. Bound from the path.
    pub user_id: String,
    /// The key to publish.
    pub signed_key: Option<SignedKey>,
}

/// `PUT /v1/users/{user_id}/keys/{key_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateKeyRequest {
    /// Owner of the key. Bound from the path.
    pub user_id: String,
    /// Key to replace. Bound from the path.
    pub key_id: String,
    /// The replacement key.
    pub signed_key: Option<SignedKey>,
}

/// `DELETE /v1/users/{user_id}/keys/{key_id}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteKeyRequest {
    /// Owner of the key. Bound from the path.
    pub user_id: String,
    /// Key to remove. Bound from the path.
    pub key_id: String,
}

/// Empty response body returned by operations with nothing to report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_decode_from_empty_object() {
        let req: CreateKeyRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, CreateKeyRequest::default());

        let req: GetUserRequest = serde_json::from_str("{}").unwrap();
        assert!(req.time.is_none());
    }

    #[test]
    fn test_nested_creation_time() {
        let json = r#"{"signed_key":{"key": {"creation_time": {"seconds": 1431993516, "nanos": 0}}}}"#;
        let req: CreateKeyRequest = serde_json::from_str(json).unwrap();
        let time = req.signed_key.and_then(|s| s.key).and_then(|k| k.creation_time);
        assert_eq!(time, Some(Timestamp::new(1_431_993_516, 0)));
    }

    #[test]
    fn test_user_serialization() {
        let user = User {
            user_id: "alice@example.com".to_string(),
            keys: vec![KeyEntry {
                key_id: "k1".to_string(),
                signed_key: SignedKey::default(),
            }],
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["user_id"], "alice@example.com");
        assert_eq!(json["keys"][0]["key_id"], "k1");
    }

    #[test]
    fn test_empty_serializes_to_object() {
        assert_eq!(serde_json::to_string(&Empty {}).unwrap(), "{}");
    }
}
