//! [`Decodable`] implementations for the key-directory records.

use keyrest_core::messages::{CreateKeyRequest, DeleteKeyRequest, GetUserRequest, UpdateKeyRequest};
use keyrest_core::Timestamp;
use serde::Deserialize;

use crate::{Decodable, DecodeError, PathField};

/// Query parameters accepted by `GetUser`.
#[derive(Debug, Default, Deserialize)]
struct GetUserQuery {
    app_id: Option<String>,
    time: Option<String>,
}

impl Decodable for GetUserRequest {
    const OPERATION: &'static str = "GetUser";
    const PATH_FIELDS: &'static [PathField] = &[PathField::UserId];
    // `time` only comes from the query
    const TIMESTAMP_FIELDS: &'static [&'static str] = &[];

    fn bind_path_field(&mut self, field: PathField, value: String) {
        if field == PathField::UserId {
            self.user_id = value;
        }
    }

    fn bind_query(&mut self, query: &str) -> Result<(), DecodeError> {
        let params: GetUserQuery = serde_urlencoded::from_str(query)?;
        if let Some(app_id) = params.app_id {
            self.app_id = app_id;
        }
        if let Some(time) = params.time {
            let parsed = Timestamp::parse_rfc3339(&time).map_err(|source| {
                DecodeError::QueryTimestamp {
                    parameter: "time",
                    source,
                }
            })?;
            self.time = Some(parsed);
        }
        Ok(())
    }
}

impl Decodable for CreateKeyRequest {
    const OPERATION: &'static str = "CreateKey";
    const PATH_FIELDS: &'static [PathField] = &[PathField::UserId];

    fn bind_path_field(&mut self, field: PathField, value: String) {
        if field == PathField::UserId {
            self.user_id = value;
        }
    }
}

impl Decodable for UpdateKeyRequest {
    const OPERATION: &'static str = "UpdateKey";
    const PATH_FIELDS: &'static [PathField] = &[PathField::UserId, PathField::KeyId];

    fn bind_path_field(&mut self, field: PathField, value: String) {
        match field {
            PathField::UserId => self.user_id = value,
            PathField::KeyId => self.key_id = value,
        }
    }
}

impl Decodable for DeleteKeyRequest {
    const OPERATION: &'static str = "DeleteKey";
    const PATH_FIELDS: &'static [PathField] = &[PathField::UserId, PathField::KeyId];
    const TIMESTAMP_FIELDS: &'static [&'static str] = &[];

    fn bind_path_field(&mut self, field: PathField, value: String) {
        match field {
            PathField::UserId => self.user_id = value,
            PathField::KeyId => self.key_id = value,
        }
    }
}
