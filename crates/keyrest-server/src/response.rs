//! JSON response builders.

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Response, StatusCode};
use http_body_util::Full;
use keyrest_core::ErrorEnvelope;

/// Type alias for HTTP response body.
pub type ResponseBody = Full<Bytes>;

/// Type alias for the HTTP response.
pub type HttpResponse = Response<ResponseBody>;

const APPLICATION_JSON: &str = "application/json";

/// Builds a JSON response from an already encoded body.
#[must_use]
pub fn json_response(status: StatusCode, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    response
}

/// Builds an error response carrying `envelope`.
#[must_use]
pub fn error_response(status: StatusCode, envelope: &ErrorEnvelope) -> HttpResponse {
    let body = serde_json::to_vec(envelope).unwrap_or_else(|_| {
        br#"{"error":{"code":"INTERNAL_ERROR","message":"failed to encode error"}}"#.to_vec()
    });
    json_response(status, Bytes::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_error_response_shape() {
        let envelope = ErrorEnvelope::new("NOT_FOUND", "no route").with_request_id("r-1");
        let response = error_response(StatusCode::NOT_FOUND, &envelope);

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "NOT_FOUND");
        assert_eq!(json["request_id"], "r-1");
        assert!(json["error"].get("category").is_none());
    }
}
