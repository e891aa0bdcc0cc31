//! HTTP response building helpers
//!
//! All handlers answer with JSON. Errors share one shape: `{"error": "..."}`.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{header, Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::error::{ErrorKind, SocialError};

/// Build a JSON response with the given status code
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(json)))
        .unwrap()
}

/// Build a JSON response with 200 OK status
pub fn ok<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::OK, body)
}

/// Build a JSON response with 201 Created status
pub fn created<T: Serialize>(body: &T) -> Response<Full<Bytes>> {
    json_response(StatusCode::CREATED, body)
}

/// Build an empty response with 204 No Content status
pub fn no_content() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .body(Full::new(Bytes::new()))
        .unwrap()
}

/// Build a 404 Not Found response with message
pub fn not_found(message: &str) -> Response<Full<Bytes>> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": message }),
    )
}

/// Build a 405 Method Not Allowed response
pub fn method_not_allowed() -> Response<Full<Bytes>> {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &serde_json::json!({ "error": "Method not allowed" }),
    )
}

/// Status code for an error kind
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
        ErrorKind::AlreadyExists => StatusCode::CONFLICT,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Convert a SocialError to an appropriate HTTP response
pub fn error_response(err: SocialError) -> Response<Full<Bytes>> {
    let kind = err.kind();
    let message = match &err {
        SocialError::NotFound(msg)
        | SocialError::InvalidArgument(msg)
        | SocialError::AlreadyExists(msg)
        | SocialError::Forbidden(msg)
        | SocialError::Unauthenticated(msg) => msg.clone(),
        SocialError::Json(e) => format!("Invalid JSON body: {}", e),
        _ => {
            error!(error = %err, "Request failed");
            "Internal server error".to_string()
        }
    };

    json_response(status_for(kind), &serde_json::json!({ "error": message }))
}

/// Result type alias for handlers
pub type HandlerResult = Result<Response<Full<Bytes>>, SocialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        let cases = [
            (SocialError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (SocialError::InvalidArgument("x".into()), StatusCode::BAD_REQUEST),
            (SocialError::AlreadyExists("x".into()), StatusCode::CONFLICT),
            (SocialError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (SocialError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (SocialError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(error_response(err).status(), status);
        }
    }

    #[test]
    fn test_json_content_type() {
        let resp = ok(&serde_json::json!({ "status": "ok" }));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }
}
