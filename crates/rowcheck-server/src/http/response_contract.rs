// SPDX-License-Identifier: Apache-2.0

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rowcheck_core::{Error, ErrorCode};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{error, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct ApiError {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

#[must_use]
pub(crate) fn api_error_status(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidInput | ErrorCode::ParseError => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// A failed request, not yet bound to a request id.
#[derive(Debug)]
pub(crate) struct ApiFailure {
    status: StatusCode,
    code: ErrorCode,
    message: String,
    details: Value,
}

impl ApiFailure {
    /// The request itself is malformed (wrong body type, missing field or
    /// parameter), as opposed to carrying a bad value.
    pub(crate) fn unprocessable(message: &str, details: Value) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            code: ErrorCode::InvalidInput,
            message: message.to_string(),
            details,
        }
    }

    pub(crate) fn internal(message: &str, details: Value) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: ErrorCode::StorageFailure,
            message: message.to_string(),
            details,
        }
    }

    #[must_use]
    pub(crate) fn status(&self) -> StatusCode {
        self.status
    }

    pub(crate) fn into_response_for(self, request_id: &str) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(code = %self.code, status = status.as_u16(), "{}", self.message);
        } else {
            warn!(code = %self.code, status = status.as_u16(), "{}", self.message);
        }
        api_error_response(
            status,
            ApiError {
                code: self.code.as_str(),
                message: self.message,
                details: self.details,
                request_id: request_id.to_string(),
            },
        )
    }
}

impl From<Error> for ApiFailure {
    fn from(err: Error) -> Self {
        let code = err.code();
        let details = match &err {
            Error::PayloadTooLarge { limit } => json!({"limit_bytes": limit}),
            _ => json!({}),
        };
        Self {
            status: api_error_status(code),
            code,
            message: err.to_string(),
            details,
        }
    }
}

#[must_use]
pub(crate) fn api_error_response(status: StatusCode, err: ApiError) -> Response {
    (status, Json(json!({"error": err}))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_errors_map_to_client_visible_statuses() {
        let cases = [
            (Error::InvalidInput("bad".into()), StatusCode::BAD_REQUEST),
            (Error::Parse("bad".into()), StatusCode::BAD_REQUEST),
            (Error::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (
                Error::PayloadTooLarge { limit: 10 },
                StatusCode::PAYLOAD_TOO_LARGE,
            ),
            (
                Error::storage("write", std::io::Error::other("disk full")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiFailure::from(err).status(), status);
        }
    }

    #[test]
    fn unprocessable_is_an_invalid_input_with_422() {
        let failure = ApiFailure::unprocessable("missing field", json!({}));
        assert_eq!(failure.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(failure.code, ErrorCode::InvalidInput);
    }
}
