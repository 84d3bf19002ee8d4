//! OCPI response envelope and HTTP error mapping
//!
//! Every OCPI response body is `{data?, status_code, status_message,
//! timestamp}`. Handlers return `Result<_, ApiError>`; `ApiError` renders the
//! envelope with the matching HTTP status.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use ocpi_core::{timestamp, AuthError, PatchError, RegistrationStateError};

/// OCPI status codes
pub mod status {
    pub const SUCCESS: i32 = 1000;
    pub const CLIENT_ERROR: i32 = 2000;
    pub const INVALID_PARAMETERS: i32 = 2001;
    pub const NOT_ENOUGH_INFORMATION: i32 = 2002;
    pub const UNKNOWN_OBJECT: i32 = 2003;
    pub const SERVER_ERROR: i32 = 3000;
    pub const UNABLE_TO_USE_CLIENT_API: i32 = 3001;
    pub const UNSUPPORTED_VERSION: i32 = 3002;
    /// Client-side only: the request was never sent
    pub const LOCAL_FAILURE: i32 = -1;
}

/// Message of every successful response
pub const SUCCESS_MESSAGE: &str = "Hello world!";

/// OCPI response body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcpiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    pub status_code: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default = "timestamp::now", with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl<T> OcpiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            status_code: status::SUCCESS,
            status_message: Some(SUCCESS_MESSAGE.to_string()),
            timestamp: timestamp::now(),
        }
    }

    pub fn empty() -> Self {
        Self {
            data: None,
            status_code: status::SUCCESS,
            status_message: Some(SUCCESS_MESSAGE.to_string()),
            timestamp: timestamp::now(),
        }
    }

    pub fn error(status_code: i32, message: impl Into<String>) -> Self {
        Self {
            data: None,
            status_code,
            status_message: Some(message.into()),
            timestamp: timestamp::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == status::SUCCESS
    }
}

/// `200 OK` with data
pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<OcpiResponse<T>>) {
    (StatusCode::OK, Json(OcpiResponse::success(data)))
}

/// `201 Created` when `created`, else `200 OK`
pub fn stored<T: Serialize>(data: T, created: bool) -> (StatusCode, Json<OcpiResponse<T>>) {
    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    (status, Json(OcpiResponse::success(data)))
}

/// Handler failure rendered as an OCPI envelope
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub status_code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, status_code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            status_code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, status::INVALID_PARAMETERS, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, status::CLIENT_ERROR, message)
    }

    pub fn unknown_object(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, status::UNKNOWN_OBJECT, message)
    }

    pub fn unknown_version() -> Self {
        Self::new(StatusCode::NOT_FOUND, status::CLIENT_ERROR, "Unknown OCPI version!")
    }

    pub fn unable_to_use_client_api() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            status::UNABLE_TO_USE_CLIENT_API,
            "Unable to use the client's API!",
        )
    }

    pub fn unsupported_version() -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            status::UNSUPPORTED_VERSION,
            "No mutual OCPI version found!",
        )
    }

    /// Logs `detail` and hides it from the caller
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        error!("Server: Internal error: {}", detail);
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            status::SERVER_ERROR,
            "Internal server error!",
        )
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self::forbidden(err.to_string())
    }
}

impl From<RegistrationStateError> for ApiError {
    fn from(err: RegistrationStateError) -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, status::CLIENT_ERROR, err.to_string())
    }
}

impl From<PatchError> for ApiError {
    fn from(err: PatchError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = OcpiResponse::<()>::error(self.status_code, self.message);
        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_wire_format() {
        let value = serde_json::to_value(OcpiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(value["data"], json!([1, 2]));
        assert_eq!(value["status_code"], 1000);
        assert_eq!(value["status_message"], "Hello world!");
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));

        let value = serde_json::to_value(OcpiResponse::<()>::error(2000, "nope")).unwrap();
        assert!(value.get("data").is_none());
    }

    #[test]
    fn test_envelope_tolerates_missing_fields() {
        let parsed: OcpiResponse<String> =
            serde_json::from_value(json!({"status_code": 2001})).unwrap();
        assert_eq!(parsed.status_code, 2001);
        assert_eq!(parsed.data, None);
        assert!(!parsed.is_success());
    }

    #[test]
    fn test_envelope_of_credentials() {
        let parsed: OcpiResponse<ocpi_core::Credentials> = serde_json::from_value(json!({
            "data": {
                "token": "abc",
                "url": "http://emsp.example/versions",
                "business_details": {"name": "EMSP"},
                "country_code": "DE",
                "party_id": "EMP"
            },
            "status_code": 1000,
            "timestamp": "2020-10-01T10:00:00Z"
        }))
        .unwrap();
        assert!(parsed.is_success());
        assert_eq!(parsed.data.unwrap().party_id.as_str(), "EMP");

        let empty: OcpiResponse<ocpi_core::Credentials> =
            serde_json::from_value(json!({"status_code": 3001})).unwrap();
        assert_eq!(empty.status_code, 3001);
        assert!(empty.data.is_none());
    }

    #[test]
    fn test_error_mapping() {
        let forbidden = ApiError::from(AuthError::Blocked);
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
        assert_eq!(forbidden.status_code, 2000);
        assert_eq!(forbidden.message, "Invalid or blocked access token!");

        let unregistered = ApiError::from(RegistrationStateError::NotYetRegistered);
        assert_eq!(unregistered.status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(unregistered.status_code, 2000);

        let patch = ApiError::from(PatchError::ImmutableField {
            noun: "a connector",
            label: "identification",
        });
        assert_eq!(patch.status, StatusCode::BAD_REQUEST);
        assert_eq!(patch.status_code, 2001);
        assert_eq!(
            patch.message,
            "Patching the 'identification' of a connector is not allowed!"
        );

        let internal = ApiError::internal("disk on fire");
        assert_eq!(internal.status_code, 3000);
        assert_eq!(internal.message, "Internal server error!");
    }
}
