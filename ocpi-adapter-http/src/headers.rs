//! OCPI request headers

use axum::http::HeaderMap;
use uuid::Uuid;

use ocpi_core::AccessToken;

// Lower-case, usable as static header names
pub const AUTHORIZATION: &str = "authorization";
pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_CORRELATION_ID: &str = "x-correlation-id";

/// `Authorization` header value for `token`
pub fn authorization(token: &AccessToken) -> String {
    format!("Token {}", token.as_str())
}

/// Correlation identifiers of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestIds {
    pub request_id: String,
    pub correlation_id: String,
}

impl RequestIds {
    /// Fresh ids for an outbound call
    pub fn generate() -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            correlation_id: Uuid::new_v4().to_string(),
        }
    }

    /// Ids of an inbound request; missing ones are generated
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let read = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string())
        };
        Self {
            request_id: read(X_REQUEST_ID),
            correlation_id: read(X_CORRELATION_ID),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, HeaderValue::from_static("req-1"));

        let ids = RequestIds::from_headers(&headers);
        assert_eq!(ids.request_id, "req-1");
        assert!(Uuid::parse_str(&ids.correlation_id).is_ok());
    }

    #[test]
    fn test_generate_is_unique() {
        let a = RequestIds::generate();
        let b = RequestIds::generate();
        assert_ne!(a.request_id, b.request_id);
        assert_ne!(a.request_id, a.correlation_id);
        assert_eq!(authorization(&AccessToken::new("abc")), "Token abc");
    }
}
