//! `X-Request-ID` propagation.

use http::header::{HeaderMap, HeaderName, HeaderValue};
use scoring_core::RequestId;

/// Header carrying the request id in both directions.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Reads the caller's request id, or generates one.
///
/// Only UUIDs are accepted from callers; anything else is replaced.
#[must_use]
pub fn request_id_from_headers(headers: &HeaderMap) -> RequestId {
    headers
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(RequestId::parse)
        .unwrap_or_else(RequestId::new)
}

/// Sets the response header.
pub fn set_request_id(headers: &mut HeaderMap, request_id: RequestId) {
    if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
        headers.insert(REQUEST_ID_HEADER, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_header_is_kept() {
        let mut headers = HeaderMap::new();
        headers.insert(
            REQUEST_ID_HEADER,
            HeaderValue::from_static("0190a7c2-5b1e-7c3d-8e4f-123456789abc"),
        );
        let id = request_id_from_headers(&headers);
        assert_eq!(id.to_string(), "0190a7c2-5b1e-7c3d-8e4f-123456789abc");
    }

    #[test]
    fn test_garbage_header_is_replaced() {
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        let id = request_id_from_headers(&headers);
        assert_ne!(id.to_string(), "not-a-uuid");
    }

    #[test]
    fn test_missing_header_generates_id() {
        let first = request_id_from_headers(&HeaderMap::new());
        let second = request_id_from_headers(&HeaderMap::new());
        assert_ne!(first, second);
    }

    #[test]
    fn test_set_request_id_round_trips() {
        let id = RequestId::new();
        let mut headers = HeaderMap::new();
        set_request_id(&mut headers, id);
        assert_eq!(request_id_from_headers(&headers), id);
    }
}
