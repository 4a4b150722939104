//! Request id generation and trace id extraction.

use axum::extract::Request;
use http::{HeaderMap, HeaderName, HeaderValue};
use tower_http::request_id::{MakeRequestId, RequestId};

/// Header carrying the per-request identifier.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// W3C trace context header.
pub const TRACEPARENT_HEADER: &str = "traceparent";

#[must_use]
pub fn header() -> HeaderName {
    HeaderName::from_static(REQUEST_ID_HEADER)
}

/// Generates UUID v7 request ids for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeReqId;

impl MakeRequestId for MakeReqId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::now_v7().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Correlation id for `req`: a well-formed `traceparent`, else the request id,
/// else a fresh UUID v7.
///
/// A request id with non-ASCII bytes is decoded lossily, so it matches the
/// echoed `x-request-id` whenever the client sent valid UTF-8.
#[must_use]
pub fn extract_trace_id(req: &Request) -> String {
    traceparent(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<RequestId>()
                .and_then(|id| header_text(id.header_value()))
        })
        .or_else(|| req.headers().get(REQUEST_ID_HEADER).and_then(header_text))
        .unwrap_or_else(|| uuid::Uuid::now_v7().to_string())
}

fn header_text(value: &HeaderValue) -> Option<String> {
    let text = String::from_utf8_lossy(value.as_bytes());
    (!text.is_empty()).then(|| text.into_owned())
}

fn traceparent(headers: &HeaderMap) -> Option<String> {
    header_str(headers, TRACEPARENT_HEADER).filter(|v| is_valid_traceparent(v))
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned)
}

/// `version-traceid-parentid-flags`, lowercase hex, non-zero ids.
fn is_valid_traceparent(value: &str) -> bool {
    let parts: Vec<&str> = value.split('-').collect();
    let &[version, trace_id, parent_id, flags] = parts.as_slice() else {
        return false;
    };

    is_lower_hex(version, 2)
        && version != "ff"
        && is_lower_hex(trace_id, 32)
        && is_non_zero(trace_id)
        && is_lower_hex(parent_id, 16)
        && is_non_zero(parent_id)
        && is_lower_hex(flags, 2)
}

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len
        && s
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

fn is_non_zero(s: &str) -> bool {
    s.bytes().any(|b| b != b'0')
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use axum::body::Body;

    const TRACEPARENT: &str = "00-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01";

    fn request(headers: &[(&str, &str)]) -> Request {
        let mut builder = http::Request::builder().uri("/x");
        for (k, v) in headers {
            builder = builder.header(*k, *v);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn prefers_valid_traceparent() {
        let req = request(&[(TRACEPARENT_HEADER, TRACEPARENT), (REQUEST_ID_HEADER, "rid-1")]);
        assert_eq!(extract_trace_id(&req), TRACEPARENT);
    }

    #[test]
    fn falls_back_to_request_id() {
        let req = request(&[(TRACEPARENT_HEADER, "garbage"), (REQUEST_ID_HEADER, "rid-1")]);
        assert_eq!(extract_trace_id(&req), "rid-1");
    }

    #[test]
    fn request_id_extension_wins_over_header() {
        let mut req = request(&[(REQUEST_ID_HEADER, "from-header")]);
        req.extensions_mut()
            .insert(RequestId::new(HeaderValue::from_static("from-layer")));
        assert_eq!(extract_trace_id(&req), "from-layer");
    }

    #[test]
    fn non_ascii_request_id_is_kept() {
        let mut req = request(&[]);
        req.extensions_mut().insert(RequestId::new(
            HeaderValue::from_bytes("req-\u{e9}t\u{e9}".as_bytes()).unwrap(),
        ));
        assert_eq!(extract_trace_id(&req), "req-\u{e9}t\u{e9}");
    }

    #[test]
    fn empty_request_id_is_replaced() {
        let req = request(&[(REQUEST_ID_HEADER, "")]);
        assert!(uuid::Uuid::parse_str(&extract_trace_id(&req)).is_ok());
    }

    #[test]
    fn generates_id_when_nothing_is_present() {
        let a = extract_trace_id(&request(&[]));
        let b = extract_trace_id(&request(&[]));
        assert!(uuid::Uuid::parse_str(&a).is_ok());
        assert_ne!(a, b);
    }

    #[test]
    fn traceparent_validation() {
        assert!(is_valid_traceparent(TRACEPARENT));
        assert!(!is_valid_traceparent(
            "ff-0af7651916cd43dd8448eb211c80319c-b7ad6b7169203331-01"
        ));
        assert!(!is_valid_traceparent(
            "00-00000000000000000000000000000000-b7ad6b7169203331-01"
        ));
        assert!(!is_valid_traceparent(
            "00-0AF7651916CD43DD8448EB211C80319C-b7ad6b7169203331-01"
        ));
        assert!(!is_valid_traceparent("00-abc-def-01"));
    }

    #[test]
    fn make_req_id_produces_uuid() {
        let req = http::Request::new(());
        let id = MakeReqId.make_request_id(&req).unwrap();
        let value = id.header_value().to_str().unwrap();
        assert!(uuid::Uuid::parse_str(value).is_ok());
    }
}
