//! HTTP request span for the problem-details stack.

use std::time::Duration;

use axum::extract::Request;
use axum::response::Response;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnRequest, TraceLayer};
use tracing::Span;
use tracing::field::Empty;

use crate::request_id;

type MakeSpanFn = fn(&Request) -> Span;
type OnResponseFn = fn(&Response, Duration, &Span);

/// Concrete trace layer type installed by [`apply_problem_stack`](crate::apply_problem_stack).
pub type HttpTraceLayer =
    TraceLayer<SharedClassifier<ServerErrorsAsFailures>, MakeSpanFn, DefaultOnRequest, OnResponseFn>;

#[must_use]
pub fn http_trace_layer() -> HttpTraceLayer {
    TraceLayer::new_for_http()
        .make_span_with(make_span as MakeSpanFn)
        .on_response(on_response as OnResponseFn)
}

fn make_span(req: &Request) -> Span {
    let rid = req
        .headers()
        .get(request_id::REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("n/a");

    tracing::info_span!(
        "http_request",
        method = %req.method(),
        uri = %req.uri().path(),
        version = ?req.version(),
        request_id = %rid,
        status = Empty,
        latency_ms = Empty,
    )
}

fn on_response(res: &Response, latency: Duration, span: &Span) {
    let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
    span.record("status", res.status().as_u16());
    span.record("latency_ms", ms);
}
