//! Pipeline boundary: the single place where failures become Problem responses.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::Response;
use http::{StatusCode, header};
use problemkit_errors::{
    APPLICATION_PROBLEM_JSON, FaultClassifier, Problem, RequestContext, catalog, finalize, render,
    validation_problem,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;

use crate::error::{ApiError, PendingProblem};
use crate::request_id::{self, MakeReqId};
use crate::settings::ProblemSettings;
use crate::{panic, trace};

/// Shared, read-only state of the problem-details middleware.
#[derive(Debug, Clone)]
pub struct ProblemState {
    classifier: Arc<FaultClassifier>,
    settings: ProblemSettings,
}

impl ProblemState {
    pub fn new(classifier: FaultClassifier, settings: ProblemSettings) -> Self {
        Self {
            classifier: Arc::new(classifier),
            settings,
        }
    }

    /// Standard classifier table configured from `settings`.
    pub fn from_settings(settings: ProblemSettings) -> Self {
        Self::new(FaultClassifier::standard(settings.detail_policy()), settings)
    }

    #[must_use]
    pub fn classifier(&self) -> &FaultClassifier {
        &self.classifier
    }

    #[must_use]
    pub fn settings(&self) -> &ProblemSettings {
        &self.settings
    }

    /// Translate `error` into its Problem.
    pub fn resolve(&self, error: &ApiError, ctx: &RequestContext) -> Problem {
        match error {
            ApiError::NotFound => finalize(catalog::NOT_FOUND.as_problem(), ctx),
            ApiError::Validation(errors) => validation_problem(errors, ctx)
                .unwrap_or_else(|| finalize(catalog::VALIDATION_FAILED.as_problem(), ctx)),
            ApiError::Rejected { status, detail } => {
                finalize(Problem::from_status(*status).with_detail(detail.as_str()), ctx)
            }
            ApiError::Fault(fault) => self.classifier.classify(fault, ctx),
        }
    }
}

impl Default for ProblemState {
    fn default() -> Self {
        Self::from_settings(ProblemSettings::default())
    }
}

/// Request context as seen by the Problem: path plus correlation id.
#[must_use]
pub fn request_context(req: &Request) -> RequestContext {
    RequestContext::new(req.uri().path(), request_id::extract_trace_id(req))
}

/// Resolves parked [`ApiError`]s and any other error response that is not
/// already a Problem into `application/problem+json`. Successes pass through.
pub async fn problem_details_middleware(
    State(state): State<ProblemState>,
    mut req: Request,
    next: Next,
) -> Response {
    let ctx = request_context(&req);
    req.extensions_mut().insert(state.settings.clone());

    let mut response = next.run(req).await;

    if let Some(PendingProblem(error)) = response.extensions_mut().remove::<PendingProblem>() {
        let problem = state.resolve(&error, &ctx);
        log_failure(&error, &problem);
        return render(problem);
    }

    if is_unstructured_error(&response) {
        return problem_for_unstructured(response, &ctx).await;
    }

    response
}

/// Largest error body carried over into `detail`.
const MAX_DETAIL_BODY: usize = 16 * 1024;

/// Error status that is not already a Problem: framework fallbacks, 405,
/// timeouts, plain `StatusCode` returns and axum's `text/plain` rejections
/// (`Path`, `Query`, `Form`).
fn is_unstructured_error(response: &Response) -> bool {
    let status = response.status();
    (status.is_client_error() || status.is_server_error()) && !is_problem(response)
}

fn is_problem(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with(APPLICATION_PROBLEM_JSON))
}

async fn problem_for_unstructured(response: Response, ctx: &RequestContext) -> Response {
    let status = response.status();
    let (mut parts, body) = response.into_parts();
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.remove(header::CONTENT_TYPE);

    let detail = body_text(body).await;

    tracing::debug!(
        status = status.as_u16(),
        instance = %ctx.instance,
        trace_id = %ctx.trace_id,
        detail = detail.as_deref(),
        "rendering unstructured error as problem"
    );

    let mut problem = Problem::from_status(status);
    if let Some(detail) = detail {
        problem = problem.with_detail(detail);
    }
    let mut rendered = render(finalize(problem, ctx));
    // keep framework headers such as `Allow`
    rendered.headers_mut().extend(parts.headers);
    rendered
}

/// Non-empty UTF-8 text of `body`, if it fits in [`MAX_DETAIL_BODY`].
async fn body_text(body: Body) -> Option<String> {
    let bytes = axum::body::to_bytes(body, MAX_DETAIL_BODY).await.ok()?;
    let text = std::str::from_utf8(&bytes).ok()?.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn log_failure(error: &ApiError, problem: &Problem) {
    let instance = problem.instance.as_deref().unwrap_or_default();
    let trace_id = problem.trace_id().unwrap_or_default();

    if problem.status.is_server_error() {
        let cause = error_chain(error);
        tracing::error!(
            status = problem.status.as_u16(),
            kind = error.fault_kind().map(|k| k.as_str()),
            instance,
            trace_id,
            error = %error,
            cause = cause.as_deref(),
            "request failed"
        );
    } else {
        tracing::debug!(
            status = problem.status.as_u16(),
            instance,
            trace_id,
            error = %error,
            "request rejected"
        );
    }
}

fn error_chain(error: &ApiError) -> Option<String> {
    let mut sources = std::iter::successors(std::error::Error::source(error), |e| e.source())
        .map(ToString::to_string)
        .peekable();
    sources.peek()?;
    Some(sources.collect::<Vec<_>>().join(": "))
}

/// Install the problem-details pipeline around `router`.
///
/// Runtime order (outermost first): `SetRequestId` → `PropagateRequestId` →
/// Trace → problem details → Timeout → `CatchPanic` → router.
pub fn apply_problem_stack(router: Router, state: ProblemState, timeout: Duration) -> Router {
    let x_request_id = request_id::header();

    router
        .layer(CatchPanicLayer::custom(panic::fault_from_panic))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            timeout,
        ))
        .layer(from_fn_with_state(state, problem_details_middleware))
        .layer(trace::http_trace_layer())
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(SetRequestIdLayer::new(x_request_id, MakeReqId))
}
