use std::time::Duration;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::app::errors;
use crate::context::RequestContext;

/// Header carrying a per-request deadline in milliseconds.
pub const REQUEST_TIMEOUT_HEADER: &str = "x-request-timeout-ms";

#[derive(Debug, Clone)]
pub struct DeadlineState {
    pub default_timeout: Duration,
}

pub async fn deadline_middleware(
    State(state): State<DeadlineState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let timeout = match extract_timeout(req.headers()) {
        Ok(Some(timeout)) => timeout,
        Ok(None) => state.default_timeout,
        Err(message) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_timeout", message);
        }
    };

    req.extensions_mut().insert(RequestContext::new(timeout));
    next.run(req).await
}

fn extract_timeout(headers: &HeaderMap) -> Result<Option<Duration>, String> {
    let Some(header) = headers.get(REQUEST_TIMEOUT_HEADER) else {
        return Ok(None);
    };

    let raw = header
        .to_str()
        .map_err(|_| format!("{REQUEST_TIMEOUT_HEADER} must be ASCII"))?;

    let millis: u64 = raw
        .trim()
        .parse()
        .map_err(|_| format!("{REQUEST_TIMEOUT_HEADER} must be a whole number of milliseconds"))?;

    Ok(Some(Duration::from_millis(millis)))
}
