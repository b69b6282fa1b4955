//! HTTP helpers for the Lambda response.

use lambda_http::{Body, Response};
use serde::Serialize;

/// Error payload.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Cache directive for responses that must always be recomputed.
pub const NO_STORE: &str = "no-store";

/// Shared-cache freshness window with an equally long stale grace period.
pub fn cache_control(max_age_secs: u32) -> String {
    if max_age_secs == 0 {
        NO_STORE.to_string()
    } else {
        format!(
            "s-maxage={}, stale-while-revalidate={}",
            max_age_secs,
            max_age_secs.saturating_mul(2)
        )
    }
}

/// Create a JSON response with the given status code, cache directive and data.
pub fn json_response<T: Serialize>(
    status: u16,
    cache: &str,
    data: &T,
) -> Result<Response<Body>, lambda_http::Error> {
    raw_json_response(status, cache, serde_json::to_string(data)?)
}

/// Create a response from an already serialized JSON body.
pub fn raw_json_response(
    status: u16,
    cache: &str,
    body: String,
) -> Result<Response<Body>, lambda_http::Error> {
    Ok(Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .header("cache-control", cache)
        .body(Body::from(body))?)
}

/// Create an uncached `{ "error": ... }` response.
pub fn error_response(status: u16, message: impl Into<String>) -> Result<Response<Body>, lambda_http::Error> {
    json_response(
        status,
        NO_STORE,
        &ErrorBody {
            error: message.into(),
        },
    )
}
