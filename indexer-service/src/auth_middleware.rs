//! Token check for operator-only endpoints

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::state::AppState;

pub const METRICS_TOKEN_HEADER: &str = "x-metrics-token";

/// Middleware that only lets requests carrying the configured metrics token through.
pub async fn require_metrics_token(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = app_state.metrics_token.as_deref() else {
        return Err(StatusCode::NOT_FOUND);
    };

    let provided = extract_metrics_token(&headers)?;
    if provided != expected {
        info!("Rejected {} request with invalid metrics token", request.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(request).await)
}

/// Extract the metrics token header
pub fn extract_metrics_token(headers: &HeaderMap) -> Result<&str, StatusCode> {
    headers
        .get(METRICS_TOKEN_HEADER)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::BAD_REQUEST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_metrics_token() {
        let mut headers = HeaderMap::new();
        assert_eq!(extract_metrics_token(&headers), Err(StatusCode::UNAUTHORIZED));

        headers.insert(METRICS_TOKEN_HEADER, HeaderValue::from_static("secret"));
        assert_eq!(extract_metrics_token(&headers), Ok("secret"));
    }
}
