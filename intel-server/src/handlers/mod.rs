//! Request handlers

pub mod health;
pub mod threats;

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::Response;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{AppError, AppResult};

/// Serialize a JSON response with `ETag` and `Cache-Control` headers,
/// answering a matching `If-None-Match` with 304 and no body.
pub fn cached_json<T: Serialize>(
    request_headers: &HeaderMap,
    value: &T,
    max_age_seconds: u64,
) -> AppResult<Response> {
    let body = serde_json::to_vec(value)?;
    let etag = format!("\"{}\"", hex::encode(Sha256::digest(&body)));
    let cache_control = format!("public, max-age={}", max_age_seconds);

    let matches = request_headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);
    if matches {
        return Response::builder()
            .status(StatusCode::NOT_MODIFIED)
            .header(header::ETAG, &etag)
            .header(header::CACHE_CONTROL, &cache_control)
            .body(Body::empty())
            .map_err(|e| AppError::InternalError(e.to_string()));
    }

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::ETAG, &etag)
        .header(header::CACHE_CONTROL, &cache_control)
        .body(Body::from(body))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_etag_roundtrip_yields_304() {
        let empty = HeaderMap::new();
        let first = cached_json(&empty, &serde_json::json!({"a": 1}), 60).unwrap();
        assert_eq!(first.status(), StatusCode::OK);
        let etag = first.headers().get(header::ETAG).unwrap().clone();

        let mut conditional = HeaderMap::new();
        conditional.insert(header::IF_NONE_MATCH, etag.clone());
        let second = cached_json(&conditional, &serde_json::json!({"a": 1}), 60).unwrap();
        assert_eq!(second.status(), StatusCode::NOT_MODIFIED);
        assert_eq!(second.headers().get(header::ETAG), Some(&etag));
    }

    #[test]
    fn test_changed_body_changes_etag() {
        let empty = HeaderMap::new();
        let a = cached_json(&empty, &serde_json::json!({"a": 1}), 60).unwrap();
        let b = cached_json(&empty, &serde_json::json!({"a": 2}), 60).unwrap();
        assert_ne!(
            a.headers().get(header::ETAG),
            b.headers().get(header::ETAG)
        );
    }
}
