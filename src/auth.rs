use axum::http::{HeaderMap, header};

/// Admits the request only when `Authorization` is exactly `Bearer <secret>`.
pub fn authorize(headers: &HeaderMap, secret: &str) -> bool {
    let Some(value) = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
    else {
        return false;
    };

    value
        .strip_prefix("Bearer ")
        .is_some_and(|token| token == secret)
}
