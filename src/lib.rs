use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use std::error::Error;

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod handler;
pub mod model;
pub mod observe;
pub mod raindrop;
mod remote;
pub mod sync;
pub mod wordpress;

pub fn text_response(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

pub fn unauthorized() -> Response {
    text_response(StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}

pub fn server_error<E: Error>(err: &E) -> Response {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn unpack_error(err: &(dyn Error)) -> String {
    let mut parts = Vec::new();
    parts.push(err.to_string());
    let mut current = err.source();
    while let Some(source) = current {
        parts.push(source.to_string());
        current = source.source();
    }
    parts.join(": ")
}
