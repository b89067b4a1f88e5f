use axum::{http::StatusCode, response::IntoResponse};
use std::fmt::Display;

pub type AppResult<T> = Result<T, AppErr>;

#[derive(thiserror::Error, Debug)]
pub enum AppErr {
    #[error("Bad request: {0}")]
    Bad(String),

    #[error("Config: {key} = {value:?} is not valid")]
    Config { key: &'static str, value: String },

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("signaling hub is not running")]
    HubDown,
}

impl IntoResponse for AppErr {
    fn into_response(self) -> axum::response::Response {
        let (code, body) = match self {
            AppErr::Bad(msg)  => (StatusCode::BAD_REQUEST, msg),
            AppErr::Json(e)   => (StatusCode::BAD_REQUEST, e.to_string()),
            AppErr::HubDown   => (StatusCode::SERVICE_UNAVAILABLE, AppErr::HubDown.to_string()),
            other             => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        };
        (code, body).into_response()
    }
}

/* ── helper: turn any displayable error into Bad ── */
pub fn bad<E: Display>(e: E) -> AppErr { AppErr::Bad(e.to_string()) }
