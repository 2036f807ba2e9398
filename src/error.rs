use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Fallos al hablar con el servicio RAG externo. El texto de `Display`
/// es lo que acaba en el campo de respuesta del playground.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Error informado por el propio servicio; se muestra tal cual.
    #[error("{0}")]
    Server(String),
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Transport(e.to_string())
    }
}

/// Operaciones rechazadas por el estado actual del playground.
#[derive(Debug, Error)]
pub enum PlaygroundError {
    #[error("An index build or query is already running")]
    Busy,
    #[error("The index must be built before running queries")]
    IndexNotReady,
    #[error("The index is already up to date")]
    IndexUpToDate,
    #[error("Invalid value for {name}: {value} (allowed range {min}..={max}, step {step})")]
    InvalidSetting {
        name: &'static str,
        value: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    #[error("No setting to update")]
    EmptyUpdate,
    #[error("Invalid request body: {0}")]
    InvalidPayload(String),
    #[error("Only .txt files can be imported (got '{0}')")]
    UnsupportedFile(String),
}

impl From<JsonRejection> for PlaygroundError {
    fn from(rejection: JsonRejection) -> Self {
        PlaygroundError::InvalidPayload(rejection.body_text())
    }
}

impl PlaygroundError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            PlaygroundError::Busy
            | PlaygroundError::IndexNotReady
            | PlaygroundError::IndexUpToDate => StatusCode::CONFLICT,
            PlaygroundError::InvalidSetting { .. }
            | PlaygroundError::EmptyUpdate
            | PlaygroundError::InvalidPayload(_)
            | PlaygroundError::UnsupportedFile(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for PlaygroundError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}
