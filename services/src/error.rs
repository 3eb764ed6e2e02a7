//! Errors crossing the proxy's HTTP boundary.
//!
//! Every failure leaves as `{"error": "<message>"}`. Provider messages are
//! passed through untouched so the front end can show them.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::gemini::GeminiError;
use crate::images::ImageFetchError;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("user_photo is required")]
    MissingUserPhoto,

    #[error("{message}")]
    InvalidRequest { status: StatusCode, message: String },

    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    ImageFetch(#[from] ImageFetchError),

    #[error(transparent)]
    Gemini(#[from] GeminiError),

    /// The model answered, but not with what was asked for.
    #[error("{0}")]
    Model(String),
}

impl ProxyError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingUserPhoto => StatusCode::BAD_REQUEST,
            Self::InvalidRequest { status, .. } => *status,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::ImageFetch(_) | Self::Gemini(_) | Self::Model(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self, "Request failed");
        } else {
            tracing::warn!(error = %self, status = %status, "Request rejected");
        }
        (status, Json(ErrorBody::new(self.to_string()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_user_photo_is_client_error() {
        let err = ProxyError::MissingUserPhoto;
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "user_photo is required");
    }

    #[test]
    fn model_text_passes_through_verbatim() {
        let err = ProxyError::Model("I can't help with that image.".to_owned());
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "I can't help with that image.");
    }
}
