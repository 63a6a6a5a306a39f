use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::{generation::ProviderError, repository::RepositoryError};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("request did not complete in time")]
    RequestTimeout,
    #[error("request body is too large")]
    PayloadTooLarge,
    // Froms
    #[error("{0}")]
    Repository(#[from] RepositoryError),
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

/// JSON body returned for every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error_code: String,
    pub message: String,
}

impl Error {
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::RequestTimeout => "REQUEST_TIMEOUT",
            Error::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Error::Repository(_) => "REPOSITORY_ERROR",
            Error::Provider(_) => "AI_PROVIDER_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            Error::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Repository(_) => StatusCode::SERVICE_UNAVAILABLE,
            Error::Provider(e) => e.status(),
        }
    }

    /// Message safe to show to clients. Store and provider details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Error::Validation(msg) | Error::NotFound(msg) => msg.clone(),
            Error::RequestTimeout | Error::PayloadTooLarge => self.to_string(),
            Error::Repository(_) => "question store is unavailable".to_string(),
            Error::Provider(ProviderError::Timeout) => {
                "generation provider did not answer in time".to_string()
            }
            Error::Provider(_) => "generation provider request failed".to_string(),
        }
    }
}

impl From<quiz_utils::error::Error> for Error {
    fn from(error: quiz_utils::error::Error) -> Self {
        Error::Validation(error.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        // Bodies streamed past the limit surface here rather than in the limit layer.
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return Error::PayloadTooLarge;
        }
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "request rejected");
        }

        let body = ErrorBody {
            error_code: self.error_code().to_string(),
            message: self.public_message(),
        };

        (status, Json(body)).into_response()
    }
}

/// Rewrites the plain-text 408 and 413 replies of the timeout and body-limit
/// layers into the JSON error body.
pub async fn json_error_bodies(response: Response) -> Response {
    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .is_some_and(|v| v.as_bytes().starts_with(b"application/json"));
    if is_json {
        return response;
    }

    match response.status() {
        StatusCode::REQUEST_TIMEOUT => Error::RequestTimeout.into_response(),
        StatusCode::PAYLOAD_TOO_LARGE => Error::PayloadTooLarge.into_response(),
        _ => response,
    }
}

impl From<Error> for StatusCode {
    fn from(error: Error) -> Self {
        error.status()
    }
}
