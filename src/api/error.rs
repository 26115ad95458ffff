use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::ErrorResponse;
use super::upload::ExtractionError;
use crate::imaging::{DispatchError, PipelineError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("only POST method is allowed")]
    MethodNotAllowed,
    #[error("could not get uploaded file: form field 'image' is required")]
    MissingFile,
    #[error("failed to parse multipart form: {0}")]
    MalformedUpload(String),
    #[error("{0}")]
    UnsupportedImage(String),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    OutOfBounds(String),
    #[error("{0}")]
    EncodingFailure(String),
    #[error("resource not found: {0}")]
    NotFound(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::MissingFile
            | ApiError::MalformedUpload(_)
            | ApiError::UnsupportedImage(_)
            | ApiError::InvalidParameter(_)
            | ApiError::OutOfBounds(_) => StatusCode::BAD_REQUEST,
            ApiError::EncodingFailure(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::MissingFile => "MISSING_FILE",
            ApiError::MalformedUpload(_) => "MALFORMED_UPLOAD",
            ApiError::UnsupportedImage(_) => "UNSUPPORTED_IMAGE",
            ApiError::InvalidParameter(_) => "INVALID_PARAMETER",
            ApiError::OutOfBounds(_) => "OUT_OF_BOUNDS",
            ApiError::EncodingFailure(_) => "ENCODING_FAILURE",
            ApiError::NotFound(_) => "NOT_FOUND",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorResponse {
            code: self.code(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<ExtractionError> for ApiError {
    fn from(value: ExtractionError) -> Self {
        match value {
            ExtractionError::MethodNotAllowed => ApiError::MethodNotAllowed,
            ExtractionError::MissingFile => ApiError::MissingFile,
            ExtractionError::Malformed(reason) => ApiError::MalformedUpload(reason),
            ExtractionError::Decode(err) => ApiError::UnsupportedImage(err.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(value: PipelineError) -> Self {
        match value {
            PipelineError::Parameter(err) => ApiError::InvalidParameter(err.to_string()),
            PipelineError::Dispatch(err @ DispatchError::OutOfBounds { .. }) => {
                ApiError::OutOfBounds(err.to_string())
            }
            PipelineError::Dispatch(err @ DispatchError::TooLarge { .. }) => {
                ApiError::EncodingFailure(err.to_string())
            }
            PipelineError::Encode(err) => ApiError::EncodingFailure(err.to_string()),
        }
    }
}
