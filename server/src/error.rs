use std::fmt;

use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};

/// Which of the two upstream calls produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamStage {
    Login,
    GuestToken,
}

impl fmt::Display for UpstreamStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamStage::Login => f.write_str("login"),
            UpstreamStage::GuestToken => f.write_str("guest_token"),
        }
    }
}

/// Expected field missing from a 200 upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingField {
    AccessToken,
    GuestToken,
}

impl fmt::Display for MissingField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingField::AccessToken => f.write_str("no access_token in login response"),
            MissingField::GuestToken => f.write_str("guest token not found"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Method not allowed. Use POST.")]
    MethodNotAllowed,

    #[error("{0} is required")]
    MissingParameter(&'static str),

    #[error("Invalid Superset URL")]
    InvalidParameter,

    #[error("Upstream request failed: {0}")]
    UpstreamUnreachable(String),

    #[error("{stage} failed ({status}): {body}")]
    UpstreamAuthFailed {
        stage: UpstreamStage,
        status: u16,
        body: String,
    },

    #[error("{0}")]
    UpstreamProtocolError(MissingField),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            RelayError::MissingParameter(_) => StatusCode::BAD_REQUEST,
            RelayError::InvalidParameter => StatusCode::BAD_REQUEST,
            RelayError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            RelayError::UpstreamAuthFailed { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            RelayError::UpstreamProtocolError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            RelayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .content_type(ContentType::plaintext())
            .body(self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
