use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation failed")]
    Validation(Vec<String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Too many requests")]
    TooManyRequests { retry_after: u64 },

    #[error("File too large")]
    FileTooLarge { max_size: &'static str },

    #[error("{0} is not configured")]
    ProviderNotConfigured(&'static str),

    #[error("Provider error: {0}")]
    Provider(#[from] anyhow::Error),

    #[error("Persistence error: {0}")]
    Persist(#[from] washdesk_persist::PersistError),

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, json!({ "error": self.to_string() })),
            ApiError::Validation(ref details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "details": details }),
            ),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, json!({ "error": self.to_string() })),
            ApiError::TooManyRequests { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": self.to_string(), "retryAfter": retry_after }),
            ),
            ApiError::FileTooLarge { max_size } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string(), "maxSize": max_size }),
            ),
            ApiError::ProviderNotConfigured(provider) => {
                tracing::error!("{} is not configured", provider);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": self.to_string() }))
            }
            ApiError::Provider(ref e) => {
                tracing::error!("Provider error: {:#}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Provider error", "message": e.to_string() }),
                )
            }
            ApiError::Persist(ref e) => {
                tracing::error!("Persistence error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Storage error" }))
            }
            ApiError::Internal => {
                tracing::error!("Internal error: {}", self);
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "error": "Internal server error" }))
            }
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Rejections from the provider webhook checks
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Content-Type must be application/json")]
    UnsupportedContentType(Option<String>),

    #[error("Invalid authorization token")]
    InvalidToken,

    #[error("Signature required but not provided")]
    MissingSignature,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Webhook for the wrong app")]
    WrongApp { expected: String, received: String },

    #[error("Invalid message structure")]
    InvalidMessage(Vec<&'static str>),

    #[error("Empty text message")]
    EmptyText,

    #[error("Too many webhooks")]
    RateLimited { retry_after: u64 },
}

pub const REQUIRED_FIELDS: [&str; 3] = ["app", "timestamp", "type"];

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, body) = match self {
            WebhookError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                json!({ "error": message, "allowed": ["POST"] }),
            ),
            WebhookError::UnsupportedContentType(received) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "received": received }),
            ),
            WebhookError::InvalidToken | WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                (StatusCode::UNAUTHORIZED, json!({ "error": message }))
            }
            WebhookError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, json!({ "error": message })),
            WebhookError::MissingFields(missing) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "missing": missing, "required": REQUIRED_FIELDS }),
            ),
            WebhookError::WrongApp { expected, received } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "expected": expected, "received": received }),
            ),
            WebhookError::InvalidMessage(missing) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "missing": missing, "type": "message_validation" }),
            ),
            WebhookError::EmptyText => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "type": "empty_text_message" }),
            ),
            WebhookError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": message, "retryAfter": retry_after }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
