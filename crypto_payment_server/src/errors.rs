use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use crypto_payment_engine::{CheckoutError, OrderStoreError, ReconcileError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("Could not read request path: {0}")]
    InvalidRequestPath(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("{0}")]
    ConfigurationError(String),
    #[error("{0}")]
    QuoteUnavailable(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("The request conflicts with the order's current state. {0}")]
    Conflict(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::InvalidRequestPath(_) => StatusCode::BAD_REQUEST,
            Self::ConfigurationError(_) => StatusCode::BAD_REQUEST,
            Self::QuoteUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::AuthenticationError(e) => match e {
                AuthError::MissingCustomerId => StatusCode::UNAUTHORIZED,
                AuthError::InvalidSignature => StatusCode::UNAUTHORIZED,
                AuthError::NotOrderOwner => StatusCode::FORBIDDEN,
            },
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No customer id was provided.")]
    MissingCustomerId,
    #[error("The customer id signature is missing or invalid.")]
    InvalidSignature,
    #[error("This order belongs to another customer.")]
    NotOrderOwner,
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::ConfigurationError(..) => Self::ConfigurationError(e.to_string()),
            CheckoutError::InvalidAmount(_) => Self::ConfigurationError(e.to_string()),
            CheckoutError::QuoteUnavailable(_) => Self::QuoteUnavailable(e.to_string()),
            CheckoutError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::OrderClosed(_) => Self::Conflict(e.to_string()),
            CheckoutError::PaymentAlreadyStarted { .. } => Self::Conflict(e.to_string()),
            CheckoutError::StoreError(e) => e.into(),
        }
    }
}

impl From<ReconcileError> for ServerError {
    fn from(e: ReconcileError) -> Self {
        match e {
            ReconcileError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            ReconcileError::StoreError(e) => e.into(),
        }
    }
}

impl From<OrderStoreError> for ServerError {
    fn from(e: OrderStoreError) -> Self {
        match e {
            OrderStoreError::OrderNotFound(_) => Self::NoRecordFound(e.to_string()),
            OrderStoreError::ForbiddenStatusChange { .. } => Self::Conflict(e.to_string()),
            e => Self::BackendError(e.to_string()),
        }
    }
}
