use cpg_common::Currency;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ExplorerApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("No explorer endpoint is configured for {0}")]
    MissingEndpoint(Currency),
    #[error("The request timed out: {0}")]
    Timeout(String),
    #[error("Invalid REST response: {0}")]
    RestResponseError(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Unexpected response content: {0}")]
    InvalidResponse(String),
    #[error("No price available for {0}")]
    PriceUnavailable(String),
}

impl From<reqwest::Error> for ExplorerApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::RestResponseError(e.to_string())
        }
    }
}
