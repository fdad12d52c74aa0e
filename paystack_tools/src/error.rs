use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaystackApiError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("Could not reach the payment gateway: {0}")]
    Network(String),
    #[error("The payment gateway timed out. Please try again.")]
    Timeout,
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
    #[error("Payment gateway request failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("The payment gateway rejected the request: {0}")]
    Rejected(String),
}

impl From<reqwest::Error> for PaystackApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
