use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::error;
use paystack_tools::PaystackApiError;
use shop_engine::traits::{AdminError, AuthApiError, CartError, CatalogError, CheckoutError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Invalid request. {0}")]
    ValidationError(String),
    #[error("The request conflicts with the current state of the resource. {0}")]
    Conflict(String),
    #[error("Payment gateway error. {0}")]
    PaymentGatewayError(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::AuthenticationError(e) => match e {
                AuthError::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
                AuthError::PasswordHashError(_) | AuthError::TokenIssueError(_) => StatusCode::INTERNAL_SERVER_ERROR,
                _ => StatusCode::UNAUTHORIZED,
            },
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PaymentGatewayError(_) => StatusCode::BAD_GATEWAY,
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
    #[error("Invalid username or password.")]
    InvalidCredentials,
    #[error("No access token was provided. Please log in first.")]
    MissingToken,
    #[error("The access token is invalid. {0}")]
    InvalidToken(String),
    #[error("The access token has expired. Please log in again.")]
    TokenExpired,
    #[error("Missing or invalid webhook signature.")]
    InvalidSignature,
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Could not process the password. {0}")]
    PasswordHashError(String),
    #[error("Could not issue an access token. {0}")]
    TokenIssueError(String),
}

impl From<AuthApiError> for ServerError {
    fn from(e: AuthApiError) -> Self {
        match e {
            AuthApiError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AuthApiError::UserNotFound(_) | AuthApiError::BranchNotFound(_) => Self::NoRecordFound(e.to_string()),
            AuthApiError::UserAlreadyExists(_) => Self::Conflict(e.to_string()),
            AuthApiError::ValidationError(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<CatalogError> for ServerError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CatalogError::ProductNotFound(_) | CatalogError::CollectionNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CatalogError::ValidationError(_) | CatalogError::NoOp => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<CartError> for ServerError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CartError::CartNotFound(_) | CartError::ProductNotFound(_) | CartError::ItemNotFound(_) => {
                Self::NoRecordFound(e.to_string())
            },
            CartError::ProductUnavailable(_) => Self::Conflict(e.to_string()),
            CartError::InvalidQuantity(_) | CartError::CartTooLarge(_) => Self::ValidationError(e.to_string()),
        }
    }
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            CheckoutError::CartNotFound(_) |
            CheckoutError::BranchNotFound(_) |
            CheckoutError::OrderNotFound(_) |
            CheckoutError::PaymentReferenceNotFound(_) => Self::NoRecordFound(e.to_string()),
            CheckoutError::EmptyCart | CheckoutError::ValidationError(_) => Self::ValidationError(e.to_string()),
            CheckoutError::BranchInactive(_) |
            CheckoutError::ProductUnavailable(_) |
            CheckoutError::AlreadyPaid(_) |
            CheckoutError::OrderCancelled(_) |
            CheckoutError::AmountMismatch { .. } => Self::Conflict(e.to_string()),
        }
    }
}

impl From<AdminError> for ServerError {
    fn from(e: AdminError) -> Self {
        match e {
            AdminError::DatabaseError(e) => Self::BackendError(format!("Database error: {e}")),
            AdminError::OrderNotFound(_) | AdminError::BranchNotFound(_) => Self::NoRecordFound(e.to_string()),
            AdminError::Forbidden(_) => Self::InsufficientPermissions(e.to_string()),
            AdminError::NoOp | AdminError::ValidationError(_) => Self::ValidationError(e.to_string()),
            AdminError::IllegalTransition { .. } | AdminError::PaidOrderDeletion(_) => Self::Conflict(e.to_string()),
        }
    }
}

impl From<PaystackApiError> for ServerError {
    fn from(e: PaystackApiError) -> Self {
        error!("💳️ Payment gateway call failed. {e}");
        Self::PaymentGatewayError(e.to_string())
    }
}
