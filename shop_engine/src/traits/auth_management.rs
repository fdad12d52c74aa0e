use thiserror::Error;

use crate::db_types::{AdminUser, NewAdminUser};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("User {0} does not exist")]
    UserNotFound(String),
    #[error("A user named {0} already exists")]
    UserAlreadyExists(String),
    #[error("Branch {0} does not exist")]
    BranchNotFound(i64),
    #[error("Invalid user details. {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Storage for back-office users. Password hashing is the caller's concern; only the hash is ever stored.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    async fn fetch_user_by_username(&self, username: &str) -> Result<Option<AdminUser>, AuthApiError>;

    async fn fetch_user(&self, user_id: i64) -> Result<Option<AdminUser>, AuthApiError>;

    async fn insert_user(&self, user: NewAdminUser) -> Result<AdminUser, AuthApiError>;

    /// Links the user to a branch, replacing any previous link.
    async fn assign_branch(&self, user_id: i64, branch_id: i64) -> Result<AdminUser, AuthApiError>;
}
