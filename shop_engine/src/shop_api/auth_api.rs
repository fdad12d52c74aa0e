use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{AdminUser, NewAdminUser},
    traits::{AuthApiError, AuthManagement},
};

/// Back-office user management. Passwords are hashed by the caller; this API only ever sees the hash.
pub struct AuthApi<B> {
    db: B,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B>
where B: AuthManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn user_by_username(&self, username: &str) -> Result<Option<AdminUser>, AuthApiError> {
        self.db.fetch_user_by_username(username).await
    }

    pub async fn user_by_id(&self, user_id: i64) -> Result<Option<AdminUser>, AuthApiError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn create_user(&self, mut user: NewAdminUser) -> Result<AdminUser, AuthApiError> {
        user.username = user.username.trim().to_string();
        if user.username.is_empty() {
            return Err(AuthApiError::ValidationError("A username is required".into()));
        }
        if user.password_hash.is_empty() {
            return Err(AuthApiError::ValidationError("A password is required".into()));
        }
        let user = self.db.insert_user(user).await?;
        info!("🔐️ Created {} user {}", if user.is_superuser { "superuser" } else { "staff" }, user.username);
        Ok(user)
    }

    /// Links the user to the branch whose orders they will handle. Any previous branch link is replaced.
    pub async fn assign_branch(&self, user_id: i64, branch_id: i64) -> Result<AdminUser, AuthApiError> {
        let user = self.db.assign_branch(user_id, branch_id).await?;
        info!("🔐️ User {} now works at branch {branch_id}", user.username);
        Ok(user)
    }
}
