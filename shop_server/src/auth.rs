//! Staff authentication.
//!
//! Staff log in with a username and password (`POST /auth/login`). Passwords are stored as Argon2 hashes. A successful
//! login returns an HS256-signed JWT carrying the user's id, roles and branch. Every `/api` request must present this
//! token in an `Authorization: Bearer <token>` header. The [`crate::middleware::JwtMiddlewareFactory`] validates the
//! token and stores the [`JwtClaims`] in the request extensions, where handlers and the ACL middleware pick them up.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use shop_engine::{
    db_types::{AdminUser, Role},
    order_objects::OrderScope,
};

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The admin user id
    pub sub: i64,
    pub username: String,
    pub roles: Vec<Role>,
    pub branch_id: Option<i64>,
    /// Expiry, as a unix timestamp
    pub exp: i64,
}

impl JwtClaims {
    pub fn for_user(user: &AdminUser, valid_for: Duration) -> Self {
        Self {
            sub: user.id,
            username: user.username.clone(),
            roles: user.roles(),
            branch_id: user.branch_id,
            exp: (Utc::now() + valid_for).timestamp(),
        }
    }

    pub fn is_superuser(&self) -> bool {
        self.roles.contains(&Role::Superuser)
    }

    /// The orders this user may see and act on.
    pub fn scope(&self) -> OrderScope {
        OrderScope::for_user(self.is_superuser(), self.branch_id)
    }
}

impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned();
        ready(claims.ok_or(ServerError::AuthenticationError(AuthError::MissingToken)))
    }
}

/// Issues and validates access tokens.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.reveal().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry: config.jwt_expiry,
        }
    }

    /// Issue a new access token for the given user.
    /// This method DOES NOT check the user's credentials. This must be done prior to calling `issue_token`.
    pub fn issue_token(&self, user: &AdminUser) -> Result<String, AuthError> {
        let claims = JwtClaims::for_user(user, self.expiry);
        self.sign(&claims)
    }

    pub fn sign(&self, claims: &JwtClaims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssueError(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let validation = Validation::new(Algorithm::HS256);
        let data = decode::<JwtClaims>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken(e.to_string()),
        })?;
        trace!("🔐️ Access token for {} validated", data.claims.username);
        Ok(data.claims)
    }
}

/// Hashes a plain-text password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    if password.is_empty() {
        return Err(AuthError::PasswordHashError("The password cannot be empty".into()));
    }
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHashError(e.to_string()))
}

/// Checks a plain-text password against a stored Argon2 hash. A mismatch is `Ok(false)`; a corrupt hash is an error.
pub fn verify_password(hash: &str, password: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!("🔐️ A stored password hash could not be parsed. {e}");
        AuthError::PasswordHashError(e.to_string())
    })?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHashError(e.to_string())),
    }
}
