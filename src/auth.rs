//! Bearer-token authentication.
//!
//! Handlers take an [`AuthenticatedUser`] argument; extraction reads the
//! `Authorization` header and asks the injected [`TokenVerifier`] who it is.

use crate::config::TokenIdentity;
use crate::error::{AccessHubError, Result};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticatedUser {
    pub uid: String,
    pub email: Option<String>,
}

/// Resolves an ID token to a user. The identity provider lives behind this.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser>;
}

/// Verifies against a fixed token table from configuration
#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, TokenIdentity>,
}

impl StaticTokenVerifier {
    pub fn new(tokens: HashMap<String, TokenIdentity>) -> Self {
        Self { tokens }
    }

    pub fn with_token(mut self, token: &str, uid: &str, email: Option<&str>) -> Self {
        self.tokens.insert(
            token.to_string(),
            TokenIdentity {
                uid: uid.to_string(),
                email: email.map(str::to_string),
            },
        );
        self
    }
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Result<AuthenticatedUser> {
        self.tokens
            .get(token)
            .map(|identity| AuthenticatedUser {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
            })
            .ok_or_else(|| AccessHubError::unauthorized("Invalid token"))
    }
}

/// Pull the token out of `Authorization: Bearer <token>`
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() { None } else { Some(token) }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<dyn TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AccessHubError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let token =
            bearer_token(parts).ok_or_else(|| AccessHubError::unauthorized("Token is missing"))?;
        let verifier = Arc::<dyn TokenVerifier>::from_ref(state);
        match verifier.verify(token).await {
            Ok(user) => Ok(user),
            Err(err) => {
                tracing::debug!("Token rejected: {}", err);
                Err(AccessHubError::unauthorized("Invalid token"))
            }
        }
    }
}
