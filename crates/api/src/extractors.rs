//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use ballot_common::AppError;

use crate::middleware::CallerId;

/// Authenticated user extractor.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // set by auth_middleware
        parts
            .extensions
            .get::<CallerId>()
            .map(|caller| Self(caller.0.clone()))
            .ok_or(AppError::Unauthorized)
    }
}

/// Optional authenticated user extractor.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<String>);

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(
            parts
                .extensions
                .get::<CallerId>()
                .map(|caller| caller.0.clone()),
        ))
    }
}
