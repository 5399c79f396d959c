//! Reads the caller identity placed on each request by the upstream authentication layer.
//!
//! The headers are trusted as-is; verifying them is the gateway's job.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{access::Caller, error::AppError, models::validate_id};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, AppError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthenticated(format!("missing {name} header")))
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, USER_ID_HEADER)?;
        validate_id("caller", id).map_err(|e| AppError::Unauthenticated(e.to_string()))?;

        let role = header(parts, USER_ROLE_HEADER)?
            .parse()
            .map_err(|e: AppError| AppError::Unauthenticated(e.to_string()))?;

        Ok(Caller::new(id, role))
    }
}
