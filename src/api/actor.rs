// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Caller identity.
//!
//! Authentication happens upstream; the gateway forwards the caller's user
//! id in the `x-user-id` header. Handlers that mirror rows on behalf of a
//! user take [`UserId`] as an extractor.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The calling user, recorded as creator or distributor on mirrored rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(pub String);

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for UserId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized(format!("Missing {USER_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| ApiError::unauthorized(format!("Invalid {USER_ID_HEADER} header")))?
            .trim();

        if value.is_empty() {
            return Err(ApiError::unauthorized(format!(
                "Invalid {USER_ID_HEADER} header"
            )));
        }
        Ok(UserId(value.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{Request, StatusCode};

    async fn extract(header: Option<&str>) -> Result<UserId, ApiError> {
        let mut builder = Request::builder().uri("/v1/tokens");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        UserId::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn reads_user_id_header() {
        let user = extract(Some(" user-ngo-1 ")).await.unwrap();
        assert_eq!(user.as_str(), "user-ngo-1");
    }

    #[tokio::test]
    async fn missing_or_blank_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);

        let err = extract(Some("   ")).await.unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
    }
}
