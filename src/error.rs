// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::blockchain::LedgerError;
use crate::distribution::DistributionError;
use crate::storage::MirrorError;
use crate::wallet::WalletError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }

    pub fn gateway_timeout(message: impl Into<String>) -> Self {
        Self::new(StatusCode::GATEWAY_TIMEOUT, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

impl From<WalletError> for ApiError {
    fn from(err: WalletError) -> Self {
        let message = err.to_string();
        match err {
            WalletError::NotInstalled(_) => Self::bad_request(message),
            WalletError::NotConnected
            | WalletError::SessionActive { .. }
            | WalletError::ConnectInProgress => Self::conflict(message),
            WalletError::Handshake(_) => Self::bad_gateway(message),
            WalletError::Timeout(_) => Self::gateway_timeout(message),
            WalletError::Cancelled => Self::unavailable(message),
        }
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotConnected | LedgerError::OperatorRequired(_) => {
                Self::conflict(message)
            }
            LedgerError::InvalidAmount(_) => Self::unprocessable(message),
            LedgerError::Operation { .. } => Self::bad_gateway(message),
            LedgerError::Timeout(_) => Self::gateway_timeout(message),
            LedgerError::Cancelled => Self::unavailable(message),
        }
    }
}

impl From<MirrorError> for ApiError {
    fn from(err: MirrorError) -> Self {
        Self::bad_gateway(err.to_string())
    }
}

impl From<DistributionError> for ApiError {
    fn from(err: DistributionError) -> Self {
        match err {
            DistributionError::Validation(message) => Self::unprocessable(message),
            DistributionError::NoActiveToken => Self::unprocessable(err.to_string()),
            DistributionError::Wallet(e) => e.into(),
            DistributionError::Ledger(e) => e.into(),
            DistributionError::Mirror(e) => e.into(),
            DistributionError::MirrorWrite { .. } => Self::bad_gateway(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::time::Duration;

    #[test]
    fn constructors_set_status_and_message() {
        let bad = ApiError::bad_request("bad");
        assert_eq!(bad.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad.message, "bad");

        let unp = ApiError::unprocessable("oops");
        assert_eq!(unp.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(unp.message, "oops");
    }

    #[tokio::test]
    async fn into_response_returns_json_body() {
        let response = ApiError::bad_request("bad data").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = String::from_utf8(body_bytes.to_vec()).unwrap();
        assert_eq!(body, r#"{"error":"bad data"}"#);
    }

    #[test]
    fn wallet_errors_map_to_statuses() {
        let err: ApiError = WalletError::NotInstalled("HashPack".to_string()).into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Wallet `HashPack` is not installed");

        let err: ApiError = WalletError::NotConnected.into();
        assert_eq!(err.status, StatusCode::CONFLICT);

        let err: ApiError = WalletError::Timeout(Duration::from_secs(30)).into();
        assert_eq!(err.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn distribution_errors_map_to_statuses() {
        let err: ApiError = DistributionError::NoActiveToken.into();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.message,
            "No active tokens found. Please create a token first."
        );

        let err: ApiError = DistributionError::Ledger(LedgerError::Operation {
            op: "Token transfer",
            cause: "INSUFFICIENT_TOKEN_BALANCE".to_string(),
        })
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(
            err.message,
            "Token transfer failed: INSUFFICIENT_TOKEN_BALANCE"
        );

        let err: ApiError = DistributionError::MirrorWrite {
            ledger_tx_id: "0.0.1001@1700000000.000000001".to_string(),
            source: MirrorError::Unavailable("down".to_string()),
        }
        .into();
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert!(err.message.contains("0.0.1001@1700000000.000000001"));
    }
}
