// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    api::actor::UserId,
    error::ApiError,
    models::IssueAidTokenRequest,
    state::AppState,
    storage::AidTokenRecord,
};

#[derive(Deserialize, IntoParams)]
pub struct RecipientQuery {
    /// Ledger account of the recipient (`0.0.N`)
    pub recipient_id: String,
}

#[utoipa::path(
    get,
    path = "/v1/aid-tokens",
    params(RecipientQuery),
    tag = "Aid Tokens",
    responses((status = 200, description = "Aid issued to the recipient, newest first", body = [AidTokenRecord]))
)]
pub async fn list_aid_tokens(
    State(state): State<AppState>,
    Query(params): Query<RecipientQuery>,
) -> Result<Json<Vec<AidTokenRecord>>, ApiError> {
    let recipient = params.recipient_id.trim();
    if recipient.is_empty() {
        return Err(ApiError::bad_request("recipient_id is required"));
    }
    Ok(Json(state.distributions.list_aid_tokens(recipient).await?))
}

#[utoipa::path(
    post,
    path = "/v1/aid-tokens",
    request_body = IssueAidTokenRequest,
    params(("x-user-id" = String, Header, description = "Calling user")),
    tag = "Aid Tokens",
    responses(
        (status = 201, body = AidTokenRecord),
        (status = 422, description = "Missing fields or no active token"),
        (status = 502, description = "Ledger or mirror store failure")
    )
)]
pub async fn issue_aid_token(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<IssueAidTokenRequest>,
) -> Result<(StatusCode, Json<AidTokenRecord>), ApiError> {
    let record = state
        .distributions
        .issue_aid_token(user.as_str(), request, &state.call_options())
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::AccountId;
    use crate::distribution::tests::{ACTOR, RECIPIENT};
    use crate::state::tests::test_state;
    use crate::wallet::WalletProvider;

    fn request(amount: u64) -> IssueAidTokenRequest {
        IssueAidTokenRequest {
            recipient_id: Some(AccountId::from_num(RECIPIENT).to_string()),
            amount: Some(amount),
            token_type: Some("medical".to_string()),
            wallet_provider: Some(WalletProvider::HashPack),
            restrictions: Some(serde_json::json!({ "region": "north" })),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn no_active_token_is_unprocessable() {
        let (state, sb) = test_state();
        let err = issue_aid_token(State(state), UserId(ACTOR.to_string()), Json(request(5)))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            err.message,
            "No active tokens found. Please create a token first."
        );
        assert_eq!(sb.ledger.submission_count(), 0);
    }

    #[tokio::test]
    async fn issued_aid_is_listed_for_recipient() {
        let (state, sb) = test_state();
        let token = sb.create_active_token(100).await;
        sb.associate_recipient(&token).await;

        let (status, Json(record)) = issue_aid_token(
            State(state.clone()),
            UserId(ACTOR.to_string()),
            Json(request(30)),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(record.token_type, "medical");

        let Json(rows) = list_aid_tokens(
            State(state),
            Query(RecipientQuery {
                recipient_id: AccountId::from_num(RECIPIENT).to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount, 30);
        assert_eq!(rows[0].restrictions, Some(serde_json::json!({ "region": "north" })));
    }
}
