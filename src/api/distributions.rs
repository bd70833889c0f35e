// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::actor::UserId,
    error::ApiError,
    models::CreateDistributionRequest,
    state::AppState,
    storage::DistributionRecord,
};

#[utoipa::path(
    get,
    path = "/v1/distributions",
    params(("x-user-id" = String, Header, description = "Calling user")),
    tag = "Distributions",
    responses((status = 200, description = "Distributions the caller sent or received, newest first", body = [DistributionRecord]))
)]
pub async fn list_distributions(
    State(state): State<AppState>,
    user: UserId,
) -> Result<Json<Vec<DistributionRecord>>, ApiError> {
    Ok(Json(
        state.distributions.list_distributions(user.as_str()).await?,
    ))
}

#[utoipa::path(
    post,
    path = "/v1/distributions",
    request_body = CreateDistributionRequest,
    params(("x-user-id" = String, Header, description = "Calling user")),
    tag = "Distributions",
    responses(
        (status = 201, body = DistributionRecord),
        (status = 422, description = "Missing fields or no active token"),
        (status = 502, description = "Ledger or mirror store failure")
    )
)]
pub async fn create_distribution(
    State(state): State<AppState>,
    user: UserId,
    Json(request): Json<CreateDistributionRequest>,
) -> Result<(StatusCode, Json<DistributionRecord>), ApiError> {
    let record = state
        .distributions
        .create_distribution(user.as_str(), request, &state.call_options())
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}
