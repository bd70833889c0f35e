// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    distribution::{Notification, NotificationLevel},
    models::{
        ConnectRequest, CreateDistributionRequest, CreateTokenRequest, CreatedToken,
        IssueAidTokenRequest, TokenBalanceResponse, WalletListResponse,
    },
    state::AppState,
    storage::{AidTokenRecord, DistributionRecord, DistributionStatus, TokenRecord},
    wallet::{SessionState, WalletDescriptor, WalletProvider, WalletSession},
};

pub mod actor;
pub mod aid_tokens;
pub mod distributions;
pub mod health;
pub mod notifications;
pub mod tokens;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/wallets", get(wallets::list_wallets))
        .route(
            "/session",
            get(wallets::get_session).delete(wallets::disconnect_wallet),
        )
        .route("/session/connect", post(wallets::connect_wallet))
        .route("/session/replace", post(wallets::replace_session))
        .route(
            "/tokens",
            get(tokens::list_tokens).post(tokens::create_token),
        )
        .route(
            "/tokens/{token_id}/balance/{account_id}",
            get(tokens::token_balance),
        )
        .route(
            "/aid-tokens",
            get(aid_tokens::list_aid_tokens).post(aid_tokens::issue_aid_token),
        )
        .route(
            "/distributions",
            get(distributions::list_distributions).post(distributions::create_distribution),
        )
        .route("/notifications", get(notifications::list_notifications))
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        health::liveness,
        wallets::list_wallets,
        wallets::get_session,
        wallets::connect_wallet,
        wallets::replace_session,
        wallets::disconnect_wallet,
        tokens::list_tokens,
        tokens::create_token,
        tokens::token_balance,
        aid_tokens::list_aid_tokens,
        aid_tokens::issue_aid_token,
        distributions::list_distributions,
        distributions::create_distribution,
        notifications::list_notifications
    ),
    components(
        schemas(
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse,
            WalletProvider,
            WalletDescriptor,
            WalletListResponse,
            WalletSession,
            SessionState,
            ConnectRequest,
            CreateTokenRequest,
            CreatedToken,
            TokenRecord,
            TokenBalanceResponse,
            IssueAidTokenRequest,
            AidTokenRecord,
            CreateDistributionRequest,
            DistributionRecord,
            DistributionStatus,
            Notification,
            NotificationLevel
        )
    ),
    tags(
        (name = "Health", description = "Liveness and component status"),
        (name = "Wallets", description = "Wallet discovery and the active session"),
        (name = "Tokens", description = "Fungible token creation and balances"),
        (name = "Aid Tokens", description = "Aid issued to recipients"),
        (name = "Distributions", description = "Distributions against aid requests"),
        (name = "Notifications", description = "Outcomes of recent actions")
    )
)]
pub struct ApiDoc;
