// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};

use crate::{distribution::Notification, state::AppState};

/// Recent orchestration outcomes, newest first.
#[utoipa::path(
    get,
    path = "/v1/notifications",
    tag = "Notifications",
    responses((status = 200, body = [Notification]))
)]
pub async fn list_notifications(State(state): State<AppState>) -> Json<Vec<Notification>> {
    Json(state.distributions.notifier().recent())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::NotificationLevel;
    use crate::state::tests::test_state;

    #[tokio::test]
    async fn returns_latest_first() {
        let (state, sb) = test_state();
        sb.create_active_token(10).await;

        let Json(notes) = list_notifications(State(state)).await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, NotificationLevel::Success);
        assert_eq!(notes[0].title, "Token created on Hedera");
    }
}
