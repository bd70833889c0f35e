// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! User-facing notifications emitted at the end of each orchestration call.

use std::collections::VecDeque;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

/// Recent notifications kept for polling clients.
const RECENT_CAPACITY: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A transient message for the user who triggered an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}

/// Fan-out of notifications to live subscribers plus a short history.
pub struct Notifier {
    sender: broadcast::Sender<Notification>,
    recent: Mutex<VecDeque<Notification>>,
    capacity: usize,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(RECENT_CAPACITY)
    }
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            recent: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => {
                info!(title = %notification.title, description = %notification.description, "Notify")
            }
            NotificationLevel::Error => {
                warn!(title = %notification.title, description = %notification.description, "Notify")
            }
        }

        if let Ok(mut recent) = self.recent.lock() {
            if recent.len() == self.capacity {
                recent.pop_front();
            }
            recent.push_back(notification.clone());
        }

        if self.sender.send(notification).is_err() {
            debug!("No live notification subscribers");
        }
    }

    /// Recent notifications, newest first.
    pub fn recent(&self) -> Vec<Notification> {
        self.recent
            .lock()
            .map(|recent| recent.iter().rev().cloned().collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_notifications() {
        let notifier = Notifier::default();
        let mut rx = notifier.subscribe();

        notifier.notify(Notification::success("Token created", "Aid (AIDX)"));

        let received = rx.recv().await.unwrap();
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.title, "Token created");
    }

    #[test]
    fn notify_without_subscribers_keeps_history() {
        let notifier = Notifier::default();
        notifier.notify(Notification::success("first", ""));
        notifier.notify(Notification::error("second", "boom"));

        let recent = notifier.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].title, "second");
        assert_eq!(recent[0].level, NotificationLevel::Error);
    }

    #[test]
    fn history_is_bounded() {
        let notifier = Notifier::default();
        for i in 0..(RECENT_CAPACITY + 5) {
            notifier.notify(Notification::success(format!("n{i}"), ""));
        }
        let recent = notifier.recent();
        assert_eq!(recent.len(), RECENT_CAPACITY);
        assert_eq!(recent[0].title, format!("n{}", RECENT_CAPACITY + 4));
    }
}
