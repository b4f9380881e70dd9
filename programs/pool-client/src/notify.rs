//! Client-only notification queue.
//!
//! Notifications are kept newest first, at most [`MAX_NOTIFICATIONS`] of
//! them. Each one may also raise a toast, subject to the settings.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classifier::{is_closed, is_pool_full};
use crate::constants::MAX_NOTIFICATIONS;
use crate::error::{ClientError, ErrorCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
    Winner,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub read: bool,
    pub created_at: SystemTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSettings {
    pub enabled: bool,
    pub toasts: bool,
    #[serde(default)]
    pub muted: HashSet<NotificationKind>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            toasts: true,
            muted: HashSet::new(),
        }
    }
}

/// Short-lived popup shown for a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Toast {
    /// Title and message to show for a failed action.
    pub fn from_error(error: &ClientError) -> Self {
        let (title, message) = match error {
            ClientError::Validation { title, message } => (title.clone(), message.clone()),
            ClientError::Unauthenticated => (
                "Wallet Not Connected".to_string(),
                "Connect your wallet to continue.".to_string(),
            ),
            ClientError::PoolNotFound => ("Pool Not Found".to_string(), error.to_string()),
            ClientError::Program(e) => (program_title(e.error).to_string(), e.message.clone()),
            ClientError::Transaction { raw, .. } if is_pool_full(raw) => {
                ("Pool Full".to_string(), error.to_string())
            }
            ClientError::Transaction { raw, .. } if is_closed(raw) => {
                ("Pool Closed".to_string(), error.to_string())
            }
            ClientError::Transaction { .. } => ("Transaction Failed".to_string(), error.to_string()),
            _ => ("Request Failed".to_string(), error.to_string()),
        };
        Self {
            kind: NotificationKind::Error,
            title,
            message,
        }
    }
}

fn program_title(error: ErrorCode) -> &'static str {
    match error {
        ErrorCode::MaxParticipantsReached => "Pool Full",
        ErrorCode::InsufficientFunds => "Insufficient Balance",
        ErrorCode::Paused => "Pool Paused",
        ErrorCode::Unauthorized | ErrorCode::NotCreator | ErrorCode::NotDeveloper => "Not Allowed",
        ErrorCode::InvalidAmount => "Invalid Amount",
        _ => "Transaction Failed",
    }
}

struct State {
    items: VecDeque<Notification>,
    toasts: VecDeque<Toast>,
    settings: NotificationSettings,
}

pub struct NotificationCenter {
    state: Mutex<State>,
    next_id: AtomicU64,
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new(NotificationSettings::default())
    }
}

impl NotificationCenter {
    pub fn new(settings: NotificationSettings) -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                toasts: VecDeque::new(),
                settings,
            }),
            next_id: AtomicU64::new(1),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn settings(&self) -> NotificationSettings {
        self.state().settings.clone()
    }

    pub fn set_settings(&self, settings: NotificationSettings) {
        self.state().settings = settings;
    }

    /// Queues a notification. Returns its id, or `None` when notifications
    /// are disabled or the kind is muted.
    pub fn push(&self, kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Option<u64> {
        let mut state = self.state();
        if !state.settings.enabled || state.settings.muted.contains(&kind) {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let notification = Notification {
            id,
            kind,
            title: title.into(),
            message: message.into(),
            read: false,
            created_at: SystemTime::now(),
        };
        debug!(id, ?kind, title = %notification.title, "notification");
        if state.settings.toasts {
            state.toasts.push_back(Toast {
                kind,
                title: notification.title.clone(),
                message: notification.message.clone(),
            });
        }
        state.items.push_front(notification);
        state.items.truncate(MAX_NOTIFICATIONS);
        Some(id)
    }

    pub fn success(&self, title: impl Into<String>, message: impl Into<String>) -> Option<u64> {
        self.push(NotificationKind::Success, title, message)
    }

    pub fn error(&self, title: impl Into<String>, message: impl Into<String>) -> Option<u64> {
        self.push(NotificationKind::Error, title, message)
    }

    pub fn info(&self, title: impl Into<String>, message: impl Into<String>) -> Option<u64> {
        self.push(NotificationKind::Info, title, message)
    }

    /// Turns a failed action into a visible error notification.
    pub fn report_error(&self, error: &ClientError) -> Option<u64> {
        let toast = Toast::from_error(error);
        self.push(toast.kind, toast.title, toast.message)
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().items.iter().cloned().collect()
    }

    pub fn unread_count(&self) -> usize {
        self.state().items.iter().filter(|n| !n.read).count()
    }

    pub fn mark_read(&self, id: u64) -> bool {
        match self.state().items.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.read = true;
                true
            }
            None => false,
        }
    }

    pub fn mark_all_read(&self) {
        for n in self.state().items.iter_mut() {
            n.read = true;
        }
    }

    pub fn remove(&self, id: u64) -> bool {
        let mut state = self.state();
        let before = state.items.len();
        state.items.retain(|n| n.id != id);
        state.items.len() != before
    }

    pub fn clear(&self) {
        self.state().items.clear();
    }

    /// Takes the toasts raised since the last call, oldest first.
    pub fn drain_toasts(&self) -> Vec<Toast> {
        self.state().toasts.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn keeps_newest_fifty() {
        let center = NotificationCenter::default();
        for i in 0..60 {
            center.info("n", i.to_string());
        }
        let items = center.notifications();
        assert_eq!(items.len(), MAX_NOTIFICATIONS);
        assert_eq!(items[0].message, "59");
        assert_eq!(items[MAX_NOTIFICATIONS - 1].message, "10");
    }

    #[test]
    fn read_state() {
        let center = NotificationCenter::default();
        let a = center.success("a", "").unwrap();
        center.success("b", "");
        assert_eq!(center.unread_count(), 2);
        assert!(center.mark_read(a));
        assert!(!center.mark_read(999));
        assert_eq!(center.unread_count(), 1);
        center.mark_all_read();
        assert_eq!(center.unread_count(), 0);
        assert!(center.remove(a));
        assert_eq!(center.notifications().len(), 1);
        center.clear();
        assert!(center.notifications().is_empty());
    }

    #[test]
    fn settings_gate_notifications_and_toasts() {
        let mut settings = NotificationSettings::default();
        settings.muted.insert(NotificationKind::Info);
        settings.toasts = false;
        let center = NotificationCenter::new(settings);
        assert_eq!(center.info("muted", ""), None);
        assert!(center.error("shown", "").is_some());
        assert!(center.drain_toasts().is_empty());

        center.set_settings(NotificationSettings {
            enabled: false,
            ..NotificationSettings::default()
        });
        assert_eq!(center.success("off", ""), None);
    }

    #[test]
    fn errors_become_toasts() {
        let center = NotificationCenter::default();
        center.report_error(&ClientError::validation("Invalid Amount", "Enter an amount greater than zero."));
        center.report_error(&ClientError::from(ErrorCode::MaxParticipantsReached));
        center.report_error(&ClientError::transaction(
            "failed",
            json!({ "logs": ["Program log: AnchorError occurred. Error Code: Paused."] }),
        ));
        let toasts = center.drain_toasts();
        let titles: Vec<&str> = toasts.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["Invalid Amount", "Pool Full", "Transaction Failed"]);
        assert!(toasts.iter().all(|t| t.kind == NotificationKind::Error));
        assert!(center.drain_toasts().is_empty());
    }
}
