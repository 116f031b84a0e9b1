//! Session events delivered to the embedding UI.

use serde::Serialize;
use tokio::sync::mpsc;

use taskforge_shared::types::TaskId;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A completion earned XP without crossing a threshold.
    XpGained { amount: u32 },
    /// A completion crossed one or more level thresholds.
    LevelUp { level: u32 },
    /// The user entity was replaced from an authoritative response.
    UserUpdated,
    /// Completion was rejected because the task is blocked.
    TaskBlocked { task_id: TaskId },
    ListsChanged,
    TasksChanged,
    /// The server no longer accepts our token; return to login.
    SessionExpired,
    /// An operation failed; the store was left at last-known-good state.
    Error { message: String },
}

/// Sender half handed to the session; dropping the receiver only logs.
#[derive(Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<SessionEvent>,
}

impl EventSender {
    pub fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::debug!(error = %e, "event receiver dropped");
        }
    }
}

/// Create the event channel for a session.
pub fn channel() -> (EventSender, mpsc::UnboundedReceiver<SessionEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, rx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let (tx, mut rx) = channel();
        tx.emit(SessionEvent::XpGained { amount: 10 });
        tx.emit(SessionEvent::LevelUp { level: 2 });

        assert_eq!(rx.try_recv().unwrap(), SessionEvent::XpGained { amount: 10 });
        assert_eq!(rx.try_recv().unwrap(), SessionEvent::LevelUp { level: 2 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn emit_after_receiver_drop_does_not_panic() {
        let (tx, rx) = channel();
        drop(rx);
        tx.emit(SessionEvent::TasksChanged);
    }
}
