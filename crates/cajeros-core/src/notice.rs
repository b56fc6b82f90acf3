// ── User notices ──
//
// Transient success/error/info messages for a front end. Each notice lives
// for a fixed five seconds; error notices carry the backend message as is.

use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::time::Instant;

use crate::error::CoreError;

/// How long a notice stays visible.
pub const NOTICE_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub id: u64,
    pub kind: NoticeKind,
    pub message: String,
    pub raised_at: Instant,
}

impl Notice {
    pub fn is_expired(&self) -> bool {
        self.raised_at.elapsed() >= NOTICE_LIFETIME
    }
}

/// Ordered set of live notices.
#[derive(Debug, Default)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    next_id: u64,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise a notice and return its id.
    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) -> u64 {
        self.next_id += 1;
        self.notices.push(Notice {
            id: self.next_id,
            kind,
            message: message.into(),
            raised_at: Instant::now(),
        });
        self.next_id
    }

    pub fn success(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Success, message)
    }

    pub fn info(&mut self, message: impl Into<String>) -> u64 {
        self.push(NoticeKind::Info, message)
    }

    pub fn error(&mut self, err: &CoreError) -> u64 {
        self.push(NoticeKind::Error, err.to_string())
    }

    pub fn dismiss(&mut self, id: u64) {
        self.notices.retain(|n| n.id != id);
    }

    /// Notices that have not yet expired, oldest first. Expired ones are dropped.
    pub fn active(&mut self) -> &[Notice] {
        self.notices.retain(|n| !n.is_expired());
        &self.notices
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notices_expire_after_five_seconds() {
        let mut board = NoticeBoard::new();
        board.success("Cajero actualizado");

        tokio::time::advance(Duration::from_millis(4_999)).await;
        assert_eq!(board.active().len(), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(board.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn error_notice_carries_backend_message() {
        let mut board = NoticeBoard::new();
        board.error(&CoreError::Rejected {
            message: "cajero no encontrado".into(),
        });

        let active = board.active();
        assert_eq!(active[0].kind, NoticeKind::Error);
        assert_eq!(active[0].message, "cajero no encontrado");
    }

    #[tokio::test(start_paused = true)]
    async fn dismiss_removes_by_id() {
        let mut board = NoticeBoard::new();
        let a = board.info("a");
        board.info("b");
        board.dismiss(a);
        assert_eq!(board.active().len(), 1);
        assert_eq!(board.active()[0].message, "b");
    }
}
