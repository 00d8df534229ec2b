use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeTone {
    Success,
    Destructive,
}

/// Short user-facing notification (the toast shown after an attempt).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: &'static str,
    pub description: &'static str,
    pub tone: NoticeTone,
}

impl Notice {
    pub const fn success(title: &'static str, description: &'static str) -> Self {
        Self {
            title,
            description,
            tone: NoticeTone::Success,
        }
    }

    pub const fn destructive(title: &'static str, description: &'static str) -> Self {
        Self {
            title,
            description,
            tone: NoticeTone::Destructive,
        }
    }
}

/// Copy for every notification one form can raise.
#[derive(Debug, Clone, Copy)]
pub struct FormNotices {
    pub accepted: Notice,
    pub invalid: Notice,
    pub duplicate: Notice,
    pub failed: Notice,
}

/// Outbound hook for notices, injected into each controller.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that keeps every notice in order; used by the HTTP surface and tests.
#[derive(Debug, Default, Clone)]
pub struct NoticeBuffer {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeBuffer {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Notifier for NoticeBuffer {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}
