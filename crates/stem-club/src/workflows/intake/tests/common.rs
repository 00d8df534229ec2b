use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;
use uuid::Uuid;

use crate::store::{RemoteError, RemoteStore, SelectQuery};
use crate::workflows::contact::ContactSubmissionDraft;
use crate::workflows::membership::{MembershipApplicationDraft, Sector, SectorId};

pub(super) fn sector_id(n: u128) -> SectorId {
    SectorId(Uuid::from_u128(n))
}

pub(super) fn sectors() -> Vec<Sector> {
    [
        "Sustainability Sector",
        "Technology Sector",
        "Bridge Building Sector",
        "Aqualibrium Sector",
        "Mathematics Sector",
    ]
    .iter()
    .enumerate()
    .map(|(index, name)| Sector {
        id: sector_id(index as u128 + 1),
        name: name.to_string(),
        display_order: index as i32 + 1,
    })
    .collect()
}

pub(super) fn sector_rows() -> Vec<Value> {
    sectors()
        .into_iter()
        .map(|sector| serde_json::to_value(sector).expect("sector serializes"))
        .collect()
}

pub(super) fn contact_draft() -> ContactSubmissionDraft {
    ContactSubmissionDraft {
        name: "Amara O".to_string(),
        email: "AMARA@Example.com".to_string(),
        subject: "Hello".to_string(),
        message: "Hi there, interested in partnering.".to_string(),
    }
}

pub(super) fn membership_draft() -> MembershipApplicationDraft {
    MembershipApplicationDraft {
        full_name: "Ada Nakato".to_string(),
        email: "ada@school.ac.ug".to_string(),
        school_class: "S5B".to_string(),
        sector_selection: vec![sector_id(5), sector_id(2)],
        reason_to_join: "I want to compete in international math olympiads.".to_string(),
    }
}

/// Store with canned sector rows and queued insert failures.
#[derive(Default)]
pub(super) struct ScriptedStore {
    inserts: Mutex<Vec<(String, Value)>>,
    insert_errors: Mutex<VecDeque<RemoteError>>,
    sector_rows: Option<Vec<Value>>,
    selects: AtomicUsize,
}

impl ScriptedStore {
    pub(super) fn with_sectors() -> Self {
        Self {
            sector_rows: Some(sector_rows()),
            ..Self::default()
        }
    }

    /// Every select fails with a transport error.
    pub(super) fn without_sectors() -> Self {
        Self::default()
    }

    pub(super) fn fail_next_insert(self, error: RemoteError) -> Self {
        self.insert_errors.lock().expect("lock").push_back(error);
        self
    }

    pub(super) fn inserts(&self) -> Vec<(String, Value)> {
        self.inserts.lock().expect("lock").clone()
    }

    pub(super) fn insert_count(&self) -> usize {
        self.inserts.lock().expect("lock").len()
    }

    pub(super) fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for ScriptedStore {
    async fn insert(&self, collection: &str, record: Value) -> Result<(), RemoteError> {
        self.inserts
            .lock()
            .expect("lock")
            .push((collection.to_string(), record));
        match self.insert_errors.lock().expect("lock").pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    async fn select(&self, query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        assert_eq!(query.collection, "sectors");
        assert_eq!(query.order_by.as_deref(), Some("display_order"));
        self.sector_rows
            .clone()
            .ok_or_else(|| RemoteError::Transport("connection refused".to_string()))
    }
}

pub(super) fn duplicate_key() -> RemoteError {
    RemoteError::DuplicateKey(
        "duplicate key value violates unique constraint \"members_email_key\"".to_string(),
    )
}

pub(super) fn server_error() -> RemoteError {
    RemoteError::Status {
        status: 500,
        code: Some("XX000".to_string()),
        message: "internal error at relation members".to_string(),
    }
}

/// Store whose calls park until the test releases them.
#[derive(Default)]
pub(super) struct GatedStore {
    pub(super) started: Notify,
    pub(super) release: Notify,
    calls: AtomicUsize,
}

impl GatedStore {
    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RemoteStore for GatedStore {
    async fn insert(&self, _collection: &str, _record: Value) -> Result<(), RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(())
    }

    async fn select(&self, _query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        self.release.notified().await;
        Ok(sector_rows())
    }
}

/// Store that blows up mid-call.
pub(super) struct PanickingStore;

#[async_trait]
impl RemoteStore for PanickingStore {
    async fn insert(&self, _collection: &str, _record: Value) -> Result<(), RemoteError> {
        panic!("connection pool exhausted: secret-token-123");
    }

    async fn select(&self, _query: &SelectQuery) -> Result<Vec<Value>, RemoteError> {
        Ok(sector_rows())
    }
}
