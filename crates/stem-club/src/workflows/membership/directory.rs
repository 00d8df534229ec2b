use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use super::schema::MembershipSchema;
use crate::store::{RemoteError, RemoteStore, SelectQuery};
use crate::workflows::intake::{Notice, Notifier, SubmissionController};

pub const SECTORS_COLLECTION: &str = "sectors";

pub const SECTORS_UNAVAILABLE: Notice = Notice::destructive(
    "Sectors unavailable",
    "We couldn't load the list of sectors. Reload the page to try again.",
);

/// Opaque sector reference stored on member rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectorId(pub Uuid);

impl fmt::Display for SectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Program track an applicant can join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sector {
    pub id: SectorId,
    pub name: String,
    pub display_order: i32,
}

/// Sectors loaded for one form mount, ascending by display order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectorDirectory {
    sectors: Vec<Sector>,
}

fn sector_key(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();
    match lower.strip_suffix(" sector") {
        Some(stripped) => stripped.trim_end().to_string(),
        None => lower,
    }
}

impl SectorDirectory {
    pub fn new(mut sectors: Vec<Sector>) -> Self {
        sectors.sort_by_key(|sector| sector.display_order);
        Self { sectors }
    }

    pub fn sectors(&self) -> &[Sector] {
        &self.sectors
    }

    pub fn len(&self) -> usize {
        self.sectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sectors.is_empty()
    }

    pub fn contains(&self, id: SectorId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: SectorId) -> Option<usize> {
        self.sectors.iter().position(|sector| sector.id == id)
    }

    /// Map a user-facing selection to a sector reference.
    ///
    /// Accepts the sector UUID or its name, case-insensitively and with or without the
    /// trailing "Sector" ("technology" matches "Technology Sector").
    pub fn resolve(&self, label: &str) -> Option<SectorId> {
        if let Ok(uuid) = Uuid::parse_str(label.trim()) {
            let id = SectorId(uuid);
            return self.contains(id).then_some(id);
        }

        let wanted = sector_key(label);
        if wanted.is_empty() {
            return None;
        }
        self.sectors
            .iter()
            .find(|sector| sector_key(&sector.name) == wanted)
            .map(|sector| sector.id)
    }
}

pub fn sector_query() -> SelectQuery {
    SelectQuery::new(SECTORS_COLLECTION)
        .columns(["id", "name", "display_order"])
        .order_by("display_order")
}

/// Read every sector ordered by display order.
pub async fn fetch_sector_directory<S>(store: &S) -> Result<SectorDirectory, RemoteError>
where
    S: RemoteStore + ?Sized,
{
    let rows = store.select(&sector_query()).await?;
    let sectors = rows
        .into_iter()
        .map(serde_json::from_value::<Sector>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| RemoteError::Decode(format!("sector row: {err}")))?;
    Ok(SectorDirectory::new(sectors))
}

/// Result of loading sector choices into a mounted form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryLoad {
    Loaded(usize),
    /// Fetch failed; the selector stays empty and a notice was raised.
    Unavailable,
    /// The form was unmounted before the fetch resolved.
    Detached,
}

impl<S, N> SubmissionController<MembershipSchema, S, N>
where
    S: RemoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    /// Populate the sector selector. Failure is non-blocking and not retried.
    pub async fn load_sectors(&self) -> DirectoryLoad {
        match fetch_sector_directory(self.store()).await {
            Ok(directory) => {
                let count = directory.len();
                match self.with_schema(|schema| schema.replace_directory(directory)) {
                    Some(()) => {
                        debug!(count, "sector directory loaded");
                        DirectoryLoad::Loaded(count)
                    }
                    None => DirectoryLoad::Detached,
                }
            }
            Err(error) => {
                let cleared = self
                    .with_schema(|schema| schema.replace_directory(SectorDirectory::default()));
                if cleared.is_none() {
                    return DirectoryLoad::Detached;
                }
                warn!(kind = error.label(), %error, "sector directory unavailable");
                self.notify(SECTORS_UNAVAILABLE);
                DirectoryLoad::Unavailable
            }
        }
    }

    /// Options currently offered by the sector selector.
    pub fn sector_options(&self) -> Vec<Sector> {
        self.read_schema(|schema| schema.directory().sectors().to_vec())
    }
}
