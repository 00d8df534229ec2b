//! Membership applications and the sector directory they reference.

pub mod directory;
pub mod domain;
pub mod schema;

use std::sync::Arc;

pub use directory::{
    fetch_sector_directory, sector_query, DirectoryLoad, Sector, SectorDirectory, SectorId,
    SECTORS_COLLECTION, SECTORS_UNAVAILABLE,
};
pub use domain::{
    MemberStatus, MembershipApplication, MembershipApplicationDraft, MembershipEdit,
    MembershipField,
};
pub use schema::MembershipSchema;

use super::intake::{Notifier, SubmissionController};
use crate::store::RemoteStore;

pub type MembershipController<S, N> = SubmissionController<MembershipSchema, S, N>;

/// Mount a membership form and load its sector choices.
pub async fn membership_form<S, N>(store: Arc<S>, notifier: Arc<N>) -> MembershipController<S, N>
where
    S: RemoteStore + ?Sized,
    N: Notifier + ?Sized,
{
    let form = SubmissionController::new(MembershipSchema::default(), store, notifier);
    form.load_sectors().await;
    form
}
