use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use stem_club::config::StoreConfig;
use stem_club::store::{InMemoryStore, RemoteError, StoreClient};
use stem_club::workflows::contact::ContactSchema;
use stem_club::workflows::intake::{FormSchema, Notice, NoticeTone, Notifier};
use stem_club::workflows::membership::{MembershipSchema, SECTORS_COLLECTION};
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

const CLUB_SECTORS: [&str; 5] = [
    "Sustainability Sector",
    "Technology Sector",
    "Bridge Building Sector",
    "Aqualibrium Sector",
    "Mathematics Sector",
];

/// Local stand-in for the hosted store when no Supabase project is configured.
///
/// Carries the club's sectors plus the unique constraints the hosted tables declare.
pub(crate) fn club_store() -> InMemoryStore {
    let sectors = CLUB_SECTORS
        .iter()
        .zip(1..)
        .map(|(name, display_order)| {
            json!({
                "id": Uuid::new_v4(),
                "name": name,
                "display_order": display_order,
            })
        });

    InMemoryStore::new()
        .with_rows(SECTORS_COLLECTION, sectors)
        .with_unique(MembershipSchema::COLLECTION, &["email"])
        .with_unique(ContactSchema::COLLECTION, &["email", "subject", "message"])
}

/// Connect the configured store, seeding the local fallback when no project is set.
pub(crate) fn open_store(config: &StoreConfig) -> Result<StoreClient, RemoteError> {
    let store = StoreClient::from_config(config, club_store)?;
    if let StoreClient::Memory(_) = store {
        warn!("no Supabase project configured; submissions are kept in memory");
    }
    Ok(store)
}

/// Prints notices to the terminal for the CLI form commands.
#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.tone {
            NoticeTone::Success => println!("{}: {}", notice.title, notice.description),
            NoticeTone::Destructive => eprintln!("{}: {}", notice.title, notice.description),
        }
    }
}
