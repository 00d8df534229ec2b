use crate::infra::{open_store, ConsoleNotifier};
use clap::Args;
use std::sync::Arc;
use stem_club::config::AppConfig;
use stem_club::error::AppError;
use stem_club::store::StoreClient;
use stem_club::telemetry;
use stem_club::workflows::contact::{contact_form, ContactField, ContactSubmissionDraft};
use stem_club::workflows::intake::{FieldErrors, RejectionReason, SubmitResult};
use stem_club::workflows::membership::{
    membership_form, MembershipApplicationDraft, MembershipField, SectorDirectory,
};
use tracing::info;

#[derive(Args, Debug)]
pub(crate) struct ContactArgs {
    /// Your name
    #[arg(long)]
    pub(crate) name: String,
    /// Address the club should reply to
    #[arg(long)]
    pub(crate) email: String,
    #[arg(long)]
    pub(crate) subject: String,
    #[arg(long)]
    pub(crate) message: String,
}

#[derive(Args, Debug)]
pub(crate) struct JoinArgs {
    #[arg(long)]
    pub(crate) full_name: String,
    #[arg(long)]
    pub(crate) email: String,
    /// Class or grade, e.g. "S5B"
    #[arg(long)]
    pub(crate) school_class: String,
    /// Sector of interest by name or id; repeat for a second choice
    #[arg(long)]
    pub(crate) sector: Vec<String>,
    /// Why you want to join (at least 20 characters)
    #[arg(long)]
    pub(crate) reason: String,
}

fn connect() -> Result<Arc<StoreClient>, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let store = open_store(&config.store)?;
    info!(?config.environment, backend = store.label(), "store connected");
    Ok(Arc::new(store))
}

pub(crate) async fn run_sectors() -> Result<(), AppError> {
    let store = connect()?;
    let form = membership_form(store, Arc::new(ConsoleNotifier)).await;

    let sectors = form.sector_options();
    if sectors.is_empty() {
        println!("No sectors available");
        return Ok(());
    }
    println!("Club sectors");
    for sector in sectors {
        println!("- {} ({})", sector.name, sector.id);
    }
    Ok(())
}

pub(crate) async fn run_contact(args: ContactArgs) -> Result<(), AppError> {
    let store = connect()?;
    let form = contact_form(store, Arc::new(ConsoleNotifier));

    form.fill(ContactSubmissionDraft {
        name: args.name,
        email: args.email,
        subject: args.subject,
        message: args.message,
    });
    report(form.submit().await, ContactField::label)
}

pub(crate) async fn run_join(args: JoinArgs) -> Result<(), AppError> {
    let store = connect()?;
    let form = membership_form(store, Arc::new(ConsoleNotifier)).await;

    let directory = SectorDirectory::new(form.sector_options());
    let sector_selection = args
        .sector
        .iter()
        .map(|label| {
            directory
                .resolve(label)
                .ok_or_else(|| AppError::UnknownSector(label.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    form.fill(MembershipApplicationDraft {
        full_name: args.full_name,
        email: args.email,
        school_class: args.school_class,
        sector_selection,
        reason_to_join: args.reason,
    });
    report(form.submit().await, MembershipField::label)
}

/// Print what happened to the submission. Anything short of acceptance is an error so
/// the command exits non-zero.
fn report<K>(result: SubmitResult<K>, label: impl Fn(K) -> &'static str) -> Result<(), AppError>
where
    K: Ord + Copy,
{
    let reason = match result {
        SubmitResult::Accepted => return Ok(()),
        SubmitResult::Invalid(errors) => {
            print_field_errors(&errors, label);
            "invalid"
        }
        SubmitResult::Rejected(RejectionReason::DuplicateSubmission) | SubmitResult::Blocked => {
            "duplicate"
        }
        SubmitResult::Rejected(RejectionReason::TransientFailure) => "failed",
        SubmitResult::InFlight | SubmitResult::AlreadyAccepted => "busy",
        SubmitResult::Detached => "detached",
    };
    Err(AppError::NotAccepted(reason))
}

fn print_field_errors<K>(errors: &FieldErrors<K>, label: impl Fn(K) -> &'static str)
where
    K: Ord + Copy,
{
    for (field, message) in errors.iter() {
        eprintln!("  {}: {}", label(*field), message);
    }
}
