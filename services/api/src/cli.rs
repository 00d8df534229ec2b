use crate::forms::{run_contact, run_join, run_sectors, ContactArgs, JoinArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use stem_club::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "STEM Club Intake",
    about = "Serve or exercise the STEM club contact and membership forms",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// List the sectors offered on the membership form
    Sectors,
    /// Send a message through the contact form
    Contact(ContactArgs),
    /// Apply for club membership
    Join(JoinArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Sectors => run_sectors().await,
        Command::Contact(args) => run_contact(args).await,
        Command::Join(args) => run_join(args).await,
    }
}
