use crate::ingest::{run_ingest, IngestArgs};
use crate::report::{run_summary, SummaryArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use neighbourhood_map::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "Neighbourhood Map",
    about = "Serve neighbourhood rating and price summaries alongside their boundary map",
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
    /// Load neighbourhood, host and listing CSV exports into the database
    Ingest(IngestArgs),
    /// Print the per-neighbourhood averages the map endpoint serves
    Summary(SummaryArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the listings database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Override the neighbourhood boundary GeoJSON path
    #[arg(long)]
    pub(crate) boundaries: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Ingest(args) => run_ingest(args),
        Command::Summary(args) => run_summary(args),
    }
}
