use crate::infra::config_with_database;
use clap::Args;
use neighbourhood_map::error::AppError;
use neighbourhood_map::ingest::{IngestSources, ListingImporter};
use neighbourhood_map::store::SqliteRegionStore;
use neighbourhood_map::telemetry;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct IngestArgs {
    /// CSV with neighbourhood,latitude,longitude
    #[arg(long)]
    pub(crate) neighbourhoods: PathBuf,
    /// CSV with host_id,host_since,host_is_superhost
    #[arg(long)]
    pub(crate) hosts: PathBuf,
    /// Listings export; rows naming unknown neighbourhoods or hosts are skipped
    #[arg(long)]
    pub(crate) listings: PathBuf,
    /// Override the listings database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), AppError> {
    let config = config_with_database(args.database)?;
    telemetry::init(&config.telemetry)?;

    let store = SqliteRegionStore::new(&config.data.database_path);
    let sources = IngestSources {
        neighbourhoods: args.neighbourhoods,
        hosts: args.hosts,
        listings: args.listings,
    };
    let report = ListingImporter::from_paths(&store, &sources)?;

    println!(
        "Imported {} neighbourhoods, {} hosts and {} listings into {}",
        report.neighbourhoods,
        report.hosts,
        report.listings,
        store.path().display()
    );
    if report.skipped_listings > 0 {
        println!(
            "Skipped {} listings with unknown neighbourhood or host",
            report.skipped_listings
        );
    }
    if report.normalized_prices > 0 {
        println!(
            "Stored {} placeholder prices as missing",
            report.normalized_prices
        );
    }
    Ok(())
}
