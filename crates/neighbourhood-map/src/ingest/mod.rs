mod parser;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use crate::store::{
    Host, Listing, ListingDetails, Neighbourhood, PriceField, SqliteRegionStore, StoreBatch,
    StoreError,
};
use parser::{HostRow, ListingRow, NeighbourhoodRow};

#[derive(Debug)]
pub enum IngestError {
    Io(std::io::Error),
    Csv(csv::Error),
    Store(StoreError),
    InvalidRow {
        file: &'static str,
        line: usize,
        reason: String,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Io(err) => write!(f, "failed to read ingestion source: {err}"),
            IngestError::Csv(err) => write!(f, "invalid CSV data: {err}"),
            IngestError::Store(err) => write!(f, "could not write listings database: {err}"),
            IngestError::InvalidRow { file, line, reason } => {
                write!(f, "{file} line {line}: {reason}")
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Io(err) => Some(err),
            IngestError::Csv(err) => Some(err),
            IngestError::Store(err) => Some(err),
            IngestError::InvalidRow { .. } => None,
        }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<StoreError> for IngestError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

/// The three CSV exports loaded into a fresh database.
#[derive(Debug, Clone)]
pub struct IngestSources {
    pub neighbourhoods: PathBuf,
    pub hosts: PathBuf,
    pub listings: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub neighbourhoods: usize,
    pub hosts: usize,
    pub listings: usize,
    pub skipped_listings: usize,
    /// Price placeholders such as `NaN` stored as NULL.
    pub normalized_prices: usize,
}

#[derive(Debug, Default)]
struct ParsedTables {
    neighbourhoods: Vec<Neighbourhood>,
    hosts: Vec<Host>,
    listings: Vec<Listing>,
    skipped_listings: usize,
    normalized_prices: usize,
}

pub struct ListingImporter;

impl ListingImporter {
    pub fn from_paths(
        store: &SqliteRegionStore,
        sources: &IngestSources,
    ) -> Result<IngestReport, IngestError> {
        let neighbourhoods = File::open(&sources.neighbourhoods)?;
        let hosts = File::open(&sources.hosts)?;
        let listings = File::open(&sources.listings)?;
        Self::from_readers(store, neighbourhoods, hosts, listings)
    }

    /// Parses all three sources before touching the database, then writes
    /// every row in a single transaction.
    pub fn from_readers<N: Read, H: Read, L: Read>(
        store: &SqliteRegionStore,
        neighbourhoods: N,
        hosts: H,
        listings: L,
    ) -> Result<IngestReport, IngestError> {
        let mut tables = ParsedTables::default();
        parse_neighbourhoods(neighbourhoods, &mut tables)?;
        parse_hosts(hosts, &mut tables)?;
        parse_listings(listings, &mut tables)?;

        store.initialize()?;
        let counts = store.import(StoreBatch {
            neighbourhoods: &tables.neighbourhoods,
            hosts: &tables.hosts,
            listings: &tables.listings,
        })?;

        let report = IngestReport {
            neighbourhoods: counts.neighbourhoods,
            hosts: counts.hosts,
            listings: counts.listings,
            skipped_listings: tables.skipped_listings,
            normalized_prices: tables.normalized_prices,
        };
        info!(
            neighbourhoods = report.neighbourhoods,
            hosts = report.hosts,
            listings = report.listings,
            skipped = report.skipped_listings,
            normalized_prices = report.normalized_prices,
            path = %store.path().display(),
            "listings ingested"
        );
        Ok(report)
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

/// Header occupies line 1.
fn line_of(index: usize) -> usize {
    index + 2
}

fn parse_neighbourhoods<R: Read>(reader: R, tables: &mut ParsedTables) -> Result<(), IngestError> {
    let mut seen = HashSet::new();
    for (index, row) in csv_reader(reader).deserialize::<NeighbourhoodRow>().enumerate() {
        let row = row?;
        if !seen.insert(row.neighbourhood.clone()) {
            return Err(IngestError::InvalidRow {
                file: "neighbourhoods",
                line: line_of(index),
                reason: format!("duplicate neighbourhood '{}'", row.neighbourhood),
            });
        }
        tables.neighbourhoods.push(Neighbourhood {
            id: tables.neighbourhoods.len() as i64 + 1,
            name: row.neighbourhood,
            latitude: row.latitude,
            longitude: row.longitude,
        });
    }
    Ok(())
}

fn parse_hosts<R: Read>(reader: R, tables: &mut ParsedTables) -> Result<(), IngestError> {
    for (index, row) in csv_reader(reader).deserialize::<HostRow>().enumerate() {
        let row: HostRow = row?;
        let invalid = |reason: String| IngestError::InvalidRow {
            file: "hosts",
            line: line_of(index),
            reason,
        };

        tables.hosts.push(Host {
            id: row.host_id,
            host_since: parser::parse_date(row.host_since.as_deref()).map_err(invalid)?,
            is_superhost: parser::parse_bool(row.host_is_superhost.as_deref()).map_err(invalid)?,
        });
    }
    Ok(())
}

fn parse_listings<R: Read>(reader: R, tables: &mut ParsedTables) -> Result<(), IngestError> {
    let neighbourhood_ids: HashMap<String, i64> = tables
        .neighbourhoods
        .iter()
        .map(|hood| (hood.name.clone(), hood.id))
        .collect();
    let host_ids: HashSet<i64> = tables.hosts.iter().map(|host| host.id).collect();

    for (index, row) in csv_reader(reader).deserialize::<ListingRow>().enumerate() {
        let row: ListingRow = row?;
        let line = line_of(index);

        let Some(&neighbourhood_id) = neighbourhood_ids.get(&row.neighbourhood) else {
            warn!(listing = row.id, neighbourhood = %row.neighbourhood, line, "skipping listing in unknown neighbourhood");
            tables.skipped_listings += 1;
            continue;
        };
        if !host_ids.contains(&row.host_id) {
            warn!(listing = row.id, host = row.host_id, line, "skipping listing with unknown host");
            tables.skipped_listings += 1;
            continue;
        }

        let listing = build_listing(&row, neighbourhood_id, &mut tables.normalized_prices)
            .map_err(|reason| IngestError::InvalidRow {
                file: "listings",
                line,
                reason,
            })?;
        tables.listings.push(listing);
    }
    Ok(())
}

fn build_listing(
    row: &ListingRow,
    neighbourhood_id: i64,
    normalized_prices: &mut usize,
) -> Result<Listing, String> {
    let price = row
        .price
        .as_deref()
        .map(PriceField::parse)
        .unwrap_or_default();
    if price.is_unknown() {
        *normalized_prices += 1;
    }

    let details = ListingDetails {
        room_type: row.room_type.clone(),
        accommodates: parser::parse_optional_number(row.accommodates.as_deref(), "accommodates")?,
        bedrooms: parser::parse_optional_number(row.bedrooms.as_deref(), "bedrooms")?,
        beds: parser::parse_optional_number(row.beds.as_deref(), "beds")?,
        minimum_nights: parser::parse_optional_number(
            row.minimum_nights.as_deref(),
            "minimum_nights",
        )?,
        number_of_reviews: parser::parse_optional_number(
            row.number_of_reviews.as_deref(),
            "number_of_reviews",
        )?,
        availability_365: parser::parse_optional_number(
            row.availability_365.as_deref(),
            "availability_365",
        )?,
        instant_bookable: parser::parse_bool(row.instant_bookable.as_deref())?,
        last_review: parser::parse_date(row.last_review.as_deref())?,
    };

    Ok(Listing {
        id: row.id,
        host_id: row.host_id,
        neighbourhood_id,
        review_scores_rating: parser::parse_rating(row.review_scores_rating.as_deref())?,
        price: price.normalized(),
        details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RegionStore;

    const NEIGHBOURHOODS: &str = "neighbourhood,latitude,longitude\n\
        Five Points,39.7547,-104.9773\n\
        Baker,39.7162,-104.9931\n\
        Sun Valley,39.7313,-105.0180\n";

    const HOSTS: &str = "host_id,host_since,host_is_superhost\n\
        1,2014-06-01,t\n\
        2,,f\n";

    const LISTINGS: &str = "id,host_id,neighbourhood,review_scores_rating,price,room_type,accommodates,bedrooms,beds,minimum_nights,number_of_reviews,availability_365,instant_bookable,last_review\n\
        100,1,Five Points,5,$100.00,Entire home/apt,4,2,2,30,120,200,t,2024-03-01\n\
        101,2,Five Points,4,NaN,Private room,2,1,1,1,15,40,f,\n\
        102,1,Baker,,\"$1,250.00\",Entire home/apt,8,4,5,2,3,300,f,2023-11-20\n\
        103,2,Whittier,4.5,$80.00,Private room,1,1,1,1,0,0,f,\n";

    fn store_in(dir: &tempfile::TempDir) -> SqliteRegionStore {
        SqliteRegionStore::new(dir.path().join("db").join("listings.sqlite3"))
    }

    #[test]
    fn ingests_and_normalizes_price_sentinels() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);

        let report = ListingImporter::from_readers(
            &store,
            NEIGHBOURHOODS.as_bytes(),
            HOSTS.as_bytes(),
            LISTINGS.as_bytes(),
        )
        .expect("ingestion succeeds");

        assert_eq!(
            report,
            IngestReport {
                neighbourhoods: 3,
                hosts: 2,
                listings: 3,
                skipped_listings: 1,
                normalized_prices: 1,
            }
        );

        let summaries = store.neighbourhood_summaries().expect("summaries");
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].neighbourhood, "Baker");
        assert_eq!(summaries[0].average_rating, None);
        assert_eq!(summaries[0].average_price, Some(1250.0));
        assert_eq!(summaries[1].neighbourhood, "Five Points");
        assert_eq!(summaries[1].average_rating, Some(4.5));
        assert_eq!(summaries[1].average_price, Some(100.0));
    }

    #[test]
    fn duplicate_neighbourhood_names_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let neighbourhoods = "neighbourhood,latitude,longitude\nBaker,39.7,-104.9\nBaker,39.8,-104.8\n";

        let err = ListingImporter::from_readers(
            &store,
            neighbourhoods.as_bytes(),
            HOSTS.as_bytes(),
            "id,host_id,neighbourhood\n".as_bytes(),
        )
        .expect_err("names must be unique");

        assert!(matches!(err, IngestError::InvalidRow { line: 3, .. }));
        assert!(!store.path().exists(), "nothing written on parse failure");
    }

    #[test]
    fn hundred_point_ratings_are_reported_with_line() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let listings = "id,host_id,neighbourhood,review_scores_rating,price\n100,1,Baker,97,$90\n";

        let err = ListingImporter::from_readers(
            &store,
            NEIGHBOURHOODS.as_bytes(),
            HOSTS.as_bytes(),
            listings.as_bytes(),
        )
        .expect_err("rating out of range");

        assert_eq!(
            err.to_string(),
            "listings line 2: review_scores_rating 97 is outside the 0-5 scale"
        );
    }
}
