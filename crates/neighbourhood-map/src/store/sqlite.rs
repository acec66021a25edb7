use std::path::{Path, PathBuf};

use rusqlite::{params, Connection, ErrorCode, OpenFlags, Transaction};
use tracing::{debug, info};

use super::{Host, Listing, Neighbourhood, RegionStore, StoreError};
use crate::summary::NeighbourhoodSummary;

const SCHEMA_SQL: &str = include_str!("schema.sql");
const SQL_NEIGHBOURHOOD_SUMMARIES: &str = include_str!("neighbourhood_summaries.sql");

/// Rows written together in one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreBatch<'a> {
    pub neighbourhoods: &'a [Neighbourhood],
    pub hosts: &'a [Host],
    pub listings: &'a [Listing],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub neighbourhoods: usize,
    pub hosts: usize,
    pub listings: usize,
}

/// Sqlite-backed store. Holds only the file path: every call opens its own
/// connection and closes it before returning, on success and on error.
#[derive(Debug, Clone)]
pub struct SqliteRegionStore {
    path: PathBuf,
}

impl SqliteRegionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates the database file and its tables if they do not exist yet.
    pub fn initialize(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::DataUnavailable(format!(
                    "cannot create directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let conn = self.open_write()?;
        conn.execute_batch(SCHEMA_SQL)
            .map_err(|e| StoreError::DataUnavailable(format!("failed to apply schema: {e}")))?;

        info!(path = %self.path.display(), "listings database initialized");
        Ok(())
    }

    /// Writes a batch atomically; any failure rolls the whole batch back.
    pub fn import(&self, batch: StoreBatch<'_>) -> Result<ImportCounts, StoreError> {
        let mut conn = self.open_write()?;
        let tx = conn.transaction().map_err(write_error)?;

        for neighbourhood in batch.neighbourhoods {
            write_neighbourhood(&tx, neighbourhood)?;
        }
        for host in batch.hosts {
            write_host(&tx, host)?;
        }
        for listing in batch.listings {
            write_listing(&tx, listing)?;
        }

        tx.commit().map_err(write_error)?;

        Ok(ImportCounts {
            neighbourhoods: batch.neighbourhoods.len(),
            hosts: batch.hosts.len(),
            listings: batch.listings.len(),
        })
    }

    pub fn insert_neighbourhood(&self, neighbourhood: &Neighbourhood) -> Result<(), StoreError> {
        self.import(StoreBatch {
            neighbourhoods: std::slice::from_ref(neighbourhood),
            ..StoreBatch::default()
        })
        .map(|_| ())
    }

    pub fn insert_host(&self, host: &Host) -> Result<(), StoreError> {
        self.import(StoreBatch {
            hosts: std::slice::from_ref(host),
            ..StoreBatch::default()
        })
        .map(|_| ())
    }

    pub fn insert_listing(&self, listing: &Listing) -> Result<(), StoreError> {
        self.import(StoreBatch {
            listings: std::slice::from_ref(listing),
            ..StoreBatch::default()
        })
        .map(|_| ())
    }

    fn open_read(&self) -> Result<Connection, StoreError> {
        Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| {
            StoreError::DataUnavailable(format!("open {} failed: {e}", self.path.display()))
        })
    }

    fn open_write(&self) -> Result<Connection, StoreError> {
        let conn = Connection::open(&self.path).map_err(|e| {
            StoreError::DataUnavailable(format!("open {} failed: {e}", self.path.display()))
        })?;
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| StoreError::DataUnavailable(format!("enable foreign keys: {e}")))?;
        Ok(conn)
    }
}

impl RegionStore for SqliteRegionStore {
    fn neighbourhood_summaries(&self) -> Result<Vec<NeighbourhoodSummary>, StoreError> {
        let conn = self.open_read()?;
        let mut stmt = conn
            .prepare(SQL_NEIGHBOURHOOD_SUMMARIES)
            .map_err(|e| StoreError::DataUnavailable(format!("prepare failed: {e}")))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(NeighbourhoodSummary {
                    neighbourhood: row.get(0)?,
                    latitude: row.get(1)?,
                    longitude: row.get(2)?,
                    average_rating: row.get(3)?,
                    average_price: row.get(4)?,
                })
            })
            .map_err(|e| StoreError::DataUnavailable(format!("query failed: {e}")))?;

        let mut summaries = Vec::new();
        for row in rows {
            summaries.push(
                row.map_err(|e| StoreError::DataUnavailable(format!("row decode failed: {e}")))?,
            );
        }

        debug!(rows = summaries.len(), path = %self.path.display(), "summary query finished");
        Ok(summaries)
    }
}

fn write_neighbourhood(tx: &Transaction<'_>, hood: &Neighbourhood) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO neighbourhoods (id, name, latitude, longitude) VALUES (?1, ?2, ?3, ?4)",
        params![hood.id, hood.name, hood.latitude, hood.longitude],
    )
    .map_err(write_error)?;
    Ok(())
}

fn write_host(tx: &Transaction<'_>, host: &Host) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO hosts (id, host_since, is_superhost) VALUES (?1, ?2, ?3)",
        params![host.id, host.host_since, host.is_superhost],
    )
    .map_err(write_error)?;
    Ok(())
}

fn write_listing(tx: &Transaction<'_>, listing: &Listing) -> Result<(), StoreError> {
    let details = &listing.details;
    tx.execute(
        r#"
        INSERT INTO listings (
            id, host_id, neighbourhood_id,
            review_scores_rating, price,
            room_type, accommodates, bedrooms, beds,
            minimum_nights, number_of_reviews, availability_365,
            instant_bookable, last_review
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12,
            ?13, ?14
        )
        "#,
        params![
            listing.id,
            listing.host_id,
            listing.neighbourhood_id,
            listing.review_scores_rating,
            listing.price,
            details.room_type,
            details.accommodates,
            details.bedrooms,
            details.beds,
            details.minimum_nights,
            details.number_of_reviews,
            details.availability_365,
            details.instant_bookable,
            details.last_review,
        ],
    )
    .map_err(write_error)?;
    Ok(())
}

fn write_error(err: rusqlite::Error) -> StoreError {
    match err.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => StoreError::Constraint(err.to_string()),
        _ => StoreError::DataUnavailable(err.to_string()),
    }
}
