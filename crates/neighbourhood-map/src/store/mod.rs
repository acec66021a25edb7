mod memory;
mod sqlite;

pub use memory::InMemoryRegionStore;
pub use sqlite::{ImportCounts, SqliteRegionStore, StoreBatch};

use chrono::NaiveDate;
use rusqlite::types::{ToSql, ToSqlOutput, Value};

use crate::summary::NeighbourhoodSummary;

/// Tokens upstream exports use in the price column when the nightly rate is
/// not known.
pub const PRICE_SENTINELS: &[&str] = &["nan", "n/a", "na", "unknown", "null", "none"];

/// A named area listings are grouped by. The name is the join key against
/// the boundary collection and is unique within a store.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbourhood {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Owner of one or more listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    pub id: i64,
    pub host_since: Option<NaiveDate>,
    pub is_superhost: bool,
}

/// Nightly price as it arrived from the source.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PriceField {
    #[default]
    Missing,
    /// A non-numeric placeholder such as `"NaN"`, kept verbatim.
    Unknown(String),
    Amount(f64),
}

impl PriceField {
    /// Parses exported price strings such as `$1,250.00`. Sentinel tokens and
    /// anything else that is not a finite number become [`PriceField::Unknown`].
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Self::Missing;
        }

        let lowered = trimmed.to_ascii_lowercase();
        if PRICE_SENTINELS.contains(&lowered.as_str()) {
            return Self::Unknown(trimmed.to_string());
        }

        let cleaned: String = trimmed
            .chars()
            .filter(|ch| *ch != '$' && *ch != ',')
            .collect();
        match cleaned.parse::<f64>() {
            Ok(value) if value.is_finite() => Self::Amount(value),
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    /// The value that participates in averaging, if any.
    pub fn amount(&self) -> Option<f64> {
        match self {
            Self::Amount(value) if value.is_finite() => Some(*value),
            _ => None,
        }
    }

    /// Collapses unknown placeholders to a true null.
    pub fn normalized(self) -> Self {
        match self {
            Self::Unknown(_) => Self::Missing,
            Self::Amount(value) if !value.is_finite() => Self::Missing,
            other => other,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl ToSql for PriceField {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let value = match self {
            Self::Missing => Value::Null,
            Self::Unknown(raw) => Value::Text(raw.clone()),
            Self::Amount(value) if value.is_finite() => Value::Real(*value),
            Self::Amount(value) => Value::Text(value.to_string()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Descriptive listing attributes carried through ingestion. None of them
/// take part in the neighbourhood aggregation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingDetails {
    pub room_type: Option<String>,
    pub accommodates: Option<i64>,
    pub bedrooms: Option<f64>,
    pub beds: Option<f64>,
    pub minimum_nights: Option<i64>,
    pub number_of_reviews: Option<i64>,
    pub availability_365: Option<i64>,
    pub instant_bookable: bool,
    pub last_review: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub id: i64,
    pub host_id: i64,
    pub neighbourhood_id: i64,
    /// Review score on a 0–5 scale.
    pub review_scores_rating: Option<f64>,
    pub price: PriceField,
    pub details: ListingDetails,
}

impl Listing {
    pub fn new(id: i64, host_id: i64, neighbourhood_id: i64) -> Self {
        Self {
            id,
            host_id,
            neighbourhood_id,
            review_scores_rating: None,
            price: PriceField::Missing,
            details: ListingDetails::default(),
        }
    }

    pub fn with_rating(mut self, rating: Option<f64>) -> Self {
        self.review_scores_rating = rating;
        self
    }

    pub fn with_price(mut self, price: PriceField) -> Self {
        self.price = price;
        self
    }
}

/// Read side of the listings store used by the aggregation engine.
pub trait RegionStore: Send + Sync {
    /// One summary per neighbourhood that has at least one listing.
    fn neighbourhood_summaries(&self) -> Result<Vec<NeighbourhoodSummary>, StoreError>;
}

impl<T: RegionStore + ?Sized> RegionStore for std::sync::Arc<T> {
    fn neighbourhood_summaries(&self) -> Result<Vec<NeighbourhoodSummary>, StoreError> {
        (**self).neighbourhood_summaries()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("data unavailable: {0}")]
    DataUnavailable(String),
    #[error("constraint violated: {0}")]
    Constraint(String),
}
