use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{RegionStore, StoreError};

/// Aggregated statistics for one neighbourhood, in the shape served to the
/// dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighbourhoodSummary {
    pub neighbourhood: String,
    pub average_rating: Option<f64>,
    pub average_price: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Computes per-neighbourhood averages over the whole store, ordered by
/// neighbourhood name using ordinal comparison.
///
/// Neighbourhoods without listings are absent. A neighbourhood whose
/// listings carry no usable rating (or price) reports `None` for that
/// average rather than zero. Store failures are returned as-is; retrying
/// is the caller's decision.
pub fn compute_region_summaries<S>(store: &S) -> Result<Vec<NeighbourhoodSummary>, StoreError>
where
    S: RegionStore + ?Sized,
{
    let mut summaries = store.neighbourhood_summaries()?;
    summaries.sort_by(|left, right| left.neighbourhood.cmp(&right.neighbourhood));

    debug!(neighbourhoods = summaries.len(), "computed neighbourhood summaries");
    Ok(summaries)
}

/// Arithmetic mean over the values that were actually observed.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RunningMean {
    sum: f64,
    count: u64,
}

impl RunningMean {
    pub(crate) fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value.filter(|value| value.is_finite()) {
            self.sum += value;
            self.count += 1;
        }
    }

    pub(crate) fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}
