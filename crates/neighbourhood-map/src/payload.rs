use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::boundary::{BoundaryCollection, BoundaryState};
use crate::store::{RegionStore, StoreError};
use crate::summary::{compute_region_summaries, NeighbourhoodSummary};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error(transparent)]
    DataUnavailable(#[from] StoreError),
    #[error("boundary data missing: {0}")]
    BoundaryDataMissing(String),
}

/// Response body for the map endpoint. Both halves are passed through as
/// computed and loaded; the consumer joins them on the neighbourhood name.
#[derive(Debug, Clone, Serialize)]
pub struct MapPayload {
    pub data: Vec<NeighbourhoodSummary>,
    pub geojson: Arc<BoundaryCollection>,
}

pub fn build_map_payload(
    summaries: Vec<NeighbourhoodSummary>,
    boundaries: &BoundaryState,
) -> Result<MapPayload, MapError> {
    let geojson = boundaries
        .collection()
        .map_err(MapError::BoundaryDataMissing)?;

    Ok(MapPayload {
        data: summaries,
        geojson,
    })
}

/// Names present on only one side of the summary/boundary join. A mismatch
/// only means a region renders without data or is left off the map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinReport {
    pub summaries_without_boundary: Vec<String>,
    pub boundaries_without_summary: Vec<String>,
}

impl JoinReport {
    pub fn between(summaries: &[NeighbourhoodSummary], boundaries: &BoundaryCollection) -> Self {
        let summary_names: HashSet<&str> = summaries
            .iter()
            .map(|summary| summary.neighbourhood.as_str())
            .collect();
        let boundary_names: HashSet<&str> = boundaries.names().collect();

        Self {
            summaries_without_boundary: summaries
                .iter()
                .map(|summary| summary.neighbourhood.as_str())
                .filter(|name| !boundary_names.contains(name))
                .map(str::to_string)
                .collect(),
            boundaries_without_summary: boundaries
                .names()
                .filter(|name| !summary_names.contains(name))
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.summaries_without_boundary.is_empty() && self.boundaries_without_summary.is_empty()
    }
}

/// Owns the store handle and the boundary state injected at startup.
pub struct MapService<S> {
    store: Arc<S>,
    boundaries: BoundaryState,
}

impl<S> MapService<S>
where
    S: RegionStore + 'static,
{
    pub fn new(store: Arc<S>, boundaries: BoundaryState) -> Self {
        Self { store, boundaries }
    }

    pub fn boundaries(&self) -> &BoundaryState {
        &self.boundaries
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn summaries(&self) -> Result<Vec<NeighbourhoodSummary>, MapError> {
        Ok(compute_region_summaries(self.store.as_ref())?)
    }

    /// Summaries plus boundaries, or nothing. Missing boundaries fail the
    /// request before the store is queried.
    pub fn map_payload(&self) -> Result<MapPayload, MapError> {
        let collection = self
            .boundaries
            .collection()
            .map_err(MapError::BoundaryDataMissing)?;

        let summaries = self.summaries()?;

        let report = JoinReport::between(&summaries, &collection);
        if !report.is_complete() {
            debug!(
                summaries_without_boundary = ?report.summaries_without_boundary,
                boundaries_without_summary = ?report.boundaries_without_summary,
                "neighbourhood names did not all match boundary features"
            );
        }

        build_map_payload(summaries, &self.boundaries)
    }
}
