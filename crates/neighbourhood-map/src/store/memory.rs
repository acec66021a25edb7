use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use super::{Host, Listing, Neighbourhood, RegionStore, StoreError};
use crate::summary::{NeighbourhoodSummary, RunningMean};

#[derive(Debug, Default)]
struct Tables {
    neighbourhoods: BTreeMap<i64, Neighbourhood>,
    hosts: HashMap<i64, Host>,
    listings: Vec<Listing>,
}

/// Store kept entirely in memory. Enforces the same uniqueness and
/// reference rules as the sqlite schema.
#[derive(Debug, Default)]
pub struct InMemoryRegionStore {
    tables: Mutex<Tables>,
    outage: Option<String>,
}

impl InMemoryRegionStore {
    /// A store whose reads always fail with `DataUnavailable`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            tables: Mutex::default(),
            outage: Some(reason.into()),
        }
    }

    pub fn add_neighbourhood(&self, neighbourhood: Neighbourhood) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.neighbourhoods.contains_key(&neighbourhood.id) {
            return Err(StoreError::Constraint(format!(
                "neighbourhood id {} already exists",
                neighbourhood.id
            )));
        }
        if tables
            .neighbourhoods
            .values()
            .any(|existing| existing.name == neighbourhood.name)
        {
            return Err(StoreError::Constraint(format!(
                "neighbourhood name '{}' already exists",
                neighbourhood.name
            )));
        }
        tables.neighbourhoods.insert(neighbourhood.id, neighbourhood);
        Ok(())
    }

    pub fn add_host(&self, host: Host) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables.hosts.contains_key(&host.id) {
            return Err(StoreError::Constraint(format!("host id {} already exists", host.id)));
        }
        tables.hosts.insert(host.id, host);
        Ok(())
    }

    pub fn add_listing(&self, listing: Listing) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.hosts.contains_key(&listing.host_id) {
            return Err(StoreError::Constraint(format!(
                "listing {} references unknown host {}",
                listing.id, listing.host_id
            )));
        }
        if !tables.neighbourhoods.contains_key(&listing.neighbourhood_id) {
            return Err(StoreError::Constraint(format!(
                "listing {} references unknown neighbourhood {}",
                listing.id, listing.neighbourhood_id
            )));
        }
        if tables.listings.iter().any(|existing| existing.id == listing.id) {
            return Err(StoreError::Constraint(format!(
                "listing id {} already exists",
                listing.id
            )));
        }
        tables.listings.push(listing);
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::DataUnavailable("in-memory store lock poisoned".to_string()))
    }
}

impl RegionStore for InMemoryRegionStore {
    fn neighbourhood_summaries(&self) -> Result<Vec<NeighbourhoodSummary>, StoreError> {
        if let Some(reason) = &self.outage {
            return Err(StoreError::DataUnavailable(reason.clone()));
        }

        let tables = self.lock()?;
        let mut groups: BTreeMap<i64, (RunningMean, RunningMean)> = BTreeMap::new();
        for listing in &tables.listings {
            let (rating, price) = groups.entry(listing.neighbourhood_id).or_default();
            rating.push(listing.review_scores_rating);
            price.push(listing.price.amount());
        }

        let mut summaries: Vec<NeighbourhoodSummary> = groups
            .into_iter()
            .filter_map(|(id, (rating, price))| {
                tables.neighbourhoods.get(&id).map(|hood| NeighbourhoodSummary {
                    neighbourhood: hood.name.clone(),
                    average_rating: rating.mean(),
                    average_price: price.mean(),
                    latitude: hood.latitude,
                    longitude: hood.longitude,
                })
            })
            .collect();
        summaries.sort_by(|left, right| left.neighbourhood.cmp(&right.neighbourhood));
        Ok(summaries)
    }
}
