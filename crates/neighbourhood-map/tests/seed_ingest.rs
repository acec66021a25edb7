use std::path::PathBuf;
use std::sync::Arc;

use neighbourhood_map::boundary::BoundaryState;
use neighbourhood_map::ingest::{IngestSources, ListingImporter};
use neighbourhood_map::payload::{JoinReport, MapService};
use neighbourhood_map::store::SqliteRegionStore;

fn seed_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../seed")
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("value present");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

#[test]
fn seed_exports_ingest_and_serve() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = SqliteRegionStore::new(dir.path().join("listings.sqlite3"));
    let seed = seed_dir();

    let report = ListingImporter::from_paths(
        &store,
        &IngestSources {
            neighbourhoods: seed.join("neighbourhoods.csv"),
            hosts: seed.join("hosts.csv"),
            listings: seed.join("listings.csv"),
        },
    )
    .expect("seed ingests");
    assert_eq!(report.neighbourhoods, 4);
    assert_eq!(report.hosts, 3);
    assert_eq!(report.listings, 6);
    assert_eq!(report.skipped_listings, 0);
    assert_eq!(report.normalized_prices, 2);

    let boundaries =
        BoundaryState::default().load(seed.join("denver_neighbourhoods.geojson"));
    assert!(boundaries.is_ready());

    let service = MapService::new(Arc::new(store), boundaries);
    let payload = service.map_payload().expect("payload");

    let names: Vec<&str> = payload
        .data
        .iter()
        .map(|summary| summary.neighbourhood.as_str())
        .collect();
    assert_eq!(names, ["Capitol Hill", "Five Points", "Highland"]);

    assert_close(payload.data[0].average_rating, 4.575);
    assert_close(payload.data[0].average_price, 72.0);
    assert_close(payload.data[1].average_rating, 4.765);
    assert_close(payload.data[1].average_price, 121.5);
    assert_close(payload.data[2].average_rating, 4.85);
    assert_close(payload.data[2].average_price, 1250.0);

    let report = JoinReport::between(&payload.data, &payload.geojson);
    assert!(report.summaries_without_boundary.is_empty());
    assert_eq!(report.boundaries_without_summary, ["Sun Valley"]);
}
