use crate::infra::AppState;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use neighbourhood_map::error::AppError;
use neighbourhood_map::payload::{MapPayload, MapService};
use neighbourhood_map::presentation::{dashboard_page, error_page, DashboardVm, TableSpec};
use neighbourhood_map::store::RegionStore;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DashboardQuery {
    /// `Label:key` pairs separated by commas.
    #[serde(default)]
    pub(crate) columns: Option<String>,
}

pub(crate) fn with_map_routes<S>(service: Arc<MapService<S>>) -> Router
where
    S: RegionStore + 'static,
{
    Router::new()
        .route("/locations/average", get(average_ratings_endpoint::<S>))
        .route("/dashboard", get(dashboard_endpoint::<S>))
        .with_state(service)
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn index() -> &'static str {
    "Neighbourhood map service"
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "unavailable" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// The store query is blocking, so it runs off the async workers.
async fn load_payload<S>(service: Arc<MapService<S>>) -> Result<MapPayload, AppError>
where
    S: RegionStore + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || service.map_payload())
        .await
        .map_err(std::io::Error::from)?;

    outcome.map_err(|err| {
        error!(error = %err, "map payload request failed");
        AppError::from(err)
    })
}

pub(crate) async fn average_ratings_endpoint<S>(
    State(service): State<Arc<MapService<S>>>,
) -> Result<Json<MapPayload>, AppError>
where
    S: RegionStore + 'static,
{
    Ok(Json(load_payload(service).await?))
}

pub(crate) async fn dashboard_endpoint<S>(
    State(service): State<Arc<MapService<S>>>,
    Query(query): Query<DashboardQuery>,
) -> Response
where
    S: RegionStore + 'static,
{
    let table = query
        .columns
        .as_deref()
        .map(TableSpec::parse)
        .unwrap_or_default();

    match load_payload(service).await {
        Ok(payload) => {
            let page = dashboard_page(&DashboardVm::from_payload(&payload, &table));
            Html(page.into_string()).into_response()
        }
        Err(err) => {
            let status = err.status();
            let page = error_page(status.as_u16(), &err.to_string());
            (status, Html(page.into_string())).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use neighbourhood_map::boundary::{BoundaryCollection, BoundaryState};
    use neighbourhood_map::store::{Host, InMemoryRegionStore, Listing, Neighbourhood, PriceField};
    use serde_json::Value;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn boundaries() -> BoundaryCollection {
        BoundaryCollection::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "properties": { "neighbourhood": "Five Points" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-104.99, 39.75], [-104.96, 39.75], [-104.96, 39.77], [-104.99, 39.75]]]
                    }
                },
                {
                    "type": "Feature",
                    "properties": { "neighbourhood": "Sun Valley" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-105.03, 39.72], [-105.01, 39.72], [-105.01, 39.74], [-105.03, 39.72]]]
                    }
                }
            ]
        }))
        .expect("valid collection")
    }

    fn seeded_store() -> InMemoryRegionStore {
        let store = InMemoryRegionStore::default();
        store
            .add_neighbourhood(Neighbourhood {
                id: 1,
                name: "Five Points".to_string(),
                latitude: 39.7547,
                longitude: -104.9773,
            })
            .expect("neighbourhood");
        store
            .add_host(Host {
                id: 7,
                host_since: None,
                is_superhost: true,
            })
            .expect("host");
        store
            .add_listing(
                Listing::new(1, 7, 1)
                    .with_rating(Some(5.0))
                    .with_price(PriceField::Amount(100.0)),
            )
            .expect("listing");
        store
            .add_listing(
                Listing::new(2, 7, 1)
                    .with_rating(Some(4.0))
                    .with_price(PriceField::parse("NaN")),
            )
            .expect("listing");
        store
    }

    fn router(store: InMemoryRegionStore, boundaries: BoundaryState) -> Router {
        with_map_routes(Arc::new(MapService::new(Arc::new(store), boundaries)))
    }

    async fn fetch(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn average_endpoint_returns_data_and_geojson() {
        let app = router(seeded_store(), BoundaryState::ready(boundaries()));
        let (status, body) = fetch(app, "/locations/average").await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_str(&body).expect("json body");
        let object = body.as_object().expect("object body");
        assert_eq!(object.len(), 2);
        assert_eq!(
            body["data"],
            json!([{
                "neighbourhood": "Five Points",
                "average_rating": 4.5,
                "average_price": 100.0,
                "latitude": 39.7547,
                "longitude": -104.9773
            }])
        );
        assert_eq!(body["geojson"]["features"].as_array().map(Vec::len), Some(2));
    }

    #[tokio::test]
    async fn missing_boundaries_fail_every_request() {
        let app = router(
            seeded_store(),
            BoundaryState::Unavailable {
                reason: "seed/denver_neighbourhoods.geojson: No such file or directory".to_string(),
            },
        );

        for _ in 0..2 {
            let (status, body) = fetch(app.clone(), "/locations/average").await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            let body: Value = serde_json::from_str(&body).expect("json body");
            assert!(body["error"]
                .as_str()
                .expect("error message")
                .starts_with("boundary data missing"));
            assert!(body.get("data").is_none());
        }
    }

    #[tokio::test]
    async fn store_outage_is_a_server_error() {
        let app = router(
            InMemoryRegionStore::unavailable("connection refused"),
            BoundaryState::ready(boundaries()),
        );
        let (status, body) = fetch(app, "/locations/average").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            serde_json::from_str::<Value>(&body).expect("json body"),
            json!({ "error": "data unavailable: connection refused" })
        );
    }

    #[tokio::test]
    async fn dashboard_renders_no_data_regions_and_custom_columns() {
        let app = router(seeded_store(), BoundaryState::ready(boundaries()));
        let (status, body) = fetch(
            app,
            "/dashboard?columns=Name:neighbourhood,Rating:average_rating,Hosts:host_count",
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("<th>Hosts</th>"));
        assert!(body.contains("<td>Five Points</td><td>4.50</td><td></td>"));
        assert!(body.contains("data-neighbourhood=\"Sun Valley\""));
        assert!(body.contains("url(#no-data)"));
    }

    #[tokio::test]
    async fn dashboard_failure_renders_error_page() {
        let app = router(seeded_store(), BoundaryState::Uninitialized);
        let (status, body) = fetch(app, "/dashboard").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("Error 500"));
        assert!(!body.contains("<svg"));
    }

    #[tokio::test]
    async fn readiness_reflects_boundary_state() {
        let state = AppState {
            readiness: Arc::new(AtomicBool::new(false)),
            metrics: Arc::new(PrometheusBuilder::new().build_recorder().handle()),
        };
        let response = readiness_endpoint(Extension(state.clone()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        state
            .readiness
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let response = readiness_endpoint(Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
