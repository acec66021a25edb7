use std::collections::HashMap;

use maud::{html, Markup};

use super::scale::{ColorScale, Fill, NO_DATA_FILL, NO_DATA_PATTERN_ID};
use super::{format_rating, tooltip, NO_DATA_LABEL};
use crate::boundary::{BoundaryCollection, Geometry};
use crate::summary::NeighbourhoodSummary;

pub const VIEW_WIDTH: f64 = 800.0;
pub const VIEW_HEIGHT: f64 = 600.0;
const PADDING: f64 = 12.0;

/// Equirectangular projection fitted to a collection's bounding box and
/// centred in the view box. Longitude is scaled by the cosine of the mid
/// latitude so shapes keep their proportions at city scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    min_lon: f64,
    max_lat: f64,
    x_factor: f64,
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl Projection {
    pub fn fit(collection: &BoundaryCollection) -> Option<Self> {
        let mut positions = collection
            .features()
            .iter()
            .flat_map(|feature| feature.geometry.positions());

        let (lon, lat) = positions.next()?;
        let (mut min_lon, mut max_lon, mut min_lat, mut max_lat) = (lon, lon, lat, lat);
        for (lon, lat) in positions {
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
        }

        let x_factor = ((min_lat + max_lat) / 2.0).to_radians().cos();
        let width = (max_lon - min_lon) * x_factor;
        let height = max_lat - min_lat;
        let available_width = VIEW_WIDTH - 2.0 * PADDING;
        let available_height = VIEW_HEIGHT - 2.0 * PADDING;

        let scale = match (width > f64::EPSILON, height > f64::EPSILON) {
            (true, true) => (available_width / width).min(available_height / height),
            (true, false) => available_width / width,
            (false, true) => available_height / height,
            (false, false) => 1.0,
        };

        Some(Self {
            min_lon,
            max_lat,
            x_factor,
            scale,
            offset_x: PADDING + (available_width - width * scale) / 2.0,
            offset_y: PADDING + (available_height - height * scale) / 2.0,
        })
    }

    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        (
            self.offset_x + (lon - self.min_lon) * self.x_factor * self.scale,
            self.offset_y + (self.max_lat - lat) * self.scale,
        )
    }

    pub fn path_data(&self, geometry: &Geometry) -> String {
        let mut data = String::new();
        for ring in geometry.polygons().flatten() {
            for (index, (lon, lat)) in ring.iter().enumerate() {
                let (x, y) = self.project(*lon, *lat);
                let command = if index == 0 { 'M' } else { 'L' };
                data.push_str(&format!("{command}{x:.2},{y:.2}"));
            }
            if !ring.is_empty() {
                data.push('Z');
            }
        }
        data
    }
}

/// A boundary feature resolved against the summaries by exact name.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureBinding<'a> {
    pub name: &'a str,
    pub summary: Option<&'a NeighbourhoodSummary>,
    pub fill: Fill,
    pub tooltip: String,
    pub path: String,
}

pub fn bind_features<'a>(
    collection: &'a BoundaryCollection,
    summaries: &'a [NeighbourhoodSummary],
    scale: &ColorScale,
) -> Vec<FeatureBinding<'a>> {
    let by_name: HashMap<&str, &NeighbourhoodSummary> = summaries
        .iter()
        .map(|summary| (summary.neighbourhood.as_str(), summary))
        .collect();
    let projection = Projection::fit(collection);

    collection
        .features()
        .iter()
        .map(|feature| {
            let summary = by_name.get(feature.name.as_str()).copied();
            FeatureBinding {
                name: &feature.name,
                summary,
                fill: scale.fill_for(summary.and_then(|summary| summary.average_rating)),
                tooltip: tooltip(&feature.name, summary),
                path: projection
                    .map(|projection| projection.path_data(&feature.geometry))
                    .unwrap_or_default(),
            }
        })
        .collect()
}

/// One filled region per boundary feature, with a hatched fill for
/// neighbourhoods that have no rating.
pub fn choropleth(bindings: &[FeatureBinding<'_>]) -> Markup {
    html! {
        svg
            class="choropleth"
            xmlns="http://www.w3.org/2000/svg"
            viewBox=(format!("0 0 {VIEW_WIDTH} {VIEW_HEIGHT}"))
            role="img"
            aria-label="Average rating by neighbourhood"
        {
            defs {
                pattern
                    id=(NO_DATA_PATTERN_ID)
                    patternUnits="userSpaceOnUse"
                    width="6"
                    height="6"
                    patternTransform="rotate(45)"
                {
                    rect width="6" height="6" fill=(NO_DATA_FILL) {}
                    line x1="0" y1="0" x2="0" y2="6" stroke="#9e9e9e" stroke-width="2" {}
                }
            }
            g {
                @for binding in bindings {
                    path
                        class="region"
                        d=(binding.path)
                        fill=(binding.fill.css())
                        fill-rule="evenodd"
                        stroke="#ffffff"
                        stroke-width="0.8"
                        data-neighbourhood=(binding.name)
                    {
                        title { (binding.tooltip) }
                    }
                }
            }
        }
    }
}

pub(crate) fn legend(scale: &ColorScale) -> Markup {
    html! {
        div class="legend" {
            span class="legend-title" { "Average rating" }
            @for (value, color) in scale.legend_stops(5) {
                span class="legend-stop" {
                    span class="swatch" style=(format!("background:{color}")) {}
                    (format_rating(Some(value)))
                }
            }
            span class="legend-stop" {
                span class="swatch swatch-no-data" {}
                (NO_DATA_LABEL)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection() -> BoundaryCollection {
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
                    "properties": { "neighbourhood": "Baker" },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[-104.99, 39.70], [-104.98, 39.70], [-104.98, 39.72], [-104.99, 39.70]]]
                    }
                }
            ]
        }))
        .expect("valid collection")
    }

    fn summary(name: &str, rating: Option<f64>) -> NeighbourhoodSummary {
        NeighbourhoodSummary {
            neighbourhood: name.to_string(),
            average_rating: rating,
            average_price: Some(120.0),
            latitude: 39.75,
            longitude: -104.97,
        }
    }

    #[test]
    fn projection_stays_inside_the_view_box() {
        let collection = collection();
        let projection = Projection::fit(&collection).expect("has positions");
        for (lon, lat) in collection
            .features()
            .iter()
            .flat_map(|feature| feature.geometry.positions())
        {
            let (x, y) = projection.project(lon, lat);
            assert!((0.0..=VIEW_WIDTH).contains(&x), "x {x} out of bounds");
            assert!((0.0..=VIEW_HEIGHT).contains(&y), "y {y} out of bounds");
        }
        let (_, north) = projection.project(-104.99, 39.77);
        let (_, south) = projection.project(-104.99, 39.70);
        assert!(north < south, "north should be drawn above south");
    }

    #[test]
    fn path_data_opens_each_ring_and_closes_it() {
        let collection = collection();
        let projection = Projection::fit(&collection).expect("has positions");
        let geometry = &collection.features()[0].geometry;
        let path = projection.path_data(geometry);

        let (x, y) = projection.project(-104.99, 39.75);
        assert!(path.starts_with(&format!("M{x:.2},{y:.2}L")));
        assert_eq!(path.matches('M').count(), 1);
        assert_eq!(path.matches('L').count(), 3);
        assert!(path.ends_with('Z'));
    }

    #[test]
    fn case_mismatch_renders_as_no_data() {
        let collection = collection();
        let summaries = vec![summary("five points", Some(4.8)), summary("Baker", Some(4.1))];
        let scale = ColorScale::from_summaries(&summaries);
        let bindings = bind_features(&collection, &summaries, &scale);

        assert_eq!(bindings.len(), 2);
        assert_eq!(bindings[0].name, "Five Points");
        assert!(bindings[0].summary.is_none());
        assert_eq!(bindings[0].fill, Fill::NoData);
        assert!(bindings[0].tooltip.ends_with("Average price: No data"));
        assert!(matches!(bindings[1].fill, Fill::Scaled(_)));
    }

    #[test]
    fn svg_contains_one_region_per_feature() {
        let collection = collection();
        let summaries = vec![summary("Baker", None)];
        let scale = ColorScale::from_summaries(&summaries);
        let svg = choropleth(&bind_features(&collection, &summaries, &scale)).into_string();

        assert_eq!(svg.matches("class=\"region\"").count(), 2);
        assert!(svg.contains("fill=\"url(#no-data)\""));
        assert!(svg.contains("<title>Baker\nAverage rating: No data\nAverage price: $120.00</title>"));
        assert!(svg.contains("d=\"M"));
    }
}
