mod map;
mod page;
mod scale;
mod table;

pub use map::{bind_features, choropleth, FeatureBinding, Projection};
pub use page::{dashboard_page, error_page, DashboardVm};
pub use scale::{ColorScale, Fill, NO_DATA_FILL};
pub use table::{TableColumn, TableField, TableSpec};

use crate::summary::NeighbourhoodSummary;

/// Placeholder shown wherever a metric has no value.
pub const NO_DATA_LABEL: &str = "No data";

pub fn format_rating(value: Option<f64>) -> String {
    value
        .map(|rating| format!("{rating:.2}"))
        .unwrap_or_else(|| NO_DATA_LABEL.to_string())
}

pub fn format_price(value: Option<f64>) -> String {
    value
        .map(|price| format!("${price:.2}"))
        .unwrap_or_else(|| NO_DATA_LABEL.to_string())
}

/// Hover text for one map region. `summary` is `None` when no summary
/// carries the feature's exact name.
pub fn tooltip(name: &str, summary: Option<&NeighbourhoodSummary>) -> String {
    let rating = format_rating(summary.and_then(|summary| summary.average_rating));
    let price = format_price(summary.and_then(|summary| summary.average_price));
    format!("{name}\nAverage rating: {rating}\nAverage price: {price}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tooltip_formats_two_decimals() {
        let summary = NeighbourhoodSummary {
            neighbourhood: "Five Points".to_string(),
            average_rating: Some(4.5),
            average_price: Some(100.0),
            latitude: 39.7547,
            longitude: -104.9773,
        };
        assert_eq!(
            tooltip("Five Points", Some(&summary)),
            "Five Points\nAverage rating: 4.50\nAverage price: $100.00"
        );
    }

    #[test]
    fn tooltip_uses_placeholder_for_missing_values() {
        let summary = NeighbourhoodSummary {
            neighbourhood: "Sun Valley".to_string(),
            average_rating: None,
            average_price: Some(87.333),
            latitude: 39.73,
            longitude: -105.02,
        };
        assert_eq!(
            tooltip("Sun Valley", Some(&summary)),
            "Sun Valley\nAverage rating: No data\nAverage price: $87.33"
        );
        assert_eq!(
            tooltip("Auraria", None),
            "Auraria\nAverage rating: No data\nAverage price: No data"
        );
    }
}
