use maud::{html, Markup, DOCTYPE};

use super::map::{bind_features, choropleth, legend};
use super::scale::{ColorScale, NO_DATA_FILL};
use super::table::TableSpec;
use crate::boundary::BoundaryCollection;
use crate::payload::MapPayload;
use crate::summary::NeighbourhoodSummary;

const STYLES: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 1080px; margin: 2rem auto; padding: 0 1rem; color: #1f2933; }
.choropleth { width: 100%; height: auto; background: #f8fafc; border: 1px solid #e5e7eb; }
.choropleth .region:hover { stroke: #111827; stroke-width: 2; }
.legend { display: flex; flex-wrap: wrap; gap: 0.75rem; margin: 0.75rem 0 2rem; font-size: 0.9rem; }
.legend-stop { display: inline-flex; align-items: center; gap: 0.3rem; }
.swatch { display: inline-block; width: 1rem; height: 1rem; border: 1px solid #cbd5e1; }
table { width: 100%; border-collapse: collapse; }
th { padding: 12px 8px; border-bottom: 2px solid #e5e7eb; text-align: left; }
td { padding: 8px; border-bottom: 1px solid #f3f4f6; }
"#;

pub struct DashboardVm<'a> {
    pub summaries: &'a [NeighbourhoodSummary],
    pub boundaries: &'a BoundaryCollection,
    pub table: &'a TableSpec,
}

impl<'a> DashboardVm<'a> {
    pub fn from_payload(payload: &'a MapPayload, table: &'a TableSpec) -> Self {
        Self {
            summaries: &payload.data,
            boundaries: &payload.geojson,
            table,
        }
    }
}

fn layout(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) }
                style { (STYLES) (format!(".swatch-no-data {{ background: {NO_DATA_FILL}; }}")) }
            }
            body {
                header {
                    h1 { "Neighbourhood Ratings" }
                }
                (content)
            }
        }
    }
}

pub fn dashboard_page(vm: &DashboardVm<'_>) -> Markup {
    let scale = ColorScale::from_summaries(vm.summaries);
    let bindings = bind_features(vm.boundaries, vm.summaries, &scale);
    let rows = vm.table.rows(vm.summaries);

    layout(
        "Neighbourhood Ratings",
        html! {
            main {
                section id="map" {
                    h2 { "Average rating by neighbourhood" }
                    (choropleth(&bindings))
                    (legend(&scale))
                }

                section id="summary-table" {
                    h2 { "Neighbourhood summary" }
                    table {
                        thead {
                            tr {
                                @for header in vm.table.headers() {
                                    th { (header) }
                                }
                            }
                        }
                        tbody {
                            @for row in &rows {
                                tr {
                                    @for cell in row {
                                        td { (cell) }
                                    }
                                }
                            }
                        }
                    }
                    @if rows.is_empty() {
                        p { "No neighbourhoods have listings yet." }
                    }
                }
            }
        },
    )
}

/// Failure page. Carries no statistics and no map.
pub fn error_page(status: u16, message: &str) -> Markup {
    layout(
        &format!("Error {status}"),
        html! {
            main {
                h2 { "Error " (status) }
                p { (message) }
                p { a href="/dashboard" { "Try again" } }
            }
        },
    )
}
