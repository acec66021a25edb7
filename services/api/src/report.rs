use crate::infra::config_with_database;
use clap::Args;
use neighbourhood_map::error::AppError;
use neighbourhood_map::presentation::TableSpec;
use neighbourhood_map::store::SqliteRegionStore;
use neighbourhood_map::summary::{compute_region_summaries, NeighbourhoodSummary};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub(crate) struct SummaryArgs {
    /// Override the listings database path
    #[arg(long)]
    pub(crate) database: Option<PathBuf>,
    /// Print the summaries as JSON instead of a table
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_summary(args: SummaryArgs) -> Result<(), AppError> {
    let config = config_with_database(args.database)?;
    let store = SqliteRegionStore::new(&config.data.database_path);
    let summaries = compute_region_summaries(&store)?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&summaries).map_err(std::io::Error::from)?;
        println!("{rendered}");
    } else {
        print!("{}", render_summary_table(&TableSpec::default(), &summaries));
    }
    Ok(())
}

/// Left-aligned plain text table, one line per neighbourhood.
pub(crate) fn render_summary_table(spec: &TableSpec, summaries: &[NeighbourhoodSummary]) -> String {
    let headers: Vec<&str> = spec.headers().collect();
    let rows = spec.rows(summaries);

    let mut widths: Vec<usize> = headers.iter().map(|header| header.chars().count()).collect();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_line(&mut out, headers.iter().copied(), &widths);
    for row in &rows {
        push_line(&mut out, row.iter().map(String::as_str), &widths);
    }
    out
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>, widths: &[usize]) {
    let line = cells
        .zip(widths)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect::<Vec<_>>()
        .join("  ");
    out.push_str(line.trim_end());
    out.push('\n');
}
