//! Table → chart pipeline.

pub mod coercion;
pub mod column_resolver;
pub mod legend;
pub mod ranking;

use polars::frame::DataFrame;
use tracing::info;

use crate::errors::PlotResult;
use crate::models::PlotConfig;
use crate::plotting::chart::BubbleChart;
use legend::{legend_sizes, DEFAULT_LEGEND_CANDIDATES};
use ranking::{extract_records, filter_and_rank};

/// Run the whole pipeline on a table. Pure: the table is only read and no
/// I/O happens here.
pub fn build_bubble_chart(df: &DataFrame, config: &PlotConfig) -> PlotResult<BubbleChart> {
    config.validate()?;
    info!(
        "Building bubble plot from {} rows (top {}, cutoff {:?}, sort {:?})",
        df.height(),
        config.top_n,
        config.significance_cutoff,
        config.sort_mode
    );

    let records = extract_records(df, &config.columns)?;
    let rows = filter_and_rank(
        &records,
        config.significance_cutoff,
        config.top_n,
        config.sort_mode,
    )?;

    let counts: Vec<f64> = rows.iter().map(|r| r.count).collect();
    let sizes = legend_sizes(&counts, DEFAULT_LEGEND_CANDIDATES);
    info!("Size legend entries: {:?}", sizes);

    BubbleChart::assemble(&rows, &sizes, config)
}
