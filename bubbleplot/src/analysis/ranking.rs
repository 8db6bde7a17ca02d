use std::cmp::Ordering;

use polars::prelude::*;
use tracing::{info, warn};

use crate::analysis::coercion::{coerce_numeric, coerce_percent_or_ratio, coerce_term};
use crate::errors::{PlotError, PlotResult};
use crate::models::{ColumnBindings, ColumnRole, EnrichmentRow, RawRecord, SortMode};

fn column<'a>(df: &'a DataFrame, name: &str) -> PlotResult<&'a Series> {
    if !df.get_column_names().iter().any(|c| c.as_str() == name) {
        return Err(PlotError::MissingColumn(name.to_string()));
    }
    Ok(df.column(name)?.as_materialized_series())
}

/// Pull the four bound columns out of the table and coerce them. The table
/// itself is not modified.
pub fn extract_records(df: &DataFrame, columns: &ColumnBindings) -> PlotResult<Vec<RawRecord>> {
    let terms = coerce_term(column(df, columns.get(ColumnRole::Term))?)?;
    let ratios = coerce_percent_or_ratio(column(df, columns.get(ColumnRole::PercentOrRatio))?)?;
    let significance = coerce_numeric(column(df, columns.get(ColumnRole::Significance))?)?;
    let counts = coerce_numeric(column(df, columns.get(ColumnRole::Count))?)?;

    let negative_counts = counts.iter().flatten().filter(|c| **c < 0.0).count();
    if negative_counts > 0 {
        warn!("Treating {} negative gene counts as missing", negative_counts);
    }

    let records = terms
        .into_iter()
        .zip(ratios)
        .zip(significance)
        .zip(counts)
        .map(|(((term, gene_ratio), significance), count)| RawRecord {
            term,
            gene_ratio,
            significance,
            count: count.filter(|c| *c >= 0.0),
        })
        .collect();
    Ok(records)
}

fn by_value(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Clean, filter and order the rows for plotting.
///
/// 1. rows with any missing field are dropped
/// 2. rows with significance <= 0 are dropped
/// 3. rows above `cutoff` (when given) are dropped
/// 4. the `top_n` most significant rows are kept, ties in input order
/// 5. the result is ordered per `sort_mode`, bottom-to-top on the chart
pub fn filter_and_rank(
    records: &[RawRecord],
    cutoff: Option<f64>,
    top_n: usize,
    sort_mode: SortMode,
) -> PlotResult<Vec<EnrichmentRow>> {
    // ── 1) complete rows only ──────────────────────────────────────
    let complete: Vec<(&str, f64, f64, f64)> = records
        .iter()
        .filter_map(|r| match (&r.term, r.gene_ratio, r.significance, r.count) {
            (Some(term), Some(ratio), Some(sig), Some(count)) => {
                Some((term.as_str(), ratio, sig, count))
            }
            _ => None,
        })
        .collect();
    let skipped = records.len() - complete.len();
    if skipped > 0 {
        warn!("Skipped {} rows with a missing term, ratio, significance or count", skipped);
    }
    if complete.is_empty() {
        return Err(PlotError::EmptyDataset);
    }

    // ── 2) log needs a positive argument ───────────────────────────
    let positive: Vec<_> = complete.into_iter().filter(|(_, _, sig, _)| *sig > 0.0).collect();
    if positive.is_empty() {
        return Err(PlotError::NonPositiveSignificance);
    }

    // ── 3) optional cutoff ─────────────────────────────────────────
    let passing: Vec<_> = match cutoff {
        Some(cutoff) => {
            let before = positive.len();
            let kept: Vec<_> = positive
                .into_iter()
                .filter(|(_, _, sig, _)| *sig <= cutoff)
                .collect();
            info!("Cutoff {} kept {} of {} rows", cutoff, kept.len(), before);
            if kept.is_empty() {
                return Err(PlotError::CutoffTooStrict { cutoff });
            }
            kept
        }
        None => positive,
    };

    // ── 4) top-N by significance (stable) ──────────────────────────
    let mut ranked = passing;
    ranked.sort_by(|a, b| by_value(a.2, b.2));
    ranked.truncate(top_n);

    let mut rows: Vec<EnrichmentRow> = ranked
        .into_iter()
        .map(|(term, ratio, sig, count)| EnrichmentRow::new(term.to_string(), ratio, sig, count))
        .collect();

    // ── 5) display order ───────────────────────────────────────────
    match sort_mode {
        SortMode::Ratio => rows.sort_by(|a, b| by_value(a.gene_ratio, b.gene_ratio)),
        SortMode::Significance => {
            rows.sort_by(|a, b| by_value(a.neg_log_significance, b.neg_log_significance))
        }
        SortMode::Alphabetical => rows.sort_by(|a, b| a.term.cmp(&b.term)),
    }

    info!("Retained {} rows for plotting", rows.len());
    Ok(rows)
}
