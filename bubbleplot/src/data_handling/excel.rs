use std::path::PathBuf;

use calamine::{open_workbook_auto, DataType as Cell, Reader};
use polars::prelude::*;
use tracing::{debug, info};

use crate::data_handling::Dataset;

/// Workbook export (the format enrichment tools hand out most often).
pub struct ExcelDataset {
    pub path: PathBuf,
    pub sheet: usize,
}

fn excel_err<E: std::fmt::Display>(e: E) -> PolarsError {
    PolarsError::ComputeError(format!("excel: {e}").into())
}

pub(crate) fn cell_to_string(cell: &Cell) -> String {
    match cell {
        Cell::String(s) => s.clone(),
        Cell::Empty => String::new(),
        Cell::Bool(b) => b.to_string(),
        Cell::Error(e) => format!("ERR({e:?})"),
        Cell::Float(n) | Cell::Duration(n) => n.to_string(),
        Cell::Int(i) => i.to_string(),
        Cell::DateTime(f) => f.to_string(),
        Cell::DateTimeIso(s) | Cell::DurationIso(s) => s.clone(),
    }
}

fn cell_to_f64(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Float(n) => Some(*n),
        Cell::Int(i) => Some(*i as f64),
        _ => None,
    }
}

/// Turns one worksheet column into a Series: `Float64` when every non-empty
/// cell is numeric, `String` otherwise. Empty cells become nulls.
pub(crate) fn column_to_series(name: &str, cells: &[&Cell]) -> Series {
    let all_numeric = cells
        .iter()
        .filter(|c| !matches!(c, Cell::Empty))
        .all(|c| cell_to_f64(c).is_some());

    if all_numeric {
        let values: Vec<Option<f64>> = cells.iter().map(|c| cell_to_f64(c)).collect();
        Series::new(PlSmallStr::from(name), values)
    } else {
        let values: Vec<Option<String>> = cells
            .iter()
            .map(|c| match c {
                Cell::Empty => None,
                _ => Some(cell_to_string(c)),
            })
            .collect();
        Series::new(PlSmallStr::from(name), values)
    }
}

impl Dataset for ExcelDataset {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!(
            "Reading worksheet {} from {}",
            self.sheet,
            self.path.display()
        );

        let mut wb = open_workbook_auto(&self.path).map_err(excel_err)?;
        let range = wb
            .worksheet_range_at(self.sheet)
            .ok_or_else(|| excel_err(format!("worksheet {} missing", self.sheet)))?
            .map_err(excel_err)?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or_else(|| excel_err("empty sheet"))?
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let h = cell_to_string(c).trim().to_string();
                if h.is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    h
                }
            })
            .collect();
        debug!("Worksheet header = {:?}", headers);

        let body: Vec<&[Cell]> = rows.collect();
        let empty = Cell::Empty;
        let series: Vec<Series> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                let cells: Vec<&Cell> = body.iter().map(|r| r.get(i).unwrap_or(&empty)).collect();
                column_to_series(h, &cells)
            })
            .collect();

        let df = DataFrame::new(series.into_iter().map(Into::into).collect())?;
        info!("Loaded {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }
}
