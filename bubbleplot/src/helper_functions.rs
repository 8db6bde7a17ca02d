use std::path::{Path, PathBuf};

use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::{CsvEncoding, CsvReadOptions, SerReader};

use crate::models::ExportFormat;

pub fn read_csv(file_path: &Path) -> PolarsResult<DataFrame> {
    read_delimited(file_path, b',')
}

pub fn read_tsv(file_path: &Path) -> PolarsResult<DataFrame> {
    read_delimited(file_path, b'\t')
}

fn read_delimited(file_path: &Path, separator: u8) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .map_parse_options(|mut o| {
            o.separator = separator;
            o.encoding = CsvEncoding::LossyUtf8;
            o.truncate_ragged_lines = true;
            o
        })
        .try_into_reader_with_file_path(Some(PathBuf::from(file_path)))?
        .finish()
}

/// Lower-cased file extension, empty when there is none.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default()
}

/// `Pathway_BubblePlot.<ext>` next to the working directory.
pub fn default_output_path(format: ExportFormat) -> PathBuf {
    PathBuf::from(format!("Pathway_BubblePlot.{}", format.extension()))
}
