use std::path::PathBuf;

use polars::error::PolarsResult;
use polars::frame::DataFrame;
use polars::prelude::PolarsError;
use tracing::{error, info};

use crate::data_handling::Dataset;
use crate::helper_functions::{extension_of, read_csv, read_tsv};

/// Comma or tab separated enrichment export. `.tsv` and `.txt` are read as
/// tab separated, everything else as CSV.
pub struct DelimitedDataset {
    pub path: PathBuf,
}

impl Dataset for DelimitedDataset {
    fn load(&self) -> PolarsResult<DataFrame> {
        info!("Reading delimited table from {}", self.path.display());
        if !self.path.exists() {
            return Err(PolarsError::ComputeError(
                format!("input file {} not found", self.path.display()).into(),
            ));
        }

        let df = match extension_of(&self.path).as_str() {
            "tsv" | "txt" => read_tsv(&self.path),
            _ => read_csv(&self.path),
        };
        let df = match df {
            Ok(df) => df,
            Err(e) => {
                error!("Failed to read {}: {}", self.path.display(), e);
                return Err(e);
            }
        };

        info!("Loaded {} rows x {} columns", df.height(), df.width());
        Ok(df)
    }
}
