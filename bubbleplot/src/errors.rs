use polars::prelude::PolarsError;
use thiserror::Error;

/// Every way a render can fail. All of them are terminal: the caller shows the
/// message and aborts, no partial chart is produced.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("no rows left after cleaning: every row was missing a term, ratio, significance or count value")]
    EmptyDataset,

    #[error("no row has a significance value above 0, so -log10(significance) cannot be computed")]
    NonPositiveSignificance,

    #[error("no row passes the significance cutoff of {cutoff}")]
    CutoffTooStrict { cutoff: f64 },

    #[error("column `{0}` not found in the table")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("table error: {0}")]
    Data(#[from] PolarsError),

    #[error("rendering failed: {0}")]
    Render(String),
}

impl PlotError {
    /// True for the failures caused by the content of the table (as opposed to
    /// configuration or rendering problems).
    pub fn is_data_quality(&self) -> bool {
        matches!(
            self,
            PlotError::EmptyDataset
                | PlotError::NonPositiveSignificance
                | PlotError::CutoffTooStrict { .. }
        )
    }
}

pub fn render_err<E: std::fmt::Display>(e: E) -> PlotError {
    PlotError::Render(e.to_string())
}

pub type PlotResult<T> = Result<T, PlotError>;
