use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::errors::{PlotError, PlotResult};
use crate::plotting::colormap::ColorMap;

/// Semantic role a table column plays in the plot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnRole {
    Term,
    PercentOrRatio,
    Significance,
    Count,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 4] = [
        ColumnRole::Term,
        ColumnRole::PercentOrRatio,
        ColumnRole::Significance,
        ColumnRole::Count,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ColumnRole::Term => "pathway/term",
            ColumnRole::PercentOrRatio => "percent/ratio",
            ColumnRole::Significance => "significance",
            ColumnRole::Count => "gene count",
        }
    }
}

impl std::fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Which table column feeds each role.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnBindings {
    pub term: String,
    pub percent_or_ratio: String,
    pub significance: String,
    pub count: String,
}

impl ColumnBindings {
    pub fn get(&self, role: ColumnRole) -> &str {
        match role {
            ColumnRole::Term => &self.term,
            ColumnRole::PercentOrRatio => &self.percent_or_ratio,
            ColumnRole::Significance => &self.significance,
            ColumnRole::Count => &self.count,
        }
    }

    pub fn set(&mut self, role: ColumnRole, column: impl Into<String>) {
        let column = column.into();
        match role {
            ColumnRole::Term => self.term = column,
            ColumnRole::PercentOrRatio => self.percent_or_ratio = column,
            ColumnRole::Significance => self.significance = column,
            ColumnRole::Count => self.count = column,
        }
    }
}

/// Order of the retained rows, bottom-to-top on the y axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    #[default]
    Ratio,
    Significance,
    Alphabetical,
}

/// Metric placed on the x axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum XAxisMetric {
    #[default]
    GeneRatio,
    NegLogSignificance,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Pdf,
    Png,
    Svg,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
            ExportFormat::Svg => "svg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Png => "image/png",
            ExportFormat::Svg => "image/svg+xml",
        }
    }

    /// Vector formats ignore the DPI setting.
    pub fn is_vector(&self) -> bool {
        !matches!(self, ExportFormat::Png)
    }
}

/// Font sizes in points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSizes {
    pub title: f64,
    pub axis_label: f64,
    pub tick: f64,
    pub legend: f64,
}

impl Default for FontSizes {
    fn default() -> Self {
        Self {
            title: 14.0,
            axis_label: 14.0,
            tick: 12.0,
            legend: 10.0,
        }
    }
}

/// Everything a render needs. Built once, fully populated, then handed to the
/// pipeline read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub columns: ColumnBindings,
    pub top_n: usize,
    pub significance_cutoff: Option<f64>,
    pub sort_mode: SortMode,
    pub x_axis: XAxisMetric,
    pub bubble_scale: f64,
    pub color_map: String,
    pub title: String,
    pub show_grid: bool,
    /// Figure width in inches.
    pub width: f64,
    /// Figure height in inches.
    pub height: f64,
    pub fonts: FontSizes,
    pub transparent_background: bool,
    pub export_format: ExportFormat,
    pub dpi: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            columns: ColumnBindings::default(),
            top_n: 30,
            significance_cutoff: None,
            sort_mode: SortMode::Ratio,
            x_axis: XAxisMetric::GeneRatio,
            bubble_scale: 20.0,
            color_map: "RdBu_r".to_string(),
            title: "Pathway Analysis Bubble Plot".to_string(),
            show_grid: true,
            width: 12.0,
            height: 18.0,
            fonts: FontSizes::default(),
            transparent_background: false,
            export_format: ExportFormat::Pdf,
            dpi: 300,
        }
    }
}

impl PlotConfig {
    /// Reject values the pipeline cannot work with. Nothing is clamped or
    /// replaced here.
    pub fn validate(&self) -> PlotResult<()> {
        for role in ColumnRole::ALL {
            if self.columns.get(role).trim().is_empty() {
                return Err(PlotError::InvalidConfig(format!(
                    "no column selected for the {role} role"
                )));
            }
        }
        if self.top_n == 0 {
            return Err(PlotError::InvalidConfig("top_n must be at least 1".into()));
        }
        if let Some(cutoff) = self.significance_cutoff {
            if !cutoff.is_finite() || cutoff < 0.0 {
                return Err(PlotError::InvalidConfig(format!(
                    "significance cutoff must be a finite value >= 0, got {cutoff}"
                )));
            }
        }
        positive("bubble_scale", self.bubble_scale)?;
        positive("width", self.width)?;
        positive("height", self.height)?;
        positive("fonts.title", self.fonts.title)?;
        positive("fonts.axis_label", self.fonts.axis_label)?;
        positive("fonts.tick", self.fonts.tick)?;
        positive("fonts.legend", self.fonts.legend)?;
        if self.dpi == 0 {
            return Err(PlotError::InvalidConfig("dpi must be at least 1".into()));
        }
        self.color_map.parse::<ColorMap>()?;
        Ok(())
    }
}

fn positive(name: &str, value: f64) -> PlotResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PlotError::InvalidConfig(format!(
            "{name} must be a positive number, got {value}"
        )))
    }
}

/// One table row after numeric coercion, before cleaning. Any field may be
/// missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub term: Option<String>,
    pub gene_ratio: Option<f64>,
    pub significance: Option<f64>,
    pub count: Option<f64>,
}

/// A cleaned row with its derived metric.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentRow {
    pub term: String,
    pub gene_ratio: f64,
    pub significance: f64,
    pub count: f64,
    pub neg_log_significance: f64,
}

impl EnrichmentRow {
    /// `significance` must be > 0.
    pub fn new(term: String, gene_ratio: f64, significance: f64, count: f64) -> Self {
        Self {
            term,
            gene_ratio,
            significance,
            count,
            neg_log_significance: neg_log10(significance),
        }
    }
}

pub fn neg_log10(value: f64) -> f64 {
    -value.log10()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound_config() -> PlotConfig {
        PlotConfig {
            columns: ColumnBindings {
                term: "Term".into(),
                percent_or_ratio: "%".into(),
                significance: "PValue".into(),
                count: "Count".into(),
            },
            ..PlotConfig::default()
        }
    }

    #[test]
    fn neg_log_of_one_percent_is_two() {
        assert!((neg_log10(0.01) - 2.0).abs() < 1e-9);
        let row = EnrichmentRow::new("x".into(), 0.1, 0.01, 5.0);
        assert!((row.neg_log_significance - 2.0).abs() < 1e-9);
    }

    #[test]
    fn defaults_validate_once_columns_are_bound() {
        assert!(PlotConfig::default().validate().is_err());
        bound_config().validate().unwrap();
    }

    #[test]
    fn invalid_values_are_rejected_not_replaced() {
        let mut cfg = bound_config();
        cfg.top_n = 0;
        assert!(matches!(cfg.validate(), Err(PlotError::InvalidConfig(_))));

        let mut cfg = bound_config();
        cfg.significance_cutoff = Some(-0.1);
        assert!(cfg.validate().is_err());

        let mut cfg = bound_config();
        cfg.fonts.tick = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = bound_config();
        cfg.color_map = "not-a-palette".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: PlotConfig = serde_json::from_str(
            r#"{"top_n": 15, "sort_mode": "alphabetical", "x_axis": "neg-log-significance",
                "export_format": "svg", "fonts": {"title": 20}}"#,
        )
        .unwrap();
        assert_eq!(cfg.top_n, 15);
        assert_eq!(cfg.sort_mode, SortMode::Alphabetical);
        assert_eq!(cfg.x_axis, XAxisMetric::NegLogSignificance);
        assert_eq!(cfg.export_format, ExportFormat::Svg);
        assert_eq!(cfg.fonts.title, 20.0);
        assert_eq!(cfg.fonts.legend, 10.0);
        assert_eq!(cfg.dpi, 300);
        assert_eq!(cfg.color_map, "RdBu_r");
    }

    #[test]
    fn bindings_follow_roles() {
        let mut b = ColumnBindings::default();
        b.set(ColumnRole::Significance, "FDR");
        assert_eq!(b.get(ColumnRole::Significance), "FDR");
        assert_eq!(b.get(ColumnRole::Term), "");
    }
}
