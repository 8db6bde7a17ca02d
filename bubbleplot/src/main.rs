use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use polars::frame::DataFrame;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::analysis::build_bubble_chart;
use crate::analysis::column_resolver::{column_names, resolve_frame};
use crate::data_handling::load_table;
use crate::helper_functions::{default_output_path, extension_of};
use crate::models::{ColumnRole, ExportFormat, PlotConfig, SortMode, XAxisMetric};
use crate::plotting::export::export_chart;

mod analysis;
mod data_handling;
mod errors;
mod helper_functions;
mod models;
mod plotting;

const DATA_HINT: &str =
    "Please check the uploaded table and the selected columns or cutoff, then try again.";

#[derive(Parser)]
#[command(author, version, about = "Pathway enrichment bubble plot generator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Preview a table and the column detected for each role
    Inspect {
        #[arg(long)]
        input: PathBuf,
        /// Worksheet index for Excel input
        #[arg(long, default_value_t = 0)]
        sheet: usize,
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Render a bubble plot to PDF, PNG or SVG
    Render(RenderArgs),
}

#[derive(Args, Default)]
struct RenderArgs {
    #[arg(long)]
    input: PathBuf,
    #[arg(long, default_value_t = 0)]
    sheet: usize,
    /// Defaults to Pathway_BubblePlot.<format>
    #[arg(long)]
    output: Option<PathBuf>,
    /// JSON file with plot settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    pathway_col: Option<String>,
    #[arg(long)]
    ratio_col: Option<String>,
    #[arg(long)]
    significance_col: Option<String>,
    #[arg(long)]
    count_col: Option<String>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(10..=50))]
    top_n: Option<u32>,
    /// Drop pathways with significance above this value
    #[arg(long)]
    cutoff: Option<f64>,
    #[arg(long, value_enum)]
    sort: Option<SortMode>,
    #[arg(long, value_enum)]
    x_axis: Option<XAxisMetric>,
    #[arg(long, value_parser = clap::value_parser!(u32).range(10..=100))]
    bubble_scale: Option<u32>,
    /// RdBu_r, viridis, plasma, coolwarm, magma, ...
    #[arg(long)]
    cmap: Option<String>,
    #[arg(long)]
    no_grid: bool,
    #[arg(long)]
    title: Option<String>,
    /// Figure width in inches
    #[arg(long)]
    width: Option<f64>,
    /// Figure height in inches
    #[arg(long)]
    height: Option<f64>,
    #[arg(long)]
    title_size: Option<f64>,
    #[arg(long)]
    axis_label_size: Option<f64>,
    #[arg(long)]
    tick_size: Option<f64>,
    #[arg(long)]
    legend_size: Option<f64>,
    #[arg(long)]
    transparent: bool,
    /// Inferred from --output when omitted
    #[arg(long, value_enum)]
    format: Option<ExportFormat>,
    /// Raster resolution for PNG
    #[arg(long)]
    dpi: Option<u32>,
    /// Print the resolved settings as JSON before rendering
    #[arg(long)]
    print_config: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Inspect { input, sheet, rows } => inspect(&input, sheet, rows),
        Command::Render(args) => render(&args),
    }
}

fn load(input: &Path, sheet: usize) -> Result<DataFrame> {
    load_table(input, sheet).with_context(|| format!("Failed to load {}", input.display()))
}

fn inspect(input: &Path, sheet: usize, rows: usize) -> Result<()> {
    let df = load(input, sheet)?;
    println!("Preview of {}:\n{}", input.display(), df.head(Some(rows)));

    let resolution = resolve_frame(&df);
    for role in ColumnRole::ALL {
        match &resolution[&role] {
            Some(column) => println!("{:>14}: {}", role.label(), column),
            None => println!("{:>14}: (not detected)", role.label()),
        }
    }
    Ok(())
}

fn render(args: &RenderArgs) -> Result<()> {
    info!("Starting bubble plot render for {}", args.input.display());
    let df = load(&args.input, args.sheet)?;
    let config = build_config(args, &df)?;

    if args.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }

    let chart = build_bubble_chart(&df, &config).map_err(|e| {
        if e.is_data_quality() {
            anyhow!("{e}\n{DATA_HINT}")
        } else {
            anyhow::Error::new(e)
        }
    })?;
    let bytes = export_chart(&chart, config.export_format, config.dpi)?;

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(config.export_format));
    fs::write(&output, &bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(
        "Wrote {} ({} bytes, {})",
        output.display(),
        bytes.len(),
        config.export_format.mime_type()
    );
    Ok(())
}

fn load_config(path: &Path) -> Result<PlotConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid config {}", path.display()))
}

fn format_from_output(output: Option<&Path>) -> Option<ExportFormat> {
    match extension_of(output?).as_str() {
        "pdf" => Some(ExportFormat::Pdf),
        "png" => Some(ExportFormat::Png),
        "svg" => Some(ExportFormat::Svg),
        _ => None,
    }
}

/// Defaults, then the config file, then flags. Columns not chosen by either
/// are auto-detected, falling back to the first column of the table.
fn build_config(args: &RenderArgs, df: &DataFrame) -> Result<PlotConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => PlotConfig::default(),
    };

    if let Some(top_n) = args.top_n {
        config.top_n = top_n as usize;
    }
    if args.cutoff.is_some() {
        config.significance_cutoff = args.cutoff;
    }
    if let Some(sort) = args.sort {
        config.sort_mode = sort;
    }
    if let Some(x_axis) = args.x_axis {
        config.x_axis = x_axis;
    }
    if let Some(scale) = args.bubble_scale {
        config.bubble_scale = scale as f64;
    }
    if let Some(cmap) = &args.cmap {
        config.color_map = cmap.clone();
    }
    if args.no_grid {
        config.show_grid = false;
    }
    if let Some(title) = &args.title {
        config.title = title.clone();
    }
    if let Some(width) = args.width {
        config.width = width;
    }
    if let Some(height) = args.height {
        config.height = height;
    }
    if let Some(size) = args.title_size {
        config.fonts.title = size;
    }
    if let Some(size) = args.axis_label_size {
        config.fonts.axis_label = size;
    }
    if let Some(size) = args.tick_size {
        config.fonts.tick = size;
    }
    if let Some(size) = args.legend_size {
        config.fonts.legend = size;
    }
    if args.transparent {
        config.transparent_background = true;
    }
    if let Some(format) = args.format.or_else(|| format_from_output(args.output.as_deref())) {
        config.export_format = format;
    }
    if let Some(dpi) = args.dpi {
        config.dpi = dpi;
    }

    let resolution = resolve_frame(df);
    let available = column_names(df);
    for role in ColumnRole::ALL {
        let explicit = match role {
            ColumnRole::Term => &args.pathway_col,
            ColumnRole::PercentOrRatio => &args.ratio_col,
            ColumnRole::Significance => &args.significance_col,
            ColumnRole::Count => &args.count_col,
        };
        if let Some(column) = explicit {
            config.columns.set(role, column.clone());
            continue;
        }
        if !config.columns.get(role).is_empty() {
            continue;
        }
        match &resolution[&role] {
            Some(column) => {
                info!("Detected {} column: {}", role, column);
                config.columns.set(role, column.clone());
            }
            None => {
                let first = available
                    .first()
                    .ok_or_else(|| anyhow!("{} has no columns", args.input.display()))?;
                warn!("No column matched the {} role, falling back to `{}`", role, first);
                config.columns.set(role, first.clone());
            }
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::df;
    use std::io::Write;

    fn table() -> DataFrame {
        df![
            "Description" => &["Glycolysis", "TCA cycle"],
            "GeneRatio" => &[0.2, 0.3],
            "p.adjust" => &[0.01, 0.02],
            "Count" => &[5i64, 9]
        ]
        .unwrap()
    }

    fn args() -> RenderArgs {
        RenderArgs {
            input: PathBuf::from("enrichment.csv"),
            ..RenderArgs::default()
        }
    }

    #[test]
    fn detected_columns_fill_the_config() {
        let config = build_config(&args(), &table()).unwrap();
        assert_eq!(config.columns.term, "Description");
        assert_eq!(config.columns.percent_or_ratio, "GeneRatio");
        assert_eq!(config.columns.significance, "p.adjust");
        assert_eq!(config.columns.count, "Count");
        assert_eq!(config.top_n, 30);
        config.validate().unwrap();
    }

    #[test]
    fn flags_override_detection_and_defaults() {
        let mut a = args();
        a.significance_col = Some("GeneRatio".into());
        a.top_n = Some(12);
        a.no_grid = true;
        a.output = Some(PathBuf::from("plot.SVG"));
        let config = build_config(&a, &table()).unwrap();
        assert_eq!(config.columns.significance, "GeneRatio");
        assert_eq!(config.top_n, 12);
        assert!(!config.show_grid);
        assert_eq!(config.export_format, ExportFormat::Svg);
    }

    #[test]
    fn undetected_role_falls_back_to_first_column() {
        let df = df!["Label" => &["a"], "Value" => &[1.0]].unwrap();
        let config = build_config(&args(), &df).unwrap();
        assert_eq!(config.columns.term, "Label");
        assert_eq!(config.columns.count, "Label");
    }

    #[test]
    fn config_file_sits_between_defaults_and_flags() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"{{"title": "GO upregulated", "top_n": 20, "columns": {{"term": "Description"}}, "dpi": 150}}"#
        )
        .unwrap();
        let mut a = args();
        a.config = Some(file.path().to_path_buf());
        a.dpi = Some(600);
        let config = build_config(&a, &table()).unwrap();
        assert_eq!(config.title, "GO upregulated");
        assert_eq!(config.top_n, 20);
        assert_eq!(config.dpi, 600);
        assert_eq!(config.columns.term, "Description");
        assert_eq!(config.columns.count, "Count");
    }

    #[test]
    fn cli_enforces_ui_ranges() {
        let parsed = Cli::try_parse_from(["bubbleplot", "render", "--input", "x.csv", "--top-n", "5"]);
        assert!(parsed.is_err());
        let parsed = Cli::try_parse_from([
            "bubbleplot", "render", "--input", "x.csv", "--top-n", "25", "--sort", "alphabetical",
            "--x-axis", "neg-log-significance", "--format", "png",
        ]);
        assert!(parsed.is_ok());
    }
}
