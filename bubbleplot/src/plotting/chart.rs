//! Bubble chart value and its plotters drawing.
//!
//! [`BubbleChart`] is backend-agnostic: it holds resolved geometry, colours
//! and labels, and [`BubbleChart::draw`] paints it on any plotters drawing
//! area. Serialisation to a file format lives in `export`.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters_backend::{FontFamily, FontStyle};
use tracing::debug;

use crate::errors::{render_err, PlotResult};
use crate::models::{EnrichmentRow, FontSizes, PlotConfig, XAxisMetric};
use crate::plotting::colormap::ColorMap;

/// Canvas resolution of the vector output.
pub const PX_PER_INCH: f64 = 100.0;
const PT_PER_INCH: f64 = 72.0;

const MARKER_ALPHA: f64 = 0.8;
const LEGEND_MARKER_ALPHA: f64 = 0.6;
const LEGEND_GREY: RGBColor = RGBColor(128, 128, 128);
const COLOR_BAR_SLICES: i32 = 64;

pub fn pt_to_px(pt: f64) -> f64 {
    pt * PX_PER_INCH / PT_PER_INCH
}

/// Marker area is `count * bubble_scale` square points; the circle radius is
/// half the side of that square, converted to pixels.
pub fn marker_radius_px(count: f64, bubble_scale: f64) -> i32 {
    let area = (count * bubble_scale).max(0.0);
    let radius_pt = area.sqrt() / 2.0;
    (pt_to_px(radius_pt).round() as i32).max(1)
}

fn expand_range(min_val: f64, max_val: f64, pct: f64) -> (f64, f64) {
    if (max_val - min_val).abs() < 1e-9 {
        let pad = (min_val.abs() * 0.1).max(0.05);
        return (min_val - pad, max_val + pad);
    }
    let pad = (max_val - min_val) * pct;
    (min_val - pad, max_val + pad)
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub term: String,
    pub x: f64,
    /// Row index on the categorical y axis, 0 at the bottom.
    pub y: f64,
    pub count: f64,
    pub neg_log_significance: f64,
    pub radius: i32,
    pub color: RGBColor,
}

#[derive(Debug, Clone)]
pub struct BubbleChart {
    pub title: String,
    /// Category labels bottom-to-top.
    pub terms: Vec<String>,
    /// Painted in this order: largest first so small bubbles stay visible.
    pub bubbles: Vec<Bubble>,
    pub x_range: (f64, f64),
    pub x_label: String,
    pub color_map: ColorMap,
    pub color_range: (f64, f64),
    pub color_label: String,
    /// Size legend entries with their marker radius.
    pub size_legend: Vec<(u32, i32)>,
    pub show_grid: bool,
    pub transparent: bool,
    pub fonts: FontSizes,
    pub size_px: (u32, u32),
}

impl BubbleChart {
    pub fn assemble(
        rows: &[EnrichmentRow],
        legend_sizes: &[u32],
        config: &PlotConfig,
    ) -> PlotResult<Self> {
        let color_map: ColorMap = config.color_map.parse()?;
        debug!("Colouring {} bubbles with {}", rows.len(), color_map.name());
        let significance_label = format!("-log10({})", config.columns.significance);

        let x_of = |row: &EnrichmentRow| match config.x_axis {
            XAxisMetric::GeneRatio => row.gene_ratio,
            XAxisMetric::NegLogSignificance => row.neg_log_significance,
        };
        let x_label = match config.x_axis {
            XAxisMetric::GeneRatio => "Gene Ratio".to_string(),
            XAxisMetric::NegLogSignificance => significance_label.clone(),
        };

        let x_range = if rows.is_empty() {
            (0.0, 1.0)
        } else {
            let (lo, hi) = min_max(rows.iter().map(x_of));
            expand_range(lo, hi, 0.05)
        };
        let color_range = if rows.is_empty() {
            (0.0, 1.0)
        } else {
            min_max(rows.iter().map(|r| r.neg_log_significance))
        };

        let mut bubbles: Vec<Bubble> = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| Bubble {
                term: row.term.clone(),
                x: x_of(row),
                y: idx as f64,
                count: row.count,
                neg_log_significance: row.neg_log_significance,
                radius: marker_radius_px(row.count, config.bubble_scale),
                color: color_map.for_value(row.neg_log_significance, color_range.0, color_range.1),
            })
            .collect();
        bubbles.sort_by(|a, b| b.count.partial_cmp(&a.count).unwrap_or(std::cmp::Ordering::Equal));
        for b in &bubbles {
            debug!(
                "{}: x={:.3} -log10={:.2} count={} radius={}px",
                b.term, b.x, b.neg_log_significance, b.count, b.radius
            );
        }

        let size_legend = legend_sizes
            .iter()
            .map(|&size| (size, marker_radius_px(size as f64, config.bubble_scale)))
            .collect();

        Ok(Self {
            title: config.title.clone(),
            terms: rows.iter().map(|r| r.term.clone()).collect(),
            bubbles,
            x_range,
            x_label,
            color_map,
            color_range,
            color_label: significance_label,
            size_legend,
            show_grid: config.show_grid,
            transparent: config.transparent_background,
            fonts: config.fonts.clone(),
            size_px: (
                (config.width * PX_PER_INCH).round().max(1.0) as u32,
                (config.height * PX_PER_INCH).round().max(1.0) as u32,
            ),
        })
    }

    /// Label for a y tick; only whole indices carry a term.
    fn term_at(&self, value: f64) -> String {
        let idx = value.round();
        if (value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        self.terms.get(idx as usize).cloned().unwrap_or_default()
    }

    fn y_label_area_px(&self, tick_px: f64, canvas_width: u32) -> u32 {
        let longest = self.terms.iter().map(|t| t.chars().count()).max().unwrap_or(1);
        let wanted = longest as f64 * tick_px * 0.6 + 20.0;
        wanted.min(canvas_width as f64 * 0.5) as u32
    }

    pub fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> PlotResult<()> {
        if !self.transparent {
            root.fill(&WHITE).map_err(render_err)?;
        }

        let title_px = pt_to_px(self.fonts.title);
        let axis_px = pt_to_px(self.fonts.axis_label);
        let tick_px = pt_to_px(self.fonts.tick);

        // ── 1) plot area + side panel for the legends ──────────────────
        let (width, _) = root.dim_in_pixel();
        let panel_width = (width as f64 * 0.2).clamp(160.0, 420.0) as u32;
        let (plot_area, side_panel) = root.split_horizontally(width.saturating_sub(panel_width));

        // ── 2) axes ────────────────────────────────────────────────────
        let n_terms = self.terms.len().max(1);
        let mut chart = ChartBuilder::on(&plot_area)
            .caption(
                &self.title,
                FontDesc::new(FontFamily::SansSerif, title_px, FontStyle::Bold),
            )
            .margin(15)
            .x_label_area_size((tick_px * 2.0 + axis_px * 1.5) as u32)
            .y_label_area_size(self.y_label_area_px(tick_px, width))
            .build_cartesian_2d(
                self.x_range.0..self.x_range.1,
                -0.5..(n_terms as f64 - 0.5),
            )
            .map_err(render_err)?;

        let y_formatter = |v: &f64| self.term_at(*v);
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(self.x_label.as_str())
            .axis_desc_style(FontDesc::new(FontFamily::SansSerif, axis_px, FontStyle::Bold))
            .label_style(FontDesc::new(FontFamily::SansSerif, tick_px, FontStyle::Normal))
            .x_labels(6)
            .y_labels(n_terms)
            .y_label_formatter(&y_formatter);
        if self.show_grid {
            mesh.bold_line_style(BLACK.mix(0.15)).light_line_style(BLACK.mix(0.05));
        } else {
            mesh.disable_mesh();
        }
        mesh.draw().map_err(render_err)?;

        // ── 3) bubbles: fill, then outline ─────────────────────────────
        chart
            .draw_series(self.bubbles.iter().flat_map(|b| {
                [
                    Circle::new((b.x, b.y), b.radius, b.color.mix(MARKER_ALPHA).filled()),
                    Circle::new((b.x, b.y), b.radius, BLACK.stroke_width(1)),
                ]
            }))
            .map_err(render_err)?;

        // ── 4) legends outside the axes ────────────────────────────────
        let (_, panel_height) = side_panel.dim_in_pixel();
        let (bar_area, size_area) = side_panel.split_vertically(panel_height / 2);
        self.draw_color_bar(&bar_area)?;
        self.draw_size_legend(&size_area)?;

        Ok(())
    }

    fn draw_color_bar<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> PlotResult<()> {
        let legend_px = pt_to_px(self.fonts.legend);
        let label_font = FontDesc::new(FontFamily::SansSerif, legend_px, FontStyle::Bold);
        let tick_font = FontDesc::new(FontFamily::SansSerif, legend_px, FontStyle::Normal);

        let (_, height) = area.dim_in_pixel();
        let left = 15;
        let bar_width = 22;
        let top = (legend_px * 2.5) as i32 + 30;
        let bar_height = ((height as f64 * 0.6) as i32).max(COLOR_BAR_SLICES);

        area.draw(&Text::new(
            self.color_label.clone(),
            (left, top - legend_px as i32 - 12),
            label_font,
        ))
        .map_err(render_err)?;

        for i in 0..COLOR_BAR_SLICES {
            let t = (i as f64 + 0.5) / COLOR_BAR_SLICES as f64;
            let y_bottom = top + bar_height - bar_height * i / COLOR_BAR_SLICES;
            let y_top = top + bar_height - bar_height * (i + 1) / COLOR_BAR_SLICES;
            area.draw(&Rectangle::new(
                [(left, y_top), (left + bar_width, y_bottom)],
                self.color_map.at(t).filled(),
            ))
            .map_err(render_err)?;
        }
        area.draw(&Rectangle::new(
            [(left, top), (left + bar_width, top + bar_height)],
            BLACK.stroke_width(1),
        ))
        .map_err(render_err)?;

        let (lo, hi) = self.color_range;
        let n_ticks = if (hi - lo).abs() < f64::EPSILON { 1 } else { 5 };
        for k in 0..n_ticks {
            let f = if n_ticks == 1 { 0.5 } else { k as f64 / (n_ticks - 1) as f64 };
            let value = lo + (hi - lo) * f;
            let y = top + bar_height - (bar_height as f64 * f) as i32;
            area.draw(&PathElement::new(
                vec![(left + bar_width, y), (left + bar_width + 5, y)],
                BLACK,
            ))
            .map_err(render_err)?;
            area.draw(&Text::new(
                format!("{value:.1}"),
                (left + bar_width + 9, y - (legend_px / 2.0) as i32),
                tick_font.clone(),
            ))
            .map_err(render_err)?;
        }
        Ok(())
    }

    fn draw_size_legend<DB: DrawingBackend>(&self, area: &DrawingArea<DB, Shift>) -> PlotResult<()> {
        let legend_px = pt_to_px(self.fonts.legend);
        let title_font = FontDesc::new(FontFamily::SansSerif, legend_px, FontStyle::Bold);
        let entry_font = FontDesc::new(FontFamily::SansSerif, legend_px, FontStyle::Normal);

        let left = 15;
        let max_radius = self.size_legend.iter().map(|(_, r)| *r).max().unwrap_or(1);
        area.draw(&Text::new("Gene Count", (left, 10), title_font))
            .map_err(render_err)?;

        let mut y = 20 + legend_px as i32;
        for (size, radius) in &self.size_legend {
            let centre = (left + max_radius, y + radius);
            area.draw(&Circle::new(
                centre,
                *radius,
                LEGEND_GREY.mix(LEGEND_MARKER_ALPHA).filled(),
            ))
            .map_err(render_err)?;
            area.draw(&Text::new(
                format!("{size}"),
                (left + 2 * max_radius + 10, centre.1 - (legend_px / 2.0) as i32),
                entry_font.clone(),
            ))
            .map_err(render_err)?;
            y += 2 * radius + (legend_px as i32).max(8);
        }
        Ok(())
    }
}
