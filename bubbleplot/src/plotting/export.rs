use plotters::prelude::IntoDrawingArea;
use plotters_svg::SVGBackend;
use tracing::debug;

use crate::errors::{render_err, PlotError, PlotResult};
use crate::models::ExportFormat;
use crate::plotting::chart::{BubbleChart, PX_PER_INCH};

/// Draw the chart into an SVG document. PNG and PDF are derived from it.
pub fn render_svg(chart: &BubbleChart) -> PlotResult<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, chart.size_px).into_drawing_area();
        chart.draw(&root)?;
        root.present().map_err(render_err)?;
    }
    debug!("Rendered {} bytes of SVG", svg.len());
    Ok(svg)
}

/// Serialise the chart. `dpi` only applies to PNG.
pub fn export_chart(chart: &BubbleChart, format: ExportFormat, dpi: u32) -> PlotResult<Vec<u8>> {
    let svg = render_svg(chart)?;
    if format.is_vector() {
        debug!("{} is a vector format, ignoring dpi {}", format.extension(), dpi);
    }
    match format {
        ExportFormat::Svg => Ok(svg.into_bytes()),
        ExportFormat::Png => svg_to_png(&svg, dpi),
        ExportFormat::Pdf => svg_to_pdf(&svg),
    }
}

/// Pixel size of a PNG export at `dpi`.
pub fn raster_size(size_px: (u32, u32), dpi: u32) -> (u32, u32) {
    let scale = dpi as f64 / PX_PER_INCH;
    (
        ((size_px.0 as f64 * scale).ceil() as u32).max(1),
        ((size_px.1 as f64 * scale).ceil() as u32).max(1),
    )
}

#[cfg(feature = "png_export")]
fn svg_to_png(svg: &str, dpi: u32) -> PlotResult<Vec<u8>> {
    use resvg::{tiny_skia, usvg};

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(render_err)?;

    let canvas = tree.size();
    let (width, height) = raster_size(
        (canvas.width().ceil() as u32, canvas.height().ceil() as u32),
        dpi,
    );
    let mut pixmap = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
        PlotError::Render(format!("cannot allocate a {width}x{height} pixmap"))
    })?;

    // Pixmap starts fully transparent, so an unfilled canvas stays transparent.
    let scale = dpi as f32 / PX_PER_INCH as f32;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    debug!("Rasterised chart to {}x{} px at {} dpi", width, height, dpi);
    pixmap.encode_png().map_err(render_err)
}

#[cfg(not(feature = "png_export"))]
fn svg_to_png(_svg: &str, _dpi: u32) -> PlotResult<Vec<u8>> {
    Err(PlotError::Render(
        "PNG export not enabled (compile with the `png_export` feature)".into(),
    ))
}

#[cfg(feature = "pdf_export")]
fn svg_to_pdf(svg: &str) -> PlotResult<Vec<u8>> {
    use svg2pdf::usvg;

    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();
    let tree = usvg::Tree::from_str(svg, &options).map_err(render_err)?;

    // page size in real inches: one inch is PX_PER_INCH user units
    let mut page = svg2pdf::PageOptions::default();
    page.dpi = PX_PER_INCH as f32;
    svg2pdf::to_pdf(&tree, svg2pdf::ConversionOptions::default(), page)
        .map_err(|e| PlotError::Render(format!("pdf conversion failed: {e:?}")))
}

#[cfg(not(feature = "pdf_export"))]
fn svg_to_pdf(_svg: &str) -> PlotResult<Vec<u8>> {
    Err(PlotError::Render(
        "PDF export not enabled (compile with the `pdf_export` feature)".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ColumnBindings, EnrichmentRow, PlotConfig};
    use plotters::style::FontDesc;

    #[test]
    fn raster_size_scales_with_dpi() {
        assert_eq!(raster_size((1200, 1800), 300), (3600, 5400));
        assert_eq!(raster_size((1200, 1800), 100), (1200, 1800));
        assert_eq!(raster_size((10, 10), 1), (1, 1));
    }

    fn sample_chart(transparent: bool) -> BubbleChart {
        let config = PlotConfig {
            columns: ColumnBindings {
                term: "Term".into(),
                percent_or_ratio: "%".into(),
                significance: "PValue".into(),
                count: "Count".into(),
            },
            width: 6.0,
            height: 4.0,
            transparent_background: transparent,
            ..PlotConfig::default()
        };
        let rows = vec![
            EnrichmentRow::new("Glycolysis".into(), 0.3, 0.001, 30.0),
            EnrichmentRow::new("TCA cycle".into(), 0.1, 0.02, 8.0),
        ];
        BubbleChart::assemble(&rows, &[10, 30], &config).unwrap()
    }

    /// Text layout needs a sans-serif system font; without one the drawing
    /// tests have nothing to check and return early.
    fn fonts_available() -> bool {
        use plotters_backend::{FontFamily, FontStyle};
        [FontStyle::Normal, FontStyle::Bold].into_iter().all(|style| {
            FontDesc::new(FontFamily::SansSerif, 12.0, style)
                .box_size("Ag")
                .is_ok()
        })
    }

    #[test]
    fn svg_carries_terms_axes_and_both_legends() {
        if !fonts_available() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let svg = render_svg(&sample_chart(false)).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Glycolysis"));
        assert!(svg.contains("TCA cycle"));
        assert!(svg.contains("Gene Ratio"));
        assert!(svg.contains("-log10(PValue)"));
        assert!(svg.contains("Gene Count"));
        // fill and outline per bubble, one marker per legend entry
        assert!(svg.matches("<circle").count() >= 2 * 2 + 2);
    }

    #[test]
    fn transparent_canvas_has_no_white_fill() {
        if !fonts_available() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let opaque = render_svg(&sample_chart(false)).unwrap();
        let clear = render_svg(&sample_chart(true)).unwrap();
        assert!(opaque.contains("#FFFFFF"));
        assert!(!clear.contains("#FFFFFF"));
    }

    #[test]
    fn grid_toggle_removes_mesh_lines() {
        if !fonts_available() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let with_grid = render_svg(&sample_chart(false)).unwrap();
        let mut chart = sample_chart(false);
        chart.show_grid = false;
        let without_grid = render_svg(&chart).unwrap();
        let strokes = |svg: &str| svg.matches("<line").count() + svg.matches("<polyline").count();
        assert!(strokes(&with_grid) > strokes(&without_grid));
    }

    #[cfg(feature = "png_export")]
    #[test]
    fn png_export_matches_the_requested_dpi() {
        if !fonts_available() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let png = export_chart(&sample_chart(false), ExportFormat::Png, 50).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        // IHDR width and height, big endian
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        assert_eq!((width, height), raster_size((600, 400), 50));
    }

    #[cfg(feature = "pdf_export")]
    #[test]
    fn pdf_export_produces_a_document() {
        if !fonts_available() {
            eprintln!("no sans-serif font found, skipping");
            return;
        }
        let pdf = export_chart(&sample_chart(false), ExportFormat::Pdf, 300).unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }
}
