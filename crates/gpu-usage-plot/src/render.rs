//! Two-panel utilization chart rendering

use crate::normalize::UsageSample;
use crate::pipeline::UsageDataset;
use crate::{PlotError, Result};
use plotters::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

const FONT: &str = "sans-serif";
const TITLE_FONT_SIZE: f64 = 12.0;
const LABEL_FONT_SIZE: f64 = 9.0;
const LEGEND_SAMPLE_LENGTH: f64 = 14.0;

/// Chart geometry and styling; sizes are in inches and points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RenderOptions {
    /// Figure width in inches
    pub width_in: f64,

    /// Figure height in inches
    pub height_in: f64,

    /// Resolution in dots per inch
    pub dpi: u32,

    /// Series line width in points
    pub line_width: f64,

    /// Legend sample line width in points
    pub legend_line_width: f64,

    /// Legend font size in points
    pub legend_font_size: f64,

    /// Lower vertical bound of both panels
    pub y_min: f64,

    /// Upper vertical bound of both panels
    pub y_max: f64,

    /// Outer padding in inches
    pub padding_in: f64,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width_in: 12.0,
            height_in: 6.0,
            dpi: 300,
            line_width: 1.0,
            legend_line_width: 1.0,
            legend_font_size: 7.0,
            y_min: -0.01,
            y_max: 1.01,
            padding_in: 0.05,
        }
    }
}

impl RenderOptions {
    /// Output image size in pixels
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width_in * self.dpi as f64).round().max(1.0) as u32,
            (self.height_in * self.dpi as f64).round().max(1.0) as u32,
        )
    }

    /// Convert a length in points to pixels
    pub fn points_to_pixels(&self, points: f64) -> f64 {
        points * self.dpi as f64 / 72.0
    }

    fn stroke(&self, points: f64) -> u32 {
        self.points_to_pixels(points).round().max(1.0) as u32
    }

    fn padding(&self) -> u32 {
        (self.padding_in * self.dpi as f64).round() as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Panel {
    Compute,
    Memory,
}

impl Panel {
    fn label(self) -> &'static str {
        match self {
            Panel::Compute => "GPU utilization",
            Panel::Memory => "Memory utilization",
        }
    }

    fn value(self, sample: &UsageSample) -> f64 {
        match self {
            Panel::Compute => sample.gpu,
            Panel::Memory => sample.memory,
        }
    }
}

/// Draw compute utilization above memory utilization and save as PNG.
///
/// The existing file at `output` is overwritten.
pub fn render_usage_chart(dataset: &UsageDataset, options: &RenderOptions, output: &Path) -> Result<()> {
    if dataset.is_empty() {
        return Err(PlotError::NoValues);
    }
    if !(options.y_min < options.y_max) {
        return Err(PlotError::Render(format!(
            "empty vertical range [{}, {}]",
            options.y_min, options.y_max
        )));
    }

    let (width, height) = options.pixel_size();
    debug!("Rendering {}x{} px chart to {}", width, height, output.display());

    draw_chart(dataset, options, output).map_err(|e| PlotError::Render(e.to_string()))
}

/// Horizontal range covering every sample, widened when degenerate
fn time_bounds(dataset: &UsageDataset) -> (f64, f64) {
    let (lo, hi) = dataset.time_range();
    if hi > lo {
        (lo, hi)
    } else {
        (lo - 0.5, hi + 0.5)
    }
}

fn draw_chart(
    dataset: &UsageDataset,
    options: &RenderOptions,
    output: &Path,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::new(output, options.pixel_size()).into_drawing_area();
    root.fill(&WHITE)?;

    let pad = options.padding();
    let title = format!("Utilization statistics from {}", dataset.source_name());
    let body = root
        .margin(pad, pad, pad, pad)
        .titled(&title, (FONT, options.points_to_pixels(TITLE_FONT_SIZE)))?;

    let label_px = options.points_to_pixels(LABEL_FONT_SIZE);
    let legend_px = options.points_to_pixels(options.legend_font_size);
    let line_width = options.stroke(options.line_width);
    let legend_width = options.stroke(options.legend_line_width);
    let legend_length = options.points_to_pixels(LEGEND_SAMPLE_LENGTH).round() as i32;

    let (x_lo, x_hi) = time_bounds(dataset);
    let devices = dataset.devices();
    let x_desc = dataset.axis.label();

    let hide_label = |_: &f64| String::new();
    let fraction_label = |v: &f64| format!("{:.1}", v);

    let areas = body.split_evenly((2, 1));
    for (area, panel) in areas.iter().zip([Panel::Compute, Panel::Memory]) {
        let bottom = panel == Panel::Memory;

        let mut chart = ChartBuilder::on(area)
            .margin(label_px.round() as u32)
            .x_label_area_size((label_px * if bottom { 3.5 } else { 1.0 }).round() as u32)
            .y_label_area_size((label_px * 5.0).round() as u32)
            .build_cartesian_2d(x_lo..x_hi, options.y_min..options.y_max)?;

        let mut mesh = chart.configure_mesh();
        mesh.y_desc(panel.label())
            .y_label_formatter(&fraction_label)
            .label_style((FONT, label_px))
            .axis_desc_style((FONT, label_px));
        if bottom {
            mesh.x_desc(x_desc.as_str());
        } else {
            mesh.x_label_formatter(&hide_label);
        }
        mesh.draw()?;

        for &device_id in &devices {
            let color = Palette99::pick(device_id).to_rgba();
            let points = dataset
                .samples_for(device_id)
                .map(|s| (s.time, panel.value(&s.sample)));
            let series = chart.draw_series(LineSeries::new(points, color.stroke_width(line_width)))?;

            if bottom {
                series
                    .label(device_id.to_string())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + legend_length, y)], color.stroke_width(legend_width))
                    });
            }
        }

        if bottom {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::LowerRight)
                .label_font((FONT, legend_px))
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
        }
    }

    root.present()?;
    Ok(())
}
