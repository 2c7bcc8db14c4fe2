//! PNG rendering of a sweep: time breakdown, memory utilization and, for
//! convolutions, the kernel size of each point.

use super::report::ChartData;
use crate::error::{AnalyzerError, Result};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::path::Path;

const SIZE: (u32, u32) = (1500, 1000);
const MAX_X_LABELS: usize = 12;

const DRAM_COLOR: RGBColor = RGBColor(0xFF, 0x9E, 0x4A);
const BUS_COLOR: RGBColor = RGBColor(0x4A, 0x90, 0xE2);
const COMPUTE_COLOR: RGBColor = RGBColor(0x50, 0xC8, 0x78);

/// Bottom of the log axis unless a segment is smaller.
const LOG_FLOOR: f64 = 1e-4;

type DrawResult<DB> = std::result::Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

pub fn render_chart(data: &ChartData, path: &Path) -> Result<()> {
  draw(data, path).map_err(|e| AnalyzerError::Output {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

fn draw(data: &ChartData, path: &Path) -> std::result::Result<(), Box<dyn std::error::Error>> {
  let root = BitMapBackend::new(path, SIZE).into_drawing_area();
  root.fill(&WHITE)?;

  let panels = root.split_evenly((2, 2));
  draw_time_breakdown(&panels[0], data)?;
  draw_utilization(&panels[1], data)?;
  if let Some(kernels) = &data.kernel_sizes {
    draw_kernel_sizes(&panels[2], data, kernels)?;
  }

  root.present()?;
  Ok(())
}

fn x_range(data: &ChartData) -> std::ops::Range<f64> {
  let n = data.labels.len().max(1) as f64;
  -0.5..(n - 0.5)
}

fn label_at(labels: &[String], x: f64) -> String {
  let i = x.round();
  if i < 0.0 || (x - i).abs() > 1e-6 {
    return String::new();
  }
  labels.get(i as usize).cloned().unwrap_or_default()
}

fn indexed(values: &[f64]) -> impl Iterator<Item = (f64, f64)> + '_ {
  values.iter().enumerate().map(|(i, v)| (i as f64, *v))
}

/// Log axis bounds covering every stacked bar.
fn time_bounds(data: &ChartData) -> (f64, f64) {
  let smallest = data
    .dram_to_central
    .iter()
    .chain(&data.central_to_cgra)
    .chain(&data.computation)
    .copied()
    .filter(|v| *v > 0.0)
    .fold(f64::INFINITY, f64::min);
  let lower = if smallest.is_finite() {
    smallest.min(LOG_FLOOR) / 2.0
  } else {
    LOG_FLOOR
  };

  let tallest = data
    .dram_to_central
    .iter()
    .zip(&data.central_to_cgra)
    .zip(&data.computation)
    .map(|((a, b), c)| a + b + c)
    .fold(0.0, f64::max);
  (lower, (tallest * 2.0).max(lower * 10.0))
}

fn draw_time_breakdown<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, data: &ChartData) -> DrawResult<DB> {
  let (lower, upper) = time_bounds(data);
  let labels = &data.labels;

  let mut chart = ChartBuilder::on(area)
    .caption(&data.title, ("sans-serif", 22))
    .margin(15)
    .x_label_area_size(40)
    .y_label_area_size(70)
    .build_cartesian_2d(x_range(data), (lower..upper).log_scale())?;

  chart
    .configure_mesh()
    .disable_x_mesh()
    .x_labels(labels.len().min(MAX_X_LABELS))
    .x_label_formatter(&|x| label_at(labels, *x))
    .x_desc(data.x_axis)
    .y_desc("Time (seconds) - Log Scale")
    .draw()?;

  let stages = [
    ("DRAM-Central", &data.dram_to_central, DRAM_COLOR),
    ("Central-CGRA", &data.central_to_cgra, BUS_COLOR),
    ("Computation", &data.computation, COMPUTE_COLOR),
  ];
  let mut stacked = vec![0.0f64; labels.len()];
  for (name, values, color) in stages {
    let mut bars = Vec::with_capacity(values.len());
    for (i, &v) in values.iter().enumerate() {
      let start = stacked[i];
      stacked[i] += v;
      if v > 0.0 {
        let x = i as f64;
        bars.push(Rectangle::new(
          [(x - 0.4, start.max(lower)), (x + 0.4, stacked[i])],
          color.filled(),
        ));
      }
    }
    chart
      .draw_series(bars)?
      .label(name)
      .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
  }

  chart
    .configure_series_labels()
    .background_style(&WHITE.mix(0.8))
    .border_style(&BLACK)
    .draw()
}

fn draw_utilization<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, data: &ChartData) -> DrawResult<DB> {
  let labels = &data.labels;

  let mut chart = ChartBuilder::on(area)
    .caption(&data.utilization_title, ("sans-serif", 22))
    .margin(15)
    .x_label_area_size(40)
    .y_label_area_size(70)
    .build_cartesian_2d(x_range(data), 0f64..105f64)?;

  chart
    .configure_mesh()
    .x_labels(labels.len().min(MAX_X_LABELS))
    .x_label_formatter(&|x| label_at(labels, *x))
    .x_desc(data.x_axis)
    .y_desc("Memory Utilization (%)")
    .draw()?;

  let tiers = [
    ("CGRA SRAM", &data.cgra_sram_utilization, BLUE),
    ("Central SRAM", &data.central_sram_utilization, RED),
    ("DRAM", &data.dram_utilization, GREEN),
  ];
  for (name, values, color) in tiers {
    chart
      .draw_series(LineSeries::new(indexed(values), color.stroke_width(2)))?
      .label(name)
      .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    chart.draw_series(indexed(values).map(|p| Circle::new(p, 3, color.filled())))?;
  }

  chart
    .configure_series_labels()
    .background_style(&WHITE.mix(0.8))
    .border_style(&BLACK)
    .draw()
}

fn draw_kernel_sizes<DB: DrawingBackend>(
  area: &DrawingArea<DB, Shift>,
  data: &ChartData,
  kernels: &[u64],
) -> DrawResult<DB> {
  let labels = &data.labels;
  let top = kernels.iter().copied().max().unwrap_or(1) as f64 + 1.0;
  let points: Vec<f64> = kernels.iter().map(|k| *k as f64).collect();

  let mut chart = ChartBuilder::on(area)
    .caption("Convolution Kernel Size", ("sans-serif", 22))
    .margin(15)
    .x_label_area_size(40)
    .y_label_area_size(70)
    .build_cartesian_2d(x_range(data), 0f64..top)?;

  chart
    .configure_mesh()
    .x_labels(labels.len().min(MAX_X_LABELS))
    .x_label_formatter(&|x| label_at(labels, *x))
    .x_desc(data.x_axis)
    .y_desc("Kernel Size")
    .draw()?;

  chart.draw_series(LineSeries::new(indexed(&points), DRAM_COLOR.stroke_width(2)))?;
  chart.draw_series(indexed(&points).map(|p| Circle::new(p, 4, DRAM_COLOR.filled())))?;
  Ok(())
}
