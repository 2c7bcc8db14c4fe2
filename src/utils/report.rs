//! Time-breakdown table and the files written after a sweep.

use super::plot::render_chart;
use crate::analyzer::{AnalysisReport, SweepPoint};
use crate::config::Operation;
use crate::error::{AnalyzerError, Result};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Base name shared by the chart artifacts: `<prefix>_<operation>_analysis`.
///
/// With the stock prefix `gemm_analysis` this gives
/// `gemm_analysis_gemm_analysis`.
pub fn artifact_stem(output_prefix: &str, operation: Operation) -> String {
  format!("{}_{}_analysis", output_prefix, operation)
}

pub fn chart_path(dir: &Path, output_prefix: &str, operation: Operation) -> PathBuf {
  dir.join(format!("{}.png", artifact_stem(output_prefix, operation)))
}

pub fn chart_data_path(dir: &Path, output_prefix: &str, operation: Operation) -> PathBuf {
  dir.join(format!("{}.json", artifact_stem(output_prefix, operation)))
}

pub fn results_path(dir: &Path, output_prefix: &str) -> PathBuf {
  dir.join(format!("{}_results.yaml", output_prefix))
}

/// Fixed-width table of seconds spent per stage.
pub fn format_time_breakdown(report: &AnalysisReport) -> String {
  let (heading, min_width) = match report.operation {
    Operation::Gemm => ("Dimension", 10),
    Operation::Conv => ("Input Size", 15),
  };
  let width = report
    .points
    .iter()
    .map(|p| p.label().len())
    .max()
    .unwrap_or(0)
    .max(min_width);
  let rule = "-".repeat(width + 4 * 13);

  let mut out = format!("\n{} Time Breakdown:\n", report.operation.as_str().to_uppercase());
  out.push_str(&format!("{}\n", rule));
  out.push_str(&format!(
    "{:<width$} {:>12} {:>12} {:>12} {:>12}\n",
    heading,
    "DRAM-Central",
    "Central-CGRA",
    "Computation",
    "Total",
    width = width
  ));
  out.push_str(&format!("{}\n", rule));
  for p in &report.points {
    out.push_str(&format!(
      "{:<width$} {:>12.6} {:>12.6} {:>12.6} {:>12.6}\n",
      p.label(),
      p.time.dram_to_central,
      p.time.central_to_cgra,
      p.time.computation,
      p.time.total,
      width = width
    ));
  }
  out
}

pub fn print_time_breakdown(report: &AnalysisReport) {
  print!("{}", format_time_breakdown(report));
}

/// Series the chart image is drawn from. Utilizations are percentages.
#[derive(Debug, Serialize)]
pub struct ChartData {
  pub title: String,
  pub utilization_title: String,
  pub x_axis: &'static str,
  pub y_scale: &'static str,
  pub labels: Vec<String>,
  pub dram_to_central: Vec<f64>,
  pub central_to_cgra: Vec<f64>,
  pub computation: Vec<f64>,
  pub cgra_sram_utilization: Vec<f64>,
  pub central_sram_utilization: Vec<f64>,
  pub dram_utilization: Vec<f64>,
  /// Conv only
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kernel_sizes: Option<Vec<u64>>,
}

impl ChartData {
  pub fn from_report(report: &AnalysisReport) -> Self {
    let points = &report.points;
    let op = report.operation.as_str().to_uppercase();
    let (x_axis, kernel_sizes) = match report.operation {
      Operation::Gemm => ("Dimension", None),
      Operation::Conv => (
        "Input Dimension",
        Some(points.iter().filter_map(|p| p.kernel_size).collect()),
      ),
    };
    Self {
      title: format!("{} Time Breakdown", op),
      utilization_title: format!("{} Memory Utilization", op),
      x_axis,
      y_scale: "log",
      labels: points.iter().map(SweepPoint::label).collect(),
      dram_to_central: series(points, |p| p.time.dram_to_central),
      central_to_cgra: series(points, |p| p.time.central_to_cgra),
      computation: series(points, |p| p.time.computation),
      cgra_sram_utilization: series(points, |p| p.utilization.cgra_sram * 100.0),
      central_sram_utilization: series(points, |p| p.utilization.central_sram * 100.0),
      dram_utilization: series(points, |p| p.utilization.dram * 100.0),
      kernel_sizes,
    }
  }
}

fn series(points: &[SweepPoint], f: impl Fn(&SweepPoint) -> f64) -> Vec<f64> {
  points.iter().map(f).collect()
}

fn write_file(path: &Path, content: &str) -> Result<()> {
  fs::write(path, content).map_err(|e| AnalyzerError::Output {
    path: path.to_path_buf(),
    message: e.to_string(),
  })
}

pub fn write_chart(data: &ChartData, report: &AnalysisReport, dir: &Path) -> Result<PathBuf> {
  let path = chart_path(dir, &report.output_prefix, report.operation);
  render_chart(data, &path)?;
  Ok(path)
}

pub fn write_chart_data(data: &ChartData, report: &AnalysisReport, dir: &Path) -> Result<PathBuf> {
  let path = chart_data_path(dir, &report.output_prefix, report.operation);
  let json = serde_json::to_string_pretty(data).map_err(|e| AnalyzerError::Output {
    path: path.clone(),
    message: e.to_string(),
  })?;
  write_file(&path, &json)?;
  Ok(path)
}

pub fn write_detailed_results(report: &AnalysisReport, dir: &Path) -> Result<PathBuf> {
  let path = results_path(dir, &report.output_prefix);
  let yaml = serde_yaml::to_string(&report.points).map_err(|e| AnalyzerError::Output {
    path: path.clone(),
    message: e.to_string(),
  })?;
  write_file(&path, &yaml)?;
  Ok(path)
}

/// Write the chart image and its data and, when asked for, the detailed
/// results.
pub fn write_artifacts(report: &AnalysisReport, dir: &Path, save_detailed: bool) -> Result<Vec<PathBuf>> {
  fs::create_dir_all(dir).map_err(|e| AnalyzerError::Output {
    path: dir.to_path_buf(),
    message: e.to_string(),
  })?;

  let data = ChartData::from_report(report);
  let mut written = vec![write_chart(&data, report, dir)?, write_chart_data(&data, report, dir)?];
  if save_detailed {
    written.push(write_detailed_results(report, dir)?);
  }
  for path in &written {
    info!("wrote {:?}", path);
  }
  Ok(written)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_artifact_stem_doubles_stock_prefix() {
    assert_eq!(artifact_stem("gemm_analysis", Operation::Gemm), "gemm_analysis_gemm_analysis");
    assert_eq!(artifact_stem("run1", Operation::Conv), "run1_conv_analysis");
  }

  #[test]
  fn test_paths() {
    let dir = Path::new("out");
    assert_eq!(
      chart_path(dir, "conv_analysis", Operation::Conv),
      Path::new("out").join("conv_analysis_conv_analysis.png")
    );
    assert_eq!(
      chart_data_path(dir, "conv_analysis", Operation::Conv),
      Path::new("out").join("conv_analysis_conv_analysis.json")
    );
    assert_eq!(results_path(dir, "conv_analysis"), Path::new("out").join("conv_analysis_results.yaml"));
  }

  #[test]
  fn test_empty_table_has_header() {
    let report = AnalysisReport {
      operation: Operation::Gemm,
      output_prefix: "g".to_string(),
      metrics: Vec::new(),
      points: Vec::new(),
    };
    let table = format_time_breakdown(&report);
    assert!(table.contains("GEMM Time Breakdown:"));
    assert!(table.contains("Dimension"));
    assert!(table.contains("Central-CGRA"));
  }

  fn conv_report() -> AnalysisReport {
    use crate::analyzer::hardware::tests::reference_model;
    use crate::analyzer::{ConvAnalyzer, SweepAnalyzer};
    use crate::config::ConvSweepConfig;

    let cfg = ConvSweepConfig::from_yaml_str(
      r#"
input_dimensions: [16, 32]
kernel_sizes: [3, 5]
num_channels: 3
num_filters: 8
padding: 1
data_type_size: 4
analysis: { output_prefix: conv_analysis }
"#,
    )
    .unwrap();
    AnalysisReport {
      operation: Operation::Conv,
      output_prefix: "conv_analysis".to_string(),
      metrics: Vec::new(),
      points: ConvAnalyzer::new(&reference_model()).analyze(&cfg).unwrap(),
    }
  }

  #[test]
  fn test_table_rows_are_aligned() {
    let table = format_time_breakdown(&conv_report());
    let lines: Vec<&str> = table.lines().filter(|l| !l.is_empty()).collect();
    // title, rule, header, rule, four rows
    assert_eq!(lines.len(), 8);
    assert!(lines[4].starts_with("16x16 k3"));
    assert_eq!(lines[2].len(), lines[4].len());
  }

  #[test]
  fn test_conv_chart_carries_kernel_sizes() {
    let data = ChartData::from_report(&conv_report());
    assert_eq!(data.kernel_sizes, Some(vec![3, 5, 3, 5]));
    assert_eq!(data.x_axis, "Input Dimension");
    assert_eq!(data.labels.len(), 4);
  }

  #[test]
  fn test_chart_image_is_png() {
    let dir = std::env::temp_dir().join(format!("cgra_mem_chart_{}", std::process::id()));
    let report = conv_report();
    let written = write_artifacts(&report, &dir, false).unwrap();
    assert_eq!(
      written,
      vec![
        dir.join("conv_analysis_conv_analysis.png"),
        dir.join("conv_analysis_conv_analysis.json"),
      ]
    );
    let bytes = fs::read(&written[0]).unwrap();
    assert_eq!(&bytes[..4], b"\x89PNG");
    let _ = fs::remove_dir_all(&dir);
  }
}
