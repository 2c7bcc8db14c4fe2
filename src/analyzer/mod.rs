pub mod conv;
pub mod gemm;
pub mod hardware;
pub mod result;

pub use conv::ConvAnalyzer;
pub use gemm::GemmAnalyzer;
pub use hardware::{HardwareModel, Utilization};
pub use result::{AnalysisReport, SweepPoint};

use crate::config::{HardwareProfile, OperationConfig};
use crate::error::Result;
use log::info;

/// A cost model that turns a sweep document into analyzed points.
pub trait SweepAnalyzer {
  type Config;

  /// Fails when a byte count of the sweep does not fit in 64 bits.
  fn analyze(&self, config: &Self::Config) -> Result<Vec<SweepPoint>>;
}

/// `None` on overflow.
pub(crate) fn checked_product(factors: &[u64]) -> Option<u64> {
  factors.iter().try_fold(1u64, |acc, &f| acc.checked_mul(f))
}

/// `None` on overflow.
pub(crate) fn checked_sum(terms: &[u64]) -> Option<u64> {
  terms.iter().try_fold(0u64, |acc, &t| acc.checked_add(t))
}

/// Run the sweep for whichever operation was loaded and fill in the
/// requested metrics.
pub fn run_analysis(hardware: &HardwareProfile, op: &OperationConfig) -> Result<AnalysisReport> {
  let hw = HardwareModel::from(hardware);
  let analysis = op.analysis();
  let metrics = analysis.selected_metrics();

  let mut points = match op {
    OperationConfig::Gemm(cfg) => GemmAnalyzer::new(&hw).analyze(cfg)?,
    OperationConfig::Conv(cfg) => ConvAnalyzer::new(&hw).analyze(cfg)?,
  };
  for point in points.iter_mut() {
    point.derive_metrics(&hw, &metrics);
  }

  info!("{} sweep produced {} point(s)", op.operation(), points.len());

  Ok(AnalysisReport {
    operation: op.operation(),
    output_prefix: analysis.output_prefix.clone(),
    metrics,
    points,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::loader::parse_operation_config;
  use crate::config::{Metric, Operation};

  const HW: &str = r#"
hardware:
  bits_per_cycle: 32
  bus_frequency: 100
  cgra_frequency: 100
  dram: { size: 32, latency: 100 }
  central_sram: { size: 512, latency: 10 }
  cgra_sram: { size: 32, latency: 1 }
  dma: { transfer_rate: 16 }
"#;

  #[test]
  fn test_checked_helpers() {
    assert_eq!(checked_product(&[3, 4, 5]), Some(60));
    assert_eq!(checked_product(&[u64::MAX, 2]), None);
    assert_eq!(checked_sum(&[1, 2, 3]), Some(6));
    assert_eq!(checked_sum(&[u64::MAX, 1]), None);
  }

  #[test]
  fn test_only_selected_metrics_filled() {
    let hw = HardwareProfile::from_yaml_str(HW).unwrap();
    let op = parse_operation_config(
      Operation::Gemm,
      r#"
dimensions: [64, 512]
data_type: { size: 4 }
analysis:
  output_prefix: gemm_analysis
  metrics: [latency, bandwidth_utilization]
"#,
    )
    .unwrap();
    let report = run_analysis(&hw, &op).unwrap();
    assert_eq!(report.metrics, vec![Metric::Latency, Metric::BandwidthUtilization]);
    assert_eq!(report.points.len(), 2);
    for p in &report.points {
      assert_eq!(p.metrics.latency, Some(p.time.total));
      let bw = p.metrics.bandwidth_utilization.unwrap();
      assert!((0.0..=1.0).contains(&bw));
      assert!(p.metrics.memory_utilization.is_none());
      assert!(p.metrics.compute_intensity.is_none());
    }
  }

  #[test]
  fn test_time_uses_both_clocks() {
    let hw = HardwareProfile::from_yaml_str(&HW.replace("cgra_frequency: 100", "cgra_frequency: 200")).unwrap();
    let op = parse_operation_config(
      Operation::Gemm,
      "dimensions: [64]\ndata_type: { size: 4 }\nanalysis: { output_prefix: g }\n",
    )
    .unwrap();
    let p = &run_analysis(&hw, &op).unwrap().points[0];
    assert_eq!(p.time.computation, p.latencies.computation / 200e6);
    assert_eq!(p.time.central_to_cgra, p.latencies.central_to_cgra as f64 / 100e6);
  }

  #[test]
  fn test_huge_gemm_dimension_is_an_error() {
    let hw = HardwareProfile::from_yaml_str(HW).unwrap();
    let op = parse_operation_config(
      Operation::Gemm,
      "dimensions: [64, 5000000000]\ndata_type: { size: 4 }\nanalysis: { output_prefix: g }\n",
    )
    .unwrap();
    let err = run_analysis(&hw, &op).unwrap_err();
    assert!(err.is_validation());
    assert!(err.to_string().contains("5000000000"));
  }

  #[test]
  fn test_huge_conv_input_is_an_error() {
    let hw = HardwareProfile::from_yaml_str(HW).unwrap();
    let op = parse_operation_config(
      Operation::Conv,
      r#"
input_dimensions: [5000000000]
kernel_sizes: [3]
num_channels: 3
num_filters: 16
data_type_size: 4
analysis: { output_prefix: c }
"#,
    )
    .unwrap();
    assert!(run_analysis(&hw, &op).unwrap_err().is_validation());
  }
}
