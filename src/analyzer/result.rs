use super::hardware::{HardwareModel, Utilization};
use crate::config::{ConvTile, GemmTile, Metric, Operation};
use serde::{Deserialize, Serialize};

/// Cycles spent per stage. Transfers are bus cycles, computation is CGRA
/// cycles and may be fractional.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyBreakdown {
  pub dram_to_central: u64,
  pub central_to_cgra: u64,
  pub computation: f64,
}

impl LatencyBreakdown {
  pub fn total_cycles(&self) -> f64 {
    self.dram_to_central as f64 + self.central_to_cgra as f64 + self.computation
  }
}

/// Same stages as [`LatencyBreakdown`], converted to seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeBreakdown {
  pub dram_to_central: f64,
  pub central_to_cgra: f64,
  pub computation: f64,
  pub total: f64,
}

/// Bytes moved between tiers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataMovement {
  pub dram_to_central: f64,
  pub central_to_cgra: f64,
  pub working_set: u64,
  pub reloads: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GemmMemory {
  pub per_matrix: u64,
  pub input_a: u64,
  pub input_b: u64,
  pub output: u64,
  pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConvMemory {
  pub input: u64,
  pub kernel: u64,
  pub output: u64,
  pub total: u64,
  pub output_dim: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryBreakdown {
  Gemm(GemmMemory),
  Conv(ConvMemory),
}

impl MemoryBreakdown {
  pub fn total(&self) -> u64 {
    match self {
      MemoryBreakdown::Gemm(m) => m.total,
      MemoryBreakdown::Conv(m) => m.total,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TileChoice {
  Gemm(GemmTile),
  Conv(ConvTile),
}

/// Only the metrics selected in `analysis.metrics` are filled in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub latency: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub memory_utilization: Option<Utilization>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub data_movement: Option<DataMovement>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub compute_intensity: Option<f64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bandwidth_utilization: Option<f64>,
}

impl DerivedMetrics {
  pub fn is_empty(&self) -> bool {
    *self == DerivedMetrics::default()
  }
}

/// One analyzed combination of the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
  pub dimension: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kernel_size: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tile: Option<TileChoice>,
  pub memory: MemoryBreakdown,
  pub latencies: LatencyBreakdown,
  pub time: TimeBreakdown,
  pub utilization: Utilization,
  pub movement: DataMovement,
  /// Arithmetic operations performed
  pub operations: f64,
  pub total_latency: f64,
  #[serde(default, skip_serializing_if = "DerivedMetrics::is_empty")]
  pub metrics: DerivedMetrics,
}

impl SweepPoint {
  /// Row label used by the table and the chart series.
  pub fn label(&self) -> String {
    let mut label = match self.kernel_size {
      Some(k) => format!("{0}x{0} k{1}", self.dimension, k),
      None => self.dimension.to_string(),
    };
    match &self.tile {
      Some(TileChoice::Gemm(t)) => label.push_str(&format!(" t{}x{}x{}", t.m, t.n, t.k)),
      Some(TileChoice::Conv(t)) => label.push_str(&format!(" t{}x{}", t.input_h, t.input_w)),
      None => {},
    }
    label
  }

  pub fn derive_metrics(&mut self, hw: &HardwareModel, selected: &[Metric]) {
    let mut derived = DerivedMetrics::default();
    for metric in selected {
      match metric {
        Metric::Latency => derived.latency = Some(self.time.total),
        Metric::MemoryUtilization => derived.memory_utilization = Some(self.utilization),
        Metric::DataMovement => derived.data_movement = Some(self.movement),
        Metric::ComputeIntensity => {
          let bytes = self.movement.central_to_cgra;
          derived.compute_intensity = Some(if bytes > 0.0 { self.operations / bytes } else { 0.0 });
        },
        Metric::BandwidthUtilization => {
          let cycles = self.latencies.dram_to_central + self.latencies.central_to_cgra;
          let capacity = hw.bus_capacity(cycles);
          let moved = self.movement.dram_to_central + self.movement.central_to_cgra;
          derived.bandwidth_utilization = Some(if capacity > 0.0 { (moved / capacity).min(1.0) } else { 0.0 });
        },
      }
    }
    self.metrics = derived;
  }
}

/// Converts cycle counts to seconds with the bus and CGRA clocks.
pub fn to_seconds(hw: &HardwareModel, latencies: &LatencyBreakdown) -> TimeBreakdown {
  let dram_to_central = hw.bus_seconds(latencies.dram_to_central as f64);
  let central_to_cgra = hw.bus_seconds(latencies.central_to_cgra as f64);
  let computation = hw.cgra_seconds(latencies.computation);
  TimeBreakdown {
    dram_to_central,
    central_to_cgra,
    computation,
    total: dram_to_central + central_to_cgra + computation,
  }
}

/// Output of one analyzer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
  pub operation: Operation,
  pub output_prefix: String,
  pub metrics: Vec<Metric>,
  pub points: Vec<SweepPoint>,
}
