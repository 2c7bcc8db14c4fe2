use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Measurements an analysis can request through `analysis.metrics`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
  Latency,
  MemoryUtilization,
  DataMovement,
  ComputeIntensity,
  BandwidthUtilization,
}

impl Metric {
  pub const ALL: [Metric; 5] = [
    Metric::Latency,
    Metric::MemoryUtilization,
    Metric::DataMovement,
    Metric::ComputeIntensity,
    Metric::BandwidthUtilization,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Metric::Latency => "latency",
      Metric::MemoryUtilization => "memory_utilization",
      Metric::DataMovement => "data_movement",
      Metric::ComputeIntensity => "compute_intensity",
      Metric::BandwidthUtilization => "bandwidth_utilization",
    }
  }

  pub fn known_names() -> String {
    Self::ALL.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ")
  }
}

impl fmt::Display for Metric {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Metric {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .iter()
      .copied()
      .find(|m| m.as_str() == s)
      .ok_or_else(|| format!("unknown metric `{}` (known: {})", s, Self::known_names()))
  }
}

/// Parse the raw `analysis.metrics` list, keeping declaration order and
/// dropping duplicates.
pub fn parse_metrics(names: &[String]) -> Result<Vec<Metric>, String> {
  let mut metrics = Vec::with_capacity(names.len());
  for name in names {
    let metric = name.trim().parse::<Metric>()?;
    if !metrics.contains(&metric) {
      metrics.push(metric);
    }
  }
  Ok(metrics)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_known_metrics() {
    let names = vec!["latency".to_string(), "data_movement".to_string(), "latency".to_string()];
    let metrics = parse_metrics(&names).unwrap();
    assert_eq!(metrics, vec![Metric::Latency, Metric::DataMovement]);
  }

  #[test]
  fn test_unknown_metric_rejected() {
    let names = vec!["latency".to_string(), "quantum_tunneling".to_string()];
    let err = parse_metrics(&names).unwrap_err();
    assert!(err.contains("quantum_tunneling"));
  }
}
