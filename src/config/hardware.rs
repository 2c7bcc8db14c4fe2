//! Hardware profile document (`hardware_config.yaml`).
//!
//! Units as written in the document: `dram.size` in MB, SRAM sizes in KB,
//! frequencies in MHz, latencies in cycles and `dma.transfer_rate` in bytes
//! per bus cycle. Fields without a consumer yet are kept as optional slots so
//! they still parse and round-trip.

use super::schema::{ensure_positive, ensure_positive_f64, from_value, parse_yaml, require_keys};
use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub const DOCUMENT: &str = "hardware config";

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * 1024;

const REQUIRED_KEYS: &[&str] = &[
  "hardware.bits_per_cycle",
  "hardware.bus_frequency",
  "hardware.cgra_frequency",
  "hardware.dram.size",
  "hardware.dram.latency",
  "hardware.central_sram.size",
  "hardware.central_sram.latency",
  "hardware.cgra_sram.size",
  "hardware.cgra_sram.latency",
  "hardware.dma.transfer_rate",
];

/// File wrapper: everything lives under the `hardware` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareDocument {
  pub hardware: HardwareProfile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HardwareProfile {
  pub bits_per_cycle: u64,
  /// MHz
  pub bus_frequency: f64,
  /// MHz
  pub cgra_frequency: f64,

  // not used yet
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub array_size: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory_size: Option<Value>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub interconnect: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory_hierarchy: Option<Vec<String>>,

  pub dram: MemoryTier,
  pub central_sram: MemoryTier,
  pub cgra_sram: MemoryTier,
  pub dma: DmaConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTier {
  pub size: u64,
  pub latency: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub bandwidth: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DmaConfig {
  /// Bytes moved per bus cycle
  pub transfer_rate: u64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub burst_size: Option<u64>,
}

impl HardwareProfile {
  pub fn from_yaml_str(content: &str) -> Result<Self> {
    let root = parse_yaml(DOCUMENT, content)?;
    Self::from_yaml_value(root)
  }

  pub fn from_yaml_value(root: Value) -> Result<Self> {
    require_keys(DOCUMENT, &root, REQUIRED_KEYS)?;
    let doc: HardwareDocument = from_value(DOCUMENT, root)?;
    doc.hardware.validate()?;
    Ok(doc.hardware)
  }

  pub fn to_yaml_string(&self) -> Result<String> {
    let doc = HardwareDocument { hardware: self.clone() };
    serde_yaml::to_string(&doc).map_err(|e| AnalyzerError::parse(DOCUMENT, e))
  }

  pub fn validate(&self) -> Result<()> {
    ensure_positive(DOCUMENT, "hardware.bits_per_cycle", self.bits_per_cycle)?;
    ensure_positive_f64(DOCUMENT, "hardware.bus_frequency", self.bus_frequency)?;
    ensure_positive_f64(DOCUMENT, "hardware.cgra_frequency", self.cgra_frequency)?;
    ensure_positive(DOCUMENT, "hardware.dram.size", self.dram.size)?;
    ensure_positive(DOCUMENT, "hardware.central_sram.size", self.central_sram.size)?;
    ensure_positive(DOCUMENT, "hardware.cgra_sram.size", self.cgra_sram.size)?;
    ensure_positive(DOCUMENT, "hardware.dma.transfer_rate", self.dma.transfer_rate)?;
    ensure_bytes_fit("hardware.dram.size", self.dram.size, MB, "MB")?;
    ensure_bytes_fit("hardware.central_sram.size", self.central_sram.size, KB, "KB")?;
    ensure_bytes_fit("hardware.cgra_sram.size", self.cgra_sram.size, KB, "KB")?;
    Ok(())
  }
}

fn ensure_bytes_fit(field: &str, size: u64, unit: u64, unit_name: &str) -> Result<()> {
  if size.checked_mul(unit).is_none() {
    return Err(AnalyzerError::invalid(
      DOCUMENT,
      field,
      format!("{} {} does not fit in a 64-bit byte count", size, unit_name),
    ));
  }
  Ok(())
}
