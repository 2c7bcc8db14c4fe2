use crate::config::hardware::{KB, MB};
use crate::config::HardwareProfile;
use serde::{Deserialize, Serialize};

const MHZ: f64 = 1e6;

/// Hardware profile in the analyzer's units: bytes, cycles and Hz.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareModel {
  pub dram_size: u64,
  pub central_sram_size: u64,
  pub cgra_sram_size: u64,

  pub dram_latency: u64,
  pub central_sram_latency: u64,
  pub cgra_sram_latency: u64,

  /// Bytes per bus cycle
  pub dma_transfer_rate: u64,
  pub bits_per_cycle: u64,

  pub bus_frequency_hz: f64,
  pub cgra_frequency_hz: f64,
}

/// Fraction of each tier a footprint would occupy, capped at 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Utilization {
  pub cgra_sram: f64,
  pub central_sram: f64,
  pub dram: f64,
}

impl From<&HardwareProfile> for HardwareModel {
  fn from(hw: &HardwareProfile) -> Self {
    Self {
      // validated profiles never saturate
      dram_size: hw.dram.size.saturating_mul(MB),
      central_sram_size: hw.central_sram.size.saturating_mul(KB),
      cgra_sram_size: hw.cgra_sram.size.saturating_mul(KB),
      dram_latency: hw.dram.latency,
      central_sram_latency: hw.central_sram.latency,
      cgra_sram_latency: hw.cgra_sram.latency,
      dma_transfer_rate: hw.dma.transfer_rate,
      bits_per_cycle: hw.bits_per_cycle,
      bus_frequency_hz: hw.bus_frequency * MHZ,
      cgra_frequency_hz: hw.cgra_frequency * MHZ,
    }
  }
}

impl HardwareModel {
  pub fn utilization(&self, total_bytes: u64) -> Utilization {
    let frac = |size: u64| (total_bytes as f64 / size as f64).min(1.0);
    Utilization {
      cgra_sram: frac(self.cgra_sram_size),
      central_sram: frac(self.central_sram_size),
      dram: frac(self.dram_size),
    }
  }

  /// Bus cycles the DMA engine needs to move `bytes`.
  pub fn transfer_cycles(&self, bytes: f64) -> u64 {
    (bytes / self.dma_transfer_rate as f64).ceil() as u64
  }

  pub fn fits_central_sram(&self, bytes: u64) -> bool {
    bytes <= self.central_sram_size
  }

  /// Passes of the working set through the CGRA-local SRAM, at least one.
  pub fn reloads(&self, working_set: u64) -> f64 {
    (working_set as f64 / self.cgra_sram_size as f64).max(1.0)
  }

  pub fn bus_seconds(&self, cycles: f64) -> f64 {
    cycles / self.bus_frequency_hz
  }

  pub fn cgra_seconds(&self, cycles: f64) -> f64 {
    cycles / self.cgra_frequency_hz
  }

  /// Bytes the bus can carry in `cycles`.
  pub fn bus_capacity(&self, cycles: u64) -> f64 {
    cycles as f64 * self.bits_per_cycle as f64 / 8.0
  }
}
