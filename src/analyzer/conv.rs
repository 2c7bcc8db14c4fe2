use super::hardware::HardwareModel;
use super::result::{to_seconds, ConvMemory, DataMovement, LatencyBreakdown, MemoryBreakdown, SweepPoint, TileChoice};
use super::{checked_product, checked_sum, SweepAnalyzer};
use crate::config::conv::DOCUMENT;
use crate::config::{ConvSweepConfig, ConvTile};
use crate::error::{AnalyzerError, Result};
use log::{debug, warn};

pub struct ConvAnalyzer<'a> {
  hw: &'a HardwareModel,
}

fn overflow(input_dim: u64, kernel_size: u64) -> AnalyzerError {
  AnalyzerError::invalid(
    DOCUMENT,
    "input_dimensions",
    format!(
      "byte counts for input {0}x{0} with kernel {1} overflow 64 bits",
      input_dim, kernel_size
    ),
  )
}

/// Output height/width, or `Ok(None)` when the dilated kernel is larger
/// than the padded input.
pub fn output_dim(input_dim: u64, kernel_size: u64, cfg: &ConvSweepConfig) -> Result<Option<u64>> {
  let extent = cfg
    .dilation
    .checked_mul(kernel_size - 1)
    .and_then(|e| e.checked_add(1))
    .ok_or_else(|| overflow(input_dim, kernel_size))?;
  let padded = cfg
    .padding
    .checked_mul(2)
    .and_then(|p| p.checked_add(input_dim))
    .ok_or_else(|| overflow(input_dim, kernel_size))?;
  if extent > padded {
    return Ok(None);
  }
  Ok(Some((padded - extent) / cfg.stride + 1))
}

impl<'a> ConvAnalyzer<'a> {
  pub fn new(hw: &'a HardwareModel) -> Self {
    Self { hw }
  }

  /// `None` when a byte count overflows.
  pub fn memory_requirements(input_dim: u64, kernel_size: u64, out_dim: u64, cfg: &ConvSweepConfig) -> Option<ConvMemory> {
    let elem = cfg.data_type_size;
    let input = checked_product(&[input_dim, input_dim, cfg.num_channels, elem])?;
    let kernel = checked_product(&[kernel_size, kernel_size, cfg.channels_per_group(), cfg.num_filters, elem])?;
    let output = checked_product(&[out_dim, out_dim, cfg.num_filters, elem])?;
    Some(ConvMemory {
      input,
      kernel,
      output,
      total: checked_sum(&[input, kernel, output])?,
      output_dim: out_dim,
    })
  }

  /// Bytes fetched for one convolution. Kernels stay resident, so the
  /// sliding window only multiplies input traffic.
  pub fn transfer_volume(input_dim: u64, kernel_size: u64, mem: &ConvMemory, tile: Option<ConvTile>) -> Option<u64> {
    match tile {
      Some(t) => {
        let tiles = input_dim.div_ceil(t.input_h).checked_mul(input_dim.div_ceil(t.input_w))?;
        let per_tile = mem.input / tiles;
        let input_load = checked_product(&[per_tile, tiles, kernel_size])?;
        checked_sum(&[input_load, mem.kernel, mem.output])
      },
      None => {
        let input_load = checked_product(&[mem.input, kernel_size, kernel_size])?;
        // output is read back for accumulation and written out
        checked_sum(&[input_load, mem.kernel, mem.output.checked_mul(2)?])
      },
    }
  }

  pub fn working_set(mem: &ConvMemory, tile: Option<ConvTile>, cfg: &ConvSweepConfig) -> Option<u64> {
    match tile {
      Some(t) => {
        let tile_bytes = checked_product(&[t.input_h, t.input_w, cfg.num_channels, cfg.data_type_size])?;
        Some(mem.total.min(tile_bytes))
      },
      None => Some(mem.total),
    }
  }

  /// `Ok(None)` when the kernel does not fit the padded input.
  pub fn analyze_point(
    &self,
    input_dim: u64,
    kernel_size: u64,
    tile: Option<ConvTile>,
    cfg: &ConvSweepConfig,
  ) -> Result<Option<SweepPoint>> {
    let out_dim = match output_dim(input_dim, kernel_size, cfg)? {
      Some(d) => d,
      None => return Ok(None),
    };
    let overflowed = || overflow(input_dim, kernel_size);
    let memory = Self::memory_requirements(input_dim, kernel_size, out_dim, cfg).ok_or_else(overflowed)?;
    let moved = Self::transfer_volume(input_dim, kernel_size, &memory, tile).ok_or_else(overflowed)?;

    let (dram_bytes, dram_to_central) = if self.hw.fits_central_sram(memory.total) {
      (0.0, 0)
    } else {
      (moved as f64, self.hw.transfer_cycles(moved as f64))
    };

    let working_set = Self::working_set(&memory, tile, cfg).ok_or_else(overflowed)?;
    let reloads = self.hw.reloads(working_set);
    let central_bytes = moved as f64 * reloads;
    let central_to_cgra = self.hw.transfer_cycles(central_bytes);

    let k = kernel_size as f64;
    let out = out_dim as f64;
    let operations = 2.0 * k * k * cfg.channels_per_group() as f64 * out * out * cfg.num_filters as f64;
    let latencies = LatencyBreakdown {
      dram_to_central,
      central_to_cgra,
      computation: operations,
    };

    debug!(
      "conv dim={} k={} tile={:?}: moved={} working_set={} reloads={:.2}",
      input_dim, kernel_size, tile, moved, working_set, reloads
    );

    Ok(Some(SweepPoint {
      dimension: input_dim,
      kernel_size: Some(kernel_size),
      tile: tile.map(TileChoice::Conv),
      memory: MemoryBreakdown::Conv(memory),
      latencies,
      time: to_seconds(self.hw, &latencies),
      utilization: self.hw.utilization(memory.total),
      movement: DataMovement {
        dram_to_central: dram_bytes,
        central_to_cgra: central_bytes,
        working_set,
        reloads,
      },
      operations,
      total_latency: latencies.total_cycles(),
      metrics: Default::default(),
    }))
  }
}

impl SweepAnalyzer for ConvAnalyzer<'_> {
  type Config = ConvSweepConfig;

  fn analyze(&self, config: &ConvSweepConfig) -> Result<Vec<SweepPoint>> {
    let tiles: Vec<Option<ConvTile>> = match config.tile_candidates() {
      t if t.is_empty() => vec![None],
      t => t.into_iter().map(Some).collect(),
    };

    let mut points = Vec::new();
    for &dim in &config.input_dimensions {
      for &k in &config.kernel_sizes {
        for &tile in &tiles {
          match self.analyze_point(dim, k, tile, config)? {
            Some(p) => points.push(p),
            None => warn!(
              "skipping conv input {}x{} with kernel {}: kernel exceeds padded input",
              dim, dim, k
            ),
          }
        }
      }
    }
    Ok(points)
  }
}
