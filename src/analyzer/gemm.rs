use super::hardware::HardwareModel;
use super::result::{to_seconds, DataMovement, GemmMemory, LatencyBreakdown, MemoryBreakdown, SweepPoint, TileChoice};
use super::{checked_product, checked_sum, SweepAnalyzer};
use crate::config::gemm::DOCUMENT;
use crate::config::{GemmSweepConfig, GemmTile};
use crate::error::{AnalyzerError, Result};
use log::debug;

/// Arithmetic operations the CGRA retires per cycle.
pub const OPS_PER_CYCLE: f64 = 4.0;

/// Bytes moved for each operand of one GEMM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GemmTransfers {
  pub a_load: u64,
  pub b_load: u64,
  pub c_load: u64,
  pub c_store: u64,
}

impl GemmTransfers {
  pub fn total(&self) -> Option<u64> {
    checked_sum(&[self.a_load, self.b_load, self.c_load, self.c_store])
  }
}

pub struct GemmAnalyzer<'a> {
  hw: &'a HardwareModel,
}

impl<'a> GemmAnalyzer<'a> {
  pub fn new(hw: &'a HardwareModel) -> Self {
    Self { hw }
  }

  /// `None` when a byte count overflows.
  pub fn memory_requirements(dim: u64, elem: u64) -> Option<GemmMemory> {
    let per_matrix = checked_product(&[dim, dim, elem])?;
    Some(GemmMemory {
      per_matrix,
      input_a: per_matrix,
      input_b: per_matrix,
      output: per_matrix,
      total: per_matrix.checked_mul(3)?,
    })
  }

  /// Every tile of A is fetched once per K strip, every tile of B once per
  /// M strip, and C is loaded and stored once.
  pub fn transfers(dim: u64, elem: u64, tile: Option<GemmTile>) -> Option<GemmTransfers> {
    match tile {
      Some(t) => {
        let tiles_m = dim.div_ceil(t.m);
        let tiles_n = dim.div_ceil(t.n);
        let tiles_k = dim.div_ceil(t.k);
        let c = checked_product(&[t.m, t.n, elem, tiles_m, tiles_n])?;
        Some(GemmTransfers {
          a_load: checked_product(&[t.m, t.k, elem, tiles_m, tiles_k])?,
          b_load: checked_product(&[t.k, t.n, elem, tiles_k, tiles_n])?,
          c_load: c,
          c_store: c,
        })
      },
      None => {
        let matrix = checked_product(&[dim, dim, elem])?;
        Some(GemmTransfers {
          a_load: matrix,
          b_load: matrix,
          c_load: matrix,
          c_store: matrix,
        })
      },
    }
  }

  pub fn working_set(total: u64, elem: u64, tile: Option<GemmTile>) -> Option<u64> {
    match tile {
      Some(t) => {
        let elements = checked_sum(&[
          t.m.checked_mul(t.k)?,
          t.k.checked_mul(t.n)?,
          t.m.checked_mul(t.n)?,
        ])?;
        elements.checked_mul(elem)
      },
      None => Some(total),
    }
  }

  /// `None` when a byte count of this point overflows.
  pub fn analyze_point(&self, dim: u64, elem: u64, tile: Option<GemmTile>) -> Option<SweepPoint> {
    let memory = Self::memory_requirements(dim, elem)?;
    let transfers = Self::transfers(dim, elem, tile)?;
    let moved = transfers.total()?;

    let (dram_bytes, dram_to_central) = if self.hw.fits_central_sram(memory.total) {
      (0.0, 0)
    } else {
      (moved as f64, self.hw.transfer_cycles(moved as f64))
    };

    let working_set = Self::working_set(memory.total, elem, tile)?;
    let reloads = self.hw.reloads(working_set);
    let central_bytes = moved as f64 * reloads;
    let central_to_cgra = self.hw.transfer_cycles(central_bytes);

    let operations = 2.0 * (dim as f64).powi(3);
    let latencies = LatencyBreakdown {
      dram_to_central,
      central_to_cgra,
      computation: operations / OPS_PER_CYCLE,
    };

    debug!(
      "gemm dim={} tile={:?}: a={} b={} c={} working_set={} reloads={:.2}",
      dim, tile, transfers.a_load, transfers.b_load, transfers.c_load, working_set, reloads
    );

    Some(SweepPoint {
      dimension: dim,
      kernel_size: None,
      tile: tile.map(TileChoice::Gemm),
      memory: MemoryBreakdown::Gemm(memory),
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
    })
  }
}

fn overflow(dim: u64, tile: Option<GemmTile>) -> AnalyzerError {
  let message = match tile {
    Some(t) => format!(
      "byte counts for dimension {} with tile {}x{}x{} overflow 64 bits",
      dim, t.m, t.n, t.k
    ),
    None => format!("byte counts for dimension {} overflow 64 bits", dim),
  };
  AnalyzerError::invalid(DOCUMENT, "dimensions", message)
}

impl SweepAnalyzer for GemmAnalyzer<'_> {
  type Config = GemmSweepConfig;

  fn analyze(&self, config: &GemmSweepConfig) -> Result<Vec<SweepPoint>> {
    let elem = config.data_type.size;
    let tiles: Vec<Option<GemmTile>> = match config.tile_candidates() {
      t if t.is_empty() => vec![None],
      t => t.into_iter().map(Some).collect(),
    };
    let mut points = Vec::with_capacity(config.dimensions.len() * tiles.len());

    for &dim in &config.dimensions {
      for &tile in &tiles {
        let point = self.analyze_point(dim, elem, tile).ok_or_else(|| overflow(dim, tile))?;
        points.push(point);
      }
    }
    Ok(points)
  }
}
