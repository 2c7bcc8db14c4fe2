//! GEMM sweep document (`gemm_config.yaml`).

use super::analysis::AnalysisConfig;
use super::schema::{ensure_all_positive, ensure_positive, from_value, is_enabled, parse_yaml, require_keys};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub const DOCUMENT: &str = "gemm config";

const REQUIRED_KEYS: &[&str] = &["dimensions", "data_type.size", "analysis.output_prefix"];
const REQUIRED_TILING_KEYS: &[&str] = &["tiling.tile_sizes.M", "tiling.tile_sizes.N", "tiling.tile_sizes.K"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GemmSweepConfig {
  /// Square matrix sizes to sweep
  pub dimensions: Vec<u64>,
  pub data_type: DataType,
  #[serde(default)]
  pub tiling: GemmTiling,
  #[serde(default)]
  pub memory_pattern: MatrixPattern,
  pub analysis: AnalysisConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataType {
  /// Bytes per element
  pub size: u64,
  #[serde(rename = "type", default = "default_element_type")]
  pub kind: String,
}

fn default_element_type() -> String {
  "float32".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GemmTiling {
  #[serde(default)]
  pub enabled: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub tile_sizes: Option<TileSizes>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSizes {
  #[serde(rename = "M")]
  pub m: Vec<u64>,
  #[serde(rename = "N")]
  pub n: Vec<u64>,
  #[serde(rename = "K")]
  pub k: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixPattern {
  #[serde(default = "default_matrix_layout")]
  pub matrix_layout: String,
  #[serde(default = "default_vectorization")]
  pub vectorization: u64,
}

fn default_matrix_layout() -> String {
  "row_major".to_string()
}

pub(crate) fn default_vectorization() -> u64 {
  4
}

impl Default for MatrixPattern {
  fn default() -> Self {
    Self {
      matrix_layout: default_matrix_layout(),
      vectorization: default_vectorization(),
    }
  }
}

/// One `(M, N, K)` tile-size candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemmTile {
  pub m: u64,
  pub n: u64,
  pub k: u64,
}

impl GemmSweepConfig {
  pub fn from_yaml_str(content: &str) -> Result<Self> {
    let root = parse_yaml(DOCUMENT, content)?;
    Self::from_yaml_value(root)
  }

  pub fn from_yaml_value(root: Value) -> Result<Self> {
    require_keys(DOCUMENT, &root, REQUIRED_KEYS)?;
    if is_enabled(&root, "tiling.enabled") {
      require_keys(DOCUMENT, &root, REQUIRED_TILING_KEYS)?;
    }
    let config: GemmSweepConfig = from_value(DOCUMENT, root)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    ensure_all_positive(DOCUMENT, "dimensions", &self.dimensions)?;
    ensure_positive(DOCUMENT, "data_type.size", self.data_type.size)?;
    ensure_positive(DOCUMENT, "memory_pattern.vectorization", self.memory_pattern.vectorization)?;
    if self.tiling.enabled {
      if let Some(ts) = &self.tiling.tile_sizes {
        ensure_all_positive(DOCUMENT, "tiling.tile_sizes.M", &ts.m)?;
        ensure_all_positive(DOCUMENT, "tiling.tile_sizes.N", &ts.n)?;
        ensure_all_positive(DOCUMENT, "tiling.tile_sizes.K", &ts.k)?;
      }
    }
    self.analysis.validate(DOCUMENT)
  }

  /// Tile candidates as the `M × N × K` cross product, M outermost.
  /// Empty when tiling is disabled, whatever `tile_sizes` lists.
  pub fn tile_candidates(&self) -> Vec<GemmTile> {
    let ts = match (&self.tiling.enabled, &self.tiling.tile_sizes) {
      (true, Some(ts)) => ts,
      _ => return Vec::new(),
    };
    let mut tiles = Vec::with_capacity(ts.m.len() * ts.n.len() * ts.k.len());
    for &m in &ts.m {
      for &n in &ts.n {
        for &k in &ts.k {
          tiles.push(GemmTile { m, n, k });
        }
      }
    }
    tiles
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
dimensions: [32, 64, 128, 512, 1024]
data_type:
  size: 4
  type: float32
tiling:
  enabled: true
  tile_sizes:
    M: [32, 64, 128]
    N: [32, 64]
    K: [32]
memory_pattern:
  matrix_layout: row_major
  vectorization: 4
analysis:
  output_prefix: gemm_analysis
  save_detailed_results: true
  metrics: [latency, memory_utilization]
"#;

  #[test]
  fn test_dimensions_and_tiles_in_order() {
    let cfg = GemmSweepConfig::from_yaml_str(SAMPLE).unwrap();
    assert_eq!(cfg.dimensions, vec![32, 64, 128, 512, 1024]);
    assert_eq!(cfg.tiling.tile_sizes.as_ref().unwrap().m, vec![32, 64, 128]);
    assert_eq!(cfg.data_type.kind, "float32");
  }

  #[test]
  fn test_tile_cross_product() {
    let cfg = GemmSweepConfig::from_yaml_str(SAMPLE).unwrap();
    let tiles = cfg.tile_candidates();
    assert_eq!(tiles.len(), 6);
    assert_eq!(tiles[0], GemmTile { m: 32, n: 32, k: 32 });
    assert_eq!(tiles[1], GemmTile { m: 32, n: 64, k: 32 });
    assert_eq!(tiles[5], GemmTile { m: 128, n: 64, k: 32 });
  }

  #[test]
  fn test_disabled_tiling_has_no_candidates() {
    let doc = SAMPLE.replace("enabled: true", "enabled: false");
    let cfg = GemmSweepConfig::from_yaml_str(&doc).unwrap();
    assert!(cfg.tiling.tile_sizes.is_some());
    assert!(cfg.tile_candidates().is_empty());
  }

  #[test]
  fn test_enabled_tiling_requires_tile_sizes() {
    let doc = SAMPLE.replace("    K: [32]\n", "");
    let err = GemmSweepConfig::from_yaml_str(&doc).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert!(err.to_string().contains("tiling.tile_sizes.K"));
  }

  #[test]
  fn test_defaults_for_optional_sections() {
    let doc = r#"
dimensions: [16]
data_type:
  size: 2
analysis:
  output_prefix: small
"#;
    let cfg = GemmSweepConfig::from_yaml_str(doc).unwrap();
    assert!(!cfg.tiling.enabled);
    assert!(!cfg.analysis.save_detailed_results);
    assert_eq!(cfg.memory_pattern, MatrixPattern::default());
    assert!(cfg.analysis.metrics.is_empty());
  }

  #[test]
  fn test_zero_dimension_rejected() {
    let doc = SAMPLE.replace("[32, 64, 128, 512, 1024]", "[32, 0]");
    assert!(GemmSweepConfig::from_yaml_str(&doc).unwrap_err().is_validation());
  }
}
