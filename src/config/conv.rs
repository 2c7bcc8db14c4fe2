//! Convolution sweep document (`conv_config.yaml`).

use super::analysis::AnalysisConfig;
use super::gemm::default_vectorization;
use super::schema::{ensure_all_positive, ensure_positive, from_value, is_enabled, parse_yaml, require_keys};
use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

pub const DOCUMENT: &str = "conv config";

const REQUIRED_KEYS: &[&str] = &[
  "input_dimensions",
  "kernel_sizes",
  "num_channels",
  "num_filters",
  "data_type_size",
  "analysis.output_prefix",
];
const REQUIRED_TILING_KEYS: &[&str] = &["tiling.input_tile_size"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvSweepConfig {
  /// Square input sizes (H = W) to sweep
  pub input_dimensions: Vec<u64>,
  pub kernel_sizes: Vec<u64>,
  pub num_channels: u64,
  pub num_filters: u64,
  #[serde(default)]
  pub padding: u64,
  #[serde(default = "one")]
  pub stride: u64,
  #[serde(default = "one")]
  pub dilation: u64,
  #[serde(default = "one")]
  pub groups: u64,
  /// Bytes per element
  pub data_type_size: u64,
  #[serde(default)]
  pub tiling: ConvTiling,
  #[serde(default)]
  pub memory_pattern: ConvPattern,
  pub analysis: AnalysisConfig,
}

fn one() -> u64 {
  1
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConvTiling {
  #[serde(default)]
  pub enabled: bool,
  /// `[h, w]`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub input_tile_size: Option<[u64; 2]>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub kernel_tile_size: Option<[u64; 2]>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub channel_tile_size: Option<u64>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub filter_tile_size: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvPattern {
  #[serde(default = "default_input_layout")]
  pub input_layout: String,
  #[serde(default = "default_kernel_layout")]
  pub kernel_layout: String,
  #[serde(default = "default_vectorization")]
  pub vectorization: u64,
}

fn default_input_layout() -> String {
  "NCHW".to_string()
}

fn default_kernel_layout() -> String {
  "KCRS".to_string()
}

impl Default for ConvPattern {
  fn default() -> Self {
    Self {
      input_layout: default_input_layout(),
      kernel_layout: default_kernel_layout(),
      vectorization: default_vectorization(),
    }
  }
}

/// One convolution tiling candidate. Only the input tile shapes the cost
/// model; the other sizes are carried through to the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConvTile {
  pub input_h: u64,
  pub input_w: u64,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub kernel: Option<[u64; 2]>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub channel: Option<u64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub filter: Option<u64>,
}

impl ConvSweepConfig {
  pub fn from_yaml_str(content: &str) -> Result<Self> {
    let root = parse_yaml(DOCUMENT, content)?;
    Self::from_yaml_value(root)
  }

  pub fn from_yaml_value(root: Value) -> Result<Self> {
    require_keys(DOCUMENT, &root, REQUIRED_KEYS)?;
    if is_enabled(&root, "tiling.enabled") {
      require_keys(DOCUMENT, &root, REQUIRED_TILING_KEYS)?;
    }
    let config: ConvSweepConfig = from_value(DOCUMENT, root)?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    ensure_all_positive(DOCUMENT, "input_dimensions", &self.input_dimensions)?;
    ensure_all_positive(DOCUMENT, "kernel_sizes", &self.kernel_sizes)?;
    ensure_positive(DOCUMENT, "num_channels", self.num_channels)?;
    ensure_positive(DOCUMENT, "num_filters", self.num_filters)?;
    ensure_positive(DOCUMENT, "data_type_size", self.data_type_size)?;
    ensure_positive(DOCUMENT, "stride", self.stride)?;
    ensure_positive(DOCUMENT, "dilation", self.dilation)?;
    ensure_positive(DOCUMENT, "groups", self.groups)?;
    ensure_positive(DOCUMENT, "memory_pattern.vectorization", self.memory_pattern.vectorization)?;

    if self.num_channels % self.groups != 0 || self.num_filters % self.groups != 0 {
      return Err(AnalyzerError::invalid(
        DOCUMENT,
        "groups",
        format!(
          "{} does not divide num_channels ({}) and num_filters ({})",
          self.groups, self.num_channels, self.num_filters
        ),
      ));
    }

    if self.tiling.enabled {
      if let Some(tile) = self.tiling.input_tile_size {
        ensure_all_positive(DOCUMENT, "tiling.input_tile_size", &tile)?;
      }
      if let Some(tile) = self.tiling.kernel_tile_size {
        ensure_all_positive(DOCUMENT, "tiling.kernel_tile_size", &tile)?;
      }
      if let Some(c) = self.tiling.channel_tile_size {
        ensure_positive(DOCUMENT, "tiling.channel_tile_size", c)?;
      }
      if let Some(f) = self.tiling.filter_tile_size {
        ensure_positive(DOCUMENT, "tiling.filter_tile_size", f)?;
      }
    }

    self.analysis.validate(DOCUMENT)
  }

  /// Empty when tiling is disabled, whatever the `*_tile_size` keys hold.
  pub fn tile_candidates(&self) -> Vec<ConvTile> {
    match (self.tiling.enabled, self.tiling.input_tile_size) {
      (true, Some([h, w])) => vec![ConvTile {
        input_h: h,
        input_w: w,
        kernel: self.tiling.kernel_tile_size,
        channel: self.tiling.channel_tile_size,
        filter: self.tiling.filter_tile_size,
      }],
      _ => Vec::new(),
    }
  }

  /// Channels seen by each filter.
  pub fn channels_per_group(&self) -> u64 {
    self.num_channels / self.groups
  }
}
