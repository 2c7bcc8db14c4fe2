use super::analysis::AnalysisConfig;
use super::conv::ConvSweepConfig;
use super::gemm::GemmSweepConfig;
use super::hardware::HardwareProfile;
use super::operation::Operation;
use super::schema::{has_key, parse_yaml};
use crate::error::{AnalyzerError, Result};
use log::{debug, info};
use serde_yaml::Value;
use std::fs;
use std::path::Path;

/// Sweep document matching the requested operation.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationConfig {
  Gemm(GemmSweepConfig),
  Conv(ConvSweepConfig),
}

impl OperationConfig {
  pub fn operation(&self) -> Operation {
    match self {
      OperationConfig::Gemm(_) => Operation::Gemm,
      OperationConfig::Conv(_) => Operation::Conv,
    }
  }

  pub fn analysis(&self) -> &AnalysisConfig {
    match self {
      OperationConfig::Gemm(c) => &c.analysis,
      OperationConfig::Conv(c) => &c.analysis,
    }
  }
}

/// Everything one invocation reads before analysis starts.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfigs {
  pub hardware: HardwareProfile,
  pub op: OperationConfig,
}

fn read_document(path: &Path) -> Result<String> {
  fs::read_to_string(path).map_err(|source| AnalyzerError::Io {
    path: path.to_path_buf(),
    source,
  })
}

/// Which sweep a document describes, judged by its marker keys. `None` when
/// it carries neither; a document carrying both fits no schema.
pub fn detect_operation(document: &str, root: &Value) -> Result<Option<Operation>> {
  let gemm = has_key(root, Operation::Gemm.marker_key());
  let conv = has_key(root, Operation::Conv.marker_key());
  match (gemm, conv) {
    (true, false) => Ok(Some(Operation::Gemm)),
    (false, true) => Ok(Some(Operation::Conv)),
    (false, false) => Ok(None),
    (true, true) => Err(AnalyzerError::schema(
      document,
      format!(
        "document carries both `{}` and `{}`; it cannot be a gemm and a conv sweep at once",
        Operation::Gemm.marker_key(),
        Operation::Conv.marker_key()
      ),
    )),
  }
}

pub fn parse_operation_config(operation: Operation, content: &str) -> Result<OperationConfig> {
  let document = format!("{} config", operation);
  let root = parse_yaml(&document, content)?;

  if let Some(found) = detect_operation(&document, &root)? {
    if found != operation {
      return Err(AnalyzerError::schema(
        document,
        format!("document describes a {} sweep but --operation {} was given", found, operation),
      ));
    }
  }

  match operation {
    Operation::Gemm => GemmSweepConfig::from_yaml_value(root).map(OperationConfig::Gemm),
    Operation::Conv => ConvSweepConfig::from_yaml_value(root).map(OperationConfig::Conv),
  }
}

pub fn load_hardware(path: &Path) -> Result<HardwareProfile> {
  debug!("loading hardware config from {:?}", path);
  let content = read_document(path)?;
  HardwareProfile::from_yaml_str(&content)
}

pub fn load_operation(operation: Operation, path: &Path) -> Result<OperationConfig> {
  debug!("loading {} config from {:?}", operation, path);
  let content = read_document(path)?;
  parse_operation_config(operation, &content)
}

/// Load and validate the hardware profile and the sweep for `operation`.
pub fn load_configs(hw_path: &Path, operation: Operation, op_path: &Path) -> Result<LoadedConfigs> {
  let hardware = load_hardware(hw_path)?;
  let op = load_operation(operation, op_path)?;
  info!(
    "loaded hardware config {:?} and {} config {:?}",
    hw_path, operation, op_path
  );
  Ok(LoadedConfigs { hardware, op })
}

#[cfg(test)]
mod tests {
  use super::*;

  const GEMM: &str = r#"
dimensions: [32, 64]
data_type: { size: 4, type: float32 }
analysis: { output_prefix: gemm_analysis }
"#;

  const CONV: &str = r#"
input_dimensions: [16]
kernel_sizes: [3]
num_channels: 1
num_filters: 1
data_type_size: 4
analysis: { output_prefix: conv_analysis }
"#;

  #[test]
  fn test_detect_operation() {
    let detect = |doc: &str| detect_operation("t", &parse_yaml("t", doc).unwrap()).unwrap();
    assert_eq!(detect(GEMM), Some(Operation::Gemm));
    assert_eq!(detect(CONV), Some(Operation::Conv));
    assert_eq!(detect("foo: 1"), None);
  }

  #[test]
  fn test_both_markers_rejected_under_either_operation() {
    let both = format!("{}\ndimensions: [32]\ndata_type: {{ size: 4 }}\n", CONV);
    for op in [Operation::Gemm, Operation::Conv] {
      let err = parse_operation_config(op, &both).unwrap_err();
      assert!(err.is_schema_mismatch());
      assert!(err.to_string().contains("input_dimensions"));
    }
  }

  #[test]
  fn test_gemm_config_under_conv_rejected() {
    let err = parse_operation_config(Operation::Conv, GEMM).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert!(err.to_string().contains("gemm sweep"));
  }

  #[test]
  fn test_conv_config_under_gemm_rejected() {
    let err = parse_operation_config(Operation::Gemm, CONV).unwrap_err();
    assert!(err.is_schema_mismatch());
  }

  #[test]
  fn test_matching_operation_loads() {
    let cfg = parse_operation_config(Operation::Gemm, GEMM).unwrap();
    assert_eq!(cfg.operation(), Operation::Gemm);
    assert_eq!(cfg.analysis().output_prefix, "gemm_analysis");
  }

  #[test]
  fn test_missing_file_is_io_error() {
    let err = load_hardware(Path::new("/nonexistent/hardware_config.yaml")).unwrap_err();
    assert!(matches!(err, AnalyzerError::Io { .. }));
  }
}
