//! Helpers shared by the document loaders: YAML parsing, dotted key lookup
//! and typed conversion with errors mapped onto the loader's error kinds.

use crate::error::{AnalyzerError, Result};
use serde::de::DeserializeOwned;
use serde_yaml::Value;

/// Parse raw text into an untyped YAML tree.
pub fn parse_yaml(document: &str, content: &str) -> Result<Value> {
  let value: Value = serde_yaml::from_str(content).map_err(|e| AnalyzerError::parse(document, e))?;
  match value {
    Value::Mapping(_) => Ok(value),
    Value::Null => Err(AnalyzerError::parse(document, "document is empty")),
    _ => Err(AnalyzerError::parse(document, "top level must be a mapping")),
  }
}

/// Look up a dotted path such as `hardware.dram.size`.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
  path.split('.').try_fold(root, |node, key| match node {
    Value::Mapping(map) => map.get(key),
    _ => None,
  })
}

pub fn has_key(root: &Value, path: &str) -> bool {
  matches!(lookup(root, path), Some(v) if !v.is_null())
}

/// Fail with a schema mismatch naming every absent key.
pub fn require_keys(document: &str, root: &Value, keys: &[&str]) -> Result<()> {
  let missing: Vec<&str> = keys.iter().copied().filter(|k| !has_key(root, k)).collect();
  if missing.is_empty() {
    return Ok(());
  }
  let list = missing.iter().map(|k| format!("`{}`", k)).collect::<Vec<_>>().join(", ");
  Err(AnalyzerError::schema(document, format!("missing required key(s): {}", list)))
}

pub fn is_enabled(root: &Value, path: &str) -> bool {
  matches!(lookup(root, path), Some(Value::Bool(true)))
}

/// Convert an already shape-checked tree into its typed form.
pub fn from_value<T: DeserializeOwned>(document: &str, value: Value) -> Result<T> {
  serde_yaml::from_value(value).map_err(|e| AnalyzerError::schema(document, e.to_string()))
}

pub fn ensure_positive(document: &str, field: &str, value: u64) -> Result<()> {
  if value == 0 {
    return Err(AnalyzerError::invalid(document, field, "must be greater than zero"));
  }
  Ok(())
}

pub fn ensure_positive_f64(document: &str, field: &str, value: f64) -> Result<()> {
  if !value.is_finite() || value <= 0.0 {
    return Err(AnalyzerError::invalid(
      document,
      field,
      format!("must be a positive number, got {}", value),
    ));
  }
  Ok(())
}

pub fn ensure_all_positive(document: &str, field: &str, values: &[u64]) -> Result<()> {
  if values.is_empty() {
    return Err(AnalyzerError::invalid(document, field, "must not be empty"));
  }
  for (i, v) in values.iter().enumerate() {
    ensure_positive(document, &format!("{}[{}]", field, i), *v)?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  const DOC: &str = r#"
hardware:
  bus_frequency: 100
  dram:
    size: 32
    bandwidth: ~
"#;

  #[test]
  fn test_lookup_dotted_path() {
    let root = parse_yaml("test", DOC).unwrap();
    assert_eq!(lookup(&root, "hardware.dram.size").and_then(Value::as_u64), Some(32));
    assert!(lookup(&root, "hardware.sram.size").is_none());
    assert!(lookup(&root, "hardware.bus_frequency.x").is_none());
  }

  #[test]
  fn test_null_counts_as_missing() {
    let root = parse_yaml("test", DOC).unwrap();
    assert!(!has_key(&root, "hardware.dram.bandwidth"));
    let err = require_keys("test", &root, &["hardware.dram.size", "hardware.dram.bandwidth"]).unwrap_err();
    assert!(err.is_schema_mismatch());
    assert!(err.to_string().contains("hardware.dram.bandwidth"));
  }

  #[test]
  fn test_malformed_yaml_is_parse_error() {
    let err = parse_yaml("test", "hardware: [1, 2").unwrap_err();
    assert!(err.is_config_parse());
    assert!(parse_yaml("test", "").unwrap_err().is_config_parse());
    assert!(parse_yaml("test", "- 1\n- 2\n").unwrap_err().is_config_parse());
  }
}
