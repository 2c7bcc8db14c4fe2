use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzerError {
  #[error("cannot read {path:?}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The document is not well-formed YAML.
  #[error("malformed config {document}: {message}")]
  ConfigParse { document: String, message: String },

  /// Required keys are absent, a field has the wrong shape, or the
  /// document does not describe the requested operation.
  #[error("schema mismatch in {document}: {message}")]
  SchemaMismatch { document: String, message: String },

  #[error("invalid value in {document}: {field}: {message}")]
  Validation {
    document: String,
    field: String,
    message: String,
  },

  #[error("settings error: {0}")]
  Settings(String),

  #[error("failed to write {path:?}: {message}")]
  Output { path: PathBuf, message: String },
}

impl AnalyzerError {
  pub fn parse(document: impl Into<String>, message: impl ToString) -> Self {
    Self::ConfigParse {
      document: document.into(),
      message: message.to_string(),
    }
  }

  pub fn schema(document: impl Into<String>, message: impl Into<String>) -> Self {
    Self::SchemaMismatch {
      document: document.into(),
      message: message.into(),
    }
  }

  pub fn invalid(document: impl Into<String>, field: impl Into<String>, message: impl Into<String>) -> Self {
    Self::Validation {
      document: document.into(),
      field: field.into(),
      message: message.into(),
    }
  }

  pub fn is_schema_mismatch(&self) -> bool {
    matches!(self, Self::SchemaMismatch { .. })
  }

  pub fn is_config_parse(&self) -> bool {
    matches!(self, Self::ConfigParse { .. })
  }

  pub fn is_validation(&self) -> bool {
    matches!(self, Self::Validation { .. })
  }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_schema_display_names_document() {
    let err = AnalyzerError::schema("hardware", "missing key `hardware.bus_frequency`");
    let s = err.to_string();
    assert!(s.contains("hardware"));
    assert!(s.contains("hardware.bus_frequency"));
    assert!(err.is_schema_mismatch());
    assert!(!err.is_config_parse());
  }

  #[test]
  fn test_validation_display() {
    let err = AnalyzerError::invalid("gemm", "analysis.metrics", "unknown metric `quantum_tunneling`");
    assert!(err.to_string().contains("analysis.metrics"));
    assert!(err.is_validation());
  }
}
