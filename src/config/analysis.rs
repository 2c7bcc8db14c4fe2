use super::metrics::{parse_metrics, Metric};
use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};

/// `analysis` section shared by both sweep documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
  pub output_prefix: String,
  #[serde(default)]
  pub save_detailed_results: bool,
  /// Raw names; checked against [`Metric`] during validation.
  #[serde(default)]
  pub metrics: Vec<String>,
}

impl AnalysisConfig {
  pub fn validate(&self, document: &str) -> Result<()> {
    if self.output_prefix.trim().is_empty() {
      return Err(AnalyzerError::invalid(document, "analysis.output_prefix", "must not be empty"));
    }
    if self.output_prefix.contains(['/', '\\']) {
      return Err(AnalyzerError::invalid(
        document,
        "analysis.output_prefix",
        "must be a file name prefix, not a path",
      ));
    }
    parse_metrics(&self.metrics).map_err(|e| AnalyzerError::invalid(document, "analysis.metrics", e))?;
    Ok(())
  }

  /// Metrics in declaration order. Unknown names were rejected by `validate`.
  pub fn selected_metrics(&self) -> Vec<Metric> {
    parse_metrics(&self.metrics).unwrap_or_default()
  }
}
