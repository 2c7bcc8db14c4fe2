//! Tool settings: which documents to load and where artifacts go.

use super::operation::Operation;
use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS: &str = include_str!("default.toml");

/// Document paths. Empty means "not set by this layer".
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PathsSection {
  #[serde(default)]
  pub hw_config: String,
  #[serde(default)]
  pub op_config: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AnalysisSection {
  #[serde(default)]
  pub operation: Option<Operation>,
  #[serde(default)]
  pub output_dir: String,
  #[serde(default)]
  pub quiet: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
  #[serde(default)]
  pub paths: PathsSection,
  #[serde(default)]
  pub analysis: AnalysisSection,
}

impl AppConfig {
  /// Only valid after `validate_config` succeeded.
  pub fn operation(&self) -> Operation {
    self.analysis.operation.unwrap_or(Operation::Gemm)
  }

  pub fn hw_config_path(&self) -> PathBuf {
    PathBuf::from(&self.paths.hw_config)
  }

  pub fn op_config_path(&self) -> PathBuf {
    PathBuf::from(&self.paths.op_config)
  }

  pub fn output_dir(&self) -> PathBuf {
    PathBuf::from(&self.analysis.output_dir)
  }
}

/// Command-line values that take precedence over every settings file.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
  pub hw_config: Option<String>,
  pub operation: Option<Operation>,
  pub op_config: Option<String>,
  pub output_dir: Option<String>,
  pub quiet: bool,
}

pub fn load_default_config() -> Result<AppConfig> {
  toml::from_str::<AppConfig>(DEFAULT_SETTINGS)
    .map_err(|e| AnalyzerError::Settings(format!("built-in defaults are invalid: {}", e)))
}

/// Load a settings file. Relative paths inside it are taken relative to the
/// file's own directory.
pub fn load_config_file(path: &Path) -> Result<AppConfig> {
  let content = fs::read_to_string(path).map_err(|source| AnalyzerError::Io {
    path: path.to_path_buf(),
    source,
  })?;

  let mut config = toml::from_str::<AppConfig>(&content)
    .map_err(|e| AnalyzerError::Settings(format!("cannot parse {:?}: {}", path, e)))?;

  if let Some(base) = path.parent() {
    resolve_paths(&mut config, base);
  }
  Ok(config)
}

/// Merge two settings layers; set fields of `override_config` win.
pub fn merge_config(mut base: AppConfig, override_config: AppConfig) -> AppConfig {
  if !override_config.paths.hw_config.is_empty() {
    base.paths.hw_config = override_config.paths.hw_config;
  }
  if !override_config.paths.op_config.is_empty() {
    base.paths.op_config = override_config.paths.op_config;
  }

  if override_config.analysis.operation.is_some() {
    base.analysis.operation = override_config.analysis.operation;
  }
  if !override_config.analysis.output_dir.is_empty() {
    base.analysis.output_dir = override_config.analysis.output_dir;
  }
  if override_config.analysis.quiet {
    base.analysis.quiet = true;
  }

  base
}

pub fn apply_cli_overrides(config: &mut AppConfig, cli: &CliOverrides) {
  if let Some(path) = &cli.hw_config {
    config.paths.hw_config = path.clone();
  }
  if let Some(path) = &cli.op_config {
    config.paths.op_config = path.clone();
  }
  if let Some(op) = cli.operation {
    config.analysis.operation = Some(op);
  }
  if let Some(dir) = &cli.output_dir {
    config.analysis.output_dir = dir.clone();
  }
  if cli.quiet {
    config.analysis.quiet = true;
  }
}

pub fn validate_config(config: &AppConfig) -> Result<()> {
  if config.paths.hw_config.trim().is_empty() {
    return Err(AnalyzerError::Settings("hw_config cannot be empty".to_string()));
  }
  if config.paths.op_config.trim().is_empty() {
    return Err(AnalyzerError::Settings("op_config cannot be empty".to_string()));
  }
  if config.analysis.operation.is_none() {
    return Err(AnalyzerError::Settings(
      "operation must be set to gemm or conv".to_string(),
    ));
  }
  if config.analysis.output_dir.trim().is_empty() {
    return Err(AnalyzerError::Settings("output_dir cannot be empty".to_string()));
  }
  Ok(())
}

fn resolve_paths(config: &mut AppConfig, base: &Path) {
  config.paths.hw_config = resolve_single_path(&config.paths.hw_config, base);
  config.paths.op_config = resolve_single_path(&config.paths.op_config, base);
  config.analysis.output_dir = resolve_single_path(&config.analysis.output_dir, base);
}

fn resolve_single_path(path_str: &str, base: &Path) -> String {
  if path_str.is_empty() {
    return String::new();
  }
  let path = Path::new(path_str);
  if path.is_absolute() || base.as_os_str().is_empty() {
    return path_str.to_string();
  }
  base.join(path).to_string_lossy().to_string()
}

/// Defaults, then the optional settings file, then CLI flags; validated.
pub fn load_and_merge_configs(custom_config_path: Option<&Path>, cli: &CliOverrides) -> Result<AppConfig> {
  let mut config = load_default_config()?;

  if let Some(path) = custom_config_path {
    let custom = load_config_file(path)?;
    config = merge_config(config, custom);
  }

  apply_cli_overrides(&mut config, cli);
  validate_config(&config)?;

  Ok(config)
}
