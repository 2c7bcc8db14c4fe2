use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kernel selected with `--operation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
  Gemm,
  Conv,
}

impl Operation {
  pub fn as_str(&self) -> &'static str {
    match self {
      Operation::Gemm => "gemm",
      Operation::Conv => "conv",
    }
  }

  /// Top-level key that only this operation's sweep document carries.
  pub fn marker_key(&self) -> &'static str {
    match self {
      Operation::Gemm => "dimensions",
      Operation::Conv => "input_dimensions",
    }
  }
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Operation {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_lowercase().as_str() {
      "gemm" => Ok(Operation::Gemm),
      "conv" => Ok(Operation::Conv),
      other => Err(format!("unsupported operation: {} (expected gemm or conv)", other)),
    }
  }
}
