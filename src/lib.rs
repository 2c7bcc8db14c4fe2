pub mod analyzer;
pub mod config;
pub mod error;
pub mod runner;
pub mod utils;

pub use config::{Metric, Operation};
pub use error::{AnalyzerError, Result};
pub use runner::{run, RunOutcome};
pub use utils::log;
