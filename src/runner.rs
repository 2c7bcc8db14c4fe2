use crate::analyzer::{run_analysis, AnalysisReport};
use crate::config::app::AppConfig;
use crate::config::load_configs;
use crate::error::Result;
use crate::utils::report::{print_time_breakdown, write_artifacts};
use log::info;
use std::path::PathBuf;

/// What one invocation produced.
#[derive(Debug)]
pub struct RunOutcome {
  pub report: AnalysisReport,
  pub artifacts: Vec<PathBuf>,
}

/// Load both documents, run the sweep, print the table and write artifacts.
pub fn run(config: &AppConfig) -> Result<RunOutcome> {
  let operation = config.operation();
  let loaded = load_configs(&config.hw_config_path(), operation, &config.op_config_path())?;

  info!("analyzing {} on a {} MHz CGRA", operation, loaded.hardware.cgra_frequency);
  let report = run_analysis(&loaded.hardware, &loaded.op)?;
  print_time_breakdown(&report);

  let save_detailed = loaded.op.analysis().save_detailed_results;
  let artifacts = write_artifacts(&report, &config.output_dir(), save_detailed)?;

  Ok(RunOutcome { report, artifacts })
}
