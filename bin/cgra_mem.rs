use cgra_mem::config::app::{load_and_merge_configs, CliOverrides};
use cgra_mem::log::init_log;
use cgra_mem::Operation;
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

/// cgra_mem - memory hierarchy and latency analysis for GEMM and convolution on a CGRA
#[derive(Parser, Debug)]
#[command(name = "cgra_mem")]
#[command(version)]
#[command(about = "CGRA memory analysis tool", long_about = None)]
struct Args {
  /// Path to the hardware configuration YAML file
  #[arg(long, value_name = "FILE")]
  hw_config: Option<String>,

  /// Operation to analyze
  #[arg(long, value_enum, value_name = "OP")]
  operation: Option<Operation>,

  /// Path to the operation-specific configuration YAML file
  #[arg(long, value_name = "FILE")]
  op_config: Option<String>,

  /// Tool settings file (TOML) merged over the built-in defaults
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Directory the artifacts are written to
  #[arg(short, long, value_name = "DIR")]
  output_dir: Option<String>,

  /// Quiet mode (only warnings and errors are logged)
  #[arg(short, long)]
  quiet: bool,
}

fn main() -> ExitCode {
  let args = Args::parse();

  let cli = CliOverrides {
    hw_config: args.hw_config,
    operation: args.operation,
    op_config: args.op_config,
    output_dir: args.output_dir,
    quiet: args.quiet,
  };

  let config = match load_and_merge_configs(args.config.as_deref(), &cli) {
    Ok(config) => config,
    Err(e) => {
      init_log(cli.quiet);
      log::error!("{}", e);
      return ExitCode::FAILURE;
    },
  };

  init_log(config.analysis.quiet);

  match cgra_mem::run(&config) {
    Ok(_) => ExitCode::SUCCESS,
    Err(e) => {
      log::error!("{}", e);
      ExitCode::FAILURE
    },
  }
}
