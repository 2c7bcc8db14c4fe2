use cgra_mem::config::app::{load_and_merge_configs, CliOverrides};
use cgra_mem::log::init_log;
use cgra_mem::{run, Operation};
use std::fs;
use std::path::PathBuf;

fn manifest_dir() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

fn scratch_dir(name: &str) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("cgra_mem_{}_{}", name, std::process::id()));
  let _ = fs::remove_dir_all(&dir);
  dir
}

fn cli(operation: Operation, op_config: &str, out: &PathBuf) -> CliOverrides {
  CliOverrides {
    hw_config: Some(manifest_dir().join("configs/hardware_config.yaml").to_string_lossy().to_string()),
    operation: Some(operation),
    op_config: Some(manifest_dir().join("configs").join(op_config).to_string_lossy().to_string()),
    output_dir: Some(out.to_string_lossy().to_string()),
    quiet: true,
  }
}

#[test]
fn test_gemm_run_writes_artifacts() {
  init_log(true);
  let out = scratch_dir("gemm");
  let config = load_and_merge_configs(None, &cli(Operation::Gemm, "gemm_config.yaml", &out)).unwrap();

  let outcome = run(&config).unwrap();
  // 5 dimensions x 27 tile candidates
  assert_eq!(outcome.report.points.len(), 135);

  let image = out.join("gemm_analysis_gemm_analysis.png");
  let chart = out.join("gemm_analysis_gemm_analysis.json");
  let results = out.join("gemm_analysis_results.yaml");
  assert_eq!(outcome.artifacts, vec![image.clone(), chart.clone(), results.clone()]);
  assert!(fs::read(&image).unwrap().starts_with(b"\x89PNG"));

  let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&chart).unwrap()).unwrap();
  assert_eq!(json["labels"].as_array().unwrap().len(), 135);
  assert_eq!(json["y_scale"], "log");

  let yaml: serde_yaml::Value = serde_yaml::from_str(&fs::read_to_string(&results).unwrap()).unwrap();
  let first = &yaml.as_sequence().unwrap()[0];
  assert_eq!(first["dimension"].as_u64(), Some(32));
  assert!(first["metrics"]["latency"].as_f64().is_some());

  let _ = fs::remove_dir_all(&out);
}

#[test]
fn test_conv_run_without_detailed_results() {
  init_log(true);
  let out = scratch_dir("conv");
  let op_config = out.join("conv.yaml");
  fs::create_dir_all(&out).unwrap();
  let doc = fs::read_to_string(manifest_dir().join("configs/conv_config.yaml"))
    .unwrap()
    .replace("save_detailed_results: true", "save_detailed_results: false");
  fs::write(&op_config, doc).unwrap();

  let mut overrides = cli(Operation::Conv, "conv_config.yaml", &out);
  overrides.op_config = Some(op_config.to_string_lossy().to_string());
  let config = load_and_merge_configs(None, &overrides).unwrap();

  let outcome = run(&config).unwrap();
  // 4 inputs x 3 kernels, one tile candidate
  assert_eq!(outcome.report.points.len(), 12);
  assert_eq!(
    outcome.artifacts,
    vec![
      out.join("conv_analysis_conv_analysis.png"),
      out.join("conv_analysis_conv_analysis.json"),
    ]
  );
  assert!(!out.join("conv_analysis_results.yaml").exists());

  let _ = fs::remove_dir_all(&out);
}

#[test]
fn test_unknown_metric_aborts_run() {
  init_log(true);
  let out = scratch_dir("metric");
  fs::create_dir_all(&out).unwrap();
  let op_config = out.join("gemm.yaml");
  let doc = fs::read_to_string(manifest_dir().join("configs/gemm_config.yaml"))
    .unwrap()
    .replace("- latency", "- quantum_tunneling");
  fs::write(&op_config, doc).unwrap();

  let mut overrides = cli(Operation::Gemm, "gemm_config.yaml", &out);
  overrides.op_config = Some(op_config.to_string_lossy().to_string());
  let config = load_and_merge_configs(None, &overrides).unwrap();

  let err = run(&config).unwrap_err();
  assert!(err.is_validation());
  assert!(!out.join("gemm_analysis_gemm_analysis.png").exists());
  assert!(!out.join("gemm_analysis_gemm_analysis.json").exists());

  let _ = fs::remove_dir_all(&out);
}

#[test]
fn test_settings_file_paths_are_relative_to_it() {
  let out = scratch_dir("settings");
  fs::create_dir_all(&out).unwrap();
  let settings = out.join("cgra_mem.toml");
  fs::write(
    &settings,
    r#"
[paths]
op_config = "conv.yaml"

[analysis]
operation = "conv"
"#,
  )
  .unwrap();

  let config = load_and_merge_configs(Some(&settings), &CliOverrides::default()).unwrap();
  assert_eq!(config.operation(), Operation::Conv);
  assert_eq!(config.op_config_path(), out.join("conv.yaml"));
  assert_eq!(config.paths.hw_config, "hardware_config.yaml");

  let _ = fs::remove_dir_all(&out);
}

#[test]
fn test_oversized_hardware_aborts_run() {
  init_log(true);
  let out = scratch_dir("hw_overflow");
  fs::create_dir_all(&out).unwrap();
  let hw_config = out.join("hardware.yaml");
  let doc = fs::read_to_string(manifest_dir().join("configs/hardware_config.yaml")).unwrap();
  let doc = doc.replace("size: 32                  # MB", "size: 20000000000000      # MB");
  assert!(doc.contains("20000000000000"));
  fs::write(&hw_config, doc).unwrap();

  let mut overrides = cli(Operation::Gemm, "gemm_config.yaml", &out);
  overrides.hw_config = Some(hw_config.to_string_lossy().to_string());
  let config = load_and_merge_configs(None, &overrides).unwrap();

  assert!(run(&config).unwrap_err().is_validation());
  assert!(!out.join("gemm_analysis_gemm_analysis.png").exists());

  let _ = fs::remove_dir_all(&out);
}
