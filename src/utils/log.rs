use env_logger::Env;

/// Initialise the global logger once. `RUST_LOG` wins over the defaults;
/// quiet mode only lets warnings and errors through.
pub fn init_log(quiet: bool) {
  let default_filter = if quiet { "warn" } else { "info" };
  let _ = env_logger::Builder::from_env(Env::default().default_filter_or(default_filter))
    .format_timestamp(None)
    .format_target(false)
    .try_init();
}
