pub mod analysis;
pub mod app;
pub mod conv;
pub mod gemm;
pub mod hardware;
pub mod loader;
pub mod metrics;
pub mod operation;
pub mod schema;

pub use analysis::AnalysisConfig;
pub use conv::{ConvSweepConfig, ConvTile};
pub use gemm::{GemmSweepConfig, GemmTile};
pub use hardware::HardwareProfile;
pub use loader::{load_configs, LoadedConfigs, OperationConfig};
pub use metrics::Metric;
pub use operation::Operation;
