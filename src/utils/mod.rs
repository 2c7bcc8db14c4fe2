pub mod log;
pub mod plot;
pub mod report;
