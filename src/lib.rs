pub mod config;
pub mod console;
pub mod report;
pub mod sequencer;
pub mod walker;

// Re-export common items
pub use report::{RunReport, Verdict};
pub use sequencer::run_api_checks;
pub use walker::run_ui_flow;
