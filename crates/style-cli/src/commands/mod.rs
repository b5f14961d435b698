//! Command implementations for style-cli

pub mod check;
pub mod log;
pub mod watch;

pub use check::run_check;
pub use log::run_log;
pub use watch::run_watch;
