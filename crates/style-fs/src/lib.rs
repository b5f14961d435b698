//! Filesystem primitives for the style update checker
//!
//! Provides checksum helpers, atomic locked writes and format-agnostic
//! configuration loading used by the file-backed stores.

pub mod checksum;
pub mod config;
pub mod error;
pub mod io;

pub use checksum::Checksum;
pub use config::ConfigStore;
pub use error::{Error, Result};
