//! Style metadata for the style update checker
//!
//! - [`version`]: semantic version ordering used to reject downgrades
//! - [`section`]: the code section model shared by every style
//! - [`usercss`]: metadata parsing and section building for usercss sources

pub mod error;
pub mod section;
pub mod usercss;
pub mod version;

pub use error::{Error, Result};
pub use section::Section;
pub use usercss::{BuiltStyle, UsercssData, UsercssMeta, build, parse_metadata};
pub use version::{compare_versions, parse_version};
