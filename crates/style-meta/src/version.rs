//! Semantic version ordering.
//!
//! Style authors are loose with version strings (`1.2`, `v3`, `2.0-beta`),
//! so versions are normalized to `major.minor.patch` before comparison.
//! Ordering follows semver precedence: pre-release sorts before the release,
//! build metadata is ignored.
//!
//! # Examples
//!
//! ```
//! use std::cmp::Ordering;
//! use style_meta::version::compare_versions;
//!
//! assert_eq!(compare_versions("1.0.0", "1.0.1"), Ordering::Less);
//! assert_eq!(compare_versions("1.2", "1.2.0"), Ordering::Equal);
//! assert_eq!(compare_versions("2.0.0-beta", "2.0.0"), Ordering::Less);
//! ```

use std::cmp::Ordering;

use crate::error::{Error, Result};

/// Parse a version string, padding missing minor/patch components with `0`.
///
/// - `"3.12"` -> `3.12.0`
/// - `"v2"` -> `2.0.0`
/// - `"1.0-rc.1"` -> `1.0.0-rc.1`
pub fn parse_version(s: &str) -> Result<semver::Version> {
    let trimmed = s.trim();
    let trimmed = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);

    if let Ok(v) = semver::Version::parse(trimmed) {
        return Ok(v);
    }

    let split_at = trimmed.find(['-', '+']).unwrap_or(trimmed.len());
    let (core, suffix) = trimmed.split_at(split_at);
    let components = core.split('.').count();
    if core.is_empty() || components > 3 {
        return Err(Error::InvalidVersion {
            version: s.to_string(),
            reason: "expected major[.minor[.patch]]".to_string(),
        });
    }

    let padded = format!("{core}{}{suffix}", ".0".repeat(3 - components));
    semver::Version::parse(&padded).map_err(|e| Error::InvalidVersion {
        version: s.to_string(),
        reason: e.to_string(),
    })
}

/// Compare two version strings.
///
/// The order is total: any parsable version ranks above an unparsable one,
/// and two unparsable strings compare lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Ok(a), Ok(b)) => a.cmp_precedence(&b),
        (Ok(_), Err(_)) => Ordering::Greater,
        (Err(_), Ok(_)) => Ordering::Less,
        (Err(_), Err(_)) => a.trim().cmp(b.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full() {
        let v = parse_version("1.2.3").unwrap();
        assert_eq!((v.major, v.minor, v.patch), (1, 2, 3));
    }

    #[test]
    fn test_parse_pads_missing_components() {
        assert_eq!(parse_version("3.12").unwrap(), semver::Version::new(3, 12, 0));
        assert_eq!(parse_version("7").unwrap(), semver::Version::new(7, 0, 0));
    }

    #[test]
    fn test_parse_prefix_and_prerelease() {
        let v = parse_version("v1.0-rc.1").unwrap();
        assert_eq!(v.to_string(), "1.0.0-rc.1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_version("").is_err());
        assert!(parse_version("1.2.3.4").is_err());
        assert!(parse_version("latest").is_err());
    }

    #[test]
    fn test_build_metadata_is_ignored() {
        assert_eq!(compare_versions("1.0.0+abc", "1.0.0+def"), Ordering::Equal);
    }

    #[test]
    fn test_unparsable_sorts_first() {
        assert_eq!(compare_versions("nightly", "0.0.1"), Ordering::Less);
        assert_eq!(compare_versions("0.0.1", "nightly"), Ordering::Greater);
        assert_eq!(compare_versions("nightly", "nightly"), Ordering::Equal);
    }
}
