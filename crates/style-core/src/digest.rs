//! Content identity of a style's code sections
//!
//! [`style_digest`] detects local edits: it is recorded as
//! `originalDigest` whenever an update lands and compared on the next check.
//! [`sections_equal`] decides whether an incoming update changes anything.

use style_fs::Checksum;
use style_meta::Section;

const SECTION: u8 = 0;
const URLS: u8 = 1;
const URL_PREFIXES: u8 = 2;
const DOMAINS: u8 = 3;
const REGEXPS: u8 = 4;

/// Deterministic, order-sensitive digest over code sections.
///
/// Only section content contributes; style metadata (name, urls of the
/// remote source, dates) does not.
pub fn style_digest(sections: &[Section]) -> String {
    let mut checksum = Checksum::new();
    for section in sections {
        checksum.tag(SECTION).field(&section.code);
        push_list(&mut checksum, URLS, &section.urls);
        push_list(&mut checksum, URL_PREFIXES, &section.url_prefixes);
        push_list(&mut checksum, DOMAINS, &section.domains);
        push_list(&mut checksum, REGEXPS, &section.regexps);
    }
    checksum.finish()
}

fn push_list(checksum: &mut Checksum, tag: u8, values: &[String]) {
    checksum.tag(tag).field(&values.len().to_string());
    for value in values {
        checksum.field(value);
    }
}

/// Structural equality of two section lists.
///
/// Sections must match position by position (their order is part of the
/// cascade) and code byte for byte; target lists compare as sets.
pub fn sections_equal(a: &[Section], b: &[Section]) -> bool {
    a.len() == b.len()
        && a.iter().zip(b).all(|(x, y)| {
            x.code == y.code
                && same_members(&x.urls, &y.urls)
                && same_members(&x.url_prefixes, &y.url_prefixes)
                && same_members(&x.domains, &y.domains)
                && same_members(&x.regexps, &y.regexps)
        })
}

fn same_members(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v)) && b.iter().all(|v| a.contains(v))
}
