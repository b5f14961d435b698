//! Usercss metadata parsing and section building
//!
//! A usercss source starts with a metadata comment:
//!
//! ```text
//! /* ==UserStyle==
//! @name        Dark Example
//! @namespace   example.com
//! @version     1.2.0
//! ==/UserStyle== */
//!
//! @-moz-document domain("example.com") {
//!   body { background: #111 }
//! }
//! ```
//!
//! [`parse_metadata`] reads the header, [`build`] splits the body into
//! [`Section`]s. Only the `default` preprocessor is supported.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::section::Section;
use crate::version::parse_version;

static METADATA_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)/\*\s*==UserStyle==(.*?)==/UserStyle==\s*\*/").expect("valid regex")
});

static TARGET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^(url|url-prefix|domain|regexp)\((.*)\)$").expect("valid regex")
});

const DOCUMENT_RULE: &str = "@-moz-document";

/// Metadata fields carried by an installed usercss style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsercssData {
    pub name: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preprocessor: Option<String>,
}

/// Parsed metadata plus the source it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsercssMeta {
    pub data: UsercssData,
    pub source_code: String,
    /// Byte offset where the metadata comment ends.
    body_offset: usize,
}

/// Result of building a usercss source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltStyle {
    pub name: String,
    pub sections: Vec<Section>,
    pub source_code: String,
    pub usercss_data: UsercssData,
}

/// Parse the `==UserStyle==` header of a usercss source.
///
/// `@name` and `@version` are required; the version must be parsable.
pub fn parse_metadata(text: &str) -> Result<UsercssMeta> {
    let block = METADATA_BLOCK.captures(text).ok_or(Error::MissingMetadata)?;
    let whole = block.get(0).ok_or(Error::MissingMetadata)?;
    let body = block.get(1).map(|m| m.as_str()).unwrap_or("");

    let mut data = UsercssData::default();
    for line in body.lines() {
        let line = line.trim().trim_start_matches('*').trim_start();
        let Some(rest) = line.strip_prefix('@') else {
            continue;
        };
        let (key, value) = match rest.split_once(char::is_whitespace) {
            Some((key, value)) => (key, value.trim()),
            None => (rest, ""),
        };
        let value = Some(value.to_string()).filter(|v| !v.is_empty());

        match key {
            "name" => data.name = value.unwrap_or_default(),
            "version" => data.version = value.unwrap_or_default(),
            "namespace" => data.namespace = value,
            "description" => data.description = value,
            "author" => data.author = value,
            "homepageURL" => data.homepage_url = value,
            "supportURL" => data.support_url = value,
            "updateURL" => data.update_url = value,
            "preprocessor" => data.preprocessor = value,
            _ => tracing::trace!(key, "ignoring usercss metadata key"),
        }
    }

    if data.name.is_empty() {
        return Err(Error::MissingField { field: "name" });
    }
    if data.version.is_empty() {
        return Err(Error::MissingField { field: "version" });
    }
    parse_version(&data.version)?;

    match data.preprocessor.as_deref() {
        Some(pre) if pre != "default" => {
            return Err(Error::UnsupportedPreprocessor {
                name: pre.to_string(),
            });
        }
        _ => {}
    }

    Ok(UsercssMeta {
        data,
        source_code: text.to_string(),
        body_offset: whole.end(),
    })
}

/// Build installable sections from parsed metadata.
///
/// Each `@-moz-document` block becomes a targeted section; CSS between
/// blocks becomes a global section.
pub fn build(meta: &UsercssMeta) -> Result<BuiltStyle> {
    let source = &meta.source_code;
    let body = &source[meta.body_offset..];
    let mut sections = Vec::new();
    let mut cursor = 0;

    while let Some(found) = body[cursor..].find(DOCUMENT_RULE) {
        let rule_start = cursor + found;
        push_global(&mut sections, &body[cursor..rule_start]);

        let targets_start = rule_start + DOCUMENT_RULE.len();
        let open = body[targets_start..]
            .find('{')
            .map(|i| targets_start + i)
            .ok_or(Error::UnbalancedBraces {
                offset: meta.body_offset + rule_start,
            })?;
        let close = matching_brace(body, open).ok_or(Error::UnbalancedBraces {
            offset: meta.body_offset + open,
        })?;

        let mut section = Section {
            code: body[open + 1..close].trim().to_string(),
            ..Default::default()
        };
        for target in split_targets(&body[targets_start..open]) {
            apply_target(&mut section, &target)?;
        }
        sections.push(section);
        cursor = close + 1;
    }
    push_global(&mut sections, &body[cursor..]);

    Ok(BuiltStyle {
        name: meta.data.name.clone(),
        sections,
        source_code: source.clone(),
        usercss_data: meta.data.clone(),
    })
}

fn push_global(sections: &mut Vec<Section>, code: &str) {
    let code = code.trim();
    if !code.is_empty() {
        sections.push(Section::global(code));
    }
}

/// Find the `}` closing the `{` at `open`, skipping quoted strings and comments.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = text[i + 2..].find("*/").map(|end| i + 2 + end + 1)?;
                }
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

/// Split a target list on commas that are not inside quotes or parentheses.
fn split_targets(list: &str) -> Vec<String> {
    let mut targets = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut parens = 0usize;

    for c in list.chars() {
        match (quote, c) {
            (Some(q), _) if c == q => {
                quote = None;
                current.push(c);
            }
            (Some(_), _) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                current.push(c);
            }
            (None, '(') => {
                parens += 1;
                current.push(c);
            }
            (None, ')') => {
                parens = parens.saturating_sub(1);
                current.push(c);
            }
            (None, ',') if parens == 0 => {
                targets.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    targets.push(current);

    targets
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn apply_target(section: &mut Section, target: &str) -> Result<()> {
    let caps = TARGET.captures(target).ok_or_else(|| Error::InvalidTarget {
        target: target.to_string(),
    })?;
    let value = unquote(caps.get(2).map(|m| m.as_str()).unwrap_or("").trim());

    match caps.get(1).map(|m| m.as_str()) {
        Some("url") => section.urls.push(value),
        Some("url-prefix") => section.url_prefixes.push(value),
        Some("domain") => section.domains.push(value),
        Some("regexp") => section.regexps.push(value),
        _ => {
            return Err(Error::InvalidTarget {
                target: target.to_string(),
            });
        }
    }
    Ok(())
}

fn unquote(value: &str) -> String {
    for q in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(q).and_then(|v| v.strip_suffix(q)) {
            return inner.to_string();
        }
    }
    value.to_string()
}
