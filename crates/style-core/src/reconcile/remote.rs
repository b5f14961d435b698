//! Shape validation for legacy remote documents

use serde::Deserialize;
use serde_json::Value;
use style_meta::Section;

use crate::model::StyleDocument;

use super::SkipReason;

/// An MD5 is 32 hex digits; surrounding whitespace is tolerated.
pub fn parse_md5(text: &str) -> Result<&str, SkipReason> {
    let md5 = text.trim();
    if md5.len() == 32 && md5.bytes().all(|b| b.is_ascii_hexdigit()) {
        Ok(md5)
    } else {
        Err(SkipReason::ErrorMd5)
    }
}

/// The fields consulted from a remote style; everything else is ignored.
///
/// Past the shape check every field is read leniently: a wrongly typed
/// value counts as absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RemoteStyle {
    #[serde(default)]
    name: Value,
    sections: Vec<Value>,
    #[serde(default)]
    update_url: Value,
}

/// Parse and shape-check a legacy style JSON document.
///
/// Valid documents have a non-empty `sections` array whose first entry
/// carries a string `code`. Identity, digest and save reason are stamped
/// locally and never read from the remote.
pub fn parse_style_json(text: &str) -> Result<StyleDocument, SkipReason> {
    let value: Value = serde_json::from_str(text).map_err(|_| SkipReason::ErrorJson)?;

    let first_code = value
        .get("sections")
        .and_then(Value::as_array)
        .and_then(|sections| sections.first())
        .and_then(|section| section.get("code"))
        .and_then(Value::as_str);
    if first_code.is_none() {
        return Err(SkipReason::ErrorJson);
    }

    let remote: RemoteStyle = serde_json::from_value(value).map_err(|_| SkipReason::ErrorJson)?;
    Ok(StyleDocument {
        name: text_field(&remote.name),
        sections: remote.sections.iter().map(remote_section).collect(),
        update_url: text_field(&remote.update_url),
        ..Default::default()
    })
}

fn remote_section(value: &Value) -> Section {
    Section {
        code: value
            .get("code")
            .and_then(text_field)
            .unwrap_or_default(),
        urls: string_list(value.get("urls")),
        url_prefixes: string_list(value.get("urlPrefixes")),
        domains: string_list(value.get("domains")),
        regexps: string_list(value.get("regexps")),
    }
}

fn text_field(value: &Value) -> Option<String> {
    value.as_str().map(str::to_string)
}

/// Missing, null and non-array lists are empty; non-string entries are dropped.
fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(text_field).collect())
        .unwrap_or_default()
}
