//! Style data model
//!
//! [`Style`] is the locally stored copy; [`StyleDocument`] is a partial
//! document (an update candidate or a patch) merged onto a style by id.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use style_meta::{BuiltStyle, Section, UsercssData};

/// Opaque style identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleId(pub u64);

impl fmt::Display for StyleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a document is being saved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaveReason {
    /// Full content update from the remote source
    Update,
    /// Content unchanged, only the digest baseline moves
    UpdateDigest,
}

/// A locally stored style under update management
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    pub id: StyleId,
    pub name: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    /// Digest of the sections at the last known-good install or update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_digest: Option<String>,
    /// Remote content hash (legacy styles only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_md5: Option<String>,
    /// Name at install time, used to detect a local rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usercss_data: Option<UsercssData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
}

fn enabled_by_default() -> bool {
    true
}

impl Style {
    /// Create a legacy style with the given sections and no update metadata.
    pub fn new(id: StyleId, name: impl Into<String>, sections: Vec<Section>) -> Self {
        Self {
            id,
            name: name.into(),
            enabled: true,
            sections,
            source_code: None,
            original_digest: None,
            original_md5: None,
            original_name: None,
            update_url: None,
            md5_url: None,
            usercss_data: None,
            update_date: None,
        }
    }

    /// Whether this style follows the versioned (usercss) update path.
    pub fn is_usercss(&self) -> bool {
        self.usercss_data.is_some()
    }

    /// Merge a document onto this style.
    ///
    /// Absent fields keep their current value. `enabled` is never touched.
    pub fn apply(&mut self, doc: StyleDocument) {
        if let Some(name) = doc.name {
            self.name = name;
        }
        if let Some(original_name) = doc.original_name {
            self.original_name = Some(original_name);
        }
        self.sections = doc.sections;
        if doc.source_code.is_some() {
            self.source_code = doc.source_code;
        }
        if doc.usercss_data.is_some() {
            self.usercss_data = doc.usercss_data;
        }
        if doc.original_md5.is_some() {
            self.original_md5 = doc.original_md5;
        }
        if doc.original_digest.is_some() {
            self.original_digest = doc.original_digest;
        }
        if doc.update_url.is_some() {
            self.update_url = doc.update_url;
        }
        if doc.update_date.is_some() {
            self.update_date = doc.update_date;
        }
    }

    /// A copy of this style with the document merged in.
    pub fn merged(&self, doc: StyleDocument) -> Self {
        let mut merged = self.clone();
        merged.apply(doc);
        merged
    }

    /// A copy without code, suitable for progress reports.
    pub fn without_code(&self) -> Self {
        Self {
            sections: Vec::new(),
            source_code: None,
            ..self.clone()
        }
    }
}

/// A partial style document: an update candidate or a patch.
///
/// Has no `enabled` field, so saving a document can never flip it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<StyleId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
    pub sections: Vec<Section>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usercss_data: Option<UsercssData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_md5: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<SaveReason>,
}

impl StyleDocument {
    /// Whether this document goes through the versioned save operation.
    pub fn is_usercss(&self) -> bool {
        self.usercss_data.is_some()
    }
}

impl From<BuiltStyle> for StyleDocument {
    fn from(built: BuiltStyle) -> Self {
        Self {
            name: Some(built.name),
            sections: built.sections,
            source_code: Some(built.source_code),
            update_url: built.usercss_data.update_url.clone(),
            usercss_data: Some(built.usercss_data),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Style {
        let mut style = Style::new(StyleId(7), "Local", vec![Section::global("a{}")]);
        style.enabled = false;
        style.update_url = Some("https://example.com/7.json".into());
        style
    }

    #[test]
    fn apply_keeps_absent_fields() {
        let mut style = sample();
        style.apply(StyleDocument {
            sections: vec![Section::global("b{}")],
            ..Default::default()
        });

        assert_eq!(style.name, "Local");
        assert_eq!(style.sections, vec![Section::global("b{}")]);
        assert_eq!(style.update_url.as_deref(), Some("https://example.com/7.json"));
    }

    #[test]
    fn apply_never_touches_enabled() {
        let style = sample().merged(StyleDocument {
            name: Some("Remote".into()),
            ..Default::default()
        });
        assert!(!style.enabled);
        assert_eq!(style.name, "Remote");
    }

    #[test]
    fn without_code_strips_sections_and_source() {
        let mut style = sample();
        style.source_code = Some("/* src */".into());
        let stripped = style.without_code();
        assert!(stripped.sections.is_empty());
        assert!(stripped.source_code.is_none());
        assert_eq!(stripped.id, style.id);
    }

    #[test]
    fn remote_enabled_field_is_ignored() {
        let doc: StyleDocument = serde_json::from_str(
            r#"{"name":"R","enabled":false,"sections":[{"code":"x{}"}]}"#,
        )
        .unwrap();
        let style = Style::new(StyleId(1), "L", Vec::new()).merged(doc);
        assert!(style.enabled);
    }

    #[test]
    fn style_json_uses_camel_case() {
        let mut style = sample();
        style.original_md5 = Some("0".repeat(32));
        let json = serde_json::to_value(&style).unwrap();
        assert!(json.get("originalMd5").is_some());
        assert!(json.get("updateUrl").is_some());
        assert!(json.get("sourceCode").is_none());
    }
}
