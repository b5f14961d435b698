//! Code sections of a style

use serde::{Deserialize, Serialize};

/// One block of CSS and the documents it applies to.
///
/// A section with no targets applies globally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub code: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub url_prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regexps: Vec<String>,
}

impl Section {
    /// Section applying to every document.
    pub fn global(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    pub fn is_global(&self) -> bool {
        self.urls.is_empty()
            && self.url_prefixes.is_empty()
            && self.domains.is_empty()
            && self.regexps.is_empty()
    }
}
