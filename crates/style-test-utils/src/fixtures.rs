//! Fixture builders for styles and remote documents.
//!
//! Legacy fixtures live at `https://styles.test/<id>.json` with their MD5 at
//! `https://styles.test/<id>.md5`; usercss fixtures at
//! `https://styles.test/<id>.user.css`. Every fixture starts in a clean
//! installed state: `originalDigest` matches its sections and
//! `originalName` matches its name.

use std::sync::Arc;
use std::time::Duration;

use style_core::{
    ActivityLog, CheckOrchestrator, LogSettings, MetaBuilder, ReconcileEngine, Section, Style,
    StyleDocument, StyleId, style_digest,
};

use crate::{MemoryLogStore, MemoryStore, ScriptedFetcher};

/// A valid MD5 reply
pub const MD5_A: &str = "0123456789abcdef0123456789abcdef";
/// A different valid MD5 reply
pub const MD5_B: &str = "fedcba9876543210fedcba9876543210";

pub fn json_url(id: u64) -> String {
    format!("https://styles.test/{id}.json")
}

pub fn md5_url(id: u64) -> String {
    format!("https://styles.test/{id}.md5")
}

pub fn usercss_url(id: u64) -> String {
    format!("https://styles.test/{id}.user.css")
}

/// Installed legacy style with a single global section.
pub fn legacy_style(id: u64, name: &str, code: &str) -> Style {
    let mut style = Style::new(StyleId(id), name, vec![Section::global(code)]);
    style.original_name = Some(name.to_string());
    style.original_digest = Some(style_digest(&style.sections));
    style.original_md5 = Some(MD5_A.to_string());
    style.update_url = Some(json_url(id));
    style.md5_url = Some(md5_url(id));
    style
}

/// Remote legacy document with a single global section.
pub fn legacy_json(name: &str, code: &str) -> String {
    format!(
        r#"{{"name":{},"sections":[{{"code":{}}}]}}"#,
        quote(name),
        quote(code)
    )
}

/// Usercss source text with a metadata block and a global body.
pub fn usercss_source(name: &str, version: &str, body: &str) -> String {
    format!(
        "/* ==UserStyle==\n@name {name}\n@namespace styles.test\n@version {version}\n==/UserStyle== */\n{body}\n"
    )
}

/// Installed usercss style built from [`usercss_source`].
pub fn usercss_style(id: u64, name: &str, version: &str, body: &str) -> Style {
    let source = usercss_source(name, version, body);
    let meta = style_meta::parse_metadata(&source).unwrap();
    let doc = StyleDocument::from(style_meta::build(&meta).unwrap());

    let mut style = Style::new(StyleId(id), name, doc.sections);
    style.source_code = doc.source_code;
    style.usercss_data = doc.usercss_data;
    style.original_name = Some(name.to_string());
    style.original_digest = Some(style_digest(&style.sections));
    style.update_url = Some(usercss_url(id));
    style
}

fn quote(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n");
    format!("\"{escaped}\"")
}

/// Collaborator doubles wired to an engine and an orchestrator.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub fetcher: Arc<ScriptedFetcher>,
    pub log_store: Arc<MemoryLogStore>,
    pub log: ActivityLog,
    pub engine: ReconcileEngine,
    pub orchestrator: CheckOrchestrator,
}

impl Harness {
    pub fn new(styles: impl IntoIterator<Item = Style>) -> Self {
        let store = Arc::new(MemoryStore::new(styles));
        let fetcher = Arc::new(ScriptedFetcher::new());
        let log_store = Arc::new(MemoryLogStore::new());
        let log = ActivityLog::new(log_store.clone(), LogSettings::default());
        let engine = ReconcileEngine::new(store.clone(), fetcher.clone(), Arc::new(MetaBuilder));
        let orchestrator = CheckOrchestrator::new(
            store.clone(),
            fetcher.clone(),
            Arc::new(MetaBuilder),
            log.clone(),
        )
        .with_retry_delay(Duration::from_millis(1000));

        Self {
            store,
            fetcher,
            log_store,
            log,
            engine,
            orchestrator,
        }
    }
}
