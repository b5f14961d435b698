//! Tests for the reconciliation decision chain

use pretty_assertions::assert_eq;
use rstest::rstest;
use style_core::{
    Error, Outcome, ReconcileOptions, SaveReason, Section, SkipReason, StyleId, style_digest,
};
use style_test_utils::fixtures::{
    MD5_A, MD5_B, json_url, legacy_json, legacy_style, md5_url, usercss_source, usercss_style,
    usercss_url,
};
use style_test_utils::{Harness, SaveOp};

fn opts(ignore_digest: bool, save: bool) -> ReconcileOptions {
    ReconcileOptions { ignore_digest, save }
}

mod edit_guard_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_edited_style_is_skipped_without_write() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.sections = vec![Section::global("a{color:red}")];
        let h = Harness::new([style.clone()]);

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::Edited));
        assert_eq!(h.store.save_count(), 0);
        assert!(h.fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_ignore_digest_bypasses_edit_guard() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.sections = vec![Section::global("a{color:red}")];
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_A);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(true, true)).await.unwrap();

        assert!(matches!(outcome, Outcome::Updated(_)));
        assert_eq!(h.store.get(StyleId(1)).unwrap().sections, vec![Section::global("b{}")]);
    }
}

mod legacy_path_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_same_md5_skips_document_fetch() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_A);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::SameMd5));
        assert_eq!(h.fetcher.calls_to(&md5_url(1)), 1);
        assert_eq!(h.fetcher.calls_to(&json_url(1)), 0);
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_changed_md5_applies_update() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.enabled = false;
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), format!("{MD5_B}\n"));
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        let Outcome::Updated(saved) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        let new_sections = vec![Section::global("b{}")];
        assert_eq!(saved.sections, new_sections);
        assert_eq!(saved.original_md5.as_deref(), Some(MD5_B));
        assert_eq!(saved.original_digest, Some(style_digest(&new_sections)));
        assert!(saved.update_date.is_some());
        assert!(!saved.enabled);

        let saves = h.store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].op, SaveOp::Full);
        assert_eq!(saves[0].doc.id, Some(StyleId(1)));
        assert_eq!(saves[0].doc.reason, Some(SaveReason::Update));
        assert!(saves[0].doc.usercss_data.is_none());
    }

    #[tokio::test]
    async fn test_document_is_fetched_without_body() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert!(h.fetcher.calls().iter().all(|call| call.body.is_none()));
    }

    #[tokio::test]
    async fn test_missing_md5_url_fetches_document_directly() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.md5_url = None;
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert!(matches!(outcome, Outcome::Updated(_)));
        assert_eq!(h.fetcher.calls().len(), 1);
        // The previous MD5 is kept when none was fetched
        assert_eq!(h.store.get(StyleId(1)).unwrap().original_md5.as_deref(), Some(MD5_A));
    }

    #[rstest]
    #[case::empty("")]
    #[case::short("abc123")]
    #[case::html("<html><body>Bad gateway</body></html>")]
    #[tokio::test]
    async fn test_malformed_md5(#[case] reply: &str) {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), reply);

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::ErrorMd5));
        assert_eq!(h.fetcher.calls_to(&json_url(1)), 0);
    }

    #[rstest]
    #[case::not_json("<html></html>")]
    #[case::no_sections(r#"{"name":"Dark"}"#)]
    #[case::empty_sections(r#"{"sections":[]}"#)]
    #[case::code_not_string(r#"{"sections":[{"code":42}]}"#)]
    #[tokio::test]
    async fn test_malformed_json(#[case] reply: &str) {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), reply);

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::ErrorJson));
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_later_section_without_code_is_accepted() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(
            &json_url(1),
            r#"{"name":"Dark","sections":[{"code":"b{}"},{"urls":["x"]}]}"#,
        );

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        let saved = outcome.style().unwrap();
        assert_eq!(saved.sections.len(), 2);
        assert_eq!(saved.sections[1].code, "");
        assert_eq!(saved.sections[1].urls, vec!["x"]);
    }

    #[rstest]
    #[case::unreachable(0)]
    #[case::not_found(404)]
    #[case::unavailable(503)]
    #[tokio::test]
    async fn test_transport_failure_is_a_skip(#[case] status: u16) {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.fail(&md5_url(1), status);

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::Transport(status)));
    }
}

mod versioned_path_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::same_version("1.0.0", false, SkipReason::SameVersion)]
    #[case::older_remote("0.9.0", false, SkipReason::ErrorVersion)]
    #[case::older_remote_forced("0.9.0", true, SkipReason::ErrorVersion)]
    #[tokio::test]
    async fn test_version_rejections(
        #[case] remote_version: &str,
        #[case] ignore_digest: bool,
        #[case] expected: SkipReason,
    ) {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", remote_version, "b{}"));

        let outcome = h.engine.reconcile(&style, opts(ignore_digest, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(expected));
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_forced_same_version_identical_source_is_same_code() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", "1.0.0", "a{}"));

        let outcome = h.engine.reconcile(&style, opts(true, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::SameCode));
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_forced_same_version_changed_source_reinstalls() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", "1.0.0", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(true, true)).await.unwrap();

        assert!(matches!(outcome, Outcome::Updated(_)));
    }

    #[tokio::test]
    async fn test_newer_version_is_built_and_saved_versioned() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        let remote = usercss_source("Neon", "1.1.0", "b{}");
        h.fetcher.respond(&usercss_url(2), remote.clone());

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        let Outcome::Updated(saved) = outcome else {
            panic!("expected update, got {outcome:?}");
        };
        assert_eq!(saved.usercss_data.as_ref().unwrap().version, "1.1.0");
        assert_eq!(saved.source_code.as_deref(), Some(remote.as_str()));
        assert_eq!(saved.sections, vec![Section::global("b{}")]);
        assert!(saved.original_md5.is_none());

        let saves = h.store.saves();
        assert_eq!(saves[0].op, SaveOp::Versioned);
        assert!(saves[0].doc.original_md5.is_none());
    }

    #[tokio::test]
    async fn test_pre_release_sorts_before_release() {
        let style = usercss_style(2, "Neon", "2.0.0-beta.1", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", "2.0.0", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert!(matches!(outcome, Outcome::Updated(_)));
    }

    #[tokio::test]
    async fn test_build_failure_propagates() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&usercss_url(2), "body { color: red }");

        let err = h.engine.reconcile(&style, opts(false, true)).await.unwrap_err();

        assert!(matches!(err, Error::Build(_)));
        assert_eq!(h.store.save_count(), 0);
    }
}

mod save_guard_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::saving(true)]
    #[case::dry_run(false)]
    #[tokio::test]
    async fn test_unchanged_sections_refresh_digest_only(#[case] save: bool) {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.original_digest = Some("sha256:stale".into());
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "a{}"));

        // The stale digest would trip the edit guard, so force past it
        let outcome = h.engine.reconcile(&style, opts(true, save)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::SameCode));
        let saves = h.store.saves();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].doc.reason, Some(SaveReason::UpdateDigest));
        assert_eq!(
            h.store.get(StyleId(1)).unwrap().original_digest,
            Some(style_digest(&style.sections))
        );
    }

    #[tokio::test]
    async fn test_versioned_same_sections_refresh_digest() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", "1.0.1", "a{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::SameCode));
        assert_eq!(h.store.saves()[0].doc.reason, Some(SaveReason::UpdateDigest));
        assert_eq!(h.store.saves()[0].op, SaveOp::Full);
    }

    #[tokio::test]
    async fn test_missing_digest_is_maybe_edited() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.original_digest = None;
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_A);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        // Without a digest the MD5 short-circuit does not apply either
        assert_eq!(h.fetcher.calls_to(&json_url(1)), 1);
        assert_eq!(outcome, Outcome::Skipped(SkipReason::MaybeEdited));
        assert_eq!(h.store.save_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_digest_forced_updates() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.original_digest = None;
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_A);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(true, true)).await.unwrap();

        let saved = outcome.style().unwrap();
        assert_eq!(saved.original_digest, Some(style_digest(&saved.sections)));
    }

    #[tokio::test]
    async fn test_local_rename_is_preserved() {
        let mut style = legacy_style(1, "Dark", "a{}");
        style.name = "My Dark".into();
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark Reloaded", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        let saved = outcome.style().unwrap();
        assert_eq!(saved.name, "My Dark");
        assert_eq!(saved.original_name.as_deref(), Some("Dark"));
    }

    #[tokio::test]
    async fn test_remote_rename_is_adopted() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark Reloaded", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        let saved = outcome.style().unwrap();
        assert_eq!(saved.name, "Dark Reloaded");
        assert_eq!(saved.original_name.as_deref(), Some("Dark Reloaded"));
    }

    #[tokio::test]
    async fn test_dry_run_returns_unpersisted_preview() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let outcome = h.engine.reconcile(&style, opts(false, false)).await.unwrap();

        let Outcome::Preview(preview) = outcome else {
            panic!("expected preview, got {outcome:?}");
        };
        assert_eq!(preview.sections, vec![Section::global("b{}")]);
        assert_eq!(h.store.save_count(), 0);
        assert_eq!(h.store.get(StyleId(1)).unwrap(), style);
    }
}

mod scenario_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_legacy_same_md5_scenario() {
        let style = legacy_style(1, "Scenario", "html{}");
        assert_eq!(style.original_md5.as_deref().map(str::len), Some(32));
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_A);

        let outcome = h.engine.reconcile(&style, opts(false, true)).await.unwrap();

        assert_eq!(outcome, Outcome::Skipped(SkipReason::SameMd5));
    }

    #[tokio::test]
    async fn test_legacy_update_is_idempotent() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "b{}"));

        let first = h.engine.reconcile(&style, opts(false, true)).await.unwrap();
        assert!(matches!(first, Outcome::Updated(_)));

        let current = h.store.get(StyleId(1)).unwrap();
        let second = h.engine.reconcile(&current, opts(false, true)).await.unwrap();
        assert_eq!(second, Outcome::Skipped(SkipReason::SameMd5));
        assert_eq!(h.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_versioned_update_is_idempotent() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher
            .respond(&usercss_url(2), usercss_source("Neon", "2.0.0", "b{}"));

        let first = h.engine.reconcile(&style, opts(false, true)).await.unwrap();
        assert!(matches!(first, Outcome::Updated(_)));

        let current = h.store.get(StyleId(2)).unwrap();
        let second = h.engine.reconcile(&current, opts(false, true)).await.unwrap();
        assert_eq!(second, Outcome::Skipped(SkipReason::SameVersion));
    }

    #[tokio::test]
    async fn test_version_bump_with_same_code_settles() {
        let style = usercss_style(2, "Neon", "1.0.0", "a{}");
        let h = Harness::new([style.clone()]);
        let remote = usercss_source("Neon", "1.1.0", "a{}");
        h.fetcher.respond(&usercss_url(2), remote.clone());

        let first = h.engine.reconcile(&style, opts(false, true)).await.unwrap();
        assert_eq!(first, Outcome::Skipped(SkipReason::SameCode));

        let current = h.store.get(StyleId(2)).unwrap();
        assert_eq!(current.usercss_data.as_ref().unwrap().version, "1.1.0");
        assert_eq!(current.source_code.as_deref(), Some(remote.as_str()));

        let second = h.engine.reconcile(&current, opts(false, true)).await.unwrap();
        assert_eq!(second, Outcome::Skipped(SkipReason::SameVersion));
        assert_eq!(h.store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_md5_change_with_same_code_settles() {
        let style = legacy_style(1, "Dark", "a{}");
        let h = Harness::new([style.clone()]);
        h.fetcher.respond(&md5_url(1), MD5_B);
        h.fetcher.respond(&json_url(1), legacy_json("Dark", "a{}"));

        let first = h.engine.reconcile(&style, opts(false, true)).await.unwrap();
        assert_eq!(first, Outcome::Skipped(SkipReason::SameCode));

        let current = h.store.get(StyleId(1)).unwrap();
        assert_eq!(current.original_md5.as_deref(), Some(MD5_B));

        let second = h.engine.reconcile(&current, opts(false, true)).await.unwrap();
        assert_eq!(second, Outcome::Skipped(SkipReason::SameMd5));
        assert_eq!(h.store.save_count(), 1);
        assert_eq!(h.fetcher.calls_to(&json_url(1)), 1);
    }
}
