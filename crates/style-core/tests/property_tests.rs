//! Property tests for the digest engine and section equality

use proptest::prelude::*;
use style_core::{Section, sections_equal, style_digest};

fn section() -> impl Strategy<Value = Section> {
    (
        "[a-z{}:; ]{0,24}",
        prop::collection::vec("[a-z]{1,8}\\.com", 0..4),
        prop::collection::vec("https://[a-z]{1,8}/", 0..3),
    )
        .prop_map(|(code, domains, url_prefixes)| Section {
            code,
            domains,
            url_prefixes,
            ..Default::default()
        })
}

proptest! {
    #[test]
    fn digest_is_deterministic(sections in prop::collection::vec(section(), 0..5)) {
        prop_assert_eq!(style_digest(&sections), style_digest(&sections.clone()));
    }

    #[test]
    fn digest_has_checksum_format(sections in prop::collection::vec(section(), 0..5)) {
        let digest = style_digest(&sections);
        prop_assert!(digest.starts_with("sha256:"));
        prop_assert_eq!(digest.len(), "sha256:".len() + 64);
    }

    #[test]
    fn equality_is_reflexive(sections in prop::collection::vec(section(), 0..5)) {
        prop_assert!(sections_equal(&sections, &sections));
    }

    #[test]
    fn equality_ignores_target_order(sections in prop::collection::vec(section(), 1..5)) {
        let reversed: Vec<Section> = sections
            .iter()
            .map(|s| {
                let mut s = s.clone();
                s.domains.reverse();
                s.url_prefixes.reverse();
                s
            })
            .collect();
        prop_assert!(sections_equal(&sections, &reversed));
    }

    #[test]
    fn differing_code_is_never_equal(
        sections in prop::collection::vec(section(), 1..5),
        extra in "[a-z]{1,8}",
    ) {
        let mut changed = sections.clone();
        changed[0].code.push_str(&extra);
        prop_assert!(!sections_equal(&sections, &changed));
        prop_assert_ne!(style_digest(&sections), style_digest(&changed));
    }
}
