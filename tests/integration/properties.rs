//! Property tests for versioning and partial formatting.

use anatomy_cli::template::format_template;
use anatomy_cli::version::resolve_version;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn data(pairs: &[(&str, &str)]) -> Map<String, Value> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string()))).collect()
}

/// Templates made of literal path text and `{a}` / `{b}` placeholders.
///
/// No optional segments and no brace or angle characters: partial formatting drops an
/// optional segment whose key is missing, so those templates do not compose.
fn template_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec(
        prop_oneof![
            Just("{a}".to_string()),
            Just("{b}".to_string()),
            "[a-z0-9_./-]{1,6}",
        ],
        0..8,
    )
    .prop_map(|parts| parts.concat())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: successive automatic resolutions grow by exactly one.
    #[test]
    fn property_versions_increase_by_one(start_history in proptest::collection::vec(1u32..50, 0..5), steps in 1usize..20) {
        let mut existing = start_history;
        let mut previous = existing.iter().copied().max();
        for _ in 0..steps {
            let resolved = resolve_version(&existing, None).unwrap();
            prop_assert_eq!(resolved.number, previous.map_or(1, |p| p + 1));
            prop_assert!(resolved.is_new);
            existing.push(resolved.number);
            previous = Some(resolved.number);
        }
    }

    /// PROPERTY: an explicit version is returned verbatim.
    #[test]
    fn property_explicit_version_is_kept(existing in proptest::collection::vec(1u32..100, 0..10), explicit in 1u32..1000) {
        let resolved = resolve_version(&existing, Some(explicit)).unwrap();
        prop_assert_eq!(resolved.number, explicit);
        prop_assert_eq!(resolved.is_new, !existing.contains(&explicit));
    }

    /// PROPERTY: formatting in two partial passes equals one pass with all data.
    #[test]
    fn property_partial_format_composes(template in template_strategy(), a in "[a-z0-9]{1,8}", b in "[a-z0-9]{1,8}") {
        let first = format_template(&template, &data(&[("a", &a)]), true).unwrap();
        let twice = format_template(&first, &data(&[("b", &b)]), true).unwrap();
        let once = format_template(&template, &data(&[("a", &a), ("b", &b)]), true).unwrap();
        prop_assert_eq!(twice, once);
    }
}
