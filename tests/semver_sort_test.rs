use proptest::prelude::*;

use gitremote_mcp::gitremote::semver::{parse, sort_descending};

fn tag_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        // well-formed versions, with and without prefix and pre-release
        (0u64..5, 0u64..5, 0u64..5, proptest::option::of("(alpha|beta|rc)(\\.[0-9])?"), any::<bool>())
            .prop_map(|(major, minor, patch, pre, prefixed)| {
                let mut tag = format!("{}{}.{}.{}", if prefixed { "v" } else { "" }, major, minor, patch);
                if let Some(pre) = pre {
                    tag.push('-');
                    tag.push_str(&pre);
                }
                tag
            }),
        // short forms
        (0u64..5, 0u64..5).prop_map(|(major, minor)| format!("v{}.{}", major, minor)),
        // anything else
        "[a-z][a-z-]{0,10}",
    ]
}

proptest! {
    #[test]
    fn prop_sort_is_a_permutation(tags in proptest::collection::vec(tag_strategy(), 0..40)) {
        let sorted = sort_descending(&tags, None);
        let mut expected = tags.clone();
        let mut actual = sorted.clone();
        expected.sort();
        actual.sort();
        prop_assert_eq!(expected, actual);
    }

    #[test]
    fn prop_parseable_versions_are_non_increasing(tags in proptest::collection::vec(tag_strategy(), 0..40)) {
        let sorted = sort_descending(&tags, None);
        let versions: Vec<_> = sorted.iter().map_while(|t| parse(t).ok()).collect();
        for pair in versions.windows(2) {
            prop_assert!(pair[0] >= pair[1], "{} before {}", pair[0], pair[1]);
        }
        // everything after the first unparseable tag is unparseable
        let first_unparsed = versions.len();
        prop_assert!(sorted[first_unparsed..].iter().all(|t| parse(t).is_err()));
    }

    #[test]
    fn prop_unparseable_tags_keep_input_order(tags in proptest::collection::vec(tag_strategy(), 0..40)) {
        let sorted = sort_descending(&tags, None);
        let unparsed_in: Vec<&String> = tags.iter().filter(|t| parse(t).is_err()).collect();
        let unparsed_out: Vec<&String> = sorted.iter().filter(|t| parse(t).is_err()).collect();
        prop_assert_eq!(unparsed_in, unparsed_out);
    }

    #[test]
    fn prop_sort_is_idempotent(tags in proptest::collection::vec(tag_strategy(), 0..40)) {
        let once = sort_descending(&tags, None);
        let twice = sort_descending(&once, None);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_limit_takes_a_prefix(tags in proptest::collection::vec(tag_strategy(), 0..40), limit in -3i64..50) {
        let full = sort_descending(&tags, None);
        let limited = sort_descending(&tags, Some(limit));
        let expected_len = if limit > 0 { full.len().min(limit as usize) } else { full.len() };
        prop_assert_eq!(limited.len(), expected_len);
        prop_assert_eq!(&full[..expected_len], &limited[..]);
    }
}

#[test]
fn test_limit_five_of_twenty() {
    let tags: Vec<String> = (0..20).rev().map(|minor| format!("v0.{}.0", minor)).collect();
    let mut shuffled = tags.clone();
    shuffled.rotate_left(7);

    let top = sort_descending(&shuffled, Some(5));
    assert_eq!(top, vec!["v0.19.0", "v0.18.0", "v0.17.0", "v0.16.0", "v0.15.0"]);
}

#[test]
fn test_prerelease_precedence_chain() {
    // SemVer 2.0.0 precedence example, shuffled
    let tags = [
        "1.0.0-beta.11",
        "1.0.0",
        "1.0.0-alpha",
        "1.0.0-rc.1",
        "1.0.0-alpha.beta",
        "1.0.0-beta",
        "1.0.0-alpha.1",
        "1.0.0-beta.2",
    ];
    assert_eq!(
        sort_descending(&tags, None),
        vec![
            "1.0.0",
            "1.0.0-rc.1",
            "1.0.0-beta.11",
            "1.0.0-beta.2",
            "1.0.0-beta",
            "1.0.0-alpha.beta",
            "1.0.0-alpha.1",
            "1.0.0-alpha",
        ]
    );
}

#[test]
fn test_build_metadata_does_not_affect_precedence() {
    assert_eq!(parse("1.0.0+build.1").unwrap(), parse("1.0.0+build.2").unwrap());
    assert!(parse("1.0.1+a").unwrap() > parse("1.0.0+z").unwrap());
}
