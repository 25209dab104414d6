//! Property-based tests for the decoder
//!
//! These tests use proptest to verify:
//! 1. Roundtrip property: write(tree) -> decode == original tree, for trees
//!    whose shape survives the repeated-name heuristic
//! 2. Arbitrary input never panics: any string either decodes or errors

use proptest::prelude::*;
use saxtree::{
    from_str, from_str_with_config, write_xml, Config, Mapping, MixedContentPolicy, Sequence,
    Value, WhitespacePolicy,
};

/// Scalar leaves that survive a write/decode cycle under the Trim policy:
/// no leading/trailing whitespace, non-empty (empty text decodes back as
/// the empty-element marker, a deliberate asymmetry)
fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Empty),
        "[a-z0-9][a-z0-9 ]{0,10}[a-z0-9]".prop_map(Value::Text),
        "[a-z0-9]".prop_map(Value::Text),
    ]
}

/// Mapping values at the given remaining depth
///
/// Sequences get at least two items so the repeated-name promotion
/// reproduces them, and never nest directly (the element encoding flattens
/// nested sequences, so they cannot round-trip).
fn arb_entry_value(depth: u32) -> BoxedStrategy<Value> {
    if depth == 0 {
        arb_scalar().boxed()
    } else {
        let item = prop_oneof![arb_scalar(), arb_mapping(depth - 1)];
        prop_oneof![
            arb_scalar(),
            arb_mapping(depth - 1),
            proptest::collection::vec(item, 2..4)
                .prop_map(|items| Value::Sequence(Sequence::from(items))),
        ]
        .boxed()
    }
}

/// Non-empty mappings with distinct keys (an empty mapping encodes as an
/// empty element and would decode back as the marker)
fn arb_mapping(depth: u32) -> BoxedStrategy<Value> {
    proptest::collection::btree_map("[a-z]{1,6}", arb_entry_value(depth), 1..4)
        .prop_map(|entries| Value::Mapping(entries.into_iter().collect::<Mapping>()))
        .boxed()
}

proptest! {
    #[test]
    fn roundtrip_preserves_tree(tree in arb_mapping(2)) {
        let xml = write_xml("root", &tree);
        let decoded = from_str(&xml).map_err(|e| {
            TestCaseError::fail(format!("decode failed for {xml}: {e}"))
        })?;
        prop_assert_eq!(decoded, tree);
    }

    #[test]
    fn roundtrip_preserves_padded_scalars_under_preserve(
        padding_left in " {0,3}",
        body in "[a-z]{1,8}",
        padding_right in " {0,3}",
    ) {
        let text = format!("{padding_left}{body}{padding_right}");
        let tree = Value::Mapping(
            [("a".to_string(), Value::Text(text))].into_iter().collect::<Mapping>(),
        );
        let xml = write_xml("root", &tree);
        let config = Config::new(WhitespacePolicy::Preserve, MixedContentPolicy::Fail);
        let decoded = from_str_with_config(&xml, config).map_err(|e| {
            TestCaseError::fail(format!("decode failed for {xml}: {e}"))
        })?;
        prop_assert_eq!(decoded, tree);
    }

    #[test]
    fn arbitrary_input_never_panics(input in ".*") {
        let _ = from_str(&input);
    }

    #[test]
    fn arbitrary_tag_soup_never_panics(input in "[<>/a-z \"=&;!\\[\\]-]{0,64}") {
        let _ = from_str(&input);
    }
}
