use proptest::prelude::*;
use serde_json::{json, Value};
use trial_scope::llm::partial_json::parse;

#[test]
fn truncated_tool_arguments_give_best_effort_object() {
    let value = parse(r#"{"query.cond": "asthma", "fields": ["protocolSection.statusMod"#)
        .expect("prefix parses");
    assert_eq!(
        value,
        json!({ "query.cond": "asthma", "fields": ["protocolSection.statusMod"] })
    );
}

#[test]
fn every_prefix_parses_and_the_whole_converges() {
    let full = r#"{"query.cond": "asthma", "fields": ["protocolSection.statusModule"], "pageSize": 25, "ok": true}"#;
    for end in (0..=full.len()).filter(|i| full.is_char_boundary(*i)) {
        assert!(parse(&full[..end]).is_ok(), "prefix {end} failed");
    }
    let expected: Value = serde_json::from_str(full).expect("valid json");
    assert_eq!(parse(full).expect("full"), expected);
}

#[test]
fn incomplete_members_are_left_out() {
    assert_eq!(parse(r#"{"a": 1, "b"#).expect("parses"), json!({ "a": 1 }));
    assert_eq!(parse(r#"{"a": 1, "b": "#).expect("parses"), json!({ "a": 1 }));
    assert_eq!(parse("").expect("parses"), Value::Null);
}

#[test]
fn truncated_scalars_resolve() {
    assert_eq!(parse(r#"{"a": tr"#).expect("parses"), json!({ "a": true }));
    assert_eq!(parse("[1, 2.").expect("parses"), json!([1, 2]));
    assert_eq!(parse(r#"["caf\u00"#).expect("parses"), json!(["caf"]));
    assert_eq!(parse(r#""😀""#).expect("parses"), json!("😀"));
}

#[test]
fn impossible_prefixes_are_rejected() {
    assert!(parse(r#"{"a" 1}"#).is_err());
    assert!(parse("[1,,2]").is_err());
    assert!(parse("{} x").is_err());
    assert!(parse(r#""\q""#).is_err());
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "\\PC{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z.]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prefixes_of_valid_documents_never_fail(value in arb_json()) {
        let text = serde_json::to_string(&value).expect("serialize");
        for end in (0..=text.len()).filter(|i| text.is_char_boundary(*i)) {
            prop_assert!(parse(&text[..end]).is_ok(), "prefix {:?}", &text[..end]);
        }
        prop_assert_eq!(parse(&text).expect("full"), value);
    }
}
