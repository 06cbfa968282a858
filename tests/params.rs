use serde_json::{json, Value};
use trial_scope::{
    data::{
        clinicaltrials::{search_params, DEFAULT_PAGE_SIZE, REQUIRED_FIELDS},
        openfda::label_params,
        QueryParams,
    },
    Error,
};

fn params(value: Value) -> QueryParams {
    QueryParams::try_from(value).expect("object")
}

#[test]
fn required_fields_are_added_once() {
    let effective = search_params(&params(json!({
        "query.cond": "asthma",
        "fields": ["protocolSection.statusModule", "protocolSection.designModule"]
    })));
    let fields = effective.string_list("fields");
    assert_eq!(
        fields,
        [
            "protocolSection.statusModule",
            "protocolSection.designModule",
            "protocolSection.identificationModule",
        ]
    );
    for required in REQUIRED_FIELDS {
        assert_eq!(fields.iter().filter(|f| *f == required).count(), 1);
    }
}

#[test]
fn required_fields_added_when_fields_missing() {
    let effective = search_params(&params(json!({ "query.term": "phase 3" })));
    assert_eq!(effective.string_list("fields"), REQUIRED_FIELDS);
    assert_eq!(effective.get("pageSize"), Some(&json!(DEFAULT_PAGE_SIZE)));
}

#[test]
fn caller_page_size_wins() {
    let effective = search_params(&params(json!({ "pageSize": 50 })));
    assert_eq!(effective.get("pageSize"), Some(&json!(50)));
    assert_eq!(effective.iter().next().map(|(k, _)| k.as_str()), Some("pageSize"));
}

#[test]
fn query_string_joins_arrays_and_encodes() {
    let p = params(json!({
        "query.cond": "heart failure",
        "filter.overallStatus": ["RECRUITING", "COMPLETED"],
        "skip": null
    }));
    assert_eq!(
        p.to_query_string(),
        "query.cond=heart%20failure&filter.overallStatus=RECRUITING%2CCOMPLETED"
    );
}

#[test]
fn label_searches_are_combined() {
    let effective = label_params(&params(json!({
        "searches": ["openfda.generic_name:metformin", "warnings:lactic"]
    })));
    assert_eq!(
        effective.get("search"),
        Some(&json!("openfda.generic_name:metformin AND warnings:lactic"))
    );
    assert_eq!(effective.get("limit"), Some(&json!(10)));
}

#[test]
fn explicit_label_search_wins() {
    let effective = label_params(&params(json!({
        "search": "boxed_warning:suicidal",
        "searches": ["ignored:yes"],
        "limit": 3
    })));
    assert_eq!(effective.get("search"), Some(&json!("boxed_warning:suicidal")));
    assert_eq!(effective.get("limit"), Some(&json!(3)));
    assert!(!effective.contains_key("searches"));
}

#[test]
fn arguments_must_be_an_object() {
    assert!(QueryParams::try_from(Value::Null).expect("null is empty").is_empty());
    let err = QueryParams::try_from(json!(["a"])).expect_err("array rejected");
    assert!(matches!(err, Error::ArgumentsNotObject("an array")));
}

#[test]
fn partial_values_become_empty_params() {
    assert!(QueryParams::from_partial(&json!("still streaming")).is_empty());
    assert_eq!(QueryParams::from_partial(&json!({ "a": 1 })).len(), 1);
}
