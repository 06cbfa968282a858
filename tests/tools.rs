use serde_json::{json, Value};
use trial_scope::{
    data::{QueryParams, Source},
    llm::{
        tools::{self, STUDY_FIELDS},
        ChatMessage, ChatRequest,
    },
    Error,
};

fn params(value: Value) -> QueryParams {
    QueryParams::try_from(value).expect("object")
}

#[test]
fn allowed_status_values_pass() {
    let studies = tools::for_source(Source::Studies);
    studies
        .validate(&params(json!({
            "query.cond": "asthma",
            "filter.overallStatus": ["RECRUITING", "COMPLETED"],
            "fields": STUDY_FIELDS,
        })))
        .expect("valid");
}

#[test]
fn unknown_status_is_rejected() {
    let studies = tools::for_source(Source::Studies);
    let err = studies
        .validate(&params(json!({ "filter.overallStatus": ["RECRUITING", "RUNNING"] })))
        .expect_err("RUNNING is not a status");
    match &err {
        Error::InvalidArgument {
            key,
            value,
            allowed,
        } => {
            assert_eq!(key, "filter.overallStatus");
            assert_eq!(value, "RUNNING");
            assert_eq!(allowed.len(), 14);
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("RUNNING"));
}

#[test]
fn comma_separated_lists_are_checked_per_entry() {
    let studies = tools::for_source(Source::Studies);
    studies
        .validate(&params(json!({
            "filter.overallStatus": "RECRUITING, COMPLETED",
            "fields": "protocolSection.statusModule,protocolSection.designModule"
        })))
        .expect("every entry is allowed");

    let err = studies
        .validate(&params(json!({ "filter.overallStatus": "RECRUITING,RUNNING" })))
        .expect_err("RUNNING is not a status");
    assert!(matches!(err, Error::InvalidArgument { ref value, .. } if value == "RUNNING"));
}

#[test]
fn unknown_field_module_is_rejected() {
    let studies = tools::for_source(Source::Studies);
    let result = studies.validate(&params(json!({ "fields": ["protocolSection.madeUpModule"] })));
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}

#[test]
fn undeclared_keys_pass_through() {
    tools::for_source(Source::Studies)
        .validate(&params(json!({ "countTotal": true })))
        .expect("undeclared keys are not validated");
    tools::for_source(Source::DrugLabeling)
        .validate(&params(json!({ "search": "anything", "limit": 5 })))
        .expect("no enums on labels");
}

#[test]
fn registry_lookup() {
    assert_eq!(tools::registry().len(), 3);
    assert_eq!(tools::lookup("study").map(|t| t.name), Some("study"));
    assert!(tools::lookup("missing").is_none());
    assert_eq!(tools::for_source(Source::DrugLabeling).name, "drugLabeling");
}

#[test]
fn forced_tool_request_shape() {
    let tool = tools::for_source(Source::Studies);
    let request = ChatRequest::streaming("gpt-4o-mini", vec![ChatMessage::user("asthma trials")])
        .force_tool(tool);
    let body = serde_json::to_value(&request).expect("serialize");
    assert_eq!(body["stream"], json!(true));
    assert_eq!(body["messages"][0]["role"], json!("user"));
    assert_eq!(body["tools"][0]["type"], json!("function"));
    assert_eq!(body["tools"][0]["function"]["name"], json!("studies"));
    assert_eq!(body["tool_choice"]["function"]["name"], json!("studies"));
}

#[test]
fn plain_request_omits_tools() {
    let request = ChatRequest::streaming("m", vec![ChatMessage::system("s")]);
    let body = serde_json::to_value(&request).expect("serialize");
    assert!(body.get("tools").is_none());
    assert!(body.get("tool_choice").is_none());
}
