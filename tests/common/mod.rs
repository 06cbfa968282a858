#![allow(dead_code)]

use axum::{
    http::header,
    response::{IntoResponse, Response},
    Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use trial_scope::config::Settings;

/// Serve `router` on an ephemeral local port and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}

/// Settings pointing every remote endpoint at the fake server under `base`.
pub fn settings(base: &str) -> Settings {
    Settings {
        ctgov_base_url: format!("{base}/ctgov"),
        openfda_label_url: format!("{base}/label.json"),
        llm_chat_url: format!("{base}/chat"),
        llm_similarity_url: format!("{base}/similarity"),
        llm_api_key: Some("test-key".into()),
        ..Settings::default()
    }
}

/// An OpenAI-style event stream body for `chunks`, terminated by `[DONE]`.
pub fn sse_body(chunks: &[Value]) -> String {
    let mut body: String = chunks
        .iter()
        .map(|chunk| format!("data: {chunk}\n\n"))
        .collect();
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn event_stream(body: String) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

pub fn tool_call_chunks(name: &str, pieces: &[&str]) -> Vec<Value> {
    pieces
        .iter()
        .enumerate()
        .map(|(i, piece)| {
            let function = if i == 0 {
                json!({ "name": name, "arguments": piece })
            } else {
                json!({ "arguments": piece })
            };
            json!({ "choices": [{ "delta": { "tool_calls": [{ "index": 0, "function": function }] } }] })
        })
        .collect()
}

pub fn content_chunks(pieces: &[&str]) -> Vec<Value> {
    pieces
        .iter()
        .map(|piece| json!({ "choices": [{ "delta": { "content": piece } }] }))
        .collect()
}

pub fn study(nct_id: &str, title: &str, status: &str) -> Value {
    json!({
        "protocolSection": {
            "identificationModule": {
                "nctId": nct_id,
                "briefTitle": title,
                "officialTitle": format!("Official {title}")
            },
            "statusModule": {
                "overallStatus": status,
                "startDateStruct": { "date": "2021-03" },
                "primaryCompletionDateStruct": { "date": "2023-09-30" }
            }
        }
    })
}
