mod common;

use std::path::PathBuf;

use axum::{
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use trial_scope::{
    api::{self, routes::Renderer, types::HtmlDto, AppState},
    pipeline::{PipelineEvent, Target},
};

async fn app(upstream: &str) -> String {
    let state = AppState::new(common::settings(upstream)).expect("state");
    common::spawn(api::router(state, PathBuf::from("static"))).await
}

#[test]
fn started_clears_stale_regions() {
    let mut renderer = Renderer::new(0.7);
    let updates = renderer.render(PipelineEvent::Started);
    let targets: Vec<Target> = updates.iter().map(|u| u.target).collect();
    assert_eq!(targets, [Target::Error, Target::Network, Target::Summary]);
    assert!(updates.iter().all(|u| u.html.is_empty()));

    let error = renderer.render(PipelineEvent::Error("API Error 500: boom".into()));
    assert_eq!(error[0].target, Target::Error);
    assert!(error[0].html.contains("alert-danger"));
    assert!(error[0].html.contains("boom"));
}

#[tokio::test]
async fn edges_and_tools_routes() {
    let base = app("http://127.0.0.1:9").await;
    let client = reqwest::Client::new();

    let edges: Value = client
        .post(format!("{base}/api/edges"))
        .json(&json!({ "similarity": [[1.0, 0.9], [0.9, 1.0]], "threshold": 0.8 }))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(edges, json!([{ "source": 0, "target": 1, "similarity": 0.9 }]));

    let tools: Value = client
        .get(format!("{base}/api/tools"))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert_eq!(tools.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn render_route_scopes_selection() {
    let base = app("http://127.0.0.1:9").await;
    let resp: HtmlDto = reqwest::Client::new()
        .post(format!("{base}/api/render"))
        .json(&json!({
            "source": "studies",
            "records": [
                common::study("NCT1", "First", "RECRUITING"),
                common::study("NCT2", "Second", "COMPLETED")
            ],
            "selected": ["NCT2"]
        }))
        .send()
        .await
        .expect("send")
        .json()
        .await
        .expect("json");
    assert!(resp.html.contains("Second"));
    assert!(!resp.html.contains("First"));
    assert!(resp.html.contains("list-group-item-warning"));
}

async fn chat(Json(body): Json<Value>) -> Response {
    let chunks = if body.get("tools").is_some() {
        common::tool_call_chunks("studies", &[r#"{"query.cond": "asthma"}"#])
    } else {
        common::content_chunks(&["Nothing to add."])
    };
    common::event_stream(common::sse_body(&chunks))
}

#[tokio::test]
async fn search_streams_render_events() {
    let upstream = common::spawn(
        Router::new()
            .route("/chat", post(chat))
            .route("/ctgov/studies", get(|| async { Json(json!({ "studies": [] })) })),
    )
    .await;
    let base = app(&upstream).await;

    let body = reqwest::Client::new()
        .get(format!("{base}/api/search?q=asthma&source=studies"))
        .send()
        .await
        .expect("send")
        .text()
        .await
        .expect("body");

    assert!(body.contains("event: render"));
    assert!(body.contains(r#""target":"search-params""#));
    assert!(body.contains("No studies found"));
    assert!(body.contains("event: done"));
    assert!(!body.contains("alert-danger"));
}
