mod common;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use trial_scope::{
    data::{clinicaltrials::CtGovClient, openfda::OpenFdaClient, QueryParams},
    Error,
};

type Seen = Arc<Mutex<Vec<HashMap<String, String>>>>;

async fn studies(State(seen): State<Seen>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    seen.lock().expect("lock").push(query);
    Json(json!({
        "studies": [common::study("NCT100", "Asthma study", "RECRUITING")],
        "totalCount": 1
    }))
}

async fn study(Path(nct_id): Path<String>) -> Result<Json<Value>, (StatusCode, String)> {
    if nct_id == "NCT100" {
        Ok(Json(common::study("NCT100", "Asthma study", "RECRUITING")))
    } else {
        Err((StatusCode::NOT_FOUND, format!("{nct_id} not found")))
    }
}

async fn labels(State(seen): State<Seen>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    seen.lock().expect("lock").push(query);
    Json(json!({ "meta": {}, "results": [{ "set_id": "s1", "openfda": { "brand_name": ["X"] } }] }))
}

async fn fake() -> (String, Seen) {
    let seen = Seen::default();
    let router = Router::new()
        .route("/ctgov/studies", get(studies))
        .route("/ctgov/studies/metadata", get(|| async { Json(json!([{ "name": "protocolSection" }])) }))
        .route("/ctgov/studies/:nct_id", get(study))
        .route("/ctgov/stats/size", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "internal error") }))
        .route("/label.json", get(labels))
        .with_state(seen.clone());
    (common::spawn(router).await, seen)
}

#[tokio::test]
async fn studies_sends_defaults_and_required_fields() {
    let (base, seen) = fake().await;
    let client = CtGovClient::new(&common::settings(&base)).expect("client");
    let params = QueryParams::try_from(json!({
        "query.cond": "asthma",
        "fields": ["protocolSection.statusModule"]
    }))
    .expect("object");

    let page = client.studies(&params).await.expect("studies");
    assert_eq!(page.total_count, Some(1));
    let records = page.into_records();
    assert_eq!(records[0].id(), Some("NCT100"));

    let query = seen.lock().expect("lock").pop().expect("request seen");
    assert_eq!(query["pageSize"], "10");
    assert_eq!(query["query.cond"], "asthma");
    assert_eq!(
        query["fields"],
        "protocolSection.statusModule,protocolSection.identificationModule"
    );
}

#[tokio::test]
async fn single_study_and_metadata() {
    let (base, _) = fake().await;
    let client = CtGovClient::new(&common::settings(&base)).expect("client");
    let study = client.study("NCT100").await.expect("study");
    assert_eq!(
        study["protocolSection"]["identificationModule"]["nctId"],
        json!("NCT100")
    );
    let metadata = client.studies_metadata().await.expect("metadata");
    assert!(metadata.is_array());

    let err = client.study("NCT404").await.expect_err("missing");
    assert!(matches!(err, Error::Api { status: 404, .. }));
}

#[tokio::test]
async fn server_error_carries_status_and_body() {
    let (base, _) = fake().await;
    let client = CtGovClient::new(&common::settings(&base)).expect("client");
    let err = client
        .stats_size(&QueryParams::new())
        .await
        .expect_err("500");
    let message = err.to_string();
    assert!(message.contains("500"), "{message}");
    assert!(message.contains("internal error"), "{message}");
}

#[tokio::test]
async fn label_searches_are_joined() {
    let (base, seen) = fake().await;
    let client = OpenFdaClient::new(&common::settings(&base)).expect("client");
    let params = QueryParams::try_from(json!({
        "searches": ["openfda.brand_name:X", "warnings:liver"]
    }))
    .expect("object");
    let page = client.drug_labeling(&params).await.expect("labels");
    assert_eq!(page.into_records()[0].id(), Some("s1"));

    let query = seen.lock().expect("lock").pop().expect("request seen");
    assert_eq!(query["search"], "openfda.brand_name:X AND warnings:liver");
    assert_eq!(query["limit"], "10");
    assert!(!query.contains_key("searches"));
}
