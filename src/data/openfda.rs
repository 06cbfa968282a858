//! OpenFDA drug label client.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    config::Settings,
    data::{build_url, get_json, http_client, QueryParams, Record, Source},
    error::Result,
};

/// Labels returned when the caller does not set `limit`.
pub const DEFAULT_LIMIT: u32 = 10;

/// Response envelope of `/drug/label.json`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LabelPage {
    pub meta: Option<Value>,
    pub results: Vec<Value>,
}

impl LabelPage {
    pub fn into_records(self) -> Vec<Record> {
        self.results
            .into_iter()
            .map(|raw| Record::from_value(Source::DrugLabeling, raw))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct OpenFdaClient {
    client: Client,
    label_url: String,
}

impl OpenFdaClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(http_client(settings)?, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            label_url: settings.openfda_label_url.clone(),
        }
    }

    /// Search drug labels.
    #[instrument(skip(self), fields(keys = params.len()))]
    pub async fn drug_labeling(&self, params: &QueryParams) -> Result<LabelPage> {
        let url = build_url(&self.label_url, &label_params(params));
        let page: LabelPage = serde_json::from_value(get_json(&self.client, &url).await?)?;
        info!(count = page.results.len(), "fetched drug labels");
        Ok(page)
    }
}

/// Parameters actually sent to OpenFDA.
///
/// `searches` is folded into a single `search` expression joined with `AND`; an explicit
/// `search` wins. `limit` defaults to [`DEFAULT_LIMIT`]. Other keys pass through.
pub fn label_params(params: &QueryParams) -> QueryParams {
    let mut out = QueryParams::new();
    let search = match params.get("search").and_then(Value::as_str) {
        Some(search) if !search.trim().is_empty() => Some(search.trim().to_string()),
        _ => {
            let terms = params.string_list("searches");
            (!terms.is_empty()).then(|| terms.join(" AND "))
        }
    };
    if let Some(search) = search {
        out.insert("search", search);
    }
    out.insert(
        "limit",
        params.get("limit").cloned().unwrap_or(DEFAULT_LIMIT.into()),
    );
    for (key, value) in params.iter() {
        if !matches!(key.as_str(), "search" | "searches" | "limit") {
            out.insert(key.clone(), value.clone());
        }
    }
    out
}
