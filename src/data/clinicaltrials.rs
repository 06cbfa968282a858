//! ClinicalTrials.gov v2 API client.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};
use urlencoding::encode;

use crate::{
    config::Settings,
    data::{build_url, get_json, http_client, QueryParams, Record, Source},
    error::Result,
};

/// Page size used when the caller does not pick one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Modules every search returns, whatever the model asked for. Cards and graph nodes
/// cannot be built without them.
pub const REQUIRED_FIELDS: [&str; 2] = [
    "protocolSection.identificationModule",
    "protocolSection.statusModule",
];

/// One page of `/studies` results.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudiesPage {
    pub studies: Vec<Value>,
    pub next_page_token: Option<String>,
    pub total_count: Option<u64>,
}

impl StudiesPage {
    pub fn into_records(self) -> Vec<Record> {
        self.studies
            .into_iter()
            .map(|raw| Record::from_value(Source::Studies, raw))
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct CtGovClient {
    client: Client,
    base_url: String,
}

impl CtGovClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(http_client(settings)?, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            base_url: settings.ctgov_base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn run(&self, path: &str, params: &QueryParams) -> Result<Value> {
        let url = build_url(&format!("{}{path}", self.base_url), params);
        get_json(&self.client, &url).await
    }

    /// Search studies. `pageSize` defaults to [`DEFAULT_PAGE_SIZE`] and `fields` always
    /// carries [`REQUIRED_FIELDS`].
    #[instrument(skip(self), fields(keys = params.len()))]
    pub async fn studies(&self, params: &QueryParams) -> Result<StudiesPage> {
        let effective = search_params(params);
        let value = self.run("/studies", &effective).await?;
        let page: StudiesPage = serde_json::from_value(value)?;
        info!(count = page.studies.len(), total = ?page.total_count, "fetched studies");
        Ok(page)
    }

    /// Fetch a single study by NCT ID.
    #[instrument(skip(self))]
    pub async fn study(&self, nct_id: &str) -> Result<Value> {
        let path = format!("/studies/{}", encode(nct_id.trim()));
        self.run(&path, &QueryParams::new()).await
    }

    pub async fn studies_metadata(&self) -> Result<Value> {
        self.run("/studies/metadata", &QueryParams::new()).await
    }

    pub async fn search_areas(&self) -> Result<Value> {
        self.run("/studies/search-areas", &QueryParams::new()).await
    }

    pub async fn enums(&self) -> Result<Value> {
        self.run("/studies/enums", &QueryParams::new()).await
    }

    pub async fn stats_size(&self, params: &QueryParams) -> Result<Value> {
        self.run("/stats/size", params).await
    }

    pub async fn field_values(&self, params: &QueryParams) -> Result<Value> {
        self.run("/stats/field/values", params).await
    }

    pub async fn field_sizes(&self, params: &QueryParams) -> Result<Value> {
        self.run("/stats/field/sizes", params).await
    }
}

/// Parameters actually sent to `/studies`: default page size first, then the caller's
/// values, with the required modules appended to `fields`.
pub fn search_params(params: &QueryParams) -> QueryParams {
    let mut effective = QueryParams::new();
    effective.insert("pageSize", DEFAULT_PAGE_SIZE);
    for (key, value) in params.iter() {
        effective.insert(key.clone(), value.clone());
    }
    with_required_fields(&mut effective);
    effective
}

/// Ensure `fields` lists every entry of [`REQUIRED_FIELDS`] exactly once.
pub fn with_required_fields(params: &mut QueryParams) {
    let mut fields = params.string_list("fields");
    for required in REQUIRED_FIELDS {
        if !fields.iter().any(|f| f == required) {
            fields.push(required.to_string());
        }
    }
    params.insert("fields", fields);
}
