//! Remote data sources: ClinicalTrials.gov and OpenFDA.

pub mod clinicaltrials;
pub mod openfda;
pub mod params;
pub mod records;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    config::Settings,
    error::{Error, Result},
};

pub use params::QueryParams;
pub use records::{Record, Source};

/// Shared HTTP client for every outbound call.
///
/// No request timeout is configured: each call is a single attempt that waits for the
/// remote side to answer or fail.
pub fn http_client(settings: &Settings) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(settings.user_agent())
        .gzip(true)
        .brotli(true)
        .build()?)
}

/// Append `params` to `base` as a query string.
pub fn build_url(base: &str, params: &QueryParams) -> String {
    let query = params.to_query_string();
    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}

/// GET `url` and decode the JSON body, turning a non-2xx status into [`Error::Api`].
pub(crate) async fn get_json(client: &Client, url: &str) -> Result<Value> {
    debug!(%url, "GET");
    let resp = client.get(url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(%url, %status, "remote API returned an error");
        return Err(Error::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.json().await?)
}
