//! Pairwise similarity between fetched records and the thresholded graph built on it.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    config::Settings,
    data::{http_client, Record},
    error::{Error, Result},
    render::{label_color, status_color},
};

/// Initial slider position.
pub const DEFAULT_THRESHOLD: f64 = 0.7;
/// Slider granularity.
pub const THRESHOLD_STEP: f64 = 0.01;

#[derive(Debug, Serialize)]
struct SimilarityRequest<'a> {
    model: &'a str,
    docs: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SimilarityResponse {
    similarity: Vec<Vec<f64>>,
}

/// Client for the batched document-similarity endpoint.
#[derive(Debug, Clone)]
pub struct SimilarityClient {
    client: Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl SimilarityClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(http_client(settings)?, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            url: settings.llm_similarity_url.clone(),
            model: settings.embedding_model.clone(),
            api_key: settings.llm_api_key.clone(),
        }
    }

    /// Similarity of every document to every other, in one request.
    ///
    /// No request is made for an empty list. Any failure, including a matrix that is
    /// not `docs.len()` square, is reported as [`Error::Similarity`].
    #[instrument(skip(self, docs), fields(docs = docs.len()))]
    pub async fn similarity(&self, docs: &[String]) -> Result<Vec<Vec<f64>>> {
        if docs.is_empty() {
            return Ok(Vec::new());
        }
        let mut builder = self.client.post(&self.url).json(&SimilarityRequest {
            model: &self.model,
            docs,
        });
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder
            .send()
            .await
            .map_err(|err| Error::Similarity(err.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "similarity request rejected");
            return Err(Error::Similarity(format!("{}: {body}", status.as_u16())));
        }
        let payload: SimilarityResponse = resp
            .json()
            .await
            .map_err(|err| Error::Similarity(err.to_string()))?;
        check_square(&payload.similarity, docs.len())?;
        info!("similarity matrix received");
        Ok(payload.similarity)
    }
}

fn check_square(matrix: &[Vec<f64>], n: usize) -> Result<()> {
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(Error::Similarity(format!(
            "expected a {n}x{n} matrix, got {} rows",
            matrix.len()
        )));
    }
    Ok(())
}

/// Graph node for one record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub label: String,
    pub color: &'static str,
}

/// Undirected edge between records `source` and `target` (`source < target`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub similarity: f64,
}

/// Records, their similarity matrix and the current threshold.
///
/// Moving the threshold only recomputes edges; the matrix is never fetched again.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarityGraph {
    pub nodes: Vec<GraphNode>,
    pub similarity: Vec<Vec<f64>>,
    pub threshold: f64,
}

impl SimilarityGraph {
    pub fn new(records: &[Record], similarity: Vec<Vec<f64>>, threshold: f64) -> Result<Self> {
        check_square(&similarity, records.len())?;
        Ok(Self {
            nodes: records.iter().map(node).collect(),
            similarity,
            threshold: clamp_threshold(threshold),
        })
    }

    /// Edges at the current threshold.
    pub fn edges(&self) -> Vec<Edge> {
        edges(&self.similarity, self.threshold)
    }

    /// Same graph at another threshold.
    pub fn with_threshold(&self, threshold: f64) -> Self {
        Self {
            threshold: clamp_threshold(threshold),
            ..self.clone()
        }
    }
}

/// Pairs `i < j` with `similarity[i][j] >= threshold`. Self-pairs are never edges.
pub fn edges(similarity: &[Vec<f64>], threshold: f64) -> Vec<Edge> {
    similarity
        .iter()
        .enumerate()
        .flat_map(|(i, row)| {
            row.iter()
                .enumerate()
                .skip(i + 1)
                .filter(move |(_, value)| **value >= threshold)
                .map(move |(j, value)| Edge {
                    source: i,
                    target: j,
                    similarity: *value,
                })
        })
        .collect()
}

fn clamp_threshold(threshold: f64) -> f64 {
    if threshold.is_nan() {
        DEFAULT_THRESHOLD
    } else {
        threshold.clamp(0.0, 1.0)
    }
}

fn node(record: &Record) -> GraphNode {
    let (label, color) = match record {
        Record::Study(study) => (
            study.view.brief_title().unwrap_or_default().to_string(),
            status_color(study.view.overall_status()),
        ),
        Record::Label(label) => (
            label
                .view
                .brand_name()
                .or(label.view.generic_name())
                .unwrap_or_default()
                .to_string(),
            label_color(&label.view),
        ),
    };
    GraphNode {
        id: record.id().unwrap_or_default().to_string(),
        label,
        color,
    }
}

/// Documents sent for embedding, one per record.
pub fn documents(records: &[Record]) -> Vec<String> {
    records.iter().map(Record::similarity_document).collect()
}

/// Fetch similarity for `records` and build the graph.
///
/// `Ok(None)` when there is nothing to compare.
pub async fn build_graph(
    client: &SimilarityClient,
    records: &[Record],
    threshold: f64,
) -> Result<Option<SimilarityGraph>> {
    if records.is_empty() {
        return Ok(None);
    }
    let matrix = client.similarity(&documents(records)).await?;
    SimilarityGraph::new(records, matrix, threshold).map(Some)
}
