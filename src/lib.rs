//! LLM-assisted search over ClinicalTrials.gov and OpenFDA drug labels.
//!
//! A question is turned into API parameters through a forced tool call, the matching
//! records are fetched and rendered, a similarity graph is built over them and a second
//! completion summarises them with citations. See [`pipeline::Pipeline`].

pub mod api;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod render;

pub use error::{Error, Result};
