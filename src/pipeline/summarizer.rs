//! Answering the question from the fetched records, with citations.

use futures::StreamExt;
use serde_json::Value;
use tracing::{info, instrument};

use crate::{
    data::Source,
    error::{Error, Result},
    llm::{ChatClient, ChatMessage, ChatRequest, StreamEvent},
    pipeline::{PipelineEvent, Run, SearchOutcome},
};

/// Records serialized into the model's context.
pub const MAX_CONTEXT_RECORDS: usize = 10;

const STUDIES_SYSTEM: &str =
    "Find studies that will have the most relevant answers to the user question";
const LABELS_SYSTEM: &str =
    "Find drug labels that will have the most relevant answers to the user question";

const STUDIES_INSTRUCTIONS: &str = "Answer the user question ONLY using these studies, in one or two paragraphs.
Highlight key words in **bold** so that just reading the bold words gives you the answer.
Cite the relevant NCT IDs inline like this: [NCTnnnn](https://clinicaltrials.gov/study/NCTnnnn).

Then list 1-line summaries of the studies with the most relevant snippet supporting the answer, like this:

- [NCTnnnn](https://clinicaltrials.gov/study/NCTnnnn): [1-line summary of the study]";

const LABELS_INSTRUCTIONS: &str = "Answer the user question ONLY using these drug labels, in one or two paragraphs.
Highlight key words in **bold** so that just reading the bold words gives you the answer.
Cite the relevant labels inline by brand name, linking the set_id like this: [Brand](https://dailymed.nlm.nih.gov/dailymed/lookup.cfm?setid=SET_ID).

Then list 1-line summaries of the labels with the most relevant snippet supporting the answer, like this:

- [Brand](https://dailymed.nlm.nih.gov/dailymed/lookup.cfm?setid=SET_ID): [1-line summary of the label]";

/// Longest prefix of `text` with at most `max_chars` characters.
///
/// The cut always lands on a character boundary but may fall in the middle of a JSON
/// record; the model is expected to cope with a truncated tail.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Pretty JSON of the first [`MAX_CONTEXT_RECORDS`] raw records, cut to the source budget.
pub fn context(outcome: &SearchOutcome) -> Result<String> {
    let raws: Vec<&Value> = outcome
        .records
        .iter()
        .take(MAX_CONTEXT_RECORDS)
        .map(|record| record.raw())
        .collect();
    let json = serde_json::to_string_pretty(&raws)?;
    Ok(truncate_chars(&json, outcome.source.summary_budget()).to_string())
}

pub fn request(model: &str, question: &str, outcome: &SearchOutcome) -> Result<ChatRequest> {
    let (system, instructions) = match outcome.source {
        Source::Studies => (STUDIES_SYSTEM, STUDIES_INSTRUCTIONS),
        Source::DrugLabeling => (LABELS_SYSTEM, LABELS_INSTRUCTIONS),
    };
    Ok(ChatRequest::streaming(
        model,
        vec![
            ChatMessage::system(system),
            ChatMessage::user(question),
            ChatMessage::assistant(context(outcome)?),
            ChatMessage::user(instructions),
        ],
    ))
}

/// Stream the answer, emitting the cumulative Markdown after every chunk.
#[instrument(skip(chat, outcome, run), fields(records = outcome.records.len()))]
pub async fn summarize(
    chat: &ChatClient,
    question: &str,
    outcome: &SearchOutcome,
    run: &mut Run<'_>,
) -> Result<String> {
    let mut events = chat
        .stream(&request(chat.model(), question, outcome)?)
        .await?;
    let mut markdown = String::new();

    while let Some(event) = events.next().await {
        match event {
            StreamEvent::Content(text) => {
                markdown = text;
                run.emit(PipelineEvent::Summary {
                    markdown: markdown.clone(),
                    done: false,
                })?;
            }
            StreamEvent::ToolArgs { .. } => {}
            StreamEvent::Error(message) => return Err(Error::Stream(message)),
        }
    }

    run.emit(PipelineEvent::Summary {
        markdown: markdown.clone(),
        done: true,
    })?;
    info!(len = markdown.len(), "summary complete");
    Ok(markdown)
}
