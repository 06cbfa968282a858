//! Streaming client for an OpenAI-compatible chat-completions endpoint.

use std::collections::VecDeque;

use futures::stream::{self, BoxStream, StreamExt};
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::{
    config::Settings,
    data::http_client,
    error::{Error, Result},
    llm::{
        sse::{DeltaFolder, SseDecoder, StreamEvent},
        ChatRequest,
    },
};

#[derive(Debug, Clone)]
pub struct ChatClient {
    client: Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self::with_client(http_client(settings)?, settings))
    }

    pub fn with_client(client: Client, settings: &Settings) -> Self {
        Self {
            client,
            url: settings.llm_chat_url.clone(),
            api_key: settings.llm_api_key.clone(),
            model: settings.llm_model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streamed completion.
    ///
    /// A non-2xx answer fails here with [`Error::Api`]. Once streaming, failures arrive
    /// as [`StreamEvent::Error`] items and the stream ends after them.
    #[instrument(skip(self, request), fields(model = %request.model, messages = request.messages.len()))]
    pub async fn stream(&self, request: &ChatRequest) -> Result<BoxStream<'static, StreamEvent>> {
        let mut builder = self.client.post(&self.url).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }
        let resp = builder.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, "chat completion rejected");
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }
        info!("streaming chat completion");

        let state = StreamState {
            body: resp.bytes_stream().boxed(),
            decoder: SseDecoder::default(),
            folder: DeltaFolder::default(),
            pending: VecDeque::new(),
            finished: false,
        };
        Ok(stream::unfold(state, |mut state| async move {
            loop {
                if let Some(event) = state.pending.pop_front() {
                    return Some((event, state));
                }
                if state.finished {
                    return None;
                }
                match state.body.next().await {
                    Some(Ok(chunk)) => {
                        let payloads = state.decoder.feed(&chunk);
                        state.absorb(payloads);
                    }
                    Some(Err(err)) => {
                        state.pending.push_back(StreamEvent::Error(err.to_string()));
                        state.finished = true;
                    }
                    None => {
                        let payloads = state.decoder.finish();
                        state.absorb(payloads);
                        state.finished = true;
                    }
                }
            }
        })
        .boxed())
    }
}

struct StreamState<B> {
    body: B,
    decoder: SseDecoder,
    folder: DeltaFolder,
    pending: VecDeque<StreamEvent>,
    finished: bool,
}

impl<B> StreamState<B> {
    fn absorb(&mut self, payloads: Vec<String>) {
        for payload in payloads {
            if let Some(event) = self.folder.fold(&payload) {
                let is_error = matches!(event, StreamEvent::Error(_));
                self.pending.push_back(event);
                if is_error {
                    self.finished = true;
                    return;
                }
            }
        }
        if self.folder.is_done() {
            self.finished = true;
        }
    }
}
