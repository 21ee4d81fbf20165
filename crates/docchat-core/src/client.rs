//! Streaming client for `POST /ask`.

use std::path::Path;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::Client;

use crate::documents::DocumentLibrary;
use crate::error::{ClientError, Result};
use crate::http_client::build_http_client;
use crate::models::{AskRequest, IngestResponse, RetrievalParams};
use crate::render::{RenderCommand, Renderer, TurnErrorKind, TurnId};
use crate::session::SessionTracker;
use crate::stream::{NdjsonDecoder, TurnOutcome, TurnReducer};

/// Runs question/answer turns and keeps the conversation session.
pub struct ChatClient {
    http: Client,
    base_url: String,
    params: RetrievalParams,
    session: Arc<SessionTracker>,
    renderer: Arc<dyn Renderer>,
}

impl ChatClient {
    /// Create a client for the backend at `base_url`.
    pub fn new(
        base_url: &str,
        session: Arc<SessionTracker>,
        renderer: Arc<dyn Renderer>,
    ) -> Result<Self> {
        Ok(Self {
            http: build_http_client()?,
            base_url: normalize_base_url(base_url)?,
            params: RetrievalParams::default(),
            session,
            renderer,
        })
    }

    pub fn with_retrieval_params(mut self, params: RetrievalParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_http_client(mut self, http: Client) -> Self {
        self.http = http;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionTracker> {
        &self.session
    }

    /// Document library client sharing this client's connection pool.
    pub fn documents(&self) -> DocumentLibrary {
        DocumentLibrary::from_parts(self.http.clone(), self.base_url.clone())
    }

    /// Start a new conversation: the next turn is sent without a session id.
    pub fn new_chat(&self) {
        self.session.clear();
    }

    /// Upload a PDF, then reset the session so the next turn sees the new content.
    pub async fn ingest_and_reset(&self, path: &Path) -> Result<IngestResponse> {
        let response = self.documents().ingest(path).await?;
        self.new_chat();
        Ok(response)
    }

    /// Ask one question and stream the answer into the renderer.
    ///
    /// Blank questions are ignored and return `None`. Every failure is rendered
    /// inline and reported through the returned outcome's state.
    pub async fn submit(&self, question: &str) -> Option<TurnOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        let turn = TurnId::new();
        self.renderer.render(RenderCommand::UserQuestion {
            turn,
            text: question.to_string(),
        });
        self.renderer.render(RenderCommand::Pending { turn });

        let mut reducer = TurnReducer::new(turn, self.renderer.as_ref(), &self.session);
        let request = AskRequest::new(question, self.session.session_id(), self.params);
        tracing::info!(
            %turn,
            session_id = ?request.session_id,
            topk = request.topk,
            rerank_topn = request.rerank_topn,
            "Submitting question"
        );

        let response = match self
            .http
            .post(format!("{}/ask", self.base_url))
            .json(&request)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                tracing::error!(%turn, error = %err, "Ask request failed");
                reducer.fail(TurnErrorKind::Connection, format!("Connection error: {err}"));
                return Some(reducer.finish());
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!(%turn, status = status.as_u16(), "Ask request rejected");
            reducer.fail(
                TurnErrorKind::Server {
                    status: status.as_u16(),
                },
                format!("Server error: {status}"),
            );
            return Some(reducer.finish());
        }

        let mut decoder = NdjsonDecoder::new();
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            match chunk {
                Ok(bytes) => {
                    for line in decoder.push(&bytes) {
                        reducer.apply_line(line);
                    }
                }
                Err(err) => {
                    tracing::error!(%turn, error = %err, "Answer stream interrupted");
                    reducer.fail(TurnErrorKind::Connection, format!("Connection error: {err}"));
                    return Some(reducer.finish());
                }
            }
        }

        if let Some(tail) = decoder.finish() {
            tracing::debug!(
                %turn,
                bytes = tail.len(),
                "Discarding unterminated trailing stream fragment"
            );
        }

        let outcome = reducer.finish();
        tracing::info!(
            %turn,
            state = ?outcome.state,
            fragments = outcome.answer_fragments,
            citations = outcome.citations.len(),
            "Turn finished"
        );
        Some(outcome)
    }
}

/// Validate a backend URL and strip trailing slashes so paths can be appended.
pub(crate) fn normalize_base_url(base_url: &str) -> Result<String> {
    let trimmed = base_url.trim().trim_end_matches('/');
    let parsed =
        url::Url::parse(trimmed).map_err(|e| ClientError::InvalidUrl(format!("{base_url}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ClientError::InvalidUrl(format!(
            "{base_url}: unsupported scheme {}",
            parsed.scheme()
        )));
    }
    Ok(trimmed.to_string())
}
