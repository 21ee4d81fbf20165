use serde::{Deserialize, Serialize};

/// Retrieval knobs sent with every question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalParams {
    /// Number of passages the backend retrieves before reranking.
    pub topk: u32,
    /// Number of passages kept after reranking.
    pub rerank_topn: u32,
}

impl Default for RetrievalParams {
    fn default() -> Self {
        Self {
            topk: 10,
            rerank_topn: 5,
        }
    }
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    /// Serialized as `null` when no session is active.
    pub session_id: Option<String>,
    pub topk: u32,
    pub rerank_topn: u32,
}

impl AskRequest {
    pub fn new(
        question: impl Into<String>,
        session_id: Option<String>,
        params: RetrievalParams,
    ) -> Self {
        Self {
            question: question.into(),
            session_id,
            topk: params.topk,
            rerank_topn: params.rerank_topn,
        }
    }
}
