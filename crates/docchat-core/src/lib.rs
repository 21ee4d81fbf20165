//! DocChat core - client side of a document question-answering chat
//!
//! This crate provides:
//! - Wire types for the `/ask` answer stream and the `/documents` endpoints
//! - An incremental newline-delimited JSON decoder
//! - A per-turn reducer that turns stream events into render commands
//! - A session tracker with pluggable persistence
//! - HTTP clients for asking questions and managing the document library

pub mod client;
pub mod documents;
pub mod error;
mod http_client;
pub mod models;
pub mod render;
pub mod session;
pub mod stream;

pub use client::ChatClient;
pub use documents::{DocumentLibrary, format_bytes};
pub use error::{ClientError, Result};
pub use models::{
    AnswerMode, AskRequest, ContextItem, DocumentInfo, IngestResponse, RetrievalParams,
    StreamEvent,
};
pub use render::{RecordingRenderer, RenderCommand, Renderer, TurnErrorKind, TurnId, TurnView};
pub use session::{MemorySessionPersistence, SessionPersistence, SessionTracker};
pub use stream::{DecodedLine, NdjsonDecoder, TurnOutcome, TurnReducer, TurnState};
