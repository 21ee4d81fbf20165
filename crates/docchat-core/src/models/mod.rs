//! Wire types shared with the question-answering backend.

pub mod documents;
pub mod events;
pub mod request;

pub use documents::{DocumentInfo, DocumentListing, IngestResponse};
pub use events::{AnswerMode, ContextItem, StreamEvent, UNTITLED_DOCUMENT};
pub use request::{AskRequest, RetrievalParams};
