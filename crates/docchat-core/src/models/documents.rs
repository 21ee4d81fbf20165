use serde::{Deserialize, Serialize};

/// A stored PDF as listed by `GET /documents`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    /// Backend-formatted timestamp; numeric epochs are kept as their digits.
    #[serde(
        default,
        deserialize_with = "super::events::lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_modified: Option<String>,
}

/// `GET /documents` answers with either a bare array or a `{files: [...]}` wrapper.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DocumentListing {
    Bare(Vec<DocumentInfo>),
    Wrapped {
        #[serde(default)]
        files: Vec<DocumentInfo>,
    },
}

impl DocumentListing {
    pub fn into_files(self) -> Vec<DocumentInfo> {
        match self {
            DocumentListing::Bare(files) => files,
            DocumentListing::Wrapped { files } => files,
        }
    }
}

/// Body returned by a successful `POST /documents/ingest`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    pub chunks_inserted: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}
