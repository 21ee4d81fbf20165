//! Events carried by the newline-delimited JSON body of `POST /ask`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Label used when a context item carries no usable filename.
pub const UNTITLED_DOCUMENT: &str = "Untitled document";

/// Metadata keys consulted, in priority order, when resolving a citation filename.
const FILENAME_KEYS: [&str; 4] = ["source", "filename", "file_name", "title"];

/// Mode value the backend uses for answers produced without document context.
const GENERAL_MODE: &str = "GENERAL";

/// One record of the answer stream, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Session and answer-mode announcement.
    MetaInfo {
        #[serde(
            default,
            deserialize_with = "lenient_string",
            skip_serializing_if = "Option::is_none"
        )]
        session_id: Option<String>,
        #[serde(
            default,
            deserialize_with = "lenient_string",
            skip_serializing_if = "Option::is_none"
        )]
        mode: Option<String>,
    },
    /// Incremental answer text.
    Answer {
        #[serde(default)]
        payload: Option<String>,
    },
    /// Retrieved passages backing the answer.
    Context {
        #[serde(default, deserialize_with = "lenient_items")]
        payload: Option<Vec<ContextItem>>,
    },
    /// Server-side failure for this turn.
    Error {
        #[serde(default)]
        message: Option<String>,
    },
    /// Older session announcement carrying only the id.
    SessionInfo {
        #[serde(default)]
        payload: Option<String>,
    },
    /// Any `type` this client does not know about.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Interpret an already-parsed JSON line.
    ///
    /// Objects without a `type` field are treated as unknown events rather than
    /// errors. Non-objects, and objects that do not fit the union, are errors.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        let Some(object) = value.as_object() else {
            return Err(serde::de::Error::custom("stream line is not a JSON object"));
        };
        if object.get("type").is_none() {
            return Ok(StreamEvent::Unknown);
        }
        serde_json::from_value(value)
    }

    /// Session id announced by this event, if any.
    ///
    /// Covers both `meta_info` and the legacy `session_info` form. Empty ids
    /// count as absent.
    pub fn announced_session_id(&self) -> Option<&str> {
        let id = match self {
            StreamEvent::MetaInfo { session_id, .. } => session_id.as_deref(),
            StreamEvent::SessionInfo { payload } => payload.as_deref(),
            _ => None,
        };
        id.filter(|id| !id.is_empty())
    }
}

/// Server-declared answer-generation strategy for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Answered from general knowledge, without retrieved documents.
    GeneralKnowledge,
    /// Answered from retrieved document context.
    DocumentContext,
}

impl AnswerMode {
    /// Map the wire value; everything except the general sentinel is document mode.
    pub fn from_wire(mode: &str) -> Self {
        if mode == GENERAL_MODE {
            AnswerMode::GeneralKnowledge
        } else {
            AnswerMode::DocumentContext
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AnswerMode::GeneralKnowledge => "🌐 General Knowledge",
            AnswerMode::DocumentContext => "📄 Document Context",
        }
    }
}

/// One retrieved passage attached to an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub chunk_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rerank_score: Option<f64>,
    #[serde(default, deserialize_with = "lenient_object")]
    pub metadata: Option<Map<String, Value>>,
}

impl ContextItem {
    /// Build an item whose metadata holds a single key, mostly for tests and fixtures.
    pub fn with_metadata(key: &str, value: impl Into<Value>) -> Self {
        let mut metadata = Map::new();
        metadata.insert(key.to_string(), value.into());
        Self {
            metadata: Some(metadata),
            ..Self::default()
        }
    }

    /// Filename this passage is attributed to.
    pub fn resolved_filename(&self) -> String {
        let Some(metadata) = &self.metadata else {
            return UNTITLED_DOCUMENT.to_string();
        };

        FILENAME_KEYS
            .iter()
            .filter_map(|key| metadata.get(*key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .unwrap_or_else(|| UNTITLED_DOCUMENT.to_string())
    }
}

/// Accept ids sent either as strings or as numbers.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Scores arrive as numbers, or occasionally as numeric strings.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
        _ => None,
    })
}

fn lenient_object<'de, D>(deserializer: D) -> Result<Option<Map<String, Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Object(map)) => Some(map),
        _ => None,
    })
}

/// A context payload that is not a list carries no citations; an item of the
/// wrong shape still counts as one untitled passage.
fn lenient_items<'de, D>(deserializer: D) -> Result<Option<Vec<ContextItem>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value::<ContextItem>(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> StreamEvent {
        StreamEvent::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_known_variants() {
        assert_eq!(
            parse(json!({"type": "meta_info", "session_id": "abc123", "mode": "RAG"})),
            StreamEvent::MetaInfo {
                session_id: Some("abc123".to_string()),
                mode: Some("RAG".to_string()),
            }
        );
        assert_eq!(
            parse(json!({"type": "answer", "payload": "Hello"})),
            StreamEvent::Answer {
                payload: Some("Hello".to_string())
            }
        );
        assert_eq!(
            parse(json!({"type": "error", "message": "LLM unavailable"})),
            StreamEvent::Error {
                message: Some("LLM unavailable".to_string())
            }
        );
        assert_eq!(
            parse(json!({"type": "session_info", "payload": "legacy-1"})),
            StreamEvent::SessionInfo {
                payload: Some("legacy-1".to_string())
            }
        );
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        assert_eq!(
            parse(json!({"type": "answer"})),
            StreamEvent::Answer { payload: None }
        );
        assert_eq!(
            parse(json!({"type": "context", "payload": null})),
            StreamEvent::Context { payload: None }
        );
    }

    #[test]
    fn test_unknown_and_untyped_objects_are_ignored() {
        assert_eq!(
            parse(json!({"type": "heartbeat", "ts": 1})),
            StreamEvent::Unknown
        );
        assert_eq!(parse(json!({"payload": "orphan"})), StreamEvent::Unknown);
    }

    #[test]
    fn test_non_object_lines_are_rejected() {
        assert!(StreamEvent::from_value(json!(42)).is_err());
        assert!(StreamEvent::from_value(json!(["answer"])).is_err());
        assert!(StreamEvent::from_value(json!(["meta_info", "hijacked", "GENERAL"])).is_err());
        assert!(StreamEvent::from_value(json!("answer")).is_err());
    }

    #[test]
    fn test_meta_info_accepts_numeric_session_id() {
        assert_eq!(
            parse(json!({"type": "meta_info", "session_id": 12345, "mode": "GENERAL"})),
            StreamEvent::MetaInfo {
                session_id: Some("12345".to_string()),
                mode: Some("GENERAL".to_string()),
            }
        );
        assert_eq!(
            parse(json!({"type": "meta_info", "session_id": {"id": 1}, "mode": "RAG"})),
            StreamEvent::MetaInfo {
                session_id: None,
                mode: Some("RAG".to_string()),
            }
        );
    }

    #[test]
    fn test_context_items_tolerate_unexpected_field_types() {
        let StreamEvent::Context { payload: Some(items) } = parse(json!({
            "type": "context",
            "payload": [
                {"rerank_score": "0.91", "metadata": {"source": "a.pdf"}},
                {"text": 42, "rerank_score": [1], "metadata": {"source": "b.pdf"}},
                {"metadata": "not-an-object"},
                "garbage"
            ]
        })) else {
            panic!("expected a context payload");
        };

        let names: Vec<String> = items.iter().map(ContextItem::resolved_filename).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf", UNTITLED_DOCUMENT, UNTITLED_DOCUMENT]);
        assert_eq!(items[0].rerank_score, Some(0.91));
        assert_eq!(items[1].text.as_deref(), Some("42"));
        assert_eq!(items[1].rerank_score, None);
    }

    #[test]
    fn test_announced_session_id_covers_legacy_form() {
        let legacy = parse(json!({"type": "session_info", "payload": "s-1"}));
        assert_eq!(legacy.announced_session_id(), Some("s-1"));

        let empty = parse(json!({"type": "meta_info", "session_id": ""}));
        assert_eq!(empty.announced_session_id(), None);
    }

    #[test]
    fn test_answer_mode_mapping() {
        assert_eq!(AnswerMode::from_wire("GENERAL"), AnswerMode::GeneralKnowledge);
        assert_eq!(AnswerMode::from_wire("RAG"), AnswerMode::DocumentContext);
        assert_eq!(AnswerMode::from_wire("general"), AnswerMode::DocumentContext);
    }

    #[test]
    fn test_filename_resolution_priority() {
        let item: ContextItem = serde_json::from_value(json!({
            "chunk_id": 17,
            "metadata": {"title": "Title.pdf", "file_name": "file_name.pdf", "source": ""}
        }))
        .unwrap();
        assert_eq!(item.chunk_id.as_deref(), Some("17"));
        assert_eq!(item.resolved_filename(), "file_name.pdf");

        let item = ContextItem::with_metadata("source", "a.pdf");
        assert_eq!(item.resolved_filename(), "a.pdf");
    }

    #[test]
    fn test_filename_falls_back_to_placeholder() {
        assert_eq!(ContextItem::default().resolved_filename(), UNTITLED_DOCUMENT);
        let item = ContextItem::with_metadata("source_method", "vector");
        assert_eq!(item.resolved_filename(), UNTITLED_DOCUMENT);
    }
}
