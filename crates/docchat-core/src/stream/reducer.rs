//! Turn reducer: folds decoded stream events into render commands.

use std::collections::HashSet;

use serde::Serialize;

use super::decoder::DecodedLine;
use crate::models::{AnswerMode, ContextItem, StreamEvent};
use crate::render::{RenderCommand, Renderer, TurnErrorKind, TurnId};
use crate::session::SessionTracker;

/// Lifecycle of one turn. `Completed` and `Errored` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    Pending,
    Streaming,
    Completed,
    Errored,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, TurnState::Completed | TurnState::Errored)
    }
}

/// Summary of a finished turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub turn: TurnId,
    pub state: TurnState,
    pub answer: String,
    pub mode: Option<AnswerMode>,
    pub citations: Vec<String>,
    pub answer_fragments: usize,
    pub malformed_lines: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Applies stream events for a single turn.
pub struct TurnReducer<'a> {
    turn: TurnId,
    renderer: &'a dyn Renderer,
    session: &'a SessionTracker,
    state: TurnState,
    /// Cleared by the first answer fragment or by an error event.
    awaiting_first_token: bool,
    answer: String,
    answer_fragments: usize,
    mode: Option<AnswerMode>,
    citations: Vec<String>,
    cited: HashSet<String>,
    malformed_lines: usize,
    error: Option<String>,
}

impl<'a> TurnReducer<'a> {
    pub fn new(turn: TurnId, renderer: &'a dyn Renderer, session: &'a SessionTracker) -> Self {
        Self {
            turn,
            renderer,
            session,
            state: TurnState::Pending,
            awaiting_first_token: true,
            answer: String::new(),
            answer_fragments: 0,
            mode: None,
            citations: Vec::new(),
            cited: HashSet::new(),
            malformed_lines: 0,
            error: None,
        }
    }

    pub fn turn(&self) -> TurnId {
        self.turn
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    pub fn apply_line(&mut self, line: DecodedLine) {
        match line {
            DecodedLine::Event(event) => self.apply(event),
            DecodedLine::Malformed { line, error } => {
                self.malformed_lines += 1;
                tracing::warn!(turn = %self.turn, %error, line = %line, "Dropping malformed stream line");
            }
        }
    }

    pub fn apply(&mut self, event: StreamEvent) {
        if self.state == TurnState::Pending {
            self.state = TurnState::Streaming;
        }

        if let Some(session_id) = event.announced_session_id() {
            self.session.set_session_id(session_id);
        }

        match event {
            StreamEvent::MetaInfo { mode, .. } => {
                if let Some(mode) = mode.filter(|m| !m.is_empty()) {
                    let mode = AnswerMode::from_wire(&mode);
                    self.mode = Some(mode);
                    self.emit(RenderCommand::ModeBadge {
                        turn: self.turn,
                        mode,
                    });
                }
            }
            StreamEvent::SessionInfo { .. } => {}
            StreamEvent::Answer { payload } => self.append_answer(payload.unwrap_or_default()),
            StreamEvent::Context { payload } => self.add_citations(&payload.unwrap_or_default()),
            StreamEvent::Error { message } => {
                let message = message.unwrap_or_else(|| "Unknown server error".to_string());
                tracing::warn!(turn = %self.turn, %message, "Backend reported an error");
                self.awaiting_first_token = false;
                self.state = TurnState::Errored;
                self.error = Some(message.clone());
                self.emit(RenderCommand::Error {
                    turn: self.turn,
                    kind: TurnErrorKind::Backend,
                    message,
                });
            }
            StreamEvent::Unknown => {
                tracing::debug!(turn = %self.turn, "Ignoring stream event of unknown type");
            }
        }
    }

    /// Record a failure outside the event stream (connection, HTTP status, read error).
    pub fn fail(&mut self, kind: TurnErrorKind, message: impl Into<String>) {
        let message = message.into();
        self.state = TurnState::Errored;
        self.error = Some(message.clone());
        self.emit(RenderCommand::Error {
            turn: self.turn,
            kind,
            message,
        });
    }

    /// Close the turn once the stream has ended.
    pub fn finish(mut self) -> TurnOutcome {
        if self.state != TurnState::Errored {
            if self.awaiting_first_token {
                self.emit(RenderCommand::EmptyAnswer { turn: self.turn });
            }
            self.state = TurnState::Completed;
        }

        TurnOutcome {
            turn: self.turn,
            state: self.state,
            answer: self.answer,
            mode: self.mode,
            citations: self.citations,
            answer_fragments: self.answer_fragments,
            malformed_lines: self.malformed_lines,
            error: self.error,
        }
    }

    fn append_answer(&mut self, text: String) {
        if self.awaiting_first_token {
            self.awaiting_first_token = false;
            self.emit(RenderCommand::ClearPending { turn: self.turn });
        }
        self.answer_fragments += 1;
        self.answer.push_str(&text);
        self.emit(RenderCommand::AppendAnswer {
            turn: self.turn,
            text,
        });
    }

    fn add_citations(&mut self, items: &[ContextItem]) {
        let fresh: Vec<String> = items
            .iter()
            .map(ContextItem::resolved_filename)
            .filter(|name| self.cited.insert(name.clone()))
            .collect();

        if fresh.is_empty() {
            return;
        }

        self.citations.extend(fresh.iter().cloned());
        self.emit(RenderCommand::Citations {
            turn: self.turn,
            filenames: fresh,
        });
    }

    fn emit(&self, command: RenderCommand) {
        self.renderer.render(command);
    }
}
