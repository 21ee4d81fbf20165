//! Render port.
//!
//! The turn reducer never touches a display directly. It emits
//! [`RenderCommand`]s addressed to one turn, and a [`Renderer`] decides what
//! they look like: coloured terminal output, JSON lines, or a recording for
//! tests.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;
use uuid::Uuid;

use crate::models::AnswerMode;

/// Identifies the render target of one question/answer turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

/// Why a turn ended in error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnErrorKind {
    /// The request could not be sent or the body could not be read.
    Connection,
    /// The backend answered with a non-success status.
    Server { status: u16 },
    /// The backend sent an `error` event.
    Backend,
}

/// A single additive change to one turn's display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum RenderCommand {
    UserQuestion {
        turn: TurnId,
        text: String,
    },
    /// Show the "thinking" placeholder.
    Pending {
        turn: TurnId,
    },
    /// Remove the placeholder; sent once, before the first answer fragment.
    ClearPending {
        turn: TurnId,
    },
    /// Append text; newlines inside `text` are line breaks.
    AppendAnswer {
        turn: TurnId,
        text: String,
    },
    /// Create the mode badge, or replace it if the turn already has one.
    ModeBadge {
        turn: TurnId,
        mode: AnswerMode,
    },
    /// Append a block of source citations.
    Citations {
        turn: TurnId,
        filenames: Vec<String>,
    },
    Error {
        turn: TurnId,
        kind: TurnErrorKind,
        message: String,
    },
    /// The stream finished without any answer text.
    EmptyAnswer {
        turn: TurnId,
    },
}

impl RenderCommand {
    pub fn turn(&self) -> TurnId {
        match self {
            RenderCommand::UserQuestion { turn, .. }
            | RenderCommand::Pending { turn }
            | RenderCommand::ClearPending { turn }
            | RenderCommand::AppendAnswer { turn, .. }
            | RenderCommand::ModeBadge { turn, .. }
            | RenderCommand::Citations { turn, .. }
            | RenderCommand::Error { turn, .. }
            | RenderCommand::EmptyAnswer { turn } => *turn,
        }
    }
}

/// Display adapter for render commands.
///
/// Shared between overlapping turns, so implementations take `&self`.
pub trait Renderer: Send + Sync {
    fn render(&self, command: RenderCommand);
}

/// Accumulated display state of one turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnView {
    pub question: Option<String>,
    pub pending: bool,
    pub answer: String,
    pub badge: Option<AnswerMode>,
    pub citations: Vec<String>,
    pub citation_blocks: usize,
    pub error: Option<(TurnErrorKind, String)>,
    pub empty: bool,
}

impl TurnView {
    fn apply(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::UserQuestion { text, .. } => self.question = Some(text.clone()),
            RenderCommand::Pending { .. } => self.pending = true,
            RenderCommand::ClearPending { .. } => self.pending = false,
            RenderCommand::AppendAnswer { text, .. } => self.answer.push_str(text),
            RenderCommand::ModeBadge { mode, .. } => self.badge = Some(*mode),
            RenderCommand::Citations { filenames, .. } => {
                self.citation_blocks += 1;
                self.citations.extend(filenames.iter().cloned());
            }
            RenderCommand::Error { kind, message, .. } => {
                self.pending = false;
                self.error = Some((*kind, message.clone()));
            }
            RenderCommand::EmptyAnswer { .. } => {
                self.pending = false;
                self.empty = true;
            }
        }
    }
}

/// Renderer that keeps every command, for tests and headless use.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    commands: Mutex<Vec<RenderCommand>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> Vec<RenderCommand> {
        self.commands.lock().clone()
    }

    pub fn commands_for(&self, turn: TurnId) -> Vec<RenderCommand> {
        self.commands
            .lock()
            .iter()
            .filter(|c| c.turn() == turn)
            .cloned()
            .collect()
    }

    /// Fold the commands addressed to `turn`.
    pub fn view(&self, turn: TurnId) -> TurnView {
        let mut view = TurnView::default();
        for command in self.commands.lock().iter().filter(|c| c.turn() == turn) {
            view.apply(command);
        }
        view
    }

    /// Fold every recorded turn, keyed by id.
    pub fn views(&self) -> HashMap<TurnId, TurnView> {
        let mut views: HashMap<TurnId, TurnView> = HashMap::new();
        for command in self.commands.lock().iter() {
            views.entry(command.turn()).or_default().apply(command);
        }
        views
    }
}

impl Renderer for RecordingRenderer {
    fn render(&self, command: RenderCommand) {
        self.commands.lock().push(command);
    }
}
