use std::io::{self, Write};

use colored::Colorize;
use docchat_core::{AnswerMode, RenderCommand, Renderer, TurnErrorKind};
use indicatif::ProgressBar;
use parking_lot::{Mutex, MutexGuard};

use crate::output::progress::spinner;

const PENDING_MESSAGE: &str = "Thinking...";

#[derive(Default)]
struct TerminalState {
    spinner: Option<ProgressBar>,
    mid_line: bool,
}

impl TerminalState {
    fn stop_spinner(&mut self) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
    }

    /// Move to a fresh line before printing a block.
    fn break_line(&mut self) {
        if self.mid_line {
            println!();
            self.mid_line = false;
        }
    }
}

/// Coloured, streaming terminal output.
///
/// Commands from one turn arrive in order; the CLI never overlaps turns, so a
/// single cursor state is enough.
pub struct TerminalRenderer {
    echo_question: bool,
    state: Mutex<TerminalState>,
}

impl TerminalRenderer {
    /// `echo_question` prints the question line; the chat prompt already shows it.
    pub fn new(echo_question: bool) -> Self {
        Self {
            echo_question,
            state: Mutex::new(TerminalState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, TerminalState> {
        self.state.lock()
    }

    /// Close the turn's output block.
    pub fn end_turn(&self) {
        let mut state = self.state();
        state.stop_spinner();
        state.break_line();
        println!();
    }
}

fn badge(mode: AnswerMode) -> String {
    let label = format!("[{}]", mode.label());
    match mode {
        AnswerMode::GeneralKnowledge => label.yellow().to_string(),
        AnswerMode::DocumentContext => label.green().to_string(),
    }
}

impl Renderer for TerminalRenderer {
    fn render(&self, command: RenderCommand) {
        let mut state = self.state();

        match command {
            RenderCommand::UserQuestion { text, .. } => {
                if self.echo_question {
                    println!("{} {}", "❯".cyan().bold(), text.bold());
                }
            }
            RenderCommand::Pending { .. } => {
                state.stop_spinner();
                state.spinner = Some(spinner(PENDING_MESSAGE));
            }
            RenderCommand::ClearPending { .. } => state.stop_spinner(),
            RenderCommand::ModeBadge { mode, .. } => match state.spinner.clone() {
                Some(pb) => pb.println(badge(mode)),
                None => {
                    state.break_line();
                    println!("{}", badge(mode));
                }
            },
            RenderCommand::AppendAnswer { text, .. } => {
                state.stop_spinner();
                print!("{text}");
                let _ = io::stdout().flush();
                state.mid_line = !text.ends_with('\n');
            }
            RenderCommand::Citations { filenames, .. } => {
                state.stop_spinner();
                state.break_line();
                println!("{}", "Sources:".dimmed().bold());
                for filename in filenames {
                    println!("  {} {}", "•".dimmed(), filename.cyan());
                }
            }
            RenderCommand::Error { kind, message, .. } => {
                state.stop_spinner();
                state.break_line();
                let prefix = match kind {
                    TurnErrorKind::Backend => "✖",
                    TurnErrorKind::Connection | TurnErrorKind::Server { .. } => "⚠",
                };
                println!("{} {}", prefix.red().bold(), message.red());
            }
            RenderCommand::EmptyAnswer { .. } => {
                state.stop_spinner();
                state.break_line();
                println!("{}", "(The server returned no content.)".dimmed().italic());
            }
        }
    }
}
