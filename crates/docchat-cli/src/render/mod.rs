mod json_lines;
mod terminal;

use docchat_core::{RenderCommand, Renderer};

pub use json_lines::JsonLinesRenderer;
pub use terminal::TerminalRenderer;

use crate::output::OutputFormat;

/// Renderer selected by `--format`.
pub enum CliRenderer {
    Terminal(TerminalRenderer),
    JsonLines(JsonLinesRenderer),
}

impl CliRenderer {
    pub fn for_format(format: OutputFormat, echo_question: bool) -> Self {
        if format.is_json() {
            CliRenderer::JsonLines(JsonLinesRenderer)
        } else {
            CliRenderer::Terminal(TerminalRenderer::new(echo_question))
        }
    }

    pub fn end_turn(&self) {
        if let CliRenderer::Terminal(terminal) = self {
            terminal.end_turn();
        }
    }
}

impl Renderer for CliRenderer {
    fn render(&self, command: RenderCommand) {
        match self {
            CliRenderer::Terminal(terminal) => terminal.render(command),
            CliRenderer::JsonLines(json) => json.render(command),
        }
    }
}
