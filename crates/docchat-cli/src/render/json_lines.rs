use std::io::{self, Write};

use docchat_core::{RenderCommand, Renderer};

/// Writes each render command as one JSON line on stdout.
pub struct JsonLinesRenderer;

impl Renderer for JsonLinesRenderer {
    fn render(&self, command: RenderCommand) {
        match serde_json::to_string(&command) {
            Ok(json) => {
                let mut output = io::stdout().lock();
                let _ = writeln!(output, "{}", json);
                let _ = output.flush();
            }
            Err(err) => {
                tracing::warn!("Failed to serialize render command: {}", err);
            }
        }
    }
}
