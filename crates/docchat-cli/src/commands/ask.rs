use anyhow::{Result, bail};
use serde_json::json;
use std::process::ExitCode;

use crate::output::{OutputFormat, json::print_json_line};
use crate::render::CliRenderer;
use docchat_core::{ChatClient, TurnState};

/// Ask one question. Exits non-zero when the turn ends in error.
pub async fn run(
    client: &ChatClient,
    renderer: &CliRenderer,
    question: &[String],
    format: OutputFormat,
) -> Result<ExitCode> {
    let question = question.join(" ");
    let Some(outcome) = client.submit(&question).await else {
        bail!("Question is empty");
    };
    renderer.end_turn();

    if format.is_json() {
        print_json_line(&json!({ "command": "turn_finished", "outcome": outcome }))?;
    }

    Ok(if outcome.state == TurnState::Errored {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
