use anyhow::Result;
use colored::Colorize;
use serde_json::json;

use crate::cli::SessionCommands;
use crate::output::{OutputFormat, json::print_json};
use docchat_core::SessionTracker;

pub fn run(session: &SessionTracker, command: SessionCommands, format: OutputFormat) -> Result<()> {
    match command {
        SessionCommands::Show => show(session, format),
        SessionCommands::Clear => clear(session, format),
    }
}

pub fn show(session: &SessionTracker, format: OutputFormat) -> Result<()> {
    let session_id = session.session_id();

    if format.is_json() {
        return print_json(&json!({ "session_id": session_id }));
    }

    match session_id {
        Some(id) => println!("Session: {}", id.bold()),
        None => println!("{}", "No active session. The next question starts one.".dimmed()),
    }
    Ok(())
}

pub fn clear(session: &SessionTracker, format: OutputFormat) -> Result<()> {
    let previous = session.session_id();
    session.clear();

    if format.is_json() {
        return print_json(&json!({ "cleared": previous.is_some(), "session_id": previous }));
    }

    match previous {
        Some(id) => println!("Cleared session {}", id),
        None => println!("No active session"),
    }
    Ok(())
}
