use anyhow::Result;
use colored::Colorize;
use std::sync::Arc;

use crate::config::CliConfig;
use crate::render::CliRenderer;
use docchat_core::{ChatClient, SessionTracker};
use docchat_storage::Storage;

/// Load the session tracker from the state database.
///
/// Falls back to an in-memory session when the database cannot be opened,
/// for example while another docchat process holds it.
pub fn load_session() -> Arc<SessionTracker> {
    match Storage::open_default() {
        Ok(storage) => Arc::new(SessionTracker::load(Arc::new(storage.session_state))),
        Err(err) => {
            tracing::warn!(error = %err, "State database unavailable, session will not persist");
            eprintln!(
                "{} session state unavailable ({err:#}); this session will not be remembered",
                "Warning:".yellow().bold()
            );
            Arc::new(SessionTracker::in_memory())
        }
    }
}

pub fn prepare_client(
    server: Option<&str>,
    config: &CliConfig,
    session: Arc<SessionTracker>,
    renderer: Arc<CliRenderer>,
) -> Result<ChatClient> {
    let base_url = config.resolve_server(server);
    let client = ChatClient::new(&base_url, session, renderer)?
        .with_retrieval_params(config.retrieval_params());
    tracing::debug!(server = %client.base_url(), "Prepared chat client");
    Ok(client)
}

/// Session, renderer and client for commands that talk to the backend.
pub fn connect(
    server: Option<&str>,
    config: &CliConfig,
    renderer: CliRenderer,
) -> Result<(ChatClient, Arc<CliRenderer>)> {
    let renderer = Arc::new(renderer);
    let client = prepare_client(server, config, load_session(), renderer.clone())?;
    Ok((client, renderer))
}
