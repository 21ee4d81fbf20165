use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

#[derive(Parser)]
#[command(name = "docchat")]
#[command(version, about = "DocChat - chat with your PDF library")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Backend base URL (defaults to the config file, then http://localhost:8000)
    #[arg(long, global = true, env = "DOCCHAT_SERVER")]
    pub server: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Ask a single question and stream the answer
    Ask {
        /// Question text
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },

    /// Start an interactive chat (default when no command is given)
    Chat,

    /// Document library
    Docs {
        #[command(subcommand)]
        command: DocsCommands,
    },

    /// Conversation session
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
pub enum DocsCommands {
    /// List stored documents
    List,

    /// Upload a PDF for ingestion (starts a new chat session)
    Upload {
        /// Path to the PDF file
        path: PathBuf,
    },

    /// Download a stored document
    View {
        /// Stored filename
        filename: String,

        /// Output path (defaults to the filename in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the URL that serves a stored document
    Url {
        /// Stored filename
        filename: String,
    },
}

#[derive(Subcommand)]
pub enum SessionCommands {
    /// Show the current session id
    Show,

    /// Forget the current session; the next question starts a new chat
    Clear,
}
