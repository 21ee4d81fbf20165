use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{documents, session};
use crate::output::{OutputFormat, json::print_json_line};
use crate::render::CliRenderer;
use docchat_core::{ChatClient, DocumentInfo, IngestResponse, TurnOutcome};

const HELP: &[(&str, &str)] = &[
    ("/new", "Start a new chat session"),
    ("/docs", "List stored documents"),
    ("/upload <path>", "Upload a PDF (starts a new chat session)"),
    ("/session", "Show the current session id"),
    ("/help", "Show this help"),
    ("/exit", "Leave the chat"),
];

/// Records the chat loop writes in JSON mode, one per line, next to the
/// render commands of each turn.
#[derive(Debug, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
enum ChatReply<'a> {
    TurnFinished { outcome: &'a TurnOutcome },
    NewChat,
    Documents { files: &'a [DocumentInfo] },
    Ingested { ingested: &'a IngestResponse },
    Session { session_id: Option<String> },
    Help { commands: &'static [(&'static str, &'static str)] },
    Notice { message: String },
    Error { message: String },
}

/// Slash commands understood by the interactive prompt.
#[derive(Debug, PartialEq)]
enum ChatCommand<'a> {
    New,
    Docs,
    Upload(&'a str),
    Session,
    Help,
    Exit,
    Unknown(&'a str),
}

impl<'a> ChatCommand<'a> {
    /// `None` means the input is a question.
    fn parse(input: &'a str) -> Option<Self> {
        let rest = input.strip_prefix('/')?;
        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        Some(match name {
            "new" => ChatCommand::New,
            "docs" => ChatCommand::Docs,
            "upload" => ChatCommand::Upload(arg),
            "session" => ChatCommand::Session,
            "help" | "?" => ChatCommand::Help,
            "exit" | "quit" => ChatCommand::Exit,
            _ => ChatCommand::Unknown(name),
        })
    }
}

pub async fn run(client: &ChatClient, renderer: &CliRenderer, format: OutputFormat) -> Result<()> {
    if !format.is_json() {
        print_welcome(client);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if !format.is_json() {
            print!("{} ", "❯".cyan().bold());
            io::stdout().flush()?;
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let json = format.is_json();
        let result = match ChatCommand::parse(input) {
            None => match client.submit(input).await {
                Some(outcome) => {
                    renderer.end_turn();
                    if json {
                        print_json_line(&ChatReply::TurnFinished { outcome: &outcome })
                    } else {
                        Ok(())
                    }
                }
                None => Ok(()),
            },
            Some(ChatCommand::Exit) => break,
            Some(ChatCommand::New) => {
                client.new_chat();
                if json {
                    print_json_line(&ChatReply::NewChat)
                } else {
                    println!("{}", "Started a new chat.".dimmed());
                    Ok(())
                }
            }
            Some(ChatCommand::Docs) if json => match client.documents().list().await {
                Ok(files) => print_json_line(&ChatReply::Documents { files: &files }),
                Err(err) => Err(err.into()),
            },
            Some(ChatCommand::Docs) => documents::list(&client.documents(), format).await,
            Some(ChatCommand::Upload("")) => notice(json, "Usage: /upload <path-to-pdf>"),
            Some(ChatCommand::Upload(path)) if json => {
                match client.ingest_and_reset(Path::new(path)).await {
                    Ok(ingested) => print_json_line(&ChatReply::Ingested {
                        ingested: &ingested,
                    }),
                    Err(err) => Err(err.into()),
                }
            }
            Some(ChatCommand::Upload(path)) => {
                documents::upload(client, Path::new(path), format).await
            }
            Some(ChatCommand::Session) if json => print_json_line(&ChatReply::Session {
                session_id: client.session().session_id(),
            }),
            Some(ChatCommand::Session) => session::show(client.session(), format),
            Some(ChatCommand::Help) if json => {
                print_json_line(&ChatReply::Help { commands: HELP })
            }
            Some(ChatCommand::Help) => {
                print_help();
                Ok(())
            }
            Some(ChatCommand::Unknown(name)) => notice(
                json,
                &format!("Unknown command /{name}. Type /help for commands."),
            ),
        };

        if let Err(err) = result {
            tracing::warn!(error = %err, "Chat command failed");
            if json {
                print_json_line(&ChatReply::Error {
                    message: format!("{err:#}"),
                })?;
            } else {
                eprintln!("{} {:#}", "Error:".red().bold(), err);
            }
        }
    }

    Ok(())
}

fn print_welcome(client: &ChatClient) {
    let width = crossterm::terminal::size()
        .map(|(columns, _)| columns as usize)
        .unwrap_or(60)
        .clamp(20, 80);

    println!("{}", "DocChat".bold());
    println!("Connected to {}", client.base_url().cyan());
    if let Some(id) = client.session().session_id() {
        println!("{}", format!("Continuing session {id}").dimmed());
    }
    println!("{}", "Ask a question, or type /help for commands.".dimmed());
    println!("{}", "─".repeat(width).dimmed());
}

fn notice(json: bool, message: &str) -> Result<()> {
    if json {
        return print_json_line(&ChatReply::Notice {
            message: message.to_string(),
        });
    }
    println!("{message}");
    Ok(())
}

fn print_help() {
    println!("Commands:");
    for (command, description) in HELP {
        println!("  {command:<16} {description}");
    }
}
