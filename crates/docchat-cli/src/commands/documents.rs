use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::Cell;
use serde_json::json;
use std::path::{Path, PathBuf};

use crate::cli::DocsCommands;
use crate::commands::utils::format_last_modified;
use crate::output::progress::spinner;
use crate::output::table::{new_table, print_table};
use crate::output::{OutputFormat, json::print_json};
use docchat_core::{ChatClient, DocumentLibrary, format_bytes};

pub async fn run(client: &ChatClient, command: DocsCommands, format: OutputFormat) -> Result<()> {
    match command {
        DocsCommands::List => list(&client.documents(), format).await,
        DocsCommands::Upload { path } => upload(client, &path, format).await,
        DocsCommands::View { filename, output } => {
            view(&client.documents(), &filename, output, format).await
        }
        DocsCommands::Url { filename } => url(&client.documents(), &filename, format),
    }
}

pub async fn list(library: &DocumentLibrary, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        let files = library.list().await?;
        return print_json(&files);
    }

    let pb = spinner("Loading documents...");
    let files = library.list().await;
    pb.finish_and_clear();
    let files = files?;

    if files.is_empty() {
        println!("No documents yet.");
        println!("  {} docchat docs upload ./report.pdf", "$".dimmed());
        return Ok(());
    }

    let mut table = new_table(vec!["Filename", "Size", "Last modified"]);
    for file in &files {
        table.add_row(vec![
            Cell::new(&file.filename),
            Cell::new(format_bytes(file.size, 2)),
            Cell::new(format_last_modified(file.last_modified.as_deref())),
        ]);
    }

    print_table(table)
}

/// Upload a PDF; a successful ingest also starts a new chat session.
pub async fn upload(client: &ChatClient, path: &Path, format: OutputFormat) -> Result<()> {
    if format.is_json() {
        let ingested = client.ingest_and_reset(path).await?;
        return print_json(&ingested);
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let pb = spinner(&format!("Uploading and indexing {name}..."));
    let ingested = client.ingest_and_reset(path).await;
    pb.finish_and_clear();
    let ingested = ingested?;

    println!(
        "{} Ingested {} ({} chunks)",
        "✔".green().bold(),
        ingested.filename.as_deref().unwrap_or(&name).bold(),
        ingested.chunks_inserted
    );
    println!("{}", "Started a new chat session.".dimmed());
    Ok(())
}

async fn view(
    library: &DocumentLibrary,
    filename: &str,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> Result<()> {
    let target = output.unwrap_or_else(|| default_download_path(filename));

    let mut file = tokio::fs::File::create(&target)
        .await
        .with_context(|| format!("Failed to create {}", target.display()))?;

    let written = match library.download(filename, &mut file).await {
        Ok(written) => written,
        Err(err) => {
            drop(file);
            let _ = tokio::fs::remove_file(&target).await;
            return Err(err.into());
        }
    };

    if format.is_json() {
        return print_json(&json!({
            "filename": filename,
            "path": target.display().to_string(),
            "bytes": written,
        }));
    }

    println!(
        "{} Saved {} to {} ({})",
        "✔".green().bold(),
        filename.bold(),
        target.display(),
        format_bytes(written, 2)
    );
    Ok(())
}

fn url(library: &DocumentLibrary, filename: &str, format: OutputFormat) -> Result<()> {
    let url = library.view_url(filename);
    if format.is_json() {
        return print_json(&json!({ "filename": filename, "url": url }));
    }
    println!("{url}");
    Ok(())
}

/// Keep only the final path component so a stored name cannot escape the working directory.
fn default_download_path(filename: &str) -> PathBuf {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("document.pdf"))
}
