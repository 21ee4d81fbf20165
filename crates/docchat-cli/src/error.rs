use colored::Colorize;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {:#}", "Error:".red().bold(), err);

    let msg = format!("{err:#}").to_lowercase();

    if msg.contains("connection refused")
        || msg.contains("error sending request")
        || msg.contains("dns error")
    {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check that the DocChat server is running, or point at another one:");
        eprintln!(
            "  {} docchat --server http://host:8000 <command>",
            "$".dimmed()
        );
    }

    if msg.contains("invalid server url") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Server URLs must start with http:// or https://");
    }

    if msg.contains("file not found") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  Check the path and upload a PDF file, for example:");
        eprintln!("  {} docchat docs upload ./report.pdf", "$".dimmed());
    }

    if msg.contains("server returned http 404") {
        eprintln!("\n{}", "Suggestion:".yellow().bold());
        eprintln!("  List stored documents with:");
        eprintln!("  {} docchat docs list", "$".dimmed());
    }

    std::process::exit(1);
}
