//! CLI entry point for the link analyzer.

use std::io::{self, IsTerminal};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use link_analyzer::{
    AnalyzerConfig, CandidateLink, Database, LinkAnalyzer, LinkStore, parse_profile_file,
    run_batch_with_progress,
};
use tracing::{debug, info, warn};

mod cli;

use cli::{Args, Command};

#[tokio::main]
async fn main() -> Result<()> {
    // .env first so clap sees its variables; tracing after, so --help works without logs
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Priority: RUST_LOG env var > quiet flag > verbose flag > default (info)
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));

    // Logs go to stderr so JSON output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    match args.command {
        Command::Add { post_id, urls } => add_links(&args.db, &post_id, &urls).await,
        Command::Analyze(analyzer) => {
            analyze_pending(&args.db, &analyzer.to_config(), args.quiet).await
        }
        Command::Inspect { url, analyzer } => inspect_url(&url, &analyzer.to_config()).await,
        Command::Parse { file } => parse_document(&file),
    }
}

async fn open_store(db_path: &Path) -> Result<LinkStore> {
    let db = Database::new(db_path)
        .await
        .with_context(|| format!("cannot open database {}", db_path.display()))?;
    Ok(LinkStore::new(db))
}

fn build_analyzer(config: &AnalyzerConfig) -> Result<LinkAnalyzer> {
    config.validate()?;
    if config.google_api_key.is_none() {
        warn!("GOOGLE_API_KEY is not set; Google Drive links will be reported as unsupported");
    }
    Ok(LinkAnalyzer::from_config(config))
}

async fn add_links(db_path: &Path, post_id: &str, urls: &[String]) -> Result<()> {
    let store = open_store(db_path).await?;
    for url in urls {
        match store.insert_link(post_id, url).await? {
            Some(id) => println!("added {id}\t{url}"),
            None => println!("exists\t{url}"),
        }
    }
    Ok(())
}

async fn analyze_pending(db_path: &Path, config: &AnalyzerConfig, quiet: bool) -> Result<()> {
    let analyzer = build_analyzer(config)?;
    let store = open_store(db_path).await?;

    let spinner = if !quiet && io::stderr().is_terminal() {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("Analyzing pending links...");
        spinner
    } else {
        ProgressBar::hidden()
    };

    let mut done = 0usize;
    let report = run_batch_with_progress(&store, &analyzer, |analysis| {
        done += 1;
        spinner.set_message(format!(
            "[{done}] link {} -> {}",
            analysis.link.id, analysis.link.link_status
        ));
    })
    .await;
    spinner.finish_and_clear();
    let report = report?;

    info!(
        processed = report.processed,
        analyzed = report.analyzed,
        imported = report.imported,
        "Analysis complete"
    );
    println!(
        "processed {}, analyzed {}, imported {}{}",
        report.processed,
        report.analyzed,
        report.imported,
        if report.halted_on_retry {
            " (halted: provider quota exhausted, rerun later)"
        } else {
            ""
        }
    );
    Ok(())
}

async fn inspect_url(url: &str, config: &AnalyzerConfig) -> Result<()> {
    let analyzer = build_analyzer(config)?;
    let analysis = analyzer.analyze(&CandidateLink::new(0, "inspect", url)).await;
    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

fn parse_document(file: &Path) -> Result<()> {
    let effect = parse_profile_file(file)?;
    if !effect.is_usable() {
        info!(path = %file.display(), "document names no devices or no colours");
    }
    println!("{}", serde_json::to_string_pretty(&effect)?);
    Ok(())
}
