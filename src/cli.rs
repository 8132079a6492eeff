//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

use link_analyzer::config::{AnalyzerConfig, DEFAULT_ARCHIVE_DIR, DEFAULT_DOWNLOAD_ROOT};
use link_analyzer::download::constants::{GOOGLE_API_BASE_URL, MAX_FILE_SIZE};

/// Default SQLite database file.
pub const DEFAULT_DB_PATH: &str = "link-analyzer.db";

/// Find, download and parse lighting-effect profiles linked from posts.
#[derive(Parser, Debug)]
#[command(name = "link-analyzer")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// SQLite database holding candidate links and profiles
    #[arg(long, env = "LINK_ANALYZER_DB", default_value = DEFAULT_DB_PATH, global = true)]
    pub db: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record candidate links found in a post
    Add {
        /// Identifier of the post the links came from
        post_id: String,

        /// One or more URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Analyze every pending link in the database
    Analyze(AnalyzerArgs),

    /// Analyze a single URL without touching the database and print JSON
    Inspect {
        /// The URL to analyze
        url: String,

        #[command(flatten)]
        analyzer: AnalyzerArgs,
    },

    /// Parse one lighting configuration document and print JSON
    Parse {
        /// Path to the XML document
        file: PathBuf,
    },
}

/// Settings shared by the commands that download.
#[derive(ClapArgs, Debug, Clone)]
pub struct AnalyzerArgs {
    /// Google API key used for Drive downloads
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: Option<String>,

    /// Google API host (override for testing)
    #[arg(long, env = "GOOGLE_API_BASE", default_value = GOOGLE_API_BASE_URL, hide = true)]
    pub google_api_base: String,

    /// Parent directory for per-job working directories
    #[arg(long, env = "LINK_ANALYZER_DOWNLOAD_ROOT", default_value = DEFAULT_DOWNLOAD_ROOT)]
    pub download_root: PathBuf,

    /// Where archives that produced a profile are kept
    #[arg(long, env = "LINK_ANALYZER_ARCHIVE_DIR", default_value = DEFAULT_ARCHIVE_DIR)]
    pub archive_dir: PathBuf,

    /// Largest archive accepted, in bytes
    #[arg(long, default_value_t = MAX_FILE_SIZE, value_parser = clap::value_parser!(u64).range(1..=100_000_000))]
    pub max_file_size: u64,
}

impl AnalyzerArgs {
    /// Builds the analyzer configuration; unset values keep their defaults.
    #[must_use]
    pub fn to_config(&self) -> AnalyzerConfig {
        AnalyzerConfig {
            download_root: self.download_root.clone(),
            archive_dir: self.archive_dir.clone(),
            google_api_key: self
                .google_api_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(ToString::to_string),
            google_api_base: self.google_api_base.clone(),
            max_file_size: self.max_file_size,
            ..AnalyzerConfig::default()
        }
    }
}
