//! CLI module for conceptmap.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};

/// conceptmap - Transcript to Textbook Concept Mapping
///
/// Builds an in-memory index over extracted textbook text and maps
/// educational video transcript segments to the concepts they cover.
#[derive(Parser, Debug)]
#[command(name = "conceptmap")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory of extracted textbook text (overrides loader.documents_dir)
    #[arg(short, long, global = true, env = "CONCEPTMAP_DOCUMENTS_DIR")]
    pub documents_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server (ingests the corpus on startup)
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (defaults to server.port)
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,
    },

    /// Map one transcript segment to textbook concepts
    Map {
        /// The transcript segment
        transcript: String,
    },

    /// Search the corpus for chunks similar to a query
    Search {
        /// Search query
        query: String,

        /// Maximum number of results
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Load, chunk and embed the corpus and report what was indexed
    Ingest,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_map_with_globals() {
        let cli = Cli::try_parse_from(["conceptmap", "-vv", "--config", "c.toml", "map", "What is inertia?"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config.as_deref(), Some("c.toml"));
        match cli.command {
            Commands::Map { transcript } => assert_eq!(transcript, "What is inertia?"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_search_limit() {
        let cli = Cli::try_parse_from(["conceptmap", "search", "photosynthesis", "-l", "3"]).unwrap();
        match cli.command {
            Commands::Search { query, limit } => {
                assert_eq!(query, "photosynthesis");
                assert_eq!(limit, 3);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
