//! CLI argument definitions using clap
//!
//! Commands:
//! - mdfpipe validate --dataset <json> [--records <ndjson>] [--strict]
//! - mdfpipe search --query <q> [--advanced] [--limit N] [--info]
//! - mdfpipe aggregate (--query <q> | --source <name>)
//! - mdfpipe composition <text>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mdfpipe - materials metadata curation and search
#[derive(Parser, Debug)]
#[command(name = "mdfpipe")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a dataset and its records and write the feedstock
    Validate {
        /// Path to configuration file
        #[arg(long, default_value = "./mdfpipe.json")]
        config: PathBuf,

        /// Dataset metadata (one JSON document)
        #[arg(long)]
        dataset: PathBuf,

        /// Records, one JSON document per line
        #[arg(long)]
        records: Option<PathBuf>,

        /// Treat payload size warnings as failures
        #[arg(long)]
        strict: bool,

        /// Cancel the whole feedstock on the first rejected record
        #[arg(long)]
        abort_on_error: bool,
    },

    /// Run one bounded search
    Search {
        /// Path to configuration file
        #[arg(long, default_value = "./mdfpipe.json")]
        config: PathBuf,

        #[arg(long)]
        query: String,

        /// Index alias or identifier (defaults to the configured index)
        #[arg(long)]
        index: Option<String>,

        #[arg(long)]
        limit: Option<usize>,

        /// Use the field-qualified query dialect
        #[arg(long)]
        advanced: bool,

        /// Include match count and retry history
        #[arg(long)]
        info: bool,
    },

    /// Retrieve every match, paging past the service cap
    Aggregate {
        /// Path to configuration file
        #[arg(long, default_value = "./mdfpipe.json")]
        config: PathBuf,

        #[arg(long, conflicts_with = "source", required_unless_present = "source")]
        query: Option<String>,

        /// Aggregate one dataset by source name
        #[arg(long)]
        source: Option<String>,

        #[arg(long)]
        index: Option<String>,
    },

    /// Extract element symbols from a formula or element names
    Composition {
        text: String,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_validate() {
        let cli = Cli::parse_from([
            "mdfpipe", "validate", "--dataset", "d.json", "--records", "r.ndjson", "--strict",
        ]);
        match cli.command {
            Command::Validate {
                config,
                dataset,
                records,
                strict,
                abort_on_error,
            } => {
                assert_eq!(config, PathBuf::from("./mdfpipe.json"));
                assert_eq!(dataset, PathBuf::from("d.json"));
                assert_eq!(records, Some(PathBuf::from("r.ndjson")));
                assert!(strict);
                assert!(!abort_on_error);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_aggregate_needs_query_or_source() {
        assert!(Cli::try_parse_from(["mdfpipe", "aggregate"]).is_err());
        assert!(Cli::try_parse_from(["mdfpipe", "aggregate", "--source", "oqmd"]).is_ok());
        assert!(Cli::try_parse_from([
            "mdfpipe", "aggregate", "--source", "oqmd", "--query", "x"
        ])
        .is_err());
    }
}
