//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Read configuration from this file
//! - `--home <dir>`: Use this store root instead of the configured one
//! - `--debug`: Enable debug logging
//! - `--json`: Machine-readable output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// cloudgraph - Query and version a local graph of cloud resources
#[derive(Parser, Debug)]
#[command(name = "cloudgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (overrides discovery)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Store root directory (overrides configuration)
    #[arg(long, global = true, value_name = "DIR")]
    pub home: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Find resources of a region matching a query
    #[command(
        name = "find",
        long_about = "Find resources in the local graph of a region.\n\n\
            Every graph file synced for the region is merged and queried. With no \
            kind, every kind matches. Property filters are ANDed; a list property \
            matches if any of its elements does.",
        after_help = "\
EXAMPLES:
    # Every instance of eu-west-1
    cloudgraph find -r eu-west-1 instance

    # Running instances or volumes tagged for prod
    cloudgraph find -r eu-west-1 instance volume -p State=running

    # Anything whose Name contains 'redis', whatever the case
    cloudgraph find -r eu-west-1 -p Name=redis --contains --ignore-case"
    )]
    Find {
        /// Region to query
        #[arg(short, long)]
        region: String,

        /// Resource kinds to match (any kind when omitted)
        kinds: Vec<String>,

        /// Property filter NAME=VALUE (repeatable)
        #[arg(short, long = "property", value_name = "NAME=VALUE")]
        properties: Vec<String>,

        /// Compare values case-insensitively
        #[arg(short, long)]
        ignore_case: bool,

        /// Match when the value is contained in the property
        #[arg(short, long)]
        contains: bool,
    },

    /// Show the hierarchy below a resource
    #[command(
        name = "tree",
        after_help = "\
EXAMPLES:
    # Everything contained in a VPC
    cloudgraph tree -r eu-west-1 vpc vpc-12345678"
    )]
    Tree {
        /// Region to query
        #[arg(short, long)]
        region: String,

        /// Kind of the start resource
        kind: String,

        /// Id of the start resource
        id: String,
    },

    /// Show the ancestors of a resource, nearest first
    #[command(name = "parents")]
    Parents {
        /// Region to query
        #[arg(short, long)]
        region: String,

        /// Kind of the start resource
        kind: String,

        /// Id of the start resource
        id: String,
    },

    /// Show resources of the same kind under the same parent
    #[command(name = "siblings")]
    Siblings {
        /// Region to query
        #[arg(short, long)]
        region: String,

        /// Kind of the start resource
        kind: String,

        /// Id of the start resource
        id: String,
    },

    /// List sync revisions, newest first
    #[command(name = "history")]
    History {
        /// Maximum number of revisions to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Show how one source changed between two revisions
    #[command(
        name = "drift",
        long_about = "Compare the graph of one source as recorded by two sync runs.\n\n\
            Revisions accept HEAD, HEAD~N and full or abbreviated commit ids.",
        after_help = "\
EXAMPLES:
    # What changed in the last sync
    cloudgraph drift -r eu-west-1 -s infra

    # What changed over the last five syncs
    cloudgraph drift -r eu-west-1 -s infra --from HEAD~5"
    )]
    Drift {
        /// Region of the source
        #[arg(short, long)]
        region: String,

        /// Service name of the source
        #[arg(short, long)]
        service: String,

        /// Older revision
        #[arg(long, default_value = "HEAD~1")]
        from: String,

        /// Newer revision
        #[arg(long, default_value = "HEAD")]
        to: String,
    },
}
