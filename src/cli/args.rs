//! Command-line argument parsing for Course Coach
//!
//! Provides clap-based CLI with ingest and ask subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Course Coach - atomize course content and answer learner questions
#[derive(Parser, Debug)]
#[command(name = "coursecoach")]
#[command(version = "0.3.0")]
#[command(about = "Content atomization and answer governance for the AI Coach", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbosity level: -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Atomize course documents into the content store
    Ingest {
        /// Course identifier
        #[arg(short = 'C', long)]
        course: String,

        /// Directory holding source documents
        #[arg(short, long)]
        source: PathBuf,

        /// Only process documents for this day
        #[arg(short, long)]
        day: Option<u32>,

        /// Atomize and report without writing to the store
        #[arg(long)]
        dry_run: bool,
    },

    /// Ask a question against ingested course content
    Ask {
        /// The learner's question
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Course identifier
        #[arg(short = 'C', long)]
        course: String,

        /// Learner identifier, used for escalation follow-up
        #[arg(short, long, default_value = "local")]
        learner: String,

        /// Directory holding source documents to ingest first
        #[arg(short, long)]
        source: Option<PathBuf>,
    },

    /// Display current configuration
    Config,
}
