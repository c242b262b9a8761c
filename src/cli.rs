//! Command-line interface definition for ibot
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for streaming chat, knowledge base and document
//! management, report downloads, and carbon data intake.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ibot - Terminal client for a RAG chat service
///
/// Chat with your documents over a streaming connection, manage
/// knowledge bases, and prepare carbon emission datasets.
#[derive(Parser, Debug, Clone)]
#[command(name = "ibot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Override the backend base URL from config
    #[arg(long)]
    pub base_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for ibot
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive chat session
    Chat {
        /// Knowledge base to query
        #[arg(short = 'k', long = "kb")]
        knowledge_base: Option<i64>,

        /// Number of document chunks retrieved per question
        #[arg(short, long)]
        top_k: Option<u32>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        query: String,

        /// Knowledge base to query
        #[arg(short = 'k', long = "kb")]
        knowledge_base: Option<i64>,

        /// Number of document chunks retrieved
        #[arg(short, long)]
        top_k: Option<u32>,
    },

    /// Manage knowledge bases
    Kb {
        /// Knowledge base subcommand
        #[command(subcommand)]
        command: KbCommand,
    },

    /// Manage documents within a knowledge base
    Doc {
        /// Document subcommand
        #[command(subcommand)]
        command: DocCommand,
    },

    /// Download carbon reports and look up companies
    Report {
        /// Report subcommand
        #[command(subcommand)]
        command: ReportCommand,
    },

    /// Enter, generate, validate, and import carbon datasets
    Carbon {
        /// Carbon data subcommand
        #[command(subcommand)]
        command: CarbonCommand,
    },
}

/// Knowledge base management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum KbCommand {
    /// List all knowledge bases
    List,

    /// Create a new knowledge base
    Create {
        /// Name of the knowledge base
        name: String,

        /// Optional description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a knowledge base
    Delete {
        /// Knowledge base identifier
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Document management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum DocCommand {
    /// List documents in a knowledge base
    List {
        /// Knowledge base identifier
        #[arg(short = 'k', long = "kb")]
        knowledge_base: i64,
    },

    /// Upload a document to a knowledge base
    Upload {
        /// Knowledge base identifier
        #[arg(short = 'k', long = "kb")]
        knowledge_base: i64,

        /// File to upload
        file: PathBuf,

        /// Start parsing immediately after upload
        #[arg(long)]
        parse: bool,

        /// Block until parsing reaches a terminal status (implies --parse)
        #[arg(long)]
        wait: bool,
    },

    /// Start parsing an uploaded document
    Parse {
        /// Document identifier
        id: i64,

        /// Knowledge base containing the document
        #[arg(short = 'k', long = "kb")]
        knowledge_base: i64,

        /// Block until parsing reaches a terminal status
        #[arg(long)]
        wait: bool,
    },

    /// Re-parse a previously parsed document
    Reparse {
        /// Document identifier
        id: i64,

        /// Knowledge base containing the document
        #[arg(short = 'k', long = "kb")]
        knowledge_base: i64,

        /// Block until parsing reaches a terminal status
        #[arg(long)]
        wait: bool,
    },

    /// Delete a document
    Delete {
        /// Document identifier
        id: i64,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Download the original document file
    Download {
        /// Document identifier
        id: i64,

        /// Output path; defaults to the server-provided filename
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Report and company lookup subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ReportCommand {
    /// Download the generated carbon report for a company
    Download {
        /// Company name
        company: String,

        /// Output path; defaults to the server-provided filename
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Download the blank carbon report template
    Template {
        /// Output path; defaults to the server-provided filename
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List companies known to the carbon service
    Companies,

    /// Show the stored record for one company
    Company {
        /// Company name
        name: String,
    },
}

/// Carbon dataset subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CarbonCommand {
    /// Walk through data entry step by step and import the result
    Wizard,

    /// Generate a synthetic dataset for a company
    Generate {
        /// Industry slug, e.g. "power" or "aviation"
        #[arg(short, long)]
        industry: String,

        /// Company name
        #[arg(short, long)]
        name: String,

        /// Company registration number
        #[arg(long)]
        number: Option<String>,

        /// Company region
        #[arg(short, long)]
        region: Option<String>,

        /// Reporting year
        #[arg(short, long)]
        year: Option<i32>,

        /// Where to write the dataset JSON
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Validate a dataset file without importing it
    Validate {
        /// Dataset JSON file
        file: PathBuf,
    },

    /// Import a dataset file into the carbon service
    Import {
        /// Dataset JSON file
        file: PathBuf,

        /// Account to attach the import to
        #[arg(long)]
        user: Option<i64>,
    },
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: Some("config/config.yaml".to_string()),
            base_url: None,
            verbose: false,
            command: Commands::Chat {
                knowledge_base: None,
                top_k: None,
            },
        }
    }
}
