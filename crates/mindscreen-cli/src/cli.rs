//! Command-line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mindscreen")]
#[command(about = "Depression-risk screening for chat messages", long_about = None)]
pub struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, global = true, env = "MINDSCREEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Locale for vocabulary and response tables (en, en-MY)
    #[arg(short, long, global = true)]
    pub locale: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze one message and print the result as JSON
    Analyze {
        /// Message text
        text: String,

        /// Pretty-print the JSON
        #[arg(long)]
        pretty: bool,
    },

    /// Chat over stdin, one message per line; `/new` starts a new session
    Chat {
        /// Never call the completion endpoint
        #[arg(long)]
        offline: bool,
    },

    /// Train on the seed dataset and print clusters and validation metrics
    Validate,
}
