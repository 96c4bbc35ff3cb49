//! Command-line arguments for the relay binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(author, version, about = "Queue prompts and feed them to a web page one at a time", long_about = None)]
pub struct Cli {
    /// Path to the RON config file
    #[arg(short, long, default_value = "relay.ron")]
    pub config: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Prompt positions are 1-based, as listed by `list`.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Split text into prompts and append them to the queue (stdin when no
    /// text or file is given)
    Add {
        text: Option<String>,

        /// Read the text from a file
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Submit the first prompt right away and queue the rest
        #[arg(long)]
        now: bool,
    },

    /// List queued prompts
    List,

    /// Print one prompt in full
    Show { index: usize },

    /// Replace the text of a prompt
    Edit { index: usize, text: String },

    /// Remove a prompt
    Remove { index: usize },

    /// Move a prompt to another position
    Move { from: usize, to: usize },

    /// Remove every prompt
    Clear,

    /// Submit a queued prompt now without removing it
    Send { index: usize },

    /// Show or change relay settings
    Settings {
        /// Seconds between page status polls
        #[arg(long)]
        poll_interval: Option<u64>,

        /// Submit queued prompts automatically
        #[arg(long)]
        auto_submit: Option<bool>,

        /// Seconds between automatic submissions
        #[arg(long)]
        delay: Option<u64>,
    },

    /// Show the controls and status found on the current page
    Inspect,

    /// Run the relay, reading JSON control requests from stdin
    Run,
}
