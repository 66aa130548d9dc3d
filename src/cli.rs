use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tubedigest::workers::WorkerKind;
use tubedigest_common::Stage;

#[derive(Parser)]
#[command(name = "tubedigest")]
#[command(author, version, about = "Transcribe, summarize, translate and publish new channel uploads")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run all five workers until interrupted
    Start,

    /// Run a single cycle of one worker
    RunOnce {
        /// Worker to run
        #[arg(value_enum)]
        worker: WorkerKind,
    },

    /// Manage source channels
    #[command(subcommand)]
    Channel(ChannelCommand),

    /// Manage known participants
    #[command(subcommand)]
    Feature(FeatureCommand),

    /// Inspect and curate content items
    #[command(subcommand)]
    Content(ContentCommand),

    /// Show item counts per stage
    Status,

    /// Parse a compact duration such as PT1H2M3S
    ParseDuration {
        /// Duration text
        text: String,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}

#[derive(Subcommand)]
pub enum ChannelCommand {
    /// Register a channel, resolving it on the video platform
    Add(AddChannel),

    /// List registered channels
    List,

    /// Change a channel's name, activity level or keyword filter
    Update {
        /// Channel id
        id: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New activity level (0 disables discovery)
        #[arg(long)]
        activity: Option<u8>,

        /// New keyword filter; an empty string removes it
        #[arg(long)]
        keywords: Option<String>,
    },

    /// Delete a channel and all of its content
    Remove {
        /// Channel id
        id: String,
    },
}

#[derive(Args)]
#[group(id = "source", required = true, multiple = false, args = ["id", "suffix"])]
pub struct AddChannel {
    /// Platform channel id (UC...)
    #[arg(long)]
    pub id: Option<String>,

    /// URL suffix, usually the @handle
    #[arg(long)]
    pub suffix: Option<String>,

    /// Exact channel title, required when the suffix matches several channels
    #[arg(long, requires = "suffix")]
    pub title: Option<String>,

    /// Activity level (0 registers without discovering)
    #[arg(long, default_value = "1")]
    pub activity: u8,

    /// Semicolon-separated keyword filter
    #[arg(long)]
    pub keywords: Option<String>,
}

#[derive(Subcommand)]
pub enum FeatureCommand {
    /// Add a participant
    Add {
        /// English first name
        first_en: String,

        /// English last name, matched against summaries
        last_en: String,

        /// Localized first name
        #[arg(long)]
        first_local: Option<String>,

        /// Localized last name
        #[arg(long)]
        last_local: Option<String>,
    },

    /// List participants
    List,

    /// Remove a participant
    Remove {
        /// Feature id
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ContentCommand {
    /// List content items, newest first
    List {
        /// Only items in this stage
        #[arg(long)]
        stage: Option<Stage>,

        /// Maximum number of items
        #[arg(long, default_value = "50")]
        limit: i64,

        /// Items to skip
        #[arg(long, default_value = "0")]
        offset: i64,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Exclude an item from every stage
    Ignore {
        /// Video id
        video_id: String,
    },

    /// Undo a previous ignore
    Unignore {
        /// Video id
        video_id: String,
    },
}
