use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "scriptum")]
#[command(about = "Markdown notes from the command line, remote-synced or local")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to the local note store file
    #[arg(long, global = true, value_name = "PATH")]
    pub store_path: Option<PathBuf>,

    /// Profile name for remote API and session configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Quick capture: scriptum "note title" (content read from stdin or editor)
    #[arg(trailing_var_arg = true)]
    pub title: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: Vec<String>,
        /// Note content (stdin or editor when omitted)
        #[arg(long)]
        content: Option<String>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// Display color, e.g. #a7f3d0
        #[arg(long, value_name = "HEX")]
        color: Option<String>,
        /// Pin the note on creation
        #[arg(long)]
        pin: bool,
    },
    /// List notes, pinned first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Only notes carrying this tag
        #[arg(long, value_name = "TAG")]
        tag: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a single note in full
    View {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Edit an existing note
    Edit {
        /// Note ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (opens the editor when no field flags are given)
        #[arg(long)]
        content: Option<String>,
        /// Replace the tag list (repeatable)
        #[arg(long = "tag", value_name = "TAG")]
        tags: Vec<String>,
        /// New display color
        #[arg(long, value_name = "HEX")]
        color: Option<String>,
    },
    /// Delete an existing note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Toggle the pin flag of a note
    Pin {
        /// Note ID or unique ID prefix
        id: String,
    },
    /// Search notes by title or content
    Search {
        /// Search query
        query: String,
        /// Field to search in
        #[arg(long = "in", value_enum, default_value_t = SearchField::Title)]
        field: SearchField,
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage tags (remote mode only)
    Tag {
        #[command(subcommand)]
        command: TagCommands,
    },
    /// Authenticate against the remote API
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Check the remote API health endpoint
    Health,
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum SearchField {
    Title,
    Content,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum TagCommands {
    /// List all tags
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Create a new tag
    Add {
        /// Tag name
        name: String,
        /// Display color
        #[arg(long, value_name = "HEX")]
        color: Option<String>,
    },
    /// Rename an existing tag
    Rename {
        /// Tag ID
        id: String,
        /// New name
        name: String,
    },
    /// Delete a tag
    Delete {
        /// Tag ID
        id: String,
    },
    /// Search tags by name
    Search {
        /// Search query
        query: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with email/password and store the session in the keychain
    Login {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
    },
    /// Create an account and store the session in the keychain
    Register {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Display name
        #[arg(long, value_name = "NAME")]
        name: String,
        /// Account email
        #[arg(long, value_name = "EMAIL")]
        email: String,
        /// Account password
        #[arg(long, value_name = "PASSWORD")]
        password: String,
        /// Optional avatar image URL
        #[arg(long, value_name = "URL")]
        avatar_url: Option<String>,
    },
    /// Show auth status for the profile
    Status {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Sign out and clear the stored session
    Logout {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Confirm an email address with a verification token
    Verify {
        /// Verification token from the email link
        #[arg(long, value_name = "TOKEN")]
        token: String,
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
    /// Resend the verification email for the signed-in user
    ResendVerification {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update a profile
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Remote API base URL, e.g. <https://api.example.com/api>
        #[arg(long, value_name = "URL")]
        api_url: Option<String>,
        /// Local note store path for this profile
        #[arg(long, value_name = "PATH")]
        store_path: Option<PathBuf>,
        /// Keep the current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Show the resolved profile configuration
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
