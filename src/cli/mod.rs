pub mod bundle;
pub mod config;
pub mod connection;
pub mod credential;
pub mod export;
pub mod info;
pub mod mcp;
pub mod search;
pub mod share;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::store::Workspace;

#[derive(Debug, Parser)]
#[command(
    name = "mcp-bundler",
    about = "Bundle MCP servers from a catalogue into shareable launcher configs",
    version,
    propagate_version = true
)]
pub struct Cli {
    /// Override the data directory (default: ~/.local/share/mcp-bundler)
    #[arg(long, env = "MCP_BUNDLER_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Catalogue file or directory (default: <data dir>/catalogue.json)
    #[arg(long, env = "MCP_BUNDLER_CATALOGUE", global = true)]
    pub catalogue: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Locations every handler opens the workspace from.
#[derive(Debug, Clone)]
pub struct Paths {
    pub data_dir: Option<PathBuf>,
    pub catalogue: Option<PathBuf>,
}

impl Paths {
    pub fn open(&self) -> Result<Workspace> {
        Workspace::open(self.data_dir.as_deref(), self.catalogue.as_deref())
            .context("failed to open data directory")
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search the server catalogue
    Search {
        /// Text to search for in ids, names, descriptions and keywords
        query: Option<String>,

        /// Only show servers in this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// Show a catalogue server and its packages
    Info {
        /// Server id (or a unique id prefix)
        server: String,
    },

    /// Manage bundles (named groups of servers)
    #[command(subcommand)]
    Bundle(BundleSubcommand),

    /// Manage connections (reusable credential sets)
    #[command(subcommand)]
    Connection(ConnectionSubcommand),

    /// Export a bundle as launcher config or bundle document
    Export {
        /// Bundle id or name
        bundle: String,

        /// Output format: launcher or bundle (default: export_format setting)
        #[arg(short, long)]
        format: Option<String>,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Add a bundle's servers to .mcp.json
    Install {
        /// Bundle id or name
        bundle: String,

        /// Target directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Replace servers that are already configured
        #[arg(short, long)]
        force: bool,
    },

    /// Print a share token and link for a bundle
    Share {
        /// Bundle id or name
        bundle: String,
    },

    /// Import a bundle from a share token or link
    Import {
        /// Share token, preview link or legacy bundle link
        token: String,

        /// Only show what would be imported
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage per-server credentials outside of connections
    #[command(subcommand)]
    Credential(CredentialSubcommand),

    /// Manage settings
    #[command(subcommand)]
    Config(ConfigSubcommand),

    /// Start the MCP server (stdio transport)
    Mcp,
}

#[derive(Debug, Subcommand)]
pub enum BundleSubcommand {
    /// Create a new bundle
    Create {
        /// Bundle name
        name: String,

        /// Human-readable description
        #[arg(short, long)]
        description: Option<String>,

        /// Tags for organization
        #[arg(short, long)]
        tag: Vec<String>,

        /// Servers to add right away
        #[arg(short, long)]
        server: Vec<String>,
    },

    /// List all bundles
    List {
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Show detailed information about a bundle
    Info {
        /// Bundle id or name
        bundle: String,
    },

    /// Change a bundle's name, description or tags
    Update {
        /// Bundle id or name
        bundle: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Replace the tags
        #[arg(short, long)]
        tag: Vec<String>,
    },

    /// Delete a bundle (connections are kept)
    Remove {
        /// Bundle id or name
        bundle: String,

        /// Skip confirmation prompt
        #[arg(short, long)]
        force: bool,
    },

    /// Add a catalogue server to a bundle
    AddServer {
        /// Bundle id or name
        bundle: String,

        /// Server id (or a unique id prefix)
        server: String,

        /// Index of the package to use
        #[arg(short, long, default_value_t = 0)]
        package: usize,
    },

    /// Remove a server from a bundle
    RemoveServer {
        /// Bundle id or name
        bundle: String,

        /// Server id
        server: String,
    },

    /// Attach a connection to a bundled server
    Attach {
        /// Bundle id or name
        bundle: String,

        /// Server id
        server: String,

        /// Connection id or name
        connection: String,
    },

    /// Detach the connection from a bundled server
    Detach {
        /// Bundle id or name
        bundle: String,

        /// Server id
        server: String,
    },

    /// Choose which package of a bundled server to use
    SetPackage {
        /// Bundle id or name
        bundle: String,

        /// Server id
        server: String,

        /// Package index
        package: usize,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConnectionSubcommand {
    /// Create a connection for one package of a server
    Create {
        /// Connection name
        name: String,

        /// Server id (or a unique id prefix)
        server: String,

        /// Index of the package the credentials are for
        #[arg(short, long, default_value_t = 0)]
        package: usize,

        /// Credential as KEY=VALUE (repeatable)
        #[arg(long = "set", value_parser = parse_key_value)]
        credentials: Vec<(String, String)>,
    },

    /// List connections
    List {
        /// Only show connections for this server id
        #[arg(short, long)]
        server: Option<String>,
    },

    /// Show a connection (values are masked)
    Info {
        /// Connection id or name
        connection: String,

        /// Print credential values in clear text
        #[arg(long)]
        show_values: bool,
    },

    /// Rename a connection or replace its credentials
    Update {
        /// Connection id or name
        connection: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        /// Replace all credentials with these KEY=VALUE pairs
        #[arg(long = "replace", value_parser = parse_key_value)]
        credentials: Vec<(String, String)>,
    },

    /// Set one credential
    Set {
        /// Connection id or name
        connection: String,

        /// Variable name
        key: String,

        /// Value
        value: String,
    },

    /// Remove one credential
    Unset {
        /// Connection id or name
        connection: String,

        /// Variable name
        key: String,
    },

    /// Check that every required variable has a value
    Check {
        /// Connection id or name
        connection: String,
    },

    /// Delete a connection that no bundle uses
    Remove {
        /// Connection id or name
        connection: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum CredentialSubcommand {
    /// Store a credential for a server
    Set {
        /// Server id
        server: String,

        /// Variable name
        key: String,

        /// Value
        value: String,

        /// Encrypt the server's credentials with this passphrase
        #[arg(long, env = "MCP_BUNDLER_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },

    /// Show stored credentials for a server (values are masked)
    Get {
        /// Server id
        server: String,

        /// Passphrase for encrypted credentials
        #[arg(long, env = "MCP_BUNDLER_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,

        /// Print values in clear text
        #[arg(long)]
        show_values: bool,
    },

    /// List servers with stored credentials
    List,

    /// Remove one credential, or all credentials of a server
    Remove {
        /// Server id
        server: String,

        /// Variable name (omit to remove everything for the server)
        key: Option<String>,

        /// Passphrase for encrypted credentials
        #[arg(long, env = "MCP_BUNDLER_PASSPHRASE", hide_env_values = true)]
        passphrase: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., export_format, share_origin)
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a specific configuration value
    Get {
        /// Configuration key
        key: String,
    },
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Masks a credential value for display.
pub fn mask(value: &str) -> String {
    if value.trim().is_empty() {
        return "(empty)".to_string();
    }
    let visible: String = value.chars().take(3).collect();
    if value.chars().count() <= 6 {
        "******".to_string()
    } else {
        format!("{visible}******")
    }
}
