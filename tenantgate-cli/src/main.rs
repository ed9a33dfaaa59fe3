//! # tenantgate CLI
//!
//! Inspect serialized ACLs, compute owner hashes, dry-run access checks and
//! validate runtime configuration.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tenantgate_acl::hash;
use tenantgate_types::{AccessLevel, Role};

#[derive(Parser)]
#[command(name = "tenantgate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with serialized ACLs
    Acl {
        #[command(subcommand)]
        command: AclCommands,
    },

    /// Work with runtime configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum AclCommands {
    /// Print the grants held in a serialized ACL
    Decode {
        serialized: String,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Hash an owner id the way ACL entries store it
    Hash {
        id: String,

        #[arg(long, default_value = hash::XXH3)]
        algorithm: String,
    },

    /// Check whether a candidate is granted the given levels
    Check {
        serialized: String,

        #[arg(long)]
        role: Role,

        #[arg(long)]
        id: String,

        /// Levels to request (repeat or comma separate)
        #[arg(long = "level", required = true, value_delimiter = ',')]
        levels: Vec<AccessLevel>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load the configuration and instantiate the selected connectors
    Check {
        #[arg(long, env = "TENANTGATE_CONFIG", default_value = "tenantgate.yml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Acl { command } => match command {
            AclCommands::Decode { serialized, json } => commands::decode_acl(&serialized, json),
            AclCommands::Hash { id, algorithm } => commands::hash_owner(&id, &algorithm),
            AclCommands::Check {
                serialized,
                role,
                id,
                levels,
            } => commands::check_access(&serialized, role, &id, &levels),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Check { config } => commands::check_config(&config).await,
        },
    }
}

/// Logs go to stderr so command output stays machine readable.
fn init_tracing(verbose: bool) -> anyhow::Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
