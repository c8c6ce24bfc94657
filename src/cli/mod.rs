//! Command-line interface for `VoteHub`.

mod commands;

use clap::{Parser, Subcommand};

/// `VoteHub` - college election portal
#[derive(Parser)]
#[command(name = "votehub")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Create an admin account, or promote and re-password an existing one
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "Administrator")]
        name: String,
        #[arg(long, default_value = "ADMIN0000000")]
        student_id: String,
    },

    /// Grant admin rights to an existing account
    Promote {
        email: String,
    },

    /// Send a test verification email through the configured backend
    CheckEmail {
        to: String,
    },

    /// Submit the configured URLs to the `IndexNow` endpoint
    Indexnow,
}

pub use commands::*;
