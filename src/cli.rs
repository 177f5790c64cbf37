/// cli.rs — pwv command-line interface
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "pwv",
    author,
    version,
    about = "Single-user, local-only encrypted password vault",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new, empty vault at the configured storage location.
    Init,

    /// Permanently delete the vault and every item in it.
    Destroy,

    /// List every item's name.
    List,

    /// View or change password-generation settings.
    Config,

    /// Create a new item.
    ///
    /// Examples:
    ///   pwv create github
    Create {
        /// Item name, e.g. a site or account label.
        name: String,
    },

    /// Decrypt and display an existing item's username, password, and
    /// other info.
    Get {
        name: String,
    },

    /// Change an existing item's username, password, or other info.
    Update {
        name: String,
    },

    /// Delete a single item.
    Delete {
        name: String,
    },
}
