//! Built-in `portcullis` commands.
use clap::Parser;
use clap::Subcommand;

pub mod check;
pub mod server;

/// Demo server guarding routes with an authentication and authorisation pipeline.
#[derive(Debug, Parser)]
#[command(version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the Portcullis configuration to use.
    #[arg(short = 'c', long = "config", default_value_t = String::from("portcullis.yaml"))]
    pub config: String,

    /// Select the portcullis command to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Select the portcullis command to run.
#[derive(Clone, Debug, Subcommand)]
pub enum Command {
    /// Build the request pipeline from configuration and print it, without serving requests.
    #[command(alias = "validate")]
    Check,

    /// Run the Portcullis demo server.
    #[command(alias = "run")]
    Server,
}
