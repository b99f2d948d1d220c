//! Combine individual logical units to initialise and run a Portcullis demo server.
use anyhow::Result;
use clap::Parser;

use portcullis_conf::Conf;

mod api;
mod cmd;
mod init;

pub use self::cmd::Cli;

/// Initialise the portcullis process and invoke a command implementation.
pub async fn execute(cli: Cli, conf: Conf) -> Result<()> {
    match cli.command {
        cmd::Command::Check => cmd::check::run(cli, conf),
        cmd::Command::Server => cmd::server::run(cli, conf).await,
    }
}

/// Initialise the async runtime for the process and invoke [`execute`].
pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let conf = portcullis_conf::load(&cli.config)?;
    actix_web::rt::System::new().block_on(execute(cli, conf))
}
