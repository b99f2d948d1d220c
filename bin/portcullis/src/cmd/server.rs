//! Run the Portcullis demo server.
use anyhow::Result;

use portcullis_conf::Conf;

use super::Cli;
use crate::init::Server;

/// Run the Portcullis demo server.
pub async fn run(_cli: Cli, conf: Conf) -> Result<()> {
    Server::configure(conf)?
        .with_http_config(crate::api::configure)
        .run()
        .await
}
