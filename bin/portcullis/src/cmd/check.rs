//! Check the configuration builds a valid request pipeline.
use anyhow::Result;

use portcullis_conf::Conf;
use portcullis_context::Context;

use super::Cli;
use crate::init::AuthInit;

/// Build the request pipeline and print the interceptors and route rules it enforces.
pub fn run(cli: Cli, conf: Conf) -> Result<()> {
    let logger = crate::init::logging::configure(&conf.logging);
    let context = Context::root(logger).build();
    let auth = AuthInit::configure(&context, &conf.auth)?;

    println!("Configuration at {} is valid", cli.config);
    println!("Interceptors:");
    for (index, name) in auth.pipeline.interceptors().into_iter().enumerate() {
        println!("  {}. {}", index + 1, name);
    }
    println!("Routes:");
    for rule in auth.authoriser.routes().rules() {
        println!("  {} => {}", rule.pattern, rule.requirement);
    }
    Ok(())
}
