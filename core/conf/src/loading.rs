//! Load configuration from files.
use std::collections::HashSet;
use std::fs::File;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;

use portcullis_auth::access::PathPattern;

use crate::Conf;

/// Errors handling Portcullis configuration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Unable to decode configuration from file at the given path.
    #[error("unable to decode configuration from file at '{0}'")]
    // (path,)
    Decode(String),

    /// The configuration was decoded but is not valid.
    #[error("invalid configuration: {0}")]
    // (reason,)
    Invalid(String),

    /// Unable to read configuration file at the given path.
    #[error("unable to read configuration file at '{0}'")]
    // (path,)
    Open(String),

    /// Configuration file not found at the given path.
    #[error("configuration file not found at '{0}'")]
    // (path,)
    PathNotFound(String),
}

/// Load process configuration from the specified path.
pub fn load(path: &str) -> Result<Conf> {
    // Check if the configuration file exists and fail if it does not.
    if !PathBuf::from(path).exists() {
        let error = Error::PathNotFound(path.to_string());
        let error = anyhow::anyhow!(error);
        return Err(error);
    }

    // Load, deserialize and validate the configuration.
    let file = File::open(path).with_context(|| Error::Open(path.into()))?;
    let conf = serde_yaml::from_reader(file).with_context(|| Error::Decode(path.into()))?;
    validate(&conf)?;
    Ok(conf)
}

/// Check the configuration for errors that would prevent the process from starting.
pub fn validate(conf: &Conf) -> Result<()> {
    let auth = &conf.auth;
    if auth.routes.is_empty() {
        anyhow::bail!(Error::Invalid("at least one route rule is required".into()));
    }
    for route in &auth.routes {
        PathPattern::parse(route.pattern.as_str())
            .with_context(|| Error::Invalid(format!("route '{}' is not valid", route.pattern)))?;
    }

    let mut usernames = HashSet::new();
    for user in &auth.users {
        if !usernames.insert(user.username.as_str()) {
            let reason = format!("user '{}' is defined more than once", user.username);
            anyhow::bail!(Error::Invalid(reason));
        }
    }

    if let Some(denial) = &auth.denial {
        if denial.login == denial.denied {
            let reason = format!(
                "login and denied locations must differ but both are '{}'",
                denial.login
            );
            anyhow::bail!(Error::Invalid(reason));
        }
    }
    if let Some(robot) = &auth.robot {
        if robot.secret.is_empty() {
            anyhow::bail!(Error::Invalid("the robot secret can't be empty".into()));
        }
    }
    Ok(())
}
