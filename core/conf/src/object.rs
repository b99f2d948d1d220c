//! Data object storing the portcullis configuration.
use serde::Deserialize;
use serde::Serialize;

use crate::AuthConf;

/// Global configuration for the Portcullis process.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Conf {
    /// Authentication and authorisation configuration.
    #[serde(default)]
    pub auth: AuthConf,

    /// HTTP Server configuration.
    #[serde(default)]
    pub http: ServerConf,

    /// Logging configuration for the process.
    #[serde(default)]
    pub logging: LoggingConf,

    /// Process runtime configuration.
    #[serde(default)]
    pub runtime: RuntimeConf,
}

/// HTTP Server configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConf {
    /// Address to bind the server to.
    #[serde(default = "ServerConf::default_bind")]
    pub bind: String,

    /// Number of server workers, defaults to the number of CPUs.
    #[serde(default)]
    pub workers: Option<usize>,
}

impl ServerConf {
    fn default_bind() -> String {
        "127.0.0.1:8080".into()
    }
}

impl Default for ServerConf {
    fn default() -> Self {
        ServerConf {
            bind: Self::default_bind(),
            workers: None,
        }
    }
}

/// Logging configuration for the process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConf {
    /// Flush logs asynchronously from a background thread.
    #[serde(default = "LoggingConf::default_async", rename = "async")]
    pub async_flush: bool,

    /// Minimum level of log events to emit.
    #[serde(default)]
    pub level: LogLevel,

    /// Format of emitted log events.
    #[serde(default)]
    pub mode: LogMode,
}

impl LoggingConf {
    fn default_async() -> bool {
        true
    }
}

impl Default for LoggingConf {
    fn default() -> Self {
        LoggingConf {
            async_flush: Self::default_async(),
            level: LogLevel::default(),
            mode: LogMode::default(),
        }
    }
}

/// Minimum level of log events to emit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
    Trace,
}

/// Format of emitted log events.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Structured JSON events, one per line.
    #[default]
    Json,

    /// Human readable events for interactive use.
    Terminal,
}

/// Container for the process runtime configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConf {
    /// Allowed time, in seconds, for running requests to complete once process shutdown begins.
    #[serde(default = "RuntimeConf::default_shutdown_grace")]
    pub shutdown_grace_sec: u64,
}

impl RuntimeConf {
    fn default_shutdown_grace() -> u64 {
        30
    }
}

impl Default for RuntimeConf {
    fn default() -> Self {
        RuntimeConf {
            shutdown_grace_sec: Self::default_shutdown_grace(),
        }
    }
}
