//! Process logger initialisation from the logging configuration.
use std::io::stdout;
use std::sync::Mutex;

use slog::Drain;
use slog::IgnoreResult;
use slog::Logger;
use slog::Never;
use slog::SendSyncRefUnwindSafeDrain;
use slog::SendSyncUnwindSafeDrain;
use slog_async::Async;
use slog_json::Json;
use slog_term::FullFormat;
use slog_term::TermDecorator;

use portcullis_conf::LogLevel;
use portcullis_conf::LogMode;
use portcullis_conf::LoggingConf;

/// Creates a [`Logger`] based on the given configuration.
pub fn configure(conf: &LoggingConf) -> Logger {
    match conf.mode {
        LogMode::Json => {
            let drain = Mutex::new(Json::default(stdout())).map(IgnoreResult::new);
            config_async(conf, drain)
        }
        LogMode::Terminal => {
            let decorator = TermDecorator::new().stdout().build();
            let drain = Mutex::new(FullFormat::new(decorator).build()).map(IgnoreResult::new);
            config_async(conf, drain)
        }
    }
}

/// Map the configured level onto the matching [`slog::Level`].
pub fn level(level: LogLevel) -> slog::Level {
    match level {
        LogLevel::Critical => slog::Level::Critical,
        LogLevel::Error => slog::Level::Error,
        LogLevel::Warning => slog::Level::Warning,
        LogLevel::Info => slog::Level::Info,
        LogLevel::Debug => slog::Level::Debug,
        LogLevel::Trace => slog::Level::Trace,
    }
}

/// Optionally wrap the drain into an [`Async`] drain and filter events by level.
fn config_async<D>(conf: &LoggingConf, drain: D) -> Logger
where
    D: SendSyncUnwindSafeDrain<Ok = (), Err = Never>,
    D: 'static + SendSyncRefUnwindSafeDrain<Ok = (), Err = Never>,
{
    let level = level(conf.level);
    match conf.async_flush {
        true => {
            let drain = Async::new(drain).build().filter_level(level).ignore_res();
            into_logger(drain)
        }
        false => into_logger(drain.filter_level(level).ignore_res()),
    }
}

/// Converts a [`Drain`] into a [`Logger`] setting global tags.
fn into_logger<D>(drain: D) -> Logger
where
    D: SendSyncUnwindSafeDrain<Ok = (), Err = Never>,
    D: 'static + SendSyncRefUnwindSafeDrain<Ok = (), Err = Never>,
{
    Logger::root(
        drain,
        slog::o!(
            "app" => env!("CARGO_PKG_NAME"),
            "version" => env!("CARGO_PKG_VERSION"),
        ),
    )
}

#[cfg(test)]
mod tests {
    use portcullis_conf::LogLevel;

    #[test]
    fn levels_map_onto_slog() {
        assert_eq!(super::level(LogLevel::Warning), slog::Level::Warning);
        assert_eq!(super::level(LogLevel::Trace), slog::Level::Trace);
        assert!(super::level(LogLevel::Critical).is_at_least(slog::Level::Error));
    }
}
