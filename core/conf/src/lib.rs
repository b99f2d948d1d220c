//! Portcullis configuration object and helpers.
mod auth;
mod loading;
mod object;

#[cfg(test)]
mod tests;

pub use self::auth::AssertionConf;
pub use self::auth::AuthConf;
pub use self::auth::BlockedHeaderConf;
pub use self::auth::DenialConf;
pub use self::auth::FederatedConf;
pub use self::auth::RequireConf;
pub use self::auth::RobotConf;
pub use self::auth::RouteConf;
pub use self::auth::SpecialPrincipalConf;
pub use self::auth::UserConf;
pub use self::loading::load;
pub use self::loading::validate;
pub use self::loading::Error;
pub use self::object::Conf;
pub use self::object::LogLevel;
pub use self::object::LogMode;
pub use self::object::LoggingConf;
pub use self::object::RuntimeConf;
pub use self::object::ServerConf;
