//! Initialisation logic for Portcullis processes.
mod auth;
pub mod logging;
mod server;

pub use self::auth::AuthInit;
pub use self::server::Server;
