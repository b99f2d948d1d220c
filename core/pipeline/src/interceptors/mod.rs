//! Interceptors provided with the pipeline.
mod authentication;
mod header;
mod route;

pub use self::authentication::AuthenticationInterceptor;
pub use self::header::HeaderRejectInterceptor;
pub use self::route::RouteGuard;
pub use self::route::ROUTE_GUARD_NAME;
