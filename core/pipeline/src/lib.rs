//! Ordered chain of request [`Interceptor`]s that authenticate and authorise requests.
//!
//! For each request the [`Pipeline`] runs interceptors strictly in order:
//!
//! - Interceptors registered [`Position::Before`] the authorisation stage run first,
//!   in registration order. Authentication interceptors belong here.
//! - The [`RouteGuard`] decides if the caller can access the requested route.
//! - Interceptors registered [`Position::After`] the authorisation stage run last.
//!
//! Any interceptor can short-circuit the chain with a [`Rejection`], in which case
//! the remaining interceptors and the request handler are skipped.
//!
//! The [`PipelineMiddleware`] runs pipelines for every request to an actix-web `App`.
mod builder;
mod driver;
mod exchange;
mod interceptors;
mod middleware;
mod rejection;
pub mod telemetry;


pub use self::builder::PipelineBuilder;
pub use self::builder::PipelineError;
pub use self::builder::Position;
pub use self::builder::Stage;
pub use self::driver::Pipeline;
pub use self::driver::PipelineOutcome;
pub use self::driver::PipelineState;
pub use self::exchange::Exchange;
pub use self::interceptors::AuthenticationInterceptor;
pub use self::interceptors::HeaderRejectInterceptor;
pub use self::interceptors::RouteGuard;
pub use self::middleware::PipelineConfig;
pub use self::middleware::PipelineMiddleware;
pub use self::middleware::PipelineService;
pub use self::rejection::DenialPolicy;
pub use self::rejection::Rejection;

/// Decision of an [`Interceptor`] about the request it processed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Flow {
    /// Continue with the next interceptor in the chain.
    Proceed,

    /// Terminate the chain and respond with the given rejection.
    Reject(Rejection),
}

/// Process requests as part of a [`Pipeline`].
///
/// Interceptors are shared across all requests and workers, but each invocation
/// runs on the request's own task: futures don't need to be `Send`.
#[async_trait::async_trait(?Send)]
pub trait Interceptor: Send + Sync {
    /// Process a request and decide if the pipeline should proceed.
    ///
    /// Unexpected errors are logged and turned into internal server error rejections.
    async fn intercept(&self, exchange: &Exchange<'_>) -> anyhow::Result<Flow>;

    /// Check the interceptor is correctly configured when the pipeline is built.
    fn validate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
