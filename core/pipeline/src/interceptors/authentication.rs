use std::sync::Arc;

use actix_web::http::StatusCode;
use anyhow::Result;

use portcullis_auth::identity::CredentialExtractor;
use portcullis_auth::identity::VerificationFailure;
use portcullis_auth::identity::VerifierRegistry;

use crate::Exchange;
use crate::Flow;
use crate::Interceptor;
use crate::Rejection;

/// Authenticate requests carrying credentials detected by a [`CredentialExtractor`].
///
/// For each request the interceptor:
///
/// 1. Checks if the extractor applies to the request, passing it on unchanged if not.
/// 2. Extracts an unverified envelope from the request.
/// 3. Verifies the envelope with the [`VerifierRegistry`] and records the identity,
///    or rejects the request with the failure reason.
///
/// Credentials are verified even if an earlier interceptor already authenticated
/// the request. The earlier identity is kept when both name the same principal,
/// requests presenting credentials for different principals are rejected.
pub struct AuthenticationInterceptor {
    extractor: Arc<dyn CredentialExtractor>,
    failure_status: StatusCode,
    registry: VerifierRegistry,
}

impl AuthenticationInterceptor {
    /// Authenticate requests with credentials from `extractor` and verifiers in `registry`.
    ///
    /// Requests with invalid credentials are rejected as unauthorised.
    pub fn new<E>(extractor: E, registry: VerifierRegistry) -> AuthenticationInterceptor
    where
        E: CredentialExtractor + 'static,
    {
        AuthenticationInterceptor {
            extractor: Arc::new(extractor),
            failure_status: StatusCode::UNAUTHORIZED,
            registry,
        }
    }

    /// Reject requests with invalid credentials using a different status code.
    pub fn with_failure_status(mut self, status: StatusCode) -> Self {
        self.failure_status = status;
        self
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for AuthenticationInterceptor {
    async fn intercept(&self, exchange: &Exchange<'_>) -> Result<Flow> {
        let request = exchange.request();
        let logger = &exchange.context().logger;
        let scheme = self.extractor.scheme();
        if !self.extractor.applies(request) {
            slog::trace!(logger, "Credentials not found in request"; "scheme" => scheme.as_str());
            return Ok(Flow::Proceed);
        }
        let envelope = match self.extractor.extract(request) {
            Ok(envelope) => envelope,
            Err(failure) => {
                let rejection = Rejection::new(self.failure_status, failure.to_string());
                return Ok(Flow::Reject(rejection));
            }
        };
        match self.registry.authenticate(exchange.context(), envelope).await {
            Ok(identity) => {
                let caller = exchange.caller();
                match caller.identity() {
                    None => {
                        exchange.authenticate(identity);
                    }
                    Some(current) if current.principal() == identity.principal() => {
                        slog::trace!(
                            logger, "Credentials confirm the already authenticated principal";
                            "scheme" => scheme.as_str(),
                        );
                    }
                    Some(current) => {
                        slog::debug!(
                            logger, "Request carries credentials for different principals";
                            "scheme" => scheme.as_str(),
                            "current" => current.principal().name(),
                            "presented" => identity.principal().name(),
                        );
                        let rejection = Rejection::new(
                            self.failure_status,
                            "request carries credentials for different principals",
                        );
                        return Ok(Flow::Reject(rejection));
                    }
                }
                Ok(Flow::Proceed)
            }
            Err(VerificationFailure::Backend(error)) => Err(error),
            Err(failure @ VerificationFailure::UnsupportedEnvelope { .. }) => {
                Err(anyhow::Error::from(failure))
            }
            Err(failure) => {
                let rejection = Rejection::new(self.failure_status, failure.to_string());
                Ok(Flow::Reject(rejection))
            }
        }
    }

    fn validate(&self) -> Result<()> {
        let scheme = self.extractor.scheme();
        if !self.registry.supports_scheme(scheme) {
            anyhow::bail!(VerificationFailure::UnsupportedEnvelope { scheme });
        }
        Ok(())
    }
}
