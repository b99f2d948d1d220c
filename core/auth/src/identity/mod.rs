//! Module to deal with the Authentication (who is accessing) side of Auth.
use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Scheme;

mod external;
mod policy;
mod registry;
mod request;

#[cfg(test)]
mod tests;

pub use self::external::ExternalFailure;
pub use self::external::ExternalIdentityVerifier;
pub use self::external::FederatedClaims;
pub use self::policy::IdentityPolicy;
pub use self::policy::PolicyVerifier;
pub use self::registry::RegistryError;
pub use self::registry::VerifierRegistry;
pub use self::registry::VerifierRegistryBuilder;
pub use self::request::RequestView;

#[cfg(any(test, feature = "test-fixture"))]
pub use self::request::MockRequest;

/// Strategy to turn a [`CredentialEnvelope`] into a verified [`Identity`].
#[async_trait::async_trait]
pub trait Verifier: Send + Sync {
    /// The family of credentials this verifier handles.
    fn scheme(&self) -> Scheme;

    /// Check if the verifier can handle the given envelope.
    ///
    /// Implementations must be pure: the same envelope type always yields the same answer.
    fn supports(&self, envelope: &CredentialEnvelope) -> bool {
        envelope.scheme() == self.scheme()
    }

    /// Attempt to verify a supported envelope.
    ///
    /// Verification may block on I/O, such as looking up credential stores or
    /// calling out to external identity providers.
    ///
    /// Return [`Verification::Declined`] to let other verifiers handle the envelope
    /// instead of failing authentication altogether.
    async fn verify(&self, context: &Context, envelope: &CredentialEnvelope) -> Verification;
}

/// Outcome of a [`Verifier::verify`] attempt.
#[derive(Debug)]
pub enum Verification {
    /// The verifier does not handle this envelope, the next verifier should be tried.
    Declined,

    /// The envelope was handled but is not valid.
    Failed(VerificationFailure),

    /// The envelope was verified.
    Verified(Identity),
}

impl Verification {
    /// Fail verification because of bad credentials.
    pub fn bad_credentials<S: Into<String>>(reason: S) -> Self {
        Verification::Failed(VerificationFailure::BadCredentials {
            reason: reason.into(),
        })
    }
}

/// Reasons a request's credentials could not be verified.
#[derive(Debug, thiserror::Error)]
pub enum VerificationFailure {
    /// The claimed principal exists but is not allowed to log in.
    #[error("account for principal \"{principal}\" is locked")]
    AccountLocked { principal: String },

    /// The verifier could not complete the verification process.
    #[error(transparent)]
    Backend(#[from] anyhow::Error),

    /// The proof does not match the claimed principal.
    #[error("{reason}")]
    BadCredentials { reason: String },

    /// An external identity provider rejected the presented assertion.
    #[error("[{code}] {reason}")]
    InvalidAssertion { code: String, reason: String },

    /// All verifiers supporting the envelope declined to verify it.
    #[error("no verifier accepted the {scheme} credentials")]
    NotAccepted { scheme: Scheme },

    /// The identity was valid but a post-verification policy rejected it.
    #[error("{reason}")]
    PolicyRejected { reason: String },

    /// No verifier supports the envelope: this is a configuration error.
    #[error("no verifier supports {scheme} credentials")]
    UnsupportedEnvelope { scheme: Scheme },
}

impl VerificationFailure {
    /// Short, stable, identifier of the failure reason for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerificationFailure::AccountLocked { .. } => "account-locked",
            VerificationFailure::Backend(_) => "backend",
            VerificationFailure::BadCredentials { .. } => "bad-credentials",
            VerificationFailure::InvalidAssertion { .. } => "invalid-assertion",
            VerificationFailure::NotAccepted { .. } => "not-accepted",
            VerificationFailure::PolicyRejected { .. } => "policy-rejected",
            VerificationFailure::UnsupportedEnvelope { .. } => "unsupported-envelope",
        }
    }
}

/// Detect and extract credentials of a specific [`Scheme`] from requests.
///
/// Extractors are used by authentication interceptors in two strict steps:
///
/// 1. [`CredentialExtractor::applies`] is always called first to check if the request
///    carries credentials for the scheme at all. Requests that don't are passed through
///    unchanged so unrelated traffic is not rejected.
/// 2. [`CredentialExtractor::extract`] builds an unverified envelope from the request.
///    No verification happens at this stage.
pub trait CredentialExtractor: Send + Sync {
    /// Check, without side effects, if the request carries credentials for this scheme.
    fn applies(&self, request: &dyn RequestView) -> bool;

    /// Build a [`CredentialEnvelope`] from the request.
    ///
    /// Only called when [`CredentialExtractor::applies`] returned `true`.
    /// Malformed credentials are reported as [`VerificationFailure::BadCredentials`].
    fn extract(&self, request: &dyn RequestView)
        -> Result<CredentialEnvelope, VerificationFailure>;

    /// The [`Scheme`] of the envelopes created by this extractor.
    fn scheme(&self) -> Scheme;
}
