//! Post-verification policies applied by wrapping existing verifiers.
use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Scheme;

use super::Verification;
use super::VerificationFailure;
use super::Verifier;

/// Organisational policy applied to identities that were successfully verified.
pub trait IdentityPolicy: Send + Sync {
    /// Accept the identity or return a user facing reason for rejecting it.
    fn check(&self, identity: &Identity) -> Result<(), String>;
}

impl<F> IdentityPolicy for F
where
    F: Fn(&Identity) -> Result<(), String> + Send + Sync,
{
    fn check(&self, identity: &Identity) -> Result<(), String> {
        self(identity)
    }
}

/// Wrap a [`Verifier`] to apply an [`IdentityPolicy`] to the identities it verifies.
///
/// The wrapped verifier is unaware of the policy: declines and failures are returned
/// as they are while verified identities rejected by the policy fail with
/// [`VerificationFailure::PolicyRejected`].
pub struct PolicyVerifier<V, P> {
    inner: V,
    policy: P,
}

impl<V, P> PolicyVerifier<V, P>
where
    V: Verifier,
    P: IdentityPolicy,
{
    /// Apply `policy` to identities verified by `inner`.
    pub fn new(inner: V, policy: P) -> Self {
        PolicyVerifier { inner, policy }
    }
}

#[async_trait::async_trait]
impl<V, P> Verifier for PolicyVerifier<V, P>
where
    V: Verifier,
    P: IdentityPolicy,
{
    fn scheme(&self) -> Scheme {
        self.inner.scheme()
    }

    fn supports(&self, envelope: &CredentialEnvelope) -> bool {
        self.inner.supports(envelope)
    }

    async fn verify(&self, context: &Context, envelope: &CredentialEnvelope) -> Verification {
        let identity = match self.inner.verify(context, envelope).await {
            Verification::Verified(identity) => identity,
            other => return other,
        };
        match self.policy.check(&identity) {
            Ok(()) => Verification::Verified(identity),
            Err(reason) => {
                slog::debug!(
                    context.logger, "Verified identity rejected by policy";
                    "principal" => identity.principal().name(),
                    "reason" => &reason,
                );
                Verification::Failed(VerificationFailure::PolicyRejected { reason })
            }
        }
    }
}
