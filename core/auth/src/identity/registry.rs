//! Ordered collection of [`Verifier`]s used to authenticate envelopes.
use std::collections::HashSet;
use std::sync::Arc;

use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Scheme;

use super::Verification;
use super::VerificationFailure;
use super::Verifier;
use crate::telemetry::AUTHENTICATION_COUNT;

/// Errors configuring a [`VerifierRegistry`].
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A verifier with the same identifier was already registered.
    #[error("a verifier with id '{0}' is already registered")]
    // (id,)
    DuplicateVerifier(String),

    /// The registry has no verifiers.
    #[error("at least one verifier must be registered")]
    Empty,
}

/// A [`Verifier`] registered under a unique identifier.
struct RegisteredVerifier {
    id: String,
    verifier: Arc<dyn Verifier>,
}

/// Verifiers in a fixed priority order, established when the registry is built.
///
/// Registries are immutable once built and can be shared across threads.
#[derive(Clone)]
pub struct VerifierRegistry {
    verifiers: Arc<Vec<RegisteredVerifier>>,
}

impl VerifierRegistry {
    /// Authenticate an envelope with the first applicable verifier.
    ///
    /// Verifiers are scanned in registration order:
    ///
    /// - Verifiers that do not support the envelope are skipped.
    /// - Verifiers that decline the envelope pass it on to the next one.
    /// - The first verifier to verify or fail the envelope determines the result.
    ///
    /// The envelope is consumed so it can't be used again once verification was attempted.
    pub async fn authenticate(
        &self,
        context: &Context,
        envelope: CredentialEnvelope,
    ) -> Result<Identity, VerificationFailure> {
        let scheme = envelope.scheme();
        let result = self.scan(context, &envelope).await;
        let outcome = match &result {
            Ok(identity) => {
                slog::info!(
                    context.logger, "Request authenticated";
                    "principal" => identity.principal().name(),
                    "scheme" => scheme.as_str(),
                );
                "verified"
            }
            Err(failure) => {
                slog::debug!(
                    context.logger, "Request authentication failed";
                    "scheme" => scheme.as_str(),
                    "reason" => failure.kind(),
                );
                failure.kind()
            }
        };
        AUTHENTICATION_COUNT
            .with_label_values(&[scheme.as_str(), outcome])
            .inc();
        result
    }

    /// Begin building a new registry.
    pub fn builder() -> VerifierRegistryBuilder {
        VerifierRegistryBuilder::default()
    }

    /// Check if at least one registered verifier handles the scheme.
    pub fn supports_scheme(&self, scheme: Scheme) -> bool {
        self.verifiers
            .iter()
            .any(|entry| entry.verifier.scheme() == scheme)
    }

    /// Look for a verifier to process the envelope.
    async fn scan(
        &self,
        context: &Context,
        envelope: &CredentialEnvelope,
    ) -> Result<Identity, VerificationFailure> {
        let scheme = envelope.scheme();
        let mut supported = false;
        for entry in self.verifiers.iter() {
            if !entry.verifier.supports(envelope) {
                continue;
            }
            supported = true;
            match entry.verifier.verify(context, envelope).await {
                Verification::Verified(identity) => return Ok(identity),
                Verification::Failed(failure) => return Err(failure),
                Verification::Declined => {
                    slog::trace!(
                        context.logger, "Verifier declined envelope";
                        "verifier" => &entry.id,
                        "scheme" => scheme.as_str(),
                    );
                }
            }
        }

        // Extractors are checked against the registry at startup so this should never happen.
        if !supported {
            slog::error!(
                context.logger, "No verifier supports the presented credentials";
                "scheme" => scheme.as_str(),
            );
            return Err(VerificationFailure::UnsupportedEnvelope { scheme });
        }
        Err(VerificationFailure::NotAccepted { scheme })
    }
}

/// Register verifiers in priority order to build a [`VerifierRegistry`].
#[derive(Default)]
pub struct VerifierRegistryBuilder {
    verifiers: Vec<RegisteredVerifier>,
}

impl VerifierRegistryBuilder {
    /// Finalise the registry, verifying the configuration is valid.
    pub fn build(self) -> Result<VerifierRegistry, RegistryError> {
        if self.verifiers.is_empty() {
            return Err(RegistryError::Empty);
        }
        let mut ids = HashSet::new();
        for entry in &self.verifiers {
            if !ids.insert(entry.id.clone()) {
                return Err(RegistryError::DuplicateVerifier(entry.id.clone()));
            }
        }
        Ok(VerifierRegistry {
            verifiers: Arc::new(self.verifiers),
        })
    }

    /// Register a verifier after all previously registered ones.
    pub fn register<S, V>(self, id: S, verifier: V) -> Self
    where
        S: Into<String>,
        V: Verifier + 'static,
    {
        self.register_shared(id, Arc::new(verifier))
    }

    /// Register an already shared verifier after all previously registered ones.
    pub fn register_shared<S>(mut self, id: S, verifier: Arc<dyn Verifier>) -> Self
    where
        S: Into<String>,
    {
        self.verifiers.push(RegisteredVerifier {
            id: id.into(),
            verifier,
        });
        self
    }
}
