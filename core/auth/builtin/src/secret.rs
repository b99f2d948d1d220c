//! Trusted robots authenticate with a secret shared with the service.
use portcullis_auth::identity::CredentialExtractor;
use portcullis_auth::identity::RequestView;
use portcullis_auth::identity::Verification;
use portcullis_auth::identity::VerificationFailure;
use portcullis_auth::identity::Verifier;
use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Principal;
use portcullis_models::Scheme;

/// Default secret robots must present.
pub const DEFAULT_SECRET: &str = "beep-boop";

/// Default request header robots present their secret with.
pub const DEFAULT_SECRET_HEADER: &str = "x-robot-secret";

/// Extract [`CredentialEnvelope::FixedSecret`]s from a request header.
#[derive(Clone, Debug)]
pub struct SecretHeader {
    header: String,
}

impl SecretHeader {
    /// Look for secrets in the given header.
    pub fn new<S: Into<String>>(header: S) -> SecretHeader {
        SecretHeader {
            header: header.into(),
        }
    }
}

impl Default for SecretHeader {
    fn default() -> Self {
        SecretHeader::new(DEFAULT_SECRET_HEADER)
    }
}

impl CredentialExtractor for SecretHeader {
    fn applies(&self, request: &dyn RequestView) -> bool {
        request.has_header(&self.header)
    }

    fn extract(&self, request: &dyn RequestView) -> Result<CredentialEnvelope, VerificationFailure> {
        match request.header(&self.header) {
            Ok(Some(secret)) => Ok(CredentialEnvelope::fixed_secret(secret)),
            Ok(None) => Err(VerificationFailure::BadCredentials {
                reason: format!("missing {} header", self.header),
            }),
            Err(error) => Err(VerificationFailure::BadCredentials {
                reason: format!("invalid {} header: {}", self.header, error),
            }),
        }
    }

    fn scheme(&self) -> Scheme {
        Scheme::FixedSecret
    }
}

/// Verify fixed secrets against the one secret known to the service.
///
/// Matching secrets always authenticate as the same service principal.
#[derive(Clone, Debug)]
pub struct FixedSecretVerifier {
    capabilities: Vec<String>,
    principal: String,
    secret: String,
}

impl FixedSecretVerifier {
    /// Verify secrets for the `robot` service principal.
    pub fn new<S: Into<String>>(secret: S) -> FixedSecretVerifier {
        FixedSecretVerifier {
            capabilities: vec!["robot".to_string()],
            principal: "robot".to_string(),
            secret: secret.into(),
        }
    }

    /// Authenticate matching secrets as a different service principal.
    pub fn with_principal<S, I, C>(mut self, principal: S, capabilities: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.principal = principal.into();
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for FixedSecretVerifier {
    fn default() -> Self {
        FixedSecretVerifier::new(DEFAULT_SECRET)
    }
}

#[async_trait::async_trait]
impl Verifier for FixedSecretVerifier {
    fn scheme(&self) -> Scheme {
        Scheme::FixedSecret
    }

    async fn verify(&self, _: &Context, envelope: &CredentialEnvelope) -> Verification {
        match envelope {
            CredentialEnvelope::FixedSecret { secret } if *secret == self.secret => {
                let principal = Principal::service(self.principal.clone());
                let identity = Identity::new(principal, self.capabilities.iter().cloned());
                Verification::Verified(identity)
            }
            CredentialEnvelope::FixedSecret { .. } => {
                Verification::bad_credentials(format!("you are not Ms {}", title(&self.principal)))
            }
            _ => Verification::Failed(VerificationFailure::UnsupportedEnvelope {
                scheme: envelope.scheme(),
            }),
        }
    }
}

fn title(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}
