//! Authentication with assertions issued by external identity providers.
use std::collections::BTreeSet;
use std::collections::HashMap;

use portcullis_auth::identity::CredentialExtractor;
use portcullis_auth::identity::ExternalFailure;
use portcullis_auth::identity::ExternalIdentityVerifier;
use portcullis_auth::identity::FederatedClaims;
use portcullis_auth::identity::IdentityPolicy;
use portcullis_auth::identity::RequestView;
use portcullis_auth::identity::Verification;
use portcullis_auth::identity::VerificationFailure;
use portcullis_auth::identity::Verifier;
use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Principal;
use portcullis_models::Scheme;

/// Extract [`CredentialEnvelope::FederatedToken`]s from `Authorization: Bearer` headers.
#[derive(Clone, Debug, Default)]
pub struct BearerAssertion;

impl CredentialExtractor for BearerAssertion {
    fn applies(&self, request: &dyn RequestView) -> bool {
        match request.header("authorization") {
            Ok(Some(value)) => crate::authorization_credentials(value, "Bearer").is_some(),
            _ => false,
        }
    }

    fn extract(&self, request: &dyn RequestView) -> Result<CredentialEnvelope, VerificationFailure> {
        let value = request
            .header("authorization")
            .map_err(|error| VerificationFailure::BadCredentials {
                reason: format!("invalid authorization header: {}", error),
            })?
            .unwrap_or_default();
        let assertion = crate::authorization_credentials(value, "Bearer")
            .unwrap_or_default()
            .trim();
        if assertion.is_empty() {
            return Err(VerificationFailure::BadCredentials {
                reason: "Bearer authorization header carries no assertion".into(),
            });
        }
        Ok(CredentialEnvelope::federated(assertion))
    }

    fn scheme(&self) -> Scheme {
        Scheme::FederatedToken
    }
}

/// Verify federated assertions with an [`ExternalIdentityVerifier`].
///
/// Failures reported by the external provider are returned as
/// [`VerificationFailure::InvalidAssertion`] with the provider's code and description.
pub struct FederatedVerifier<E> {
    default_capabilities: Vec<String>,
    external: E,
}

impl<E> FederatedVerifier<E>
where
    E: ExternalIdentityVerifier,
{
    pub fn new(external: E) -> FederatedVerifier<E> {
        FederatedVerifier {
            default_capabilities: Vec::new(),
            external,
        }
    }

    /// Grant capabilities to all federated identities on top of the asserted ones.
    pub fn with_default_capabilities<I, C>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.default_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

#[async_trait::async_trait]
impl<E> Verifier for FederatedVerifier<E>
where
    E: ExternalIdentityVerifier,
{
    fn scheme(&self) -> Scheme {
        Scheme::FederatedToken
    }

    async fn verify(&self, context: &Context, envelope: &CredentialEnvelope) -> Verification {
        let assertion = match envelope {
            CredentialEnvelope::FederatedToken { assertion } => assertion,
            _ => {
                return Verification::Failed(VerificationFailure::UnsupportedEnvelope {
                    scheme: envelope.scheme(),
                })
            }
        };
        let claims = match self.external.verify_assertion(context, assertion).await {
            Ok(claims) => claims,
            Err(failure) => {
                return Verification::Failed(VerificationFailure::InvalidAssertion {
                    code: failure.code,
                    reason: failure.description,
                })
            }
        };
        let principal = Principal::Federated {
            subject: claims.subject,
            email: claims.email,
        };
        let capabilities = self
            .default_capabilities
            .iter()
            .cloned()
            .chain(claims.capabilities);
        Verification::Verified(Identity::new(principal, capabilities))
    }
}

/// Only accept federated identities with an email in one of the allowed domains.
#[derive(Clone, Debug)]
pub struct DomainPolicy {
    allowed: BTreeSet<String>,
}

impl DomainPolicy {
    /// Allow the given email domains, such as `corp.example.com`.
    pub fn new<I, S>(allowed: I) -> DomainPolicy
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let allowed = allowed
            .into_iter()
            .map(|domain| {
                let domain: String = domain.into();
                domain.to_ascii_lowercase()
            })
            .collect();
        DomainPolicy { allowed }
    }

    fn required(&self) -> String {
        self.allowed
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl IdentityPolicy for DomainPolicy {
    fn check(&self, identity: &Identity) -> Result<(), String> {
        let domain = match identity.principal().email_domain() {
            Some(domain) => domain,
            None => {
                return Err(format!(
                    "Cannot log in because [{}] has no email. Only emails with domain [{}] are accepted.",
                    identity.principal().name(),
                    self.required(),
                ))
            }
        };
        if self.allowed.contains(&domain.to_ascii_lowercase()) {
            return Ok(());
        }
        Err(format!(
            "Cannot log in because email has domain [@{}]. Only emails with domain [{}] are accepted.",
            domain,
            self.required(),
        ))
    }
}

/// Sandbox identity provider backed by a fixed table of known assertions.
#[derive(Clone, Debug, Default)]
pub struct StaticAssertions {
    assertions: HashMap<String, FederatedClaims>,
}

impl StaticAssertions {
    /// Add a known assertion and the claims it carries.
    pub fn insert<S: Into<String>>(&mut self, assertion: S, claims: FederatedClaims) {
        self.assertions.insert(assertion.into(), claims);
    }
}

impl FromIterator<(String, FederatedClaims)> for StaticAssertions {
    fn from_iter<T: IntoIterator<Item = (String, FederatedClaims)>>(iter: T) -> Self {
        StaticAssertions {
            assertions: iter.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl ExternalIdentityVerifier for StaticAssertions {
    async fn verify_assertion(
        &self,
        _: &Context,
        assertion: &str,
    ) -> Result<FederatedClaims, ExternalFailure> {
        self.assertions
            .get(assertion)
            .cloned()
            .ok_or_else(|| ExternalFailure::invalid_token("the assertion is not recognised"))
    }
}

#[cfg(test)]
mod tests {
    use portcullis_auth::identity::CredentialExtractor;
    use portcullis_auth::identity::FederatedClaims;
    use portcullis_auth::identity::IdentityPolicy;
    use portcullis_auth::identity::MockRequest;
    use portcullis_auth::identity::PolicyVerifier;
    use portcullis_auth::identity::VerificationFailure;
    use portcullis_auth::identity::VerifierRegistry;
    use portcullis_context::Context;
    use portcullis_models::CredentialEnvelope;
    use portcullis_models::Identity;
    use portcullis_models::Principal;

    use super::BearerAssertion;
    use super::DomainPolicy;
    use super::FederatedVerifier;
    use super::StaticAssertions;

    fn registry() -> VerifierRegistry {
        let mut assertions = StaticAssertions::default();
        assertions.insert(
            "corp-token",
            FederatedClaims {
                email: "admin@corp.example.com".into(),
                capabilities: vec!["admin".into()],
                subject: "1".into(),
            },
        );
        assertions.insert(
            "example-token",
            FederatedClaims {
                email: "alice@example.com".into(),
                capabilities: Vec::new(),
                subject: "2".into(),
            },
        );
        let verifier = FederatedVerifier::new(assertions).with_default_capabilities(["user"]);
        let verifier = PolicyVerifier::new(verifier, DomainPolicy::new(["corp.example.com"]));
        VerifierRegistry::builder()
            .register("federated", verifier)
            .build()
            .unwrap()
    }

    #[test]
    fn bearer_extract() {
        let extractor = BearerAssertion;
        let basic = MockRequest::get("/").with_header("authorization", "Basic YTpi");
        assert!(!extractor.applies(&basic));

        let request = MockRequest::get("/").with_header("authorization", "Bearer corp-token");
        assert!(extractor.applies(&request));
        let envelope = extractor.extract(&request).unwrap();
        assert_eq!(envelope, CredentialEnvelope::federated("corp-token"));

        let empty = MockRequest::get("/").with_header("authorization", "Bearer  ");
        assert!(extractor.extract(&empty).is_err());

        let uppercase = MockRequest::get("/").with_header("authorization", "BEARER corp-token");
        assert!(extractor.applies(&uppercase));
        let envelope = extractor.extract(&uppercase).unwrap();
        assert_eq!(envelope, CredentialEnvelope::federated("corp-token"));
    }

    #[tokio::test]
    async fn allowed_domain() {
        let context = Context::fixture();
        let envelope = CredentialEnvelope::federated("corp-token");
        let identity = registry().authenticate(&context, envelope).await.unwrap();
        assert_eq!(identity.principal().name(), "admin@corp.example.com");
        assert!(identity.has_capability("admin"));
        assert!(identity.has_capability("user"));
    }

    #[tokio::test]
    async fn forbidden_domain() {
        let context = Context::fixture();
        let envelope = CredentialEnvelope::federated("example-token");
        let error = registry().authenticate(&context, envelope).await.unwrap_err();
        assert!(matches!(error, VerificationFailure::PolicyRejected { .. }));
        assert_eq!(
            error.to_string(),
            "Cannot log in because email has domain [@example.com]. Only emails with domain [corp.example.com] are accepted."
        );
    }

    #[test]
    fn domain_policy_ignores_case() {
        let policy = DomainPolicy::new(["Corp.Example.com"]);
        let principal = Principal::Federated {
            subject: "3".into(),
            email: "ops@CORP.example.COM".into(),
        };
        let identity = Identity::new(principal, ["user"]);
        assert!(policy.check(&identity).is_ok());
    }

    #[tokio::test]
    async fn unknown_assertion() {
        let context = Context::fixture();
        let envelope = CredentialEnvelope::federated("forged");
        let error = registry().authenticate(&context, envelope).await.unwrap_err();
        match error {
            VerificationFailure::InvalidAssertion { code, .. } => assert_eq!(code, "invalid_token"),
            other => panic!("unexpected failure {:?}", other),
        }
    }
}
