use std::sync::atomic::AtomicU16;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use portcullis_context::Context;
use portcullis_models::CredentialEnvelope;
use portcullis_models::Identity;
use portcullis_models::Principal;
use portcullis_models::Scheme;

use super::PolicyVerifier;
use super::RegistryError;
use super::RequestView;
use super::Verification;
use super::VerificationFailure;
use super::Verifier;
use super::VerifierRegistry;

/// Test verifier returning a fixed outcome and counting its invocations.
struct Fixed {
    calls: Arc<AtomicU16>,
    outcome: fn(&CredentialEnvelope) -> Verification,
    scheme: Scheme,
}

impl Fixed {
    fn new(scheme: Scheme, outcome: fn(&CredentialEnvelope) -> Verification) -> Fixed {
        Fixed {
            calls: Arc::new(AtomicU16::new(0)),
            outcome,
            scheme,
        }
    }
}

#[async_trait::async_trait]
impl Verifier for Fixed {
    fn scheme(&self) -> Scheme {
        self.scheme
    }

    async fn verify(&self, _: &Context, envelope: &CredentialEnvelope) -> Verification {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (self.outcome)(envelope)
    }
}

fn decline(_: &CredentialEnvelope) -> Verification {
    Verification::Declined
}

fn fail(_: &CredentialEnvelope) -> Verification {
    Verification::bad_credentials("Bad credentials")
}

fn verify_claimed(envelope: &CredentialEnvelope) -> Verification {
    let name = envelope.claimed_principal().unwrap_or("robot");
    Verification::Verified(Identity::new(Principal::user(name), ["user"]))
}

#[tokio::test]
async fn first_supporting_verifier_wins() {
    let context = Context::fixture();
    let robot = Fixed::new(Scheme::FixedSecret, fail);
    let password = Fixed::new(Scheme::Password, verify_claimed);
    let robot_calls = Arc::clone(&robot.calls);
    let registry = VerifierRegistry::builder()
        .register("robot", robot)
        .register("password", password)
        .build()
        .unwrap();

    let envelope = CredentialEnvelope::password("alice", "password");
    let identity = registry.authenticate(&context, envelope).await.unwrap();
    assert_eq!(identity.principal().name(), "alice");
    assert_eq!(robot_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn declined_envelopes_move_to_next_verifier() {
    let context = Context::fixture();
    let special = Fixed::new(Scheme::Password, decline);
    let fallback = Fixed::new(Scheme::Password, verify_claimed);
    let special_calls = Arc::clone(&special.calls);
    let registry = VerifierRegistry::builder()
        .register("special", special)
        .register("fallback", fallback)
        .build()
        .unwrap();

    let envelope = CredentialEnvelope::password("bob", "password");
    let identity = registry.authenticate(&context, envelope).await.unwrap();
    assert_eq!(identity.principal().name(), "bob");
    assert_eq!(special_calls.load(Ordering::Relaxed), 1);
}

#[tokio::test]
async fn failures_stop_the_scan() {
    let context = Context::fixture();
    let failing = Fixed::new(Scheme::Password, fail);
    let fallback = Fixed::new(Scheme::Password, verify_claimed);
    let fallback_calls = Arc::clone(&fallback.calls);
    let registry = VerifierRegistry::builder()
        .register("failing", failing)
        .register("fallback", fallback)
        .build()
        .unwrap();

    let envelope = CredentialEnvelope::password("bob", "wrong");
    let error = registry.authenticate(&context, envelope).await.unwrap_err();
    assert!(matches!(error, VerificationFailure::BadCredentials { .. }));
    assert_eq!(error.to_string(), "Bad credentials");
    assert_eq!(fallback_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn all_declined_is_not_accepted() {
    let context = Context::fixture();
    let registry = VerifierRegistry::builder()
        .register("special", Fixed::new(Scheme::Password, decline))
        .build()
        .unwrap();
    let envelope = CredentialEnvelope::password("bob", "password");
    let error = registry.authenticate(&context, envelope).await.unwrap_err();
    assert!(matches!(
        error,
        VerificationFailure::NotAccepted {
            scheme: Scheme::Password
        }
    ));
}

#[tokio::test]
async fn unsupported_envelope() {
    let context = Context::fixture();
    let registry = VerifierRegistry::builder()
        .register("password", Fixed::new(Scheme::Password, verify_claimed))
        .build()
        .unwrap();
    assert!(registry.supports_scheme(Scheme::Password));
    assert!(!registry.supports_scheme(Scheme::FederatedToken));

    let envelope = CredentialEnvelope::federated("token");
    let error = registry.authenticate(&context, envelope).await.unwrap_err();
    assert!(matches!(
        error,
        VerificationFailure::UnsupportedEnvelope { .. }
    ));
}

#[test]
fn registry_rejects_duplicate_ids() {
    let result = VerifierRegistry::builder()
        .register("password", Fixed::new(Scheme::Password, verify_claimed))
        .register("password", Fixed::new(Scheme::Password, fail))
        .build();
    match result {
        Err(RegistryError::DuplicateVerifier(id)) => assert_eq!(id, "password"),
        _ => panic!("expected a duplicate verifier error"),
    }
}

#[test]
fn registry_rejects_empty() {
    let result = VerifierRegistry::builder().build();
    assert!(matches!(result, Err(RegistryError::Empty)));
}

#[tokio::test]
async fn policy_rejects_verified_identities() {
    let context = Context::fixture();
    let policy = |identity: &Identity| -> Result<(), String> {
        if identity.principal().name() == "mallory" {
            return Err("mallory is not welcome".to_string());
        }
        Ok(())
    };
    let verifier = PolicyVerifier::new(Fixed::new(Scheme::Password, verify_claimed), policy);
    assert_eq!(verifier.scheme(), Scheme::Password);

    let envelope = CredentialEnvelope::password("mallory", "password");
    match verifier.verify(&context, &envelope).await {
        Verification::Failed(VerificationFailure::PolicyRejected { reason }) => {
            assert_eq!(reason, "mallory is not welcome")
        }
        other => panic!("unexpected verification outcome {:?}", other),
    }

    let envelope = CredentialEnvelope::password("alice", "password");
    let outcome = verifier.verify(&context, &envelope).await;
    assert!(matches!(outcome, Verification::Verified(_)));
}

#[tokio::test]
async fn policy_passes_through_declines() {
    let context = Context::fixture();
    let policy = |_: &Identity| -> Result<(), String> { Err("never".to_string()) };
    let verifier = PolicyVerifier::new(Fixed::new(Scheme::Password, decline), policy);
    let envelope = CredentialEnvelope::password("alice", "password");
    let outcome = verifier.verify(&context, &envelope).await;
    assert!(matches!(outcome, Verification::Declined));
}

#[test]
fn mock_request_headers_are_case_insensitive() {
    let request = super::MockRequest::get("/private").with_header("X-Robot-Secret", "beep-boop");
    assert!(request.has_header("x-robot-secret"));
    assert_eq!(
        request.header("x-robot-secret").unwrap(),
        Some("beep-boop")
    );
    assert_eq!(request.path(), "/private");
    assert!(!request.accepts_html());
}
