//! Authentication and Authorisation data and interfaces for Portcullis services.
//!
//! First of all:
//!
//! - Authentication: answers "who is asking for access?" (it is about identity).
//! - Authorisation: answers "can they do what they are asking to do?" (it is about access).
//!
//! ## Authentication
//!
//! Requests carry unverified credentials which are extracted into [`CredentialEnvelope`]s
//! by [`CredentialExtractor`](identity::CredentialExtractor)s.
//! Envelopes are handed to a [`VerifierRegistry`](identity::VerifierRegistry) which
//! looks for the first [`Verifier`](identity::Verifier) able to turn them into an [`Identity`].
//!
//! Verifiers have three possible outcomes:
//!
//! 1. The credentials are verified and an [`Identity`] is returned.
//! 2. The verifier declines the credentials and the registry moves on to the next verifier.
//! 3. The credentials are invalid and authentication fails.
//!
//! ## Authorisation
//!
//! Access is expressed with [`Requirement`](access::Requirement)s evaluated against
//! the [`Caller`] of a request at three granularities:
//!
//! - Routes: before requests are dispatched to handlers.
//! - Operations: before logic tagged with a requirement is executed.
//! - Fields: when composite results are assembled for return.
pub mod access;
pub mod identity;
pub mod telemetry;

// Re-export model definitions for convenience.
pub use portcullis_models::Caller;
pub use portcullis_models::CredentialEnvelope;
pub use portcullis_models::Identity;
pub use portcullis_models::Principal;
pub use portcullis_models::Scheme;
