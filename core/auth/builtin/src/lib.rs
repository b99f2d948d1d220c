//! Built-in credential extractors and verifiers.
//!
//! Three credential schemes are supported out of the box:
//!
//! - Fixed secrets presented by trusted robots in a request header.
//! - Username and password pairs with HTTP Basic authentication.
//! - Assertions issued by an external identity provider as Bearer tokens.
mod federated;
mod password;
mod secret;

pub use self::federated::BearerAssertion;
pub use self::federated::DomainPolicy;
pub use self::federated::FederatedVerifier;
pub use self::federated::StaticAssertions;
pub use self::password::BasicAuth;
pub use self::password::PasswordVerifier;
pub use self::password::SinglePrincipalVerifier;
pub use self::password::User;
pub use self::password::UserStore;
pub use self::secret::FixedSecretVerifier;
pub use self::secret::SecretHeader;
pub use self::secret::DEFAULT_SECRET;
pub use self::secret::DEFAULT_SECRET_HEADER;

/// Return the credentials of an `Authorization` header value using the given scheme.
///
/// Scheme names are matched case-insensitively.
fn authorization_credentials<'a>(value: &'a str, scheme: &str) -> Option<&'a str> {
    let (name, credentials) = value.split_once(' ')?;
    if name.eq_ignore_ascii_case(scheme) {
        return Some(credentials);
    }
    None
}
