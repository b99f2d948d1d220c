//! Capability expressions evaluated against request callers.
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use portcullis_models::Caller;
use portcullis_models::Identity;
use portcullis_models::Principal;

/// Named predicate over the principal of an authenticated caller.
#[derive(Clone)]
pub struct PrincipalPredicate {
    check: Arc<dyn Fn(&Principal) -> bool + Send + Sync>,
    name: String,
}

impl PrincipalPredicate {
    /// Wrap a predicate function with a name used in logs and audit records.
    pub fn new<S, F>(name: S, check: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        PrincipalPredicate {
            check: Arc::new(check),
            name: name.into(),
        }
    }

    /// Name of the predicate.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Evaluate the predicate.
    pub fn test(&self, principal: &Principal) -> bool {
        (self.check)(principal)
    }
}

impl Debug for PrincipalPredicate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("PrincipalPredicate").field(&self.name).finish()
    }
}

/// Boolean expression over the capabilities and principal of a [`Caller`].
///
/// Requirements are evaluated without side effects and always terminate:
/// principal predicates only ever see the principal being checked.
///
/// Anonymous callers only satisfy requirements that are public by construction
/// (see [`Requirement::evaluate`]).
#[derive(Clone, Debug)]
pub enum Requirement {
    /// All the inner requirements must be satisfied.
    All(Vec<Requirement>),

    /// At least one of the inner requirements must be satisfied.
    Any(Vec<Requirement>),

    /// Any authenticated caller is allowed.
    Authenticated,

    /// The caller must have been granted the named capability.
    Capability(String),

    /// Nobody is allowed.
    DenyAll,

    /// The inner requirement must NOT be satisfied.
    Not(Box<Requirement>),

    /// Everyone is allowed, including anonymous callers.
    PermitAll,

    /// The caller's principal must satisfy a predicate.
    Principal(PrincipalPredicate),
}

impl Requirement {
    /// Require all of the given requirements.
    pub fn all<I: IntoIterator<Item = Requirement>>(requirements: I) -> Self {
        Requirement::All(requirements.into_iter().collect())
    }

    /// Combine this requirement with another, both must be satisfied.
    pub fn and(self, other: Requirement) -> Self {
        match self {
            Requirement::All(mut requirements) => {
                requirements.push(other);
                Requirement::All(requirements)
            }
            requirement => Requirement::All(vec![requirement, other]),
        }
    }

    /// Require at least one of the given requirements.
    pub fn any<I: IntoIterator<Item = Requirement>>(requirements: I) -> Self {
        Requirement::Any(requirements.into_iter().collect())
    }

    /// Require at least one of the named capabilities.
    pub fn any_capability<I, S>(capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let requirements = capabilities
            .into_iter()
            .map(|capability| Requirement::Capability(capability.into()));
        Requirement::any(requirements)
    }

    /// Require the named capability.
    pub fn capability<S: Into<String>>(capability: S) -> Self {
        Requirement::Capability(capability.into())
    }

    /// Evaluate the requirement for a request caller.
    ///
    /// Anonymous callers never satisfy capability, principal, authenticated or negated
    /// requirements: only [`Requirement::PermitAll`] and compositions of it admit them.
    pub fn evaluate(&self, caller: &Caller) -> bool {
        match caller {
            Caller::Anonymous => self.admits_anonymous(),
            Caller::Authenticated(identity) => self.admits(identity),
        }
    }

    /// Negate the requirement.
    pub fn negate(self) -> Self {
        Requirement::Not(Box::new(self))
    }

    /// Combine this requirement with another, either must be satisfied.
    pub fn or(self, other: Requirement) -> Self {
        match self {
            Requirement::Any(mut requirements) => {
                requirements.push(other);
                Requirement::Any(requirements)
            }
            requirement => Requirement::Any(vec![requirement, other]),
        }
    }

    /// Require the caller's principal to satisfy a named predicate.
    pub fn principal<S, F>(name: S, check: F) -> Self
    where
        S: Into<String>,
        F: Fn(&Principal) -> bool + Send + Sync + 'static,
    {
        Requirement::Principal(PrincipalPredicate::new(name, check))
    }
}

impl Requirement {
    fn admits(&self, identity: &Identity) -> bool {
        match self {
            Requirement::All(requirements) => requirements.iter().all(|r| r.admits(identity)),
            Requirement::Any(requirements) => requirements.iter().any(|r| r.admits(identity)),
            Requirement::Authenticated => true,
            Requirement::Capability(capability) => identity.has_capability(capability),
            Requirement::DenyAll => false,
            Requirement::Not(requirement) => !requirement.admits(identity),
            Requirement::PermitAll => true,
            Requirement::Principal(predicate) => predicate.test(identity.principal()),
        }
    }

    fn admits_anonymous(&self) -> bool {
        match self {
            Requirement::All(requirements) => requirements.iter().all(Self::admits_anonymous),
            Requirement::Any(requirements) => requirements.iter().any(Self::admits_anonymous),
            Requirement::PermitAll => true,
            _ => false,
        }
    }
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn join(f: &mut Formatter<'_>, items: &[Requirement], op: &str) -> std::fmt::Result {
            f.write_str("(")?;
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    write!(f, " {} ", op)?;
                }
                write!(f, "{}", item)?;
            }
            f.write_str(")")
        }
        match self {
            Requirement::All(items) => join(f, items, "and"),
            Requirement::Any(items) => join(f, items, "or"),
            Requirement::Authenticated => f.write_str("authenticated"),
            Requirement::Capability(capability) => write!(f, "capability('{}')", capability),
            Requirement::DenyAll => f.write_str("deny-all"),
            Requirement::Not(inner) => write!(f, "not {}", inner),
            Requirement::PermitAll => f.write_str("permit-all"),
            Requirement::Principal(predicate) => write!(f, "principal({})", predicate.name()),
        }
    }
}
