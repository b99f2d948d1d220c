//! Operation and field level access guards.
use std::future::Future;
use std::sync::Arc;

use portcullis_context::Context;

use super::AccessDenied;
use super::Granularity;
use super::Requirement;

/// What an [`OperationGuard`] does when the caller is denied access.
pub enum OnDenied<T> {
    /// Return an [`AccessDenied`] error to the invoker.
    Fail,

    /// Return the fallback value instead of executing the guarded operation.
    Fallback(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> Clone for OnDenied<T> {
    fn clone(&self) -> Self {
        match self {
            OnDenied::Fail => OnDenied::Fail,
            OnDenied::Fallback(fallback) => OnDenied::Fallback(Arc::clone(fallback)),
        }
    }
}

/// Guard an internal operation behind a [`Requirement`].
///
/// The requirement is checked against the [`Context`]'s caller every time the
/// operation is invoked and the operation is never executed when access is denied.
#[derive(Clone)]
pub struct OperationGuard<T> {
    name: String,
    on_denied: OnDenied<T>,
    requirement: Requirement,
}

impl<T> OperationGuard<T> {
    /// Invoke the guarded operation if the caller is allowed to.
    pub fn invoke<F>(&self, context: &Context, operation: F) -> Result<T, AccessDenied>
    where
        F: FnOnce() -> T,
    {
        match super::decide(context, Granularity::Operation, &self.name, &self.requirement) {
            Ok(()) => Ok(operation()),
            Err(error) => self.denied(error),
        }
    }

    /// Await the guarded operation if the caller is allowed to.
    ///
    /// The future is dropped without being polled when access is denied.
    pub async fn invoke_async<F>(&self, context: &Context, operation: F) -> Result<T, AccessDenied>
    where
        F: Future<Output = T>,
    {
        match super::decide(context, Granularity::Operation, &self.name, &self.requirement) {
            Ok(()) => Ok(operation.await),
            Err(error) => self.denied(error),
        }
    }

    /// Name of the guarded operation, as reported in audit records.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Guard an operation that fails with [`AccessDenied`] when callers are not allowed.
    pub fn new<S: Into<String>>(name: S, requirement: Requirement) -> Self {
        OperationGuard {
            name: name.into(),
            on_denied: OnDenied::Fail,
            requirement,
        }
    }

    /// Return a fallback value instead of failing when callers are not allowed.
    pub fn with_fallback<F>(mut self, fallback: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.on_denied = OnDenied::Fallback(Arc::new(fallback));
        self
    }

    fn denied(&self, error: AccessDenied) -> Result<T, AccessDenied> {
        match &self.on_denied {
            OnDenied::Fail => Err(error),
            OnDenied::Fallback(fallback) => Ok(fallback()),
        }
    }
}

/// Guard a single field of a composite result behind a [`Requirement`].
///
/// Denied fields are replaced with a fallback value rather than failing the whole result.
#[derive(Clone)]
pub struct FieldGuard<T> {
    fallback: fn() -> T,
    field: String,
    requirement: Requirement,
}

impl<T> FieldGuard<T> {
    /// Return the field value if the caller is allowed to see it, the fallback otherwise.
    pub fn apply(&self, context: &Context, value: T) -> T {
        match super::decide(context, Granularity::Field, &self.field, &self.requirement) {
            Ok(()) => value,
            Err(_) => (self.fallback)(),
        }
    }

    /// Guard a field, replacing it with `fallback` for callers that are not allowed.
    pub fn new<S: Into<String>>(field: S, requirement: Requirement, fallback: fn() -> T) -> Self {
        FieldGuard {
            fallback,
            field: field.into(),
            requirement,
        }
    }
}

impl<T: Default> FieldGuard<T> {
    /// Guard a field, replacing it with the type's default for callers that are not allowed.
    pub fn or_default<S: Into<String>>(field: S, requirement: Requirement) -> Self {
        FieldGuard::new(field, requirement, T::default)
    }
}

/// Composite results with fields that may be hidden from some callers.
pub trait AuthorizeFields: Sized {
    /// Apply all field guards for the [`Context`]'s caller.
    fn authorize_fields(self, context: &Context) -> Self;
}

impl<T: AuthorizeFields> AuthorizeFields for Option<T> {
    fn authorize_fields(self, context: &Context) -> Self {
        self.map(|value| value.authorize_fields(context))
    }
}

impl<T: AuthorizeFields> AuthorizeFields for Vec<T> {
    fn authorize_fields(self, context: &Context) -> Self {
        self.into_iter()
            .map(|value| value.authorize_fields(context))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;
    use std::sync::atomic::Ordering;

    use once_cell::sync::Lazy;
    use portcullis_context::Context;
    use portcullis_models::Caller;
    use portcullis_models::Identity;
    use portcullis_models::Principal;

    use super::AuthorizeFields;
    use super::FieldGuard;
    use super::OperationGuard;
    use crate::access::AccessDenied;
    use crate::access::Requirement;

    static VENUE: Lazy<FieldGuard<Option<String>>> = Lazy::new(|| {
        FieldGuard::or_default("conference.venue", Requirement::capability("geoguesser"))
    });

    #[derive(Debug, Eq, PartialEq)]
    struct Conference {
        name: String,
        venue: Option<String>,
    }

    impl AuthorizeFields for Conference {
        fn authorize_fields(mut self, context: &Context) -> Self {
            self.venue = VENUE.apply(context, self.venue);
            self
        }
    }

    fn conferences() -> Vec<Conference> {
        vec![
            Conference {
                name: "RustConf".into(),
                venue: Some("Montreal".into()),
            },
            Conference {
                name: "EuroRust".into(),
                venue: Some("Vienna".into()),
            },
        ]
    }

    fn context(name: &str, capabilities: &[&str]) -> Context {
        let identity = Identity::new(Principal::user(name), capabilities.iter().copied());
        Context::fixture()
            .derive()
            .authenticated(Caller::from(identity))
            .build()
    }

    fn name_contains_a() -> Requirement {
        Requirement::capability("admin")
            .and(Requirement::principal("name-contains-a", |p| p.name().contains('a')))
    }

    #[test]
    fn operation_allowed() {
        let guard = OperationGuard::new("conferences.list", name_contains_a());
        let context = context("alice", &["admin"]);
        let result = guard.invoke(&context, || 42).unwrap();
        assert_eq!(result, 42);
        assert_eq!(guard.name(), "conferences.list");
    }

    #[test]
    fn operation_denied_does_not_execute() {
        let guard = OperationGuard::new("conferences.list", name_contains_a());
        let context = context("bob", &["admin"]);
        let executed = AtomicBool::new(false);
        let result = guard.invoke(&context, || {
            executed.store(true, Ordering::Relaxed);
            42
        });
        assert!(matches!(result, Err(AccessDenied::Forbidden { .. })));
        assert!(!executed.load(Ordering::Relaxed));
    }

    #[test]
    fn operation_denied_anonymous() {
        let guard = OperationGuard::new("conferences.list", Requirement::Authenticated);
        let result = guard.invoke(&Context::fixture(), || 42);
        match result {
            Err(error) => assert!(error.is_unauthenticated()),
            Ok(_) => panic!("anonymous callers must be denied"),
        }
    }

    #[test]
    fn operation_denied_fallback() {
        let guard = OperationGuard::new("conferences.list", name_contains_a())
            .with_fallback(Vec::<Conference>::new);
        let context = context("bob", &["admin"]);
        let result = guard.invoke(&context, conferences).unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn operation_async_denied_is_not_polled() {
        let guard = OperationGuard::new("conferences.list", name_contains_a());
        let context = context("bob", &["admin"]);
        let executed = AtomicBool::new(false);
        let result = guard
            .invoke_async(&context, async {
                executed.store(true, Ordering::Relaxed);
                42
            })
            .await;
        assert!(result.is_err());
        assert!(!executed.load(Ordering::Relaxed));

        let context = self::context("alice", &["admin"]);
        let result = guard.invoke_async(&context, async { 42 }).await.unwrap();
        assert_eq!(result, 42);
    }

    #[test]
    fn fields_hidden_without_capability() {
        let context = context("alice", &["admin"]);
        let result = conferences().authorize_fields(&context);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|conference| conference.venue.is_none()));
        assert_eq!(result[0].name, "RustConf");
    }

    #[test]
    fn fields_visible_with_capability() {
        let context = context("alice", &["admin", "geoguesser"]);
        let result = conferences().authorize_fields(&context);
        assert_eq!(result, conferences());
    }

    #[test]
    fn fields_in_optional_results() {
        let context = Context::fixture();
        let result = conferences().pop().authorize_fields(&context).unwrap();
        assert_eq!(result.venue, None);
        let none: Option<Conference> = None;
        assert_eq!(none.authorize_fields(&context), None);
    }

    #[test]
    fn field_guard_custom_fallback() {
        let guard = FieldGuard::new("conference.venue", Requirement::DenyAll, || {
            "<hidden>".to_string()
        });
        let context = context("alice", &["admin"]);
        assert_eq!(guard.apply(&context, "Vienna".to_string()), "<hidden>");
    }
}
