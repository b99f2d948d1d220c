//! Mutable per-request holder of the current [`Caller`].
use std::cell::RefCell;
use std::sync::Arc;

use portcullis_models::Caller;
use portcullis_models::Identity;

/// Holds at most one current [`Identity`] while a request is being processed.
///
/// A store is created for each request by the pipeline driver and is never shared
/// with other requests: it is neither `Sync` nor `Send` across the pipeline boundary
/// so concurrent requests can't observe each other's values.
///
/// Writes made earlier in a request's pipeline are observed by later reads of the same request.
#[derive(Debug, Default)]
pub struct ContextStore {
    current: RefCell<Caller>,
}

impl ContextStore {
    /// Reset the store to [`Caller::Anonymous`].
    ///
    /// Only the pipeline driver should clear stores, by holding a [`StoreScope`]
    /// for the whole lifetime of the request.
    pub fn clear(&self) {
        self.current.replace(Caller::Anonymous);
    }

    /// Return the current caller, [`Caller::Anonymous`] if no identity was set.
    pub fn get(&self) -> Caller {
        self.current.borrow().clone()
    }

    /// Create an empty store.
    pub fn new() -> ContextStore {
        ContextStore::default()
    }

    /// Guard the store so it is cleared when the guard is dropped.
    ///
    /// Dropping happens on every exit path: handler completion, short-circuits
    /// and cancellation of the request future.
    pub fn scope(&self) -> StoreScope<'_> {
        StoreScope { store: self }
    }

    /// Replace any existing caller with the given identity.
    pub fn set(&self, identity: Identity) -> Arc<Identity> {
        let identity = Arc::new(identity);
        self.current
            .replace(Caller::Authenticated(Arc::clone(&identity)));
        identity
    }
}

/// Clears a [`ContextStore`] when dropped.
#[must_use = "the store is cleared as soon as the scope is dropped"]
pub struct StoreScope<'a> {
    store: &'a ContextStore,
}

impl<'a> Drop for StoreScope<'a> {
    fn drop(&mut self) {
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use portcullis_models::Caller;
    use portcullis_models::Identity;
    use portcullis_models::Principal;

    use super::ContextStore;

    fn robot() -> Identity {
        Identity::new(Principal::service("robot"), ["robot"])
    }

    #[test]
    fn empty_store_is_anonymous() {
        let store = ContextStore::new();
        assert_eq!(store.get(), Caller::Anonymous);
    }

    #[test]
    fn set_then_get_returns_same_identity() {
        let store = ContextStore::new();
        let identity = robot();
        let stored = store.set(identity.clone());
        match store.get() {
            Caller::Anonymous => panic!("expected an authenticated caller"),
            Caller::Authenticated(current) => {
                assert!(Arc::ptr_eq(&current, &stored));
                assert_eq!(*current, identity);
            }
        }
    }

    #[test]
    fn set_replaces_previous_identity() {
        let store = ContextStore::new();
        store.set(robot());
        store.set(Identity::new(Principal::user("alice"), ["user"]));
        assert_eq!(store.get().name(), "alice");
    }

    #[test]
    fn scope_clears_on_drop() {
        let store = ContextStore::new();
        {
            let _scope = store.scope();
            store.set(robot());
            assert!(!store.get().is_anonymous());
        }
        assert!(store.get().is_anonymous());
    }

    #[test]
    fn scope_clears_on_panic() {
        let store = ContextStore::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _scope = store.scope();
            store.set(robot());
            panic!("request handling failed");
        }));
        assert!(result.is_err());
        assert!(store.get().is_anonymous());
    }
}
