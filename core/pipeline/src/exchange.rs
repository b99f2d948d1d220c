use std::sync::Arc;

use portcullis_auth::identity::RequestView;
use portcullis_context::Context;
use portcullis_context::ContextStore;
use portcullis_models::Caller;
use portcullis_models::Identity;

/// Access to the request being processed and its authentication state.
///
/// Interceptors can record the identity of the caller but never clear it:
/// the pipeline driver owns the store's lifecycle.
pub struct Exchange<'a> {
    context: &'a Context,
    request: &'a dyn RequestView,
    store: &'a ContextStore,
}

impl<'a> Exchange<'a> {
    pub(crate) fn new(
        context: &'a Context,
        request: &'a dyn RequestView,
        store: &'a ContextStore,
    ) -> Exchange<'a> {
        Exchange {
            context,
            request,
            store,
        }
    }

    /// Record the verified identity of the caller for all later stages.
    pub fn authenticate(&self, identity: Identity) -> Arc<Identity> {
        self.store.set(identity)
    }

    /// The current caller, as recorded by earlier interceptors.
    pub fn caller(&self) -> Caller {
        self.store.get()
    }

    /// Context for the request, with the logger to use while processing it.
    ///
    /// The context's caller is only updated once the pipeline completes,
    /// use [`Exchange::caller`] while interceptors are running.
    pub fn context(&self) -> &Context {
        self.context
    }

    /// The request being processed.
    pub fn request(&self) -> &dyn RequestView {
        self.request
    }
}
