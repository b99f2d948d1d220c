use anyhow::Result;

use portcullis_auth::access::Authoriser;

use crate::DenialPolicy;
use crate::Exchange;
use crate::Flow;
use crate::Interceptor;
use crate::Rejection;

/// Name of the [`RouteGuard`] in pipelines, reserved for it.
pub const ROUTE_GUARD_NAME: &str = "route-guard";

/// Decide if the caller can access the requested route before it is dispatched.
///
/// Denials are answered with 401 (anonymous callers) or 403 (forbidden callers),
/// or with redirects when a [`DenialPolicy`] is set.
#[derive(Clone, Debug)]
pub struct RouteGuard {
    authoriser: Authoriser,
    denial: Option<DenialPolicy>,
}

impl RouteGuard {
    /// Guard routes with the given authoriser.
    pub fn new(authoriser: Authoriser) -> RouteGuard {
        RouteGuard {
            authoriser,
            denial: None,
        }
    }

    /// Redirect browsers according to the policy when access is denied.
    pub fn with_denial_policy(mut self, policy: DenialPolicy) -> Self {
        self.denial = Some(policy);
        self
    }
}

#[async_trait::async_trait(?Send)]
impl Interceptor for RouteGuard {
    async fn intercept(&self, exchange: &Exchange<'_>) -> Result<Flow> {
        let request = exchange.request();
        let context = exchange
            .context()
            .derive()
            .authenticated(exchange.caller())
            .build();
        let denied = match self.authoriser.route(&context, request.path()) {
            Ok(()) => return Ok(Flow::Proceed),
            Err(denied) => denied,
        };
        let rejection = match &self.denial {
            Some(policy) => policy.reject(request, &denied),
            None => Rejection::from(&denied),
        };
        Ok(Flow::Reject(rejection))
    }
}
