//! Module to deal with the Authorisation (what can be done) side of Auth.
//!
//! All access decisions go through [`decide`], regardless of granularity,
//! and the [`Authoriser`] bundles them for request handling:
//!
//! - Route decisions, with [`RouteRules::authorise`], happen before requests are dispatched.
//! - Operation decisions, with [`OperationGuard`], happen before guarded logic executes.
//! - Field decisions, with [`FieldGuard`], happen as composite results are assembled.
//!
//! Every decision is audited and counted.
use std::fmt::Display;
use std::fmt::Formatter;
use std::future::Future;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;

use portcullis_context::Context;
use portcullis_models::Caller;

mod audit;
mod guard;
mod requirement;
mod routes;


pub use self::audit::Audit;
pub use self::audit::AuditDecision;
pub use self::guard::AuthorizeFields;
pub use self::guard::FieldGuard;
pub use self::guard::OnDenied;
pub use self::guard::OperationGuard;
pub use self::requirement::PrincipalPredicate;
pub use self::requirement::Requirement;
pub use self::routes::PathPattern;
pub use self::routes::PatternError;
pub use self::routes::RouteRule;
pub use self::routes::RouteRules;

use crate::telemetry::ACCESS_DECISION_COUNT;

/// Entry point for access decisions at all granularities.
///
/// Authorisers are cheap to clone and share across workers: route rules are
/// fixed at creation and never change.
#[derive(Clone, Debug)]
pub struct Authoriser {
    routes: Arc<RouteRules>,
}

impl Authoriser {
    /// Authorise the composite result for the [`Context`]'s caller.
    pub fn fields<T: AuthorizeFields>(&self, context: &Context, value: T) -> T {
        value.authorize_fields(context)
    }

    /// Invoke an operation through its guard.
    pub fn invoke<T, F>(
        &self,
        context: &Context,
        guard: &OperationGuard<T>,
        operation: F,
    ) -> Result<T, AccessDenied>
    where
        F: FnOnce() -> T,
    {
        guard.invoke(context, operation)
    }

    /// Await an operation through its guard.
    pub async fn invoke_async<T, F>(
        &self,
        context: &Context,
        guard: &OperationGuard<T>,
        operation: F,
    ) -> Result<T, AccessDenied>
    where
        F: Future<Output = T>,
    {
        guard.invoke_async(context, operation).await
    }

    /// Create an authoriser that checks routes against the given rules.
    pub fn new(routes: RouteRules) -> Authoriser {
        Authoriser {
            routes: Arc::new(routes),
        }
    }

    /// Decide if the caller can access a request path.
    pub fn route(&self, context: &Context, path: &str) -> Result<(), AccessDenied> {
        self.routes.authorise(context, path)
    }

    /// Route rules checked by this authoriser.
    pub fn routes(&self) -> &RouteRules {
        &self.routes
    }
}

/// Level at which an access decision is made.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// A field of a composite result.
    Field,

    /// An internal operation.
    Operation,

    /// An HTTP route, before dispatch.
    Route,
}

impl Granularity {
    /// Stable string identifier of the granularity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Field => "field",
            Granularity::Operation => "operation",
            Granularity::Route => "route",
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller is not allowed to access a target.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum AccessDenied {
    /// The caller is authenticated but does not satisfy the requirement.
    #[error("\"{principal}\" is not allowed to access {granularity} \"{target}\": requires {requirement}")]
    Forbidden {
        granularity: Granularity,
        principal: String,
        requirement: String,
        target: String,
    },

    /// The caller is anonymous and the target requires authentication.
    #[error("authentication is required to access {granularity} \"{target}\"")]
    Unauthenticated {
        granularity: Granularity,
        target: String,
    },
}

impl AccessDenied {
    /// Check if access was denied to an anonymous caller.
    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, AccessDenied::Unauthenticated { .. })
    }
}

/// Decide if the [`Context`]'s caller satisfies a requirement to access a target.
///
/// Decisions have no side effects other than auditing: the same caller and requirement
/// always result in the same decision.
pub fn decide(
    context: &Context,
    granularity: Granularity,
    target: &str,
    requirement: &Requirement,
) -> Result<(), AccessDenied> {
    let result = if requirement.evaluate(&context.caller) {
        Ok(())
    } else {
        Err(denial(&context.caller, granularity, target, requirement))
    };

    let audit = Audit::decision(context, granularity, target, requirement, &result);
    audit.emit(context);
    ACCESS_DECISION_COUNT
        .with_label_values(&[granularity.as_str(), audit.decision.as_str()])
        .inc();
    result
}

fn denial(
    caller: &Caller,
    granularity: Granularity,
    target: &str,
    requirement: &Requirement,
) -> AccessDenied {
    match caller {
        Caller::Anonymous => AccessDenied::Unauthenticated {
            granularity,
            target: target.to_string(),
        },
        Caller::Authenticated(identity) => AccessDenied::Forbidden {
            granularity,
            principal: identity.principal().name().to_string(),
            requirement: requirement.to_string(),
            target: target.to_string(),
        },
    }
}
