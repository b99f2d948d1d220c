//! Information attached to access decision audit records.
use opentelemetry_api::trace::TraceContextExt;
use opentelemetry_api::trace::TraceId;
use opentelemetry_api::Context as OTelContext;
use serde::Deserialize;
use serde::Serialize;

use portcullis_context::Context;
use portcullis_models::Principal;

use super::AccessDenied;
use super::Granularity;
use super::Requirement;

/// Payload for access decision audit records.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Audit {
    /// Result of the access decision.
    pub decision: AuditDecision,

    /// Level at which the decision was made.
    pub granularity: Granularity,

    /// Principal of the caller, `None` for anonymous callers.
    pub principal: Option<Principal>,

    /// Requirement the caller was checked against.
    pub requirement: String,

    /// Route, operation or field the caller attempted to access.
    pub target: String,

    /// Tracing ID to link this audit record to a larger context, if tracing is available.
    pub trace_id: Option<String>,
}

impl Audit {
    /// Compose an audit record for an access decision.
    pub fn decision(
        context: &Context,
        granularity: Granularity,
        target: &str,
        requirement: &Requirement,
        result: &Result<(), AccessDenied>,
    ) -> Audit {
        let trace_id = OTelContext::current().span().span_context().trace_id();
        let trace_id = if trace_id == TraceId::INVALID {
            None
        } else {
            Some(trace_id.to_string())
        };
        Audit {
            decision: AuditDecision::from(result),
            granularity,
            principal: context
                .caller
                .identity()
                .map(|identity| identity.principal().clone()),
            requirement: requirement.to_string(),
            target: target.to_string(),
            trace_id,
        }
    }

    /// Emit the audit record to the [`Context`]'s logger.
    ///
    /// Errors during audit are logged and otherwise ignored: the access decision
    /// itself is never affected by auditing.
    pub fn emit(&self, context: &Context) {
        let payload = match serde_json::to_string(self) {
            Ok(payload) => payload,
            Err(error) => {
                slog::error!(
                    context.logger,
                    "Failed to JSON serialise access decision audit record";
                    "audit" => true,
                    "error" => %error,
                );
                return;
            }
        };
        slog::info!(
            context.logger, "Access decision";
            "audit" => true,
            "decision" => self.decision.as_str(),
            "payload" => payload,
        );
    }
}

/// Decision of an access request reported in an [`Audit`] record.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum AuditDecision {
    /// The access was granted.
    Allow,

    /// The access was denied.
    Deny,
}

impl AuditDecision {
    /// Stable string identifier of the decision.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditDecision::Allow => "allow",
            AuditDecision::Deny => "deny",
        }
    }
}

impl From<&Result<(), AccessDenied>> for AuditDecision {
    fn from(value: &Result<(), AccessDenied>) -> Self {
        match value {
            Ok(()) => AuditDecision::Allow,
            Err(_) => AuditDecision::Deny,
        }
    }
}
