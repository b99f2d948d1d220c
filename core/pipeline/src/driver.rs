//! Run pipelines for individual requests.
use std::sync::Arc;

use portcullis_auth::identity::RequestView;
use portcullis_context::Context;
use portcullis_context::ContextStore;

use crate::telemetry::INTERCEPTOR_ERRORS_COUNT;
use crate::telemetry::PIPELINE_OUTCOME_COUNT;
use crate::Exchange;
use crate::Flow;
use crate::Interceptor;
use crate::PipelineBuilder;
use crate::Rejection;

/// A named interceptor in its final pipeline position.
pub(crate) struct Step {
    pub interceptor: Arc<dyn Interceptor>,
    pub name: String,
}

/// Progress of a request through a [`Pipeline`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineState {
    /// The pipeline did not run any interceptor yet.
    NotStarted,

    /// The interceptor at the given index is processing the request.
    Running(usize),

    /// All interceptors proceeded and the request can be dispatched.
    Completed,

    /// The interceptor at the given index rejected the request.
    ShortCircuited(usize),
}

/// Terminal result of running a [`Pipeline`] for a request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PipelineOutcome {
    /// All interceptors proceeded: the request should be dispatched to its handler.
    Completed,

    /// An interceptor rejected the request: the handler must not be invoked.
    ShortCircuited {
        /// Position of the rejecting interceptor in the pipeline.
        index: usize,

        /// Name of the rejecting interceptor.
        interceptor: String,

        /// Response to send back to the client.
        rejection: Rejection,
    },
}

impl PipelineOutcome {
    /// Terminal [`PipelineState`] for this outcome.
    pub fn state(&self) -> PipelineState {
        match self {
            PipelineOutcome::Completed => PipelineState::Completed,
            PipelineOutcome::ShortCircuited { index, .. } => PipelineState::ShortCircuited(*index),
        }
    }
}

/// Ordered chain of interceptors, immutable once built and cheap to clone.
#[derive(Clone)]
pub struct Pipeline {
    steps: Arc<Vec<Step>>,
}

impl Pipeline {
    /// Begin building a new pipeline.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Names of the interceptors in the order they run.
    pub fn interceptors(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.name.as_str()).collect()
    }

    pub(crate) fn new(steps: Vec<Step>) -> Pipeline {
        Pipeline {
            steps: Arc::new(steps),
        }
    }

    /// Run all interceptors for a request until one rejects it.
    ///
    /// Interceptors run strictly one after the other and each is awaited before
    /// the next one starts. The store is only written by interceptors: callers are
    /// responsible for clearing it (see [`ContextStore::scope`]).
    pub async fn run(
        &self,
        context: &Context,
        request: &dyn RequestView,
        store: &ContextStore,
    ) -> PipelineOutcome {
        let mut state = PipelineState::NotStarted;
        for (index, step) in self.steps.iter().enumerate() {
            state = PipelineState::Running(index);
            slog::trace!(
                context.logger, "Running request interceptor";
                "interceptor" => &step.name,
                "state" => ?state,
            );

            let exchange = Exchange::new(context, request, store);
            let flow = match step.interceptor.intercept(&exchange).await {
                Ok(flow) => flow,
                Err(error) => {
                    slog::error!(
                        context.logger, "Request interceptor failed unexpectedly";
                        "interceptor" => &step.name,
                        "error" => ?error,
                    );
                    INTERCEPTOR_ERRORS_COUNT
                        .with_label_values(&[step.name.as_str()])
                        .inc();
                    Flow::Reject(Rejection::internal(
                        "an internal error occurred while processing the request",
                    ))
                }
            };

            if let Flow::Reject(rejection) = flow {
                slog::debug!(
                    context.logger, "Request rejected by interceptor";
                    "interceptor" => &step.name,
                    "status" => rejection.status.as_u16(),
                );
                PIPELINE_OUTCOME_COUNT
                    .with_label_values(&["short-circuited"])
                    .inc();
                return PipelineOutcome::ShortCircuited {
                    index,
                    interceptor: step.name.clone(),
                    rejection,
                };
            }
        }

        slog::trace!(context.logger, "Request pipeline completed"; "from" => ?state);
        PIPELINE_OUTCOME_COUNT
            .with_label_values(&["completed"])
            .inc();
        PipelineOutcome::Completed
    }
}
