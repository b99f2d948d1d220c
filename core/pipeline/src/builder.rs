//! Assemble pipelines from interceptors registered against stable stages.
use std::collections::HashSet;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::Arc;

use crate::driver::Pipeline;
use crate::driver::Step;
use crate::interceptors::RouteGuard;
use crate::interceptors::ROUTE_GUARD_NAME;
use crate::Interceptor;

/// Errors detected while building a [`Pipeline`].
///
/// These are configuration errors and must abort process startup.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Two interceptors were registered with the same name.
    #[error("an interceptor named '{0}' is already registered")]
    // (name,)
    DuplicateInterceptor(String),

    /// An interceptor reported an invalid configuration.
    #[error("interceptor '{name}' is not correctly configured")]
    InvalidInterceptor {
        name: String,
        #[source]
        error: anyhow::Error,
    },

    /// Interceptors reference a stage the pipeline does not have.
    #[error("interceptors are positioned relative to the {0} stage but the pipeline has none")]
    // (stage,)
    MissingStage(Stage),

    /// Anonymous and forbidden callers would be redirected to the same location.
    #[error("login and denied redirect locations must differ but both are '{0}'")]
    // (location,)
    SameDenialLocations(String),
}

/// Fixed reference points in a [`Pipeline`] interceptors are positioned against.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Stage {
    /// The route level access decision, made before requests are dispatched to handlers.
    Authorisation,
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Authorisation => f.write_str("authorisation"),
        }
    }
}

/// Position of an [`Interceptor`] relative to a [`Stage`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Position {
    /// Run the interceptor after the stage.
    After(Stage),

    /// Run the interceptor before the stage.
    Before(Stage),
}

impl Position {
    fn stage(&self) -> Stage {
        match self {
            Position::After(stage) => *stage,
            Position::Before(stage) => *stage,
        }
    }
}

/// An interceptor waiting to be placed in the pipeline.
struct Registration {
    interceptor: Arc<dyn Interceptor>,
    name: String,
    position: Position,
}

/// Register interceptors against [`Stage`]s to build a [`Pipeline`].
///
/// Final ordering is resolved when the pipeline is built:
/// interceptors registered against the same position keep their registration order.
#[derive(Default)]
pub struct PipelineBuilder {
    registrations: Vec<Registration>,
    route_guard: Option<RouteGuard>,
}

impl PipelineBuilder {
    /// Resolve interceptors order and validate the pipeline configuration.
    pub fn build(self) -> Result<Pipeline, PipelineError> {
        let mut names = HashSet::new();
        if self.route_guard.is_some() {
            names.insert(ROUTE_GUARD_NAME.to_string());
        }
        for registration in &self.registrations {
            if !names.insert(registration.name.clone()) {
                return Err(PipelineError::DuplicateInterceptor(
                    registration.name.clone(),
                ));
            }
            if self.route_guard.is_none() {
                return Err(PipelineError::MissingStage(registration.position.stage()));
            }
            if let Err(error) = registration.interceptor.validate() {
                return Err(PipelineError::InvalidInterceptor {
                    name: registration.name.clone(),
                    error,
                });
            }
        }

        let mut before = Vec::new();
        let mut after = Vec::new();
        for registration in self.registrations {
            let step = Step {
                interceptor: registration.interceptor,
                name: registration.name,
            };
            match registration.position {
                Position::Before(Stage::Authorisation) => before.push(step),
                Position::After(Stage::Authorisation) => after.push(step),
            }
        }

        let mut steps = before;
        if let Some(guard) = self.route_guard {
            steps.push(Step {
                interceptor: Arc::new(guard),
                name: ROUTE_GUARD_NAME.to_string(),
            });
        }
        steps.extend(after);
        Ok(Pipeline::new(steps))
    }

    /// Register an interceptor at the given position.
    pub fn insert<S, I>(self, name: S, position: Position, interceptor: I) -> Self
    where
        S: Into<String>,
        I: Interceptor + 'static,
    {
        self.insert_shared(name, position, Arc::new(interceptor))
    }

    /// Register an already shared interceptor at the given position.
    pub fn insert_shared<S>(
        mut self,
        name: S,
        position: Position,
        interceptor: Arc<dyn Interceptor>,
    ) -> Self
    where
        S: Into<String>,
    {
        self.registrations.push(Registration {
            interceptor,
            name: name.into(),
            position,
        });
        self
    }

    /// Initialise an empty builder.
    pub fn new() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Set the [`RouteGuard`] that implements the [`Stage::Authorisation`] stage.
    pub fn route_guard(mut self, guard: RouteGuard) -> Self {
        self.route_guard = Some(guard);
        self
    }
}
