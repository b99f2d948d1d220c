//! Assemble verifiers, interceptors and access rules from the auth configuration.
use actix_web::http::StatusCode;
use anyhow::Context as _;
use anyhow::Result;

use portcullis_auth::access::Authoriser;
use portcullis_auth::access::Requirement;
use portcullis_auth::access::RouteRules;
use portcullis_auth::identity::FederatedClaims;
use portcullis_auth::identity::PolicyVerifier;
use portcullis_auth::identity::VerifierRegistry;
use portcullis_auth_builtin::BasicAuth;
use portcullis_auth_builtin::BearerAssertion;
use portcullis_auth_builtin::DomainPolicy;
use portcullis_auth_builtin::FederatedVerifier;
use portcullis_auth_builtin::FixedSecretVerifier;
use portcullis_auth_builtin::PasswordVerifier;
use portcullis_auth_builtin::SecretHeader;
use portcullis_auth_builtin::SinglePrincipalVerifier;
use portcullis_auth_builtin::StaticAssertions;
use portcullis_auth_builtin::User;
use portcullis_auth_builtin::UserStore;
use portcullis_conf::AuthConf;
use portcullis_conf::FederatedConf;
use portcullis_conf::RequireConf;
use portcullis_conf::RobotConf;
use portcullis_conf::RouteConf;
use portcullis_context::Context;
use portcullis_pipeline::AuthenticationInterceptor;
use portcullis_pipeline::DenialPolicy;
use portcullis_pipeline::HeaderRejectInterceptor;
use portcullis_pipeline::Pipeline;
use portcullis_pipeline::Position;
use portcullis_pipeline::RouteGuard;
use portcullis_pipeline::Stage;

/// Authentication interceptors run before the route access decision.
const AUTHENTICATE: Position = Position::Before(Stage::Authorisation);

/// Request pipeline and access rules built from configuration.
pub struct AuthInit {
    /// Access decisions for routes, operations and fields.
    pub authoriser: Authoriser,

    /// Ordered interceptors run for every request.
    pub pipeline: Pipeline,
}

impl AuthInit {
    /// Build the request pipeline described by the configuration.
    ///
    /// Interceptors are installed in order: blocked headers, robot secret,
    /// HTTP Basic, federated Bearer assertions and finally the route guard.
    pub fn configure(context: &Context, conf: &AuthConf) -> Result<AuthInit> {
        let routes = route_rules(&conf.routes)?;
        let authoriser = Authoriser::new(routes);
        let mut guard = RouteGuard::new(authoriser.clone());
        if let Some(denial) = &conf.denial {
            let policy = DenialPolicy::new(&denial.login, &denial.denied)?;
            guard = guard.with_denial_policy(policy);
        }

        let mut builder = Pipeline::builder();
        for blocked in &conf.blocked_headers {
            let name = format!("blocked-header:{}", blocked.header);
            let interceptor =
                HeaderRejectInterceptor::new(&blocked.header, &blocked.value, &blocked.message);
            builder = builder.insert(name, AUTHENTICATE, interceptor);
        }
        if let Some(robot) = &conf.robot {
            builder = builder.insert("robot", AUTHENTICATE, robot_interceptor(robot)?);
        }
        if let Some(registry) = password_registry(conf)? {
            let basic = AuthenticationInterceptor::new(BasicAuth, registry);
            builder = builder.insert("basic", AUTHENTICATE, basic);
        }
        if let Some(federated) = &conf.federated {
            let registry = federated_registry(federated)?;
            let bearer = AuthenticationInterceptor::new(BearerAssertion, registry);
            builder = builder.insert("federated", AUTHENTICATE, bearer);
        }

        let pipeline = builder.route_guard(guard).build()?;
        slog::info!(
            context.logger, "Request pipeline configured";
            "interceptors" => pipeline.interceptors().join(" -> "),
        );
        Ok(AuthInit {
            authoriser,
            pipeline,
        })
    }
}

/// Convert a declarative requirement into an evaluable [`Requirement`].
pub fn requirement(conf: &RequireConf) -> Requirement {
    match conf {
        RequireConf::All(inner) => Requirement::all(inner.iter().map(requirement)),
        RequireConf::Any(inner) => Requirement::any(inner.iter().map(requirement)),
        RequireConf::AnyCapability(capabilities) => {
            Requirement::any_capability(capabilities.iter().cloned())
        }
        RequireConf::Authenticated => Requirement::Authenticated,
        RequireConf::Capability(capability) => Requirement::capability(capability.as_str()),
        RequireConf::DenyAll => Requirement::DenyAll,
        RequireConf::Not(inner) => requirement(inner).negate(),
        RequireConf::PermitAll => Requirement::PermitAll,
    }
}

/// Build route rules in the configured order.
pub fn route_rules(routes: &[RouteConf]) -> Result<RouteRules> {
    let mut rules = RouteRules::new();
    for route in routes {
        rules = rules
            .route(route.pattern.as_str(), requirement(&route.require))
            .with_context(|| format!("route '{}' is not valid", route.pattern))?;
    }
    Ok(rules)
}

fn federated_registry(conf: &FederatedConf) -> Result<VerifierRegistry> {
    let assertions: StaticAssertions = conf
        .assertions
        .iter()
        .map(|(assertion, claims)| {
            let claims = FederatedClaims {
                email: claims.email.clone(),
                capabilities: claims.capabilities.clone(),
                subject: claims.subject.clone(),
            };
            (assertion.clone(), claims)
        })
        .collect();
    let verifier = FederatedVerifier::new(assertions)
        .with_default_capabilities(conf.default_capabilities.iter().cloned());

    let registry = VerifierRegistry::builder();
    let registry = if conf.allowed_domains.is_empty() {
        registry.register("federated", verifier)
    } else {
        let policy = DomainPolicy::new(conf.allowed_domains.iter().cloned());
        registry.register("federated", PolicyVerifier::new(verifier, policy))
    };
    let registry = registry.build()?;
    Ok(registry)
}

/// Special principal first, falling back to the user store for everyone else.
fn password_registry(conf: &AuthConf) -> Result<Option<VerifierRegistry>> {
    if conf.special_principal.is_none() && conf.users.is_empty() {
        return Ok(None);
    }

    let mut registry = VerifierRegistry::builder();
    if let Some(special) = &conf.special_principal {
        let verifier = SinglePrincipalVerifier::new(
            special.username.as_str(),
            special.capabilities.iter().cloned(),
        );
        registry = registry.register("special-principal", verifier);
    }
    if !conf.users.is_empty() {
        let users: UserStore = conf
            .users
            .iter()
            .map(|user| {
                let entry = User::new(
                    user.username.as_str(),
                    user.password.as_str(),
                    user.capabilities.iter().cloned(),
                );
                match user.locked {
                    true => entry.lock(),
                    false => entry,
                }
            })
            .collect();
        registry = registry.register("users", PasswordVerifier::new(users));
    }
    let registry = registry.build()?;
    Ok(Some(registry))
}

fn robot_interceptor(conf: &RobotConf) -> Result<AuthenticationInterceptor> {
    let status = StatusCode::from_u16(conf.failure_status)
        .with_context(|| format!("invalid robot failure status {}", conf.failure_status))?;
    let registry = VerifierRegistry::builder()
        .register("robot", FixedSecretVerifier::new(conf.secret.as_str()))
        .build()?;
    let header = SecretHeader::new(conf.header.as_str());
    let interceptor = AuthenticationInterceptor::new(header, registry).with_failure_status(status);
    Ok(interceptor)
}
