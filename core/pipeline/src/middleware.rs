//! ActixWeb Middleware to run the [`Pipeline`] and attach [`Context`] objects to requests.
use std::future::Ready;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::forward_ready;
use actix_web::dev::Service;
use actix_web::dev::ServiceRequest;
use actix_web::dev::ServiceResponse;
use actix_web::dev::Transform;
use actix_web::web::Data;
use actix_web::Error;
use actix_web::HttpMessage;
use futures_util::future::LocalBoxFuture;

use portcullis_context::Context;
use portcullis_context::ContextBuilder;
use portcullis_context::ContextStore;

use crate::Pipeline;
use crate::PipelineOutcome;

/// Authenticate and authorise requests before they are handled.
///
/// For every request the service:
///
/// 1. Derives a per-request [`Context`] from the root context.
/// 2. Runs the [`Pipeline`] with a fresh [`ContextStore`], cleared when the request ends.
/// 3. Responds with the rejection if the pipeline short-circuits.
/// 4. Otherwise attaches the [`Context`], with the authenticated caller, to the
///    request and calls the wrapped service.
pub struct PipelineService<S> {
    config: PipelineConfig,
    pipeline: Pipeline,
    root: Context,
    service: Arc<S>,
}

impl<S, B> Service<ServiceRequest> for PipelineService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, request: ServiceRequest) -> Self::Future {
        // Extract root context and optional middleware configuration.
        let root = request.app_data::<Data<Context>>();
        let config = request
            .app_data::<Data<PipelineConfig>>()
            .map(|data| data.as_ref())
            .unwrap_or(&self.config)
            .clone();

        // Derive the per-request context.
        let context = root
            .map(|root| root.derive())
            .unwrap_or_else(|| self.root.derive());
        let context = context_derive_logging(context, &config, &request).build();

        // Delay invoking the service so the pipeline can run asynchronously.
        let pipeline = self.pipeline.clone();
        let service = Arc::clone(&self.service);
        Box::pin(async move {
            // The store is cleared when the scope is dropped, even if the request is cancelled.
            let store = ContextStore::new();
            let _scope = store.scope();

            let outcome = pipeline.run(&context, request.request(), &store).await;
            if let PipelineOutcome::ShortCircuited { rejection, .. } = outcome {
                let response = request.into_response(rejection.into_response());
                return Ok(response.map_into_right_body());
            }

            // Freeze the authenticated caller into the request context.
            let context = context.derive().authenticated(store.get()).build();
            request.extensions_mut().insert(context);

            // Proceed to the wrapped service and handle the request.
            let response = service.call(request).await?;
            response.request().extensions_mut().remove::<Context>();
            Ok(response.map_into_left_body())
        })
    }
}

/// Wrap an [`App`](actix_web::App) with a middleware that runs the request [`Pipeline`].
#[derive(Clone)]
pub struct PipelineMiddleware {
    config: PipelineConfig,
    pipeline: Pipeline,
    root: Context,
}

impl PipelineMiddleware {
    /// Initialise a [`PipelineMiddleware`] with a root [`Context`] to use as a fallback.
    pub fn new(root: Context, pipeline: Pipeline) -> Self {
        let config = PipelineConfig::default();
        Self {
            config,
            pipeline,
            root,
        }
    }

    /// Use a non-default configuration for requests.
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for PipelineMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = PipelineService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        let middleware = PipelineService {
            config: self.config.clone(),
            pipeline: self.pipeline.clone(),
            root: self.root.clone(),
            service: Arc::new(service),
        };
        std::future::ready(Ok(middleware))
    }
}

/// Configuration of the per-request [`Context`] derivation process.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// Enable adding the current trace ID to logs (if a trace ID is available).
    pub add_trace_id: bool,

    /// Enable adding the request method and path to logs.
    pub log_request: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            add_trace_id: true,
            log_request: true,
        }
    }
}

/// Configure logging options for the derived context.
fn context_derive_logging(
    context: ContextBuilder,
    config: &PipelineConfig,
    request: &ServiceRequest,
) -> ContextBuilder {
    let context = if config.add_trace_id {
        context.log_trace()
    } else {
        context
    };
    if !config.log_request {
        return context;
    }
    context.log_values(slog::o!(
        "method" => request.method().to_string(),
        "path" => request.path().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::call_service;
    use actix_web::test::init_service;
    use actix_web::test::read_body;
    use actix_web::test::TestRequest;
    use actix_web::HttpResponse;

    use portcullis_auth::access::Authoriser;
    use portcullis_auth::access::Requirement;
    use portcullis_auth::access::RouteRules;
    use portcullis_auth::identity::VerifierRegistry;
    use portcullis_auth_builtin::BasicAuth;
    use portcullis_auth_builtin::FixedSecretVerifier;
    use portcullis_auth_builtin::PasswordVerifier;
    use portcullis_auth_builtin::SecretHeader;
    use portcullis_auth_builtin::User;
    use portcullis_context::Context;

    use crate::AuthenticationInterceptor;
    use crate::Pipeline;
    use crate::Position;
    use crate::RouteGuard;
    use crate::Stage;

    fn factory() -> super::PipelineMiddleware {
        let registry = VerifierRegistry::builder()
            .register("robot", FixedSecretVerifier::default())
            .build()
            .unwrap();
        let routes = RouteRules::new()
            .route("/", Requirement::PermitAll)
            .unwrap()
            .route("/admin", Requirement::capability("admin"))
            .unwrap()
            .route("/**", Requirement::Authenticated)
            .unwrap();
        let robot = AuthenticationInterceptor::new(SecretHeader::default(), registry);
        let pipeline = Pipeline::builder()
            .insert("robot", Position::Before(Stage::Authorisation), robot)
            .route_guard(RouteGuard::new(Authoriser::new(routes)))
            .build()
            .unwrap();
        super::PipelineMiddleware::new(Context::fixture(), pipeline)
    }

    fn factory_with_basic() -> super::PipelineMiddleware {
        let users = [User::new("alice", "password", ["user"])].into_iter().collect();
        let registry = VerifierRegistry::builder()
            .register("users", PasswordVerifier::new(users))
            .build()
            .unwrap();
        let basic = AuthenticationInterceptor::new(BasicAuth, registry);
        let robots = VerifierRegistry::builder()
            .register("robot", FixedSecretVerifier::default())
            .build()
            .unwrap();
        let robot = AuthenticationInterceptor::new(SecretHeader::default(), robots);
        let routes = RouteRules::new()
            .route("/**", Requirement::Authenticated)
            .unwrap();
        let pipeline = Pipeline::builder()
            .insert("robot", Position::Before(Stage::Authorisation), robot)
            .insert("basic", Position::Before(Stage::Authorisation), basic)
            .route_guard(RouteGuard::new(Authoriser::new(routes)))
            .build()
            .unwrap();
        super::PipelineMiddleware::new(Context::fixture(), pipeline)
    }

    #[actix_web::get("/")]
    async fn index(context: Context) -> HttpResponse {
        HttpResponse::Ok().body(context.caller.name().to_string())
    }

    #[actix_web::get("/private")]
    async fn private(context: Context) -> HttpResponse {
        HttpResponse::Ok().body(context.caller.name().to_string())
    }

    #[actix_web::get("/admin")]
    async fn admin(context: Context) -> HttpResponse {
        HttpResponse::Ok().body(context.caller.name().to_string())
    }

    #[actix_web::test]
    async fn anonymous_public_route() {
        let app = actix_web::App::new().service(index).wrap(factory());
        let app = init_service(app).await;

        let request = TestRequest::get().uri("/").to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert_eq!(body, "anonymous");
    }

    #[actix_web::test]
    async fn anonymous_private_route() {
        let app = actix_web::App::new().service(private).wrap(factory());
        let app = init_service(app).await;

        let request = TestRequest::get().uri("/private").to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn robot_private_route() {
        let app = actix_web::App::new().service(private).wrap(factory());
        let app = init_service(app).await;

        let request = TestRequest::get()
            .uri("/private")
            .insert_header(("x-robot-secret", "beep-boop"))
            .to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = read_body(response).await;
        assert_eq!(body, "robot");
    }

    #[actix_web::test]
    async fn robot_wrong_secret() {
        let app = actix_web::App::new().service(private).wrap(factory());
        let app = init_service(app).await;

        let request = TestRequest::get()
            .uri("/private")
            .insert_header(("x-robot-secret", "WRONG"))
            .to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_body(response).await;
        assert_eq!(body, "you are not Ms Robot");
    }

    #[actix_web::test]
    async fn encoded_path_matches_decoded_route() {
        let app = actix_web::App::new().service(admin).wrap(factory());
        let app = init_service(app).await;

        for uri in ["/admin", "/%61dmin", "/%61%64%6D%69%6E"] {
            let request = TestRequest::get()
                .uri(uri)
                .insert_header(("x-robot-secret", "beep-boop"))
                .to_request();
            let response = call_service(&app, request).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "uri {}", uri);
        }
    }

    #[actix_web::test]
    async fn robot_and_wrong_password_rejected() {
        let app = actix_web::App::new().service(private).wrap(factory_with_basic());
        let app = init_service(app).await;

        let request = TestRequest::get()
            .uri("/private")
            .insert_header(("x-robot-secret", "beep-boop"))
            .insert_header(("authorization", "Basic YWxpY2U6V1JPTkc="))
            .to_request();
        let response = call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = read_body(response).await;
        assert_eq!(body, "Bad credentials");
    }
}
