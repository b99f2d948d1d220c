//! Demo endpoints served behind the request pipeline.
use actix_web::web::Data;
use actix_web::web::ServiceConfig;
use actix_web::HttpResponse;
use prometheus::Encoder;
use prometheus::TextEncoder;

use portcullis_auth::access::AccessDenied;
use portcullis_context::Context;
use portcullis_pipeline::Rejection;

mod conference;


use self::conference::ConferenceService;

/// Configure an HTTP Server with all endpoints in this API module.
pub fn configure(config: &mut ServiceConfig) {
    config
        .app_data(Data::new(ConferenceService::default()))
        .service(admin)
        .service(denied_page)
        .service(index)
        .service(metrics)
        .service(private);
}

/// Conferences visible to the caller, venues included only for geoguessers.
#[actix_web::get("/admin")]
async fn admin(context: Context, service: Data<ConferenceService>) -> HttpResponse {
    match service.conferences(&context) {
        Ok(conferences) => {
            let conferences: Vec<String> = conferences.iter().map(ToString::to_string).collect();
            let body = serde_json::json!({
                "caller": context.caller.name(),
                "conferences": conferences,
            });
            HttpResponse::Ok().json(body)
        }
        Err(denied) => access_denied(&context, &denied),
    }
}

#[actix_web::get("/denied")]
async fn denied_page(context: Context) -> HttpResponse {
    HttpResponse::Forbidden()
        .content_type("text/plain; charset=utf-8")
        .body(format!(
            "Sorry {}, you are not allowed to see that page",
            context.caller.name()
        ))
}

#[actix_web::get("/")]
async fn index(context: Context) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Hello {}, this page is public", context.caller.name()))
}

/// Expose process metrics in the Prometheus text format.
#[actix_web::get("/metrics")]
async fn metrics(context: Context, registry: Data<prometheus::Registry>) -> HttpResponse {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(error) = encoder.encode(&registry.gather(), &mut buffer) {
        slog::error!(context.logger, "Unable to encode metrics"; "error" => %error);
        return Rejection::internal("unable to encode metrics").into_response();
    }
    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}

#[actix_web::get("/private")]
async fn private(context: Context) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(format!("Welcome to the private page, {}", context.caller.name()))
}

fn access_denied(context: &Context, denied: &AccessDenied) -> HttpResponse {
    slog::debug!(context.logger, "Handler denied access"; "reason" => %denied);
    Rejection::from(denied).into_response()
}
