//! Portcullis demo server initialisation as a builder.
use std::sync::Arc;

use actix_web::web::Data;
use actix_web::web::ServiceConfig;
use actix_web::App;
use actix_web::HttpServer;
use anyhow::Context as _;
use anyhow::Result;

use portcullis_conf::Conf;
use portcullis_context::Context;
use portcullis_pipeline::PipelineMiddleware;

use super::AuthInit;

type HttpConfig = Arc<dyn Fn(&mut ServiceConfig) + Send + Sync>;

/// Process builder to initialise and run a Portcullis demo server.
pub struct Server {
    auth: AuthInit,
    conf: Conf,

    /// Root context for the process.
    context: Context,
    http_config: Vec<HttpConfig>,
    metrics: prometheus::Registry,
}

impl Server {
    /// Build a server from the loaded configuration.
    pub fn configure(conf: Conf) -> Result<Self> {
        let logger = super::logging::configure(&conf.logging);
        let context = Context::root(logger).build();
        slog::info!(context.logger, "Process logging initialised");

        let metrics = prometheus::Registry::new();
        portcullis_auth::telemetry::register_metrics(&metrics)?;
        portcullis_pipeline::telemetry::register_metrics(&metrics)?;

        let auth = AuthInit::configure(&context, &conf.auth)?;
        let server = Server {
            auth,
            conf,
            context,
            http_config: Vec::new(),
            metrics,
        };
        Ok(server)
    }

    /// Serve requests until the process is asked to shut down.
    pub async fn run(self) -> Result<()> {
        let middleware = PipelineMiddleware::new(self.context.clone(), self.auth.pipeline);
        let metrics = Data::new(self.metrics);
        let root = Data::new(self.context.clone());
        let configs = self.http_config;

        let mut server = HttpServer::new(move || {
            let mut app = App::new()
                .app_data(metrics.clone())
                .app_data(root.clone());
            for config in &configs {
                app = app.configure(|service| config(service));
            }
            app.wrap(middleware.clone())
        })
        .shutdown_timeout(self.conf.runtime.shutdown_grace_sec);
        if let Some(workers) = self.conf.http.workers {
            server = server.workers(workers);
        }

        let bind = self.conf.http.bind.as_str();
        let server = server
            .bind(bind)
            .with_context(|| format!("unable to bind HTTP server to {}", bind))?;
        slog::info!(
            self.context.logger, "API server listening for connections";
            "address" => bind,
        );
        server.run().await?;
        slog::info!(self.context.logger, "Portcullis process shut down");
        Ok(())
    }

    /// Add an HTTP server configuration closure to be applied when the server is started.
    pub fn with_http_config<F>(mut self, config: F) -> Self
    where
        F: Fn(&mut ServiceConfig) + Send + Sync + 'static,
    {
        self.http_config.push(Arc::new(config));
        self
    }
}
