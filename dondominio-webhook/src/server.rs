//! HTTP server hosting the solvers.

use std::sync::Arc;

use actix_web::{App, HttpServer, middleware, web};
use anyhow::Context;

use crate::config::WebhookConfig;
use crate::handlers::{challenge, discovery, health};
use crate::solver::Solver;
use crate::tls;

/// Shared state of every worker.
pub struct AppState {
    pub group_name: String,
    pub solvers: Vec<Arc<dyn Solver>>,
}

impl AppState {
    pub fn new(group_name: impl Into<String>, solvers: Vec<Arc<dyn Solver>>) -> Self {
        Self {
            group_name: group_name.into(),
            solvers,
        }
    }

    pub fn solver(&self, name: &str) -> Option<&Arc<dyn Solver>> {
        self.solvers.iter().find(|s| s.name() == name)
    }
}

/// Registers the webhook routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(health::healthz))
        .route("/apis/{group}/{version}", web::get().to(discovery::resources))
        .route(
            "/apis/{group}/{version}/{solver}",
            web::post().to(challenge::solve),
        );
}

/// Serves until the process receives SIGINT/SIGTERM.
pub async fn run(config: &WebhookConfig, state: web::Data<AppState>) -> anyhow::Result<()> {
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::Logger::default())
            .configure(configure)
    });

    let server = match &config.tls {
        Some(files) => {
            let tls_config = tls::server_config(files)?;
            tracing::info!("Listening on https://{}", config.listen);
            server
                .bind_rustls_0_23(config.listen, tls_config)
                .with_context(|| format!("cannot bind {}", config.listen))?
        }
        None => {
            tracing::warn!("TLS not configured, serving plain HTTP on {}", config.listen);
            server
                .bind(config.listen)
                .with_context(|| format!("cannot bind {}", config.listen))?
        }
    };

    server.run().await.context("webhook server failed")
}
