//! Webhook process entry point.

use std::process::ExitCode;
use std::sync::Arc;

use actix_web::web;
use dondominio_webhook::config::WebhookConfig;
use dondominio_webhook::server::{self, AppState};
use dondominio_webhook::solver::initialize_all;
use dondominio_webhook::{DonDominioConnector, DonDominioSolver, Solver};
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    // kube, reqwest and the listener share one crypto provider.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }

    let config = match WebhookConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(group = %config.group_name, "Starting DonDominio webhook");

    let connector = Arc::new(DonDominioConnector::new(config.proxy.clone()));
    let solvers: Vec<Arc<dyn Solver>> = vec![Arc::new(DonDominioSolver::new(connector))];
    let (stop_tx, stop_rx) = watch::channel(false);

    // A solver that cannot initialize must not serve.
    let kube_config = match kube::Config::infer().await {
        Ok(kube_config) => kube_config,
        Err(e) => {
            tracing::error!("Cannot load Kubernetes client configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    if initialize_all(&solvers, &kube_config, &stop_rx).await.is_err() {
        return ExitCode::FAILURE;
    }

    let state = web::Data::new(AppState::new(config.group_name.clone(), solvers));
    let result = server::run(&config, state).await;
    if stop_tx.send(true).is_err() {
        tracing::debug!("No solver is watching the stop signal");
    }

    match result {
        Ok(()) => {
            tracing::info!("Webhook stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
