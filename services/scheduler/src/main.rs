//! Carbon-aware scheduler service.
//!
//! Periodically matches queued jobs to available workers in cleaner zones,
//! and exposes `POST /schedule` to trigger a cycle on demand.

use std::sync::Arc;

use anyhow::Result;
use carbon_adapters::{
    http::build_client, HttpCarbonIntensityAdapter, HttpJobAdapter, HttpWorkerAdapter,
};
use carbon_scheduler::{
    api, config,
    scheduler::{CycleRunner, Scheduler, SchedulerWorker},
    state::AppState,
};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to CARBON_SCHED_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting carbon-aware scheduler");
    info!(
        listen_addr = %config.listen_addr,
        jobs_url = %config.collaborators.jobs_url,
        workers_url = %config.collaborators.workers_url,
        carbon_url = %config.collaborators.carbon_url,
        empty_result_policy = ?config.scheduler.empty_result_policy,
        "Configuration loaded"
    );

    let client = build_client(config.collaborators.timeout)?;
    let scheduler = Scheduler::new(
        Arc::new(HttpJobAdapter::new(
            client.clone(),
            config.collaborators.jobs_url.clone(),
        )),
        Arc::new(HttpWorkerAdapter::new(
            client.clone(),
            config.collaborators.workers_url.clone(),
        )),
        Arc::new(HttpCarbonIntensityAdapter::new(
            client,
            config.collaborators.carbon_url.clone(),
        )),
        config.scheduler.clone(),
    );
    let runner = Arc::new(CycleRunner::new(scheduler));

    // Create shutdown channel for graceful shutdown
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start scheduler worker in background
    let scheduler_handle = match config.interval {
        Some(interval) => {
            let scheduler_worker = SchedulerWorker::new(runner.clone(), interval);
            let shutdown_rx = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                scheduler_worker.run(shutdown_rx).await;
            }))
        }
        None => {
            info!("Interval driver disabled, cycles run only via POST /schedule");
            None
        }
    };

    // Create application state
    let state = AppState::new(runner);

    // Build and run the server
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    // Spawn the server with graceful shutdown
    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    // Wait for shutdown signal (Ctrl+C)
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
        }
        result = server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    // Signal shutdown to the worker
    let _ = shutdown_tx.send(true);

    if let Some(handle) = scheduler_handle {
        info!("Waiting for scheduler worker to shut down...");
        let shutdown_timeout = std::time::Duration::from_secs(10);
        if let Err(e) = tokio::time::timeout(shutdown_timeout, handle).await {
            warn!(error = %e, "Scheduler worker did not shut down in time");
        }
    }

    info!("Scheduler shutdown complete");
    Ok(())
}
