mod config;
mod control;
mod error;

use std::sync::Arc;

use tracing::{debug, info, warn};

use ptask_core::{ExecutorRegistry, SchedulingWorker};
use ptask_exec::subprocess::register_subprocess_executor;
use ptask_observe::init_logger;
use ptask_prometheus::PrometheusMetrics;

use crate::{
    config::{AgentConfig, LOG_ENV, config_path},
    control::FileControlPlane,
};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    // 1) config
    let path = config_path();
    let cfg = AgentConfig::load(&path)?;

    // 2) logger
    let logger = cfg
        .logger
        .clone()
        .with_level_override(std::env::var(LOG_ENV).ok().as_deref())?;
    init_logger(&logger)?;
    info!(config = %path.display(), "logger initialized");

    // 3) executors
    let mut registry = ExecutorRegistry::new();
    register_subprocess_executor(&mut registry)?;
    info!(kinds = ?registry.kinds(), "executors registered");

    // 4) control plane + metrics
    let client = Arc::new(FileControlPlane::new(cfg.assignments_path.clone()));
    info!(assignments = %client.path().display(), "using file control plane");
    let metrics = PrometheusMetrics::new()?;

    // 5) worker
    let worker = Arc::new(
        SchedulingWorker::new(cfg.worker, client, Arc::new(registry))?
            .with_metrics(Arc::new(metrics.clone())),
    );
    let reconcile_loop = worker.spawn();

    wait_for_shutdown(&worker).await?;

    worker.shutdown().await;
    if let Err(e) = reconcile_loop.await {
        warn!(error = %e, "reconcile loop ended abnormally");
    }
    debug!(metrics = %metrics.encode_text()?, "final metrics");
    info!("agent stopped");
    Ok(())
}

/// Block until Ctrl-C or SIGTERM. SIGHUP asks the worker to re-read its assignments now.
#[cfg(unix)]
async fn wait_for_shutdown(worker: &SchedulingWorker) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = signal(SignalKind::terminate())?;
    let mut hup = signal(SignalKind::hangup())?;
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("interrupt received");
                return Ok(());
            }
            _ = term.recv() => {
                info!("SIGTERM received");
                return Ok(());
            }
            _ = hup.recv() => worker.request_refresh(),
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown(_worker: &SchedulingWorker) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("interrupt received");
    Ok(())
}
