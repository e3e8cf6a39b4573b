//! Daemon loops: periodic task execution and stuck-task recovery.
//!
//! The two loops run as independent tokio tasks and share only the store
//! mutex. The executor locks it per store call, so a slow publish never
//! blocks a recovery sweep; the conditional claim keeps the two from
//! acting on the same task. Shutdown is signaled over a watch channel;
//! both loops exit at their next wakeup.

use crate::daemon::context::DaemonContext;
use crate::engine::TaskExecutor;
use crate::error::Result;
use crate::recovery::RecoveryManager;
use log::{error, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Seconds between execution polls. Task pacing comes from scheduled_at,
/// so the poll just needs to be finer than the minimum task interval.
const EXECUTION_POLL_SECS: u64 = 60;

/// Tasks executed per poll. One at a time keeps the batch gap semantics
/// in the executor meaningful.
const TASKS_PER_POLL: usize = 1;

/// Run both daemon loops until shutdown is signaled.
pub async fn run(context: Arc<DaemonContext>, shutdown: watch::Receiver<bool>) -> Result<()> {
    info!("daemon starting (poll {}s, sweep {}s)", EXECUTION_POLL_SECS, context.config.recovery.sweep_interval_secs);

    let engine = tokio::spawn(engine_loop(context.clone(), shutdown.clone()));
    let recovery = tokio::spawn(recovery_loop(context, shutdown));

    let (engine_result, recovery_result) = tokio::join!(engine, recovery);
    engine_result.unwrap_or(Ok(()))?;
    recovery_result.unwrap_or(Ok(()))?;

    info!("daemon stopped");
    Ok(())
}

/// Claim and execute ready tasks on a fixed poll interval.
async fn engine_loop(context: Arc<DaemonContext>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let executor = TaskExecutor::new(
        context.generator.clone(),
        context.publisher.clone(),
        context.config.retry.clone(),
    );
    let mut rng = StdRng::from_os_rng();
    let mut ticker = tokio::time::interval(Duration::from_secs(EXECUTION_POLL_SECS));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match executor.run_batch(&context.store, TASKS_PER_POLL, None, None, &mut rng).await {
                    Ok(report) if report.executed > 0 => {
                        info!("engine poll: {:?}", report);
                    }
                    Ok(_) => {}
                    Err(e) => error!("engine poll failed: {}", e),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("engine loop shutting down");
                    return Ok(());
                }
            }
        }
    }
}

/// Sweep for stuck tasks on the configured interval.
async fn recovery_loop(context: Arc<DaemonContext>, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let mut manager = RecoveryManager::new(context.config.recovery.clone());
    let mut ticker = tokio::time::interval(Duration::from_secs(context.config.recovery.sweep_interval_secs.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut store = context.store.lock().await;
                match manager.sweep(&mut store) {
                    Ok(report) if report.scanned > 0 => {
                        info!("recovery sweep: {:?}", report);
                    }
                    Ok(_) => {}
                    Err(e) => error!("recovery sweep failed: {}", e),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("recovery loop shutting down");
                    return Ok(());
                }
            }
        }
    }
}
