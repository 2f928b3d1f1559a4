use std::future::Future;

use ebb_core::config::SyncSettings;
use ebb_core::remote::RemoteStore;
use ebb_core::sync::{poll_connectivity, sync_on_reconnect, DrainOutcome};
use tokio::sync::watch;

use crate::commands::common::{format_held_conflict_lines, format_report, refresh_quietly, Engine};
use crate::error::CliError;

pub async fn run_sync<R: RemoteStore>(engine: &Engine<R>) -> Result<(), CliError> {
    match engine.drain().await? {
        DrainOutcome::Offline => return Err(CliError::Offline),
        DrainOutcome::AlreadyRunning => {
            println!("A sync is already running");
            return Ok(());
        }
        DrainOutcome::Completed(report) => {
            println!("{}", format_report(&report));
        }
    }

    refresh_quietly(engine).await?;

    let held = engine.held_conflicts().await;
    if !held.is_empty() {
        println!("Waiting on a decision (ebb resolve <action-id> server|client|merge):");
        for line in format_held_conflict_lines(&held) {
            println!("  {line}");
        }
    }
    Ok(())
}

pub async fn run_status<R: RemoteStore>(
    engine: &Engine<R>,
    api_base_url: &str,
) -> Result<(), CliError> {
    let pending = engine.local().pending_count().await?;
    let state = engine.state().await;

    println!("state:    {}", state.label());
    println!("pending:  {pending}");
    println!("remote:   {api_base_url}");
    if let Some(path) = engine.local().path() {
        println!("database: {}", path.display());
    }
    Ok(())
}

/// Keep probing the remote store and drain after every reconnect until `shutdown` resolves.
pub async fn run_watch<R: RemoteStore>(
    engine: &Engine<R>,
    settings: &SyncSettings,
    shutdown: impl Future<Output = ()>,
) -> Result<(), CliError> {
    if engine.connectivity().is_online() {
        if let DrainOutcome::Completed(report) = engine.drain().await? {
            println!("{}", format_report(&report));
        }
    }
    println!(
        "Watching {} every {}ms (Ctrl-C to stop)",
        settings.api_base_url,
        settings.poll_interval.as_millis()
    );

    let (stop_tx, stop_rx) = watch::channel(false);
    let stopped = |mut rx: watch::Receiver<bool>| async move {
        let _ = rx.wait_for(|stop| *stop).await;
    };

    // The reconnect trigger subscribes before the first probe can flip the flag
    tokio::join!(
        sync_on_reconnect(engine, settings.sync_delay, stopped(stop_rx.clone())),
        poll_connectivity(
            engine.remote(),
            engine.connectivity(),
            settings.poll_interval,
            stopped(stop_rx),
        ),
        async {
            shutdown.await;
            let _ = stop_tx.send(true);
        },
    );

    let pending = engine.local().pending_count().await?;
    println!("Stopped; {pending} changes still queued");
    Ok(())
}
