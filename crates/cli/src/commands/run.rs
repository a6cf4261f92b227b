//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::RssSensorBlueprint;
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::load_blueprint;
use crate::pipeline::{RssSession, SessionConfig};

/// Execute the `run` command
pub async fn run_session(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    let mut blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    apply_overrides(&mut blueprint, args);

    info!(
        sensor_id = %blueprint.sensor.id,
        map = %blueprint.world.map,
        parent_actor = ?blueprint.sensor.parent_actor,
        actors = blueprint.actors.len(),
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let session = RssSession::new(SessionConfig {
        blueprint,
        max_ticks: (args.max_ticks != 0).then_some(args.max_ticks),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    info!("Starting RSS session...");
    let stats = session
        .run(shutdown_signal())
        .await
        .context("RSS session failed")?;

    info!(
        ticks = stats.ticks_fired,
        evaluated = stats.sensor.evaluated,
        skipped = stats.sensor.skipped,
        faulted = stats.sensor.faulted,
        duration_secs = stats.duration.as_secs_f64(),
        reason = %stats.end_reason,
        "RSS session completed"
    );
    stats.print_summary();

    info!("CARLA RSS finished");
    Ok(())
}

/// Apply command-line overrides to the loaded blueprint
fn apply_overrides(blueprint: &mut RssSensorBlueprint, args: &RunArgs) {
    if let Some(parent) = args.parent_actor {
        info!(parent_actor = parent, "Overriding parent actor from CLI");
        blueprint.sensor.parent_actor = Some(parent);
    }
    if let Some(interval) = args.tick_interval_ms {
        if interval == 0 {
            warn!("Ignoring tick interval override of 0 ms");
        } else {
            info!(tick_interval_ms = interval, "Overriding tick interval from CLI");
            blueprint.world.tick_interval_ms = interval;
        }
    }
    if let Some(policy) = args.skip_policy {
        info!(skip_policy = ?policy, "Overriding skip policy from CLI");
        blueprint.sensor.skip_policy = policy.into();
    }
}

/// Resolves on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping session...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RssSensorBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Sensor:");
    println!("  Id: {}", blueprint.sensor.id);
    match blueprint.parent_actor() {
        Some(parent) => println!("  Attached to: {} ({})", parent.id, parent.type_id),
        None => println!("  Attached to: {:?}", blueprint.sensor.parent_actor),
    }
    println!("  Actor filter: {}", blueprint.sensor.actor_filter);
    println!("  Skip policy: {:?}", blueprint.sensor.skip_policy);

    println!("\nWorld:");
    println!("  Map: {}", blueprint.world.map);
    println!("  Tick interval: {} ms", blueprint.world.tick_interval_ms);
    println!("  Actors: {}", blueprint.actors.len());

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
