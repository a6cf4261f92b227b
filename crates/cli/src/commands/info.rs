//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DynamicsProfile, RssSensorBlueprint};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::load_blueprint;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    sensor: SensorInfo,
    world: WorldInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    actors: Vec<ActorInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dynamics: Option<DynamicsInfo>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct SensorInfo {
    id: String,
    parent_actor: Option<u32>,
    actor_filter: String,
    visualize_results: bool,
    skip_policy: String,
}

#[derive(Serialize)]
struct WorldInfo {
    map: String,
    tick_interval_ms: u64,
    episode_id: u64,
    actor_count: usize,
}

#[derive(Serialize)]
struct ActorInfo {
    id: u32,
    type_id: String,
    position: [f64; 3],
    yaw: f64,
    speed: f64,
    is_parent: bool,
}

#[derive(Serialize)]
struct DynamicsInfo {
    ego: DynamicsProfile,
    other: DynamicsProfile,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &RssSensorBlueprint, args: &InfoArgs) -> ConfigInfo {
    let sensor = &blueprint.sensor;

    let actors = if args.actors {
        blueprint
            .actors
            .iter()
            .map(|actor| {
                let location = actor.transform.location;
                ActorInfo {
                    id: actor.id,
                    type_id: actor.type_id.clone(),
                    position: [location.x, location.y, location.z],
                    yaw: actor.transform.rotation.yaw,
                    speed: actor.velocity.length(),
                    is_parent: sensor.parent_actor == Some(actor.id),
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.clone(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        sensor: SensorInfo {
            id: sensor.id.clone(),
            parent_actor: sensor.parent_actor,
            actor_filter: sensor.actor_filter.clone(),
            visualize_results: sensor.visualize_results,
            skip_policy: format!("{:?}", sensor.skip_policy),
        },
        world: WorldInfo {
            map: blueprint.world.map.clone(),
            tick_interval_ms: blueprint.world.tick_interval_ms,
            episode_id: blueprint.world.episode_id,
            actor_count: blueprint.actors.len(),
        },
        actors,
        dynamics: args.dynamics.then(|| DynamicsInfo {
            ego: blueprint.dynamics.ego,
            other: blueprint.dynamics.other,
        }),
        sinks,
    }
}

fn print_profile(label: &str, profile: &DynamicsProfile, last: bool) {
    let prefix = if last { "└─" } else { "├─" };
    let lon = &profile.alpha_lon;
    let lat = &profile.alpha_lat;
    println!(
        "   {} {}: response {:.2}s, lon accel {:.2} brake {:.2}/{:.2}/{:.2}, lat accel {:.2} brake {:.2}, margin {:.2}m",
        prefix,
        label,
        profile.response_time,
        lon.accel_max,
        lon.brake_max,
        lon.brake_min,
        lon.brake_min_correct,
        lat.accel_max,
        lat.brake_min,
        profile.lateral_fluctuation_margin
    );
}

fn print_config_info(blueprint: &RssSensorBlueprint, args: &InfoArgs) {
    println!("=== CARLA RSS Configuration ===\n");

    let sensor = &blueprint.sensor;
    println!("Sensor");
    println!("   ├─ Id: {}", sensor.id);
    println!("   ├─ Parent actor: {:?}", sensor.parent_actor);
    println!("   ├─ Actor filter: {}", sensor.actor_filter);
    println!("   ├─ Visualize results: {}", sensor.visualize_results);
    println!("   └─ Skip policy: {:?}", sensor.skip_policy);

    println!("\nWorld");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Map: {}", blueprint.world.map);
    println!("   ├─ Tick interval: {} ms", blueprint.world.tick_interval_ms);
    println!("   └─ Episode: {}", blueprint.world.episode_id);

    println!("\nActors ({})", blueprint.actors.len());
    if args.actors {
        for (i, actor) in blueprint.actors.iter().enumerate() {
            let is_last = i == blueprint.actors.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let marker = if sensor.parent_actor == Some(actor.id) {
                " [ego]"
            } else {
                ""
            };
            let location = actor.transform.location;
            println!(
                "   {} {} ({}){} at ({:.1}, {:.1}), {:.1} m/s",
                prefix,
                actor.id,
                actor.type_id,
                marker,
                location.x,
                location.y,
                actor.velocity.length()
            );
        }
    }

    if args.dynamics {
        println!("\nDynamics");
        print_profile("Ego", &blueprint.dynamics.ego, false);
        print_profile("Other", &blueprint.dynamics.other, true);
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({})", blueprint.sinks.len());
        if args.sinks {
            for (i, sink) in blueprint.sinks.iter().enumerate() {
                let is_last = i == blueprint.sinks.len() - 1;
                let prefix = if is_last { "└─" } else { "├─" };
                println!(
                    "   {} {} ({:?}, queue {})",
                    prefix, sink.name, sink.sink_type, sink.queue_capacity
                );
            }
        }
    }

    println!();
}
