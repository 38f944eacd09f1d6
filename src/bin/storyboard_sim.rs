use anyhow::{Context, Result};
use bevy_ecs::prelude::Entity;
use clap::Parser;
use storyboard_runtime::cli::SimArgs;
use storyboard_runtime::config::RuntimeConfig;
use storyboard_runtime::ecs::EcsWorld;
use storyboard_runtime::scene::StoryboardScene;
use storyboard_runtime::StoryboardEvent;
use std::process;

fn main() {
    tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();
    let args = SimArgs::parse();
    if let Err(err) = run(&args) {
        eprintln!("storyboard_sim error: {err:?}");
        process::exit(1);
    }
}

fn label(ecs: &EcsWorld, entity: Entity) -> String {
    ecs.name(entity).map_or_else(|| format!("#{}", entity.index()), str::to_string)
}

fn run(args: &SimArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => RuntimeConfig::load_or_default(path),
        None => RuntimeConfig::default(),
    };
    let overrides = args.overrides();
    if !overrides.is_empty() {
        tracing::info!(fields = ?overrides.applied_fields(), "applying command line overrides");
        config.apply_overrides(&overrides);
    }

    let scene = StoryboardScene::load(&args.scene)?;
    let mut ecs = EcsWorld::with_config(&config);
    let mut spawned = scene
        .spawn_into(&mut ecs)
        .with_context(|| format!("Invalid scene description {}", args.scene.display()))?;
    let step = config.frame.step_ms;
    spawned.dispatch_due(&ecs, ecs.now());
    let mut frames_run = 0u32;
    for _ in 0..config.frame.max_frames {
        let now = ecs.step(step);
        frames_run += 1;
        for event in ecs.drain_events() {
            match event {
                StoryboardEvent::Changed { storyboard, active } => {
                    let state = if active { "active" } else { "inactive" };
                    println!("[{now:>7}ms] {} -> {state}", label(&ecs, storyboard));
                }
                StoryboardEvent::ResolveFailed { scene } => {
                    println!("[{now:>7}ms] {} has no owning storyboard", label(&ecs, scene));
                }
                other => println!("[{now:>7}ms] {other}"),
            }
        }
        spawned.dispatch_due(&ecs, now);
        if args.until_idle && spawned.remaining_cues() == 0 && ecs.pending_commands() == 0 {
            let idle = spawned.storyboards.values().all(|entity| !ecs.is_storyboard_running(*entity));
            if idle {
                break;
            }
        }
    }

    let stats = ecs.stats();
    println!(
        "Simulated {frames_run} frames ({} ms): {} notifications, {} clears, {} compactions ({} entries reclaimed), {} resolve failures",
        ecs.now(),
        stats.notifications,
        stats.full_clears,
        stats.compactions,
        stats.reclaimed_entries,
        stats.resolve_failures
    );
    if args.timings {
        for timing in ecs.phase_timings() {
            println!(
                "  {:<9} last {:>8.1}us avg {:>8.1}us max {:>8.1}us ({} samples)",
                timing.phase, timing.last_us, timing.average_us, timing.max_us, timing.samples
            );
        }
    }
    Ok(())
}
