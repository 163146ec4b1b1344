use anyhow::{Context, Result, bail};
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use clap::{Args, Parser, Subcommand, ValueEnum};
use soa_core::{CollisionConfig, WatorConfig};
use soa_render::plugin::{CollisionRenderPlugin, WatorRenderPlugin};
use soa_sim::pipeline::{SimulationPlugin, init_headless_logging};
use soa_sim::{CollisionSim, WatorSim};
use soa_storage::{CollisionSnapshot, Snapshot, WatorSnapshot, load_snapshot, save_snapshot};
use std::path::{Path, PathBuf};
use std::time::Instant;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "soa_sims")]
#[command(about = "N-body collision and Wa-Tor predator-prey simulations")]
struct Cli {
    #[command(subcommand)]
    command: CliCommand,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Run the n-body collision simulation
    Collision(RunArgs),
    /// Run the Wa-Tor predator-prey simulation
    Wator(RunArgs),
    /// Continue a run from a snapshot file
    Resume {
        /// Snapshot written by an earlier `--snapshot`
        snapshot: PathBuf,

        /// Override the total iteration count of the run
        #[arg(long)]
        iterations: Option<u32>,

        /// Open a viewer window
        #[arg(long)]
        render: bool,

        /// Write the final state here (headless only)
        #[arg(long, conflicts_with = "render")]
        out: Option<PathBuf>,
    },
    /// Print the default configuration as JSON
    DumpDefaultConfig {
        #[arg(value_enum)]
        sim: SimKind,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Path to a JSON config file; missing fields use the built-in defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the number of iterations
    #[arg(long)]
    iterations: Option<u32>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Open a viewer window
    #[arg(long)]
    render: bool,

    /// Write the final state to this file (headless only)
    #[arg(long, conflicts_with = "render")]
    snapshot: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SimKind {
    Collision,
    Wator,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = cli.log_level;

    match cli.command {
        CliCommand::Collision(args) => {
            let mut config = match &args.config {
                Some(path) => CollisionConfig::from_json_file(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => CollisionConfig::default(),
            };
            if let Some(seed) = args.seed {
                config.seed = seed;
            }
            if let Some(iterations) = args.iterations {
                config.iterations = iterations;
            }
            config.option_render |= args.render;
            let render = config.option_render;
            if render && args.snapshot.is_some() {
                bail!("snapshots are only written by headless runs");
            }
            if !render {
                init_headless_logging(level);
            }

            let sim = CollisionSim::new(config).context("invalid collision configuration")?;
            if render {
                launch_viewer(sim, "Collision", CollisionRenderPlugin, level)
            } else {
                run_collision(sim, Uuid::new_v4(), args.snapshot.as_deref())
            }
        }
        CliCommand::Wator(args) => {
            let mut config = match &args.config {
                Some(path) => WatorConfig::from_json_file(path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => WatorConfig::default(),
            };
            if let Some(seed) = args.seed {
                config.seed = seed;
            }
            if let Some(iterations) = args.iterations {
                config.num_iterations = iterations;
            }
            if !args.render {
                init_headless_logging(level);
            }

            let sim = WatorSim::new(config).context("invalid Wa-Tor configuration")?;
            if args.render {
                launch_viewer(sim, "Wa-Tor", WatorRenderPlugin, level)
            } else {
                run_wator(sim, Uuid::new_v4(), args.snapshot.as_deref())
            }
        }
        CliCommand::Resume {
            snapshot,
            iterations,
            render,
            out,
        } => {
            if !render {
                init_headless_logging(level);
            }
            let loaded = load_snapshot(&snapshot)
                .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
            let run_id = loaded.run_id();
            info!(
                "Resuming run {} at iteration {}",
                run_id,
                loaded.iteration()
            );

            match loaded {
                Snapshot::Collision(saved) => {
                    let mut sim = saved.restore().context("corrupt collision snapshot")?;
                    if let Some(iterations) = iterations {
                        sim.config.iterations = iterations;
                    }
                    if render {
                        launch_viewer(sim, "Collision", CollisionRenderPlugin, level)
                    } else {
                        run_collision(sim, run_id, out.as_deref())
                    }
                }
                Snapshot::Wator(saved) => {
                    let mut sim = saved.restore().context("corrupt Wa-Tor snapshot")?;
                    if let Some(iterations) = iterations {
                        sim.config.num_iterations = iterations;
                    }
                    if render {
                        launch_viewer(sim, "Wa-Tor", WatorRenderPlugin, level)
                    } else {
                        run_wator(sim, run_id, out.as_deref())
                    }
                }
            }
        }
        CliCommand::DumpDefaultConfig { sim } => {
            let json = match sim {
                SimKind::Collision => serde_json::to_string_pretty(&CollisionConfig::default())?,
                SimKind::Wator => serde_json::to_string_pretty(&WatorConfig::default())?,
            };
            println!("{json}");
            Ok(())
        }
    }
}

fn run_collision(mut sim: CollisionSim, run_id: Uuid, snapshot: Option<&Path>) -> Result<()> {
    let remaining = sim.config.iterations.saturating_sub(sim.iteration);
    info!(
        "Running collision: {} bodies, {} iterations",
        sim.bodies.len(),
        remaining
    );

    let start = Instant::now();
    let stats = sim.run(remaining);
    let elapsed = start.elapsed();

    println!("iterations: {}", stats.iteration);
    println!("bodies:     {} ({} merged)", stats.bodies, stats.merged);
    println!("total mass: {:.3}", stats.total_mass);
    println!("momentum:   ({:.6e}, {:.6e})", stats.momentum[0], stats.momentum[1]);
    println!("checksum:   {:.6}", stats.checksum);
    println!("time:       {} ms", elapsed.as_millis());

    if let Some(path) = snapshot {
        let snap = Snapshot::Collision(CollisionSnapshot::capture(&sim, run_id));
        save_snapshot(&snap, path).with_context(|| format!("saving {}", path.display()))?;
        info!("Snapshot of run {} written to {}", run_id, path.display());
    }
    Ok(())
}

fn run_wator(mut sim: WatorSim, run_id: Uuid, snapshot: Option<&Path>) -> Result<()> {
    let remaining = sim.config.num_iterations.saturating_sub(sim.iteration);
    info!(
        "Running Wa-Tor: {}x{} grid, {} iterations",
        sim.torus.size_x, sim.torus.size_y, remaining
    );

    let start = Instant::now();
    let stats = sim.run(remaining);
    let elapsed = start.elapsed();

    println!("iterations: {}", stats.iteration);
    println!("fish:       {}", stats.fish);
    println!("sharks:     {}", stats.sharks);
    println!("time:       {} ms", elapsed.as_millis());

    if let Some(path) = snapshot {
        let snap = Snapshot::Wator(WatorSnapshot::capture(&sim, run_id));
        save_snapshot(&snap, path).with_context(|| format!("saving {}", path.display()))?;
        info!("Snapshot of run {} written to {}", run_id, path.display());
    }
    Ok(())
}

fn launch_viewer<R: Resource>(sim: R, title: &str, viewer: impl Plugin, level: Level) -> Result<()> {
    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: title.into(),
                        resolution: (1920.0, 1080.0).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    level,
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::srgb(0.0, 0.0, 0.02)))
        .insert_resource(sim)
        .add_plugins(SimulationPlugin)
        .add_plugins(viewer)
        .run();

    if exit.is_error() {
        bail!("viewer exited with {exit:?}");
    }
    Ok(())
}
