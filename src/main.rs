use gravsim::{bake_fields, bench_workers, Scenario, ScenarioConfig};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(about = "Domain-decomposed leapfrog N-body simulation")]
struct Args {
    /// Scenario file (.yaml or .json), looked up under scenarios/ if not found as given
    #[arg(short, long, default_value = "two_body.yaml")]
    file: PathBuf,

    /// Override the configured worker count
    #[arg(short, long)]
    workers: Option<usize>,

    /// Write the timeline as JSON to this path (overrides `save.path`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Run the worker scaling benchmark instead of a scenario
    #[arg(long)]
    bench: bool,
}

fn init_tracing() {
    // RUST_LOG wins, default to info
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();
}

fn resolve_scenario_path(file: PathBuf) -> PathBuf {
    if file.exists() {
        return file;
    }
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios").join(file)
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    if args.bench {
        bench_workers(&[200, 400, 800, 1600], &[1, 2, 4, 8], 5)?;
        return Ok(());
    }

    let config_path = resolve_scenario_path(args.file);
    let scenario_cfg = ScenarioConfig::load(&config_path)
        .with_context(|| format!("failed to load scenario {}", config_path.display()))?;

    let mut scenario = Scenario::build_scenario(scenario_cfg)?;
    if let Some(workers) = args.workers {
        scenario = scenario.with_workers(workers)?;
    }

    let timeline = scenario.run()?;
    let params = scenario.simulation.parameters();

    let baked = scenario.field.as_ref().map(|grid| {
        let baked = bake_fields(grid, &timeline, params.G, params.softening);
        info!(frames = baked.frames.len(), min = baked.min, max = baked.max, "baked fields");
        baked
    });

    if let Some(path) = args.output.or_else(|| scenario.save.clone()) {
        timeline
            .save_json(&path)
            .with_context(|| format!("failed to save timeline to {}", path.display()))?;
        info!("saved {} snapshots to {}", timeline.len(), path.display());

        if let Some(baked) = baked {
            let field_path = path.with_extension("fields.json");
            baked
                .save_json(&field_path)
                .with_context(|| format!("failed to save fields to {}", field_path.display()))?;
        }
    } else if let Some(last) = timeline.last() {
        for (i, b) in last.bodies.iter().enumerate() {
            println!("body {i}: x = ({:.6}, {:.6}), v = ({:.6}, {:.6})", b.x.x, b.x.y, b.v.x, b.v.y);
        }
    }

    Ok(())
}
