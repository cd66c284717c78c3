use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use island_mapgen::config::ShapeKind;
use island_mapgen::{IslandConfig, IslandMap, IslandSeeds};

#[derive(Parser, Debug)]
#[command(name = "island_mapgen")]
#[command(about = "Generate polygonal island maps with rivers and biomes")]
struct Args {
    /// Random seed (uses random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Override the point sampling and shape seed
    #[arg(long)]
    simulation_seed: Option<u64>,

    /// Override the river seed
    #[arg(long)]
    river_seed: Option<u64>,

    /// Override the drainage tie-break seed
    #[arg(long)]
    drainage_seed: Option<u64>,

    /// JSON configuration file; flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Side length of the square map
    #[arg(long)]
    size: Option<f64>,

    /// Minimum distance between interior points
    #[arg(long)]
    spacing: Option<f64>,

    /// Island outline
    #[arg(long, value_enum)]
    shape: Option<ShapeKind>,

    /// Swap land and water
    #[arg(long)]
    invert: bool,

    /// Number of rivers to grow
    #[arg(short = 'r', long)]
    rivers: Option<usize>,

    /// Shift land moisture to [rainfall, 1 + rainfall]
    #[arg(long)]
    rainfall: Option<f64>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    print_config: bool,

    /// Log filter when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn island_config(&self) -> island_mapgen::Result<IslandConfig> {
        let mut config = match &self.config {
            Some(path) => IslandConfig::from_json_file(path)?,
            None => IslandConfig::default(),
        };
        if let Some(size) = self.size {
            config.map.size = size;
        }
        if let Some(spacing) = self.spacing {
            config.map.poisson_spacing = spacing;
        }
        if let Some(kind) = self.shape {
            config.shape.kind = kind;
        }
        if self.invert {
            config.shape.invert = true;
        }
        if let Some(rivers) = self.rivers {
            config.rivers.num_rivers = rivers;
        }
        if let Some(rainfall) = self.rainfall {
            config.biome.rainfall = rainfall;
        }
        config.validate()?;
        Ok(config)
    }

    fn seeds(&self) -> IslandSeeds {
        let mut builder = IslandSeeds::builder(self.seed.unwrap_or_else(rand::random));
        if let Some(seed) = self.simulation_seed {
            builder = builder.simulation(seed);
        }
        if let Some(seed) = self.river_seed {
            builder = builder.rivers(seed);
        }
        if let Some(seed) = self.drainage_seed {
            builder = builder.drainage(seed);
        }
        builder.build()
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> island_mapgen::Result<()> {
    let config = args.island_config()?;
    if args.print_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let seeds = args.seeds();
    info!("Generating island with {}", seeds);
    info!("Map size: {0}x{0}, point spacing {1}", config.map.size, config.map.poisson_spacing);

    let island = IslandMap::generate(&config, seeds)?;
    let summary = island.summary();

    info!("Mesh: {} regions, {} triangles", summary.regions, summary.triangles);
    info!(
        "Regions: {} ocean, {} land ({} coast), {} lake",
        summary.ocean_regions, summary.land_regions, summary.coast_regions, summary.lake_regions
    );
    info!(
        "Elevation range: {:.3} to {:.3}",
        summary.elevation_range.0, summary.elevation_range.1
    );
    info!(
        "Land moisture range: {:.3} to {:.3}",
        summary.moisture_range.0, summary.moisture_range.1
    );
    info!("Rivers: {} ({} tributaries)", summary.rivers, summary.tributaries);
    for (biome, count) in &summary.biomes {
        info!("  {:<28} {}", biome.display_name(), count);
    }
    info!("Done. Seed: {}", island.seed());
    Ok(())
}
