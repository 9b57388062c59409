use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{error, info};

use rdf_triangulation::api::CsvFormatter;
use rdf_triangulation::{ConfigurationManager, OutputFormat, RandomNoise, RdfPipeline, RdfResult};

/// Simulated RDF triangulation demo: generate bearings, fuse, print
#[derive(Debug, Parser)]
#[command(name = "rdf-triangulation", version, about)]
struct Cli {
    /// JSON system configuration; built-in two-station deployment if omitted
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Number of update cycles to run
    #[arg(short = 'n', long, default_value_t = 5)]
    cycles: u64,
    /// Output format of each update
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
    /// Seed for reproducible measurement noise
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> RdfResult<()> {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .format_timestamp_millis()
        .format_module_path(false)
        .init();

    let cli = Cli::parse();

    let manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    let config = manager.get_system_config();

    let noise = match cli.seed {
        Some(seed) => RandomNoise::seeded(seed),
        None => RandomNoise::new(),
    };
    let mut pipeline = RdfPipeline::with_noise(config, noise);
    let interval = Duration::from_millis(config.update_interval_ms);

    info!(
        "running {} cycle(s) over {} station(s), every {} ms",
        cli.cycles,
        manager.stations().len(),
        config.update_interval_ms
    );

    let mut formatter = cli.format.formatter_with(cli.pretty);
    for n in 0..cli.cycles {
        if n > 0 {
            thread::sleep(interval);
        }

        let update = pipeline.cycle(manager.stations());
        match formatter.format(&update) {
            Ok(out) if out.ends_with('\n') => print!("{}", out),
            Ok(out) => println!("{}", out),
            Err(e) => error!("cycle {}: failed to format update: {}", n + 1, e),
        }

        if cli.format == OutputFormat::Csv {
            formatter = Box::new(CsvFormatter::without_header());
        }
    }

    Ok(())
}
