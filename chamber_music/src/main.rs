// Chamber Sketches: CLI entry point.
//
// Generates one sketch and writes it in the chosen format, optionally
// opening the result in an external viewer.
//
// Usage:
//   cargo run -p chamber_music -- <SKETCH> [--seed N] [--config FILE]
//     [--out FILE] [--format ly|midi|text] [--show VIEWER] [--dump-config]
//
// Sketches: random-walk, drift, pentatonic, ensemble, september-song
// Logging follows RUST_LOG (default: info).

use anyhow::{Context, Result};
use chamber_music::config::SketchConfig;
use chamber_music::generators::Sketch;
use chamber_music::render::{Format, show};
use chamber_prng::SketchRng;
use chrono::Utc;
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// Sketch to generate
    #[clap(default_value = "random-walk")]
    sketch: Sketch,

    /// Seed for reproducible output; the clock is used when absent
    #[clap(short, long)]
    seed: Option<u64>,

    /// JSON config file; missing fields keep their defaults
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// Output file (defaults to the sketch name plus the format's extension)
    #[clap(short, long)]
    out: Option<PathBuf>,

    /// Output format: ly, midi or text
    #[clap(short, long, default_value = "ly")]
    format: Format,

    /// Open the written file with this program (e.g. mscore)
    #[clap(long)]
    show: Option<String>,

    /// Print the effective config as JSON and exit
    #[clap(long)]
    dump_config: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SketchConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => SketchConfig::default(),
    };
    if args.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let seed = args.seed.unwrap_or_else(clock_seed);
    info!("generating {} with seed {}", args.sketch, seed);
    let mut rng = SketchRng::new(seed);
    let mut score = args.sketch.generate(&config, &mut rng)?;
    score.date = Some(Utc::now().format("%Y/%m/%d").to_string());

    let renderer = args.format.renderer();
    let out = args
        .out
        .unwrap_or_else(|| PathBuf::from(format!("{}.{}", args.sketch, renderer.extension())));
    renderer
        .write(&score, &out)
        .with_context(|| format!("writing {}", out.display()))?;

    if args.format == Format::Text {
        print!("{}", score.summary());
    }
    if let Some(viewer) = &args.show {
        show(&out, viewer)?;
    }
    Ok(())
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
