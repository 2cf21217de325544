//! rsbot CLI
//!
//! Loads a script and runs it against the real desktop for the configured
//! session length.

use std::fs::File;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

use rsbot::input::{release_held_keys, DesktopDevice};
use rsbot::{Humanizer, Program, RunConfig, Runner};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(help = "path to bot script")]
    script: PathBuf,

    #[arg(short = 'c', long, help = "JSON run configuration")]
    config: Option<PathBuf>,

    #[arg(short = 'r', long, help = "script runtime in seconds")]
    runtime: Option<f64>,

    #[arg(short = 's', long, help = "seconds to wait before starting")]
    start_delay: Option<f64>,

    #[arg(short = 'p', long, help = "seconds of activity between idle breaks")]
    idle_period: Option<f64>,

    #[arg(
        short = 'i',
        long,
        num_args = 2,
        value_names = ["MIN", "MAX"],
        help = "idle break range in minutes"
    )]
    idle: Option<Vec<f64>>,

    #[arg(short = 'g', long, default_value_t = false, help = "enable debug logging")]
    debug: bool,

    #[arg(short = 'l', long, help = "also write logs to this file")]
    log_file: Option<PathBuf>,

    #[arg(long, help = "seed for reproducible randomization")]
    seed: Option<u64>,

    #[arg(long, default_value_t = false, help = "validate the script and exit")]
    check: bool,
}

fn init_logging(args: &Args) -> Result<()> {
    let level = if args.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = &args.log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    CombinedLogger::init(loggers).context("Failed to initialize logger")
}

fn load_config(args: &Args) -> Result<RunConfig> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(runtime) = args.runtime {
        config.runtime_secs = runtime;
    }
    if let Some(delay) = args.start_delay {
        config.start_delay_secs = delay;
    }
    if let Some(period) = args.idle_period {
        config.idle_period_secs = period;
    }
    if let Some(idle) = &args.idle {
        match idle.as_slice() {
            &[min, max] => config.idle_minutes = [min, max],
            other => bail!("--idle takes two values, got {}", other.len()),
        }
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args)?;

    let program = Program::load(&args.script).context("Failed to load script")?;
    if args.check {
        println!(
            "{}: {} instructions, {} labels",
            args.script.display(),
            program.len(),
            program.labels().len()
        );
        return Ok(());
    }

    let config = load_config(&args)?;
    log::debug!("run config: {:?}", config);

    ctrlc::set_handler(|| {
        log::warn!("interrupted, releasing held keys");
        match DesktopDevice::new() {
            Ok(mut device) => {
                if let Err(e) = release_held_keys(&mut device) {
                    log::error!("Failed to release keys: {}", e);
                }
            }
            Err(e) => log::error!("Failed to open desktop for cleanup: {}", e),
        }
        std::process::exit(130);
    })
    .context("Failed to install interrupt handler")?;

    let mut device = DesktopDevice::new().context("Failed to open desktop")?;
    let mut humanizer = match args.seed {
        Some(seed) => Humanizer::seeded(seed),
        None => Humanizer::new(),
    };

    let summary = Runner::new(&mut device, &mut humanizer, &config)
        .run(&program)
        .context("Failed to run script")?;

    log::info!(
        "done: {} passes, {} steps, {} idles",
        summary.passes,
        summary.stats.steps,
        summary.idles
    );
    Ok(())
}
