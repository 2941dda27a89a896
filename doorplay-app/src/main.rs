mod app;
mod audio;
mod terminal;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use doorplay_core::{DoorPhase, Language};
use doorplay_experiment::{ExperimentConfig, ExperimentStateMachine};
use doorplay_timing::HighPrecisionTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;

pub use app::App;

pub type Session = ExperimentStateMachine<DoorPhase, HighPrecisionTimer, StdRng>;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LanguageArg {
    English,
    Hebrew,
}

impl From<LanguageArg> for Language {
    fn from(arg: LanguageArg) -> Self {
        match arg {
            LanguageArg::English => Language::English,
            LanguageArg::Hebrew => Language::Hebrew,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "doorplay", version)]
#[command(about = "Approach-avoidance door task")]
struct Args {
    /// JSON session config; every field is optional
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the config language
    #[arg(long, value_enum)]
    language: Option<LanguageArg>,

    /// Seed for door schedules and outcomes
    #[arg(long)]
    seed: Option<u64>,

    /// Run in the terminal instead of a window
    #[arg(long)]
    terminal: bool,

    /// Directory holding img/ and sounds/
    #[arg(long)]
    asset_root: Option<PathBuf>,

    /// TTF/OTF font for on-screen text
    #[arg(long, default_value = "fonts/DejaVuSans.ttf")]
    font: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ExperimentConfig::default(),
    };
    if let Some(language) = args.language {
        config.language = language.into();
    }
    if let Some(root) = &args.asset_root {
        config.asset_root = root.clone();
    }
    config.validate()?;

    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!(
        "Starting session: language {:?}, seed {seed}, assets {}",
        config.language,
        config.asset_root.display()
    );

    let session = Session::new(config, HighPrecisionTimer::new(), StdRng::seed_from_u64(seed));

    if args.terminal {
        terminal::run(session)
    } else {
        App::new(session, args.font).run()
    }
}
