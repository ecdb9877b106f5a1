mod config;
mod console;
mod render;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use explorer_core::{AppState, AppViewModel, Corpus, Facet, Msg};
use explorer_engine::{EngineSession, Orchestrator, RscriptBackend};
use tokio::sync::mpsc;

use crate::config::{Overrides, DEFAULT_CONFIG_FILE};

/// Filter a snapshot of intervention effects and pool the selection with R.
#[derive(Debug, Parser)]
#[command(name = "effect-explorer", version)]
struct Cli {
    /// RON configuration file; built-in defaults are used if it does not exist.
    #[arg(long, env = "EXPLORER_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// JSON snapshot of effect records.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Outcome to include (repeatable).
    #[arg(long = "outcome", value_name = "OPTION")]
    outcomes: Vec<String>,

    /// Outcome measurement to include (repeatable).
    #[arg(long = "measurement", value_name = "OPTION")]
    measurements: Vec<String>,

    /// Intervention aspect to include (repeatable).
    #[arg(long = "aspect", value_name = "OPTION")]
    aspects: Vec<String>,

    /// Intervention medium to include (repeatable).
    #[arg(long = "medium", value_name = "OPTION")]
    mediums: Vec<String>,

    /// Intervention appeal to include (repeatable).
    #[arg(long = "appeal", value_name = "OPTION")]
    appeals: Vec<String>,

    /// Sample country to include (repeatable).
    #[arg(long = "country", value_name = "OPTION")]
    countries: Vec<String>,

    /// Keep effects whose groups are both larger than this.
    #[arg(long)]
    min_cell_size: Option<u32>,

    /// Log level override (off, error, warn, info, debug, trace).
    #[arg(long)]
    log_level: Option<String>,

    /// Read criteria edits and submissions from stdin.
    #[arg(long)]
    interactive: bool,

    /// Write the final report here instead of stdout.
    #[arg(long)]
    report: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            snapshot: self.snapshot.clone(),
            facets: vec![
                (Facet::Outcome, self.outcomes.clone()),
                (Facet::Measurement, self.measurements.clone()),
                (Facet::Aspect, self.aspects.clone()),
                (Facet::Medium, self.mediums.clone()),
                (Facet::Appeal, self.appeals.clone()),
                (Facet::Country, self.countries.clone()),
            ],
            minimum_cell_size: self.min_cell_size,
            log_level: self.log_level.clone(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, origin) = config::load(&cli.config)?;
    config.apply(cli.overrides());
    engine_logging::initialize(
        config.log.destination.into(),
        config.log.level_filter()?,
        config.log.file.as_deref(),
    );
    origin.log();
    config.validate()?;

    let corpus = Corpus::load(&config.snapshot)
        .with_context(|| format!("failed to load snapshot {:?}", config.snapshot))?;
    let state = AppState::new(corpus, config.criteria.clone());
    let session = EngineSession::new(RscriptBackend::new(config.engine.clone()));
    let orchestrator = Orchestrator::new(session, state);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let (tx, rx) = mpsc::unbounded_channel();
    tx.send(Msg::ActivateEngine)
        .context("failed to queue engine activation")?;
    if cli.interactive {
        println!("{}", console::HELP);
        console::spawn(tx, config.criteria.clone());
    } else {
        drop(tx);
    }

    let interactive = cli.interactive;
    let mut last_line = String::new();
    let final_state = runtime.block_on(orchestrator.run(rx, |view: &AppViewModel| {
        let line = render::status_line(view);
        if line != last_line {
            if interactive {
                println!("{line}");
            } else {
                engine_info!("{}", line);
            }
            last_line = line;
        }
    }));

    let view = final_state.view();
    if view.effect.is_none() && view.error.is_none() {
        engine_warn!("Finished without a pooled effect");
    }
    let text = render::report(&view, final_state.criteria(), &Local::now());
    match &cli.report {
        Some(path) => {
            fs::write(path, &text).with_context(|| format!("failed to write report {path:?}"))?;
            engine_info!("Report written to {:?}", path);
        }
        None => print!("{text}"),
    }
    Ok(())
}
