use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use engine_logging::{engine_info, LogDestination};
use explorer_core::{CriteriaSet, Facet, OptionGroup, Vocabulary};
use explorer_engine::RscriptSettings;
use log::LevelFilter;
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "explorer.ron";
const DEFAULT_SNAPSHOT_FILE: &str = "data/effects.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum LogOutput {
    File,
    #[default]
    Terminal,
    Both,
}

impl From<LogOutput> for LogDestination {
    fn from(output: LogOutput) -> Self {
        match output {
            LogOutput::File => LogDestination::File,
            LogOutput::Terminal => LogDestination::Terminal,
            LogOutput::Both => LogDestination::Both,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub destination: LogOutput,
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            destination: LogOutput::Terminal,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl LogSettings {
    pub fn level_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.level)
            .with_context(|| format!("unknown log level {:?}", self.level))
    }
}

/// Everything the explorer needs before it can load the corpus.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub snapshot: PathBuf,
    pub vocabulary: Vocabulary,
    pub criteria: CriteriaSet,
    pub engine: RscriptSettings,
    pub log: LogSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        let vocabulary = builtin_vocabulary();
        let criteria = CriteriaSet::new()
            .with(
                Facet::Outcome,
                ["meat consumption", "meat consumption intention"],
            )
            .with(Facet::Measurement, ["survey"])
            .with(Facet::Aspect, ["animal welfare"])
            .with(Facet::Medium, ["text"])
            .with(Facet::Appeal, ["factual"])
            .with(Facet::Country, vocabulary.all_ids(Facet::Country))
            .with_minimum_cell_size(50);
        Self {
            snapshot: PathBuf::from(DEFAULT_SNAPSHOT_FILE),
            vocabulary,
            criteria,
            engine: RscriptSettings::default(),
            log: LogSettings::default(),
        }
    }
}

/// Values given on the command line; each one replaces its config counterpart.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub snapshot: Option<PathBuf>,
    pub facets: Vec<(Facet, Vec<String>)>,
    pub minimum_cell_size: Option<u32>,
    pub log_level: Option<String>,
}

impl AppConfig {
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(snapshot) = overrides.snapshot {
            self.snapshot = snapshot;
        }
        for (facet, options) in overrides.facets {
            if options.is_empty() {
                continue;
            }
            *self.criteria.selections_mut(facet) =
                options.iter().map(|option| option.to_lowercase()).collect();
        }
        if let Some(minimum_cell_size) = overrides.minimum_cell_size {
            self.criteria.minimum_cell_size = minimum_cell_size;
        }
        if let Some(level) = overrides.log_level {
            self.log.level = level;
        }
    }

    /// Rejects default criteria that the vocabulary cannot offer.
    pub fn validate(&self) -> Result<()> {
        self.vocabulary
            .check(&self.criteria)
            .context("default criteria do not fit the configured vocabulary")?;
        self.log.level_filter()?;
        Ok(())
    }
}

/// Reads the config file, falling back to built-in defaults when it does not exist.
///
/// Runs before the logger is installed; callers log the returned origin.
pub fn load(path: &Path) -> Result<(AppConfig, ConfigOrigin)> {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok((AppConfig::default(), ConfigOrigin::Builtin));
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {path:?}"));
        }
    };
    let config = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {path:?}"))?;
    Ok((config, ConfigOrigin::File(path.to_path_buf())))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Builtin,
    File(PathBuf),
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::Builtin => engine_info!("No config file found; using built-in defaults"),
            ConfigOrigin::File(path) => engine_info!("Loaded config from {:?}", path),
        }
    }
}

fn builtin_vocabulary() -> Vocabulary {
    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }
    Vocabulary {
        outcome_groups: vec![
            OptionGroup {
                name: "Behaviors".to_string(),
                options: labels(&[
                    "Meat consumption",
                    "Animal product consumption",
                    "Vegetarian consumption",
                ]),
            },
            OptionGroup {
                name: "Intentions".to_string(),
                options: labels(&[
                    "Meat consumption intention",
                    "Diet intentions",
                    "Purchasing intentions",
                ]),
            },
            OptionGroup {
                name: "Attitudes".to_string(),
                options: labels(&[
                    "Animal attitude",
                    "Moral judgment",
                    "Meat attitude",
                    "Meat hedonics",
                ]),
            },
        ],
        measurements: labels(&["Food diary", "Sales data", "Survey"]),
        aspects: labels(&[
            "Animal welfare",
            "Environment",
            "Personal health",
            "Personal well-being",
            "Personal image",
            "Disgust",
            "None",
        ]),
        mediums: labels(&[
            "Text",
            "Video",
            "3D",
            "Audio",
            "In-person",
            "Phone messages",
            "Presentation",
            "Image",
        ]),
        appeals: labels(&[
            "Factual",
            "Negative emotional",
            "Positive emotional",
            "Symbolic meaning",
            "Norms",
            "Nudge",
            "Goal pursuit",
            "Perspective taking",
            "Infotainment",
            "Origin of animal product",
            "Celebrity",
            "Choice architecture",
        ]),
        countries: labels(&[
            "Australia",
            "Canada",
            "Czechia",
            "Germany",
            "Italy",
            "Netherlands",
            "Portugal",
            "Sweden",
            "USA",
            "N/A",
        ]),
    }
}
