//! Configuration loading for the qroute planner
//!
//! A configuration file is mandatory: when none can be found or read,
//! loading fails with [`RouteError::ConfigMissing`]. Keys missing from a file
//! fall back to the defaults documented on each field.

use std::path::{Path, PathBuf};

use config::{Config as Settings, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use qroute_core::{Coordinate, NodeId, PenaltyArea, Result, RouteError, WeightMode};
use qroute_rl::LearningConfig;

/// Section name used by older parameter files
const LEGACY_LEARNING_SECTION: &str = "learning_parameters";

/// Planner configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Also read from a `[learning_parameters]` section, at lower precedence
    pub learning: LearningConfig,
    pub data: DataConfig,
    pub penalty: PenaltyConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeightModeKind {
    /// Fourth edge field is the length
    #[default]
    Direct,
    /// Fourth edge field corrects the calibrated coordinate distance
    Derived,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub nodes: PathBuf,
    pub edges: PathBuf,
    pub weight_mode: WeightModeKind,
    /// Coordinate-distance to real-distance factor for derived weights
    pub calibration: f64,
    /// Candidate facilities for nearest-facility queries
    pub facilities: Vec<NodeId>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            nodes: PathBuf::from("data/node_py_data.txt"),
            edges: PathBuf::from("data/edge_py_data.txt"),
            weight_mode: WeightModeKind::Direct,
            calibration: WeightMode::DEFAULT_CALIBRATION,
            facilities: Vec::new(),
        }
    }
}

impl DataConfig {
    pub fn weight_mode(&self) -> WeightMode {
        match self.weight_mode {
            WeightModeKind::Direct => WeightMode::Direct,
            WeightModeKind::Derived => WeightMode::Derived {
                calibration: self.calibration,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PenaltyConfig {
    pub obstacle_factor: f64,
    pub weather_factor: f64,
}

impl Default for PenaltyConfig {
    fn default() -> Self {
        Self {
            obstacle_factor: PenaltyArea::OBSTACLE_FACTOR,
            weather_factor: PenaltyArea::WEATHER_FACTOR,
        }
    }
}

impl PenaltyConfig {
    pub fn obstacle(&self, center: Coordinate, radius: f64) -> PenaltyArea {
        PenaltyArea::new(center, radius, self.obstacle_factor)
    }

    pub fn weather(&self, center: Coordinate, radius: f64) -> PenaltyArea {
        PenaltyArea::new(center, radius, self.weather_factor)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Locate and load the configuration.
    ///
    /// An explicit path must exist; otherwise the search order is
    /// `QROUTE_CONFIG`, `./qroute.toml`, `./config/q_learning.ini`,
    /// `~/.config/qroute/qroute.toml`.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::find_config_file().ok_or_else(|| {
                RouteError::ConfigMissing(
                    "no qroute.toml found (set QROUTE_CONFIG or pass --config)".to_string(),
                )
            })?,
        };
        Self::load_from(&path)
    }

    /// Load from one file, then apply `QROUTE__SECTION__KEY` environment overrides.
    ///
    /// Relative data paths are resolved against the file's directory.
    pub fn load_from(path: &Path) -> Result<Self> {
        info!("Loading config from: {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| {
            RouteError::ConfigMissing(format!("cannot read {}: {e}", path.display()))
        })?;
        let format = match path.extension().and_then(|ext| ext.to_str()) {
            Some("ini") => FileFormat::Ini,
            Some("json") => FileFormat::Json,
            _ => FileFormat::Toml,
        };

        let file_only = Settings::builder()
            .add_source(File::from_str(&contents, format))
            .build()
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;

        // Legacy section values become defaults of `[learning]`, so a
        // `[learning]` section or `QROUTE__LEARNING__*` overrides still win.
        let mut builder = Settings::builder();
        if let Ok(legacy) = file_only.get_table(LEGACY_LEARNING_SECTION) {
            for (key, value) in legacy {
                builder = builder
                    .set_default(format!("learning.{key}"), value)
                    .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;
            }
        }

        let settings = builder
            .add_source(File::from_str(&contents, format))
            .add_source(
                Environment::with_prefix("QROUTE")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| RouteError::InvalidConfig(e.to_string()))?;

        let mut config: Self = settings
            .try_deserialize()
            .map_err(|e| RouteError::InvalidConfig(format!("failed to deserialize configuration: {e}")))?;

        if let Some(base) = path.parent() {
            config.data.resolve_relative_to(base);
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.learning.validate()?;

        if !self.data.calibration.is_finite() || self.data.calibration <= 0.0 {
            return Err(RouteError::InvalidConfig(format!(
                "data.calibration must be positive, got {}",
                self.data.calibration
            )));
        }
        for (name, factor) in [
            ("penalty.obstacle_factor", self.penalty.obstacle_factor),
            ("penalty.weather_factor", self.penalty.weather_factor),
        ] {
            if !factor.is_finite() || factor <= 0.0 {
                return Err(RouteError::InvalidConfig(format!(
                    "{name} must be positive, got {factor}"
                )));
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| RouteError::InvalidConfig(e.to_string()))
    }

    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("QROUTE_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        for local in ["qroute.toml", "config/q_learning.ini"] {
            let local = PathBuf::from(local);
            if local.exists() {
                return Some(local);
            }
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".config").join("qroute").join("qroute.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        None
    }
}

impl DataConfig {
    fn resolve_relative_to(&mut self, base: &Path) {
        for path in [&mut self.nodes, &mut self.edges] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}
