use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::chart::ChartBasis;
use crate::session::{DEFAULT_ADVANCE_DELAY_MS, DEFAULT_MASTERY_THRESHOLD};

pub const DEFAULT_SAMPLE_QUESTIONS: usize = 25;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub advance_delay_ms: u64,
    pub mastery_threshold: f64,
    pub sample_questions: usize,
    pub chart_basis: ChartBasis,
    pub dark_mode: bool,
    pub user_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            advance_delay_ms: DEFAULT_ADVANCE_DELAY_MS,
            mastery_threshold: DEFAULT_MASTERY_THRESHOLD,
            sample_questions: DEFAULT_SAMPLE_QUESTIONS,
            chart_basis: ChartBasis::default(),
            dark_mode: false,
            user_id: "local".to_string(),
        }
    }
}

impl Config {
    /// Clamp values that would make a session meaningless.
    pub fn sanitized(mut self) -> Self {
        if !(0.0..=1.0).contains(&self.mastery_threshold) || self.mastery_threshold.is_nan() {
            warn!(
                threshold = self.mastery_threshold,
                "mastery threshold out of range, using default"
            );
            self.mastery_threshold = DEFAULT_MASTERY_THRESHOLD;
        }
        if self.user_id.trim().is_empty() {
            self.user_id = Config::default().user_id;
        }
        self
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "quizring") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("quizring_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(_) => return Config::default(),
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg.sanitized(),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "unreadable config, using defaults");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg).map_err(std::io::Error::other)?;
        fs::write(&self.path, data)
    }
}
