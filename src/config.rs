use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ConfigError, PlannerError};
use crate::models::Profile;
use crate::state::{ProfileField, SessionStore, SubjectField};

pub const CONFIG_ENV: &str = "STUDYPLAN_CONFIG";
const LOCAL_CONFIG: &str = ".studyplan.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,

    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Seed profile; unset fields keep their defaults
    pub profile: Option<ProfileSeed>,

    /// Seed subjects; the demo subjects are used when absent
    pub subjects: Option<Vec<SubjectSeed>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Hard limit on a plan request
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Minimum time the computing state stays visible after a success
    #[serde(rename = "min-visible-ms")]
    pub min_visible_ms: u64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_ms: 30_000,
            min_visible_ms: 1_500,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProfileSeed {
    pub name: Option<String>,
    pub college: Option<String>,
    pub branch: Option<String>,
    pub year: Option<i32>,
    pub email: Option<String>,
    pub daily_study_hours: Option<f64>,
    pub preferred_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectSeed {
    pub name: String,
    #[serde(default)]
    pub credits: Option<u32>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub confidence: Option<u8>,
}

impl Config {
    /// Explicit path, then `STUDYPLAN_CONFIG`, `./.studyplan.yml`,
    /// `<config_dir>/studyplan/studyplan.yml`, then defaults.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from_file(Path::new(&path));
        }

        let mut candidates = vec![PathBuf::from(LOCAL_CONFIG)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("studyplan").join("studyplan.yml"));
        }

        for candidate in candidates {
            if !candidate.exists() {
                continue;
            }
            match Self::load_from_file(&candidate) {
                Ok(config) => return Ok(config),
                Err(e) => warn!("Failed to load config from {}: {}", candidate.display(), e),
            }
        }

        info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;

        info!("Loaded config from: {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("service.base-url must not be empty".to_string()));
        }
        if self.service.timeout_ms == 0 {
            return Err(ConfigError::Invalid("service.timeout-ms must be positive".to_string()));
        }
        Ok(())
    }

    /// Fresh session from the seeds, validated through the store's own mutators
    pub fn session_store(&self) -> Result<SessionStore, PlannerError> {
        let mut store = match &self.subjects {
            None => SessionStore::demo(),
            Some(seeds) => {
                let mut store = SessionStore::new(Profile::default(), Vec::new())?;
                for seed in seeds {
                    let id = store.add_subject(&seed.name)?.id.clone();
                    if let Some(credits) = seed.credits {
                        store.update_subject(&id, SubjectField::Credits, &credits.to_string())?;
                    }
                    if let Some(difficulty) = &seed.difficulty {
                        store.update_subject(&id, SubjectField::Difficulty, difficulty)?;
                    }
                    if let Some(confidence) = seed.confidence {
                        store.update_subject(&id, SubjectField::Confidence, &confidence.to_string())?;
                    }
                }
                store
            }
        };

        if let Some(seed) = &self.profile {
            let fields = [
                (ProfileField::Name, seed.name.clone()),
                (ProfileField::Institution, seed.college.clone()),
                (ProfileField::Branch, seed.branch.clone()),
                (ProfileField::Year, seed.year.map(|y| y.to_string())),
                (ProfileField::Email, seed.email.clone()),
                (
                    ProfileField::DailyStudyHours,
                    seed.daily_study_hours.map(|h| h.to_string()),
                ),
                (ProfileField::PreferredTime, seed.preferred_time.clone()),
            ];
            for (field, value) in fields {
                if let Some(value) = value {
                    store.set_profile_field(field, &value)?;
                }
            }
        }

        Ok(store)
    }
}
