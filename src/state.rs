use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::analysis::AnalysisResult;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};

/// Cross-run memory of the engine. One document per deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    pub run_count: u64,
    pub category_cycle_index: u64,
    pub last_analysis_timestamp: Option<DateTime<Utc>>,
    pub best_performing_story_style: String,
    pub best_performing_edit_style: String,
    pub last_story_key: Option<String>,
}

impl PersistedState {
    /// Zero counters and a random pick from each style catalog.
    pub fn defaults<R: Rng + ?Sized>(config: &EngineConfig, rng: &mut R) -> Result<Self> {
        let story = config
            .story_styles
            .choose(rng)
            .ok_or_else(|| EngineError::Configuration("no storytelling styles configured".into()))?;
        let edit = config
            .edit_styles
            .choose(rng)
            .ok_or_else(|| EngineError::Configuration("no editing styles configured".into()))?;

        Ok(Self {
            run_count: 0,
            category_cycle_index: 0,
            last_analysis_timestamp: None,
            best_performing_story_style: story.key.clone(),
            best_performing_edit_style: edit.key.clone(),
            last_story_key: None,
        })
    }

    pub fn record_completed_run(&mut self) {
        self.run_count += 1;
        self.category_cycle_index += 1;
    }

    /// Installs the highest ranked styles that still exist in the catalogs and
    /// advances the analysis timestamp. The timestamp never moves backwards.
    pub fn apply_analysis(
        &mut self,
        result: &AnalysisResult,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) {
        match result
            .story_performance
            .iter()
            .find(|entry| config.story_style(&entry.style).is_some())
        {
            Some(entry) => self.best_performing_story_style = entry.style.clone(),
            None => warn!(
                "No analysed story style is in the catalog, keeping '{}'",
                self.best_performing_story_style
            ),
        }
        match result
            .edit_performance
            .iter()
            .find(|entry| config.edit_style(&entry.style).is_some())
        {
            Some(entry) => self.best_performing_edit_style = entry.style.clone(),
            None => warn!(
                "No analysed edit style is in the catalog, keeping '{}'",
                self.best_performing_edit_style
            ),
        }

        self.last_analysis_timestamp = Some(match self.last_analysis_timestamp {
            Some(previous) if previous > now => previous,
            _ => now,
        });
        info!(
            "State updated with best styles - story='{}', edit='{}'",
            self.best_performing_story_style, self.best_performing_edit_style
        );
    }

    /// Replaces best styles that were removed from the catalog.
    fn repair_styles<R: Rng + ?Sized>(&mut self, config: &EngineConfig, rng: &mut R) {
        if config.story_style(&self.best_performing_story_style).is_none() {
            if let Some(style) = config.story_styles.choose(rng) {
                warn!(
                    "Stored story style '{}' is not configured, replacing with '{}'",
                    self.best_performing_story_style, style.key
                );
                self.best_performing_story_style = style.key.clone();
            }
        }
        if config.edit_style(&self.best_performing_edit_style).is_none() {
            if let Some(style) = config.edit_styles.choose(rng) {
                warn!(
                    "Stored edit style '{}' is not configured, replacing with '{}'",
                    self.best_performing_edit_style, style.key
                );
                self.best_performing_edit_style = style.key.clone();
            }
        }
    }
}

pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state document merged over fresh defaults.
    ///
    /// A missing document is a first run: the defaults get `now` as their
    /// analysis timestamp and are written straight away. A malformed document
    /// is logged and replaced in memory by the defaults.
    pub fn load<R: Rng + ?Sized>(
        &self,
        config: &EngineConfig,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<PersistedState> {
        let defaults = PersistedState::defaults(config, rng)?;

        if !self.path.exists() {
            info!("No state file found at {}, initializing new state", self.path.display());
            let mut state = defaults;
            state.last_analysis_timestamp = Some(now);
            self.save(&state)?;
            return Ok(state);
        }

        let mut state = match self.read_merged(&defaults) {
            Ok(state) => {
                info!("State loaded - run_count={}", state.run_count);
                state
            }
            Err(err) => {
                warn!("Error loading state, using defaults: {}", err);
                defaults
            }
        };
        state.repair_styles(config, rng);
        Ok(state)
    }

    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(state)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)?;
        std::fs::rename(&tmp_path, &self.path)?;
        debug!("State saved to {}", self.path.display());
        Ok(())
    }

    fn read_merged(&self, defaults: &PersistedState) -> Result<PersistedState> {
        let data = std::fs::read_to_string(&self.path)
            .map_err(|err| EngineError::MalformedState(format!("failed to read: {}", err)))?;
        let stored: serde_json::Value = serde_json::from_str(&data)
            .map_err(|err| EngineError::MalformedState(format!("failed to parse: {}", err)))?;
        let serde_json::Value::Object(stored) = stored else {
            return Err(EngineError::MalformedState(
                "document is not a JSON object".into(),
            ));
        };

        let mut merged = serde_json::to_value(defaults)?;
        if let serde_json::Value::Object(fields) = &mut merged {
            fields.extend(stored);
        }
        serde_json::from_value(merged)
            .map_err(|err| EngineError::MalformedState(format!("invalid fields: {}", err)))
    }
}
