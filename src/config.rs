use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

use crate::analysis::EngagementWeights;
use crate::error::{EngineError, Result};
use crate::render::RendererKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySource {
    pub name: String,
    pub feed_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryStyle {
    pub key: String,
    pub prompt: String,
}

/// Editing style entry. `renderer` picks the implementation from the
/// render registry; the remaining fields are its parameter bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditStyle {
    pub key: String,
    pub description: String,
    pub renderer: RendererKind,
    pub font_hook: String,
    pub font_revelation: String,
    pub font_size_hook: u32,
    pub font_size_revelation: u32,
    pub text_color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlight_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_opacity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    pub exploit_probability: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            exploit_probability: 0.7,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub interval_days: u32,
    pub min_records: usize,
    pub weights: EngagementWeights,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            interval_days: 7,
            min_records: 5,
            weights: EngagementWeights::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub data_dir: PathBuf,
    pub video_dir: PathBuf,
    pub media_cache_dir: PathBuf,
    pub audio_dir: PathBuf,
    pub logo_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("output/data"),
            video_dir: PathBuf::from("output/videos"),
            media_cache_dir: PathBuf::from("temp_media"),
            audio_dir: PathBuf::from("audio"),
            logo_path: PathBuf::from("assets/NextGen_Signals_Logo.png"),
        }
    }
}

impl PathsConfig {
    pub fn state_file(&self) -> PathBuf {
        self.data_dir.join("state.json")
    }

    pub fn posts_file(&self) -> PathBuf {
        self.data_dir.join("all_posts.json")
    }

    pub fn report_file(&self) -> PathBuf {
        self.data_dir.join("weekly_analysis.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReelConfig {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
    pub music_volume: f64,
    pub logo_width: u32,
}

impl Default for ReelConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            duration_seconds: 12.0,
            music_volume: 0.4,
            logo_width: 280,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub selection: SelectionConfig,
    pub analysis: AnalysisConfig,
    pub paths: PathsConfig,
    pub reel: ReelConfig,
    pub publish: PublishConfig,
    pub categories: Vec<CategorySource>,
    pub story_styles: Vec<StoryStyle>,
    pub edit_styles: Vec<EditStyle>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            selection: SelectionConfig::default(),
            analysis: AnalysisConfig::default(),
            paths: PathsConfig::default(),
            reel: ReelConfig::default(),
            publish: PublishConfig::default(),
            categories: default_categories(),
            story_styles: default_story_styles(),
            edit_styles: default_edit_styles(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: Option<PathBuf>) -> Result<(Self, Option<PathBuf>)> {
        let config_path = path.or_else(default_config_path);
        let mut config = match config_path.as_ref() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(path).map_err(|err| {
                    EngineError::Configuration(format!("failed to read config: {}", err))
                })?;
                toml::from_str(&contents).map_err(|err| {
                    EngineError::Configuration(format!("failed to parse config: {}", err))
                })?
            }
            _ => EngineConfig::default(),
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok((config, config_path))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let payload = toml::to_string_pretty(self).map_err(|err| {
            EngineError::Configuration(format!("failed to serialize config: {}", err))
        })?;
        std::fs::write(path, payload)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.categories.is_empty() {
            return Err(EngineError::Configuration("no categories configured".into()));
        }
        if self.story_styles.is_empty() {
            return Err(EngineError::Configuration(
                "no storytelling styles configured".into(),
            ));
        }
        if self.edit_styles.is_empty() {
            return Err(EngineError::Configuration("no editing styles configured".into()));
        }
        ensure_unique("category", self.categories.iter().map(|c| c.name.as_str()))?;
        ensure_unique("story style", self.story_styles.iter().map(|s| s.key.as_str()))?;
        ensure_unique("edit style", self.edit_styles.iter().map(|s| s.key.as_str()))?;

        if self.analysis.interval_days == 0 {
            return Err(EngineError::Configuration(
                "analysis interval must be at least one day".into(),
            ));
        }
        let p = self.selection.exploit_probability;
        if !(0.0..=1.0).contains(&p) {
            return Err(EngineError::Configuration(format!(
                "exploit probability must be within [0, 1], got {}",
                p
            )));
        }
        Ok(())
    }

    pub fn story_style(&self, key: &str) -> Option<&StoryStyle> {
        self.story_styles.iter().find(|style| style.key == key)
    }

    pub fn edit_style(&self, key: &str) -> Option<&EditStyle> {
        self.edit_styles.iter().find(|style| style.key == key)
    }

    pub fn category(&self, name: &str) -> Option<&CategorySource> {
        self.categories.iter().find(|category| category.name == name)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(days) = env::var("REEL_ANALYSIS_INTERVAL_DAYS") {
            if let Ok(value) = days.trim().parse::<u32>() {
                self.analysis.interval_days = value;
            }
        }
        if let Ok(dir) = env::var("REEL_DATA_DIR") {
            if !dir.trim().is_empty() {
                self.paths.data_dir = PathBuf::from(dir);
            }
        }
        if let Ok(dir) = env::var("REEL_VIDEO_DIR") {
            if !dir.trim().is_empty() {
                self.paths.video_dir = PathBuf::from(dir);
            }
        }
    }
}

fn ensure_unique<'a>(label: &str, keys: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(EngineError::Configuration(format!(
                "duplicate {} key: {}",
                label, key
            )));
        }
    }
    Ok(())
}

pub fn default_config_path() -> Option<PathBuf> {
    env::var("REEL_CONFIG_PATH")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .or_else(|| Some(PathBuf::from("config/reel_engine.toml")))
}

fn default_categories() -> Vec<CategorySource> {
    [
        ("Artificial Intelligence", "https://www.technologyreview.com/topic/artificial-intelligence/feed/"),
        ("Startups", "https://techcrunch.com/category/startups/feed/"),
        ("Venture Capital", "https://a16z.com/feed/"),
        ("Future Tech", "https://hbr.org/topic/technology/feed"),
        ("Deep Dives", "https://waitbutwhy.com/feed"),
        ("Google AI Research", "https://ai.googleblog.com/feeds/posts/default?alt=rss"),
        ("OpenAI Updates", "https://openai.com/blog/rss.xml"),
        ("In-Depth Tech", "http://feeds.arstechnica.com/arstechnica/index"),
        ("AI News", "https://venturebeat.com/category/ai/feed/"),
        ("Tech & Business", "https://www.wired.com/category/business/feed"),
        ("Tech Innovation", "https://www.fastcompany.com/technology/rss"),
        ("Startup Accelerator", "https://blog.ycombinator.com/feed/"),
        ("VC Insights", "https://www.sequoiacap.com/feed/"),
        ("Entrepreneurship", "https://www.inc.com/rss/"),
        ("Societal Impact", "https://www.exponentialview.co/feed"),
    ]
    .into_iter()
    .map(|(name, feed_url)| CategorySource {
        name: name.to_string(),
        feed_url: feed_url.to_string(),
    })
    .collect()
}

fn default_story_styles() -> Vec<StoryStyle> {
    [
        ("what_if", "Generate a 'What if...?' hook and a revelation that explores a future possibility based on the text."),
        ("mind_blowing_fact", "Extract the single most mind-blowing fact or statistic and present it as a surprising revelation."),
        ("problem_solution", "Frame the content as a major problem and how the technology described is the solution."),
        ("historical_leap", "Present the technology as a monumental leap forward, comparing it to a major historical invention."),
    ]
    .into_iter()
    .map(|(key, prompt)| StoryStyle {
        key: key.to_string(),
        prompt: prompt.to_string(),
    })
    .collect()
}

fn default_edit_styles() -> Vec<EditStyle> {
    vec![
        EditStyle {
            key: "glassmorphism_center".to_string(),
            description: "A calm, semi-transparent card in the center of the screen.".to_string(),
            renderer: RendererKind::Glassmorphism,
            font_hook: "fonts/Poppins-Bold.ttf".to_string(),
            font_revelation: "fonts/Poppins-Regular.ttf".to_string(),
            font_size_hook: 85,
            font_size_revelation: 65,
            text_color: "#FFFFFF".to_string(),
            card_color: Some("#000000".to_string()),
            card_opacity: Some(0.3),
            highlight_color: None,
            background_opacity: None,
        },
        EditStyle {
            key: "kinetic_reveal".to_string(),
            description: "Fast-paced, word-by-word animated typography.".to_string(),
            renderer: RendererKind::KineticReveal,
            font_hook: "fonts/Poppins-Black.ttf".to_string(),
            font_revelation: "fonts/Poppins-Bold.ttf".to_string(),
            font_size_hook: 120,
            font_size_revelation: 90,
            text_color: "#FFFFFF".to_string(),
            card_color: None,
            card_opacity: None,
            highlight_color: Some("#00F5D4".to_string()),
            background_opacity: Some(0.4),
        },
    ]
}
