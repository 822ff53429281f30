use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::Result;

/// One row of the post log. Column names are fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    #[serde(rename = "Post_ID")]
    pub post_id: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Story_Style")]
    pub story_style: String,
    #[serde(rename = "Editing_Style")]
    pub edit_style: String,
    #[serde(rename = "Hook")]
    pub hook: String,
    #[serde(rename = "Caption")]
    pub caption: String,
    #[serde(rename = "Hashtags")]
    pub hashtags: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "Views")]
    pub views: u64,
    #[serde(rename = "Likes")]
    pub likes: u64,
    #[serde(rename = "Comments")]
    pub comments: u64,
    #[serde(rename = "Shares")]
    pub shares: u64,
}

/// Synthetic engagement counters standing in for real platform analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulatedMetrics {
    pub views: u64,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl SimulatedMetrics {
    pub fn sample<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            views: rng.gen_range(5_000..=25_000),
            likes: rng.gen_range(200..=2_000),
            comments: rng.gen_range(20..=150),
            shares: rng.gen_range(10..=100),
        }
    }
}

pub struct PostDraft {
    pub post_id: String,
    pub category: String,
    pub story_style: String,
    pub edit_style: String,
    pub hook: String,
    pub caption: String,
    pub hashtags: Vec<String>,
}

impl PostRecord {
    pub fn from_draft(draft: PostDraft, timestamp: DateTime<Utc>, metrics: SimulatedMetrics) -> Self {
        Self {
            post_id: draft.post_id,
            category: draft.category,
            story_style: draft.story_style,
            edit_style: draft.edit_style,
            hook: draft.hook,
            caption: draft.caption,
            hashtags: draft.hashtags.join(" "),
            timestamp,
            views: metrics.views,
            likes: metrics.likes,
            comments: metrics.comments,
            shares: metrics.shares,
        }
    }
}

/// Append-only table of post records. Every append rewrites the whole file,
/// which is fine at one row per run.
pub struct PostLog {
    path: PathBuf,
}

impl PostLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<PostRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = std::fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    pub fn append(&self, record: PostRecord) -> Result<()> {
        let mut records = self.load()?;
        let post_id = record.post_id.clone();
        records.push(record);
        self.persist(&records)?;
        debug!("Post log now holds {} records (appended {})", records.len(), post_id);
        Ok(())
    }

    fn persist(&self, records: &[PostRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(records)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
