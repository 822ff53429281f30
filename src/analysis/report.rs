use std::path::{Path, PathBuf};
use tracing::info;

use crate::analysis::AnalysisResult;
use crate::error::Result;

pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, result: &AnalysisResult) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let payload = serde_json::to_string_pretty(result)?;
        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, payload)?;
        std::fs::rename(&tmp_path, &self.path)?;
        info!("Analysis report written to {}", self.path.display());
        Ok(())
    }
}
