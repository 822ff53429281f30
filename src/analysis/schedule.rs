use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::analysis::{run_analysis, AnalysisOutcome, AnalysisResult, ReportWriter};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::posts::PostLog;
use crate::state::PersistedState;

pub fn is_analysis_due(state: &PersistedState, now: DateTime<Utc>, interval_days: u32) -> bool {
    match state.last_analysis_timestamp {
        None => true,
        Some(last) => now.signed_duration_since(last) >= Duration::days(i64::from(interval_days)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScheduledAnalysis {
    NotDue,
    Skipped { available: usize, required: usize },
    Completed(AnalysisResult),
}

/// Runs the periodic analysis when it is due (or when `force` is set).
///
/// On completion the report is written and `state` is updated in memory; the
/// caller persists it. A skip leaves `state` untouched, so the next
/// invocation checks again.
pub fn run_scheduled_analysis(
    state: &mut PersistedState,
    posts: &PostLog,
    report: &ReportWriter,
    config: &EngineConfig,
    now: DateTime<Utc>,
    force: bool,
) -> Result<ScheduledAnalysis> {
    if !force && !is_analysis_due(state, now, config.analysis.interval_days) {
        return Ok(ScheduledAnalysis::NotDue);
    }

    info!("Running performance analysis");
    let records = posts.load()?;
    match run_analysis(&records, &config.analysis.weights, config.analysis.min_records) {
        AnalysisOutcome::Skipped {
            available,
            required,
        } => {
            info!(
                "Not enough data for analysis ({} posts). Needs at least {}.",
                available, required
            );
            Ok(ScheduledAnalysis::Skipped {
                available,
                required,
            })
        }
        AnalysisOutcome::Completed(result) => {
            info!(
                "Best story style: '{}' | Best edit style: '{}'",
                result.best_story_style, result.best_edit_style
            );
            report.write(&result)?;
            state.apply_analysis(&result, config, now);
            Ok(ScheduledAnalysis::Completed(result))
        }
    }
}
