pub mod analysis;
pub mod config;
pub mod content;
pub mod error;
pub mod llm;
pub mod media;
pub mod pipeline;
pub mod posts;
pub mod publish;
pub mod render;
pub mod selector;
pub mod state;

pub use analysis::{
    is_analysis_due, run_analysis, run_scheduled_analysis, AnalysisOutcome, AnalysisResult,
    EngagementWeights, ReportWriter, ScheduledAnalysis, StylePerformance,
};
pub use config::EngineConfig;
pub use error::{EngineError, Result, Stage};
pub use pipeline::{Collaborators, CompletedRun, Pipeline, RunOutcome};
pub use posts::{PostLog, PostRecord};
pub use selector::{select_category_and_story_style, select_editing_style};
pub use state::{PersistedState, StateStore};
