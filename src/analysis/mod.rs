pub mod aggregate;
pub mod report;
pub mod schedule;

pub use aggregate::{
    run_analysis, AnalysisOutcome, AnalysisResult, EngagementWeights, StylePerformance,
};
pub use report::ReportWriter;
pub use schedule::{is_analysis_due, run_scheduled_analysis, ScheduledAnalysis};
