use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::posts::PostRecord;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementWeights {
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self {
            likes: 0.2,
            comments: 0.5,
            shares: 0.3,
        }
    }
}

impl EngagementWeights {
    pub fn score(&self, record: &PostRecord) -> f64 {
        let mut score = 0.0;
        score += record.likes as f64 * self.likes;
        score += record.comments as f64 * self.comments;
        score += record.shares as f64 * self.shares;
        score
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StylePerformance {
    pub style: String,
    pub average_score: f64,
    pub posts: usize,
}

/// Per-style averages, each list ranked best first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub best_story_style: String,
    pub best_edit_style: String,
    #[serde(serialize_with = "serialize_ranked")]
    pub story_performance: Vec<StylePerformance>,
    #[serde(serialize_with = "serialize_ranked")]
    pub edit_performance: Vec<StylePerformance>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisOutcome {
    Skipped { available: usize, required: usize },
    Completed(AnalysisResult),
}

pub fn run_analysis(
    records: &[PostRecord],
    weights: &EngagementWeights,
    min_records: usize,
) -> AnalysisOutcome {
    let required = min_records.max(1);
    if records.len() < required {
        return AnalysisOutcome::Skipped {
            available: records.len(),
            required,
        };
    }

    let story_performance = rank_styles(records, weights, |record| &record.story_style);
    let edit_performance = rank_styles(records, weights, |record| &record.edit_style);

    // Both lists are non-empty because `records` is.
    let best_story_style = story_performance[0].style.clone();
    let best_edit_style = edit_performance[0].style.clone();

    AnalysisOutcome::Completed(AnalysisResult {
        best_story_style,
        best_edit_style,
        story_performance,
        edit_performance,
    })
}

/// Groups in first-seen order, then stable-sorts by average so ties keep
/// that order.
fn rank_styles<'a>(
    records: &'a [PostRecord],
    weights: &EngagementWeights,
    style_of: impl Fn(&'a PostRecord) -> &'a String,
) -> Vec<StylePerformance> {
    let mut groups: Vec<(&'a str, f64, usize)> = Vec::new();
    let mut index: HashMap<&'a str, usize> = HashMap::new();

    for record in records {
        let style = style_of(record).as_str();
        let score = weights.score(record);
        match index.get(style) {
            Some(&slot) => {
                groups[slot].1 += score;
                groups[slot].2 += 1;
            }
            None => {
                index.insert(style, groups.len());
                groups.push((style, score, 1));
            }
        }
    }

    let mut ranked: Vec<StylePerformance> = groups
        .into_iter()
        .map(|(style, total, posts)| StylePerformance {
            style: style.to_string(),
            average_score: total / posts as f64,
            posts,
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_score
            .partial_cmp(&a.average_score)
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

fn serialize_ranked<S: Serializer>(
    ranked: &[StylePerformance],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(ranked.iter().map(|entry| (&entry.style, entry.average_score)))
}
