use chrono::{DateTime, Utc};
use rand::Rng;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::analysis::{run_scheduled_analysis, ReportWriter, ScheduledAnalysis};
use crate::config::EngineConfig;
use crate::content::ArticleSource;
use crate::error::{EngineError, Result, Stage};
use crate::llm::ScriptWriter;
use crate::media::MediaSource;
use crate::posts::{PostDraft, PostLog, PostRecord, SimulatedMetrics};
use crate::publish::Publisher;
use crate::render::{ComposeRequest, VideoComposer};
use crate::selector::{select_category_and_story_style, select_editing_style};
use crate::state::{PersistedState, StateStore};

const MUSIC_QUERY: &str = "upbeat electronic tech";
const DEFAULT_CREDIT: &str = "Pexels/Pixabay";

pub struct Collaborators {
    pub articles: Box<dyn ArticleSource>,
    pub writer: Box<dyn ScriptWriter>,
    pub media: Box<dyn MediaSource>,
    pub composer: Box<dyn VideoComposer>,
    pub publisher: Option<Box<dyn Publisher>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletedRun {
    pub post_id: String,
    pub category: String,
    pub story_key: String,
    pub edit_key: String,
    pub video_path: PathBuf,
    pub published_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed(CompletedRun),
    Aborted { stage: Stage, reason: String },
}

pub struct Pipeline {
    config: EngineConfig,
    store: StateStore,
    posts: PostLog,
    reports: ReportWriter,
    collaborators: Collaborators,
}

impl Pipeline {
    pub fn new(config: EngineConfig, collaborators: Collaborators) -> Self {
        let store = StateStore::new(config.paths.state_file());
        let posts = PostLog::new(config.paths.posts_file());
        let reports = ReportWriter::new(config.paths.report_file());
        Self {
            config,
            store,
            posts,
            reports,
            collaborators,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// One end-to-end invocation.
    ///
    /// Collaborator failures end the run as `Aborted` before the counters
    /// move. Only state and I/O errors of the engine itself come back as `Err`.
    pub async fn run_once<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome> {
        let mut state = self.store.load(&self.config, rng, now)?;
        self.maybe_analyze(&mut state, now)?;

        let story = select_category_and_story_style(&mut state, &self.config, rng)?;
        let edit = select_editing_style(&state, &self.config, rng)?;
        info!(
            "Category: {} | Story: '{}' | Edit: '{}'",
            story.category, story.story_key, edit.key
        );

        let c = &self.collaborators;
        let article = match c.articles.fetch_article(&story.category).await {
            Ok(article) => article,
            Err(err) => return Ok(abort(Stage::Article, err)),
        };

        info!("Generating script");
        let script = match c
            .writer
            .generate_script(&article.summary, &story.story_prompt)
            .await
        {
            Ok(script) => script,
            Err(err) => return Ok(abort(Stage::Script, err)),
        };
        info!("Hook: {} | Revelation: {}", script.hook, script.revelation);

        info!("Sourcing video and music");
        let video_query = format!("abstract technology {}", story.category);
        let video = match c.media.fetch_video(&video_query).await {
            Ok(video) => video,
            Err(err) => return Ok(abort(Stage::Media, err)),
        };
        let music = match c.media.fetch_music(MUSIC_QUERY).await {
            Ok(music) => music,
            Err(err) => return Ok(abort(Stage::Media, err)),
        };

        let post_id = format!("{}_{}", story.category.replace(' ', ""), state.run_count);
        if let Err(err) = std::fs::create_dir_all(&self.config.paths.video_dir) {
            return Ok(abort(Stage::Render, err.into()));
        }
        let output = self.config.paths.video_dir.join(format!("{}.mp4", post_id));
        info!("Composing video with '{}' style", edit.key);
        let video_path = match c
            .composer
            .compose(ComposeRequest {
                video: &video.path,
                music: &music.path,
                script: &script,
                style: &edit.style,
                output: &output,
            })
            .await
        {
            Ok(path) => path,
            Err(err) => return Ok(abort(Stage::Render, err)),
        };

        info!("Generating caption and hashtags");
        let credit = if !video.credit.is_empty() && !music.credit.is_empty() {
            format!("Video by {}, Music by {}", video.credit, music.credit)
        } else {
            DEFAULT_CREDIT.to_string()
        };
        let caption = match c
            .writer
            .generate_caption(&script, &article.source_name, Some(&credit))
            .await
        {
            Ok(caption) if !caption.trim().is_empty() => caption,
            Ok(_) => return Ok(empty(Stage::Caption, "caption was empty")),
            Err(err) => return Ok(abort(Stage::Caption, err)),
        };
        let topic = format!("{} {}", story.category, script.hook);
        let hashtags = match c.writer.generate_hashtags(&topic).await {
            Ok(tags) if !tags.is_empty() => tags,
            Ok(_) => return Ok(empty(Stage::Hashtags, "no hashtags returned")),
            Err(err) => return Ok(abort(Stage::Hashtags, err)),
        };

        let published_url = match c.publisher.as_ref() {
            Some(publisher) => match publisher.publish(&video_path, &post_id, &caption).await {
                Ok(receipt) => Some(receipt.video_url),
                Err(err) => return Ok(abort(Stage::Publish, err)),
            },
            None => None,
        };

        let record = PostRecord::from_draft(
            PostDraft {
                post_id: post_id.clone(),
                category: story.category.clone(),
                story_style: story.story_key.clone(),
                edit_style: edit.key.clone(),
                hook: script.hook.clone(),
                caption,
                hashtags,
            },
            now,
            SimulatedMetrics::sample(rng),
        );
        if let Err(err) = self.posts.append(record) {
            return Ok(abort(Stage::PostLog, err));
        }
        info!("Post data saved for {}", post_id);

        state.record_completed_run();
        self.store.save(&state)?;
        info!("Run complete - run_count={}", state.run_count);

        Ok(RunOutcome::Completed(CompletedRun {
            post_id,
            category: story.category,
            story_key: story.story_key,
            edit_key: edit.key,
            video_path,
            published_url,
        }))
    }

    /// Runs a due analysis and saves the updated state. A broken post log is
    /// logged and leaves the analysis due for the next invocation.
    fn maybe_analyze(&self, state: &mut PersistedState, now: DateTime<Utc>) -> Result<()> {
        match run_scheduled_analysis(state, &self.posts, &self.reports, &self.config, now, false) {
            Ok(ScheduledAnalysis::Completed(_)) => self.store.save(state),
            Ok(_) => Ok(()),
            Err(err) => {
                warn!("Analysis failed, will retry next run: {}", err);
                Ok(())
            }
        }
    }
}

fn empty(stage: Stage, reason: &str) -> RunOutcome {
    abort(stage, EngineError::unavailable(stage, reason))
}

fn abort(stage: Stage, err: EngineError) -> RunOutcome {
    let reason = match err {
        EngineError::CollaboratorUnavailable { reason, .. } => reason,
        other => other.to_string(),
    };
    warn!("Stopping run at {}: {}", stage, reason);
    RunOutcome::Aborted { stage, reason }
}
