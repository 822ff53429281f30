use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};

use reel_engine::config::EngineConfig;
use reel_engine::content::{Article, ArticleSource};
use reel_engine::llm::{Script, ScriptWriter};
use reel_engine::media::{MediaAsset, MediaSource};
use reel_engine::posts::{PostDraft, SimulatedMetrics};
use reel_engine::publish::SimulatedPublisher;
use reel_engine::render::{ComposeRequest, VideoComposer};
use reel_engine::{
    Collaborators, EngineError, Pipeline, PersistedState, PostLog, PostRecord, RunOutcome, Stage,
    StateStore,
};

struct StubArticles {
    fail: bool,
}

#[async_trait]
impl ArticleSource for StubArticles {
    async fn fetch_article(&self, category: &str) -> reel_engine::Result<Article> {
        if self.fail {
            return Err(EngineError::unavailable(Stage::Article, "feed was empty"));
        }
        Ok(Article {
            title: format!("{} news", category),
            summary: "A lab shipped a model that writes its own tests.".to_string(),
            link: None,
            source_name: "Example Wire".to_string(),
        })
    }
}

struct StubWriter {
    caption: String,
    hashtags: Vec<String>,
}

impl Default for StubWriter {
    fn default() -> Self {
        Self {
            caption: "Big news. Source: Example Wire".to_string(),
            hashtags: vec!["#AI".to_string(), "#Tech".to_string()],
        }
    }
}

#[async_trait]
impl ScriptWriter for StubWriter {
    async fn generate_script(&self, _article: &str, _style: &str) -> reel_engine::Result<Script> {
        Ok(Script {
            hook: "Your tests just wrote themselves".to_string(),
            revelation: "A new model ships code with its own test suite".to_string(),
        })
    }

    async fn generate_caption(
        &self,
        _script: &Script,
        _source_name: &str,
        credit: Option<&str>,
    ) -> reel_engine::Result<String> {
        assert_eq!(credit, Some("Video by Ana, Music by Night Drive"));
        Ok(self.caption.clone())
    }

    async fn generate_hashtags(&self, _topic: &str) -> reel_engine::Result<Vec<String>> {
        Ok(self.hashtags.clone())
    }
}

struct StubMedia;

#[async_trait]
impl MediaSource for StubMedia {
    async fn fetch_video(&self, query: &str) -> reel_engine::Result<MediaAsset> {
        assert!(query.starts_with("abstract technology "));
        Ok(MediaAsset {
            path: PathBuf::from("clip.mp4"),
            credit: "Ana".to_string(),
        })
    }

    async fn fetch_music(&self, _query: &str) -> reel_engine::Result<MediaAsset> {
        Ok(MediaAsset {
            path: PathBuf::from("track.mp3"),
            credit: "Night Drive".to_string(),
        })
    }
}

struct StubComposer;

#[async_trait]
impl VideoComposer for StubComposer {
    async fn compose(&self, request: ComposeRequest<'_>) -> reel_engine::Result<PathBuf> {
        Ok(request.output.to_path_buf())
    }
}

fn config_in(dir: &Path) -> EngineConfig {
    let mut config = EngineConfig::default();
    config.paths.data_dir = dir.join("data");
    config.paths.video_dir = dir.join("videos");
    config
}

fn collaborators(articles: StubArticles, writer: StubWriter) -> Collaborators {
    Collaborators {
        articles: Box::new(articles),
        writer: Box::new(writer),
        media: Box::new(StubMedia),
        composer: Box::new(StubComposer),
        publisher: None,
    }
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
}

fn load_state(config: &EngineConfig) -> PersistedState {
    StateStore::new(config.paths.state_file())
        .load(config, &mut StdRng::seed_from_u64(0), now())
        .unwrap()
}

#[tokio::test]
async fn completed_runs_advance_counters_and_log_posts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(
        config.clone(),
        collaborators(StubArticles { fail: false }, StubWriter::default()),
    );
    let mut rng = StdRng::seed_from_u64(21);

    for run in 0..3u64 {
        let outcome = pipeline.run_once(&mut rng, now()).await.unwrap();
        let RunOutcome::Completed(completed) = outcome else {
            panic!("run {} did not complete", run);
        };
        let category = &config.categories[run as usize].name;
        assert_eq!(&completed.category, category);
        assert_eq!(completed.post_id, format!("{}_{}", category.replace(' ', ""), run));
        assert_eq!(
            completed.video_path,
            config.paths.video_dir.join(format!("{}.mp4", completed.post_id))
        );
        assert_eq!(completed.published_url, None);
    }

    let state = load_state(&config);
    assert_eq!(state.run_count, 3);
    assert_eq!(state.category_cycle_index, 3);
    assert!(state.last_story_key.is_some());

    let posts = PostLog::new(config.paths.posts_file()).load().unwrap();
    assert_eq!(posts.len(), 3);
    assert_eq!(posts[0].post_id, "ArtificialIntelligence_0");
    assert_eq!(posts[0].hashtags, "#AI #Tech");
    assert_eq!(posts[0].timestamp, now());
    assert!((5_000..=25_000).contains(&posts[0].views));
    assert!((200..=2_000).contains(&posts[0].likes));
    assert!((20..=150).contains(&posts[0].comments));
    assert!((10..=100).contains(&posts[0].shares));
}

#[tokio::test]
async fn failed_article_fetch_leaves_counters_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let pipeline = Pipeline::new(
        config.clone(),
        collaborators(StubArticles { fail: true }, StubWriter::default()),
    );

    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(1), now())
        .await
        .unwrap();
    assert_eq!(
        outcome,
        RunOutcome::Aborted {
            stage: Stage::Article,
            reason: "feed was empty".to_string()
        }
    );

    let state = load_state(&config);
    assert_eq!(state.run_count, 0);
    assert_eq!(state.category_cycle_index, 0);
    assert!(!config.paths.posts_file().exists());
}

#[tokio::test]
async fn empty_caption_or_hashtags_abort_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let writer = StubWriter {
        caption: "   ".to_string(),
        ..StubWriter::default()
    };
    let pipeline = Pipeline::new(config.clone(), collaborators(StubArticles { fail: false }, writer));
    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(2), now())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Aborted { stage: Stage::Caption, .. }));

    let writer = StubWriter {
        hashtags: Vec::new(),
        ..StubWriter::default()
    };
    let pipeline = Pipeline::new(config.clone(), collaborators(StubArticles { fail: false }, writer));
    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(3), now())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Aborted { stage: Stage::Hashtags, .. }));

    assert_eq!(load_state(&config).run_count, 0);
}

#[tokio::test]
async fn publishing_returns_simulated_url() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let mut collaborators = collaborators(StubArticles { fail: false }, StubWriter::default());
    collaborators.publisher = Some(Box::new(SimulatedPublisher));
    let pipeline = Pipeline::new(config, collaborators);

    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(4), now())
        .await
        .unwrap();
    let RunOutcome::Completed(completed) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(
        completed.published_url.as_deref(),
        Some("http://fake.cloudinary.com/ArtificialIntelligence_0.mp4")
    );
}

#[tokio::test]
async fn due_analysis_runs_before_selection() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.selection.exploit_probability = 1.0;
    let winner = config.story_styles[2].key.clone();
    let loser = config.story_styles[0].key.clone();
    let edit = config.edit_styles[0].key.clone();

    let posts = PostLog::new(config.paths.posts_file());
    for (index, (story, likes)) in [(&winner, 900), (&loser, 10), (&winner, 800), (&loser, 20), (&loser, 30)]
        .into_iter()
        .enumerate()
    {
        posts
            .append(PostRecord::from_draft(
                PostDraft {
                    post_id: format!("seed_{}", index),
                    category: "Startups".to_string(),
                    story_style: story.clone(),
                    edit_style: edit.clone(),
                    hook: "hook".to_string(),
                    caption: "caption".to_string(),
                    hashtags: vec!["#x".to_string()],
                },
                now() - Duration::days(10),
                SimulatedMetrics {
                    views: 5_000,
                    likes,
                    comments: 20,
                    shares: 10,
                },
            ))
            .unwrap();
    }

    let store = StateStore::new(config.paths.state_file());
    let mut state = PersistedState::defaults(&config, &mut StdRng::seed_from_u64(5)).unwrap();
    state.best_performing_story_style = loser.clone();
    state.last_analysis_timestamp = Some(now() - Duration::days(7));
    store.save(&state).unwrap();

    let pipeline = Pipeline::new(
        config.clone(),
        collaborators(StubArticles { fail: false }, StubWriter::default()),
    );
    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(6), now())
        .await
        .unwrap();
    let RunOutcome::Completed(completed) = outcome else {
        panic!("run did not complete");
    };
    assert_eq!(completed.story_key, winner);

    let saved = load_state(&config);
    assert_eq!(saved.best_performing_story_style, winner);
    assert_eq!(saved.last_analysis_timestamp, Some(now()));
    assert!(config.paths.report_file().exists());
}

#[tokio::test]
async fn analysis_survives_an_aborted_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let posts = PostLog::new(config.paths.posts_file());
    for index in 0..5 {
        posts
            .append(PostRecord::from_draft(
                PostDraft {
                    post_id: format!("seed_{}", index),
                    category: "Startups".to_string(),
                    story_style: config.story_styles[1].key.clone(),
                    edit_style: config.edit_styles[1].key.clone(),
                    hook: "hook".to_string(),
                    caption: "caption".to_string(),
                    hashtags: vec!["#x".to_string()],
                },
                now(),
                SimulatedMetrics {
                    views: 5_000,
                    likes: 300,
                    comments: 30,
                    shares: 30,
                },
            ))
            .unwrap();
    }
    let store = StateStore::new(config.paths.state_file());
    let mut state = PersistedState::defaults(&config, &mut StdRng::seed_from_u64(7)).unwrap();
    state.last_analysis_timestamp = None;
    store.save(&state).unwrap();

    let pipeline = Pipeline::new(
        config.clone(),
        collaborators(StubArticles { fail: true }, StubWriter::default()),
    );
    let outcome = pipeline
        .run_once(&mut StdRng::seed_from_u64(8), now())
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Aborted { stage: Stage::Article, .. }));

    let saved = load_state(&config);
    assert_eq!(saved.run_count, 0);
    assert_eq!(saved.best_performing_story_style, config.story_styles[1].key);
    assert_eq!(saved.best_performing_edit_style, config.edit_styles[1].key);
    assert_eq!(saved.last_analysis_timestamp, Some(now()));
}
