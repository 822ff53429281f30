use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::{Path, PathBuf};
use tracing::info;

use reel_engine::config::{default_config_path, EngineConfig};
use reel_engine::content::RssArticleSource;
use reel_engine::llm::OpenRouterWriter;
use reel_engine::media::StockMediaSource;
use reel_engine::publish::{Publisher, SimulatedPublisher};
use reel_engine::render::{FfmpegComposer, RendererRegistry};
use reel_engine::{
    is_analysis_due, run_scheduled_analysis, Collaborators, EngineError, Pipeline, PostLog,
    ReportWriter, RunOutcome, ScheduledAnalysis, StateStore,
};

#[derive(Parser)]
#[command(name = "reel-engine", about = "News-to-reel generator with adaptive style selection")]
struct Cli {
    /// TOML config file (defaults to $REEL_CONFIG_PATH or config/reel_engine.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Produce one reel
    Run(RunArgs),
    /// Run the performance analysis now
    Analyze(AnalyzeArgs),
    /// Print the persisted state
    Status,
    /// Write the default config file
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone, Default)]
struct RunArgs {
    #[arg(long)]
    seed: Option<u64>,
    /// Model id passed to OpenRouter
    #[arg(long)]
    model: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct AnalyzeArgs {
    /// Ignore the analysis interval
    #[arg(long)]
    force: bool,
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(long)]
    path: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), EngineError> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Command::Run(RunArgs::default()));

    match command {
        Command::InitConfig(args) => init_config(args.path.or(cli.config)),
        command => {
            let (config, path) = EngineConfig::load(cli.config)?;
            match path {
                Some(path) if path.exists() => info!("Loaded config from {}", path.display()),
                _ => info!("Using built-in config"),
            }
            match command {
                Command::Run(args) => run_pipeline(config, args).await,
                Command::Analyze(args) => analyze(config, args),
                Command::Status => status(&config),
                Command::InitConfig(_) => Ok(()),
            }
        }
    }
}

async fn run_pipeline(config: EngineConfig, args: RunArgs) -> Result<(), EngineError> {
    let mut rng = rng_from(args.seed);

    let articles = RssArticleSource::new(config.categories.clone())?;
    let writer = OpenRouterWriter::from_env(args.model)?;
    let media = StockMediaSource::from_env(
        config.paths.media_cache_dir.clone(),
        config.paths.audio_dir.clone(),
    );
    let composer = FfmpegComposer::new(
        RendererRegistry::with_defaults(),
        config.reel.clone(),
        config.paths.logo_path.clone(),
    );
    let publisher: Option<Box<dyn Publisher>> = if config.publish.enabled {
        Some(Box::new(SimulatedPublisher))
    } else {
        None
    };

    let pipeline = Pipeline::new(
        config,
        Collaborators {
            articles: Box::new(articles),
            writer: Box::new(writer),
            media: Box::new(media),
            composer: Box::new(composer),
            publisher,
        },
    );

    match pipeline.run_once(&mut rng, Utc::now()).await? {
        RunOutcome::Completed(run) => {
            println!("Reel ready: {}", run.video_path.display());
            println!("Post ID: {}", run.post_id);
            println!(
                "Category: {} | Story: {} | Edit: {}",
                run.category, run.story_key, run.edit_key
            );
            if let Some(url) = run.published_url {
                println!("Published: {}", url);
            }
        }
        RunOutcome::Aborted { stage, reason } => {
            println!("Run stopped at {}: {}", stage, reason);
        }
    }
    Ok(())
}

fn analyze(config: EngineConfig, args: AnalyzeArgs) -> Result<(), EngineError> {
    let mut rng = rng_from(args.seed);
    let now = Utc::now();
    let store = StateStore::new(config.paths.state_file());
    let posts = PostLog::new(config.paths.posts_file());
    let report = ReportWriter::new(config.paths.report_file());

    let mut state = store.load(&config, &mut rng, now)?;
    match run_scheduled_analysis(&mut state, &posts, &report, &config, now, args.force)? {
        ScheduledAnalysis::NotDue => {
            println!("Analysis not due yet (use --force to run it anyway)");
        }
        ScheduledAnalysis::Skipped {
            available,
            required,
        } => {
            println!("Not enough data: {} posts, need {}", available, required);
        }
        ScheduledAnalysis::Completed(result) => {
            store.save(&state)?;
            println!("Best story style: {}", result.best_story_style);
            println!("Best edit style: {}", result.best_edit_style);
            for entry in &result.story_performance {
                println!("  story {}: {:.2} ({} posts)", entry.style, entry.average_score, entry.posts);
            }
            for entry in &result.edit_performance {
                println!("  edit {}: {:.2} ({} posts)", entry.style, entry.average_score, entry.posts);
            }
            println!("Report written to {}", report.path().display());
        }
    }
    Ok(())
}

fn status(config: &EngineConfig) -> Result<(), EngineError> {
    let store = StateStore::new(config.paths.state_file());
    if !store.path().exists() {
        println!("No state at {} yet; the first run creates it", store.path().display());
        return Ok(());
    }
    let now = Utc::now();
    let state = store.load(config, &mut StdRng::from_entropy(), now)?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    println!(
        "Analysis due: {}",
        is_analysis_due(&state, now, config.analysis.interval_days)
    );
    let posts = PostLog::new(config.paths.posts_file()).load()?;
    println!("Logged posts: {}", posts.len());
    Ok(())
}

fn init_config(path: Option<PathBuf>) -> Result<(), EngineError> {
    let path = path
        .or_else(default_config_path)
        .ok_or_else(|| EngineError::Configuration("no config path given".into()))?;
    if path.exists() {
        return Err(EngineError::Configuration(format!(
            "{} already exists",
            path.display()
        )));
    }
    EngineConfig::default().write(&path)?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
