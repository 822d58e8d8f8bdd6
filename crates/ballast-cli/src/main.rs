//! `ballast` seeder binary.
//!
//! Reads `ballast.toml` (or the path given with `--config`), opens an
//! SQLite-backed seed store and runs the users → topics → posts pipeline
//! against it, printing a dot meter while it works.
//!
//! ```text
//! ballast --users 10 --topics 100 --posts-per-topic 1000 --store seed.db
//! BALLAST_TOPICS=5 ballast --dry-run
//! ```

mod meter;

use std::{
  path::{Path, PathBuf},
  process::ExitCode,
  sync::Arc,
};

use anyhow::Context as _;
use ballast_core::{
  blueprint::{BlueprintOptions, BlueprintSet},
  factory::EntityFactory,
  sequence::Sequence,
  store::{MemoryStore, SeedStore},
};
use ballast_pipeline::{RunPlan, RunReport, Seeder};
use ballast_store_sqlite::SqliteStore;
use clap::Parser;
use meter::DotMeter;
use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Synthetic forum-data seeder")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "ballast.toml")]
  config: PathBuf,

  /// How many users to create.
  #[arg(long)]
  users: Option<usize>,

  /// How many topics to create.
  #[arg(long)]
  topics: Option<usize>,

  /// How many posts to chain onto each topic.
  #[arg(long)]
  posts_per_topic: Option<usize>,

  /// SQLite file to seed.
  #[arg(long)]
  store: Option<PathBuf>,

  /// Run against a throwaway in-memory store instead of SQLite.
  #[arg(long)]
  dry_run: bool,
}

/// File and environment configuration, layered under the CLI flags.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct RunConfig {
  users:               usize,
  topics:              usize,
  posts_per_topic:     usize,
  store_path:          PathBuf,
  unique_topic_titles: bool,
}

impl Default for RunConfig {
  fn default() -> Self {
    Self {
      users:               10,
      topics:              100,
      posts_per_topic:     1000,
      store_path:          PathBuf::from("ballast.db"),
      unique_topic_titles: true,
    }
  }
}

#[tokio::main]
async fn main() -> ExitCode {
  // Initialise tracing. Logs go to stderr so the dot meter owns stdout.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  match run().await {
    Ok(report) => {
      println!(
        "DONE: {} users, {} topics, {} posts in {:.2?}",
        report.users, report.topics, report.posts, report.elapsed
      );
      ExitCode::SUCCESS
    }
    Err(error) => {
      eprintln!("FAIL: {error:#}");
      ExitCode::FAILURE
    }
  }
}

async fn run() -> anyhow::Result<RunReport> {
  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.clone()).required(false))
    .add_source(config::Environment::with_prefix("BALLAST"))
    .build()
    .context("failed to read config file")?;

  let file_cfg: RunConfig = settings
    .try_deserialize()
    .context("failed to deserialise RunConfig")?;

  // Flags override file and environment values.
  let plan = RunPlan {
    users:           cli.users.unwrap_or(file_cfg.users),
    topics:          cli.topics.unwrap_or(file_cfg.topics),
    posts_per_topic: cli.posts_per_topic.unwrap_or(file_cfg.posts_per_topic),
  };

  let blueprints = BlueprintSet::standard(BlueprintOptions {
    unique_topic_titles: file_cfg.unique_topic_titles,
  });
  let factory =
    EntityFactory::new(blueprints, Arc::new(Sequence::seeded_from_clock()));
  let meter = Arc::new(DotMeter::new());

  tracing::info!(
    users = plan.users,
    topics = plan.topics,
    posts_per_topic = plan.posts_per_topic,
    dry_run = cli.dry_run,
    "starting run"
  );

  if cli.dry_run {
    seed(plan, Arc::new(MemoryStore::new()), factory, meter).await
  } else {
    let store_path = expand_tilde(&cli.store.unwrap_or(file_cfg.store_path));
    let store = SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?;
    seed(plan, Arc::new(store), factory, meter).await
  }
}

async fn seed<S: SeedStore + 'static>(
  plan: RunPlan,
  store: Arc<S>,
  factory: EntityFactory,
  meter: Arc<DotMeter>,
) -> anyhow::Result<RunReport> {
  let seeder = Seeder::new(plan, store, factory).with_progress(meter.clone());
  let result = seeder.run().await;
  meter.finish();
  Ok(result?)
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
