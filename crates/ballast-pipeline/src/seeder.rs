//! The three-stage generation run: users, then topics, then post chains.

use std::{sync::Arc, time::Instant};

use ballast_core::{
  entity::{EntityKind, FieldMap, FieldValue, PersistedEntity},
  factory::EntityFactory,
  rotation::RoundRobin,
  store::SeedStore,
};
use tracing::info;

use crate::{
  chain::run_chain,
  progress::{NullProgress, Progress},
  stage::run_stage,
  Result, RunError,
};

// ─── Stages ──────────────────────────────────────────────────────────────────

/// The strictly ordered stages of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
  Users,
  Topics,
  Posts,
}

impl std::fmt::Display for Stage {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(match self {
      Self::Users => "creating users",
      Self::Topics => "creating topics",
      Self::Posts => "creating posts",
    })
  }
}

// ─── Plan and report ─────────────────────────────────────────────────────────

/// How much to create.
#[derive(Debug, Clone, Copy)]
pub struct RunPlan {
  pub users:           usize,
  pub topics:          usize,
  pub posts_per_topic: usize,
}

/// What a completed run produced.
#[derive(Debug, Clone, Copy)]
pub struct RunReport {
  pub users:   usize,
  pub topics:  usize,
  pub posts:   usize,
  pub elapsed: std::time::Duration,
}

// ─── Seeder ──────────────────────────────────────────────────────────────────

/// Orchestrates the users → topics → posts pipeline.
///
/// A stage begins only once the previous stage has produced its full result
/// list, and the first failure anywhere is the run's terminal result: no
/// further stage starts. Within a stage every task runs at once. In-flight
/// siblings of a failed task finish rather than being cancelled, so the
/// store may hold their writes after a failed run; partially seeded data is
/// part of the contract, not an accident.
pub struct Seeder<S> {
  plan:     RunPlan,
  store:    Arc<S>,
  factory:  Arc<EntityFactory>,
  progress: Arc<dyn Progress>,
}

impl<S: SeedStore + 'static> Seeder<S> {
  pub fn new(plan: RunPlan, store: Arc<S>, factory: EntityFactory) -> Self {
    Self {
      plan,
      store,
      factory: Arc::new(factory),
      progress: Arc::new(NullProgress),
    }
  }

  /// Replace the progress sink.
  pub fn with_progress(mut self, progress: Arc<dyn Progress>) -> Self {
    self.progress = progress;
    self
  }

  /// Run the pipeline to completion or to its first failure.
  pub async fn run(&self) -> Result<RunReport, RunError> {
    let started = Instant::now();

    let users = self
      .users_stage()
      .await
      .map_err(|source| RunError { stage: Stage::Users, source })?;
    info!(created = users.len(), "users stage complete");

    let topics = self
      .topics_stage(&users)
      .await
      .map_err(|source| RunError { stage: Stage::Topics, source })?;
    info!(created = topics.len(), "topics stage complete");

    let posts = self
      .posts_stage(&users, &topics)
      .await
      .map_err(|source| RunError { stage: Stage::Posts, source })?;
    info!(created = posts, "posts stage complete");

    Ok(RunReport {
      users:   users.len(),
      topics:  topics.len(),
      posts,
      elapsed: started.elapsed(),
    })
  }

  async fn users_stage(&self) -> Result<Vec<PersistedEntity>> {
    self.progress.stage_started(Stage::Users);
    info!(amount = self.plan.users, "{}", Stage::Users);

    run_stage(self.plan.users, |_index| {
      let store = Arc::clone(&self.store);
      let factory = Arc::clone(&self.factory);
      let progress = Arc::clone(&self.progress);
      async move {
        let pending = factory.create(EntityKind::User, FieldMap::new())?;
        let user = factory.persist(store.as_ref(), pending).await?;
        progress.created(EntityKind::User);
        Ok(user)
      }
    })
    .await
  }

  async fn topics_stage(
    &self,
    users: &[PersistedEntity],
  ) -> Result<Vec<PersistedEntity>> {
    self.progress.stage_started(Stage::Topics);
    info!(amount = self.plan.topics, "{}", Stage::Topics);
    if self.plan.topics == 0 {
      return Ok(Vec::new());
    }

    let authors = Arc::new(RoundRobin::new(users.to_vec())?);

    run_stage(self.plan.topics, |_index| {
      let store = Arc::clone(&self.store);
      let factory = Arc::clone(&self.factory);
      let progress = Arc::clone(&self.progress);
      let authors = Arc::clone(&authors);
      async move {
        let mut pending = factory.create(EntityKind::Topic, FieldMap::new())?;
        pending.link("author", authors.next());
        let topic = factory.persist(store.as_ref(), pending).await?;
        progress.created(EntityKind::Topic);
        Ok(topic)
      }
    })
    .await
  }

  /// One chain of dependent posts per topic, all chains in parallel.
  ///
  /// Post authors are drawn from a single rotation shared by every chain, so
  /// authorship is spread over the whole user list rather than per chain.
  async fn posts_stage(
    &self,
    users: &[PersistedEntity],
    topics: &[PersistedEntity],
  ) -> Result<usize> {
    self.progress.stage_started(Stage::Posts);
    info!(
      chains = topics.len(),
      per_topic = self.plan.posts_per_topic,
      "{}",
      Stage::Posts
    );
    if topics.is_empty() || self.plan.posts_per_topic == 0 {
      return Ok(0);
    }

    let authors = Arc::new(RoundRobin::new(users.to_vec())?);
    let per_topic = self.plan.posts_per_topic;

    let chains = run_stage(topics.len(), |index| {
      let topic = topics[index].clone();
      let store = Arc::clone(&self.store);
      let factory = Arc::clone(&self.factory);
      let progress = Arc::clone(&self.progress);
      let authors = Arc::clone(&authors);
      async move {
        run_chain(per_topic, None, |_step, parent: Option<PersistedEntity>| {
          let store = Arc::clone(&store);
          let factory = Arc::clone(&factory);
          let progress = Arc::clone(&progress);
          let authors = Arc::clone(&authors);
          let topic = topic.clone();
          async move {
            let author = authors.next();

            let mut overrides = FieldMap::new();
            overrides.insert(
              "author_name".into(),
              FieldValue::text(author.text_field("name").unwrap_or_default()),
            );
            overrides
              .insert("author_id".into(), FieldValue::Int(author.id.0 as i64));

            let mut pending = factory.create(EntityKind::Post, overrides)?;
            pending.link("author", author);
            pending.link("topic", &topic);
            if let Some(parent) = &parent {
              pending.link("parent", parent);
            }

            let post = factory.persist(store.as_ref(), pending).await?;
            progress.created(EntityKind::Post);
            Ok(post)
          }
        })
        .await
      }
    })
    .await?;

    Ok(chains.iter().map(Vec::len).sum())
  }
}
