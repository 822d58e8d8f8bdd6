//! Parallel fan-out with ordered fan-in and first-error reporting.

use std::future::Future;

use tokio::task::JoinSet;

use crate::{Error, Result};

/// Run `count` independent tasks concurrently and wait for all of them.
///
/// Every task is spawned up front; nothing throttles the batch beyond the
/// store's own write path. On success the results come back in submission
/// order, not completion order. On failure the stage reports the first
/// failure to *complete*; sibling tasks still finish before the stage
/// returns, so no write is left in flight, but their results are discarded.
pub async fn run_stage<T, F, Fut>(count: usize, mut task: F) -> Result<Vec<T>>
where
  T: Send + 'static,
  F: FnMut(usize) -> Fut,
  Fut: Future<Output = Result<T>> + Send + 'static,
{
  let mut tasks = JoinSet::new();
  for index in 0..count {
    let fut = task(index);
    tasks.spawn(async move { (index, fut.await) });
  }

  let mut done: Vec<(usize, T)> = Vec::with_capacity(count);
  let mut first_failure: Option<Error> = None;

  while let Some(joined) = tasks.join_next().await {
    match joined {
      Ok((index, Ok(value))) => done.push((index, value)),
      Ok((index, Err(source))) => {
        if first_failure.is_none() {
          first_failure = Some(Error::Task { index, source: Box::new(source) });
        }
      }
      Err(join_error) => {
        if first_failure.is_none() {
          first_failure = Some(Error::Panic(join_error.to_string()));
        }
      }
    }
  }

  if let Some(error) = first_failure {
    return Err(error);
  }

  done.sort_by_key(|(index, _)| *index);
  Ok(done.into_iter().map(|(_, value)| value).collect())
}
