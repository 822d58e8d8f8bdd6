//! Sequential creation of entities that each depend on their predecessor.

use std::future::Future;

use crate::{Error, Result};

/// Run `length` dependent steps strictly in order.
///
/// Each step receives the value produced by the step before it, because its
/// relations need the predecessor's store-assigned identity. The first step
/// receives `seed`, which is `None` when the chain starts from nothing. The
/// first failing step ends the chain and later steps are never issued.
/// Concurrency belongs across chains, which run as stage tasks, never inside
/// one.
pub async fn run_chain<T, F, Fut>(
  length: usize,
  seed: Option<T>,
  mut step: F,
) -> Result<Vec<T>>
where
  T: Clone,
  F: FnMut(usize, Option<T>) -> Fut,
  Fut: Future<Output = Result<T>>,
{
  let mut previous = seed;
  let mut produced: Vec<T> = Vec::with_capacity(length);

  for index in 0..length {
    match step(index, previous.take()).await {
      Ok(value) => {
        previous = Some(value.clone());
        produced.push(value);
      }
      Err(source) => {
        return Err(Error::Step { step: index, source: Box::new(source) });
      }
    }
  }

  Ok(produced)
}
