//! Memoized, one-shot build targets.
//!
//! A [`Target`] is the unit of work in the build graph. It owns a producer that
//! runs at most once, after every upstream target resolved successfully, and
//! broadcasts its outcome to any number of waiters.
//!
//! # Semantics
//!
//! - If an upstream fails, the target fails with that same error and the
//!   producer is never invoked. Upstreams are awaited in input order, so when
//!   several fail the first one in that order is reported.
//! - Otherwise the producer runs exactly once and its outcome is terminal.
//! - [`Target::result`] may be called from any number of tasks, before or after
//!   resolution; all callers observe the same outcome.

mod types;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, trace};

use crate::build::BuildError;

pub use types::*;

/// A handle to one memoized build step. Cloning shares the step.
#[derive(Clone)]
pub struct Target {
  inner: Arc<Inner>,
}

struct Inner {
  label: String,
  rx: watch::Receiver<Option<Outcome>>,
}

impl Target {
  /// Spawn a target that runs `producer` once all of `deps` succeeded.
  ///
  /// The producer receives the artifacts of `deps`, in order.
  ///
  /// # Panics
  ///
  /// Must be called from within a Tokio runtime.
  pub fn spawn<F, Fut>(label: impl Into<String>, deps: Vec<Target>, producer: F) -> Self
  where
    F: FnOnce(Vec<Artifact>) -> Fut + Send + 'static,
    Fut: Future<Output = Outcome> + Send + 'static,
  {
    let label = label.into();
    let (tx, rx) = watch::channel(None);

    let task_label = label.clone();
    tokio::spawn(async move {
      let outcome = match collect(&deps).await {
        Ok(inputs) => {
          trace!(label = %task_label, inputs = inputs.len(), "running producer");
          producer(inputs).await
        }
        Err(err) => {
          debug!(label = %task_label, error = %err, "skipping: dependency failed");
          Err(err)
        }
      };
      // Nobody is listening once every handle is dropped.
      let _ = tx.send(Some(outcome));
    });

    Self::from_receiver(label, rx)
  }

  /// A target that has already succeeded with `artifact`.
  pub fn ready(label: impl Into<String>, artifact: Artifact) -> Self {
    let (_tx, rx) = watch::channel(Some(Ok(artifact)));
    Self::from_receiver(label.into(), rx)
  }

  /// A target that has already failed; no work is ever attempted.
  pub fn failed(label: impl Into<String>, err: BuildError) -> Self {
    let (_tx, rx) = watch::channel(Some(Err(err)));
    Self::from_receiver(label.into(), rx)
  }

  fn from_receiver(label: String, rx: watch::Receiver<Option<Outcome>>) -> Self {
    Self {
      inner: Arc::new(Inner { label, rx }),
    }
  }

  pub fn label(&self) -> &str {
    &self.inner.label
  }

  /// Wait for the target to resolve and return its outcome.
  pub async fn result(&self) -> Outcome {
    let mut rx = self.inner.rx.clone();
    let outcome = match rx.wait_for(Option::is_some).await {
      Ok(value) => value.clone(),
      Err(_) => None,
    };
    outcome.unwrap_or_else(|| {
      Err(BuildError::Abandoned {
        label: self.inner.label.clone(),
      })
    })
  }

  /// The outcome if the target has already resolved.
  pub fn peek(&self) -> Option<Outcome> {
    self.inner.rx.borrow().clone()
  }

  /// Whether `self` and `other` are handles to the same step.
  pub fn same(&self, other: &Target) -> bool {
    Arc::ptr_eq(&self.inner, &other.inner)
  }
}

impl fmt::Debug for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Target")
      .field("label", &self.inner.label)
      .field("resolved", &self.inner.rx.borrow().is_some())
      .finish()
  }
}

impl fmt::Display for Target {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.inner.label)
  }
}

/// Await every dependency in order, stopping at the first failure.
async fn collect(deps: &[Target]) -> Result<Vec<Artifact>, BuildError> {
  let mut inputs = Vec::with_capacity(deps.len());
  for dep in deps {
    inputs.push(dep.result().await?);
  }
  Ok(inputs)
}
