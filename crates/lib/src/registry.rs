//! Single-creation registry of unit targets.
//!
//! Maps a [`UnitKey`] to the target that builds it. For a given key at most one
//! target is ever created; every later request, concurrent or not, receives
//! that same target whether it is still running or already done.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use tracing::trace;

use crate::target::Target;
use crate::unit::UnitKey;

#[derive(Default)]
pub struct Registry {
  slots: Mutex<HashMap<UnitKey, Arc<OnceLock<Target>>>>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Return the target for `key`, creating it with `factory` if absent.
  ///
  /// The map lock is released before `factory` runs, so a factory may itself
  /// request other keys. Concurrent requests for the same key block until the
  /// first factory returns.
  pub fn get_or_create<F>(&self, key: UnitKey, factory: F) -> Target
  where
    F: FnOnce() -> Target,
  {
    let slot = {
      let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
      slots.entry(key.clone()).or_default().clone()
    };

    slot
      .get_or_init(|| {
        trace!(key = %key, "creating target");
        factory()
      })
      .clone()
  }

  /// The target for `key`, if one has been created.
  pub fn get(&self, key: &UnitKey) -> Option<Target> {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.get(key).and_then(|slot| slot.get().cloned())
  }

  /// Number of targets created so far.
  pub fn len(&self) -> usize {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    slots.values().filter(|slot| slot.get().is_some()).count()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Keys with a created target, sorted.
  pub fn keys(&self) -> Vec<UnitKey> {
    let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
    let mut keys: Vec<_> = slots
      .iter()
      .filter(|(_, slot)| slot.get().is_some())
      .map(|(key, _)| key.clone())
      .collect();
    keys.sort();
    keys
  }
}

impl std::fmt::Debug for Registry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry").field("keys", &self.keys()).finish()
  }
}
