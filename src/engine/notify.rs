//! "Special triggered" notifications.
//!
//! Subscribers register either for every special or for one special id.
//! Handlers run synchronously, after the reward has been fully applied.
//! A handler that returns an error or panics is logged and skipped; the
//! remaining handlers still run and the grant itself is never rolled back.

use std::panic::{catch_unwind, AssertUnwindSafe};

use log::warn;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::core::{ContextEntity, PlayerId};

/// Payload delivered to subscribers when a special is applied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialTriggered {
    /// Id of the applied special.
    pub special_id: String,

    /// Player that received it.
    pub player: PlayerId,

    /// Entity involved in the trigger (victim, picked-up item). `None` for
    /// grants from the sweep or a command.
    pub context: Option<ContextEntity>,
}

/// Callback for applied specials.
///
/// Implemented for any `Fn(&SpecialTriggered) -> anyhow::Result<()>`.
pub trait SpecialHandler {
    fn on_special_triggered(&self, event: &SpecialTriggered) -> anyhow::Result<()>;
}

impl<F> SpecialHandler for F
where
    F: Fn(&SpecialTriggered) -> anyhow::Result<()>,
{
    fn on_special_triggered(&self, event: &SpecialTriggered) -> anyhow::Result<()> {
        self(event)
    }
}

/// Registered handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    global: Vec<Box<dyn SpecialHandler>>,
    by_special: FxHashMap<String, Vec<Box<dyn SpecialHandler>>>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for every special.
    pub fn subscribe(&mut self, handler: impl SpecialHandler + 'static) {
        self.global.push(Box::new(handler));
    }

    /// Register a handler for one special id.
    pub fn subscribe_to(&mut self, special_id: impl Into<String>, handler: impl SpecialHandler + 'static) {
        self.by_special
            .entry(special_id.into())
            .or_default()
            .push(Box::new(handler));
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.global.len() + self.by_special.values().map(Vec::len).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver an event: global handlers first, then the special's own.
    ///
    /// Returns the number of handlers that failed.
    pub fn notify(&self, event: &SpecialTriggered) -> usize {
        let specific = self
            .by_special
            .get(&event.special_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        let mut failures = 0;
        for handler in self.global.iter().chain(specific) {
            if !Self::invoke(&**handler, event) {
                failures += 1;
            }
        }
        failures
    }

    /// Run one handler. Returns `true` on success.
    fn invoke(handler: &dyn SpecialHandler, event: &SpecialTriggered) -> bool {
        match catch_unwind(AssertUnwindSafe(|| handler.on_special_triggered(event))) {
            Ok(Ok(())) => true,
            Ok(Err(err)) => {
                warn!("Error in special handler for {}: {err:#}", event.special_id);
                false
            }
            Err(_) => {
                warn!("Special handler for {} panicked", event.special_id);
                false
            }
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("global", &self.global.len())
            .field("by_special", &self.by_special.len())
            .finish()
    }
}
