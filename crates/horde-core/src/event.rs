//! Outgoing event channel.
//!
//! The `EventBus` delivers [`SpawnEvent`]s synchronously to every registered
//! handler, at most once per handler per publish. Handler failures are logged
//! and swallowed; the simulation never sees them.
//!
//! # Usage
//!
//! ```
//! use horde_core::event::{EventBus, EventRecorder, SpawnEvent};
//!
//! let mut bus = EventBus::new();
//! let recorder = EventRecorder::subscribe(&mut bus);
//!
//! bus.publish(&SpawnEvent::PlayDeathSoundGroup { group: 3 });
//!
//! assert_eq!(recorder.take(), vec![SpawnEvent::PlayDeathSoundGroup { group: 3 }]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use horde_grid::Rect;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entity::ItemKind;
use crate::error::HandlerError;

/// Events emitted by the population engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpawnEvent {
    /// A loot item should appear in the world.
    SpawnItem {
        /// What to drop
        item: ItemKind,
        /// Drop position X
        world_x: f32,
        /// Drop position Y
        world_y: f32,
        /// Y the drop animation starts at
        drop_start_y: f32,
        /// Y the drop animation lands at
        drop_end_y: f32,
        /// Item quantity
        context: u32,
    },
    /// Play one sound from a death sound group.
    PlayDeathSoundGroup {
        /// Sound group id
        group: u32,
    },
    /// A live spawn's standing contact attack for this tick.
    DamagePlayerIfOverlapping {
        /// Attacker's collision rectangle
        rect: Rect,
        /// Damage dealt if the player overlaps `rect`
        damage: f32,
    },
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&SpawnEvent) -> Result<(), HandlerError>>;

/// Fire-and-forget publish/subscribe channel.
#[derive(Default)]
pub struct EventBus {
    handlers: Vec<(SubscriptionId, Handler)>,
    next_subscription: u64,
    published: u64,
    failures: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("handlers", &self.handlers.len())
            .field("published", &self.published)
            .field("failures", &self.failures)
            .finish()
    }
}

impl EventBus {
    /// Creates a bus with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Handlers run in subscription order.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&SpawnEvent) -> Result<(), HandlerError> + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.handlers.push((id, Box::new(handler)));
        id
    }

    /// Removes a handler. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(sub, _)| *sub != id);
        self.handlers.len() != before
    }

    /// Delivers `event` to every handler once.
    ///
    /// Returns the number of handlers that accepted the event.
    pub fn publish(&mut self, event: &SpawnEvent) -> usize {
        self.published += 1;
        let mut delivered = 0;
        for (id, handler) in &mut self.handlers {
            match handler(event) {
                Ok(()) => delivered += 1,
                Err(err) => {
                    self.failures += 1;
                    warn!(subscription = id.0, error = %err, ?event, "event handler failed");
                }
            }
        }
        delivered
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Total events published.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Total handler failures swallowed.
    #[must_use]
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Drops every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }
}

/// Handler that records every event it receives.
///
/// Cloning shares the same log.
#[derive(Debug, Clone, Default)]
pub struct EventRecorder {
    log: Rc<RefCell<Vec<SpawnEvent>>>,
}

impl EventRecorder {
    /// Creates a recorder and subscribes it to `bus`.
    pub fn subscribe(bus: &mut EventBus) -> Self {
        let recorder = Self::default();
        let log = Rc::clone(&recorder.log);
        bus.subscribe(move |event| {
            log.borrow_mut().push(event.clone());
            Ok(())
        });
        recorder
    }

    /// Drains and returns the recorded events.
    #[must_use]
    pub fn take(&self) -> Vec<SpawnEvent> {
        std::mem::take(&mut *self.log.borrow_mut())
    }

    /// Number of events currently recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// Returns true if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }
}
