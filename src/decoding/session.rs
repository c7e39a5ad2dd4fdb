//! Per-stream decoding state.

use bytes::BytesMut;
use std::ops::{Deref, DerefMut};

use crate::config::PluginOptions;

/// Working memory reused across events: the object being built and the
/// arena that holds materialized out-of-line values.
#[derive(Debug, Default)]
pub struct Arena {
    pub out: String,
    pub detoasted: BytesMut,
}

impl Arena {
    fn reset(&mut self) {
        self.out.clear();
        self.detoasted.clear();
    }
}

/// Scoped checkout of the arena; the contents are released when the guard
/// drops, whichever way the event handler returns.
pub struct Scratch<'a> {
    arena: &'a mut Arena,
}

impl Deref for Scratch<'_> {
    type Target = Arena;

    fn deref(&self) -> &Arena {
        self.arena
    }
}

impl DerefMut for Scratch<'_> {
    fn deref_mut(&mut self) -> &mut Arena {
        self.arena
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        self.arena.reset();
    }
}

/// State allocated at stream startup and released at shutdown.
#[derive(Debug)]
pub struct DecodingState {
    pub options: PluginOptions,
    /// Set once a change was emitted in the current transaction.
    pub xact_wrote_changes: bool,
    arena: Arena,
}

impl DecodingState {
    pub fn new(options: PluginOptions) -> Self {
        Self {
            options,
            xact_wrote_changes: false,
            arena: Arena::default(),
        }
    }

    /// Checks out the arena for one event.
    pub fn scratch(&mut self) -> Scratch<'_> {
        self.arena.reset();
        Scratch {
            arena: &mut self.arena,
        }
    }

    /// Whether nothing is held in the arena between events.
    pub fn arena_is_clear(&self) -> bool {
        self.arena.out.is_empty() && self.arena.detoasted.is_empty()
    }
}
