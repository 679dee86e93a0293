//! Audio-thread side of the settings handoff.
//!
//! The [`ParameterController`] is owned by the [`Reverb`](crate::Reverb) and
//! is the only reader that acts on settings. It never blocks: every check is
//! an atomic load, and a structural snapshot is taken with a single
//! `swap` of the pending flag.
//!
//! ```text
//!            set_room_size()                process_buffer() start
//!  Active ------------------> PendingStructural ------------------> Applying
//!    ^                                                                  |
//!    +------------------------------------------------------------------+
//!                         new topology installed
//! ```

use std::sync::Arc;

use crate::control::{ControllerState, SharedSettings};
use crate::settings::{ImmediateSettings, StructuralSettings};

/// Tracks what the audio thread has applied versus what was requested.
#[derive(Debug)]
pub(crate) struct ParameterController {
    shared: Arc<SharedSettings>,
    seen_revision: u64,
    immediate: ImmediateSettings,
    structure: StructuralSettings,
}

impl ParameterController {
    pub(crate) fn new(shared: Arc<SharedSettings>) -> Self {
        let seen_revision = shared.revision();
        let immediate = shared.immediate();
        let structure = shared.requested_structure();
        Self {
            shared,
            seen_revision,
            immediate,
            structure,
        }
    }

    /// Structure the audio thread is running.
    pub(crate) fn structure(&self) -> StructuralSettings {
        self.structure
    }

    /// Immediate settings as last applied.
    pub(crate) fn immediate(&self) -> ImmediateSettings {
        self.immediate
    }

    /// Take a queued structural change, entering `Applying`.
    pub(crate) fn take_pending(&mut self) -> Option<StructuralSettings> {
        self.shared.take_pending()
    }

    /// Record `structure` as applied and return to `Active`.
    pub(crate) fn finish_apply(&mut self, structure: StructuralSettings) {
        self.structure = structure;
        self.shared.finish_apply();
    }

    /// Fresh immediate settings if any coefficient-affecting field changed
    /// since the last poll.
    pub(crate) fn poll_immediate(&mut self) -> Option<ImmediateSettings> {
        let revision = self.shared.revision();
        if revision == self.seen_revision {
            return None;
        }
        self.seen_revision = revision;
        self.immediate = self.shared.immediate();
        Some(self.immediate)
    }

    /// Requested decay set.
    #[inline]
    pub(crate) fn slow_decay(&self) -> bool {
        self.shared.slow_decay()
    }

    /// Publish a decay set chosen by auto-sustain.
    pub(crate) fn store_slow_decay(&self, slow: bool) {
        self.shared.store_slow_decay(slow);
    }

    #[inline]
    pub(crate) fn auto_sustain(&self) -> bool {
        self.shared.auto_sustain()
    }

    pub(crate) fn state(&self) -> ControllerState {
        self.shared.state()
    }
}
