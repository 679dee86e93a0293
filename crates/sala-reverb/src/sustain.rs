//! Auto-sustain: level-driven switching to the long decay set.
//!
//! Emulates a sustain pedal. While the input is loud the reverb switches to
//! `slow_decay_rt60`; once the input has been quiet for a while it switches
//! back. The two thresholds are 15 dB apart so a signal hovering near one
//! of them cannot make the state chatter.

use sala_core::EnergyEnvelope;

/// Envelope attack, milliseconds.
pub const SUSTAIN_ATTACK_MS: f32 = 5.0;
/// Envelope release, milliseconds.
pub const SUSTAIN_RELEASE_MS: f32 = 250.0;
/// Enter sustain above this level, dBFS.
pub const SUSTAIN_ENTER_DB: f32 = -30.0;
/// Leave sustain below this level, dBFS.
pub const SUSTAIN_LEAVE_DB: f32 = -45.0;

/// Hysteresis state machine over the input energy envelope.
#[derive(Debug, Clone)]
pub struct AutoSustain {
    envelope: EnergyEnvelope,
    sustaining: bool,
}

impl AutoSustain {
    /// Create an idle detector.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            envelope: EnergyEnvelope::new(sample_rate, SUSTAIN_ATTACK_MS, SUSTAIN_RELEASE_MS),
            sustaining: false,
        }
    }

    /// Feed one mono input sample. Returns the new state on a threshold
    /// crossing, `None` otherwise.
    #[inline]
    pub fn process(&mut self, input: f32) -> Option<bool> {
        self.envelope.process(input);
        let level = self.envelope.level_db();

        if !self.sustaining && level > SUSTAIN_ENTER_DB {
            self.sustaining = true;
            Some(true)
        } else if self.sustaining && level < SUSTAIN_LEAVE_DB {
            self.sustaining = false;
            Some(false)
        } else {
            None
        }
    }

    /// Whether the detector is in its sustaining state.
    pub fn is_sustaining(&self) -> bool {
        self.sustaining
    }

    /// Current envelope level in dBFS.
    pub fn level_db(&self) -> f32 {
        self.envelope.level_db()
    }

    /// Follow a new sample rate.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.envelope.set_sample_rate(sample_rate);
    }

    /// Return to idle with a silent envelope.
    pub fn reset(&mut self) {
        self.envelope.reset();
        self.sustaining = false;
    }
}
