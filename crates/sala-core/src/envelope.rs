//! Energy envelope follower.
//!
//! Tracks the short-term mean-square level of a signal with separate attack
//! and release smoothing. The reverb's auto-sustain compares this level
//! against enter/leave thresholds in dBFS.

use crate::math::linear_to_db;
use libm::expf;

/// Mean-square envelope with attack/release smoothing.
///
/// # Example
///
/// ```rust
/// use sala_core::EnergyEnvelope;
///
/// let mut env = EnergyEnvelope::new(48000.0, 5.0, 250.0);
/// for _ in 0..4800 {
///     env.process(0.5);
/// }
/// // 0.5 amplitude is about -6 dBFS
/// assert!((env.level_db() + 6.02).abs() < 0.1);
/// ```
#[derive(Debug, Clone)]
pub struct EnergyEnvelope {
    /// Smoothed mean-square value
    energy: f32,
    attack_coeff: f32,
    release_coeff: f32,
    sample_rate: f32,
    attack_ms: f32,
    release_ms: f32,
}

impl EnergyEnvelope {
    /// Create an envelope with the given attack and release times.
    pub fn new(sample_rate: f32, attack_ms: f32, release_ms: f32) -> Self {
        let mut envelope = Self {
            energy: 0.0,
            attack_coeff: 0.0,
            release_coeff: 0.0,
            sample_rate,
            attack_ms: attack_ms.max(0.1),
            release_ms: release_ms.max(1.0),
        };
        envelope.recalculate_coefficients();
        envelope
    }

    /// Attack time in milliseconds.
    pub fn attack_ms(&self) -> f32 {
        self.attack_ms
    }

    /// Release time in milliseconds.
    pub fn release_ms(&self) -> f32 {
        self.release_ms
    }

    /// Update sample rate and recalculate coefficients.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coefficients();
    }

    /// Feed one sample of signal, returning the smoothed energy.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let power = input * input;
        let coeff = if power > self.energy {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.energy = coeff * self.energy + (1.0 - coeff) * power;
        self.energy
    }

    /// Smoothed mean-square value.
    pub fn energy(&self) -> f32 {
        self.energy
    }

    /// Smoothed level in dBFS (RMS).
    pub fn level_db(&self) -> f32 {
        // 10*log10(energy) == 20*log10(rms)
        0.5 * linear_to_db(self.energy)
    }

    /// Reset to silence.
    pub fn reset(&mut self) {
        self.energy = 0.0;
    }

    fn recalculate_coefficients(&mut self) {
        self.attack_coeff = expf(-1.0 / (self.attack_ms * self.sample_rate / 1000.0));
        self.release_coeff = expf(-1.0 / (self.release_ms * self.sample_rate / 1000.0));
    }
}
