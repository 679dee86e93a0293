//! Frequency-dependent decay and output shaping filters.
//!
//! Two independent [`BiquadBank`]s:
//!
//! | bank | channels x levels | purpose |
//! |------|-------------------|---------|
//! | feedback | N x 1 | first-order high shelf per delay line |
//! | output | 2 x 2 | wet high-pass (level 0) then low-pass (level 1) |
//!
//! The shelf on a line with loop length `d` has unity gain at DC and
//! `10^(-3 * d * (m - 1) / (rt60 * fs))` at Nyquist. Combined with the
//! line's broadband decay gain, content above `hf_decay_fc` therefore decays
//! `m` times faster than the RT60. Normal and sustain coefficient sets are
//! both precomputed; switching between them swaps coefficients and keeps the
//! filter state, so the change is click-free.

use sala_core::biquad::{high_shelf_first_order, highpass, lowpass};
use sala_core::{BiquadBank, BiquadCoefficients, decay_gain};

use crate::error::ReverbError;
use crate::network::try_zeroed;
use crate::settings::ImmediateSettings;

const HIGHPASS_LEVEL: usize = 0;
const LOWPASS_LEVEL: usize = 1;

/// Nyquist gain of the HF decay shelf for one loop.
///
/// `multiplier == 1` gives a flat (identity) shelf.
pub fn shelf_nyquist_gain(loop_samples: f32, rt60: f32, multiplier: f32, sample_rate: f32) -> f32 {
    decay_gain(loop_samples * (multiplier - 1.0).max(0.0), rt60, sample_rate)
}

/// Compute a first-order shelf for HF decay.
pub fn compute_coefficients(fc: f32, sample_rate: f32, shelf_gain: f32) -> BiquadCoefficients {
    high_shelf_first_order(fc, sample_rate, shelf_gain)
}

/// Feedback-path shelves plus the stereo output filters.
#[derive(Debug, Clone)]
pub struct DecayFilterBank {
    feedback: BiquadBank,
    output: BiquadBank,
    normal: Vec<BiquadCoefficients>,
    slow: Vec<BiquadCoefficients>,
    slow_selected: bool,
}

impl DecayFilterBank {
    /// Create identity filters for `lines` delay lines.
    pub fn new(lines: usize) -> Result<Self, ReverbError> {
        let feedback = BiquadBank::try_new(lines, 1).map_err(|_| ReverbError::allocation(lines))?;
        let output = BiquadBank::try_new(2, 2).map_err(|_| ReverbError::allocation(4))?;
        Ok(Self {
            feedback,
            output,
            normal: try_zeroed(lines)?,
            slow: try_zeroed(lines)?,
            slow_selected: false,
        })
    }

    /// Number of feedback-path channels.
    pub fn lines(&self) -> usize {
        self.feedback.channels()
    }

    /// Recompute both shelf sets and the output filters.
    ///
    /// `loop_lengths(i)` gives the loop length of line `i` in samples.
    pub fn compute(
        &mut self,
        loop_lengths: impl Fn(usize) -> usize,
        settings: &ImmediateSettings,
        sample_rate: f32,
    ) {
        for i in 0..self.lines() {
            let loop_samples = loop_lengths(i) as f32;
            let normal_gain =
                shelf_nyquist_gain(loop_samples, settings.rt60, settings.hf_decay_multiplier, sample_rate);
            let slow_gain = shelf_nyquist_gain(
                loop_samples,
                settings.slow_decay_rt60,
                settings.hf_slow_decay_multiplier,
                sample_rate,
            );
            self.normal[i] = compute_coefficients(settings.hf_decay_fc, sample_rate, normal_gain);
            self.slow[i] = compute_coefficients(settings.hf_decay_fc, sample_rate, slow_gain);
        }
        self.load_set();

        let hp = highpass(settings.highpass_fc, sample_rate);
        let lp = lowpass(settings.lowpass_fc, sample_rate);
        for ch in 0..2 {
            self.output.set_coefficients(ch, HIGHPASS_LEVEL, hp);
            self.output.set_coefficients(ch, LOWPASS_LEVEL, lp);
        }
    }

    /// Select the sustain (`true`) or normal shelf set. State is kept.
    pub fn select(&mut self, slow: bool) {
        if slow != self.slow_selected {
            self.slow_selected = slow;
            self.load_set();
        }
    }

    fn load_set(&mut self) {
        let set = if self.slow_selected { &self.slow } else { &self.normal };
        for (ch, &c) in set.iter().enumerate() {
            self.feedback.set_coefficients(ch, 0, c);
        }
    }

    /// Whether the sustain set is active.
    pub fn slow_selected(&self) -> bool {
        self.slow_selected
    }

    /// Shelve one sample of every line.
    #[inline]
    pub fn process_feedback(&mut self, input: &[f32], output: &mut [f32]) {
        self.feedback.process_frame(0, input, output);
    }

    /// High-pass then low-pass a block of wet signal in place.
    pub fn process_output(&mut self, left: &mut [f32], right: &mut [f32]) {
        self.output.process_cascade_in_place(0, left);
        self.output.process_cascade_in_place(1, right);
    }

    /// Coefficients of line `i`'s shelf in the active set.
    pub fn shelf(&self, i: usize) -> BiquadCoefficients {
        self.feedback.coefficients(i, 0)
    }

    /// Clear all filter state.
    pub fn reset(&mut self) {
        self.feedback.reset();
        self.output.reset();
    }
}
