//! Multi-channel, multi-level biquad cascades.
//!
//! [`BiquadBank`] holds `channels x levels` independent second-order sections
//! in one allocation. Each channel runs its levels in series (a cascade), and
//! no state is ever shared across channels. The reverb uses one bank with a
//! section per delay line for frequency-dependent decay, and a second bank
//! with two channels (left, right) and two levels (high-pass, low-pass) on
//! the wet output.
//!
//! Every section is Direct Form I:
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2]
//!                - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! Coefficient design uses the RBJ Audio EQ Cookbook for the second-order
//! low-pass and high-pass responses, and a bilinear-transformed analog
//! prototype for the first-order high shelf.

use alloc::collections::TryReserveError;
use alloc::vec;
use alloc::vec::Vec;
use core::f32::consts::{FRAC_1_SQRT_2, PI};
use libm::{cosf, sinf, tanf};

/// Lowest cutoff any design function will produce, in Hz.
pub const MIN_CUTOFF_HZ: f32 = 1.0;

/// Highest cutoff any design function will produce, as a fraction of the
/// sample rate.
pub const MAX_CUTOFF_RATIO: f32 = 0.49;

/// Normalised biquad coefficients (`a0 == 1`).
///
/// The default is the identity section (`y[n] = x[n]`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoefficients {
    /// Feedforward coefficient for `x[n]`.
    pub b0: f32,
    /// Feedforward coefficient for `x[n-1]`.
    pub b1: f32,
    /// Feedforward coefficient for `x[n-2]`.
    pub b2: f32,
    /// Feedback coefficient for `y[n-1]`.
    pub a1: f32,
    /// Feedback coefficient for `y[n-2]`.
    pub a2: f32,
}

impl BiquadCoefficients {
    /// Pass-through section.
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Build from raw cookbook values, normalising by `a0`.
    pub fn from_raw(b0: f32, b1: f32, b2: f32, a0: f32, a1: f32, a2: f32) -> Self {
        let a0_inv = 1.0 / a0;
        Self {
            b0: b0 * a0_inv,
            b1: b1 * a0_inv,
            b2: b2 * a0_inv,
            a1: a1 * a0_inv,
            a2: a2 * a0_inv,
        }
    }

    /// Whether both poles lie strictly inside the unit circle.
    ///
    /// Uses the stability triangle: `|a2| < 1` and `|a1| < 1 + a2`.
    pub fn is_stable(&self) -> bool {
        self.a2.abs() < 1.0 && self.a1.abs() < 1.0 + self.a2
    }

    /// Magnitude response at `frequency` Hz.
    pub fn magnitude_at(&self, frequency: f32, sample_rate: f32) -> f32 {
        let w = 2.0 * PI * frequency / sample_rate;
        let (c1, s1) = (cosf(w), sinf(w));
        let (c2, s2) = (cosf(2.0 * w), sinf(2.0 * w));

        let num_re = self.b0 + self.b1 * c1 + self.b2 * c2;
        let num_im = -(self.b1 * s1 + self.b2 * s2);
        let den_re = 1.0 + self.a1 * c1 + self.a2 * c2;
        let den_im = -(self.a1 * s1 + self.a2 * s2);

        libm::sqrtf((num_re * num_re + num_im * num_im) / (den_re * den_re + den_im * den_im))
    }
}

impl Default for BiquadCoefficients {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[inline]
fn clamp_cutoff(frequency: f32, sample_rate: f32) -> f32 {
    let clamped = frequency.clamp(MIN_CUTOFF_HZ, MAX_CUTOFF_RATIO * sample_rate);
    #[cfg(feature = "tracing")]
    if clamped != frequency {
        tracing::debug!("biquad cutoff {frequency} Hz clamped to {clamped} Hz at {sample_rate} Hz");
    }
    clamped
}

/// Second-order Butterworth low-pass (RBJ cookbook, Q = 1/sqrt 2).
///
/// ```rust
/// use sala_core::biquad::lowpass;
///
/// let c = lowpass(6000.0, 44100.0);
/// assert!(c.is_stable());
/// assert!((c.magnitude_at(0.0, 44100.0) - 1.0).abs() < 1e-4);
/// ```
pub fn lowpass(frequency: f32, sample_rate: f32) -> BiquadCoefficients {
    let omega = 2.0 * PI * clamp_cutoff(frequency, sample_rate) / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * FRAC_1_SQRT_2);

    BiquadCoefficients::from_raw(
        (1.0 - cos_omega) / 2.0,
        1.0 - cos_omega,
        (1.0 - cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// Second-order Butterworth high-pass (RBJ cookbook, Q = 1/sqrt 2).
pub fn highpass(frequency: f32, sample_rate: f32) -> BiquadCoefficients {
    let omega = 2.0 * PI * clamp_cutoff(frequency, sample_rate) / sample_rate;
    let cos_omega = cosf(omega);
    let alpha = sinf(omega) / (2.0 * FRAC_1_SQRT_2);

    BiquadCoefficients::from_raw(
        (1.0 + cos_omega) / 2.0,
        -(1.0 + cos_omega),
        (1.0 + cos_omega) / 2.0,
        1.0 + alpha,
        -2.0 * cos_omega,
        1.0 - alpha,
    )
}

/// First-order high shelf with unity gain at DC and `nyquist_gain` at
/// Nyquist, turning over around `frequency`.
///
/// Bilinear transform (pre-warped at `frequency`) of
/// `H(s) = (g*s/wc + 1) / (s/wc + 1)`. Only `b0`, `b1` and `a1` are
/// non-zero.
///
/// ```rust
/// use sala_core::biquad::high_shelf_first_order;
///
/// let c = high_shelf_first_order(8000.0, 44100.0, 0.25);
/// assert!((c.magnitude_at(0.0, 44100.0) - 1.0).abs() < 1e-4);
/// assert!((c.magnitude_at(22050.0, 44100.0) - 0.25).abs() < 1e-3);
/// ```
pub fn high_shelf_first_order(
    frequency: f32,
    sample_rate: f32,
    nyquist_gain: f32,
) -> BiquadCoefficients {
    let fc = clamp_cutoff(frequency, sample_rate);
    let k = 1.0 / tanf(PI * fc / sample_rate);
    let norm = 1.0 / (k + 1.0);
    let gk = nyquist_gain * k;

    BiquadCoefficients {
        b0: (gk + 1.0) * norm,
        b1: (1.0 - gk) * norm,
        b2: 0.0,
        a1: (1.0 - k) * norm,
        a2: 0.0,
    }
}

/// Per-section Direct Form I history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct SectionState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl SectionState {
    #[inline]
    fn tick(&mut self, c: &BiquadCoefficients, input: f32) -> f32 {
        let output = c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

/// A `channels x levels` grid of biquad sections.
///
/// Sections start as identity filters with cleared state. Indexing a
/// channel or level outside the grid panics.
///
/// # Example
///
/// ```rust
/// use sala_core::biquad::{BiquadBank, highpass, lowpass};
///
/// // Stereo, high-pass then low-pass
/// let mut bank = BiquadBank::new(2, 2);
/// for ch in 0..2 {
///     bank.set_coefficients(ch, 0, highpass(30.0, 44100.0));
///     bank.set_coefficients(ch, 1, lowpass(6000.0, 44100.0));
/// }
///
/// let mut left = [1.0, 0.0, 0.0, 0.0];
/// bank.process_cascade_in_place(0, &mut left);
/// assert!(left.iter().all(|s| s.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct BiquadBank {
    channels: usize,
    levels: usize,
    coefficients: Vec<BiquadCoefficients>,
    state: Vec<SectionState>,
}

impl BiquadBank {
    /// Create a bank of identity sections.
    pub fn new(channels: usize, levels: usize) -> Self {
        let sections = channels * levels;
        Self {
            channels,
            levels,
            coefficients: vec![BiquadCoefficients::IDENTITY; sections],
            state: vec![SectionState::default(); sections],
        }
    }

    /// Create a bank of identity sections, reporting allocation failure
    /// instead of aborting.
    pub fn try_new(channels: usize, levels: usize) -> Result<Self, TryReserveError> {
        let sections = channels * levels;
        let mut coefficients = Vec::new();
        coefficients.try_reserve_exact(sections)?;
        coefficients.resize(sections, BiquadCoefficients::IDENTITY);

        let mut state = Vec::new();
        state.try_reserve_exact(sections)?;
        state.resize(sections, SectionState::default());

        Ok(Self {
            channels,
            levels,
            coefficients,
            state,
        })
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of cascaded levels per channel.
    pub fn levels(&self) -> usize {
        self.levels
    }

    #[inline]
    fn index(&self, channel: usize, level: usize) -> usize {
        assert!(
            channel < self.channels && level < self.levels,
            "section ({channel}, {level}) outside {}x{} bank",
            self.channels,
            self.levels
        );
        channel * self.levels + level
    }

    /// Replace one section's coefficients. Filter state is kept.
    pub fn set_coefficients(&mut self, channel: usize, level: usize, coefficients: BiquadCoefficients) {
        let i = self.index(channel, level);
        self.coefficients[i] = coefficients;
    }

    /// Coefficients of one section.
    pub fn coefficients(&self, channel: usize, level: usize) -> BiquadCoefficients {
        self.coefficients[self.index(channel, level)]
    }

    /// Run one sample through one section.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, level: usize, input: f32) -> f32 {
        let i = self.index(channel, level);
        self.state[i].tick(&self.coefficients[i], input)
    }

    /// Run a block through one section.
    ///
    /// Processes `min(input.len(), output.len())` samples.
    pub fn process_block(&mut self, channel: usize, level: usize, input: &[f32], output: &mut [f32]) {
        let i = self.index(channel, level);
        let c = self.coefficients[i];
        let state = &mut self.state[i];
        for (out, &x) in output.iter_mut().zip(input) {
            *out = state.tick(&c, x);
        }
    }

    /// Run a block through one section, overwriting it.
    pub fn process_block_in_place(&mut self, channel: usize, level: usize, buffer: &mut [f32]) {
        let i = self.index(channel, level);
        let c = self.coefficients[i];
        let state = &mut self.state[i];
        for sample in buffer.iter_mut() {
            *sample = state.tick(&c, *sample);
        }
    }

    /// Run a block through every level of one channel, in level order.
    pub fn process_cascade_in_place(&mut self, channel: usize, buffer: &mut [f32]) {
        for level in 0..self.levels {
            self.process_block_in_place(channel, level, buffer);
        }
    }

    /// Run one sample per channel through the given level.
    ///
    /// `input[ch]` feeds channel `ch`; processes
    /// `min(channels, input.len(), output.len())` channels.
    #[inline]
    pub fn process_frame(&mut self, level: usize, input: &[f32], output: &mut [f32]) {
        assert!(level < self.levels, "level {level} outside bank of {} levels", self.levels);
        let levels = self.levels;
        for (ch, (out, &x)) in output.iter_mut().zip(input).take(self.channels).enumerate() {
            let i = ch * levels + level;
            *out = self.state[i].tick(&self.coefficients[i], x);
        }
    }

    /// Clear all filter state, keeping coefficients.
    pub fn reset(&mut self) {
        self.state.fill(SectionState::default());
    }
}
