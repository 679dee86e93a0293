//! Level and decay math.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`decay_gain`] - Per-pass gain that yields a given RT60
//! - [`dry_gain_for_wet`] - Constant-power dry/wet pairing
//! - [`equal_power_cross_mix`] - Stereo cross-feed weights

use core::f32::consts::FRAC_PI_4;
use libm::{cosf, expf, logf, powf, sinf, sqrtf};

/// Convert decibels to linear gain.
///
/// ```rust
/// use sala_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels. Inputs below `1e-10` are floored.
///
/// ```rust
/// use sala_core::linear_to_db;
///
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Gain applied once per pass through a loop of `delay_samples` samples so
/// that the loop decays by 60 dB in `rt60` seconds.
///
/// `10^(-3 * delay / (rt60 * fs))`
///
/// ```rust
/// use sala_core::decay_gain;
///
/// // A loop as long as the RT60 loses exactly 60 dB per pass
/// assert!((decay_gain(44100.0, 1.0, 44100.0) - 0.001).abs() < 1e-6);
/// ```
#[inline]
pub fn decay_gain(delay_samples: f32, rt60: f32, sample_rate: f32) -> f32 {
    powf(10.0, -3.0 * delay_samples / (rt60 * sample_rate))
}

/// Dry gain that keeps `wet^2 + dry^2 == 1`. `wet` is clamped to `[0, 1]`.
#[inline]
pub fn dry_gain_for_wet(wet: f32) -> f32 {
    let wet = wet.clamp(0.0, 1.0);
    sqrtf(1.0 - wet * wet)
}

/// Equal-power stereo cross-mix weights `(straight, cross)`.
///
/// `mix = 0` keeps the channels separate, `mix = 1` sends equal energy from
/// each channel to both outputs. `straight^2 + cross^2 == 1` throughout.
#[inline]
pub fn equal_power_cross_mix(mix: f32) -> (f32, f32) {
    let angle = mix.clamp(0.0, 1.0) * FRAC_PI_4;
    (cosf(angle), sinf(angle))
}
