//! Reverb settings and their validation.
//!
//! Settings fall into two groups:
//!
//! | group | fields | applied |
//! |-------|--------|---------|
//! | immediate | wet gain, cross-stereo mix, HF decay multipliers and corner, RT60s, slow decay, auto-sustain, output filter corners | next processed block |
//! | structural | delay units, pre-delay, room size, sample rate | start of the next `process_buffer` call |
//!
//! Structural settings change delay-line lengths and therefore storage, so
//! they are only ever applied by the audio thread between blocks.

use crate::error::ReverbError;
use sala_core::dry_gain_for_wet;

/// Default wet gain.
pub const DEFAULT_WET_GAIN: f32 = 0.15;
/// Default number of four-line delay units.
pub const DEFAULT_DELAY_UNITS: usize = 4;
/// Default pre-delay (shortest delay line), seconds.
pub const DEFAULT_PRE_DELAY: f32 = 0.007;
/// Default room size (longest delay line), seconds.
pub const DEFAULT_ROOM_SIZE: f32 = 0.100;
/// Default sample rate, Hz.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
/// Default HF decay shelf corner, Hz.
pub const DEFAULT_HF_DECAY_FC: f32 = 8000.0;
/// Default HF decay multiplier.
pub const DEFAULT_HF_DECAY_MULTIPLIER: f32 = 6.0;
/// Default HF decay multiplier while sustaining.
pub const DEFAULT_HF_SLOW_DECAY_MULTIPLIER: f32 = 12.0;
/// Default RT60, seconds.
pub const DEFAULT_RT60: f32 = 1.2;
/// Default RT60 while sustaining, seconds.
pub const DEFAULT_SLOW_DECAY_RT60: f32 = 8.0;
/// Default output high-pass corner, Hz.
pub const DEFAULT_HIGHPASS_FC: f32 = 30.0;
/// Default output low-pass corner, Hz.
pub const DEFAULT_LOWPASS_FC: f32 = 6000.0;
/// Default cross-stereo mix.
pub const DEFAULT_CROSS_STEREO_MIX: f32 = 0.4;

/// Largest accepted number of delay units.
pub const MAX_DELAY_UNITS: usize = 64;
/// Lowest accepted sample rate, Hz.
pub const MIN_SAMPLE_RATE: f32 = 1000.0;
/// Highest accepted sample rate, Hz.
pub const MAX_SAMPLE_RATE: f32 = 768_000.0;
/// Longest accepted pre-delay or room size, seconds.
///
/// At [`MAX_SAMPLE_RATE`] with [`MAX_DELAY_UNITS`] this bounds delay storage
/// to about 197M samples, inside
/// [`MAX_DELAY_STORAGE`](crate::network::MAX_DELAY_STORAGE).
pub const MAX_DELAY_SECONDS: f32 = 1.0;

/// Settings that only change coefficients and gains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImmediateSettings {
    /// Wet output gain in `[0, 1]`.
    pub wet_gain: f32,
    /// Left/right wet blend in `[0, 1]`.
    pub cross_stereo_mix: f32,
    /// How many times faster content above `hf_decay_fc` decays.
    pub hf_decay_multiplier: f32,
    /// `hf_decay_multiplier` used while sustaining.
    pub hf_slow_decay_multiplier: f32,
    /// Corner of the HF decay shelf, Hz.
    pub hf_decay_fc: f32,
    /// Decay time to -60 dB, seconds.
    pub rt60: f32,
    /// Decay time while sustaining, seconds.
    pub slow_decay_rt60: f32,
    /// Output high-pass corner, Hz.
    pub highpass_fc: f32,
    /// Output low-pass corner, Hz.
    pub lowpass_fc: f32,
    /// Use the sustain decay set.
    pub slow_decay: bool,
    /// Drive `slow_decay` from the input level.
    pub auto_sustain: bool,
}

impl ImmediateSettings {
    /// Dry gain paired with the current wet gain.
    pub fn dry_gain(&self) -> f32 {
        dry_gain_for_wet(self.wet_gain)
    }
}

impl Default for ImmediateSettings {
    fn default() -> Self {
        Self {
            wet_gain: DEFAULT_WET_GAIN,
            cross_stereo_mix: DEFAULT_CROSS_STEREO_MIX,
            hf_decay_multiplier: DEFAULT_HF_DECAY_MULTIPLIER,
            hf_slow_decay_multiplier: DEFAULT_HF_SLOW_DECAY_MULTIPLIER,
            hf_decay_fc: DEFAULT_HF_DECAY_FC,
            rt60: DEFAULT_RT60,
            slow_decay_rt60: DEFAULT_SLOW_DECAY_RT60,
            highpass_fc: DEFAULT_HIGHPASS_FC,
            lowpass_fc: DEFAULT_LOWPASS_FC,
            slow_decay: false,
            auto_sustain: false,
        }
    }
}

/// Settings that determine delay-line lengths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructuralSettings {
    /// Number of four-line delay units.
    pub delay_units: usize,
    /// Shortest delay line, seconds.
    pub pre_delay: f32,
    /// Longest delay line, seconds.
    pub room_size: f32,
    /// Sample rate, Hz.
    pub sample_rate: f32,
}

impl StructuralSettings {
    /// Total number of delay lines.
    pub fn num_delays(&self) -> usize {
        self.delay_units * 4
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), ReverbError> {
        validate_delay_units(self.delay_units)?;
        validate_pre_delay(self.pre_delay)?;
        validate_room_size(self.room_size)?;
        validate_sample_rate(self.sample_rate)
    }
}

impl Default for StructuralSettings {
    fn default() -> Self {
        Self {
            delay_units: DEFAULT_DELAY_UNITS,
            pre_delay: DEFAULT_PRE_DELAY,
            room_size: DEFAULT_ROOM_SIZE,
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

/// Complete reverb configuration.
///
/// # Example
///
/// ```rust
/// use sala_reverb::ReverbSettings;
///
/// let settings = ReverbSettings {
///     rt60: 1.3,
///     wet_gain: 1.0,
///     ..ReverbSettings::default()
/// };
/// assert!(settings.validate().is_ok());
/// assert_eq!(settings.dry_gain(), 0.0);
/// ```
///
/// With the `serde` feature every field is optional when deserializing;
/// missing fields take their defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ReverbSettings {
    /// Wet output gain in `[0, 1]`; the dry gain is derived from it.
    pub wet_gain: f32,
    /// Left/right wet blend in `[0, 1]`.
    pub cross_stereo_mix: f32,
    /// How many times faster content above `hf_decay_fc` decays (>= 1).
    pub hf_decay_multiplier: f32,
    /// `hf_decay_multiplier` used while sustaining (>= 1).
    pub hf_slow_decay_multiplier: f32,
    /// Corner of the HF decay shelf, Hz.
    pub hf_decay_fc: f32,
    /// Decay time to -60 dB, seconds.
    pub rt60: f32,
    /// Decay time while sustaining, seconds.
    pub slow_decay_rt60: f32,
    /// Output high-pass corner, Hz.
    pub highpass_fc: f32,
    /// Output low-pass corner, Hz.
    pub lowpass_fc: f32,
    /// Use the sustain decay set.
    pub slow_decay: bool,
    /// Drive `slow_decay` from the input level.
    pub auto_sustain: bool,
    /// Number of four-line delay units.
    pub delay_units: usize,
    /// Shortest delay line, seconds.
    pub pre_delay: f32,
    /// Longest delay line, seconds.
    pub room_size: f32,
    /// Sample rate, Hz.
    pub sample_rate: f32,
}

impl ReverbSettings {
    /// Join the two setting groups.
    pub fn from_parts(immediate: ImmediateSettings, structure: StructuralSettings) -> Self {
        Self {
            wet_gain: immediate.wet_gain,
            cross_stereo_mix: immediate.cross_stereo_mix,
            hf_decay_multiplier: immediate.hf_decay_multiplier,
            hf_slow_decay_multiplier: immediate.hf_slow_decay_multiplier,
            hf_decay_fc: immediate.hf_decay_fc,
            rt60: immediate.rt60,
            slow_decay_rt60: immediate.slow_decay_rt60,
            highpass_fc: immediate.highpass_fc,
            lowpass_fc: immediate.lowpass_fc,
            slow_decay: immediate.slow_decay,
            auto_sustain: immediate.auto_sustain,
            delay_units: structure.delay_units,
            pre_delay: structure.pre_delay,
            room_size: structure.room_size,
            sample_rate: structure.sample_rate,
        }
    }

    /// The immediate group.
    pub fn immediate(&self) -> ImmediateSettings {
        ImmediateSettings {
            wet_gain: self.wet_gain,
            cross_stereo_mix: self.cross_stereo_mix,
            hf_decay_multiplier: self.hf_decay_multiplier,
            hf_slow_decay_multiplier: self.hf_slow_decay_multiplier,
            hf_decay_fc: self.hf_decay_fc,
            rt60: self.rt60,
            slow_decay_rt60: self.slow_decay_rt60,
            highpass_fc: self.highpass_fc,
            lowpass_fc: self.lowpass_fc,
            slow_decay: self.slow_decay,
            auto_sustain: self.auto_sustain,
        }
    }

    /// The structural group.
    pub fn structure(&self) -> StructuralSettings {
        StructuralSettings {
            delay_units: self.delay_units,
            pre_delay: self.pre_delay,
            room_size: self.room_size,
            sample_rate: self.sample_rate,
        }
    }

    /// `sqrt(1 - wet_gain^2)`.
    pub fn dry_gain(&self) -> f32 {
        dry_gain_for_wet(self.wet_gain)
    }

    /// Check every field, frequencies against this snapshot's sample rate.
    pub fn validate(&self) -> Result<(), ReverbError> {
        self.structure().validate()?;
        validate_unit_interval("wet_gain", self.wet_gain)?;
        validate_unit_interval("cross_stereo_mix", self.cross_stereo_mix)?;
        validate_multiplier("hf_decay_multiplier", self.hf_decay_multiplier)?;
        validate_multiplier("hf_slow_decay_multiplier", self.hf_slow_decay_multiplier)?;
        validate_frequency("hf_decay_fc", self.hf_decay_fc, self.sample_rate)?;
        validate_frequency("highpass_fc", self.highpass_fc, self.sample_rate)?;
        validate_frequency("lowpass_fc", self.lowpass_fc, self.sample_rate)?;
        validate_decay_time("rt60", self.rt60)?;
        validate_decay_time("slow_decay_rt60", self.slow_decay_rt60)
    }
}

impl Default for ReverbSettings {
    fn default() -> Self {
        Self::from_parts(ImmediateSettings::default(), StructuralSettings::default())
    }
}

pub(crate) fn validate_unit_interval(name: &'static str, value: f32) -> Result<(), ReverbError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ReverbError::invalid(name, value, "must be within [0, 1]"))
    }
}

pub(crate) fn validate_multiplier(name: &'static str, value: f32) -> Result<(), ReverbError> {
    if value.is_finite() && value >= 1.0 {
        Ok(())
    } else {
        Err(ReverbError::invalid(name, value, "must be finite and >= 1"))
    }
}

pub(crate) fn validate_frequency(
    name: &'static str,
    value: f32,
    sample_rate: f32,
) -> Result<(), ReverbError> {
    if value.is_finite() && value > 0.0 && value < 0.5 * sample_rate {
        Ok(())
    } else {
        Err(ReverbError::invalid(name, value, "must be > 0 and below Nyquist"))
    }
}

pub(crate) fn validate_decay_time(name: &'static str, value: f32) -> Result<(), ReverbError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ReverbError::invalid(name, value, "must be finite and > 0 seconds"))
    }
}

pub(crate) fn validate_delay_units(value: usize) -> Result<(), ReverbError> {
    if (1..=MAX_DELAY_UNITS).contains(&value) {
        Ok(())
    } else {
        Err(ReverbError::invalid("delay_units", value as f64, "must be within [1, 64]"))
    }
}

pub(crate) fn validate_pre_delay(value: f32) -> Result<(), ReverbError> {
    if (0.0..=MAX_DELAY_SECONDS).contains(&value) {
        Ok(())
    } else {
        Err(ReverbError::invalid("pre_delay", value, "must be within [0, 1] seconds"))
    }
}

pub(crate) fn validate_room_size(value: f32) -> Result<(), ReverbError> {
    if value > 0.0 && value <= MAX_DELAY_SECONDS {
        Ok(())
    } else {
        Err(ReverbError::invalid("room_size", value, "must be > 0 and at most 1 second"))
    }
}

pub(crate) fn validate_sample_rate(value: f32) -> Result<(), ReverbError> {
    if value.is_finite() && (MIN_SAMPLE_RATE..=MAX_SAMPLE_RATE).contains(&value) {
        Ok(())
    } else {
        Err(ReverbError::invalid("sample_rate", value, "must be within [1000, 768000] Hz"))
    }
}
