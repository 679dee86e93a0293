//! Thread-safe settings store and control handle.
//!
//! [`ReverbControl`] is the bridge between a control thread (UI, automation)
//! and the audio thread. Immediate settings live in atomics (f32 bit-cast to
//! `u32`) with a revision counter the audio thread polls at block start.
//! Structural settings are published as an `ArcSwap` snapshot plus an
//! atomic pending flag; the audio thread swaps the flag off and applies the
//! snapshot before it touches any delay storage.
//!
//! No setter ever touches delay buffers or filter state, so every setter is
//! safe to call while [`Reverb::process_buffer`](crate::Reverb::process_buffer)
//! runs on another thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicU64, Ordering};

use arc_swap::ArcSwap;
use tracing::{debug, warn};

use crate::error::ReverbError;
use crate::settings::{
    ImmediateSettings, ReverbSettings, StructuralSettings, validate_decay_time,
    validate_delay_units, validate_frequency, validate_multiplier, validate_pre_delay,
    validate_room_size, validate_sample_rate, validate_unit_interval,
};

/// An `f32` stored as its bit pattern for lock-free access.
#[derive(Debug)]
pub(crate) struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub(crate) fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    pub(crate) fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Acquire))
    }

    #[inline]
    pub(crate) fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Release);
    }
}

/// Where the parameter controller is in its apply cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ControllerState {
    /// All requested settings are applied.
    Active = 0,
    /// A structural change is waiting for the next block boundary.
    PendingStructural = 1,
    /// The audio thread is rebuilding the delay network.
    Applying = 2,
}

impl ControllerState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::PendingStructural,
            2 => Self::Applying,
            _ => Self::Active,
        }
    }
}

/// Shared storage behind every [`ReverbControl`] clone.
#[derive(Debug)]
pub(crate) struct SharedSettings {
    wet_gain: AtomicF32,
    cross_stereo_mix: AtomicF32,
    hf_decay_multiplier: AtomicF32,
    hf_slow_decay_multiplier: AtomicF32,
    hf_decay_fc: AtomicF32,
    rt60: AtomicF32,
    slow_decay_rt60: AtomicF32,
    highpass_fc: AtomicF32,
    lowpass_fc: AtomicF32,
    slow_decay: AtomicBool,
    auto_sustain: AtomicBool,

    /// Bumped after every change to a coefficient-affecting immediate field.
    revision: AtomicU64,

    /// Latest requested structure.
    requested: ArcSwap<StructuralSettings>,
    /// Set by structural setters, cleared by the audio thread.
    pending: AtomicBool,
    state: AtomicU8,
}

impl SharedSettings {
    pub(crate) fn new(settings: &ReverbSettings) -> Self {
        Self {
            wet_gain: AtomicF32::new(settings.wet_gain),
            cross_stereo_mix: AtomicF32::new(settings.cross_stereo_mix),
            hf_decay_multiplier: AtomicF32::new(settings.hf_decay_multiplier),
            hf_slow_decay_multiplier: AtomicF32::new(settings.hf_slow_decay_multiplier),
            hf_decay_fc: AtomicF32::new(settings.hf_decay_fc),
            rt60: AtomicF32::new(settings.rt60),
            slow_decay_rt60: AtomicF32::new(settings.slow_decay_rt60),
            highpass_fc: AtomicF32::new(settings.highpass_fc),
            lowpass_fc: AtomicF32::new(settings.lowpass_fc),
            slow_decay: AtomicBool::new(settings.slow_decay),
            auto_sustain: AtomicBool::new(settings.auto_sustain),
            revision: AtomicU64::new(0),
            requested: ArcSwap::from_pointee(settings.structure()),
            pending: AtomicBool::new(false),
            state: AtomicU8::new(ControllerState::Active as u8),
        }
    }

    pub(crate) fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.revision.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn immediate(&self) -> ImmediateSettings {
        ImmediateSettings {
            wet_gain: self.wet_gain.load(),
            cross_stereo_mix: self.cross_stereo_mix.load(),
            hf_decay_multiplier: self.hf_decay_multiplier.load(),
            hf_slow_decay_multiplier: self.hf_slow_decay_multiplier.load(),
            hf_decay_fc: self.hf_decay_fc.load(),
            rt60: self.rt60.load(),
            slow_decay_rt60: self.slow_decay_rt60.load(),
            highpass_fc: self.highpass_fc.load(),
            lowpass_fc: self.lowpass_fc.load(),
            slow_decay: self.slow_decay.load(Ordering::Acquire),
            auto_sustain: self.auto_sustain.load(Ordering::Acquire),
        }
    }

    pub(crate) fn slow_decay(&self) -> bool {
        self.slow_decay.load(Ordering::Acquire)
    }

    pub(crate) fn store_slow_decay(&self, value: bool) {
        self.slow_decay.store(value, Ordering::Release);
    }

    pub(crate) fn auto_sustain(&self) -> bool {
        self.auto_sustain.load(Ordering::Acquire)
    }

    pub(crate) fn requested_structure(&self) -> StructuralSettings {
        **self.requested.load()
    }

    /// Take the pending structural snapshot, if any, entering `Applying`.
    pub(crate) fn take_pending(&self) -> Option<StructuralSettings> {
        if !self.pending.swap(false, Ordering::AcqRel) {
            return None;
        }
        self.state.store(ControllerState::Applying as u8, Ordering::Release);
        Some(self.requested_structure())
    }

    /// Leave `Applying`, unless a newer request arrived meanwhile.
    pub(crate) fn finish_apply(&self) {
        if self.pending.load(Ordering::Acquire) {
            self.state.store(ControllerState::PendingStructural as u8, Ordering::Release);
            return;
        }
        let _ = self.state.compare_exchange(
            ControllerState::Applying as u8,
            ControllerState::Active as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    fn request_structure(&self, update: impl Fn(&mut StructuralSettings)) {
        self.requested.rcu(|current| {
            let mut next = **current;
            update(&mut next);
            next
        });
        // State first: a concurrent finish_apply must see either the state
        // or the flag
        self.state.store(ControllerState::PendingStructural as u8, Ordering::Release);
        self.pending.store(true, Ordering::Release);
    }

    pub(crate) fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::Acquire))
    }
}

fn rejected(err: ReverbError) -> ReverbError {
    warn!("rejected reverb parameter: {err}");
    err
}

/// Cloneable, thread-safe handle to a reverb's settings.
///
/// Obtained from [`Reverb::control`](crate::Reverb::control). Every setter
/// validates its argument and returns [`ReverbError::InvalidParameter`]
/// without changing anything when it is out of range. The handle keeps the
/// settings store alive by itself, so it may outlive the reverb.
///
/// # Example
///
/// ```rust
/// use sala_reverb::Reverb;
///
/// let reverb = Reverb::new();
/// let control = reverb.control();
///
/// std::thread::spawn(move || {
///     control.set_rt60_decay_time(2.3).unwrap();
///     control.set_room_size(0.2).unwrap();
/// })
/// .join()
/// .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct ReverbControl {
    shared: Arc<SharedSettings>,
}

impl ReverbControl {
    pub(crate) fn new(shared: Arc<SharedSettings>) -> Self {
        Self { shared }
    }

    fn nyquist_checked(&self, name: &'static str, hz: f32) -> Result<(), ReverbError> {
        let sample_rate = self.shared.requested_structure().sample_rate;
        validate_frequency(name, hz, sample_rate).map_err(rejected)
    }

    /// Set the wet gain in `[0, 1]`. The dry gain follows as
    /// `sqrt(1 - wet^2)`.
    pub fn set_wet_gain(&self, wet_gain: f32) -> Result<(), ReverbError> {
        validate_unit_interval("wet_gain", wet_gain).map_err(rejected)?;
        self.shared.wet_gain.store(wet_gain);
        self.shared.bump();
        Ok(())
    }

    /// Set the left/right wet blend in `[0, 1]`.
    pub fn set_cross_stereo_mix(&self, mix: f32) -> Result<(), ReverbError> {
        validate_unit_interval("cross_stereo_mix", mix).map_err(rejected)?;
        self.shared.cross_stereo_mix.store(mix);
        self.shared.bump();
        Ok(())
    }

    /// Set how many times faster high frequencies decay (>= 1).
    pub fn set_hf_decay_multiplier(&self, multiplier: f32) -> Result<(), ReverbError> {
        validate_multiplier("hf_decay_multiplier", multiplier).map_err(rejected)?;
        self.shared.hf_decay_multiplier.store(multiplier);
        self.shared.bump();
        Ok(())
    }

    /// Set the HF decay multiplier used while sustaining (>= 1).
    pub fn set_hf_slow_decay_multiplier(&self, multiplier: f32) -> Result<(), ReverbError> {
        validate_multiplier("hf_slow_decay_multiplier", multiplier).map_err(rejected)?;
        self.shared.hf_slow_decay_multiplier.store(multiplier);
        self.shared.bump();
        Ok(())
    }

    /// Set the HF decay shelf corner in Hz.
    pub fn set_hf_decay_fc(&self, hz: f32) -> Result<(), ReverbError> {
        self.nyquist_checked("hf_decay_fc", hz)?;
        self.shared.hf_decay_fc.store(hz);
        self.shared.bump();
        Ok(())
    }

    /// Set the decay time to -60 dB in seconds.
    pub fn set_rt60_decay_time(&self, seconds: f32) -> Result<(), ReverbError> {
        validate_decay_time("rt60", seconds).map_err(rejected)?;
        self.shared.rt60.store(seconds);
        self.shared.bump();
        Ok(())
    }

    /// Set the decay time used while sustaining, in seconds.
    pub fn set_slow_decay_rt60(&self, seconds: f32) -> Result<(), ReverbError> {
        validate_decay_time("slow_decay_rt60", seconds).map_err(rejected)?;
        self.shared.slow_decay_rt60.store(seconds);
        self.shared.bump();
        Ok(())
    }

    /// Switch between the normal and sustain decay sets.
    ///
    /// With auto-sustain enabled this stands until the input level next
    /// crosses a sustain threshold.
    pub fn set_slow_decay_state(&self, slow_decay: bool) {
        self.shared.store_slow_decay(slow_decay);
    }

    /// Enable or disable level-driven sustain.
    pub fn set_auto_sustain(&self, enabled: bool) {
        self.shared.auto_sustain.store(enabled, Ordering::Release);
    }

    /// Set the output high-pass corner in Hz.
    pub fn set_high_pass_fc(&self, hz: f32) -> Result<(), ReverbError> {
        self.nyquist_checked("highpass_fc", hz)?;
        self.shared.highpass_fc.store(hz);
        self.shared.bump();
        Ok(())
    }

    /// Set the output low-pass corner in Hz.
    pub fn set_low_pass_fc(&self, hz: f32) -> Result<(), ReverbError> {
        self.nyquist_checked("lowpass_fc", hz)?;
        self.shared.lowpass_fc.store(hz);
        self.shared.bump();
        Ok(())
    }

    /// Request a new number of delay units (1 to 64). Applied at the start
    /// of the next processed block.
    pub fn set_num_delay_units(&self, units: usize) -> Result<(), ReverbError> {
        validate_delay_units(units).map_err(rejected)?;
        self.shared.request_structure(|s| s.delay_units = units);
        debug!(units, "queued delay unit change");
        Ok(())
    }

    /// Request a new pre-delay in seconds. Applied at the next block.
    pub fn set_pre_delay(&self, seconds: f32) -> Result<(), ReverbError> {
        validate_pre_delay(seconds).map_err(rejected)?;
        self.shared.request_structure(|s| s.pre_delay = seconds);
        debug!(seconds, "queued pre-delay change");
        Ok(())
    }

    /// Request a new room size (longest delay) in seconds. Applied at the
    /// next block.
    pub fn set_room_size(&self, seconds: f32) -> Result<(), ReverbError> {
        validate_room_size(seconds).map_err(rejected)?;
        self.shared.request_structure(|s| s.room_size = seconds);
        debug!(seconds, "queued room size change");
        Ok(())
    }

    /// Request a new sample rate in Hz. Applied at the next block.
    ///
    /// Rejected if any current filter corner would sit at or above the new
    /// Nyquist frequency; lower that corner first.
    pub fn set_sample_rate(&self, hz: f32) -> Result<(), ReverbError> {
        validate_sample_rate(hz).map_err(rejected)?;
        let s = &self.shared;
        validate_frequency("hf_decay_fc", s.hf_decay_fc.load(), hz).map_err(rejected)?;
        validate_frequency("highpass_fc", s.highpass_fc.load(), hz).map_err(rejected)?;
        validate_frequency("lowpass_fc", s.lowpass_fc.load(), hz).map_err(rejected)?;
        self.shared.request_structure(|s| s.sample_rate = hz);
        debug!(hz, "queued sample rate change");
        Ok(())
    }

    /// Current wet gain.
    pub fn wet_gain(&self) -> f32 {
        self.shared.wet_gain.load()
    }

    /// Current dry gain, `sqrt(1 - wet^2)`.
    pub fn dry_gain(&self) -> f32 {
        self.shared.immediate().dry_gain()
    }

    /// Whether the sustain decay set is selected.
    pub fn slow_decay(&self) -> bool {
        self.shared.slow_decay()
    }

    /// Snapshot of all settings: current immediate values plus the most
    /// recently requested structure.
    pub fn settings(&self) -> ReverbSettings {
        ReverbSettings::from_parts(self.shared.immediate(), self.shared.requested_structure())
    }

    /// Apply every field of `settings`, validating the whole snapshot first.
    ///
    /// Structural fields are queued only if they differ from the current
    /// request.
    pub fn apply(&self, settings: &ReverbSettings) -> Result<(), ReverbError> {
        settings.validate().map_err(rejected)?;

        let s = &self.shared;
        s.wet_gain.store(settings.wet_gain);
        s.cross_stereo_mix.store(settings.cross_stereo_mix);
        s.hf_decay_multiplier.store(settings.hf_decay_multiplier);
        s.hf_slow_decay_multiplier.store(settings.hf_slow_decay_multiplier);
        s.hf_decay_fc.store(settings.hf_decay_fc);
        s.rt60.store(settings.rt60);
        s.slow_decay_rt60.store(settings.slow_decay_rt60);
        s.highpass_fc.store(settings.highpass_fc);
        s.lowpass_fc.store(settings.lowpass_fc);
        s.store_slow_decay(settings.slow_decay);
        s.auto_sustain.store(settings.auto_sustain, Ordering::Release);
        s.bump();

        let structure = settings.structure();
        if structure != s.requested_structure() {
            s.request_structure(|current| *current = structure);
            debug!(?structure, "queued structural change");
        }
        Ok(())
    }

    /// Controller state.
    pub fn state(&self) -> ControllerState {
        self.shared.state()
    }
}
