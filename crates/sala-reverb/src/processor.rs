//! Block processing: the reverb engine itself.
//!
//! Per sample:
//!
//! ```text
//!  feedback ──▶ DelayNetwork ──▶ outputs ──▶ MixingMatrix ──▶ shelves ──▶ x gain ──┐
//!     ▲                             │                                             │
//!     └───────────────── + input * inputAttenuation ◀──────────────────────────────┘
//!                                   │
//!                                   └──▶ signed taps ──▶ cross mix ──▶ HP ──▶ LP ──▶ wet
//! ```
//!
//! `out = wet_gain * wet + dry_gain * dry`; the dry signal is never filtered.
//! Caller blocks of any length are processed in internal chunks of
//! [`CHUNK_SIZE`] samples, and output does not depend on how a stream is
//! split into blocks.

use tracing::{debug, error};

use sala_core::{PortableVectorMath, Strided, StridedMut, VectorMath};

use crate::control::{ControllerState, ReverbControl, SharedSettings};
use crate::controller::ParameterController;
use crate::decay_filter::DecayFilterBank;
use crate::error::ReverbError;
use crate::mixing::MixingMatrix;
use crate::network::{DelayNetwork, delay_lengths, try_zeroed};
use crate::settings::{ImmediateSettings, ReverbSettings, StructuralSettings};
use crate::sustain::AutoSustain;

use std::sync::Arc;

/// Largest number of samples processed between settings checks.
pub const CHUNK_SIZE: usize = 256;

/// Everything whose size depends on the structural settings.
#[derive(Debug)]
struct Topology {
    network: DelayNetwork,
    mixing: MixingMatrix,
    filters: DecayFilterBank,
    /// Line outputs for the current sample
    outputs: Vec<f32>,
    /// Mixed and permuted outputs
    mixed: Vec<f32>,
    shelved: Vec<f32>,
    /// Per-line input injection for the current sample
    injection: Vec<f32>,
    /// Values written into the lines on the next sample
    feedback: Vec<f32>,
    input_attenuation: f32,
}

impl Topology {
    fn build<V: VectorMath>(vm: &V, structure: &StructuralSettings) -> Result<Self, ReverbError> {
        let n = structure.num_delays();
        let lengths = delay_lengths(vm, structure)?;
        Ok(Self {
            network: DelayNetwork::new(&lengths)?,
            mixing: MixingMatrix::new(structure.delay_units)?,
            filters: DecayFilterBank::new(n)?,
            outputs: try_zeroed(n)?,
            mixed: try_zeroed(n)?,
            shelved: try_zeroed(n)?,
            injection: try_zeroed(n)?,
            feedback: try_zeroed(n)?,
            input_attenuation: 1.0 / libm::sqrtf(n as f32 / 2.0),
        })
    }

    fn units(&self) -> usize {
        self.mixing.units()
    }
}

/// Stereo feedback delay network reverb.
///
/// Generic over the vector-math backend; [`PortableVectorMath`] is the
/// default. Settings may be changed through the setters here or, from other
/// threads, through a [`ReverbControl`] handle.
///
/// # Example
///
/// ```rust
/// use sala_reverb::Reverb;
///
/// let mut reverb = Reverb::new();
/// reverb.set_rt60_decay_time(1.3).unwrap();
/// reverb.set_wet_gain(1.0).unwrap();
///
/// let mut in_l = [0.0f32; 128];
/// let mut in_r = [0.0f32; 128];
/// in_l[0] = 1.0;
/// in_r[0] = 1.0;
/// let mut out_l = [0.0f32; 128];
/// let mut out_r = [0.0f32; 128];
/// reverb.process_buffer(&in_l, &in_r, &mut out_l, &mut out_r);
/// assert!(out_l.iter().chain(&out_r).all(|s| s.is_finite()));
/// ```
#[derive(Debug)]
pub struct Reverb<V: VectorMath = PortableVectorMath> {
    vm: V,
    control: ReverbControl,
    controller: ParameterController,
    topology: Topology,
    sustain: AutoSustain,
    auto_sustain: bool,
    /// `slow_decay` as it was when auto-sustain last engaged.
    slow_before_sustain: bool,
    slow_active: bool,
    wet_gain: f32,
    dry_gain: f32,
    wet_left: [f32; CHUNK_SIZE],
    wet_right: [f32; CHUNK_SIZE],
}

impl Reverb {
    /// Create a reverb with default settings and the portable backend.
    pub fn new() -> Self {
        match Self::with_settings(ReverbSettings::default()) {
            Ok(reverb) => reverb,
            Err(e) => panic!("default reverb construction failed: {e}"),
        }
    }

    /// Create a reverb from a validated settings snapshot.
    pub fn with_settings(settings: ReverbSettings) -> Result<Self, ReverbError> {
        Self::with_vector_math(settings, PortableVectorMath)
    }
}

impl Default for Reverb {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VectorMath> Reverb<V> {
    /// Create a reverb with an explicit vector-math backend.
    pub fn with_vector_math(settings: ReverbSettings, vm: V) -> Result<Self, ReverbError> {
        settings.validate()?;

        let shared = Arc::new(SharedSettings::new(&settings));
        let controller = ParameterController::new(Arc::clone(&shared));
        let structure = settings.structure();
        let topology = Topology::build(&vm, &structure)?;

        let mut reverb = Self {
            vm,
            control: ReverbControl::new(shared),
            controller,
            topology,
            sustain: AutoSustain::new(structure.sample_rate),
            auto_sustain: settings.auto_sustain,
            slow_before_sustain: settings.slow_decay,
            slow_active: settings.slow_decay,
            wet_gain: settings.wet_gain,
            dry_gain: settings.dry_gain(),
            wet_left: [0.0; CHUNK_SIZE],
            wet_right: [0.0; CHUNK_SIZE],
        };
        reverb.topology.filters.select(reverb.slow_active);
        reverb.apply_immediate(&settings.immediate());
        debug!(
            units = structure.delay_units,
            sample_rate = structure.sample_rate,
            lengths = ?reverb.topology.network.lengths(),
            "reverb initialised"
        );
        Ok(reverb)
    }

    /// Process one block.
    ///
    /// All four slices must have the same length. Any queued structural
    /// change is applied before the first sample; immediate settings are
    /// picked up at the start of every internal chunk.
    ///
    /// # Panics
    ///
    /// Panics if the slice lengths differ, or if delay storage for a queued
    /// structural change cannot be allocated.
    pub fn process_buffer(
        &mut self,
        input_left: &[f32],
        input_right: &[f32],
        output_left: &mut [f32],
        output_right: &mut [f32],
    ) {
        let count = input_left.len();
        assert!(
            input_right.len() == count && output_left.len() == count && output_right.len() == count,
            "process_buffer: mismatched block lengths"
        );

        self.apply_pending_structure();

        let mut offset = 0;
        while offset < count {
            let end = (offset + CHUNK_SIZE).min(count);
            self.refresh_settings();
            self.process_chunk(
                &input_left[offset..end],
                &input_right[offset..end],
                &mut output_left[offset..end],
                &mut output_right[offset..end],
            );
            offset = end;
        }
    }

    fn apply_pending_structure(&mut self) {
        let Some(structure) = self.controller.take_pending() else {
            return;
        };

        match Topology::build(&self.vm, &structure) {
            Ok(topology) => {
                self.topology = topology;
                self.sustain.set_sample_rate(structure.sample_rate);
                self.controller.finish_apply(structure);
                self.topology.filters.select(self.slow_active);
                let immediate = self.controller.immediate();
                self.apply_immediate(&immediate);
                debug!(
                    units = structure.delay_units,
                    sample_rate = structure.sample_rate,
                    lengths = ?self.topology.network.lengths(),
                    "applied reverb structure"
                );
            }
            Err(e) => {
                error!(%e, ?structure, "reverb reconfiguration failed");
                panic!("reverb reconfiguration failed: {e}");
            }
        }
    }

    fn refresh_settings(&mut self) {
        if let Some(immediate) = self.controller.poll_immediate() {
            self.apply_immediate(&immediate);
        }
        let auto_sustain = self.controller.auto_sustain();
        if self.auto_sustain && !auto_sustain {
            self.release_auto_sustain();
        }
        self.auto_sustain = auto_sustain;

        let slow = self.controller.slow_decay();
        if slow != self.slow_active {
            self.select_decay(slow);
        }
    }

    /// Recompute every gain and coefficient derived from immediate settings.
    fn apply_immediate(&mut self, settings: &ImmediateSettings) {
        let sample_rate = self.controller.structure().sample_rate;
        let t = &mut self.topology;

        t.network.compute_decay_gains(settings.rt60, settings.slow_decay_rt60, sample_rate);
        let network = &t.network;
        t.filters.compute(|i| network.loop_length(i), settings, sample_rate);
        t.mixing.set_cross_stereo_mix(settings.cross_stereo_mix);

        self.wet_gain = settings.wet_gain;
        self.dry_gain = settings.dry_gain();
    }

    /// Hand `slow_decay` back once auto-sustain is switched off.
    fn release_auto_sustain(&mut self) {
        // A manual switch made while sustaining stands
        if self.sustain.is_sustaining() && self.controller.slow_decay() {
            self.controller.store_slow_decay(self.slow_before_sustain);
        }
        self.sustain.reset();
    }

    fn select_decay(&mut self, slow: bool) {
        self.slow_active = slow;
        self.topology.filters.select(slow);
    }

    fn process_chunk(&mut self, in_l: &[f32], in_r: &[f32], out_l: &mut [f32], out_r: &mut [f32]) {
        let len = in_l.len();

        for k in 0..len {
            let (l, r) = (in_l[k], in_r[k]);
            if self.auto_sustain {
                if let Some(slow) = self.sustain.process(0.5 * (l + r)) {
                    if slow {
                        self.slow_before_sustain = self.controller.slow_decay();
                    }
                    self.controller.store_slow_decay(slow);
                    self.select_decay(slow);
                }
            }
            let (wet_l, wet_r) = self.tick(l, r);
            self.wet_left[k] = wet_l;
            self.wet_right[k] = wet_r;
        }

        self.topology
            .filters
            .process_output(&mut self.wet_left[..len], &mut self.wet_right[..len]);

        let vm = &self.vm;
        vm.scale_add_scale(
            Strided::unit(&self.wet_left[..len]),
            self.wet_gain,
            Strided::unit(in_l),
            self.dry_gain,
            StridedMut::unit(out_l),
            len,
        );
        vm.scale_add_scale(
            Strided::unit(&self.wet_right[..len]),
            self.wet_gain,
            Strided::unit(in_r),
            self.dry_gain,
            StridedMut::unit(out_r),
            len,
        );
    }

    /// Advance the network one sample; returns the unfiltered wet pair.
    #[inline]
    fn tick(&mut self, left: f32, right: f32) -> (f32, f32) {
        let vm = &self.vm;
        let t = &mut self.topology;
        let n = t.network.len();
        let units = t.units();

        t.network.advance_sample(vm, &t.feedback, &mut t.outputs);
        t.mixing.mix(vm, &t.outputs, &mut t.mixed);
        t.filters.process_feedback(&t.mixed, &mut t.shelved);

        let (l, r) = (left * t.input_attenuation, right * t.input_attenuation);
        vm.fill(l, StridedMut::new(&mut t.injection, 4), units);
        vm.fill(l, StridedMut::new(&mut t.injection[1..], 4), units);
        vm.fill(r, StridedMut::new(&mut t.injection[2..], 4), units);
        vm.fill(r, StridedMut::new(&mut t.injection[3..], 4), units);

        vm.mul_add(
            Strided::unit(&t.shelved),
            Strided::unit(t.network.decay_gains(self.slow_active)),
            Strided::unit(&t.injection),
            StridedMut::unit(&mut t.feedback),
            n,
        );

        t.mixing.tap(vm, &t.outputs)
    }

    /// Silence the tail: clears delay lines, feedback registers, filter
    /// state and the sustain envelope. Settings are untouched.
    pub fn reset(&mut self) {
        let t = &mut self.topology;
        t.network.clear();
        t.feedback.fill(0.0);
        t.filters.reset();
        self.sustain.reset();
    }

    /// A cloneable handle for changing settings from other threads.
    pub fn control(&self) -> ReverbControl {
        self.control.clone()
    }

    /// Snapshot of current immediate settings and the latest requested
    /// structure.
    pub fn settings(&self) -> ReverbSettings {
        self.control.settings()
    }

    /// Structure the engine is currently running.
    pub fn active_structure(&self) -> StructuralSettings {
        self.controller.structure()
    }

    /// Parameter controller state.
    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    /// Active delay-line lengths in samples, unit by unit.
    pub fn delay_lengths(&self) -> &[usize] {
        self.topology.network.lengths()
    }

    /// Active number of delay lines.
    pub fn num_delays(&self) -> usize {
        self.topology.network.len()
    }

    /// Current wet gain.
    pub fn wet_gain(&self) -> f32 {
        self.control.wet_gain()
    }

    /// Current dry gain, `sqrt(1 - wet_gain^2)`.
    pub fn dry_gain(&self) -> f32 {
        self.control.dry_gain()
    }

    /// Whether the sustain decay set is selected.
    pub fn slow_decay(&self) -> bool {
        self.control.slow_decay()
    }

    /// See [`ReverbControl::set_wet_gain`].
    pub fn set_wet_gain(&mut self, wet_gain: f32) -> Result<(), ReverbError> {
        self.control.set_wet_gain(wet_gain)
    }

    /// See [`ReverbControl::set_cross_stereo_mix`].
    pub fn set_cross_stereo_mix(&mut self, mix: f32) -> Result<(), ReverbError> {
        self.control.set_cross_stereo_mix(mix)
    }

    /// See [`ReverbControl::set_hf_decay_multiplier`].
    pub fn set_hf_decay_multiplier(&mut self, multiplier: f32) -> Result<(), ReverbError> {
        self.control.set_hf_decay_multiplier(multiplier)
    }

    /// See [`ReverbControl::set_hf_slow_decay_multiplier`].
    pub fn set_hf_slow_decay_multiplier(&mut self, multiplier: f32) -> Result<(), ReverbError> {
        self.control.set_hf_slow_decay_multiplier(multiplier)
    }

    /// See [`ReverbControl::set_hf_decay_fc`].
    pub fn set_hf_decay_fc(&mut self, hz: f32) -> Result<(), ReverbError> {
        self.control.set_hf_decay_fc(hz)
    }

    /// See [`ReverbControl::set_rt60_decay_time`].
    pub fn set_rt60_decay_time(&mut self, seconds: f32) -> Result<(), ReverbError> {
        self.control.set_rt60_decay_time(seconds)
    }

    /// See [`ReverbControl::set_slow_decay_rt60`].
    pub fn set_slow_decay_rt60(&mut self, seconds: f32) -> Result<(), ReverbError> {
        self.control.set_slow_decay_rt60(seconds)
    }

    /// See [`ReverbControl::set_slow_decay_state`].
    pub fn set_slow_decay_state(&mut self, slow_decay: bool) {
        self.control.set_slow_decay_state(slow_decay);
    }

    /// See [`ReverbControl::set_auto_sustain`].
    pub fn set_auto_sustain(&mut self, enabled: bool) {
        self.control.set_auto_sustain(enabled);
    }

    /// See [`ReverbControl::set_high_pass_fc`].
    pub fn set_high_pass_fc(&mut self, hz: f32) -> Result<(), ReverbError> {
        self.control.set_high_pass_fc(hz)
    }

    /// See [`ReverbControl::set_low_pass_fc`].
    pub fn set_low_pass_fc(&mut self, hz: f32) -> Result<(), ReverbError> {
        self.control.set_low_pass_fc(hz)
    }

    /// See [`ReverbControl::set_num_delay_units`].
    pub fn set_num_delay_units(&mut self, units: usize) -> Result<(), ReverbError> {
        self.control.set_num_delay_units(units)
    }

    /// See [`ReverbControl::set_pre_delay`].
    pub fn set_pre_delay(&mut self, seconds: f32) -> Result<(), ReverbError> {
        self.control.set_pre_delay(seconds)
    }

    /// See [`ReverbControl::set_room_size`].
    pub fn set_room_size(&mut self, seconds: f32) -> Result<(), ReverbError> {
        self.control.set_room_size(seconds)
    }

    /// See [`ReverbControl::set_sample_rate`].
    pub fn set_sample_rate(&mut self, hz: f32) -> Result<(), ReverbError> {
        self.control.set_sample_rate(hz)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_response(reverb: &mut Reverb, blocks: usize, block: usize) -> (Vec<f32>, Vec<f32>) {
        let mut left = Vec::with_capacity(blocks * block);
        let mut right = Vec::with_capacity(blocks * block);
        let mut in_l = vec![0.0; block];
        let mut in_r = vec![0.0; block];
        let mut out_l = vec![0.0; block];
        let mut out_r = vec![0.0; block];
        for b in 0..blocks {
            in_l[0] = if b == 0 { 1.0 } else { 0.0 };
            in_r[0] = in_l[0];
            reverb.process_buffer(&in_l, &in_r, &mut out_l, &mut out_r);
            left.extend_from_slice(&out_l);
            right.extend_from_slice(&out_r);
        }
        (left, right)
    }

    #[test]
    fn dry_only_passes_input() {
        let mut reverb = Reverb::new();
        reverb.set_wet_gain(0.0).unwrap();
        let input = [0.5, -0.25, 1.0, 0.0];
        let mut out_l = [0.0; 4];
        let mut out_r = [0.0; 4];
        reverb.process_buffer(&input, &input, &mut out_l, &mut out_r);
        assert_eq!(out_l, input);
        assert_eq!(out_r, input);
    }

    #[test]
    fn first_wet_arrival_is_one_loop_after_the_impulse() {
        let mut reverb = Reverb::new();
        reverb.set_wet_gain(1.0).unwrap();
        reverb.set_cross_stereo_mix(0.0).unwrap();
        let shortest = *reverb.delay_lengths().iter().min().unwrap();

        let (left, _) = impulse_response(&mut reverb, 8, 128);
        let first = left.iter().position(|&s| s != 0.0).unwrap();
        assert_eq!(first, shortest + 1);
    }

    #[test]
    fn structural_change_waits_for_next_block() {
        let mut reverb = Reverb::new();
        reverb.set_num_delay_units(2).unwrap();
        assert_eq!(reverb.num_delays(), 16);
        assert_eq!(reverb.state(), ControllerState::PendingStructural);

        let mut out = [0.0; 8];
        let mut out_r = [0.0; 8];
        reverb.process_buffer(&[0.0; 8], &[0.0; 8], &mut out, &mut out_r);
        assert_eq!(reverb.num_delays(), 8);
        assert_eq!(reverb.active_structure().delay_units, 2);
        assert_eq!(reverb.state(), ControllerState::Active);
    }

    #[test]
    fn reset_silences_tail() {
        let mut reverb = Reverb::new();
        reverb.set_wet_gain(1.0).unwrap();
        let _ = impulse_response(&mut reverb, 4, 128);
        reverb.reset();

        let mut out_l = [1.0; 512];
        let mut out_r = [1.0; 512];
        reverb.process_buffer(&[0.0; 512], &[0.0; 512], &mut out_l, &mut out_r);
        assert!(out_l.iter().chain(&out_r).all(|&s| s == 0.0));
    }

    #[test]
    fn slow_decay_switch_reaches_audio_thread() {
        let mut reverb = Reverb::new();
        reverb.set_slow_decay_state(true);
        let mut out_l = [0.0; 4];
        let mut out_r = [0.0; 4];
        reverb.process_buffer(&[0.0; 4], &[0.0; 4], &mut out_l, &mut out_r);
        assert!(reverb.slow_active);
        assert!(reverb.topology.filters.slow_selected());
    }

    fn run_blocks(reverb: &mut Reverb, level: f32, blocks: usize) {
        let input = [level; 2048];
        let mut out_l = [0.0; 2048];
        let mut out_r = [0.0; 2048];
        for _ in 0..blocks {
            reverb.process_buffer(&input, &input, &mut out_l, &mut out_r);
        }
    }

    #[test]
    fn disabling_auto_sustain_releases_slow_decay() {
        let mut reverb = Reverb::new();
        reverb.set_auto_sustain(true);
        run_blocks(&mut reverb, 0.5, 1);
        assert!(reverb.slow_decay());

        reverb.set_auto_sustain(false);
        run_blocks(&mut reverb, 0.0, 1);
        assert!(!reverb.slow_decay());
        assert!(!reverb.slow_active);
        assert!(!reverb.sustain.is_sustaining());
    }

    #[test]
    fn disabling_auto_sustain_restores_manual_slow_decay() {
        let mut reverb = Reverb::new();
        reverb.set_slow_decay_state(true);
        reverb.set_auto_sustain(true);
        run_blocks(&mut reverb, 0.5, 1);

        reverb.set_auto_sustain(false);
        run_blocks(&mut reverb, 0.0, 1);
        assert!(reverb.slow_decay());
    }

    #[test]
    fn manual_switch_while_sustaining_survives_disable() {
        let mut reverb = Reverb::new();
        reverb.set_auto_sustain(true);
        run_blocks(&mut reverb, 0.5, 1);
        assert!(reverb.sustain.is_sustaining());

        reverb.set_slow_decay_state(false);
        reverb.set_auto_sustain(false);
        run_blocks(&mut reverb, 0.0, 1);
        assert!(!reverb.slow_decay());

        // Re-enabling starts from idle and engages again on loud input
        reverb.set_auto_sustain(true);
        run_blocks(&mut reverb, 0.5, 1);
        assert!(reverb.slow_decay());
    }

    #[test]
    fn auto_sustain_engages_on_loud_input() {
        let mut reverb = Reverb::new();
        reverb.set_auto_sustain(true);
        let loud = [0.5f32; 1024];
        let mut out_l = [0.0; 1024];
        let mut out_r = [0.0; 1024];
        reverb.process_buffer(&loud, &loud, &mut out_l, &mut out_r);
        assert!(reverb.slow_decay());
        assert!(reverb.slow_active);
    }

    #[test]
    #[should_panic]
    fn mismatched_lengths_panic() {
        let mut reverb = Reverb::new();
        let mut out_l = [0.0; 4];
        let mut out_r = [0.0; 3];
        reverb.process_buffer(&[0.0; 4], &[0.0; 4], &mut out_l, &mut out_r);
    }
}
