//! Delay network: the arena of circular delay lines.
//!
//! All `N = 4 * units` lines live in one contiguous buffer. Line `i` owns
//! `buffer[starts[i]..ends[i]]` and a single read/write cursor, stored as an
//! absolute index into the arena so the outputs of every line can be
//! collected with one gather.
//!
//! ```text
//! arena: | line 0 ........ | line 1 ............ | line 2 ... | ...
//!          ^start   ^cursor  ^start      ^cursor
//! ```
//!
//! Each sample, a line outputs the value under its cursor, stores its new
//! input in the same slot and steps forward, wrapping at its end. Because
//! the feedback written at sample `n` was computed from the outputs of
//! sample `n - 1`, a line of `L` samples forms a loop of `L + 1` samples;
//! decay gains are derived from that loop length.

use sala_core::{StridedMut, VectorMath, decay_gain};
use tracing::warn;

use crate::error::ReverbError;
use crate::settings::StructuralSettings;

/// Most samples of delay storage a structure may ask for.
///
/// Every valid [`StructuralSettings`] fits; anything larger is reported as
/// [`ReverbError::AllocationFailure`] before a length is chosen.
pub const MAX_DELAY_STORAGE: usize = 1 << 28;

/// Allocate a zeroed vector, reporting failure instead of aborting.
pub(crate) fn try_zeroed<T: Clone + Default>(len: usize) -> Result<Vec<T>, ReverbError> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| ReverbError::allocation(len))?;
    v.resize(len, T::default());
    Ok(v)
}

fn is_prime(n: usize) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            return false;
        }
        d += 2;
    }
    true
}

/// Smallest prime `>= n`, or `None` if it does not fit in `usize`.
fn next_prime(n: usize) -> Option<usize> {
    let mut candidate = n.max(2);
    while !is_prime(candidate) {
        candidate = candidate.checked_add(1)?;
    }
    Some(candidate)
}

/// Position within a unit for each rank of its four lengths.
///
/// The left pair (positions 0, 1) gets the shortest and longest, the right
/// pair (positions 2, 3) the two middle lengths, so both ears see a similar
/// spread of echo times.
const RANK_TO_POSITION: [usize; 4] = [0, 2, 3, 1];

/// Choose `4 * units` distinct prime delay lengths in samples.
///
/// Targets are spaced evenly from `pre_delay` to `room_size`, each moved up
/// to the next prime not already taken, so every pair of lengths is coprime.
/// Sorted lengths are dealt round-robin to units; within a unit they are
/// placed by [`RANK_TO_POSITION`]. The result is deterministic.
pub(crate) fn delay_lengths<V: VectorMath>(
    vm: &V,
    structure: &StructuralSettings,
) -> Result<Vec<usize>, ReverbError> {
    let n = structure.num_delays();
    let units = structure.delay_units;

    let lower = (structure.pre_delay * structure.sample_rate).max(2.0);
    let mut upper = structure.room_size * structure.sample_rate;
    // Leave room for the primes to spread out
    let min_upper = lower + 4.0 * n as f32;
    if upper < min_upper {
        warn!(
            pre_delay = structure.pre_delay,
            room_size = structure.room_size,
            "delay range too narrow for {n} lines, widening to {min_upper} samples"
        );
        upper = min_upper;
    }

    let requested = f64::from(upper) * n as f64;
    if !requested.is_finite() || requested > MAX_DELAY_STORAGE as f64 {
        return Err(ReverbError::allocation(requested as usize));
    }

    let mut targets: Vec<f32> = try_zeroed(n)?;
    let step = if n > 1 { (upper - lower) / (n - 1) as f32 } else { 0.0 };
    vm.ramp(lower, step, StridedMut::unit(&mut targets), n);

    let mut sorted: Vec<usize> = try_zeroed(n)?;
    let mut previous: usize = 0;
    for (slot, &target) in sorted.iter_mut().zip(&targets) {
        // Targets ascend, so the next prime above the previous pick is unused
        let length = previous
            .checked_add(1)
            .and_then(|floor| next_prime((target.round() as usize).max(floor)))
            .ok_or(ReverbError::allocation(usize::MAX))?;
        *slot = length;
        previous = length;
    }

    let mut lengths: Vec<usize> = try_zeroed(n)?;
    for (rank_overall, &length) in sorted.iter().enumerate() {
        let unit = rank_overall % units;
        let rank_in_unit = rank_overall / units;
        lengths[unit * 4 + RANK_TO_POSITION[rank_in_unit]] = length;
    }
    Ok(lengths)
}

/// The set of circular delay lines.
#[derive(Debug, Clone)]
pub struct DelayNetwork {
    buffer: Vec<f32>,
    lengths: Vec<usize>,
    starts: Vec<usize>,
    ends: Vec<usize>,
    cursors: Vec<usize>,
    decay_gains: Vec<f32>,
    slow_decay_gains: Vec<f32>,
}

impl DelayNetwork {
    /// Allocate lines of the given lengths, silent, cursors at their starts.
    pub fn new(lengths: &[usize]) -> Result<Self, ReverbError> {
        let n = lengths.len();
        let total = lengths
            .iter()
            .try_fold(0usize, |acc, &len| acc.checked_add(len))
            .ok_or(ReverbError::allocation(usize::MAX))?;

        let buffer = try_zeroed(total)?;
        let mut starts = try_zeroed(n)?;
        let mut ends = try_zeroed(n)?;
        let mut owned_lengths = try_zeroed(n)?;
        let mut decay_gains = try_zeroed(n)?;
        let mut slow_decay_gains = try_zeroed(n)?;

        let mut offset = 0;
        for (i, &length) in lengths.iter().enumerate() {
            debug_assert!(length > 0, "delay line {i} has zero length");
            starts[i] = offset;
            offset += length;
            ends[i] = offset;
            owned_lengths[i] = length;
        }
        decay_gains.fill(1.0);
        slow_decay_gains.fill(1.0);

        let mut cursors = try_zeroed(n)?;
        cursors.copy_from_slice(&starts);

        Ok(Self {
            buffer,
            cursors,
            lengths: owned_lengths,
            starts,
            ends,
            decay_gains,
            slow_decay_gains,
        })
    }

    /// Number of delay lines.
    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    /// Whether the network has no lines.
    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Line lengths in samples.
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Total samples of delay storage.
    pub fn total_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Feedback loop length of line `i` (line length plus the one-sample
    /// feedback register).
    pub fn loop_length(&self, i: usize) -> usize {
        self.lengths[i] + 1
    }

    /// Read every line's output, then write `inputs` in the same slots and
    /// advance.
    ///
    /// Both slices must hold at least [`len`](Self::len) samples.
    #[inline]
    pub fn advance_sample<V: VectorMath>(&mut self, vm: &V, inputs: &[f32], outputs: &mut [f32]) {
        let n = self.lengths.len();
        vm.gather(&self.buffer, &self.cursors, 1, StridedMut::unit(outputs), n);

        for (i, &input) in inputs[..n].iter().enumerate() {
            let cursor = self.cursors[i];
            self.buffer[cursor] = input;
            self.cursors[i] = if cursor + 1 == self.ends[i] { self.starts[i] } else { cursor + 1 };
        }
    }

    /// Recompute per-line decay gains for the normal and sustain RT60s.
    pub fn compute_decay_gains(&mut self, rt60: f32, slow_decay_rt60: f32, sample_rate: f32) {
        for i in 0..self.lengths.len() {
            let loop_len = self.loop_length(i) as f32;
            self.decay_gains[i] = decay_gain(loop_len, rt60, sample_rate);
            self.slow_decay_gains[i] = decay_gain(loop_len, slow_decay_rt60, sample_rate);
        }
    }

    /// Per-line decay gains for the selected set.
    #[inline]
    pub fn decay_gains(&self, slow: bool) -> &[f32] {
        if slow { &self.slow_decay_gains } else { &self.decay_gains }
    }

    /// Silence every line and rewind the cursors.
    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.cursors.copy_from_slice(&self.starts);
    }
}
