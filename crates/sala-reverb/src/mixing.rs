//! Mixing matrix: redistributes delay outputs into new delay inputs.
//!
//! Within each four-line unit the outputs go through the normalised 4x4
//! Hadamard matrix
//!
//! ```text
//!        | 1  1  1  1 |
//! 0.5 *  | 1 -1  1 -1 |
//!        | 1  1 -1 -1 |
//!        | 1 -1 -1  1 |
//! ```
//!
//! evaluated for every unit at once as a two-stage butterfly over stride-4
//! views of the network. Across units the result is permuted losslessly:
//! position `j` of unit `u` feeds position `j` of unit `(u + j) mod U`, so
//! energy reaches every unit within a few passes. Both stages are
//! orthogonal, so the whole transform preserves energy exactly; all decay
//! comes from the per-line gains and shelves.
//!
//! The stereo wet signal is tapped from the line outputs: left from
//! positions 0 and 1 of every unit, right from positions 2 and 3, each
//! weighted by a `+1/-1` sign pattern that flips on odd units.

use sala_core::{Strided, StridedMut, VectorMath, equal_power_cross_mix};

use crate::error::ReverbError;
use crate::network::try_zeroed;

/// Scale of the per-unit Hadamard butterfly (`1 / sqrt(4)`).
pub const MATRIX_ATTENUATION: f32 = 0.5;

/// Sparse, sign-patterned feedback matrix plus the stereo output taps.
#[derive(Debug, Clone)]
pub struct MixingMatrix {
    units: usize,
    /// Stage-one butterfly sums and differences, one value per unit each
    sum_ab: Vec<f32>,
    diff_ab: Vec<f32>,
    sum_cd: Vec<f32>,
    diff_cd: Vec<f32>,
    /// Per-unit mixed values before the cross-unit permutation
    mixed: Vec<f32>,
    /// `permuted[i] = mixed[permutation[i]]`
    permutation: Vec<usize>,
    output_signs: Vec<f32>,
    signed: Vec<f32>,
    output_attenuation: f32,
    straight_gain: f32,
    cross_gain: f32,
}

impl MixingMatrix {
    /// Build the matrix for `units` four-line units.
    pub fn new(units: usize) -> Result<Self, ReverbError> {
        let n = units * 4;

        let mut permutation: Vec<usize> = try_zeroed(n)?;
        for unit in 0..units {
            for position in 0..4 {
                let source_unit = (unit + units - position % units) % units;
                permutation[unit * 4 + position] = source_unit * 4 + position;
            }
        }

        let mut output_signs: Vec<f32> = try_zeroed(n)?;
        for (i, sign) in output_signs.iter_mut().enumerate() {
            let unit_flip = if (i / 4) % 2 == 0 { 1.0 } else { -1.0 };
            let pair_sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            *sign = unit_flip * pair_sign;
        }

        let (straight_gain, cross_gain) = equal_power_cross_mix(0.0);
        Ok(Self {
            units,
            sum_ab: try_zeroed(units)?,
            diff_ab: try_zeroed(units)?,
            sum_cd: try_zeroed(units)?,
            diff_cd: try_zeroed(units)?,
            mixed: try_zeroed(n)?,
            permutation,
            output_signs,
            signed: try_zeroed(n)?,
            output_attenuation: 1.0 / libm::sqrtf(n as f32 / 2.0),
            straight_gain,
            cross_gain,
        })
    }

    /// Number of delay units.
    pub fn units(&self) -> usize {
        self.units
    }

    /// Tap weight signs, one per delay line.
    pub fn output_signs(&self) -> &[f32] {
        &self.output_signs
    }

    /// Set the left/right wet blend (`0` = dual mono, `1` = fully shared).
    pub fn set_cross_stereo_mix(&mut self, mix: f32) {
        let (straight, cross) = equal_power_cross_mix(mix);
        self.straight_gain = straight;
        self.cross_gain = cross;
    }

    /// Mix `outputs` into `feedback` (both `4 * units` long).
    #[inline]
    pub fn mix<V: VectorMath>(&mut self, vm: &V, outputs: &[f32], feedback: &mut [f32]) {
        let u = self.units;
        let a = Strided::new(outputs, 4);
        let b = Strided::new(&outputs[1..], 4);
        let c = Strided::new(&outputs[2..], 4);
        let d = Strided::new(&outputs[3..], 4);

        vm.add(a, b, StridedMut::unit(&mut self.sum_ab), u);
        vm.sub(a, b, StridedMut::unit(&mut self.diff_ab), u);
        vm.add(c, d, StridedMut::unit(&mut self.sum_cd), u);
        vm.sub(c, d, StridedMut::unit(&mut self.diff_cd), u);

        let g = MATRIX_ATTENUATION;
        let (s1, d1) = (Strided::unit(&self.sum_ab), Strided::unit(&self.diff_ab));
        let (s2, d2) = (Strided::unit(&self.sum_cd), Strided::unit(&self.diff_cd));
        vm.scale_add_scale(s1, g, s2, g, StridedMut::new(&mut self.mixed, 4), u);
        vm.scale_add_scale(d1, g, d2, g, StridedMut::new(&mut self.mixed[1..], 4), u);
        vm.scale_add_scale(s1, g, s2, -g, StridedMut::new(&mut self.mixed[2..], 4), u);
        vm.scale_add_scale(d1, g, d2, -g, StridedMut::new(&mut self.mixed[3..], 4), u);

        vm.gather(&self.mixed, &self.permutation, 1, StridedMut::unit(feedback), u * 4);
    }

    /// Stereo wet taps of the line outputs, cross-mixed.
    #[inline]
    pub fn tap<V: VectorMath>(&mut self, vm: &V, outputs: &[f32]) -> (f32, f32) {
        let u = self.units;
        let n = u * 4;
        vm.mul(
            Strided::unit(outputs),
            Strided::unit(&self.output_signs),
            StridedMut::unit(&mut self.signed),
            n,
        );

        let left = vm.sum(Strided::new(&self.signed, 4), u) + vm.sum(Strided::new(&self.signed[1..], 4), u);
        let right =
            vm.sum(Strided::new(&self.signed[2..], 4), u) + vm.sum(Strided::new(&self.signed[3..], 4), u);
        let (left, right) = (left * self.output_attenuation, right * self.output_attenuation);

        (
            self.straight_gain * left + self.cross_gain * right,
            self.straight_gain * right + self.cross_gain * left,
        )
    }
}
