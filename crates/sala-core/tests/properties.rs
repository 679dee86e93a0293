//! Property-based tests for the vector math and biquad primitives.
//!
//! The strided path of every vector operation must agree exactly with the
//! unit-stride path over the same logical elements, and biquad designs must
//! stay stable across the whole usable frequency range.

use proptest::prelude::*;
use sala_core::biquad::{high_shelf_first_order, highpass, lowpass};
use sala_core::{BiquadBank, PortableVectorMath, Strided, StridedMut, VectorMath};

const VM: PortableVectorMath = PortableVectorMath;

/// Spread `values` into a buffer with `stride`, filling gaps with a marker.
fn spread(values: &[f32], stride: usize) -> Vec<f32> {
    let mut out = vec![f32::NAN; values.len().saturating_sub(1) * stride + 1];
    for (i, &v) in values.iter().enumerate() {
        out[i * stride] = v;
    }
    out
}

/// Collect the logical elements of a strided buffer.
fn compact(values: &[f32], stride: usize, count: usize) -> Vec<f32> {
    (0..count).map(|i| values[i * stride]).collect()
}

fn vectors(max: usize) -> impl Strategy<Value = (Vec<f32>, Vec<f32>, Vec<f32>)> {
    (1..max).prop_flat_map(|n| {
        (
            prop::collection::vec(-1.0f32..=1.0, n),
            prop::collection::vec(-1.0f32..=1.0, n),
            prop::collection::vec(-1.0f32..=1.0, n),
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Reductions over a strided view equal reductions over the packed values.
    #[test]
    fn strided_reductions_match_unit(values in prop::collection::vec(-1.0f32..=1.0, 1..64), stride in 1usize..6) {
        let n = values.len();
        let strided = spread(&values, stride);

        prop_assert_eq!(VM.sum(Strided::new(&strided, stride), n), VM.sum(Strided::unit(&values), n));
        prop_assert_eq!(
            VM.sum_of_squares(Strided::new(&strided, stride), n),
            VM.sum_of_squares(Strided::unit(&values), n)
        );
    }

    /// Elementwise operations give identical results with any operand strides.
    #[test]
    fn strided_elementwise_match_unit(
        (a, b, c) in vectors(48),
        sa in 1usize..5,
        sb in 1usize..5,
        sc in 1usize..5,
        so in 1usize..5,
        k in -2.0f32..=2.0,
    ) {
        let n = a.len();
        let (a_s, b_s, c_s) = (spread(&a, sa), spread(&b, sb), spread(&c, sc));
        let out_len = (n - 1) * so + 1;

        let mut unit = vec![0.0; n];
        let mut strided = vec![0.0; out_len];

        VM.mul_add(Strided::unit(&a), Strided::unit(&b), Strided::unit(&c), StridedMut::unit(&mut unit), n);
        VM.mul_add(
            Strided::new(&a_s, sa),
            Strided::new(&b_s, sb),
            Strided::new(&c_s, sc),
            StridedMut::new(&mut strided, so),
            n,
        );
        prop_assert_eq!(&compact(&strided, so, n), &unit);

        VM.mul_mul_add(
            Strided::unit(&a),
            Strided::unit(&b),
            Strided::unit(&c),
            Strided::unit(&a),
            StridedMut::unit(&mut unit),
            n,
        );
        VM.mul_mul_add(
            Strided::new(&a_s, sa),
            Strided::new(&b_s, sb),
            Strided::new(&c_s, sc),
            Strided::new(&a_s, sa),
            StridedMut::new(&mut strided, so),
            n,
        );
        prop_assert_eq!(&compact(&strided, so, n), &unit);

        VM.scale_add_scale(Strided::unit(&a), k, Strided::unit(&b), -k, StridedMut::unit(&mut unit), n);
        VM.scale_add_scale(
            Strided::new(&a_s, sa),
            k,
            Strided::new(&b_s, sb),
            -k,
            StridedMut::new(&mut strided, so),
            n,
        );
        prop_assert_eq!(&compact(&strided, so, n), &unit);

        VM.sub(Strided::unit(&a), Strided::unit(&b), StridedMut::unit(&mut unit), n);
        VM.sub(Strided::new(&a_s, sa), Strided::new(&b_s, sb), StridedMut::new(&mut strided, so), n);
        prop_assert_eq!(&compact(&strided, so, n), &unit);

        VM.scale(Strided::unit(&c), k, StridedMut::unit(&mut unit), n);
        VM.scale(Strided::new(&c_s, sc), k, StridedMut::new(&mut strided, so), n);
        prop_assert_eq!(&compact(&strided, so, n), &unit);
    }

    /// Designed filters stay stable from 50 Hz to just under Nyquist.
    #[test]
    fn designs_are_stable(
        freq_ratio in 0.0005f32..0.49,
        sample_rate in prop::sample::select(vec![22050.0f32, 44100.0, 48000.0, 96000.0]),
        gain in 0.0f32..=1.0,
    ) {
        let fc = (freq_ratio * sample_rate).max(50.0);
        prop_assert!(lowpass(fc, sample_rate).is_stable());
        prop_assert!(highpass(fc, sample_rate).is_stable());
        prop_assert!(high_shelf_first_order(fc, sample_rate, gain).is_stable());
    }

    /// A bank of attenuating shelves never amplifies an impulse.
    #[test]
    fn attenuating_shelf_bank_is_bounded(gain in 0.0f32..=1.0, fc in 100.0f32..20000.0) {
        let mut bank = BiquadBank::new(4, 1);
        for ch in 0..4 {
            bank.set_coefficients(ch, 0, high_shelf_first_order(fc, 44100.0, gain));
        }

        let mut buf = vec![0.0f32; 256];
        buf[0] = 1.0;
        bank.process_block_in_place(2, 0, &mut buf);
        for s in &buf {
            prop_assert!(s.is_finite());
            prop_assert!(s.abs() <= 1.0 + 1e-5);
        }
    }
}
