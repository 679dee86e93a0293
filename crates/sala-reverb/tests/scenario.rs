//! Reference harness scenario.
//!
//! Default reverb with rt60 = 1.3 s, wet = 1.0, cross-stereo mix = 0.5 and
//! a 250 Hz output high-pass, excited by a unit impulse on both channels and
//! run for 1500 blocks of 128 samples.

use sala_reverb::{Reverb, ReverbSettings};

const BLOCK: usize = 128;
const BLOCKS: usize = 1500;
const SAMPLE_RATE: f32 = 44100.0;

fn harness_reverb() -> Reverb {
    let mut reverb = Reverb::new();
    reverb.set_rt60_decay_time(1.30).unwrap();
    reverb.set_wet_gain(1.0).unwrap();
    reverb.set_cross_stereo_mix(0.5).unwrap();
    reverb.set_high_pass_fc(250.0).unwrap();
    reverb.set_sample_rate(SAMPLE_RATE).unwrap();
    reverb
}

/// Run the impulse through the reverb; `sustain` decides per block whether
/// the slow decay set is selected.
fn run(reverb: &mut Reverb, sustain: impl Fn(usize) -> bool) -> (Vec<f32>, Vec<f32>) {
    let mut left = Vec::with_capacity(BLOCKS * BLOCK);
    let mut right = Vec::with_capacity(BLOCKS * BLOCK);
    let mut input = [0.0f32; BLOCK];
    let mut out_l = [0.0f32; BLOCK];
    let mut out_r = [0.0f32; BLOCK];

    for block in 0..BLOCKS {
        input[0] = if block == 0 { 1.0 } else { 0.0 };
        reverb.set_slow_decay_state(sustain(block));
        reverb.process_buffer(&input, &input, &mut out_l, &mut out_r);
        left.extend_from_slice(&out_l);
        right.extend_from_slice(&out_r);
    }
    (left, right)
}

/// Energy of each block, both channels.
fn block_energy(left: &[f32], right: &[f32]) -> Vec<f64> {
    left.chunks(BLOCK)
        .zip(right.chunks(BLOCK))
        .map(|(l, r)| l.iter().chain(r).map(|&s| f64::from(s) * f64::from(s)).sum())
        .collect()
}

fn window_db(energy: &[f64], blocks: std::ops::Range<usize>) -> f64 {
    let sum: f64 = energy[blocks].iter().sum();
    10.0 * sum.max(1e-300).log10()
}

/// RT60 estimated from the level drop between two 10-block windows.
fn decay_time(energy: &[f64], from_block: usize, to_block: usize) -> f64 {
    let drop_db = window_db(energy, from_block..from_block + 10) - window_db(energy, to_block..to_block + 10);
    let seconds = ((to_block - from_block) * BLOCK) as f64 / f64::from(SAMPLE_RATE);
    60.0 * seconds / drop_db
}

#[test]
fn settings_match_the_harness() {
    let reverb = harness_reverb();
    let settings = reverb.settings();
    assert_eq!(
        settings,
        ReverbSettings {
            rt60: 1.30,
            wet_gain: 1.0,
            cross_stereo_mix: 0.5,
            highpass_fc: 250.0,
            ..ReverbSettings::default()
        }
    );
    assert_eq!(reverb.dry_gain(), 0.0);
}

#[test]
fn first_reflection_is_finite_and_nonzero_on_both_channels() {
    let mut reverb = harness_reverb();
    let (left, right) = run(&mut reverb, |_| false);

    let mut sorted = reverb.delay_lengths().to_vec();
    sorted.sort_unstable();
    // The impulse needs one full loop of the shortest line to reach the taps
    let first_l = left.iter().position(|&s| s != 0.0).unwrap();
    let first_r = right.iter().position(|&s| s != 0.0).unwrap();
    assert_eq!(first_l.min(first_r), sorted[0] + 1);
    assert!(left[first_l].is_finite() && right[first_r].is_finite());
    assert!(first_r <= sorted[1] + 1);

    assert!(left.iter().chain(&right).all(|s| s.is_finite()));
}

#[test]
fn energy_decays_toward_zero() {
    let mut reverb = harness_reverb();
    let (left, right) = run(&mut reverb, |_| false);
    let energy = block_energy(&left, &right);

    let early = window_db(&energy, 0..50);
    let middle = window_db(&energy, 1000..1050);
    let late = window_db(&energy, 1450..1500);
    assert!(middle < early - 60.0, "early {early} dB, middle {middle} dB");
    assert!(late < middle, "middle {middle} dB, late {late} dB");
}

#[test]
fn sustain_window_extends_decay() {
    let mut normal = harness_reverb();
    let (nl, nr) = run(&mut normal, |_| false);

    let mut sustained = harness_reverb();
    let (sl, sr) = run(&mut sustained, |block| (100..1400).contains(&block));

    let normal_energy = block_energy(&nl, &nr);
    let sustained_energy = block_energy(&sl, &sr);

    // Identical until the pedal goes down
    assert_eq!(&normal_energy[..100], &sustained_energy[..100]);

    let normal_t = decay_time(&normal_energy, 150, 400);
    let sustained_t = decay_time(&sustained_energy, 150, 400);
    assert!(normal_t > 0.5 && normal_t < 2.0, "normal decay {normal_t} s");
    assert!(sustained_t > 2.0 * normal_t, "sustained {sustained_t} s vs normal {normal_t} s");

    // More energy survives to the end of the sustain window
    assert!(window_db(&sustained_energy, 1350..1400) > window_db(&normal_energy, 1350..1400) + 20.0);
}
