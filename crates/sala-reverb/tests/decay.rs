//! Measured decay time of the impulse response.
//!
//! With the HF shelves flat and the output filters opened up, every mode of
//! the network decays at the same rate, so the Schroeder energy decay curve
//! of the impulse response is a straight line in dB whose slope gives RT60.

use sala_reverb::{Reverb, ReverbSettings};

const BLOCK: usize = 512;

fn flat_settings(rt60: f32, sample_rate: f32) -> ReverbSettings {
    ReverbSettings {
        rt60,
        wet_gain: 1.0,
        cross_stereo_mix: 0.0,
        hf_decay_multiplier: 1.0,
        highpass_fc: 20.0,
        lowpass_fc: 20000.0,
        sample_rate,
        ..ReverbSettings::default()
    }
}

/// Per-sample energy of the stereo impulse response.
fn impulse_energy(settings: ReverbSettings, samples: usize) -> Vec<f64> {
    let mut reverb = Reverb::with_settings(settings).unwrap();
    let mut energy = Vec::with_capacity(samples);
    let mut input = vec![0.0f32; BLOCK];
    let mut out_l = vec![0.0f32; BLOCK];
    let mut out_r = vec![0.0f32; BLOCK];

    input[0] = 1.0;
    while energy.len() < samples {
        reverb.process_buffer(&input, &input, &mut out_l, &mut out_r);
        input[0] = 0.0;
        energy.extend(
            out_l
                .iter()
                .zip(&out_r)
                .map(|(&l, &r)| f64::from(l) * f64::from(l) + f64::from(r) * f64::from(r)),
        );
    }
    energy.truncate(samples);
    energy
}

/// Schroeder backward integral, in dB relative to the total energy.
fn energy_decay_curve(energy: &[f64]) -> Vec<f64> {
    let mut remaining = vec![0.0; energy.len()];
    let mut acc = 0.0;
    for (i, e) in energy.iter().enumerate().rev() {
        acc += e;
        remaining[i] = acc;
    }
    let total = remaining[0];
    remaining.iter().map(|r| 10.0 * (r / total).max(1e-30).log10()).collect()
}

fn first_below(curve: &[f64], db: f64) -> usize {
    curve.iter().position(|&v| v <= db).unwrap()
}

/// RT60 extrapolated from the curve between `from_db` and `to_db`.
fn measured_rt60(curve: &[f64], from_db: f64, to_db: f64, sample_rate: f32) -> f64 {
    let start = first_below(curve, from_db);
    let end = first_below(curve, to_db);
    let seconds = (end - start) as f64 / f64::from(sample_rate);
    seconds * 60.0 / (from_db - to_db)
}

fn check_rt60(rt60: f32, sample_rate: f32) {
    let samples = (2.5 * rt60 * sample_rate) as usize;
    let curve = energy_decay_curve(&impulse_energy(flat_settings(rt60, sample_rate), samples));

    let measured = measured_rt60(&curve, -10.0, -40.0, sample_rate);
    let target = f64::from(rt60);
    assert!(
        (measured - target).abs() < 0.1 * target,
        "rt60 {rt60} s at {sample_rate} Hz measured {measured} s"
    );

    let crossing = first_below(&curve, -60.0) as f64 / f64::from(sample_rate);
    assert!(
        (crossing - target).abs() < 0.1 * target,
        "-60 dB reached after {crossing} s, expected about {rt60} s"
    );
}

#[test]
fn rt60_one_second_at_44k1() {
    check_rt60(1.0, 44100.0);
}

#[test]
fn rt60_two_seconds_at_48k() {
    check_rt60(2.0, 48000.0);
}

#[test]
fn windowed_energy_decreases_after_build_up() {
    let sample_rate = 44100.0;
    let energy = impulse_energy(flat_settings(1.0, sample_rate), 2 * sample_rate as usize);

    // 100 ms windows, skipping the first two while every line fills
    let window = sample_rate as usize / 10;
    let sums: Vec<f64> = energy.chunks_exact(window).skip(2).map(|w| w.iter().sum()).collect();
    for pair in sums.windows(2) {
        assert!(pair[1] < pair[0], "energy rose from {} to {}", pair[0], pair[1]);
    }
}

#[test]
fn shorter_rt60_decays_faster() {
    let sample_rate = 44100.0;
    let samples = sample_rate as usize;
    let short = energy_decay_curve(&impulse_energy(flat_settings(0.4, sample_rate), samples));
    let long = energy_decay_curve(&impulse_energy(flat_settings(1.6, sample_rate), samples));
    assert!(first_below(&short, -20.0) < first_below(&long, -20.0));
}
