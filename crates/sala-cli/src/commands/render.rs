//! Impulse response rendering.
//!
//! Feeds a unit impulse into both channels, then silence, block by block,
//! optionally holding the sustain pedal down for a range of blocks.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::ops::Range;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use sala_reverb::{Reverb, ReverbSettings};
use tracing::info;

use super::common::{ReverbArgs, peak_db};
use crate::wav::{StereoSamples, write_wav_stereo};

#[derive(Args)]
pub struct RenderArgs {
    /// Output WAV file (32-bit float, stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    reverb: ReverbArgs,

    /// Sample rate, Hz
    #[arg(long, default_value_t = 44100)]
    sample_rate: u32,

    /// Number of blocks to render
    #[arg(long, default_value_t = 1500)]
    blocks: usize,

    /// Samples per block
    #[arg(long, default_value_t = 128)]
    block_size: usize,

    /// Hold the sustain pedal during blocks FROM..TO
    #[arg(long, value_name = "FROM..TO", value_parser = parse_block_range)]
    sustain: Option<Range<usize>>,

    /// Also write the response as CSV, one "left,right" line per sample
    #[arg(long, value_name = "FILE")]
    csv: Option<PathBuf>,
}

fn parse_block_range(s: &str) -> Result<Range<usize>, String> {
    let (from, to) = s
        .split_once("..")
        .ok_or_else(|| format!("invalid block range '{s}' (expected FROM..TO)"))?;
    let from: usize = from.trim().parse().map_err(|e| format!("invalid start '{from}': {e}"))?;
    let to: usize = to.trim().parse().map_err(|e| format!("invalid end '{to}': {e}"))?;
    if from > to {
        return Err(format!("block range '{s}' ends before it starts"));
    }
    Ok(from..to)
}

/// Settings used when no preset is given: 1.3 s decay, fully wet, half
/// cross-mixed, 250 Hz output high-pass.
fn impulse_settings() -> ReverbSettings {
    ReverbSettings {
        rt60: 1.3,
        wet_gain: 1.0,
        cross_stereo_mix: 0.5,
        highpass_fc: 250.0,
        ..ReverbSettings::default()
    }
}

/// Render the impulse response.
pub fn render(
    reverb: &mut Reverb,
    blocks: usize,
    block_size: usize,
    sustain: Option<&Range<usize>>,
) -> StereoSamples {
    let mut response = StereoSamples::with_len(blocks * block_size);
    let mut input = vec![0.0f32; block_size];
    if let Some(first) = input.first_mut() {
        *first = 1.0;
    }

    let blocks_out = response
        .left
        .chunks_mut(block_size)
        .zip(response.right.chunks_mut(block_size));
    for (block, (out_l, out_r)) in blocks_out.enumerate() {
        if let Some(range) = sustain {
            reverb.set_slow_decay_state(range.contains(&block));
        }
        reverb.process_buffer(&input, &input, out_l, out_r);
        if block == 0 {
            input.fill(0.0);
        }
    }
    response
}

fn write_csv(path: &Path, response: &StereoSamples) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for (l, r) in response.left.iter().zip(&response.right) {
        writeln!(out, "{l:.6},{r:.6}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.block_size > 0, "block size must be at least 1");

    let mut settings = args.reverb.settings(impulse_settings())?;
    settings.sample_rate = args.sample_rate as f32;
    let mut reverb = Reverb::with_settings(settings).context("invalid reverb settings")?;

    info!(
        rt60 = settings.rt60,
        delays = reverb.num_delays(),
        blocks = args.blocks,
        block_size = args.block_size,
        "rendering impulse response"
    );
    let response = render(&mut reverb, args.blocks, args.block_size, args.sustain.as_ref());

    println!(
        "Rendered {} samples ({:.2}s), peak L {:.1} dB, R {:.1} dB",
        response.frames(),
        response.frames() as f32 / settings.sample_rate,
        peak_db(&response.left),
        peak_db(&response.right)
    );

    write_wav_stereo(&args.output, &response, args.sample_rate)?;
    println!("Wrote {}", args.output.display());

    if let Some(csv) = &args.csv {
        write_csv(csv, &response)?;
        println!("Wrote {}", csv.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_range_parses() {
        assert_eq!(parse_block_range("100..1000").unwrap(), 100..1000);
        assert_eq!(parse_block_range(" 0 .. 5").unwrap(), 0..5);
        assert!(parse_block_range("100").is_err());
        assert!(parse_block_range("9..3").is_err());
        assert!(parse_block_range("a..3").is_err());
    }

    #[test]
    fn impulse_settings_are_valid() {
        assert!(impulse_settings().validate().is_ok());
    }

    #[test]
    fn render_length_and_first_arrival() {
        let mut reverb = Reverb::with_settings(impulse_settings()).unwrap();
        let shortest = *reverb.delay_lengths().iter().min().unwrap();
        let response = render(&mut reverb, 10, 128, None);
        assert_eq!(response.frames(), 1280);
        assert!(response.left[..=shortest].iter().all(|&s| s == 0.0));
        assert!(response.left[shortest + 1] != 0.0);
    }

    #[test]
    fn sustain_window_keeps_tail_louder() {
        let mut plain = Reverb::with_settings(impulse_settings()).unwrap();
        let mut held = Reverb::with_settings(impulse_settings()).unwrap();
        let a = render(&mut plain, 400, 128, None);
        let b = render(&mut held, 400, 128, Some(&(50..400)));
        let tail = 300 * 128..;
        assert!(peak_db(&b.left[tail.clone()]) > peak_db(&a.left[tail]) + 10.0);
    }
}
