//! File-based reverb processing command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sala_reverb::{Reverb, ReverbSettings};
use tracing::{debug, info};

use super::common::{ReverbArgs, peak_db};
use crate::wav::{StereoSamples, read_wav_stereo, write_wav_stereo};

#[derive(Args)]
pub struct ProcessArgs {
    /// Input WAV file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output WAV file (32-bit float, stereo)
    #[arg(value_name = "OUTPUT")]
    output: PathBuf,

    #[command(flatten)]
    reverb: ReverbArgs,

    /// Seconds of silence appended so the tail can ring out
    #[arg(long, default_value_t = 2.0)]
    tail: f32,

    /// Processing block size
    #[arg(long, default_value_t = 512)]
    block_size: usize,
}

pub fn run(args: ProcessArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.block_size > 0, "block size must be at least 1");
    anyhow::ensure!(
        args.tail.is_finite() && args.tail >= 0.0,
        "tail must be a non-negative number of seconds"
    );

    println!("Reading {}...", args.input.display());
    let (mut input, sample_rate) = read_wav_stereo(&args.input)?;
    let source_frames = input.frames();
    println!(
        "  {} frames, {} Hz, {:.2}s",
        source_frames,
        sample_rate,
        source_frames as f32 / sample_rate as f32
    );

    let mut settings = args.reverb.settings(ReverbSettings::default())?;
    settings.sample_rate = sample_rate as f32;
    let mut reverb = Reverb::with_settings(settings).context("invalid reverb settings")?;
    info!(
        rt60 = settings.rt60,
        wet = settings.wet_gain,
        delays = reverb.num_delays(),
        "processing"
    );

    let tail_frames = (args.tail * sample_rate as f32).round() as usize;
    input.pad(tail_frames);
    debug!(tail_frames, "padded input");

    let total = input.frames();
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("##-"),
    );

    let mut output = StereoSamples::with_len(total);
    let block_size = args.block_size;
    let blocks = input
        .left
        .chunks(block_size)
        .zip(input.right.chunks(block_size))
        .zip(output.left.chunks_mut(block_size).zip(output.right.chunks_mut(block_size)));
    for (i, ((in_l, in_r), (out_l, out_r))) in blocks.enumerate() {
        reverb.process_buffer(in_l, in_r, out_l, out_r);
        pb.set_position(((i + 1) * block_size).min(total) as u64);
    }
    pb.finish_with_message("done");

    println!("\nStats:");
    println!(
        "  Input:  peak L {:.1} dB, R {:.1} dB",
        peak_db(&input.left[..source_frames]),
        peak_db(&input.right[..source_frames])
    );
    println!(
        "  Output: peak L {:.1} dB, R {:.1} dB",
        peak_db(&output.left),
        peak_db(&output.right)
    );

    println!("\nWriting {}...", args.output.display());
    write_wav_stereo(&args.output, &output, sample_rate)?;
    println!("Done!");

    Ok(())
}
