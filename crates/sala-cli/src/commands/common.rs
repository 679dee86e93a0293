//! Reverb options shared by the processing commands.

use anyhow::Context;
use clap::Args;
use sala_config::ReverbPreset;
use sala_reverb::ReverbSettings;
use tracing::info;

/// Preset selection plus per-setting overrides.
#[derive(Args, Debug, Default, Clone)]
pub struct ReverbArgs {
    /// Factory preset name or preset file (TOML)
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Decay time to -60 dB, seconds
    #[arg(long)]
    pub rt60: Option<f32>,

    /// Wet gain, 0 to 1 (dry follows as sqrt(1 - wet^2))
    #[arg(long)]
    pub wet: Option<f32>,

    /// Left/right blend of the wet signal, 0 to 1
    #[arg(long = "cross-mix")]
    pub cross_mix: Option<f32>,

    /// Output high-pass corner, Hz
    #[arg(long)]
    pub highpass: Option<f32>,

    /// Output low-pass corner, Hz
    #[arg(long)]
    pub lowpass: Option<f32>,

    /// Number of four-line delay units
    #[arg(long)]
    pub units: Option<usize>,

    /// Shortest delay, seconds
    #[arg(long)]
    pub pre_delay: Option<f32>,

    /// Longest delay, seconds
    #[arg(long)]
    pub room_size: Option<f32>,

    /// Switch to the sustain decay while the input is loud
    #[arg(long)]
    pub auto_sustain: bool,
}

impl ReverbArgs {
    /// Resolve the preset (or `base` without one), then apply overrides.
    ///
    /// Validation happens when the reverb is built from the result.
    pub fn settings(&self, base: ReverbSettings) -> anyhow::Result<ReverbSettings> {
        let mut settings = match &self.preset {
            Some(name) => {
                let preset = ReverbPreset::find(name).with_context(|| format!("loading preset '{name}'"))?;
                info!(preset = %preset.name, "using preset");
                preset.settings
            }
            None => base,
        };

        if let Some(v) = self.rt60 {
            settings.rt60 = v;
        }
        if let Some(v) = self.wet {
            settings.wet_gain = v;
        }
        if let Some(v) = self.cross_mix {
            settings.cross_stereo_mix = v;
        }
        if let Some(v) = self.highpass {
            settings.highpass_fc = v;
        }
        if let Some(v) = self.lowpass {
            settings.lowpass_fc = v;
        }
        if let Some(v) = self.units {
            settings.delay_units = v;
        }
        if let Some(v) = self.pre_delay {
            settings.pre_delay = v;
        }
        if let Some(v) = self.room_size {
            settings.room_size = v;
        }
        if self.auto_sustain {
            settings.auto_sustain = true;
        }
        Ok(settings)
    }
}

/// Peak level in dBFS.
pub fn peak_db(samples: &[f32]) -> f32 {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0, f32::max);
    sala_core::linear_to_db(peak)
}
