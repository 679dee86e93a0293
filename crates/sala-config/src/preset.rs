//! Preset file format and operations.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

use sala_reverb::{Reverb, ReverbControl, ReverbSettings};

use crate::error::ConfigError;

/// A named reverb preset.
///
/// # TOML Format
///
/// ```toml
/// name = "Auditorium"
/// description = "Moderately sized auditorium"
///
/// [settings]
/// wet_gain = 0.25
/// rt60 = 1.3
/// pre_delay = 0.015
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReverbPreset {
    /// Name of the preset.
    pub name: String,

    /// Optional description of the preset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Reverb settings. Missing fields take the reverb defaults.
    #[serde(default)]
    pub settings: ReverbSettings,
}

impl ReverbPreset {
    /// Create a preset with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            settings: ReverbSettings::default(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Replace the settings.
    pub fn with_settings(mut self, settings: ReverbSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Load a preset from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let preset = Self::from_toml(&content)?;
        debug!(name = %preset.name, path = %path.display(), "loaded preset");
        Ok(preset)
    }

    /// Resolve a factory preset name, or else a path to a TOML file.
    pub fn find(name_or_path: &str) -> Result<Self, ConfigError> {
        if let Some(preset) = crate::get_factory_preset(name_or_path) {
            return Ok(preset);
        }
        let path = Path::new(name_or_path);
        if path.is_file() {
            return Self::load(path);
        }
        Err(ConfigError::PresetNotFound(name_or_path.to_string()))
    }

    /// Load a preset from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the preset to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        debug!(name = %self.name, path = %path.display(), "saved preset");
        Ok(())
    }

    /// Convert the preset to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validated reverb settings.
    pub fn to_settings(&self) -> Result<ReverbSettings, ConfigError> {
        self.settings.validate()?;
        Ok(self.settings)
    }

    /// Build a reverb running this preset.
    pub fn build(&self) -> Result<Reverb, ConfigError> {
        Ok(Reverb::with_settings(self.to_settings()?)?)
    }

    /// Apply the preset to a running reverb.
    ///
    /// Nothing is changed if any setting is invalid. Structural settings
    /// take effect at the start of the reverb's next block.
    pub fn apply(&self, control: &ReverbControl) -> Result<(), ConfigError> {
        control.apply(&self.to_settings()?)?;
        debug!(name = %self.name, "applied preset");
        Ok(())
    }
}

impl Default for ReverbPreset {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_toml_takes_defaults() {
        let preset = ReverbPreset::from_toml("name = \"Minimal\"\n").unwrap();
        assert_eq!(preset.name, "Minimal");
        assert!(preset.description.is_none());
        assert_eq!(preset.to_settings().unwrap(), ReverbSettings::default());
    }

    #[test]
    fn test_partial_settings_table() {
        let toml = r#"
name = "Auditorium"
description = "Moderately sized auditorium"

[settings]
wet_gain = 0.25
rt60 = 1.3
pre_delay = 0.015
"#;
        let preset = ReverbPreset::from_toml(toml).unwrap();
        let settings = preset.to_settings().unwrap();
        assert_eq!(settings.wet_gain, 0.25);
        assert_eq!(settings.rt60, 1.3);
        assert_eq!(settings.pre_delay, 0.015);
        assert_eq!(settings.room_size, ReverbSettings::default().room_size);
        assert_eq!(preset.description.as_deref(), Some("Moderately sized auditorium"));
    }

    #[test]
    fn test_preset_to_toml() {
        let preset = ReverbPreset::new("Test").with_description("Test description");
        let toml = preset.to_toml().unwrap();
        assert!(toml.contains("name = \"Test\""));
        assert!(toml.contains("description = \"Test description\""));
        assert!(toml.contains("[settings]"));
        assert!(toml.contains("delay_units = 4"));
    }

    #[test]
    fn test_preset_roundtrip() {
        let original = ReverbPreset::new("Roundtrip").with_settings(ReverbSettings {
            rt60: 2.3,
            delay_units: 6,
            auto_sustain: true,
            ..ReverbSettings::default()
        });
        let parsed = ReverbPreset::from_toml(&original.to_toml().unwrap()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let preset = ReverbPreset::from_toml("name = \"Bad\"\n[settings]\nwet_gain = 1.5\n").unwrap();
        let err = preset.to_settings().unwrap_err();
        assert!(matches!(err, ConfigError::Reverb(ref e) if e.parameter_name() == Some("wet_gain")));
    }

    #[test]
    fn test_malformed_toml() {
        let err = ReverbPreset::from_toml("name = [").unwrap_err();
        assert!(matches!(err, ConfigError::TomlParse(_)));
    }

    #[test]
    fn test_apply_to_running_reverb() {
        let mut reverb = Reverb::new();
        let preset = ReverbPreset::new("Big").with_settings(ReverbSettings {
            rt60: 5.0,
            delay_units: 8,
            ..ReverbSettings::default()
        });
        preset.apply(&reverb.control()).unwrap();
        assert_eq!(reverb.settings().rt60, 5.0);
        assert_eq!(reverb.num_delays(), 16);

        let mut out_l = [0.0; 32];
        let mut out_r = [0.0; 32];
        reverb.process_buffer(&[0.0; 32], &[0.0; 32], &mut out_l, &mut out_r);
        assert_eq!(reverb.num_delays(), 32);
    }

    #[test]
    fn test_default() {
        let preset = ReverbPreset::default();
        assert_eq!(preset.name, "Untitled");
        assert_eq!(preset.settings, ReverbSettings::default());
    }
}
