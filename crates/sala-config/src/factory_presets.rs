//! Factory presets bundled with the library.
//!
//! Six rooms spanning the useful RT60 range, from a speaker cabinet to a
//! cathedral. Longer decays pair with a larger room size so the tail keeps
//! changing as it echoes.

use crate::ReverbPreset;

/// Factory preset names, in order of increasing decay time.
pub static FACTORY_PRESET_NAMES: &[&str] = &[
    "cabinet",
    "closet",
    "bedroom",
    "auditorium",
    "huge_auditorium",
    "cathedral",
];

static FACTORY_PRESETS_TOML: &[(&str, &str)] = &[
    ("cabinet", CABINET_PRESET),
    ("closet", CLOSET_PRESET),
    ("bedroom", BEDROOM_PRESET),
    ("auditorium", AUDITORIUM_PRESET),
    ("huge_auditorium", HUGE_AUDITORIUM_PRESET),
    ("cathedral", CATHEDRAL_PRESET),
];

const CABINET_PRESET: &str = r#"
name = "Cabinet"
description = "Speaker cabinet simulator"

[settings]
rt60 = 0.2
slow_decay_rt60 = 1.0
pre_delay = 0.0001
room_size = 0.01
delay_units = 2
wet_gain = 0.3
lowpass_fc = 5000.0
"#;

const CLOSET_PRESET: &str = r#"
name = "Closet"
description = "Closet sized room"

[settings]
rt60 = 0.5
slow_decay_rt60 = 3.0
pre_delay = 0.001
room_size = 0.03
wet_gain = 0.2
"#;

const BEDROOM_PRESET: &str = r#"
name = "Bedroom"
description = "Small furnished room"

[settings]
rt60 = 0.9
slow_decay_rt60 = 5.0
pre_delay = 0.004
room_size = 0.06
wet_gain = 0.2
"#;

const AUDITORIUM_PRESET: &str = r#"
name = "Auditorium"
description = "Moderately sized auditorium"

[settings]
rt60 = 1.3
pre_delay = 0.015
room_size = 0.1
wet_gain = 0.25
cross_stereo_mix = 0.5
highpass_fc = 60.0
"#;

const HUGE_AUDITORIUM_PRESET: &str = r#"
name = "Huge Auditorium"
description = "Large hall with a long, smooth tail"

[settings]
rt60 = 2.3
slow_decay_rt60 = 10.0
pre_delay = 0.015
room_size = 0.15
delay_units = 6
wet_gain = 0.3
cross_stereo_mix = 0.5
highpass_fc = 60.0
"#;

const CATHEDRAL_PRESET: &str = r#"
name = "Cathedral"
description = "Stone cathedral with a very long echo"

[settings]
rt60 = 10.0
slow_decay_rt60 = 20.0
hf_decay_multiplier = 4.0
pre_delay = 0.015
room_size = 0.3
delay_units = 8
wet_gain = 0.35
cross_stereo_mix = 0.6
highpass_fc = 80.0
lowpass_fc = 5000.0
"#;

/// All factory presets.
///
/// # Example
///
/// ```rust
/// use sala_config::factory_presets;
///
/// for preset in factory_presets() {
///     println!("{}: {}", preset.name, preset.description.as_deref().unwrap_or(""));
/// }
/// ```
pub fn factory_presets() -> Vec<ReverbPreset> {
    FACTORY_PRESETS_TOML
        .iter()
        .filter_map(|(_, toml)| ReverbPreset::from_toml(toml).ok())
        .collect()
}

/// Look up a factory preset by key (`huge_auditorium`) or display name
/// (`Huge Auditorium`), case-insensitively.
pub fn get_factory_preset(name: &str) -> Option<ReverbPreset> {
    let name_lower = name.to_lowercase();

    if let Some((_, toml)) = FACTORY_PRESETS_TOML.iter().find(|(key, _)| *key == name_lower) {
        return ReverbPreset::from_toml(toml).ok();
    }

    factory_presets()
        .into_iter()
        .find(|preset| preset.name.to_lowercase() == name_lower)
}

/// Factory preset keys.
pub fn factory_preset_names() -> Vec<&'static str> {
    FACTORY_PRESET_NAMES.to_vec()
}

/// Whether `name` refers to a factory preset.
pub fn is_factory_preset(name: &str) -> bool {
    get_factory_preset(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_presets_load() {
        let presets = factory_presets();
        assert_eq!(presets.len(), FACTORY_PRESET_NAMES.len());
    }

    #[test]
    fn test_all_factory_presets_valid() {
        for (key, toml) in FACTORY_PRESETS_TOML {
            let preset = ReverbPreset::from_toml(toml).unwrap();
            assert!(preset.to_settings().is_ok(), "factory preset '{key}' is invalid");
        }
    }

    #[test]
    fn test_get_factory_preset() {
        assert_eq!(get_factory_preset("closet").unwrap().name, "Closet");
        assert_eq!(get_factory_preset("Huge Auditorium").unwrap().name, "Huge Auditorium");
        assert_eq!(get_factory_preset("CATHEDRAL").unwrap().name, "Cathedral");
        assert!(get_factory_preset("ballroom").is_none());
        assert!(is_factory_preset("bedroom"));
        assert!(!is_factory_preset("bathroom"));
    }

    #[test]
    fn test_decay_times_increase() {
        let rt60s: Vec<f32> = factory_presets().iter().map(|p| p.settings.rt60).collect();
        assert_eq!(rt60s, [0.2, 0.5, 0.9, 1.3, 2.3, 10.0]);
    }

    #[test]
    fn test_sustain_decay_longer_than_normal() {
        for preset in factory_presets() {
            assert!(
                preset.settings.slow_decay_rt60 > preset.settings.rt60,
                "{} sustains shorter than it decays",
                preset.name
            );
        }
    }
}
