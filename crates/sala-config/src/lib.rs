//! Preset management for the sala reverb.
//!
//! Presets are TOML files holding a name, an optional description and a
//! `[settings]` table of [`ReverbSettings`](sala_reverb::ReverbSettings)
//! fields. Missing fields take the reverb defaults, and every preset is
//! validated by the same rules as the reverb's setters before it is used.
//!
//! # Example
//!
//! ```rust,no_run
//! use sala_config::{ReverbPreset, get_factory_preset};
//! use sala_reverb::Reverb;
//!
//! let reverb = Reverb::new();
//!
//! // Switch a running reverb to a factory room
//! let hall = get_factory_preset("huge_auditorium").unwrap();
//! hall.apply(&reverb.control()).unwrap();
//!
//! // Save a tweaked copy
//! let mut mine = hall.clone();
//! mine.name = "My Hall".to_string();
//! mine.settings.wet_gain = 0.4;
//! mine.save("presets/my_hall.toml").unwrap();
//!
//! // Load it back by path
//! let loaded = ReverbPreset::find("presets/my_hall.toml").unwrap();
//! assert_eq!(loaded, mine);
//! ```

mod error;
mod preset;

/// Factory presets bundled with the library.
pub mod factory_presets;

pub use error::ConfigError;
pub use factory_presets::{
    FACTORY_PRESET_NAMES, factory_preset_names, factory_presets, get_factory_preset,
    is_factory_preset,
};
pub use preset::ReverbPreset;
