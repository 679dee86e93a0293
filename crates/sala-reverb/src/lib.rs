//! Sala Reverb - feedback delay network stereo reverb
//!
//! A real-time reverberation engine built from `4 * units` prime-length
//! delay lines coupled through an energy-preserving mixing matrix, with
//! per-line gains and high-shelf filters that set the decay time overall
//! and above a corner frequency.
//!
//! # Components
//!
//! | component | role |
//! |-----------|------|
//! | [`DelayNetwork`] | arena of circular delay lines, per-line decay gains |
//! | [`MixingMatrix`] | per-unit Hadamard butterfly, cross-unit permutation, stereo taps |
//! | [`DecayFilterBank`] | HF decay shelves on the feedback path, output HP/LP |
//! | [`ReverbControl`] | thread-safe setters, deferred structural changes |
//! | [`Reverb`] | block processing entry point |
//!
//! # Threading
//!
//! One audio thread owns the [`Reverb`] and calls
//! [`process_buffer`](Reverb::process_buffer); any number of control threads
//! hold [`ReverbControl`] clones. Immediate settings are atomics picked up
//! at the start of the next block. Structural settings (delay units,
//! pre-delay, room size, sample rate) are queued and applied by the audio
//! thread before it processes its next block, never mid-block.
//!
//! # Example
//!
//! ```rust
//! use sala_reverb::{Reverb, ReverbSettings};
//!
//! let mut reverb = Reverb::with_settings(ReverbSettings {
//!     rt60: 2.3,
//!     wet_gain: 0.3,
//!     ..ReverbSettings::default()
//! })
//! .unwrap();
//!
//! let input = vec![0.0f32; 128];
//! let mut left = vec![0.0f32; 128];
//! let mut right = vec![0.0f32; 128];
//! reverb.process_buffer(&input, &input, &mut left, &mut right);
//!
//! // Structural changes are queued until the next block
//! reverb.set_num_delay_units(8).unwrap();
//! assert_eq!(reverb.num_delays(), 16);
//! reverb.process_buffer(&input, &input, &mut left, &mut right);
//! assert_eq!(reverb.num_delays(), 32);
//! ```

pub mod control;
mod controller;
pub mod decay_filter;
pub mod error;
pub mod mixing;
pub mod network;
pub mod processor;
pub mod settings;
pub mod sustain;

pub use control::{ControllerState, ReverbControl};
pub use decay_filter::DecayFilterBank;
pub use error::ReverbError;
pub use mixing::MixingMatrix;
pub use network::DelayNetwork;
pub use processor::{CHUNK_SIZE, Reverb};
pub use settings::{ImmediateSettings, ReverbSettings, StructuralSettings};
pub use sustain::AutoSustain;
