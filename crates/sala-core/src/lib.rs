//! Sala Core - DSP primitives for the sala reverb
//!
//! This crate provides the building blocks the feedback delay network is
//! assembled from, designed for real-time processing with zero allocation in
//! the audio path.
//!
//! # Vector Math
//!
//! - [`VectorMath`] - Object-safe capability trait of strided vector operations
//! - [`PortableVectorMath`] - Default loop-based backend
//! - [`Strided`] / [`StridedMut`] - Slice + stride operand views
//!
//! # Filters
//!
//! - [`BiquadBank`] - `channels x levels` grid of Direct Form I biquads
//! - [`BiquadCoefficients`] - Normalised section coefficients
//! - Design: [`biquad::lowpass`], [`biquad::highpass`],
//!   [`biquad::high_shelf_first_order`]
//!
//! # Dynamics
//!
//! - [`EnergyEnvelope`] - Mean-square level follower
//!
//! # Utilities
//!
//! - [`db_to_linear`], [`linear_to_db`], [`decay_gain`],
//!   [`dry_gain_for_wet`], [`equal_power_cross_mix`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature to build for targets without the
//! standard library (`alloc` is still required):
//!
//! ```toml
//! [dependencies]
//! sala-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod biquad;
pub mod envelope;
pub mod math;
pub mod vector;

pub use biquad::{BiquadBank, BiquadCoefficients};
pub use envelope::EnergyEnvelope;
pub use math::{db_to_linear, decay_gain, dry_gain_for_wet, equal_power_cross_mix, linear_to_db};
pub use vector::{PortableVectorMath, Strided, StridedMut, VectorMath};
