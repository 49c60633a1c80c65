//! Tonal protection masks for region-specific blending.
//!
//! ## Mask Types
//!
//! - **Highlight**: weight rises from 0 at the threshold to the configured
//!   strength `range` above it
//! - **Shadow**: weight rises from 0 at the threshold to the configured
//!   strength `range` below it
//!
//! Masks are single-channel [`crate::FloatImage`]s with values from 0.0 (no
//! protection) to 1.0 (the zone's own blend mode fully replaces the default).

pub mod protection;

pub use protection::{ProtectionConfig, ProtectionMasks};
