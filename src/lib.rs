//! modeltint - Recoloring and frame selection for skinned 3D models
//!
//! This library provides the texture and animation plumbing for drawing
//! 3D character models in place of 2D sprites:
//! - Recolor model textures through blend masks and character color ramps
//! - Cache recolored variants per colormap with content dirty-checking
//! - Resolve animation keys through per-character fallback chains
//! - Select frame pairs for time-based interpolation

pub mod anim;
pub mod cache;
pub mod color;
pub mod draw;
pub mod interp;
pub mod ramp;
pub mod registry;
pub mod texture;
pub mod tint;
