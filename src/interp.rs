//! Frame-interpolation selection: given the current animation position
//! and timing, pick the model frame to interpolate toward, or nothing.
//!
//! The result is consumed by the draw call in the same frame and thrown
//! away; nothing here persists between draws.

use crate::anim::FrameSet;

/// Fixed simulation tick rate of the game loop.
pub const TICRATE: u32 = 35;

/// Interpolation is skipped entirely when more than a quarter of a second
/// of simulation time remains; long holds snap instead of gliding.
pub const INTERPOLATION_LIMIT: f32 = TICRATE as f32 * 0.25;

/// Whether and when frames are interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMode {
    /// Never interpolate.
    Disabled,
    /// Interpolate only keys whose frame set is flagged interpolatable.
    #[default]
    Tagged,
    /// Interpolate everything, ignoring the per-key flag.
    Always,
}

/// Per-draw timing and continuation inputs for frame selection.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationInput {
    /// Position within the key's authored frame sequence.
    pub current: usize,
    /// Ticks of the current state already played.
    pub elapsed: f32,
    /// Total ticks the current state lasts.
    pub duration: f32,
    pub mode: InterpolationMode,
    /// The state holds on its final frame instead of wrapping.
    pub ends_on_last: bool,
    /// The successor state continues the same animation key family; a
    /// wrap into an unrelated sprite grouping has no meaningful target.
    pub successor_in_family: bool,
}

/// Pick the model frame index to interpolate toward, or `None` when this
/// draw should not interpolate.
///
/// `None` whenever interpolation is off, the elapsed time has already
/// passed the state duration, more than [`INTERPOLATION_LIMIT`] ticks
/// remain to play, or the key's frames are not eligible. Otherwise the
/// next sequence position, wrapped: an ends-on-last state holds at its
/// final frame, and a wrap out of the key family yields `None`.
pub fn select_next_frame(set: &FrameSet, input: &InterpolationInput) -> Option<u32> {
    match input.mode {
        InterpolationMode::Disabled => return None,
        InterpolationMode::Tagged if !set.interpolate => return None,
        _ => {}
    }
    if input.elapsed > input.duration || input.elapsed > INTERPOLATION_LIMIT {
        return None;
    }

    let count = set.frames.len();
    if count == 0 {
        return None;
    }

    let mut next = input.current + 1;
    if next >= count {
        if input.ends_on_last {
            next = count - 1;
        } else if !input.successor_in_family {
            return None;
        } else {
            next = 0;
        }
    }
    Some(set.frames[next])
}

/// Clamp a state duration to the interpolation window. Applied to the
/// duration handed to the draw call once a next frame has been selected,
/// so the blend fraction saturates instead of overshooting.
pub fn clamp_duration(duration: f32) -> f32 {
    duration.min(INTERPOLATION_LIMIT)
}
