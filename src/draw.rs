//! Per-draw orchestration: classify the tint, activate the recolored
//! texture, resolve the animation key and pick the frame pair.
//!
//! `prepare` is the one entry point the renderer calls per visible model.
//! It produces a [`DrawPlan`] with everything the mesh submission needs,
//! or `None` when the model should be skipped this frame and the 2D
//! sprite drawn instead.

use crate::anim::{resolve, AnimKey, FallbackContext, FallbackTable};
use crate::cache::{Blender, ColormapId, RemapTable};
use crate::interp::{clamp_duration, select_next_frame, InterpolationInput, InterpolationMode};
use crate::ramp::RampTable;
use crate::registry::{FileSource, ModelSlot};
use crate::texture::GpuDevice;
use crate::tint::TintMode;

/// Ramp forced for the metal flash regardless of the entity's own color.
pub const METAL_FLASH_RAMP: &str = "cobalt";

/// Already-resolved world flags that decide which tint mode applies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TintFlags {
    /// Boss invulnerability flash is active this tic.
    pub boss_flash: bool,
    /// Entity is colorized (carries a forced color rather than a skin).
    pub colorized: bool,
    /// Entity is the metal boss.
    pub metal: bool,
    /// Entity has a character color at all.
    pub has_color: bool,
    /// Dash mode is charged past the trigger threshold.
    pub dash_mode: bool,
    /// Dash mode belongs to a machine character (halo instead of rainbow).
    pub machine: bool,
}

/// Classify the tint for this draw, `None` meaning the base texture is
/// used untinted. Flash states win over color states; colorized entities
/// take the rainbow paths instead of the skin palette.
pub fn select_tint(flags: &TintFlags) -> Option<TintMode> {
    if flags.boss_flash {
        Some(if flags.colorized {
            TintMode::FlashWhite
        } else if flags.metal {
            TintMode::MetalFlash
        } else {
            TintMode::BossFlash
        })
    } else if flags.has_color {
        Some(if flags.colorized {
            TintMode::Rainbow
        } else if flags.dash_mode {
            if flags.machine {
                TintMode::DashHalo
            } else {
                TintMode::Rainbow
            }
        } else {
            TintMode::Skin
        })
    } else {
        None
    }
}

/// All per-draw inputs, resolved by the caller from world state.
#[derive(Debug, Clone, Copy)]
pub struct DrawInputs<'a> {
    pub tint: TintFlags,
    /// Name of the entity's color ramp, when it has one.
    pub color: Option<&'a str>,
    /// Stable identity of the active colormap.
    pub colormap: ColormapId,
    /// Current remap content for that colormap.
    pub remap: Option<&'a RemapTable>,
    pub key: AnimKey,
    /// Sprite frame counter for the current state.
    pub frame: u32,
    pub elapsed: f32,
    pub duration: f32,
    pub mode: InterpolationMode,
    pub ends_on_last: bool,
    pub successor_in_family: bool,
    pub ctx: FallbackContext,
}

/// Everything the mesh submission needs for one model draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawPlan {
    /// Model frame to draw.
    pub frame: u32,
    /// Model frame to interpolate toward, when interpolating.
    pub next_frame: Option<u32>,
    /// State duration, clamped to the interpolation window when a next
    /// frame was selected.
    pub duration: f32,
    pub elapsed: f32,
    pub scale: f32,
    pub offset: f32,
}

/// Prepare one model draw: activate the (possibly recolored) texture on
/// `device` and select the frame pair.
///
/// `None` skips the model for this draw: the slot is marked bad, its
/// texture never loaded, the resolver exhausted its hop limit, or the
/// resolved key has no frames.
pub fn prepare(
    slot: &mut ModelSlot,
    ramps: &RampTable,
    fallbacks: &FallbackTable,
    inputs: &DrawInputs,
    source: &mut dyn FileSource,
    device: &mut dyn GpuDevice,
    blender: &mut dyn Blender,
) -> Option<DrawPlan> {
    if slot.error {
        return None;
    }
    slot.ensure_textures(source);

    // An untinted draw goes through the cache with no remap so the base
    // texture is still the one made current.
    let (mode, remap) = match select_tint(&inputs.tint) {
        Some(mode) => (mode, inputs.remap),
        None => (TintMode::Skin, None),
    };
    let ramp_name = match mode {
        TintMode::MetalFlash => Some(METAL_FLASH_RAMP),
        _ => inputs.color,
    };
    let ramp = ramp_name.and_then(|n| ramps.get(n));

    if !slot.activate_texture(inputs.colormap, remap, mode, ramp, device, blender) {
        return None;
    }

    let key = resolve(inputs.key, &slot.frames, fallbacks, &inputs.ctx)?;
    let set = slot.frames.get(key)?;
    if set.frames.is_empty() {
        return None;
    }

    let current = inputs.frame as usize % set.frames.len();
    let next_frame = select_next_frame(
        set,
        &InterpolationInput {
            current,
            elapsed: inputs.elapsed,
            duration: inputs.duration,
            mode: inputs.mode,
            ends_on_last: inputs.ends_on_last,
            successor_in_family: inputs.successor_in_family,
        },
    );
    let duration = if next_frame.is_some() {
        clamp_duration(inputs.duration)
    } else {
        inputs.duration
    };

    Some(DrawPlan {
        frame: set.frames[current],
        next_frame,
        duration,
        elapsed: inputs.elapsed,
        scale: slot.scale,
        offset: slot.offset,
    })
}
