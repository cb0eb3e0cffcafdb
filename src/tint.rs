//! Blended-texture generation: recolors a base model texture through a
//! blend mask and a character color ramp.
//!
//! `generate_blended` is a pure function over pixel buffers. The blend
//! mask's alpha channel controls how strongly the ramp color replaces the
//! base pixel; its RGB carries the brightness that selects the ramp
//! segment. Special modes (flash, rainbow, halo, metal, boss) replace the
//! default formula wholesale.
//!
//! All arithmetic is integer-exact with the original engine's blending
//! code, including its truncating divisions and the rainbow gradient's
//! last-segment quirks. Do not "clean up" the formulas.

use crate::color::{pixel_brightness, rgb_brightness};
use crate::ramp::{ColorRamp, RampEntry};
use image::{Rgb, Rgba, RgbaImage};

/// How a texture is recolored. Special modes are mutually exclusive with
/// ordinary palette recoloring and carry their own per-pixel formulas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TintMode {
    /// Default path: blend the base pixel toward the ramp gradient color.
    Skin,
    /// Every pixel turns white, alpha preserved (boss hit flash).
    FlashWhite,
    /// Skin path on a fixed cobalt ramp, then dark pure-blue shades get
    /// their non-blue channels inverted (metal boss flash).
    MetalFlash,
    /// Skin path, then dark gray base pixels become inverted gray.
    BossFlash,
    /// Matches pixel brightness against the ramp's own brightnesses and
    /// rescales the pixel toward the closest not-darker entry.
    Rainbow,
    /// Additive red/green halo synthesized from the blend mask.
    DashHalo,
}

/// Recolor `base` through `blend` using `mode` and `ramp`.
///
/// Returns a freshly allocated buffer with `base`'s dimensions; never
/// fails. The caller guarantees `blend`, when present, has the same
/// dimensions as `base` (the texture cache silently drops mismatched
/// masks before calling in).
///
/// A missing mask or an absent/empty ramp degrades to a pixel copy, but
/// the metal and boss post-processing steps still run on the copied
/// pixels.
pub fn generate_blended(
    base: &RgbaImage,
    blend: Option<&RgbaImage>,
    mode: TintMode,
    ramp: Option<&ColorRamp>,
) -> RgbaImage {
    if let Some(mask) = blend {
        debug_assert_eq!(base.dimensions(), mask.dimensions());
    }

    let ramp = ramp.filter(|r| !r.is_empty());
    // Rainbow scans entry brightnesses per pixel; hoist them out.
    let entry_brightness = match (mode, ramp) {
        (TintMode::Rainbow, Some(r)) => r.entry_brightnesses(),
        _ => Vec::new(),
    };

    let mut out = RgbaImage::new(base.width(), base.height());
    for (x, y, &src) in base.enumerate_pixels() {
        let mask = blend.map(|b| *b.get_pixel(x, y));
        let px = match mode {
            TintMode::FlashWhite => Rgba([255, 255, 255, src.0[3]]),
            TintMode::DashHalo => dash_halo_pixel(src, mask),
            TintMode::Rainbow => rainbow_pixel(src, mask, ramp, &entry_brightness),
            TintMode::Skin => palette_pixel(src, mask, ramp),
            TintMode::MetalFlash => {
                let mut cur = palette_pixel(src, mask, ramp);
                metal_post(&mut cur, src);
                cur
            }
            TintMode::BossFlash => {
                let mut cur = palette_pixel(src, mask, ramp);
                boss_post(&mut cur, src);
                cur
            }
        };
        out.put_pixel(x, y, px);
    }
    out
}

/// Default palette path for one pixel.
fn palette_pixel(src: Rgba<u8>, mask: Option<Rgba<u8>>, ramp: Option<&ColorRamp>) -> Rgba<u8> {
    let (Some(mask), Some(ramp)) = (mask, ramp) else {
        return src;
    };
    let mask_alpha = mask.0[3];
    if mask_alpha == 0 {
        return src;
    }
    let target = ramp_target(ramp, pixel_brightness(mask));
    compose(src, target, mask_alpha)
}

/// Blend `target` over `src` by the mask alpha: each channel is
/// `src*(255-a)/255 + target*a/255`, terms truncated separately, clamped
/// to 255. Output alpha is the base pixel's alpha.
fn compose(src: Rgba<u8>, target: Rgb<u8>, mask_alpha: u8) -> Rgba<u8> {
    let ma = mask_alpha as u32;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let v = (src.0[c] as u32 * (255 - ma)) / 255 + (target.0[c] as u32 * ma) / 255;
        out[c] = v.min(255) as u8;
    }
    out[3] = src.0[3];
    Rgba(out)
}

/// Locate the ramp segment for `brightness` by cutoff scan and return the
/// interpolated gradient color.
fn ramp_target(ramp: &ColorRamp, brightness: u8) -> Rgb<u8> {
    let entries = ramp.entries();
    let mut first = 0;
    for i in 1..entries.len() {
        if brightness >= entries[i].cutoff {
            break;
        }
        first = i;
    }
    let second = first + 1;
    let mut mulmax = entries[first].cutoff as i32;
    if second < entries.len() {
        mulmax -= entries[second].cutoff as i32;
    }
    let mul = entries[first].cutoff as i32 - brightness as i32;
    gradient(entries, first, mul, mulmax)
}

/// Shared gradient tail: start from `entries[first]` and step toward
/// `entries[first + 1]` by `mul / mulmax`. A segment index past the ramp
/// end forces the multiplier to zero, i.e. the last color exactly.
fn gradient(entries: &[RampEntry], first: usize, mut mul: i32, mulmax: i32) -> Rgb<u8> {
    let second = first + 1;
    let mut color = entries[first].color;
    if second >= entries.len() {
        mul = 0;
    }
    if mul > 0 && mulmax > 0 {
        let next = entries[second].color;
        for c in 0..3 {
            let diff = next.0[c] as i32 - color.0[c] as i32;
            color.0[c] = (color.0[c] as i32 + (mul * diff) / mulmax) as u8;
        }
    }
    color
}

/// Rainbow path for one pixel.
///
/// Brightness comes from a mask-alpha-weighted average of base and mask
/// brightness. Candidate entries are restricted to those at least as
/// bright as the pixel, picking the closest; the gradient multiplier is
/// `15 - 16*m/d` with the original's exact last-segment arithmetic.
/// Near-pure white and black pixels pass through untouched (the rescale
/// division is unstable there).
fn rainbow_pixel(
    src: Rgba<u8>,
    mask: Option<Rgba<u8>>,
    ramp: Option<&ColorRamp>,
    entry_brightness: &[u8],
) -> Rgba<u8> {
    let (Some(mask), Some(ramp)) = (mask, ramp) else {
        return src;
    };
    if src.0[3] == 0 && mask.0[3] == 0 {
        return src;
    }

    let ma = mask.0[3] as u32;
    let base_bright = pixel_brightness(src) as u32;
    let mask_bright = pixel_brightness(mask) as u32;
    let bright = ((base_bright * (255 - ma)) / 255 + (mask_bright * ma) / 255) as u8;

    if bright > 253 || bright < 2 {
        return src;
    }

    let entries = ramp.entries();
    let mut first = 0;
    let mut best_dif = 256i32;
    for (i, &eb) in entry_brightness.iter().enumerate() {
        if bright > eb {
            continue;
        }
        let dif = (eb as i32 - bright as i32).abs();
        if dif < best_dif {
            best_dif = dif;
            first = i;
        }
    }

    let second = first + 1;
    let (mut m, d) = if second >= entries.len() {
        (bright as i32, entry_brightness[first] as i32)
    } else {
        (
            bright as i32 - entry_brightness[second] as i32,
            entry_brightness[first] as i32 - entry_brightness[second] as i32,
        )
    };
    if m >= d {
        m = d - 1;
    }
    let mulmax = 16;
    let mul = if m <= 0 || d <= 0 { 0 } else { (mulmax - 1) - (m * mulmax) / d };

    let target = gradient(entries, first, mul, mulmax);
    let target_bright = rgb_brightness(target).max(1) as u32;

    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = ((bright as u32 * target.0[c] as u32) / target_bright).min(255) as u8;
    }
    out[3] = src.0[3];
    Rgba(out)
}

/// Additive dash-halo path for one pixel.
fn dash_halo_pixel(src: Rgba<u8>, mask: Option<Rgba<u8>>) -> Rgba<u8> {
    let Some(mask) = mask else {
        return src;
    };
    if src.0[3] == 0 && mask.0[3] == 0 {
        return src;
    }

    let ma = mask.0[3] as u32;
    let ia = 255 - ma;

    let halo: [u8; 3] = if mask.0[3] != 0 {
        let avg = (mask.0[0] as u32 + mask.0[1] as u32 + mask.0[2] as u32) / 3;
        [255, avg as u8, 0]
    } else {
        [0, 0, 0]
    };

    let mut tinted = [src.0[0], src.0[1], src.0[2]];
    // Red-dominant base pixels read better with red and blue swapped
    // under the halo; threshold is red > 2x green.
    if src.0[3] != 0 && src.0[0] as u16 > (src.0[1] as u16) << 1 {
        tinted.swap(0, 2);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        out[c] = ((ia * tinted[c] as u32 + ma * halo[c] as u32) / 255) as u8;
    }
    out[3] = src.0[3];
    Rgba(out)
}

/// Metal flash post-process: dark pure-blue shades blend toward white by
/// inverting the non-blue channels. Always restores the base alpha.
fn metal_post(cur: &mut Rgba<u8>, src: Rgba<u8>) {
    if cur.0[3] > 0 && cur.0[0] == 0 && cur.0[1] == 0 && cur.0[2] < 255 && cur.0[2] > 31 {
        let inv = 255 - cur.0[2];
        cur.0[0] = inv;
        cur.0[1] = inv;
        cur.0[2] = 255;
    }
    cur.0[3] = src.0[3];
}

/// Boss flash post-process: gray base pixels below the threshold become
/// uniform inverted gray.
fn boss_post(cur: &mut Rgba<u8>, src: Rgba<u8>) {
    if src.0[0] == src.0[1] && src.0[1] == src.0[2] && src.0[2] < 127 {
        let inv = 255 - src.0[2];
        cur.0[0] = inv;
        cur.0[1] = inv;
        cur.0[2] = inv;
    }
}
