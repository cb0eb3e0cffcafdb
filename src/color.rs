//! Color utilities: hex parsing for ramp definitions and the integer
//! brightness weighting used by every recoloring path.

use image::{Rgb, Rgba};
use thiserror::Error;

/// Error type for color parsing failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    /// Input string was empty
    #[error("empty color string")]
    Empty,
    /// Input string doesn't start with '#'
    #[error("color must start with '#'")]
    MissingHash,
    /// Invalid length (must be 3 or 6 hex chars after #)
    #[error("invalid color length {0}, expected 3 or 6")]
    InvalidLength(usize),
    /// Contains non-hex characters
    #[error("invalid hex character '{0}'")]
    InvalidHex(char),
}

/// Perceived brightness of an RGB triple on a 0-255 scale.
///
/// Integer approximation of relative luminance (0.2126 R, 0.7152 G,
/// 0.0722 B), computed exactly as `1063*r/5000 + 3576*g/5000 + 361*b/5000`
/// with each term divided separately. Recolor output depends on these
/// exact divisions, so the expression must not be collapsed into a single
/// fraction.
pub fn brightness(r: u8, g: u8, b: u8) -> u8 {
    ((1063 * r as u32) / 5000 + (3576 * g as u32) / 5000 + (361 * b as u32) / 5000) as u8
}

/// Brightness of an RGBA pixel (alpha ignored).
pub fn pixel_brightness(p: Rgba<u8>) -> u8 {
    brightness(p.0[0], p.0[1], p.0[2])
}

/// Brightness of an RGB ramp entry.
pub fn rgb_brightness(c: Rgb<u8>) -> u8 {
    brightness(c.0[0], c.0[1], c.0[2])
}

/// Parse a `#RGB` or `#RRGGBB` hex string into an RGB color.
///
/// Ramp definitions have no alpha channel, so only the opaque forms are
/// accepted.
pub fn parse_rgb(s: &str) -> Result<Rgb<u8>, ColorError> {
    if s.is_empty() {
        return Err(ColorError::Empty);
    }
    let hex = s.strip_prefix('#').ok_or(ColorError::MissingHash)?;

    match hex.len() {
        3 => {
            let mut chars = hex.chars();
            let r = parse_hex_digit(chars.next().unwrap())? * 17;
            let g = parse_hex_digit(chars.next().unwrap())? * 17;
            let b = parse_hex_digit(chars.next().unwrap())? * 17;
            Ok(Rgb([r, g, b]))
        }
        6 => {
            let r = parse_hex_pair(&hex[0..2])?;
            let g = parse_hex_pair(&hex[2..4])?;
            let b = parse_hex_pair(&hex[4..6])?;
            Ok(Rgb([r, g, b]))
        }
        len => Err(ColorError::InvalidLength(len)),
    }
}

/// Parse a single hex digit (0-9, A-F, a-f) to u8 (0-15)
fn parse_hex_digit(c: char) -> Result<u8, ColorError> {
    match c {
        '0'..='9' => Ok(c as u8 - b'0'),
        'a'..='f' => Ok(c as u8 - b'a' + 10),
        'A'..='F' => Ok(c as u8 - b'A' + 10),
        _ => Err(ColorError::InvalidHex(c)),
    }
}

/// Parse a two-character hex string to u8 (0-255)
fn parse_hex_pair(s: &str) -> Result<u8, ColorError> {
    let mut chars = s.chars();
    let high = parse_hex_digit(chars.next().unwrap())?;
    let low = parse_hex_digit(chars.next().unwrap())?;
    Ok(high * 16 + low)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_extremes() {
        assert_eq!(brightness(0, 0, 0), 0);
        // 54 + 182 + 18 with the per-term integer divisions
        assert_eq!(brightness(255, 255, 255), 254);
    }

    #[test]
    fn test_brightness_green_dominates() {
        let g = brightness(0, 255, 0);
        let r = brightness(255, 0, 0);
        let b = brightness(0, 0, 255);
        assert!(g > r && r > b);
        assert_eq!(g, 182);
        assert_eq!(r, 54);
        assert_eq!(b, 18);
    }

    #[test]
    fn test_brightness_per_term_division() {
        // 1063*200/5000 = 42, 3576*100/5000 = 71, 361*50/5000 = 3
        assert_eq!(brightness(200, 100, 50), 116);
    }

    #[test]
    fn test_parse_rgb_six_digit() {
        assert_eq!(parse_rgb("#FF8000").unwrap(), Rgb([255, 128, 0]));
        assert_eq!(parse_rgb("#000000").unwrap(), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_parse_rgb_three_digit() {
        assert_eq!(parse_rgb("#F00").unwrap(), Rgb([255, 0, 0]));
        assert_eq!(parse_rgb("#abc").unwrap(), Rgb([170, 187, 204]));
    }

    #[test]
    fn test_parse_rgb_errors() {
        assert_eq!(parse_rgb(""), Err(ColorError::Empty));
        assert_eq!(parse_rgb("FF0000"), Err(ColorError::MissingHash));
        assert_eq!(parse_rgb("#FF00"), Err(ColorError::InvalidLength(4)));
        assert_eq!(parse_rgb("#GG0000"), Err(ColorError::InvalidHex('G')));
    }
}
