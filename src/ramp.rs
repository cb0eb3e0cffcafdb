//! Color ramps: the quantized per-character palettes driving recoloring.
//!
//! A ramp starts life as an ordered list of up to 16 RGB colors. Adjacent
//! duplicates are collapsed into a single entry carrying a brightness
//! cutoff, so a run of identical colors claims a wider brightness band.
//! The cutoff arithmetic is integer-exact with the original engine:
//! `previous - 256 / (16 / run_len)`, every division truncating.

use crate::color::{self, ColorError};
use image::Rgb;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of quantized colors in a ramp definition.
pub const RAMP_LEN: usize = 16;

/// One collapsed ramp entry: a color and the brightness cutoff below which
/// the *next* entry takes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RampEntry {
    pub color: Rgb<u8>,
    pub cutoff: u8,
}

/// An ordered, de-duplicated color ramp.
///
/// Invariants: at most [`RAMP_LEN`] entries; the first entry's cutoff is
/// always 255; cutoffs decrease from there. The final entry's cutoff is 0
/// (it catches everything darker than its predecessor).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorRamp {
    entries: Vec<RampEntry>,
}

impl ColorRamp {
    /// Build a ramp from an ordered color list, collapsing adjacent
    /// duplicates into cutoff bands.
    ///
    /// Only the first [`RAMP_LEN`] colors are considered. The run length of
    /// the very first entry never influences any cutoff; that matches the
    /// original table builder.
    pub fn from_colors(colors: &[Rgb<u8>]) -> Self {
        let mut entries: Vec<RampEntry> = Vec::with_capacity(RAMP_LEN);
        let colors = &colors[..colors.len().min(RAMP_LEN)];

        let Some(&first) = colors.first() else {
            return Self { entries };
        };
        entries.push(RampEntry { color: first, cutoff: 255 });

        let mut run_len: i32 = 1;
        for &c in &colors[1..] {
            if entries.last().map(|e| e.color) == Some(c) {
                run_len += 1;
                continue;
            }
            let i = entries.len() - 1;
            if i > 0 {
                // Cutoff for the entry whose run just ended. The nested
                // truncating divisions and the u8 wrap are load-bearing.
                let band = 256 / (16 / run_len);
                entries[i].cutoff = (entries[i - 1].cutoff as i32 - band) as u8;
            }
            run_len = 1;
            entries.push(RampEntry { color: c, cutoff: 0 });
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[RampEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Brightness of each entry's color, in ramp order. Used by the
    /// rainbow recolor path, which matches pixels against the ramp's own
    /// brightnesses instead of cutoff bands.
    pub fn entry_brightnesses(&self) -> Vec<u8> {
        self.entries.iter().map(|e| color::rgb_brightness(e.color)).collect()
    }
}

/// A named ramp definition as it appears in a JSON5/JSONL table file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RampDef {
    pub name: String,
    pub ramp: Vec<String>,
}

/// Error type for ramp table loading.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RampTableError {
    #[error("line {line}: {message}")]
    Parse { message: String, line: usize },
    #[error("line {line}: ramp '{name}' has {count} colors, maximum is {RAMP_LEN}")]
    TooManyColors { name: String, count: usize, line: usize },
    #[error("line {line}: ramp '{name}': {source}")]
    BadColor {
        name: String,
        line: usize,
        #[source]
        source: ColorError,
    },
}

/// Registry of named color ramps, loaded once per session.
#[derive(Debug, Clone, Default)]
pub struct RampTable {
    ramps: HashMap<String, ColorRamp>,
}

impl RampTable {
    pub fn new() -> Self {
        Self { ramps: HashMap::new() }
    }

    /// Register a ramp under a name, replacing any existing entry.
    pub fn register(&mut self, name: impl Into<String>, ramp: ColorRamp) {
        self.ramps.insert(name.into(), ramp);
    }

    pub fn get(&self, name: &str) -> Option<&ColorRamp> {
        self.ramps.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.ramps.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.ramps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ramps.is_empty()
    }

    /// Register a ramp from a parsed definition.
    fn register_def(&mut self, def: &RampDef, line: usize) -> Result<(), RampTableError> {
        if def.ramp.len() > RAMP_LEN {
            return Err(RampTableError::TooManyColors {
                name: def.name.clone(),
                count: def.ramp.len(),
                line,
            });
        }
        let colors = def
            .ramp
            .iter()
            .map(|s| color::parse_rgb(s))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| RampTableError::BadColor { name: def.name.clone(), line, source })?;
        self.register(&def.name, ColorRamp::from_colors(&colors));
        Ok(())
    }

    /// Load ramp definitions from JSON5 lines, one object per line:
    ///
    /// ```text
    /// { name: "emerald", ramp: ["#A0FFA0", "#70E470", /* ... */] }
    /// ```
    ///
    /// Empty lines and `//` comment lines are skipped. Stops at the first
    /// malformed definition.
    pub fn load_jsonl(&mut self, text: &str) -> Result<(), RampTableError> {
        for (i, raw) in text.lines().enumerate() {
            let line = i + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with("//") {
                continue;
            }
            let def: RampDef = json5::from_str(trimmed)
                .map_err(|e| RampTableError::Parse { message: e.to_string(), line })?;
            self.register_def(&def, line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb(r: u8, g: u8, b: u8) -> Rgb<u8> {
        Rgb([r, g, b])
    }

    #[test]
    fn test_empty_ramp() {
        let ramp = ColorRamp::from_colors(&[]);
        assert!(ramp.is_empty());
    }

    #[test]
    fn test_single_run_collapses_to_one_entry() {
        let ramp = ColorRamp::from_colors(&[rgb(10, 10, 10); 16]);
        assert_eq!(ramp.len(), 1);
        assert_eq!(ramp.entries()[0].cutoff, 255);
    }

    #[test]
    fn test_distinct_colors_step_by_sixteen() {
        // 16 distinct colors: every run has length 1, band = 256/16 = 16.
        let colors: Vec<_> = (0..16).map(|i| rgb(i as u8 * 16, 0, 0)).collect();
        let ramp = ColorRamp::from_colors(&colors);
        assert_eq!(ramp.len(), 16);
        assert_eq!(ramp.entries()[0].cutoff, 255);
        assert_eq!(ramp.entries()[1].cutoff, 255 - 16);
        assert_eq!(ramp.entries()[2].cutoff, 255 - 32);
        assert_eq!(ramp.entries()[14].cutoff, 255 - 14 * 16);
        // Last entry's cutoff is never assigned
        assert_eq!(ramp.entries()[15].cutoff, 0);
    }

    #[test]
    fn test_duplicate_run_widens_band() {
        // A, B, B, C: B's run of 2 gives band 256/(16/2) = 32.
        let ramp =
            ColorRamp::from_colors(&[rgb(1, 0, 0), rgb(2, 0, 0), rgb(2, 0, 0), rgb(3, 0, 0)]);
        assert_eq!(ramp.len(), 3);
        assert_eq!(ramp.entries()[0].cutoff, 255);
        assert_eq!(ramp.entries()[1].cutoff, 255 - 32);
        assert_eq!(ramp.entries()[2].cutoff, 0);
    }

    #[test]
    fn test_first_run_length_is_ignored() {
        // The leading run never contributes a band; cutoff[1] still comes
        // from entry 1's own run length.
        let ramp = ColorRamp::from_colors(&[
            rgb(1, 0, 0),
            rgb(1, 0, 0),
            rgb(1, 0, 0),
            rgb(2, 0, 0),
            rgb(3, 0, 0),
        ]);
        assert_eq!(ramp.len(), 3);
        assert_eq!(ramp.entries()[1].cutoff, 255 - 16);
    }

    #[test]
    fn test_truncating_band_division() {
        // Run of 3: 16/3 = 5, 256/5 = 51.
        let colors = [
            rgb(1, 0, 0),
            rgb(2, 0, 0),
            rgb(2, 0, 0),
            rgb(2, 0, 0),
            rgb(3, 0, 0),
        ];
        let ramp = ColorRamp::from_colors(&colors);
        assert_eq!(ramp.entries()[1].cutoff, 255 - 51);
    }

    #[test]
    fn test_entry_brightnesses_order() {
        let ramp = ColorRamp::from_colors(&[rgb(255, 255, 255), rgb(128, 128, 128), rgb(0, 0, 0)]);
        let b = ramp.entry_brightnesses();
        assert_eq!(b.len(), 3);
        assert!(b[0] > b[1] && b[1] > b[2]);
    }

    #[test]
    fn test_table_register_and_get() {
        let mut table = RampTable::new();
        table.register("emerald", ColorRamp::from_colors(&[rgb(0, 255, 0)]));
        assert!(table.contains("emerald"));
        assert_eq!(table.get("emerald").unwrap().len(), 1);
        assert!(table.get("ruby").is_none());
    }

    #[test]
    fn test_load_jsonl() {
        let mut table = RampTable::new();
        table
            .load_jsonl(
                r##"
// character colors
{ name: "emerald", ramp: ["#A0FFA0", "#70E470", "#40C040"] }
{ name: "ruby", ramp: ["#FFA0A0", "#E47070"] }
"##,
            )
            .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("emerald").unwrap().len(), 3);
    }

    #[test]
    fn test_load_jsonl_bad_color() {
        let mut table = RampTable::new();
        let err = table
            .load_jsonl(r##"{ name: "bad", ramp: ["#XYZ"] }"##)
            .unwrap_err();
        assert!(matches!(err, RampTableError::BadColor { line: 1, .. }));
    }

    #[test]
    fn test_load_jsonl_too_many_colors() {
        let mut table = RampTable::new();
        let colors: Vec<String> = (0..17).map(|_| "\"#112233\"".to_string()).collect();
        let line = format!("{{ name: \"long\", ramp: [{}] }}", colors.join(", "));
        let err = table.load_jsonl(&line).unwrap_err();
        assert!(matches!(err, RampTableError::TooManyColors { count: 17, .. }));
    }
}
