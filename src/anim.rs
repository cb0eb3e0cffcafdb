//! Animation-state keys and the fallback resolver.
//!
//! A key identifies one discrete animation state of a character model.
//! Models author frames for only some keys; the resolver walks a static
//! fallback map until it finds a key with frames, with a hard hop limit
//! so a misconfigured map can never hang the render loop.
//!
//! The high bit of a key is the "super" variant flag: a super character
//! first tries the super flavor of each state, then falls back to the
//! plain one.

use std::collections::HashMap;

/// Number of base animation keys.
pub const KEY_COUNT: usize = keys::COUNT as usize;

/// Hard limit on fallback hops before the resolver gives up.
pub const MAX_FALLBACK_HOPS: u32 = 32;

/// A discrete animation-state identifier with an optional super-variant
/// flag in the high bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnimKey(pub u8);

/// The base animation states.
pub mod keys {
    use super::AnimKey;

    pub const STAND: AnimKey = AnimKey(0);
    pub const WAIT: AnimKey = AnimKey(1);
    pub const WALK: AnimKey = AnimKey(2);
    pub const SKID: AnimKey = AnimKey(3);
    pub const RUN: AnimKey = AnimKey(4);
    pub const DASH: AnimKey = AnimKey(5);
    pub const PAIN: AnimKey = AnimKey(6);
    pub const STUN: AnimKey = AnimKey(7);
    pub const DEAD: AnimKey = AnimKey(8);
    pub const DROWN: AnimKey = AnimKey(9);
    pub const ROLL: AnimKey = AnimKey(10);
    pub const GASP: AnimKey = AnimKey(11);
    pub const JUMP: AnimKey = AnimKey(12);
    pub const SPRING: AnimKey = AnimKey(13);
    pub const FALL: AnimKey = AnimKey(14);
    pub const EDGE: AnimKey = AnimKey(15);
    pub const RIDE: AnimKey = AnimKey(16);
    pub const SPIN: AnimKey = AnimKey(17);
    pub const FLY: AnimKey = AnimKey(18);
    pub const SWIM: AnimKey = AnimKey(19);
    pub const TIRE: AnimKey = AnimKey(20);
    pub const GLIDE: AnimKey = AnimKey(21);
    pub const LAND: AnimKey = AnimKey(22);
    pub const CLING: AnimKey = AnimKey(23);
    pub const CLIMB: AnimKey = AnimKey(24);
    pub const FLOAT: AnimKey = AnimKey(25);
    pub const TRANSFORM: AnimKey = AnimKey(26);

    pub const COUNT: u8 = 27;
}

impl AnimKey {
    /// The super-variant flag bit.
    pub const SUPER: u8 = 0x80;

    /// The key with the super flag stripped.
    pub fn base(self) -> AnimKey {
        AnimKey(self.0 & !Self::SUPER)
    }

    pub fn is_super(self) -> bool {
        self.0 & Self::SUPER != 0
    }

    pub fn with_super(self) -> AnimKey {
        AnimKey(self.0 | Self::SUPER)
    }

    /// Index of the base key into per-key tables.
    pub fn base_index(self) -> usize {
        self.base().0 as usize
    }
}

/// Context flags consulted for the two keys whose fallback is not a plain
/// table lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackContext {
    /// Character jumps without a spin animation: jump falls back to the
    /// spring pose instead of the roll.
    pub no_jump_spin: bool,
    /// Character swims instead of flying: tiring falls back to the swim
    /// pose instead of the flight one.
    pub can_swim: bool,
}

/// Total fallback map over the base keys.
///
/// Every key maps to its predecessor state; chains all terminate at
/// [`keys::STAND`]. The jump and tire keys are resolved through
/// [`FallbackContext`] instead of this table.
#[derive(Debug, Clone)]
pub struct FallbackTable {
    map: [AnimKey; KEY_COUNT],
}

impl Default for FallbackTable {
    fn default() -> Self {
        use keys::*;
        let mut map = [STAND; KEY_COUNT];
        map[WAIT.base_index()] = STAND;
        map[WALK.base_index()] = STAND;
        map[SKID.base_index()] = WALK;
        map[RUN.base_index()] = WALK;
        map[DASH.base_index()] = RUN;
        map[PAIN.base_index()] = STAND;
        map[STUN.base_index()] = PAIN;
        map[DEAD.base_index()] = PAIN;
        map[DROWN.base_index()] = DEAD;
        map[ROLL.base_index()] = STAND;
        map[GASP.base_index()] = STAND;
        map[SPRING.base_index()] = FALL;
        map[FALL.base_index()] = WALK;
        map[EDGE.base_index()] = STAND;
        map[RIDE.base_index()] = FALL;
        map[SPIN.base_index()] = ROLL;
        map[FLY.base_index()] = SPRING;
        map[SWIM.base_index()] = FLY;
        map[GLIDE.base_index()] = FLY;
        map[LAND.base_index()] = STAND;
        map[CLING.base_index()] = CLIMB;
        map[CLIMB.base_index()] = WALK;
        map[FLOAT.base_index()] = WALK;
        map[TRANSFORM.base_index()] = STAND;
        Self { map }
    }
}

impl FallbackTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: AnimKey) -> AnimKey {
        self.map[key.base_index()]
    }

    /// Override a single fallback edge. Intended for tests and custom
    /// characters; termination is the resolver's hop limit, not this
    /// table.
    pub fn set(&mut self, key: AnimKey, fallback: AnimKey) {
        self.map[key.base_index()] = fallback;
    }
}

/// Capability: "this key has authored frames". Implemented by whatever
/// owns the per-model frame tables.
pub trait FrameSource {
    /// Number of authored frames for `key`, super flag included.
    fn frame_count(&self, key: AnimKey) -> usize;
}

/// The authored frames for one animation key: model frame indices in
/// playback order, plus whether interpolating between them is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameSet {
    pub frames: Vec<u32>,
    pub interpolate: bool,
}

/// Per-model frame tables keyed by full key bits (so super variants are
/// authored independently of their base states).
#[derive(Debug, Clone, Default)]
pub struct ModelFrames {
    sets: HashMap<u8, FrameSet>,
}

impl ModelFrames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: AnimKey, set: FrameSet) {
        self.sets.insert(key.0, set);
    }

    pub fn get(&self, key: AnimKey) -> Option<&FrameSet> {
        self.sets.get(&key.0)
    }
}

impl FrameSource for ModelFrames {
    fn frame_count(&self, key: AnimKey) -> usize {
        self.sets.get(&key.0).map_or(0, |s| s.frames.len())
    }
}

/// Resolve `key` to a key with authored frames, walking the fallback map.
///
/// Stripping the super flag counts as one hop, like any other fallback
/// step. Keys outside the known range resolve straight to the default
/// stand key. Returns `None` when [`MAX_FALLBACK_HOPS`] is reached
/// without finding a playable key — the caller skips the model for this
/// frame rather than looping forever on a cyclic map.
pub fn resolve(
    key: AnimKey,
    frames: &impl FrameSource,
    table: &FallbackTable,
    ctx: &FallbackContext,
) -> Option<AnimKey> {
    use keys::{FLY, JUMP, ROLL, SPRING, STAND, SWIM, TIRE};

    if key.base_index() >= KEY_COUNT {
        return Some(STAND);
    }

    let mut key = key;
    let mut super_flag = 0u8;
    let mut hops = 0u32;

    while frames.frame_count(key) == 0 && key != STAND {
        hops += 1;
        if hops == MAX_FALLBACK_HOPS {
            return None;
        }

        if key.is_super() {
            super_flag = AnimKey::SUPER;
            key = key.base();
            continue;
        }

        let next = match key {
            JUMP => {
                if ctx.no_jump_spin {
                    SPRING
                } else {
                    ROLL
                }
            }
            TIRE => {
                if ctx.can_swim {
                    SWIM
                } else {
                    FLY
                }
            }
            other => table.get(other),
        };
        key = AnimKey(next.0 | super_flag);
    }

    Some(key)
}
