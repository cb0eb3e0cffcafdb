//! The blended-texture cache: one generated texture per colormap identity
//! per base texture.
//!
//! Nodes live in an arena-backed vector with an identity-to-index map
//! (no pointer chains). Each node snapshots the 256-byte remap table it
//! was generated from; a lookup whose snapshot matches is a pure cache
//! hit, a lookup whose snapshot drifted regenerates in place on the same
//! node. Nodes are never evicted individually; the whole cache tears down
//! with its base texture.

use crate::ramp::ColorRamp;
use crate::texture::{GpuDevice, Texture};
use crate::tint::{self, TintMode};
use image::RgbaImage;
use std::collections::HashMap;

/// Opaque identity of a palette-remap table instance. Used purely as a
/// cache key; two ids may point at byte-identical tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColormapId(pub u64);

/// A 256-entry palette remap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemapTable([u8; 256]);

impl RemapTable {
    pub fn new(bytes: [u8; 256]) -> Self {
        Self(bytes)
    }

    /// The identity mapping: every index maps to itself, meaning "no
    /// recolor".
    pub fn identity() -> Self {
        let mut bytes = [0u8; 256];
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = i as u8;
        }
        Self(bytes)
    }

    pub fn is_identity(&self) -> bool {
        self.0.iter().enumerate().all(|(i, &b)| b == i as u8)
    }

    pub fn as_bytes(&self) -> &[u8; 256] {
        &self.0
    }
}

impl Default for RemapTable {
    fn default() -> Self {
        Self::identity()
    }
}

/// The generation step the cache invokes on a miss or a dirty snapshot.
/// Injectable so tests can count invocations.
pub trait Blender {
    fn blend(
        &mut self,
        base: &Texture,
        blend: Option<&Texture>,
        mode: TintMode,
        ramp: Option<&ColorRamp>,
    ) -> RgbaImage;
}

/// Production blender: calls straight into [`tint::generate_blended`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RampBlender;

impl Blender for RampBlender {
    fn blend(
        &mut self,
        base: &Texture,
        blend: Option<&Texture>,
        mode: TintMode,
        ramp: Option<&ColorRamp>,
    ) -> RgbaImage {
        tint::generate_blended(base.image(), blend.map(|t| t.image()), mode, ramp)
    }
}

struct CacheNode {
    id: ColormapId,
    snapshot: RemapTable,
    texture: Texture,
}

/// Cache of recolored textures generated from one base texture.
#[derive(Default)]
pub struct BlendedTextureCache {
    nodes: Vec<CacheNode>,
    index: HashMap<ColormapId, usize>,
}

impl BlendedTextureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live recolored variants.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every node. The owning texture is being torn down; there is
    /// no partial eviction.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
    }

    /// Return the renderable texture for `id`, generating it at most
    /// once per distinct remap content.
    ///
    /// Exactly one texture is made current on `device` per call. The base
    /// texture is returned unchanged (no node created) when there is
    /// nothing to recolor: no remap table, the identity table, no blend
    /// texture, or a blend texture whose dimensions disagree with the
    /// base.
    pub fn get_or_create<'a>(
        &'a mut self,
        base: &'a Texture,
        blend: Option<&Texture>,
        id: ColormapId,
        remap: Option<&RemapTable>,
        mode: TintMode,
        ramp: Option<&ColorRamp>,
        device: &mut dyn GpuDevice,
        blender: &mut dyn Blender,
    ) -> &'a Texture {
        let usable_blend = blend.filter(|b| b.dimensions() == base.dimensions());
        let remap = match (remap, usable_blend) {
            (Some(r), Some(_)) if !r.is_identity() => r,
            _ => {
                device.set_texture(base);
                return base;
            }
        };

        if let Some(&i) = self.index.get(&id) {
            let node = &mut self.nodes[i];
            if node.snapshot != *remap {
                // Same identity, drifted content: regenerate on the same
                // node and push the new pixels to the device.
                node.snapshot = *remap;
                node.texture = Texture::new(blender.blend(base, usable_blend, mode, ramp));
                device.update_texture(&node.texture);
            } else {
                device.set_texture(&node.texture);
            }
            return &self.nodes[i].texture;
        }

        let texture = Texture::new(blender.blend(base, usable_blend, mode, ramp));
        let i = self.nodes.len();
        self.nodes.push(CacheNode { id, snapshot: *remap, texture });
        self.index.insert(id, i);
        device.set_texture(&self.nodes[i].texture);
        &self.nodes[i].texture
    }
}
