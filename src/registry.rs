//! Model registry: the subsystem context object.
//!
//! Owns the per-sprite and per-skin model slots, the color ramp table and
//! the animation fallback table. Nothing here is ambient global state;
//! tests construct a fresh registry each.
//!
//! Texture loading is lazy and sticky: the first failed attempt marks the
//! slot so the file is never searched for again that session. Failures
//! degrade rendering (no model, or no recolor) and are only surfaced as a
//! diagnostic log line.

use crate::anim::{FallbackTable, ModelFrames};
use crate::cache::{Blender, BlendedTextureCache, ColormapId, RemapTable};
use crate::ramp::{ColorRamp, RampTable};
use crate::texture::{self, DecodeError, GpuDevice, Texture};
use crate::tint::TintMode;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// Suffix convention locating a model's blend mask next to its base
/// texture: `models/sonic.png` -> `models/sonic_blend.png`.
const BLEND_SUFFIX: &str = "_blend";

/// Directory prefix for model assets.
const MODELS_DIR: &str = "models";

/// Collaborator seam for file/archive lookup. Returns the file contents,
/// or `None` when no file of that name exists anywhere.
pub trait FileSource {
    fn read(&mut self, name: &str) -> Option<Vec<u8>>;
}

/// File source over a directory tree on disk.
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileSource for DirSource {
    fn read(&mut self, name: &str) -> Option<Vec<u8>> {
        std::fs::read(self.root.join(name)).ok()
    }
}

/// Error type for asset loading.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("{name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },
}

/// An already-parsed model definition record.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelDef {
    /// Sprite name or skin name this model replaces.
    pub name: String,
    /// Model filename the textures are derived from.
    pub filename: String,
    pub scale: f32,
    pub offset: f32,
}

/// One model's runtime state: definition, lazily loaded textures, the
/// recolor cache built on the base texture, and the sticky failure flags.
#[derive(Default)]
pub struct ModelSlot {
    pub filename: String,
    pub scale: f32,
    pub offset: f32,
    /// Authored animation frames, filled in by the model loader.
    pub frames: ModelFrames,
    /// Recolored variants of this slot's base texture.
    pub cache: BlendedTextureCache,
    /// Model data failed to load; the slot is skipped for the session.
    pub error: bool,
    texture: Option<Texture>,
    blend: Option<Texture>,
    texture_missing: bool,
    blend_missing: bool,
}

impl ModelSlot {
    fn from_def(def: &ModelDef) -> Self {
        Self {
            filename: def.filename.clone(),
            scale: def.scale,
            offset: def.offset,
            ..Self::default()
        }
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    pub fn blend(&self) -> Option<&Texture> {
        self.blend.as_ref()
    }

    fn texture_name(&self) -> String {
        format!("{}/{}.png", MODELS_DIR, file_stem(&self.filename))
    }

    fn blend_name(&self) -> String {
        format!("{}/{}{}.png", MODELS_DIR, file_stem(&self.filename), BLEND_SUFFIX)
    }

    /// Load the base texture and blend mask if they have not been tried
    /// yet. Each file gets at most one lookup per session; a miss sets
    /// the sticky flag and the slot renders without that asset from then
    /// on. The blend mask is only looked up once the base texture is in.
    pub fn ensure_textures(&mut self, source: &mut dyn FileSource) {
        if self.texture.is_none() && !self.texture_missing {
            match load_texture(source, &self.texture_name()) {
                Ok(t) => self.texture = Some(t),
                Err(e) => {
                    self.texture_missing = true;
                    log::warn!("model texture unavailable, rendering without model: {e}");
                }
            }
        }
        if self.texture.is_some() && self.blend.is_none() && !self.blend_missing {
            match load_texture(source, &self.blend_name()) {
                Ok(t) => self.blend = Some(t),
                Err(e) => {
                    self.blend_missing = true;
                    log::debug!("blend mask unavailable, rendering without recolor: {e}");
                }
            }
        }
    }

    /// Run the recolor cache on this slot's loaded textures and make the
    /// result current on `device`. Returns `false` when no base texture
    /// is loaded, in which case the device is untouched.
    pub fn activate_texture(
        &mut self,
        id: ColormapId,
        remap: Option<&RemapTable>,
        mode: TintMode,
        ramp: Option<&ColorRamp>,
        device: &mut dyn GpuDevice,
        blender: &mut dyn Blender,
    ) -> bool {
        let Some(base) = self.texture.as_ref() else {
            return false;
        };
        self.cache
            .get_or_create(base, self.blend.as_ref(), id, remap, mode, ramp, device, blender);
        true
    }

    /// Drop loaded textures and cached recolors, keeping the definition.
    /// The sticky flags reset too: a teardown starts a fresh session.
    pub fn unload(&mut self) {
        self.texture = None;
        self.blend = None;
        self.texture_missing = false;
        self.blend_missing = false;
        self.cache.clear();
    }
}

fn load_texture(source: &mut dyn FileSource, name: &str) -> Result<Texture, AssetError> {
    let bytes = source.read(name).ok_or_else(|| AssetError::NotFound(name.to_string()))?;
    texture::decode(&bytes).map_err(|e| AssetError::Decode { name: name.to_string(), source: e })
}

/// Everything after the last path separator, minus the extension.
fn file_stem(filename: &str) -> &str {
    let base = filename.rsplit('/').next().unwrap_or(filename);
    match base.rfind('.') {
        Some(dot) => &base[..dot],
        None => base,
    }
}

/// The subsystem context: model slots plus the process-wide tables.
#[derive(Default)]
pub struct ModelRegistry {
    sprite_models: HashMap<String, ModelSlot>,
    skin_models: HashMap<String, ModelSlot>,
    pub ramps: RampTable,
    pub fallbacks: FallbackTable,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tables(ramps: RampTable, fallbacks: FallbackTable) -> Self {
        Self { ramps, fallbacks, ..Self::default() }
    }

    /// Register a model for an ordinary sprite.
    pub fn register_sprite_model(&mut self, def: &ModelDef) {
        self.sprite_models.insert(def.name.clone(), ModelSlot::from_def(def));
    }

    /// Register a model for a player skin.
    pub fn register_skin_model(&mut self, def: &ModelDef) {
        self.skin_models.insert(def.name.clone(), ModelSlot::from_def(def));
    }

    pub fn sprite_model(&self, name: &str) -> Option<&ModelSlot> {
        self.sprite_models.get(name)
    }

    pub fn sprite_model_mut(&mut self, name: &str) -> Option<&mut ModelSlot> {
        self.sprite_models.get_mut(name)
    }

    pub fn skin_model(&self, name: &str) -> Option<&ModelSlot> {
        self.skin_models.get(name)
    }

    pub fn skin_model_mut(&mut self, name: &str) -> Option<&mut ModelSlot> {
        self.skin_models.get_mut(name)
    }

    /// Unload every slot's textures and caches as a unit.
    pub fn unload_all(&mut self) {
        for slot in self.sprite_models.values_mut().chain(self.skin_models.values_mut()) {
            slot.unload();
        }
    }
}
