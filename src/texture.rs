//! Texture buffers and the seams to the outside world: the image decoder
//! adapter and the GPU device trait the cache drives.

use image::RgbaImage;
use thiserror::Error;

/// Largest accepted source texture edge, matching the decoder limit the
/// original renderer configured.
pub const MAX_TEXTURE_DIM: u32 = 2048;

/// Pixel format tag carried alongside a texture buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextureFormat {
    #[default]
    Rgba8,
}

/// An immutable-once-built RGBA texture.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    image: RgbaImage,
    format: TextureFormat,
}

impl Texture {
    pub fn new(image: RgbaImage) -> Self {
        Self { image, format: TextureFormat::Rgba8 }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn format(&self) -> TextureFormat {
        self.format
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }
}

/// Error type for texture decoding failures.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("empty texture data")]
    Empty,
    #[error("texture decode failed: {0}")]
    Malformed(#[from] image::ImageError),
    #[error("texture is {width}x{height}, maximum is {MAX_TEXTURE_DIM}x{MAX_TEXTURE_DIM}")]
    TooLarge { width: u32, height: u32 },
}

/// Decode raw image bytes (PNG and friends) into a [`Texture`].
///
/// Any format the `image` crate recognizes is accepted and converted to
/// RGBA8. Textures over [`MAX_TEXTURE_DIM`] on either edge are rejected.
pub fn decode(bytes: &[u8]) -> Result<Texture, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = (decoded.width(), decoded.height());
    if width > MAX_TEXTURE_DIM || height > MAX_TEXTURE_DIM {
        return Err(DecodeError::TooLarge { width, height });
    }
    Ok(Texture::new(decoded.to_rgba8()))
}

/// The rendering device the cache talks to. Implementations mark a
/// texture object "current" for the next draw (`set_texture`) or push
/// regenerated pixels for an already-known texture (`update_texture`).
pub trait GpuDevice {
    fn set_texture(&mut self, texture: &Texture);
    fn update_texture(&mut self, texture: &Texture);
}

/// Device that records calls instead of touching hardware. Used by tests
/// and headless tools.
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    pub set_calls: Vec<(u32, u32)>,
    pub update_calls: Vec<(u32, u32)>,
}

impl RecordingDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl GpuDevice for RecordingDevice {
    fn set_texture(&mut self, texture: &Texture) {
        self.set_calls.push(texture.dimensions());
    }

    fn update_texture(&mut self, texture: &Texture) {
        self.update_calls.push(texture.dimensions());
    }
}
