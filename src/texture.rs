use crate::errors::ShaderError;
use crate::shader_constants::BLANK_TEXTURE_SIZE;

/// CPU-side RGBA8 pixel buffer handed to the rendering collaborator as the
/// backing store for sampler uniforms (`iChannel0`-`iChannel3`, `iImage`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextureData {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl TextureData {
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), (width * height * 4) as usize);
        Self {
            width,
            height,
            data,
        }
    }

    /// Zeroed placeholder texture bound to channels with no content yet.
    pub fn blank(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height * 4) as usize],
        }
    }

    pub fn blank_default() -> Self {
        Self::blank(BLANK_TEXTURE_SIZE, BLANK_TEXTURE_SIZE)
    }

    /// Load an image file into an RGBA8 texture
    pub fn from_file(path: &str) -> Result<Self, ShaderError> {
        log::info!("Loading image texture from: {}", path);

        let img = image::open(path)?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();

        log::info!("Image loaded: {}x{} pixels", width, height);

        Ok(Self {
            width,
            height,
            data: rgba.into_raw(),
        })
    }
}

impl Default for TextureData {
    fn default() -> Self {
        Self::blank_default()
    }
}
