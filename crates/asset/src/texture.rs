//! CPU-side texture decode (RGBA8) plus a procedural fallback so demos run
//! without image files on disk.

use std::path::Path;

use anyhow::{Context, Result};

/// Decoded RGBA8 pixels ready for GPU upload.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureData {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl TextureData {
    pub fn new_rgba8(width: u32, height: u32, data: Vec<u8>) -> Self {
        assert_eq!(
            data.len(),
            (width * height * 4) as usize,
            "Data size doesn't match RGBA8 dimensions"
        );
        Self {
            data,
            width,
            height,
        }
    }

    /// Decode an image file (PNG or JPEG) into RGBA8.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::info!("Loading texture from {}", path.display());

        let img = image::open(path)
            .with_context(|| format!("Failed to open image {}", path.display()))?;
        let rgba = img.to_rgba8();
        let (width, height) = rgba.dimensions();
        let data = rgba.into_raw();

        log::info!("Loaded texture {}x{} ({} bytes)", width, height, data.len());
        Ok(Self::new_rgba8(width, height, data))
    }

    /// White/gray checkerboard, 8-pixel squares.
    pub fn checkerboard(size: u32) -> Self {
        let mut data = Vec::with_capacity((size * size * 4) as usize);
        for y in 0..size {
            for x in 0..size {
                if ((x / 8) + (y / 8)) % 2 == 0 {
                    data.extend_from_slice(&[255, 255, 255, 255]);
                } else {
                    data.extend_from_slice(&[128, 128, 128, 255]);
                }
            }
        }
        Self::new_rgba8(size, size, data)
    }

    pub fn is_valid(&self) -> bool {
        self.width > 0
            && self.height > 0
            && self.data.len() == (self.width * self.height * 4) as usize
    }
}

/// Load the resolved diffuse map, or fabricate a checkerboard when the model
/// resolved no material or the file is unreadable. An unresolved material is
/// not an error; the demo just runs untextured-but-visible.
pub fn load_or_checkerboard(path: Option<&str>) -> TextureData {
    match path {
        Some(path) => match TextureData::load_from_path(path) {
            Ok(texture) => texture,
            Err(err) => {
                log::warn!("{:#}; falling back to checkerboard texture", err);
                TextureData::checkerboard(64)
            }
        },
        None => {
            log::info!("No diffuse map resolved; using checkerboard texture");
            TextureData::checkerboard(64)
        }
    }
}
