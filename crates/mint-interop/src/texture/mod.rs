// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Texture-sharing metadata.
//!
//! The actual cross-process texture transport lives outside this crate and
//! is reached through the [`TextureShare`] trait. What lives here is the part
//! both peers must agree on: shared texture names, frame sizes, sender and
//! receiver guards, and the stereo atlas layout (see [`stereo`]).
//!
//! Names are `"/mint/texturesharing/" + name`, padded with NUL bytes to
//! exactly 256 bytes because the sharing backend requires fixed-length names.

pub mod memory;
pub mod stereo;

use std::fmt;
use thiserror::Error;

pub use memory::MemoryTextureShare;
pub use stereo::{
    compose_atlas, read_frame_id, split_atlas, StereoAtlasLayout, StereoFrame,
    StereoTextureReceiver, StereoTextureSender,
};

/// Texture-sharing errors.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("invalid texture name '{0}' (must be 1..=256 bytes)")]
    InvalidName(String),

    #[error("invalid texture size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error("pixel buffer holds {actual} bytes, expected {expected}")]
    FrameSize { expected: usize, actual: usize },

    #[error("no texture sender named '{0}'")]
    UnknownSender(String),

    #[error("texture {0} used before init")]
    NotInitialized(&'static str),

    #[error("texture backend failed: {0}")]
    Backend(String),
}

/// Prefix of every shared texture name.
pub const SHARING_PREFIX: &str = "/mint/texturesharing/";

/// Fixed length of a shared texture name, in bytes.
pub const NAME_LEN: usize = 256;

/// Which image a texture carries. Appended to the base name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageType {
    LeftEye,
    RightEye,
    SingleStereo,
}

impl ImageType {
    pub fn suffix(self) -> &'static str {
        match self {
            ImageType::LeftEye => "Left",
            ImageType::RightEye => "Right",
            ImageType::SingleStereo => "SingleStereo",
        }
    }
}

/// Fixed-length, NUL-padded texture name.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SharedTextureName {
    bytes: Vec<u8>,
}

impl SharedTextureName {
    /// Name for `name`, which must be 1..=256 bytes. The prefixed result is
    /// truncated or padded to [`NAME_LEN`].
    pub fn new(name: &str) -> Result<Self, TextureError> {
        if name.is_empty() || name.len() > NAME_LEN {
            return Err(TextureError::InvalidName(name.to_string()));
        }

        let mut bytes = Vec::with_capacity(SHARING_PREFIX.len() + name.len());
        bytes.extend_from_slice(SHARING_PREFIX.as_bytes());
        bytes.extend_from_slice(name.as_bytes());
        bytes.resize(NAME_LEN, 0);
        Ok(Self { bytes })
    }

    /// Name for `base` followed by the image type suffix.
    pub fn for_image(image: ImageType, base: &str) -> Result<Self, TextureError> {
        Self::new(&format!("{}{}", base, image.suffix()))
    }

    /// All [`NAME_LEN`] bytes, padding included.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The name without its NUL padding, for display.
    pub fn label(&self) -> String {
        let end = self
            .bytes
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(self.bytes.len());
        String::from_utf8_lossy(&self.bytes[..end]).into_owned()
    }
}

impl fmt::Debug for SharedTextureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedTextureName({:?})", self.label())
    }
}

impl fmt::Display for SharedTextureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// RGBA8 image, rows stored first to last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureFrame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureFrame {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Zero-filled frame.
    pub fn new(width: u32, height: u32) -> Result<Self, TextureError> {
        check_size(width, height)?;
        let len = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        Ok(Self {
            width,
            height,
            pixels: vec![0; len],
        })
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        check_size(width, height)?;
        let expected = width as usize * height as usize * Self::BYTES_PER_PIXEL;
        if pixels.len() != expected {
            return Err(TextureError::FrameSize {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * Self::BYTES_PER_PIXEL
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.offset(x, y);
        [
            self.pixels[o],
            self.pixels[o + 1],
            self.pixels[o + 2],
            self.pixels[o + 3],
        ]
    }

    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the frame.
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        assert!(x < self.width && y < self.height, "pixel out of bounds");
        let o = self.offset(x, y);
        self.pixels[o..o + 4].copy_from_slice(&rgba);
    }
}

fn check_size(width: u32, height: u32) -> Result<(), TextureError> {
    if width == 0 || height == 0 {
        return Err(TextureError::InvalidSize { width, height });
    }
    Ok(())
}

// ============================================================================
// Backend seam
// ============================================================================

/// Out-of-process texture sharing backend.
pub trait TextureShare {
    fn create_sender(&self, name: &SharedTextureName, width: u32, height: u32)
        -> Result<(), TextureError>;

    fn update_sender(&self, name: &SharedTextureName, width: u32, height: u32)
        -> Result<(), TextureError>;

    fn send_texture(&self, name: &SharedTextureName, frame: &TextureFrame)
        -> Result<(), TextureError>;

    fn release_sender(&self, name: &SharedTextureName) -> Result<(), TextureError>;

    fn create_receiver(&self, name: &SharedTextureName) -> Result<(), TextureError>;

    /// Latest frame from the named sender, `None` if it has not sent yet.
    fn receive_texture(&self, name: &SharedTextureName)
        -> Result<Option<TextureFrame>, TextureError>;

    fn release_receiver(&self, name: &SharedTextureName) -> Result<(), TextureError>;
}

// ============================================================================
// Sender / receiver guards
// ============================================================================

/// Publishes frames under one shared name.
#[derive(Debug)]
pub struct TextureSender<B: TextureShare> {
    backend: B,
    name: Option<SharedTextureName>,
    width: u32,
    height: u32,
}

impl<B: TextureShare> TextureSender<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            name: None,
            width: 0,
            height: 0,
        }
    }

    /// Register a sender named `name` with an initial size.
    pub fn init(&mut self, name: &str, width: u32, height: u32) -> Result<(), TextureError> {
        let name = SharedTextureName::new(name)?;
        check_size(width, height)?;

        self.backend.create_sender(&name, width, height)?;
        log::debug!("[TEXTURE] sender {} {}x{}", name, width, height);
        self.name = Some(name);
        self.width = width;
        self.height = height;
        Ok(())
    }

    pub fn init_image(
        &mut self,
        image: ImageType,
        base: &str,
        width: u32,
        height: u32,
    ) -> Result<(), TextureError> {
        self.init(&format!("{}{}", base, image.suffix()), width, height)
    }

    /// Change the advertised size. The backend is only told on a change.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), TextureError> {
        let name = self.name.as_ref().ok_or(TextureError::NotInitialized("sender"))?;
        check_size(width, height)?;

        if (width, height) != (self.width, self.height) {
            self.backend.update_sender(name, width, height)?;
            self.width = width;
            self.height = height;
        }
        Ok(())
    }

    /// Resize to the frame if needed, then publish it.
    pub fn send(&mut self, frame: &TextureFrame) -> Result<(), TextureError> {
        self.resize(frame.width(), frame.height())?;
        let name = self.name.as_ref().ok_or(TextureError::NotInitialized("sender"))?;
        self.backend.send_texture(name, frame)
    }

    /// Release the backend sender and forget name and size.
    pub fn destroy(&mut self) {
        if let Some(name) = self.name.take() {
            if let Err(e) = self.backend.release_sender(&name) {
                log::warn!("[TEXTURE] releasing sender {} failed: {}", name, e);
            }
        }
        self.width = 0;
        self.height = 0;
    }

    pub fn name(&self) -> Option<&SharedTextureName> {
        self.name.as_ref()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Reads frames published under one shared name.
#[derive(Debug)]
pub struct TextureReceiver<B: TextureShare> {
    backend: B,
    name: Option<SharedTextureName>,
    width: u32,
    height: u32,
}

impl<B: TextureShare> TextureReceiver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            name: None,
            width: 0,
            height: 0,
        }
    }

    pub fn init(&mut self, name: &str) -> Result<(), TextureError> {
        let name = SharedTextureName::new(name)?;
        self.backend.create_receiver(&name)?;
        log::debug!("[TEXTURE] receiver {}", name);
        self.name = Some(name);
        Ok(())
    }

    pub fn init_image(&mut self, image: ImageType, base: &str) -> Result<(), TextureError> {
        self.init(&format!("{}{}", base, image.suffix()))
    }

    /// Latest frame, `None` if the sender has not published one yet.
    pub fn receive(&mut self) -> Result<Option<TextureFrame>, TextureError> {
        let name = self.name.as_ref().ok_or(TextureError::NotInitialized("receiver"))?;
        let frame = self.backend.receive_texture(name)?;
        if let Some(frame) = &frame {
            self.width = frame.width();
            self.height = frame.height();
        }
        Ok(frame)
    }

    pub fn destroy(&mut self) {
        if let Some(name) = self.name.take() {
            if let Err(e) = self.backend.release_receiver(&name) {
                log::warn!("[TEXTURE] releasing receiver {} failed: {}", name, e);
            }
        }
    }

    pub fn name(&self) -> Option<&SharedTextureName> {
        self.name.as_ref()
    }

    /// Size of the last frame received.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}
