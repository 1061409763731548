// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Stereo atlas: both eyes' color and depth in one shared texture.
//!
//! ```text
//!            x < w          x >= w
//!         +-------------+-------------+
//!  y < h  | left color  | right color |
//!         +-------------+-------------+
//!  y >= h | left depth  | right depth |
//!         +-------------+-------------+
//! ```
//!
//! Depth values are stored as their IEEE-754 bits, little-endian across
//! RGBA. Pixel (0,0) is overwritten with a `u32` frame id in the same byte
//! order, so the receiver can tell a new frame from a repeated one.

use super::{
    ImageType, TextureError, TextureFrame, TextureReceiver, TextureSender, TextureShare,
};

const BPP: usize = TextureFrame::BYTES_PER_PIXEL;

/// Eye size and the atlas size derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StereoAtlasLayout {
    eye_width: u32,
    eye_height: u32,
}

impl StereoAtlasLayout {
    /// Layout for eyes of `eye_width x eye_height`. The atlas doubles both
    /// sides, so each must be non-zero and fit `u32` when doubled.
    pub fn new(eye_width: u32, eye_height: u32) -> Result<Self, TextureError> {
        let doubled = eye_width.checked_mul(2).zip(eye_height.checked_mul(2));
        if eye_width == 0 || eye_height == 0 || doubled.is_none() {
            return Err(TextureError::InvalidSize {
                width: eye_width,
                height: eye_height,
            });
        }
        Ok(Self {
            eye_width,
            eye_height,
        })
    }

    /// Layout of an atlas of the given size. Both sides must be even.
    pub fn from_atlas(width: u32, height: u32) -> Result<Self, TextureError> {
        if width % 2 != 0 || height % 2 != 0 {
            return Err(TextureError::InvalidSize { width, height });
        }
        Self::new(width / 2, height / 2)
    }

    pub fn eye_width(&self) -> u32 {
        self.eye_width
    }

    pub fn eye_height(&self) -> u32 {
        self.eye_height
    }

    pub fn atlas_size(&self) -> (u32, u32) {
        (self.eye_width * 2, self.eye_height * 2)
    }

    fn eye_pixels(&self) -> usize {
        self.eye_width as usize * self.eye_height as usize
    }
}

/// Both eyes of one rendered frame.
///
/// Depth buffers are row-major, one `f32` per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoFrame {
    pub left_color: TextureFrame,
    pub right_color: TextureFrame,
    pub left_depth: Vec<f32>,
    pub right_depth: Vec<f32>,
    pub frame_id: u32,
}

impl StereoFrame {
    fn layout(&self) -> Result<StereoAtlasLayout, TextureError> {
        let layout = StereoAtlasLayout::new(self.left_color.width(), self.left_color.height())?;

        if (self.right_color.width(), self.right_color.height())
            != (layout.eye_width, layout.eye_height)
        {
            return Err(TextureError::InvalidSize {
                width: self.right_color.width(),
                height: self.right_color.height(),
            });
        }
        for depth in [&self.left_depth, &self.right_depth] {
            if depth.len() != layout.eye_pixels() {
                return Err(TextureError::FrameSize {
                    expected: layout.eye_pixels(),
                    actual: depth.len(),
                });
            }
        }
        Ok(layout)
    }
}

/// Pack a stereo frame into an atlas twice its eye size in each direction.
pub fn compose_atlas(frame: &StereoFrame) -> Result<TextureFrame, TextureError> {
    let layout = frame.layout()?;
    let (w, h) = (layout.eye_width as usize, layout.eye_height as usize);
    let eye_row = w * BPP;

    let mut pixels = Vec::with_capacity(layout.eye_pixels() * 4 * BPP);

    for y in 0..h {
        let row = y * eye_row..(y + 1) * eye_row;
        pixels.extend_from_slice(&frame.left_color.pixels()[row.clone()]);
        pixels.extend_from_slice(&frame.right_color.pixels()[row]);
    }
    for y in 0..h {
        let row = y * w..(y + 1) * w;
        for depth in frame.left_depth[row.clone()]
            .iter()
            .chain(&frame.right_depth[row])
        {
            pixels.extend_from_slice(&depth.to_bits().to_le_bytes());
        }
    }
    pixels[..BPP].copy_from_slice(&frame.frame_id.to_le_bytes());

    let (aw, ah) = layout.atlas_size();
    TextureFrame::from_pixels(aw, ah, pixels)
}

/// Unpack an atlas produced by [`compose_atlas`].
///
/// Pixel (0,0) of `left_color` holds the frame id bytes, not image data.
pub fn split_atlas(atlas: &TextureFrame) -> Result<StereoFrame, TextureError> {
    let layout = StereoAtlasLayout::from_atlas(atlas.width(), atlas.height())?;
    let (w, h) = (layout.eye_width as usize, layout.eye_height as usize);
    let eye_row = w * BPP;
    let atlas_row = 2 * eye_row;
    let src = atlas.pixels();

    let mut left = Vec::with_capacity(layout.eye_pixels() * BPP);
    let mut right = Vec::with_capacity(layout.eye_pixels() * BPP);
    for y in 0..h {
        let start = y * atlas_row;
        left.extend_from_slice(&src[start..start + eye_row]);
        right.extend_from_slice(&src[start + eye_row..start + atlas_row]);
    }

    let mut left_depth = Vec::with_capacity(layout.eye_pixels());
    let mut right_depth = Vec::with_capacity(layout.eye_pixels());
    for y in h..2 * h {
        let row = &src[y * atlas_row..(y + 1) * atlas_row];
        for (x, px) in row.chunks_exact(BPP).enumerate() {
            let depth = f32::from_bits(u32::from_le_bytes([px[0], px[1], px[2], px[3]]));
            if x < w {
                left_depth.push(depth);
            } else {
                right_depth.push(depth);
            }
        }
    }

    Ok(StereoFrame {
        left_color: TextureFrame::from_pixels(layout.eye_width, layout.eye_height, left)?,
        right_color: TextureFrame::from_pixels(layout.eye_width, layout.eye_height, right)?,
        left_depth,
        right_depth,
        frame_id: read_frame_id(atlas),
    })
}

/// Frame id stored in pixel (0,0).
pub fn read_frame_id(atlas: &TextureFrame) -> u32 {
    u32::from_le_bytes(atlas.pixel(0, 0))
}

// ============================================================================
// Stereo sender / receiver
// ============================================================================

/// Sends stereo frames as one `SingleStereo` atlas texture.
#[derive(Debug)]
pub struct StereoTextureSender<B: TextureShare> {
    sender: TextureSender<B>,
    layout: Option<StereoAtlasLayout>,
}

impl<B: TextureShare> StereoTextureSender<B> {
    pub fn new(backend: B) -> Self {
        Self {
            sender: TextureSender::new(backend),
            layout: None,
        }
    }

    /// Register `<name>SingleStereo` sized for eyes of `eye_width x eye_height`.
    pub fn init(&mut self, name: &str, eye_width: u32, eye_height: u32) -> Result<(), TextureError> {
        let layout = StereoAtlasLayout::new(eye_width, eye_height)?;
        let (aw, ah) = layout.atlas_size();
        self.sender.init_image(ImageType::SingleStereo, name, aw, ah)?;
        self.layout = Some(layout);
        Ok(())
    }

    /// Compose and publish. The atlas follows the eye size of `frame`.
    pub fn send(&mut self, frame: &StereoFrame) -> Result<(), TextureError> {
        let atlas = compose_atlas(frame)?;
        self.sender.send(&atlas)?;
        self.layout = Some(StereoAtlasLayout::from_atlas(atlas.width(), atlas.height())?);
        Ok(())
    }

    pub fn destroy(&mut self) {
        self.sender.destroy();
        self.layout = None;
    }

    pub fn layout(&self) -> Option<StereoAtlasLayout> {
        self.layout
    }
}

/// Receives `SingleStereo` atlases and splits them.
#[derive(Debug)]
pub struct StereoTextureReceiver<B: TextureShare> {
    receiver: TextureReceiver<B>,
    last_frame_id: Option<u32>,
}

impl<B: TextureShare> StereoTextureReceiver<B> {
    pub fn new(backend: B) -> Self {
        Self {
            receiver: TextureReceiver::new(backend),
            last_frame_id: None,
        }
    }

    pub fn init(&mut self, name: &str) -> Result<(), TextureError> {
        self.receiver.init_image(ImageType::SingleStereo, name)
    }

    /// Latest stereo frame, `None` before the first one.
    pub fn receive(&mut self) -> Result<Option<StereoFrame>, TextureError> {
        let Some(atlas) = self.receiver.receive()? else {
            return Ok(None);
        };
        let frame = split_atlas(&atlas)?;
        self.last_frame_id = Some(frame.frame_id);
        Ok(Some(frame))
    }

    /// Like [`receive`](Self::receive), but `None` if the frame id has not
    /// changed since the last call.
    pub fn receive_new(&mut self) -> Result<Option<StereoFrame>, TextureError> {
        let previous = self.last_frame_id;
        match self.receive()? {
            Some(frame) if Some(frame.frame_id) != previous => Ok(Some(frame)),
            _ => Ok(None),
        }
    }

    pub fn last_frame_id(&self) -> Option<u32> {
        self.last_frame_id
    }

    pub fn destroy(&mut self) {
        self.receiver.destroy();
        self.last_frame_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::MemoryTextureShare;

    fn eye(width: u32, height: u32, seed: u8) -> (TextureFrame, Vec<f32>) {
        let mut color = TextureFrame::new(width, height).expect("frame");
        let mut depth = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = seed.wrapping_add((y * width + x) as u8);
                color.set_pixel(x, y, [v, v.wrapping_add(1), v.wrapping_add(2), 255]);
                depth.push(seed as f32 + (y * width + x) as f32 * 0.125);
            }
        }
        (color, depth)
    }

    fn sample(width: u32, height: u32, frame_id: u32) -> StereoFrame {
        let (left_color, left_depth) = eye(width, height, 10);
        let (right_color, right_depth) = eye(width, height, 100);
        StereoFrame {
            left_color,
            right_color,
            left_depth,
            right_depth,
            frame_id,
        }
    }

    #[test]
    fn test_compose_split() {
        let frame = sample(3, 2, 0xDEAD_BEEF);
        let atlas = compose_atlas(&frame).expect("compose");
        assert_eq!((atlas.width(), atlas.height()), (6, 4));
        assert_eq!(read_frame_id(&atlas), 0xDEAD_BEEF);
        assert_eq!(atlas.pixel(0, 0), 0xDEAD_BEEF_u32.to_le_bytes());

        let split = split_atlas(&atlas).expect("split");
        assert_eq!(split.frame_id, 0xDEAD_BEEF);
        assert_eq!(split.right_color, frame.right_color);
        assert_eq!(split.left_depth, frame.left_depth);
        assert_eq!(split.right_depth, frame.right_depth);

        // left color matches everywhere except the reserved pixel
        for y in 0..2 {
            for x in 0..3 {
                if (x, y) != (0, 0) {
                    assert_eq!(split.left_color.pixel(x, y), frame.left_color.pixel(x, y));
                }
            }
        }
    }

    #[test]
    fn test_atlas_quadrants() {
        let frame = sample(2, 2, 1);
        let atlas = compose_atlas(&frame).expect("compose");

        assert_eq!(atlas.pixel(3, 1), frame.right_color.pixel(1, 1));
        let depth_px = atlas.pixel(1, 3);
        assert_eq!(
            f32::from_bits(u32::from_le_bytes(depth_px)),
            frame.left_depth[3]
        );
        let depth_px = atlas.pixel(2, 2);
        assert_eq!(
            f32::from_bits(u32::from_le_bytes(depth_px)),
            frame.right_depth[0]
        );
    }

    #[test]
    fn test_mismatched_eyes_rejected() {
        let mut frame = sample(2, 2, 0);
        frame.right_depth.pop();
        assert!(matches!(
            compose_atlas(&frame),
            Err(TextureError::FrameSize { .. })
        ));

        let mut frame = sample(2, 2, 0);
        frame.right_color = TextureFrame::new(3, 2).expect("frame");
        assert!(compose_atlas(&frame).is_err());

        let odd = TextureFrame::new(3, 4).expect("frame");
        assert!(split_atlas(&odd).is_err());
    }

    #[test]
    fn test_layout_rejects_overflowing_eyes() {
        let max = u32::MAX / 2;
        let layout = StereoAtlasLayout::new(max, 1).expect("largest width");
        assert_eq!(layout.atlas_size(), (max * 2, 2));

        for (w, h) in [(max + 1, 1), (1, max + 1), (u32::MAX, u32::MAX), (0, 4)] {
            assert!(matches!(
                StereoAtlasLayout::new(w, h),
                Err(TextureError::InvalidSize { .. })
            ));
        }
    }

    #[test]
    fn test_stereo_sender_receiver() {
        let share = MemoryTextureShare::new();
        let mut sender = StereoTextureSender::new(share.clone());
        let mut receiver = StereoTextureReceiver::new(share.clone());

        sender.init("eyes", 2, 2).expect("init");
        receiver.init("eyes").expect("init");
        assert!(receiver.receive().expect("receive").is_none());

        sender.send(&sample(2, 2, 7)).expect("send");
        let got = receiver.receive_new().expect("receive").expect("frame");
        assert_eq!(got.frame_id, 7);
        assert!(receiver.receive_new().expect("receive").is_none());

        // eye size change resizes the shared texture
        sender.send(&sample(4, 3, 8)).expect("send");
        assert_eq!(sender.layout(), Some(StereoAtlasLayout::new(4, 3).expect("layout")));
        let got = receiver.receive_new().expect("receive").expect("frame");
        assert_eq!((got.left_color.width(), got.left_color.height()), (4, 3));
        assert_eq!(receiver.last_frame_id(), Some(8));
    }
}
