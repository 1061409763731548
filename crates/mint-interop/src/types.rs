// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 mint contributors

//! Structured values exchanged between steering and rendering.
//!
//! Field names on the wire are the camelCase names the steering side
//! (Unity) uses, so most structs rename their fields explicitly. Every field
//! is required when decoding; unknown fields are ignored.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

use crate::codec::Mat4Wire;

// ============================================================================
// Vectors and matrices
// ============================================================================

/// Four-component float vector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Vec4 {
    pub const ZERO: Vec4 = Vec4::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    /// Component by index, `0 => x` through `3 => w`.
    ///
    /// # Panics
    ///
    /// Panics if `index > 3`.
    pub fn component(&self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            2 => self.z,
            3 => self.w,
            _ => panic!("Vec4 component index {} out of range", index),
        }
    }
}

impl Add for Vec4 {
    type Output = Vec4;

    fn add(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z, self.w + rhs.w)
    }
}

impl AddAssign for Vec4 {
    fn add_assign(&mut self, rhs: Vec4) {
        *self = *self + rhs;
    }
}

impl Sub for Vec4 {
    type Output = Vec4;

    fn sub(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z, self.w - rhs.w)
    }
}

/// Component-wise product.
impl Mul for Vec4 {
    type Output = Vec4;

    fn mul(self, rhs: Vec4) -> Vec4 {
        Vec4::new(self.x * rhs.x, self.y * rhs.y, self.z * rhs.z, self.w * rhs.w)
    }
}

impl Mul<f32> for Vec4 {
    type Output = Vec4;

    fn mul(self, s: f32) -> Vec4 {
        Vec4::new(self.x * s, self.y * s, self.z * s, self.w * s)
    }
}

impl Mul<Vec4> for f32 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        v * self
    }
}

impl Neg for Vec4 {
    type Output = Vec4;

    fn neg(self) -> Vec4 {
        self * -1.0
    }
}

/// Column-major 4x4 matrix built from four column vectors.
///
/// On the wire the matrix is flattened to sixteen fields `e<row><col>`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Mat4Wire", into = "Mat4Wire")]
pub struct Mat4 {
    pub columns: [Vec4; 4],
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        columns: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    pub const fn from_columns(columns: [Vec4; 4]) -> Self {
        Self { columns }
    }

    /// Element at `row`, `col`.
    ///
    /// # Panics
    ///
    /// Panics if `row > 3` or `col > 3`.
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.columns[col].component(row)
    }

    /// Identity with the translation column set to `t` (w forced to 1).
    pub fn translation(t: Vec4) -> Self {
        let mut m = Self::IDENTITY;
        m.columns[3] = Vec4::new(t.x, t.y, t.z, 1.0);
        m
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Camera
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    #[serde(rename = "eyePos")]
    pub eye_pos: Vec4,
    #[serde(rename = "lookAtPos")]
    pub look_at_pos: Vec4,
    #[serde(rename = "camUpDir")]
    pub cam_up_dir: Vec4,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoCameraView {
    #[serde(rename = "leftEyeView")]
    pub left_eye_view: CameraView,
    #[serde(rename = "rightEyeView")]
    pub right_eye_view: CameraView,
}

/// Eye views expressed relative to the dataset rather than the world.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StereoCameraViewRelative {
    #[serde(rename = "leftEyeView")]
    pub left_eye_view: CameraView,
    #[serde(rename = "rightEyeView")]
    pub right_eye_view: CameraView,
}

/// Projection parameters for one camera.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraProjection {
    /// Vertical field of view in radians.
    #[serde(rename = "fieldOfViewY_rad")]
    pub field_of_view_y_rad: f32,
    #[serde(rename = "nearClipPlane")]
    pub near_clip_plane: f32,
    #[serde(rename = "farClipPlane")]
    pub far_clip_plane: f32,
    /// Width divided by height.
    pub aspect: f32,
    /// Framebuffer size in pixels.
    #[serde(rename = "pixelWidth")]
    pub pixel_width: u32,
    #[serde(rename = "pixelHeight")]
    pub pixel_height: u32,
}

impl Default for CameraProjection {
    fn default() -> Self {
        Self {
            field_of_view_y_rad: 1.0,
            near_clip_plane: 0.1,
            far_clip_plane: 1.0,
            aspect: 1.0,
            pixel_width: 1,
            pixel_height: 1,
        }
    }
}

/// Camera parameters plus the low-level matrices the steering side computed.
///
/// The matrices may come from a VR SDK and then suit stereo rendering better
/// than the explicit view and projection parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraConfiguration {
    #[serde(rename = "viewParameters")]
    pub view_parameters: CameraView,
    #[serde(rename = "projectionParameters")]
    pub projection_parameters: CameraProjection,
    #[serde(rename = "viewMatrix")]
    pub view_matrix: Mat4,
    #[serde(rename = "projectionMatrix")]
    pub projection_matrix: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StereoCameraConfiguration {
    /// Distance to the point where both eyes converge.
    #[serde(rename = "stereoConvergence")]
    pub stereo_convergence: f32,
    /// Distance between the virtual eyes.
    #[serde(rename = "stereoSeparation")]
    pub stereo_separation: f32,
    #[serde(rename = "cameraLeftEye")]
    pub camera_left_eye: CameraConfiguration,
    #[serde(rename = "cameraRightEye")]
    pub camera_right_eye: CameraConfiguration,
}

impl Default for StereoCameraConfiguration {
    fn default() -> Self {
        Self {
            stereo_convergence: 1.0,
            stereo_separation: 1.0,
            camera_left_eye: CameraConfiguration::default(),
            camera_right_eye: CameraConfiguration::default(),
        }
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Transform applied to the dataset before rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelPose {
    pub translation: Vec4,
    pub scale: Vec4,
    /// Axis in xyz, angle in radians in w.
    pub rotation_axis_angle_rad: Vec4,
    #[serde(rename = "modelMatrix")]
    pub model_matrix: Mat4,
}

/// What the renderer receives from steering each frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetRenderConfiguration {
    #[serde(rename = "stereoCamera")]
    pub stereo_camera: StereoCameraConfiguration,
    #[serde(rename = "modelTransform")]
    pub model_transform: ModelPose,
}

/// World-space axis-aligned bounding box of the rendered data.
///
/// Steering and rendering agree that the dataset is centered at the origin,
/// so the box is mostly used to compute the centering offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBoxCorners {
    pub min: Vec4,
    pub max: Vec4,
}

impl BoundingBoxCorners {
    pub fn diagonal(&self) -> Vec4 {
        self.max - self.min
    }

    /// Offset `v` such that `v + p` moves `p` into centered box coordinates.
    pub fn centering_vector(&self) -> Vec4 {
        -(self.min + self.diagonal() * 0.5)
    }

    pub fn centering_transform(&self) -> Mat4 {
        Mat4::translation(self.centering_vector())
    }

    /// The box shifted by its centering vector. `w` is left as is.
    pub fn centered(&self) -> BoundingBoxCorners {
        let mut shift = self.centering_vector();
        shift.w = 0.0;
        BoundingBoxCorners {
            min: self.min + shift,
            max: self.max + shift,
        }
    }
}
