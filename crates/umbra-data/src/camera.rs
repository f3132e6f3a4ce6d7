// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The camera used to view a scene.

use umbra_core::math::{Frustum, Mat4, Vec3};

/// Defines the type of camera projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionType {
    /// Perspective projection with field of view.
    Perspective {
        /// The vertical field of view in radians.
        fov_y_radians: f32,
    },
    /// Orthographic projection with explicit view bounds.
    Orthographic {
        /// Left edge of the view volume.
        left: f32,
        /// Right edge of the view volume.
        right: f32,
        /// Bottom edge of the view volume.
        bottom: f32,
        /// Top edge of the view volume.
        top: f32,
    },
}

/// A camera: a placement in the world plus a projection.
///
/// The projection uses a right-handed coordinate system with a `[0, 1]` depth
/// range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// World-space position.
    pub eye: Vec3,
    /// The point the camera looks at.
    pub center: Vec3,
    /// Up direction hint.
    pub up: Vec3,
    /// The type of projection.
    pub projection: ProjectionType,
    /// The aspect ratio of the viewport (width / height).
    pub aspect_ratio: f32,
    /// The distance to the near clipping plane.
    pub z_near: f32,
    /// The distance to the far clipping plane.
    pub z_far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 16.0 / 9.0, 0.1, 1000.0)
    }
}

impl Camera {
    /// Creates a perspective camera at the origin looking down -Z.
    pub fn new_perspective(fov_y_radians: f32, aspect_ratio: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            eye: Vec3::ZERO,
            center: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: ProjectionType::Perspective { fov_y_radians },
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Creates an orthographic camera at the origin looking down -Z.
    pub fn new_orthographic(
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        z_near: f32,
        z_far: f32,
    ) -> Self {
        let height = top - bottom;
        let aspect_ratio = if height.abs() > 0.0 {
            (right - left) / height
        } else {
            1.0
        };
        Self {
            eye: Vec3::ZERO,
            center: Vec3::NEG_Z,
            up: Vec3::Y,
            projection: ProjectionType::Orthographic {
                left,
                right,
                bottom,
                top,
            },
            aspect_ratio,
            z_near,
            z_far,
        }
    }

    /// Places the camera.
    pub fn look_at(mut self, eye: Vec3, center: Vec3, up: Vec3) -> Self {
        self.eye = eye;
        self.center = center;
        self.up = up;
        self
    }

    /// Normalized viewing direction.
    pub fn front(&self) -> Vec3 {
        (self.center - self.eye).normalize_or(Vec3::NEG_Z)
    }

    /// World to view transform.
    ///
    /// Falls back to another up vector when `up` is parallel to the viewing
    /// direction.
    pub fn view_matrix(&self) -> Mat4 {
        let front = self.front();
        let up = if front.cross(self.up).length_squared() < 1e-8 {
            if front.y.abs() < 0.99 {
                Vec3::Y
            } else {
                Vec3::Z
            }
        } else {
            self.up
        };
        Mat4::look_to_rh(self.eye, front, up)
    }

    /// View to clip transform.
    pub fn projection_matrix(&self) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective { fov_y_radians } => {
                Mat4::perspective_rh(fov_y_radians, self.aspect_ratio, self.z_near, self.z_far)
            }
            ProjectionType::Orthographic {
                left,
                right,
                bottom,
                top,
            } => Mat4::orthographic_rh(left, right, bottom, top, self.z_near, self.z_far),
        }
    }

    /// World to clip transform.
    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// The view frustum in world space.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection())
    }

    /// Returns `true` for perspective projections.
    pub fn is_perspective(&self) -> bool {
        matches!(self.projection, ProjectionType::Perspective { .. })
    }

    /// Updates the aspect ratio, typically called when the output is resized.
    pub fn set_aspect_ratio(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }
}
