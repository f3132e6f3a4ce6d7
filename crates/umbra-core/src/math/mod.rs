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

//! Math primitives used across the renderer.
//!
//! Linear algebra comes from `glam`; this module re-exports the types the
//! renderer uses and adds the geometric helpers (bounding boxes and frusta)
//! needed by visibility and shadow code.

pub mod frustum;
pub mod geometry;
pub mod sh;

pub use frustum::Frustum;
pub use geometry::Aabb;
pub use glam::{Mat3, Mat4, Quat, UVec2, UVec3, Vec2, Vec3, Vec3Swizzles, Vec4, Vec4Swizzles};
pub use sh::{sh_basis, SphericalHarmonics9, SH_COEFFICIENTS};

/// Tolerance used for floating point comparisons in geometric code.
pub const EPSILON: f32 = 1e-5;

/// Degrees to radians conversion factor.
pub const DEG_TO_RAD: f32 = std::f32::consts::PI / 180.0;

/// Converts a clip-space position to normalized texture coordinates.
///
/// The `y` axis is flipped so that `v = 0` is the top row of a texture,
/// matching how render targets are laid out in memory.
#[inline]
pub fn ndc_to_uv(ndc: Vec2) -> Vec2 {
    Vec2::new(ndc.x * 0.5 + 0.5, 0.5 - ndc.y * 0.5)
}

/// Inverse of [`ndc_to_uv`].
#[inline]
pub fn uv_to_ndc(uv: Vec2) -> Vec2 {
    Vec2::new(uv.x * 2.0 - 1.0, 1.0 - uv.y * 2.0)
}

/// Reconstructs a world-space position from a screen coordinate and a depth
/// value in `[0, 1]`.
pub fn unproject(inverse_view_projection: &Mat4, uv: Vec2, depth: f32) -> Vec3 {
    let ndc = uv_to_ndc(uv);
    let clip = Vec4::new(ndc.x, ndc.y, depth, 1.0);
    let world = *inverse_view_projection * clip;
    world.xyz() / world.w
}
