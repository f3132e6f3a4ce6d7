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

//! View frustum extraction and intersection tests.

use super::{Aabb, Mat4, Vec3, Vec4, Vec4Swizzles};

/// A view frustum described by six inward-facing planes.
///
/// Planes are stored as `(normal, distance)` with `dot(normal, p) + distance >= 0`
/// for points inside. The clip space convention is the one produced by
/// `Mat4::perspective_rh` and `Mat4::orthographic_rh`: depth in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near and far planes.
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extracts the frustum planes from a view-projection matrix.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);

        let planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2].map(normalize_plane);
        Self { planes }
    }

    /// Returns `true` if the point is inside the frustum.
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.xyz().dot(point) + plane.w >= 0.0)
    }

    /// Returns `true` if the box is at least partially inside the frustum.
    ///
    /// This is the conservative "positive vertex" test: it never rejects a box
    /// that intersects the frustum, but may accept boxes near a frustum corner
    /// that are actually outside.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        self.planes.iter().all(|plane| {
            let normal = plane.xyz();
            let positive = Vec3::select(normal.cmpge(Vec3::ZERO), aabb.max, aabb.min);
            normal.dot(positive) + plane.w >= 0.0
        })
    }
}

fn normalize_plane(plane: Vec4) -> Vec4 {
    let length = plane.xyz().length();
    if length > f32::EPSILON {
        plane / length
    } else {
        plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_frustum() -> Frustum {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let proj = Mat4::perspective_rh(60f32.to_radians(), 1.0, 0.1, 50.0);
        Frustum::from_view_projection(&(proj * view))
    }

    #[test]
    fn test_point_in_front_is_inside() {
        let frustum = camera_frustum();
        assert!(frustum.contains_point(Vec3::ZERO));
        assert!(!frustum.contains_point(Vec3::new(0.0, 0.0, 20.0)));
    }

    #[test]
    fn test_box_behind_camera_is_culled() {
        let frustum = camera_frustum();
        let behind = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 15.0), Vec3::ONE);
        assert!(!frustum.intersects_aabb(&behind));
    }

    #[test]
    fn test_box_beyond_far_plane_is_culled() {
        let frustum = camera_frustum();
        let far = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -100.0), Vec3::ONE);
        assert!(!frustum.intersects_aabb(&far));
    }

    #[test]
    fn test_box_straddling_side_plane_is_kept() {
        let frustum = camera_frustum();
        // At distance 10 the half-width of the frustum is ~5.77.
        let straddling = Aabb::from_center_half_extents(Vec3::new(6.0, 0.0, 0.0), Vec3::ONE);
        let outside = Aabb::from_center_half_extents(Vec3::new(9.0, 0.0, 0.0), Vec3::ONE);
        assert!(frustum.intersects_aabb(&straddling));
        assert!(!frustum.intersects_aabb(&outside));
    }

    #[test]
    fn test_orthographic_frustum() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO, Vec3::Z);
        let proj = Mat4::orthographic_rh(-2.0, 2.0, -2.0, 2.0, 0.1, 20.0);
        let frustum = Frustum::from_view_projection(&(proj * view));
        assert!(frustum.contains_point(Vec3::new(1.5, 0.0, 1.5)));
        assert!(!frustum.contains_point(Vec3::new(3.0, 0.0, 0.0)));
    }
}
