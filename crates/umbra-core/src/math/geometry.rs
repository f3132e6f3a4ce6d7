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

//! Provides geometric primitives for spatial reasoning.

use super::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// The corner with the smallest coordinates.
    pub min: Vec3,
    /// The corner with the largest coordinates.
    pub max: Vec3,
}

impl Aabb {
    /// A degenerate box at the origin.
    pub const ZERO: Self = Self {
        min: Vec3::ZERO,
        max: Vec3::ZERO,
    };

    /// Creates a box from two corners. The corners are reordered if needed.
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box centered on `center` with the given half extents.
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Creates the smallest box enclosing all `points`. Returns `None` for an
    /// empty iterator.
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_min_max(first, first), |acc, p| Self {
            min: acc.min.min(p),
            max: acc.max.max(p),
        }))
    }

    /// The center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half of the box size along each axis.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns `true` when `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.cmple(self.max).all()
    }

    /// Returns `true` if the point lies inside or on the surface of the box.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    /// Returns `true` if the two boxes overlap.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.cmple(other.max).all() && self.max.cmpge(other.min).all()
    }

    /// The smallest box enclosing both boxes.
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Transforms the box by an affine matrix and returns the axis-aligned box
    /// enclosing the result.
    ///
    /// Uses the center/extent formulation: the new half extents are the
    /// absolute value of the linear part applied to the old half extents.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let center = matrix.transform_point3(self.center());
        let half = self.half_extents();
        let abs_x = matrix.x_axis.truncate().abs();
        let abs_y = matrix.y_axis.truncate().abs();
        let abs_z = matrix.z_axis.truncate().abs();
        let new_half = abs_x * half.x + abs_y * half.y + abs_z * half.z;
        Self::from_center_half_extents(center, new_half)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Quat, EPSILON};
    use approx::assert_relative_eq;

    #[test]
    fn test_from_min_max_reorders_corners() {
        let aabb = Aabb::from_min_max(Vec3::new(1.0, -1.0, 2.0), Vec3::new(-1.0, 1.0, 0.0));
        assert_eq!(aabb.min, Vec3::new(-1.0, -1.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 1.0, 2.0));
        assert!(aabb.is_valid());
    }

    #[test]
    fn test_from_points_empty_is_none() {
        assert!(Aabb::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_transform_translation_moves_center() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let moved = aabb.transform(&Mat4::from_translation(Vec3::new(5.0, 0.0, -2.0)));
        assert_eq!(moved.center(), Vec3::new(5.0, 0.0, -2.0));
        assert_eq!(moved.half_extents(), Vec3::ONE);
    }

    #[test]
    fn test_transform_rotation_grows_box() {
        let aabb = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(1.0, 1.0, 1.0));
        let rotated =
            aabb.transform(&Mat4::from_quat(Quat::from_rotation_y(45f32.to_radians())));
        let expected = 2f32.sqrt();
        assert_relative_eq!(rotated.half_extents().x, expected, epsilon = EPSILON);
        assert_relative_eq!(rotated.half_extents().z, expected, epsilon = EPSILON);
        assert_relative_eq!(rotated.half_extents().y, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_intersects_and_contains() {
        let a = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_min_max(Vec3::splat(0.5), Vec3::splat(2.0));
        let c = Aabb::from_min_max(Vec3::splat(3.0), Vec3::splat(4.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains_point(Vec3::splat(0.5)));
        assert!(!a.contains_point(Vec3::splat(1.5)));
        assert_eq!(a.merge(&c).max, Vec3::splat(4.0));
    }
}
