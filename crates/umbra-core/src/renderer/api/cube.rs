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

//! Cube map face conventions shared by capture, sampling and SH projection.

use crate::math::{Vec2, Vec3};

/// One of the six faces of a cube texture, in layer order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CubeFace {
    /// +X
    PositiveX,
    /// -X
    NegativeX,
    /// +Y
    PositiveY,
    /// -Y
    NegativeY,
    /// +Z
    PositiveZ,
    /// -Z
    NegativeZ,
}

impl CubeFace {
    /// All faces in layer order.
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PositiveX,
        CubeFace::NegativeX,
        CubeFace::PositiveY,
        CubeFace::NegativeY,
        CubeFace::PositiveZ,
        CubeFace::NegativeZ,
    ];

    /// The array layer backing this face.
    pub fn layer(self) -> u32 {
        self as u32
    }

    /// The direction through the center of the face.
    pub fn forward(self) -> Vec3 {
        match self {
            CubeFace::PositiveX => Vec3::X,
            CubeFace::NegativeX => Vec3::NEG_X,
            CubeFace::PositiveY => Vec3::Y,
            CubeFace::NegativeY => Vec3::NEG_Y,
            CubeFace::PositiveZ => Vec3::Z,
            CubeFace::NegativeZ => Vec3::NEG_Z,
        }
    }

    /// The up vector of a camera capturing this face.
    pub fn up(self) -> Vec3 {
        match self {
            CubeFace::PositiveY => Vec3::Z,
            CubeFace::NegativeY => Vec3::NEG_Z,
            _ => Vec3::NEG_Y,
        }
    }

    /// The right vector of a camera capturing this face.
    pub fn right(self) -> Vec3 {
        self.forward().cross(self.up())
    }

    /// The direction through the point `uv` of the face, with `uv` in
    /// `[0, 1]` and `v` growing downwards. Not normalized.
    pub fn direction(self, uv: Vec2) -> Vec3 {
        let x = uv.x * 2.0 - 1.0;
        let y = 1.0 - uv.y * 2.0;
        self.forward() + self.right() * x + self.up() * y
    }

    /// Finds the face hit by `direction` and the texture coordinate on it.
    pub fn from_direction(direction: Vec3) -> (CubeFace, Vec2) {
        let abs = direction.abs();
        let face = if abs.x >= abs.y && abs.x >= abs.z {
            if direction.x >= 0.0 {
                CubeFace::PositiveX
            } else {
                CubeFace::NegativeX
            }
        } else if abs.y >= abs.z {
            if direction.y >= 0.0 {
                CubeFace::PositiveY
            } else {
                CubeFace::NegativeY
            }
        } else if direction.z >= 0.0 {
            CubeFace::PositiveZ
        } else {
            CubeFace::NegativeZ
        };
        let major = direction.dot(face.forward()).max(f32::EPSILON);
        let x = direction.dot(face.right()) / major;
        let y = direction.dot(face.up()) / major;
        (face, Vec2::new((x + 1.0) * 0.5, (1.0 - y) * 0.5))
    }
}
