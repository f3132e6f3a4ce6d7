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

//! CPU-side mesh data and draw geometry.

use super::core::MeshId;
use crate::math::{Aabb, Mat4, Vec2, Vec3};

/// Indexed triangle mesh data ready to be uploaded to a device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Vertex normals, one per position.
    pub normals: Vec<Vec3>,
    /// Texture coordinates, one per position.
    pub uvs: Vec<Vec2>,
    /// Triangle list indices, counter-clockwise front faces.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// The local-space bounding box of the mesh.
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.positions.iter().copied()).unwrap_or_default()
    }

    /// Number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// A unit cube centered on the origin (extents `[-0.5, 0.5]`), with
    /// outward normals and per-face UVs.
    pub fn unit_cube() -> Self {
        // (normal, up) for each face; right = up x normal keeps CCW winding.
        const FACES: [(Vec3, Vec3); 6] = [
            (Vec3::X, Vec3::Y),
            (Vec3::NEG_X, Vec3::Y),
            (Vec3::Y, Vec3::NEG_Z),
            (Vec3::NEG_Y, Vec3::Z),
            (Vec3::Z, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y),
        ];

        let mut mesh = MeshData::default();
        for (normal, up) in FACES {
            let right = up.cross(normal);
            let center = normal * 0.5;
            let base = mesh.positions.len() as u32;
            let corners = [
                (-0.5, -0.5, Vec2::new(0.0, 1.0)),
                (0.5, -0.5, Vec2::new(1.0, 1.0)),
                (0.5, 0.5, Vec2::new(1.0, 0.0)),
                (-0.5, 0.5, Vec2::new(0.0, 0.0)),
            ];
            for (x, y, uv) in corners {
                mesh.positions.push(center + right * x + up * y);
                mesh.normals.push(normal);
                mesh.uvs.push(uv);
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// A square on the XZ plane centered on the origin, facing +Y.
    pub fn plane(size: f32) -> Self {
        let h = size * 0.5;
        MeshData {
            positions: vec![
                Vec3::new(-h, 0.0, h),
                Vec3::new(h, 0.0, h),
                Vec3::new(h, 0.0, -h),
                Vec3::new(-h, 0.0, -h),
            ],
            normals: vec![Vec3::Y; 4],
            uvs: vec![
                Vec2::new(0.0, 1.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(0.0, 0.0),
            ],
            indices: vec![0, 1, 2, 0, 2, 3],
        }
    }

    /// A UV sphere of the given radius.
    pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = MeshData::default();
        for ring in 0..=rings {
            let v = ring as f32 / rings as f32;
            let theta = v * std::f32::consts::PI;
            for segment in 0..=segments {
                let u = segment as f32 / segments as f32;
                let phi = u * std::f32::consts::TAU;
                let normal = Vec3::new(
                    theta.sin() * phi.cos(),
                    theta.cos(),
                    -theta.sin() * phi.sin(),
                );
                mesh.positions.push(normal * radius);
                mesh.normals.push(normal);
                mesh.uvs.push(Vec2::new(u, v));
            }
        }
        let stride = segments + 1;
        for ring in 0..rings {
            for segment in 0..segments {
                let a = ring * stride + segment;
                let b = a + stride;
                mesh.indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
            }
        }
        mesh
    }
}

/// What a draw call rasterizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// An uploaded mesh placed in the world by a model matrix.
    Mesh {
        /// The mesh to draw.
        mesh: MeshId,
        /// Local-to-world transform.
        model: Mat4,
    },
    /// A quad covering the whole viewport.
    FullscreenQuad,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(mesh: &MeshData, tri: usize) -> Vec3 {
        let i = &mesh.indices[tri * 3..tri * 3 + 3];
        let a = mesh.positions[i[0] as usize];
        let b = mesh.positions[i[1] as usize];
        let c = mesh.positions[i[2] as usize];
        (b - a).cross(c - a).normalize()
    }

    #[test]
    fn test_unit_cube_winding_matches_normals() {
        let cube = MeshData::unit_cube();
        assert_eq!(cube.vertex_count(), 24);
        assert_eq!(cube.indices.len(), 36);
        for tri in 0..12 {
            let geometric = face_normal(&cube, tri);
            let stored = cube.normals[cube.indices[tri * 3] as usize];
            assert!(geometric.dot(stored) > 0.99, "triangle {tri} winds inwards");
        }
        assert_eq!(cube.bounds().max, Vec3::splat(0.5));
    }

    #[test]
    fn test_plane_faces_up() {
        let plane = MeshData::plane(4.0);
        assert!(face_normal(&plane, 0).dot(Vec3::Y) > 0.99);
        assert!(face_normal(&plane, 1).dot(Vec3::Y) > 0.99);
    }

    #[test]
    fn test_sphere_winding_faces_outwards() {
        let sphere = MeshData::uv_sphere(1.0, 8, 6);
        // A triangle from a middle ring.
        let tri = (8 * 2) + 3;
        let i = sphere.indices[tri * 3] as usize;
        assert!(face_normal(&sphere, tri).dot(sphere.normals[i]) > 0.0);
    }
}
