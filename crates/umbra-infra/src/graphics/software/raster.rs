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

//! Vertex transformation, near-plane clipping and triangle traversal.

use umbra_core::math::{Mat3, Mat4, Vec2, Vec3, Vec4};
use umbra_core::renderer::{CullMode, MeshData, Viewport};

/// Attributes interpolated across a triangle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Varyings {
    pub(crate) world_position: Vec3,
    pub(crate) normal: Vec3,
    pub(crate) uv: Vec2,
}

impl Varyings {
    fn lerp(&self, other: &Varyings, t: f32) -> Varyings {
        Varyings {
            world_position: self.world_position.lerp(other.world_position, t),
            normal: self.normal.lerp(other.normal, t),
            uv: self.uv.lerp(other.uv, t),
        }
    }

    fn weighted(v: [&Varyings; 3], w: [f32; 3]) -> Varyings {
        Varyings {
            world_position: v[0].world_position * w[0]
                + v[1].world_position * w[1]
                + v[2].world_position * w[2],
            normal: v[0].normal * w[0] + v[1].normal * w[1] + v[2].normal * w[2],
            uv: v[0].uv * w[0] + v[1].uv * w[1] + v[2].uv * w[2],
        }
    }
}

/// A vertex after the vertex stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ClipVertex {
    pub(crate) clip: Vec4,
    pub(crate) varyings: Varyings,
}

/// A covered pixel, ready for depth testing and shading.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Fragment {
    pub(crate) x: u32,
    pub(crate) y: u32,
    /// Normalized device depth in `[0, 1]`.
    pub(crate) depth: f32,
    /// Position inside the viewport, `v` growing downwards.
    pub(crate) screen_uv: Vec2,
    pub(crate) varyings: Varyings,
}

/// Runs the vertex stage over every vertex of `mesh`.
pub(crate) fn transform_mesh(
    mesh: &MeshData,
    model: &Mat4,
    view_projection: &Mat4,
) -> Vec<ClipVertex> {
    let normal_matrix = Mat3::from_mat4(*model).inverse().transpose();
    mesh.positions
        .iter()
        .enumerate()
        .map(|(i, position)| {
            let world = model.transform_point3(*position);
            let normal = mesh
                .normals
                .get(i)
                .map_or(Vec3::ZERO, |n| (normal_matrix * *n).normalize_or_zero());
            let uv = mesh.uvs.get(i).copied().unwrap_or(Vec2::ZERO);
            ClipVertex {
                clip: *view_projection * world.extend(1.0),
                varyings: Varyings {
                    world_position: world,
                    normal,
                    uv,
                },
            }
        })
        .collect()
}

/// Clips a triangle against the near plane (`z >= 0` in clip space) and
/// returns the resulting convex polygon, possibly empty.
fn clip_near(triangle: [ClipVertex; 3]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(4);
    for i in 0..3 {
        let a = triangle[i];
        let b = triangle[(i + 1) % 3];
        let a_in = a.clip.z >= 0.0;
        let b_in = b.clip.z >= 0.0;
        if a_in {
            out.push(a);
        }
        if a_in != b_in {
            let t = a.clip.z / (a.clip.z - b.clip.z);
            out.push(ClipVertex {
                clip: a.clip.lerp(b.clip, t),
                varyings: a.varyings.lerp(&b.varyings, t),
            });
        }
    }
    out
}

fn edge(a: Vec2, b: Vec2, p: Vec2) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

/// Whether pixels exactly on edge `a -> b` belong to the triangle. Two
/// triangles sharing an edge walk it in opposite directions, so exactly one
/// of them owns it.
fn owns_edge(a: Vec2, b: Vec2) -> bool {
    let d = b - a;
    d.y > 0.0 || (d.y == 0.0 && d.x > 0.0)
}

fn inside(w: f32, a: Vec2, b: Vec2) -> bool {
    w > 0.0 || (w == 0.0 && owns_edge(a, b))
}

/// Pixel rectangle `[x0, x1) x [y0, y1)` where a viewport intersects an
/// output of `size`.
fn scissor(viewport: &Viewport, size: (u32, u32)) -> (u32, u32, u32, u32) {
    let x0 = viewport.x.min(size.0);
    let y0 = viewport.y.min(size.1);
    let x1 = (viewport.x + viewport.width).min(size.0);
    let y1 = (viewport.y + viewport.height).min(size.1);
    (x0, y0, x1, y1)
}

/// Rasterizes one triangle, calling `emit` for every covered pixel.
pub(crate) fn rasterize_triangle(
    triangle: [ClipVertex; 3],
    viewport: &Viewport,
    size: (u32, u32),
    cull: CullMode,
    mut emit: impl FnMut(Fragment),
) {
    let polygon = clip_near(triangle);
    if polygon.len() < 3 {
        return;
    }
    for i in 1..polygon.len() - 1 {
        rasterize_clipped(
            [polygon[0], polygon[i], polygon[i + 1]],
            viewport,
            size,
            cull,
            &mut emit,
        );
    }
}

fn rasterize_clipped(
    triangle: [ClipVertex; 3],
    viewport: &Viewport,
    size: (u32, u32),
    cull: CullMode,
    emit: &mut impl FnMut(Fragment),
) {
    if triangle.iter().any(|v| v.clip.w <= 0.0) {
        return;
    }
    let ndc = triangle.map(|v| v.clip.truncate() / v.clip.w);

    let ndc_area = edge(ndc[0].truncate(), ndc[1].truncate(), ndc[2].truncate());
    let front_facing = ndc_area > 0.0;
    match cull {
        CullMode::Back if !front_facing => return,
        CullMode::Front if front_facing => return,
        _ => {}
    }

    let (vx, vy) = (viewport.x as f32, viewport.y as f32);
    let (vw, vh) = (viewport.width as f32, viewport.height as f32);
    let to_screen = |p: Vec3| Vec2::new(vx + (p.x * 0.5 + 0.5) * vw, vy + (0.5 - p.y * 0.5) * vh);
    let mut order = [0usize, 1, 2];
    let mut s = ndc.map(to_screen);
    let mut area = edge(s[0], s[1], s[2]);
    if area == 0.0 {
        return;
    }
    if area < 0.0 {
        order.swap(1, 2);
        s.swap(1, 2);
        area = -area;
    }
    let z = order.map(|i| ndc[i].z);
    let inv_w = order.map(|i| 1.0 / triangle[i].clip.w);
    let varyings = order.map(|i| &triangle[i].varyings);

    let (sx0, sy0, sx1, sy1) = scissor(viewport, size);
    let min = s[0].min(s[1]).min(s[2]);
    let max = s[0].max(s[1]).max(s[2]);
    let x0 = (min.x.floor().max(sx0 as f32)) as u32;
    let y0 = (min.y.floor().max(sy0 as f32)) as u32;
    let x1 = (max.x.ceil().min(sx1 as f32)) as u32;
    let y1 = (max.y.ceil().min(sy1 as f32)) as u32;

    for y in y0..y1 {
        for x in x0..x1 {
            let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            let w0 = edge(s[1], s[2], p);
            let w1 = edge(s[2], s[0], p);
            let w2 = edge(s[0], s[1], p);
            if !(inside(w0, s[1], s[2]) && inside(w1, s[2], s[0]) && inside(w2, s[0], s[1])) {
                continue;
            }
            let l = [w0 / area, w1 / area, w2 / area];
            let depth = l[0] * z[0] + l[1] * z[1] + l[2] * z[2];
            if !(0.0..=1.0).contains(&depth) {
                continue;
            }
            let pw = [l[0] * inv_w[0], l[1] * inv_w[1], l[2] * inv_w[2]];
            let sum = pw[0] + pw[1] + pw[2];
            let weights = [pw[0] / sum, pw[1] / sum, pw[2] / sum];
            emit(Fragment {
                x,
                y,
                depth,
                screen_uv: Vec2::new((p.x - vx) / vw, (p.y - vy) / vh),
                varyings: Varyings::weighted(varyings, weights),
            });
        }
    }
}

/// Calls `emit` for every pixel of the viewport, as a full-screen quad would.
pub(crate) fn rasterize_fullscreen(
    viewport: &Viewport,
    size: (u32, u32),
    mut emit: impl FnMut(Fragment),
) {
    let (x0, y0, x1, y1) = scissor(viewport, size);
    let (vw, vh) = (viewport.width as f32, viewport.height as f32);
    for y in y0..y1 {
        for x in x0..x1 {
            emit(Fragment {
                x,
                y,
                depth: 0.0,
                screen_uv: Vec2::new(
                    (x - viewport.x) as f32 / vw + 0.5 / vw,
                    (y - viewport.y) as f32 / vh + 0.5 / vh,
                ),
                varyings: Varyings::default(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32) -> ClipVertex {
        ClipVertex {
            clip: Vec4::new(x, y, z, 1.0),
            varyings: Varyings::default(),
        }
    }

    fn coverage(triangles: &[[ClipVertex; 3]], cull: CullMode) -> Vec<u32> {
        let size = (8, 8);
        let mut hits = vec![0u32; 64];
        for t in triangles {
            rasterize_triangle(*t, &Viewport::full(8, 8), size, cull, |f| {
                hits[(f.y * 8 + f.x) as usize] += 1
            });
        }
        hits
    }

    #[test]
    fn test_quad_covers_every_pixel_exactly_once() {
        // Two counter-clockwise triangles sharing a diagonal through pixel centers.
        let a = vertex(-1.0, -1.0, 0.5);
        let b = vertex(1.0, -1.0, 0.5);
        let c = vertex(1.0, 1.0, 0.5);
        let d = vertex(-1.0, 1.0, 0.5);
        let hits = coverage(&[[a, b, c], [a, c, d]], CullMode::Back);
        assert!(hits.iter().all(|&h| h == 1), "{hits:?}");
    }

    #[test]
    fn test_back_faces_are_culled() {
        let a = vertex(-1.0, -1.0, 0.5);
        let b = vertex(1.0, -1.0, 0.5);
        let c = vertex(1.0, 1.0, 0.5);
        let clockwise = [[a, c, b]];
        assert!(coverage(&clockwise, CullMode::Back).iter().all(|&h| h == 0));
        assert!(coverage(&clockwise, CullMode::Front).iter().any(|&h| h == 1));
        let counter_clockwise = [[a, b, c]];
        assert!(coverage(&counter_clockwise, CullMode::Front)
            .iter()
            .all(|&h| h == 0));
    }

    #[test]
    fn test_triangle_behind_near_plane_is_dropped() {
        let t = [
            vertex(-1.0, -1.0, -0.1),
            vertex(1.0, -1.0, -0.1),
            vertex(0.0, 1.0, -0.1),
        ];
        assert!(coverage(&[t], CullMode::None).iter().all(|&h| h == 0));
    }

    #[test]
    fn test_fullscreen_uv_is_relative_to_viewport() {
        let viewport = Viewport {
            x: 4,
            y: 0,
            width: 4,
            height: 2,
        };
        let mut first = None;
        let mut count = 0;
        rasterize_fullscreen(&viewport, (8, 8), |f| {
            first.get_or_insert((f.x, f.y, f.screen_uv));
            count += 1;
        });
        assert_eq!(count, 8);
        assert_eq!(first, Some((4, 0, Vec2::new(0.125, 0.25))));
    }
}
