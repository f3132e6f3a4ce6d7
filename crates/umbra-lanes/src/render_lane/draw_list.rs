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

//! The flat, per-frame representation of what is visible.

use std::sync::Arc;
use umbra_core::math::{Aabb, Mat4};
use umbra_core::renderer::TextureId;
use umbra_data::{Material, MeshHandle};

/// A visible mesh node, ready to draw.
#[derive(Debug, Clone)]
pub struct DrawItem {
    /// Global transform of the node.
    pub model: Mat4,
    /// The mesh.
    pub mesh: MeshHandle,
    /// The material.
    pub material: Arc<Material>,
    /// World-space bounds.
    pub world_bounds: Aabb,
    /// Distance from the camera eye to the bounds center.
    pub distance_to_camera: f32,
}

/// A visible decal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleDecal {
    /// Decal box transform.
    pub model: Mat4,
    /// Projected image.
    pub texture: Option<TextureId>,
}

/// Everything visible from one camera.
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    /// Mesh draws.
    pub items: Vec<DrawItem>,
    /// Indices of visible light entities, in scene order.
    pub lights: Vec<usize>,
    /// Visible decals, in scene order.
    pub decals: Vec<VisibleDecal>,
    /// Indices of visible reflection probe entities.
    pub reflection_probes: Vec<usize>,
}

impl DrawList {
    /// Empties the list, keeping allocations.
    pub fn clear(&mut self) {
        self.items.clear();
        self.lights.clear();
        self.decals.clear();
        self.reflection_probes.clear();
    }

    /// Orders items back to front: farthest first.
    pub fn sort_by_distance(&mut self) {
        self.items
            .sort_by(|a, b| b.distance_to_camera.total_cmp(&a.distance_to_camera));
    }

    /// Items rendered into the G-buffer.
    pub fn opaque_items(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| !item.material.is_blended())
    }

    /// Items rendered by the blended forward pass.
    pub fn blended_items(&self) -> impl Iterator<Item = &DrawItem> {
        self.items.iter().filter(|item| item.material.is_blended())
    }
}
