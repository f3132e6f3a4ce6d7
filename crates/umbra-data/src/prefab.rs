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

//! Renderable node hierarchies.

use crate::material::Material;
use std::sync::Arc;
use umbra_core::math::{Aabb, Mat4};
use umbra_core::renderer::{MeshData, MeshId};

/// A mesh already uploaded to the device, with its local bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshHandle {
    /// Device handle.
    pub id: MeshId,
    /// Local-space bounding box.
    pub bounds: Aabb,
    /// Number of vertices; zero-vertex meshes are never drawn.
    pub vertex_count: u32,
}

impl MeshHandle {
    /// Builds a handle for `data` uploaded under `id`.
    pub fn new(id: MeshId, data: &MeshData) -> Self {
        Self {
            id,
            bounds: data.bounds(),
            vertex_count: data.vertex_count() as u32,
        }
    }
}

/// A node of a prefab hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Debug name.
    pub name: String,
    /// Transform relative to the parent node.
    pub local: Mat4,
    /// Invisible nodes hide their whole subtree.
    pub visible: bool,
    /// Geometry drawn at this node.
    pub mesh: Option<MeshHandle>,
    /// Material of the geometry.
    pub material: Option<Arc<Material>>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Node {
    /// An empty, visible node.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            local: Mat4::IDENTITY,
            visible: true,
            mesh: None,
            material: None,
            children: Vec::new(),
        }
    }

    /// A visible node drawing `mesh` with `material`.
    pub fn with_mesh(name: impl Into<String>, mesh: MeshHandle, material: Arc<Material>) -> Self {
        Self {
            mesh: Some(mesh),
            material: Some(material),
            ..Self::new(name)
        }
    }

    /// Sets the local transform.
    pub fn with_transform(mut self, local: Mat4) -> Self {
        self.local = local;
        self
    }

    /// Appends a child.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Visits every visible node depth-first with its global transform,
    /// skipping invisible nodes and their subtrees.
    pub fn visit_visible<F: FnMut(&Node, &Mat4)>(&self, parent: &Mat4, f: &mut F) {
        if !self.visible {
            return;
        }
        let global = *parent * self.local;
        f(self, &global);
        for child in &self.children {
            child.visit_visible(&global, f);
        }
    }
}

/// A shared, immutable node hierarchy placed in the scene by entities.
#[derive(Debug, Clone, PartialEq)]
pub struct Prefab {
    /// Name, usually the source asset path.
    pub name: String,
    /// Root node.
    pub root: Node,
}

impl Prefab {
    /// Wraps a root node.
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::math::Vec3;

    #[test]
    fn test_visit_accumulates_transforms_and_skips_hidden_subtrees() {
        let mut hidden = Node::new("hidden").with_child(Node::new("hidden_child"));
        hidden.visible = false;
        let root = Node::new("root")
            .with_transform(Mat4::from_translation(Vec3::X))
            .with_child(
                Node::new("child").with_transform(Mat4::from_translation(Vec3::Y)),
            )
            .with_child(hidden);

        let mut seen = Vec::new();
        root.visit_visible(&Mat4::IDENTITY, &mut |node, global| {
            seen.push((node.name.clone(), global.transform_point3(Vec3::ZERO)));
        });

        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], ("root".to_string(), Vec3::X));
        assert_eq!(seen[1], ("child".to_string(), Vec3::new(1.0, 1.0, 0.0)));
    }
}
