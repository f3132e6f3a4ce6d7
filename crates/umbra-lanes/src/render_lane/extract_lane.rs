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

//! Defines the lane responsible for collecting what a camera can see.

use super::{DrawItem, DrawList, VisibleDecal};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::Mat4;
use umbra_data::{Camera, EntityKind, Node, Scene};

/// A lane that performs the "extraction" phase of the rendering pipeline.
///
/// It walks the scene, culls every mesh node against the camera frustum and
/// populates a [`DrawList`] with a flat representation of what is visible.
#[derive(Debug, Default)]
pub struct ExtractLane;

impl ExtractLane {
    /// Creates a new `ExtractLane`.
    pub fn new() -> Self {
        Self
    }

    /// Executes the extraction for one view.
    ///
    /// # Arguments
    /// * `scene`: The scene to traverse.
    /// * `camera`: The camera whose frustum is used for culling.
    /// * `draw_list`: Cleared, then filled with the visible items, lights,
    ///   decals and reflection probes. Items are left in traversal order; call
    ///   [`DrawList::sort_by_distance`] to order them.
    pub fn run(&self, scene: &Scene, camera: &Camera, draw_list: &mut DrawList) {
        draw_list.clear();
        let frustum = camera.frustum();

        for (index, entity) in scene.entities.iter().enumerate() {
            if !entity.visible {
                continue;
            }
            match &entity.kind {
                EntityKind::Prefab(Some(prefab)) => {
                    collect_node(&prefab.root, &entity.model, camera, &frustum, draw_list);
                }
                EntityKind::Prefab(None) => {
                    log::debug!("ExtractLane: entity '{}' has no prefab", entity.name);
                }
                EntityKind::Light(_) => draw_list.lights.push(index),
                EntityKind::Decal(decal) => draw_list.decals.push(VisibleDecal {
                    model: entity.model,
                    texture: decal.texture,
                }),
                EntityKind::ReflectionProbe(_) => draw_list.reflection_probes.push(index),
            }
        }
    }
}

fn collect_node(
    root: &Node,
    model: &Mat4,
    camera: &Camera,
    frustum: &umbra_core::math::Frustum,
    draw_list: &mut DrawList,
) {
    root.visit_visible(model, &mut |node, global| {
        let (Some(mesh), Some(material)) = (&node.mesh, &node.material) else {
            return;
        };
        if mesh.vertex_count == 0 {
            return;
        }
        let world_bounds = mesh.bounds.transform(global);
        if !frustum.intersects_aabb(&world_bounds) {
            return;
        }
        draw_list.items.push(DrawItem {
            model: *global,
            mesh: *mesh,
            material: material.clone(),
            world_bounds,
            distance_to_camera: world_bounds.center().distance(camera.eye),
        });
    });
}

impl Lane for ExtractLane {
    fn strategy_name(&self) -> &'static str {
        "Extract"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Extract
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use umbra_core::math::{Aabb, Vec3};
    use umbra_core::renderer::MeshId;
    use umbra_data::{Entity, LightEntity, LightKind, Material, MeshHandle, Prefab};

    fn cube_handle() -> MeshHandle {
        MeshHandle {
            id: MeshId(0),
            bounds: Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5)),
            vertex_count: 24,
        }
    }

    fn prefab_at(name: &str, position: Vec3) -> Entity {
        let node = Node::with_mesh(name, cube_handle(), Arc::new(Material::default()));
        let prefab = Arc::new(Prefab::new(name, node));
        Entity::new(name, EntityKind::Prefab(Some(prefab)))
            .with_model(Mat4::from_translation(position))
    }

    fn camera() -> Camera {
        Camera::new_perspective(60f32.to_radians(), 1.0, 0.1, 100.0).look_at(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
        )
    }

    #[test]
    fn test_culls_items_outside_the_frustum() {
        let mut scene = Scene::new();
        scene.add(prefab_at("front", Vec3::ZERO));
        scene.add(prefab_at("behind", Vec3::new(0.0, 0.0, 20.0)));
        scene.add(prefab_at("left", Vec3::new(-50.0, 0.0, 0.0)));

        let mut list = DrawList::default();
        ExtractLane::new().run(&scene, &camera(), &mut list);
        assert_eq!(list.items.len(), 1);
        assert_eq!(list.items[0].world_bounds.center(), Vec3::ZERO);
    }

    #[test]
    fn test_invisible_entities_and_subtrees_are_skipped() {
        let mut scene = Scene::new();
        let mut hidden_entity = prefab_at("hidden", Vec3::ZERO);
        hidden_entity.visible = false;
        scene.add(hidden_entity);

        let material = Arc::new(Material::default());
        let mut hidden_child = Node::with_mesh("child", cube_handle(), material.clone());
        hidden_child.visible = false;
        let hidden_child =
            hidden_child.with_child(Node::with_mesh("grandchild", cube_handle(), material));
        let root = Node::new("root").with_child(hidden_child);
        scene.add(Entity::new(
            "tree",
            EntityKind::Prefab(Some(Arc::new(Prefab::new("tree", root)))),
        ));

        let mut list = DrawList::default();
        ExtractLane::new().run(&scene, &camera(), &mut list);
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_zero_vertex_meshes_and_missing_prefabs_are_ignored() {
        let mut scene = Scene::new();
        let mut handle = cube_handle();
        handle.vertex_count = 0;
        let node = Node::with_mesh("empty", handle, Arc::new(Material::default()));
        scene.add(Entity::new(
            "empty",
            EntityKind::Prefab(Some(Arc::new(Prefab::new("empty", node)))),
        ));
        scene.add(Entity::new("broken", EntityKind::Prefab(None)));

        let mut list = DrawList::default();
        ExtractLane::new().run(&scene, &camera(), &mut list);
        assert!(list.items.is_empty());
    }

    #[test]
    fn test_sort_orders_far_to_near_and_collects_lights() {
        let mut scene = Scene::new();
        scene.add(prefab_at("near", Vec3::new(0.0, 0.0, 5.0)));
        scene.add(prefab_at("far", Vec3::new(0.0, 0.0, -20.0)));
        scene.add(prefab_at("mid", Vec3::ZERO));
        scene.add(Entity::new(
            "lamp",
            EntityKind::Light(LightEntity::new(LightKind::Point)),
        ));

        let mut list = DrawList::default();
        ExtractLane::new().run(&scene, &camera(), &mut list);
        list.sort_by_distance();

        let distances: Vec<f32> = list.items.iter().map(|i| i.distance_to_camera).collect();
        assert_eq!(distances, vec![30.0, 10.0, 5.0]);
        assert_eq!(list.lights, vec![3]);
    }
}
