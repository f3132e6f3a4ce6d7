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

//! The scene consumed by the renderer.

use crate::entity::{Entity, EntityKind};
use umbra_core::math::Vec3;
use umbra_core::renderer::TextureId;

/// A flat list of entities plus global lighting parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Entities in insertion order. Lights are applied in this order.
    pub entities: Vec<Entity>,
    /// Color of pixels not covered by geometry.
    pub background_color: Vec3,
    /// Ambient light applied to every surface.
    pub ambient_light: Vec3,
    /// Density of the participating medium for volumetric effects.
    pub air_density: f32,
    /// Default sky cube map used for reflections when no probe was captured.
    pub environment: Option<TextureId>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            entities: Vec::new(),
            background_color: Vec3::ZERO,
            ambient_light: Vec3::ZERO,
            air_density: 1.0,
            environment: None,
        }
    }
}

impl Scene {
    /// An empty scene.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity and returns its index.
    pub fn add(&mut self, entity: Entity) -> usize {
        self.entities.push(entity);
        self.entities.len() - 1
    }

    /// Looks an entity up by name.
    pub fn find(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Looks an entity up by name, mutably.
    pub fn find_mut(&mut self, name: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.name == name)
    }

    /// Number of light entities, visible or not.
    pub fn light_count(&self) -> usize {
        self.entities
            .iter()
            .filter(|e| matches!(e.kind, EntityKind::Light(_)))
            .count()
    }
}
