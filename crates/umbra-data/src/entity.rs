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

//! Scene entities.

use crate::light::LightEntity;
use crate::prefab::Prefab;
use std::sync::Arc;
use umbra_core::math::{Mat4, Vec3};
use umbra_core::renderer::TextureId;

/// A decal projected onto the G-buffer inside the entity's unit cube.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecalEntity {
    /// The projected image. Decals without a texture are not drawn.
    pub texture: Option<TextureId>,
}

/// A point from which a reflection cube map is captured.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReflectionProbeEntity {
    /// The captured cube map, allocated on first capture.
    pub texture: Option<TextureId>,
}

/// What an entity is.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityKind {
    /// An instance of a node hierarchy. `None` when the asset failed to load.
    Prefab(Option<Arc<Prefab>>),
    /// A light source.
    Light(LightEntity),
    /// A projected decal.
    Decal(DecalEntity),
    /// A reflection capture point.
    ReflectionProbe(ReflectionProbeEntity),
}

/// An object placed in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// Debug name.
    pub name: String,
    /// Invisible entities are ignored by rendering.
    pub visible: bool,
    /// Local-to-world transform.
    pub model: Mat4,
    /// Kind-specific data.
    pub kind: EntityKind,
}

impl Entity {
    /// A visible entity at the origin.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            visible: true,
            model: Mat4::IDENTITY,
            kind,
        }
    }

    /// Sets the model matrix.
    pub fn with_model(mut self, model: Mat4) -> Self {
        self.model = model;
        self
    }

    /// World-space position.
    pub fn position(&self) -> Vec3 {
        self.model.w_axis.truncate()
    }

    /// Normalized local +Z axis in world space.
    pub fn forward(&self) -> Vec3 {
        self.model.transform_vector3(Vec3::Z).normalize_or(Vec3::Z)
    }

    /// Normalized local +Y axis in world space.
    pub fn up(&self) -> Vec3 {
        self.model.transform_vector3(Vec3::Y).normalize_or(Vec3::Y)
    }

    /// The light data, for light entities.
    pub fn as_light(&self) -> Option<&LightEntity> {
        match &self.kind {
            EntityKind::Light(light) => Some(light),
            _ => None,
        }
    }

    /// Mutable light data, for light entities.
    pub fn as_light_mut(&mut self) -> Option<&mut LightEntity> {
        match &mut self.kind {
            EntityKind::Light(light) => Some(light),
            _ => None,
        }
    }
}

/// Builds a model matrix placing an object at `eye`, with its +Z axis
/// pointing at `target`. Useful to aim lights.
pub fn look_toward(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
    let forward = (target - eye).normalize_or(Vec3::Z);
    let up = if forward.cross(up).length_squared() < 1e-8 {
        if forward.y.abs() < 0.99 {
            Vec3::Y
        } else {
            Vec3::X
        }
    } else {
        up
    };
    let right = up.cross(forward).normalize();
    let true_up = forward.cross(right);
    Mat4::from_cols(
        right.extend(0.0),
        true_up.extend(0.0),
        forward.extend(0.0),
        eye.extend(1.0),
    )
}
