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

//! Light sources placed in the scene.
//!
//! A light's position and orientation come from the owning
//! [`Entity`](crate::entity::Entity)'s model matrix: the light points along the
//! model's local +Z axis.

use crate::camera::Camera;
use umbra_core::math::Vec3;
use umbra_core::renderer::RenderTarget;

/// The kind of a light and its kind-specific parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    /// Emits in all directions from the entity position.
    Point,
    /// Emits in a cone around the entity's forward axis.
    Spot {
        /// Half-angle of the cone, in degrees.
        cone_angle: f32,
        /// Exponent of the angular falloff inside the cone.
        cone_exp: f32,
    },
    /// Parallel rays along the entity's forward axis.
    Directional {
        /// Side of the square region covered by the shadow map.
        area_size: f32,
    },
}

impl LightKind {
    /// A spot light with the default cone.
    pub fn spot() -> Self {
        LightKind::Spot {
            cone_angle: 60.0,
            cone_exp: 60.0,
        }
    }

    /// A directional light with the default shadow area.
    pub fn directional() -> Self {
        LightKind::Directional { area_size: 1000.0 }
    }

    /// Only spot and directional lights can render shadow maps.
    pub fn supports_shadows(&self) -> bool {
        !matches!(self, LightKind::Point)
    }
}

/// GPU resources owned by a shadow-casting light.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowResources {
    /// Depth-only target the shadow map is rendered into.
    pub target: RenderTarget,
    /// The camera used for the last shadow map render.
    pub camera: Camera,
}

/// A light source.
///
/// # Examples
///
/// ```
/// use umbra_data::light::{LightEntity, LightKind};
/// use umbra_core::math::Vec3;
///
/// let mut sun = LightEntity::new(LightKind::directional());
/// sun.color = Vec3::new(1.0, 0.95, 0.8);
/// sun.cast_shadows = true;
/// assert!(sun.shadow.is_none()); // allocated on the first shadow pass
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LightEntity {
    /// Kind and kind-specific parameters.
    pub kind: LightKind,
    /// Linear color.
    pub color: Vec3,
    /// Multiplier on the color.
    pub intensity: f32,
    /// Distance at which point and spot lights fade out, also the far plane
    /// of shadow cameras.
    pub max_distance: f32,
    /// Whether the light renders a shadow map.
    pub cast_shadows: bool,
    /// Depth bias applied when comparing against the shadow map.
    pub shadow_bias: f32,
    /// Shadow resources, allocated lazily while `cast_shadows` is set.
    pub shadow: Option<ShadowResources>,
}

impl LightEntity {
    /// A light of the given kind with default parameters.
    pub fn new(kind: LightKind) -> Self {
        Self {
            kind,
            color: Vec3::ONE,
            intensity: 1.0,
            max_distance: 100.0,
            cast_shadows: false,
            shadow_bias: 0.001,
            shadow: None,
        }
    }

    /// Returns `true` when the light should own shadow resources.
    pub fn wants_shadow_map(&self) -> bool {
        self.cast_shadows && self.kind.supports_shadows()
    }
}

impl Default for LightEntity {
    fn default() -> Self {
        Self::new(LightKind::Point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_lights_never_want_shadow_maps() {
        let mut light = LightEntity::new(LightKind::Point);
        light.cast_shadows = true;
        assert!(!light.wants_shadow_map());

        let mut spot = LightEntity::new(LightKind::spot());
        spot.cast_shadows = true;
        assert!(spot.wants_shadow_map());
    }

    #[test]
    fn test_defaults() {
        let light = LightEntity::default();
        assert_eq!(light.color, Vec3::ONE);
        assert_eq!(light.max_distance, 100.0);
        assert_eq!(light.shadow_bias, 0.001);
        assert!(!light.cast_shadows);
    }
}
