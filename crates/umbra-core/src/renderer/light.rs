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

//! Per-light shading parameters as seen by the lighting programs.

use crate::math::{Mat4, Vec3};
use crate::renderer::api::core::TextureId;

/// Maximum number of lights uploaded by the single-pass lighting strategy.
pub const MAX_LIGHTS: usize = 10;

/// The type tag of a light, as uploaded to shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightType {
    /// Omnidirectional light with distance attenuation.
    #[default]
    Point,
    /// Cone light with distance attenuation.
    Spot,
    /// Infinitely distant light; only the direction matters.
    Directional,
}

/// Shadow map parameters for a light that owns shadow resources.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowUniforms {
    /// The depth texture rendered from the light.
    pub map: TextureId,
    /// The light camera's view-projection.
    pub view_projection: Mat4,
    /// Depth bias subtracted before the comparison.
    pub bias: f32,
}

/// The full parameter set of one light.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightUniforms {
    /// Type tag.
    pub light_type: LightType,
    /// Linear color.
    pub color: Vec3,
    /// Scalar intensity multiplied with the color.
    pub intensity: f32,
    /// World position.
    pub position: Vec3,
    /// Normalized world direction the light points to.
    pub direction: Vec3,
    /// Distance at which point and spot lights fade to zero.
    pub max_distance: f32,
    /// Cosine of the spot cone half-angle.
    pub cone_cos: f32,
    /// Exponent of the spot falloff.
    pub cone_exp: f32,
    /// Shadow parameters, present only for lights casting with resources.
    pub shadow: Option<ShadowUniforms>,
}

impl Default for LightUniforms {
    fn default() -> Self {
        Self {
            light_type: LightType::Point,
            color: Vec3::ONE,
            intensity: 1.0,
            position: Vec3::ZERO,
            direction: Vec3::Z,
            max_distance: 100.0,
            cone_cos: 0.5,
            cone_exp: 60.0,
            shadow: None,
        }
    }
}

/// Fixed-capacity light arrays for the single-pass strategy.
///
/// Each field is a parallel array, mirroring how the values are laid out in
/// uniform memory. Shadows are not supported in this layout.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LightArray {
    /// Number of valid entries.
    pub count: usize,
    /// Light positions.
    pub positions: [Vec3; MAX_LIGHTS],
    /// Light colors.
    pub colors: [Vec3; MAX_LIGHTS],
    /// Attenuation distances.
    pub max_distances: [f32; MAX_LIGHTS],
    /// Type tags.
    pub types: [LightType; MAX_LIGHTS],
    /// Intensities.
    pub intensities: [f32; MAX_LIGHTS],
    /// Spot cutoff cosines.
    pub cone_cos: [f32; MAX_LIGHTS],
    /// Spot exponents.
    pub cone_exps: [f32; MAX_LIGHTS],
    /// Directions.
    pub directions: [Vec3; MAX_LIGHTS],
}

impl LightArray {
    /// Appends a light. Returns `false` if the array is full.
    pub fn push(&mut self, light: &LightUniforms) -> bool {
        if self.count >= MAX_LIGHTS {
            return false;
        }
        let i = self.count;
        self.positions[i] = light.position;
        self.colors[i] = light.color;
        self.max_distances[i] = light.max_distance;
        self.types[i] = light.light_type;
        self.intensities[i] = light.intensity;
        self.cone_cos[i] = light.cone_cos;
        self.cone_exps[i] = light.cone_exp;
        self.directions[i] = light.direction;
        self.count += 1;
        true
    }

    /// Reassembles entry `index` into a shadowless [`LightUniforms`].
    pub fn get(&self, index: usize) -> Option<LightUniforms> {
        (index < self.count).then(|| LightUniforms {
            light_type: self.types[index],
            color: self.colors[index],
            intensity: self.intensities[index],
            position: self.positions[index],
            direction: self.directions[index],
            max_distance: self.max_distances[index],
            cone_cos: self.cone_cos[index],
            cone_exp: self.cone_exps[index],
            shadow: None,
        })
    }

    /// Iterates over the valid entries.
    pub fn iter(&self) -> impl Iterator<Item = LightUniforms> + '_ {
        (0..self.count).filter_map(|i| self.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_light_array_caps_at_max_lights() {
        let mut array = LightArray::default();
        let light = LightUniforms::default();
        for _ in 0..MAX_LIGHTS {
            assert!(array.push(&light));
        }
        assert!(!array.push(&light));
        assert_eq!(array.count, MAX_LIGHTS);
        assert_eq!(array.iter().count(), MAX_LIGHTS);
    }

    #[test]
    fn test_light_array_drops_shadow_parameters() {
        let mut array = LightArray::default();
        let light = LightUniforms {
            light_type: LightType::Spot,
            intensity: 3.0,
            shadow: Some(ShadowUniforms {
                map: TextureId(1),
                view_projection: Mat4::IDENTITY,
                bias: 0.01,
            }),
            ..Default::default()
        };
        array.push(&light);
        let back = array.get(0).unwrap();
        assert_eq!(back.light_type, LightType::Spot);
        assert_eq!(back.intensity, 3.0);
        assert!(back.shadow.is_none());
        assert!(array.get(1).is_none());
    }
}
