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

//! Surface materials.

use umbra_core::math::{Vec3, Vec4};
use umbra_core::renderer::TextureId;

/// How the alpha channel of a material is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Alpha is ignored.
    #[default]
    Opaque,
    /// Fragments below the cutoff are discarded.
    Mask,
    /// The surface is blended over what is behind it.
    Blend,
}

/// A metallic-roughness material with already resolved GPU textures.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color factor.
    pub color: Vec4,
    /// Base color texture.
    pub color_texture: Option<TextureId>,
    /// Emissive factor.
    pub emissive_factor: Vec3,
    /// Emissive texture.
    pub emissive_texture: Option<TextureId>,
    /// Metallic factor in `[0, 1]`.
    pub metallic_factor: f32,
    /// Roughness factor in `[0, 1]`.
    pub roughness_factor: f32,
    /// Metallic (blue) and roughness (green) texture.
    pub metallic_roughness_texture: Option<TextureId>,
    /// Tangent-space normal map.
    pub normal_texture: Option<TextureId>,
    /// Alpha interpretation.
    pub alpha_mode: AlphaMode,
    /// Cutoff used by [`AlphaMode::Mask`].
    pub alpha_cutoff: f32,
    /// Disables back-face culling.
    pub two_sided: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Vec4::ONE,
            color_texture: None,
            emissive_factor: Vec3::ZERO,
            emissive_texture: None,
            metallic_factor: 0.0,
            roughness_factor: 1.0,
            metallic_roughness_texture: None,
            normal_texture: None,
            alpha_mode: AlphaMode::Opaque,
            alpha_cutoff: 0.5,
            two_sided: false,
        }
    }
}

impl Material {
    /// An opaque, untextured material of the given color.
    pub fn from_color(color: Vec4) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    /// Returns `true` for materials rendered in the blended forward pass.
    pub fn is_blended(&self) -> bool {
        self.alpha_mode == AlphaMode::Blend
    }

    /// The cutoff uploaded to shaders: the material cutoff for masked
    /// materials, `0` otherwise.
    pub fn effective_alpha_cutoff(&self) -> f32 {
        match self.alpha_mode {
            AlphaMode::Mask => self.alpha_cutoff,
            AlphaMode::Opaque | AlphaMode::Blend => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_masked_materials_upload_cutoff() {
        let mut material = Material::default();
        assert_eq!(material.effective_alpha_cutoff(), 0.0);
        material.alpha_mode = AlphaMode::Mask;
        assert_eq!(material.effective_alpha_cutoff(), 0.5);
        material.alpha_mode = AlphaMode::Blend;
        assert_eq!(material.effective_alpha_cutoff(), 0.0);
        assert!(material.is_blended());
    }
}
