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

//! Device resources shared by every lane, and uniform builders.

use umbra_core::math::Vec4;
use umbra_core::renderer::{
    CameraUniforms, FilterMode, GraphicsDevice, LightType, LightUniforms, MaterialUniforms,
    MeshData, MeshId, ResourceError, ShadowUniforms, TextureDescriptor, TextureFormat, TextureId,
};
use umbra_data::{Camera, Entity, LightEntity, LightKind, Material};

/// Neutral textures and helper geometry created once per device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SharedResources {
    /// 1x1 white texture: neutral color, metallic-roughness and occlusion.
    pub white: TextureId,
    /// 1x1 black texture: neutral emissive and "no normal map".
    pub black: TextureId,
    /// Unit cube centered on the origin, used as decal volume.
    pub cube: MeshId,
}

impl SharedResources {
    /// Creates the shared resources on `device`.
    pub fn create(device: &mut dyn GraphicsDevice) -> Result<Self, ResourceError> {
        let white = create_solid_texture(device, "neutral_white", Vec4::ONE)?;
        let black = create_solid_texture(device, "neutral_black", Vec4::new(0.0, 0.0, 0.0, 1.0))?;
        let cube = device.create_mesh(&MeshData::unit_cube())?;
        log::debug!("Shared render resources created");
        Ok(Self { white, black, cube })
    }

    /// Releases the textures. Meshes live as long as the device.
    pub fn destroy(&self, device: &mut dyn GraphicsDevice) {
        for texture in [self.white, self.black] {
            if let Err(e) = device.destroy_texture(texture) {
                log::warn!("SharedResources: failed to destroy {:?}: {}", texture, e);
            }
        }
    }

    /// Resolves a material into uniforms, binding neutral textures to the
    /// slots the material leaves empty.
    pub fn material_uniforms(&self, material: &Material) -> MaterialUniforms {
        MaterialUniforms {
            color: material.color,
            color_texture: material.color_texture.unwrap_or(self.white),
            emissive: material.emissive_factor,
            emissive_texture: material.emissive_texture.unwrap_or(self.black),
            metallic: material.metallic_factor,
            roughness: material.roughness_factor,
            metallic_roughness_texture: material.metallic_roughness_texture.unwrap_or(self.white),
            normal_texture: material.normal_texture.unwrap_or(self.black),
            alpha_cutoff: material.effective_alpha_cutoff(),
        }
    }
}

fn create_solid_texture(
    device: &mut dyn GraphicsDevice,
    label: &'static str,
    color: Vec4,
) -> Result<TextureId, ResourceError> {
    let descriptor = TextureDescriptor::new_2d(label, 1, 1, TextureFormat::Rgba8Unorm)
        .with_filter(FilterMode::Nearest);
    let texture = device.create_texture(&descriptor)?;
    device.write_texture(texture, 0, &[color])?;
    Ok(texture)
}

/// Builds the camera uniforms of `camera`.
pub fn camera_uniforms(camera: &Camera) -> CameraUniforms {
    let view_projection = camera.view_projection();
    CameraUniforms {
        view_projection,
        inverse_view_projection: view_projection.inverse(),
        eye: camera.eye,
        near: camera.z_near,
        far: camera.z_far,
    }
}

/// Builds the full parameter set of a light entity.
///
/// Shadow parameters are included only while the light casts shadows and
/// owns shadow resources.
pub fn light_uniforms(entity: &Entity, light: &LightEntity) -> LightUniforms {
    let (light_type, cone_cos, cone_exp) = match light.kind {
        LightKind::Point => (LightType::Point, -1.0, 0.0),
        LightKind::Spot {
            cone_angle,
            cone_exp,
        } => (LightType::Spot, cone_angle.to_radians().cos(), cone_exp),
        LightKind::Directional { .. } => (LightType::Directional, -1.0, 0.0),
    };

    let shadow = match (&light.shadow, light.cast_shadows) {
        (Some(resources), true) => resources.target.depth.map(|map| ShadowUniforms {
            map,
            view_projection: resources.camera.view_projection(),
            bias: light.shadow_bias,
        }),
        _ => None,
    };

    LightUniforms {
        light_type,
        color: light.color,
        intensity: light.intensity,
        position: entity.position(),
        direction: entity.forward(),
        max_distance: light.max_distance,
        cone_cos,
        cone_exp,
        shadow,
    }
}
