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

//! Shadow pass lane implementation - handles depth rendering for shadows.

use super::{DrawList, FrameContext, SharedResources};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::renderer::{
    CullMode, DepthProgram, DrawCall, Geometry, GraphicsDevice, PipelineState, Program,
    RenderError, RenderTargetDescriptor, ResourceError,
};
use umbra_core::math::{Mat4, Vec3};
use umbra_data::{Camera, EntityKind, LightEntity, LightKind, Scene, ShadowResources};

/// Default side of a shadow map, in texels.
pub const DEFAULT_SHADOW_MAP_SIZE: u32 = 1024;

/// A rendering lane dedicated to producing shadow maps.
///
/// It owns the lifecycle of every light's [`ShadowResources`] and renders the
/// opaque part of the draw list from each shadow-casting light into its
/// depth-only target.
#[derive(Debug)]
pub struct ShadowPassLane {
    /// Side of newly allocated shadow maps.
    pub map_size: u32,
}

impl Default for ShadowPassLane {
    fn default() -> Self {
        Self {
            map_size: DEFAULT_SHADOW_MAP_SIZE,
        }
    }
}

impl ShadowPassLane {
    /// Creates a new `ShadowPassLane` rendering maps of `map_size` texels.
    pub fn new(map_size: u32) -> Self {
        Self { map_size }
    }

    /// Allocates shadow resources for lights that start casting shadows and
    /// frees them for lights that stop. Maps of a stale size are recreated.
    pub fn update_resources(
        &self,
        device: &mut dyn GraphicsDevice,
        scene: &mut Scene,
    ) -> Result<(), ResourceError> {
        for entity in scene.entities.iter_mut() {
            let EntityKind::Light(light) = &mut entity.kind else {
                continue;
            };

            let stale = light
                .shadow
                .as_ref()
                .is_some_and(|s| s.target.width != self.map_size);
            if stale || !light.wants_shadow_map() {
                if let Some(resources) = light.shadow.take() {
                    device.destroy_render_target(resources.target.id)?;
                    log::debug!("ShadowPassLane: freed shadow map of '{}'", entity.name);
                }
            }

            if light.wants_shadow_map() && light.shadow.is_none() {
                let target = device.create_render_target(&RenderTargetDescriptor::depth_only(
                    format!("shadow_{}", entity.name),
                    self.map_size,
                ))?;
                log::info!(
                    "ShadowPassLane: allocated {}x{} shadow map for '{}'",
                    self.map_size,
                    self.map_size,
                    entity.name
                );
                light.shadow = Some(ShadowResources {
                    target,
                    camera: Camera::default(),
                });
            }
        }
        Ok(())
    }

    /// Computes the camera a light renders its shadow map from.
    ///
    /// Spot lights use a perspective camera covering their cone. Directional
    /// lights use an orthographic camera of `area_size` centered on the view
    /// camera's eye, pulled back against the light direction by half the
    /// light's range. Point lights have no shadow camera.
    pub fn light_camera(model: &Mat4, light: &LightEntity, view_camera: &Camera) -> Option<Camera> {
        let position = model.w_axis.truncate();
        let forward = model.transform_vector3(Vec3::Z).normalize_or(Vec3::Z);
        let up = model.transform_vector3(Vec3::Y).normalize_or(Vec3::Y);
        match light.kind {
            LightKind::Point => None,
            LightKind::Spot { cone_angle, .. } => {
                let fov = (cone_angle * 2.0).to_radians();
                Some(
                    Camera::new_perspective(fov, 1.0, 0.1, light.max_distance)
                        .look_at(position, position + forward, up),
                )
            }
            LightKind::Directional { area_size } => {
                let half = area_size * 0.5;
                let eye = view_camera.eye - forward * light.max_distance * 0.5;
                Some(
                    Camera::new_orthographic(-half, half, -half, half, 0.1, light.max_distance)
                        .look_at(eye, view_camera.eye, up),
                )
            }
        }
    }

    /// Renders the shadow map of every visible shadow-casting light.
    ///
    /// The light camera is stored back into the light's resources so that the
    /// lighting passes can reproject into the map. The context's camera is
    /// restored afterwards. Returns the number of maps rendered.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        scene: &mut Scene,
        draw_list: &DrawList,
        shared: &SharedResources,
    ) -> Result<u32, RenderError> {
        let view_camera = *ctx.camera();
        let mut rendered = 0;

        for &index in &draw_list.lights {
            let Some(entity) = scene.entities.get_mut(index) else {
                continue;
            };
            let model = entity.model;
            let EntityKind::Light(light) = &mut entity.kind else {
                continue;
            };
            if !light.wants_shadow_map() {
                continue;
            }
            let Some(camera) = Self::light_camera(&model, light, &view_camera) else {
                continue;
            };
            let Some(resources) = light.shadow.as_mut() else {
                log::warn!(
                    "ShadowPassLane: light '{}' has no shadow resources",
                    entity.name
                );
                continue;
            };
            resources.camera = camera;
            let target = resources.target.clone();

            ctx.with_target(&target, |ctx| {
                ctx.clear(None, Some(1.0));
                ctx.with_camera(camera, |ctx| render_casters(ctx, draw_list, shared))
            })?;
            rendered += 1;
        }

        ctx.stats.shadow_maps += rendered;
        Ok(rendered)
    }
}

fn render_casters(
    ctx: &mut FrameContext<'_>,
    draw_list: &DrawList,
    shared: &SharedResources,
) -> Result<(), RenderError> {
    let camera = *ctx.camera();
    let frustum = camera.frustum();
    let view_projection = camera.view_projection();

    for item in &draw_list.items {
        // Blended surfaces do not cast shadows.
        if item.material.is_blended() {
            continue;
        }
        if !frustum.intersects_aabb(&item.world_bounds) {
            continue;
        }
        let material = &item.material;
        let cull = if material.two_sided {
            CullMode::None
        } else {
            CullMode::Back
        };
        ctx.draw(DrawCall {
            geometry: Geometry::Mesh {
                mesh: item.mesh.id,
                model: item.model,
            },
            program: Program::Depth(DepthProgram {
                view_projection,
                color_texture: material.color_texture.unwrap_or(shared.white),
                alpha: material.color.w,
                alpha_cutoff: material.effective_alpha_cutoff(),
            }),
            state: PipelineState::depth_only().with_cull(cull),
        })?;
    }
    Ok(())
}

impl Lane for ShadowPassLane {
    fn strategy_name(&self) -> &'static str {
        "ShadowPass"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Shadow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use umbra_core::math::Vec4Swizzles;
    use umbra_data::{look_toward, Entity};

    #[test]
    fn test_spot_camera_covers_cone() {
        let light = LightEntity::new(LightKind::Spot {
            cone_angle: 30.0,
            cone_exp: 1.0,
        });
        let entity = Entity::new("spot", EntityKind::Light(light.clone()))
            .with_model(look_toward(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Z));
        let camera =
            ShadowPassLane::light_camera(&entity.model, &light, &Camera::default()).unwrap();

        assert_eq!(camera.eye, Vec3::new(0.0, 5.0, 0.0));
        assert_relative_eq!(camera.front().y, -1.0, epsilon = 1e-5);
        assert_eq!(camera.z_far, light.max_distance);
        match camera.projection {
            umbra_data::ProjectionType::Perspective { fov_y_radians } => {
                assert_relative_eq!(fov_y_radians, 60f32.to_radians(), epsilon = 1e-5)
            }
            _ => panic!("spot lights use perspective shadow cameras"),
        }
    }

    #[test]
    fn test_directional_camera_follows_view_eye() {
        let mut light = LightEntity::new(LightKind::Directional { area_size: 20.0 });
        light.max_distance = 40.0;
        let entity = Entity::new("sun", EntityKind::Light(light.clone()))
            .with_model(look_toward(Vec3::ZERO, Vec3::NEG_Y, Vec3::Z));
        let view = Camera::default().look_at(Vec3::new(3.0, 1.0, 2.0), Vec3::ZERO, Vec3::Y);
        let camera = ShadowPassLane::light_camera(&entity.model, &light, &view).unwrap();

        assert_relative_eq!(camera.eye.y, 21.0, epsilon = 1e-4);
        assert_eq!(camera.center, view.eye);

        // The view eye sits at the center of the map, halfway through its depth.
        let clip = camera.view_projection() * view.eye.extend(1.0);
        let ndc = clip.xyz() / clip.w;
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-4);
        assert!(ndc.z > 0.4 && ndc.z < 0.6);
    }

    #[test]
    fn test_point_light_has_no_shadow_camera() {
        let light = LightEntity::new(LightKind::Point);
        let entity = Entity::new("point", EntityKind::Light(light.clone()));
        let camera = Camera::default();
        assert!(ShadowPassLane::light_camera(&entity.model, &light, &camera).is_none());
    }
}
