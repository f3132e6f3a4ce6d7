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

//! Light accumulation, forward and deferred.
//!
//! Both strategies share one routine, [`LightingLane::plan_passes`], that turns
//! the visible lights into a list of passes. They differ only in how many
//! passes it returns and which blend state each pass uses:
//!
//! - **Multi-pass**: one pass per light. The first pass blends according to
//!   the surface (opaque or alpha) and carries ambient, emissive and
//!   reflection; every following pass is additive with those terms zeroed.
//! - **Single-pass**: one pass with every light packed into fixed-capacity
//!   arrays. Shadows are not available in this layout.

use super::{light_uniforms, DrawItem, DrawList, FrameContext, FrameTargets, SharedResources};
use serde::{Deserialize, Serialize};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::renderer::{
    BlendMode, CompareFunction, CullMode, DeferredLightingProgram, DrawCall, ForwardProgram,
    Geometry, LightArray, LightBlock, LightUniforms, PipelineState, Program, RenderError,
    SurfaceUniforms, TextureId, MAX_LIGHTS,
};
use umbra_data::{AlphaMode, EntityKind, Scene};

/// How lights are accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LightingMode {
    /// One draw per light, blended additively.
    #[default]
    MultiPass,
    /// One draw with all lights in uniform arrays.
    SinglePass,
}

/// One lighting draw: which lights, which per-surface terms, which blend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightPass {
    /// Lights bound for this pass.
    pub lights: LightBlock,
    /// Ambient, emissive and reflection terms.
    pub surface: SurfaceUniforms,
    /// Blend against what is already in the target.
    pub blend: BlendMode,
}

/// Accumulates the contribution of every visible light.
#[derive(Debug, Default)]
pub struct LightingLane {
    /// Active strategy.
    pub mode: LightingMode,
}

impl LightingLane {
    /// Creates a lane using `mode`.
    pub fn new(mode: LightingMode) -> Self {
        Self { mode }
    }

    /// Collects the parameters of every visible light, in scene order.
    pub fn collect_lights(scene: &Scene, draw_list: &DrawList) -> Vec<LightUniforms> {
        draw_list
            .lights
            .iter()
            .filter_map(|&index| {
                let entity = scene.entities.get(index)?;
                match &entity.kind {
                    EntityKind::Light(light) => Some(light_uniforms(entity, light)),
                    _ => None,
                }
            })
            .collect()
    }

    /// Plans the passes needed to light a surface.
    ///
    /// `base_blend` is the blend of the first pass, chosen by the caller from
    /// the surface's alpha mode.
    pub fn plan_passes(
        &self,
        lights: &[LightUniforms],
        surface: SurfaceUniforms,
        base_blend: BlendMode,
    ) -> Vec<LightPass> {
        match self.mode {
            LightingMode::MultiPass => {
                if lights.is_empty() {
                    return vec![LightPass {
                        lights: LightBlock::Single(None),
                        surface,
                        blend: base_blend,
                    }];
                }
                lights
                    .iter()
                    .enumerate()
                    .map(|(i, light)| {
                        if i == 0 {
                            LightPass {
                                lights: LightBlock::Single(Some(*light)),
                                surface,
                                blend: base_blend,
                            }
                        } else {
                            LightPass {
                                lights: LightBlock::Single(Some(*light)),
                                surface: SurfaceUniforms::additive(),
                                blend: BlendMode::Additive,
                            }
                        }
                    })
                    .collect()
            }
            LightingMode::SinglePass => {
                let mut array = LightArray::default();
                for light in lights {
                    if !array.push(light) {
                        log::warn!(
                            "LightingLane: {} lights visible, single-pass keeps the first {}",
                            lights.len(),
                            MAX_LIGHTS
                        );
                        break;
                    }
                }
                vec![LightPass {
                    lights: LightBlock::Array(array),
                    surface,
                    blend: base_blend,
                }]
            }
        }
    }

    /// Blend of the first pass for a material's alpha mode.
    pub fn base_blend(alpha_mode: AlphaMode) -> BlendMode {
        match alpha_mode {
            AlphaMode::Opaque | AlphaMode::Mask => BlendMode::Disabled,
            AlphaMode::Blend => BlendMode::Alpha,
        }
    }

    /// Draws one mesh with forward shading into the bound target.
    pub fn render_forward_item(
        &self,
        ctx: &mut FrameContext<'_>,
        item: &DrawItem,
        lights: &[LightUniforms],
        surface: SurfaceUniforms,
        shared: &SharedResources,
    ) -> Result<(), RenderError> {
        let material = &item.material;
        let cull = if material.two_sided {
            CullMode::None
        } else {
            CullMode::Back
        };
        let camera = ctx.camera_uniforms();
        let material_uniforms = shared.material_uniforms(material);
        let base_blend = Self::base_blend(material.alpha_mode);

        for pass in self.plan_passes(lights, surface, base_blend) {
            let state = PipelineState {
                blend: pass.blend,
                // Later passes hit exactly the depth written by the first one.
                depth_compare: CompareFunction::LessEqual,
                depth_write: !material.is_blended(),
                cull,
                ..PipelineState::default()
            };
            ctx.draw(DrawCall {
                geometry: Geometry::Mesh {
                    mesh: item.mesh.id,
                    model: item.model,
                },
                program: Program::Forward(ForwardProgram {
                    camera,
                    material: material_uniforms,
                    surface: pass.surface,
                    lights: pass.lights,
                }),
                state,
            })?;
        }
        Ok(())
    }

    /// Draws full-screen lighting passes from the G-buffer into the bound
    /// target. Pixels without geometry keep their cleared color.
    pub fn render_deferred(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        lights: &[LightUniforms],
        surface: SurfaceUniforms,
        ssao: TextureId,
    ) -> Result<(), RenderError> {
        let gbuffer = &targets.gbuffer;
        let depth = gbuffer
            .depth
            .ok_or_else(|| RenderError::Internal("gbuffer has no depth attachment".into()))?;
        let camera = ctx.camera_uniforms();

        for pass in self.plan_passes(lights, surface, BlendMode::Disabled) {
            ctx.draw(DrawCall {
                geometry: Geometry::FullscreenQuad,
                program: Program::DeferredLighting(DeferredLightingProgram {
                    camera,
                    gbuffer: [gbuffer.color(0), gbuffer.color(1), gbuffer.color(2)],
                    depth,
                    ssao,
                    surface: pass.surface,
                    lights: pass.lights,
                }),
                state: PipelineState::fullscreen().with_blend(pass.blend),
            })?;
        }
        ctx.check_device_errors("LightingLane");
        Ok(())
    }
}

impl Lane for LightingLane {
    fn strategy_name(&self) -> &'static str {
        match self.mode {
            LightingMode::MultiPass => "MultiPassLighting",
            LightingMode::SinglePass => "SinglePassLighting",
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Lighting
    }
}
