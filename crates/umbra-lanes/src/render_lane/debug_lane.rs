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

//! Debug overlays drawn on top of the final image.

use super::{FrameContext, FrameTargets};
use serde::{Deserialize, Serialize};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::renderer::{
    DepthViewProgram, DrawCall, Geometry, PipelineState, Program, RenderError, TextureId,
    Viewport,
};
use umbra_data::{EntityKind, LightKind, Scene};

/// Largest side of a shadow map thumbnail, in pixels.
const SHADOW_THUMBNAIL_SIZE: u32 = 256;

/// Pixels per texel of the probe texture overlay.
const PROBE_TEXEL_SCALE: u32 = 8;

/// Which overlays are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugSettings {
    /// Shadow map thumbnails along the bottom edge.
    pub show_shadowmaps: bool,
    /// Albedo, normals, emissive and depth in four quadrants.
    pub show_gbuffers: bool,
    /// The occlusion buffer over the whole screen.
    pub show_ssao: bool,
    /// The packed irradiance coefficients in the top-left corner.
    pub show_probe_texture: bool,
}

impl DebugSettings {
    /// Returns `true` if any overlay is enabled.
    pub fn any(&self) -> bool {
        self.show_shadowmaps || self.show_gbuffers || self.show_ssao || self.show_probe_texture
    }
}

/// Draws the enabled overlays straight to the surface.
#[derive(Debug, Default)]
pub struct DebugOverlayLane {
    /// Enabled overlays.
    pub settings: DebugSettings,
}

impl DebugOverlayLane {
    /// Creates a lane drawing the overlays of `settings`.
    pub fn new(settings: DebugSettings) -> Self {
        Self { settings }
    }

    /// Draws the overlays. `targets` is `None` in the forward pipeline, where
    /// G-buffer and occlusion views are unavailable.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        scene: &Scene,
        targets: Option<&FrameTargets>,
        probes: Option<TextureId>,
    ) -> Result<(), RenderError> {
        if !self.settings.any() {
            return Ok(());
        }
        let (width, height) = ctx.device().surface_size();

        if let Some(targets) = targets {
            if self.settings.show_ssao {
                ctx.set_viewport(Viewport::full(width, height));
                blit(ctx, targets.ssao.color(0), true)?;
            }
            if self.settings.show_gbuffers {
                self.render_gbuffers(ctx, targets, width, height)?;
            }
        }
        if self.settings.show_shadowmaps {
            self.render_shadow_maps(ctx, scene, width, height)?;
        }
        if self.settings.show_probe_texture {
            if let Some(probes) = probes {
                let descriptor = ctx.device().texture_descriptor(probes)?;
                ctx.set_viewport(Viewport {
                    x: 0,
                    y: 0,
                    width: (descriptor.width * PROBE_TEXEL_SCALE).min(width),
                    height: (descriptor.height * PROBE_TEXEL_SCALE).min(height),
                });
                blit(ctx, probes, false)?;
            }
        }

        ctx.set_viewport(Viewport::full(width, height));
        Ok(())
    }

    fn render_gbuffers(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let (half_w, half_h) = (width / 2, height / 2);
        let quadrant = |i: u32| Viewport {
            x: (i % 2) * half_w,
            y: (i / 2) * half_h,
            width: half_w,
            height: half_h,
        };
        for i in 0..3 {
            ctx.set_viewport(quadrant(i));
            blit(ctx, targets.gbuffer.color(i as usize), false)?;
        }
        if let Some(depth) = targets.gbuffer.depth {
            let camera = ctx.camera_uniforms();
            ctx.set_viewport(quadrant(3));
            ctx.draw(DrawCall {
                geometry: Geometry::FullscreenQuad,
                program: Program::DepthView(DepthViewProgram {
                    depth,
                    near: camera.near,
                    far: camera.far,
                    linearize: true,
                }),
                state: PipelineState::fullscreen(),
            })?;
        }
        Ok(())
    }

    fn render_shadow_maps(
        &self,
        ctx: &mut FrameContext<'_>,
        scene: &Scene,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let size = SHADOW_THUMBNAIL_SIZE.min(height / 4).max(1);
        let maps = scene.entities.iter().filter_map(|entity| match &entity.kind {
            EntityKind::Light(light) if light.cast_shadows => {
                light.shadow.as_ref().map(|shadow| (light, shadow))
            }
            _ => None,
        });

        for (slot, (light, shadow)) in maps.enumerate() {
            let offset = (slot as u32 + 1) * size;
            if offset > width {
                break;
            }
            let Some(depth) = shadow.target.depth else {
                continue;
            };
            ctx.set_viewport(Viewport {
                x: width - offset,
                y: height.saturating_sub(size),
                width: size,
                height: size,
            });
            ctx.draw(DrawCall {
                geometry: Geometry::FullscreenQuad,
                program: Program::DepthView(DepthViewProgram {
                    depth,
                    near: shadow.camera.z_near,
                    far: shadow.camera.z_far,
                    // Orthographic depth is already linear.
                    linearize: matches!(light.kind, LightKind::Spot { .. }),
                }),
                state: PipelineState::fullscreen(),
            })?;
        }
        Ok(())
    }
}

fn blit(ctx: &mut FrameContext<'_>, source: TextureId, grayscale: bool) -> Result<(), RenderError> {
    ctx.draw(DrawCall {
        geometry: Geometry::FullscreenQuad,
        program: Program::Copy { source, grayscale },
        state: PipelineState::fullscreen(),
    })
}

impl Lane for DebugOverlayLane {
    fn strategy_name(&self) -> &'static str {
        "DebugOverlay"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Debug
    }
}
