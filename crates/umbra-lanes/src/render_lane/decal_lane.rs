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

//! Decal compositing into the G-buffer.

use super::{DrawList, FrameContext, FrameTargets, SharedResources};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::renderer::{
    BlendMode, ColorWrites, CompareFunction, CullMode, DecalProgram, DrawCall, Geometry,
    PipelineState, Program, RenderError,
};

/// Projects decal textures into the G-buffer.
///
/// Each decal is a unit cube in its own local space. Before drawing it the
/// G-buffer is copied into a scratch target, because the decal program reads
/// scene depth and normals while writing the G-buffer. Only RGB is written, so
/// roughness and metallic stored in alpha survive.
#[derive(Debug, Default)]
pub struct DecalLane;

impl DecalLane {
    /// Creates a new `DecalLane`.
    pub fn new() -> Self {
        Self
    }

    /// Composites every textured decal of the draw list. Returns the number of
    /// decals drawn.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        draw_list: &DrawList,
        shared: &SharedResources,
    ) -> Result<u32, RenderError> {
        let mut drawn = 0;
        for decal in &draw_list.decals {
            let Some(texture) = decal.texture else {
                log::debug!("DecalLane: decal without texture skipped");
                continue;
            };

            copy_gbuffer_to_scratch(ctx, targets)?;

            let scratch = &targets.decal_scratch;
            let program = DecalProgram {
                camera: ctx.camera_uniforms(),
                inverse_model: decal.model.inverse(),
                scene_depth: scratch.depth.ok_or_else(|| {
                    RenderError::Internal("decal scratch target has no depth".into())
                })?,
                scene_normal: scratch.color(1),
                texture,
            };
            let state = PipelineState {
                blend: BlendMode::Alpha,
                depth_compare: CompareFunction::Always,
                depth_write: false,
                // Back faces stay visible when the camera is inside the box.
                cull: CullMode::Front,
                color_writes: ColorWrites::Rgb,
            };

            ctx.with_target(&targets.gbuffer, |ctx| {
                ctx.draw(DrawCall {
                    geometry: Geometry::Mesh {
                        mesh: shared.cube,
                        model: decal.model,
                    },
                    program: Program::Decal(program),
                    state,
                })
            })?;
            drawn += 1;
        }
        ctx.stats.decals += drawn;
        Ok(drawn)
    }
}

fn copy_gbuffer_to_scratch(
    ctx: &mut FrameContext<'_>,
    targets: &FrameTargets,
) -> Result<(), RenderError> {
    let source = &targets.gbuffer;
    let scratch = &targets.decal_scratch;
    let device = ctx.device();
    for (src, dst) in source.color.iter().zip(&scratch.color) {
        device.copy_texture(*src, *dst)?;
    }
    if let (Some(src), Some(dst)) = (source.depth, scratch.depth) {
        device.copy_texture(src, dst)?;
    }
    Ok(())
}

impl Lane for DecalLane {
    fn strategy_name(&self) -> &'static str {
        "Decal"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Geometry
    }
}
