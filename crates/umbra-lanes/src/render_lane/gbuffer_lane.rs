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

//! G-buffer fill for the deferred pipeline.

use super::{DrawItem, DrawList, FrameContext, FrameTargets, SharedResources};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::Vec3;
use umbra_core::renderer::{
    CullMode, DrawCall, GBufferProgram, Geometry, PipelineState, Program, RenderError,
};

/// Rasterizes opaque and masked geometry once into the G-buffer.
///
/// Layout: albedo in attachment 0, encoded normal and roughness in attachment 1,
/// emissive and metallic in attachment 2, plus depth. Blended materials are left
/// to the forward pass that runs after lighting.
#[derive(Debug, Default)]
pub struct GBufferLane;

impl GBufferLane {
    /// Creates a new `GBufferLane`.
    pub fn new() -> Self {
        Self
    }

    /// Clears the G-buffer to `background` and fills it from the draw list.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        draw_list: &DrawList,
        shared: &SharedResources,
        background: Vec3,
    ) -> Result<(), RenderError> {
        ctx.with_target(&targets.gbuffer, |ctx| {
            ctx.clear(Some(background.extend(1.0)), Some(1.0));
            for item in draw_list.opaque_items() {
                self.render_item(ctx, item, shared)?;
            }
            Ok(())
        })?;
        ctx.check_device_errors("GBufferLane");
        Ok(())
    }

    fn render_item(
        &self,
        ctx: &mut FrameContext<'_>,
        item: &DrawItem,
        shared: &SharedResources,
    ) -> Result<(), RenderError> {
        let cull = if item.material.two_sided {
            CullMode::None
        } else {
            CullMode::Back
        };
        let program = GBufferProgram {
            camera: ctx.camera_uniforms(),
            material: shared.material_uniforms(&item.material),
        };
        ctx.draw(DrawCall {
            geometry: Geometry::Mesh {
                mesh: item.mesh.id,
                model: item.model,
            },
            program: Program::GBuffer(program),
            state: PipelineState::default().with_cull(cull),
        })
    }
}

impl Lane for GBufferLane {
    fn strategy_name(&self) -> &'static str {
        "GBuffer"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Geometry
    }
}
