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

//! Rendering of a single view through the lanes.

use crate::settings::{PipelineKind, RendererSettings};
use umbra_core::lane::Lane;
use umbra_core::math::Vec4;
use umbra_core::renderer::{
    GraphicsDevice, LightUniforms, RenderError, RenderTarget, SurfaceUniforms, TextureId,
};
use umbra_data::Scene;
use umbra_lanes::{
    DebugOverlayLane, DecalLane, DrawList, ExtractLane, FrameContext, FrameTargets, GBufferLane,
    IrradianceLane, LightingLane, PostProcessLane, ReflectionLane, RenderMode, ShadowPassLane,
    SharedResources, SsaoLane,
};

/// Where a view's lit image goes.
pub(crate) enum ViewOutput<'a> {
    /// A displayed frame: the full pipeline renders into the illumination
    /// target of `targets`.
    Frame {
        targets: &'a FrameTargets,
        pipeline: PipelineKind,
    },
    /// A probe or reflection capture: forward shading straight into `target`.
    Capture(&'a RenderTarget),
}

/// Every lane of the renderer plus the draw list they share.
#[derive(Debug)]
pub(crate) struct LaneSet {
    pub(crate) extract: ExtractLane,
    pub(crate) shadows: ShadowPassLane,
    pub(crate) gbuffer: GBufferLane,
    pub(crate) decals: DecalLane,
    pub(crate) ssao: SsaoLane,
    pub(crate) lighting: LightingLane,
    pub(crate) irradiance: IrradianceLane,
    pub(crate) reflections: ReflectionLane,
    pub(crate) post: PostProcessLane,
    pub(crate) debug: DebugOverlayLane,
    pub(crate) draw_list: DrawList,
}

impl LaneSet {
    pub(crate) fn new(settings: &RendererSettings) -> Self {
        let lanes = Self {
            extract: ExtractLane::new(),
            shadows: ShadowPassLane::new(settings.shadows.map_size),
            gbuffer: GBufferLane::new(),
            decals: DecalLane::new(),
            ssao: SsaoLane::new(settings.ssao),
            lighting: LightingLane::new(settings.lighting),
            irradiance: IrradianceLane::new(),
            reflections: ReflectionLane::new(settings.reflections.probe_size),
            post: PostProcessLane::new(settings.post),
            debug: DebugOverlayLane::new(settings.debug),
            draw_list: DrawList::default(),
        };
        for lane in lanes.all() {
            log::debug!(
                "RenderAgent: lane '{}' ({})",
                lane.strategy_name(),
                lane.lane_kind()
            );
        }
        lanes
    }

    fn all(&self) -> [&dyn Lane; 10] {
        [
            &self.extract,
            &self.shadows,
            &self.gbuffer,
            &self.decals,
            &self.ssao,
            &self.lighting,
            &self.irradiance,
            &self.reflections,
            &self.post,
            &self.debug,
        ]
    }

    /// Releases the GPU resources every lane holds.
    pub(crate) fn shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        let lanes: [&mut dyn Lane; 10] = [
            &mut self.extract,
            &mut self.shadows,
            &mut self.gbuffer,
            &mut self.decals,
            &mut self.ssao,
            &mut self.lighting,
            &mut self.irradiance,
            &mut self.reflections,
            &mut self.post,
            &mut self.debug,
        ];
        for lane in lanes {
            lane.on_shutdown(device);
        }
    }

    /// Pushes the current tunables into the lanes.
    pub(crate) fn configure(&mut self, settings: &RendererSettings) {
        self.shadows.map_size = settings.shadows.map_size;
        self.ssao.configure(settings.ssao);
        self.lighting.mode = settings.lighting;
        self.reflections.size = settings.reflections.probe_size;
        self.post.configure(settings.post);
        self.debug.settings = settings.debug;
    }

    /// Renders the scene from the context's camera into `output`.
    ///
    /// Visibility, shadows and lighting are computed for the view. In capture
    /// mode the irradiance probes are never sampled, so a bake does not read
    /// the probes it is producing. `environment` is the cube map surfaces
    /// reflect.
    pub(crate) fn render_view(
        &mut self,
        ctx: &mut FrameContext<'_>,
        scene: &mut Scene,
        shared: &SharedResources,
        output: ViewOutput<'_>,
        environment: Option<TextureId>,
        reflection_intensity: f32,
    ) -> Result<(), RenderError> {
        let camera = *ctx.camera();
        self.extract.run(scene, &camera, &mut self.draw_list);
        self.draw_list.sort_by_distance();
        ctx.stats.visible_items += self.draw_list.items.len() as u32;

        self.shadows.update_resources(ctx.device(), scene)?;
        self.shadows.render(ctx, scene, &self.draw_list, shared)?;
        ctx.check_device_errors("ShadowPassLane");

        let lights = LightingLane::collect_lights(scene, &self.draw_list);
        ctx.stats.lights += lights.len() as u32;
        let surface = SurfaceUniforms {
            ambient: scene.ambient_light,
            emissive_scale: 1.0,
            environment,
            reflection_intensity,
        };
        let background = scene.background_color.extend(1.0);

        match output {
            ViewOutput::Frame {
                targets,
                pipeline: PipelineKind::Deferred,
            } => {
                self.gbuffer.render(
                    ctx,
                    targets,
                    &self.draw_list,
                    shared,
                    scene.background_color,
                )?;
                self.decals.render(ctx, targets, &self.draw_list, shared)?;
                let ssao = self.ssao.render(ctx, targets, shared.white)?;

                // Blended geometry is depth tested against the opaque pass.
                let depths = (targets.gbuffer.depth, targets.illumination.depth);
                if let (Some(src), Some(dst)) = depths {
                    ctx.device().copy_texture(src, dst)?;
                }
                ctx.with_target(&targets.illumination, |ctx| {
                    ctx.clear(Some(background), None);
                    self.lighting
                        .render_deferred(ctx, targets, &lights, surface, ssao)?;
                    if ctx.mode() == RenderMode::Display {
                        self.irradiance.render(ctx, targets, ssao)?;
                    }
                    for item in self.draw_list.blended_items() {
                        self.lighting
                            .render_forward_item(ctx, item, &lights, surface, shared)?;
                    }
                    Ok(())
                })?;
            }
            ViewOutput::Frame {
                targets,
                pipeline: PipelineKind::Forward,
            } => {
                self.render_forward(
                    ctx,
                    &targets.illumination,
                    background,
                    &lights,
                    surface,
                    shared,
                )?;
            }
            ViewOutput::Capture(target) => {
                self.render_forward(ctx, target, background, &lights, surface, shared)?;
            }
        }
        ctx.check_device_errors("LightingLane");
        Ok(())
    }

    fn render_forward(
        &self,
        ctx: &mut FrameContext<'_>,
        target: &RenderTarget,
        background: Vec4,
        lights: &[LightUniforms],
        surface: SurfaceUniforms,
        shared: &SharedResources,
    ) -> Result<(), RenderError> {
        ctx.with_target(target, |ctx| {
            ctx.clear(Some(background), Some(1.0));
            // Opaque first, then blended back to front.
            for item in self
                .draw_list
                .opaque_items()
                .chain(self.draw_list.blended_items())
            {
                self.lighting
                    .render_forward_item(ctx, item, lights, surface, shared)?;
            }
            Ok(())
        })
    }
}
