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

//! Defines the RenderAgent, the orchestrator of the rendering pipeline.

use super::view::{LaneSet, ViewOutput};
use crate::settings::{PipelineKind, RendererSettings};
use std::time::Instant;
use umbra_core::math::{Mat4, Vec3, Vec4};
use umbra_core::renderer::{CubeFace, GraphicsDevice, RenderError, RenderTarget, TextureId};
use umbra_data::{Camera, EntityKind, Scene};
use umbra_lanes::{
    capture_camera, project_faces, FrameContext, FrameStats, FrameTargets, IrradianceLane,
    IrradianceProbe, PostFxInputs, RenderMode, SharedResources,
};

/// Far plane of the cameras capturing probes and reflections.
const CAPTURE_FAR_PLANE: f32 = 1000.0;

/// The agent responsible for rendering scenes.
///
/// It owns the graphics device, one instance of every lane and the
/// screen-sized targets, and exposes the three operations of the renderer:
/// drawing a frame, baking irradiance probes and capturing reflection probes.
/// [`RenderAgent::settings`] may be changed between calls; the lanes pick the
/// new values up at the start of the next operation.
pub struct RenderAgent {
    // The device every lane records into.
    device: Box<dyn GraphicsDevice>,
    /// Renderer tunables.
    pub settings: RendererSettings,
    lanes: LaneSet,
    shared: SharedResources,
    // Created on the first frame, recreated when the surface size changes.
    targets: Option<FrameTargets>,
    // Cube map of the most recently updated reflection probe.
    active_reflection: Option<TextureId>,
    previous_view_projection: Option<Mat4>,
    start_time: Instant,
    frame_count: u64,
    last_stats: FrameStats,
}

impl RenderAgent {
    /// Creates an agent rendering with `device`.
    pub fn new(
        mut device: Box<dyn GraphicsDevice>,
        settings: RendererSettings,
    ) -> Result<Self, RenderError> {
        let shared = SharedResources::create(device.as_mut())?;
        let lanes = LaneSet::new(&settings);
        log::info!(
            "RenderAgent: created with {:?} pipeline and {:?} lighting",
            settings.pipeline,
            settings.lighting
        );
        Ok(Self {
            device,
            settings,
            lanes,
            shared,
            targets: None,
            active_reflection: None,
            previous_view_projection: None,
            start_time: Instant::now(),
            frame_count: 0,
            last_stats: FrameStats::default(),
        })
    }

    /// The graphics device.
    pub fn device(&self) -> &dyn GraphicsDevice {
        self.device.as_ref()
    }

    /// The graphics device, mutably. Used to create scene resources.
    pub fn device_mut(&mut self) -> &mut dyn GraphicsDevice {
        self.device.as_mut()
    }

    /// The screen-sized targets of the last frame.
    pub fn frame_targets(&self) -> Option<&FrameTargets> {
        self.targets.as_ref()
    }

    /// The probes of the last bake.
    pub fn irradiance_probes(&self) -> &[IrradianceProbe] {
        self.lanes.irradiance.probes()
    }

    /// The packed coefficients of the last bake.
    pub fn probe_texture(&self) -> Option<TextureId> {
        self.lanes.irradiance.texture()
    }

    /// The cube map surfaces currently reflect, if a probe was captured.
    pub fn active_reflection(&self) -> Option<TextureId> {
        self.active_reflection
    }

    /// Frames rendered so far.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Statistics of the last frame.
    pub fn last_stats(&self) -> FrameStats {
        self.last_stats
    }

    fn ensure_targets(&mut self) -> Result<(), RenderError> {
        let (width, height) = self.device.surface_size();
        if self
            .targets
            .as_ref()
            .is_some_and(|targets| targets.matches(width, height))
        {
            return Ok(());
        }
        if let Some(old) = self.targets.take() {
            old.destroy(self.device.as_mut());
        }
        self.targets = Some(FrameTargets::create(self.device.as_mut(), width, height)?);
        Ok(())
    }

    /// Renders `scene` from `camera` to the device surface.
    ///
    /// Runs visibility, shadows, the configured lighting pipeline, irradiance
    /// probes, blended geometry, the post chain and the enabled debug overlays.
    pub fn render_scene(
        &mut self,
        scene: &mut Scene,
        camera: &Camera,
    ) -> Result<FrameStats, RenderError> {
        self.lanes.configure(&self.settings);
        self.ensure_targets()?;
        let targets = self
            .targets
            .as_ref()
            .ok_or_else(|| RenderError::Internal("frame targets were not created".into()))?;

        let environment = self.active_reflection.or(scene.environment);
        let view_projection = camera.view_projection();
        let inputs = PostFxInputs {
            source: targets.illumination.color(0),
            depth: targets.illumination.depth.ok_or_else(|| {
                RenderError::Internal("illumination target has no depth attachment".into())
            })?,
            previous_view_projection: self.previous_view_projection.unwrap_or(view_projection),
            time: self.start_time.elapsed().as_secs_f32(),
        };
        let pipeline = self.settings.pipeline;

        let mut ctx = FrameContext::new(self.device.as_mut(), *camera, RenderMode::Display);
        self.lanes.render_view(
            &mut ctx,
            scene,
            &self.shared,
            ViewOutput::Frame { targets, pipeline },
            environment,
            self.settings.reflections.intensity,
        )?;
        self.lanes.post.render(&mut ctx, targets, &inputs)?;

        let buffers = (pipeline == PipelineKind::Deferred).then_some(targets);
        let probes = self.lanes.irradiance.texture();
        self.lanes.debug.render(&mut ctx, scene, buffers, probes)?;
        ctx.check_device_errors("RenderAgent");
        let stats = ctx.stats;

        self.previous_view_projection = Some(view_projection);
        self.frame_count += 1;
        self.last_stats = stats;
        log::trace!(
            "RenderAgent: frame {} ({} draws, {} items, {} lights)",
            self.frame_count,
            stats.draw_calls,
            stats.visible_items,
            stats.lights
        );
        Ok(stats)
    }

    /// Renders one capture view into `target`.
    fn capture_view(
        &mut self,
        scene: &mut Scene,
        camera: Camera,
        target: &RenderTarget,
        environment: Option<TextureId>,
    ) -> Result<(), RenderError> {
        let mut ctx = FrameContext::new(self.device.as_mut(), camera, RenderMode::Capture);
        self.lanes.render_view(
            &mut ctx,
            scene,
            &self.shared,
            ViewOutput::Capture(target),
            environment,
            self.settings.reflections.intensity,
        )
    }

    /// Bakes the irradiance probe grid of [`RendererSettings::probes`].
    ///
    /// Each probe renders the six faces of a cube around it with the forward
    /// pipeline, projects them onto spherical harmonics and the whole grid is
    /// uploaded once every probe is done. A previous bake stays active if
    /// this one fails.
    pub fn generate_probes(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.lanes.configure(&self.settings);
        let grid = self.settings.probes;
        let mut probes = IrradianceLane::build_probes(&grid)?;
        let capture =
            IrradianceLane::create_capture_target(self.device.as_mut(), grid.capture_size)?;
        log::info!(
            "RenderAgent: baking {} irradiance probes ({}x{}x{})",
            probes.len(),
            grid.dim.x,
            grid.dim.y,
            grid.dim.z
        );

        let result = self.bake_probes(scene, &mut probes, &capture, grid.capture_size);
        if let Err(e) = self.device.destroy_render_target(capture.id) {
            log::warn!("RenderAgent: failed to destroy probe capture target: {}", e);
        }
        result?;

        self.lanes
            .irradiance
            .upload(self.device.as_mut(), grid, probes)?;
        Ok(())
    }

    fn bake_probes(
        &mut self,
        scene: &mut Scene,
        probes: &mut [IrradianceProbe],
        capture: &RenderTarget,
        size: u32,
    ) -> Result<(), RenderError> {
        let environment = scene.environment;
        let total = probes.len();
        for (i, probe) in probes.iter_mut().enumerate() {
            let mut faces: [Vec<Vec4>; 6] = Default::default();
            for face in CubeFace::ALL {
                let camera = capture_camera(probe.position, face, CAPTURE_FAR_PLANE);
                self.capture_view(scene, camera, capture, environment)?;
                faces[face.layer() as usize] = self.device.read_texture(capture.color(0), 0)?;
            }
            probe.sh = project_faces(&faces, size)?;
            log::info!(
                "RenderAgent: probe {}/{} baked at {}",
                i + 1,
                total,
                probe.position
            );
        }
        Ok(())
    }

    /// Captures every reflection probe of the scene into its cube map.
    ///
    /// Cube maps are allocated on first capture and reallocated when
    /// [`ReflectionSettings::probe_size`](umbra_lanes::ReflectionSettings)
    /// changes. Captures reflect the scene's default environment. The last
    /// probe captured becomes the environment of displayed frames.
    pub fn update_reflection_probes(&mut self, scene: &mut Scene) -> Result<(), RenderError> {
        self.lanes.configure(&self.settings);
        let probes: Vec<usize> = scene
            .entities
            .iter()
            .enumerate()
            .filter(|(_, entity)| matches!(entity.kind, EntityKind::ReflectionProbe(_)))
            .map(|(index, _)| index)
            .collect();
        if probes.is_empty() {
            log::debug!("RenderAgent: no reflection probes to update");
            return Ok(());
        }

        let capture = self
            .lanes
            .reflections
            .create_capture_target(self.device.as_mut())?;
        let result = self.capture_reflections(scene, &probes, &capture);
        if let Err(e) = self.device.destroy_render_target(capture.id) {
            log::warn!(
                "RenderAgent: failed to destroy reflection capture target: {}",
                e
            );
        }
        result
    }

    fn capture_reflections(
        &mut self,
        scene: &mut Scene,
        probes: &[usize],
        capture: &RenderTarget,
    ) -> Result<(), RenderError> {
        let environment = scene.environment;
        let size = self.lanes.reflections.size;
        for &index in probes {
            let Some((position, cube)) = self.prepare_reflection_probe(scene, index, size)? else {
                continue;
            };
            for face in CubeFace::ALL {
                let camera = capture_camera(position, face, CAPTURE_FAR_PLANE);
                self.capture_view(scene, camera, capture, environment)?;
                self.lanes
                    .reflections
                    .store_face(self.device.as_mut(), capture, cube, face)?;
            }
            self.lanes.reflections.finish(self.device.as_mut(), cube)?;
            self.active_reflection = Some(cube);
            log::info!(
                "RenderAgent: reflection probe '{}' updated",
                scene.entities[index].name
            );
        }
        Ok(())
    }

    /// Returns the position and cube map of the probe at `index`, allocating
    /// the cube map if it is missing or of a stale size.
    fn prepare_reflection_probe(
        &mut self,
        scene: &mut Scene,
        index: usize,
        size: u32,
    ) -> Result<Option<(Vec3, TextureId)>, RenderError> {
        let Some(entity) = scene.entities.get_mut(index) else {
            return Ok(None);
        };
        let position = entity.position();
        let EntityKind::ReflectionProbe(probe) = &mut entity.kind else {
            return Ok(None);
        };
        if let Some(texture) = probe.texture {
            if self.device.texture_descriptor(texture)?.width != size {
                self.device.destroy_texture(texture)?;
                if self.active_reflection == Some(texture) {
                    self.active_reflection = None;
                }
                probe.texture = None;
            }
        }
        let cube = self
            .lanes
            .reflections
            .ensure_texture(self.device.as_mut(), &entity.name, probe)?;
        Ok(Some((position, cube)))
    }
}

impl Drop for RenderAgent {
    fn drop(&mut self) {
        self.lanes.shutdown(self.device.as_mut());
        if let Some(targets) = self.targets.take() {
            targets.destroy(self.device.as_mut());
        }
        self.shared.destroy(self.device.as_mut());
        log::debug!("RenderAgent: released after {} frames", self.frame_count);
    }
}
