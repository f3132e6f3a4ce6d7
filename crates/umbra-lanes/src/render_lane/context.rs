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

//! Per-view rendering context.

use umbra_core::math::Vec4;
use umbra_core::renderer::{
    CameraUniforms, DrawCall, GraphicsDevice, RenderError, RenderTarget, Viewport,
};
use umbra_data::Camera;

use super::resources::camera_uniforms;

/// Why a view is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// A frame for display: full pipeline, post-processing, overlays.
    #[default]
    Display,
    /// A probe or reflection capture: forward only, no post-processing and no
    /// sampling of the probes being captured.
    Capture,
}

/// Counters accumulated while rendering a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    /// Draw calls submitted to the device.
    pub draw_calls: u32,
    /// Draw items that survived culling.
    pub visible_items: u32,
    /// Visible lights.
    pub lights: u32,
    /// Shadow maps rendered.
    pub shadow_maps: u32,
    /// Decals composited.
    pub decals: u32,
}

/// Explicit rendering state for one view: the device, the active camera and
/// the render mode.
///
/// Render targets are only ever bound through [`FrameContext::with_target`],
/// which guarantees bind/unbind nesting even when the scoped work fails.
pub struct FrameContext<'a> {
    device: &'a mut dyn GraphicsDevice,
    camera: Camera,
    mode: RenderMode,
    /// Counters for this view.
    pub stats: FrameStats,
}

impl<'a> FrameContext<'a> {
    /// Creates a context rendering from `camera`.
    pub fn new(device: &'a mut dyn GraphicsDevice, camera: Camera, mode: RenderMode) -> Self {
        Self {
            device,
            camera,
            mode,
            stats: FrameStats::default(),
        }
    }

    /// The device.
    pub fn device(&mut self) -> &mut dyn GraphicsDevice {
        &mut *self.device
    }

    /// The active camera.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Uniforms of the active camera.
    pub fn camera_uniforms(&self) -> CameraUniforms {
        camera_uniforms(&self.camera)
    }

    /// The render mode.
    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    /// Binds `target`, runs `f`, then unbinds `target`.
    ///
    /// The target is unbound even when `f` fails; the first error wins.
    pub fn with_target<T>(
        &mut self,
        target: &RenderTarget,
        f: impl FnOnce(&mut Self) -> Result<T, RenderError>,
    ) -> Result<T, RenderError> {
        self.device.bind_render_target(target.id)?;
        let result = f(self);
        let unbind = self.device.unbind_render_target(target.id);
        let value = result?;
        unbind?;
        Ok(value)
    }

    /// Makes `camera` active while `f` runs, then restores the previous one.
    pub fn with_camera<T>(&mut self, camera: Camera, f: impl FnOnce(&mut Self) -> T) -> T {
        let previous = std::mem::replace(&mut self.camera, camera);
        let result = f(self);
        self.camera = previous;
        result
    }

    /// Clears the current output.
    pub fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) {
        self.device.clear(color, depth);
    }

    /// Restricts drawing to part of the current output.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.device.set_viewport(viewport);
    }

    /// Submits a draw.
    pub fn draw(&mut self, call: DrawCall) -> Result<(), RenderError> {
        self.stats.draw_calls += 1;
        self.device.draw(&call)
    }

    /// Logs and drops the errors the device recorded since the last check.
    /// Returns how many there were.
    pub fn check_device_errors(&mut self, stage: &str) -> usize {
        let errors = self.device.take_errors();
        for error in &errors {
            log::error!("{}: device error: {}", stage, error);
        }
        errors.len()
    }
}
