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

//! Reflection probe cube maps and the cameras that capture them.

use serde::{Deserialize, Serialize};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::Vec3;
use umbra_core::renderer::{
    CubeFace, GraphicsDevice, RenderTarget, RenderTargetDescriptor, ResourceError,
    TextureDescriptor, TextureFormat, TextureId,
};
use umbra_data::{Camera, ReflectionProbeEntity};

/// Tunables of reflection probes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflectionSettings {
    /// Side of each cube face, in texels.
    pub probe_size: u32,
    /// Multiplier on the reflection term.
    pub intensity: f32,
}

impl Default for ReflectionSettings {
    fn default() -> Self {
        Self {
            probe_size: 64,
            intensity: 1.0,
        }
    }
}

/// Returns the camera capturing `face` of a cube map centered on `position`.
pub fn capture_camera(position: Vec3, face: CubeFace, far: f32) -> Camera {
    Camera::new_perspective(90f32.to_radians(), 1.0, 0.1, far).look_at(
        position,
        position + face.forward(),
        face.up(),
    )
}

/// Owns the cube maps of reflection probes.
///
/// The capture itself re-enters the forward pipeline and is driven by the
/// agent: for every face it renders [`capture_camera`] into the target of
/// [`ReflectionLane::create_capture_target`], copies the result into the
/// face, and regenerates mips once all faces are done.
#[derive(Debug)]
pub struct ReflectionLane {
    /// Face size of newly allocated cube maps.
    pub size: u32,
}

impl Default for ReflectionLane {
    fn default() -> Self {
        Self::new(ReflectionSettings::default().probe_size)
    }
}

impl ReflectionLane {
    /// Creates a lane allocating cube maps of `size` texels per face.
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Returns the probe's cube map, allocating it on first use.
    pub fn ensure_texture(
        &self,
        device: &mut dyn GraphicsDevice,
        name: &str,
        probe: &mut ReflectionProbeEntity,
    ) -> Result<TextureId, ResourceError> {
        if let Some(texture) = probe.texture {
            return Ok(texture);
        }
        let texture = device.create_texture(&TextureDescriptor::new_cube(
            format!("reflection_{}", name),
            self.size,
            TextureFormat::Rgba16Float,
        ))?;
        log::info!(
            "ReflectionLane: allocated {}x{} cube map for '{}'",
            self.size,
            self.size,
            name
        );
        probe.texture = Some(texture);
        Ok(texture)
    }

    /// Creates the target faces are rendered into before being copied.
    pub fn create_capture_target(
        &self,
        device: &mut dyn GraphicsDevice,
    ) -> Result<RenderTarget, ResourceError> {
        device.create_render_target(&RenderTargetDescriptor::new(
            "reflection_capture",
            self.size,
            self.size,
            vec![TextureFormat::Rgba16Float],
        ))
    }

    /// Copies a rendered face into the cube map.
    pub fn store_face(
        &self,
        device: &mut dyn GraphicsDevice,
        capture: &RenderTarget,
        cube: TextureId,
        face: CubeFace,
    ) -> Result<(), ResourceError> {
        device.copy_to_cube_face(capture.color(0), cube, face)
    }

    /// Completes a capture once every face is stored.
    pub fn finish(
        &self,
        device: &mut dyn GraphicsDevice,
        cube: TextureId,
    ) -> Result<(), ResourceError> {
        device.generate_mipmaps(cube)
    }
}

impl Lane for ReflectionLane {
    fn strategy_name(&self) -> &'static str {
        "ReflectionProbes"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Probe
    }
}
