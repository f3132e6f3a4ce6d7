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

//! Spherical-harmonics irradiance probes: grid layout, SH projection of
//! captured faces, packing, and the full-screen sampling pass.

use super::{FrameContext, FrameTargets};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::{SphericalHarmonics9, UVec3, Vec2, Vec3, Vec4, SH_COEFFICIENTS};
use umbra_core::renderer::{
    BlendMode, CubeFace, DrawCall, FilterMode, Geometry, GraphicsDevice, IrradianceProgram,
    PipelineState, ProbeGridUniforms, Program, RenderError, RenderTarget, RenderTargetDescriptor,
    ResourceError, TextureDescriptor, TextureFormat, TextureId,
};

/// Errors raised while baking irradiance probes.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The grid has no probes.
    #[error("probe grid {0} has no probes")]
    EmptyGrid(UVec3),
    /// A captured face does not have `size * size` texels.
    #[error("captured face has {actual} texels, expected {expected}")]
    CaptureSize {
        /// Texel count of a face of the configured capture size.
        expected: usize,
        /// Texel count received.
        actual: usize,
    },
    /// Rendering a capture failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// A probe resource could not be created or read.
    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl From<ProbeError> for RenderError {
    fn from(err: ProbeError) -> Self {
        match err {
            ProbeError::Render(e) => e,
            ProbeError::Resource(e) => RenderError::Resource(e),
            other => RenderError::RenderingFailed(other.to_string()),
        }
    }
}

/// Placement and quality of the irradiance probe grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeGridSettings {
    /// Position of the first probe.
    pub start: Vec3,
    /// Position of the last probe.
    pub end: Vec3,
    /// Probes per axis.
    pub dim: UVec3,
    /// Side of each captured face, in pixels.
    pub capture_size: u32,
    /// Multiplier on the indirect term.
    pub intensity: f32,
}

impl Default for ProbeGridSettings {
    fn default() -> Self {
        Self {
            start: Vec3::new(-10.0, 1.0, -10.0),
            end: Vec3::new(10.0, 5.0, 10.0),
            dim: UVec3::new(4, 2, 4),
            capture_size: 64,
            intensity: 1.0,
        }
    }
}

impl ProbeGridSettings {
    /// The grid as shader uniforms.
    pub fn uniforms(&self) -> ProbeGridUniforms {
        ProbeGridUniforms {
            start: self.start,
            end: self.end,
            dim: self.dim,
        }
    }
}

/// One baked probe.
#[derive(Debug, Clone, PartialEq)]
pub struct IrradianceProbe {
    /// World position.
    pub position: Vec3,
    /// Grid coordinates.
    pub index: UVec3,
    /// Row in the probe texture.
    pub linear_index: usize,
    /// Projected irradiance.
    pub sh: SphericalHarmonics9,
}

/// Solid angle covered by texel `(x, y)` of a cube face of side `size`.
pub fn texel_solid_angle(x: u32, y: u32, size: u32) -> f32 {
    let texel = 2.0 / size as f32;
    let u = (x as f32 + 0.5) * texel - 1.0;
    let v = (y as f32 + 0.5) * texel - 1.0;
    texel * texel / (1.0 + u * u + v * v).powf(1.5)
}

/// Projects six captured cube faces onto SH9.
///
/// `faces` are in [`CubeFace::ALL`] order, each `size * size` texels row-major
/// from the top-left. Every texel is weighted by the solid angle it covers.
pub fn project_faces(faces: &[Vec<Vec4>; 6], size: u32) -> Result<SphericalHarmonics9, ProbeError> {
    let expected = size as usize * size as usize;
    let mut sh = SphericalHarmonics9::ZERO;
    for (face, texels) in CubeFace::ALL.iter().zip(faces) {
        if texels.len() != expected {
            return Err(ProbeError::CaptureSize {
                expected,
                actual: texels.len(),
            });
        }
        for y in 0..size {
            for x in 0..size {
                let uv = Vec2::new(
                    (x as f32 + 0.5) / size as f32,
                    (y as f32 + 0.5) / size as f32,
                );
                let direction = face.direction(uv).normalize();
                let radiance = texels[(y * size + x) as usize].truncate();
                sh.add_sample(direction, radiance, texel_solid_angle(x, y, size));
            }
        }
    }
    Ok(sh)
}

/// Bakes and samples a grid of irradiance probes.
///
/// Capturing is driven by the caller, which owns the pipeline: for every
/// probe of [`IrradianceLane::build_probes`] it renders the six faces from the
/// probe position and hands them to [`project_faces`]. Once all probes are
/// projected, [`IrradianceLane::upload`] packs them and the lane starts adding
/// indirect light in [`IrradianceLane::render`].
#[derive(Debug, Default)]
pub struct IrradianceLane {
    grid: Option<ProbeGridSettings>,
    probes: Vec<IrradianceProbe>,
    texture: Option<TextureId>,
}

impl IrradianceLane {
    /// Creates a lane with nothing baked.
    pub fn new() -> Self {
        Self::default()
    }

    /// Lays out the probes of `grid` in z, y, x order with empty SH.
    pub fn build_probes(grid: &ProbeGridSettings) -> Result<Vec<IrradianceProbe>, ProbeError> {
        let uniforms = grid.uniforms();
        if uniforms.probe_count() == 0 {
            return Err(ProbeError::EmptyGrid(grid.dim));
        }
        let mut probes = Vec::with_capacity(uniforms.probe_count());
        for z in 0..grid.dim.z {
            for y in 0..grid.dim.y {
                for x in 0..grid.dim.x {
                    let index = UVec3::new(x, y, z);
                    probes.push(IrradianceProbe {
                        position: uniforms.position(index),
                        index,
                        linear_index: uniforms.linear_index(index),
                        sh: SphericalHarmonics9::ZERO,
                    });
                }
            }
        }
        Ok(probes)
    }

    /// Creates the target captures are rendered into.
    pub fn create_capture_target(
        device: &mut dyn GraphicsDevice,
        size: u32,
    ) -> Result<RenderTarget, ResourceError> {
        device.create_render_target(&RenderTargetDescriptor::new(
            "probe_capture",
            size,
            size,
            vec![TextureFormat::Rgba32Float],
        ))
    }

    /// Packs `probes` into a `9 x N` texture and makes them the active set,
    /// replacing any previous bake.
    pub fn upload(
        &mut self,
        device: &mut dyn GraphicsDevice,
        grid: ProbeGridSettings,
        probes: Vec<IrradianceProbe>,
    ) -> Result<TextureId, ResourceError> {
        let count = probes.len();
        let descriptor = TextureDescriptor::new_2d(
            "irradiance_probes",
            SH_COEFFICIENTS as u32,
            count as u32,
            TextureFormat::Rgba32Float,
        )
        .with_filter(FilterMode::Nearest);

        let mut texels = vec![Vec4::ZERO; SH_COEFFICIENTS * count];
        for probe in &probes {
            let row = probe.linear_index * SH_COEFFICIENTS;
            for (i, c) in probe.sh.coefficients.iter().enumerate() {
                texels[row + i] = c.extend(1.0);
            }
        }

        let texture = device.create_texture(&descriptor)?;
        device.write_texture(texture, 0, &texels)?;
        self.release(device);
        self.texture = Some(texture);
        self.grid = Some(grid);
        self.probes = probes;
        log::info!("IrradianceLane: {} probes uploaded", count);
        Ok(texture)
    }

    /// Destroys the probe texture.
    pub fn release(&mut self, device: &mut dyn GraphicsDevice) {
        if let Some(texture) = self.texture.take() {
            if let Err(e) = device.destroy_texture(texture) {
                log::warn!("IrradianceLane: failed to destroy probe texture: {}", e);
            }
        }
        self.grid = None;
        self.probes.clear();
    }

    /// Returns `true` once probes have been baked.
    pub fn is_baked(&self) -> bool {
        self.texture.is_some()
    }

    /// The baked probes.
    pub fn probes(&self) -> &[IrradianceProbe] {
        &self.probes
    }

    /// The packed coefficient texture.
    pub fn texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// Adds indirect light from the probes into the bound target.
    /// Does nothing before the first bake.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        ssao: TextureId,
    ) -> Result<(), RenderError> {
        let (Some(probes), Some(grid)) = (self.texture, self.grid) else {
            return Ok(());
        };
        let depth = targets
            .gbuffer
            .depth
            .ok_or_else(|| RenderError::Internal("gbuffer has no depth attachment".into()))?;
        ctx.draw(DrawCall {
            geometry: Geometry::FullscreenQuad,
            program: Program::Irradiance(IrradianceProgram {
                camera: ctx.camera_uniforms(),
                albedo: targets.gbuffer.color(0),
                normal: targets.gbuffer.color(1),
                depth,
                ssao,
                probes,
                grid: grid.uniforms(),
                intensity: grid.intensity,
            }),
            state: PipelineState::fullscreen().with_blend(BlendMode::One),
        })
    }
}

impl Lane for IrradianceLane {
    fn strategy_name(&self) -> &'static str {
        "IrradianceProbes"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::Probe
    }

    fn on_shutdown(&mut self, device: &mut dyn GraphicsDevice) {
        self.release(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_texel_solid_angles_cover_the_sphere() {
        let size = 16;
        let mut total = 0.0;
        for y in 0..size {
            for x in 0..size {
                total += texel_solid_angle(x, y, size);
            }
        }
        assert_relative_eq!(total * 6.0, 4.0 * PI, epsilon = 0.02);
    }

    #[test]
    fn test_uniform_environment_projects_to_constant_irradiance() {
        let size = 16;
        let face = vec![Vec4::new(0.5, 1.0, 2.0, 1.0); (size * size) as usize];
        let faces = [
            face.clone(),
            face.clone(),
            face.clone(),
            face.clone(),
            face.clone(),
            face,
        ];
        let sh = project_faces(&faces, size).unwrap();
        for normal in [Vec3::X, Vec3::NEG_Y, Vec3::new(1.0, 1.0, 1.0).normalize()] {
            let e = sh.irradiance(normal);
            assert_relative_eq!(e.x, 0.5, epsilon = 0.02);
            assert_relative_eq!(e.y, 1.0, epsilon = 0.02);
            assert_relative_eq!(e.z, 2.0, epsilon = 0.04);
        }
    }

    #[test]
    fn test_bright_sky_lights_upward_normals_more() {
        let size = 8;
        let dark = vec![Vec4::ZERO; (size * size) as usize];
        let bright = vec![Vec4::ONE; (size * size) as usize];
        let mut faces = [
            dark.clone(),
            dark.clone(),
            dark.clone(),
            dark.clone(),
            dark.clone(),
            dark,
        ];
        faces[CubeFace::PositiveY.layer() as usize] = bright;
        let sh = project_faces(&faces, size).unwrap();
        let (up, down) = (sh.irradiance(Vec3::Y), sh.irradiance(Vec3::NEG_Y));
        assert!(up.x > down.x + 0.1);
    }

    #[test]
    fn test_wrong_face_size_is_rejected() {
        let faces: [Vec<Vec4>; 6] = Default::default();
        match project_faces(&faces, 4) {
            Err(ProbeError::CaptureSize { expected, actual }) => {
                assert_eq!((expected, actual), (16, 0));
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_build_probes_orders_z_y_x_and_indexes_x_major() {
        let grid = ProbeGridSettings {
            start: Vec3::ZERO,
            end: Vec3::new(2.0, 0.0, 4.0),
            dim: UVec3::new(3, 1, 2),
            ..ProbeGridSettings::default()
        };
        let probes = IrradianceLane::build_probes(&grid).unwrap();
        assert_eq!(probes.len(), 6);
        assert_eq!(probes[1].index, UVec3::new(1, 0, 0));
        assert_eq!(probes[3].index, UVec3::new(0, 0, 1));
        for (i, probe) in probes.iter().enumerate() {
            assert_eq!(probe.linear_index, i);
        }
        assert_eq!(probes[5].position, Vec3::new(2.0, 0.0, 4.0));
    }

    #[test]
    fn test_empty_grid_is_an_error() {
        let grid = ProbeGridSettings {
            dim: UVec3::new(2, 0, 2),
            ..ProbeGridSettings::default()
        };
        assert!(matches!(
            IrradianceLane::build_probes(&grid),
            Err(ProbeError::EmptyGrid(_))
        ));
    }
}
