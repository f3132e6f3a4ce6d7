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

//! Screen-space ambient occlusion.

use super::{FrameContext, FrameTargets};
use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::sync::Arc;
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::{Vec2, Vec3, Vec4};
use umbra_core::renderer::{
    DrawCall, Geometry, PipelineState, Program, RenderError, SsaoProgram, TextureId,
};

/// Number of points in the occlusion sample kernel.
pub const SSAO_SAMPLE_COUNT: usize = 64;

/// Seed of the sample kernel, fixed so frames are reproducible.
const SSAO_SEED: u64 = 42;

/// Tunables of the SSAO pass.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaoSettings {
    /// Run the pass at all. When disabled, lighting samples a white texture.
    pub enabled: bool,
    /// Use the hemisphere-oriented, range-checked variant.
    pub plus: bool,
    /// Sample radius in world units.
    pub radius: f32,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            plus: false,
            radius: 1.0,
        }
    }
}

/// Generates `count` random points inside a sphere of `radius`.
///
/// Directions are uniform on the sphere; distances follow `cbrt(0.9 u + 0.1)`
/// so points are spread through the volume while avoiding the very center.
/// With `hemisphere`, points are mirrored into `z >= 0`.
pub fn generate_sphere_points(count: usize, radius: f32, hemisphere: bool) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(SSAO_SEED);
    (0..count)
        .map(|_| {
            let u: f32 = rng.random_range(0.0..1.0);
            let v: f32 = rng.random_range(0.0..1.0);
            let theta = u * 2.0 * PI;
            let phi = (2.0 * v - 1.0).acos();
            let r = (rng.random_range(0.0..1.0f32) * 0.9 + 0.1).cbrt() * radius;
            let mut point = Vec3::new(
                r * phi.sin() * theta.cos(),
                r * phi.sin() * theta.sin(),
                r * phi.cos(),
            );
            if hemisphere && point.z < 0.0 {
                point.z = -point.z;
            }
            point
        })
        .collect()
}

/// Computes ambient occlusion from the G-buffer depth and normals into a
/// single channel target.
#[derive(Debug)]
pub struct SsaoLane {
    settings: SsaoSettings,
    samples: Arc<[Vec3]>,
}

impl Default for SsaoLane {
    fn default() -> Self {
        Self::new(SsaoSettings::default())
    }
}

impl SsaoLane {
    /// Creates a lane with a kernel matching `settings`.
    pub fn new(settings: SsaoSettings) -> Self {
        Self {
            settings,
            samples: Self::kernel(&settings),
        }
    }

    fn kernel(settings: &SsaoSettings) -> Arc<[Vec3]> {
        generate_sphere_points(SSAO_SAMPLE_COUNT, settings.radius, settings.plus).into()
    }

    /// Current settings.
    pub fn settings(&self) -> &SsaoSettings {
        &self.settings
    }

    /// Applies new settings, regenerating the kernel when its shape changes.
    pub fn configure(&mut self, settings: SsaoSettings) {
        if settings.radius != self.settings.radius || settings.plus != self.settings.plus {
            self.samples = Self::kernel(&settings);
        }
        self.settings = settings;
    }

    /// The sample kernel.
    pub fn samples(&self) -> &[Vec3] {
        &self.samples
    }

    /// Renders occlusion into `targets.ssao` and returns the texture lighting
    /// should sample: the occlusion texture, or `white` when disabled.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        white: TextureId,
    ) -> Result<TextureId, RenderError> {
        if !self.settings.enabled {
            return Ok(white);
        }
        let depth = targets
            .gbuffer
            .depth
            .ok_or_else(|| RenderError::Internal("gbuffer has no depth attachment".into()))?;
        let program = SsaoProgram {
            depth,
            normal: targets.gbuffer.color(1),
            camera: ctx.camera_uniforms(),
            inverse_resolution: Vec2::new(1.0 / targets.width as f32, 1.0 / targets.height as f32),
            radius: self.settings.radius,
            samples: self.samples.clone(),
            plus: self.settings.plus,
        };
        ctx.with_target(&targets.ssao, |ctx| {
            ctx.clear(Some(Vec4::ONE), None);
            ctx.draw(DrawCall {
                geometry: Geometry::FullscreenQuad,
                program: Program::Ssao(program),
                state: PipelineState::fullscreen(),
            })
        })?;
        Ok(targets.ssao.color(0))
    }
}

impl Lane for SsaoLane {
    fn strategy_name(&self) -> &'static str {
        if self.settings.plus {
            "SsaoPlus"
        } else {
            "Ssao"
        }
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::ScreenSpace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_points_are_inside_radius_and_away_from_center() {
        let points = generate_sphere_points(SSAO_SAMPLE_COUNT, 2.0, false);
        assert_eq!(points.len(), 64);
        let min_radius = 0.1f32.cbrt() * 2.0;
        for p in &points {
            let len = p.length();
            assert!(len <= 2.0 + 1e-4, "point {p:?} outside the sphere");
            assert!(
                len >= min_radius - 1e-4,
                "point {p:?} too close to the center"
            );
        }
        assert!(points.iter().any(|p| p.z < 0.0));
    }

    #[test]
    fn test_hemisphere_points_have_positive_z() {
        let points = generate_sphere_points(SSAO_SAMPLE_COUNT, 1.0, true);
        assert!(points.iter().all(|p| p.z >= 0.0));
    }

    #[test]
    fn test_kernel_is_deterministic() {
        assert_eq!(
            generate_sphere_points(16, 1.0, false),
            generate_sphere_points(16, 1.0, false)
        );
    }

    #[test]
    fn test_configure_regenerates_kernel_on_radius_change() {
        let mut lane = SsaoLane::default();
        let before = lane.samples()[0];
        lane.configure(SsaoSettings {
            radius: 3.0,
            ..SsaoSettings::default()
        });
        let scaled = lane.samples()[0].length();
        assert!((scaled - before.length() * 3.0).abs() < 1e-4);
    }
}
