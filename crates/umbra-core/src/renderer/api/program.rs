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

//! Shader programs and their parameter blocks.
//!
//! Each variant of [`Program`] corresponds to one shader of the pipeline. The
//! parameter structs play the role of uniform blocks: the lanes fill them, the
//! device binds them for the duration of a single draw.

use super::core::TextureId;
use crate::math::{Mat4, UVec3, Vec2, Vec3, Vec4};
use crate::renderer::light::{LightArray, LightUniforms};
use std::sync::Arc;

/// Camera matrices and parameters shared by most programs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraUniforms {
    /// World to clip.
    pub view_projection: Mat4,
    /// Clip to world.
    pub inverse_view_projection: Mat4,
    /// World-space camera position.
    pub eye: Vec3,
    /// Near clip distance.
    pub near: f32,
    /// Far clip distance.
    pub far: f32,
}

impl Default for CameraUniforms {
    fn default() -> Self {
        Self {
            view_projection: Mat4::IDENTITY,
            inverse_view_projection: Mat4::IDENTITY,
            eye: Vec3::ZERO,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Material channels with every texture slot resolved.
///
/// Absent slots are bound to neutral 1x1 textures by the caller: white for
/// color and metallic-roughness, black for emissive and normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialUniforms {
    /// Base color factor.
    pub color: Vec4,
    /// Base color texture.
    pub color_texture: TextureId,
    /// Emissive factor.
    pub emissive: Vec3,
    /// Emissive texture.
    pub emissive_texture: TextureId,
    /// Metallic factor.
    pub metallic: f32,
    /// Roughness factor.
    pub roughness: f32,
    /// Metallic (blue) and roughness (green) texture.
    pub metallic_roughness_texture: TextureId,
    /// Tangent-space normal texture; black means "no normal map".
    pub normal_texture: TextureId,
    /// Alpha cutoff for masked materials, `0` otherwise.
    pub alpha_cutoff: f32,
}

/// Per-draw terms that are not tied to a specific light.
///
/// In the multi-pass strategy every pass after the first one zeroes these so
/// that only the light contribution accumulates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceUniforms {
    /// Ambient light color.
    pub ambient: Vec3,
    /// Multiplier on the emissive term (1 or 0).
    pub emissive_scale: f32,
    /// Cube map sampled for specular reflections, if any.
    pub environment: Option<TextureId>,
    /// Multiplier on the reflection term.
    pub reflection_intensity: f32,
}

impl SurfaceUniforms {
    /// The terms used by every pass after the first one.
    pub fn additive() -> Self {
        Self {
            ambient: Vec3::ZERO,
            emissive_scale: 0.0,
            environment: None,
            reflection_intensity: 0.0,
        }
    }
}

/// The lights bound for a draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightBlock {
    /// Multi-pass: at most one light per draw. `None` renders only the
    /// ambient and emissive terms.
    Single(Option<LightUniforms>),
    /// Single-pass: fixed-capacity arrays.
    Array(LightArray),
}

impl LightBlock {
    /// Iterates over the bound lights.
    pub fn iter(&self) -> impl Iterator<Item = LightUniforms> + '_ {
        let (single, array) = match self {
            LightBlock::Single(light) => (*light, None),
            LightBlock::Array(array) => (None, Some(array)),
        };
        single
            .into_iter()
            .chain(array.into_iter().flat_map(|a| a.iter()))
    }
}

/// Depth-only rendering from a light or camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthProgram {
    /// World to clip.
    pub view_projection: Mat4,
    /// Base color texture, for alpha testing.
    pub color_texture: TextureId,
    /// Base color alpha factor.
    pub alpha: f32,
    /// Alpha cutoff, `0` disables the test.
    pub alpha_cutoff: f32,
}

/// Forward shading of a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardProgram {
    /// Camera.
    pub camera: CameraUniforms,
    /// Material.
    pub material: MaterialUniforms,
    /// Ambient, emissive and reflection terms.
    pub surface: SurfaceUniforms,
    /// Lights.
    pub lights: LightBlock,
}

/// G-buffer fill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GBufferProgram {
    /// Camera.
    pub camera: CameraUniforms,
    /// Material.
    pub material: MaterialUniforms,
}

/// Projected decal composited into the G-buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecalProgram {
    /// Camera.
    pub camera: CameraUniforms,
    /// World to decal local space.
    pub inverse_model: Mat4,
    /// Copy of the scene depth taken before the decal pass.
    pub scene_depth: TextureId,
    /// Copy of the encoded normals taken before the decal pass.
    pub scene_normal: TextureId,
    /// The decal image.
    pub texture: TextureId,
}

/// Screen-space ambient occlusion.
#[derive(Debug, Clone, PartialEq)]
pub struct SsaoProgram {
    /// Scene depth.
    pub depth: TextureId,
    /// Encoded normals.
    pub normal: TextureId,
    /// Camera.
    pub camera: CameraUniforms,
    /// `1 / resolution` of the output.
    pub inverse_resolution: Vec2,
    /// Sample radius in world units.
    pub radius: f32,
    /// Sample offsets, already scaled by the radius.
    pub samples: Arc<[Vec3]>,
    /// Orient samples into the normal hemisphere and weight by range.
    pub plus: bool,
}

/// Deferred light accumulation from the G-buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeferredLightingProgram {
    /// Camera.
    pub camera: CameraUniforms,
    /// Albedo, encoded normal + roughness, emissive + metallic.
    pub gbuffer: [TextureId; 3],
    /// Scene depth.
    pub depth: TextureId,
    /// Ambient occlusion, white when disabled.
    pub ssao: TextureId,
    /// Ambient, emissive and reflection terms.
    pub surface: SurfaceUniforms,
    /// Lights.
    pub lights: LightBlock,
}

/// Placement of a regular grid of irradiance probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeGridUniforms {
    /// Position of probe `(0, 0, 0)`.
    pub start: Vec3,
    /// Position of the last probe.
    pub end: Vec3,
    /// Number of probes along each axis.
    pub dim: UVec3,
}

impl ProbeGridUniforms {
    /// Distance between neighbouring probes on each axis. Axes with a single
    /// probe have a step of zero.
    pub fn step(&self) -> Vec3 {
        let delta = self.end - self.start;
        let axis = |d: f32, n: u32| if n > 1 { d / (n - 1) as f32 } else { 0.0 };
        Vec3::new(
            axis(delta.x, self.dim.x),
            axis(delta.y, self.dim.y),
            axis(delta.z, self.dim.z),
        )
    }

    /// Total number of probes.
    pub fn probe_count(&self) -> usize {
        self.dim.x as usize * self.dim.y as usize * self.dim.z as usize
    }

    /// Row of the probe texture holding probe `index`.
    pub fn linear_index(&self, index: UVec3) -> usize {
        index.x as usize
            + index.y as usize * self.dim.x as usize
            + index.z as usize * self.dim.x as usize * self.dim.y as usize
    }

    /// World position of probe `index`.
    pub fn position(&self, index: UVec3) -> Vec3 {
        self.start + self.step() * index.as_vec3()
    }
}

/// Full-screen sampling of the baked irradiance probes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IrradianceProgram {
    /// Camera.
    pub camera: CameraUniforms,
    /// G-buffer albedo.
    pub albedo: TextureId,
    /// G-buffer encoded normals.
    pub normal: TextureId,
    /// Scene depth.
    pub depth: TextureId,
    /// Ambient occlusion.
    pub ssao: TextureId,
    /// Packed SH coefficients: 9 columns, one row per probe.
    pub probes: TextureId,
    /// Grid placement.
    pub grid: ProbeGridUniforms,
    /// Multiplier on the indirect term.
    pub intensity: f32,
}

/// One stage of the post-processing chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostFxStage {
    /// Separable gaussian blur, horizontal half. Offsets scale with `strength`.
    BlurHorizontal {
        /// Tap spacing in texels.
        strength: f32,
    },
    /// Separable gaussian blur, vertical half.
    BlurVertical {
        /// Tap spacing in texels.
        strength: f32,
    },
    /// Blends the sharp and blurred images outside of the focus range.
    DepthOfField {
        /// The blurred image.
        blurred: TextureId,
        /// Scene depth.
        depth: TextureId,
        /// Linear distance where focus starts.
        focus_near: f32,
        /// Linear distance where focus ends.
        focus_far: f32,
        /// Blend amount, `0` is neutral.
        amount: f32,
        /// Camera near plane, for linearizing depth.
        near: f32,
        /// Camera far plane, for linearizing depth.
        far: f32,
    },
    /// Smears along screen-space velocity derived from camera motion.
    MotionBlur {
        /// Scene depth.
        depth: TextureId,
        /// Current clip to world.
        inverse_view_projection: Mat4,
        /// Previous frame world to clip.
        previous_view_projection: Mat4,
        /// Velocity scale, `0` is neutral.
        strength: f32,
    },
    /// Saturation and vignette.
    ColorGrade {
        /// `1` is neutral.
        saturation: f32,
        /// `0` is neutral.
        vignette: f32,
    },
    /// Contrast around mid-grey. `1` is neutral.
    Contrast {
        /// Contrast factor.
        contrast: f32,
    },
    /// Keeps only the part of the signal above the threshold.
    Threshold {
        /// Luminance threshold.
        threshold: f32,
    },
    /// Adds a second texture scaled by `intensity`.
    Mix {
        /// The texture to add.
        overlay: TextureId,
        /// `0` is neutral.
        intensity: f32,
    },
    /// Reinhard tone mapping with gamma.
    ToneMap {
        /// Pass-through when `false`.
        enabled: bool,
        /// Exposure scale.
        scale: f32,
        /// Average scene luminance.
        average_luminance: f32,
        /// Squared white point.
        white_squared: f32,
        /// Inverse gamma exponent.
        inverse_gamma: f32,
    },
    /// Animated film grain. `0` is neutral.
    Grain {
        /// Seed time in seconds.
        time: f32,
        /// Noise amplitude.
        amount: f32,
    },
    /// Radial color fringing. `0` is neutral.
    ChromaticAberration {
        /// Channel offset in UV units at the border.
        amount: f32,
    },
    /// Barrel/pincushion distortion. `0` is neutral.
    LensDistortion {
        /// Distortion coefficient.
        amount: f32,
    },
}

/// Post-processing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFxProgram {
    /// The input image.
    pub source: TextureId,
    /// What to do with it.
    pub stage: PostFxStage,
}

/// Debug visualization of a depth texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DepthViewProgram {
    /// The depth texture.
    pub depth: TextureId,
    /// Near plane of the camera that rendered it.
    pub near: f32,
    /// Far plane of the camera that rendered it.
    pub far: f32,
    /// Convert perspective depth to linear distance before display.
    pub linearize: bool,
}

/// A shader program with its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Program {
    /// Depth-only.
    Depth(DepthProgram),
    /// Forward lit.
    Forward(ForwardProgram),
    /// G-buffer fill.
    GBuffer(GBufferProgram),
    /// Decal projection.
    Decal(DecalProgram),
    /// Ambient occlusion.
    Ssao(SsaoProgram),
    /// Deferred lighting.
    DeferredLighting(DeferredLightingProgram),
    /// Irradiance probe sampling.
    Irradiance(IrradianceProgram),
    /// Post-processing stage.
    PostFx(PostFxProgram),
    /// Texture blit. `grayscale` replicates the red channel.
    Copy {
        /// The texture to copy.
        source: TextureId,
        /// Replicate the first channel into RGB.
        grayscale: bool,
    },
    /// Depth visualization.
    DepthView(DepthViewProgram),
}

impl Program {
    /// The world-to-clip transform used to rasterize mesh geometry, if the
    /// program draws meshes.
    pub fn view_projection(&self) -> Option<Mat4> {
        match self {
            Program::Depth(p) => Some(p.view_projection),
            Program::Forward(p) => Some(p.camera.view_projection),
            Program::GBuffer(p) => Some(p.camera.view_projection),
            Program::Decal(p) => Some(p.camera.view_projection),
            _ => None,
        }
    }

    /// A short name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Program::Depth(_) => "depth",
            Program::Forward(_) => "forward",
            Program::GBuffer(_) => "gbuffer",
            Program::Decal(_) => "decal",
            Program::Ssao(_) => "ssao",
            Program::DeferredLighting(_) => "deferred",
            Program::Irradiance(_) => "irradiance",
            Program::PostFx(_) => "postfx",
            Program::Copy { .. } => "copy",
            Program::DepthView(_) => "depth_view",
        }
    }
}
