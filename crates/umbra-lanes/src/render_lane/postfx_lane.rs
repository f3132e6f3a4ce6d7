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

//! The post-processing chain.

use super::{FrameContext, FrameTargets, POST_TARGET_COUNT};
use serde::{Deserialize, Serialize};
use umbra_core::lane::{Lane, LaneKind};
use umbra_core::math::Mat4;
use umbra_core::renderer::{
    CameraUniforms, DrawCall, Geometry, PipelineState, PostFxProgram, PostFxStage, Program,
    RenderError, TextureId, Viewport,
};

/// Blur iterations; each one is a horizontal then a vertical pass.
pub const BLUR_ITERATIONS: usize = 8;

/// Stages after the blur: depth of field, motion blur, grade, contrast,
/// threshold, mix, tone map, grain, aberration and lens distortion.
const FINISHING_STAGES: usize = 10;

/// Reinhard tone mapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneMapSettings {
    /// Pass-through when `false`.
    pub enabled: bool,
    /// Exposure scale.
    pub scale: f32,
    /// Average scene luminance.
    pub average_luminance: f32,
    /// Squared luminance mapped to white.
    pub white_squared: f32,
    /// Display gamma.
    pub gamma: f32,
}

impl Default for ToneMapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            scale: 1.0,
            average_luminance: 2.5,
            white_squared: 10.0,
            gamma: 2.2,
        }
    }
}

/// Coefficients of every post stage. The defaults leave the image unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFxSettings {
    /// Blur tap spacing; `0` disables blurring.
    pub blur: f32,
    /// Depth-of-field amount.
    pub depth_of_field: f32,
    /// Distance where the in-focus range starts.
    pub focus_near: f32,
    /// Distance where the in-focus range ends.
    pub focus_far: f32,
    /// Motion blur strength.
    pub motion_blur: f32,
    /// Color saturation.
    pub saturation: f32,
    /// Vignette darkening at the corners.
    pub vignette: f32,
    /// Contrast around mid-grey.
    pub contrast: f32,
    /// Luminance above which the blurred image feeds bloom.
    pub bloom_threshold: f32,
    /// Bloom intensity.
    pub bloom: f32,
    /// Film grain amplitude.
    pub grain: f32,
    /// Chromatic aberration offset.
    pub chromatic_aberration: f32,
    /// Lens distortion coefficient.
    pub lens_distortion: f32,
    /// Tone mapping.
    pub tone_map: ToneMapSettings,
}

impl Default for PostFxSettings {
    fn default() -> Self {
        Self {
            blur: 0.0,
            depth_of_field: 0.0,
            focus_near: 5.0,
            focus_far: 20.0,
            motion_blur: 0.0,
            saturation: 1.0,
            vignette: 0.0,
            contrast: 1.0,
            bloom_threshold: 0.8,
            bloom: 0.0,
            grain: 0.0,
            chromatic_aberration: 0.0,
            lens_distortion: 0.0,
            tone_map: ToneMapSettings::default(),
        }
    }
}

/// Per-frame inputs of the chain that do not come from the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostFxInputs {
    /// The lit image.
    pub source: TextureId,
    /// Scene depth.
    pub depth: TextureId,
    /// World to clip of the previous frame.
    pub previous_view_projection: Mat4,
    /// Seconds since start, seeds the grain.
    pub time: f32,
}

/// One full-screen stage of the chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostPass {
    /// Texture read by the stage.
    pub source: TextureId,
    /// Index of the ping-pong target written, `None` for the surface.
    pub destination: Option<usize>,
    /// The stage.
    pub stage: PostFxStage,
}

/// Runs the fixed sequence of full-screen post stages over four ping-pong
/// textures and writes the last stage to the surface.
///
/// Stage order: blur, depth of field, motion blur, color grade, contrast,
/// bloom threshold, bloom mix, tone map, grain, chromatic aberration, lens
/// distortion. Every stage always runs; neutral coefficients make it a copy.
#[derive(Debug, Default)]
pub struct PostProcessLane {
    settings: PostFxSettings,
}

impl PostProcessLane {
    /// Creates a lane with the given coefficients.
    pub fn new(settings: PostFxSettings) -> Self {
        Self { settings }
    }

    /// Current coefficients.
    pub fn settings(&self) -> &PostFxSettings {
        &self.settings
    }

    /// Replaces the coefficients.
    pub fn configure(&mut self, settings: PostFxSettings) {
        self.settings = settings;
    }

    /// The stages in execution order over the ping-pong textures `post`.
    pub fn plan(
        &self,
        inputs: &PostFxInputs,
        camera: &CameraUniforms,
        post: [TextureId; POST_TARGET_COUNT],
    ) -> Vec<PostPass> {
        let s = &self.settings;
        let mut passes = Vec::with_capacity(BLUR_ITERATIONS * 2 + FINISHING_STAGES);
        let mut push = |source: TextureId, destination: Option<usize>, stage: PostFxStage| {
            passes.push(PostPass {
                source,
                destination,
                stage,
            })
        };

        let mut blur_source = inputs.source;
        for _ in 0..BLUR_ITERATIONS {
            push(
                blur_source,
                Some(0),
                PostFxStage::BlurHorizontal { strength: s.blur },
            );
            push(
                post[0],
                Some(1),
                PostFxStage::BlurVertical { strength: s.blur },
            );
            blur_source = post[1];
        }
        let blurred = post[1];

        push(
            inputs.source,
            Some(2),
            PostFxStage::DepthOfField {
                blurred,
                depth: inputs.depth,
                focus_near: s.focus_near,
                focus_far: s.focus_far,
                amount: s.depth_of_field,
                near: camera.near,
                far: camera.far,
            },
        );
        push(
            post[2],
            Some(3),
            PostFxStage::MotionBlur {
                depth: inputs.depth,
                inverse_view_projection: camera.inverse_view_projection,
                previous_view_projection: inputs.previous_view_projection,
                strength: s.motion_blur,
            },
        );
        push(
            post[3],
            Some(2),
            PostFxStage::ColorGrade {
                saturation: s.saturation,
                vignette: s.vignette,
            },
        );
        push(
            post[2],
            Some(3),
            PostFxStage::Contrast {
                contrast: s.contrast,
            },
        );
        // Bloom is extracted from the blurred image, then added to the graded one.
        push(
            blurred,
            Some(0),
            PostFxStage::Threshold {
                threshold: s.bloom_threshold,
            },
        );
        push(
            post[3],
            Some(1),
            PostFxStage::Mix {
                overlay: post[0],
                intensity: s.bloom,
            },
        );
        let tone = &s.tone_map;
        push(
            post[1],
            Some(2),
            PostFxStage::ToneMap {
                enabled: tone.enabled,
                scale: tone.scale,
                average_luminance: tone.average_luminance,
                white_squared: tone.white_squared,
                inverse_gamma: if tone.gamma > 0.0 { 1.0 / tone.gamma } else { 1.0 },
            },
        );
        push(
            post[2],
            Some(3),
            PostFxStage::Grain {
                time: inputs.time,
                amount: s.grain,
            },
        );
        push(
            post[3],
            Some(2),
            PostFxStage::ChromaticAberration {
                amount: s.chromatic_aberration,
            },
        );
        push(
            post[2],
            None,
            PostFxStage::LensDistortion {
                amount: s.lens_distortion,
            },
        );
        passes
    }

    /// Runs the chain. Must be called with no render target bound.
    pub fn render(
        &self,
        ctx: &mut FrameContext<'_>,
        targets: &FrameTargets,
        inputs: &PostFxInputs,
    ) -> Result<(), RenderError> {
        let camera = ctx.camera_uniforms();
        let post = std::array::from_fn(|i| targets.post[i].color(0));

        for pass in self.plan(inputs, &camera, post) {
            let call = DrawCall {
                geometry: Geometry::FullscreenQuad,
                program: Program::PostFx(PostFxProgram {
                    source: pass.source,
                    stage: pass.stage,
                }),
                state: PipelineState::fullscreen(),
            };
            match pass.destination {
                Some(index) => {
                    ctx.with_target(&targets.post[index], |ctx| ctx.draw(call))?;
                }
                None => {
                    let (width, height) = ctx.device().surface_size();
                    ctx.set_viewport(Viewport::full(width, height));
                    ctx.draw(call)?;
                }
            }
        }
        ctx.check_device_errors("PostProcessLane");
        Ok(())
    }
}

impl Lane for PostProcessLane {
    fn strategy_name(&self) -> &'static str {
        "PostFxChain"
    }

    fn lane_kind(&self) -> LaneKind {
        LaneKind::PostProcess
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> PostFxInputs {
        PostFxInputs {
            source: TextureId(100),
            depth: TextureId(101),
            previous_view_projection: Mat4::IDENTITY,
            time: 0.0,
        }
    }

    fn post() -> [TextureId; POST_TARGET_COUNT] {
        [TextureId(0), TextureId(1), TextureId(2), TextureId(3)]
    }

    #[test]
    fn test_chain_structure_is_fixed() {
        let lane = PostProcessLane::default();
        let passes = lane.plan(&inputs(), &CameraUniforms::default(), post());
        assert_eq!(passes.len(), 26);
        assert_eq!(passes.len(), BLUR_ITERATIONS * 2 + FINISHING_STAGES);
        assert!(matches!(passes[0].stage, PostFxStage::BlurHorizontal { .. }));
        assert_eq!(passes[0].source, TextureId(100));
        let last = passes.last().unwrap();
        assert!(matches!(last.stage, PostFxStage::LensDistortion { .. }));
        assert_eq!(last.destination, None);
        assert!(passes[..passes.len() - 1]
            .iter()
            .all(|p| p.destination.is_some()));
    }

    #[test]
    fn test_no_stage_reads_the_texture_it_writes() {
        let lane = PostProcessLane::default();
        let textures = post();
        for pass in lane.plan(&inputs(), &CameraUniforms::default(), textures) {
            if let Some(dst) = pass.destination {
                assert_ne!(pass.source, textures[dst], "{:?}", pass.stage);
                if let PostFxStage::Mix { overlay, .. } = pass.stage {
                    assert_ne!(overlay, textures[dst]);
                }
                if let PostFxStage::DepthOfField { blurred, .. } = pass.stage {
                    assert_ne!(blurred, textures[dst]);
                }
            }
        }
    }

    #[test]
    fn test_tone_map_uses_inverse_gamma() {
        let mut settings = PostFxSettings::default();
        settings.tone_map.enabled = true;
        settings.tone_map.gamma = 2.0;
        let lane = PostProcessLane::new(settings);
        let passes = lane.plan(&inputs(), &CameraUniforms::default(), post());
        let tone = passes
            .iter()
            .find_map(|p| match p.stage {
                PostFxStage::ToneMap {
                    inverse_gamma,
                    enabled,
                    ..
                } => Some((inverse_gamma, enabled)),
                _ => None,
            })
            .unwrap();
        assert_eq!(tone, (0.5, true));
    }
}
