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

//! Off-screen targets used by a displayed frame.

use umbra_core::renderer::{
    GraphicsDevice, RenderTarget, RenderTargetDescriptor, ResourceError, TextureFormat,
};

/// Number of ping-pong textures of the post-processing chain.
pub const POST_TARGET_COUNT: usize = 4;

/// G-buffer attachment formats: albedo, normal + roughness, emissive + metallic.
pub const GBUFFER_FORMATS: [TextureFormat; 3] = [
    TextureFormat::Rgba8Unorm,
    TextureFormat::Rgba16Float,
    TextureFormat::Rgba8Unorm,
];

/// The screen-sized targets of the deferred pipeline and post chain.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTargets {
    /// Width of every target.
    pub width: u32,
    /// Height of every target.
    pub height: u32,
    /// Three color attachments plus depth.
    pub gbuffer: RenderTarget,
    /// Same layout as the G-buffer; read by decals while the G-buffer is written.
    pub decal_scratch: RenderTarget,
    /// Single channel ambient occlusion.
    pub ssao: RenderTarget,
    /// HDR lit color plus depth; the output of both pipelines.
    pub illumination: RenderTarget,
    /// Ping-pong textures of the post chain.
    pub post: [RenderTarget; POST_TARGET_COUNT],
}

impl FrameTargets {
    /// Creates all targets at the given size.
    pub fn create(
        device: &mut dyn GraphicsDevice,
        width: u32,
        height: u32,
    ) -> Result<Self, ResourceError> {
        let gbuffer = device.create_render_target(&RenderTargetDescriptor::new(
            "gbuffer",
            width,
            height,
            GBUFFER_FORMATS.to_vec(),
        ))?;
        let decal_scratch = device.create_render_target(&RenderTargetDescriptor::new(
            "decal_scratch",
            width,
            height,
            GBUFFER_FORMATS.to_vec(),
        ))?;
        let ssao = device.create_render_target(
            &RenderTargetDescriptor::new("ssao", width, height, vec![TextureFormat::R8Unorm])
                .without_depth(),
        )?;
        let illumination = device.create_render_target(&RenderTargetDescriptor::new(
            "illumination",
            width,
            height,
            vec![TextureFormat::Rgba16Float],
        ))?;

        let mut post = Vec::with_capacity(POST_TARGET_COUNT);
        for i in 0..POST_TARGET_COUNT {
            post.push(device.create_render_target(
                &RenderTargetDescriptor::new(
                    format!("post_{}", i),
                    width,
                    height,
                    vec![TextureFormat::Rgba16Float],
                )
                .without_depth(),
            )?);
        }
        let post: [RenderTarget; POST_TARGET_COUNT] = post
            .try_into()
            .map_err(|_| ResourceError::BackendError("post target count mismatch".into()))?;

        log::info!("Frame targets created at {}x{}", width, height);
        Ok(Self {
            width,
            height,
            gbuffer,
            decal_scratch,
            ssao,
            illumination,
            post,
        })
    }

    /// Destroys all targets.
    pub fn destroy(&self, device: &mut dyn GraphicsDevice) {
        let all = [
            &self.gbuffer,
            &self.decal_scratch,
            &self.ssao,
            &self.illumination,
        ]
        .into_iter()
        .chain(self.post.iter());
        for target in all {
            if let Err(e) = device.destroy_render_target(target.id) {
                log::warn!("FrameTargets: failed to destroy {:?}: {}", target.id, e);
            }
        }
    }

    /// Returns `true` if the targets match the given size.
    pub fn matches(&self, width: u32, height: u32) -> bool {
        self.width == width && self.height == height
    }
}
