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

//! Writing device textures to image files.

use std::path::Path;

use anyhow::Context;
use image::{ImageBuffer, Rgba};
use umbra_core::math::Vec4;
use umbra_core::renderer::{GraphicsDevice, ResourceError, TextureFormat, TextureId};

/// Reads layer 0 of `texture` and converts it to 8-bit RGBA rows.
///
/// Single-channel formats are expanded to opaque gray. Values are clamped to
/// `[0, 1]`; no tonemapping is applied.
pub fn texture_to_rgba8(
    device: &dyn GraphicsDevice,
    texture: TextureId,
) -> Result<(u32, u32, Vec<u8>), ResourceError> {
    let descriptor = device.texture_descriptor(texture)?;
    let texels = device.read_texture(texture, 0)?;
    let gray = matches!(
        descriptor.format,
        TextureFormat::R8Unorm | TextureFormat::Depth32Float
    );
    let texels: Vec<Vec4> = if gray {
        texels
            .iter()
            .map(|t| Vec4::new(t.x, t.x, t.x, 1.0))
            .collect()
    } else {
        texels
    };
    let channels: &[f32] = bytemuck::cast_slice(&texels);
    let bytes = channels
        .iter()
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect();
    Ok((descriptor.width, descriptor.height, bytes))
}

/// Saves layer 0 of `texture` as a PNG file.
pub fn save_png(
    device: &dyn GraphicsDevice,
    texture: TextureId,
    path: impl AsRef<Path>,
) -> anyhow::Result<()> {
    let path = path.as_ref();
    let (width, height, bytes) = texture_to_rgba8(device, texture)
        .with_context(|| format!("Failed to read texture {:?}", texture))?;
    let buffer: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_raw(width, height, bytes)
        .context("Texture size does not match its texel count")?;
    buffer
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Saved {}x{} image to {}", width, height, path.display());
    Ok(())
}
