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

//! Texel storage and sampling.

use std::collections::HashMap;
use umbra_core::math::{Vec2, Vec3, Vec4};
use umbra_core::renderer::{
    CubeFace, FilterMode, ResourceError, TextureDescriptor, TextureDimension, TextureId,
};

/// A texture living in system memory.
///
/// Texels are stored per layer and per mip level, row-major from the top-left.
/// Every write goes through the format's quantization so that reads observe
/// the precision a GPU texture of the same format would have.
#[derive(Debug, Clone)]
pub(crate) struct SoftwareTexture {
    pub(crate) descriptor: TextureDescriptor,
    layers: Vec<Vec<Vec<Vec4>>>,
}

impl SoftwareTexture {
    pub(crate) fn new(descriptor: TextureDescriptor) -> Result<Self, ResourceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "texture '{}' has zero size",
                descriptor.label
            )));
        }
        if descriptor.dimension == TextureDimension::Cube && descriptor.width != descriptor.height {
            return Err(ResourceError::InvalidDescriptor(format!(
                "cube texture '{}' is not square",
                descriptor.label
            )));
        }
        let levels = if descriptor.mipmapped {
            descriptor.full_mip_count()
        } else {
            1
        };
        let layer = (0..levels)
            .map(|level| {
                let (w, h) = mip_size(&descriptor, level);
                vec![Vec4::ZERO; w as usize * h as usize]
            })
            .collect::<Vec<_>>();
        let layers = vec![layer; descriptor.dimension.layer_count() as usize];
        Ok(Self { descriptor, layers })
    }

    pub(crate) fn level_count(&self) -> u32 {
        self.layers[0].len() as u32
    }

    pub(crate) fn level_size(&self, level: u32) -> (u32, u32) {
        mip_size(&self.descriptor, level)
    }

    pub(crate) fn layer_count(&self) -> u32 {
        self.layers.len() as u32
    }

    pub(crate) fn texels(&self, layer: u32) -> Result<&[Vec4], ResourceError> {
        self.layers
            .get(layer as usize)
            .map(|levels| levels[0].as_slice())
            .ok_or(ResourceError::OutOfBounds)
    }

    /// Replaces level 0 of `layer`.
    pub(crate) fn write(&mut self, layer: u32, texels: &[Vec4]) -> Result<(), ResourceError> {
        if texels.len() != self.descriptor.texel_count() {
            return Err(ResourceError::OutOfBounds);
        }
        let format = self.descriptor.format;
        let level = self
            .layers
            .get_mut(layer as usize)
            .map(|levels| &mut levels[0])
            .ok_or(ResourceError::OutOfBounds)?;
        for (dst, src) in level.iter_mut().zip(texels) {
            *dst = format.quantize(*src);
        }
        Ok(())
    }

    /// Fills level 0 of every layer.
    pub(crate) fn fill(&mut self, value: Vec4) {
        let value = self.descriptor.format.quantize(value);
        for levels in &mut self.layers {
            levels[0].fill(value);
        }
    }

    /// Reads a texel of level 0 of layer 0.
    #[inline]
    pub(crate) fn get(&self, x: u32, y: u32) -> Vec4 {
        self.layers[0][0][(y * self.descriptor.width + x) as usize]
    }

    /// Writes a texel of level 0 of layer 0, quantized.
    #[inline]
    pub(crate) fn set(&mut self, x: u32, y: u32, value: Vec4) {
        let index = (y * self.descriptor.width + x) as usize;
        self.layers[0][0][index] = self.descriptor.format.quantize(value);
    }

    /// Rebuilds every level above 0 with a 2x2 box filter.
    pub(crate) fn generate_mipmaps(&mut self) {
        let levels = self.level_count();
        for layer in 0..self.layers.len() {
            for level in 1..levels {
                let (sw, sh) = self.level_size(level - 1);
                let (dw, dh) = self.level_size(level);
                let mut next = vec![Vec4::ZERO; dw as usize * dh as usize];
                {
                    let source = &self.layers[layer][level as usize - 1];
                    for y in 0..dh {
                        for x in 0..dw {
                            let mut sum = Vec4::ZERO;
                            for (ox, oy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
                                let sx = (x * 2 + ox).min(sw - 1);
                                let sy = (y * 2 + oy).min(sh - 1);
                                sum += source[(sy * sw + sx) as usize];
                            }
                            next[(y * dw + x) as usize] = sum * 0.25;
                        }
                    }
                }
                self.layers[layer][level as usize] = next;
            }
        }
    }

    fn load(&self, layer: usize, level: u32, x: i64, y: i64) -> Vec4 {
        let (w, h) = self.level_size(level);
        let x = x.clamp(0, w as i64 - 1) as u32;
        let y = y.clamp(0, h as i64 - 1) as u32;
        self.layers[layer][level as usize][(y * w + x) as usize]
    }

    fn sample_level(&self, layer: usize, level: u32, uv: Vec2, filter: FilterMode) -> Vec4 {
        let (w, h) = self.level_size(level);
        match filter {
            FilterMode::Nearest => self.load(
                layer,
                level,
                (uv.x * w as f32).floor() as i64,
                (uv.y * h as f32).floor() as i64,
            ),
            FilterMode::Linear => {
                let x = uv.x * w as f32 - 0.5;
                let y = uv.y * h as f32 - 0.5;
                let (x0, y0) = (x.floor(), y.floor());
                let (fx, fy) = (x - x0, y - y0);
                let (x0, y0) = (x0 as i64, y0 as i64);
                let top = self
                    .load(layer, level, x0, y0)
                    .lerp(self.load(layer, level, x0 + 1, y0), fx);
                let bottom = self
                    .load(layer, level, x0, y0 + 1)
                    .lerp(self.load(layer, level, x0 + 1, y0 + 1), fx);
                top.lerp(bottom, fy)
            }
        }
    }

    /// Samples `layer` at `uv` with clamp-to-edge addressing. `lod` selects
    /// and blends mip levels when the texture has them.
    pub(crate) fn sample(&self, layer: usize, uv: Vec2, lod: f32) -> Vec4 {
        let filter = self.descriptor.filter;
        let max_level = self.level_count() - 1;
        let lod = lod.clamp(0.0, max_level as f32);
        let base = lod.floor() as u32;
        let t = lod - base as f32;
        let a = self.sample_level(layer, base, uv, filter);
        if t <= 0.0 || base >= max_level {
            return a;
        }
        a.lerp(self.sample_level(layer, base + 1, uv, filter), t)
    }

    /// Nearest texel of level 0 at `uv`, ignoring the sampling filter.
    pub(crate) fn load_uv(&self, uv: Vec2) -> Vec4 {
        self.sample_level(0, 0, uv, FilterMode::Nearest)
    }
}

fn mip_size(descriptor: &TextureDescriptor, level: u32) -> (u32, u32) {
    (
        (descriptor.width >> level).max(1),
        (descriptor.height >> level).max(1),
    )
}

/// Every texture of a device, and the sampling entry points used by shaders.
///
/// Reads of unknown textures return transparent black; draws validate their
/// inputs before shading.
#[derive(Debug, Default)]
pub(crate) struct TextureStore {
    textures: HashMap<TextureId, SoftwareTexture>,
}

impl TextureStore {
    pub(crate) fn insert(&mut self, id: TextureId, texture: SoftwareTexture) {
        self.textures.insert(id, texture);
    }

    pub(crate) fn remove(&mut self, id: TextureId) -> Option<SoftwareTexture> {
        self.textures.remove(&id)
    }

    pub(crate) fn get(&self, id: TextureId) -> Result<&SoftwareTexture, ResourceError> {
        self.textures
            .get(&id)
            .ok_or(ResourceError::TextureNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: TextureId) -> Result<&mut SoftwareTexture, ResourceError> {
        self.textures
            .get_mut(&id)
            .ok_or(ResourceError::TextureNotFound(id))
    }

    pub(crate) fn contains(&self, id: TextureId) -> bool {
        self.textures.contains_key(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.textures.len()
    }

    /// Filtered sample of a 2D texture.
    pub(crate) fn sample(&self, id: TextureId, uv: Vec2) -> Vec4 {
        self.textures
            .get(&id)
            .map_or(Vec4::ZERO, |t| t.sample(0, uv, 0.0))
    }

    /// Unfiltered read of a 2D texture.
    pub(crate) fn load(&self, id: TextureId, uv: Vec2) -> Vec4 {
        self.textures.get(&id).map_or(Vec4::ZERO, |t| t.load_uv(uv))
    }

    /// Reads texel `(x, y)` of level 0, clamped to the texture.
    pub(crate) fn fetch(&self, id: TextureId, x: u32, y: u32) -> Vec4 {
        self.textures
            .get(&id)
            .map_or(Vec4::ZERO, |t| t.load(0, 0, x as i64, y as i64))
    }

    /// Samples a cube texture along `direction`. `roughness` in `[0, 1]`
    /// selects the mip level.
    pub(crate) fn sample_cube(&self, id: TextureId, direction: Vec3, roughness: f32) -> Vec4 {
        let Some(texture) = self.textures.get(&id) else {
            return Vec4::ZERO;
        };
        if texture.layer_count() != 6 {
            return Vec4::ZERO;
        }
        let (face, uv) = CubeFace::from_direction(direction);
        let lod = roughness.clamp(0.0, 1.0) * (texture.level_count() - 1) as f32;
        texture.sample(face.layer() as usize, uv, lod)
    }
}
