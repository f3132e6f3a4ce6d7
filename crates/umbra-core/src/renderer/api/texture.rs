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

//! Texture formats and descriptors.

use crate::math::Vec4;
use std::borrow::Cow;

/// The storage format of a texture.
///
/// Backends are free to store texels however they like, but must observe the
/// precision and channel count of the format when values are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// Four 8-bit normalized channels.
    Rgba8Unorm,
    /// One 8-bit normalized channel.
    R8Unorm,
    /// Four half-precision float channels.
    Rgba16Float,
    /// Four single-precision float channels.
    Rgba32Float,
    /// Single-precision depth.
    Depth32Float,
}

impl TextureFormat {
    /// Returns `true` for depth formats.
    pub fn is_depth(self) -> bool {
        matches!(self, TextureFormat::Depth32Float)
    }

    /// Returns `true` for formats whose values are clamped to `[0, 1]`.
    pub fn is_normalized(self) -> bool {
        matches!(self, TextureFormat::Rgba8Unorm | TextureFormat::R8Unorm)
    }

    /// Converts a shader output into the value the format can actually store.
    pub fn quantize(self, value: Vec4) -> Vec4 {
        let unorm8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() / 255.0;
        match self {
            TextureFormat::Rgba8Unorm => Vec4::new(
                unorm8(value.x),
                unorm8(value.y),
                unorm8(value.z),
                unorm8(value.w),
            ),
            TextureFormat::R8Unorm => Vec4::new(unorm8(value.x), 0.0, 0.0, 1.0),
            TextureFormat::Rgba16Float => value.clamp(Vec4::splat(-65504.0), Vec4::splat(65504.0)),
            TextureFormat::Rgba32Float => value,
            TextureFormat::Depth32Float => Vec4::new(value.x, 0.0, 0.0, 1.0),
        }
    }
}

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A single 2D image.
    D2,
    /// Six square 2D faces addressed by direction.
    Cube,
}

impl TextureDimension {
    /// Number of array layers backing the dimension.
    pub fn layer_count(self) -> u32 {
        match self {
            TextureDimension::D2 => 1,
            TextureDimension::Cube => 6,
        }
    }
}

/// The sampling filter used when a texture is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Nearest texel, no interpolation.
    Nearest,
    /// Bilinear interpolation between the four nearest texels.
    #[default]
    Linear,
}

/// A descriptor used to create a texture.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureDescriptor {
    /// A debug label.
    pub label: Cow<'static, str>,
    /// Width of mip level 0 in texels.
    pub width: u32,
    /// Height of mip level 0 in texels.
    pub height: u32,
    /// Storage format.
    pub format: TextureFormat,
    /// 2D or cube.
    pub dimension: TextureDimension,
    /// Sampling filter.
    pub filter: FilterMode,
    /// Whether a full mip chain may be generated for this texture.
    pub mipmapped: bool,
}

impl TextureDescriptor {
    /// A linear-filtered 2D texture without mips.
    pub fn new_2d(
        label: impl Into<Cow<'static, str>>,
        width: u32,
        height: u32,
        format: TextureFormat,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
            dimension: TextureDimension::D2,
            filter: FilterMode::Linear,
            mipmapped: false,
        }
    }

    /// A linear-filtered, mipmapped cube texture.
    pub fn new_cube(label: impl Into<Cow<'static, str>>, size: u32, format: TextureFormat) -> Self {
        Self {
            label: label.into(),
            width: size,
            height: size,
            format,
            dimension: TextureDimension::Cube,
            filter: FilterMode::Linear,
            mipmapped: true,
        }
    }

    /// Overrides the sampling filter.
    pub fn with_filter(mut self, filter: FilterMode) -> Self {
        self.filter = filter;
        self
    }

    /// Number of texels in one layer of mip level 0.
    pub fn texel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of levels in a full mip chain for this size.
    pub fn full_mip_count(&self) -> u32 {
        32 - self.width.max(self.height).max(1).leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unorm_quantization_clamps() {
        let q = TextureFormat::Rgba8Unorm.quantize(Vec4::new(1.5, -0.2, 0.5, 1.0));
        assert_eq!(q.x, 1.0);
        assert_eq!(q.y, 0.0);
        assert!((q.z - 128.0 / 255.0).abs() < 1e-6);
    }

    #[test]
    fn test_float_formats_keep_hdr_values() {
        let v = Vec4::new(4.0, 0.25, 12.0, 1.0);
        assert_eq!(TextureFormat::Rgba32Float.quantize(v), v);
        assert_eq!(TextureFormat::Rgba16Float.quantize(v), v);
    }

    #[test]
    fn test_full_mip_count() {
        let desc = TextureDescriptor::new_cube("probe", 64, TextureFormat::Rgba16Float);
        assert_eq!(desc.full_mip_count(), 7);
        let one = TextureDescriptor::new_2d("one", 1, 1, TextureFormat::Rgba8Unorm);
        assert_eq!(one.full_mip_count(), 1);
    }
}
