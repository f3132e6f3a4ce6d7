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

//! Fixed-function pipeline state.

use crate::math::Vec4;

/// How a fragment's color is combined with the value already in the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// The fragment replaces the destination.
    #[default]
    Disabled,
    /// `src * src.a + dst * (1 - src.a)`.
    Alpha,
    /// `src * src.a + dst`. Used to accumulate lights.
    Additive,
    /// `src + dst`.
    One,
}

impl BlendMode {
    /// Combines a source color with a destination color. The resulting alpha
    /// follows the same equation as the color channels.
    pub fn apply(self, src: Vec4, dst: Vec4) -> Vec4 {
        match self {
            BlendMode::Disabled => src,
            BlendMode::Alpha => src * src.w + dst * (1.0 - src.w),
            BlendMode::Additive => src * src.w + dst,
            BlendMode::One => src + dst,
        }
    }
}

/// A depth comparison function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareFunction {
    /// Never passes.
    Never,
    /// Passes if the fragment is closer.
    #[default]
    Less,
    /// Passes if the fragment is closer or at the same depth.
    LessEqual,
    /// Passes if the fragment is exactly at the stored depth.
    Equal,
    /// Passes if the fragment is farther.
    Greater,
    /// Always passes.
    Always,
}

impl CompareFunction {
    /// Evaluates the comparison of an incoming depth against the stored one.
    pub fn passes(self, incoming: f32, stored: f32) -> bool {
        match self {
            CompareFunction::Never => false,
            CompareFunction::Less => incoming < stored,
            CompareFunction::LessEqual => incoming <= stored,
            CompareFunction::Equal => incoming == stored,
            CompareFunction::Greater => incoming > stored,
            CompareFunction::Always => true,
        }
    }
}

/// Which triangle faces are discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// No culling.
    None,
    /// Discard back faces. Front faces wind counter-clockwise.
    #[default]
    Back,
    /// Discard front faces.
    Front,
}

/// Which color channels a draw may write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorWrites {
    /// All four channels.
    #[default]
    All,
    /// Red, green and blue; alpha is preserved.
    Rgb,
    /// No color output (depth-only).
    None,
}

/// The complete fixed-function state of a draw.
///
/// `PipelineState::default()` is the state every pass returns to after a
/// draw: back-face culling, no blending, `Less` depth test with writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineState {
    /// Blend equation.
    pub blend: BlendMode,
    /// Depth comparison.
    pub depth_compare: CompareFunction,
    /// Whether passing fragments write depth.
    pub depth_write: bool,
    /// Face culling.
    pub cull: CullMode,
    /// Color write mask.
    pub color_writes: ColorWrites,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            blend: BlendMode::Disabled,
            depth_compare: CompareFunction::Less,
            depth_write: true,
            cull: CullMode::Back,
            color_writes: ColorWrites::All,
        }
    }
}

impl PipelineState {
    /// State for full-screen passes: no depth test or write, no culling.
    pub fn fullscreen() -> Self {
        Self {
            depth_compare: CompareFunction::Always,
            depth_write: false,
            cull: CullMode::None,
            ..Self::default()
        }
    }

    /// State for depth-only rendering.
    pub fn depth_only() -> Self {
        Self {
            color_writes: ColorWrites::None,
            ..Self::default()
        }
    }

    /// Returns a copy with the given blend mode.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }

    /// Returns a copy with the given cull mode.
    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }

    /// Returns a copy with the given depth comparison.
    pub fn with_depth_compare(mut self, compare: CompareFunction) -> Self {
        self.depth_compare = compare;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_additive_blend_accumulates() {
        let dst = Vec4::new(0.2, 0.3, 0.4, 1.0);
        let src = Vec4::new(0.1, 0.1, 0.1, 1.0);
        let out = BlendMode::Additive.apply(src, dst);
        assert!((out.x - 0.3).abs() < 1e-6);
        assert!((out.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_alpha_blend_mixes() {
        let out = BlendMode::Alpha.apply(
            Vec4::new(1.0, 0.0, 0.0, 0.25),
            Vec4::new(0.0, 0.0, 1.0, 1.0),
        );
        assert!((out.x - 0.25).abs() < 1e-6);
        assert!((out.z - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_less_equal_accepts_equal_depth() {
        assert!(CompareFunction::LessEqual.passes(0.5, 0.5));
        assert!(!CompareFunction::Less.passes(0.5, 0.5));
    }
}
