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

//! Off-screen render targets.

use super::core::{RenderTargetId, TextureId};
use super::texture::TextureFormat;
use std::borrow::Cow;

/// A descriptor used to create an off-screen render target.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// A debug label.
    pub label: Cow<'static, str>,
    /// Width of every attachment.
    pub width: u32,
    /// Height of every attachment.
    pub height: u32,
    /// Formats of the ordered color attachments. May be empty (depth-only).
    pub color_formats: Vec<TextureFormat>,
    /// Whether the target owns a `Depth32Float` attachment.
    pub depth: bool,
}

impl RenderTargetDescriptor {
    /// A target with the given color attachments and a depth attachment.
    pub fn new(
        label: impl Into<Cow<'static, str>>,
        width: u32,
        height: u32,
        color_formats: Vec<TextureFormat>,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            color_formats,
            depth: true,
        }
    }

    /// A target with only a depth attachment, as used for shadow maps.
    pub fn depth_only(label: impl Into<Cow<'static, str>>, size: u32) -> Self {
        Self {
            label: label.into(),
            width: size,
            height: size,
            color_formats: Vec::new(),
            depth: true,
        }
    }

    /// Drops the depth attachment.
    pub fn without_depth(mut self) -> Self {
        self.depth = false;
        self
    }
}

/// A created render target and the textures backing its attachments.
///
/// The attachment textures are owned by the target: destroying the target
/// destroys them too.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTarget {
    /// The target handle.
    pub id: RenderTargetId,
    /// Width of every attachment.
    pub width: u32,
    /// Height of every attachment.
    pub height: u32,
    /// Ordered color attachments.
    pub color: Vec<TextureId>,
    /// Depth attachment, if any.
    pub depth: Option<TextureId>,
}

impl RenderTarget {
    /// The color attachment at `index`.
    ///
    /// # Panics
    /// Panics if the target has fewer attachments. Targets are created with a
    /// fixed layout, so an out-of-range index is a programming error.
    pub fn color(&self, index: usize) -> TextureId {
        self.color[index]
    }

    /// A viewport covering the whole target.
    pub fn full_viewport(&self) -> Viewport {
        Viewport::full(self.width, self.height)
    }
}

/// A rectangle of the bound output, in pixels, with the origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl Viewport {
    /// A viewport covering a `width` x `height` output.
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}
