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

//! Resource identifiers, descriptors and the draw call model.

pub mod core;
pub mod cube;
pub mod mesh;
pub mod pipeline;
pub mod program;
pub mod target;
pub mod texture;

pub use self::core::*;
pub use cube::CubeFace;
pub use mesh::{Geometry, MeshData};
pub use pipeline::{BlendMode, ColorWrites, CompareFunction, CullMode, PipelineState};
pub use program::*;
pub use target::{RenderTarget, RenderTargetDescriptor, Viewport};
pub use texture::{FilterMode, TextureDescriptor, TextureDimension, TextureFormat};

/// A fully specified draw: what to rasterize, with which program and state.
#[derive(Debug, Clone)]
pub struct DrawCall {
    /// The geometry to rasterize.
    pub geometry: Geometry,
    /// The shader program and its parameters.
    pub program: Program,
    /// Fixed-function state for this draw.
    pub state: PipelineState,
}
