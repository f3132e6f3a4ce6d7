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

//! Defines the `GraphicsDevice` trait, the main interface for GPU resource
//! management and command submission.

use crate::math::Vec4;
use crate::renderer::api::{
    core::{MeshId, RenderTargetId, TextureId},
    cube::CubeFace,
    mesh::MeshData,
    target::{RenderTarget, RenderTargetDescriptor, Viewport},
    texture::TextureDescriptor,
    DrawCall,
};
use crate::renderer::error::{RenderError, ResourceError};

/// A trait representing a logical graphics device.
///
/// This is the primary interface for creating and managing GPU resources and
/// submitting draws. It is an abstraction over a specific backend.
///
/// Submission is single-threaded and immediate: every call is executed in
/// order against the currently bound output. At most one off-screen render
/// target is bound at a time; when none is bound, draws go to the surface.
pub trait GraphicsDevice {
    // --- Textures ---

    /// Creates a texture filled with zeros.
    ///
    /// # Errors
    /// Returns [`ResourceError::InvalidDescriptor`] for zero-sized textures.
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError>;

    /// Uploads the mip level 0 texels of one layer of a texture.
    ///
    /// ## Arguments
    /// * `layer` - `0` for 2D textures, the face layer for cube textures.
    /// * `texels` - Exactly `width * height` values, row-major from the top-left.
    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        texels: &[Vec4],
    ) -> Result<(), ResourceError>;

    /// Reads back mip level 0 of one layer of a texture.
    fn read_texture(&self, texture: TextureId, layer: u32) -> Result<Vec<Vec4>, ResourceError>;

    /// Returns the descriptor the texture was created with.
    fn texture_descriptor(&self, texture: TextureId) -> Result<TextureDescriptor, ResourceError>;

    /// Destroys a texture.
    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), ResourceError>;

    /// Copies the whole contents of one texture into another of the same size.
    fn copy_texture(
        &mut self,
        source: TextureId,
        destination: TextureId,
    ) -> Result<(), ResourceError>;

    /// Copies a 2D texture into one face of a cube texture of the same size.
    fn copy_to_cube_face(
        &mut self,
        source: TextureId,
        destination: TextureId,
        face: CubeFace,
    ) -> Result<(), ResourceError>;

    /// Regenerates the full mip chain of a mipmapped texture from level 0.
    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), ResourceError>;

    // --- Render targets ---

    /// Creates an off-screen render target and its attachment textures.
    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTarget, ResourceError>;

    /// Destroys a render target and its attachment textures.
    fn destroy_render_target(&mut self, target: RenderTargetId) -> Result<(), ResourceError>;

    /// Makes `target` the output of subsequent clears and draws and resets the
    /// viewport to cover it.
    ///
    /// # Errors
    /// Returns [`RenderError::TargetAlreadyBound`] if another target is bound.
    fn bind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError>;

    /// Restores the surface as the output.
    ///
    /// # Errors
    /// Returns [`RenderError::UnbalancedUnbind`] if `target` is not the bound target.
    fn unbind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError>;

    /// The currently bound render target, `None` meaning the surface.
    fn bound_render_target(&self) -> Option<RenderTargetId>;

    // --- Meshes ---

    /// Uploads mesh data.
    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, ResourceError>;

    // --- Commands ---

    /// Clears the current output. `None` leaves the corresponding buffer as is.
    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>);

    /// Restricts subsequent draws to a rectangle of the current output.
    fn set_viewport(&mut self, viewport: Viewport);

    /// Executes a draw against the current output.
    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError>;

    // --- Surface ---

    /// Size of the presentation surface.
    fn surface_size(&self) -> (u32, u32);

    /// Resizes the presentation surface. Its contents are discarded.
    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), ResourceError>;

    /// The texture backing the presentation surface.
    fn surface_texture(&self) -> TextureId;

    // --- Diagnostics ---

    /// Returns and clears the errors recorded since the last call.
    fn take_errors(&mut self) -> Vec<RenderError>;
}
