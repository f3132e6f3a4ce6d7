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

//! The software implementation of [`GraphicsDevice`].

use std::collections::HashMap;

use umbra_core::math::Vec4;
use umbra_core::renderer::{
    BlendMode, ColorWrites, CubeFace, DrawCall, Geometry, GraphicsDevice, MeshData, MeshId,
    RenderError, RenderTarget, RenderTargetDescriptor, RenderTargetId, ResourceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureId, Viewport,
};

use super::raster::{rasterize_fullscreen, rasterize_triangle, transform_mesh, Fragment};
use super::shaders::{input_textures, shade, Outputs, MAX_COLOR_ATTACHMENTS};
use super::texture::{SoftwareTexture, TextureStore};

/// The surface draws go to when no render target is bound.
#[derive(Debug, Clone, Copy)]
struct Surface {
    color: TextureId,
    depth: TextureId,
    width: u32,
    height: u32,
}

/// The attachments a draw writes to.
#[derive(Debug, Clone)]
struct Output {
    color: Vec<TextureId>,
    depth: Option<TextureId>,
    size: (u32, u32),
}

/// A [`GraphicsDevice`] that executes every program on the CPU.
///
/// It is deterministic and headless, which makes it the reference backend for
/// tests and offline rendering. Textures keep the precision of their format,
/// triangles are rasterized with a top-left fill rule and attributes are
/// interpolated perspective-correctly.
#[derive(Debug)]
pub struct SoftwareDevice {
    textures: TextureStore,
    targets: HashMap<RenderTargetId, RenderTarget>,
    meshes: HashMap<MeshId, MeshData>,
    surface: Surface,
    bound: Option<RenderTargetId>,
    viewport: Viewport,
    errors: Vec<RenderError>,
    next_texture_id: usize,
    next_target_id: usize,
    next_mesh_id: usize,
}

impl SoftwareDevice {
    /// Creates a device whose surface is `width` x `height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self, ResourceError> {
        let mut device = Self {
            textures: TextureStore::default(),
            targets: HashMap::new(),
            meshes: HashMap::new(),
            surface: Surface {
                color: TextureId(0),
                depth: TextureId(0),
                width,
                height,
            },
            bound: None,
            viewport: Viewport::full(width, height),
            errors: Vec::new(),
            next_texture_id: 0,
            next_target_id: 0,
            next_mesh_id: 0,
        };
        device.create_surface(width, height)?;
        log::info!("SoftwareDevice created with a {}x{} surface", width, height);
        Ok(device)
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<(), ResourceError> {
        let color = self.create_texture(&TextureDescriptor::new_2d(
            "surface_color",
            width,
            height,
            TextureFormat::Rgba8Unorm,
        ))?;
        let depth = self.create_texture(&TextureDescriptor::new_2d(
            "surface_depth",
            width,
            height,
            TextureFormat::Depth32Float,
        ))?;
        self.textures.get_mut(depth)?.fill(Vec4::ONE);
        self.surface = Surface {
            color,
            depth,
            width,
            height,
        };
        Ok(())
    }

    /// Number of live textures, including the surface attachments.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Number of live render targets.
    pub fn render_target_count(&self) -> usize {
        self.targets.len()
    }

    fn output(&self) -> Result<Output, RenderError> {
        match self.bound {
            None => Ok(Output {
                color: vec![self.surface.color],
                depth: Some(self.surface.depth),
                size: (self.surface.width, self.surface.height),
            }),
            Some(id) => {
                let target = self
                    .targets
                    .get(&id)
                    .ok_or(ResourceError::RenderTargetNotFound(id))?;
                Ok(Output {
                    color: target.color.clone(),
                    depth: target.depth,
                    size: (target.width, target.height),
                })
            }
        }
    }

    fn allocate_texture_id(&mut self) -> TextureId {
        let id = TextureId(self.next_texture_id);
        self.next_texture_id += 1;
        id
    }

    fn execute(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        for id in input_textures(&call.program) {
            if !self.textures.contains(id) {
                return Err(ResourceError::TextureNotFound(id).into());
            }
        }
        let output = self.output()?;
        if output.color.len() > MAX_COLOR_ATTACHMENTS {
            return Err(RenderError::RenderingFailed(format!(
                "{} color attachments bound, at most {} supported",
                output.color.len(),
                MAX_COLOR_ATTACHMENTS
            )));
        }

        // Attachments are taken out of the store while they are written, so
        // programs can read every other texture.
        let mut color: Vec<(TextureId, SoftwareTexture)> = Vec::with_capacity(output.color.len());
        for id in &output.color {
            let texture = self
                .textures
                .remove(*id)
                .ok_or(ResourceError::TextureNotFound(*id))?;
            color.push((*id, texture));
        }
        let mut depth = match output.depth {
            Some(id) => match self.textures.remove(id) {
                Some(texture) => Some((id, texture)),
                None => {
                    for (id, texture) in color {
                        self.textures.insert(id, texture);
                    }
                    return Err(ResourceError::TextureNotFound(id).into());
                }
            },
            None => None,
        };

        let result = self.rasterize(call, &output, &mut color, &mut depth);

        for (id, texture) in color {
            self.textures.insert(id, texture);
        }
        if let Some((id, texture)) = depth {
            self.textures.insert(id, texture);
        }
        result
    }

    fn rasterize(
        &self,
        call: &DrawCall,
        output: &Output,
        color: &mut [(TextureId, SoftwareTexture)],
        depth: &mut Option<(TextureId, SoftwareTexture)>,
    ) -> Result<(), RenderError> {
        let state = call.state;
        let textures = &self.textures;
        let mut process = |fragment: Fragment| {
            if let Some((_, depth)) = depth.as_ref() {
                let stored = depth.get(fragment.x, fragment.y).x;
                if !state.depth_compare.passes(fragment.depth, stored) {
                    return;
                }
            }
            let Some(outputs) = shade(&call.program, textures, &fragment) else {
                return;
            };
            write_color(color, &outputs, &fragment, state.blend, state.color_writes);
            if state.depth_write {
                if let Some((_, depth)) = depth.as_mut() {
                    depth.set(fragment.x, fragment.y, Vec4::splat(fragment.depth));
                }
            }
        };

        match &call.geometry {
            Geometry::FullscreenQuad => {
                rasterize_fullscreen(&self.viewport, output.size, &mut process);
            }
            Geometry::Mesh { mesh, model } => {
                let data = self
                    .meshes
                    .get(mesh)
                    .ok_or(ResourceError::MeshNotFound(*mesh))?;
                let view_projection = call.program.view_projection().ok_or_else(|| {
                    RenderError::RenderingFailed(format!(
                        "program '{}' cannot draw meshes",
                        call.program.name()
                    ))
                })?;
                let vertices = transform_mesh(data, model, &view_projection);
                for triangle in data.indices.chunks_exact(3) {
                    let fetch = |i: u32| vertices.get(i as usize).copied();
                    let (Some(a), Some(b), Some(c)) =
                        (fetch(triangle[0]), fetch(triangle[1]), fetch(triangle[2]))
                    else {
                        return Err(ResourceError::OutOfBounds.into());
                    };
                    rasterize_triangle(
                        [a, b, c],
                        &self.viewport,
                        output.size,
                        state.cull,
                        &mut process,
                    );
                }
            }
        }
        Ok(())
    }
}

fn write_color(
    color: &mut [(TextureId, SoftwareTexture)],
    outputs: &Outputs,
    fragment: &Fragment,
    blend: BlendMode,
    writes: ColorWrites,
) {
    if writes == ColorWrites::None {
        return;
    }
    for ((_, texture), src) in color.iter_mut().zip(outputs) {
        let dst = texture.get(fragment.x, fragment.y);
        let mut value = blend.apply(*src, dst);
        if writes == ColorWrites::Rgb {
            value.w = dst.w;
        }
        texture.set(fragment.x, fragment.y, value);
    }
}

impl GraphicsDevice for SoftwareDevice {
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let texture = SoftwareTexture::new(descriptor.clone())?;
        let id = self.allocate_texture_id();
        self.textures.insert(id, texture);
        log::trace!("Created texture {:?} '{}'", id, descriptor.label);
        Ok(id)
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        texels: &[Vec4],
    ) -> Result<(), ResourceError> {
        self.textures.get_mut(texture)?.write(layer, texels)
    }

    fn read_texture(&self, texture: TextureId, layer: u32) -> Result<Vec<Vec4>, ResourceError> {
        Ok(self.textures.get(texture)?.texels(layer)?.to_vec())
    }

    fn texture_descriptor(&self, texture: TextureId) -> Result<TextureDescriptor, ResourceError> {
        Ok(self.textures.get(texture)?.descriptor.clone())
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), ResourceError> {
        self.textures
            .remove(texture)
            .map(|_| ())
            .ok_or(ResourceError::TextureNotFound(texture))
    }

    fn copy_texture(
        &mut self,
        source: TextureId,
        destination: TextureId,
    ) -> Result<(), ResourceError> {
        let src = self.textures.get(source)?;
        let layers = src.layer_count();
        let size = src.level_size(0);
        let data = (0..layers)
            .map(|layer| src.texels(layer).map(<[Vec4]>::to_vec))
            .collect::<Result<Vec<_>, _>>()?;

        let dst = self.textures.get_mut(destination)?;
        if dst.level_size(0) != size || dst.layer_count() != layers {
            return Err(ResourceError::InvalidDescriptor(format!(
                "cannot copy {:?} into {:?}: sizes differ",
                source, destination
            )));
        }
        for (layer, texels) in data.iter().enumerate() {
            dst.write(layer as u32, texels)?;
        }
        Ok(())
    }

    fn copy_to_cube_face(
        &mut self,
        source: TextureId,
        destination: TextureId,
        face: CubeFace,
    ) -> Result<(), ResourceError> {
        let src = self.textures.get(source)?;
        let size = src.level_size(0);
        let texels = src.texels(0)?.to_vec();

        let dst = self.textures.get_mut(destination)?;
        if dst.descriptor.dimension != TextureDimension::Cube {
            return Err(ResourceError::InvalidDescriptor(format!(
                "{:?} is not a cube texture",
                destination
            )));
        }
        if dst.level_size(0) != size {
            return Err(ResourceError::InvalidDescriptor(format!(
                "face size {:?} does not match cube size {:?}",
                size,
                dst.level_size(0)
            )));
        }
        dst.write(face.layer(), &texels)
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), ResourceError> {
        self.textures.get_mut(texture)?.generate_mipmaps();
        Ok(())
    }

    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTarget, ResourceError> {
        if descriptor.width == 0 || descriptor.height == 0 {
            return Err(ResourceError::InvalidDescriptor(format!(
                "render target '{}' has zero size",
                descriptor.label
            )));
        }
        let mut color = Vec::with_capacity(descriptor.color_formats.len());
        for (i, format) in descriptor.color_formats.iter().enumerate() {
            color.push(self.create_texture(&TextureDescriptor::new_2d(
                format!("{}_color{}", descriptor.label, i),
                descriptor.width,
                descriptor.height,
                *format,
            ))?);
        }
        let depth = if descriptor.depth {
            let id = self.create_texture(&TextureDescriptor::new_2d(
                format!("{}_depth", descriptor.label),
                descriptor.width,
                descriptor.height,
                TextureFormat::Depth32Float,
            ))?;
            self.textures.get_mut(id)?.fill(Vec4::ONE);
            Some(id)
        } else {
            None
        };

        let id = RenderTargetId(self.next_target_id);
        self.next_target_id += 1;
        let target = RenderTarget {
            id,
            width: descriptor.width,
            height: descriptor.height,
            color,
            depth,
        };
        self.targets.insert(id, target.clone());
        log::debug!(
            "Created render target {:?} '{}' ({}x{})",
            id,
            descriptor.label,
            descriptor.width,
            descriptor.height
        );
        Ok(target)
    }

    fn destroy_render_target(&mut self, target: RenderTargetId) -> Result<(), ResourceError> {
        let entry = self
            .targets
            .remove(&target)
            .ok_or(ResourceError::RenderTargetNotFound(target))?;
        if self.bound == Some(target) {
            self.bound = None;
            self.viewport = Viewport::full(self.surface.width, self.surface.height);
        }
        for texture in entry.color.into_iter().chain(entry.depth) {
            self.textures.remove(texture);
        }
        Ok(())
    }

    fn bind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError> {
        if let Some(bound) = self.bound {
            let err = RenderError::TargetAlreadyBound {
                bound,
                requested: target,
            };
            self.errors.push(err.clone());
            return Err(err);
        }
        let entry = self
            .targets
            .get(&target)
            .ok_or(ResourceError::RenderTargetNotFound(target))?;
        self.viewport = entry.full_viewport();
        self.bound = Some(target);
        Ok(())
    }

    fn unbind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError> {
        if self.bound != Some(target) {
            let err = RenderError::UnbalancedUnbind {
                bound: self.bound,
                requested: target,
            };
            self.errors.push(err.clone());
            return Err(err);
        }
        self.bound = None;
        self.viewport = Viewport::full(self.surface.width, self.surface.height);
        Ok(())
    }

    fn bound_render_target(&self) -> Option<RenderTargetId> {
        self.bound
    }

    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, ResourceError> {
        if data.indices.len() % 3 != 0 {
            return Err(ResourceError::InvalidDescriptor(
                "mesh index count is not a multiple of 3".into(),
            ));
        }
        let id = MeshId(self.next_mesh_id);
        self.next_mesh_id += 1;
        self.meshes.insert(id, data.clone());
        Ok(id)
    }

    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) {
        let output = match self.output() {
            Ok(output) => output,
            Err(e) => {
                self.errors.push(e);
                return;
            }
        };
        if let Some(value) = color {
            for id in &output.color {
                if let Ok(texture) = self.textures.get_mut(*id) {
                    texture.fill(value);
                }
            }
        }
        if let (Some(value), Some(id)) = (depth, output.depth) {
            if let Ok(texture) = self.textures.get_mut(id) {
                texture.fill(Vec4::splat(value));
            }
        }
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        self.execute(call).inspect_err(|e| {
            log::warn!("SoftwareDevice: {} draw failed: {}", call.program.name(), e);
        })
    }

    fn surface_size(&self) -> (u32, u32) {
        (self.surface.width, self.surface.height)
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), ResourceError> {
        if width == 0 || height == 0 {
            return Err(ResourceError::InvalidDescriptor("surface has zero size".into()));
        }
        let (old_color, old_depth) = (self.surface.color, self.surface.depth);
        self.create_surface(width, height)?;
        self.textures.remove(old_color);
        self.textures.remove(old_depth);
        if self.bound.is_none() {
            self.viewport = Viewport::full(width, height);
        }
        log::info!("SoftwareDevice surface resized to {}x{}", width, height);
        Ok(())
    }

    fn surface_texture(&self) -> TextureId {
        self.surface.color
    }

    fn take_errors(&mut self) -> Vec<RenderError> {
        std::mem::take(&mut self.errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::math::{Mat4, Vec3};
    use umbra_core::renderer::{DepthProgram, PipelineState, Program};

    fn device() -> SoftwareDevice {
        SoftwareDevice::new(16, 16).unwrap()
    }

    #[test]
    fn test_binding_twice_is_an_error_and_recorded() {
        let mut device = device();
        let a = device
            .create_render_target(&RenderTargetDescriptor::depth_only("a", 4))
            .unwrap();
        let b = device
            .create_render_target(&RenderTargetDescriptor::depth_only("b", 4))
            .unwrap();
        device.bind_render_target(a.id).unwrap();
        assert!(matches!(
            device.bind_render_target(b.id),
            Err(RenderError::TargetAlreadyBound { .. })
        ));
        assert!(matches!(
            device.unbind_render_target(b.id),
            Err(RenderError::UnbalancedUnbind { .. })
        ));
        device.unbind_render_target(a.id).unwrap();
        assert_eq!(device.take_errors().len(), 2);
        assert!(device.take_errors().is_empty());
    }

    #[test]
    fn test_destroying_a_target_frees_its_attachments() {
        let mut device = device();
        let before = device.texture_count();
        let target = device
            .create_render_target(&RenderTargetDescriptor::new(
                "t",
                4,
                4,
                vec![TextureFormat::Rgba8Unorm, TextureFormat::Rgba16Float],
            ))
            .unwrap();
        assert_eq!(device.texture_count(), before + 3);
        device.destroy_render_target(target.id).unwrap();
        assert_eq!(device.texture_count(), before);
    }

    #[test]
    fn test_clear_respects_format() {
        let mut device = device();
        let target = device
            .create_render_target(&RenderTargetDescriptor::new(
                "t",
                2,
                2,
                vec![TextureFormat::R8Unorm],
            ))
            .unwrap();
        device.bind_render_target(target.id).unwrap();
        device.clear(Some(Vec4::new(2.0, 0.5, 0.5, 0.5)), None);
        device.unbind_render_target(target.id).unwrap();
        let texels = device.read_texture(target.color(0), 0).unwrap();
        assert!(texels.iter().all(|t| *t == Vec4::new(1.0, 0.0, 0.0, 1.0)));
    }

    #[test]
    fn test_depth_only_draw_writes_nearest_depth() {
        let mut device = device();
        let white = device
            .create_texture(&TextureDescriptor::new_2d("w", 1, 1, TextureFormat::Rgba8Unorm))
            .unwrap();
        device.write_texture(white, 0, &[Vec4::ONE]).unwrap();
        let mesh = device.create_mesh(&MeshData::unit_cube()).unwrap();
        let target = device
            .create_render_target(&RenderTargetDescriptor::depth_only("shadow", 8))
            .unwrap();

        let view_projection = Mat4::orthographic_rh(-1.0, 1.0, -1.0, 1.0, 0.0, 10.0)
            * Mat4::look_at_rh(Vec3::new(0.0, 5.0, 0.0), Vec3::ZERO, Vec3::Z);
        device.bind_render_target(target.id).unwrap();
        device.clear(None, Some(1.0));
        device
            .draw(&DrawCall {
                geometry: Geometry::Mesh {
                    mesh,
                    model: Mat4::IDENTITY,
                },
                program: Program::Depth(DepthProgram {
                    view_projection,
                    color_texture: white,
                    alpha: 1.0,
                    alpha_cutoff: 0.0,
                }),
                state: PipelineState::depth_only(),
            })
            .unwrap();
        device.unbind_render_target(target.id).unwrap();

        let depth = device.read_texture(target.depth.unwrap(), 0).unwrap();
        // The top face at y = 0.5 is 4.5 units from the light: depth 0.45.
        let center = depth[4 * 8 + 4].x;
        assert!((center - 0.45).abs() < 1e-4, "center depth {center}");
        // The cube spans half of the map.
        let covered = depth.iter().filter(|d| d.x < 1.0).count();
        assert_eq!(covered, 16);
    }

    #[test]
    fn test_missing_input_texture_fails_the_draw() {
        let mut device = device();
        let result = device.draw(&DrawCall {
            geometry: Geometry::FullscreenQuad,
            program: Program::Copy {
                source: TextureId(999),
                grayscale: false,
            },
            state: PipelineState::fullscreen(),
        });
        assert!(matches!(
            result,
            Err(RenderError::Resource(ResourceError::TextureNotFound(TextureId(999))))
        ));
    }
}
