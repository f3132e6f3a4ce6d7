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

//! Scene builders and a recording device shared by the agent tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use umbra_agents::{RenderAgent, RendererSettings};
use umbra_core::math::{Mat4, Vec3, Vec4};
use umbra_core::renderer::{
    CubeFace, DrawCall, GraphicsDevice, MeshData, MeshId, RenderError, RenderTarget,
    RenderTargetDescriptor, RenderTargetId, ResourceError, TextureDescriptor, TextureFormat,
    TextureId, Viewport,
};
use umbra_data::{
    look_toward, Camera, Entity, EntityKind, LightEntity, LightKind, Material, MeshHandle, Node,
    Prefab,
};
use umbra_infra::SoftwareDevice;

pub const SIZE: u32 = 32;
pub const BACKGROUND: Vec3 = Vec3::new(0.2, 0.2, 0.2);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Small targets and no occlusion, so that pixels are fully predictable.
pub fn test_settings() -> RendererSettings {
    let mut settings = RendererSettings::default();
    settings.ssao.enabled = false;
    settings.shadows.map_size = 256;
    settings.probes.capture_size = 8;
    settings.reflections.probe_size = 8;
    settings
}

pub fn software_agent(settings: RendererSettings) -> RenderAgent {
    init_logging();
    let device = SoftwareDevice::new(SIZE, SIZE).unwrap();
    RenderAgent::new(Box::new(device), settings).unwrap()
}

pub fn upload(device: &mut dyn GraphicsDevice, data: &MeshData) -> MeshHandle {
    let id = device.create_mesh(data).unwrap();
    MeshHandle::new(id, data)
}

/// A 1x1 texture filled with `color`.
pub fn solid_texture(device: &mut dyn GraphicsDevice, color: Vec4) -> TextureId {
    let texture = device
        .create_texture(&TextureDescriptor::new_2d(
            "solid",
            1,
            1,
            TextureFormat::Rgba8Unorm,
        ))
        .unwrap();
    device.write_texture(texture, 0, &[color]).unwrap();
    texture
}

pub fn mesh_entity(name: &str, mesh: MeshHandle, material: Material, model: Mat4) -> Entity {
    let node = Node::with_mesh(name, mesh, Arc::new(material));
    let prefab = Arc::new(Prefab::new(name, node));
    Entity::new(name, EntityKind::Prefab(Some(prefab))).with_model(model)
}

/// A wall of side 3 at `z = -1`, facing the camera.
pub fn wall(plane: MeshHandle) -> Entity {
    mesh_entity(
        "wall",
        plane,
        Material::default(),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0))
            * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
    )
}

pub fn directional_light(name: &str, direction: Vec3, cast_shadows: bool) -> Entity {
    let mut light = LightEntity::new(LightKind::Directional { area_size: 20.0 });
    light.max_distance = 50.0;
    light.cast_shadows = cast_shadows;
    Entity::new(name, EntityKind::Light(light)).with_model(look_toward(
        Vec3::ZERO,
        direction,
        Vec3::Y,
    ))
}

pub fn point_light(name: &str, position: Vec3, color: Vec3) -> Entity {
    let mut light = LightEntity::new(LightKind::Point);
    light.color = color;
    light.max_distance = 10.0;
    Entity::new(name, EntityKind::Light(light)).with_model(Mat4::from_translation(position))
}

/// Orthographic camera on +Z looking at the origin; `half` world units span
/// half of the image.
pub fn front_camera(half: f32) -> Camera {
    Camera::new_orthographic(-half, half, -half, half, 0.1, 20.0).look_at(
        Vec3::new(0.0, 0.0, 5.0),
        Vec3::ZERO,
        Vec3::Y,
    )
}

pub fn illumination(agent: &RenderAgent) -> Vec<Vec4> {
    let targets = agent.frame_targets().unwrap();
    agent
        .device()
        .read_texture(targets.illumination.color(0), 0)
        .unwrap()
}

pub fn surface(agent: &RenderAgent) -> Vec<Vec4> {
    let device = agent.device();
    device.read_texture(device.surface_texture(), 0).unwrap()
}

pub fn pixel(texels: &[Vec4], x: u32, y: u32) -> Vec4 {
    texels[(y * SIZE + x) as usize]
}

pub fn is_background(texel: Vec4) -> bool {
    (texel.truncate() - BACKGROUND).abs().max_element() < 1e-5
}

/// Device calls observed by [`RecordingDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEvent {
    Bind(RenderTargetId),
    Unbind(RenderTargetId),
    Draw {
        target: Option<RenderTargetId>,
        program: &'static str,
    },
    Errors(usize),
    CreateTexture(TextureId),
    DestroyTexture(TextureId),
    CreateTarget(RenderTargetId),
    DestroyTarget(RenderTargetId),
}

/// Shared view of the events a [`RecordingDevice`] logged.
pub type EventLog = Arc<Mutex<Vec<DeviceEvent>>>;

/// A software device that logs binds, draws, resource lifetimes and reported
/// errors.
pub struct RecordingDevice {
    inner: SoftwareDevice,
    log: EventLog,
}

impl RecordingDevice {
    pub fn new(width: u32, height: u32) -> (Self, EventLog) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let device = Self {
            inner: SoftwareDevice::new(width, height).unwrap(),
            log: log.clone(),
        };
        (device, log)
    }

    fn record(&self, event: DeviceEvent) {
        self.log.lock().unwrap().push(event);
    }
}

impl GraphicsDevice for RecordingDevice {
    fn create_texture(
        &mut self,
        descriptor: &TextureDescriptor,
    ) -> Result<TextureId, ResourceError> {
        let texture = self.inner.create_texture(descriptor)?;
        self.record(DeviceEvent::CreateTexture(texture));
        Ok(texture)
    }

    fn write_texture(
        &mut self,
        texture: TextureId,
        layer: u32,
        texels: &[Vec4],
    ) -> Result<(), ResourceError> {
        self.inner.write_texture(texture, layer, texels)
    }

    fn read_texture(&self, texture: TextureId, layer: u32) -> Result<Vec<Vec4>, ResourceError> {
        self.inner.read_texture(texture, layer)
    }

    fn texture_descriptor(&self, texture: TextureId) -> Result<TextureDescriptor, ResourceError> {
        self.inner.texture_descriptor(texture)
    }

    fn destroy_texture(&mut self, texture: TextureId) -> Result<(), ResourceError> {
        self.record(DeviceEvent::DestroyTexture(texture));
        self.inner.destroy_texture(texture)
    }

    fn copy_texture(
        &mut self,
        source: TextureId,
        destination: TextureId,
    ) -> Result<(), ResourceError> {
        self.inner.copy_texture(source, destination)
    }

    fn copy_to_cube_face(
        &mut self,
        source: TextureId,
        destination: TextureId,
        face: CubeFace,
    ) -> Result<(), ResourceError> {
        self.inner.copy_to_cube_face(source, destination, face)
    }

    fn generate_mipmaps(&mut self, texture: TextureId) -> Result<(), ResourceError> {
        self.inner.generate_mipmaps(texture)
    }

    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTarget, ResourceError> {
        let target = self.inner.create_render_target(descriptor)?;
        self.record(DeviceEvent::CreateTarget(target.id));
        Ok(target)
    }

    fn destroy_render_target(&mut self, target: RenderTargetId) -> Result<(), ResourceError> {
        self.record(DeviceEvent::DestroyTarget(target));
        self.inner.destroy_render_target(target)
    }

    fn bind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError> {
        self.record(DeviceEvent::Bind(target));
        self.inner.bind_render_target(target)
    }

    fn unbind_render_target(&mut self, target: RenderTargetId) -> Result<(), RenderError> {
        self.record(DeviceEvent::Unbind(target));
        self.inner.unbind_render_target(target)
    }

    fn bound_render_target(&self) -> Option<RenderTargetId> {
        self.inner.bound_render_target()
    }

    fn create_mesh(&mut self, data: &MeshData) -> Result<MeshId, ResourceError> {
        self.inner.create_mesh(data)
    }

    fn clear(&mut self, color: Option<Vec4>, depth: Option<f32>) {
        self.inner.clear(color, depth)
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.inner.set_viewport(viewport)
    }

    fn draw(&mut self, call: &DrawCall) -> Result<(), RenderError> {
        self.record(DeviceEvent::Draw {
            target: self.inner.bound_render_target(),
            program: call.program.name(),
        });
        self.inner.draw(call)
    }

    fn surface_size(&self) -> (u32, u32) {
        self.inner.surface_size()
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), ResourceError> {
        self.inner.resize_surface(width, height)
    }

    fn surface_texture(&self) -> TextureId {
        self.inner.surface_texture()
    }

    fn take_errors(&mut self) -> Vec<RenderError> {
        let errors = self.inner.take_errors();
        if !errors.is_empty() {
            self.record(DeviceEvent::Errors(errors.len()));
        }
        errors
    }
}
