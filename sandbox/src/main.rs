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

// Umbra sandbox
// Renders a small demo scene with the software device and saves it as a PNG.

use std::f32::consts::FRAC_PI_2;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use umbra_agents::{RenderAgent, RendererSettings};
use umbra_core::math::{Mat4, UVec3, Vec3, Vec4};
use umbra_core::renderer::{GraphicsDevice, MeshData, TextureDescriptor, TextureFormat, TextureId};
use umbra_data::{
    look_toward, Camera, DecalEntity, Entity, EntityKind, LightEntity, LightKind, Material,
    MeshHandle, Node, Prefab, ReflectionProbeEntity, Scene,
};
use umbra_infra::{save_png, SoftwareDevice};

const WIDTH: u32 = 320;
const HEIGHT: u32 = 180;

fn upload(device: &mut dyn GraphicsDevice, data: &MeshData) -> Result<MeshHandle> {
    let id = device.create_mesh(data)?;
    Ok(MeshHandle::new(id, data))
}

fn prefab(name: &str, mesh: MeshHandle, material: Material, model: Mat4) -> Entity {
    let node = Node::with_mesh(name, mesh, Arc::new(material));
    let prefab = Arc::new(Prefab::new(name, node));
    Entity::new(name, EntityKind::Prefab(Some(prefab))).with_model(model)
}

/// A checkerboard with transparent holes, used as decal image.
fn checker_texture(device: &mut dyn GraphicsDevice) -> Result<TextureId> {
    let size = 8;
    let texels: Vec<Vec4> = (0..size * size)
        .map(|i| {
            if (i % size + i / size) % 2 == 0 {
                Vec4::new(0.9, 0.2, 0.1, 1.0)
            } else {
                Vec4::ZERO
            }
        })
        .collect();
    let texture = device.create_texture(&TextureDescriptor::new_2d(
        "checker",
        size,
        size,
        TextureFormat::Rgba8Unorm,
    ))?;
    device.write_texture(texture, 0, &texels)?;
    Ok(texture)
}

fn build_scene(device: &mut dyn GraphicsDevice) -> Result<Scene> {
    let cube = upload(device, &MeshData::unit_cube())?;
    let ground = upload(device, &MeshData::plane(20.0))?;
    let sphere = upload(device, &MeshData::uv_sphere(0.75, 24, 16))?;

    let mut scene = Scene::new();
    scene.background_color = Vec3::new(0.35, 0.45, 0.6);
    scene.ambient_light = Vec3::splat(0.05);

    scene.add(prefab(
        "ground",
        ground,
        Material::from_color(Vec4::new(0.6, 0.6, 0.55, 1.0)),
        Mat4::IDENTITY,
    ));

    // A small stack: the top box hangs off its parent node.
    let box_material = Arc::new(Material {
        color: Vec4::new(0.8, 0.3, 0.2, 1.0),
        roughness_factor: 0.4,
        ..Default::default()
    });
    let stack = Node::with_mesh("base", cube, box_material.clone())
        .with_transform(Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)))
        .with_child(
            Node::with_mesh("top", cube, box_material).with_transform(
                Mat4::from_translation(Vec3::new(0.2, 1.0, 0.1))
                    * Mat4::from_rotation_y(0.6)
                    * Mat4::from_scale(Vec3::splat(0.7)),
            ),
        );
    scene.add(
        Entity::new(
            "stack",
            EntityKind::Prefab(Some(Arc::new(Prefab::new("stack", stack)))),
        )
        .with_model(Mat4::from_translation(Vec3::new(-1.5, 0.0, 0.0))),
    );

    scene.add(prefab(
        "mirror_ball",
        sphere,
        Material {
            metallic_factor: 1.0,
            roughness_factor: 0.1,
            ..Default::default()
        },
        Mat4::from_translation(Vec3::new(1.5, 0.75, 0.5)),
    ));
    scene.add(prefab(
        "glass",
        cube,
        Material {
            color: Vec4::new(0.3, 0.6, 1.0, 0.4),
            alpha_mode: umbra_data::AlphaMode::Blend,
            ..Default::default()
        },
        Mat4::from_translation(Vec3::new(0.0, 0.5, 2.0)),
    ));

    let mut sun = LightEntity::new(LightKind::Directional { area_size: 20.0 });
    sun.color = Vec3::new(1.0, 0.95, 0.85);
    sun.max_distance = 40.0;
    sun.cast_shadows = true;
    scene.add(
        Entity::new("sun", EntityKind::Light(sun)).with_model(look_toward(
            Vec3::ZERO,
            Vec3::new(-0.4, -1.0, -0.3),
            Vec3::Y,
        )),
    );

    let mut spot = LightEntity::new(LightKind::spot());
    spot.color = Vec3::new(0.2, 0.4, 1.0);
    spot.intensity = 2.0;
    spot.max_distance = 15.0;
    spot.cast_shadows = true;
    scene.add(
        Entity::new("spot", EntityKind::Light(spot)).with_model(look_toward(
            Vec3::new(3.0, 4.0, 3.0),
            Vec3::ZERO,
            Vec3::Y,
        )),
    );

    let mut lamp = LightEntity::new(LightKind::Point);
    lamp.color = Vec3::new(1.0, 0.6, 0.2);
    lamp.max_distance = 5.0;
    scene.add(
        Entity::new("lamp", EntityKind::Light(lamp))
            .with_model(Mat4::from_translation(Vec3::new(-0.5, 1.5, 1.5))),
    );

    let checker = checker_texture(device)?;
    scene.add(
        Entity::new(
            "decal",
            EntityKind::Decal(DecalEntity {
                texture: Some(checker),
            }),
        )
        .with_model(
            Mat4::from_translation(Vec3::new(0.5, 0.0, -1.5))
                * Mat4::from_rotation_x(-FRAC_PI_2)
                * Mat4::from_scale(Vec3::new(2.0, 2.0, 0.5)),
        ),
    );

    scene.add(
        Entity::new(
            "probe",
            EntityKind::ReflectionProbe(ReflectionProbeEntity::default()),
        )
        .with_model(Mat4::from_translation(Vec3::new(1.5, 0.75, 0.5))),
    );
    Ok(scene)
}

fn load_settings() -> Result<RendererSettings> {
    match std::env::args().nth(1) {
        Some(path) => RendererSettings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path)),
        None => {
            let mut settings = RendererSettings::default();
            settings.shadows.map_size = 512;
            settings.probes.start = Vec3::new(-4.0, 0.5, -4.0);
            settings.probes.end = Vec3::new(4.0, 2.5, 4.0);
            settings.probes.dim = UVec3::new(3, 2, 3);
            settings.probes.capture_size = 16;
            settings.reflections.probe_size = 32;
            settings.post.vignette = 0.3;
            settings.post.bloom = 0.2;
            Ok(settings)
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let output = std::env::args()
        .nth(2)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("umbra_frame.png"));

    let device = SoftwareDevice::new(WIDTH, HEIGHT)?;
    let mut agent = RenderAgent::new(Box::new(device), settings)?;
    let mut scene = build_scene(agent.device_mut())?;

    agent
        .generate_probes(&mut scene)
        .context("Failed to bake irradiance probes")?;
    agent
        .update_reflection_probes(&mut scene)
        .context("Failed to capture reflection probes")?;

    let camera = Camera::new_perspective(
        50f32.to_radians(),
        WIDTH as f32 / HEIGHT as f32,
        0.1,
        100.0,
    )
    .look_at(Vec3::new(4.0, 3.5, 7.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
    let stats = agent.render_scene(&mut scene, &camera)?;
    log::info!(
        "Frame rendered: {} draws, {} items, {} lights, {} shadow maps, {} decals",
        stats.draw_calls,
        stats.visible_items,
        stats.lights,
        stats.shadow_maps,
        stats.decals
    );

    save_png(agent.device(), agent.device().surface_texture(), &output)?;
    Ok(())
}
