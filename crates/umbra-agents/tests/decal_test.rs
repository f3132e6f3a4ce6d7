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

mod common;

use anyhow::Result;
use common::*;
use umbra_agents::{PipelineKind, RenderAgent};
use umbra_core::math::{Mat4, Vec3, Vec4};
use umbra_core::renderer::{MeshData, TextureId};
use umbra_data::{DecalEntity, Entity, EntityKind, Scene};

fn gbuffer(agent: &RenderAgent, attachment: usize) -> Vec<Vec4> {
    let targets = agent.frame_targets().unwrap();
    agent
        .device()
        .read_texture(targets.gbuffer.color(attachment), 0)
        .unwrap()
}

/// A unit decal box straddling the wall at `z = -1`.
fn decal(texture: Option<TextureId>) -> Entity {
    Entity::new("decal", EntityKind::Decal(DecalEntity { texture }))
        .with_model(Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0)))
}

fn wall_scene(agent: &mut RenderAgent) -> Scene {
    let plane = upload(agent.device_mut(), &MeshData::plane(3.0));
    let mut scene = Scene::new();
    scene.background_color = BACKGROUND;
    scene.add(wall(plane));
    scene
}

fn deferred_agent() -> RenderAgent {
    let mut settings = test_settings();
    settings.pipeline = PipelineKind::Deferred;
    software_agent(settings)
}

#[test]
fn test_decal_paints_albedo_inside_its_box_only() -> Result<()> {
    let mut agent = deferred_agent();
    let mut scene = wall_scene(&mut agent);
    let camera = front_camera(1.0);

    agent.render_scene(&mut scene, &camera)?;
    let plain_albedo = gbuffer(&agent, 0);
    let plain_normal = gbuffer(&agent, 1);
    let plain_material = gbuffer(&agent, 2);

    let red = solid_texture(agent.device_mut(), Vec4::new(1.0, 0.0, 0.0, 1.0));
    scene.add(decal(Some(red)));
    let stats = agent.render_scene(&mut scene, &camera)?;
    assert_eq!(stats.decals, 1);

    let albedo = gbuffer(&agent, 0);
    let normal = gbuffer(&agent, 1);
    let material = gbuffer(&agent, 2);

    // The box covers pixels 8..24 on both axes.
    assert_eq!(pixel(&albedo, 16, 16), Vec4::new(1.0, 0.0, 0.0, 1.0));
    assert_eq!(pixel(&albedo, 9, 22), Vec4::new(1.0, 0.0, 0.0, 1.0));
    for (x, y) in [(0, 0), (4, 16), (16, 28), (31, 31)] {
        assert_eq!(
            pixel(&albedo, x, y),
            pixel(&plain_albedo, x, y),
            "({}, {})",
            x,
            y
        );
        assert_eq!(pixel(&albedo, x, y), Vec4::ONE);
    }
    // Normals and roughness live in the second attachment; the decal keeps them.
    assert_eq!(normal, plain_normal);
    assert_eq!(pixel(&normal, 16, 16).w, 1.0);
    // Metallic lives in the alpha of the third attachment.
    assert_eq!(pixel(&material, 16, 16).w, pixel(&plain_material, 16, 16).w);
    Ok(())
}

#[test]
fn test_untextured_decal_is_skipped() -> Result<()> {
    let mut agent = deferred_agent();
    let mut scene = wall_scene(&mut agent);
    scene.add(decal(None));

    let stats = agent.render_scene(&mut scene, &front_camera(1.0))?;
    assert_eq!(stats.decals, 0);
    assert!(gbuffer(&agent, 0)
        .iter()
        .all(|texel| *texel == Vec4::ONE || texel.truncate() == Vec3::ZERO));
    Ok(())
}

#[test]
fn test_decal_reads_the_scratch_copy_of_the_gbuffer() -> Result<()> {
    let mut agent = deferred_agent();
    let mut scene = wall_scene(&mut agent);
    let red = solid_texture(agent.device_mut(), Vec4::new(1.0, 0.0, 0.0, 1.0));
    scene.add(decal(Some(red)));

    agent.render_scene(&mut scene, &front_camera(1.0))?;

    // Before drawing, the G-buffer is mirrored into the scratch target the
    // decal program samples; the decal itself lands only in the G-buffer.
    let targets = agent.frame_targets().unwrap();
    let device = agent.device();
    let scratch_albedo = device.read_texture(targets.decal_scratch.color(0), 0)?;
    let scratch_normal = device.read_texture(targets.decal_scratch.color(1), 0)?;
    assert_eq!(pixel(&scratch_albedo, 16, 16), Vec4::ONE);
    assert_eq!(scratch_normal, gbuffer(&agent, 1));
    assert_eq!(
        device.read_texture(targets.decal_scratch.depth.unwrap(), 0)?,
        device.read_texture(targets.gbuffer.depth.unwrap(), 0)?
    );
    Ok(())
}
