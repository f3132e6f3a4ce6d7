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

use common::*;
use std::sync::Arc;
use umbra_agents::{PipelineKind, RenderAgent};
use umbra_core::math::{Mat4, Vec3, Vec4};
use umbra_core::renderer::MeshData;
use umbra_data::{AlphaMode, EntityKind, Material, Node, Scene};
use umbra_lanes::LightingMode;

/// A unit cube at the origin lit head-on by a directional light.
fn cube_scene(agent: &mut RenderAgent) -> Scene {
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let mut scene = Scene::new();
    scene.background_color = BACKGROUND;
    scene.add(mesh_entity("cube", cube, Material::default(), Mat4::IDENTITY));
    scene.add(directional_light("sun", Vec3::NEG_Z, false));
    scene
}

/// The cube in front of a wall, with two point lights and some ambient.
fn lit_room(agent: &mut RenderAgent) -> Scene {
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let plane = upload(agent.device_mut(), &MeshData::plane(3.0));
    let mut scene = Scene::new();
    scene.background_color = BACKGROUND;
    scene.ambient_light = Vec3::splat(0.1);
    scene.add(mesh_entity("cube", cube, Material::default(), Mat4::IDENTITY));
    scene.add(wall(plane));
    scene.add(point_light("red", Vec3::new(1.0, 1.0, 2.0), Vec3::new(1.0, 0.5, 0.25)));
    scene.add(point_light(
        "blue",
        Vec3::new(-1.0, -0.5, 2.0),
        Vec3::new(0.25, 0.5, 1.0),
    ));
    scene.add(point_light("white", Vec3::new(0.0, 2.0, 1.0), Vec3::ONE));
    scene
}

fn set_visible(scene: &mut Scene, name: &str, visible: bool) {
    scene.find_mut(name).unwrap().visible = visible;
}

fn assert_images_close(a: &[Vec4], b: &[Vec4], tolerance: f32) {
    assert_eq!(a.len(), b.len());
    for (i, (a, b)) in a.iter().zip(b).enumerate() {
        let diff = (a.truncate() - b.truncate()).abs().max_element();
        assert!(
            diff <= tolerance,
            "pixel ({}, {}) differs by {}: {} vs {}",
            i as u32 % SIZE,
            i as u32 / SIZE,
            diff,
            a,
            b
        );
    }
}

#[test]
fn test_lit_pixels_match_the_cube_silhouette() {
    for pipeline in [PipelineKind::Deferred, PipelineKind::Forward] {
        let mut settings = test_settings();
        settings.pipeline = pipeline;
        let mut agent = software_agent(settings);
        let mut scene = cube_scene(&mut agent);

        agent.render_scene(&mut scene, &front_camera(1.0)).unwrap();
        let image = illumination(&agent);

        // 16 pixels per unit: the front face covers pixels 8..24 on both axes.
        for y in 0..SIZE {
            for x in 0..SIZE {
                let texel = pixel(&image, x, y);
                let inside = (8..24).contains(&x) && (8..24).contains(&y);
                if inside {
                    assert!(texel.x > 0.9, "{:?}: ({}, {}) is {}", pipeline, x, y, texel);
                } else {
                    assert!(
                        is_background(texel),
                        "{:?}: ({}, {}) is {}",
                        pipeline,
                        x,
                        y,
                        texel
                    );
                }
            }
        }
    }
}

#[test]
fn test_directional_shadow_darkens_a_band_behind_the_cube() {
    let mut agent = software_agent(test_settings());
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let plane = upload(agent.device_mut(), &MeshData::plane(3.0));
    let mut scene = Scene::new();
    scene.background_color = BACKGROUND;
    scene.add(mesh_entity("cube", cube, Material::default(), Mat4::IDENTITY));
    scene.add(wall(plane));
    scene.add(directional_light("sun", Vec3::new(0.5, 0.0, -1.0), false));
    let camera = front_camera(2.0);

    agent.render_scene(&mut scene, &camera).unwrap();
    let unshadowed = illumination(&agent);
    scene.find_mut("sun").unwrap().as_light_mut().unwrap().cast_shadows = true;
    let stats = agent.render_scene(&mut scene, &camera).unwrap();
    let shadowed = illumination(&agent);
    assert_eq!(stats.shadow_maps, 1);

    let mut darker = 0;
    for y in 0..SIZE {
        for x in 0..SIZE {
            let before = pixel(&unshadowed, x, y);
            let after = pixel(&shadowed, x, y);
            // The wall spans pixels 4..28, everything around it is sky.
            if !(4..28).contains(&x) || !(4..28).contains(&y) {
                assert!(is_background(before) && is_background(after));
            }
            assert!(after.x <= before.x + 1e-5, "({}, {}) got brighter", x, y);
            if before.x - after.x > 0.5 {
                // The shadow lands right of the cube, between x = 0.5 and 1.25.
                assert!(
                    (19..=26).contains(&x) && (11..=20).contains(&y),
                    "({}, {})",
                    x,
                    y
                );
                darker += 1;
            }
        }
    }
    assert!((36..=60).contains(&darker), "{} shadowed pixels", darker);
}

#[test]
fn test_multi_pass_lighting_is_additive() {
    for pipeline in [PipelineKind::Deferred, PipelineKind::Forward] {
        let mut settings = test_settings();
        settings.pipeline = pipeline;
        let mut agent = software_agent(settings);
        let mut scene = lit_room(&mut agent);
        set_visible(&mut scene, "white", false);
        let camera = front_camera(2.0);

        let mut render = |red: bool, blue: bool| {
            set_visible(&mut scene, "red", red);
            set_visible(&mut scene, "blue", blue);
            agent.render_scene(&mut scene, &camera).unwrap();
            illumination(&agent)
        };
        let none = render(false, false);
        let red = render(true, false);
        let blue = render(false, true);
        let both = render(true, true);

        // The ambient term is only in the first pass, so it is counted once.
        let expected: Vec<Vec4> = red
            .iter()
            .zip(&blue)
            .zip(&none)
            .map(|((r, b), n)| *r + *b - *n)
            .collect();
        assert_images_close(&both, &expected, 1e-4);
    }
}

#[test]
fn test_single_pass_matches_multi_pass() {
    for pipeline in [PipelineKind::Deferred, PipelineKind::Forward] {
        let mut settings = test_settings();
        settings.pipeline = pipeline;
        let mut agent = software_agent(settings);
        let mut scene = lit_room(&mut agent);
        let camera = front_camera(2.0);

        agent.render_scene(&mut scene, &camera).unwrap();
        let multi = illumination(&agent);
        agent.settings.lighting = LightingMode::SinglePass;
        let stats = agent.render_scene(&mut scene, &camera).unwrap();
        let single = illumination(&agent);

        assert_eq!(stats.lights, 3);
        assert_images_close(&single, &multi, 1e-4);
    }
}

#[test]
fn test_forward_and_deferred_agree_on_opaque_geometry() {
    let mut agent = software_agent(test_settings());
    let mut scene = lit_room(&mut agent);
    let camera = front_camera(2.0);

    agent.render_scene(&mut scene, &camera).unwrap();
    let deferred = illumination(&agent);
    agent.settings.pipeline = PipelineKind::Forward;
    agent.render_scene(&mut scene, &camera).unwrap();
    let forward = illumination(&agent);

    assert_images_close(&forward, &deferred, 2e-3);
}

#[test]
fn test_default_post_chain_only_quantizes() {
    let mut agent = software_agent(test_settings());
    let mut scene = lit_room(&mut agent);

    agent.render_scene(&mut scene, &front_camera(2.0)).unwrap();
    let hdr: Vec<Vec4> = illumination(&agent)
        .iter()
        .map(|t| t.clamp(Vec4::ZERO, Vec4::ONE))
        .collect();
    assert_images_close(&surface(&agent), &hdr, 3e-3);
}

#[test]
fn test_blended_geometry_casts_no_shadow() {
    let mut agent = software_agent(test_settings());
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let glass = Material {
        color: Vec4::new(1.0, 1.0, 1.0, 0.5),
        alpha_mode: AlphaMode::Blend,
        ..Default::default()
    };
    let mut scene = Scene::new();
    scene.add(mesh_entity("glass", cube, glass, Mat4::IDENTITY));
    let mut lamp = point_light("lamp", Vec3::new(0.0, 3.0, 0.0), Vec3::ONE);
    let light = lamp.as_light_mut().unwrap();
    light.kind = umbra_data::LightKind::spot();
    light.cast_shadows = true;
    lamp.model = umbra_data::look_toward(Vec3::new(0.0, 3.0, 0.0), Vec3::ZERO, Vec3::Z);
    scene.add(lamp);
    let camera = front_camera(2.0);

    let shadow_depth = |agent: &RenderAgent, scene: &Scene| {
        let light = scene.find("lamp").unwrap().as_light().unwrap();
        let depth = light.shadow.as_ref().unwrap().target.depth.unwrap();
        agent.device().read_texture(depth, 0).unwrap()
    };

    agent.render_scene(&mut scene, &camera).unwrap();
    assert!(shadow_depth(&agent, &scene).iter().all(|t| t.x == 1.0));

    let EntityKind::Prefab(Some(prefab)) = &mut scene.find_mut("glass").unwrap().kind else {
        panic!("glass is a prefab");
    };
    let mut opaque = (**prefab).clone();
    opaque.root.material = Some(Arc::new(Material::default()));
    *prefab = Arc::new(opaque);

    agent.render_scene(&mut scene, &camera).unwrap();
    assert!(shadow_depth(&agent, &scene).iter().any(|t| t.x < 1.0));
}

#[test]
fn test_hidden_entities_and_subtrees_are_not_drawn() {
    let mut settings = test_settings();
    settings.pipeline = PipelineKind::Forward;
    let mut agent = software_agent(settings);
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let material = Arc::new(Material::default());

    let mut hidden = Node::with_mesh("hidden", cube, material.clone()).with_child(
        Node::with_mesh("grandchild", cube, material.clone())
            .with_transform(Mat4::from_translation(Vec3::X)),
    );
    hidden.visible = false;
    let root = Node::with_mesh("root", cube, material.clone()).with_child(hidden);
    let mut scene = Scene::new();
    scene.add(
        umbra_data::Entity::new(
            "tree",
            EntityKind::Prefab(Some(Arc::new(umbra_data::Prefab::new("tree", root)))),
        ),
    );
    let mut ghost = mesh_entity("ghost", cube, Material::default(), Mat4::IDENTITY);
    ghost.visible = false;
    scene.add(ghost);
    scene.add(mesh_entity(
        "behind",
        cube,
        Material::default(),
        Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)),
    ));
    scene.add(point_light("on", Vec3::Z, Vec3::ONE));
    let mut off = point_light("off", Vec3::Z, Vec3::ONE);
    off.visible = false;
    scene.add(off);

    let stats = agent.render_scene(&mut scene, &front_camera(2.0)).unwrap();
    assert_eq!(stats.visible_items, 1);
    assert_eq!(stats.lights, 1);
    assert_eq!(agent.last_stats(), stats);
    assert_eq!(agent.frame_count(), 1);
}

#[test]
fn test_settings_changes_apply_on_the_next_frame() {
    let mut agent = software_agent(test_settings());
    let mut scene = cube_scene(&mut agent);
    scene.find_mut("sun").unwrap().as_light_mut().unwrap().cast_shadows = true;
    let camera = front_camera(1.0);

    let shadow_size = |scene: &Scene| {
        let light = scene.find("sun").unwrap().as_light().unwrap();
        light.shadow.as_ref().map(|s| s.target.width)
    };

    agent.render_scene(&mut scene, &camera).unwrap();
    assert_eq!(shadow_size(&scene), Some(256));

    agent.settings.shadows.map_size = 64;
    agent.render_scene(&mut scene, &camera).unwrap();
    assert_eq!(shadow_size(&scene), Some(64));

    scene.find_mut("sun").unwrap().as_light_mut().unwrap().cast_shadows = false;
    agent.render_scene(&mut scene, &camera).unwrap();
    assert_eq!(shadow_size(&scene), None);

    agent.device_mut().resize_surface(16, 8).unwrap();
    agent.render_scene(&mut scene, &camera).unwrap();
    let targets = agent.frame_targets().unwrap();
    assert_eq!((targets.width, targets.height), (16, 8));
}

#[test]
fn test_ssao_overlay_shows_unoccluded_sky_as_white() {
    let mut settings = test_settings();
    settings.ssao.enabled = true;
    settings.debug.show_ssao = true;
    let mut agent = software_agent(settings);
    let mut scene = cube_scene(&mut agent);

    agent.render_scene(&mut scene, &front_camera(1.0)).unwrap();
    let image = surface(&agent);
    assert_eq!(pixel(&image, 0, 0), Vec4::ONE);
    assert_eq!(pixel(&image, SIZE - 1, SIZE - 1), Vec4::ONE);
}
