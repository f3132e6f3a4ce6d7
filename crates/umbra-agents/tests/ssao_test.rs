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
use umbra_core::renderer::MeshData;
use umbra_data::{Material, Scene};

// With `front_camera(2.0)` a world unit spans 8 pixels: the cube covers
// pixels 12..20 and everything else shows the wall.
const CREASE: [(u32, u32); 2] = [(11, 16), (20, 16)];
const OPEN_WALL: [(u32, u32); 3] = [(2, 16), (29, 16), (16, 2)];
const CUBE_FACE: (u32, u32) = (16, 16);
const QUANTUM: f32 = 1.0 / 255.0;

/// A unit cube resting on a large wall at `z = -1`, facing the camera.
fn cube_on_wall(agent: &mut RenderAgent) -> Scene {
    let cube = upload(agent.device_mut(), &MeshData::unit_cube());
    let plane = upload(agent.device_mut(), &MeshData::plane(6.0));
    let mut scene = Scene::new();
    scene.background_color = BACKGROUND;
    scene.ambient_light = Vec3::ONE;
    scene.add(mesh_entity(
        "wall",
        plane,
        Material::default(),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -1.0))
            * Mat4::from_rotation_x(std::f32::consts::FRAC_PI_2),
    ));
    scene.add(mesh_entity(
        "cube",
        cube,
        Material::default(),
        Mat4::from_translation(Vec3::new(0.0, 0.0, -0.5)),
    ));
    scene
}

fn occlusion(plus: bool) -> Result<(Vec<Vec4>, Vec<Vec4>)> {
    let mut settings = test_settings();
    settings.pipeline = PipelineKind::Deferred;
    settings.ssao.enabled = true;
    settings.ssao.plus = plus;
    settings.ssao.radius = 0.5;
    let mut agent = software_agent(settings);
    let mut scene = cube_on_wall(&mut agent);

    agent.render_scene(&mut scene, &front_camera(2.0))?;
    let targets = agent.frame_targets().unwrap();
    let ao = agent.device().read_texture(targets.ssao.color(0), 0)?;
    Ok((ao, illumination(&agent)))
}

fn ao_at(texels: &[Vec4], (x, y): (u32, u32)) -> f32 {
    pixel(texels, x, y).x
}

#[test]
fn test_crease_next_to_the_cube_is_occluded() -> Result<()> {
    let (ao, lit) = occlusion(false)?;
    let open = ao_at(&ao, OPEN_WALL[0]);
    // Half of the kernel sits behind any flat surface and is compensated for.
    assert!(open > 0.75, "open wall ao {}", open);
    for p in OPEN_WALL {
        assert!((ao_at(&ao, p) - open).abs() <= QUANTUM, "{:?}", p);
    }
    // The cube face only loses samples that fall past its edges.
    assert!(ao_at(&ao, CUBE_FACE) >= open - QUANTUM);
    for p in CREASE {
        let crease = ao_at(&ao, p);
        assert!(
            crease < open - 0.05,
            "crease {:?} ao {} vs {}",
            p,
            crease,
            open
        );
        // Occlusion scales the ambient term of the lit image.
        let (ox, oy) = OPEN_WALL[0];
        assert!(pixel(&lit, p.0, p.1).x < pixel(&lit, ox, oy).x);
    }
    Ok(())
}

#[test]
fn test_plus_variant_leaves_flat_surfaces_unoccluded() -> Result<()> {
    let (ao, _) = occlusion(true)?;
    for p in OPEN_WALL.into_iter().chain([CUBE_FACE]) {
        assert!(
            (ao_at(&ao, p) - 1.0).abs() <= QUANTUM,
            "{:?}: {}",
            p,
            ao_at(&ao, p)
        );
    }
    for p in CREASE {
        let crease = ao_at(&ao, p);
        assert!(crease < 1.0 - 0.05, "crease {:?} ao {}", p, crease);
    }
    Ok(())
}
