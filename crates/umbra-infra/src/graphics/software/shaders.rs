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

//! Fragment programs of the software backend.
//!
//! Every [`Program`] variant maps to one function here. Lighting, shadowing
//! and reflections are shared between the forward and deferred programs so
//! both pipelines produce the same image for the same inputs.

use super::raster::{Fragment, Varyings};
use super::texture::TextureStore;
use umbra_core::math::{
    ndc_to_uv, unproject, SphericalHarmonics9, UVec3, Vec2, Vec3, Vec3Swizzles, Vec4,
    Vec4Swizzles,
};
use umbra_core::renderer::{
    CameraUniforms, DecalProgram, DeferredLightingProgram, DepthProgram, DepthViewProgram,
    ForwardProgram, GBufferProgram, IrradianceProgram, LightBlock, LightType, LightUniforms,
    MaterialUniforms, PostFxProgram, PostFxStage, Program, ShadowUniforms, SsaoProgram,
    SurfaceUniforms, TextureId,
};

/// Maximum number of color attachments a program writes.
pub(crate) const MAX_COLOR_ATTACHMENTS: usize = 3;

/// Values written to the color attachments, in attachment order.
pub(crate) type Outputs = [Vec4; MAX_COLOR_ATTACHMENTS];

const LUMINANCE: Vec3 = Vec3::new(0.2126, 0.7152, 0.0722);
const DIELECTRIC_SPECULAR: f32 = 0.04;
const SSAO_BIAS: f32 = 1e-4;
const GAUSSIAN_WEIGHTS: [f32; 5] = [0.227027, 0.1945946, 0.1216216, 0.054054, 0.016216];
const MOTION_BLUR_SAMPLES: usize = 8;

/// The textures a program reads. A draw fails if any of them is missing.
pub(crate) fn input_textures(program: &Program) -> Vec<TextureId> {
    let material = |m: &MaterialUniforms| {
        vec![
            m.color_texture,
            m.emissive_texture,
            m.metallic_roughness_texture,
            m.normal_texture,
        ]
    };
    let lights = |block: &LightBlock, surface: &SurfaceUniforms| {
        block
            .iter()
            .filter_map(|l| l.shadow.map(|s| s.map))
            .chain(surface.environment)
            .collect::<Vec<_>>()
    };
    match program {
        Program::Depth(p) => vec![p.color_texture],
        Program::Forward(p) => {
            let mut ids = material(&p.material);
            ids.extend(lights(&p.lights, &p.surface));
            ids
        }
        Program::GBuffer(p) => material(&p.material),
        Program::Decal(p) => vec![p.scene_depth, p.scene_normal, p.texture],
        Program::Ssao(p) => vec![p.depth, p.normal],
        Program::DeferredLighting(p) => {
            let mut ids = p.gbuffer.to_vec();
            ids.extend([p.depth, p.ssao]);
            ids.extend(lights(&p.lights, &p.surface));
            ids
        }
        Program::Irradiance(p) => vec![p.albedo, p.normal, p.depth, p.ssao, p.probes],
        Program::PostFx(p) => {
            let mut ids = vec![p.source];
            match p.stage {
                PostFxStage::DepthOfField { blurred, depth, .. } => ids.extend([blurred, depth]),
                PostFxStage::MotionBlur { depth, .. } => ids.push(depth),
                PostFxStage::Mix { overlay, .. } => ids.push(overlay),
                _ => {}
            }
            ids
        }
        Program::Copy { source, .. } => vec![*source],
        Program::DepthView(p) => vec![p.depth],
    }
}

/// Runs the fragment stage. `None` discards the fragment.
pub(crate) fn shade(
    program: &Program,
    textures: &TextureStore,
    fragment: &Fragment,
) -> Option<Outputs> {
    match program {
        Program::Depth(p) => depth_only(p, textures, &fragment.varyings),
        Program::Forward(p) => forward(p, textures, &fragment.varyings),
        Program::GBuffer(p) => gbuffer(p, textures, &fragment.varyings),
        Program::Decal(p) => decal(p, textures, fragment.screen_uv),
        Program::Ssao(p) => Some(single(ssao(p, textures, fragment.screen_uv))),
        Program::DeferredLighting(p) => deferred(p, textures, fragment.screen_uv),
        Program::Irradiance(p) => irradiance(p, textures, fragment.screen_uv),
        Program::PostFx(p) => Some(single(post_fx(p, textures, fragment.screen_uv))),
        Program::Copy { source, grayscale } => {
            let c = textures.sample(*source, fragment.screen_uv);
            Some(single(if *grayscale {
                Vec4::new(c.x, c.x, c.x, 1.0)
            } else {
                c
            }))
        }
        Program::DepthView(p) => Some(single(depth_view(p, textures, fragment.screen_uv))),
    }
}

fn single(color: Vec4) -> Outputs {
    [color, Vec4::ZERO, Vec4::ZERO]
}

// ─── Surfaces ───────────────────────────────────────────────────────────────

struct MaterialSample {
    albedo: Vec4,
    emissive: Vec3,
    roughness: f32,
    metallic: f32,
    normal: Vec3,
}

fn sample_material(m: &MaterialUniforms, textures: &TextureStore, v: &Varyings) -> MaterialSample {
    let albedo = m.color * textures.sample(m.color_texture, v.uv);
    let emissive = m.emissive * textures.sample(m.emissive_texture, v.uv).xyz();
    let mr = textures.sample(m.metallic_roughness_texture, v.uv);
    let mut normal = v.normal.normalize_or_zero();

    let encoded = textures.sample(m.normal_texture, v.uv).xyz();
    if encoded != Vec3::ZERO && normal != Vec3::ZERO {
        let local = encoded * 2.0 - Vec3::ONE;
        let (tangent, bitangent) = normal.any_orthonormal_pair();
        normal = (tangent * local.x + bitangent * local.y + normal * local.z).normalize_or(normal);
    }

    MaterialSample {
        albedo,
        emissive,
        roughness: (m.roughness * mr.y).clamp(0.0, 1.0),
        metallic: (m.metallic * mr.z).clamp(0.0, 1.0),
        normal,
    }
}

/// Discards masked fragments below the cutoff.
fn alpha_test(alpha: f32, cutoff: f32) -> Option<()> {
    (cutoff <= 0.0 || alpha >= cutoff).then_some(())
}

struct SurfacePoint {
    position: Vec3,
    normal: Vec3,
    albedo: Vec3,
    emissive: Vec3,
    roughness: f32,
    metallic: f32,
    occlusion: f32,
}

fn shininess(roughness: f32) -> f32 {
    (2.0 / (roughness * roughness).max(1e-4) - 2.0).max(1.0)
}

fn specular_color(point: &SurfacePoint) -> Vec3 {
    Vec3::splat(DIELECTRIC_SPECULAR).lerp(point.albedo, point.metallic)
}

/// `1` when lit, `0` when the shadow map holds a closer occluder. Points
/// outside the map are lit.
fn shadow_factor(shadow: &ShadowUniforms, textures: &TextureStore, position: Vec3) -> f32 {
    let clip = shadow.view_projection * position.extend(1.0);
    if clip.w <= 0.0 {
        return 1.0;
    }
    let ndc = clip.xyz() / clip.w;
    let uv = ndc_to_uv(ndc.xy());
    if !(0.0..=1.0).contains(&uv.x) || !(0.0..=1.0).contains(&uv.y) || ndc.z > 1.0 {
        return 1.0;
    }
    let stored = textures.load(shadow.map, uv).x;
    if ndc.z - shadow.bias > stored {
        0.0
    } else {
        1.0
    }
}

fn light_contribution(
    light: &LightUniforms,
    point: &SurfacePoint,
    view: Vec3,
    textures: &TextureStore,
) -> Vec3 {
    let (to_light, attenuation) = match light.light_type {
        LightType::Directional => ((-light.direction).normalize_or_zero(), 1.0),
        LightType::Point | LightType::Spot => {
            let delta = light.position - point.position;
            let distance = delta.length();
            if distance <= f32::EPSILON || light.max_distance <= 0.0 {
                return Vec3::ZERO;
            }
            let to_light = delta / distance;
            let falloff = (1.0 - distance / light.max_distance).clamp(0.0, 1.0);
            let mut attenuation = falloff * falloff;
            if light.light_type == LightType::Spot {
                let cos = (-to_light).dot(light.direction.normalize_or_zero());
                if cos < light.cone_cos {
                    return Vec3::ZERO;
                }
                attenuation *= cos.max(0.0).powf(light.cone_exp);
            }
            (to_light, attenuation)
        }
    };

    let n_dot_l = point.normal.dot(to_light);
    if n_dot_l <= 0.0 || attenuation <= 0.0 {
        return Vec3::ZERO;
    }
    let shadow = light
        .shadow
        .as_ref()
        .map_or(1.0, |s| shadow_factor(s, textures, point.position));
    if shadow <= 0.0 {
        return Vec3::ZERO;
    }

    let half = (to_light + view).normalize_or_zero();
    let n_dot_h = point.normal.dot(half).max(0.0);
    let diffuse = point.albedo * (1.0 - point.metallic);
    let specular = specular_color(point) * n_dot_h.powf(shininess(point.roughness));
    light.color * light.intensity * attenuation * shadow * n_dot_l * (diffuse + specular)
}

/// The full shading equation: ambient, emissive, reflection and every light.
fn light_surface(
    point: &SurfacePoint,
    camera: &CameraUniforms,
    surface: &SurfaceUniforms,
    lights: &LightBlock,
    textures: &TextureStore,
) -> Vec3 {
    let view = (camera.eye - point.position).normalize_or_zero();
    let mut color = surface.ambient * point.albedo * point.occlusion
        + point.emissive * surface.emissive_scale;

    if let Some(environment) = surface.environment {
        if surface.reflection_intensity > 0.0 {
            let reflected = (-view).reflect(point.normal);
            let sample = textures.sample_cube(environment, reflected, point.roughness).xyz();
            color +=
                sample * specular_color(point) * surface.reflection_intensity * point.occlusion;
        }
    }

    for light in lights.iter() {
        color += light_contribution(&light, point, view, textures);
    }
    color
}

// ─── Geometry programs ──────────────────────────────────────────────────────

fn depth_only(p: &DepthProgram, textures: &TextureStore, v: &Varyings) -> Option<Outputs> {
    let alpha = p.alpha * textures.sample(p.color_texture, v.uv).w;
    alpha_test(alpha, p.alpha_cutoff)?;
    Some([Vec4::ZERO; MAX_COLOR_ATTACHMENTS])
}

fn forward(p: &ForwardProgram, textures: &TextureStore, v: &Varyings) -> Option<Outputs> {
    let m = sample_material(&p.material, textures, v);
    alpha_test(m.albedo.w, p.material.alpha_cutoff)?;
    let point = SurfacePoint {
        position: v.world_position,
        normal: m.normal,
        albedo: m.albedo.xyz(),
        emissive: m.emissive,
        roughness: m.roughness,
        metallic: m.metallic,
        occlusion: 1.0,
    };
    let color = light_surface(&point, &p.camera, &p.surface, &p.lights, textures);
    Some(single(color.extend(m.albedo.w)))
}

fn encode_normal(n: Vec3) -> Vec3 {
    n * 0.5 + Vec3::splat(0.5)
}

fn decode_normal(encoded: Vec3) -> Vec3 {
    (encoded * 2.0 - Vec3::ONE).normalize_or_zero()
}

fn gbuffer(p: &GBufferProgram, textures: &TextureStore, v: &Varyings) -> Option<Outputs> {
    let m = sample_material(&p.material, textures, v);
    alpha_test(m.albedo.w, p.material.alpha_cutoff)?;
    Some([
        m.albedo.xyz().extend(1.0),
        encode_normal(m.normal).extend(m.roughness),
        m.emissive.extend(m.metallic),
    ])
}

fn decal(p: &DecalProgram, textures: &TextureStore, screen_uv: Vec2) -> Option<Outputs> {
    let depth = textures.load(p.scene_depth, screen_uv).x;
    if depth >= 1.0 {
        return None;
    }
    let world = unproject(&p.camera.inverse_view_projection, screen_uv, depth);
    let local = p.inverse_model.transform_point3(world);
    if local.abs().max_element() > 0.5 {
        return None;
    }
    let color = textures.sample(p.texture, local.xy() + Vec2::splat(0.5));
    let normal = textures.load(p.scene_normal, screen_uv).xyz();
    Some([
        color,
        normal.extend(color.w),
        Vec4::new(0.0, 0.0, 0.0, color.w),
    ])
}

// ─── Screen-space programs ──────────────────────────────────────────────────

fn linear_depth(depth: f32, near: f32, far: f32) -> f32 {
    near * far / (far - depth * (far - near))
}

fn ssao(p: &SsaoProgram, textures: &TextureStore, screen_uv: Vec2) -> Vec4 {
    let depth = textures.load(p.depth, screen_uv).x;
    if depth >= 1.0 || p.samples.is_empty() {
        return Vec4::ONE;
    }
    let position = unproject(&p.camera.inverse_view_projection, screen_uv, depth);
    let normal = decode_normal(textures.load(p.normal, screen_uv).xyz());

    let mut occlusion = 0.0;
    for offset in p.samples.iter() {
        let offset = if p.plus && offset.dot(normal) < 0.0 {
            -*offset
        } else {
            *offset
        };
        let sample = position + offset;
        let clip = p.camera.view_projection * sample.extend(1.0);
        if clip.w <= 0.0 {
            continue;
        }
        let ndc = clip.xyz() / clip.w;
        let uv = ndc_to_uv(ndc.xy());
        let scene_depth = textures.load(p.depth, uv).x;
        if scene_depth >= ndc.z - SSAO_BIAS {
            continue;
        }
        if p.plus {
            let occluder = unproject(&p.camera.inverse_view_projection, uv, scene_depth);
            let distance = (occluder - position).length().max(f32::EPSILON);
            occlusion += (p.radius / distance).min(1.0);
        } else {
            occlusion += 1.0;
        }
    }

    let ratio = occlusion / p.samples.len() as f32;
    // Half of a full-sphere kernel lies below any flat surface.
    let ao = if p.plus {
        1.0 - ratio
    } else {
        ((1.0 - ratio) * 2.0).min(1.0)
    };
    Vec4::new(ao, ao, ao, 1.0)
}

fn deferred(
    p: &DeferredLightingProgram,
    textures: &TextureStore,
    screen_uv: Vec2,
) -> Option<Outputs> {
    let depth = textures.load(p.depth, screen_uv).x;
    if depth >= 1.0 {
        return None;
    }
    let albedo = textures.load(p.gbuffer[0], screen_uv);
    let normal = textures.load(p.gbuffer[1], screen_uv);
    let emissive = textures.load(p.gbuffer[2], screen_uv);
    let point = SurfacePoint {
        position: unproject(&p.camera.inverse_view_projection, screen_uv, depth),
        normal: decode_normal(normal.xyz()),
        albedo: albedo.xyz(),
        emissive: emissive.xyz(),
        roughness: normal.w,
        metallic: emissive.w,
        occlusion: textures.load(p.ssao, screen_uv).x,
    };
    let color = light_surface(&point, &p.camera, &p.surface, &p.lights, textures);
    Some(single(color.extend(1.0)))
}

fn probe_sh(textures: &TextureStore, probes: TextureId, row: usize) -> SphericalHarmonics9 {
    let mut sh = SphericalHarmonics9::ZERO;
    for (i, c) in sh.coefficients.iter_mut().enumerate() {
        *c = textures.fetch(probes, i as u32, row as u32).xyz();
    }
    sh
}

fn irradiance(p: &IrradianceProgram, textures: &TextureStore, screen_uv: Vec2) -> Option<Outputs> {
    let depth = textures.load(p.depth, screen_uv).x;
    if depth >= 1.0 {
        return None;
    }
    let position = unproject(&p.camera.inverse_view_projection, screen_uv, depth);
    let normal = decode_normal(textures.load(p.normal, screen_uv).xyz());
    let albedo = textures.load(p.albedo, screen_uv).xyz();
    let occlusion = textures.load(p.ssao, screen_uv).x;

    let grid = &p.grid;
    let step = grid.step();
    let max = (grid.dim.max(UVec3::ONE) - UVec3::ONE).as_vec3();
    let coords = (position - grid.start) / step;
    let coords = Vec3::select(step.cmpeq(Vec3::ZERO), Vec3::ZERO, coords).clamp(Vec3::ZERO, max);
    let base = coords.floor().as_uvec3();
    let t = coords - base.as_vec3();

    // Blend evaluated irradiance, never coefficients, across the 8 neighbours.
    let mut result = Vec3::ZERO;
    for corner in 0..8u32 {
        let offset = UVec3::new(corner & 1, (corner >> 1) & 1, (corner >> 2) & 1);
        let index = (base + offset).min(max.as_uvec3());
        let w = Vec3::select(offset.cmpeq(UVec3::ZERO), Vec3::ONE - t, t);
        let weight = w.x * w.y * w.z;
        if weight <= 0.0 {
            continue;
        }
        let row = grid.linear_index(index);
        result += probe_sh(textures, p.probes, row).irradiance(normal) * weight;
    }

    let color = albedo * result * occlusion * p.intensity;
    Some(single(color.extend(0.0)))
}

fn texel_size(textures: &TextureStore, id: TextureId) -> Vec2 {
    let Ok(t) = textures.get(id) else {
        return Vec2::ONE;
    };
    Vec2::ONE / Vec2::new(t.descriptor.width as f32, t.descriptor.height as f32)
}

fn blur(
    textures: &TextureStore,
    source: TextureId,
    uv: Vec2,
    direction: Vec2,
    strength: f32,
) -> Vec4 {
    let step = direction * texel_size(textures, source) * strength;
    let mut color = textures.sample(source, uv) * GAUSSIAN_WEIGHTS[0];
    for (i, weight) in GAUSSIAN_WEIGHTS.iter().enumerate().skip(1) {
        let offset = step * i as f32;
        color += textures.sample(source, uv + offset) * *weight;
        color += textures.sample(source, uv - offset) * *weight;
    }
    color
}

fn hash(uv: Vec2, time: f32) -> f32 {
    let x = (uv.dot(Vec2::new(12.9898, 78.233)) + time).sin() * 43758.547;
    x - x.floor()
}

fn post_fx(p: &PostFxProgram, textures: &TextureStore, uv: Vec2) -> Vec4 {
    let source = textures.sample(p.source, uv);
    match p.stage {
        PostFxStage::BlurHorizontal { strength } => {
            if strength == 0.0 {
                return source;
            }
            blur(textures, p.source, uv, Vec2::X, strength)
        }
        PostFxStage::BlurVertical { strength } => {
            if strength == 0.0 {
                return source;
            }
            blur(textures, p.source, uv, Vec2::Y, strength)
        }
        PostFxStage::DepthOfField {
            blurred,
            depth,
            focus_near,
            focus_far,
            amount,
            near,
            far,
        } => {
            if amount <= 0.0 {
                return source;
            }
            let d = textures.load(depth, uv).x;
            let blur_factor = if d >= 1.0 {
                1.0
            } else {
                let z = linear_depth(d, near, far);
                if z < focus_near {
                    ((focus_near - z) / focus_near.max(f32::EPSILON)).clamp(0.0, 1.0)
                } else if z > focus_far {
                    ((z - focus_far) / focus_far.max(f32::EPSILON)).clamp(0.0, 1.0)
                } else {
                    0.0
                }
            };
            let weight = (blur_factor * amount).clamp(0.0, 1.0);
            source.lerp(textures.sample(blurred, uv), weight)
        }
        PostFxStage::MotionBlur {
            depth,
            inverse_view_projection,
            previous_view_projection,
            strength,
        } => {
            if strength == 0.0 {
                return source;
            }
            let d = textures.load(depth, uv).x;
            let world = unproject(&inverse_view_projection, uv, d.min(1.0));
            let clip = previous_view_projection * world.extend(1.0);
            if clip.w <= 0.0 {
                return source;
            }
            let previous = ndc_to_uv(clip.xy() / clip.w);
            let velocity = (uv - previous) * strength;
            let mut color = Vec4::ZERO;
            for i in 0..MOTION_BLUR_SAMPLES {
                let t = i as f32 / MOTION_BLUR_SAMPLES as f32 - 0.5;
                color += textures.sample(p.source, uv + velocity * t);
            }
            color / MOTION_BLUR_SAMPLES as f32
        }
        PostFxStage::ColorGrade {
            saturation,
            vignette,
        } => {
            let rgb = source.xyz();
            let grey = Vec3::splat(rgb.dot(LUMINANCE));
            let mut graded = grey.lerp(rgb, saturation);
            if vignette != 0.0 {
                let r2 = (uv - Vec2::splat(0.5)).length_squared() * 2.0;
                graded *= (1.0 - vignette * r2).max(0.0);
            }
            graded.extend(source.w)
        }
        PostFxStage::Contrast { contrast } => {
            let rgb = (source.xyz() - Vec3::splat(0.5)) * contrast + Vec3::splat(0.5);
            rgb.extend(source.w)
        }
        PostFxStage::Threshold { threshold } => {
            (source.xyz() - Vec3::splat(threshold)).max(Vec3::ZERO).extend(source.w)
        }
        PostFxStage::Mix { overlay, intensity } => {
            if intensity == 0.0 {
                return source;
            }
            (source.xyz() + textures.sample(overlay, uv).xyz() * intensity).extend(source.w)
        }
        PostFxStage::ToneMap {
            enabled,
            scale,
            average_luminance,
            white_squared,
            inverse_gamma,
        } => {
            if !enabled {
                return source;
            }
            let rgb = source.xyz().max(Vec3::ZERO);
            let luminance = rgb.dot(LUMINANCE);
            if luminance <= 0.0 {
                return Vec3::ZERO.extend(source.w);
            }
            let scaled = scale * luminance / average_luminance.max(f32::EPSILON);
            let mapped = scaled * (1.0 + scaled / white_squared.max(f32::EPSILON)) / (1.0 + scaled);
            let rgb = rgb * (mapped / luminance);
            rgb.powf(inverse_gamma).extend(source.w)
        }
        PostFxStage::Grain { time, amount } => {
            if amount == 0.0 {
                return source;
            }
            let noise = hash(uv, time) * 2.0 - 1.0;
            (source.xyz() + Vec3::splat(noise * amount)).extend(source.w)
        }
        PostFxStage::ChromaticAberration { amount } => {
            if amount == 0.0 {
                return source;
            }
            let offset = (uv - Vec2::splat(0.5)) * amount;
            let r = textures.sample(p.source, uv + offset).x;
            let b = textures.sample(p.source, uv - offset).z;
            Vec4::new(r, source.y, b, source.w)
        }
        PostFxStage::LensDistortion { amount } => {
            if amount == 0.0 {
                return source;
            }
            let centered = uv - Vec2::splat(0.5);
            let distorted =
                Vec2::splat(0.5) + centered * (1.0 + amount * centered.length_squared());
            if !(0.0..=1.0).contains(&distorted.x) || !(0.0..=1.0).contains(&distorted.y) {
                return Vec4::new(0.0, 0.0, 0.0, 1.0);
            }
            textures.sample(p.source, distorted)
        }
    }
}

fn depth_view(p: &DepthViewProgram, textures: &TextureStore, uv: Vec2) -> Vec4 {
    let d = textures.load(p.depth, uv).x;
    let v = if p.linearize {
        let far = p.far.max(p.near + f32::EPSILON);
        ((linear_depth(d, p.near, far) - p.near) / (far - p.near)).clamp(0.0, 1.0)
    } else {
        d
    };
    Vec4::new(v, v, v, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn point() -> SurfacePoint {
        SurfacePoint {
            position: Vec3::ZERO,
            normal: Vec3::Y,
            albedo: Vec3::ONE,
            emissive: Vec3::ZERO,
            roughness: 1.0,
            metallic: 0.0,
            occlusion: 1.0,
        }
    }

    #[test]
    fn test_point_light_attenuates_quadratically() {
        let textures = TextureStore::default();
        let light = LightUniforms {
            position: Vec3::new(0.0, 5.0, 0.0),
            max_distance: 10.0,
            ..LightUniforms::default()
        };
        let c = light_contribution(&light, &point(), Vec3::Y, &textures);
        // (1 - 5/10)^2 = 0.25, diffuse 1, specular 0.04 at n.h = 1.
        assert_relative_eq!(c.x, 0.25 * 1.04, epsilon = 1e-5);
    }

    #[test]
    fn test_spot_light_is_dark_outside_its_cone() {
        let textures = TextureStore::default();
        let light = LightUniforms {
            light_type: LightType::Spot,
            position: Vec3::new(3.0, 1.0, 0.0),
            direction: Vec3::NEG_Y,
            cone_cos: 0.9,
            cone_exp: 1.0,
            ..LightUniforms::default()
        };
        assert_eq!(
            light_contribution(&light, &point(), Vec3::Y, &textures),
            Vec3::ZERO
        );
    }

    #[test]
    fn test_directional_light_ignores_distance() {
        let textures = TextureStore::default();
        let light = LightUniforms {
            light_type: LightType::Directional,
            direction: Vec3::NEG_Y,
            position: Vec3::splat(1000.0),
            max_distance: 1.0,
            ..LightUniforms::default()
        };
        let c = light_contribution(&light, &point(), Vec3::Y, &textures);
        assert_relative_eq!(c.x, 1.04, epsilon = 1e-5);
    }

    #[test]
    fn test_neutral_post_stages_are_identity() {
        let textures = TextureStore::default();
        let program = |stage| PostFxProgram {
            source: TextureId(0),
            stage,
        };
        for stage in [
            PostFxStage::ColorGrade {
                saturation: 1.0,
                vignette: 0.0,
            },
            PostFxStage::Contrast { contrast: 1.0 },
            PostFxStage::Grain {
                time: 3.0,
                amount: 0.0,
            },
        ] {
            assert_eq!(
                post_fx(&program(stage), &textures, Vec2::splat(0.5)),
                Vec4::ZERO
            );
        }
    }

    #[test]
    fn test_gaussian_weights_sum_to_one() {
        let sum = GAUSSIAN_WEIGHTS[0] + 2.0 * GAUSSIAN_WEIGHTS[1..].iter().sum::<f32>();
        assert_relative_eq!(sum, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_linear_depth_endpoints() {
        assert_relative_eq!(linear_depth(0.0, 0.1, 100.0), 0.1, epsilon = 1e-5);
        assert_relative_eq!(linear_depth(1.0, 0.1, 100.0), 100.0, epsilon = 1e-2);
    }
}
