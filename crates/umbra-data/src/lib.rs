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

//! Scene data consumed by the Umbra renderer.
//!
//! Everything here is plain data: the renderer reads it every frame and only
//! writes back the GPU resources it owns on behalf of entities (shadow maps of
//! lights, cube maps of reflection probes).

#![warn(missing_docs)]

pub mod camera;
pub mod entity;
pub mod light;
pub mod material;
pub mod prefab;
pub mod scene;

pub use camera::{Camera, ProjectionType};
pub use entity::{look_toward, DecalEntity, Entity, EntityKind, ReflectionProbeEntity};
pub use light::{LightEntity, LightKind, ShadowResources};
pub use material::{AlphaMode, Material};
pub use prefab::{MeshHandle, Node, Prefab};
pub use scene::Scene;
