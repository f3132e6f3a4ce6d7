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

//! Rendering lanes - one per stage of the frame.

mod context;
mod debug_lane;
mod decal_lane;
mod draw_list;
mod extract_lane;
mod gbuffer_lane;
mod irradiance_lane;
mod lighting_lane;
mod postfx_lane;
mod reflection_lane;
mod resources;
mod shadow_pass_lane;
mod ssao_lane;
mod targets;

pub use context::*;
pub use debug_lane::*;
pub use decal_lane::*;
pub use draw_list::*;
pub use extract_lane::*;
pub use gbuffer_lane::*;
pub use irradiance_lane::*;
pub use lighting_lane::*;
pub use postfx_lane::*;
pub use reflection_lane::*;
pub use resources::*;
pub use shadow_pass_lane::*;
pub use ssao_lane::*;
pub use targets::*;
