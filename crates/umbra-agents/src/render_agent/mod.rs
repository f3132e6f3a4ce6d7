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

//! The **[A]gent** of the renderer.
//!
//! The agent decides which lanes run for a view and in what order: a displayed
//! frame goes through visibility, shadows, the deferred or forward lighting
//! pipeline, irradiance, blended geometry and post-processing, while probe
//! and reflection captures re-enter a reduced forward pipeline in
//! [`RenderMode::Capture`](umbra_lanes::RenderMode::Capture).

mod agent;
mod view;

pub use agent::RenderAgent;
