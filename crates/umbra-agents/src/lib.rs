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

//! Agents of the Umbra renderer.
//!
//! [`RenderAgent`] owns a graphics device and the lanes, and exposes the
//! public operations of the renderer. [`RendererSettings`] holds every
//! tunable and can be loaded from RON.

#![warn(missing_docs)]

pub mod render_agent;
pub mod settings;

pub use render_agent::RenderAgent;
pub use settings::{PipelineKind, RendererSettings, SettingsError, ShadowSettings};
pub use umbra_lanes::FrameStats;
