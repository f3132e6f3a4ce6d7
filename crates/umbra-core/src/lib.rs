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

//! Foundational crate of the Umbra renderer.
//!
//! `umbra-core` holds the backend-agnostic contracts shared by every other
//! crate: math primitives, GPU resource identifiers and descriptors, the
//! pipeline state model, shader program parameter blocks, the
//! [`GraphicsDevice`](renderer::GraphicsDevice) trait and the lane
//! abstraction used to organize the frame into stages.

#![warn(missing_docs)]

pub mod lane;
pub mod math;
pub mod renderer;

pub use lane::{Lane, LaneKind};
