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

//! # Lane Abstraction
//!
//! A **Lane** is one stage of the frame: visibility extraction, shadow
//! rendering, G-buffer fill, light accumulation and so on. Agents own their
//! lanes, drive them every frame and shut them down with the device.
//!
//! Each lane exposes its own domain-specific `run`/`render` methods; this
//! trait only carries the identity and lifecycle shared by all of them.

use crate::renderer::GraphicsDevice;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Lane classification
// ─────────────────────────────────────────────────────────────────────────────

/// The stage of the frame a lane belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LaneKind {
    /// Scene traversal and culling.
    Extract,
    /// Shadow map generation.
    Shadow,
    /// Geometry passes writing the G-buffer.
    Geometry,
    /// Screen-space passes derived from the G-buffer.
    ScreenSpace,
    /// Light accumulation.
    Lighting,
    /// Probe baking and sampling.
    Probe,
    /// Post-processing.
    PostProcess,
    /// Debug visualizations.
    Debug,
}

impl fmt::Display for LaneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LaneKind::Extract => "extract",
            LaneKind::Shadow => "shadow",
            LaneKind::Geometry => "geometry",
            LaneKind::ScreenSpace => "screen_space",
            LaneKind::Lighting => "lighting",
            LaneKind::Probe => "probe",
            LaneKind::PostProcess => "post_process",
            LaneKind::Debug => "debug",
        };
        f.write_str(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Lane trait
// ─────────────────────────────────────────────────────────────────────────────

/// The base trait shared by every lane.
pub trait Lane {
    /// A stable, human readable name of the strategy this lane implements.
    fn strategy_name(&self) -> &'static str;

    /// The stage of the frame this lane belongs to.
    fn lane_kind(&self) -> LaneKind;

    /// Releases the lane's GPU resources.
    fn on_shutdown(&mut self, _device: &mut dyn GraphicsDevice) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lane_kind_display() {
        assert_eq!(LaneKind::PostProcess.to_string(), "post_process");
    }
}
