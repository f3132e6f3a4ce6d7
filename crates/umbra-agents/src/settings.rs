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

//! Renderer tunables and their RON representation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use umbra_lanes::{
    DebugSettings, LightingMode, PostFxSettings, ProbeGridSettings, ReflectionSettings,
    SsaoSettings, DEFAULT_SHADOW_MAP_SIZE,
};

/// Errors raised while loading or saving [`RendererSettings`].
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read or written.
    #[error("failed to access settings file {path}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The text is not valid RON for [`RendererSettings`].
    #[error("invalid renderer settings: {0}")]
    Parse(#[from] ron::error::SpannedError),
    /// The settings could not be serialized.
    #[error("failed to serialize renderer settings: {0}")]
    Serialize(#[from] ron::Error),
}

/// Which pipeline lights opaque geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PipelineKind {
    /// Every mesh is shaded directly, once per light pass.
    Forward,
    /// Opaque geometry goes through the G-buffer, decals and SSAO first.
    #[default]
    Deferred,
}

/// Shadow map tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShadowSettings {
    /// Side of every shadow map, in texels.
    pub map_size: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            map_size: DEFAULT_SHADOW_MAP_SIZE,
        }
    }
}

/// Every tunable of the renderer.
///
/// Fields missing from a RON file keep their default, so a file only needs
/// to list what it changes:
///
/// ```
/// use umbra_agents::{PipelineKind, RendererSettings};
///
/// let settings = RendererSettings::from_ron_str("(pipeline: Forward)").unwrap();
/// assert_eq!(settings.pipeline, PipelineKind::Forward);
/// assert!(settings.ssao.enabled);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// Forward or deferred shading.
    pub pipeline: PipelineKind,
    /// Multi-pass or single-pass light accumulation.
    pub lighting: LightingMode,
    /// Shadow maps.
    pub shadows: ShadowSettings,
    /// Ambient occlusion.
    pub ssao: SsaoSettings,
    /// Irradiance probe grid.
    pub probes: ProbeGridSettings,
    /// Reflection probes.
    pub reflections: ReflectionSettings,
    /// Post-processing coefficients.
    pub post: PostFxSettings,
    /// Debug overlays.
    pub debug: DebugSettings,
}

impl RendererSettings {
    /// Parses settings from RON text.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads settings from a RON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_ron_str(&text)?;
        log::info!("Renderer settings loaded from {}", path.display());
        Ok(settings)
    }

    /// Serializes the settings as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}
