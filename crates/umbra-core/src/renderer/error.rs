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

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::core::{MeshId, RenderTargetId, TextureId};
use std::fmt;

/// An error related to the creation, access or destruction of a GPU resource.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceError {
    /// No texture is registered under this id.
    TextureNotFound(TextureId),
    /// No render target is registered under this id.
    RenderTargetNotFound(RenderTargetId),
    /// No mesh is registered under this id.
    MeshNotFound(MeshId),
    /// A descriptor was rejected, e.g. a zero-sized texture.
    InvalidDescriptor(String),
    /// An access fell outside of a resource's bounds (layer, face, texel count).
    OutOfBounds,
    /// An error specific to the backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::TextureNotFound(id) => write!(f, "Texture {:?} not found", id),
            ResourceError::RenderTargetNotFound(id) => {
                write!(f, "Render target {:?} not found", id)
            }
            ResourceError::MeshNotFound(id) => write!(f, "Mesh {:?} not found", id),
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {}", msg),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds"),
            ResourceError::BackendError(msg) => write!(f, "Backend resource error: {}", msg),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error that can occur within the rendering system.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A render target was bound while another one was still bound.
    TargetAlreadyBound {
        /// The target that is currently bound.
        bound: RenderTargetId,
        /// The target that was requested.
        requested: RenderTargetId,
    },
    /// An unbind call did not match the currently bound target.
    UnbalancedUnbind {
        /// The target that is currently bound, if any.
        bound: Option<RenderTargetId>,
        /// The target the caller tried to unbind.
        requested: RenderTargetId,
    },
    /// A draw call could not be executed.
    RenderingFailed(String),
    /// A resource required for rendering was missing or invalid.
    Resource(ResourceError),
    /// An unexpected internal error.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::TargetAlreadyBound { bound, requested } => write!(
                f,
                "Cannot bind render target {:?} while {:?} is bound",
                requested, bound
            ),
            RenderError::UnbalancedUnbind { bound, requested } => write!(
                f,
                "Unbind of render target {:?} does not match bound target {:?}",
                requested, bound
            ),
            RenderError::RenderingFailed(msg) => write!(f, "Rendering failed: {}", msg),
            RenderError::Resource(e) => write!(f, "Resource error: {}", e),
            RenderError::Internal(msg) => write!(f, "Internal rendering error: {}", msg),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_converts_into_render_error() {
        let err: RenderError = ResourceError::TextureNotFound(TextureId(3)).into();
        assert_eq!(
            err,
            RenderError::Resource(ResourceError::TextureNotFound(TextureId(3)))
        );
        assert!(err.to_string().contains("TextureId(3)"));
    }
}
