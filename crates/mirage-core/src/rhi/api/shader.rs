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

//! Shader modules and the logical shader stage model.
//!
//! Mirage exposes six logical stages. Backends whose native model differs
//! (e.g. APIs splitting or merging tessellation stages) map these
//! internally; backends without tessellation or geometry support reject
//! those stages through their capability set.

use crate::mirage_bitflags;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// The programmable stage a shader module targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    /// The vertex shader stage.
    Vertex,
    /// The tessellation control (hull) stage.
    TessellationControl,
    /// The tessellation evaluation (domain) stage.
    TessellationEvaluation,
    /// The geometry shader stage.
    Geometry,
    /// The fragment (pixel) shader stage.
    Fragment,
    /// The compute shader stage.
    Compute,
}

mirage_bitflags! {
    /// Flags representing which shader stages can access a resource binding.
    pub struct ShaderStageFlags: u32 {
        /// The vertex stage.
        const VERTEX = 1 << 0;
        /// The tessellation control stage.
        const TESSELLATION_CONTROL = 1 << 1;
        /// The tessellation evaluation stage.
        const TESSELLATION_EVALUATION = 1 << 2;
        /// The geometry stage.
        const GEOMETRY = 1 << 3;
        /// The fragment stage.
        const FRAGMENT = 1 << 4;
        /// The compute stage.
        const COMPUTE = 1 << 5;
        /// All graphics stages.
        const ALL_GRAPHICS = Self::VERTEX.bits()
            | Self::TESSELLATION_CONTROL.bits()
            | Self::TESSELLATION_EVALUATION.bits()
            | Self::GEOMETRY.bits()
            | Self::FRAGMENT.bits();
    }
}

impl ShaderStageFlags {
    /// Creates flags from a single shader stage.
    pub const fn from_stage(stage: ShaderStage) -> Self {
        match stage {
            ShaderStage::Vertex => Self::VERTEX,
            ShaderStage::TessellationControl => Self::TESSELLATION_CONTROL,
            ShaderStage::TessellationEvaluation => Self::TESSELLATION_EVALUATION,
            ShaderStage::Geometry => Self::GEOMETRY,
            ShaderStage::Fragment => Self::FRAGMENT,
            ShaderStage::Compute => Self::COMPUTE,
        }
    }
}

/// The source form a shader module is created from.
///
/// Text source is compiled by the backend at module creation; pre-compiled
/// SPIR-V is accepted by backends that can consume it directly.
#[derive(Debug, Clone)]
pub enum ShaderSource<'a> {
    /// WGSL source text.
    Wgsl(Cow<'a, str>),
    /// Pre-compiled SPIR-V words.
    SpirV(Cow<'a, [u32]>),
}

/// A descriptor used to create a [`ShaderModule`].
#[derive(Debug, Clone)]
pub struct ShaderModuleDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The logical stage the module targets.
    pub stage: ShaderStage,
    /// The entry point function name.
    pub entry_point: Cow<'a, str>,
    /// The shader source.
    pub source: ShaderSource<'a>,
}

/// A compiled shader module for one logical stage.
pub struct ShaderModule {
    id: ResourceId,
    label: Option<String>,
    stage: ShaderStage,
    entry_point: String,
    native: NativeObject,
}

/// A shared handle to a [`ShaderModule`].
pub type ShaderModuleHandle = Arc<ShaderModule>;

impl ShaderModule {
    /// Wraps a backend-native shader object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &ShaderModuleDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            stage: descriptor.stage,
            entry_point: descriptor.entry_point.to_string(),
            native,
        }
    }

    /// The logical stage the module was compiled for.
    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    /// The entry point function name.
    pub fn entry_point(&self) -> &str {
        &self.entry_point
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for ShaderModule {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::ShaderModule
    }
}

impl fmt::Debug for ShaderModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShaderModule")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("stage", &self.stage)
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_flags_cover_all_graphics_stages() {
        let all = ShaderStageFlags::ALL_GRAPHICS;
        assert!(all.contains(ShaderStageFlags::VERTEX));
        assert!(all.contains(ShaderStageFlags::GEOMETRY));
        assert!(all.contains(ShaderStageFlags::FRAGMENT));
        assert!(!all.contains(ShaderStageFlags::COMPUTE));
    }

    #[test]
    fn from_stage_round_trip() {
        assert_eq!(
            ShaderStageFlags::from_stage(ShaderStage::Compute),
            ShaderStageFlags::COMPUTE
        );
    }
}
