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

//! Sampler state resources.

use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Defines how texture coordinates outside `[0, 1]` are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AddressMode {
    /// Coordinates wrap around. `1.1` becomes `0.1`.
    Repeat,
    /// Coordinates are clamped to the edge. `1.1` becomes `1.0`.
    #[default]
    ClampToEdge,
    /// Coordinates wrap around, mirroring at each integer boundary.
    MirrorRepeat,
}

/// The filtering mode for texture sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FilterMode {
    /// Point sampling: the value of the nearest texel.
    #[default]
    Nearest,
    /// Linear interpolation of the nearest texels.
    Linear,
}

/// A comparison function for depth tests and comparison samplers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CompareFunction {
    /// The test never passes.
    Never,
    /// Passes if the incoming value is less than the stored value.
    Less,
    /// Passes if the values are equal.
    Equal,
    /// Passes if the incoming value is less than or equal.
    LessEqual,
    /// Passes if the incoming value is greater.
    Greater,
    /// Passes if the values differ.
    NotEqual,
    /// Passes if the incoming value is greater than or equal.
    GreaterEqual,
    /// The test always passes.
    #[default]
    Always,
}

/// A descriptor used to create a [`Sampler`].
#[derive(Debug, Clone)]
pub struct SamplerDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The address mode for the U texture coordinate.
    pub address_mode_u: AddressMode,
    /// The address mode for the V texture coordinate.
    pub address_mode_v: AddressMode,
    /// The address mode for the W texture coordinate.
    pub address_mode_w: AddressMode,
    /// The filter mode for magnification.
    pub mag_filter: FilterMode,
    /// The filter mode for minification.
    pub min_filter: FilterMode,
    /// The filter mode between mipmap levels.
    pub mipmap_filter: FilterMode,
    /// The minimum level of detail to use for mipmapping.
    pub lod_min_clamp: f32,
    /// The maximum level of detail to use for mipmapping.
    pub lod_max_clamp: f32,
    /// If `Some`, creates a comparison sampler (e.g. for shadow mapping).
    pub compare: Option<CompareFunction>,
    /// The maximum anisotropy level to use.
    pub anisotropy_clamp: u16,
}

impl Default for SamplerDescriptor<'_> {
    fn default() -> Self {
        Self {
            label: None,
            address_mode_u: AddressMode::default(),
            address_mode_v: AddressMode::default(),
            address_mode_w: AddressMode::default(),
            mag_filter: FilterMode::default(),
            min_filter: FilterMode::default(),
            mipmap_filter: FilterMode::default(),
            lod_min_clamp: 0.0,
            lod_max_clamp: 32.0,
            compare: None,
            anisotropy_clamp: 1,
        }
    }
}

/// A sampler state resource: defines how shaders sample from textures.
pub struct Sampler {
    id: ResourceId,
    label: Option<String>,
    comparison: bool,
    native: NativeObject,
}

/// A shared handle to a [`Sampler`].
pub type SamplerHandle = Arc<Sampler>;

impl Sampler {
    /// Wraps a backend-native sampler object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &SamplerDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            comparison: descriptor.compare.is_some(),
            native,
        }
    }

    /// Whether this is a comparison sampler.
    pub fn is_comparison(&self) -> bool {
        self.comparison
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for Sampler {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Sampler
    }
}

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sampler")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("comparison", &self.comparison)
            .finish_non_exhaustive()
    }
}
