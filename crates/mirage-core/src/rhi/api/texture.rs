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

//! GPU texture resources.

use crate::math::Extent3D;
use crate::mirage_bitflags;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// The dimensionality of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureDimension {
    /// A one-dimensional texture.
    D1,
    /// A two-dimensional texture.
    D2,
    /// A two-dimensional texture array.
    D2Array,
    /// A three-dimensional (volumetric) texture.
    D3,
    /// A cubemap texture (six 2D faces).
    Cube,
}

/// The number of samples per pixel for multisample anti-aliasing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SampleCount {
    /// 1 sample per pixel (MSAA disabled).
    #[default]
    X1,
    /// 2 samples per pixel.
    X2,
    /// 4 samples per pixel.
    X4,
    /// 8 samples per pixel.
    X8,
}

impl SampleCount {
    /// The sample count as a plain integer.
    pub const fn as_u32(self) -> u32 {
        match self {
            SampleCount::X1 => 1,
            SampleCount::X2 => 2,
            SampleCount::X4 => 4,
            SampleCount::X8 => 8,
        }
    }
}

/// The memory format of pixels in a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureFormat {
    /// One 8-bit unsigned normalized component.
    R8Unorm,
    /// Two 8-bit unsigned normalized components.
    Rg8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA).
    Rgba8Unorm,
    /// Four 8-bit unsigned normalized components (RGBA) in sRGB space.
    Rgba8UnormSrgb,
    /// Four 8-bit unsigned normalized components (BGRA) in sRGB space.
    /// This is a common swap-chain format.
    Bgra8UnormSrgb,
    /// One 16-bit float component.
    R16Float,
    /// Two 16-bit float components.
    Rg16Float,
    /// Four 16-bit float components.
    Rgba16Float,
    /// One 32-bit float component.
    R32Float,
    /// Two 32-bit float components. Used for variance shadow moments.
    Rg32Float,
    /// Four 32-bit float components.
    Rgba32Float,
    /// A 16-bit unsigned normalized depth format.
    Depth16Unorm,
    /// A 24-bit unsigned normalized depth format.
    Depth24Plus,
    /// A 32-bit float depth format.
    Depth32Float,
    /// A 32-bit float depth format with an 8-bit stencil component.
    Depth32FloatStencil8,
}

impl TextureFormat {
    /// Returns the size in bytes of a single pixel for this format.
    ///
    /// Note: this can be an approximation for packed formats.
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R8Unorm => 1,
            TextureFormat::Rg8Unorm => 2,
            TextureFormat::Rgba8Unorm => 4,
            TextureFormat::Rgba8UnormSrgb => 4,
            TextureFormat::Bgra8UnormSrgb => 4,
            TextureFormat::R16Float => 2,
            TextureFormat::Rg16Float => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::R32Float => 4,
            TextureFormat::Rg32Float => 8,
            TextureFormat::Rgba32Float => 16,
            TextureFormat::Depth16Unorm => 2,
            TextureFormat::Depth24Plus => 4,
            TextureFormat::Depth32Float => 4,
            TextureFormat::Depth32FloatStencil8 => 5,
        }
    }

    /// Returns `true` for formats carrying a depth aspect.
    pub fn is_depth_format(&self) -> bool {
        matches!(
            self,
            TextureFormat::Depth16Unorm
                | TextureFormat::Depth24Plus
                | TextureFormat::Depth32Float
                | TextureFormat::Depth32FloatStencil8
        )
    }
}

mirage_bitflags! {
    /// A set of flags describing the allowed usages of a [`Texture`].
    ///
    /// The sampled/storage split carries the shader-resource-view versus
    /// unordered-access-view distinction: a descriptor declaring read-write
    /// storage access requires `STORAGE_BINDING`, plain sampling requires
    /// `TEXTURE_BINDING`.
    pub struct TextureUsage: u32 {
        /// The texture can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The texture can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The texture can be bound in a shader for sampling (reading).
        const TEXTURE_BINDING = 1 << 2;
        /// The texture can be used as a storage texture (shader read/write).
        const STORAGE_BINDING = 1 << 3;
        /// The texture can be used as a color attachment in a render pass.
        const RENDER_ATTACHMENT = 1 << 4;
        /// The texture can be used as a depth/stencil attachment.
        const DEPTH_STENCIL_ATTACHMENT = 1 << 5;
    }
}

/// A descriptor used to create a [`Texture`].
#[derive(Debug, Clone)]
pub struct TextureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The dimensions (width, height, depth/layers) of the texture.
    pub size: Extent3D,
    /// The number of mipmap levels for the texture.
    pub mip_level_count: u32,
    /// The number of samples per pixel (for multisampling).
    pub sample_count: SampleCount,
    /// The dimensionality of the texture.
    pub dimension: TextureDimension,
    /// The format of the texels in the texture.
    pub format: TextureFormat,
    /// A bitmask of [`TextureUsage`] flags describing how the texture will
    /// be used.
    pub usage: TextureUsage,
}

/// A GPU texture resource.
pub struct Texture {
    id: ResourceId,
    label: Option<String>,
    size: Extent3D,
    mip_level_count: u32,
    sample_count: SampleCount,
    dimension: TextureDimension,
    format: TextureFormat,
    usage: TextureUsage,
    native: NativeObject,
}

/// A shared handle to a [`Texture`].
pub type TextureHandle = Arc<Texture>;

impl Texture {
    /// Wraps a backend-native texture object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &TextureDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            size: descriptor.size,
            mip_level_count: descriptor.mip_level_count,
            sample_count: descriptor.sample_count,
            dimension: descriptor.dimension,
            format: descriptor.format,
            usage: descriptor.usage,
            native,
        }
    }

    /// The pixel dimensions of the texture.
    pub fn size(&self) -> Extent3D {
        self.size
    }

    /// The number of mipmap levels.
    pub fn mip_level_count(&self) -> u32 {
        self.mip_level_count
    }

    /// The multisample count.
    pub fn sample_count(&self) -> SampleCount {
        self.sample_count
    }

    /// The dimensionality of the texture.
    pub fn dimension(&self) -> TextureDimension {
        self.dimension
    }

    /// The texel format.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The usage flags the texture was created with.
    pub fn usage(&self) -> TextureUsage {
        self.usage
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for Texture {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Texture
    }
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("size", &self.size)
            .field("format", &self.format)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
