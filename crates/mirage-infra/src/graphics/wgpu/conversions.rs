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

//! Conversions from the engine's API types into wgpu types.
//!
//! A local extension trait avoids Rust's orphan rules while keeping an
//! idiomatic `.into_wgpu()` syntax at the call sites.

use mirage_core::math::{Extent3D, LinearRgba};
use mirage_core::rhi::api::binding::{DescriptorKind, TextureSampleKind};
use mirage_core::rhi::api::buffer::BufferUsage;
use mirage_core::rhi::api::pipeline::{
    BlendComponent, BlendFactor, BlendOperation, ColorWrites, CullMode, FrontFace, PolygonMode,
    PrimitiveTopology, StencilFaceState, StencilOperation,
};
use mirage_core::rhi::api::sampler::{AddressMode, CompareFunction, FilterMode};
use mirage_core::rhi::api::shader::ShaderStageFlags;
use mirage_core::rhi::api::texture::{
    SampleCount, TextureDimension, TextureFormat, TextureUsage,
};
use mirage_core::rhi::api::vertex::{IndexFormat, VertexFormat, VertexStepMode};

/// A local extension trait to convert engine types into wgpu types.
pub trait IntoWgpu<T> {
    /// Consumes self and converts it into a wgpu-compatible type.
    fn into_wgpu(self) -> T;
}

impl IntoWgpu<wgpu::Extent3d> for Extent3D {
    fn into_wgpu(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: self.depth_or_array_layers,
        }
    }
}

impl IntoWgpu<wgpu::Color> for LinearRgba {
    fn into_wgpu(self) -> wgpu::Color {
        wgpu::Color {
            r: self.r as f64,
            g: self.g as f64,
            b: self.b as f64,
            a: self.a as f64,
        }
    }
}

impl IntoWgpu<wgpu::BufferUsages> for BufferUsage {
    fn into_wgpu(self) -> wgpu::BufferUsages {
        let mut usages = wgpu::BufferUsages::empty();
        if self.contains(BufferUsage::COPY_SRC) {
            usages |= wgpu::BufferUsages::COPY_SRC;
        }
        if self.contains(BufferUsage::COPY_DST) {
            usages |= wgpu::BufferUsages::COPY_DST;
        }
        if self.contains(BufferUsage::VERTEX) {
            usages |= wgpu::BufferUsages::VERTEX;
        }
        if self.contains(BufferUsage::INDEX) {
            usages |= wgpu::BufferUsages::INDEX;
        }
        if self.contains(BufferUsage::UNIFORM) {
            usages |= wgpu::BufferUsages::UNIFORM;
        }
        if self.contains(BufferUsage::STORAGE) {
            usages |= wgpu::BufferUsages::STORAGE;
        }
        if self.contains(BufferUsage::INDIRECT) {
            usages |= wgpu::BufferUsages::INDIRECT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureUsages> for TextureUsage {
    fn into_wgpu(self) -> wgpu::TextureUsages {
        let mut usages = wgpu::TextureUsages::empty();
        if self.contains(TextureUsage::COPY_SRC) {
            usages |= wgpu::TextureUsages::COPY_SRC;
        }
        if self.contains(TextureUsage::COPY_DST) {
            usages |= wgpu::TextureUsages::COPY_DST;
        }
        if self.contains(TextureUsage::TEXTURE_BINDING) {
            usages |= wgpu::TextureUsages::TEXTURE_BINDING;
        }
        if self.contains(TextureUsage::STORAGE_BINDING) {
            usages |= wgpu::TextureUsages::STORAGE_BINDING;
        }
        if self.contains(TextureUsage::RENDER_ATTACHMENT)
            || self.contains(TextureUsage::DEPTH_STENCIL_ATTACHMENT)
        {
            usages |= wgpu::TextureUsages::RENDER_ATTACHMENT;
        }
        usages
    }
}

impl IntoWgpu<wgpu::TextureDimension> for TextureDimension {
    fn into_wgpu(self) -> wgpu::TextureDimension {
        match self {
            TextureDimension::D1 => wgpu::TextureDimension::D1,
            TextureDimension::D2 | TextureDimension::D2Array | TextureDimension::Cube => {
                wgpu::TextureDimension::D2
            }
            TextureDimension::D3 => wgpu::TextureDimension::D3,
        }
    }
}

impl IntoWgpu<wgpu::TextureViewDimension> for TextureDimension {
    fn into_wgpu(self) -> wgpu::TextureViewDimension {
        match self {
            TextureDimension::D1 => wgpu::TextureViewDimension::D1,
            TextureDimension::D2 => wgpu::TextureViewDimension::D2,
            TextureDimension::D2Array => wgpu::TextureViewDimension::D2Array,
            TextureDimension::D3 => wgpu::TextureViewDimension::D3,
            TextureDimension::Cube => wgpu::TextureViewDimension::Cube,
        }
    }
}

impl IntoWgpu<wgpu::TextureFormat> for TextureFormat {
    fn into_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::R8Unorm => wgpu::TextureFormat::R8Unorm,
            TextureFormat::Rg8Unorm => wgpu::TextureFormat::Rg8Unorm,
            TextureFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            TextureFormat::R16Float => wgpu::TextureFormat::R16Float,
            TextureFormat::Rg16Float => wgpu::TextureFormat::Rg16Float,
            TextureFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
            TextureFormat::R32Float => wgpu::TextureFormat::R32Float,
            TextureFormat::Rg32Float => wgpu::TextureFormat::Rg32Float,
            TextureFormat::Rgba32Float => wgpu::TextureFormat::Rgba32Float,
            TextureFormat::Depth16Unorm => wgpu::TextureFormat::Depth16Unorm,
            TextureFormat::Depth24Plus => wgpu::TextureFormat::Depth24Plus,
            TextureFormat::Depth32Float => wgpu::TextureFormat::Depth32Float,
            TextureFormat::Depth32FloatStencil8 => wgpu::TextureFormat::Depth32FloatStencil8,
        }
    }
}

/// Maps a wgpu surface format back into the engine's format enum.
pub fn from_wgpu_texture_format(format: wgpu::TextureFormat) -> Option<TextureFormat> {
    match format {
        wgpu::TextureFormat::Rgba8Unorm => Some(TextureFormat::Rgba8Unorm),
        wgpu::TextureFormat::Rgba8UnormSrgb => Some(TextureFormat::Rgba8UnormSrgb),
        wgpu::TextureFormat::Bgra8UnormSrgb => Some(TextureFormat::Bgra8UnormSrgb),
        wgpu::TextureFormat::Rgba16Float => Some(TextureFormat::Rgba16Float),
        _ => None,
    }
}

impl IntoWgpu<u32> for SampleCount {
    fn into_wgpu(self) -> u32 {
        self.as_u32()
    }
}

impl IntoWgpu<wgpu::ShaderStages> for ShaderStageFlags {
    fn into_wgpu(self) -> wgpu::ShaderStages {
        let mut stages = wgpu::ShaderStages::empty();
        if self.contains(ShaderStageFlags::VERTEX) {
            stages |= wgpu::ShaderStages::VERTEX;
        }
        if self.contains(ShaderStageFlags::FRAGMENT) {
            stages |= wgpu::ShaderStages::FRAGMENT;
        }
        if self.contains(ShaderStageFlags::COMPUTE) {
            stages |= wgpu::ShaderStages::COMPUTE;
        }
        // Tessellation and geometry stages have no wgpu equivalent; their
        // visibility bits are dropped (pipelines using those stages are
        // rejected before reaching this point).
        stages
    }
}

impl IntoWgpu<wgpu::TextureSampleType> for TextureSampleKind {
    fn into_wgpu(self) -> wgpu::TextureSampleType {
        match self {
            TextureSampleKind::Float => wgpu::TextureSampleType::Float { filterable: true },
            TextureSampleKind::UnfilterableFloat => {
                wgpu::TextureSampleType::Float { filterable: false }
            }
            TextureSampleKind::Depth => wgpu::TextureSampleType::Depth,
            TextureSampleKind::Uint => wgpu::TextureSampleType::Uint,
            TextureSampleKind::Sint => wgpu::TextureSampleType::Sint,
        }
    }
}

/// Maps a descriptor kind onto the wgpu binding type used in bind group
/// layouts. The descriptor-table model maps 1:1 onto wgpu's group/binding
/// model: root parameter index = group index, flattened element binding =
/// binding index.
pub fn binding_type(kind: DescriptorKind) -> wgpu::BindingType {
    match kind {
        DescriptorKind::UniformBuffer => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        DescriptorKind::StorageBuffer { read_only } => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        DescriptorKind::SampledTexture {
            dimension,
            sample_type,
        } => wgpu::BindingType::Texture {
            sample_type: sample_type.into_wgpu(),
            view_dimension: dimension.into_wgpu(),
            multisampled: false,
        },
        DescriptorKind::StorageTexture {
            read_only,
            format,
            dimension,
        } => wgpu::BindingType::StorageTexture {
            access: if read_only {
                wgpu::StorageTextureAccess::ReadOnly
            } else {
                wgpu::StorageTextureAccess::WriteOnly
            },
            format: format.into_wgpu(),
            view_dimension: dimension.into_wgpu(),
        },
        DescriptorKind::Sampler { comparison } => wgpu::BindingType::Sampler(if comparison {
            wgpu::SamplerBindingType::Comparison
        } else {
            wgpu::SamplerBindingType::Filtering
        }),
    }
}

impl IntoWgpu<wgpu::AddressMode> for AddressMode {
    fn into_wgpu(self) -> wgpu::AddressMode {
        match self {
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

impl IntoWgpu<wgpu::FilterMode> for FilterMode {
    fn into_wgpu(self) -> wgpu::FilterMode {
        match self {
            FilterMode::Nearest => wgpu::FilterMode::Nearest,
            FilterMode::Linear => wgpu::FilterMode::Linear,
        }
    }
}

impl IntoWgpu<wgpu::CompareFunction> for CompareFunction {
    fn into_wgpu(self) -> wgpu::CompareFunction {
        match self {
            CompareFunction::Never => wgpu::CompareFunction::Never,
            CompareFunction::Less => wgpu::CompareFunction::Less,
            CompareFunction::Equal => wgpu::CompareFunction::Equal,
            CompareFunction::LessEqual => wgpu::CompareFunction::LessEqual,
            CompareFunction::Greater => wgpu::CompareFunction::Greater,
            CompareFunction::NotEqual => wgpu::CompareFunction::NotEqual,
            CompareFunction::GreaterEqual => wgpu::CompareFunction::GreaterEqual,
            CompareFunction::Always => wgpu::CompareFunction::Always,
        }
    }
}

impl IntoWgpu<Option<wgpu::PrimitiveTopology>> for PrimitiveTopology {
    fn into_wgpu(self) -> Option<wgpu::PrimitiveTopology> {
        match self {
            PrimitiveTopology::PointList => Some(wgpu::PrimitiveTopology::PointList),
            PrimitiveTopology::LineList => Some(wgpu::PrimitiveTopology::LineList),
            PrimitiveTopology::LineStrip => Some(wgpu::PrimitiveTopology::LineStrip),
            PrimitiveTopology::TriangleList => Some(wgpu::PrimitiveTopology::TriangleList),
            PrimitiveTopology::TriangleStrip => Some(wgpu::PrimitiveTopology::TriangleStrip),
            // No tessellation support in wgpu; rejected during validation.
            PrimitiveTopology::PatchList { .. } => None,
        }
    }
}

impl IntoWgpu<wgpu::FrontFace> for FrontFace {
    fn into_wgpu(self) -> wgpu::FrontFace {
        match self {
            FrontFace::Ccw => wgpu::FrontFace::Ccw,
            FrontFace::Cw => wgpu::FrontFace::Cw,
        }
    }
}

impl IntoWgpu<wgpu::Face> for CullMode {
    fn into_wgpu(self) -> wgpu::Face {
        match self {
            CullMode::Front => wgpu::Face::Front,
            CullMode::Back => wgpu::Face::Back,
        }
    }
}

impl IntoWgpu<wgpu::PolygonMode> for PolygonMode {
    fn into_wgpu(self) -> wgpu::PolygonMode {
        match self {
            PolygonMode::Fill => wgpu::PolygonMode::Fill,
            PolygonMode::Line => wgpu::PolygonMode::Line,
        }
    }
}

impl IntoWgpu<wgpu::StencilOperation> for StencilOperation {
    fn into_wgpu(self) -> wgpu::StencilOperation {
        match self {
            StencilOperation::Keep => wgpu::StencilOperation::Keep,
            StencilOperation::Zero => wgpu::StencilOperation::Zero,
            StencilOperation::Replace => wgpu::StencilOperation::Replace,
            StencilOperation::Invert => wgpu::StencilOperation::Invert,
            StencilOperation::IncrementClamp => wgpu::StencilOperation::IncrementClamp,
            StencilOperation::DecrementClamp => wgpu::StencilOperation::DecrementClamp,
        }
    }
}

impl IntoWgpu<wgpu::StencilFaceState> for StencilFaceState {
    fn into_wgpu(self) -> wgpu::StencilFaceState {
        wgpu::StencilFaceState {
            compare: self.compare.into_wgpu(),
            fail_op: self.fail_op.into_wgpu(),
            depth_fail_op: self.depth_fail_op.into_wgpu(),
            pass_op: self.pass_op.into_wgpu(),
        }
    }
}

impl IntoWgpu<wgpu::BlendFactor> for BlendFactor {
    fn into_wgpu(self) -> wgpu::BlendFactor {
        match self {
            BlendFactor::Zero => wgpu::BlendFactor::Zero,
            BlendFactor::One => wgpu::BlendFactor::One,
            BlendFactor::Src => wgpu::BlendFactor::Src,
            BlendFactor::OneMinusSrc => wgpu::BlendFactor::OneMinusSrc,
            BlendFactor::SrcAlpha => wgpu::BlendFactor::SrcAlpha,
            BlendFactor::OneMinusSrcAlpha => wgpu::BlendFactor::OneMinusSrcAlpha,
            BlendFactor::Dst => wgpu::BlendFactor::Dst,
            BlendFactor::OneMinusDst => wgpu::BlendFactor::OneMinusDst,
            BlendFactor::DstAlpha => wgpu::BlendFactor::DstAlpha,
            BlendFactor::OneMinusDstAlpha => wgpu::BlendFactor::OneMinusDstAlpha,
        }
    }
}

impl IntoWgpu<wgpu::BlendOperation> for BlendOperation {
    fn into_wgpu(self) -> wgpu::BlendOperation {
        match self {
            BlendOperation::Add => wgpu::BlendOperation::Add,
            BlendOperation::Subtract => wgpu::BlendOperation::Subtract,
            BlendOperation::ReverseSubtract => wgpu::BlendOperation::ReverseSubtract,
            BlendOperation::Min => wgpu::BlendOperation::Min,
            BlendOperation::Max => wgpu::BlendOperation::Max,
        }
    }
}

impl IntoWgpu<wgpu::BlendComponent> for BlendComponent {
    fn into_wgpu(self) -> wgpu::BlendComponent {
        wgpu::BlendComponent {
            src_factor: self.src_factor.into_wgpu(),
            dst_factor: self.dst_factor.into_wgpu(),
            operation: self.operation.into_wgpu(),
        }
    }
}

impl IntoWgpu<wgpu::ColorWrites> for ColorWrites {
    fn into_wgpu(self) -> wgpu::ColorWrites {
        wgpu::ColorWrites::from_bits_truncate(self.bits())
    }
}

impl IntoWgpu<wgpu::VertexFormat> for VertexFormat {
    fn into_wgpu(self) -> wgpu::VertexFormat {
        match self {
            VertexFormat::Float32 => wgpu::VertexFormat::Float32,
            VertexFormat::Float32x2 => wgpu::VertexFormat::Float32x2,
            VertexFormat::Float32x3 => wgpu::VertexFormat::Float32x3,
            VertexFormat::Float32x4 => wgpu::VertexFormat::Float32x4,
            VertexFormat::Uint32x2 => wgpu::VertexFormat::Uint32x2,
            VertexFormat::Unorm8x4 => wgpu::VertexFormat::Unorm8x4,
            VertexFormat::Float16x4 => wgpu::VertexFormat::Float16x4,
        }
    }
}

impl IntoWgpu<wgpu::VertexStepMode> for VertexStepMode {
    fn into_wgpu(self) -> wgpu::VertexStepMode {
        match self {
            VertexStepMode::Vertex => wgpu::VertexStepMode::Vertex,
            VertexStepMode::Instance => wgpu::VertexStepMode::Instance,
        }
    }
}

impl IntoWgpu<wgpu::IndexFormat> for IndexFormat {
    fn into_wgpu(self) -> wgpu::IndexFormat {
        match self {
            IndexFormat::Uint16 => wgpu::IndexFormat::Uint16,
            IndexFormat::Uint32 => wgpu::IndexFormat::Uint32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_flags_map_bit_for_bit() {
        let usage = BufferUsage::UNIFORM | BufferUsage::COPY_DST;
        let wgpu_usage: wgpu::BufferUsages = usage.into_wgpu();
        assert!(wgpu_usage.contains(wgpu::BufferUsages::UNIFORM));
        assert!(wgpu_usage.contains(wgpu::BufferUsages::COPY_DST));
        assert!(!wgpu_usage.contains(wgpu::BufferUsages::VERTEX));
    }

    #[test]
    fn patch_topology_has_no_wgpu_equivalent() {
        let converted: Option<wgpu::PrimitiveTopology> =
            PrimitiveTopology::PatchList { control_points: 3 }.into_wgpu();
        assert!(converted.is_none());
        let converted: Option<wgpu::PrimitiveTopology> =
            PrimitiveTopology::TriangleList.into_wgpu();
        assert_eq!(converted, Some(wgpu::PrimitiveTopology::TriangleList));
    }

    #[test]
    fn storage_descriptor_maps_to_storage_binding() {
        let ty = binding_type(DescriptorKind::StorageBuffer { read_only: true });
        assert!(matches!(
            ty,
            wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Storage { read_only: true },
                ..
            }
        ));
    }
}
