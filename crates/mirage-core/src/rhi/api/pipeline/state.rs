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

//! Fixed-function state blocks for graphics pipelines.

use crate::mirage_bitflags;
use crate::rhi::api::sampler::CompareFunction;
use crate::rhi::api::texture::TextureFormat;
use crate::rhi::api::vertex::IndexFormat;

/// The topology of the primitives a pipeline assembles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTopology {
    /// Each vertex is a point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Connected lines; each vertex extends the strip.
    LineStrip,
    /// Every three vertices form a triangle.
    TriangleList,
    /// Connected triangles; each vertex extends the strip.
    TriangleStrip,
    /// Tessellation patches with the given number of control points.
    /// Requires both tessellation stages in the pipeline.
    PatchList {
        /// The number of control points per patch (1..=32).
        control_points: u32,
    },
}

impl PrimitiveTopology {
    /// Whether this topology feeds the tessellator.
    pub const fn is_patch_list(&self) -> bool {
        matches!(self, PrimitiveTopology::PatchList { .. })
    }
}

/// The vertex winding order that determines the front face of a triangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FrontFace {
    /// Counter-clockwise winding is the front face.
    #[default]
    Ccw,
    /// Clockwise winding is the front face.
    Cw,
}

/// The face culling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CullMode {
    /// Cull front-facing primitives.
    Front,
    /// Cull back-facing primitives.
    Back,
}

/// The rasterization mode for polygons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PolygonMode {
    /// Rasterize filled polygons.
    #[default]
    Fill,
    /// Rasterize polygon edges only.
    Line,
}

/// The state for primitive assembly and rasterization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RasterizerState {
    /// The topology of the primitives.
    pub topology: PrimitiveTopology,
    /// The index format for strip topologies.
    pub strip_index_format: Option<IndexFormat>,
    /// The winding order of front faces.
    pub front_face: FrontFace,
    /// The face culling mode, or `None` to disable culling.
    pub cull_mode: Option<CullMode>,
    /// The polygon rasterization mode.
    pub polygon_mode: PolygonMode,
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self {
            topology: PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: FrontFace::Ccw,
            cull_mode: Some(CullMode::Back),
            polygon_mode: PolygonMode::Fill,
        }
    }
}

/// A stencil operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StencilOperation {
    /// Keep the current value.
    #[default]
    Keep,
    /// Set the value to zero.
    Zero,
    /// Replace the value with the reference.
    Replace,
    /// Bitwise invert the value.
    Invert,
    /// Increment, clamping at the maximum.
    IncrementClamp,
    /// Decrement, clamping at zero.
    DecrementClamp,
}

/// The stencil test and operations for one primitive face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StencilFaceState {
    /// The comparison function used for the stencil test.
    pub compare: CompareFunction,
    /// The operation when the stencil test fails.
    pub fail_op: StencilOperation,
    /// The operation when the stencil test passes but the depth test fails.
    pub depth_fail_op: StencilOperation,
    /// The operation when both tests pass.
    pub pass_op: StencilOperation,
}

/// Depth biasing, used to avoid z-fighting (e.g. in shadow passes).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DepthBias {
    /// A constant value added to each fragment's depth.
    pub constant: i32,
    /// A factor scaling with the fragment's depth slope.
    pub slope_scale: f32,
    /// The maximum bias that can be applied.
    pub clamp: f32,
}

/// The state for depth and stencil testing.
#[derive(Debug, Clone, PartialEq)]
pub struct DepthStencilState {
    /// The format of the depth/stencil attachment.
    pub format: TextureFormat,
    /// If `true`, depth values are written to the depth buffer.
    pub depth_write_enabled: bool,
    /// The comparison function used for the depth test.
    pub depth_compare: CompareFunction,
    /// The stencil state for front-facing primitives.
    pub stencil_front: StencilFaceState,
    /// The stencil state for back-facing primitives.
    pub stencil_back: StencilFaceState,
    /// A bitmask for reading from the stencil buffer.
    pub stencil_read_mask: u32,
    /// A bitmask for writing to the stencil buffer.
    pub stencil_write_mask: u32,
    /// The depth bias state.
    pub bias: DepthBias,
}

impl DepthStencilState {
    /// The common depth-only configuration: test `Less`, write enabled,
    /// stencil untouched.
    pub fn depth_write(format: TextureFormat) -> Self {
        Self {
            format,
            depth_write_enabled: true,
            depth_compare: CompareFunction::Less,
            stencil_front: StencilFaceState::default(),
            stencil_back: StencilFaceState::default(),
            stencil_read_mask: !0,
            stencil_write_mask: !0,
            bias: DepthBias::default(),
        }
    }
}

/// A blend factor in the blend equation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// Factor 0.
    Zero,
    /// Factor 1.
    One,
    /// The source color.
    Src,
    /// One minus the source color.
    OneMinusSrc,
    /// The source alpha.
    SrcAlpha,
    /// One minus the source alpha.
    OneMinusSrcAlpha,
    /// The destination color.
    Dst,
    /// One minus the destination color.
    OneMinusDst,
    /// The destination alpha.
    DstAlpha,
    /// One minus the destination alpha.
    OneMinusDstAlpha,
}

/// The operation combining the blend factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BlendOperation {
    /// `src * src_factor + dst * dst_factor`.
    #[default]
    Add,
    /// `src * src_factor - dst * dst_factor`.
    Subtract,
    /// `dst * dst_factor - src * src_factor`.
    ReverseSubtract,
    /// `min(src, dst)`.
    Min,
    /// `max(src, dst)`.
    Max,
}

/// A complete blend equation for one component group (color or alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendComponent {
    /// The blend factor for the source (fragment shader output).
    pub src_factor: BlendFactor,
    /// The blend factor for the destination (framebuffer content).
    pub dst_factor: BlendFactor,
    /// The operation combining the two.
    pub operation: BlendOperation,
}

impl BlendComponent {
    /// Source replaces destination.
    pub const REPLACE: Self = Self {
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
        operation: BlendOperation::Add,
    };

    /// Standard source-over alpha blending.
    pub const ALPHA_BLENDING: Self = Self {
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
        operation: BlendOperation::Add,
    };
}

/// The blend state for a single color target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlendState {
    /// The blend equation for the RGB components.
    pub color: BlendComponent,
    /// The blend equation for the alpha component.
    pub alpha: BlendComponent,
}

impl BlendState {
    /// Standard source-over alpha blending on both component groups.
    pub const ALPHA_BLENDING: Self = Self {
        color: BlendComponent::ALPHA_BLENDING,
        alpha: BlendComponent::ALPHA_BLENDING,
    };
}

mirage_bitflags! {
    /// A bitmask to enable or disable writes to individual color channels.
    pub struct ColorWrites: u32 {
        /// Enable writes to the red channel.
        const R = 1 << 0;
        /// Enable writes to the green channel.
        const G = 1 << 1;
        /// Enable writes to the blue channel.
        const B = 1 << 2;
        /// Enable writes to the alpha channel.
        const A = 1 << 3;
    }
}

/// The state of a single color target in a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorTargetState {
    /// The texture format of this color target.
    pub format: TextureFormat,
    /// The blending state; `None` disables blending.
    pub blend: Option<BlendState>,
    /// A bitmask controlling which channels are written.
    pub write_mask: ColorWrites,
}

impl ColorTargetState {
    /// An opaque (non-blended) target writing all channels.
    pub fn opaque(format: TextureFormat) -> Self {
        Self {
            format,
            blend: None,
            write_mask: ColorWrites::all(),
        }
    }
}
