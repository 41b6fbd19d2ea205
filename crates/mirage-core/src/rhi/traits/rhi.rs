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

use crate::rhi::api::binding::{
    ResourceGroupDescriptor, ResourceGroupHandle, RootSignatureDescriptor, RootSignatureHandle,
};
use crate::rhi::api::buffer::{BufferDescriptor, BufferHandle};
use crate::rhi::api::pass::{
    FramebufferDescriptor, FramebufferHandle, RenderPassDescriptor, RenderPassHandle,
};
use crate::rhi::api::pipeline::{
    ComputePipelineDescriptor, ComputePipelineHandle, GraphicsPipelineDescriptor,
    GraphicsPipelineHandle,
};
use crate::rhi::api::sampler::{SamplerDescriptor, SamplerHandle};
use crate::rhi::api::shader::{ShaderModuleDescriptor, ShaderModuleHandle};
use crate::rhi::api::swap_chain::{SwapChainDescriptor, SwapChainHandle};
use crate::rhi::api::texture::{TextureDescriptor, TextureHandle};
use crate::rhi::api::vertex::{VertexArrayDescriptor, VertexArrayHandle};
use crate::rhi::capabilities::{AdapterInfo, Capabilities};
use crate::rhi::command::CommandBuffer;
use crate::rhi::error::{RenderError, ResourceError, SubmitError};
use crate::rhi::traits::SurfaceTarget;
use std::fmt::Debug;

/// The Rendering Hardware Interface: the device trait every concrete
/// backend implements.
///
/// An `Rhi` is both the factory for every resource kind and the sink a
/// recorded [`CommandBuffer`] is submitted to. Creation failures are
/// `Err` values the caller must check; no factory method panics on a
/// rejected descriptor.
///
/// Implementations are `Send + Sync` with internal locking; a given
/// command buffer is still filled and submitted by one thread at a time,
/// which `&mut` recording already enforces.
pub trait Rhi: Send + Sync + Debug {
    /// Identity of the adapter this device runs on.
    fn adapter_info(&self) -> AdapterInfo;

    /// The feature and limit set of this device.
    fn capabilities(&self) -> &Capabilities;

    // --- Resource factories ---

    /// Creates a GPU buffer.
    fn create_buffer(&self, descriptor: &BufferDescriptor<'_>)
        -> Result<BufferHandle, ResourceError>;

    /// Creates a GPU buffer initialized with `data`. More efficient than
    /// create-then-write for static buffers.
    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor<'_>,
        data: &[u8],
    ) -> Result<BufferHandle, ResourceError>;

    /// Writes data into a buffer immediately (outside any command buffer).
    fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError>;

    /// Creates a GPU texture.
    fn create_texture(
        &self,
        descriptor: &TextureDescriptor<'_>,
    ) -> Result<TextureHandle, ResourceError>;

    /// Creates a sampler state object.
    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor<'_>,
    ) -> Result<SamplerHandle, ResourceError>;

    /// Compiles a shader module for one logical stage.
    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor<'_>,
    ) -> Result<ShaderModuleHandle, ResourceError>;

    /// Creates a root signature from its parameter declaration.
    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor<'_>,
    ) -> Result<RootSignatureHandle, ResourceError>;

    /// Creates a resource group binding concrete resources to one root
    /// parameter of `signature`.
    ///
    /// Validation is deterministic: the supplied resource and sampler
    /// counts must equal the slot's declared descriptor counts, element
    /// for element (see
    /// [`validate_resource_group`](crate::rhi::api::binding::validate_resource_group)).
    fn create_resource_group(
        &self,
        signature: &RootSignatureHandle,
        descriptor: &ResourceGroupDescriptor<'_>,
    ) -> Result<ResourceGroupHandle, ResourceError>;

    /// Creates a render pass compatibility descriptor.
    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Result<RenderPassHandle, ResourceError>;

    /// Creates a framebuffer binding texture attachments to a render pass.
    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor<'_>,
    ) -> Result<FramebufferHandle, ResourceError>;

    /// Creates a vertex array from vertex buffers and an optional index
    /// buffer. The array keeps handles to every buffer.
    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor<'_>,
    ) -> Result<VertexArrayHandle, ResourceError>;

    /// Creates an immutable graphics pipeline state object, or fails if
    /// validation rejects the combination.
    fn create_graphics_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor<'_>,
    ) -> Result<GraphicsPipelineHandle, ResourceError>;

    /// Creates an immutable compute pipeline state object.
    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_>,
    ) -> Result<ComputePipelineHandle, ResourceError>;

    // --- Swap chain ---

    /// Creates a swap chain presenting to `target`.
    fn create_swap_chain(
        &self,
        target: SurfaceTarget<'_>,
        descriptor: &SwapChainDescriptor<'_>,
    ) -> Result<SwapChainHandle, ResourceError>;

    /// Resizes a swap chain after its window changed size. Must be
    /// externally serialized against concurrent submission.
    fn resize_swap_chain(
        &self,
        swap_chain: &SwapChainHandle,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError>;

    /// Presents the swap chain's current backbuffer.
    fn present(&self, swap_chain: &SwapChainHandle) -> Result<(), RenderError>;

    // --- Submission ---

    /// Validates and replays a recorded command buffer against the native
    /// API.
    ///
    /// The buffer is not consumed: it may be submitted again, or cleared
    /// and refilled. Replay is deterministic — submitting an identical
    /// recording produces an identical native-call sequence.
    fn submit_command_buffer(&self, commands: &CommandBuffer) -> Result<(), SubmitError>;

    /// Flushes any work buffered by previous submissions and marks the end
    /// of a frame.
    fn finish_frame(&self) -> Result<(), RenderError>;
}
