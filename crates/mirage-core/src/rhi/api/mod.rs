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

//! Resource descriptors, handles, and the binding model.

pub mod binding;
pub mod buffer;
pub mod pass;
pub mod pipeline;
pub mod resource;
pub mod sampler;
pub mod shader;
pub mod swap_chain;
pub mod texture;
pub mod vertex;

pub use binding::{
    DescriptorKind, DescriptorRange, ResourceBinding, ResourceGroup, ResourceGroupDescriptor,
    ResourceGroupHandle, RootParameter, RootSignature, RootSignatureDescriptor,
    RootSignatureHandle, TextureSampleKind,
};
pub use buffer::{Buffer, BufferDescriptor, BufferHandle, BufferUsage};
pub use pass::{
    Framebuffer, FramebufferDescriptor, FramebufferHandle, RenderPass, RenderPassDescriptor,
    RenderPassHandle,
};
pub use pipeline::{
    ComputePipeline, ComputePipelineDescriptor, ComputePipelineHandle, GraphicsPipeline,
    GraphicsPipelineDescriptor, GraphicsPipelineHandle, GraphicsShaderStages,
};
pub use resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
pub use sampler::{
    AddressMode, CompareFunction, FilterMode, Sampler, SamplerDescriptor, SamplerHandle,
};
pub use shader::{
    ShaderModule, ShaderModuleDescriptor, ShaderModuleHandle, ShaderSource, ShaderStage,
    ShaderStageFlags,
};
pub use swap_chain::{SwapChain, SwapChainDescriptor, SwapChainHandle};
pub use texture::{
    SampleCount, Texture, TextureDescriptor, TextureDimension, TextureFormat, TextureHandle,
    TextureUsage,
};
pub use vertex::{
    IndexBufferView, IndexFormat, VertexArray, VertexArrayDescriptor, VertexArrayHandle,
    VertexAttribute, VertexBufferLayout, VertexBufferView, VertexFormat, VertexStepMode,
};
