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

//! The null backend: a headless [`Rhi`] that performs full validation and
//! records the translated native-call sequence as a text trace instead of
//! touching a GPU.
//!
//! The trace stands in for a flat-slot native API: resource groups are
//! replayed as one bind call per flattened descriptor element. Because
//! translation is deterministic, submitting identical recordings yields
//! identical traces, which is what the round-trip tests assert. The
//! backend models a fully capable device (tessellation, geometry,
//! compute), so core validation rules can be exercised without hardware.

mod replay;

use mirage_core::math::Extent2D;
use mirage_core::rhi::api::binding::{
    validate_resource_group, ResourceGroup, ResourceGroupDescriptor, ResourceGroupHandle,
    RootSignature, RootSignatureDescriptor, RootSignatureHandle,
};
use mirage_core::rhi::api::buffer::{Buffer, BufferDescriptor, BufferHandle};
use mirage_core::rhi::api::pass::{
    validate_framebuffer, Framebuffer, FramebufferDescriptor, FramebufferHandle, RenderPass,
    RenderPassDescriptor, RenderPassHandle,
};
use mirage_core::rhi::api::pipeline::{
    validate_compute_pipeline, validate_graphics_pipeline, ComputePipeline,
    ComputePipelineDescriptor, ComputePipelineHandle, GraphicsPipeline,
    GraphicsPipelineDescriptor, GraphicsPipelineHandle,
};
use mirage_core::rhi::api::resource::RhiResource;
use mirage_core::rhi::api::sampler::{Sampler, SamplerDescriptor, SamplerHandle};
use mirage_core::rhi::api::shader::{ShaderModule, ShaderModuleDescriptor, ShaderModuleHandle};
use mirage_core::rhi::api::swap_chain::{SwapChain, SwapChainDescriptor, SwapChainHandle};
use mirage_core::rhi::api::texture::{
    SampleCount, Texture, TextureDescriptor, TextureFormat, TextureHandle,
};
use mirage_core::rhi::api::vertex::{
    validate_vertex_array, VertexArray, VertexArrayDescriptor, VertexArrayHandle,
};
use mirage_core::rhi::backend::{BackendConfig, BackendRegistration};
use mirage_core::rhi::capabilities::{AdapterInfo, Capabilities, DeviceType, GraphicsBackendType};
use mirage_core::rhi::command::{validate, CommandBuffer};
use mirage_core::rhi::error::{RenderError, ResourceError, SubmitError};
use mirage_core::rhi::traits::SurfaceTarget;
use mirage_core::rhi::Rhi;
use std::borrow::Cow;
use std::sync::{Arc, Mutex};

/// Factory registered under the name `"Null"`.
pub fn create_null_rhi(config: &BackendConfig) -> Result<Arc<dyn Rhi>, RenderError> {
    Ok(Arc::new(NullRhi::new(config)))
}

inventory::submit! {
    BackendRegistration {
        name: "Null",
        factory: create_null_rhi,
    }
}

/// The headless trace-recording backend.
#[derive(Debug)]
pub struct NullRhi {
    capabilities: Capabilities,
    trace: Mutex<Vec<String>>,
}

impl NullRhi {
    /// Creates a null device. The configuration is accepted for interface
    /// parity; only logging depends on it.
    pub fn new(config: &BackendConfig) -> Self {
        log::info!(
            "NullRhi: created headless device (requested backend '{}')",
            config.backend_name
        );
        Self {
            capabilities: Capabilities {
                supports_tessellation: true,
                supports_geometry_shaders: true,
                supports_compute: true,
                supports_indirect_draw: true,
                ..Capabilities::default()
            },
            trace: Mutex::new(Vec::new()),
        }
    }

    /// Drains and returns the recorded native-call trace.
    pub fn take_trace(&self) -> Vec<String> {
        std::mem::take(&mut *self.trace.lock().unwrap())
    }

    /// A snapshot of the recorded native-call trace.
    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }

    pub(crate) fn record(&self, line: String) {
        self.trace.lock().unwrap().push(line);
    }
}

impl Rhi for NullRhi {
    fn adapter_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "Mirage Null Device".to_string(),
            backend_type: GraphicsBackendType::Null,
            device_type: DeviceType::Cpu,
        }
    }

    fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    fn create_buffer(
        &self,
        descriptor: &BufferDescriptor<'_>,
    ) -> Result<BufferHandle, ResourceError> {
        if descriptor.size == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "buffer size must be non-zero".into(),
            ));
        }
        let buffer = Arc::new(Buffer::new(descriptor, Box::new(())));
        log::debug!(
            "NullRhi: created buffer {} ({} bytes)",
            buffer.resource_id(),
            buffer.size()
        );
        Ok(buffer)
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor<'_>,
        data: &[u8],
    ) -> Result<BufferHandle, ResourceError> {
        if data.len() as u64 > descriptor.size {
            return Err(ResourceError::OutOfBounds);
        }
        self.create_buffer(descriptor)
    }

    fn write_buffer(
        &self,
        buffer: &BufferHandle,
        offset: u64,
        data: &[u8],
    ) -> Result<(), ResourceError> {
        if offset + data.len() as u64 > buffer.size() {
            return Err(ResourceError::OutOfBounds);
        }
        self.record(format!(
            "write_buffer(buffer={}, offset={}, bytes={})",
            buffer.resource_id(),
            offset,
            data.len()
        ));
        Ok(())
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor<'_>,
    ) -> Result<TextureHandle, ResourceError> {
        if descriptor.size.width == 0 || descriptor.size.height == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "texture extent must be non-zero".into(),
            ));
        }
        if descriptor.mip_level_count == 0 {
            return Err(ResourceError::InvalidDescriptor(
                "mip_level_count must be at least 1".into(),
            ));
        }
        Ok(Arc::new(Texture::new(descriptor, Box::new(()))))
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor<'_>,
    ) -> Result<SamplerHandle, ResourceError> {
        Ok(Arc::new(Sampler::new(descriptor, Box::new(()))))
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor<'_>,
    ) -> Result<ShaderModuleHandle, ResourceError> {
        // Headless device: both text and SPIR-V sources are accepted
        // without compilation.
        Ok(Arc::new(ShaderModule::new(descriptor, Box::new(()))))
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor<'_>,
    ) -> Result<RootSignatureHandle, ResourceError> {
        Ok(Arc::new(RootSignature::new(descriptor, Box::new(()))))
    }

    fn create_resource_group(
        &self,
        signature: &RootSignatureHandle,
        descriptor: &ResourceGroupDescriptor<'_>,
    ) -> Result<ResourceGroupHandle, ResourceError> {
        validate_resource_group(signature, descriptor)?;
        Ok(Arc::new(ResourceGroup::new(
            signature,
            descriptor,
            Box::new(()),
        )))
    }

    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Result<RenderPassHandle, ResourceError> {
        Ok(Arc::new(RenderPass::new(descriptor, Box::new(()))))
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor<'_>,
    ) -> Result<FramebufferHandle, ResourceError> {
        validate_framebuffer(descriptor)?;
        Ok(Arc::new(Framebuffer::new(descriptor, Box::new(()))))
    }

    fn create_vertex_array(
        &self,
        descriptor: &VertexArrayDescriptor<'_>,
    ) -> Result<VertexArrayHandle, ResourceError> {
        validate_vertex_array(descriptor)?;
        Ok(Arc::new(VertexArray::new(descriptor, Box::new(()))))
    }

    fn create_graphics_pipeline(
        &self,
        descriptor: &GraphicsPipelineDescriptor<'_>,
    ) -> Result<GraphicsPipelineHandle, ResourceError> {
        validate_graphics_pipeline(descriptor, &self.capabilities)?;
        Ok(Arc::new(GraphicsPipeline::new(descriptor, Box::new(()))))
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_>,
    ) -> Result<ComputePipelineHandle, ResourceError> {
        validate_compute_pipeline(descriptor, &self.capabilities)?;
        Ok(Arc::new(ComputePipeline::new(descriptor, Box::new(()))))
    }

    fn create_swap_chain(
        &self,
        target: SurfaceTarget<'_>,
        descriptor: &SwapChainDescriptor<'_>,
    ) -> Result<SwapChainHandle, ResourceError> {
        let format = descriptor.format.unwrap_or(TextureFormat::Bgra8UnormSrgb);
        let render_pass = Arc::new(RenderPass::new(
            &RenderPassDescriptor {
                label: Some(Cow::Borrowed("null swap chain pass")),
                color_formats: Cow::Owned(vec![format]),
                depth_stencil_format: None,
                sample_count: SampleCount::X1,
            },
            Box::new(()),
        ));
        let mut descriptor = descriptor.clone();
        descriptor.size = target.size();
        Ok(Arc::new(SwapChain::new(
            &descriptor,
            render_pass,
            format,
            Box::new(()),
        )))
    }

    fn resize_swap_chain(
        &self,
        swap_chain: &SwapChainHandle,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        swap_chain.set_extent(Extent2D::new(width.max(1), height.max(1)));
        self.record(format!(
            "resize_swap_chain(swap_chain={}, width={}, height={})",
            swap_chain.resource_id(),
            width,
            height
        ));
        Ok(())
    }

    fn present(&self, swap_chain: &SwapChainHandle) -> Result<(), RenderError> {
        self.record(format!("present(swap_chain={})", swap_chain.resource_id()));
        Ok(())
    }

    fn submit_command_buffer(&self, commands: &CommandBuffer) -> Result<(), SubmitError> {
        validate::validate(commands)?;
        replay::replay(self, commands);
        Ok(())
    }

    fn finish_frame(&self) -> Result<(), RenderError> {
        self.record("finish_frame()".to_string());
        Ok(())
    }
}
