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

use mirage_core::math::Extent2D;
use mirage_core::rhi::api::binding::{
    flatten_table, validate_resource_group, DescriptorKind, ResourceBinding, ResourceGroup,
    ResourceGroupDescriptor, ResourceGroupHandle, RootParameter, RootSignature,
    RootSignatureDescriptor, RootSignatureHandle,
};
use mirage_core::rhi::api::buffer::{Buffer, BufferDescriptor, BufferHandle, BufferUsage};
use mirage_core::rhi::api::pass::{
    validate_framebuffer, Framebuffer, FramebufferDescriptor, FramebufferHandle, RenderPass,
    RenderPassDescriptor, RenderPassHandle,
};
use mirage_core::rhi::api::pipeline::{
    validate_compute_pipeline, validate_graphics_pipeline, ComputePipeline,
    ComputePipelineDescriptor, ComputePipelineHandle, GraphicsPipeline,
    GraphicsPipelineDescriptor, GraphicsPipelineHandle,
};
use mirage_core::rhi::api::sampler::{Sampler, SamplerDescriptor, SamplerHandle};
use mirage_core::rhi::api::shader::{
    ShaderModule, ShaderModuleDescriptor, ShaderModuleHandle, ShaderSource, ShaderStage,
};
use mirage_core::rhi::api::swap_chain::{SwapChain, SwapChainDescriptor, SwapChainHandle};
use mirage_core::rhi::api::texture::{SampleCount, Texture, TextureDescriptor, TextureHandle};
use mirage_core::rhi::api::vertex::{
    validate_vertex_array, VertexArray, VertexArrayDescriptor, VertexArrayHandle,
};
use mirage_core::rhi::backend::BackendConfig;
use mirage_core::rhi::capabilities::{AdapterInfo, Capabilities};
use mirage_core::rhi::command::{validate, CommandBuffer};
use mirage_core::rhi::error::{
    PipelineError, RenderError, ResourceError, ShaderError, SubmitError,
};
use mirage_core::rhi::traits::SurfaceTarget;
use mirage_core::rhi::Rhi;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::borrow::Cow;
use std::sync::{Arc, Mutex};
use wgpu::util::DeviceExt;

use super::context::WgpuContext;
use super::conversions::{binding_type, from_wgpu_texture_format, IntoWgpu};
use super::replay;

// --- Backend-native payloads installed into core resource objects ---

#[derive(Debug)]
pub(crate) struct WgpuBuffer {
    pub(crate) buffer: wgpu::Buffer,
}

#[derive(Debug)]
pub(crate) struct WgpuTexture {
    #[allow(dead_code)]
    pub(crate) texture: wgpu::Texture,
    pub(crate) view: wgpu::TextureView,
}

#[derive(Debug)]
pub(crate) struct WgpuSampler {
    pub(crate) sampler: wgpu::Sampler,
}

#[derive(Debug)]
pub(crate) struct WgpuShader {
    pub(crate) module: wgpu::ShaderModule,
}

#[derive(Debug)]
pub(crate) struct WgpuRootSignature {
    #[allow(dead_code)]
    pub(crate) bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    pub(crate) pipeline_layout: wgpu::PipelineLayout,
    /// Root parameter index -> wgpu bind group index. Push-constant
    /// parameters occupy a root slot but no group.
    pub(crate) group_index_per_parameter: Vec<Option<u32>>,
}

#[derive(Debug)]
pub(crate) struct WgpuResourceGroup {
    pub(crate) bind_group: wgpu::BindGroup,
    pub(crate) group_index: u32,
}

#[derive(Debug)]
pub(crate) struct WgpuGraphicsPipeline {
    pub(crate) pipeline: wgpu::RenderPipeline,
}

#[derive(Debug)]
pub(crate) struct WgpuComputePipeline {
    pub(crate) pipeline: wgpu::ComputePipeline,
}

#[derive(Debug)]
pub(crate) struct AcquiredFrame {
    pub(crate) texture: wgpu::SurfaceTexture,
    pub(crate) view: wgpu::TextureView,
}

#[derive(Debug)]
pub(crate) struct WgpuSwapChain {
    pub(crate) surface: wgpu::Surface<'static>,
    pub(crate) config: Mutex<wgpu::SurfaceConfiguration>,
    pub(crate) frame: Mutex<Option<AcquiredFrame>>,
}

/// Downcasts a core resource's native payload to this backend's type.
pub(crate) fn native<'a, T: 'static, R>(
    resource: &'a R,
    get: impl FnOnce(&'a R) -> Option<&'a T>,
) -> Result<&'a T, ResourceError> {
    get(resource).ok_or_else(|| {
        ResourceError::BackendError("resource was not created by the wgpu backend".into())
    })
}

/// The wgpu hardware device.
#[derive(Debug)]
pub struct WgpuRhi {
    pub(crate) context: WgpuContext,
}

impl WgpuRhi {
    /// Creates the device, blocking on adapter and device acquisition.
    pub fn new(config: &BackendConfig) -> Result<Self, RenderError> {
        let context = pollster::block_on(WgpuContext::new(config))
            .map_err(|e| RenderError::InitializationFailed(e.to_string()))?;
        Ok(Self { context })
    }

    fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub(crate) fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }
}

impl Rhi for WgpuRhi {
    fn adapter_info(&self) -> AdapterInfo {
        self.context.adapter_info.clone()
    }

    fn capabilities(&self) -> &Capabilities {
        &self.context.capabilities
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
        let mut usage: wgpu::BufferUsages = descriptor.usage.into_wgpu();
        // Uniform data copies recorded in command buffers replay as
        // buffer-to-buffer copies.
        if descriptor.usage.contains(BufferUsage::UNIFORM) {
            usage |= wgpu::BufferUsages::COPY_DST;
        }
        let buffer = self.device().create_buffer(&wgpu::BufferDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size,
            usage,
            mapped_at_creation: false,
        });
        log::debug!(
            "WgpuRhi: created buffer '{}' ({} bytes)",
            descriptor.label.as_deref().unwrap_or_default(),
            descriptor.size
        );
        Ok(Arc::new(Buffer::new(descriptor, Box::new(WgpuBuffer { buffer }))))
    }

    fn create_buffer_with_data(
        &self,
        descriptor: &BufferDescriptor<'_>,
        data: &[u8],
    ) -> Result<BufferHandle, ResourceError> {
        if data.len() as u64 > descriptor.size {
            return Err(ResourceError::OutOfBounds);
        }
        let buffer = self
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: descriptor.label.as_deref(),
                contents: data,
                usage: descriptor.usage.into_wgpu() | wgpu::BufferUsages::COPY_DST,
            });
        Ok(Arc::new(Buffer::new(descriptor, Box::new(WgpuBuffer { buffer }))))
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
        let native = native(buffer.as_ref(), |b| b.native::<WgpuBuffer>())?;
        self.queue().write_buffer(&native.buffer, offset, data);
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
        let texture = self.device().create_texture(&wgpu::TextureDescriptor {
            label: descriptor.label.as_deref(),
            size: descriptor.size.into_wgpu(),
            mip_level_count: descriptor.mip_level_count.max(1),
            sample_count: descriptor.sample_count.into_wgpu(),
            dimension: descriptor.dimension.into_wgpu(),
            format: descriptor.format.into_wgpu(),
            usage: descriptor.usage.into_wgpu(),
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: descriptor.label.as_deref(),
            dimension: Some(descriptor.dimension.into_wgpu()),
            ..Default::default()
        });
        Ok(Arc::new(Texture::new(
            descriptor,
            Box::new(WgpuTexture { texture, view }),
        )))
    }

    fn create_sampler(
        &self,
        descriptor: &SamplerDescriptor<'_>,
    ) -> Result<SamplerHandle, ResourceError> {
        let sampler = self.device().create_sampler(&wgpu::SamplerDescriptor {
            label: descriptor.label.as_deref(),
            address_mode_u: descriptor.address_mode_u.into_wgpu(),
            address_mode_v: descriptor.address_mode_v.into_wgpu(),
            address_mode_w: descriptor.address_mode_w.into_wgpu(),
            mag_filter: descriptor.mag_filter.into_wgpu(),
            min_filter: descriptor.min_filter.into_wgpu(),
            mipmap_filter: descriptor.mipmap_filter.into_wgpu(),
            lod_min_clamp: descriptor.lod_min_clamp,
            lod_max_clamp: descriptor.lod_max_clamp,
            compare: descriptor.compare.map(|f| f.into_wgpu()),
            anisotropy_clamp: descriptor.anisotropy_clamp,
            border_color: None,
        });
        Ok(Arc::new(Sampler::new(
            descriptor,
            Box::new(WgpuSampler { sampler }),
        )))
    }

    fn create_shader_module(
        &self,
        descriptor: &ShaderModuleDescriptor<'_>,
    ) -> Result<ShaderModuleHandle, ResourceError> {
        match descriptor.stage {
            ShaderStage::Vertex | ShaderStage::Fragment | ShaderStage::Compute => {}
            stage => return Err(ShaderError::UnsupportedStage { stage }.into()),
        }
        let source = match &descriptor.source {
            ShaderSource::Wgsl(text) => wgpu::ShaderSource::Wgsl(text.clone()),
            ShaderSource::SpirV(_) => {
                return Err(ShaderError::CompilationError {
                    label: descriptor
                        .label
                        .as_deref()
                        .unwrap_or_default()
                        .to_string(),
                    details: "the wgpu backend consumes WGSL source only".into(),
                }
                .into())
            }
        };
        let module = self
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: descriptor.label.as_deref(),
                source,
            });
        log::debug!(
            "WgpuRhi: created {:?} shader module '{}'",
            descriptor.stage,
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(Arc::new(ShaderModule::new(
            descriptor,
            Box::new(WgpuShader { module }),
        )))
    }

    fn create_root_signature(
        &self,
        descriptor: &RootSignatureDescriptor<'_>,
    ) -> Result<RootSignatureHandle, ResourceError> {
        let mut bind_group_layouts = Vec::new();
        let mut group_index_per_parameter = Vec::new();
        let mut push_constant_ranges = Vec::new();
        let mut push_constant_offset = 0u32;

        for (index, parameter) in descriptor.parameters.iter().enumerate() {
            match parameter {
                RootParameter::DescriptorTable { ranges } => {
                    let entries: Vec<wgpu::BindGroupLayoutEntry> = flatten_table(ranges)
                        .into_iter()
                        .map(|flat| wgpu::BindGroupLayoutEntry {
                            binding: flat.binding,
                            visibility: flat.visibility.into_wgpu(),
                            ty: binding_type(flat.kind),
                            count: None,
                        })
                        .collect();
                    let label = descriptor
                        .label
                        .as_deref()
                        .map(|l| format!("{l}_table_{index}"));
                    let layout =
                        self.device()
                            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                                label: label.as_deref(),
                                entries: &entries,
                            });
                    group_index_per_parameter.push(Some(bind_group_layouts.len() as u32));
                    bind_group_layouts.push(layout);
                }
                RootParameter::PushConstants {
                    size_bytes,
                    visibility,
                } => {
                    if !self
                        .context
                        .active_features
                        .contains(wgpu::Features::PUSH_CONSTANTS)
                    {
                        return Err(PipelineError::FeatureNotSupported(
                            "inline root constants (PUSH_CONSTANTS)".into(),
                        )
                        .into());
                    }
                    push_constant_ranges.push(wgpu::PushConstantRange {
                        stages: (*visibility).into_wgpu(),
                        range: push_constant_offset..push_constant_offset + size_bytes,
                    });
                    push_constant_offset += size_bytes;
                    group_index_per_parameter.push(None);
                }
            }
        }

        let layout_refs: Vec<&wgpu::BindGroupLayout> = bind_group_layouts.iter().collect();
        let pipeline_layout =
            self.device()
                .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                    label: descriptor.label.as_deref(),
                    bind_group_layouts: &layout_refs,
                    push_constant_ranges: &push_constant_ranges,
                });

        Ok(Arc::new(RootSignature::new(
            descriptor,
            Box::new(WgpuRootSignature {
                bind_group_layouts,
                pipeline_layout,
                group_index_per_parameter,
            }),
        )))
    }

    fn create_resource_group(
        &self,
        signature: &RootSignatureHandle,
        descriptor: &ResourceGroupDescriptor<'_>,
    ) -> Result<ResourceGroupHandle, ResourceError> {
        validate_resource_group(signature, descriptor)?;
        let signature_native = native(signature.as_ref(), |s| s.native::<WgpuRootSignature>())?;
        let group_index = signature_native
            .group_index_per_parameter
            .get(descriptor.parameter_index as usize)
            .copied()
            .flatten()
            .ok_or_else(|| {
                ResourceError::BackendError("root parameter has no bind group".into())
            })?;
        let layout = &signature_native.bind_group_layouts[group_index as usize];

        // Flattened element order == descriptor order; pre-compute the one
        // native object replayed per bind at submit time.
        let ranges = signature
            .descriptor_table(descriptor.parameter_index)
            .map_err(ResourceError::Binding)?;
        let flat = flatten_table(ranges);

        let mut entries = Vec::with_capacity(flat.len());
        let mut resources = descriptor.resources.iter();
        let mut samplers = descriptor.samplers.iter();
        for slot in &flat {
            if let DescriptorKind::Sampler { .. } = slot.kind {
                let sampler = samplers
                    .next()
                    .ok_or_else(|| ResourceError::BackendError("sampler underrun".into()))?;
                let sampler_native = native(sampler.as_ref(), |s| s.native::<WgpuSampler>())?;
                entries.push(wgpu::BindGroupEntry {
                    binding: slot.binding,
                    resource: wgpu::BindingResource::Sampler(&sampler_native.sampler),
                });
                continue;
            }
            let binding = resources
                .next()
                .ok_or_else(|| ResourceError::BackendError("resource underrun".into()))?;
            match binding {
                ResourceBinding::Buffer {
                    buffer,
                    offset,
                    size,
                } => {
                    let buffer_native = native(buffer.as_ref(), |b| b.native::<WgpuBuffer>())?;
                    entries.push(wgpu::BindGroupEntry {
                        binding: slot.binding,
                        resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                            buffer: &buffer_native.buffer,
                            offset: *offset,
                            size: *size,
                        }),
                    });
                }
                ResourceBinding::Texture { texture } => {
                    let texture_native = native(texture.as_ref(), |t| t.native::<WgpuTexture>())?;
                    entries.push(wgpu::BindGroupEntry {
                        binding: slot.binding,
                        resource: wgpu::BindingResource::TextureView(&texture_native.view),
                    });
                }
            }
        }

        let bind_group = self.device().create_bind_group(&wgpu::BindGroupDescriptor {
            label: descriptor.label.as_deref(),
            layout,
            entries: &entries,
        });

        Ok(Arc::new(ResourceGroup::new(
            signature,
            descriptor,
            Box::new(WgpuResourceGroup {
                bind_group,
                group_index,
            }),
        )))
    }

    fn create_render_pass(
        &self,
        descriptor: &RenderPassDescriptor<'_>,
    ) -> Result<RenderPassHandle, ResourceError> {
        // A pure compatibility descriptor; wgpu has no pass object to
        // pre-create.
        Ok(Arc::new(RenderPass::new(descriptor, Box::new(()))))
    }

    fn create_framebuffer(
        &self,
        descriptor: &FramebufferDescriptor<'_>,
    ) -> Result<FramebufferHandle, ResourceError> {
        validate_framebuffer(descriptor)?;
        for attachment in descriptor.color_attachments.iter() {
            native(attachment.as_ref(), |t| t.native::<WgpuTexture>())?;
        }
        if let Some(depth) = &descriptor.depth_stencil_attachment {
            native(depth.as_ref(), |t| t.native::<WgpuTexture>())?;
        }
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
        validate_graphics_pipeline(descriptor, self.capabilities())?;

        let topology = descriptor
            .rasterizer
            .topology
            .into_wgpu()
            .ok_or_else(|| {
                ResourceError::Pipeline(PipelineError::FeatureNotSupported(
                    "patch-list topology".into(),
                ))
            })?;

        let signature_native = native(descriptor.root_signature.as_ref(), |s| {
            s.native::<WgpuRootSignature>()
        })?;
        let vertex_native = native(descriptor.stages.vertex.as_ref(), |m| {
            m.native::<WgpuShader>()
        })?;

        let attribute_storage: Vec<Vec<wgpu::VertexAttribute>> = descriptor
            .vertex_layouts
            .iter()
            .map(|layout| {
                layout
                    .attributes
                    .iter()
                    .map(|attribute| wgpu::VertexAttribute {
                        format: attribute.format.into_wgpu(),
                        offset: attribute.offset,
                        shader_location: attribute.shader_location,
                    })
                    .collect()
            })
            .collect();
        let vertex_buffers: Vec<wgpu::VertexBufferLayout> = descriptor
            .vertex_layouts
            .iter()
            .zip(attribute_storage.iter())
            .map(|(layout, attributes)| wgpu::VertexBufferLayout {
                array_stride: layout.array_stride,
                step_mode: layout.step_mode.into_wgpu(),
                attributes,
            })
            .collect();

        let color_targets: Vec<Option<wgpu::ColorTargetState>> = descriptor
            .color_targets
            .iter()
            .map(|target| {
                Some(wgpu::ColorTargetState {
                    format: target.format.into_wgpu(),
                    blend: target.blend.map(|blend| wgpu::BlendState {
                        color: blend.color.into_wgpu(),
                        alpha: blend.alpha.into_wgpu(),
                    }),
                    write_mask: target.write_mask.into_wgpu(),
                })
            })
            .collect();

        let depth_stencil = descriptor
            .depth_stencil
            .as_ref()
            .map(|ds| wgpu::DepthStencilState {
                format: ds.format.into_wgpu(),
                depth_write_enabled: ds.depth_write_enabled,
                depth_compare: ds.depth_compare.into_wgpu(),
                stencil: wgpu::StencilState {
                    front: ds.stencil_front.into_wgpu(),
                    back: ds.stencil_back.into_wgpu(),
                    read_mask: ds.stencil_read_mask,
                    write_mask: ds.stencil_write_mask,
                },
                bias: wgpu::DepthBiasState {
                    constant: ds.bias.constant,
                    slope_scale: ds.bias.slope_scale,
                    clamp: ds.bias.clamp,
                },
            });

        let fragment_native = match &descriptor.stages.fragment {
            Some(module) => Some(native(module.as_ref(), |m| m.native::<WgpuShader>())?),
            None => None,
        };

        let pipeline = self
            .device()
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: Some(&signature_native.pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &vertex_native.module,
                    entry_point: Some(descriptor.stages.vertex.entry_point()),
                    buffers: &vertex_buffers,
                    compilation_options: Default::default(),
                },
                fragment: fragment_native.map(|module| wgpu::FragmentState {
                    module: &module.module,
                    entry_point: descriptor
                        .stages
                        .fragment
                        .as_ref()
                        .map(|m| m.entry_point()),
                    targets: &color_targets,
                    compilation_options: Default::default(),
                }),
                primitive: wgpu::PrimitiveState {
                    topology,
                    strip_index_format: descriptor
                        .rasterizer
                        .strip_index_format
                        .map(|f| f.into_wgpu()),
                    front_face: descriptor.rasterizer.front_face.into_wgpu(),
                    cull_mode: descriptor.rasterizer.cull_mode.map(|m| m.into_wgpu()),
                    polygon_mode: descriptor.rasterizer.polygon_mode.into_wgpu(),
                    unclipped_depth: false,
                    conservative: false,
                },
                depth_stencil,
                multisample: wgpu::MultisampleState {
                    count: descriptor.sample_count.into_wgpu(),
                    mask: !0,
                    alpha_to_coverage_enabled: false,
                },
                multiview: None,
                cache: None,
            });

        log::info!(
            "WgpuRhi: created graphics pipeline '{}'",
            descriptor.label.as_deref().unwrap_or_default()
        );
        Ok(Arc::new(GraphicsPipeline::new(
            descriptor,
            Box::new(WgpuGraphicsPipeline { pipeline }),
        )))
    }

    fn create_compute_pipeline(
        &self,
        descriptor: &ComputePipelineDescriptor<'_>,
    ) -> Result<ComputePipelineHandle, ResourceError> {
        validate_compute_pipeline(descriptor, self.capabilities())?;
        let signature_native = native(descriptor.root_signature.as_ref(), |s| {
            s.native::<WgpuRootSignature>()
        })?;
        let module_native = native(descriptor.module.as_ref(), |m| m.native::<WgpuShader>())?;

        let pipeline = self
            .device()
            .create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
                label: descriptor.label.as_deref(),
                layout: Some(&signature_native.pipeline_layout),
                module: &module_native.module,
                entry_point: Some(descriptor.module.entry_point()),
                compilation_options: Default::default(),
                cache: None,
            });

        Ok(Arc::new(ComputePipeline::new(
            descriptor,
            Box::new(WgpuComputePipeline { pipeline }),
        )))
    }

    fn create_swap_chain(
        &self,
        target: SurfaceTarget<'_>,
        descriptor: &SwapChainDescriptor<'_>,
    ) -> Result<SwapChainHandle, ResourceError> {
        let window = match target {
            SurfaceTarget::Window(window) => window,
            SurfaceTarget::Headless(_) => {
                return Err(ResourceError::BackendError(
                    "the wgpu backend requires a native window surface".into(),
                ))
            }
        };

        let raw_display = window
            .display_handle()
            .map_err(|e| ResourceError::BackendError(format!("display handle: {e}")))?
            .as_raw();
        let raw_window = window
            .window_handle()
            .map_err(|e| ResourceError::BackendError(format!("window handle: {e}")))?
            .as_raw();
        let surface = unsafe {
            self.context
                .instance
                .create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                    raw_display_handle: raw_display,
                    raw_window_handle: raw_window,
                })
        }
        .map_err(|e| ResourceError::BackendError(format!("surface creation: {e}")))?;

        let caps = surface.get_capabilities(&self.context.adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| f.is_srgb())
            .unwrap_or(caps.formats[0]);
        let format = from_wgpu_texture_format(surface_format).ok_or_else(|| {
            ResourceError::BackendError(format!(
                "surface format {surface_format:?} is not representable"
            ))
        })?;

        let size = window.inner_size();
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: if descriptor.vsync {
                wgpu::PresentMode::AutoVsync
            } else {
                wgpu::PresentMode::AutoNoVsync
            },
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(self.device(), &config);

        let render_pass = Arc::new(RenderPass::new(
            &RenderPassDescriptor {
                label: Some(Cow::Borrowed("swap chain pass")),
                color_formats: Cow::Owned(vec![format]),
                depth_stencil_format: None,
                sample_count: SampleCount::X1,
            },
            Box::new(()),
        ));

        let mut descriptor = descriptor.clone();
        descriptor.size = Extent2D::new(config.width, config.height);
        Ok(Arc::new(SwapChain::new(
            &descriptor,
            render_pass,
            format,
            Box::new(WgpuSwapChain {
                surface,
                config: Mutex::new(config),
                frame: Mutex::new(None),
            }),
        )))
    }

    fn resize_swap_chain(
        &self,
        swap_chain: &SwapChainHandle,
        width: u32,
        height: u32,
    ) -> Result<(), ResourceError> {
        let chain = native(swap_chain.as_ref(), |s| s.native::<WgpuSwapChain>())?;
        let mut config = chain.config.lock().unwrap();
        config.width = width.max(1);
        config.height = height.max(1);
        chain.surface.configure(self.device(), &config);
        // Any acquired backbuffer belongs to the old configuration.
        chain.frame.lock().unwrap().take();
        swap_chain.set_extent(Extent2D::new(config.width, config.height));
        Ok(())
    }

    fn present(&self, swap_chain: &SwapChainHandle) -> Result<(), RenderError> {
        let chain = native(swap_chain.as_ref(), |s| s.native::<WgpuSwapChain>())
            .map_err(RenderError::Resource)?;
        let frame = chain.frame.lock().unwrap().take();
        match frame {
            Some(frame) => frame.texture.present(),
            None => log::warn!("WgpuRhi: present called with no rendered frame"),
        }
        Ok(())
    }

    fn submit_command_buffer(&self, commands: &CommandBuffer) -> Result<(), SubmitError> {
        validate::validate(commands)?;
        replay::replay(self, commands)
    }

    fn finish_frame(&self) -> Result<(), RenderError> {
        if let Err(e) = self.device().poll(wgpu::PollType::Poll) {
            log::warn!("WgpuRhi: device poll failed: {e:?}");
        }
        Ok(())
    }
}

impl WgpuRhi {
    /// Acquires (or reuses) the current backbuffer view of a swap chain.
    pub(crate) fn acquire_backbuffer(
        &self,
        swap_chain: &SwapChain,
    ) -> Result<wgpu::TextureView, SubmitError> {
        let chain = native(swap_chain, |s| s.native::<WgpuSwapChain>())
            .map_err(|e| SubmitError::Backend(e.to_string()))?;
        let mut frame = chain.frame.lock().unwrap();
        if frame.is_none() {
            let texture = chain
                .surface
                .get_current_texture()
                .map_err(|e| SubmitError::Backend(format!("surface acquisition: {e}")))?;
            let view = texture
                .texture
                .create_view(&wgpu::TextureViewDescriptor::default());
            *frame = Some(AcquiredFrame { texture, view });
        }
        Ok(frame
            .as_ref()
            .map(|f| f.view.clone())
            .expect("frame was just filled"))
    }
}
