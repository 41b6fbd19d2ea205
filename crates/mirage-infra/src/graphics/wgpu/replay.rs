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

//! Translation of the validated command stream into wgpu calls.
//!
//! The retained stream is target-oriented (set render target, clear, draw)
//! while wgpu is pass-oriented, so the replayer opens native passes
//! lazily: a `Clear` becomes a clear-only pass with `LoadOp::Clear`, and
//! draws open a load pass that stays open across consecutive draws until a
//! command that cannot live inside it (target switch, dispatch, buffer
//! copy) closes it. Bound state is cached and re-applied whenever a pass
//! opens, so the native call sequence depends only on the recorded
//! commands.

use mirage_core::math::LinearRgba;
use mirage_core::rhi::api::pipeline::{ComputePipelineHandle, GraphicsPipelineHandle};
use mirage_core::rhi::api::vertex::VertexArrayHandle;
use mirage_core::rhi::command::{
    ClearFlags, Command, CommandBuffer, RenderTarget, ScissorRect, Viewport,
};
use mirage_core::rhi::error::SubmitError;
use std::collections::BTreeMap;

use super::conversions::IntoWgpu;
use super::device::{
    WgpuBuffer, WgpuComputePipeline, WgpuGraphicsPipeline, WgpuResourceGroup, WgpuRhi,
    WgpuTexture,
};

pub(crate) fn replay(device: &WgpuRhi, buffer: &CommandBuffer) -> Result<(), SubmitError> {
    let mut replayer = Replayer::new(device, buffer.label());
    replayer.walk(buffer.commands())?;
    replayer.finish();
    Ok(())
}

#[derive(Default, Clone)]
struct GraphicsState {
    target: Option<RenderTarget>,
    pipeline: Option<GraphicsPipelineHandle>,
    groups: BTreeMap<u32, mirage_core::rhi::api::binding::ResourceGroupHandle>,
    vertex_array: Option<VertexArrayHandle>,
    viewport: Option<(Viewport, ScissorRect)>,
}

#[derive(Default, Clone)]
struct ComputeState {
    pipeline: Option<ComputePipelineHandle>,
    groups: BTreeMap<u32, mirage_core::rhi::api::binding::ResourceGroupHandle>,
}

struct Replayer<'a> {
    device: &'a WgpuRhi,
    encoder: Option<wgpu::CommandEncoder>,
    render_pass: Option<wgpu::RenderPass<'static>>,
    compute_pass: Option<wgpu::ComputePass<'static>>,
    graphics: GraphicsState,
    compute: ComputeState,
}

impl<'a> Replayer<'a> {
    fn new(device: &'a WgpuRhi, label: Option<&str>) -> Self {
        let encoder = device
            .context
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor { label });
        Self {
            device,
            encoder: Some(encoder),
            render_pass: None,
            compute_pass: None,
            graphics: GraphicsState::default(),
            compute: ComputeState::default(),
        }
    }

    fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        self.encoder.as_mut().expect("encoder taken before finish")
    }

    fn close_passes(&mut self) {
        self.render_pass.take();
        self.compute_pass.take();
    }

    fn finish(mut self) {
        self.close_passes();
        if let Some(encoder) = self.encoder.take() {
            self.device.queue().submit(std::iter::once(encoder.finish()));
        }
    }

    fn walk(&mut self, commands: &[Command]) -> Result<(), SubmitError> {
        for command in commands {
            self.step(command)?;
        }
        Ok(())
    }

    fn step(&mut self, command: &Command) -> Result<(), SubmitError> {
        match command {
            Command::BeginDebugEvent { name } => {
                if let Some(pass) = self.render_pass.as_mut() {
                    pass.push_debug_group(name);
                } else if let Some(pass) = self.compute_pass.as_mut() {
                    pass.push_debug_group(name);
                } else {
                    self.encoder().push_debug_group(name);
                }
            }
            Command::EndDebugEvent => {
                if let Some(pass) = self.render_pass.as_mut() {
                    pass.pop_debug_group();
                } else if let Some(pass) = self.compute_pass.as_mut() {
                    pass.pop_debug_group();
                } else {
                    self.encoder().pop_debug_group();
                }
            }
            Command::DebugMarker { name } => {
                if let Some(pass) = self.render_pass.as_mut() {
                    pass.insert_debug_marker(name);
                } else if let Some(pass) = self.compute_pass.as_mut() {
                    pass.insert_debug_marker(name);
                } else {
                    self.encoder().insert_debug_marker(name);
                }
            }

            // The root signature itself has no native call here: its
            // pipeline layout is baked into the pipelines and its tables
            // into the resource groups.
            Command::SetGraphicsRootSignature { .. } => {}
            Command::SetGraphicsPipeline { pipeline } => {
                self.graphics.pipeline = Some(pipeline.clone());
                if let Some(pass) = self.render_pass.as_mut() {
                    let native = pipeline
                        .native::<WgpuGraphicsPipeline>()
                        .ok_or_else(|| foreign("graphics pipeline"))?;
                    pass.set_pipeline(&native.pipeline);
                }
            }
            Command::SetGraphicsResourceGroup { group, .. } => {
                let native = group
                    .native::<WgpuResourceGroup>()
                    .ok_or_else(|| foreign("resource group"))?;
                self.graphics.groups.insert(native.group_index, group.clone());
                if let Some(pass) = self.render_pass.as_mut() {
                    pass.set_bind_group(native.group_index, &native.bind_group, &[]);
                }
            }
            Command::SetVertexArray { vertex_array } => {
                self.graphics.vertex_array = vertex_array.clone();
                if self.render_pass.is_some() {
                    self.apply_vertex_buffers()?;
                }
            }
            Command::SetRenderTarget { target } => {
                self.close_passes();
                self.graphics.target = Some(target.clone());
            }
            Command::SetViewportAndScissor { viewport, scissor } => {
                self.graphics.viewport = Some((*viewport, *scissor));
                if let Some(pass) = self.render_pass.as_mut() {
                    apply_viewport(pass, viewport, scissor);
                }
            }
            Command::Clear {
                flags,
                color,
                depth,
                stencil,
            } => {
                // A clear becomes its own short pass with Clear load ops;
                // subsequent draws reopen with Load and see the cleared
                // contents.
                self.close_passes();
                let pass = self.open_render_pass(Some((*flags, *color, *depth, *stencil)))?;
                drop(pass);
            }

            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                self.ensure_render_pass()?;
                let pass = self.render_pass.as_mut().expect("pass just ensured");
                pass.draw(
                    *first_vertex..first_vertex + vertex_count,
                    *first_instance..first_instance + instance_count,
                );
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                first_instance,
            } => {
                self.ensure_render_pass()?;
                let pass = self.render_pass.as_mut().expect("pass just ensured");
                pass.draw_indexed(
                    *first_index..first_index + index_count,
                    *base_vertex,
                    *first_instance..first_instance + instance_count,
                );
            }
            Command::DrawIndirect { buffer, offset } => {
                let native_buffer = buffer
                    .native::<WgpuBuffer>()
                    .ok_or_else(|| foreign("indirect buffer"))?;
                self.ensure_render_pass()?;
                let pass = self.render_pass.as_mut().expect("pass just ensured");
                pass.draw_indirect(&native_buffer.buffer, *offset);
            }
            Command::DrawIndexedIndirect { buffer, offset } => {
                let native_buffer = buffer
                    .native::<WgpuBuffer>()
                    .ok_or_else(|| foreign("indirect buffer"))?;
                self.ensure_render_pass()?;
                let pass = self.render_pass.as_mut().expect("pass just ensured");
                pass.draw_indexed_indirect(&native_buffer.buffer, *offset);
            }

            Command::SetComputeRootSignature { .. } => {}
            Command::SetComputePipeline { pipeline } => {
                self.compute.pipeline = Some(pipeline.clone());
                if let Some(pass) = self.compute_pass.as_mut() {
                    let native = pipeline
                        .native::<WgpuComputePipeline>()
                        .ok_or_else(|| foreign("compute pipeline"))?;
                    pass.set_pipeline(&native.pipeline);
                }
            }
            Command::SetComputeResourceGroup { group, .. } => {
                let native = group
                    .native::<WgpuResourceGroup>()
                    .ok_or_else(|| foreign("resource group"))?;
                self.compute.groups.insert(native.group_index, group.clone());
                if let Some(pass) = self.compute_pass.as_mut() {
                    pass.set_bind_group(native.group_index, &native.bind_group, &[]);
                }
            }
            Command::Dispatch { x, y, z } => {
                self.ensure_compute_pass()?;
                let pass = self.compute_pass.as_mut().expect("pass just ensured");
                pass.dispatch_workgroups(*x, *y, *z);
            }
            Command::DispatchIndirect { buffer, offset } => {
                let native_buffer = buffer
                    .native::<WgpuBuffer>()
                    .ok_or_else(|| foreign("indirect buffer"))?;
                self.ensure_compute_pass()?;
                let pass = self.compute_pass.as_mut().expect("pass just ensured");
                pass.dispatch_workgroups_indirect(&native_buffer.buffer, *offset);
            }

            Command::WriteUniformData {
                buffer,
                offset,
                data,
            } => {
                // Staged through the encoder so the copy keeps its place
                // in the recorded order.
                self.close_passes();
                let destination = buffer
                    .native::<WgpuBuffer>()
                    .ok_or_else(|| foreign("uniform buffer"))?;
                let staging = self.device.context.device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("uniform staging"),
                    size: data.len() as u64,
                    usage: wgpu::BufferUsages::COPY_SRC,
                    mapped_at_creation: true,
                });
                staging
                    .slice(..)
                    .get_mapped_range_mut()
                    .copy_from_slice(data);
                staging.unmap();
                self.encoder().copy_buffer_to_buffer(
                    &staging,
                    0,
                    &destination.buffer,
                    *offset,
                    data.len() as u64,
                );
            }

            Command::ExecuteCommands { commands } => {
                // Nested buffers are self-contained: replay with fresh
                // cached state, then restore the outer state so later
                // outer commands reopen passes with it.
                self.close_passes();
                let saved_graphics = std::mem::take(&mut self.graphics);
                let saved_compute = std::mem::take(&mut self.compute);
                let result = self.walk(commands.commands());
                self.close_passes();
                self.graphics = saved_graphics;
                self.compute = saved_compute;
                result?;
            }
        }
        Ok(())
    }

    fn ensure_render_pass(&mut self) -> Result<(), SubmitError> {
        if self.render_pass.is_some() {
            return Ok(());
        }
        let pass = self.open_render_pass(None)?;
        self.render_pass = Some(pass);
        self.apply_graphics_state()
    }

    /// Opens a native render pass on the bound target. `clear` selects
    /// Clear load ops for the flagged aspects; otherwise everything loads.
    fn open_render_pass(
        &mut self,
        clear: Option<(ClearFlags, LinearRgba, f32, u32)>,
    ) -> Result<wgpu::RenderPass<'static>, SubmitError> {
        self.compute_pass.take();
        let target = self
            .graphics
            .target
            .clone()
            .ok_or(SubmitError::MissingRenderTarget)?;

        let mut color_views: Vec<wgpu::TextureView> = Vec::new();
        let mut depth_view: Option<wgpu::TextureView> = None;
        match &target {
            RenderTarget::Framebuffer(framebuffer) => {
                for attachment in framebuffer.color_attachments() {
                    let native = attachment
                        .native::<WgpuTexture>()
                        .ok_or_else(|| foreign("framebuffer attachment"))?;
                    color_views.push(native.view.clone());
                }
                if let Some(depth) = framebuffer.depth_stencil_attachment() {
                    let native = depth
                        .native::<WgpuTexture>()
                        .ok_or_else(|| foreign("depth attachment"))?;
                    depth_view = Some(native.view.clone());
                }
            }
            RenderTarget::SwapChain(swap_chain) => {
                color_views.push(self.device.acquire_backbuffer(swap_chain)?);
            }
        }

        let (color_load, depth_ops, stencil_ops) = match clear {
            Some((flags, color, depth, stencil)) => (
                if flags.contains(ClearFlags::COLOR) {
                    wgpu::LoadOp::Clear(color.into_wgpu())
                } else {
                    wgpu::LoadOp::Load
                },
                Some(wgpu::Operations {
                    load: if flags.contains(ClearFlags::DEPTH) {
                        wgpu::LoadOp::Clear(depth)
                    } else {
                        wgpu::LoadOp::Load
                    },
                    store: wgpu::StoreOp::Store,
                }),
                if flags.contains(ClearFlags::STENCIL) {
                    Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(stencil),
                        store: wgpu::StoreOp::Store,
                    })
                } else {
                    None
                },
            ),
            None => (
                wgpu::LoadOp::Load,
                Some(wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                }),
                None,
            ),
        };

        let color_attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = color_views
            .iter()
            .map(|view| {
                Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: color_load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })
            })
            .collect();

        let depth_stencil_attachment =
            depth_view
                .as_ref()
                .map(|view| wgpu::RenderPassDepthStencilAttachment {
                    view,
                    depth_ops,
                    stencil_ops,
                });

        let pass = self
            .encoder()
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: None,
                color_attachments: &color_attachments,
                depth_stencil_attachment,
                timestamp_writes: None,
                occlusion_query_set: None,
            })
            .forget_lifetime();
        Ok(pass)
    }

    /// Re-applies the cached graphics state to a freshly opened pass.
    fn apply_graphics_state(&mut self) -> Result<(), SubmitError> {
        if let Some(pipeline) = &self.graphics.pipeline {
            let native = pipeline
                .native::<WgpuGraphicsPipeline>()
                .ok_or_else(|| foreign("graphics pipeline"))?;
            if let Some(pass) = self.render_pass.as_mut() {
                pass.set_pipeline(&native.pipeline);
            }
        }
        let groups: Vec<_> = self.graphics.groups.values().cloned().collect();
        for group in groups {
            let native = group
                .native::<WgpuResourceGroup>()
                .ok_or_else(|| foreign("resource group"))?;
            if let Some(pass) = self.render_pass.as_mut() {
                pass.set_bind_group(native.group_index, &native.bind_group, &[]);
            }
        }
        if let Some((viewport, scissor)) = self.graphics.viewport {
            if let Some(pass) = self.render_pass.as_mut() {
                apply_viewport(pass, &viewport, &scissor);
            }
        }
        self.apply_vertex_buffers()
    }

    fn apply_vertex_buffers(&mut self) -> Result<(), SubmitError> {
        let Some(array) = self.graphics.vertex_array.clone() else {
            return Ok(());
        };
        let Some(pass) = self.render_pass.as_mut() else {
            return Ok(());
        };
        for (slot, view) in array.vertex_buffers().iter().enumerate() {
            let native = view
                .buffer
                .native::<WgpuBuffer>()
                .ok_or_else(|| foreign("vertex buffer"))?;
            pass.set_vertex_buffer(slot as u32, native.buffer.slice(..));
        }
        if let Some(index) = array.index_buffer() {
            let native = index
                .buffer
                .native::<WgpuBuffer>()
                .ok_or_else(|| foreign("index buffer"))?;
            pass.set_index_buffer(native.buffer.slice(..), index.format.into_wgpu());
        }
        Ok(())
    }

    fn ensure_compute_pass(&mut self) -> Result<(), SubmitError> {
        if self.compute_pass.is_some() {
            return Ok(());
        }
        self.render_pass.take();
        let pass = self
            .encoder()
            .begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: None,
                timestamp_writes: None,
            })
            .forget_lifetime();
        self.compute_pass = Some(pass);

        if let Some(pipeline) = &self.compute.pipeline {
            let native = pipeline
                .native::<WgpuComputePipeline>()
                .ok_or_else(|| foreign("compute pipeline"))?;
            if let Some(pass) = self.compute_pass.as_mut() {
                pass.set_pipeline(&native.pipeline);
            }
        }
        let groups: Vec<_> = self.compute.groups.values().cloned().collect();
        for group in groups {
            let native = group
                .native::<WgpuResourceGroup>()
                .ok_or_else(|| foreign("resource group"))?;
            if let Some(pass) = self.compute_pass.as_mut() {
                pass.set_bind_group(native.group_index, &native.bind_group, &[]);
            }
        }
        Ok(())
    }
}

fn apply_viewport(pass: &mut wgpu::RenderPass<'_>, viewport: &Viewport, scissor: &ScissorRect) {
    pass.set_viewport(
        viewport.x,
        viewport.y,
        viewport.width,
        viewport.height,
        viewport.min_depth,
        viewport.max_depth,
    );
    pass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
}

fn foreign(what: &str) -> SubmitError {
    SubmitError::Backend(format!("{what} was not created by the wgpu backend"))
}
