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

//! The retained, backend-agnostic command buffer.
//!
//! A [`CommandBuffer`] is an append-only list of typed [`Command`] records.
//! Recording never touches the backend: it only clones resource handles
//! into the record, which is what makes "fill once, submit many times per
//! frame" possible for work that does not change between frames, and what
//! keeps every referenced resource alive until the buffer is cleared or
//! dropped.
//!
//! All translation happens at submit time:
//! [`Rhi::submit_command_buffer`](crate::rhi::Rhi::submit_command_buffer)
//! first runs the shared validation walk in [`validate`] and then replays
//! the records against the native API. Identical recorded sequences
//! produce identical native-call sequences — translation is deterministic.

pub mod validate;

use crate::math::LinearRgba;
use crate::mirage_bitflags;
use crate::rhi::api::binding::{ResourceGroupHandle, RootSignatureHandle};
use crate::rhi::api::buffer::BufferHandle;
use crate::rhi::api::pass::{FramebufferHandle, RenderPassHandle};
use crate::rhi::api::pipeline::{ComputePipelineHandle, GraphicsPipelineHandle};
use crate::rhi::api::swap_chain::SwapChainHandle;
use crate::rhi::api::vertex::VertexArrayHandle;
use std::ops::Range;
use std::sync::Arc;

mirage_bitflags! {
    /// Which aspects a [`Command::Clear`] touches.
    pub struct ClearFlags: u32 {
        /// Clear the color attachments.
        const COLOR = 1 << 0;
        /// Clear the depth aspect.
        const DEPTH = 1 << 1;
        /// Clear the stencil aspect.
        const STENCIL = 1 << 2;
    }
}

/// A viewport rectangle with depth range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge in pixels.
    pub x: f32,
    /// Top edge in pixels.
    pub y: f32,
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Minimum depth of the viewport range.
    pub min_depth: f32,
    /// Maximum depth of the viewport range.
    pub max_depth: f32,
}

impl Viewport {
    /// A full-depth viewport covering `width` x `height` pixels.
    pub const fn covering(width: f32, height: f32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// A scissor rectangle in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScissorRect {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

/// The render target a draw streams into: an offscreen framebuffer or a
/// window swap chain.
#[derive(Debug, Clone)]
pub enum RenderTarget {
    /// An offscreen framebuffer.
    Framebuffer(FramebufferHandle),
    /// A window swap chain.
    SwapChain(SwapChainHandle),
}

impl RenderTarget {
    /// The render pass describing this target's attachments.
    pub fn render_pass(&self) -> &RenderPassHandle {
        match self {
            RenderTarget::Framebuffer(framebuffer) => framebuffer.render_pass(),
            RenderTarget::SwapChain(swap_chain) => swap_chain.render_pass(),
        }
    }
}

/// One recorded command.
///
/// A sum type per opcode: each variant owns handles to everything it
/// references, so a recorded buffer is self-contained.
#[derive(Debug, Clone)]
pub enum Command {
    /// Opens a named debug event scope.
    BeginDebugEvent {
        /// The scope name shown in graphics debuggers.
        name: String,
    },
    /// Closes the innermost debug event scope.
    EndDebugEvent,
    /// Inserts a one-shot debug marker.
    DebugMarker {
        /// The marker text.
        name: String,
    },
    /// Sets the root signature for subsequent graphics commands.
    SetGraphicsRootSignature {
        /// The signature to activate.
        signature: RootSignatureHandle,
    },
    /// Binds a graphics pipeline. Requires a matching root signature.
    SetGraphicsPipeline {
        /// The pipeline to bind.
        pipeline: GraphicsPipelineHandle,
    },
    /// Binds a resource group to a graphics root-parameter slot.
    SetGraphicsResourceGroup {
        /// The root parameter index to bind at.
        parameter_index: u32,
        /// The group to bind.
        group: ResourceGroupHandle,
    },
    /// Binds (or unbinds) the vertex array feeding vertex input.
    SetVertexArray {
        /// The vertex array, or `None` to unbind.
        vertex_array: Option<VertexArrayHandle>,
    },
    /// Sets the render target for subsequent draws and clears.
    SetRenderTarget {
        /// The target to render into.
        target: RenderTarget,
    },
    /// Sets the viewport and scissor rectangle together.
    SetViewportAndScissor {
        /// The viewport.
        viewport: Viewport,
        /// The scissor rectangle.
        scissor: ScissorRect,
    },
    /// Clears aspects of the bound render target.
    Clear {
        /// Which aspects to clear.
        flags: ClearFlags,
        /// The color to clear color attachments to.
        color: LinearRgba,
        /// The value to clear the depth aspect to.
        depth: f32,
        /// The value to clear the stencil aspect to.
        stencil: u32,
    },
    /// A non-indexed draw.
    Draw {
        /// The number of vertices.
        vertex_count: u32,
        /// The number of instances.
        instance_count: u32,
        /// The first vertex index.
        first_vertex: u32,
        /// The first instance index.
        first_instance: u32,
    },
    /// An indexed draw.
    DrawIndexed {
        /// The number of indices.
        index_count: u32,
        /// The number of instances.
        instance_count: u32,
        /// The first index within the index buffer.
        first_index: u32,
        /// A signed offset added to each index.
        base_vertex: i32,
        /// The first instance index.
        first_instance: u32,
    },
    /// A non-indexed draw whose arguments come from a GPU buffer.
    DrawIndirect {
        /// The argument buffer (requires `INDIRECT` usage).
        buffer: BufferHandle,
        /// Byte offset of the arguments within the buffer.
        offset: u64,
    },
    /// An indexed draw whose arguments come from a GPU buffer.
    DrawIndexedIndirect {
        /// The argument buffer (requires `INDIRECT` usage).
        buffer: BufferHandle,
        /// Byte offset of the arguments within the buffer.
        offset: u64,
    },
    /// Sets the root signature for subsequent compute commands.
    SetComputeRootSignature {
        /// The signature to activate.
        signature: RootSignatureHandle,
    },
    /// Binds a compute pipeline. Requires a matching root signature.
    SetComputePipeline {
        /// The pipeline to bind.
        pipeline: ComputePipelineHandle,
    },
    /// Binds a resource group to a compute root-parameter slot.
    SetComputeResourceGroup {
        /// The root parameter index to bind at.
        parameter_index: u32,
        /// The group to bind.
        group: ResourceGroupHandle,
    },
    /// Dispatches compute workgroups.
    Dispatch {
        /// Workgroups along x.
        x: u32,
        /// Workgroups along y.
        y: u32,
        /// Workgroups along z.
        z: u32,
    },
    /// A dispatch whose workgroup counts come from a GPU buffer.
    DispatchIndirect {
        /// The argument buffer (requires `INDIRECT` usage).
        buffer: BufferHandle,
        /// Byte offset of the arguments within the buffer.
        offset: u64,
    },
    /// Copies CPU data into a uniform buffer at replay time.
    WriteUniformData {
        /// The destination buffer.
        buffer: BufferHandle,
        /// Byte offset within the buffer.
        offset: u64,
        /// The bytes to copy, captured at record time.
        data: Vec<u8>,
    },
    /// Replays a frozen, pre-recorded command buffer inline.
    ///
    /// Nesting must be acyclic; the `Arc` makes a cycle unconstructible
    /// without deliberately leaking.
    ExecuteCommands {
        /// The nested buffer.
        commands: Arc<CommandBuffer>,
    },
}

/// An append-only, backend-agnostic recording of GPU work.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    label: Option<String>,
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty command buffer with a debug label.
    pub fn with_label(label: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            commands: Vec::new(),
        }
    }

    /// The debug label, if any.
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// `true` if nothing has been recorded since creation or the last
    /// [`clear`](Self::clear).
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// The number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// The recorded commands in record order.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Discards all recorded commands (and releases the resource handles
    /// they held). A no-op on an empty buffer.
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Appends a raw command record.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    // --- Debug events ---

    /// Opens a named debug event scope.
    pub fn begin_debug_event(&mut self, name: &str) {
        self.push(Command::BeginDebugEvent {
            name: name.to_string(),
        });
    }

    /// Closes the innermost debug event scope.
    pub fn end_debug_event(&mut self) {
        self.push(Command::EndDebugEvent);
    }

    /// Inserts a one-shot debug marker.
    pub fn debug_marker(&mut self, name: &str) {
        self.push(Command::DebugMarker {
            name: name.to_string(),
        });
    }

    /// Records `f` inside a balanced begin/end debug event pair.
    pub fn with_debug_event<R>(&mut self, name: &str, f: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_debug_event(name);
        let result = f(self);
        self.end_debug_event();
        result
    }

    // --- Graphics state ---

    /// Sets the root signature for subsequent graphics commands.
    pub fn set_graphics_root_signature(&mut self, signature: &RootSignatureHandle) {
        self.push(Command::SetGraphicsRootSignature {
            signature: Arc::clone(signature),
        });
    }

    /// Binds a graphics pipeline.
    pub fn set_graphics_pipeline(&mut self, pipeline: &GraphicsPipelineHandle) {
        self.push(Command::SetGraphicsPipeline {
            pipeline: Arc::clone(pipeline),
        });
    }

    /// Binds a resource group to a graphics root-parameter slot.
    pub fn set_graphics_resource_group(
        &mut self,
        parameter_index: u32,
        group: &ResourceGroupHandle,
    ) {
        self.push(Command::SetGraphicsResourceGroup {
            parameter_index,
            group: Arc::clone(group),
        });
    }

    /// Binds (or unbinds) the vertex array feeding vertex input.
    pub fn set_vertex_array(&mut self, vertex_array: Option<&VertexArrayHandle>) {
        self.push(Command::SetVertexArray {
            vertex_array: vertex_array.map(Arc::clone),
        });
    }

    /// Sets the render target for subsequent draws and clears.
    pub fn set_render_target(&mut self, target: &RenderTarget) {
        self.push(Command::SetRenderTarget {
            target: target.clone(),
        });
    }

    /// Sets an offscreen framebuffer as the render target.
    pub fn set_framebuffer(&mut self, framebuffer: &FramebufferHandle) {
        self.push(Command::SetRenderTarget {
            target: RenderTarget::Framebuffer(Arc::clone(framebuffer)),
        });
    }

    /// Sets a window swap chain as the render target.
    pub fn set_swap_chain(&mut self, swap_chain: &SwapChainHandle) {
        self.push(Command::SetRenderTarget {
            target: RenderTarget::SwapChain(Arc::clone(swap_chain)),
        });
    }

    /// Sets the viewport and scissor rectangle together.
    pub fn set_viewport_and_scissor(&mut self, viewport: Viewport, scissor: ScissorRect) {
        self.push(Command::SetViewportAndScissor { viewport, scissor });
    }

    /// Clears aspects of the bound render target.
    pub fn clear_render_target(
        &mut self,
        flags: ClearFlags,
        color: LinearRgba,
        depth: f32,
        stencil: u32,
    ) {
        self.push(Command::Clear {
            flags,
            color,
            depth,
            stencil,
        });
    }

    // --- Draws ---

    /// Records a non-indexed draw.
    pub fn draw(&mut self, vertices: Range<u32>, instances: Range<u32>) {
        self.push(Command::Draw {
            vertex_count: vertices.end - vertices.start,
            instance_count: instances.end - instances.start,
            first_vertex: vertices.start,
            first_instance: instances.start,
        });
    }

    /// Records an indexed draw.
    pub fn draw_indexed(&mut self, indices: Range<u32>, base_vertex: i32, instances: Range<u32>) {
        self.push(Command::DrawIndexed {
            index_count: indices.end - indices.start,
            instance_count: instances.end - instances.start,
            first_index: indices.start,
            base_vertex,
            first_instance: instances.start,
        });
    }

    /// Records a non-indexed draw reading its arguments from a buffer.
    pub fn draw_indirect(&mut self, buffer: &BufferHandle, offset: u64) {
        self.push(Command::DrawIndirect {
            buffer: Arc::clone(buffer),
            offset,
        });
    }

    /// Records an indexed draw reading its arguments from a buffer.
    pub fn draw_indexed_indirect(&mut self, buffer: &BufferHandle, offset: u64) {
        self.push(Command::DrawIndexedIndirect {
            buffer: Arc::clone(buffer),
            offset,
        });
    }

    // --- Compute ---

    /// Sets the root signature for subsequent compute commands.
    pub fn set_compute_root_signature(&mut self, signature: &RootSignatureHandle) {
        self.push(Command::SetComputeRootSignature {
            signature: Arc::clone(signature),
        });
    }

    /// Binds a compute pipeline.
    pub fn set_compute_pipeline(&mut self, pipeline: &ComputePipelineHandle) {
        self.push(Command::SetComputePipeline {
            pipeline: Arc::clone(pipeline),
        });
    }

    /// Binds a resource group to a compute root-parameter slot.
    pub fn set_compute_resource_group(
        &mut self,
        parameter_index: u32,
        group: &ResourceGroupHandle,
    ) {
        self.push(Command::SetComputeResourceGroup {
            parameter_index,
            group: Arc::clone(group),
        });
    }

    /// Dispatches compute workgroups.
    pub fn dispatch_workgroups(&mut self, x: u32, y: u32, z: u32) {
        self.push(Command::Dispatch { x, y, z });
    }

    /// Records a dispatch reading its workgroup counts from a buffer.
    pub fn dispatch_indirect(&mut self, buffer: &BufferHandle, offset: u64) {
        self.push(Command::DispatchIndirect {
            buffer: Arc::clone(buffer),
            offset,
        });
    }

    // --- Data and nesting ---

    /// Records a CPU-to-uniform-buffer copy replayed at submit time.
    pub fn write_uniform_data(&mut self, buffer: &BufferHandle, offset: u64, data: &[u8]) {
        self.push(Command::WriteUniformData {
            buffer: Arc::clone(buffer),
            offset,
            data: data.to_vec(),
        });
    }

    /// Embeds a frozen, pre-recorded command buffer.
    ///
    /// The nested buffer is replayed inline wherever this record sits,
    /// letting one compositor pass reuse another's pre-built work.
    pub fn execute_commands(&mut self, commands: &Arc<CommandBuffer>) {
        self.push(Command::ExecuteCommands {
            commands: Arc::clone(commands),
        });
    }

    // --- Submission ---

    /// Submits the recording to a device, leaving it intact for resubmission.
    pub fn submit_to(&self, rhi: &dyn crate::rhi::Rhi) -> Result<(), crate::rhi::SubmitError> {
        rhi.submit_command_buffer(self)
    }

    /// Submits the recording and clears it for refilling.
    pub fn submit_to_and_clear(
        &mut self,
        rhi: &dyn crate::rhi::Rhi,
    ) -> Result<(), crate::rhi::SubmitError> {
        let result = rhi.submit_command_buffer(self);
        self.clear();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buffer = CommandBuffer::new();
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn clear_on_empty_buffer_is_a_noop() {
        let mut buffer = CommandBuffer::new();
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn recording_then_clearing_restores_empty() {
        let mut buffer = CommandBuffer::new();
        buffer.dispatch_workgroups(1, 1, 1);
        buffer.debug_marker("marker");
        assert_eq!(buffer.len(), 2);
        buffer.clear();
        assert!(buffer.is_empty());
    }

    #[test]
    fn draw_ranges_convert_to_counts() {
        let mut buffer = CommandBuffer::new();
        buffer.draw(3..9, 0..2);
        match &buffer.commands()[0] {
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                assert_eq!(*vertex_count, 6);
                assert_eq!(*instance_count, 2);
                assert_eq!(*first_vertex, 3);
                assert_eq!(*first_instance, 0);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn with_debug_event_is_balanced() {
        let mut buffer = CommandBuffer::new();
        buffer.with_debug_event("scope", |cb| cb.dispatch_workgroups(1, 1, 1));
        assert!(matches!(
            buffer.commands().first(),
            Some(Command::BeginDebugEvent { .. })
        ));
        assert!(matches!(
            buffer.commands().last(),
            Some(Command::EndDebugEvent)
        ));
    }
}
