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

//! Translation of the validated command stream into trace lines.
//!
//! One trace line per native call a flat-slot API would receive. Resource
//! identities come from the stable per-resource ids, so replaying the same
//! recording always yields the same lines.

use super::NullRhi;
use mirage_core::rhi::api::binding::{flatten_table, DescriptorKind, ResourceBinding};
use mirage_core::rhi::api::resource::RhiResource;
use mirage_core::rhi::command::{Command, CommandBuffer, RenderTarget};

pub(crate) fn replay(device: &NullRhi, buffer: &CommandBuffer) {
    for command in buffer.commands() {
        match command {
            Command::BeginDebugEvent { name } => {
                device.record(format!("push_debug_group(\"{name}\")"));
            }
            Command::EndDebugEvent => {
                device.record("pop_debug_group()".to_string());
            }
            Command::DebugMarker { name } => {
                device.record(format!("debug_marker(\"{name}\")"));
            }
            Command::SetGraphicsRootSignature { signature } => {
                device.record(format!(
                    "set_graphics_root_signature(signature={})",
                    signature.resource_id()
                ));
            }
            Command::SetGraphicsPipeline { pipeline } => {
                device.record(format!(
                    "set_graphics_pipeline(pipeline={})",
                    pipeline.resource_id()
                ));
            }
            Command::SetGraphicsResourceGroup {
                parameter_index,
                group,
            } => {
                replay_group_binds(device, "graphics", *parameter_index, group);
            }
            Command::SetVertexArray { vertex_array } => match vertex_array {
                Some(array) => {
                    for (slot, view) in array.vertex_buffers().iter().enumerate() {
                        device.record(format!(
                            "set_vertex_buffer(slot={slot}, buffer={}, stride={})",
                            view.buffer.resource_id(),
                            view.layout.array_stride
                        ));
                    }
                    if let Some(index) = array.index_buffer() {
                        device.record(format!(
                            "set_index_buffer(buffer={}, format={:?})",
                            index.buffer.resource_id(),
                            index.format
                        ));
                    }
                }
                None => device.record("unbind_vertex_input()".to_string()),
            },
            Command::SetRenderTarget { target } => match target {
                RenderTarget::Framebuffer(framebuffer) => {
                    device.record(format!(
                        "set_render_target(framebuffer={})",
                        framebuffer.resource_id()
                    ));
                }
                RenderTarget::SwapChain(swap_chain) => {
                    device.record(format!(
                        "set_render_target(swap_chain={})",
                        swap_chain.resource_id()
                    ));
                }
            },
            Command::SetViewportAndScissor { viewport, scissor } => {
                device.record(format!(
                    "set_viewport(x={}, y={}, width={}, height={}, depth={}..{})",
                    viewport.x,
                    viewport.y,
                    viewport.width,
                    viewport.height,
                    viewport.min_depth,
                    viewport.max_depth
                ));
                device.record(format!(
                    "set_scissor(x={}, y={}, width={}, height={})",
                    scissor.x, scissor.y, scissor.width, scissor.height
                ));
            }
            Command::Clear {
                flags,
                color,
                depth,
                stencil,
            } => {
                device.record(format!(
                    "clear(flags={flags:?}, color=[{}, {}, {}, {}], depth={depth}, stencil={stencil})",
                    color.r, color.g, color.b, color.a
                ));
            }
            Command::Draw {
                vertex_count,
                instance_count,
                first_vertex,
                first_instance,
            } => {
                device.record(format!(
                    "draw(vertices={vertex_count}, instances={instance_count}, first_vertex={first_vertex}, first_instance={first_instance})"
                ));
            }
            Command::DrawIndexed {
                index_count,
                instance_count,
                first_index,
                base_vertex,
                first_instance,
            } => {
                device.record(format!(
                    "draw_indexed(indices={index_count}, instances={instance_count}, first_index={first_index}, base_vertex={base_vertex}, first_instance={first_instance})"
                ));
            }
            Command::DrawIndirect { buffer, offset } => {
                device.record(format!(
                    "draw_indirect(buffer={}, offset={offset})",
                    buffer.resource_id()
                ));
            }
            Command::DrawIndexedIndirect { buffer, offset } => {
                device.record(format!(
                    "draw_indexed_indirect(buffer={}, offset={offset})",
                    buffer.resource_id()
                ));
            }
            Command::SetComputeRootSignature { signature } => {
                device.record(format!(
                    "set_compute_root_signature(signature={})",
                    signature.resource_id()
                ));
            }
            Command::SetComputePipeline { pipeline } => {
                device.record(format!(
                    "set_compute_pipeline(pipeline={})",
                    pipeline.resource_id()
                ));
            }
            Command::SetComputeResourceGroup {
                parameter_index,
                group,
            } => {
                replay_group_binds(device, "compute", *parameter_index, group);
            }
            Command::Dispatch { x, y, z } => {
                device.record(format!("dispatch(x={x}, y={y}, z={z})"));
            }
            Command::DispatchIndirect { buffer, offset } => {
                device.record(format!(
                    "dispatch_indirect(buffer={}, offset={offset})",
                    buffer.resource_id()
                ));
            }
            Command::WriteUniformData {
                buffer,
                offset,
                data,
            } => {
                device.record(format!(
                    "write_buffer(buffer={}, offset={offset}, bytes={})",
                    buffer.resource_id(),
                    data.len()
                ));
            }
            Command::ExecuteCommands { commands } => {
                // Nested buffers replay inline, exactly where the record
                // sits in the outer stream.
                replay(device, commands);
            }
        }
    }
}

/// Replays one resource group as flat per-element bind calls, the way a
/// flat-slot API (one native call per binding) consumes a descriptor
/// table.
fn replay_group_binds(
    device: &NullRhi,
    scope: &str,
    parameter_index: u32,
    group: &mirage_core::rhi::api::binding::ResourceGroupHandle,
) {
    let ranges = match group.signature().descriptor_table(group.parameter_index()) {
        Ok(ranges) => ranges,
        // Unreachable after validation; keep the trace honest if it ever
        // happens.
        Err(err) => {
            device.record(format!("invalid_resource_group({err})"));
            return;
        }
    };
    let flat = flatten_table(ranges);
    let mut resources = group.resources().iter();
    let mut samplers = group.samplers().iter();
    for descriptor in flat {
        if descriptor.kind.is_sampler() {
            if let Some(sampler) = samplers.next() {
                device.record(format!(
                    "bind_{scope}_sampler(space={parameter_index}, binding={}, sampler={})",
                    descriptor.binding,
                    sampler.resource_id()
                ));
            }
            continue;
        }
        let Some(binding) = resources.next() else {
            break;
        };
        let call = match (descriptor.kind, binding) {
            (DescriptorKind::UniformBuffer, ResourceBinding::Buffer { buffer, offset, .. }) => {
                format!(
                    "bind_{scope}_uniform_buffer(space={parameter_index}, binding={}, buffer={}, offset={offset})",
                    descriptor.binding,
                    buffer.resource_id()
                )
            }
            (
                DescriptorKind::StorageBuffer { read_only },
                ResourceBinding::Buffer { buffer, offset, .. },
            ) => {
                format!(
                    "bind_{scope}_storage_buffer(space={parameter_index}, binding={}, buffer={}, offset={offset}, read_only={read_only})",
                    descriptor.binding,
                    buffer.resource_id()
                )
            }
            (DescriptorKind::SampledTexture { .. }, ResourceBinding::Texture { texture }) => {
                format!(
                    "bind_{scope}_sampled_texture(space={parameter_index}, binding={}, texture={})",
                    descriptor.binding,
                    texture.resource_id()
                )
            }
            (
                DescriptorKind::StorageTexture { read_only, .. },
                ResourceBinding::Texture { texture },
            ) => {
                format!(
                    "bind_{scope}_storage_texture(space={parameter_index}, binding={}, texture={}, read_only={read_only})",
                    descriptor.binding,
                    texture.resource_id()
                )
            }
            (kind, _) => format!(
                "bind_{scope}_unknown(space={parameter_index}, binding={}, kind={kind:?})",
                descriptor.binding
            ),
        };
        device.record(call);
    }
}
