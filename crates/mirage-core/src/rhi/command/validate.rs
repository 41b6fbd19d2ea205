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

//! The submit-time validation walk.
//!
//! Every backend runs this before translating a command buffer, so the
//! binding-mismatch and compatibility rules are enforced identically
//! everywhere, as ordinary `Err` values rather than debug-only assertions.
//!
//! The walk is stateful: it tracks the active root signatures, pipelines,
//! render target, and vertex array exactly as a replay would, and rejects
//! the first command whose preconditions are not met.

use crate::rhi::api::binding::RootSignature;
use crate::rhi::api::pipeline::{ComputePipelineHandle, GraphicsPipelineHandle};
use crate::rhi::api::resource::RhiResource;
use crate::rhi::api::vertex::VertexArrayHandle;
use crate::rhi::command::{Command, CommandBuffer, RenderTarget};
use crate::rhi::error::{BindingError, SubmitError};

#[derive(Default)]
struct ReplayState<'a> {
    graphics_signature: Option<&'a RootSignature>,
    graphics_pipeline: Option<&'a GraphicsPipelineHandle>,
    compute_signature: Option<&'a RootSignature>,
    compute_pipeline: Option<&'a ComputePipelineHandle>,
    render_target: Option<&'a RenderTarget>,
    vertex_array: Option<&'a VertexArrayHandle>,
    debug_event_depth: u32,
}

/// Validates a command buffer prior to translation.
///
/// Nested buffers embedded via
/// [`ExecuteCommands`](Command::ExecuteCommands) are validated recursively
/// and must be self-contained: they do not inherit the outer buffer's
/// bound state.
pub fn validate(buffer: &CommandBuffer) -> Result<(), SubmitError> {
    let mut state = ReplayState::default();
    walk(buffer.commands(), &mut state)?;
    if state.debug_event_depth != 0 {
        return Err(SubmitError::UnbalancedDebugEvent);
    }
    Ok(())
}

fn walk<'a>(commands: &'a [Command], state: &mut ReplayState<'a>) -> Result<(), SubmitError> {
    for command in commands {
        match command {
            Command::BeginDebugEvent { .. } => {
                state.debug_event_depth += 1;
            }
            Command::EndDebugEvent => {
                state.debug_event_depth = state
                    .debug_event_depth
                    .checked_sub(1)
                    .ok_or(SubmitError::UnbalancedDebugEvent)?;
            }
            Command::DebugMarker { .. } => {}

            Command::SetGraphicsRootSignature { signature } => {
                state.graphics_signature = Some(signature.as_ref());
                // A pipeline built for another signature must not survive
                // the switch.
                state.graphics_pipeline = None;
            }
            Command::SetGraphicsPipeline { pipeline } => {
                let signature = state
                    .graphics_signature
                    .ok_or(SubmitError::MissingGraphicsRootSignature)?;
                if pipeline.root_signature().resource_id() != signature.resource_id() {
                    return Err(SubmitError::RootSignatureMismatch);
                }
                state.graphics_pipeline = Some(pipeline);
            }
            Command::SetGraphicsResourceGroup {
                parameter_index,
                group,
            } => {
                let signature = state
                    .graphics_signature
                    .ok_or(SubmitError::MissingGraphicsRootSignature)?;
                check_group_binding(signature, *parameter_index, group)?;
            }
            Command::SetVertexArray { vertex_array } => {
                state.vertex_array = vertex_array.as_ref();
            }
            Command::SetRenderTarget { target } => {
                state.render_target = Some(target);
            }
            Command::SetViewportAndScissor { .. } => {}
            Command::Clear { .. } => {
                if state.render_target.is_none() {
                    return Err(SubmitError::MissingRenderTarget);
                }
            }

            Command::Draw { .. } | Command::DrawIndirect { .. } => {
                check_draw(state, false)?;
            }
            Command::DrawIndexed { .. } | Command::DrawIndexedIndirect { .. } => {
                check_draw(state, true)?;
            }

            Command::SetComputeRootSignature { signature } => {
                state.compute_signature = Some(signature.as_ref());
                state.compute_pipeline = None;
            }
            Command::SetComputePipeline { pipeline } => {
                let signature = state
                    .compute_signature
                    .ok_or(SubmitError::MissingComputeRootSignature)?;
                if pipeline.root_signature().resource_id() != signature.resource_id() {
                    return Err(SubmitError::RootSignatureMismatch);
                }
                state.compute_pipeline = Some(pipeline);
            }
            Command::SetComputeResourceGroup {
                parameter_index,
                group,
            } => {
                let signature = state
                    .compute_signature
                    .ok_or(SubmitError::MissingComputeRootSignature)?;
                check_group_binding(signature, *parameter_index, group)?;
            }
            Command::Dispatch { .. } | Command::DispatchIndirect { .. } => {
                if state.compute_pipeline.is_none() {
                    return Err(SubmitError::MissingComputePipeline);
                }
            }

            Command::WriteUniformData { buffer, offset, data } => {
                if offset + data.len() as u64 > buffer.size() {
                    return Err(SubmitError::Backend(format!(
                        "uniform write of {} bytes at offset {} exceeds buffer size {}",
                        data.len(),
                        offset,
                        buffer.size()
                    )));
                }
            }

            Command::ExecuteCommands { commands } => {
                // Nested buffers are self-contained; validate with fresh
                // state so they cannot depend on outer bindings.
                validate(commands)?;
            }
        }
    }
    Ok(())
}

fn check_group_binding(
    signature: &RootSignature,
    parameter_index: u32,
    group: &crate::rhi::api::binding::ResourceGroupHandle,
) -> Result<(), SubmitError> {
    if group.signature().resource_id() != signature.resource_id() {
        return Err(SubmitError::RootSignatureMismatch);
    }
    if group.parameter_index() != parameter_index {
        // The group was prepared for a different slot of this signature.
        return Err(SubmitError::Binding(BindingError::ParameterOutOfRange {
            parameter_index,
            parameter_count: signature.parameters().len() as u32,
        }));
    }
    // Slot existence and arity were validated at group creation; re-check
    // the slot is still a table so a malformed signature cannot slip
    // through a hand-built group.
    signature
        .descriptor_table(parameter_index)
        .map_err(SubmitError::Binding)?;
    Ok(())
}

fn check_draw(state: &ReplayState<'_>, indexed: bool) -> Result<(), SubmitError> {
    let pipeline = state
        .graphics_pipeline
        .ok_or(SubmitError::MissingGraphicsPipeline)?;
    let target = state.render_target.ok_or(SubmitError::MissingRenderTarget)?;

    let pipeline_pass = pipeline.render_pass();
    let target_pass = target.render_pass();
    if !pipeline_pass.is_compatible_with(target_pass) {
        return Err(SubmitError::IncompatibleRenderTarget(format!(
            "pipeline expects {} color attachments at {:?}, target provides {} at {:?}",
            pipeline_pass.color_formats().len(),
            pipeline_pass.color_formats(),
            target_pass.color_formats().len(),
            target_pass.color_formats(),
        )));
    }

    if !pipeline.vertex_layouts().is_empty() {
        let vertex_array = state.vertex_array.ok_or(SubmitError::MissingVertexArray)?;
        if indexed && vertex_array.index_buffer().is_none() {
            return Err(SubmitError::MissingIndexBuffer);
        }
    } else if indexed {
        // An indexed draw always needs an index buffer, vertex input or not.
        let vertex_array = state.vertex_array.ok_or(SubmitError::MissingVertexArray)?;
        if vertex_array.index_buffer().is_none() {
            return Err(SubmitError::MissingIndexBuffer);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::api::binding::{
        DescriptorKind, DescriptorRange, ResourceBinding, ResourceGroup, ResourceGroupDescriptor,
        RootParameter, RootSignature, RootSignatureDescriptor,
    };
    use crate::rhi::api::buffer::{Buffer, BufferDescriptor, BufferUsage};
    use std::borrow::Cow;
    use std::sync::Arc;

    fn test_signature() -> Arc<RootSignature> {
        Arc::new(RootSignature::new(
            &RootSignatureDescriptor {
                label: None,
                parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                    ranges: vec![DescriptorRange::single(DescriptorKind::UniformBuffer, 0)],
                }]),
            },
            Box::new(()),
        ))
    }

    fn test_group(signature: &Arc<RootSignature>) -> Arc<ResourceGroup> {
        let buffer = Arc::new(Buffer::new(
            &BufferDescriptor {
                label: None,
                size: 32,
                usage: BufferUsage::UNIFORM,
            },
            Box::new(()),
        ));
        Arc::new(ResourceGroup::new(
            signature,
            &ResourceGroupDescriptor {
                label: None,
                parameter_index: 0,
                resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
                samplers: Cow::Borrowed(&[]),
            },
            Box::new(()),
        ))
    }

    #[test]
    fn empty_buffer_validates() {
        assert!(validate(&CommandBuffer::new()).is_ok());
    }

    #[test]
    fn dispatch_without_pipeline_is_rejected() {
        let mut buffer = CommandBuffer::new();
        buffer.dispatch_workgroups(1, 1, 1);
        assert!(matches!(
            validate(&buffer),
            Err(SubmitError::MissingComputePipeline)
        ));
    }

    #[test]
    fn resource_group_without_signature_is_rejected() {
        let signature = test_signature();
        let group = test_group(&signature);
        let mut buffer = CommandBuffer::new();
        buffer.set_graphics_resource_group(0, &group);
        assert!(matches!(
            validate(&buffer),
            Err(SubmitError::MissingGraphicsRootSignature)
        ));
    }

    #[test]
    fn resource_group_bound_to_foreign_signature_is_rejected() {
        let signature_a = test_signature();
        let signature_b = test_signature();
        let group = test_group(&signature_a);
        let mut buffer = CommandBuffer::new();
        buffer.set_graphics_root_signature(&signature_b);
        buffer.set_graphics_resource_group(0, &group);
        assert!(matches!(
            validate(&buffer),
            Err(SubmitError::RootSignatureMismatch)
        ));
    }

    #[test]
    fn resource_group_bound_to_wrong_slot_is_rejected() {
        let signature = test_signature();
        let group = test_group(&signature);
        let mut buffer = CommandBuffer::new();
        buffer.set_graphics_root_signature(&signature);
        buffer.set_graphics_resource_group(1, &group);
        assert!(matches!(
            validate(&buffer),
            Err(SubmitError::Binding(BindingError::ParameterOutOfRange { .. }))
        ));
    }

    #[test]
    fn unbalanced_debug_events_are_rejected() {
        let mut open = CommandBuffer::new();
        open.begin_debug_event("scope");
        assert!(matches!(
            validate(&open),
            Err(SubmitError::UnbalancedDebugEvent)
        ));

        let mut close = CommandBuffer::new();
        close.end_debug_event();
        assert!(matches!(
            validate(&close),
            Err(SubmitError::UnbalancedDebugEvent)
        ));
    }

    #[test]
    fn uniform_write_past_the_end_is_rejected() {
        let buffer_handle = Arc::new(Buffer::new(
            &BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            Box::new(()),
        ));
        let mut buffer = CommandBuffer::new();
        buffer.write_uniform_data(&buffer_handle, 8, &[0u8; 16]);
        assert!(matches!(validate(&buffer), Err(SubmitError::Backend(_))));
    }

    #[test]
    fn nested_buffers_do_not_inherit_outer_state() {
        let signature = test_signature();
        let group = test_group(&signature);

        let mut nested = CommandBuffer::new();
        // Relies on a root signature the nested buffer never sets itself.
        nested.set_graphics_resource_group(0, &group);
        let nested = Arc::new(nested);

        let mut outer = CommandBuffer::new();
        outer.set_graphics_root_signature(&signature);
        outer.execute_commands(&nested);
        assert!(matches!(
            validate(&outer),
            Err(SubmitError::MissingGraphicsRootSignature)
        ));
    }
}
