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

//! The generic built-in pass kinds: clear, fullscreen quad, compute, and
//! scene.

use super::pass::{CompositorPass, FrameContext};
use super::CompositorError;
use mirage_core::math::LinearRgba;
use mirage_core::rhi::api::binding::ResourceGroupHandle;
use mirage_core::rhi::api::pipeline::{ComputePipelineHandle, GraphicsPipelineHandle};
use mirage_core::rhi::command::{ClearFlags, CommandBuffer};

/// Clears the root render target to a fixed color.
#[derive(Debug)]
pub struct ClearPass {
    name: String,
    color: LinearRgba,
}

impl ClearPass {
    /// A clear pass writing `color` (and depth 1.0 / stencil 0).
    pub fn new(name: &str, color: LinearRgba) -> Self {
        Self {
            name: name.to_string(),
            color,
        }
    }
}

impl CompositorPass for ClearPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        commands.set_render_target(context.output);
        commands.clear_render_target(
            ClearFlags::COLOR | ClearFlags::DEPTH | ClearFlags::STENCIL,
            self.color,
            1.0,
            0,
        );
        Ok(())
    }
}

/// Draws a fullscreen triangle with a given pipeline, for post-processing
/// and composition steps.
#[derive(Debug)]
pub struct QuadPass {
    name: String,
    pipeline: GraphicsPipelineHandle,
    groups: Vec<(u32, ResourceGroupHandle)>,
}

impl QuadPass {
    /// A quad pass drawing with `pipeline` and the given resource groups
    /// bound per root-parameter slot.
    pub fn new(
        name: &str,
        pipeline: GraphicsPipelineHandle,
        groups: Vec<(u32, ResourceGroupHandle)>,
    ) -> Self {
        Self {
            name: name.to_string(),
            pipeline,
            groups,
        }
    }
}

impl CompositorPass for QuadPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        commands.with_debug_event(&self.name, |commands| {
            commands.set_render_target(context.output);
            commands.set_graphics_root_signature(self.pipeline.root_signature());
            commands.set_graphics_pipeline(&self.pipeline);
            for (slot, group) in &self.groups {
                commands.set_graphics_resource_group(*slot, group);
            }
            // A single oversized triangle covers the viewport without a
            // vertex buffer; positions come from the vertex index.
            commands.draw(0..3, 0..1);
        });
        Ok(())
    }
}

/// Dispatches one compute workload.
#[derive(Debug)]
pub struct ComputeDispatchPass {
    name: String,
    pipeline: ComputePipelineHandle,
    groups: Vec<(u32, ResourceGroupHandle)>,
    workgroups: (u32, u32, u32),
}

impl ComputeDispatchPass {
    /// A pass dispatching `workgroups` with the given pipeline and groups.
    pub fn new(
        name: &str,
        pipeline: ComputePipelineHandle,
        groups: Vec<(u32, ResourceGroupHandle)>,
        workgroups: (u32, u32, u32),
    ) -> Self {
        Self {
            name: name.to_string(),
            pipeline,
            groups,
            workgroups,
        }
    }
}

impl CompositorPass for ComputeDispatchPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        _context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        commands.with_debug_event(&self.name, |commands| {
            commands.set_compute_root_signature(self.pipeline.root_signature());
            commands.set_compute_pipeline(&self.pipeline);
            for (slot, group) in &self.groups {
                commands.set_compute_resource_group(*slot, group);
            }
            let (x, y, z) = self.workgroups;
            commands.dispatch_workgroups(x, y, z);
        });
        Ok(())
    }
}

/// Records the application's scene geometry.
///
/// The compositor owns scheduling, not scene content; the renderer
/// callback receives the frame context and the pass's command buffer and
/// records whatever the scene needs.
pub trait SceneRenderer: Send {
    /// Records this frame's scene draws.
    fn record(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError>;
}

/// Delegates recording to a [`SceneRenderer`].
pub struct ScenePass {
    name: String,
    renderer: Box<dyn SceneRenderer>,
}

impl ScenePass {
    /// A scene pass driven by `renderer`.
    pub fn new(name: &str, renderer: Box<dyn SceneRenderer>) -> Self {
        Self {
            name: name.to_string(),
            renderer,
        }
    }
}

impl CompositorPass for ScenePass {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        commands.begin_debug_event(&self.name);
        let result = self.renderer.record(context, commands);
        commands.end_debug_event();
        result
    }
}

impl std::fmt::Debug for ScenePass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScenePass").field("name", &self.name).finish()
    }
}
