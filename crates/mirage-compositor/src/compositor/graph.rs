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

use super::factory::{PassDeclaration, PassFactoryChain};
use super::pass::{CompositorPass, FrameContext};
use super::CompositorError;
use mirage_core::rhi::command::{CommandBuffer, RenderTarget};
use mirage_core::rhi::Rhi;

/// The lifecycle state of one pass instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassState {
    /// Resources allocated; no frame recorded yet.
    Created,
    /// The pass's command buffer holds this frame's work.
    Filled,
    /// This frame's work was dispatched to the RHI.
    Submitted,
    /// Resources released; the instance is inert.
    Destroyed,
}

struct PassInstance {
    pass: Box<dyn CompositorPass>,
    state: PassState,
    commands: CommandBuffer,
}

/// An ordered pass list executed against a root render target once per
/// frame.
///
/// Each pass records into its own retained command buffer, which the
/// graph clears and refills every frame and submits in pass order. Work
/// that does not change between frames can stay pre-recorded: a pass may
/// fill a frozen buffer once in `setup` and embed it via
/// [`CommandBuffer::execute_commands`] each frame.
pub struct CompositorGraph {
    passes: Vec<PassInstance>,
    frame_index: u64,
}

impl CompositorGraph {
    /// An empty graph.
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            frame_index: 0,
        }
    }

    /// Builds a graph from declarations, resolving each through the
    /// factory chain and running its `setup`.
    pub fn from_declarations(
        declarations: &[PassDeclaration],
        factories: &PassFactoryChain,
        rhi: &dyn Rhi,
    ) -> Result<Self, CompositorError> {
        let mut graph = Self::new();
        for declaration in declarations {
            let pass = factories.resolve(declaration)?;
            graph.push_pass(pass, rhi)?;
        }
        Ok(graph)
    }

    /// Appends a pass, running its `setup` to allocate resources.
    pub fn push_pass(
        &mut self,
        mut pass: Box<dyn CompositorPass>,
        rhi: &dyn Rhi,
    ) -> Result<(), CompositorError> {
        pass.setup(rhi)?;
        log::debug!("Compositor: pass '{}' created", pass.name());
        self.passes.push(PassInstance {
            pass,
            state: PassState::Created,
            commands: CommandBuffer::new(),
        });
        Ok(())
    }

    /// The number of passes in the graph.
    pub fn len(&self) -> usize {
        self.passes.len()
    }

    /// `true` if the graph holds no passes.
    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// The lifecycle state of the pass at `index`.
    pub fn pass_state(&self, index: usize) -> Option<PassState> {
        self.passes.get(index).map(|instance| instance.state)
    }

    /// The index of the frame the next `execute_frame` call will compose.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Fills and submits every pass, in order, against `output`.
    ///
    /// A pass that records nothing is skipped (stays `Filled`); an error
    /// aborts the frame, leaving later passes untouched.
    pub fn execute_frame(
        &mut self,
        rhi: &dyn Rhi,
        output: &RenderTarget,
    ) -> Result<(), CompositorError> {
        let context = FrameContext {
            rhi,
            output,
            frame_index: self.frame_index,
        };
        for instance in &mut self.passes {
            if instance.state == PassState::Destroyed {
                continue;
            }
            instance.commands.clear();
            instance.pass.fill(&context, &mut instance.commands)?;
            instance.state = PassState::Filled;

            if instance.commands.is_empty() {
                continue;
            }
            rhi.submit_command_buffer(&instance.commands)
                .map_err(|source| CompositorError::Submission {
                    name: instance.pass.name().to_string(),
                    source,
                })?;
            instance.state = PassState::Submitted;
        }
        self.frame_index += 1;
        Ok(())
    }

    /// Tears down every pass and releases their command buffers.
    pub fn destroy(&mut self, rhi: &dyn Rhi) {
        for instance in &mut self.passes {
            if instance.state != PassState::Destroyed {
                instance.pass.teardown(rhi);
                instance.commands.clear();
                instance.state = PassState::Destroyed;
                log::debug!("Compositor: pass '{}' destroyed", instance.pass.name());
            }
        }
    }
}

impl Default for CompositorGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CompositorGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositorGraph")
            .field("passes", &self.passes.len())
            .field("frame_index", &self.frame_index)
            .finish()
    }
}
