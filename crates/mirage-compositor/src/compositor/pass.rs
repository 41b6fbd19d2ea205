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

use super::CompositorError;
use mirage_core::rhi::command::{CommandBuffer, RenderTarget};
use mirage_core::rhi::Rhi;
use std::fmt;

/// Per-frame context handed to each pass while it fills its command
/// buffer.
pub struct FrameContext<'a> {
    /// The device everything is created on and submitted to.
    pub rhi: &'a dyn Rhi,
    /// The root render target of this frame (usually the swap chain).
    pub output: &'a RenderTarget,
    /// The index of the frame being composed, monotonically increasing.
    pub frame_index: u64,
}

/// One stage of the per-frame rendering graph.
///
/// Implementations allocate long-lived GPU resources in
/// [`setup`](Self::setup), record their work into the provided command
/// buffer every frame in [`fill`](Self::fill), and release resources in
/// [`teardown`](Self::teardown). Submission is the graph's job; a pass
/// only records.
pub trait CompositorPass: fmt::Debug + Send {
    /// The instance name, used in logs and error reports.
    fn name(&self) -> &str;

    /// Allocates the pass's long-lived GPU resources. Called once, before
    /// the first frame.
    fn setup(&mut self, rhi: &dyn Rhi) -> Result<(), CompositorError> {
        let _ = rhi;
        Ok(())
    }

    /// Records this frame's work. Called once per frame with an empty
    /// command buffer.
    fn fill(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError>;

    /// Releases the pass's GPU resources. Called once, when the graph is
    /// destroyed.
    fn teardown(&mut self, rhi: &dyn Rhi) {
        let _ = rhi;
    }
}
