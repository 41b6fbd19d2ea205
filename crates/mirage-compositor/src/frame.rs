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

//! The frame driver: composition over inheritance.
//!
//! A [`FrameDriver`] owns a polymorphic backend and a polymorphic
//! workload and calls the fixed lifecycle hooks — no application base
//! class hierarchy.

use mirage_core::rhi::command::RenderTarget;
use mirage_core::rhi::Rhi;
use std::sync::Arc;
use std::time::Instant;

/// The lifecycle hooks an application workload implements.
pub trait FrameWorkload {
    /// Called once before the first frame; creates GPU resources.
    fn on_init(&mut self, rhi: &dyn Rhi) -> anyhow::Result<()>;

    /// Called every frame before drawing with the seconds elapsed since
    /// the previous frame.
    fn on_update(&mut self, delta_seconds: f32) {
        let _ = delta_seconds;
    }

    /// Called every frame to record and submit rendering work against the
    /// root render target.
    fn on_draw(&mut self, rhi: &dyn Rhi, output: &RenderTarget) -> anyhow::Result<()>;

    /// Called once at shutdown; releases GPU resources.
    fn on_deinit(&mut self, rhi: &dyn Rhi) {
        let _ = rhi;
    }
}

/// Drives a workload against a backend: init once, update + draw per
/// frame, deinit once.
pub struct FrameDriver {
    rhi: Arc<dyn Rhi>,
    workload: Box<dyn FrameWorkload>,
    initialized: bool,
    last_frame: Option<Instant>,
}

impl FrameDriver {
    /// Pairs a backend with a workload.
    pub fn new(rhi: Arc<dyn Rhi>, workload: Box<dyn FrameWorkload>) -> Self {
        Self {
            rhi,
            workload,
            initialized: false,
            last_frame: None,
        }
    }

    /// The backend this driver submits to.
    pub fn rhi(&self) -> &Arc<dyn Rhi> {
        &self.rhi
    }

    /// Runs `on_init` if it has not run yet.
    pub fn init(&mut self) -> anyhow::Result<()> {
        if !self.initialized {
            self.workload.on_init(self.rhi.as_ref())?;
            self.initialized = true;
        }
        Ok(())
    }

    /// Runs one frame: update, draw, and end-of-frame bookkeeping.
    pub fn frame(&mut self, output: &RenderTarget) -> anyhow::Result<()> {
        self.init()?;
        let now = Instant::now();
        let delta = self
            .last_frame
            .map(|last| (now - last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.workload.on_update(delta);
        self.workload.on_draw(self.rhi.as_ref(), output)?;
        self.rhi.finish_frame()?;
        Ok(())
    }

    /// Runs `on_deinit` if init had run. Further frames are an error in
    /// the workload's hands; the driver itself becomes inert.
    pub fn shutdown(&mut self) {
        if self.initialized {
            self.workload.on_deinit(self.rhi.as_ref());
            self.initialized = false;
        }
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for FrameDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameDriver")
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}
