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

//! The wgpu hardware backend.
//!
//! Translates the retained command stream into wgpu calls. The binding
//! model maps 1:1: a root-signature descriptor table becomes a bind group
//! layout (root parameter index = group index), and a resource group
//! pre-computes its `wgpu::BindGroup` once at creation, so submit-time
//! replay is a single `set_bind_group` per group.

pub mod context;
pub mod conversions;
pub mod device;
mod replay;
pub mod selector;

pub use device::WgpuRhi;

use mirage_core::rhi::backend::{BackendConfig, BackendRegistration};
use mirage_core::rhi::error::RenderError;
use mirage_core::rhi::Rhi;
use std::sync::Arc;

/// Factory registered under the name `"Wgpu"`.
pub fn create_wgpu_rhi(config: &BackendConfig) -> Result<Arc<dyn Rhi>, RenderError> {
    Ok(Arc::new(WgpuRhi::new(config)?))
}

inventory::submit! {
    BackendRegistration {
        name: "Wgpu",
        factory: create_wgpu_rhi,
    }
}
