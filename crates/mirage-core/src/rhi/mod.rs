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

//! The Rendering Hardware Interface: the public, backend-agnostic rendering
//! contracts of the Mirage engine.
//!
//! This module is the "common language" for all rendering operations. It
//! contains the abstract [`Rhi`] device trait, the resource descriptors and
//! `Arc`-based handles, the root-signature / resource-group binding model,
//! pipeline-state validation, and the retained
//! [`CommandBuffer`](command::CommandBuffer). The 'how' is handled by a
//! concrete backend in `mirage-infra` (wgpu for hardware, null for headless
//! replay) which implements these traits; the compositor layer records and
//! submits work through them without knowing the underlying graphics API.

pub mod api;
pub mod backend;
pub mod capabilities;
pub mod command;
pub mod error;
pub mod traits;

pub use api::*;
pub use backend::{BackendConfig, BackendRegistration, BackendRegistry, PowerPreference};
pub use capabilities::{AdapterInfo, Capabilities, DeviceType, GraphicsBackendType};
pub use command::{ClearFlags, Command, CommandBuffer, RenderTarget, ScissorRect, Viewport};
pub use error::{
    BindingError, FramebufferError, PipelineError, RenderError, ResourceError, ShaderError,
    SubmitError,
};
pub use traits::{Rhi, RenderWindow, SurfaceTarget};
