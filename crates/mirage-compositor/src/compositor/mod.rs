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

//! The compositor: a declarative sequence of passes executed against a
//! root render target once per frame.
//!
//! Each pass instance moves through a fixed lifecycle: **Created** (GPU
//! resources allocated in `setup`) → per frame **Filled** (command buffer
//! populated) → **Submitted** (dispatched to the RHI) → **Destroyed**
//! (resources released). Pass types are resolved by name through a
//! factory chain; an unresolved type is a configuration error, reported
//! through the log and the returned error, never a silent no-op.

mod factory;
mod graph;
mod pass;
pub mod passes;
pub mod shadow;

pub use factory::{BasePassFactory, PassDeclaration, PassFactory, PassFactoryChain};
pub use graph::{CompositorGraph, PassState};
pub use pass::{CompositorPass, FrameContext};

use mirage_core::rhi::error::{RenderError, ResourceError, SubmitError};
use thiserror::Error;

/// Errors produced by the compositor layer.
#[derive(Debug, Error)]
pub enum CompositorError {
    /// No factory in the chain recognizes the pass type name.
    #[error("no pass factory recognizes pass type '{0}'")]
    UnknownPassType(String),
    /// A pass failed to allocate its GPU resources.
    #[error("pass '{name}' failed to allocate resources")]
    ResourceCreation {
        /// The pass instance name.
        name: String,
        /// The underlying resource error.
        #[source]
        source: ResourceError,
    },
    /// Submitting a pass's command buffer failed.
    #[error("pass '{name}' submission failed")]
    Submission {
        /// The pass instance name.
        name: String,
        /// The underlying submit error.
        #[source]
        source: SubmitError,
    },
    /// A backend-level failure.
    #[error(transparent)]
    Render(#[from] RenderError),
}
