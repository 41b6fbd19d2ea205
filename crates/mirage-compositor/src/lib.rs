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

//! # Mirage Compositor
//!
//! The renderer-runtime layer above the RHI: a declarative per-frame pass
//! graph ([`compositor`]), the cascaded variance-shadow-map pass, the
//! frame driver composing a backend with a workload ([`frame`]), and the
//! binary asset-blob boundary ([`asset`]).

pub mod asset;
pub mod compositor;
pub mod frame;

pub use compositor::{
    CompositorError, CompositorGraph, CompositorPass, FrameContext, PassDeclaration,
    PassFactory, PassFactoryChain, PassState,
};
pub use frame::{FrameDriver, FrameWorkload};
