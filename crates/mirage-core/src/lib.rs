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

//! # Mirage Core
//!
//! Foundational crate containing the backend-agnostic rendering contracts of
//! the Mirage engine: resource descriptors and handles, the root-signature /
//! resource-group binding model, pipeline state validation, the retained
//! [`CommandBuffer`](rhi::command::CommandBuffer), and the [`Rhi`](rhi::Rhi)
//! device trait that concrete backends in `mirage-infra` implement.

#![warn(missing_docs)]

pub mod math;
pub mod rhi;
pub mod utils;

pub use rhi::Rhi;
