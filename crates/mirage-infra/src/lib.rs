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

//! # Mirage Infra
//!
//! Concrete implementations of the `mirage-core` rendering contracts:
//!
//! * [`graphics::wgpu`] — the hardware backend, translating the retained
//!   command stream into wgpu calls;
//! * [`graphics::null`] — a headless backend that records the native-call
//!   trace instead of touching a GPU, used by tests and CI.
//!
//! Both register themselves with the backend registry at link time under
//! the names `"Wgpu"` and `"Null"`.

pub mod graphics;

pub use graphics::null::{create_null_rhi, NullRhi};
pub use graphics::wgpu::create_wgpu_rhi;
