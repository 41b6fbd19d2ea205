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

//! The window boundary.
//!
//! Platform windowing glue is an external collaborator: the engine only
//! needs an object exposing native window/display handles plus a pixel
//! size. Any windowing backend (winit, SDL, a bare X11/Win32 wrapper) can
//! implement [`RenderWindow`].

use crate::math::Extent2D;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

/// The behavior a graphics backend needs from a native window.
pub trait RenderWindow: HasWindowHandle + HasDisplayHandle + Send + Sync {
    /// The physical pixel size of the window's drawable area.
    fn inner_size(&self) -> Extent2D;
}

/// The surface a swap chain presents to.
pub enum SurfaceTarget<'a> {
    /// A native window.
    Window(&'a dyn RenderWindow),
    /// No window: an offscreen surface of the given size. Supported by
    /// headless-capable backends only; others reject it at creation.
    Headless(Extent2D),
}

impl SurfaceTarget<'_> {
    /// The pixel size of the target surface.
    pub fn size(&self) -> Extent2D {
        match self {
            SurfaceTarget::Window(window) => window.inner_size(),
            SurfaceTarget::Headless(size) => *size,
        }
    }
}
