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

//! Swap chains: window-backed render targets.

use crate::math::Extent2D;
use crate::rhi::api::pass::RenderPassHandle;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use crate::rhi::api::texture::TextureFormat;
use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex};

/// A descriptor used to create a [`SwapChain`].
#[derive(Debug, Clone)]
pub struct SwapChainDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The initial pixel size of the backing surface.
    pub size: Extent2D,
    /// The preferred surface format; `None` lets the backend pick.
    pub format: Option<TextureFormat>,
    /// Whether presentation waits for vertical sync.
    pub vsync: bool,
}

/// A swap chain: a specialized render target tied to a native window.
///
/// Resize and present go through the owning [`Rhi`](crate::rhi::Rhi);
/// resize calls must be externally serialized against concurrent draw
/// submission. The swap chain owns a handle to its render pass, so
/// pipelines targeting the window can be validated against it like any
/// framebuffer.
pub struct SwapChain {
    id: ResourceId,
    label: Option<String>,
    render_pass: RenderPassHandle,
    format: TextureFormat,
    extent: Mutex<Extent2D>,
    native: NativeObject,
}

/// A shared handle to a [`SwapChain`].
pub type SwapChainHandle = Arc<SwapChain>;

impl SwapChain {
    /// Wraps a backend-native swap chain. Called by backend implementations
    /// only; `format` is the format the backend actually selected.
    pub fn new(
        descriptor: &SwapChainDescriptor<'_>,
        render_pass: RenderPassHandle,
        format: TextureFormat,
        native: NativeObject,
    ) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            render_pass,
            format,
            extent: Mutex::new(descriptor.size),
            native,
        }
    }

    /// The render pass describing this swap chain as a render target.
    pub fn render_pass(&self) -> &RenderPassHandle {
        &self.render_pass
    }

    /// The surface format the backend selected.
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    /// The current pixel size of the backing surface.
    pub fn extent(&self) -> Extent2D {
        *self.extent.lock().unwrap()
    }

    /// Records a new surface size. Called by the owning backend from its
    /// resize implementation.
    pub fn set_extent(&self, extent: Extent2D) {
        *self.extent.lock().unwrap() = extent;
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for SwapChain {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::SwapChain
    }
}

impl fmt::Debug for SwapChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SwapChain")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("format", &self.format)
            .field("extent", &self.extent())
            .finish_non_exhaustive()
    }
}
