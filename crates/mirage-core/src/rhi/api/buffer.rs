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

//! GPU buffer resources.

use crate::mirage_bitflags;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

mirage_bitflags! {
    /// A set of flags describing the allowed usages of a [`Buffer`].
    ///
    /// The driver uses these to place the buffer in the most suitable memory
    /// and to validate bindings: a buffer bound to a uniform descriptor must
    /// carry `UNIFORM`, a storage descriptor requires `STORAGE`, and so on.
    pub struct BufferUsage: u32 {
        /// The buffer can be used as the source of a copy operation.
        const COPY_SRC = 1 << 0;
        /// The buffer can be used as the destination of a copy operation.
        const COPY_DST = 1 << 1;
        /// The buffer can be bound as a vertex buffer.
        const VERTEX = 1 << 2;
        /// The buffer can be bound as an index buffer.
        const INDEX = 1 << 3;
        /// The buffer can be bound as a uniform buffer.
        const UNIFORM = 1 << 4;
        /// The buffer can be bound as a storage buffer (shader read/write).
        const STORAGE = 1 << 5;
        /// The buffer can source indirect draw or dispatch arguments.
        const INDIRECT = 1 << 6;
    }
}

/// A descriptor used to create a [`Buffer`].
#[derive(Debug, Clone)]
pub struct BufferDescriptor<'a> {
    /// An optional debug label for the buffer.
    pub label: Option<Cow<'a, str>>,
    /// The total size of the buffer in bytes.
    pub size: u64,
    /// A bitmask of [`BufferUsage`] flags describing how the buffer will be
    /// used.
    pub usage: BufferUsage,
}

/// A GPU buffer resource.
///
/// Created through [`Rhi::create_buffer`](crate::rhi::Rhi::create_buffer);
/// shared via [`BufferHandle`].
pub struct Buffer {
    id: ResourceId,
    label: Option<String>,
    size: u64,
    usage: BufferUsage,
    native: NativeObject,
}

/// A shared handle to a [`Buffer`].
pub type BufferHandle = Arc<Buffer>;

impl Buffer {
    /// Wraps a backend-native buffer object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &BufferDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            size: descriptor.size,
            usage: descriptor.usage,
            native,
        }
    }

    /// The buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The usage flags the buffer was created with.
    pub fn usage(&self) -> BufferUsage {
        self.usage
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for Buffer {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::Buffer
    }
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("size", &self.size)
            .field("usage", &self.usage)
            .finish_non_exhaustive()
    }
}
