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

//! Vertex input layout and the vertex array resource.

use crate::rhi::api::buffer::BufferHandle;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// The data type of indices in an index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexFormat {
    /// Indices are 16-bit unsigned integers.
    Uint16,
    /// Indices are 32-bit unsigned integers.
    Uint32,
}

/// The data format of a single vertex attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    /// One 32-bit float.
    Float32,
    /// Two 32-bit floats.
    Float32x2,
    /// Three 32-bit floats.
    Float32x3,
    /// Four 32-bit floats.
    Float32x4,
    /// Two 32-bit unsigned integers.
    Uint32x2,
    /// Four 8-bit unsigned normalized components.
    Unorm8x4,
    /// Four 16-bit floats.
    Float16x4,
}

impl VertexFormat {
    /// The byte size of one attribute of this format.
    pub const fn size(&self) -> u64 {
        match self {
            VertexFormat::Float32 => 4,
            VertexFormat::Float32x2 => 8,
            VertexFormat::Float32x3 => 12,
            VertexFormat::Float32x4 => 16,
            VertexFormat::Uint32x2 => 8,
            VertexFormat::Unorm8x4 => 4,
            VertexFormat::Float16x4 => 8,
        }
    }
}

/// How often a vertex buffer is advanced during a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VertexStepMode {
    /// Advance per vertex.
    #[default]
    Vertex,
    /// Advance per instance.
    Instance,
}

/// A single vertex attribute within a vertex buffer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VertexAttribute {
    /// The input location of this attribute in the vertex shader.
    pub shader_location: u32,
    /// The format of the attribute's data.
    pub format: VertexFormat,
    /// The byte offset of this attribute from the start of the vertex.
    pub offset: u64,
}

/// The memory layout of a single vertex buffer slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexBufferLayout {
    /// The byte distance between consecutive elements in the buffer.
    pub array_stride: u64,
    /// How often the buffer is advanced.
    pub step_mode: VertexStepMode,
    /// The attributes contained within each element of the buffer.
    pub attributes: Vec<VertexAttribute>,
}

/// A vertex buffer bound into a vertex array slot, with its layout.
#[derive(Debug, Clone)]
pub struct VertexBufferView {
    /// The bound buffer.
    pub buffer: BufferHandle,
    /// The layout the pipeline will read it with.
    pub layout: VertexBufferLayout,
}

/// An index buffer bound into a vertex array.
#[derive(Debug, Clone)]
pub struct IndexBufferView {
    /// The bound buffer.
    pub buffer: BufferHandle,
    /// The index data type.
    pub format: IndexFormat,
}

/// A descriptor used to create a [`VertexArray`].
#[derive(Debug, Clone)]
pub struct VertexArrayDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The vertex buffers, in input-slot order.
    pub vertex_buffers: Cow<'a, [VertexBufferView]>,
    /// The optional index buffer.
    pub index_buffer: Option<IndexBufferView>,
}

/// Validates a vertex array descriptor: every attribute must fit within
/// its buffer's stride, vertex buffers need `VERTEX` usage, and the index
/// buffer needs `INDEX` usage.
///
/// Shared by every backend so the rules are enforced identically.
pub fn validate_vertex_array(
    descriptor: &VertexArrayDescriptor<'_>,
) -> Result<(), crate::rhi::error::ResourceError> {
    use crate::rhi::api::buffer::BufferUsage;
    use crate::rhi::error::ResourceError;

    for (slot, view) in descriptor.vertex_buffers.iter().enumerate() {
        if !view.buffer.usage().contains(BufferUsage::VERTEX) {
            return Err(ResourceError::InvalidDescriptor(format!(
                "buffer in vertex slot {slot} was created without VERTEX usage"
            )));
        }
        for attribute in &view.layout.attributes {
            if attribute.offset + attribute.format.size() > view.layout.array_stride {
                return Err(ResourceError::InvalidDescriptor(format!(
                    "attribute at location {} overruns the stride of vertex buffer slot {slot}",
                    attribute.shader_location
                )));
            }
        }
    }
    if let Some(index) = &descriptor.index_buffer {
        if !index.buffer.usage().contains(BufferUsage::INDEX) {
            return Err(ResourceError::InvalidDescriptor(
                "index buffer was created without INDEX usage".into(),
            ));
        }
    }
    Ok(())
}

/// A vertex array: the bound combination of vertex buffers (with their
/// layouts) and an optional index buffer.
///
/// Holds handles to every buffer it was built from, so callers do not need
/// to keep their own references alive.
pub struct VertexArray {
    id: ResourceId,
    label: Option<String>,
    vertex_buffers: Vec<VertexBufferView>,
    index_buffer: Option<IndexBufferView>,
    native: NativeObject,
}

/// A shared handle to a [`VertexArray`].
pub type VertexArrayHandle = Arc<VertexArray>;

impl VertexArray {
    /// Wraps a backend-native vertex array object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &VertexArrayDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            vertex_buffers: descriptor.vertex_buffers.to_vec(),
            index_buffer: descriptor.index_buffer.clone(),
            native,
        }
    }

    /// The bound vertex buffers in input-slot order.
    pub fn vertex_buffers(&self) -> &[VertexBufferView] {
        &self.vertex_buffers
    }

    /// The bound index buffer, if any.
    pub fn index_buffer(&self) -> Option<&IndexBufferView> {
        self.index_buffer.as_ref()
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for VertexArray {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::VertexArray
    }
}

impl fmt::Debug for VertexArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VertexArray")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("vertex_buffers", &self.vertex_buffers.len())
            .field("has_index_buffer", &self.index_buffer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::api::buffer::{Buffer, BufferDescriptor, BufferUsage};

    fn buffer(usage: BufferUsage) -> BufferHandle {
        Arc::new(Buffer::new(
            &BufferDescriptor {
                label: None,
                size: 256,
                usage,
            },
            Box::new(()),
        ))
    }

    #[test]
    fn vertex_array_keeps_its_buffers_alive() {
        let vertex_buffer = buffer(BufferUsage::VERTEX);
        let index_buffer = buffer(BufferUsage::INDEX);
        let array = VertexArray::new(
            &VertexArrayDescriptor {
                label: None,
                vertex_buffers: Cow::Owned(vec![VertexBufferView {
                    buffer: Arc::clone(&vertex_buffer),
                    layout: VertexBufferLayout {
                        array_stride: 12,
                        step_mode: VertexStepMode::Vertex,
                        attributes: vec![VertexAttribute {
                            shader_location: 0,
                            format: VertexFormat::Float32x3,
                            offset: 0,
                        }],
                    },
                }]),
                index_buffer: Some(IndexBufferView {
                    buffer: Arc::clone(&index_buffer),
                    format: IndexFormat::Uint16,
                }),
            },
            Box::new(()),
        );

        // Callers may drop their own handles; the array keeps both buffers
        // alive until it is itself destroyed.
        assert_eq!(Arc::strong_count(&vertex_buffer), 2);
        assert_eq!(Arc::strong_count(&index_buffer), 2);
        drop(array);
        assert_eq!(Arc::strong_count(&vertex_buffer), 1);
        assert_eq!(Arc::strong_count(&index_buffer), 1);
    }

    #[test]
    fn vertex_format_sizes_fit_their_strides() {
        assert_eq!(VertexFormat::Float32x3.size(), 12);
        assert_eq!(VertexFormat::Unorm8x4.size(), 4);
    }
}
