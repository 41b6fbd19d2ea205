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

//! Common machinery shared by every GPU resource type.
//!
//! Resources are shared-ownership objects: the public handle types
//! (`BufferHandle`, `TextureHandle`, ...) are `Arc` aliases, so anything
//! that must keep a resource alive — a vertex array over its buffers, a
//! resource group over its bindings, a recorded command buffer over
//! everything it references — simply holds a clone of the handle. The
//! backing object (and its backend-native payload) is destroyed exactly
//! once, when the last handle drops.

use std::any::Any;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// The opaque backend-native payload a resource owns.
///
/// The backend that created the resource installs whatever it needs to
/// replay the resource cheaply at submit time (a `wgpu::Buffer`, a
/// precomputed bind group, a trace identity, ...) and downcasts it back
/// during translation.
pub type NativeObject = Box<dyn Any + Send + Sync>;

/// A process-unique, monotonically increasing resource identity.
///
/// Used for logging and for stable identities in backend traces; it is not
/// a lookup key (handles are `Arc`s, not ids).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub u64);

impl ResourceId {
    /// Allocates the next unique id.
    pub fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The coarse kind of a resource, used in validation diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A GPU buffer.
    Buffer,
    /// A GPU texture.
    Texture,
    /// A sampler state object.
    Sampler,
    /// A compiled shader module.
    ShaderModule,
    /// A root signature.
    RootSignature,
    /// A resource group.
    ResourceGroup,
    /// A graphics pipeline state object.
    GraphicsPipeline,
    /// A compute pipeline state object.
    ComputePipeline,
    /// A render pass compatibility descriptor.
    RenderPass,
    /// A framebuffer.
    Framebuffer,
    /// A swap chain.
    SwapChain,
    /// A vertex array.
    VertexArray,
}

/// Behavior common to all GPU resources.
pub trait RhiResource: fmt::Debug + Send + Sync {
    /// The process-unique identity of this resource.
    fn resource_id(&self) -> ResourceId;

    /// The optional debug label the resource was created with.
    fn label(&self) -> Option<&str>;

    /// The coarse kind of this resource.
    fn kind(&self) -> ResourceKind;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::api::buffer::{Buffer, BufferDescriptor, BufferUsage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn resource_ids_are_unique_and_increasing() {
        let a = ResourceId::allocate();
        let b = ResourceId::allocate();
        assert_ne!(a, b);
        assert!(b > a);
    }

    struct DropProbe(Arc<AtomicUsize>);

    impl Drop for DropProbe {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// A resource (and its native payload) is destroyed exactly once, when
    /// the last of N handles drops — never before.
    #[test]
    fn resource_is_destroyed_exactly_once_on_last_release() {
        let drops = Arc::new(AtomicUsize::new(0));
        let buffer = Arc::new(Buffer::new(
            &BufferDescriptor {
                label: None,
                size: 16,
                usage: BufferUsage::UNIFORM,
            },
            Box::new(DropProbe(Arc::clone(&drops))),
        ));

        let clones: Vec<_> = (0..4).map(|_| Arc::clone(&buffer)).collect();
        drop(buffer);
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        for (released, clone) in clones.into_iter().enumerate() {
            assert_eq!(drops.load(Ordering::SeqCst), 0, "alive after {released} releases");
            drop(clone);
        }
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }
}
