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

//! The root-signature / resource-group binding model.
//!
//! A [`RootSignature`] declares every binding slot a pipeline can access:
//! an ordered list of root parameters, each either a descriptor table (one
//! or more [`DescriptorRange`]s) or an inline push-constant block. A
//! [`ResourceGroup`] is an immutable binding of concrete resource handles
//! to exactly one root parameter; its shape is validated against that
//! parameter's declared ranges at creation, element for element.
//!
//! Backends with native table concepts (descriptor sets, bind groups)
//! pre-compute one native object per group at creation; flat-slot backends
//! replay the flattened element list as individual binds. Both translations
//! read the same [`flatten_table`] order, which is what makes replay
//! deterministic across backends.

use crate::rhi::api::buffer::{BufferHandle, BufferUsage};
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use crate::rhi::api::sampler::SamplerHandle;
use crate::rhi::api::shader::ShaderStageFlags;
use crate::rhi::api::texture::{TextureDimension, TextureFormat, TextureHandle, TextureUsage};
use crate::rhi::error::BindingError;
use std::borrow::Cow;
use std::fmt;
use std::num::NonZeroU64;
use std::sync::Arc;

/// How a sampled texture descriptor is read in shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureSampleKind {
    /// A floating-point texture.
    #[default]
    Float,
    /// A non-filterable floating-point texture.
    UnfilterableFloat,
    /// A depth texture (for comparison sampling).
    Depth,
    /// An unsigned integer texture.
    Uint,
    /// A signed integer texture.
    Sint,
}

/// The kind of resource a descriptor addresses.
///
/// The read-only / read-write split on the storage kinds carries the
/// shader-resource-view versus unordered-access-view distinction down to
/// native view creation; the texture kinds carry the dimension and format
/// information table-based backends need to build their native layout
/// objects up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorKind {
    /// A uniform (constant) buffer, always read-only.
    UniformBuffer,
    /// A storage buffer.
    StorageBuffer {
        /// `true` for shader-resource-view semantics, `false` for
        /// unordered-access (read/write) semantics.
        read_only: bool,
    },
    /// A sampled texture (shader-resource view).
    SampledTexture {
        /// The view dimension shaders see.
        dimension: TextureDimension,
        /// How shaders read the texture.
        sample_type: TextureSampleKind,
    },
    /// A storage texture.
    StorageTexture {
        /// `true` for read-only access, `false` for unordered-access
        /// (write-enabled) semantics.
        read_only: bool,
        /// The texel format the shader declares.
        format: TextureFormat,
        /// The view dimension shaders see.
        dimension: TextureDimension,
    },
    /// A sampler state object.
    Sampler {
        /// `true` for comparison (shadow) samplers.
        comparison: bool,
    },
}

impl DescriptorKind {
    /// A plain filterable 2D texture descriptor.
    pub const fn sampled_2d() -> Self {
        DescriptorKind::SampledTexture {
            dimension: TextureDimension::D2,
            sample_type: TextureSampleKind::Float,
        }
    }

    /// A plain filtering sampler descriptor.
    pub const fn plain_sampler() -> Self {
        DescriptorKind::Sampler { comparison: false }
    }

    /// Whether descriptors of this kind are filled from the sampler list of
    /// a resource group rather than the resource list.
    pub const fn is_sampler(&self) -> bool {
        matches!(self, DescriptorKind::Sampler { .. })
    }
}

/// A contiguous run of descriptors of one kind within a descriptor table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorRange {
    /// The kind of every descriptor in the range.
    pub kind: DescriptorKind,
    /// The first shader binding index the range occupies.
    pub base_binding: u32,
    /// The number of descriptors in the range. Must be non-zero.
    pub count: u32,
    /// The shader stages that may access the range.
    pub visibility: ShaderStageFlags,
}

impl DescriptorRange {
    /// A single-descriptor range visible to all graphics and compute stages.
    pub const fn single(kind: DescriptorKind, base_binding: u32) -> Self {
        Self {
            kind,
            base_binding,
            count: 1,
            visibility: ShaderStageFlags::all(),
        }
    }
}

/// One root parameter of a [`RootSignature`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RootParameter {
    /// A descriptor table composed of one or more ranges.
    DescriptorTable {
        /// The ranges, in declaration order.
        ranges: Vec<DescriptorRange>,
    },
    /// An inline block of push constants.
    PushConstants {
        /// The size of the block in bytes.
        size_bytes: u32,
        /// The shader stages that may read the block.
        visibility: ShaderStageFlags,
    },
}

/// A descriptor used to create a [`RootSignature`].
#[derive(Debug, Clone)]
pub struct RootSignatureDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The root parameters, in slot order.
    pub parameters: Cow<'a, [RootParameter]>,
}

/// A root signature: the fixed declaration of every binding slot a
/// pipeline can access.
///
/// The range/table layout is fixed at creation; every [`ResourceGroup`]
/// bound to one of its slots must match that slot's declared layout
/// element for element.
pub struct RootSignature {
    id: ResourceId,
    label: Option<String>,
    parameters: Vec<RootParameter>,
    native: NativeObject,
}

/// A shared handle to a [`RootSignature`].
pub type RootSignatureHandle = Arc<RootSignature>;

impl RootSignature {
    /// Wraps a backend-native signature object. Called by backend
    /// implementations only.
    pub fn new(descriptor: &RootSignatureDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            parameters: descriptor.parameters.to_vec(),
            native,
        }
    }

    /// The root parameters in slot order.
    pub fn parameters(&self) -> &[RootParameter] {
        &self.parameters
    }

    /// The ranges of the descriptor table at `parameter_index`, or an error
    /// if the slot does not exist or is not a table.
    pub fn descriptor_table(&self, parameter_index: u32) -> Result<&[DescriptorRange], BindingError> {
        match self.parameters.get(parameter_index as usize) {
            None => Err(BindingError::ParameterOutOfRange {
                parameter_index,
                parameter_count: self.parameters.len() as u32,
            }),
            Some(RootParameter::PushConstants { .. }) => {
                Err(BindingError::NotADescriptorTable { parameter_index })
            }
            Some(RootParameter::DescriptorTable { ranges }) => Ok(ranges),
        }
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for RootSignature {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::RootSignature
    }
}

impl fmt::Debug for RootSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RootSignature")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("parameters", &self.parameters.len())
            .finish_non_exhaustive()
    }
}

/// One concrete resource bound into a resource group.
#[derive(Debug, Clone)]
pub enum ResourceBinding {
    /// A buffer binding, with optional sub-range.
    Buffer {
        /// The bound buffer.
        buffer: BufferHandle,
        /// Byte offset into the buffer.
        offset: u64,
        /// Size of the binding; `None` binds from `offset` to the end.
        size: Option<NonZeroU64>,
    },
    /// A whole-texture binding.
    Texture {
        /// The bound texture.
        texture: TextureHandle,
    },
}

impl ResourceBinding {
    /// Binds a whole buffer.
    pub fn whole_buffer(buffer: &BufferHandle) -> Self {
        Self::Buffer {
            buffer: Arc::clone(buffer),
            offset: 0,
            size: None,
        }
    }

    /// Binds a whole texture.
    pub fn whole_texture(texture: &TextureHandle) -> Self {
        Self::Texture {
            texture: Arc::clone(texture),
        }
    }

    fn kind(&self) -> ResourceKind {
        match self {
            ResourceBinding::Buffer { .. } => ResourceKind::Buffer,
            ResourceBinding::Texture { .. } => ResourceKind::Texture,
        }
    }
}

/// A descriptor used to create a [`ResourceGroup`].
#[derive(Debug, Clone)]
pub struct ResourceGroupDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The root parameter index the group binds to.
    pub parameter_index: u32,
    /// The non-sampler resources, in flattened descriptor order.
    pub resources: Cow<'a, [ResourceBinding]>,
    /// The samplers, in flattened sampler-descriptor order.
    pub samplers: Cow<'a, [SamplerHandle]>,
}

/// A flattened descriptor element: which range it came from and the shader
/// binding index it occupies.
///
/// Backends iterate this to build their native binding object: table-based
/// APIs emit one entry per element into a set/bind-group, flat-slot APIs
/// replay one native bind call per element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatDescriptor {
    /// The kind of the descriptor.
    pub kind: DescriptorKind,
    /// The shader binding index (range base + offset within the range).
    pub binding: u32,
    /// The stages that may access it.
    pub visibility: ShaderStageFlags,
}

/// Expands a table's ranges into its ordered flattened element list.
pub fn flatten_table(ranges: &[DescriptorRange]) -> Vec<FlatDescriptor> {
    let mut flat = Vec::new();
    for range in ranges {
        for i in 0..range.count {
            flat.push(FlatDescriptor {
                kind: range.kind,
                binding: range.base_binding + i,
                visibility: range.visibility,
            });
        }
    }
    flat
}

/// Validates a resource-group descriptor against the root signature slot it
/// targets.
///
/// Every backend calls this before building its native binding object, so
/// the mismatch rules are enforced identically everywhere. Checks, in
/// order: the slot exists and is a descriptor table; resource and sampler
/// counts equal the declared descriptor counts; every element matches its
/// descriptor's kind; bound resources carry the usage flag the descriptor
/// kind requires.
pub fn validate_resource_group(
    signature: &RootSignature,
    descriptor: &ResourceGroupDescriptor<'_>,
) -> Result<(), BindingError> {
    let ranges = signature.descriptor_table(descriptor.parameter_index)?;
    let flat = flatten_table(ranges);

    let expected_resources = flat.iter().filter(|d| !d.kind.is_sampler()).count() as u32;
    let expected_samplers = flat.iter().filter(|d| d.kind.is_sampler()).count() as u32;

    if descriptor.resources.len() as u32 != expected_resources {
        return Err(BindingError::ResourceCountMismatch {
            parameter_index: descriptor.parameter_index,
            expected: expected_resources,
            actual: descriptor.resources.len() as u32,
        });
    }
    if descriptor.samplers.len() as u32 != expected_samplers {
        return Err(BindingError::SamplerCountMismatch {
            parameter_index: descriptor.parameter_index,
            expected: expected_samplers,
            actual: descriptor.samplers.len() as u32,
        });
    }

    let mut resources = descriptor.resources.iter();
    let mut samplers = descriptor.samplers.iter();
    for (element, descriptor_slot) in flat.iter().enumerate() {
        let element = element as u32;
        if let DescriptorKind::Sampler { comparison } = descriptor_slot.kind {
            let sampler = samplers.next().expect("count was checked above");
            if sampler.is_comparison() != comparison {
                return Err(BindingError::SamplerComparisonMismatch { element });
            }
        } else {
            let binding = resources.next().expect("count was checked above");
            check_element(element, descriptor_slot.kind, binding)?;
        }
    }

    Ok(())
}

fn check_element(
    element: u32,
    expected: DescriptorKind,
    binding: &ResourceBinding,
) -> Result<(), BindingError> {
    match (expected, binding) {
        (DescriptorKind::UniformBuffer, ResourceBinding::Buffer { buffer, .. }) => {
            if !buffer.usage().contains(BufferUsage::UNIFORM) {
                return Err(BindingError::MissingUsage {
                    element,
                    required: "UNIFORM",
                });
            }
            Ok(())
        }
        (DescriptorKind::StorageBuffer { .. }, ResourceBinding::Buffer { buffer, .. }) => {
            if !buffer.usage().contains(BufferUsage::STORAGE) {
                return Err(BindingError::MissingUsage {
                    element,
                    required: "STORAGE",
                });
            }
            Ok(())
        }
        (
            DescriptorKind::SampledTexture {
                dimension,
                sample_type,
            },
            ResourceBinding::Texture { texture },
        ) => {
            if !texture.usage().contains(TextureUsage::TEXTURE_BINDING) {
                return Err(BindingError::MissingUsage {
                    element,
                    required: "TEXTURE_BINDING",
                });
            }
            if texture.dimension() != dimension {
                return Err(BindingError::TextureDimensionMismatch { element });
            }
            if (sample_type == TextureSampleKind::Depth) != texture.format().is_depth_format() {
                return Err(BindingError::SampleTypeMismatch { element });
            }
            Ok(())
        }
        (
            DescriptorKind::StorageTexture {
                format, dimension, ..
            },
            ResourceBinding::Texture { texture },
        ) => {
            if !texture.usage().contains(TextureUsage::STORAGE_BINDING) {
                return Err(BindingError::MissingUsage {
                    element,
                    required: "STORAGE_BINDING",
                });
            }
            if texture.dimension() != dimension {
                return Err(BindingError::TextureDimensionMismatch { element });
            }
            if texture.format() != format {
                return Err(BindingError::TextureFormatMismatch { element });
            }
            Ok(())
        }
        (expected, binding) => Err(BindingError::KindMismatch {
            element,
            expected,
            found: binding.kind(),
        }),
    }
}

/// An immutable, backend-prepared binding of concrete resources to one
/// root-signature slot.
///
/// Holds handles to its signature and every bound resource, keeping them
/// alive for as long as the group exists.
pub struct ResourceGroup {
    id: ResourceId,
    label: Option<String>,
    signature: RootSignatureHandle,
    parameter_index: u32,
    resources: Vec<ResourceBinding>,
    samplers: Vec<SamplerHandle>,
    native: NativeObject,
}

/// A shared handle to a [`ResourceGroup`].
pub type ResourceGroupHandle = Arc<ResourceGroup>;

impl ResourceGroup {
    /// Wraps a backend-native binding object. Called by backend
    /// implementations only, after [`validate_resource_group`] has passed.
    pub fn new(
        signature: &RootSignatureHandle,
        descriptor: &ResourceGroupDescriptor<'_>,
        native: NativeObject,
    ) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            signature: Arc::clone(signature),
            parameter_index: descriptor.parameter_index,
            resources: descriptor.resources.to_vec(),
            samplers: descriptor.samplers.to_vec(),
            native,
        }
    }

    /// The root signature the group was validated against.
    pub fn signature(&self) -> &RootSignatureHandle {
        &self.signature
    }

    /// The root parameter index the group binds to.
    pub fn parameter_index(&self) -> u32 {
        self.parameter_index
    }

    /// The bound non-sampler resources, in flattened descriptor order.
    pub fn resources(&self) -> &[ResourceBinding] {
        &self.resources
    }

    /// The bound samplers, in flattened sampler-descriptor order.
    pub fn samplers(&self) -> &[SamplerHandle] {
        &self.samplers
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for ResourceGroup {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::ResourceGroup
    }
}

impl fmt::Debug for ResourceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGroup")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("parameter_index", &self.parameter_index)
            .field("resources", &self.resources.len())
            .field("samplers", &self.samplers.len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::api::buffer::{Buffer, BufferDescriptor};

    fn signature(parameters: Vec<RootParameter>) -> RootSignature {
        RootSignature::new(
            &RootSignatureDescriptor {
                label: None,
                parameters: Cow::Owned(parameters),
            },
            Box::new(()),
        )
    }

    fn uniform_buffer(size: u64) -> BufferHandle {
        Arc::new(Buffer::new(
            &BufferDescriptor {
                label: None,
                size,
                usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
            },
            Box::new(()),
        ))
    }

    #[test]
    fn flatten_expands_ranges_in_order() {
        let ranges = [
            DescriptorRange {
                kind: DescriptorKind::UniformBuffer,
                base_binding: 0,
                count: 2,
                visibility: ShaderStageFlags::VERTEX,
            },
            DescriptorRange::single(DescriptorKind::plain_sampler(), 2),
        ];
        let flat = flatten_table(&ranges);
        assert_eq!(flat.len(), 3);
        assert_eq!(flat[0].binding, 0);
        assert_eq!(flat[1].binding, 1);
        assert!(flat[2].kind.is_sampler());
    }

    #[test]
    fn group_with_matching_arity_validates() {
        let sig = signature(vec![RootParameter::DescriptorTable {
            ranges: vec![DescriptorRange::single(DescriptorKind::UniformBuffer, 0)],
        }]);
        let buffer = uniform_buffer(32);
        let descriptor = ResourceGroupDescriptor {
            label: None,
            parameter_index: 0,
            resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
            samplers: Cow::Borrowed(&[]),
        };
        assert!(validate_resource_group(&sig, &descriptor).is_ok());
    }

    #[test]
    fn group_with_wrong_arity_fails_deterministically() {
        let sig = signature(vec![RootParameter::DescriptorTable {
            ranges: vec![DescriptorRange {
                kind: DescriptorKind::UniformBuffer,
                base_binding: 0,
                count: 2,
                visibility: ShaderStageFlags::all(),
            }],
        }]);
        let buffer = uniform_buffer(16);
        let descriptor = ResourceGroupDescriptor {
            label: None,
            parameter_index: 0,
            resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
            samplers: Cow::Borrowed(&[]),
        };
        let err = validate_resource_group(&sig, &descriptor).unwrap_err();
        assert_eq!(
            err,
            BindingError::ResourceCountMismatch {
                parameter_index: 0,
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn group_against_push_constant_slot_fails() {
        let sig = signature(vec![RootParameter::PushConstants {
            size_bytes: 16,
            visibility: ShaderStageFlags::VERTEX,
        }]);
        let buffer = uniform_buffer(16);
        let descriptor = ResourceGroupDescriptor {
            label: None,
            parameter_index: 0,
            resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
            samplers: Cow::Borrowed(&[]),
        };
        assert_eq!(
            validate_resource_group(&sig, &descriptor).unwrap_err(),
            BindingError::NotADescriptorTable { parameter_index: 0 }
        );
    }

    #[test]
    fn storage_descriptor_requires_storage_usage() {
        let sig = signature(vec![RootParameter::DescriptorTable {
            ranges: vec![DescriptorRange::single(
                DescriptorKind::StorageBuffer { read_only: false },
                0,
            )],
        }]);
        // Uniform-only usage cannot satisfy a storage descriptor.
        let buffer = uniform_buffer(64);
        let descriptor = ResourceGroupDescriptor {
            label: None,
            parameter_index: 0,
            resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
            samplers: Cow::Borrowed(&[]),
        };
        assert_eq!(
            validate_resource_group(&sig, &descriptor).unwrap_err(),
            BindingError::MissingUsage {
                element: 0,
                required: "STORAGE",
            }
        );
    }

    #[test]
    fn bound_resources_stay_alive_through_the_group() {
        let sig = Arc::new(signature(vec![RootParameter::DescriptorTable {
            ranges: vec![DescriptorRange::single(DescriptorKind::UniformBuffer, 0)],
        }]));
        let buffer = uniform_buffer(32);
        let group = ResourceGroup::new(
            &sig,
            &ResourceGroupDescriptor {
                label: None,
                parameter_index: 0,
                resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&buffer)]),
                samplers: Cow::Borrowed(&[]),
            },
            Box::new(()),
        );
        // The caller's handle plus the group's clone.
        assert_eq!(Arc::strong_count(&buffer), 2);
        drop(group);
        assert_eq!(Arc::strong_count(&buffer), 1);
    }
}
