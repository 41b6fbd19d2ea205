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

//! Defines the hierarchy of error types for the rendering subsystem.
//!
//! Binding mismatches and pipeline/render-target incompatibilities are
//! surfaced as deterministic `Err` values at resource-creation or submit
//! time, never as panics.

use crate::rhi::api::binding::DescriptorKind;
use crate::rhi::api::resource::ResourceKind;
use crate::rhi::api::shader::ShaderStage;
use std::fmt;

/// An error produced while validating a resource group against the
/// descriptor ranges its root-signature slot declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// The root-parameter index does not exist in the root signature.
    ParameterOutOfRange {
        /// The requested parameter index.
        parameter_index: u32,
        /// The number of parameters the signature declares.
        parameter_count: u32,
    },
    /// The addressed root parameter is an inline-constant block, not a
    /// descriptor table, so no resource group can be bound to it.
    NotADescriptorTable {
        /// The requested parameter index.
        parameter_index: u32,
    },
    /// The number of supplied resources does not match the descriptor count
    /// declared by the slot's ranges.
    ResourceCountMismatch {
        /// The parameter index being bound.
        parameter_index: u32,
        /// The descriptor count the ranges declare.
        expected: u32,
        /// The number of resources supplied.
        actual: u32,
    },
    /// The number of supplied samplers does not match the sampler descriptor
    /// count declared by the slot's ranges.
    SamplerCountMismatch {
        /// The parameter index being bound.
        parameter_index: u32,
        /// The sampler descriptor count the ranges declare.
        expected: u32,
        /// The number of samplers supplied.
        actual: u32,
    },
    /// A supplied resource does not match the kind its descriptor declares
    /// (e.g., a texture bound where a uniform buffer is expected).
    KindMismatch {
        /// Index of the element within the flattened descriptor list.
        element: u32,
        /// The descriptor kind declared by the range.
        expected: DescriptorKind,
        /// The kind of resource actually supplied.
        found: ResourceKind,
    },
    /// A supplied resource was not created with the usage its descriptor
    /// requires (e.g., a buffer without `STORAGE` usage bound to a
    /// read-write storage descriptor).
    MissingUsage {
        /// Index of the element within the flattened descriptor list.
        element: u32,
        /// A description of the required usage flag.
        required: &'static str,
    },
    /// A supplied texture's dimension differs from the one the descriptor
    /// declares.
    TextureDimensionMismatch {
        /// Index of the element within the flattened descriptor list.
        element: u32,
    },
    /// A supplied texture's format differs from the storage format the
    /// descriptor declares.
    TextureFormatMismatch {
        /// Index of the element within the flattened descriptor list.
        element: u32,
    },
    /// A depth sample type was declared for a color texture, or vice versa.
    SampleTypeMismatch {
        /// Index of the element within the flattened descriptor list.
        element: u32,
    },
    /// A comparison sampler was supplied for a filtering descriptor, or
    /// vice versa.
    SamplerComparisonMismatch {
        /// Index of the element within the flattened descriptor list.
        element: u32,
    },
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::ParameterOutOfRange {
                parameter_index,
                parameter_count,
            } => write!(
                f,
                "Root parameter {parameter_index} is out of range (signature declares {parameter_count})"
            ),
            BindingError::NotADescriptorTable { parameter_index } => write!(
                f,
                "Root parameter {parameter_index} is not a descriptor table"
            ),
            BindingError::ResourceCountMismatch {
                parameter_index,
                expected,
                actual,
            } => write!(
                f,
                "Resource group for parameter {parameter_index} supplies {actual} resources but the ranges declare {expected}"
            ),
            BindingError::SamplerCountMismatch {
                parameter_index,
                expected,
                actual,
            } => write!(
                f,
                "Resource group for parameter {parameter_index} supplies {actual} samplers but the ranges declare {expected}"
            ),
            BindingError::KindMismatch {
                element,
                expected,
                found,
            } => write!(
                f,
                "Descriptor element {element} expects {expected:?} but a {found:?} resource was supplied"
            ),
            BindingError::MissingUsage { element, required } => write!(
                f,
                "Descriptor element {element} requires a resource created with {required} usage"
            ),
            BindingError::TextureDimensionMismatch { element } => write!(
                f,
                "Descriptor element {element} was supplied a texture of a different dimension"
            ),
            BindingError::TextureFormatMismatch { element } => write!(
                f,
                "Descriptor element {element} was supplied a texture of a different format"
            ),
            BindingError::SampleTypeMismatch { element } => write!(
                f,
                "Descriptor element {element} sample type does not match the supplied texture"
            ),
            BindingError::SamplerComparisonMismatch { element } => write!(
                f,
                "Descriptor element {element} comparison mode does not match the supplied sampler"
            ),
        }
    }
}

impl std::error::Error for BindingError {}

/// An error related to the creation or management of a pipeline state object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// A patch-list topology was requested without both tessellation stages.
    MissingTessellationStage {
        /// The missing logical stage.
        stage: ShaderStage,
    },
    /// More simultaneous color targets were requested than the device
    /// supports.
    TooManyColorTargets {
        /// The number of color targets in the descriptor.
        requested: u32,
        /// The number the device capability reports.
        supported: u32,
    },
    /// A shader module was supplied for a stage it was not compiled for.
    StageMismatch {
        /// The stage the pipeline slot expects.
        expected: ShaderStage,
        /// The stage the module was created for.
        found: ShaderStage,
    },
    /// The pipeline's color targets, depth format, or sample count do not
    /// match the render pass it was declared compatible with.
    IncompatibleRenderPass(String),
    /// The backend does not support a feature the descriptor requires.
    FeatureNotSupported(String),
    /// The graphics backend failed to compile the full pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::MissingTessellationStage { stage } => write!(
                f,
                "Patch-list topology requires a {stage:?} shader stage, which is missing"
            ),
            PipelineError::TooManyColorTargets {
                requested,
                supported,
            } => write!(
                f,
                "Pipeline requests {requested} color targets but the device supports {supported}"
            ),
            PipelineError::StageMismatch { expected, found } => write!(
                f,
                "Shader module compiled for the {found:?} stage supplied where {expected:?} is required"
            ),
            PipelineError::IncompatibleRenderPass(msg) => {
                write!(f, "Pipeline is incompatible with its render pass: {msg}")
            }
            PipelineError::FeatureNotSupported(msg) => {
                write!(f, "Feature not supported: {msg}")
            }
            PipelineError::CompilationFailed { label, details } => write!(
                f,
                "Pipeline compilation failed for '{}': {}",
                label.as_deref().unwrap_or("Unknown"),
                details
            ),
        }
    }
}

impl std::error::Error for PipelineError {}

/// An error related to the creation, loading, or compilation of a shader
/// module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    /// The shader source failed to compile into a backend-specific module.
    CompilationError {
        /// A descriptive label for the shader, if available.
        label: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// The backend cannot execute modules for this logical stage at all.
    UnsupportedStage {
        /// The rejected stage.
        stage: ShaderStage,
    },
}

impl fmt::Display for ShaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderError::CompilationError { label, details } => {
                write!(f, "Shader compilation failed for '{label}': {details}")
            }
            ShaderError::UnsupportedStage { stage } => {
                write!(f, "Backend does not support the {stage:?} shader stage")
            }
        }
    }
}

impl std::error::Error for ShaderError {}

/// An error produced while validating a framebuffer against its render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramebufferError {
    /// The framebuffer supplies a different number of color attachments than
    /// its render pass declares.
    AttachmentCountMismatch {
        /// The attachment count the render pass declares.
        expected: u32,
        /// The attachment count supplied.
        actual: u32,
    },
    /// An attachment's texture format differs from the declared format.
    FormatMismatch {
        /// Index of the attachment.
        index: u32,
        /// Human-readable description of declared vs. supplied format.
        details: String,
    },
    /// An attachment's sample count differs from the render pass.
    SampleCountMismatch {
        /// Index of the attachment.
        index: u32,
    },
    /// An attachment texture was created without render-attachment usage.
    NotRenderable {
        /// Index of the attachment.
        index: u32,
    },
    /// The attachments do not all share the same pixel dimensions.
    ExtentMismatch,
    /// A depth-stencil attachment was supplied/omitted contrary to the
    /// render pass declaration.
    DepthStencilMismatch,
}

impl fmt::Display for FramebufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramebufferError::AttachmentCountMismatch { expected, actual } => write!(
                f,
                "Framebuffer supplies {actual} color attachments but the render pass declares {expected}"
            ),
            FramebufferError::FormatMismatch { index, details } => {
                write!(f, "Color attachment {index} format mismatch: {details}")
            }
            FramebufferError::SampleCountMismatch { index } => {
                write!(f, "Attachment {index} sample count differs from the render pass")
            }
            FramebufferError::NotRenderable { index } => write!(
                f,
                "Attachment {index} was created without render-attachment usage"
            ),
            FramebufferError::ExtentMismatch => {
                write!(f, "Framebuffer attachments do not share the same extent")
            }
            FramebufferError::DepthStencilMismatch => write!(
                f,
                "Depth-stencil attachment does not match the render pass declaration"
            ),
        }
    }
}

impl std::error::Error for FramebufferError {}

/// An error related to the creation or use of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// A binding-model validation failure.
    Binding(BindingError),
    /// A pipeline-specific error occurred.
    Pipeline(PipelineError),
    /// A shader-specific error occurred.
    Shader(ShaderError),
    /// A framebuffer/render-pass validation failure.
    Framebuffer(FramebufferError),
    /// The descriptor itself is malformed (empty ranges, zero sizes, ...).
    InvalidDescriptor(String),
    /// An attempt was made to access a resource out of its bounds.
    OutOfBounds,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::Binding(err) => write!(f, "Binding validation error: {err}"),
            ResourceError::Pipeline(err) => write!(f, "Pipeline resource error: {err}"),
            ResourceError::Shader(err) => write!(f, "Shader resource error: {err}"),
            ResourceError::Framebuffer(err) => write!(f, "Framebuffer error: {err}"),
            ResourceError::InvalidDescriptor(msg) => write!(f, "Invalid descriptor: {msg}"),
            ResourceError::OutOfBounds => write!(f, "Resource access out of bounds."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
        }
    }
}

impl std::error::Error for ResourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResourceError::Binding(err) => Some(err),
            ResourceError::Pipeline(err) => Some(err),
            ResourceError::Shader(err) => Some(err),
            ResourceError::Framebuffer(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BindingError> for ResourceError {
    fn from(err: BindingError) -> Self {
        ResourceError::Binding(err)
    }
}

impl From<PipelineError> for ResourceError {
    fn from(err: PipelineError) -> Self {
        ResourceError::Pipeline(err)
    }
}

impl From<ShaderError> for ResourceError {
    fn from(err: ShaderError) -> Self {
        ResourceError::Shader(err)
    }
}

impl From<FramebufferError> for ResourceError {
    fn from(err: FramebufferError) -> Self {
        ResourceError::Framebuffer(err)
    }
}

/// An error produced while validating or replaying a recorded command
/// buffer at submit time.
#[derive(Debug)]
pub enum SubmitError {
    /// A graphics command was recorded before a graphics root signature was
    /// set.
    MissingGraphicsRootSignature,
    /// A compute command was recorded before a compute root signature was
    /// set.
    MissingComputeRootSignature,
    /// A draw was recorded with no graphics pipeline bound.
    MissingGraphicsPipeline,
    /// A dispatch was recorded with no compute pipeline bound.
    MissingComputePipeline,
    /// A draw or clear was recorded with no render target set.
    MissingRenderTarget,
    /// A draw needs vertex input but no vertex array is bound.
    MissingVertexArray,
    /// An indexed draw was recorded against a vertex array without an index
    /// buffer.
    MissingIndexBuffer,
    /// A bound pipeline belongs to a different root signature than the one
    /// currently set.
    RootSignatureMismatch,
    /// A resource group was bound to a slot inconsistent with the active
    /// root signature.
    Binding(BindingError),
    /// The active pipeline's render pass is incompatible with the bound
    /// render target.
    IncompatibleRenderTarget(String),
    /// `end_debug_event` without a matching `begin_debug_event`, or a
    /// buffer submitted with unbalanced debug events.
    UnbalancedDebugEvent,
    /// The backend failed while replaying the translated commands.
    Backend(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::MissingGraphicsRootSignature => {
                write!(f, "No graphics root signature is set")
            }
            SubmitError::MissingComputeRootSignature => {
                write!(f, "No compute root signature is set")
            }
            SubmitError::MissingGraphicsPipeline => write!(f, "No graphics pipeline is bound"),
            SubmitError::MissingComputePipeline => write!(f, "No compute pipeline is bound"),
            SubmitError::MissingRenderTarget => write!(f, "No render target is set"),
            SubmitError::MissingVertexArray => {
                write!(f, "Pipeline consumes vertex input but no vertex array is bound")
            }
            SubmitError::MissingIndexBuffer => {
                write!(f, "Indexed draw recorded against a vertex array without an index buffer")
            }
            SubmitError::RootSignatureMismatch => write!(
                f,
                "Bound pipeline was created for a different root signature than the active one"
            ),
            SubmitError::Binding(err) => write!(f, "Binding mismatch at submit: {err}"),
            SubmitError::IncompatibleRenderTarget(msg) => {
                write!(f, "Pipeline is incompatible with the bound render target: {msg}")
            }
            SubmitError::UnbalancedDebugEvent => {
                write!(f, "Unbalanced debug event markers in command buffer")
            }
            SubmitError::Backend(msg) => write!(f, "Backend submission error: {msg}"),
        }
    }
}

impl std::error::Error for SubmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SubmitError::Binding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BindingError> for SubmitError {
    fn from(err: BindingError) -> Self {
        SubmitError::Binding(err)
    }
}

/// A high-level error that can occur within the rendering system.
#[derive(Debug)]
pub enum RenderError {
    /// A failure occurred during the initialization of the graphics backend.
    InitializationFailed(String),
    /// No registered backend factory matches the requested name.
    UnknownBackend {
        /// The backend name that failed to resolve.
        name: String,
    },
    /// An error occurred while managing a GPU resource.
    Resource(ResourceError),
    /// An error occurred while submitting a command buffer.
    Submit(SubmitError),
    /// Failed to acquire the next frame from the swap chain for rendering.
    SurfaceAcquisitionFailed(String),
    /// The graphics device was lost (e.g., GPU driver crashed or was
    /// updated). Typically requires reinitialization.
    DeviceLost,
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InitializationFailed(msg) => {
                write!(f, "Failed to initialize graphics backend: {msg}")
            }
            RenderError::UnknownBackend { name } => {
                write!(f, "No graphics backend is registered under the name '{name}'")
            }
            RenderError::Resource(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::Submit(err) => {
                write!(f, "Command buffer submission failed: {err}")
            }
            RenderError::SurfaceAcquisitionFailed(msg) => {
                write!(f, "Failed to acquire surface for rendering: {msg}")
            }
            RenderError::DeviceLost => write!(
                f,
                "The graphics device was lost and needs to be reinitialized."
            ),
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Resource(err) => Some(err),
            RenderError::Submit(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::Resource(err)
    }
}

impl From<SubmitError> for RenderError {
    fn from(err: SubmitError) -> Self {
        RenderError::Submit(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn binding_error_display() {
        let err = BindingError::ResourceCountMismatch {
            parameter_index: 1,
            expected: 3,
            actual: 2,
        };
        assert_eq!(
            format!("{err}"),
            "Resource group for parameter 1 supplies 2 resources but the ranges declare 3"
        );
    }

    #[test]
    fn pipeline_error_display() {
        let err = PipelineError::TooManyColorTargets {
            requested: 4,
            supported: 1,
        };
        assert_eq!(
            format!("{err}"),
            "Pipeline requests 4 color targets but the device supports 1"
        );
    }

    #[test]
    fn resource_error_wraps_binding_error() {
        let binding = BindingError::NotADescriptorTable { parameter_index: 0 };
        let res: ResourceError = binding.into();
        assert_eq!(
            format!("{res}"),
            "Binding validation error: Root parameter 0 is not a descriptor table"
        );
        assert!(res.source().is_some());
    }

    #[test]
    fn render_error_wraps_submit_error() {
        let submit: SubmitError = BindingError::ParameterOutOfRange {
            parameter_index: 7,
            parameter_count: 2,
        }
        .into();
        let render: RenderError = submit.into();
        assert!(format!("{render}").starts_with("Command buffer submission failed"));
        assert!(render.source().unwrap().source().is_some());
    }
}
