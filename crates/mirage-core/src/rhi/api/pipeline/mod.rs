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

//! Graphics and compute pipeline state objects.
//!
//! A pipeline state object is an immutable, validated bundle of shader
//! stages and fixed-function state. Validation happens in two layers: the
//! backend-independent rules live here ([`validate_graphics_pipeline`]) and
//! run identically on every backend; backend-specific rejection (missing
//! tessellation support, shader compilation failures) happens inside the
//! backend's create call. Creation failure is an `Err`, never a panic.

pub mod state;

pub use state::{
    BlendComponent, BlendFactor, BlendOperation, BlendState, ColorTargetState, ColorWrites,
    CullMode, DepthBias, DepthStencilState, FrontFace, PolygonMode, PrimitiveTopology,
    RasterizerState, StencilFaceState, StencilOperation,
};

use crate::rhi::api::binding::RootSignatureHandle;
use crate::rhi::api::pass::RenderPassHandle;
use crate::rhi::api::resource::{NativeObject, ResourceId, ResourceKind, RhiResource};
use crate::rhi::api::shader::{ShaderModuleHandle, ShaderStage};
use crate::rhi::api::texture::SampleCount;
use crate::rhi::api::vertex::VertexBufferLayout;
use crate::rhi::capabilities::Capabilities;
use crate::rhi::error::PipelineError;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// The shader stage set of a graphics pipeline.
///
/// The four pre-rasterization stages follow the logical model: backends
/// whose native tessellation model differs merge or split the two
/// tessellation stages internally.
#[derive(Debug, Clone)]
pub struct GraphicsShaderStages {
    /// The mandatory vertex stage.
    pub vertex: ShaderModuleHandle,
    /// The tessellation control (hull) stage.
    pub tessellation_control: Option<ShaderModuleHandle>,
    /// The tessellation evaluation (domain) stage.
    pub tessellation_evaluation: Option<ShaderModuleHandle>,
    /// The geometry stage.
    pub geometry: Option<ShaderModuleHandle>,
    /// The fragment stage; `None` for depth-only pipelines.
    pub fragment: Option<ShaderModuleHandle>,
}

impl GraphicsShaderStages {
    /// The common vertex + fragment pair.
    pub fn vertex_fragment(vertex: &ShaderModuleHandle, fragment: &ShaderModuleHandle) -> Self {
        Self {
            vertex: Arc::clone(vertex),
            tessellation_control: None,
            tessellation_evaluation: None,
            geometry: None,
            fragment: Some(Arc::clone(fragment)),
        }
    }
}

/// A complete descriptor for a graphics pipeline.
#[derive(Debug, Clone)]
pub struct GraphicsPipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The root signature declaring every binding slot the pipeline uses.
    pub root_signature: RootSignatureHandle,
    /// The shader stage set.
    pub stages: GraphicsShaderStages,
    /// The vertex buffer layouts, in input-slot order.
    pub vertex_layouts: Cow<'a, [VertexBufferLayout]>,
    /// Primitive assembly and rasterization state.
    pub rasterizer: RasterizerState,
    /// Depth/stencil state; `None` disables both tests.
    pub depth_stencil: Option<DepthStencilState>,
    /// The states of all color targets the pipeline renders to.
    pub color_targets: Cow<'a, [ColorTargetState]>,
    /// The number of samples per pixel.
    pub sample_count: SampleCount,
    /// The render pass the pipeline is compatible with.
    pub render_pass: RenderPassHandle,
}

/// Backend-independent validation of a graphics pipeline descriptor.
///
/// Checks, in order: each supplied module was compiled for the stage slot
/// it occupies; patch topology implies both tessellation stages; stage and
/// color-target counts fit the device capabilities; the color targets,
/// depth format, and sample count match the declared render pass.
pub fn validate_graphics_pipeline(
    descriptor: &GraphicsPipelineDescriptor<'_>,
    capabilities: &Capabilities,
) -> Result<(), PipelineError> {
    check_stage(&descriptor.stages.vertex, ShaderStage::Vertex)?;
    if let Some(module) = &descriptor.stages.tessellation_control {
        check_stage(module, ShaderStage::TessellationControl)?;
    }
    if let Some(module) = &descriptor.stages.tessellation_evaluation {
        check_stage(module, ShaderStage::TessellationEvaluation)?;
    }
    if let Some(module) = &descriptor.stages.geometry {
        check_stage(module, ShaderStage::Geometry)?;
    }
    if let Some(module) = &descriptor.stages.fragment {
        check_stage(module, ShaderStage::Fragment)?;
    }

    if descriptor.rasterizer.topology.is_patch_list() {
        if descriptor.stages.tessellation_control.is_none() {
            return Err(PipelineError::MissingTessellationStage {
                stage: ShaderStage::TessellationControl,
            });
        }
        if descriptor.stages.tessellation_evaluation.is_none() {
            return Err(PipelineError::MissingTessellationStage {
                stage: ShaderStage::TessellationEvaluation,
            });
        }
    }

    let uses_tessellation = descriptor.stages.tessellation_control.is_some()
        || descriptor.stages.tessellation_evaluation.is_some();
    if uses_tessellation && !capabilities.supports_tessellation {
        return Err(PipelineError::FeatureNotSupported(
            "tessellation shader stages".into(),
        ));
    }
    if descriptor.stages.geometry.is_some() && !capabilities.supports_geometry_shaders {
        return Err(PipelineError::FeatureNotSupported(
            "geometry shader stage".into(),
        ));
    }

    let target_count = descriptor.color_targets.len() as u32;
    if target_count > capabilities.max_color_attachments {
        return Err(PipelineError::TooManyColorTargets {
            requested: target_count,
            supported: capabilities.max_color_attachments,
        });
    }

    let pass = &descriptor.render_pass;
    if pass.color_formats().len() != descriptor.color_targets.len() {
        return Err(PipelineError::IncompatibleRenderPass(format!(
            "pipeline has {} color targets, render pass declares {}",
            descriptor.color_targets.len(),
            pass.color_formats().len()
        )));
    }
    for (index, (target, format)) in descriptor
        .color_targets
        .iter()
        .zip(pass.color_formats())
        .enumerate()
    {
        if target.format != *format {
            return Err(PipelineError::IncompatibleRenderPass(format!(
                "color target {index} format {:?} differs from render pass format {:?}",
                target.format, format
            )));
        }
    }
    let pipeline_depth = descriptor.depth_stencil.as_ref().map(|ds| ds.format);
    if pipeline_depth != pass.depth_stencil_format() {
        return Err(PipelineError::IncompatibleRenderPass(format!(
            "pipeline depth format {:?} differs from render pass depth format {:?}",
            pipeline_depth,
            pass.depth_stencil_format()
        )));
    }
    if descriptor.sample_count != pass.sample_count() {
        return Err(PipelineError::IncompatibleRenderPass(format!(
            "pipeline sample count {:?} differs from render pass sample count {:?}",
            descriptor.sample_count,
            pass.sample_count()
        )));
    }

    Ok(())
}

fn check_stage(module: &ShaderModuleHandle, expected: ShaderStage) -> Result<(), PipelineError> {
    if module.stage() != expected {
        return Err(PipelineError::StageMismatch {
            expected,
            found: module.stage(),
        });
    }
    Ok(())
}

/// An immutable, validated graphics pipeline state object.
///
/// Holds handles to its root signature, shader modules, and render pass.
pub struct GraphicsPipeline {
    id: ResourceId,
    label: Option<String>,
    root_signature: RootSignatureHandle,
    stages: GraphicsShaderStages,
    vertex_layouts: Vec<VertexBufferLayout>,
    rasterizer: RasterizerState,
    depth_stencil: Option<DepthStencilState>,
    color_targets: Vec<ColorTargetState>,
    sample_count: SampleCount,
    render_pass: RenderPassHandle,
    native: NativeObject,
}

/// A shared handle to a [`GraphicsPipeline`].
pub type GraphicsPipelineHandle = Arc<GraphicsPipeline>;

impl GraphicsPipeline {
    /// Wraps a backend-native pipeline object. Called by backend
    /// implementations only, after [`validate_graphics_pipeline`] passed.
    pub fn new(descriptor: &GraphicsPipelineDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            root_signature: Arc::clone(&descriptor.root_signature),
            stages: descriptor.stages.clone(),
            vertex_layouts: descriptor.vertex_layouts.to_vec(),
            rasterizer: descriptor.rasterizer,
            depth_stencil: descriptor.depth_stencil.clone(),
            color_targets: descriptor.color_targets.to_vec(),
            sample_count: descriptor.sample_count,
            render_pass: Arc::clone(&descriptor.render_pass),
            native,
        }
    }

    /// The root signature the pipeline was created against.
    pub fn root_signature(&self) -> &RootSignatureHandle {
        &self.root_signature
    }

    /// The shader stage set.
    pub fn stages(&self) -> &GraphicsShaderStages {
        &self.stages
    }

    /// The vertex buffer layouts the pipeline consumes.
    pub fn vertex_layouts(&self) -> &[VertexBufferLayout] {
        &self.vertex_layouts
    }

    /// The rasterizer state.
    pub fn rasterizer(&self) -> &RasterizerState {
        &self.rasterizer
    }

    /// The depth/stencil state, if enabled.
    pub fn depth_stencil(&self) -> Option<&DepthStencilState> {
        self.depth_stencil.as_ref()
    }

    /// The color target states.
    pub fn color_targets(&self) -> &[ColorTargetState] {
        &self.color_targets
    }

    /// The multisample count.
    pub fn sample_count(&self) -> SampleCount {
        self.sample_count
    }

    /// The render pass the pipeline is compatible with.
    pub fn render_pass(&self) -> &RenderPassHandle {
        &self.render_pass
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for GraphicsPipeline {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::GraphicsPipeline
    }
}

impl fmt::Debug for GraphicsPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsPipeline")
            .field("id", &self.id)
            .field("label", &self.label)
            .field("topology", &self.rasterizer.topology)
            .field("color_targets", &self.color_targets.len())
            .finish_non_exhaustive()
    }
}

/// A complete descriptor for a compute pipeline.
#[derive(Debug, Clone)]
pub struct ComputePipelineDescriptor<'a> {
    /// An optional debug label.
    pub label: Option<Cow<'a, str>>,
    /// The root signature declaring every binding slot the pipeline uses.
    pub root_signature: RootSignatureHandle,
    /// The compute shader module.
    pub module: ShaderModuleHandle,
}

/// Backend-independent validation of a compute pipeline descriptor.
pub fn validate_compute_pipeline(
    descriptor: &ComputePipelineDescriptor<'_>,
    capabilities: &Capabilities,
) -> Result<(), PipelineError> {
    if !capabilities.supports_compute {
        return Err(PipelineError::FeatureNotSupported(
            "compute pipelines".into(),
        ));
    }
    if descriptor.module.stage() != ShaderStage::Compute {
        return Err(PipelineError::StageMismatch {
            expected: ShaderStage::Compute,
            found: descriptor.module.stage(),
        });
    }
    Ok(())
}

/// An immutable, validated compute pipeline state object.
pub struct ComputePipeline {
    id: ResourceId,
    label: Option<String>,
    root_signature: RootSignatureHandle,
    module: ShaderModuleHandle,
    native: NativeObject,
}

/// A shared handle to a [`ComputePipeline`].
pub type ComputePipelineHandle = Arc<ComputePipeline>;

impl ComputePipeline {
    /// Wraps a backend-native pipeline object. Called by backend
    /// implementations only, after [`validate_compute_pipeline`] passed.
    pub fn new(descriptor: &ComputePipelineDescriptor<'_>, native: NativeObject) -> Self {
        Self {
            id: ResourceId::allocate(),
            label: descriptor.label.as_deref().map(String::from),
            root_signature: Arc::clone(&descriptor.root_signature),
            module: Arc::clone(&descriptor.module),
            native,
        }
    }

    /// The root signature the pipeline was created against.
    pub fn root_signature(&self) -> &RootSignatureHandle {
        &self.root_signature
    }

    /// The compute shader module.
    pub fn module(&self) -> &ShaderModuleHandle {
        &self.module
    }

    /// Downcasts the backend-native payload.
    pub fn native<T: 'static>(&self) -> Option<&T> {
        self.native.downcast_ref()
    }
}

impl RhiResource for ComputePipeline {
    fn resource_id(&self) -> ResourceId {
        self.id
    }

    fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    fn kind(&self) -> ResourceKind {
        ResourceKind::ComputePipeline
    }
}

impl fmt::Debug for ComputePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputePipeline")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rhi::api::binding::{RootSignature, RootSignatureDescriptor};
    use crate::rhi::api::pass::{RenderPass, RenderPassDescriptor};
    use crate::rhi::api::shader::{ShaderModule, ShaderModuleDescriptor, ShaderSource};
    use crate::rhi::api::texture::TextureFormat;

    fn module(stage: ShaderStage) -> ShaderModuleHandle {
        Arc::new(ShaderModule::new(
            &ShaderModuleDescriptor {
                label: None,
                stage,
                entry_point: Cow::Borrowed("main"),
                source: ShaderSource::Wgsl(Cow::Borrowed("")),
            },
            Box::new(()),
        ))
    }

    fn signature() -> RootSignatureHandle {
        Arc::new(RootSignature::new(
            &RootSignatureDescriptor {
                label: None,
                parameters: Cow::Borrowed(&[]),
            },
            Box::new(()),
        ))
    }

    fn pass(color_formats: &[TextureFormat]) -> RenderPassHandle {
        Arc::new(RenderPass::new(
            &RenderPassDescriptor {
                label: None,
                color_formats: Cow::Owned(color_formats.to_vec()),
                depth_stencil_format: None,
                sample_count: SampleCount::X1,
            },
            Box::new(()),
        ))
    }

    fn descriptor(
        stages: GraphicsShaderStages,
        topology: PrimitiveTopology,
    ) -> GraphicsPipelineDescriptor<'static> {
        GraphicsPipelineDescriptor {
            label: None,
            root_signature: signature(),
            stages,
            vertex_layouts: Cow::Borrowed(&[]),
            rasterizer: RasterizerState {
                topology,
                ..RasterizerState::default()
            },
            depth_stencil: None,
            color_targets: Cow::Owned(vec![ColorTargetState::opaque(
                TextureFormat::Rgba8UnormSrgb,
            )]),
            sample_count: SampleCount::X1,
            render_pass: pass(&[TextureFormat::Rgba8UnormSrgb]),
        }
    }

    fn tessellation_capable() -> Capabilities {
        Capabilities {
            supports_tessellation: true,
            supports_geometry_shaders: true,
            ..Capabilities::default()
        }
    }

    #[test]
    fn patch_topology_without_tessellation_stages_fails() {
        let stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Vertex),
            &module(ShaderStage::Fragment),
        );
        let descriptor = descriptor(stages, PrimitiveTopology::PatchList { control_points: 3 });
        let err = validate_graphics_pipeline(&descriptor, &tessellation_capable()).unwrap_err();
        assert_eq!(
            err,
            PipelineError::MissingTessellationStage {
                stage: ShaderStage::TessellationControl,
            }
        );
    }

    #[test]
    fn patch_topology_with_both_tessellation_stages_passes() {
        let mut stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Vertex),
            &module(ShaderStage::Fragment),
        );
        stages.tessellation_control = Some(module(ShaderStage::TessellationControl));
        stages.tessellation_evaluation = Some(module(ShaderStage::TessellationEvaluation));
        let descriptor = descriptor(stages, PrimitiveTopology::PatchList { control_points: 3 });
        assert!(validate_graphics_pipeline(&descriptor, &tessellation_capable()).is_ok());
    }

    #[test]
    fn tessellation_stage_on_incapable_device_fails() {
        let mut stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Vertex),
            &module(ShaderStage::Fragment),
        );
        stages.tessellation_control = Some(module(ShaderStage::TessellationControl));
        stages.tessellation_evaluation = Some(module(ShaderStage::TessellationEvaluation));
        let descriptor = descriptor(stages, PrimitiveTopology::TriangleList);
        let caps = Capabilities {
            supports_tessellation: false,
            ..Capabilities::default()
        };
        assert!(matches!(
            validate_graphics_pipeline(&descriptor, &caps),
            Err(PipelineError::FeatureNotSupported(_))
        ));
    }

    #[test]
    fn too_many_color_targets_fails() {
        let stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Vertex),
            &module(ShaderStage::Fragment),
        );
        let mut descriptor = descriptor(stages, PrimitiveTopology::TriangleList);
        let formats = vec![TextureFormat::Rgba8UnormSrgb; 2];
        descriptor.color_targets = Cow::Owned(
            formats
                .iter()
                .map(|f| ColorTargetState::opaque(*f))
                .collect(),
        );
        descriptor.render_pass = pass(&formats);
        let caps = Capabilities {
            max_color_attachments: 1,
            ..Capabilities::default()
        };
        assert_eq!(
            validate_graphics_pipeline(&descriptor, &caps).unwrap_err(),
            PipelineError::TooManyColorTargets {
                requested: 2,
                supported: 1,
            }
        );
    }

    #[test]
    fn color_target_format_must_match_render_pass() {
        let stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Vertex),
            &module(ShaderStage::Fragment),
        );
        let mut descriptor = descriptor(stages, PrimitiveTopology::TriangleList);
        descriptor.render_pass = pass(&[TextureFormat::Rgba16Float]);
        assert!(matches!(
            validate_graphics_pipeline(&descriptor, &Capabilities::default()),
            Err(PipelineError::IncompatibleRenderPass(_))
        ));
    }

    #[test]
    fn wrong_stage_module_fails() {
        let stages = GraphicsShaderStages::vertex_fragment(
            &module(ShaderStage::Fragment),
            &module(ShaderStage::Fragment),
        );
        let descriptor = descriptor(stages, PrimitiveTopology::TriangleList);
        assert_eq!(
            validate_graphics_pipeline(&descriptor, &Capabilities::default()).unwrap_err(),
            PipelineError::StageMismatch {
                expected: ShaderStage::Vertex,
                found: ShaderStage::Fragment,
            }
        );
    }

    #[test]
    fn compute_pipeline_requires_compute_module() {
        let descriptor = ComputePipelineDescriptor {
            label: None,
            root_signature: signature(),
            module: module(ShaderStage::Vertex),
        };
        assert!(matches!(
            validate_compute_pipeline(&descriptor, &Capabilities::default()),
            Err(PipelineError::StageMismatch { .. })
        ));
    }
}
