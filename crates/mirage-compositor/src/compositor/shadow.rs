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

//! The cascaded variance-shadow-map pass.
//!
//! Per frame and per cascade: render scene depth from the light's view
//! into the cascade's depth map, convert depth to exponential variance
//! moments with a fullscreen pass, then blur the moments separably
//! (horizontal, then vertical). A generation counter detects settings
//! changes (cascade count, map size, multisample count) and lazily
//! recreates the GPU resources exactly once per change instead of every
//! frame.

use super::pass::{CompositorPass, FrameContext};
use super::CompositorError;
use mirage_core::math::{Extent3D, LinearRgba};
use mirage_core::rhi::api::binding::{
    DescriptorKind, DescriptorRange, ResourceBinding, ResourceGroupDescriptor,
    ResourceGroupHandle, RootParameter, RootSignatureDescriptor, RootSignatureHandle,
    TextureSampleKind,
};
use mirage_core::rhi::api::buffer::{BufferDescriptor, BufferUsage};
use mirage_core::rhi::api::pass::{
    FramebufferDescriptor, FramebufferHandle, RenderPassDescriptor, RenderPassHandle,
};
use mirage_core::rhi::api::pipeline::{
    ColorTargetState, GraphicsPipelineDescriptor, GraphicsPipelineHandle, GraphicsShaderStages,
    RasterizerState,
};
use mirage_core::rhi::api::sampler::SamplerDescriptor;
use mirage_core::rhi::api::shader::{
    ShaderModuleDescriptor, ShaderModuleHandle, ShaderSource, ShaderStage, ShaderStageFlags,
};
use mirage_core::rhi::api::texture::{
    SampleCount, TextureDescriptor, TextureDimension, TextureFormat, TextureHandle, TextureUsage,
};
use mirage_core::rhi::command::{ClearFlags, CommandBuffer, ScissorRect, Viewport};
use mirage_core::rhi::Rhi;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::Arc;

/// The highest supported cascade count.
pub const MAX_CASCADES: u32 = 4;

/// The fullscreen vertex stage shared by the conversion and blur passes.
const FULLSCREEN_VS_WGSL: &str = r#"
@vertex
fn main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    let uv = vec2<f32>(f32((index << 1u) & 2u), f32(index & 2u));
    return vec4<f32>(uv * 2.0 - 1.0, 0.0, 1.0);
}
"#;

/// Depth -> exponential variance moments.
const VARIANCE_FS_WGSL: &str = r#"
struct Params { exponents: vec2<f32>, texel: vec2<f32> }

@group(0) @binding(0) var shadow_depth: texture_depth_2d;
@group(0) @binding(1) var shadow_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

@fragment
fn main(@builtin(position) position: vec4<f32>) -> @location(0) vec2<f32> {
    let depth = textureSample(shadow_depth, shadow_sampler, position.xy * params.texel);
    let warped = vec2<f32>(exp(params.exponents.x * depth), -exp(-params.exponents.y * depth));
    return warped;
}
"#;

/// Separable gaussian over the moment texture; direction comes from the
/// uniform block so one pipeline serves both axes.
const BLUR_FS_WGSL: &str = r#"
struct Params { direction: vec2<f32>, texel: vec2<f32> }

@group(0) @binding(0) var moments: texture_2d<f32>;
@group(0) @binding(1) var moment_sampler: sampler;
@group(0) @binding(2) var<uniform> params: Params;

const WEIGHTS = array<f32, 3>(0.38774, 0.24477, 0.06136);

@fragment
fn main(@builtin(position) position: vec4<f32>) -> @location(0) vec2<f32> {
    let uv = position.xy * params.texel;
    let step = params.direction * params.texel;
    var sum = textureSample(moments, moment_sampler, uv).xy * WEIGHTS[0];
    for (var i = 1; i < 3; i = i + 1) {
        let offset = step * f32(i);
        sum = sum + textureSample(moments, moment_sampler, uv + offset).xy * WEIGHTS[i];
        sum = sum + textureSample(moments, moment_sampler, uv - offset).xy * WEIGHTS[i];
    }
    return sum;
}
"#;

/// Tunable shadow map settings; changing any field triggers one lazy
/// resource recreation at the next frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShadowSettings {
    /// The number of cascades (1..=4).
    pub cascade_count: u32,
    /// The edge length in pixels of each cascade's shadow map.
    pub map_size: u32,
    /// The multisample count of the depth render (1, 2, 4, or 8).
    pub msaa_samples: u32,
}

impl Default for ShadowSettings {
    fn default() -> Self {
        Self {
            cascade_count: MAX_CASCADES,
            map_size: 1024,
            msaa_samples: 1,
        }
    }
}

impl ShadowSettings {
    fn clamped(&self) -> Self {
        let mut clamped = self.clone();
        if clamped.cascade_count == 0 || clamped.cascade_count > MAX_CASCADES {
            log::warn!(
                "ShadowMapPass: cascade count {} clamped into 1..={MAX_CASCADES}",
                clamped.cascade_count
            );
            clamped.cascade_count = clamped.cascade_count.clamp(1, MAX_CASCADES);
        }
        clamped
    }

    fn sample_count(&self) -> SampleCount {
        match self.msaa_samples {
            1 => SampleCount::X1,
            2 => SampleCount::X2,
            4 => SampleCount::X4,
            8 => SampleCount::X8,
            other => {
                log::warn!("ShadowMapPass: unsupported msaa_samples {other}, using 1");
                SampleCount::X1
            }
        }
    }
}

/// Records the shadow casters of one cascade from the light's view.
pub trait ShadowCasterRenderer: Send {
    /// Records depth-only draws for `cascade` into `commands`. The depth
    /// framebuffer, viewport, and clear are already recorded.
    fn record_depth(
        &mut self,
        cascade: u32,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError>;
}

struct Cascade {
    depth_framebuffer: FramebufferHandle,
    moment_framebuffer: FramebufferHandle,
    blur_framebuffer: FramebufferHandle,
    moments: TextureHandle,
    variance_group: ResourceGroupHandle,
    blur_horizontal_group: ResourceGroupHandle,
    blur_vertical_group: ResourceGroupHandle,
}

struct CascadeResources {
    settings: ShadowSettings,
    #[allow(dead_code)]
    depth_pass: RenderPassHandle,
    variance_signature: RootSignatureHandle,
    blur_signature: RootSignatureHandle,
    variance_pipeline: GraphicsPipelineHandle,
    blur_pipeline: GraphicsPipelineHandle,
    cascades: Vec<Cascade>,
}

/// The cascaded variance-shadow-map pass.
pub struct ShadowMapPass {
    name: String,
    settings: ShadowSettings,
    caster_renderer: Box<dyn ShadowCasterRenderer>,
    generation: u64,
    resources: Option<CascadeResources>,
}

impl ShadowMapPass {
    /// Creates the pass; resources are allocated lazily on first fill.
    pub fn new(
        name: &str,
        settings: ShadowSettings,
        caster_renderer: Box<dyn ShadowCasterRenderer>,
    ) -> Self {
        Self {
            name: name.to_string(),
            settings: settings.clamped(),
            caster_renderer,
            generation: 0,
            resources: None,
        }
    }

    /// Replaces the settings. Resources are recreated once, at the next
    /// fill, if anything actually changed.
    pub fn set_settings(&mut self, settings: ShadowSettings) {
        self.settings = settings.clamped();
    }

    /// The current settings.
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }

    /// The resource generation: bumped by one for every (re)creation
    /// cycle, including the initial one.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The blurred moment texture of each live cascade, for the scene
    /// pass to sample.
    pub fn moment_textures(&self) -> Vec<TextureHandle> {
        self.resources
            .as_ref()
            .map(|resources| {
                resources
                    .cascades
                    .iter()
                    .map(|cascade| Arc::clone(&cascade.moments))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn ensure_resources(&mut self, rhi: &dyn Rhi) -> Result<(), CompositorError> {
        if let Some(resources) = &self.resources {
            if resources.settings == self.settings {
                return Ok(());
            }
        }
        self.generation += 1;
        log::info!(
            "ShadowMapPass '{}': (re)creating resources (generation {}, {} cascades, {}px, {}x msaa)",
            self.name,
            self.generation,
            self.settings.cascade_count,
            self.settings.map_size,
            self.settings.msaa_samples
        );
        let resources = self
            .build_resources(rhi)
            .map_err(|source| CompositorError::ResourceCreation {
                name: self.name.clone(),
                source,
            })?;
        self.resources = Some(resources);
        Ok(())
    }

    fn build_resources(
        &self,
        rhi: &dyn Rhi,
    ) -> Result<CascadeResources, mirage_core::rhi::error::ResourceError> {
        let settings = self.settings.clone();
        let map_extent = Extent3D::flat(settings.map_size, settings.map_size);

        let depth_pass = rhi.create_render_pass(&RenderPassDescriptor {
            label: Some(Cow::Borrowed("shadow depth pass")),
            color_formats: Cow::Borrowed(&[]),
            depth_stencil_format: Some(TextureFormat::Depth32Float),
            sample_count: settings.sample_count(),
        })?;
        let moment_pass = rhi.create_render_pass(&RenderPassDescriptor {
            label: Some(Cow::Borrowed("shadow moment pass")),
            color_formats: Cow::Owned(vec![TextureFormat::Rg32Float]),
            depth_stencil_format: None,
            sample_count: SampleCount::X1,
        })?;

        let fullscreen_vs = shader(rhi, ShaderStage::Vertex, "shadow fullscreen vs", FULLSCREEN_VS_WGSL)?;
        let variance_fs = shader(rhi, ShaderStage::Fragment, "shadow variance fs", VARIANCE_FS_WGSL)?;
        let blur_fs = shader(rhi, ShaderStage::Fragment, "shadow blur fs", BLUR_FS_WGSL)?;

        let variance_signature = rhi.create_root_signature(&RootSignatureDescriptor {
            label: Some(Cow::Borrowed("shadow variance signature")),
            parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                ranges: vec![
                    DescriptorRange {
                        kind: DescriptorKind::SampledTexture {
                            dimension: TextureDimension::D2,
                            sample_type: TextureSampleKind::Depth,
                        },
                        base_binding: 0,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorRange {
                        kind: DescriptorKind::plain_sampler(),
                        base_binding: 1,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorRange {
                        kind: DescriptorKind::UniformBuffer,
                        base_binding: 2,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                ],
            }]),
        })?;
        let blur_signature = rhi.create_root_signature(&RootSignatureDescriptor {
            label: Some(Cow::Borrowed("shadow blur signature")),
            parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                ranges: vec![
                    DescriptorRange {
                        kind: DescriptorKind::sampled_2d(),
                        base_binding: 0,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorRange {
                        kind: DescriptorKind::plain_sampler(),
                        base_binding: 1,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                    DescriptorRange {
                        kind: DescriptorKind::UniformBuffer,
                        base_binding: 2,
                        count: 1,
                        visibility: ShaderStageFlags::FRAGMENT,
                    },
                ],
            }]),
        })?;

        let variance_pipeline = rhi.create_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: Some(Cow::Borrowed("shadow variance pipeline")),
            root_signature: Arc::clone(&variance_signature),
            stages: GraphicsShaderStages::vertex_fragment(&fullscreen_vs, &variance_fs),
            vertex_layouts: Cow::Borrowed(&[]),
            rasterizer: RasterizerState {
                cull_mode: None,
                ..RasterizerState::default()
            },
            depth_stencil: None,
            color_targets: Cow::Owned(vec![ColorTargetState::opaque(TextureFormat::Rg32Float)]),
            sample_count: SampleCount::X1,
            render_pass: Arc::clone(&moment_pass),
        })?;
        let blur_pipeline = rhi.create_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: Some(Cow::Borrowed("shadow blur pipeline")),
            root_signature: Arc::clone(&blur_signature),
            stages: GraphicsShaderStages::vertex_fragment(&fullscreen_vs, &blur_fs),
            vertex_layouts: Cow::Borrowed(&[]),
            rasterizer: RasterizerState {
                cull_mode: None,
                ..RasterizerState::default()
            },
            depth_stencil: None,
            color_targets: Cow::Owned(vec![ColorTargetState::opaque(TextureFormat::Rg32Float)]),
            sample_count: SampleCount::X1,
            render_pass: Arc::clone(&moment_pass),
        })?;

        let sampler = rhi.create_sampler(&SamplerDescriptor {
            label: Some(Cow::Borrowed("shadow sampler")),
            ..SamplerDescriptor::default()
        })?;

        let texel = 1.0 / settings.map_size as f32;
        let variance_params: [f32; 4] = [40.0, 5.0, texel, texel];
        let horizontal_params: [f32; 4] = [1.0, 0.0, texel, texel];
        let vertical_params: [f32; 4] = [0.0, 1.0, texel, texel];

        let mut cascades = Vec::with_capacity(settings.cascade_count as usize);
        for index in 0..settings.cascade_count {
            let depth_texture = rhi.create_texture(&TextureDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} depth"))),
                size: map_extent,
                mip_level_count: 1,
                sample_count: settings.sample_count(),
                dimension: TextureDimension::D2,
                format: TextureFormat::Depth32Float,
                usage: TextureUsage::DEPTH_STENCIL_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            })?;
            let moments = rhi.create_texture(&TextureDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} moments"))),
                size: map_extent,
                mip_level_count: 1,
                sample_count: SampleCount::X1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rg32Float,
                usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            })?;
            let blur_intermediate = rhi.create_texture(&TextureDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} blur"))),
                size: map_extent,
                mip_level_count: 1,
                sample_count: SampleCount::X1,
                dimension: TextureDimension::D2,
                format: TextureFormat::Rg32Float,
                usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
            })?;

            let depth_framebuffer = rhi.create_framebuffer(&FramebufferDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} depth fb"))),
                render_pass: Arc::clone(&depth_pass),
                color_attachments: Cow::Borrowed(&[]),
                depth_stencil_attachment: Some(Arc::clone(&depth_texture)),
            })?;
            let moment_framebuffer = rhi.create_framebuffer(&FramebufferDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} moment fb"))),
                render_pass: Arc::clone(&moment_pass),
                color_attachments: Cow::Owned(vec![Arc::clone(&moments)]),
                depth_stencil_attachment: None,
            })?;
            let blur_framebuffer = rhi.create_framebuffer(&FramebufferDescriptor {
                label: Some(Cow::Owned(format!("shadow cascade {index} blur fb"))),
                render_pass: Arc::clone(&moment_pass),
                color_attachments: Cow::Owned(vec![Arc::clone(&blur_intermediate)]),
                depth_stencil_attachment: None,
            })?;

            let uniform = |label: &str, params: [f32; 4]| {
                rhi.create_buffer_with_data(
                    &BufferDescriptor {
                        label: Some(Cow::Owned(format!("shadow cascade {index} {label}"))),
                        size: std::mem::size_of::<[f32; 4]>() as u64,
                        usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
                    },
                    bytemuck::bytes_of(&params),
                )
            };
            let variance_uniform = uniform("variance params", variance_params)?;
            let blur_h_uniform = uniform("blur h params", horizontal_params)?;
            let blur_v_uniform = uniform("blur v params", vertical_params)?;

            let group = |signature: &RootSignatureHandle,
                         label: String,
                         texture: &TextureHandle,
                         params: &mirage_core::rhi::api::BufferHandle| {
                rhi.create_resource_group(
                    signature,
                    &ResourceGroupDescriptor {
                        label: Some(Cow::Owned(label)),
                        parameter_index: 0,
                        resources: Cow::Owned(vec![
                            ResourceBinding::whole_texture(texture),
                            ResourceBinding::whole_buffer(params),
                        ]),
                        samplers: Cow::Owned(vec![Arc::clone(&sampler)]),
                    },
                )
            };
            let variance_group = group(
                &variance_signature,
                format!("shadow cascade {index} variance group"),
                &depth_texture,
                &variance_uniform,
            )?;
            let blur_horizontal_group = group(
                &blur_signature,
                format!("shadow cascade {index} blur h group"),
                &moments,
                &blur_h_uniform,
            )?;
            let blur_vertical_group = group(
                &blur_signature,
                format!("shadow cascade {index} blur v group"),
                &blur_intermediate,
                &blur_v_uniform,
            )?;

            cascades.push(Cascade {
                depth_framebuffer,
                moment_framebuffer,
                blur_framebuffer,
                moments,
                variance_group,
                blur_horizontal_group,
                blur_vertical_group,
            });
        }

        Ok(CascadeResources {
            settings,
            depth_pass,
            variance_signature,
            blur_signature,
            variance_pipeline,
            blur_pipeline,
            cascades,
        })
    }
}

impl CompositorPass for ShadowMapPass {
    fn name(&self) -> &str {
        &self.name
    }

    fn fill(
        &mut self,
        context: &FrameContext<'_>,
        commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        self.ensure_resources(context.rhi)?;
        let resources = self.resources.as_ref().expect("resources just ensured");

        let map_size = resources.settings.map_size;
        let viewport = Viewport::covering(map_size as f32, map_size as f32);
        let scissor = ScissorRect {
            x: 0,
            y: 0,
            width: map_size,
            height: map_size,
        };

        commands.begin_debug_event(&self.name);
        for (index, cascade) in resources.cascades.iter().enumerate() {
            commands.begin_debug_event(&format!("cascade {index}"));

            // Depth from the light's view.
            commands.set_framebuffer(&cascade.depth_framebuffer);
            commands.set_viewport_and_scissor(viewport, scissor);
            commands.clear_render_target(ClearFlags::DEPTH, LinearRgba::BLACK, 1.0, 0);
            self.caster_renderer
                .record_depth(index as u32, context, commands)?;

            // Depth -> exponential variance moments.
            commands.set_framebuffer(&cascade.moment_framebuffer);
            commands.set_viewport_and_scissor(viewport, scissor);
            commands.set_graphics_root_signature(&resources.variance_signature);
            commands.set_graphics_pipeline(&resources.variance_pipeline);
            commands.set_graphics_resource_group(0, &cascade.variance_group);
            commands.draw(0..3, 0..1);

            // Separable blur: horizontal into the intermediate, vertical
            // back into the moment texture.
            commands.set_graphics_root_signature(&resources.blur_signature);
            commands.set_graphics_pipeline(&resources.blur_pipeline);
            commands.set_framebuffer(&cascade.blur_framebuffer);
            commands.set_graphics_resource_group(0, &cascade.blur_horizontal_group);
            commands.draw(0..3, 0..1);
            commands.set_framebuffer(&cascade.moment_framebuffer);
            commands.set_graphics_resource_group(0, &cascade.blur_vertical_group);
            commands.draw(0..3, 0..1);

            commands.end_debug_event();
        }
        commands.end_debug_event();
        Ok(())
    }

    fn teardown(&mut self, _rhi: &dyn Rhi) {
        self.resources = None;
    }
}

impl std::fmt::Debug for ShadowMapPass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShadowMapPass")
            .field("name", &self.name)
            .field("settings", &self.settings)
            .field("generation", &self.generation)
            .field("has_resources", &self.resources.is_some())
            .finish()
    }
}

fn shader(
    rhi: &dyn Rhi,
    stage: ShaderStage,
    label: &str,
    source: &'static str,
) -> Result<ShaderModuleHandle, mirage_core::rhi::error::ResourceError> {
    rhi.create_shader_module(&ShaderModuleDescriptor {
        label: Some(Cow::Owned(label.to_string())),
        stage,
        entry_point: Cow::Borrowed("main"),
        source: ShaderSource::Wgsl(Cow::Borrowed(source)),
    })
}
