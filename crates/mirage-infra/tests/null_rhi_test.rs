use mirage_core::math::{Extent3D, LinearRgba};
use mirage_core::rhi::api::binding::{
    DescriptorKind, DescriptorRange, ResourceBinding, ResourceGroupDescriptor, RootParameter,
    RootSignatureDescriptor,
};
use mirage_core::rhi::api::buffer::{BufferDescriptor, BufferUsage};
use mirage_core::rhi::api::pass::{FramebufferDescriptor, RenderPassDescriptor};
use mirage_core::rhi::api::pipeline::{
    ColorTargetState, ComputePipelineDescriptor, GraphicsPipelineDescriptor, GraphicsShaderStages,
    PrimitiveTopology, RasterizerState,
};
use mirage_core::rhi::api::shader::{ShaderModuleDescriptor, ShaderSource, ShaderStage};
use mirage_core::rhi::api::texture::{
    SampleCount, TextureDescriptor, TextureDimension, TextureFormat, TextureUsage,
};
use mirage_core::rhi::backend::{BackendConfig, BackendRegistry};
use mirage_core::rhi::command::{ClearFlags, CommandBuffer};
use mirage_core::rhi::error::{ResourceError, SubmitError};
use mirage_core::rhi::Rhi;
use mirage_infra::NullRhi;
use std::borrow::Cow;
use std::sync::Arc;

fn null_rhi() -> NullRhi {
    let _ = env_logger::builder().is_test(true).try_init();
    NullRhi::new(&BackendConfig::named("Null"))
}

fn shader(rhi: &dyn Rhi, stage: ShaderStage) -> mirage_core::rhi::api::ShaderModuleHandle {
    rhi.create_shader_module(&ShaderModuleDescriptor {
        label: None,
        stage,
        entry_point: Cow::Borrowed("main"),
        source: ShaderSource::Wgsl(Cow::Borrowed("")),
    })
    .expect("shader module creation")
}

#[test]
fn linked_backend_registry_resolves_null_by_name() {
    let registry = BackendRegistry::with_linked_backends();
    assert!(registry.names().any(|name| name == "Null"));
    let rhi = registry
        .create(&BackendConfig::named("Null"))
        .expect("null backend creation");
    assert_eq!(rhi.adapter_info().name, "Mirage Null Device");
}

/// A resource group over a one-range uniform table, consumed by a compute
/// pipeline of the same layout, must submit without a binding mismatch.
#[test]
fn uniform_table_compute_dispatch_submits_cleanly() {
    let rhi = null_rhi();

    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: Some(Cow::Borrowed("compute signature")),
            parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                ranges: vec![DescriptorRange::single(DescriptorKind::UniformBuffer, 0)],
            }]),
        })
        .expect("root signature creation");

    let uniform = rhi
        .create_buffer(&BufferDescriptor {
            label: Some(Cow::Borrowed("params")),
            size: 32,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })
        .expect("uniform buffer creation");

    let group = rhi
        .create_resource_group(
            &signature,
            &ResourceGroupDescriptor {
                label: None,
                parameter_index: 0,
                resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&uniform)]),
                samplers: Cow::Borrowed(&[]),
            },
        )
        .expect("resource group creation");

    let pipeline = rhi
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            root_signature: Arc::clone(&signature),
            module: shader(&rhi, ShaderStage::Compute),
        })
        .expect("compute pipeline creation");

    let mut commands = CommandBuffer::new();
    commands.set_compute_root_signature(&signature);
    commands.set_compute_pipeline(&pipeline);
    commands.set_compute_resource_group(0, &group);
    commands.write_uniform_data(&uniform, 0, &[0u8; 32]);
    commands.dispatch_workgroups(8, 8, 1);

    rhi.submit_command_buffer(&commands)
        .expect("submission must not report a binding mismatch");

    let trace = rhi.take_trace();
    assert!(trace.iter().any(|line| line.contains("dispatch(x=8, y=8, z=1)")));
    assert!(trace
        .iter()
        .any(|line| line.starts_with("bind_compute_uniform_buffer(space=0, binding=0")));
}

/// Identical recordings must replay to bit-identical native-call traces.
#[test]
fn resubmitting_an_identical_recording_yields_an_identical_trace() {
    let rhi = null_rhi();

    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                ranges: vec![DescriptorRange::single(DescriptorKind::UniformBuffer, 0)],
            }]),
        })
        .unwrap();
    let uniform = rhi
        .create_buffer(&BufferDescriptor {
            label: None,
            size: 64,
            usage: BufferUsage::UNIFORM,
        })
        .unwrap();
    let group = rhi
        .create_resource_group(
            &signature,
            &ResourceGroupDescriptor {
                label: None,
                parameter_index: 0,
                resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&uniform)]),
                samplers: Cow::Borrowed(&[]),
            },
        )
        .unwrap();
    let pipeline = rhi
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            root_signature: Arc::clone(&signature),
            module: shader(&rhi, ShaderStage::Compute),
        })
        .unwrap();

    let record = |commands: &mut CommandBuffer| {
        commands.begin_debug_event("tick");
        commands.set_compute_root_signature(&signature);
        commands.set_compute_pipeline(&pipeline);
        commands.set_compute_resource_group(0, &group);
        commands.dispatch_workgroups(4, 2, 1);
        commands.end_debug_event();
    };

    let mut commands = CommandBuffer::new();
    record(&mut commands);
    rhi.submit_command_buffer(&commands).unwrap();
    let first = rhi.take_trace();

    commands.clear();
    assert!(commands.is_empty());
    record(&mut commands);
    rhi.submit_command_buffer(&commands).unwrap();
    let second = rhi.take_trace();

    assert_eq!(first, second);
    assert!(!first.is_empty());
}

/// A pre-recorded buffer embedded twice replays inline, twice.
#[test]
fn nested_buffers_replay_inline() {
    let rhi = null_rhi();
    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Borrowed(&[]),
        })
        .unwrap();
    let pipeline = rhi
        .create_compute_pipeline(&ComputePipelineDescriptor {
            label: None,
            root_signature: signature,
            module: shader(&rhi, ShaderStage::Compute),
        })
        .unwrap();

    let mut nested = CommandBuffer::with_label("pre-recorded");
    nested.set_compute_root_signature(pipeline.root_signature());
    nested.set_compute_pipeline(&pipeline);
    nested.dispatch_workgroups(1, 1, 1);
    let nested = Arc::new(nested);

    let mut outer = CommandBuffer::new();
    outer.execute_commands(&nested);
    outer.execute_commands(&nested);
    rhi.submit_command_buffer(&outer).unwrap();

    let dispatches = rhi
        .take_trace()
        .into_iter()
        .filter(|line| line.starts_with("dispatch("))
        .count();
    assert_eq!(dispatches, 2);
}

/// A two-target pipeline drawn into a one-attachment framebuffer must fail
/// submission validation deterministically.
#[test]
fn multi_render_target_pipeline_rejects_narrower_framebuffer() {
    let rhi = null_rhi();

    let two_target_pass = rhi
        .create_render_pass(&RenderPassDescriptor {
            label: None,
            color_formats: Cow::Owned(vec![
                TextureFormat::Rgba8UnormSrgb,
                TextureFormat::Rgba16Float,
            ]),
            depth_stencil_format: None,
            sample_count: SampleCount::X1,
        })
        .unwrap();
    let one_target_pass = rhi
        .create_render_pass(&RenderPassDescriptor {
            label: None,
            color_formats: Cow::Owned(vec![TextureFormat::Rgba8UnormSrgb]),
            depth_stencil_format: None,
            sample_count: SampleCount::X1,
        })
        .unwrap();

    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Borrowed(&[]),
        })
        .unwrap();
    let pipeline = rhi
        .create_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: Some(Cow::Borrowed("mrt pipeline")),
            root_signature: signature,
            stages: GraphicsShaderStages::vertex_fragment(
                &shader(&rhi, ShaderStage::Vertex),
                &shader(&rhi, ShaderStage::Fragment),
            ),
            vertex_layouts: Cow::Borrowed(&[]),
            rasterizer: RasterizerState {
                topology: PrimitiveTopology::TriangleList,
                ..RasterizerState::default()
            },
            depth_stencil: None,
            color_targets: Cow::Owned(vec![
                ColorTargetState::opaque(TextureFormat::Rgba8UnormSrgb),
                ColorTargetState::opaque(TextureFormat::Rgba16Float),
            ]),
            sample_count: SampleCount::X1,
            render_pass: two_target_pass,
        })
        .unwrap();

    let attachment = rhi
        .create_texture(&TextureDescriptor {
            label: None,
            size: Extent3D::flat(64, 64),
            mip_level_count: 1,
            sample_count: SampleCount::X1,
            dimension: TextureDimension::D2,
            format: TextureFormat::Rgba8UnormSrgb,
            usage: TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
        })
        .unwrap();
    let framebuffer = rhi
        .create_framebuffer(&FramebufferDescriptor {
            label: None,
            render_pass: one_target_pass,
            color_attachments: Cow::Owned(vec![attachment]),
            depth_stencil_attachment: None,
        })
        .unwrap();

    let mut commands = CommandBuffer::new();
    commands.set_graphics_root_signature(pipeline.root_signature());
    commands.set_graphics_pipeline(&pipeline);
    commands.set_framebuffer(&framebuffer);
    commands.clear_render_target(ClearFlags::COLOR, LinearRgba::BLACK, 1.0, 0);
    commands.draw(0..3, 0..1);

    match rhi.submit_command_buffer(&commands) {
        Err(SubmitError::IncompatibleRenderTarget(_)) => {}
        other => panic!("expected an incompatible-render-target error, got {other:?}"),
    }
}

/// Recorded commands keep their resources alive until the buffer is
/// cleared; clearing drops the last hidden reference.
#[test]
fn recorded_commands_keep_resources_alive() {
    let rhi = null_rhi();
    let buffer = rhi
        .create_buffer(&BufferDescriptor {
            label: None,
            size: 16,
            usage: BufferUsage::UNIFORM | BufferUsage::COPY_DST,
        })
        .unwrap();

    let mut commands = CommandBuffer::new();
    commands.write_uniform_data(&buffer, 0, &[0u8; 16]);
    assert_eq!(Arc::strong_count(&buffer), 2);

    rhi.submit_command_buffer(&commands).unwrap();
    // Submission does not consume the recording.
    assert_eq!(Arc::strong_count(&buffer), 2);

    commands.clear();
    assert_eq!(Arc::strong_count(&buffer), 1);
}

/// Group arity mismatches fail at creation, not at submit.
#[test]
fn resource_group_arity_mismatch_fails_at_creation() {
    let rhi = null_rhi();
    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Owned(vec![RootParameter::DescriptorTable {
                ranges: vec![DescriptorRange {
                    kind: DescriptorKind::UniformBuffer,
                    base_binding: 0,
                    count: 2,
                    visibility: mirage_core::rhi::api::ShaderStageFlags::COMPUTE,
                }],
            }]),
        })
        .unwrap();
    let uniform = rhi
        .create_buffer(&BufferDescriptor {
            label: None,
            size: 16,
            usage: BufferUsage::UNIFORM,
        })
        .unwrap();

    let result = rhi.create_resource_group(
        &signature,
        &ResourceGroupDescriptor {
            label: None,
            parameter_index: 0,
            resources: Cow::Owned(vec![ResourceBinding::whole_buffer(&uniform)]),
            samplers: Cow::Borrowed(&[]),
        },
    );
    assert!(matches!(result, Err(ResourceError::Binding(_))));
}

/// Patch-list pipelines need both tessellation stages even on a device
/// that supports tessellation.
#[test]
fn patch_pipeline_without_tessellation_stages_fails() {
    let rhi = null_rhi();
    let pass = rhi
        .create_render_pass(&RenderPassDescriptor {
            label: None,
            color_formats: Cow::Owned(vec![TextureFormat::Rgba8UnormSrgb]),
            depth_stencil_format: None,
            sample_count: SampleCount::X1,
        })
        .unwrap();
    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Borrowed(&[]),
        })
        .unwrap();

    let result = rhi.create_graphics_pipeline(&GraphicsPipelineDescriptor {
        label: None,
        root_signature: signature,
        stages: GraphicsShaderStages::vertex_fragment(
            &shader(&rhi, ShaderStage::Vertex),
            &shader(&rhi, ShaderStage::Fragment),
        ),
        vertex_layouts: Cow::Borrowed(&[]),
        rasterizer: RasterizerState {
            topology: PrimitiveTopology::PatchList { control_points: 3 },
            ..RasterizerState::default()
        },
        depth_stencil: None,
        color_targets: Cow::Owned(vec![ColorTargetState::opaque(TextureFormat::Rgba8UnormSrgb)]),
        sample_count: SampleCount::X1,
        render_pass: pass,
    });
    assert!(matches!(result, Err(ResourceError::Pipeline(_))));
}
