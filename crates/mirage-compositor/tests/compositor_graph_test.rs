use mirage_compositor::compositor::passes::{ClearPass, QuadPass};
use mirage_compositor::{
    CompositorError, CompositorGraph, CompositorPass, PassDeclaration, PassFactory,
    PassFactoryChain, PassState,
};
use mirage_core::math::{Extent2D, LinearRgba};
use mirage_core::rhi::api::binding::RootSignatureDescriptor;
use mirage_core::rhi::api::pipeline::{
    ColorTargetState, GraphicsPipelineDescriptor, GraphicsShaderStages, RasterizerState,
};
use mirage_core::rhi::api::shader::{ShaderModuleDescriptor, ShaderSource, ShaderStage};
use mirage_core::rhi::api::swap_chain::SwapChainDescriptor;
use mirage_core::rhi::api::texture::SampleCount;
use mirage_core::rhi::backend::BackendConfig;
use mirage_core::rhi::command::RenderTarget;
use mirage_core::rhi::traits::SurfaceTarget;
use mirage_core::rhi::Rhi;
use mirage_infra::NullRhi;
use std::borrow::Cow;
use std::sync::Arc;

fn null_rhi() -> NullRhi {
    let _ = env_logger::builder().is_test(true).try_init();
    NullRhi::new(&BackendConfig::named("Null"))
}

fn headless_target(rhi: &NullRhi) -> RenderTarget {
    let swap_chain = rhi
        .create_swap_chain(
            SurfaceTarget::Headless(Extent2D::new(640, 360)),
            &SwapChainDescriptor {
                label: Some(Cow::Borrowed("test output")),
                size: Extent2D::new(640, 360),
                format: None,
                vsync: true,
            },
        )
        .expect("headless swap chain creation");
    RenderTarget::SwapChain(swap_chain)
}

#[test]
fn passes_move_through_the_lifecycle_states() {
    let rhi = null_rhi();
    let output = headless_target(&rhi);

    let mut graph = CompositorGraph::new();
    graph
        .push_pass(
            Box::new(ClearPass::new("backdrop", LinearRgba::BLUE)),
            &rhi,
        )
        .unwrap();
    assert_eq!(graph.pass_state(0), Some(PassState::Created));

    graph.execute_frame(&rhi, &output).unwrap();
    assert_eq!(graph.pass_state(0), Some(PassState::Submitted));
    assert_eq!(graph.frame_index(), 1);

    let trace = rhi.take_trace();
    assert!(trace.iter().any(|line| line.starts_with("clear(")));

    graph.destroy(&rhi);
    assert_eq!(graph.pass_state(0), Some(PassState::Destroyed));

    // Destroyed passes no longer contribute work.
    graph.execute_frame(&rhi, &output).unwrap();
    assert!(rhi.take_trace().is_empty());
}

#[test]
fn graph_builds_from_declarations_and_rejects_unknown_types() {
    let rhi = null_rhi();

    let chain = PassFactoryChain::new();
    let graph = CompositorGraph::from_declarations(
        &[PassDeclaration::new("Clear", "backdrop")],
        &chain,
        &rhi,
    )
    .unwrap();
    assert_eq!(graph.len(), 1);

    let result = CompositorGraph::from_declarations(
        &[PassDeclaration::new("Volumetrics", "fog")],
        &chain,
        &rhi,
    );
    assert!(matches!(result, Err(CompositorError::UnknownPassType(_))));
}

struct OffscreenFactory {
    pipeline: mirage_core::rhi::api::GraphicsPipelineHandle,
}

impl PassFactory for OffscreenFactory {
    fn create_pass(&self, declaration: &PassDeclaration) -> Option<Box<dyn CompositorPass>> {
        match declaration.type_name.as_str() {
            "Present" => Some(Box::new(QuadPass::new(
                &declaration.name,
                Arc::clone(&self.pipeline),
                Vec::new(),
            ))),
            _ => None,
        }
    }
}

/// A custom factory is consulted before the base factory, and a full
/// clear + quad frame submits against the swap chain target.
#[test]
fn custom_factory_resolves_before_the_base_factory() {
    let rhi = null_rhi();
    let output = headless_target(&rhi);
    let RenderTarget::SwapChain(swap_chain) = &output else {
        unreachable!()
    };

    let shader = |stage| {
        rhi.create_shader_module(&ShaderModuleDescriptor {
            label: None,
            stage,
            entry_point: Cow::Borrowed("main"),
            source: ShaderSource::Wgsl(Cow::Borrowed("")),
        })
        .unwrap()
    };
    let signature = rhi
        .create_root_signature(&RootSignatureDescriptor {
            label: None,
            parameters: Cow::Borrowed(&[]),
        })
        .unwrap();
    let pipeline = rhi
        .create_graphics_pipeline(&GraphicsPipelineDescriptor {
            label: Some(Cow::Borrowed("present pipeline")),
            root_signature: signature,
            stages: GraphicsShaderStages::vertex_fragment(
                &shader(ShaderStage::Vertex),
                &shader(ShaderStage::Fragment),
            ),
            vertex_layouts: Cow::Borrowed(&[]),
            rasterizer: RasterizerState::default(),
            depth_stencil: None,
            color_targets: Cow::Owned(vec![ColorTargetState::opaque(swap_chain.format())]),
            sample_count: SampleCount::X1,
            render_pass: Arc::clone(swap_chain.render_pass()),
        })
        .unwrap();

    let mut chain = PassFactoryChain::new();
    chain.push_factory(Box::new(OffscreenFactory { pipeline }));

    let mut graph = CompositorGraph::from_declarations(
        &[
            PassDeclaration::new("Clear", "backdrop"),
            PassDeclaration::new("Present", "present"),
        ],
        &chain,
        &rhi,
    )
    .unwrap();

    graph.execute_frame(&rhi, &output).unwrap();
    let trace = rhi.take_trace();
    assert!(trace.iter().any(|line| line.starts_with("clear(")));
    assert!(trace
        .iter()
        .any(|line| line == "draw(vertices=3, instances=1, first_vertex=0, first_instance=0)"));
}
