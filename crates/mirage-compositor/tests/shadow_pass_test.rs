use mirage_compositor::compositor::shadow::{
    ShadowCasterRenderer, ShadowMapPass, ShadowSettings,
};
use mirage_compositor::{CompositorError, CompositorPass, FrameContext};
use mirage_core::math::Extent2D;
use mirage_core::rhi::api::swap_chain::SwapChainDescriptor;
use mirage_core::rhi::backend::BackendConfig;
use mirage_core::rhi::command::{CommandBuffer, RenderTarget};
use mirage_core::rhi::traits::SurfaceTarget;
use mirage_core::rhi::Rhi;
use mirage_infra::NullRhi;
use std::borrow::Cow;

struct NoCasters;

impl ShadowCasterRenderer for NoCasters {
    fn record_depth(
        &mut self,
        _cascade: u32,
        _context: &FrameContext<'_>,
        _commands: &mut CommandBuffer,
    ) -> Result<(), CompositorError> {
        Ok(())
    }
}

fn fixture() -> (NullRhi, RenderTarget) {
    let _ = env_logger::builder().is_test(true).try_init();
    let rhi = NullRhi::new(&BackendConfig::named("Null"));
    let swap_chain = rhi
        .create_swap_chain(
            SurfaceTarget::Headless(Extent2D::new(640, 360)),
            &SwapChainDescriptor {
                label: Some(Cow::Borrowed("shadow test output")),
                size: Extent2D::new(640, 360),
                format: None,
                vsync: true,
            },
        )
        .unwrap();
    (rhi, RenderTarget::SwapChain(swap_chain))
}

fn run_frame(
    pass: &mut ShadowMapPass,
    rhi: &NullRhi,
    output: &RenderTarget,
    frame_index: u64,
) {
    let context = FrameContext {
        rhi,
        output,
        frame_index,
    };
    let mut commands = CommandBuffer::new();
    pass.fill(&context, &mut commands)
        .expect("shadow pass fill");
    rhi.submit_command_buffer(&commands)
        .expect("shadow pass submission");
}

/// Changing the cascade count from 4 to 2 must trigger exactly one
/// resource recreation; unchanged settings must not recreate anything.
#[test]
fn settings_change_recreates_resources_exactly_once() {
    let (rhi, output) = fixture();
    let mut pass = ShadowMapPass::new(
        "shadows",
        ShadowSettings {
            cascade_count: 4,
            ..ShadowSettings::default()
        },
        Box::new(NoCasters),
    );
    assert_eq!(pass.generation(), 0);

    run_frame(&mut pass, &rhi, &output, 0);
    assert_eq!(pass.generation(), 1, "first fill allocates once");
    run_frame(&mut pass, &rhi, &output, 1);
    run_frame(&mut pass, &rhi, &output, 2);
    assert_eq!(pass.generation(), 1, "stable settings must not recreate");

    pass.set_settings(ShadowSettings {
        cascade_count: 2,
        ..ShadowSettings::default()
    });
    assert_eq!(pass.generation(), 1, "recreation is lazy, not eager");

    run_frame(&mut pass, &rhi, &output, 3);
    assert_eq!(pass.generation(), 2, "one change, one recreation");
    run_frame(&mut pass, &rhi, &output, 4);
    assert_eq!(pass.generation(), 2);

    // Setting identical values back is not a change.
    pass.set_settings(ShadowSettings {
        cascade_count: 2,
        ..ShadowSettings::default()
    });
    run_frame(&mut pass, &rhi, &output, 5);
    assert_eq!(pass.generation(), 2);
}

/// Each cascade contributes a depth clear, a variance conversion draw,
/// and two blur draws.
#[test]
fn frame_records_depth_variance_and_separable_blur_per_cascade() {
    let (rhi, output) = fixture();
    let cascades = 3;
    let mut pass = ShadowMapPass::new(
        "shadows",
        ShadowSettings {
            cascade_count: cascades,
            map_size: 256,
            msaa_samples: 1,
        },
        Box::new(NoCasters),
    );

    run_frame(&mut pass, &rhi, &output, 0);
    let trace = rhi.take_trace();

    let depth_clears = trace
        .iter()
        .filter(|line| line.starts_with("clear(flags=ClearFlags(DEPTH)"))
        .count();
    assert_eq!(depth_clears as u32, cascades);

    // One conversion draw plus two blur draws per cascade.
    let fullscreen_draws = trace
        .iter()
        .filter(|line| {
            line.as_str() == "draw(vertices=3, instances=1, first_vertex=0, first_instance=0)"
        })
        .count();
    assert_eq!(fullscreen_draws as u32, cascades * 3);

    assert_eq!(pass.moment_textures().len() as u32, cascades);
}

/// Out-of-range cascade counts are clamped instead of crashing.
#[test]
fn cascade_count_is_clamped_to_the_supported_range() {
    let (rhi, output) = fixture();
    let mut pass = ShadowMapPass::new(
        "shadows",
        ShadowSettings {
            cascade_count: 9,
            map_size: 128,
            msaa_samples: 1,
        },
        Box::new(NoCasters),
    );
    run_frame(&mut pass, &rhi, &output, 0);
    assert_eq!(pass.settings().cascade_count, 4);
    assert_eq!(pass.moment_textures().len(), 4);
}
