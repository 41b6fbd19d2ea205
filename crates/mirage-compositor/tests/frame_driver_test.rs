use mirage_compositor::{FrameDriver, FrameWorkload};
use mirage_core::math::{Extent2D, LinearRgba};
use mirage_core::rhi::api::swap_chain::{SwapChainDescriptor, SwapChainHandle};
use mirage_core::rhi::backend::{BackendConfig, BackendRegistry};
use mirage_core::rhi::command::{ClearFlags, CommandBuffer, RenderTarget};
use mirage_core::rhi::traits::SurfaceTarget;
use mirage_core::rhi::Rhi;
use std::borrow::Cow;
use std::sync::Arc;

// Force the `mirage-infra` rlib to be linked so its inventory-registered "Null"
// backend is discoverable via `BackendRegistry::with_linked_backends()`. Without
// a reference to the crate, the linker drops the object holding the registration.
use mirage_infra as _;

#[derive(Default)]
struct CountingWorkload {
    inits: u32,
    updates: u32,
    draws: u32,
    deinits: u32,
}

impl FrameWorkload for CountingWorkload {
    fn on_init(&mut self, _rhi: &dyn Rhi) -> anyhow::Result<()> {
        self.inits += 1;
        Ok(())
    }

    fn on_update(&mut self, _delta_seconds: f32) {
        self.updates += 1;
    }

    fn on_draw(&mut self, rhi: &dyn Rhi, output: &RenderTarget) -> anyhow::Result<()> {
        self.draws += 1;
        let mut commands = CommandBuffer::new();
        commands.set_render_target(output);
        commands.clear_render_target(ClearFlags::COLOR, LinearRgba::BLACK, 1.0, 0);
        rhi.submit_command_buffer(&commands)?;
        Ok(())
    }

    fn on_deinit(&mut self, _rhi: &dyn Rhi) {
        self.deinits += 1;
    }
}

fn headless_swap_chain(rhi: &dyn Rhi) -> SwapChainHandle {
    rhi.create_swap_chain(
        SurfaceTarget::Headless(Extent2D::new(320, 240)),
        &SwapChainDescriptor {
            label: Some(Cow::Borrowed("driver output")),
            size: Extent2D::new(320, 240),
            format: None,
            vsync: true,
        },
    )
    .expect("headless swap chain creation")
}

#[test]
fn driver_runs_the_lifecycle_hooks_in_order() {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = BackendRegistry::with_linked_backends();
    let rhi = registry
        .create(&BackendConfig::named("Null"))
        .expect("null backend creation");
    let swap_chain = headless_swap_chain(rhi.as_ref());
    let output = RenderTarget::SwapChain(Arc::clone(&swap_chain));

    // The workload stays observable through a shared counter proxy.
    struct Proxy(Arc<std::sync::Mutex<CountingWorkload>>);
    impl FrameWorkload for Proxy {
        fn on_init(&mut self, rhi: &dyn Rhi) -> anyhow::Result<()> {
            self.0.lock().unwrap().on_init(rhi)
        }
        fn on_update(&mut self, delta_seconds: f32) {
            self.0.lock().unwrap().on_update(delta_seconds);
        }
        fn on_draw(&mut self, rhi: &dyn Rhi, output: &RenderTarget) -> anyhow::Result<()> {
            self.0.lock().unwrap().on_draw(rhi, output)
        }
        fn on_deinit(&mut self, rhi: &dyn Rhi) {
            self.0.lock().unwrap().on_deinit(rhi);
        }
    }
    let counters = Arc::new(std::sync::Mutex::new(CountingWorkload::default()));
    let mut driver = FrameDriver::new(Arc::clone(&rhi), Box::new(Proxy(Arc::clone(&counters))));

    driver.frame(&output).unwrap();
    driver.frame(&output).unwrap();
    rhi.present(&swap_chain).unwrap();
    driver.shutdown();

    let counters = counters.lock().unwrap();
    assert_eq!(counters.inits, 1, "init runs once, lazily");
    assert_eq!(counters.updates, 2);
    assert_eq!(counters.draws, 2);
    assert_eq!(counters.deinits, 1);
}

#[test]
fn swap_chain_resize_updates_the_reported_extent() {
    let registry = BackendRegistry::with_linked_backends();
    let rhi = registry
        .create(&BackendConfig::named("Null"))
        .expect("null backend creation");
    let swap_chain = headless_swap_chain(rhi.as_ref());
    assert_eq!(swap_chain.extent(), Extent2D::new(320, 240));

    rhi.resize_swap_chain(&swap_chain, 1920, 1080).unwrap();
    assert_eq!(swap_chain.extent(), Extent2D::new(1920, 1080));

    // Degenerate sizes are clamped, not rejected.
    rhi.resize_swap_chain(&swap_chain, 0, 0).unwrap();
    assert_eq!(swap_chain.extent(), Extent2D::new(1, 1));
}
