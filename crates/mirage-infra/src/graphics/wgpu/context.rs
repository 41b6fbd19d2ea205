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

use anyhow::{anyhow, Result};
use mirage_core::rhi::backend::BackendConfig;
use mirage_core::rhi::capabilities::{AdapterInfo, Capabilities};
use mirage_core::rhi::traits::{AdapterSelectionConfig, GraphicsAdapterSelector};

use super::selector::WgpuAdapterSelector;

/// Holds the core wgpu state objects: instance, adapter, logical device,
/// and queue, plus the derived capability set.
///
/// Initialized once per backend instance; surfaces (swap chains) are
/// created against the shared instance later.
#[derive(Debug)]
pub struct WgpuContext {
    pub instance: wgpu::Instance,
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub capabilities: Capabilities,
    pub active_features: wgpu::Features,
}

impl WgpuContext {
    /// Asynchronously initializes the wgpu context for `config`.
    pub async fn new(config: &BackendConfig) -> Result<Self> {
        log::info!("Initializing wgpu graphics context...");
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());

        let selector = WgpuAdapterSelector::new(instance.clone());
        let selection = selector
            .select_adapter(&AdapterSelectionConfig {
                preferred_backend: None,
                power_preference: config.power_preference,
                allow_fallback_adapter: config.headless,
            })
            .await
            .map_err(|e| anyhow!("Adapter selection failed: {e}"))?;

        let adapter = selection.adapter;
        log::info!(
            "Using graphics adapter \"{}\" (backend: {:?})",
            selection.info.name,
            selection.info.backend_type
        );

        // Only ask for features the adapter actually has; the rest degrade
        // through the capability set.
        let wanted_features = wgpu::Features::PUSH_CONSTANTS;
        let features_to_enable = adapter.features() & wanted_features;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Mirage Logical Device"),
                required_features: features_to_enable,
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::default(),
            })
            .await
            .map_err(|e| anyhow!("Failed to create logical device: {e}"))?;
        log::info!("Logical device and command queue created.");

        device.on_uncaptured_error(Box::new(|e| {
            log::error!("wgpu uncaptured error: {e:?}");
        }));

        let active_features = device.features();
        let limits = device.limits();
        log::debug!("Active device features: {active_features:?}");

        let capabilities = Capabilities {
            max_color_attachments: limits.max_color_attachments,
            max_texture_dimension_2d: limits.max_texture_dimension_2d,
            min_uniform_buffer_offset_alignment: limits.min_uniform_buffer_offset_alignment,
            // wgpu exposes neither tessellation nor geometry stages; the
            // logical stages exist in the API and are rejected at pipeline
            // creation on this backend.
            supports_tessellation: false,
            supports_geometry_shaders: false,
            supports_compute: true,
            supports_indirect_draw: true,
        };

        Ok(Self {
            instance,
            adapter,
            device,
            queue,
            adapter_info: selection.info,
            capabilities,
            active_features,
        })
    }
}
