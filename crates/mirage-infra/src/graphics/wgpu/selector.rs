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

//! Adapter discovery and selection for the wgpu backend.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use mirage_core::rhi::backend::PowerPreference;
use mirage_core::rhi::capabilities::{AdapterInfo, DeviceType, GraphicsBackendType};
use mirage_core::rhi::traits::{
    AdapterSelection, AdapterSelectionConfig, GraphicsAdapterSelector,
};
use wgpu::RequestAdapterOptions;

/// wgpu-specific implementation of [`GraphicsAdapterSelector`].
pub struct WgpuAdapterSelector {
    instance: wgpu::Instance,
}

impl WgpuAdapterSelector {
    /// Creates a selector sharing the backend's wgpu instance.
    pub fn new(instance: wgpu::Instance) -> Self {
        Self { instance }
    }

    fn backend_to_type(backend: wgpu::Backend) -> GraphicsBackendType {
        match backend {
            wgpu::Backend::Vulkan => GraphicsBackendType::Vulkan,
            wgpu::Backend::Metal => GraphicsBackendType::Metal,
            wgpu::Backend::Dx12 => GraphicsBackendType::Dx12,
            wgpu::Backend::Gl => GraphicsBackendType::OpenGL,
            wgpu::Backend::BrowserWebGpu => GraphicsBackendType::WebGpu,
            wgpu::Backend::Noop => GraphicsBackendType::Unknown,
        }
    }

    fn device_type_to_type(device_type: wgpu::DeviceType) -> DeviceType {
        match device_type {
            wgpu::DeviceType::IntegratedGpu => DeviceType::IntegratedGpu,
            wgpu::DeviceType::DiscreteGpu => DeviceType::DiscreteGpu,
            wgpu::DeviceType::VirtualGpu => DeviceType::VirtualGpu,
            wgpu::DeviceType::Cpu => DeviceType::Cpu,
            _ => DeviceType::Unknown,
        }
    }

    fn adapter_to_info(adapter: &wgpu::Adapter) -> AdapterInfo {
        let info = adapter.get_info();
        AdapterInfo {
            name: info.name.clone(),
            backend_type: Self::backend_to_type(info.backend),
            device_type: Self::device_type_to_type(info.device_type),
        }
    }
}

#[async_trait]
impl GraphicsAdapterSelector<wgpu::Adapter> for WgpuAdapterSelector {
    type Error = anyhow::Error;

    async fn select_adapter(
        &self,
        config: &AdapterSelectionConfig,
    ) -> Result<AdapterSelection<wgpu::Adapter>> {
        let power_preference = match config.power_preference {
            PowerPreference::LowPower => wgpu::PowerPreference::LowPower,
            PowerPreference::HighPerformance => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = self
            .instance
            .request_adapter(&RequestAdapterOptions {
                power_preference,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await;

        let adapter = match adapter {
            Ok(adapter) => adapter,
            Err(first_error) if config.allow_fallback_adapter => {
                log::warn!(
                    "No preferred adapter available ({first_error}); trying the fallback adapter"
                );
                self.instance
                    .request_adapter(&RequestAdapterOptions {
                        power_preference,
                        compatible_surface: None,
                        force_fallback_adapter: true,
                    })
                    .await
                    .map_err(|e| anyhow!("No suitable graphics adapter found: {e}"))?
            }
            Err(e) => return Err(anyhow!("No suitable graphics adapter found: {e}")),
        };

        let info = Self::adapter_to_info(&adapter);
        if let Some(preferred) = config.preferred_backend {
            if info.backend_type != preferred {
                log::warn!(
                    "Preferred backend {preferred:?} unavailable; using {:?}",
                    info.backend_type
                );
            }
        }

        Ok(AdapterSelection { adapter, info })
    }

    async fn list_adapters(
        &self,
        backend_type: GraphicsBackendType,
    ) -> Result<Vec<AdapterInfo>> {
        match self
            .instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
        {
            Ok(adapter) => {
                let info = Self::adapter_to_info(&adapter);
                if info.backend_type == backend_type {
                    Ok(vec![info])
                } else {
                    Ok(Vec::new())
                }
            }
            Err(_) => Ok(Vec::new()),
        }
    }
}
