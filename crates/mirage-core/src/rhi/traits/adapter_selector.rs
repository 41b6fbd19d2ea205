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

use crate::rhi::backend::PowerPreference;
use crate::rhi::capabilities::{AdapterInfo, GraphicsBackendType};
use async_trait::async_trait;

/// Preferences for picking a physical adapter.
#[derive(Debug, Clone, Default)]
pub struct AdapterSelectionConfig {
    /// Prefer a specific underlying API, if available.
    pub preferred_backend: Option<GraphicsBackendType>,
    /// Power/performance preference.
    pub power_preference: PowerPreference,
    /// Whether a software fallback adapter is acceptable.
    pub allow_fallback_adapter: bool,
}

/// The outcome of adapter selection.
#[derive(Debug)]
pub struct AdapterSelection<TAdapter> {
    /// The chosen native adapter.
    pub adapter: TAdapter,
    /// Its identity, for logging and telemetry.
    pub info: AdapterInfo,
}

/// A system that discovers and selects a suitable graphics adapter.
///
/// Adapter enumeration can be a slow I/O operation, so the primary method
/// is asynchronous. A concrete implementation lives in `mirage-infra` and
/// wraps the wgpu instance; backends without real adapters (the null
/// backend) do not need one.
#[async_trait]
pub trait GraphicsAdapterSelector<TAdapter> {
    /// The error type returned if selection fails.
    type Error: std::fmt::Debug + std::fmt::Display + Send + Sync + 'static;

    /// Selects the best available adapter for `config`, honoring its
    /// preferences where possible and falling back otherwise.
    async fn select_adapter(
        &self,
        config: &AdapterSelectionConfig,
    ) -> Result<AdapterSelection<TAdapter>, Self::Error>;

    /// Lists every adapter compatible with the given API.
    async fn list_adapters(
        &self,
        backend_type: GraphicsBackendType,
    ) -> Result<Vec<AdapterInfo>, Self::Error>;
}
