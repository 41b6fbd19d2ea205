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

//! Device capability reporting.

/// A backend-agnostic representation of the underlying graphics API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GraphicsBackendType {
    /// Vulkan API.
    Vulkan,
    /// Apple's Metal API.
    Metal,
    /// Microsoft's DirectX 12 API.
    Dx12,
    /// OpenGL API.
    OpenGL,
    /// WebGPU API (for web builds).
    WebGpu,
    /// The headless null backend.
    Null,
    /// An unknown or unsupported backend.
    #[default]
    Unknown,
}

/// The physical type of a graphics device (GPU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceType {
    /// A GPU integrated into the CPU.
    IntegratedGpu,
    /// A discrete, dedicated GPU.
    DiscreteGpu,
    /// A virtualized or software-based GPU.
    VirtualGpu,
    /// A software renderer running on the CPU.
    Cpu,
    /// An unknown or unsupported device type.
    #[default]
    Unknown,
}

/// Identity of the adapter a backend selected.
#[derive(Debug, Clone, Default)]
pub struct AdapterInfo {
    /// The adapter name reported by the driver.
    pub name: String,
    /// The underlying graphics API.
    pub backend_type: GraphicsBackendType,
    /// The physical device type.
    pub device_type: DeviceType,
}

/// The feature and limit set a backend reports after device creation.
///
/// Pipeline validation consults these: a pipeline requesting more color
/// targets than `max_color_attachments`, or tessellation stages on a
/// device without `supports_tessellation`, fails creation deterministically.
#[derive(Debug, Clone)]
pub struct Capabilities {
    /// The maximum number of simultaneous color attachments.
    pub max_color_attachments: u32,
    /// The maximum 2D texture dimension.
    pub max_texture_dimension_2d: u32,
    /// The required alignment for uniform buffer binding offsets.
    pub min_uniform_buffer_offset_alignment: u32,
    /// Whether tessellation shader stages are available.
    pub supports_tessellation: bool,
    /// Whether the geometry shader stage is available.
    pub supports_geometry_shaders: bool,
    /// Whether compute pipelines are available.
    pub supports_compute: bool,
    /// Whether indirect draw/dispatch argument buffers are available.
    pub supports_indirect_draw: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            max_color_attachments: 8,
            max_texture_dimension_2d: 8192,
            min_uniform_buffer_offset_alignment: 256,
            supports_tessellation: false,
            supports_geometry_shaders: false,
            supports_compute: true,
            supports_indirect_draw: true,
        }
    }
}
