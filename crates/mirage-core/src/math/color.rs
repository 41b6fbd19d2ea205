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

//! The `LinearRgba` color type.

/// A color in **linear RGBA** space with `f32` components.
///
/// Linear space is required for correct blending and lighting math;
/// components may exceed `1.0` for HDR values. `#[repr(C)]` keeps the
/// layout stable for upload to graphics APIs.
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct LinearRgba {
    /// The red component in linear space.
    pub r: f32,
    /// The green component in linear space.
    pub g: f32,
    /// The blue component in linear space.
    pub b: f32,
    /// The alpha (opacity) component.
    pub a: f32,
}

impl LinearRgba {
    /// Opaque white (`[1.0, 1.0, 1.0, 1.0]`).
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Opaque black (`[0.0, 0.0, 0.0, 1.0]`).
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Fully transparent black (`[0.0, 0.0, 0.0, 0.0]`).
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
    /// Opaque red (`[1.0, 0.0, 0.0, 1.0]`).
    pub const RED: Self = Self::rgb(1.0, 0.0, 0.0);
    /// Opaque green (`[0.0, 1.0, 0.0, 1.0]`).
    pub const GREEN: Self = Self::rgb(0.0, 1.0, 0.0);
    /// Opaque blue (`[0.0, 0.0, 1.0, 1.0]`).
    pub const BLUE: Self = Self::rgb(0.0, 0.0, 1.0);

    /// Creates a new `LinearRgba` with explicit RGBA values.
    #[inline]
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a new opaque `LinearRgba` (alpha = 1.0).
    #[inline]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Returns the components as an `[r, g, b, a]` array.
    #[inline]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Creates a color from an sRGB-encoded triple, converting to linear.
    pub fn from_srgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgb(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b))
    }
}

impl Default for LinearRgba {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

impl From<[f32; 4]> for LinearRgba {
    fn from(value: [f32; 4]) -> Self {
        Self::new(value[0], value[1], value[2], value[3])
    }
}

/// Converts an sRGB component to linear space.
#[inline]
fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_have_expected_components() {
        assert_eq!(LinearRgba::WHITE.to_array(), [1.0, 1.0, 1.0, 1.0]);
        assert_eq!(LinearRgba::TRANSPARENT.a, 0.0);
        assert_eq!(LinearRgba::RED.r, 1.0);
        assert_eq!(LinearRgba::RED.g, 0.0);
    }

    #[test]
    fn srgb_conversion_is_monotonic() {
        let dark = LinearRgba::from_srgb(0.2, 0.2, 0.2);
        let bright = LinearRgba::from_srgb(0.8, 0.8, 0.8);
        assert!(dark.r < bright.r);
        // Values at the extremes pass through unchanged.
        assert_eq!(LinearRgba::from_srgb(0.0, 0.0, 0.0).r, 0.0);
        assert!((LinearRgba::from_srgb(1.0, 1.0, 1.0).r - 1.0).abs() < 1e-6);
    }
}
