// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Arena slots, list positions and glyph indices are represented as `u32`
//! instead of `usize` in order to save space. Registries are not expected to
//! grow anywhere close to `u32::MAX` entries, so `u32` is always an
//! appropriate index type.

use easy_cast::{Cast, CastFloat};

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// Scale factor: pixels per font unit
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DPU(pub f32);

impl DPU {
    /// Construct from pixels-per-em and the face's units-per-em
    ///
    /// A zero `units_per_em` (a broken face) yields a zero scale.
    pub fn from_ppem(ppem: f32, units_per_em: u16) -> Self {
        if units_per_em == 0 {
            DPU(0.0)
        } else {
            DPU(ppem / f32::from(units_per_em))
        }
    }

    pub(crate) fn i16_to_px(self, x: i16) -> i32 {
        saturating_px(f32::from(x) * self.0)
    }

    pub(crate) fn u16_to_px(self, x: u16) -> i32 {
        saturating_px(f32::from(x) * self.0)
    }
}

/// Round to the nearest pixel, saturating out-of-range values
fn saturating_px(x: f32) -> i32 {
    x.try_cast_nearest()
        .unwrap_or(if x < 0.0 { i32::MIN } else { i32::MAX })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dpu_rounds_to_nearest_pixel() {
        let dpu = DPU::from_ppem(16.0, 2048);
        assert_eq!(dpu.u16_to_px(1229), 10);
        assert_eq!(dpu.i16_to_px(-434), -3);
        assert_eq!(DPU::from_ppem(16.0, 0), DPU(0.0));
    }

    #[test]
    fn dpu_saturates_huge_scales() {
        let dpu = DPU::from_ppem(i32::MAX as f32, 16);
        assert_eq!(dpu.u16_to_px(1000), i32::MAX);
        assert_eq!(dpu.i16_to_px(-1000), i32::MIN);
    }
}
