// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font request descriptors

use crate::fonts::{Charset, FaceName, FontWeight};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pitch and family class of a requested font
///
/// The low nibble carries the pitch, the high nibble the family class.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PitchAndFamily(pub u8);

impl PitchAndFamily {
    pub const DEFAULT_PITCH: u8 = 0;
    pub const FIXED_PITCH: u8 = 1;
    pub const VARIABLE_PITCH: u8 = 2;

    pub const FF_DONTCARE: u8 = 0x00;
    pub const FF_ROMAN: u8 = 0x10;
    pub const FF_SWISS: u8 = 0x20;
    pub const FF_MODERN: u8 = 0x30;
    pub const FF_SCRIPT: u8 = 0x40;
    pub const FF_DECORATIVE: u8 = 0x50;

    /// True if a fixed pitch was requested
    #[inline]
    pub fn is_fixed_pitch(self) -> bool {
        self.0 & Self::FIXED_PITCH != 0
    }

    /// The family class (high nibble)
    #[inline]
    pub fn family(self) -> u8 {
        self.0 & 0xf0
    }
}

/// An abstract font request
///
/// The numeric fields form the leading seven 32-bit words of the descriptor
/// (see [`LogFont::words`]); together with the face name they identify a
/// realized font in the cache.
///
/// `height` follows the classic convention: a positive value requests a cell
/// height, a negative value requests a character ("design") height, which
/// excludes internal leading. Zero selects a default size.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LogFont {
    pub height: i32,
    pub width: i32,
    pub escapement: i32,
    pub orientation: i32,
    pub weight: FontWeight,
    pub italic: bool,
    pub underline: bool,
    pub strike_out: bool,
    pub charset: Charset,
    pub out_precision: u8,
    pub clip_precision: u8,
    pub quality: u8,
    pub pitch_and_family: PitchAndFamily,
    /// Requested face name; empty to select any face
    pub face_name: String,
}

impl LogFont {
    /// Construct a request for `face_name` at `height` in the given charset
    pub fn new(face_name: &str, height: i32, charset: Charset) -> Self {
        LogFont {
            height,
            charset,
            face_name: face_name.to_string(),
            ..Default::default()
        }
    }

    /// True if an italic face is wanted
    #[inline]
    pub fn wants_italic(&self) -> bool {
        self.italic
    }

    /// True if a bold face is wanted
    #[inline]
    pub fn wants_bold(&self) -> bool {
        self.weight.is_bold()
    }

    /// True if a vertical-writing face is requested (name starts with `@`)
    #[inline]
    pub fn wants_vertical(&self) -> bool {
        self.face_name.starts_with('@')
    }

    /// The leading descriptor words, as laid out in the classic structure
    pub fn words(&self) -> [u32; 7] {
        let flags = u32::from_le_bytes([
            u8::from(self.italic),
            u8::from(self.underline),
            u8::from(self.strike_out),
            self.charset.0,
        ]);
        let precision = u32::from_le_bytes([
            self.out_precision,
            self.clip_precision,
            self.quality,
            self.pitch_and_family.0,
        ]);
        [
            self.height as u32,
            self.width as u32,
            self.escapement as u32,
            self.orientation as u32,
            u32::from(self.weight.value()),
            flags,
            precision,
        ]
    }

    /// Compare all fields except the face name
    pub(crate) fn same_fields(&self, other: &LogFont) -> bool {
        self.words() == other.words()
    }

    /// Compare face names as the registry does
    pub(crate) fn same_name(&self, other: &LogFont) -> bool {
        FaceName::eq_str(&self.face_name, &other.face_name)
    }
}

/// Glyph identifier (index within a face)
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlyphId(pub u16);

impl From<GlyphId> for ttf_parser::GlyphId {
    fn from(id: GlyphId) -> Self {
        ttf_parser::GlyphId(id.0)
    }
}

/// A 2×2 transformation matrix
///
/// Equality is bitwise, so that `-0.0` and `0.0` are distinct transforms
/// (the cache compares raw words).
#[derive(Copy, Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
}

impl Matrix {
    /// The identity transform
    pub const IDENTITY: Matrix = Matrix {
        m11: 1.0,
        m12: 0.0,
        m21: 0.0,
        m22: 1.0,
    };

    /// A uniform scale
    pub fn scale(s: f32) -> Self {
        Matrix {
            m11: s,
            m12: 0.0,
            m21: 0.0,
            m22: s,
        }
    }

    /// Raw words
    pub fn words(&self) -> [u32; 4] {
        [
            self.m11.to_bits(),
            self.m12.to_bits(),
            self.m21.to_bits(),
            self.m22.to_bits(),
        ]
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix::IDENTITY
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.words() == other.words()
    }
}

impl Eq for Matrix {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_pack_flags_little_endian() {
        let mut lf = LogFont::new("Arial", -12, Charset::SHIFTJIS);
        lf.italic = true;
        lf.pitch_and_family = PitchAndFamily(PitchAndFamily::FF_SWISS | 2);
        let words = lf.words();
        assert_eq!(words[0], (-12i32) as u32);
        assert_eq!(words[4], 400);
        assert_eq!(words[5], 0x8000_0001);
        assert_eq!(words[6], 0x2200_0000);
    }

    #[test]
    fn matrix_equality_is_bitwise() {
        let a = Matrix::IDENTITY;
        let mut b = Matrix::IDENTITY;
        b.m12 = -0.0;
        assert_ne!(a, b);
        assert_eq!(a, Matrix::scale(1.0));
    }
}
