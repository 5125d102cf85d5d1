// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Rasterizer-provider seam
//!
//! A [`Backend`] discovers faces and loads them into [`NativeFace`] objects.
//! All quantities a native face reports are in font units; the font system
//! scales them per realized font.

use crate::fonts::{FaceDesc, FaceSource, FontError};
use crate::GlyphId;

mod fontdb;
pub use self::fontdb::FontdbBackend;

/// Generic family class used when choosing fallback families
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FallbackClass {
    Fixed,
    Serif,
    Sans,
}

/// Face-level metrics in font units
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceMetrics {
    pub units_per_em: u16,
    pub ascender: i16,
    pub descender: i16,
    pub line_gap: i16,
    pub avg_char_width: i16,
    pub max_advance: u16,
    pub weight: u16,
    pub italic: bool,
    pub monospaced: bool,
    pub first_char: u32,
    pub last_char: u32,
}

/// A rectangle in font units
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct UnitRect {
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

/// Glyph metrics in font units
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphUnits {
    pub advance: u16,
    pub left_side_bearing: i16,
    /// `None` for empty glyphs (e.g. space)
    pub bbox: Option<UnitRect>,
}

/// One outline path segment, in font units
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathSegment {
    MoveTo(f32, f32),
    LineTo(f32, f32),
    QuadTo(f32, f32, f32, f32),
    CurveTo(f32, f32, f32, f32, f32, f32),
    Close,
}

/// A glyph outline
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    pub segments: Vec<PathSegment>,
    pub bbox: UnitRect,
}

/// A kerning adjustment between two glyphs, in font units
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct KerningPair {
    pub left: GlyphId,
    pub right: GlyphId,
    pub value: i16,
}

/// A loaded face
pub trait NativeFace: Send {
    /// Face-level metrics
    fn metrics(&self) -> FaceMetrics;

    /// Raw table bytes by tag
    fn table_data(&self, tag: [u8; 4]) -> Option<&[u8]>;

    /// Map a character to a glyph, `None` if not covered
    fn glyph_index(&self, c: char) -> Option<GlyphId>;

    /// The glyph drawn for characters no face covers
    fn default_glyph(&self) -> GlyphId {
        GlyphId(0)
    }

    /// Glyph metrics, `None` for an invalid glyph
    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphUnits>;

    /// Glyph outline, `None` for an invalid or empty glyph
    fn glyph_outline(&self, glyph: GlyphId) -> Option<Outline>;

    /// All kerning pairs
    fn kerning_pairs(&self) -> Vec<KerningPair>;

    /// Covered code point ranges (inclusive), sorted
    fn unicode_ranges(&self) -> Vec<(u32, u32)>;
}

/// A face provider
pub trait Backend: Send {
    /// Discover available faces
    ///
    /// Called once at startup; each result is inserted into the registry.
    fn discover(&mut self) -> Vec<FaceDesc>;

    /// Load a face
    fn load(&self, source: &FaceSource, index: u32) -> Result<Box<dyn NativeFace>, FontError>;

    /// Extra fallback family names for a class, beyond the built-in ones
    fn family_fallbacks(&self, class: FallbackClass) -> Vec<String> {
        let _ = class;
        vec![]
    }
}

/// Merge sorted inclusive ranges, joining adjacent ones
pub(crate) fn merge_ranges(mut ranges: Vec<(u32, u32)>) -> Vec<(u32, u32)> {
    ranges.sort_unstable();
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for (start, end) in ranges {
        match out.last_mut() {
            Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
            _ => out.push((start, end)),
        }
    }
    out
}
