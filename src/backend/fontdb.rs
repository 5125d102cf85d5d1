// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Backend over `fontdb` discovery and `ttf-parser` face access

use super::{
    Backend, FaceMetrics, FallbackClass, GlyphUnits, KerningPair, NativeFace, Outline,
    PathSegment, UnitRect,
};
use crate::fonts::{families, BitmapSize, FaceDesc, FaceFlags, FaceSource, FontError};
use crate::fonts::{Signature, StyleFlags};
use crate::GlyphId;
use fontdb::{Database, Family, Source};
use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use ttf_parser::{name_id, Face, Tag};

type Blob = Arc<dyn AsRef<[u8]> + Send + Sync>;

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

fn read_i16(data: &[u8], offset: usize) -> Option<i16> {
    read_u16(data, offset).map(|x| x as i16)
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn table<'a>(face: &Face<'a>, tag: &[u8; 4]) -> Option<&'a [u8]> {
    face.raw_face().table(Tag::from_bytes(tag))
}

/// Codepage coverage from OS/2 `ulCodePageRange1`
///
/// Faces without the field (OS/2 version 0 or no table) are taken to cover
/// Latin 1 only.
fn codepage_signature(face: &Face) -> Signature {
    let Some(os2) = table(face, b"OS/2") else {
        return Signature::LATIN1;
    };
    match read_u16(os2, 0) {
        Some(version) if version >= 1 => read_u32(os2, 78)
            .map(Signature::from_bits_retain)
            .filter(|sig| !sig.is_empty())
            .unwrap_or(Signature::LATIN1),
        _ => Signature::LATIN1,
    }
}

/// `fontRevision` from the `head` table
fn font_revision(face: &Face) -> u32 {
    table(face, b"head").and_then(|head| read_u32(head, 4)).unwrap_or(0)
}

fn english_name(face: &Face, id: u16) -> Option<String> {
    let mut fallback = None;
    for name in face.names() {
        if name.name_id != id || !name.is_unicode() {
            continue;
        }
        let Some(s) = name.to_string() else {
            continue;
        };
        if name.language() == ttf_parser::Language::English_UnitedStates {
            return Some(s);
        }
        fallback.get_or_insert(s);
    }
    fallback
}

fn describe(info: &fontdb::FaceInfo, data: &[u8]) -> Option<FaceDesc> {
    let face = match Face::parse(data, info.index) {
        Ok(face) => face,
        Err(err) => {
            warn!("skipping face {:?}: {err}", info.source);
            return None;
        }
    };

    let mut families = info.families.iter().map(|(name, _)| name.as_str());
    let family_name = families.next()?.to_string();
    let second_name = families.find(|n| *n != family_name).map(str::to_string);
    let style_name = english_name(&face, name_id::SUBFAMILY).unwrap_or_else(|| "Regular".into());
    let full_name = english_name(&face, name_id::FULL_NAME)
        .unwrap_or_else(|| format!("{family_name} {style_name}"));

    let source = match &info.source {
        Source::File(path) | Source::SharedFile(path, _) => FaceSource::File(path.clone()),
        Source::Binary(data) => FaceSource::Memory(data.clone()),
    };

    Some(FaceDesc {
        family_name,
        second_name,
        style_name,
        full_name,
        source,
        index: info.index,
        signature: codepage_signature(&face),
        style: StyleFlags::from_style(face.is_bold(), face.is_italic()),
        version: font_revision(&face),
        scalable: true,
        size: BitmapSize::default(),
        flags: FaceFlags::empty(),
    })
}

/// A [`Backend`] discovering faces with `fontdb`
pub struct FontdbBackend {
    db: Database,
}

impl Default for FontdbBackend {
    fn default() -> Self {
        FontdbBackend::new()
    }
}

impl FontdbBackend {
    /// Construct with an empty database
    pub fn new() -> Self {
        FontdbBackend { db: Database::new() }
    }

    /// Construct and load the system's fonts
    pub fn system() -> Self {
        let mut backend = FontdbBackend::new();
        backend.db.load_system_fonts();
        backend
    }

    /// Load all fonts from a directory
    pub fn load_fonts_dir<P: AsRef<Path>>(&mut self, dir: P) {
        self.db.load_fonts_dir(dir);
    }

    /// Load a font from memory
    pub fn load_font_data(&mut self, data: Vec<u8>) {
        self.db.load_font_data(data);
    }

    /// Access the database
    pub fn database(&self) -> &Database {
        &self.db
    }
}

impl Backend for FontdbBackend {
    fn discover(&mut self) -> Vec<FaceDesc> {
        families::set_defaults(&mut self.db);
        info!("Found {} fonts", self.db.len());

        let db = &self.db;
        db.faces()
            .filter_map(|info| db.with_face_data(info.id, |data, _| describe(info, data)))
            .flatten()
            .collect()
    }

    fn load(&self, source: &FaceSource, index: u32) -> Result<Box<dyn NativeFace>, FontError> {
        let data: Blob = match source {
            FaceSource::File(path) => Arc::new(std::fs::read(path)?),
            FaceSource::Memory(data) => data.clone(),
        };
        Ok(Box::new(TtfFace::new(data, index)?))
    }

    fn family_fallbacks(&self, class: FallbackClass) -> Vec<String> {
        let family = match class {
            FallbackClass::Fixed => Family::Monospace,
            FallbackClass::Serif => Family::Serif,
            FallbackClass::Sans => Family::SansSerif,
        };
        vec![self.db.family_name(&family).to_string()]
    }
}

/// A face parsed with `ttf-parser`
struct TtfFace {
    // Declared before `data` so that it is dropped first
    face: Face<'static>,
    #[allow(unused)]
    data: Blob,
}

impl TtfFace {
    fn new(data: Blob, index: u32) -> Result<Self, FontError> {
        // Safety: `face` borrows the heap allocation behind `data`, which is
        // reference-counted, never mutated and outlives `face` (field order).
        let slice = unsafe { extend_lifetime((*data).as_ref()) };
        let face = Face::parse(slice, index)?;
        Ok(TtfFace { face, data })
    }
}

unsafe fn extend_lifetime<'b, T: ?Sized>(r: &'b T) -> &'static T {
    std::mem::transmute::<&'b T, &'static T>(r)
}

struct OutlineSink(Vec<PathSegment>);

impl ttf_parser::OutlineBuilder for OutlineSink {
    fn move_to(&mut self, x: f32, y: f32) {
        self.0.push(PathSegment::MoveTo(x, y));
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.0.push(PathSegment::LineTo(x, y));
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.0.push(PathSegment::QuadTo(x1, y1, x, y));
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.0.push(PathSegment::CurveTo(x1, y1, x2, y2, x, y));
    }

    fn close(&mut self) {
        self.0.push(PathSegment::Close);
    }
}

fn unit_rect(rect: ttf_parser::Rect) -> UnitRect {
    UnitRect {
        x_min: rect.x_min,
        y_min: rect.y_min,
        x_max: rect.x_max,
        y_max: rect.y_max,
    }
}

/// Read horizontal format-0 pairs from a (Microsoft) `kern` table
fn kern_format0(data: &[u8]) -> Vec<KerningPair> {
    let mut pairs = vec![];
    let Some(n_tables) = read_u16(data, 2) else {
        return pairs;
    };
    let mut offset = 4;
    for _ in 0..n_tables {
        let (Some(length), Some(coverage)) = (read_u16(data, offset + 2), read_u16(data, offset + 4))
        else {
            break;
        };
        let horizontal = coverage & 1 != 0;
        let format = coverage >> 8;
        if horizontal && format == 0 {
            let n_pairs = read_u16(data, offset + 6).unwrap_or(0);
            let base = offset + 14;
            for i in 0..usize::from(n_pairs) {
                let at = base + i * 6;
                let (Some(left), Some(right), Some(value)) =
                    (read_u16(data, at), read_u16(data, at + 2), read_i16(data, at + 4))
                else {
                    break;
                };
                pairs.push(KerningPair {
                    left: GlyphId(left),
                    right: GlyphId(right),
                    value,
                });
            }
        }
        if length < 6 {
            break;
        }
        offset += usize::from(length);
    }
    pairs
}

impl NativeFace for TtfFace {
    fn metrics(&self) -> FaceMetrics {
        let face = &self.face;
        let os2 = table(face, b"OS/2");
        let hhea = table(face, b"hhea");
        FaceMetrics {
            units_per_em: face.units_per_em(),
            ascender: face.ascender(),
            descender: face.descender(),
            line_gap: face.line_gap(),
            avg_char_width: os2.and_then(|t| read_i16(t, 2)).unwrap_or(0),
            max_advance: hhea.and_then(|t| read_u16(t, 10)).unwrap_or(0),
            weight: face.weight().to_number(),
            italic: face.is_italic(),
            monospaced: face.is_monospaced(),
            first_char: os2.and_then(|t| read_u16(t, 64)).map(u32::from).unwrap_or(0),
            last_char: os2.and_then(|t| read_u16(t, 66)).map(u32::from).unwrap_or(0xffff),
        }
    }

    fn table_data(&self, tag: [u8; 4]) -> Option<&[u8]> {
        table(&self.face, &tag)
    }

    fn glyph_index(&self, c: char) -> Option<GlyphId> {
        self.face.glyph_index(c).map(|id| GlyphId(id.0))
    }

    fn default_glyph(&self) -> GlyphId {
        // .notdef unless the face maps the replacement character
        self.glyph_index('\u{fffd}').unwrap_or(GlyphId(0))
    }

    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphUnits> {
        let id = glyph.into();
        let advance = self.face.glyph_hor_advance(id)?;
        Some(GlyphUnits {
            advance,
            left_side_bearing: self.face.glyph_hor_side_bearing(id).unwrap_or(0),
            bbox: self.face.glyph_bounding_box(id).map(unit_rect),
        })
    }

    fn glyph_outline(&self, glyph: GlyphId) -> Option<Outline> {
        let mut sink = OutlineSink(vec![]);
        let bbox = self.face.outline_glyph(glyph.into(), &mut sink)?;
        Some(Outline {
            segments: sink.0,
            bbox: unit_rect(bbox),
        })
    }

    fn kerning_pairs(&self) -> Vec<KerningPair> {
        table(&self.face, b"kern").map(kern_format0).unwrap_or_default()
    }

    fn unicode_ranges(&self) -> Vec<(u32, u32)> {
        let mut points = vec![];
        if let Some(cmap) = self.face.tables().cmap {
            for subtable in cmap.subtables {
                if subtable.is_unicode() {
                    subtable.codepoints(|cp| points.push(cp));
                }
            }
        }
        points.sort_unstable();
        points.dedup();

        let mut ranges: Vec<(u32, u32)> = vec![];
        for cp in points {
            match ranges.last_mut() {
                Some(last) if last.1 + 1 == cp => last.1 = cp,
                _ => ranges.push((cp, cp)),
            }
        }
        ranges
    }
}
