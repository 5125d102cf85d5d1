// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Shared fixtures: an in-memory backend and store

#![allow(dead_code)]

use kas_font_cache::backend::{
    Backend, FaceMetrics, FallbackClass, GlyphUnits, KerningPair, NativeFace, Outline, PathSegment,
    UnitRect,
};
use kas_font_cache::fonts::{
    BitmapSize, FaceDesc, FaceFlags, FaceSource, FontError, FontSystem, Signature, StyleFlags,
};
use kas_font_cache::store::{ConfigStore, ConfigValue, MemoryStore};
use kas_font_cache::GlyphId;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Description and contents of a synthetic face
#[derive(Clone, Debug)]
pub struct MockFace {
    pub desc: FaceDesc,
    /// Covered characters; glyph ids are positions plus one
    pub chars: Vec<char>,
    pub gsub: Option<Vec<u8>>,
    pub kerning: Vec<KerningPair>,
}

impl MockFace {
    pub fn new(family: &str, full_name: &str, style: StyleFlags, file: &str) -> Self {
        let style_name = match (style.is_bold(), style.is_italic()) {
            (true, true) => "Bold Italic",
            (true, false) => "Bold",
            (false, true) => "Italic",
            (false, false) => "Regular",
        };
        MockFace {
            desc: FaceDesc {
                family_name: family.to_string(),
                second_name: None,
                style_name: style_name.to_string(),
                full_name: full_name.to_string(),
                source: FaceSource::File(PathBuf::from(file)),
                index: 0,
                signature: Signature::LATIN1,
                style,
                version: 1,
                scalable: true,
                size: BitmapSize::default(),
                flags: FaceFlags::empty(),
            },
            chars: "abcdefghijklmnopqrstuvwxyz".chars().collect(),
            gsub: None,
            kerning: vec![],
        }
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.desc.signature = signature;
        self
    }

    /// Make this a bitmap face with the given cell height
    pub fn bitmap(mut self, height: i16) -> Self {
        self.desc.scalable = false;
        self.desc.size = BitmapSize {
            height,
            width: height / 2,
            size: height * 64,
            x_ppem: height,
            y_ppem: height,
            internal_leading: 0,
        };
        self
    }

    pub fn chars(mut self, chars: &str) -> Self {
        self.chars = chars.chars().collect();
        self
    }

    pub fn gsub(mut self, table: Vec<u8>) -> Self {
        self.gsub = Some(table);
        self
    }

    pub fn kerning(mut self, pairs: &[(u16, u16, i16)]) -> Self {
        self.kerning = pairs
            .iter()
            .map(|&(left, right, value)| KerningPair {
                left: GlyphId(left),
                right: GlyphId(right),
                value,
            })
            .collect();
        self
    }

    /// The glyph id this face maps `c` to
    pub fn glyph(&self, c: char) -> GlyphId {
        let pos = self.chars.iter().position(|x| *x == c).unwrap();
        GlyphId(pos as u16 + 1)
    }
}

/// Upem 1000, ascender 800, descender -200
pub const UNITS_PER_EM: u16 = 1000;

struct MockNative(MockFace);

impl NativeFace for MockNative {
    fn metrics(&self) -> FaceMetrics {
        FaceMetrics {
            units_per_em: UNITS_PER_EM,
            ascender: 800,
            descender: -200,
            line_gap: 0,
            avg_char_width: 500,
            max_advance: 600,
            weight: if self.0.desc.style.is_bold() { 700 } else { 400 },
            italic: self.0.desc.style.is_italic(),
            monospaced: false,
            first_char: self.0.chars.iter().map(|c| *c as u32).min().unwrap_or(0),
            last_char: self.0.chars.iter().map(|c| *c as u32).max().unwrap_or(0),
        }
    }

    fn table_data(&self, tag: [u8; 4]) -> Option<&[u8]> {
        match &tag {
            b"GSUB" => self.0.gsub.as_deref(),
            _ => None,
        }
    }

    fn glyph_index(&self, c: char) -> Option<GlyphId> {
        let pos = self.0.chars.iter().position(|x| *x == c)?;
        Some(GlyphId(pos as u16 + 1))
    }

    fn glyph_metrics(&self, glyph: GlyphId) -> Option<GlyphUnits> {
        (glyph.0 != 0).then_some(GlyphUnits {
            advance: 600,
            left_side_bearing: 50,
            bbox: Some(UnitRect {
                x_min: 50,
                y_min: 0,
                x_max: 550,
                y_max: 700,
            }),
        })
    }

    fn glyph_outline(&self, glyph: GlyphId) -> Option<Outline> {
        let metrics = self.glyph_metrics(glyph)?;
        let b = metrics.bbox?;
        let (x0, y0, x1, y1) = (b.x_min as f32, b.y_min as f32, b.x_max as f32, b.y_max as f32);
        Some(Outline {
            segments: vec![
                PathSegment::MoveTo(x0, y0),
                PathSegment::LineTo(x1, y0),
                PathSegment::LineTo(x1, y1),
                PathSegment::LineTo(x0, y1),
                PathSegment::Close,
            ],
            bbox: b,
        })
    }

    fn kerning_pairs(&self) -> Vec<KerningPair> {
        self.0.kerning.clone()
    }

    fn unicode_ranges(&self) -> Vec<(u32, u32)> {
        self.0.chars.iter().map(|c| (*c as u32, *c as u32)).collect()
    }
}

/// A backend serving [`MockFace`]s
///
/// Counters are shared between clones so that a test may keep observing a
/// backend after handing it to a [`FontSystem`].
#[derive(Clone, Default)]
pub struct MockBackend {
    faces: Arc<Vec<MockFace>>,
    pub sans: Vec<String>,
    /// Discover faces but fail to load any
    pub fail_loads: bool,
    pub loads: Arc<AtomicUsize>,
    pub discovers: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn new(faces: Vec<MockFace>) -> Self {
        MockBackend {
            faces: Arc::new(faces),
            ..Default::default()
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn discovers(&self) -> usize {
        self.discovers.load(Ordering::SeqCst)
    }
}

impl Backend for MockBackend {
    fn discover(&mut self) -> Vec<FaceDesc> {
        self.discovers.fetch_add(1, Ordering::SeqCst);
        self.faces.iter().map(|face| face.desc.clone()).collect()
    }

    fn load(&self, source: &FaceSource, index: u32) -> Result<Box<dyn NativeFace>, FontError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let face = self
            .faces
            .iter()
            .filter(|_| !self.fail_loads)
            .find(|face| face.desc.source.same_file(source) && face.desc.index == index)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such face"))?;
        Ok(Box::new(MockNative(face.clone())))
    }

    fn family_fallbacks(&self, class: FallbackClass) -> Vec<String> {
        match class {
            FallbackClass::Sans => self.sans.clone(),
            _ => vec![],
        }
    }
}

/// A store shared between a test and a [`FontSystem`]
#[derive(Clone, Default)]
pub struct SharedStore(pub Arc<Mutex<MemoryStore>>);

impl SharedStore {
    pub fn new(store: MemoryStore) -> Self {
        SharedStore(Arc::new(Mutex::new(store)))
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.0.lock().unwrap().has_key(key)
    }
}

impl ConfigStore for SharedStore {
    fn values(&self, key: &str) -> Vec<(String, ConfigValue)> {
        self.0.lock().unwrap().values(key)
    }

    fn subkeys(&self, key: &str) -> Vec<String> {
        self.0.lock().unwrap().subkeys(key)
    }

    fn set_value(&mut self, key: &str, name: &str, value: ConfigValue) {
        self.0.lock().unwrap().set_value(key, name, value)
    }

    fn delete_value(&mut self, key: &str, name: &str) {
        self.0.lock().unwrap().delete_value(key, name)
    }

    fn delete_tree(&mut self, key: &str) {
        self.0.lock().unwrap().delete_tree(key)
    }
}

fn be(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes()).collect()
}

fn tag_words(tag: &[u8; 4]) -> [u16; 2] {
    [
        u16::from_be_bytes([tag[0], tag[1]]),
        u16::from_be_bytes([tag[2], tag[3]]),
    ]
}

/// A GSUB table with a `vert` feature for `script` whose single lookup adds
/// `delta` to each glyph of `coverage`
pub fn vert_gsub(script: &[u8; 4], coverage: &[u16], delta: i16) -> Vec<u8> {
    let mut w: Vec<u16> = vec![1, 0, 10, 0, 0];
    let script_list = w.len() * 2;
    w.push(1);
    w.extend_from_slice(&tag_words(script));
    w.push(8);
    w.extend_from_slice(&[4, 0]);
    w.extend_from_slice(&[0, 0xffff, 1, 0]);
    let feature_list = w.len() * 2;
    w.push(1);
    w.extend_from_slice(&tag_words(b"vert"));
    w.push(8);
    w.extend_from_slice(&[0, 1, 0]);
    let lookup_list = w.len() * 2;
    w.extend_from_slice(&[1, 4]);
    w.extend_from_slice(&[1, 0, 1, 8]);
    // single substitution format 1, coverage table at +6
    w.extend_from_slice(&[1, 6, delta as u16, 1, coverage.len() as u16]);
    w.extend_from_slice(coverage);

    w[2] = script_list as u16;
    w[3] = feature_list as u16;
    w[4] = lookup_list as u16;
    be(&w)
}

/// Fullwidth parenthesis, drawn rotated in vertical text
pub const PAREN: char = '\u{ff08}';

/// The standard face set
///
/// Arial (regular, bold), Times New Roman, MS Gothic (Japanese, with a
/// `vert` table mapping its glyphs `+100`) and the Fixedsys bitmap face of
/// cell height 10.
pub fn faces() -> Vec<MockFace> {
    let gothic = MockFace::new("MS Gothic", "MS Gothic", StyleFlags::REGULAR, "/fonts/msgothic.ttc")
        .signature(Signature::LATIN1 | Signature::JISJAPAN)
        .chars("ab\u{ff08}\u{3042}");
    let coverage = [gothic.glyph('a').0, gothic.glyph(PAREN).0];
    let gothic = gothic.gsub(vert_gsub(b"kana", &coverage, 100));

    vec![
        MockFace::new("Arial", "Arial", StyleFlags::REGULAR, "/fonts/arial.ttf")
            .signature(Signature::LATIN1 | Signature::CYRILLIC)
            .kerning(&[(1, 22, -100), (22, 1, -60)]),
        MockFace::new("Arial", "Arial Bold", StyleFlags::BOLD, "/fonts/arialbd.ttf")
            .signature(Signature::LATIN1 | Signature::CYRILLIC),
        MockFace::new("Times New Roman", "Times New Roman", StyleFlags::REGULAR, "/fonts/times.ttf"),
        gothic,
        MockFace::new("Fixedsys", "Fixedsys", StyleFlags::REGULAR, "/fonts/vgafix.fon").bitmap(10),
    ]
}

/// A system over `backend` and `store`
pub fn system_with(backend: &MockBackend, store: MemoryStore) -> FontSystem {
    FontSystem::new(Box::new(backend.clone()), Box::new(store))
}

/// A system over the standard faces and an empty store
pub fn system() -> (FontSystem, MockBackend) {
    let backend = MockBackend::new(faces());
    (system_with(&backend, MemoryStore::new()), backend)
}
