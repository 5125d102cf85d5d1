// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Realized font cache
//!
//! Every realized font lives in the handle table and in the cache list (most
//! recently used first). Fonts whose reference count dropped to zero are also
//! on the unused list, from which the least recently released is evicted once
//! the list grows beyond [`UNUSED_CACHE_SIZE`].

use super::glyph_cache::{GlyphCache, GlyphMetrics};
use super::gsub::VerticalSubst;
use super::handles::{FontHandle, HandleTable};
use super::registry::{FaceId, Registry};
use super::resolver::{bitmap_height_diff, Matcher};
use super::{Charset, Face, FaceName, InvalidHandle, Signature};
use crate::backend::{FaceMetrics, GlyphUnits, KerningPair, NativeFace};
use crate::conv::DPU;
use crate::{LogFont, Matrix};
use log::{debug, trace, warn};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Number of released fonts kept for reuse
pub const UNUSED_CACHE_SIZE: usize = 10;

/// Family whose cascade is appended under double-byte locales
const DBCS_FALLBACK_FAMILY: &str = "Microsoft Sans Serif";

/// Pixels per em used for a zero request height
const DEFAULT_PPEM: f32 = 16.0;

/// Realized-font cache hash
///
/// Mixes the matrix words, the descriptor words and the upper-cased name (as
/// pairs of UTF-16 units), then the bitmap flag.
pub fn font_hash(lf: &LogFont, matrix: &Matrix, allow_bitmap: bool) -> u32 {
    let mut hash = 0;
    for word in matrix.words() {
        hash ^= word;
    }
    for word in lf.words() {
        hash ^= word;
    }

    let name = super::name::truncate_face_name(&lf.face_name);
    let units: Vec<u16> = name.encode_utf16().map(upper_unit).collect();
    for pair in units.chunks(2) {
        let lo = u32::from(pair[0]);
        let hi = pair.get(1).map(|u| u32::from(*u)).unwrap_or(0);
        hash ^= lo | (hi << 16);
    }

    hash ^ u32::from(!allow_bitmap)
}

fn upper_unit(unit: u16) -> u16 {
    let Some(c) = char::from_u32(u32::from(unit)) else {
        return unit;
    };
    let mut upper = c.to_uppercase();
    match (upper.next(), upper.next()) {
        (Some(u), None) => u16::try_from(u32::from(u)).unwrap_or(unit),
        _ => unit,
    }
}

/// Integer magnification of a bitmap face for a requested height
///
/// Scales by whole multiples of the face's cell height: the next multiple
/// is chosen only if it overshoots by at most a quarter of the base height
/// (one pixel less when going from single to double size).
pub fn bitmap_scale(height: i32, m22: f32, face: &Face) -> u32 {
    let base = i64::from(face.size.height);
    if base <= 0 {
        return 1;
    }
    let diff = i64::from(bitmap_height_diff(height, face));

    let mut h = (f64::from(height) * f64::from(m22)).round().abs() as i64;
    if h != 0 {
        h = diff;
    }
    h += base;

    let mut scale = (h + base - 1) / base;
    let scaled = scale * base;
    if scale > 2 && scaled - h > base / 4 {
        scale -= 1;
    } else if scale == 2 && scaled - h > base / 4 - 1 {
        scale -= 1;
    }
    u32::try_from(scale.max(1)).unwrap_or(u32::MAX)
}

/// A font instance bound to a face, a request and a transform
pub struct RealizedFont {
    pub(crate) lf: LogFont,
    pub(crate) matrix: Matrix,
    pub(crate) allow_bitmap: bool,
    pub(crate) hash: u32,
    pub(crate) face: FaceId,
    /// Name the font reports (its family, or the alias it was selected by)
    pub(crate) name: FaceName,
    pub(crate) charset: Charset,
    pub(crate) codepage: u16,
    pub(crate) signature: Signature,
    pub(crate) scalable: bool,
    /// Base strike of a bitmap face
    pub(crate) bitmap_ppem: i16,
    pub(crate) scale_y: u32,
    pub(crate) vertical: bool,
    pub(crate) children: SmallVec<[Box<RealizedFont>; 2]>,
    pub(crate) glyphs: GlyphCache,
    pub(crate) kerning: Option<Vec<KerningPair>>,
    pub(crate) native: Option<Box<dyn NativeFace>>,
    /// A backend load was attempted and failed
    pub(crate) load_failed: bool,
    /// `None` until the vertical feature was looked up
    pub(crate) vertical_subst: Option<Option<VerticalSubst>>,
    pub(crate) refcount: u32,
    pub(crate) cache_num: u32,
    pub(crate) handle: Option<FontHandle>,
}

impl RealizedFont {
    /// Construct for `face`; the caller supplies the face reference
    pub(crate) fn new(
        lf: &LogFont,
        matrix: Matrix,
        allow_bitmap: bool,
        face_id: FaceId,
        face: &Face,
        name: FaceName,
    ) -> Self {
        RealizedFont {
            lf: lf.clone(),
            matrix,
            allow_bitmap,
            hash: font_hash(lf, &matrix, allow_bitmap),
            face: face_id,
            vertical: name.is_vertical(),
            name,
            charset: lf.charset,
            codepage: 0,
            signature: face.signature,
            scalable: face.scalable,
            bitmap_ppem: face.size.y_ppem,
            scale_y: 1,
            children: SmallVec::new(),
            glyphs: GlyphCache::new(),
            kerning: None,
            native: None,
            load_failed: false,
            vertical_subst: None,
            refcount: 0,
            cache_num: 0,
            handle: None,
        }
    }

    /// A child for the fallback cascade, sharing this font's request
    pub(crate) fn child(&self, face_id: FaceId, face: &Face, name: FaceName) -> Self {
        let mut child = RealizedFont::new(
            &self.lf,
            self.matrix,
            self.allow_bitmap,
            face_id,
            face,
            name,
        );
        child.charset = self.charset;
        child.codepage = self.codepage;
        child.scale_y = self.scale_y;
        child
    }

    fn matches(&self, hash: u32, lf: &LogFont, matrix: &Matrix, allow_bitmap: bool) -> bool {
        self.hash == hash
            && self.matrix == *matrix
            && self.lf.same_fields(lf)
            && self.allow_bitmap == allow_bitmap
            && self.lf.same_name(lf)
    }

    /// The request descriptor
    pub fn log_font(&self) -> &LogFont {
        &self.lf
    }

    /// The face this font is bound to
    pub fn face(&self) -> FaceId {
        self.face
    }

    /// Reported name
    pub fn name(&self) -> &FaceName {
        &self.name
    }

    /// Number of fallback fonts
    pub fn num_children(&self) -> usize {
        self.children.len()
    }

    /// Current reference count
    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    /// Cache generation at creation
    pub fn cache_num(&self) -> u32 {
        self.cache_num
    }

    /// Pixels per em, horizontally and vertically
    pub(crate) fn ppem(&self, metrics: &FaceMetrics) -> (f32, f32) {
        let scale_y = self.scale_y as f32;
        if !self.scalable {
            let ppem = f32::from(self.bitmap_ppem) * scale_y;
            return (ppem, ppem);
        }

        let height = self.lf.height;
        let base = if height < 0 {
            -(height as f32)
        } else if height > 0 {
            let cell = i32::from(metrics.ascender) - i32::from(metrics.descender);
            if cell > 0 {
                height as f32 * f32::from(metrics.units_per_em) / cell as f32
            } else {
                height as f32
            }
        } else {
            DEFAULT_PPEM
        };
        (base * self.matrix.m11.abs(), base * self.matrix.m22.abs())
    }

    /// Scale glyph metrics from font units to pixels
    pub(crate) fn scale_glyph(&self, metrics: &FaceMetrics, units: GlyphUnits) -> GlyphMetrics {
        let (ppem_x, ppem_y) = self.ppem(metrics);
        let dpu_x = DPU::from_ppem(ppem_x, metrics.units_per_em);
        let dpu_y = DPU::from_ppem(ppem_y, metrics.units_per_em);
        let (origin, size) = match units.bbox {
            Some(bbox) => {
                let (x0, x1) = (dpu_x.i16_to_px(bbox.x_min), dpu_x.i16_to_px(bbox.x_max));
                let (y0, y1) = (dpu_y.i16_to_px(bbox.y_min), dpu_y.i16_to_px(bbox.y_max));
                ((x0, y1), (x1.abs_diff(x0), y1.abs_diff(y0)))
            }
            None => ((0, 0), (0, 0)),
        };
        GlyphMetrics {
            advance: dpu_x.u16_to_px(units.advance),
            left_side_bearing: dpu_x.i16_to_px(units.left_side_bearing),
            origin,
            size,
        }
    }

    /// Release every face reference held by this font and its cascade
    pub(crate) fn destroy(self, reg: &mut Registry) {
        trace!("destroying font {} (cache num {})", self.name, self.cache_num);
        for child in self.children {
            child.destroy(reg);
        }
        reg.release_face(self.face);
    }
}

/// The faces of the fallback cascade for a font named `name`
///
/// The link of the (substituted) name is consulted; under a double-byte
/// locale the cascade of [`DBCS_FALLBACK_FAMILY`] is appended too, except
/// for symbol and OEM fonts.
pub(crate) fn cascade_faces(
    matcher: &Matcher,
    name: &FaceName,
    lf: &LogFont,
    charset: Charset,
) -> Vec<FaceId> {
    let name = matcher
        .subst
        .substitute_name(name.as_str())
        .unwrap_or(name)
        .clone();

    let mut faces = vec![];
    let mut add_link = |link_name: &str| {
        let Some(link) = matcher.links.find(link_name) else {
            return;
        };
        for entry in link.entries() {
            let found =
                matcher.match_by_name(entry.family.as_str(), None, lf, Signature::empty(), false);
            match found {
                Some(m) => faces.push(m.face),
                None => trace!("no face for linked family {}", entry.family),
            }
        }
    };

    add_link(name.as_str());
    if matcher.config.is_dbcs()
        && charset != Charset::SYMBOL
        && charset != Charset::OEM
        && !name.matches(DBCS_FALLBACK_FAMILY)
    {
        add_link(DBCS_FALLBACK_FAMILY);
    }
    faces
}

/// Storage and recency tracking of realized fonts
pub struct FontCache {
    table: HandleTable<RealizedFont>,
    /// Every cached font, most recently used first
    fonts: VecDeque<FontHandle>,
    /// Fonts with no references, most recently released first
    unused: VecDeque<FontHandle>,
    next_cache_num: u32,
}

impl Default for FontCache {
    fn default() -> Self {
        FontCache::with_table(HandleTable::default())
    }
}

impl FontCache {
    /// Construct empty
    pub fn new() -> Self {
        FontCache::default()
    }

    /// Construct with a limited number of handles
    pub fn with_handle_capacity(capacity: usize) -> Self {
        FontCache::with_table(HandleTable::with_capacity(capacity))
    }

    fn with_table(table: HandleTable<RealizedFont>) -> Self {
        FontCache {
            table,
            fonts: VecDeque::new(),
            unused: VecDeque::new(),
            next_cache_num: 1,
        }
    }

    /// Number of cached fonts (in use or not)
    pub fn len(&self) -> usize {
        self.fonts.len()
    }

    /// True if no font is cached
    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty()
    }

    /// Number of fonts on the unused list
    pub fn unused_len(&self) -> usize {
        self.unused.len()
    }

    /// Find a cached font and take a reference to it
    pub fn lookup(&mut self, lf: &LogFont, matrix: &Matrix, allow_bitmap: bool) -> Option<FontHandle> {
        let hash = font_hash(lf, matrix, allow_bitmap);
        let pos = self.fonts.iter().position(|h| {
            self.table
                .get(*h)
                .is_some_and(|f| f.matches(hash, lf, matrix, allow_bitmap))
        })?;

        let handle = self.fonts.remove(pos)?;
        self.fonts.push_front(handle);
        let font = self.table.get_mut(handle)?;
        if font.refcount == 0 {
            if let Some(i) = self.unused.iter().position(|h| *h == handle) {
                self.unused.remove(i);
            }
        }
        font.refcount += 1;
        debug!(
            "cache hit for {:?}: {} refcount {}",
            lf.face_name, font.name, font.refcount
        );
        Some(handle)
    }

    /// Add a new font with a single reference
    ///
    /// Fails, returning the font, if no handle is available.
    pub fn insert(&mut self, mut font: RealizedFont) -> Result<FontHandle, RealizedFont> {
        font.refcount = 1;
        font.cache_num = self.next_cache_num;
        let handle = self.table.alloc(font)?;
        self.next_cache_num = self.next_cache_num.wrapping_add(1);
        if let Some(font) = self.table.get_mut(handle) {
            font.handle = Some(handle);
        }
        self.fonts.push_front(handle);
        Ok(handle)
    }

    /// Resolve a handle (weak handles accepted)
    pub fn get(&self, handle: FontHandle) -> Option<&RealizedFont> {
        self.table.get(handle)
    }

    /// Resolve a handle mutably
    pub fn get_mut(&mut self, handle: FontHandle) -> Option<&mut RealizedFont> {
        self.table.get_mut(handle)
    }

    /// Drop one reference
    ///
    /// Returns the font evicted from the unused list, if any; its resources
    /// must be released by the caller.
    pub fn release(&mut self, handle: FontHandle) -> Result<Option<RealizedFont>, InvalidHandle> {
        let handle = self.table.full_handle(handle).ok_or(InvalidHandle)?;
        let font = self.table.get_mut(handle).ok_or(InvalidHandle)?;
        if font.refcount == 0 {
            warn!("releasing unreferenced font {}", font.name);
            return Ok(None);
        }
        font.refcount -= 1;
        if font.refcount > 0 {
            return Ok(None);
        }

        self.unused.push_front(handle);
        if self.unused.len() <= UNUSED_CACHE_SIZE {
            return Ok(None);
        }
        let Some(victim) = self.unused.pop_back() else {
            return Ok(None);
        };
        self.fonts.retain(|h| *h != victim);
        let evicted = self.table.free(victim);
        if let Some(font) = evicted.as_ref() {
            debug!("evicting unused font {} (cache num {})", font.name, font.cache_num);
        }
        Ok(evicted)
    }
}
