// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font system

use super::cache::{bitmap_scale, cascade_faces, FontCache, RealizedFont};
use super::charset::{self, Charset, Signature};
use super::discovery;
use super::enumerate::{face_charsets, next_face, Cursor, EnumEntry, EnumFilter, EnumSnapshot};
use super::enumerate::{FaceEnumerator, FontType};
use super::glyph_cache::GlyphMetrics;
use super::gsub::{is_upright_in_vertical, VerticalSubst};
use super::handles::FontHandle;
use super::links::FontLinks;
use super::registry::{FaceId, Registry};
use super::resolver::{ExtraFallbacks, Matcher, Resolved};
use super::subst::SubstTable;
use super::{FaceDesc, FaceFlags, FaceName};
use crate::backend::{merge_ranges, Backend, FallbackClass, KerningPair, Outline, PathSegment};
use crate::conv::DPU;
use crate::store::ConfigStore;
use crate::{Config, GlyphId, LogFont, Matrix};
use log::{debug, error, info, log_enabled, warn};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Font loading errors
#[derive(Error, Debug)]
pub enum FontError {
    #[error("font load error")]
    TtfParser(#[from] ttf_parser::FaceParsingError),
    #[error("font file error")]
    Io(#[from] std::io::Error),
}

/// Bad [`FontHandle`]
///
/// The handle is stale (its font was evicted) or was never issued.
#[derive(Error, Debug)]
#[error("invalid font handle")]
pub struct InvalidHandle;

/// No matching font found
///
/// Every relaxation of the request was tried.
#[derive(Error, Debug)]
#[error("no font match")]
pub struct NoFontMatch;

/// Failure to realize a font
#[derive(Error, Debug)]
pub enum SelectError {
    #[error("no font match")]
    NoMatch,
    #[error("out of font handles")]
    HandlesExhausted,
    #[error("failed to load face")]
    Load(#[source] FontError),
}

impl From<NoFontMatch> for SelectError {
    fn from(_: NoFontMatch) -> Self {
        SelectError::NoMatch
    }
}

/// A glyph and the font of the cascade supplying it
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct LinkedGlyph {
    /// `0` for the primary font, `i + 1` for fallback font `i`
    pub font: usize,
    pub glyph: GlyphId,
}

/// Properties of a realized font
#[derive(Clone, Debug, PartialEq)]
pub struct FontInfo {
    /// Reported family name
    pub name: String,
    /// Full name of the primary face
    pub full_name: String,
    /// The primary face
    pub face: FaceId,
    /// Charset the request resolved to
    pub charset: Charset,
    /// Codepage of `charset`
    pub codepage: u16,
    /// Signature of the primary face
    pub signature: Signature,
    /// False for bitmap faces
    pub scalable: bool,
    /// Integer magnification of a bitmap face
    pub scale_y: u32,
    /// Pixels per em (horizontal, vertical), if the face is loaded
    pub ppem: Option<(f32, f32)>,
    /// Ascent in pixels; zero if the face is not loaded
    pub ascent: i32,
    /// Descent in pixels (positive below the baseline); zero if not loaded
    pub descent: i32,
    /// Reported names of the fallback fonts
    pub fallbacks: Vec<String>,
    /// Outstanding handle references
    pub refcount: u32,
    /// Cache generation at creation
    pub cache_num: u32,
}

struct State {
    reg: Registry,
    subst: SubstTable,
    links: FontLinks,
    config: Config,
    fallbacks: ExtraFallbacks,
    cache: FontCache,
    backend: Box<dyn Backend>,
    store: Box<dyn ConfigStore>,
}

/// The vertical-writing variant of a double-byte face
fn vertical_desc(desc: &FaceDesc) -> Option<FaceDesc> {
    if !desc.signature.intersects(Signature::DBCS) || desc.family_name.starts_with('@') {
        return None;
    }
    let mut vertical = desc.clone();
    vertical.family_name = format!("@{}", desc.family_name);
    vertical.full_name = format!("@{}", desc.full_name);
    vertical.second_name = desc.second_name.as_ref().map(|n| format!("@{n}"));
    vertical.flags |= FaceFlags::VERTICAL;
    Some(vertical)
}

/// Make sure a font's face is loaded; false if loading failed
fn ensure_loaded(font: &mut RealizedFont, reg: &Registry, backend: &dyn Backend) -> bool {
    if font.native.is_none() && !font.load_failed {
        let Some(face) = reg.face(font.face) else {
            font.load_failed = true;
            return false;
        };
        match backend.load(face.source(), face.index()) {
            Ok(native) => font.native = Some(native),
            Err(err) => {
                error!("failed to load face {}: {err}", face.full_name());
                font.load_failed = true;
            }
        }
    }
    font.native.is_some()
}

/// Map `c` in a single font, applying vertical forms where appropriate
fn lookup_glyph(font: &mut RealizedFont, reg: &Registry, backend: &dyn Backend, c: char) -> Option<GlyphId> {
    if !ensure_loaded(font, reg, backend) {
        return None;
    }
    let native = font.native.as_ref()?;
    let glyph = native.glyph_index(c).filter(|g| g.0 != 0)?;
    if !font.vertical || !is_upright_in_vertical(c) {
        return Some(glyph);
    }

    if font.vertical_subst.is_none() {
        let script = font.charset.opentype_script();
        let found = native
            .table_data(*b"GSUB")
            .and_then(|table| VerticalSubst::find(table, script));
        font.vertical_subst = Some(found);
    }
    match &font.vertical_subst {
        Some(Some(subst)) => Some(subst.apply(glyph)),
        _ => Some(glyph),
    }
}

fn scale_outline(outline: Outline, dpu_x: DPU, dpu_y: DPU) -> Outline {
    let (sx, sy) = (dpu_x.0, dpu_y.0);
    let segments = outline
        .segments
        .into_iter()
        .map(|seg| match seg {
            PathSegment::MoveTo(x, y) => PathSegment::MoveTo(x * sx, y * sy),
            PathSegment::LineTo(x, y) => PathSegment::LineTo(x * sx, y * sy),
            PathSegment::QuadTo(x1, y1, x, y) => PathSegment::QuadTo(x1 * sx, y1 * sy, x * sx, y * sy),
            PathSegment::CurveTo(x1, y1, x2, y2, x, y) => {
                PathSegment::CurveTo(x1 * sx, y1 * sy, x2 * sx, y2 * sy, x * sx, y * sy)
            }
            PathSegment::Close => PathSegment::Close,
        })
        .collect();
    Outline {
        segments,
        bbox: outline.bbox,
    }
}

impl State {
    fn family_name_of(&self, face: FaceId) -> Option<FaceName> {
        let family = self.reg.face(face)?.family()?;
        Some(self.reg.family(family)?.name().clone())
    }

    /// Add a face (and its vertical variant), recording it in the discovery
    /// cache when flagged so
    fn add_face(&mut self, desc: &FaceDesc) -> usize {
        let mut added = 0;
        for desc in std::iter::once(desc.clone()).chain(vertical_desc(desc)) {
            let Some(id) = self.reg.add_face(&desc) else {
                continue;
            };
            added += 1;
            if !desc.flags.contains(FaceFlags::ADD_TO_CACHE) {
                continue;
            }
            let Some(face) = self.reg.face(id) else {
                continue;
            };
            let Some(family) = face.family().and_then(|f| self.reg.family(f)) else {
                continue;
            };
            discovery::write_face(
                self.store.as_mut(),
                family.name(),
                family.second_name(),
                face,
            );
        }
        added
    }

    /// Remove the cache records of faces freed since the last call
    fn flush_uncached(&mut self) {
        for key in self.reg.take_uncached() {
            discovery::remove(self.store.as_mut(), &key);
        }
    }

    fn matcher(&self) -> Matcher<'_> {
        Matcher {
            reg: &self.reg,
            subst: &self.subst,
            links: &self.links,
            config: &self.config,
            fallbacks: &self.fallbacks,
        }
    }

    fn resolve_or_create(
        &mut self,
        lf: &LogFont,
        matrix: &Matrix,
        allow_bitmap: bool,
    ) -> Result<FontHandle, SelectError> {
        if let Some(handle) = self.cache.lookup(lf, matrix, allow_bitmap) {
            return Ok(handle);
        }

        let resolved: Resolved = self.matcher().resolve(lf, allow_bitmap)?;
        let face = self.reg.face(resolved.face).ok_or(SelectError::NoMatch)?;

        let mut matrix = *matrix;
        let mut scale_y = 1;
        if !face.is_scalable() {
            scale_y = bitmap_scale(lf.height, matrix.m22, face);
            matrix.m11 = 1.0;
            matrix.m22 = 1.0;
            if let Some(handle) = self.cache.lookup(lf, &matrix, allow_bitmap) {
                return Ok(handle);
            }
        }

        let native = match self.backend.load(face.source(), face.index()) {
            Ok(native) => native,
            Err(err) => {
                error!("failed to load face {}: {err}", face.full_name());
                return Err(SelectError::Load(err));
            }
        };

        let name = match resolved.name_override.clone() {
            Some(name) => name,
            None => self
                .family_name_of(resolved.face)
                .unwrap_or_else(|| face.full_name().clone()),
        };
        let mut font = RealizedFont::new(lf, matrix, allow_bitmap, resolved.face, face, name);
        font.charset = resolved.charset;
        font.codepage = resolved.codepage;
        font.scale_y = scale_y;
        font.native = Some(native);

        let cascade = cascade_faces(&self.matcher(), &font.name, lf, font.charset);
        for id in cascade {
            let Some(child_face) = self.reg.face(id) else {
                continue;
            };
            let child_name = self
                .family_name_of(id)
                .unwrap_or_else(|| child_face.full_name().clone());
            let child = font.child(id, child_face, child_name);
            self.reg.add_face_ref(id);
            font.children.push(Box::new(child));
        }
        self.reg.add_face_ref(resolved.face);

        if log_enabled!(log::Level::Debug) {
            let children: Vec<_> = font.children.iter().map(|c| c.name.to_string()).collect();
            debug!(
                "created font {} for {:?} (charset {}, scale {}, fallbacks {:?})",
                font.name, lf.face_name, font.charset.0, font.scale_y, children
            );
        }

        match self.cache.insert(font) {
            Ok(handle) => Ok(handle),
            Err(font) => {
                font.destroy(&mut self.reg);
                self.flush_uncached();
                Err(SelectError::HandlesExhausted)
            }
        }
    }

    fn release(&mut self, handle: FontHandle) -> Result<(), InvalidHandle> {
        if let Some(font) = self.cache.release(handle)? {
            font.destroy(&mut self.reg);
            self.flush_uncached();
        }
        Ok(())
    }

    fn glyph_index(&mut self, handle: FontHandle, c: char) -> Result<LinkedGlyph, InvalidHandle> {
        let font = self.cache.get_mut(handle).ok_or(InvalidHandle)?;
        let backend = &*self.backend;
        if let Some(glyph) = lookup_glyph(font, &self.reg, backend, c) {
            return Ok(LinkedGlyph { font: 0, glyph });
        }
        for (i, child) in font.children.iter_mut().enumerate() {
            if let Some(glyph) = lookup_glyph(child, &self.reg, backend, c) {
                return Ok(LinkedGlyph { font: i + 1, glyph });
            }
        }
        let glyph = font
            .native
            .as_ref()
            .map(|native| native.default_glyph())
            .unwrap_or_default();
        Ok(LinkedGlyph { font: 0, glyph })
    }

    fn glyph_metrics(
        &mut self,
        handle: FontHandle,
        glyph: LinkedGlyph,
    ) -> Result<Option<GlyphMetrics>, InvalidHandle> {
        let State {
            reg,
            cache,
            backend,
            ..
        } = self;
        let font = cache.get_mut(handle).ok_or(InvalidHandle)?;
        let font = match glyph.font {
            0 => font,
            i => match font.children.get_mut(i - 1) {
                Some(child) => &mut **child,
                None => return Ok(None),
            },
        };
        if let Some(metrics) = font.glyphs.get(glyph.glyph) {
            return Ok(Some(metrics));
        }
        if !ensure_loaded(font, reg, &**backend) {
            return Ok(None);
        }
        let Some(native) = font.native.as_ref() else {
            return Ok(None);
        };
        let face_metrics = native.metrics();
        let Some(units) = native.glyph_metrics(glyph.glyph) else {
            return Ok(None);
        };
        let metrics = font.scale_glyph(&face_metrics, units);
        font.glyphs.set(glyph.glyph, metrics);
        Ok(Some(metrics))
    }

    fn glyph_outline(
        &mut self,
        handle: FontHandle,
        glyph: LinkedGlyph,
    ) -> Result<Option<Outline>, InvalidHandle> {
        let State {
            reg,
            cache,
            backend,
            ..
        } = self;
        let font = cache.get_mut(handle).ok_or(InvalidHandle)?;
        let font = match glyph.font {
            0 => font,
            i => match font.children.get_mut(i - 1) {
                Some(child) => &mut **child,
                None => return Ok(None),
            },
        };
        if !ensure_loaded(font, reg, &**backend) {
            return Ok(None);
        }
        let Some(native) = font.native.as_ref() else {
            return Ok(None);
        };
        let metrics = native.metrics();
        let (ppem_x, ppem_y) = font.ppem(&metrics);
        let dpu_x = DPU::from_ppem(ppem_x, metrics.units_per_em);
        let dpu_y = DPU::from_ppem(ppem_y, metrics.units_per_em);
        Ok(native
            .glyph_outline(glyph.glyph)
            .map(|outline| scale_outline(outline, dpu_x, dpu_y)))
    }

    fn kerning_pairs(&mut self, handle: FontHandle) -> Result<Vec<KerningPair>, InvalidHandle> {
        let font = self.cache.get_mut(handle).ok_or(InvalidHandle)?;
        if let Some(pairs) = &font.kerning {
            return Ok(pairs.clone());
        }
        let pairs = match font.native.as_ref() {
            Some(native) => {
                let metrics = native.metrics();
                let (ppem_x, _) = font.ppem(&metrics);
                let dpu = DPU::from_ppem(ppem_x, metrics.units_per_em);
                native
                    .kerning_pairs()
                    .into_iter()
                    .map(|pair| KerningPair {
                        value: dpu
                            .i16_to_px(pair.value)
                            .clamp(i16::MIN.into(), i16::MAX.into()) as i16,
                        ..pair
                    })
                    .collect()
            }
            None => vec![],
        };
        font.kerning = Some(pairs.clone());
        Ok(pairs)
    }

    fn unicode_ranges(&mut self, handle: FontHandle) -> Result<Vec<(u32, u32)>, InvalidHandle> {
        let State {
            reg,
            cache,
            backend,
            ..
        } = self;
        let font = cache.get_mut(handle).ok_or(InvalidHandle)?;
        let mut ranges = font
            .native
            .as_ref()
            .map(|native| native.unicode_ranges())
            .unwrap_or_default();
        for child in font.children.iter_mut() {
            if ensure_loaded(child, reg, &**backend) {
                if let Some(native) = child.native.as_ref() {
                    ranges.extend(native.unicode_ranges());
                }
            }
        }
        Ok(merge_ranges(ranges))
    }

    fn font_info(&self, handle: FontHandle) -> Result<FontInfo, InvalidHandle> {
        let font = self.cache.get(handle).ok_or(InvalidHandle)?;
        let full_name = self
            .reg
            .face(font.face)
            .map(|face| face.full_name().to_string())
            .unwrap_or_default();
        let metrics = font.native.as_ref().map(|native| native.metrics());
        let (ppem, ascent, descent) = match metrics {
            Some(m) => {
                let ppem = font.ppem(&m);
                let dpu = DPU::from_ppem(ppem.1, m.units_per_em);
                (Some(ppem), dpu.i16_to_px(m.ascender), -dpu.i16_to_px(m.descender))
            }
            None => (None, 0, 0),
        };
        Ok(FontInfo {
            name: font.name.to_string(),
            full_name,
            face: font.face,
            charset: font.charset,
            codepage: font.codepage,
            signature: font.signature,
            scalable: font.scalable,
            scale_y: font.scale_y,
            ppem,
            ascent,
            descent,
            fallbacks: font.children.iter().map(|c| c.name.to_string()).collect(),
            refcount: font.refcount,
            cache_num: font.cache_num,
        })
    }

    /// Cached enumeration data of a face, loading it on first use
    fn snapshot(&mut self, id: FaceId) -> Option<EnumSnapshot> {
        let face = self.reg.face(id)?;
        if let Some(snapshot) = face.enum_data {
            return Some(snapshot);
        }
        let native = match self.backend.load(face.source(), face.index()) {
            Ok(native) => native,
            Err(err) => {
                warn!("cannot enumerate face {}: {err}", face.full_name());
                return None;
            }
        };
        let snapshot = EnumSnapshot {
            font_type: if face.is_scalable() {
                FontType::TrueType
            } else {
                FontType::Raster
            },
            metrics: native.metrics(),
        };
        if let Some(face) = self.reg.face_mut(id) {
            face.enum_data = Some(snapshot);
        }
        Some(snapshot)
    }

    fn enum_step(&mut self, cursor: &mut Cursor, filter: &EnumFilter) -> Option<Vec<EnumEntry>> {
        let (search, reported) = match &filter.name {
            Some(name) => match self.subst.get(name, Some(filter.charset)) {
                Some(entry) => (Some(entry.to.name.as_str().to_string()), Some(name.clone())),
                None => (Some(name.clone()), None),
            },
            None => (None, None),
        };

        let (family, id) = next_face(&self.reg, cursor, search.as_deref())?;
        let Some(snapshot) = self.snapshot(id) else {
            return Some(vec![]);
        };
        let family_name = match reported {
            Some(name) => name,
            None => self.reg.family(family)?.name().to_string(),
        };
        let face = self.reg.face(id)?;
        let candidates = charset::candidates(filter.charset, self.config.ansi_codepage);
        let entries = face_charsets(face, &candidates)
            .into_iter()
            .map(|(charset, script)| EnumEntry {
                family_name: family_name.clone(),
                full_name: face.full_name().to_string(),
                style_name: face.style_name().to_string(),
                charset,
                script,
                face: id,
                snapshot,
            })
            .collect();
        Some(entries)
    }
}

/// Font resolution and caching context
///
/// One instance is constructed per process and shared by reference. Its
/// state is guarded by a single lock; every operation holds the lock for its
/// duration, except enumeration which releases it between faces.
pub struct FontSystem {
    state: Mutex<State>,
}

impl FontSystem {
    /// Construct, reading configuration from `store` and faces from the
    /// discovery cache or else from `backend`
    pub fn new(mut backend: Box<dyn Backend>, store: Box<dyn ConfigStore>) -> Self {
        let config = Config::from_store(store.as_ref());
        let fallbacks = ExtraFallbacks {
            fixed: backend.family_fallbacks(FallbackClass::Fixed),
            serif: backend.family_fallbacks(FallbackClass::Serif),
            sans: backend.family_fallbacks(FallbackClass::Sans),
        };

        let cached = discovery::load_cache(store.as_ref());
        let restored = !cached.is_empty();
        let descs = if restored {
            cached
        } else {
            backend.discover()
        };

        let mut state = State {
            reg: Registry::new(),
            subst: SubstTable::new(),
            links: FontLinks::new(),
            config,
            fallbacks,
            cache: FontCache::new(),
            backend,
            store,
        };

        for mut desc in descs {
            if restored {
                state.reg.add_face(&desc);
            } else {
                if desc.source.file().is_some() {
                    desc.flags |= FaceFlags::ADD_TO_CACHE;
                }
                state.add_face(&desc);
            }
        }
        if restored {
            info!("Restored {} faces from the discovery cache", state.reg.num_faces());
        }

        state.reg.load_replacements(state.store.as_ref());
        state.subst.load(state.store.as_ref());
        let State {
            reg,
            subst,
            links,
            store,
            ..
        } = &mut state;
        links.load(reg, subst, &**store);
        info!(
            "Font system ready: {} families, {} faces, {} substitutes",
            state.reg.num_families(),
            state.reg.num_faces(),
            state.subst.len()
        );

        FontSystem {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// The active configuration
    pub fn config(&self) -> Config {
        self.lock().config.clone()
    }

    /// Read access to the registry
    pub fn with_registry<R>(&self, f: impl FnOnce(&Registry) -> R) -> R {
        f(&self.lock().reg)
    }

    /// Substitution table in use
    pub fn with_substitutes<R>(&self, f: impl FnOnce(&SubstTable) -> R) -> R {
        f(&self.lock().subst)
    }

    /// Font links in use
    pub fn with_links<R>(&self, f: impl FnOnce(&FontLinks) -> R) -> R {
        f(&self.lock().links)
    }

    /// Resolve a request to a face without realizing a font
    pub fn match_face(&self, lf: &LogFont, allow_bitmap: bool) -> Result<Resolved, NoFontMatch> {
        self.lock().matcher().resolve(lf, allow_bitmap)
    }

    /// Find or create the realized font for a request
    ///
    /// The returned handle carries one reference; pass it to
    /// [`Self::release`] when done.
    pub fn resolve_or_create(
        &self,
        lf: &LogFont,
        matrix: &Matrix,
        allow_bitmap: bool,
    ) -> Result<FontHandle, SelectError> {
        self.lock().resolve_or_create(lf, matrix, allow_bitmap)
    }

    /// Drop one reference to a realized font
    pub fn release(&self, handle: FontHandle) -> Result<(), InvalidHandle> {
        self.lock().release(handle)
    }

    /// Number of cached fonts and how many of them are unused
    pub fn cache_usage(&self) -> (usize, usize) {
        let state = self.lock();
        (state.cache.len(), state.cache.unused_len())
    }

    /// Properties of a realized font
    pub fn font_info(&self, handle: FontHandle) -> Result<FontInfo, InvalidHandle> {
        self.lock().font_info(handle)
    }

    /// Map a character, walking the fallback cascade
    ///
    /// If no font of the cascade covers `c`, the primary face's default glyph
    /// is returned.
    pub fn glyph_index(&self, handle: FontHandle, c: char) -> Result<LinkedGlyph, InvalidHandle> {
        self.lock().glyph_index(handle, c)
    }

    /// Scaled metrics of a glyph
    pub fn glyph_metrics(
        &self,
        handle: FontHandle,
        glyph: LinkedGlyph,
    ) -> Result<Option<GlyphMetrics>, InvalidHandle> {
        self.lock().glyph_metrics(handle, glyph)
    }

    /// Scaled metrics of the glyph for `c`
    pub fn char_metrics(&self, handle: FontHandle, c: char) -> Result<Option<GlyphMetrics>, InvalidHandle> {
        let mut state = self.lock();
        let glyph = state.glyph_index(handle, c)?;
        state.glyph_metrics(handle, glyph)
    }

    /// Scaled outline of a glyph
    pub fn glyph_outline(
        &self,
        handle: FontHandle,
        glyph: LinkedGlyph,
    ) -> Result<Option<Outline>, InvalidHandle> {
        self.lock().glyph_outline(handle, glyph)
    }

    /// Kerning pairs of the primary face, values in pixels
    pub fn kerning_pairs(&self, handle: FontHandle) -> Result<Vec<KerningPair>, InvalidHandle> {
        self.lock().kerning_pairs(handle)
    }

    /// Unicode ranges covered by a font and its cascade
    pub fn unicode_ranges(&self, handle: FontHandle) -> Result<Vec<(u32, u32)>, InvalidHandle> {
        self.lock().unicode_ranges(handle)
    }

    /// Iterate over faces matching `filter`
    pub fn enumerate(&self, filter: EnumFilter) -> FaceEnumerator<'_> {
        FaceEnumerator::new(self, filter)
    }

    /// Call `callback` for each enumerated face until it returns false
    ///
    /// Returns false if enumeration was stopped by the callback. The lock is
    /// not held while `callback` runs, so it may call back into `self`.
    pub fn enumerate_faces(&self, filter: EnumFilter, mut callback: impl FnMut(&EnumEntry) -> bool) -> bool {
        for entry in self.enumerate(filter) {
            if !callback(&entry) {
                return false;
            }
        }
        true
    }

    pub(crate) fn enum_step(&self, cursor: &mut Cursor, filter: &EnumFilter) -> Option<Vec<EnumEntry>> {
        self.lock().enum_step(cursor, filter)
    }

    /// Add application-supplied faces
    ///
    /// `flags` is added to each face's flags. Returns the number of faces
    /// (including vertical variants) added.
    pub fn add_faces(&self, descs: &[FaceDesc], flags: FaceFlags) -> usize {
        let mut state = self.lock();
        let mut added = 0;
        for desc in descs {
            let mut desc = desc.clone();
            desc.flags |= flags;
            added += state.add_face(&desc);
        }
        debug!("added {added} faces");
        added
    }

    /// Remove faces loaded from `file` with the given flags
    ///
    /// Faces still used by realized fonts are freed when those are.
    pub fn remove_font_file(&self, file: &Path, flags: FaceFlags) -> usize {
        let mut state = self.lock();
        let removed = state.reg.remove_faces_from_file(file, flags)
            + state.reg.remove_faces_from_file(file, flags | FaceFlags::VERTICAL);
        state.flush_uncached();
        removed
    }

    /// Forget the discovery cache, forcing a scan on the next start-up
    pub fn clear_discovery_cache(&self) {
        discovery::clear(self.lock().store.as_mut());
    }
}
