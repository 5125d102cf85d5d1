// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Vertical glyph substitution from the OpenType `GSUB` table
//!
//! Only the parts needed to find vertical alternates are read: the script
//! and language system, the `vrt2` (else `vert`) feature and its single
//! substitution lookups. Table bytes are untrusted; every offset and count is
//! checked and any inconsistency makes the feature "not found".

use crate::GlyphId;
use log::{debug, warn};
use thiserror::Error;

/// Malformed or unsupported `GSUB` data
#[derive(Error, Debug, PartialEq, Eq)]
pub(crate) enum GsubError {
    #[error("read out of bounds at offset {0}")]
    OutOfBounds(usize),
    #[error("unsupported table version {0}.{1}")]
    Version(u16, u16),
    #[error("unsupported coverage format {0}")]
    CoverageFormat(u16),
    #[error("unsupported single substitution format {0}")]
    SubstFormat(u16),
}

type Result<T> = std::result::Result<T, GsubError>;

/// A bounds-checked big-endian view
#[derive(Copy, Clone)]
struct Reader<'a>(&'a [u8]);

impl<'a> Reader<'a> {
    fn u16(self, offset: usize) -> Result<u16> {
        match self.0.get(offset..offset + 2) {
            Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
            None => Err(GsubError::OutOfBounds(offset)),
        }
    }

    fn tag(self, offset: usize) -> Result<[u8; 4]> {
        match self.0.get(offset..offset + 4) {
            Some(b) => Ok([b[0], b[1], b[2], b[3]]),
            None => Err(GsubError::OutOfBounds(offset)),
        }
    }

    /// The sub-structure at an offset read from `at`
    fn sub(self, at: usize) -> Result<Reader<'a>> {
        let offset = usize::from(self.u16(at)?);
        self.at(offset)
    }

    fn at(self, offset: usize) -> Result<Reader<'a>> {
        self.0
            .get(offset..)
            .map(Reader)
            .ok_or(GsubError::OutOfBounds(offset))
    }

    /// Check that `count` records of `size` bytes fit from `offset`
    fn check_array(self, offset: usize, count: u16, size: usize) -> Result<()> {
        let end = offset + usize::from(count) * size;
        if end <= self.0.len() {
            Ok(())
        } else {
            Err(GsubError::OutOfBounds(end))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct RangeRecord {
    start: u16,
    end: u16,
    start_index: u16,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Coverage {
    Glyphs(Vec<u16>),
    Ranges(Vec<RangeRecord>),
}

impl Coverage {
    fn parse(r: Reader) -> Result<Self> {
        let format = r.u16(0)?;
        let count = r.u16(2)?;
        match format {
            1 => {
                r.check_array(4, count, 2)?;
                let glyphs = (0..usize::from(count))
                    .map(|i| r.u16(4 + 2 * i))
                    .collect::<Result<_>>()?;
                Ok(Coverage::Glyphs(glyphs))
            }
            2 => {
                r.check_array(4, count, 6)?;
                let ranges = (0..usize::from(count))
                    .map(|i| {
                        let at = 4 + 6 * i;
                        Ok(RangeRecord {
                            start: r.u16(at)?,
                            end: r.u16(at + 2)?,
                            start_index: r.u16(at + 4)?,
                        })
                    })
                    .collect::<Result<_>>()?;
                Ok(Coverage::Ranges(ranges))
            }
            f => Err(GsubError::CoverageFormat(f)),
        }
    }

    /// Coverage index of `glyph`
    fn index(&self, glyph: u16) -> Option<usize> {
        match self {
            Coverage::Glyphs(glyphs) => glyphs.iter().position(|g| *g == glyph),
            Coverage::Ranges(ranges) => {
                for range in ranges {
                    // ranges are sorted by start
                    if glyph < range.start {
                        return None;
                    }
                    if glyph <= range.end {
                        let offset = glyph - range.start;
                        return Some(usize::from(range.start_index) + usize::from(offset));
                    }
                }
                None
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum SingleSubst {
    Delta { coverage: Coverage, delta: u16 },
    Map { coverage: Coverage, substitutes: Vec<u16> },
}

impl SingleSubst {
    fn parse(r: Reader) -> Result<Self> {
        let format = r.u16(0)?;
        let coverage = Coverage::parse(r.sub(2)?)?;
        match format {
            1 => Ok(SingleSubst::Delta {
                coverage,
                delta: r.u16(4)?,
            }),
            2 => {
                let count = r.u16(4)?;
                r.check_array(6, count, 2)?;
                let substitutes = (0..usize::from(count))
                    .map(|i| r.u16(6 + 2 * i))
                    .collect::<Result<_>>()?;
                Ok(SingleSubst::Map {
                    coverage,
                    substitutes,
                })
            }
            f => Err(GsubError::SubstFormat(f)),
        }
    }

    fn apply(&self, glyph: u16) -> Option<u16> {
        match self {
            SingleSubst::Delta { coverage, delta } => {
                coverage.index(glyph)?;
                Some(glyph.wrapping_add(*delta))
            }
            SingleSubst::Map {
                coverage,
                substitutes,
            } => {
                let index = coverage.index(glyph)?;
                substitutes.get(index).copied()
            }
        }
    }
}

const SINGLE_SUBSTITUTION: u16 = 1;

/// The vertical-alternates feature of a face
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerticalSubst {
    /// Single-substitution lookups, in feature order
    lookups: Vec<Vec<SingleSubst>>,
}

impl VerticalSubst {
    /// Find the vertical feature for `script` in raw `GSUB` bytes
    ///
    /// Returns `None` if the feature is absent or the table is malformed (the
    /// latter is logged).
    pub fn find(gsub: &[u8], script: [u8; 4]) -> Option<Self> {
        match Self::parse(gsub, script) {
            Ok(result) => result,
            Err(err) => {
                warn!("malformed GSUB table: {err}");
                None
            }
        }
    }

    pub(crate) fn parse(gsub: &[u8], script: [u8; 4]) -> Result<Option<Self>> {
        let header = Reader(gsub);
        let (major, minor) = (header.u16(0)?, header.u16(2)?);
        if major != 1 {
            return Err(GsubError::Version(major, minor));
        }
        let script_list = header.sub(4)?;
        let feature_list = header.sub(6)?;
        let lookup_list = header.sub(8)?;

        let Some(script_table) = find_script(script_list, script)? else {
            debug!("GSUB: no script {:?}", String::from_utf8_lossy(&script));
            return Ok(None);
        };
        let Some(lang_sys) = find_lang_sys(script_table, *b"xxxx")? else {
            debug!("GSUB: no language system");
            return Ok(None);
        };
        let feature = match find_feature(feature_list, lang_sys, *b"vrt2")? {
            Some(f) => f,
            None => match find_feature(feature_list, lang_sys, *b"vert")? {
                Some(f) => f,
                None => {
                    debug!("GSUB: no vertical feature");
                    return Ok(None);
                }
            },
        };

        let lookup_count = feature.u16(2)?;
        feature.check_array(4, lookup_count, 2)?;
        let num_lookups = lookup_list.u16(0)?;
        lookup_list.check_array(2, num_lookups, 2)?;

        let mut lookups = vec![];
        for i in 0..usize::from(lookup_count) {
            let index = feature.u16(4 + 2 * i)?;
            if index >= num_lookups {
                return Err(GsubError::OutOfBounds(usize::from(index)));
            }
            let lookup = lookup_list.sub(2 + 2 * usize::from(index))?;
            let kind = lookup.u16(0)?;
            if kind != SINGLE_SUBSTITUTION {
                debug!("GSUB: ignoring lookup type {kind}");
                continue;
            }
            let count = lookup.u16(4)?;
            lookup.check_array(6, count, 2)?;
            let subtables = (0..usize::from(count))
                .map(|j| SingleSubst::parse(lookup.sub(6 + 2 * j)?))
                .collect::<Result<Vec<_>>>()?;
            lookups.push(subtables);
        }
        Ok(Some(VerticalSubst { lookups }))
    }

    /// Substitute a glyph by its vertical form, if any
    pub fn apply(&self, glyph: GlyphId) -> GlyphId {
        let mut id = glyph.0;
        for subtables in &self.lookups {
            if let Some(new) = subtables.iter().find_map(|s| s.apply(id)) {
                id = new;
            }
        }
        GlyphId(id)
    }
}

/// The script table for `tag`, else the `dflt` script
fn find_script(list: Reader, tag: [u8; 4]) -> Result<Option<Reader>> {
    let count = list.u16(0)?;
    list.check_array(2, count, 6)?;
    let mut default = None;
    for i in 0..usize::from(count) {
        let at = 2 + 6 * i;
        let record_tag = list.tag(at)?;
        if record_tag == tag {
            return list.sub(at + 4).map(Some);
        }
        if &record_tag == b"dflt" {
            default = Some(at + 4);
        }
    }
    default.map(|at| list.sub(at)).transpose()
}

/// The language system for `tag`, else the script's default one
fn find_lang_sys(script: Reader, tag: [u8; 4]) -> Result<Option<Reader>> {
    let count = script.u16(2)?;
    script.check_array(4, count, 6)?;
    for i in 0..usize::from(count) {
        let at = 4 + 6 * i;
        if script.tag(at)? == tag {
            return script.sub(at + 4).map(Some);
        }
    }
    match script.u16(0)? {
        0 => Ok(None),
        offset => script.at(usize::from(offset)).map(Some),
    }
}

/// A feature of the language system with the given tag
fn find_feature<'a>(list: Reader<'a>, lang_sys: Reader, tag: [u8; 4]) -> Result<Option<Reader<'a>>> {
    let num_features = list.u16(0)?;
    list.check_array(2, num_features, 6)?;
    let count = lang_sys.u16(4)?;
    lang_sys.check_array(6, count, 2)?;
    for i in 0..usize::from(count) {
        let index = lang_sys.u16(6 + 2 * i)?;
        if index >= num_features {
            return Err(GsubError::OutOfBounds(usize::from(index)));
        }
        let at = 2 + 6 * usize::from(index);
        if list.tag(at)? == tag {
            return list.sub(at + 4).map(Some);
        }
    }
    Ok(None)
}

/// Code point ranges drawn upright in vertical text
const UPRIGHT_RANGES: &[(u32, u32)] = &[
    (0x00a7, 0x00a7),
    (0x00a9, 0x00a9),
    (0x00ae, 0x00ae),
    (0x00b1, 0x00b1),
    (0x00bc, 0x00be),
    (0x00d7, 0x00d7),
    (0x00f7, 0x00f7),
    (0x1100, 0x11ff),
    (0x2e80, 0x2fff),
    (0x3000, 0x312f),
    (0x3130, 0x318f),
    (0x3190, 0x33ff),
    (0x3400, 0x4dbf),
    (0x4e00, 0x9fff),
    (0xa000, 0xa4cf),
    (0xac00, 0xd7ff),
    (0xf900, 0xfaff),
    (0xfe10, 0xfe1f),
    (0xfe30, 0xfe4f),
    (0xff01, 0xff60),
    (0xffe0, 0xffe7),
    (0x1f200, 0x1f2ff),
    (0x20000, 0x2fffd),
    (0x30000, 0x3fffd),
];

/// True if `c` is drawn upright (not rotated) in vertical text
pub fn is_upright_in_vertical(c: char) -> bool {
    let c = u32::from(c);
    UPRIGHT_RANGES
        .binary_search_by(|&(start, end)| {
            if end < c {
                std::cmp::Ordering::Less
            } else if start > c {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}
