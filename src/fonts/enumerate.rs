// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Face enumeration
//!
//! Enumeration walks families in name order. Its position is kept as a
//! [`Cursor`] of names rather than identifiers, so that each step can
//! re-derive where to continue after the registry changed in between.

use super::charset::{Candidate, Charset, Script};
use super::registry::{FaceId, FamilyId, Registry};
use super::{Face, FaceName, FontSystem};
use crate::backend::FaceMetrics;
use std::collections::VecDeque;

/// How a face is rendered
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FontType {
    /// Scalable outlines
    TrueType,
    /// Fixed-size bitmaps
    Raster,
}

/// Per-face data cached on first enumeration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnumSnapshot {
    pub font_type: FontType,
    /// Metrics reported by the backend, in font units
    pub metrics: FaceMetrics,
}

/// One enumerated (face, charset) combination
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumEntry {
    /// Family name (the requested name when it was substituted)
    pub family_name: String,
    pub full_name: String,
    pub style_name: String,
    pub charset: Charset,
    pub script: Script,
    pub face: FaceId,
    pub snapshot: EnumSnapshot,
}

/// Enumeration filter
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumFilter {
    /// Family or full face name; `None` enumerates one face per family
    pub name: Option<String>,
    /// Requested charset; `DEFAULT` enumerates every supported charset
    pub charset: Charset,
}

impl EnumFilter {
    /// Enumerate every family
    pub fn all() -> Self {
        EnumFilter {
            name: None,
            charset: Charset::DEFAULT,
        }
    }

    /// Enumerate faces matching `name`
    pub fn named(name: &str) -> Self {
        EnumFilter {
            name: Some(name.to_string()),
            charset: Charset::DEFAULT,
        }
    }

    /// Restrict to a charset
    pub fn with_charset(mut self, charset: Charset) -> Self {
        self.charset = charset;
        self
    }
}

/// The resumable position of an enumeration
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Family being enumerated
    family: Option<FaceName>,
    /// Last face yielded within `family`: full name and list position
    last_face: Option<(FaceName, usize)>,
    done: bool,
}

fn family_matches(reg: &Registry, family: FamilyId, name: &str) -> bool {
    let Some(record) = reg.family(family) else {
        return false;
    };
    if record.name().matches(name) || record.second_name().is_some_and(|n| n.matches(name)) {
        return true;
    }
    reg.faces_of(family)
        .iter()
        .filter_map(|&id| reg.face(id))
        .any(|face| face.full_name.matches(name))
}

fn face_matches(reg: &Registry, family: FamilyId, face: &Face, name: &str) -> bool {
    let family_match = reg.family(family).is_some_and(|f| {
        f.name().matches(name) || f.second_name().is_some_and(|n| n.matches(name))
    });
    family_match || face.full_name.matches(name)
}

/// Advance `cursor` to the next face to enumerate
///
/// `name` is the (substituted) name filter. Returns the family enumerated
/// (which for a replacement is the alias, not the face's owner) and the face.
pub(crate) fn next_face(
    reg: &Registry,
    cursor: &mut Cursor,
    name: Option<&str>,
) -> Option<(FamilyId, FaceId)> {
    if cursor.done {
        return None;
    }
    loop {
        let family = match &cursor.family {
            None => reg.families().first().copied(),
            Some(last) => match reg.seek_family(last, false) {
                Some(id) if reg.family(id).map(|f| f.name()) == Some(last) => Some(id),
                other => {
                    // the family vanished: continue with its successor
                    cursor.last_face = None;
                    other
                }
            },
        };
        let Some(family) = family else {
            cursor.done = true;
            return None;
        };
        let family_name = reg.family(family)?.name().clone();
        if cursor.family.as_ref() != Some(&family_name) {
            cursor.family = Some(family_name.clone());
            cursor.last_face = None;
        }

        let faces = reg.faces_of(family);
        let start = match &cursor.last_face {
            None => 0,
            Some((last, pos)) => {
                let at = |i: usize| faces.get(i).and_then(|&id| reg.face(id));
                if at(*pos).is_some_and(|f| f.full_name == *last) {
                    pos + 1
                } else {
                    faces
                        .iter()
                        .position(|&id| reg.face(id).is_some_and(|f| f.full_name == *last))
                        .map(|i| i + 1)
                        .unwrap_or(*pos)
                }
            }
        };

        let found = match name {
            Some(name) if family_matches(reg, family, name) => {
                (start..faces.len()).find(|&i| {
                    reg.face(faces[i])
                        .is_some_and(|face| face_matches(reg, family, face, name))
                })
            }
            Some(_) => None,
            None if start == 0 && !faces.is_empty() => Some(0),
            None => None,
        };

        if let Some(i) = found {
            let face = reg.face(faces[i])?;
            cursor.last_face = Some((face.full_name.clone(), i));
            return Some((family, faces[i]));
        }

        // next family
        match reg.seek_family(&family_name, true) {
            Some(next) => {
                cursor.family = reg.family(next).map(|f| f.name().clone());
                cursor.last_face = None;
            }
            None => {
                cursor.done = true;
                return None;
            }
        }
    }
}

/// The charsets a face is enumerated under
///
/// A face with an empty signature is reported once as OEM. The catch-all
/// `DEFAULT` candidate is used only if the face has no other charset bit.
pub(crate) fn face_charsets(face: &Face, candidates: &[Candidate]) -> Vec<(Charset, Script)> {
    if face.signature.is_empty() {
        return vec![(Charset::OEM, Script::OemDos)];
    }
    candidates
        .iter()
        .filter(|c| face.signature.intersects(c.mask))
        .filter(|c| c.charset != Charset::DEFAULT || !face.signature.intersects(c.mask.complement()))
        .map(|c| (c.charset, c.script))
        .collect()
}

/// An iterator over enumerated faces
///
/// The font system is locked only while each face is looked up, never while
/// the caller holds an entry.
pub struct FaceEnumerator<'a> {
    system: &'a FontSystem,
    filter: EnumFilter,
    cursor: Cursor,
    pending: VecDeque<EnumEntry>,
}

impl<'a> FaceEnumerator<'a> {
    pub(crate) fn new(system: &'a FontSystem, filter: EnumFilter) -> Self {
        FaceEnumerator {
            system,
            filter,
            cursor: Cursor::default(),
            pending: VecDeque::new(),
        }
    }
}

impl<'a> Iterator for FaceEnumerator<'a> {
    type Item = EnumEntry;

    fn next(&mut self) -> Option<EnumEntry> {
        while self.pending.is_empty() {
            let entries = self.system.enum_step(&mut self.cursor, &self.filter)?;
            self.pending.extend(entries);
        }
        self.pending.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::charset::candidates;
    use crate::fonts::registry::tests::desc;
    use crate::fonts::{Signature, StyleFlags};

    fn registry() -> Registry {
        let mut reg = Registry::new();
        reg.add_face(&desc("Beta", "Beta", StyleFlags::REGULAR, "/b/r.ttf"));
        reg.add_face(&desc("Beta", "Beta Bold", StyleFlags::BOLD, "/b/b.ttf"));
        reg.add_face(&desc("Alpha", "Alpha", StyleFlags::REGULAR, "/a/r.ttf"));
        reg.add_face(&desc("Gamma", "Gamma Beta", StyleFlags::REGULAR, "/g/r.ttf"));
        reg
    }

    fn names(reg: &Registry, name: Option<&str>) -> Vec<String> {
        let mut cursor = Cursor::default();
        std::iter::from_fn(|| next_face(reg, &mut cursor, name))
            .map(|(_, id)| reg.face(id).unwrap().full_name().to_string())
            .collect()
    }

    #[test]
    fn first_face_per_family() {
        let reg = registry();
        assert_eq!(names(&reg, None), ["Alpha", "Beta", "Gamma Beta"]);
    }

    #[test]
    fn by_family_or_full_name() {
        let reg = registry();
        assert_eq!(names(&reg, Some("beta")), ["Beta", "Beta Bold"]);
        assert_eq!(names(&reg, Some("Gamma Beta")), ["Gamma Beta"]);
        assert!(names(&reg, Some("Delta")).is_empty());
    }

    #[test]
    fn cursor_survives_mutation() {
        let mut reg = registry();
        let mut cursor = Cursor::default();
        let (_, first) = next_face(&reg, &mut cursor, Some("Beta")).unwrap();
        assert_eq!(reg.face(first).unwrap().full_name().as_str(), "Beta");

        // faces added mid-enumeration are still reached
        reg.add_face(&desc("Beta", "Beta Odd", StyleFlags::empty(), "/b/o.ttf"));
        reg.add_face(&desc("Beta", "Beta Italic", StyleFlags::ITALIC, "/b/i.ttf"));
        let rest: Vec<_> = std::iter::from_fn(|| next_face(&reg, &mut cursor, Some("Beta")))
            .map(|(_, id)| reg.face(id).unwrap().full_name().to_string())
            .collect();
        assert_eq!(rest, ["Beta Bold", "Beta Italic", "Beta Odd"]);

        // removing the current family moves on to its successor
        let mut cursor = Cursor::default();
        next_face(&reg, &mut cursor, None);
        reg.remove_faces_from_file(std::path::Path::new("/a/r.ttf"), crate::fonts::FaceFlags::empty());
        let (_, next) = next_face(&reg, &mut cursor, None).unwrap();
        assert_eq!(reg.face(next).unwrap().full_name().as_str(), "Beta");
    }

    #[test]
    fn charsets_per_face() {
        let mut reg = Registry::new();
        let mut d = desc("Multi", "Multi", StyleFlags::REGULAR, "/m.ttf");
        d.signature = Signature::LATIN1 | Signature::CYRILLIC | Signature::from_bits_retain(1 << 12);
        let id = reg.add_face(&d).unwrap();
        let face = reg.face(id).unwrap();
        let list = candidates(Charset::DEFAULT, 1252);
        let got: Vec<_> = face_charsets(face, &list).into_iter().map(|c| c.0).collect();
        // the reserved bit alone does not produce a DEFAULT entry
        assert_eq!(got, [Charset::ANSI, Charset::RUSSIAN]);

        let mut d = desc("Odd", "Odd", StyleFlags::REGULAR, "/o.ttf");
        d.signature = Signature::from_bits_retain(1 << 12);
        let id = reg.add_face(&d).unwrap();
        let got = face_charsets(reg.face(id).unwrap(), &list);
        assert_eq!(got, [(Charset::DEFAULT, Script::Other)]);

        let mut d = desc("Oem", "Oem", StyleFlags::REGULAR, "/e.fon");
        d.signature = Signature::empty();
        let id = reg.add_face(&d).unwrap();
        let got = face_charsets(reg.face(id).unwrap(), &list);
        assert_eq!(got, [(Charset::OEM, Script::OemDos)]);

        let single = candidates(Charset::RUSSIAN, 1252);
        let face = reg.face(reg.find_face_by_full_name("Multi").unwrap()).unwrap();
        assert_eq!(face_charsets(face, &single).len(), 1);
    }
}
