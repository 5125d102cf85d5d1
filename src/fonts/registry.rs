// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Family registry and face catalog
//!
//! Families and faces live in generation-checked arenas and carry explicit
//! reference counts:
//!
//! -   a family holds one reference from its creator, one per face in its
//!     list and one per replacement alias pointing at it
//! -   a face holds one reference from its family list plus one per user
//!     (realized fonts, lookups which return a counted face)
//!
//! When a count reaches zero the record is unlinked from every index and
//! freed.

use super::arena::{Arena, Id};
use super::discovery::CacheKey;
use super::{Face, FaceDesc, FaceFlags, FaceName, NameIndex};
use log::{debug, trace};
use std::path::Path;

/// Family identifier
pub type FamilyId = Id<Family>;
/// Face identifier
pub type FaceId = Id<Face>;

/// A named group of faces
#[derive(Debug)]
pub struct Family {
    pub(crate) name: FaceName,
    pub(crate) second_name: Option<FaceName>,
    pub(crate) faces: Vec<FaceId>,
    pub(crate) replacement: Option<FamilyId>,
    pub(crate) refcount: u32,
}

impl Family {
    /// Primary name
    pub fn name(&self) -> &FaceName {
        &self.name
    }

    /// Secondary (usually localized or English) name
    pub fn second_name(&self) -> Option<&FaceName> {
        self.second_name.as_ref()
    }

    /// Replacement target, for alias families
    pub fn replacement(&self) -> Option<FamilyId> {
        self.replacement
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }
}

/// The family and face catalog
#[derive(Default)]
pub struct Registry {
    families: Arena<Family>,
    faces: Arena<Face>,
    by_name: NameIndex<FamilyId>,
    by_second_name: NameIndex<FamilyId>,
    by_full_name: NameIndex<FaceId>,
    uncached: Vec<CacheKey>,
}

/// Family management
impl Registry {
    /// Construct an empty registry
    pub fn new() -> Self {
        Registry::default()
    }

    /// Number of families (including aliases)
    pub fn num_families(&self) -> usize {
        self.families.len()
    }

    /// Number of live faces
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    /// Create a family holding one (creator's) reference
    ///
    /// Fails if a family of that primary name exists. A secondary name equal
    /// to the primary one is ignored.
    pub fn create_family(&mut self, name: &str, second_name: Option<&str>) -> Option<FamilyId> {
        let name = FaceName::new(name);
        if self.by_name.get(&name).is_some() {
            return None;
        }
        let second_name = second_name
            .filter(|s| !s.is_empty())
            .map(FaceName::new)
            .filter(|s| *s != name);

        let id = self.families.insert(Family {
            name: name.clone(),
            second_name: second_name.clone(),
            faces: vec![],
            replacement: None,
            refcount: 1,
        });
        self.by_name.insert(name, id);
        if let Some(second) = second_name {
            self.by_second_name.insert(second, id);
        }
        Some(id)
    }

    /// Find a family by its primary name
    pub fn find_family(&self, name: &str) -> Option<FamilyId> {
        self.by_name.get_str(name)
    }

    /// Find a family by primary name, then by secondary name
    pub fn find_family_any(&self, name: &str) -> Option<FamilyId> {
        let name = FaceName::new(name);
        self.by_name
            .get(&name)
            .or_else(|| self.by_second_name.get(&name))
    }

    /// Access a family
    pub fn family(&self, id: FamilyId) -> Option<&Family> {
        self.families.get(id)
    }

    /// All families, in primary-name order
    pub fn families(&self) -> Vec<FamilyId> {
        self.by_name.values()
    }

    /// The first family whose name sorts after `name` (or equal, if not `exclusive`)
    pub(crate) fn seek_family(&self, name: &FaceName, exclusive: bool) -> Option<FamilyId> {
        self.by_name.seek(name, exclusive).map(|(_, id)| id)
    }

    /// The family whose list actually holds this family's faces
    pub fn list_owner(&self, id: FamilyId) -> FamilyId {
        self.families
            .get(id)
            .and_then(|family| family.replacement)
            .unwrap_or(id)
    }

    /// The faces of a family, read through its replacement target if any
    pub fn faces_of(&self, id: FamilyId) -> &[FaceId] {
        self.families
            .get(self.list_owner(id))
            .map(|family| &family.faces[..])
            .unwrap_or(&[])
    }

    /// Drop one family reference, freeing the family at zero
    pub fn release_family(&mut self, id: FamilyId) {
        let Some(family) = self.families.get_mut(id) else {
            return;
        };
        family.refcount -= 1;
        if family.refcount > 0 {
            return;
        }

        let Some(family) = self.families.remove(id) else {
            return;
        };
        debug_assert!(family.faces.is_empty());
        trace!("freeing family {}", family.name);
        if self.by_name.get(&family.name) == Some(id) {
            self.by_name.remove(&family.name);
        }
        if let Some(second) = family.second_name.as_ref() {
            if self.by_second_name.get(second) == Some(id) {
                self.by_second_name.remove(second);
            }
        }
        if let Some(target) = family.replacement {
            self.release_family(target);
        }
    }

    pub(crate) fn family_mut(&mut self, id: FamilyId) -> Option<&mut Family> {
        self.families.get_mut(id)
    }
}

/// Face management
impl Registry {
    /// Access a face
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    pub(crate) fn face_mut(&mut self, id: FaceId) -> Option<&mut Face> {
        self.faces.get_mut(id)
    }

    /// Store a new face record holding one (creator's) reference
    ///
    /// The face belongs to no family until [`Registry::insert_face`].
    pub fn create_face(&mut self, desc: &FaceDesc) -> FaceId {
        self.faces.insert(Face::new(desc))
    }

    /// Add a counted reference to a face
    pub fn add_face_ref(&mut self, id: FaceId) {
        if let Some(face) = self.faces.get_mut(id) {
            face.refcount += 1;
        }
    }

    /// Insert a face into a family's list
    ///
    /// Faces inserted into an alias family go to the alias target. Returns
    /// `true` if the face was linked in; `false` if it duplicates an existing
    /// face (whose refcount is bumped if it comes from the same file) or is
    /// not newer than it. The caller keeps its own reference either way.
    pub fn insert_face(&mut self, face_id: FaceId, family_id: FamilyId) -> bool {
        let family_id = self.list_owner(family_id);
        let Some(family) = self.families.get(family_id) else {
            return false;
        };
        let Some(face) = self.faces.get(face_id) else {
            return false;
        };

        let mut placement = Placement::Insert(family.faces.len());
        for (pos, &cursor_id) in family.faces.iter().enumerate() {
            let Some(cursor) = self.faces.get(cursor_id) else {
                continue;
            };

            if face.same_face(cursor) {
                debug!(
                    "already loaded face {} in family {}, original version {:x}, new version {:x}",
                    face.full_name, family.name, cursor.version, face.version
                );
                placement = if face.source.same_file(&cursor.source) {
                    Placement::SameFile(cursor_id)
                } else if face.version <= cursor.version {
                    debug!("original face {} is newer, skipping", cursor.full_name);
                    Placement::Older
                } else {
                    Placement::Replace(pos, cursor_id)
                };
                break;
            }

            if face.style.order() < cursor.style.order() {
                placement = Placement::Insert(pos);
                break;
            }
        }

        let insert_at = match placement {
            Placement::SameFile(existing) => {
                self.add_face_ref(existing);
                return false;
            }
            Placement::Older => return false,
            Placement::Replace(pos, old) => {
                self.replace_face(family_id, pos, old, face_id);
                return true;
            }
            Placement::Insert(pos) => pos,
        };

        trace!("adding face {} to family {}", face.full_name, family.name);
        let scalable = face.scalable;
        let full_name = face.full_name.clone();
        if let Some(family) = self.families.get_mut(family_id) {
            family.faces.insert(insert_at, face_id);
            family.refcount += 1;
        }
        let registered = scalable && self.by_full_name.insert(full_name, face_id);
        if let Some(face) = self.faces.get_mut(face_id) {
            face.family = Some(family_id);
            face.refcount += 1;
            face.in_full_name_index = registered;
        }
        true
    }

    /// Replace the face at `pos` by a newer version, in place
    fn replace_face(&mut self, family_id: FamilyId, pos: usize, old_id: FaceId, new_id: FaceId) {
        debug!("replacing face at position {pos} of {family_id:?} with a newer version");
        if let Some(family) = self.families.get_mut(family_id) {
            family.faces[pos] = new_id;
            family.refcount += 1;
        }

        let mut transfer = None;
        if let Some(old) = self.faces.get_mut(old_id) {
            if old.in_full_name_index {
                old.in_full_name_index = false;
                transfer = Some(old.full_name.clone());
            }
            old.family = None;
        }
        let transferred = transfer.is_some();
        if let Some(name) = transfer {
            self.by_full_name.replace(&name, new_id);
        }
        if let Some(new) = self.faces.get_mut(new_id) {
            new.family = Some(family_id);
            new.refcount += 1;
            new.in_full_name_index = transferred;
        }

        // The old face no longer sits in the list: drop the list's reference
        // on it and the reference it held on the family.
        self.release_face(old_id);
        self.release_family(family_id);
    }

    /// Drop one face reference, freeing the face at zero
    pub fn release_face(&mut self, id: FaceId) {
        let Some(face) = self.faces.get_mut(id) else {
            return;
        };
        face.refcount -= 1;
        if face.refcount > 0 {
            return;
        }

        let Some(face) = self.faces.remove(id) else {
            return;
        };
        trace!("freeing face {}", face.full_name);
        if face.in_full_name_index && self.by_full_name.get(&face.full_name) == Some(id) {
            self.by_full_name.remove(&face.full_name);
        }
        if let Some(family_id) = face.family {
            if let Some(family) = self.families.get_mut(family_id) {
                family.faces.retain(|f| *f != id);
                if face.flags.contains(FaceFlags::ADD_TO_CACHE) {
                    self.uncached.push(CacheKey::new(&family.name, &face));
                }
            }
            self.release_family(family_id);
        }
    }

    /// Find a scalable face by full name (direct index lookup)
    pub fn find_face_by_full_name(&self, name: &str) -> Option<FaceId> {
        self.by_full_name.get_str(name)
    }

    /// Number of full-name index entries
    pub fn full_name_index_len(&self) -> usize {
        self.by_full_name.len()
    }

    /// Find a face by file name (final path component), optionally within a
    /// named family
    ///
    /// On success the returned face carries an extra reference which the
    /// caller must release.
    pub fn find_face_from_filename(
        &mut self,
        file_name: &str,
        family_name: Option<&str>,
    ) -> Option<FaceId> {
        trace!("looking for file {file_name} name {family_name:?}");
        let mut found = None;
        'outer: for (name, family_id) in self.by_name.iter() {
            if let Some(family_name) = family_name {
                if !name.matches(family_name) {
                    continue;
                }
            }
            for &face_id in self.faces_of(family_id) {
                let Some(face) = self.faces.get(face_id) else {
                    continue;
                };
                if face.source.has_file_name(file_name) {
                    found = Some(face_id);
                    break 'outer;
                }
            }
        }
        let id = found?;
        self.add_face_ref(id);
        Some(id)
    }

    /// Find or create the family for `desc`, then create and insert the face
    ///
    /// Returns the face if it was linked in. Creation references are dropped
    /// so the face is owned by its family list alone.
    pub fn add_face(&mut self, desc: &FaceDesc) -> Option<FaceId> {
        let (family_id, created) = match self.find_family(&desc.family_name) {
            Some(id) => {
                self.adopt_second_name(id, desc.second_name.as_deref());
                (id, false)
            }
            None => (
                self.create_family(&desc.family_name, desc.second_name.as_deref())?,
                true,
            ),
        };

        let face_id = self.create_face(desc);
        let inserted = self.insert_face(face_id, family_id);
        self.release_face(face_id);
        if created {
            self.release_family(family_id);
        }
        if inserted {
            Some(face_id)
        } else {
            None
        }
    }

    fn adopt_second_name(&mut self, id: FamilyId, second_name: Option<&str>) {
        let Some(second) = second_name.filter(|s| !s.is_empty()).map(FaceName::new) else {
            return;
        };
        let Some(family) = self.families.get_mut(id) else {
            return;
        };
        if family.second_name.is_some() || family.name == second {
            return;
        }
        family.second_name = Some(second.clone());
        self.by_second_name.insert(second, id);
    }

    /// Remove faces loaded from `file` whose flags have the given scope
    ///
    /// Each matching face loses its list reference; faces still in use by
    /// realized fonts stay listed until released. Returns the number of
    /// faces released.
    pub fn remove_faces_from_file(&mut self, file: &Path, scope: FaceFlags) -> usize {
        let target = super::FaceSource::File(file.to_path_buf());
        let mut count = 0;
        for family_id in self.families() {
            // Hold the family while its faces are released
            if let Some(family) = self.families.get_mut(family_id) {
                family.refcount += 1;
            } else {
                continue;
            }
            let faces = self.families.get(family_id).map(|f| f.faces.clone());
            for face_id in faces.unwrap_or_default() {
                let Some(face) = self.faces.get(face_id) else {
                    continue;
                };
                if face.flags.scope() != scope.scope() || !face.source.same_file(&target) {
                    continue;
                }
                debug!(
                    "removing matching face {} refcount {}",
                    face.full_name, face.refcount
                );
                self.release_face(face_id);
                count += 1;
            }
            self.release_family(family_id);
        }
        count
    }

    /// Take the discovery-cache records of faces freed since the last call
    pub(crate) fn take_uncached(&mut self) -> Vec<CacheKey> {
        std::mem::take(&mut self.uncached)
    }
}

enum Placement {
    SameFile(FaceId),
    Older,
    Replace(usize, FaceId),
    Insert(usize),
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fonts::{BitmapSize, FaceSource, Signature, StyleFlags};
    use std::path::PathBuf;

    pub(crate) fn desc(family: &str, full: &str, style: StyleFlags, file: &str) -> FaceDesc {
        FaceDesc {
            family_name: family.to_string(),
            second_name: None,
            style_name: "Regular".to_string(),
            full_name: full.to_string(),
            source: FaceSource::File(PathBuf::from(file)),
            index: 0,
            signature: Signature::LATIN1,
            style,
            version: 1,
            scalable: true,
            size: BitmapSize::default(),
            flags: FaceFlags::empty(),
        }
    }

    fn names(reg: &Registry, family: FamilyId) -> Vec<String> {
        reg.faces_of(family)
            .iter()
            .map(|id| reg.face(*id).unwrap().full_name().to_string())
            .collect()
    }

    #[test]
    fn faces_are_ordered_by_style() {
        let mut reg = Registry::new();
        reg.add_face(&desc("Sans", "Sans Bold Italic", StyleFlags::BOLD | StyleFlags::ITALIC, "/f/sbi.ttf"));
        reg.add_face(&desc("Sans", "Sans Odd", StyleFlags::empty(), "/f/so.ttf"));
        reg.add_face(&desc("Sans", "Sans Italic", StyleFlags::ITALIC, "/f/si.ttf"));
        reg.add_face(&desc("Sans", "Sans", StyleFlags::REGULAR, "/f/s.ttf"));
        reg.add_face(&desc("Sans", "Sans Bold", StyleFlags::BOLD, "/f/sb.ttf"));

        let family = reg.find_family("sans").unwrap();
        assert_eq!(
            names(&reg, family),
            ["Sans", "Sans Bold", "Sans Italic", "Sans Bold Italic", "Sans Odd"]
        );
        // creator reference dropped: one per face
        assert_eq!(reg.family(family).unwrap().refcount(), 5);
        assert_eq!(reg.full_name_index_len(), 5);
    }

    #[test]
    fn same_file_duplicate_bumps_refcount() {
        let mut reg = Registry::new();
        let first = reg.add_face(&desc("Serif", "Serif", StyleFlags::REGULAR, "/f/serif.ttf")).unwrap();
        assert!(reg.add_face(&desc("Serif", "SERIF", StyleFlags::REGULAR, "/F/Serif.TTF")).is_none());
        assert_eq!(reg.face(first).unwrap().refcount(), 2);
        assert_eq!(reg.num_faces(), 1);

        // two removals needed to drop it
        assert_eq!(reg.remove_faces_from_file(Path::new("/f/serif.ttf"), FaceFlags::empty()), 1);
        assert!(reg.face(first).is_some());
        assert_eq!(reg.remove_faces_from_file(Path::new("/f/serif.ttf"), FaceFlags::empty()), 1);
        assert!(reg.face(first).is_none());
        assert!(reg.find_family("Serif").is_none());
        assert_eq!(reg.num_families(), 0);
    }

    #[test]
    fn newer_version_replaces_in_place() {
        let mut reg = Registry::new();
        reg.add_face(&desc("Mono", "Mono", StyleFlags::REGULAR, "/a/mono.ttf"));
        let old = reg.add_face(&desc("Mono", "Mono Bold", StyleFlags::BOLD, "/a/monob.ttf")).unwrap();
        reg.add_face(&desc("Mono", "Mono Italic", StyleFlags::ITALIC, "/a/monoi.ttf"));

        let mut older = desc("Mono", "Mono Bold", StyleFlags::BOLD, "/b/monob.ttf");
        older.version = 1;
        assert!(reg.add_face(&older).is_none());

        let mut newer = desc("Mono", "Mono Bold", StyleFlags::BOLD, "/b/monob.ttf");
        newer.version = 2;
        let new = reg.add_face(&newer).unwrap();

        let family = reg.find_family("Mono").unwrap();
        assert_eq!(reg.faces_of(family)[1], new);
        assert!(reg.face(old).is_none());
        assert_eq!(reg.find_face_by_full_name("mono bold"), Some(new));
        assert!(reg.face(new).unwrap().in_full_name_index());
        assert_eq!(reg.full_name_index_len(), 3);
        assert_eq!(reg.family(family).unwrap().refcount(), 3);
    }

    #[test]
    fn bitmap_faces_compare_size_and_signature() {
        let mut reg = Registry::new();
        let mut small = desc("Fixed", "Fixed", StyleFlags::REGULAR, "/b/fixed13.fon");
        small.scalable = false;
        small.size.y_ppem = 13;
        small.size.height = 13;
        let mut large = small.clone();
        large.source = FaceSource::File(PathBuf::from("/b/fixed16.fon"));
        large.size.y_ppem = 16;
        assert!(reg.add_face(&small).is_some());
        assert!(reg.add_face(&large).is_some());
        // bitmap faces never enter the full-name index
        assert_eq!(reg.full_name_index_len(), 0);
    }

    #[test]
    fn second_names_and_filename_lookup() {
        let mut reg = Registry::new();
        let mut d = desc("ＭＳ ゴシック", "ＭＳ ゴシック", StyleFlags::REGULAR, "/w/msgothic.ttc");
        d.second_name = Some("MS Gothic".to_string());
        reg.add_face(&d);
        let family = reg.find_family_any("ms gothic").unwrap();
        assert!(reg.find_family("MS Gothic").is_none());
        assert_eq!(reg.find_family("ＭＳ ゴシック"), Some(family));

        let face = reg.find_face_from_filename("MSGOTHIC.TTC", None).unwrap();
        assert_eq!(reg.face(face).unwrap().refcount(), 2);
        reg.release_face(face);
        assert!(reg.find_face_from_filename("msgothic.ttc", Some("Other")).is_none());
    }
}
