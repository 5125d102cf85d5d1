// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Case-insensitive face names and name indices

use std::cmp::Ordering;
use std::fmt;

/// Maximum face-name length in UTF-16 code units, excluding the terminator
pub const MAX_FACE_NAME: usize = 31;

/// Truncate `name` to at most [`MAX_FACE_NAME`] UTF-16 code units
///
/// Truncation never splits a surrogate pair.
pub fn truncate_face_name(name: &str) -> &str {
    let mut units = 0;
    for (i, c) in name.char_indices() {
        units += c.len_utf16();
        if units > MAX_FACE_NAME {
            return &name[..i];
        }
    }
    name
}

fn fold(s: &str) -> String {
    s.chars().flat_map(char::to_lowercase).collect()
}

/// A face or family name compared without regard to case
///
/// Names are truncated on construction to the classic face-name length and
/// folded once; ordering and equality use the folded form while the
/// original spelling is kept for display.
#[derive(Clone)]
pub struct FaceName {
    name: String,
    folded: String,
}

impl FaceName {
    /// Construct (truncating)
    pub fn new(name: &str) -> Self {
        let name = truncate_face_name(name);
        FaceName {
            name: name.to_string(),
            folded: fold(name),
        }
    }

    /// The original spelling
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.name
    }

    /// True if this is a vertical-writing name (leading `@`)
    #[inline]
    pub fn is_vertical(&self) -> bool {
        self.name.starts_with('@')
    }

    /// True if the name is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
    }

    /// Compare with a plain string (the string is truncated likewise)
    pub fn matches(&self, other: &str) -> bool {
        self.folded == fold(truncate_face_name(other))
    }

    /// Case-insensitive comparison of two plain strings
    pub fn eq_str(a: &str, b: &str) -> bool {
        fold(truncate_face_name(a)) == fold(truncate_face_name(b))
    }

    /// The vertical-writing form of this name
    pub fn vertical(&self) -> FaceName {
        FaceName::new(&format!("@{}", self.name))
    }
}

impl PartialEq for FaceName {
    fn eq(&self, other: &Self) -> bool {
        self.folded == other.folded
    }
}

impl Eq for FaceName {}

impl PartialOrd for FaceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FaceName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.folded.cmp(&other.folded)
    }
}

impl fmt::Debug for FaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.name, f)
    }
}

impl fmt::Display for FaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl From<&str> for FaceName {
    fn from(name: &str) -> Self {
        FaceName::new(name)
    }
}

/// An ordered map from [`FaceName`] to `T`
///
/// This is a sorted vec-map: expected cardinality is in the hundreds, where
/// binary search over a contiguous vector beats a tree.
#[derive(Clone, Debug)]
pub struct NameIndex<T> {
    entries: Vec<(FaceName, T)>,
}

impl<T> Default for NameIndex<T> {
    fn default() -> Self {
        NameIndex { entries: vec![] }
    }
}

impl<T: Copy> NameIndex<T> {
    fn search(&self, name: &FaceName) -> Result<usize, usize> {
        self.entries.binary_search_by(|(k, _)| k.cmp(name))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Look up by name
    pub fn get(&self, name: &FaceName) -> Option<T> {
        self.search(name).ok().map(|i| self.entries[i].1)
    }

    /// Look up by plain string
    pub fn get_str(&self, name: &str) -> Option<T> {
        self.get(&FaceName::new(name))
    }

    /// Insert unless the key is already present
    ///
    /// Returns `false` (leaving the index unchanged) on a duplicate key.
    pub fn insert(&mut self, name: FaceName, value: T) -> bool {
        match self.search(&name) {
            Ok(_) => false,
            Err(i) => {
                self.entries.insert(i, (name, value));
                true
            }
        }
    }

    /// Replace the value stored under `name`, if present
    pub fn replace(&mut self, name: &FaceName, value: T) -> Option<T> {
        let i = self.search(name).ok()?;
        Some(std::mem::replace(&mut self.entries[i].1, value))
    }

    /// Remove an entry
    pub fn remove(&mut self, name: &FaceName) -> Option<T> {
        let i = self.search(name).ok()?;
        Some(self.entries.remove(i).1)
    }

    /// Iterate in name order
    pub fn iter(&self) -> impl Iterator<Item = (&FaceName, T)> + '_ {
        self.entries.iter().map(|(k, v)| (k, *v))
    }

    /// Values in name order
    pub fn values(&self) -> Vec<T> {
        self.entries.iter().map(|(_, v)| *v).collect()
    }

    /// The first entry whose key is `>= name` (or `> name` if `exclusive`)
    pub fn seek(&self, name: &FaceName, exclusive: bool) -> Option<(&FaceName, T)> {
        let i = match self.search(name) {
            Ok(i) if exclusive => i + 1,
            Ok(i) => i,
            Err(i) => i,
        };
        self.entries.get(i).map(|(k, v)| (k, *v))
    }

    /// The first entry
    pub fn first(&self) -> Option<(&FaceName, T)> {
        self.entries.first().map(|(k, v)| (k, *v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive() {
        let a = FaceName::new("MS Shell Dlg");
        assert_eq!(a, FaceName::new("ms shell DLG"));
        assert!(a.matches("MS SHELL DLG"));
        assert_eq!(a.as_str(), "MS Shell Dlg");
        assert!(FaceName::eq_str("Ärial", "äRIAL"));
    }

    #[test]
    fn truncation() {
        let long = "abcdefghijklmnopqrstuvwxyz0123456789";
        assert_eq!(truncate_face_name(long).len(), MAX_FACE_NAME);
        assert!(FaceName::new(long).matches(&long[..31]));
        // a surrogate pair straddling the limit is dropped whole
        let s = format!("{}{}", "a".repeat(30), '😀');
        assert_eq!(truncate_face_name(&s), "a".repeat(30));
    }

    #[test]
    fn index_rejects_duplicates_and_seeks() {
        let mut index = NameIndex::default();
        assert!(index.insert(FaceName::new("Tahoma"), 1));
        assert!(index.insert(FaceName::new("Arial"), 2));
        assert!(!index.insert(FaceName::new("ARIAL"), 3));
        assert_eq!(index.get_str("arial"), Some(2));
        assert_eq!(index.values(), vec![2, 1]);

        let (k, v) = index.seek(&FaceName::new("Arial"), true).unwrap();
        assert_eq!((k.as_str(), v), ("Tahoma", 1));
        assert_eq!(index.seek(&FaceName::new("B"), false).map(|e| e.1), Some(1));
        assert!(index.seek(&FaceName::new("Tahoma"), true).is_none());

        assert_eq!(index.replace(&FaceName::new("tahoma"), 7), Some(1));
        assert_eq!(index.remove(&FaceName::new("Tahoma")), Some(7));
        assert_eq!(index.len(), 1);
    }
}
