// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Discovery cache
//!
//! Faces found by scanning font files are recorded under
//! [`CACHE_KEY`](crate::store::CACHE_KEY) so that later start-ups may skip
//! the scan. Layout:
//!
//! ```text
//! Fonts/Cache/<family>            "@" = second name
//! Fonts/Cache/<family>            <style name> = record   (scalable)
//! Fonts/Cache/<family>/<y_ppem>   <style name> = record   (bitmap)
//! ```
//!
//! Within `<family>`, `%` and `/` are written as `%25` and `%2F`.

use super::{BitmapSize, Face, FaceDesc, FaceFlags, FaceName, FaceSource, Signature, StyleFlags};
use crate::store::{join_key, ConfigStore, ConfigValue, CACHE_KEY};
use log::debug;
use std::path::PathBuf;

/// Value name holding a family's second name
const SECOND_NAME_VALUE: &str = "@";
/// Bytes before the name strings
const HEADER_LEN: usize = 4 * 4 + 6 * 2 + 4;

/// Location of one face within the cache
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheKey {
    pub family: String,
    pub style: String,
    /// Strike subkey of a bitmap face
    pub y_ppem: Option<i16>,
}

impl CacheKey {
    pub(crate) fn new(family: &FaceName, face: &Face) -> Self {
        CacheKey {
            family: family.as_str().to_string(),
            style: face.style_name.clone(),
            y_ppem: (!face.scalable).then_some(face.size.y_ppem),
        }
    }

    fn key(&self) -> String {
        let key = family_key(&self.family);
        match self.y_ppem {
            Some(ppem) => join_key(&key, &ppem.to_string()),
            None => key,
        }
    }
}

/// The binary form of one cached face
#[derive(Clone, Debug, PartialEq, Eq)]
struct Record {
    index: u32,
    flags: FaceFlags,
    style: StyleFlags,
    version: u32,
    size: BitmapSize,
    signature: Signature,
    full_name: String,
    path: PathBuf,
}

impl Record {
    fn encode(&self) -> Vec<u8> {
        let path = self.path.to_string_lossy();
        let mut data = Vec::with_capacity(HEADER_LEN + self.full_name.len() + path.len() + 2);
        for word in [
            self.index,
            self.flags.bits(),
            self.style.bits(),
            self.version,
        ] {
            data.extend_from_slice(&word.to_le_bytes());
        }
        let size = &self.size;
        for half in [
            size.height,
            size.width,
            size.size,
            size.x_ppem,
            size.y_ppem,
            size.internal_leading,
        ] {
            data.extend_from_slice(&half.to_le_bytes());
        }
        data.extend_from_slice(&self.signature.bits().to_le_bytes());
        data.extend_from_slice(self.full_name.as_bytes());
        data.push(0);
        data.extend_from_slice(path.as_bytes());
        data.push(0);
        data
    }

    fn decode(data: &[u8]) -> Option<Record> {
        if data.len() < HEADER_LEN {
            return None;
        }
        let u32_at = |pos: usize| {
            let bytes: [u8; 4] = data[pos..pos + 4].try_into().ok()?;
            Some(u32::from_le_bytes(bytes))
        };
        let i16_at = |pos: usize| {
            let bytes: [u8; 2] = data[pos..pos + 2].try_into().ok()?;
            Some(i16::from_le_bytes(bytes))
        };

        let size = BitmapSize {
            height: i16_at(16)?,
            width: i16_at(18)?,
            size: i16_at(20)?,
            x_ppem: i16_at(22)?,
            y_ppem: i16_at(24)?,
            internal_leading: i16_at(26)?,
        };

        let mut strings = data[HEADER_LEN..].split(|b| *b == 0);
        let full_name = std::str::from_utf8(strings.next()?).ok()?;
        let path = std::str::from_utf8(strings.next()?).ok()?;
        if path.is_empty() {
            return None;
        }

        Some(Record {
            index: u32_at(0)?,
            flags: FaceFlags::from_bits_truncate(u32_at(4)?),
            style: StyleFlags::from_bits_truncate(u32_at(8)?),
            version: u32_at(12)?,
            size,
            signature: Signature::from_bits_retain(u32_at(28)?),
            full_name: full_name.to_string(),
            path: PathBuf::from(path),
        })
    }
}

fn family_key(family: &str) -> String {
    let mut segment = String::with_capacity(family.len());
    for c in family.chars() {
        match c {
            '%' => segment.push_str("%25"),
            '/' => segment.push_str("%2F"),
            c => segment.push(c),
        }
    }
    join_key(CACHE_KEY, &segment)
}

/// Reverse the escaping of [`family_key`]; `None` if malformed
fn unescape_family(segment: &str) -> Option<String> {
    let mut family = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        family.push_str(&rest[..pos]);
        match rest.get(pos + 1..pos + 3)? {
            "25" => family.push('%'),
            "2F" | "2f" => family.push('/'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    family.push_str(rest);
    Some(family)
}

/// Record `face` (which must be file-backed) under its family
pub fn write_face(
    store: &mut dyn ConfigStore,
    family: &FaceName,
    second_name: Option<&FaceName>,
    face: &Face,
) {
    let Some(path) = face.source.file() else {
        return;
    };
    let family_key = family_key(family.as_str());
    if let Some(second) = second_name {
        store.set_value(
            &family_key,
            SECOND_NAME_VALUE,
            ConfigValue::Str(second.as_str().to_string()),
        );
    }

    let record = Record {
        index: face.index,
        flags: face.flags,
        style: face.style,
        version: face.version,
        size: face.size,
        signature: face.signature,
        full_name: face.full_name.as_str().to_string(),
        path: path.to_path_buf(),
    };
    let key = CacheKey::new(family, face).key();
    store.set_value(&key, &face.style_name, ConfigValue::Binary(record.encode()));
}

/// Delete the record at `key`
pub fn remove(store: &mut dyn ConfigStore, key: &CacheKey) {
    debug!("removing {} {} from the discovery cache", key.family, key.style);
    store.delete_value(&key.key(), &key.style);
}

/// Forget the whole cache
pub fn clear(store: &mut dyn ConfigStore) {
    store.delete_tree(CACHE_KEY);
}

fn read_records(
    store: &dyn ConfigStore,
    key: &str,
    family: &str,
    second_name: Option<&str>,
    scalable: bool,
    out: &mut Vec<FaceDesc>,
) {
    for (style_name, value) in store.values(key) {
        if style_name == SECOND_NAME_VALUE {
            continue;
        }
        let ConfigValue::Binary(data) = value else {
            continue;
        };
        let Some(record) = Record::decode(&data) else {
            debug!("skipping malformed cache record {key}/{style_name}");
            continue;
        };
        out.push(FaceDesc {
            family_name: family.to_string(),
            second_name: second_name.map(str::to_string),
            style_name,
            full_name: record.full_name,
            source: FaceSource::File(record.path),
            index: record.index,
            signature: record.signature,
            style: record.style,
            version: record.version,
            scalable,
            size: record.size,
            flags: record.flags,
        });
    }
}

/// Read every cached face
///
/// Faces are returned in family order; an empty result means the cache is
/// absent and discovery must scan.
pub fn load_cache(store: &dyn ConfigStore) -> Vec<FaceDesc> {
    let mut out = Vec::new();
    for segment in store.subkeys(CACHE_KEY) {
        let family_key = join_key(CACHE_KEY, &segment);
        let Some(family) = unescape_family(&segment) else {
            debug!("skipping malformed cache key {family_key}");
            continue;
        };
        let second_name = store
            .get_value(&family_key, SECOND_NAME_VALUE)
            .and_then(|v| v.as_str().map(str::to_string));
        read_records(store, &family_key, &family, second_name.as_deref(), true, &mut out);
        for strike in store.subkeys(&family_key) {
            if strike.parse::<i16>().is_err() {
                continue;
            }
            let strike_key = join_key(&family_key, &strike);
            read_records(store, &strike_key, &family, second_name.as_deref(), false, &mut out);
        }
    }
    out
}
