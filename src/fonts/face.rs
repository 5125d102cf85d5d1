// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font face records

use super::enumerate::EnumSnapshot;
use super::{FaceName, FamilyId, Signature, StyleFlags};
use bitflags::bitflags;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a face's data lives
#[derive(Clone)]
pub enum FaceSource {
    /// A font file on disk
    File(PathBuf),
    /// An in-memory blob
    Memory(Arc<dyn AsRef<[u8]> + Send + Sync>),
}

impl FaceSource {
    /// The file path, if any
    pub fn file(&self) -> Option<&Path> {
        match self {
            FaceSource::File(path) => Some(path),
            FaceSource::Memory(_) => None,
        }
    }

    /// True if both sources are the same file (compared case-insensitively)
    pub fn same_file(&self, other: &FaceSource) -> bool {
        match (self.file(), other.file()) {
            (Some(a), Some(b)) => {
                let a = a.to_string_lossy();
                let b = b.to_string_lossy();
                a.to_lowercase() == b.to_lowercase()
            }
            _ => false,
        }
    }

    /// True if the file's final component equals `file_name` (case-insensitive)
    pub fn has_file_name(&self, file_name: &str) -> bool {
        self.file()
            .and_then(|path| path.file_name())
            .map(|name| name.to_string_lossy().to_lowercase() == file_name.to_lowercase())
            .unwrap_or(false)
    }
}

impl fmt::Debug for FaceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaceSource::File(path) => f.debug_tuple("File").field(path).finish(),
            FaceSource::Memory(data) => write!(f, "Memory({} bytes)", (**data).as_ref().len()),
        }
    }
}

bitflags! {
    /// How a face was added to the registry
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct FaceFlags: u32 {
        /// Added by an application rather than discovered
        const EXTERNAL = 0x01;
        /// Bitmap faces may be added
        const ALLOW_BITMAP = 0x02;
        /// Record the face in the discovery cache
        const ADD_TO_CACHE = 0x04;
        /// Added as a private resource
        const ADD_RESOURCE = 0x08;
        /// Vertical-writing variant
        const VERTICAL = 0x10;
    }
}

impl FaceFlags {
    /// Bits compared when removing faces by file
    pub const SCOPE: FaceFlags = FaceFlags::all();

    /// The scope-relevant part of these flags
    #[inline]
    pub fn scope(self) -> FaceFlags {
        self & Self::SCOPE
    }
}

/// Pixel sizes of a non-scalable (bitmap) face
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BitmapSize {
    pub height: i16,
    pub width: i16,
    pub size: i16,
    pub x_ppem: i16,
    pub y_ppem: i16,
    pub internal_leading: i16,
}

/// Description of a discovered face, as supplied by a backend
#[derive(Clone, Debug)]
pub struct FaceDesc {
    pub family_name: String,
    pub second_name: Option<String>,
    pub style_name: String,
    pub full_name: String,
    pub source: FaceSource,
    /// Index of the face within its source (collections)
    pub index: u32,
    pub signature: Signature,
    pub style: StyleFlags,
    pub version: u32,
    pub scalable: bool,
    /// Only meaningful when not `scalable`
    pub size: BitmapSize,
    pub flags: FaceFlags,
}

/// A face record owned by the registry
pub struct Face {
    pub(crate) style_name: String,
    pub(crate) full_name: FaceName,
    pub(crate) source: FaceSource,
    pub(crate) index: u32,
    pub(crate) signature: Signature,
    pub(crate) style: StyleFlags,
    pub(crate) version: u32,
    pub(crate) scalable: bool,
    pub(crate) size: BitmapSize,
    pub(crate) flags: FaceFlags,
    pub(crate) refcount: u32,
    pub(crate) family: Option<FamilyId>,
    pub(crate) in_full_name_index: bool,
    pub(crate) enum_data: Option<EnumSnapshot>,
}

impl Face {
    /// Construct with a single (creator's) reference and no family
    pub(crate) fn new(desc: &FaceDesc) -> Self {
        Face {
            style_name: desc.style_name.clone(),
            full_name: FaceName::new(&desc.full_name),
            source: desc.source.clone(),
            index: desc.index,
            signature: desc.signature,
            style: desc.style,
            version: desc.version,
            scalable: desc.scalable,
            size: if desc.scalable {
                BitmapSize::default()
            } else {
                desc.size
            },
            flags: desc.flags,
            refcount: 1,
            family: None,
            in_full_name_index: false,
            enum_data: None,
        }
    }

    /// Two faces are duplicates if full names match and, for bitmap faces,
    /// pixel height and signature match too
    pub(crate) fn same_face(&self, other: &Face) -> bool {
        if self.full_name != other.full_name {
            return false;
        }
        if self.scalable {
            return true;
        }
        self.size.y_ppem == other.size.y_ppem && self.signature == other.signature
    }

    pub fn style_name(&self) -> &str {
        &self.style_name
    }

    pub fn full_name(&self) -> &FaceName {
        &self.full_name
    }

    pub fn source(&self) -> &FaceSource {
        &self.source
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn style(&self) -> StyleFlags {
        self.style
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn is_scalable(&self) -> bool {
        self.scalable
    }

    pub fn size(&self) -> BitmapSize {
        self.size
    }

    pub fn flags(&self) -> FaceFlags {
        self.flags
    }

    pub fn refcount(&self) -> u32 {
        self.refcount
    }

    /// The owning family, unless detached
    pub fn family(&self) -> Option<FamilyId> {
        self.family
    }

    /// True if registered in the full-name index
    pub fn in_full_name_index(&self) -> bool {
        self.in_full_name_index
    }
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("full_name", &self.full_name)
            .field("style", &self.style)
            .field("source", &self.source)
            .field("refcount", &self.refcount)
            .finish_non_exhaustive()
    }
}
