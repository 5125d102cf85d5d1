// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font resolution and caching
//!
//! Fonts are managed by a [`FontSystem`], constructed once over a
//! [`Backend`](crate::backend::Backend) and a
//! [`ConfigStore`](crate::store::ConfigStore).
//!
//! ### Families and faces
//!
//! A *face* is one concrete style of a font, backed by a file or an
//! in-memory blob. Faces are grouped in *families* by name. The
//! [`Registry`] owns both; families and faces are addressed by
//! generation-checked ids and freed when their reference count drops to
//! zero.
//!
//! A family may instead be a *replacement*: an alias whose face list is
//! that of another family. Names are also redirected by the substitution
//! table, and font *links* give a font an ordered list of fallback
//! families used for characters its own face lacks.
//!
//! ### Realized fonts
//!
//! A request ([`LogFont`](crate::LogFont) plus [`Matrix`](crate::Matrix)
//! and a bitmap-allowed flag) resolves to a face and is then realized: the
//! face is loaded, a fallback cascade attached and the result cached under
//! a [`FontHandle`]. Handles are reference counted; released fonts stay
//! cached for reuse until evicted.
//!
//! ### Sizes
//!
//! Request heights follow the classic convention: a positive height is the
//! cell height in pixels, a negative one the character height (excluding
//! internal leading), zero a default size. Backends report font units;
//! [`crate::DPU`] converts them to pixels.

mod arena;
mod attributes;
mod cache;
pub mod charset;
mod discovery;
mod enumerate;
mod face;
pub(crate) mod families;
mod glyph_cache;
mod gsub;
mod handles;
mod library;
mod links;
mod name;
mod registry;
mod replace;
mod resolver;
mod subst;

pub use arena::Id;
pub use attributes::{FontWeight, StyleFlags};
pub use cache::{bitmap_scale, font_hash, FontCache, RealizedFont, UNUSED_CACHE_SIZE};
pub use charset::{Charset, Script, Signature};
pub use discovery::CacheKey;
pub use enumerate::{EnumEntry, EnumFilter, EnumSnapshot, FaceEnumerator, FontType};
pub use face::{BitmapSize, Face, FaceDesc, FaceFlags, FaceSource};
pub use glyph_cache::{GlyphCache, GlyphMetrics, BLOCK_SIZE};
pub use gsub::{is_upright_in_vertical, VerticalSubst};
pub use handles::{FontHandle, HandleTable, MAX_FONT_HANDLES};
pub use library::{FontError, FontInfo, FontSystem, InvalidHandle, LinkedGlyph, NoFontMatch};
pub use library::SelectError;
pub use links::{FontLink, FontLinks, LinkEntry, SHELL_DLG, SYSTEM_FONT};
pub use name::{truncate_face_name, FaceName, NameIndex, MAX_FACE_NAME};
pub use registry::{FaceId, Family, FamilyId, Registry};
pub use resolver::{signature_of, ExtraFallbacks, FaceMatch, Matcher, Resolved};
pub use subst::{SubstEntry, SubstName, SubstTable};
