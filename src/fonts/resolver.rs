// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Face matching
//!
//! A [`Matcher`] resolves a [`LogFont`] request to a face of the registry.
//! Matching proceeds by name (direct, substituted, full face name, font
//! link), then over generic fallbacks and finally over every family, with
//! the charset constraint relaxed step by step.

use super::charset::{self, Charset, Signature};
use super::families::{builtin_fallbacks, fallback_class};
use super::links::FontLinks;
use super::registry::{FaceId, FamilyId, Registry};
use super::subst::SubstTable;
use super::{Face, FaceName, NoFontMatch};
use crate::backend::FallbackClass;
use crate::{Config, LogFont};
use log::{debug, trace};

/// Backend-declared fallback families, per class
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraFallbacks {
    pub fixed: Vec<String>,
    pub serif: Vec<String>,
    pub sans: Vec<String>,
}

impl ExtraFallbacks {
    /// Names for a class
    pub fn get(&self, class: FallbackClass) -> &[String] {
        match class {
            FallbackClass::Fixed => &self.fixed,
            FallbackClass::Serif => &self.serif,
            FallbackClass::Sans => &self.sans,
        }
    }
}

/// A face found for a request, and the family it was found through
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FaceMatch {
    pub face: FaceId,
    pub family: FamilyId,
}

/// The outcome of [`Matcher::resolve`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    pub face: FaceId,
    /// The signature the face was selected under (empty if unconstrained)
    pub signature: Signature,
    pub charset: Charset,
    pub codepage: u16,
    /// Name to report instead of the face's family name (alias matches)
    pub name_override: Option<FaceName>,
}

/// Face-matching engine over a borrowed registry state
pub struct Matcher<'a> {
    pub reg: &'a Registry,
    pub subst: &'a SubstTable,
    pub links: &'a FontLinks,
    pub config: &'a Config,
    pub fallbacks: &'a ExtraFallbacks,
}

impl<'a> Matcher<'a> {
    /// True if `face` may be selected under `signature`
    ///
    /// A face qualifies through its own signature or through the combined
    /// signature of its family's font link.
    pub fn can_select(&self, face: &Face, signature: Signature, allow_bitmap: bool) -> bool {
        if !face.scalable && !allow_bitmap {
            return false;
        }
        if signature.is_empty() || face.signature.intersects(signature) {
            return true;
        }
        face.family
            .and_then(|id| self.reg.family(id))
            .and_then(|family| self.links.find(family.name().as_str()))
            .map(|link| link.combined_signature().intersects(signature))
            .unwrap_or(false)
    }

    /// The best face of a family for the requested style
    ///
    /// Faces are scored by italic and bold mismatch. A scalable face wins over
    /// bitmap faces; among bitmap faces of equal score the closest pixel
    /// height is preferred, larger-but-closest over smaller.
    pub fn best_in_family(
        &self,
        family: FamilyId,
        lf: &LogFont,
        signature: Signature,
        allow_bitmap: bool,
    ) -> Option<FaceId> {
        let (want_italic, want_bold) = (lf.wants_italic(), lf.wants_bold());
        let mut best = None;
        let mut best_bitmap = None;
        let mut best_score = 4;
        let mut best_diff = 0;

        for &id in self.reg.faces_of(family) {
            let Some(face) = self.reg.face(id) else {
                continue;
            };
            if !self.can_select(face, signature, allow_bitmap) {
                continue;
            }
            let score = u32::from(face.style.is_italic() != want_italic)
                + u32::from(face.style.is_bold() != want_bold);
            if score > best_score {
                continue;
            }

            if face.scalable {
                best_score = score;
                best = Some(id);
                if score == 0 {
                    break;
                }
            } else {
                let diff = bitmap_height_diff(lf.height, face);
                if best_bitmap.is_none()
                    || score < best_score
                    || (best_diff > 0 && diff >= 0 && diff < best_diff)
                    || (best_diff < 0 && diff > best_diff)
                {
                    trace!(
                        "bitmap height {} is better for {}, diff was {best_diff}",
                        face.size.height,
                        lf.height
                    );
                    best_diff = diff;
                    best_bitmap = Some(id);
                    best_score = score;
                    if score == 0 && diff == 0 {
                        break;
                    }
                }
            }
        }
        best.or(best_bitmap)
    }

    /// Match by family name, substitute name, full face name, then font link
    pub fn match_by_name(
        &self,
        name: &str,
        substitute: Option<&str>,
        lf: &LogFont,
        signature: Signature,
        allow_bitmap: bool,
    ) -> Option<FaceMatch> {
        let by_family = |name: &str| {
            let family = self.reg.find_family_any(name)?;
            let face = self.best_in_family(family, lf, signature, allow_bitmap)?;
            Some(FaceMatch { face, family })
        };

        if let Some(m) = by_family(name) {
            return Some(m);
        }
        if let Some(m) = substitute.and_then(by_family) {
            return Some(m);
        }

        for family in self.reg.families() {
            for &id in self.reg.faces_of(family) {
                let Some(face) = self.reg.face(id) else {
                    continue;
                };
                if face.full_name.matches(name) && self.can_select(face, signature, allow_bitmap) {
                    return Some(FaceMatch { face: id, family });
                }
            }
        }

        let link = self.links.find(name)?;
        for entry in link.entries() {
            let Some(family) = self.reg.find_family_any(entry.family.as_str()) else {
                continue;
            };
            if !entry.signature.intersects(signature) {
                continue;
            }
            if let Some(face) = self.best_in_family(family, lf, signature, allow_bitmap) {
                return Some(FaceMatch { face, family });
            }
        }
        None
    }

    /// Match any face: generic fallbacks first, then every family
    ///
    /// Only families whose vertical-ness equals `want_vertical` are scanned.
    pub fn match_any(
        &self,
        lf: &LogFont,
        signature: Signature,
        allow_bitmap: bool,
        want_vertical: bool,
    ) -> Option<FaceMatch> {
        let class = fallback_class(lf.pitch_and_family);
        let builtin = builtin_fallbacks(class).iter().copied();
        let extra = self.fallbacks.get(class).iter().map(String::as_str);
        for name in builtin.chain(extra) {
            let name = if want_vertical {
                format!("@{name}")
            } else {
                name.to_string()
            };
            let Some(family) = self.reg.find_family_any(&name) else {
                continue;
            };
            if let Some(face) = self.best_in_family(family, lf, signature, false) {
                return Some(FaceMatch { face, family });
            }
        }

        let scan = |allow_bitmap| {
            self.reg.families().into_iter().find_map(|family| {
                let name = self.reg.family(family)?.name();
                if name.is_vertical() != want_vertical {
                    return None;
                }
                let face = self.best_in_family(family, lf, signature, allow_bitmap)?;
                Some(FaceMatch { face, family })
            })
        };
        scan(false).or_else(|| if allow_bitmap { scan(true) } else { None })
    }

    /// Resolve a request, relaxing constraints until a face is found
    pub fn resolve(&self, lf: &LogFont, allow_bitmap: bool) -> Result<Resolved, NoFontMatch> {
        let mut charset = lf.charset;
        let mut signature = signature_of(charset);
        let mut found = None;

        if !lf.face_name.is_empty() {
            let substitute = self.subst.get(&lf.face_name, Some(lf.charset));
            if let Some(entry) = substitute {
                debug!(
                    "substituting {} -> {} (charset {:?})",
                    lf.face_name, entry.to.name, entry.to.charset
                );
                if let Some(to) = entry.to.charset {
                    charset = to;
                    signature = signature_of(charset);
                }
            }
            found = self.match_by_name(
                &lf.face_name,
                substitute.map(|e| e.to.name.as_str()),
                lf,
                signature,
                allow_bitmap,
            );
        }

        let mut via_fallback = false;
        if found.is_none() {
            via_fallback = true;
            let mut want_vertical = lf.wants_vertical();
            if signature.is_empty() {
                signature = self.config.ansi_signature();
            }
            found = self.match_any(lf, signature, allow_bitmap, want_vertical);
            if found.is_none() && !signature.is_empty() {
                signature = Signature::empty();
                found = self.match_any(lf, signature, allow_bitmap, want_vertical);
            }
            if found.is_none() && want_vertical {
                want_vertical = false;
                found = self.match_any(lf, signature, allow_bitmap, want_vertical);
            }
        }

        let Some(m) = found else {
            debug!("no face matches {:?}", lf.face_name);
            return Err(NoFontMatch);
        };
        let face = self.reg.face(m.face).ok_or(NoFontMatch)?;

        let info = if signature.is_empty() {
            charset::from_signature(face.signature)
        } else {
            charset::from_signature(signature)
        };
        let (charset, codepage) = match info {
            Some(info) => (info.charset, info.codepage),
            None => (Charset::OEM, self.config.oem_codepage),
        };

        let name_override = if via_fallback {
            None
        } else {
            self.alias_name(m)
        };
        debug!(
            "resolved {:?} to {} (charset {charset:?})",
            lf.face_name, face.full_name
        );
        Ok(Resolved {
            face: m.face,
            signature,
            charset,
            codepage,
            name_override,
        })
    }

    /// The alias family's name, if `m` was found through an alias
    fn alias_name(&self, m: FaceMatch) -> Option<FaceName> {
        let family = self.reg.family(m.family)?;
        family.replacement()?;
        Some(family.name().clone())
    }
}

/// The signature a charset implies; empty for charsets with no table row
pub fn signature_of(charset: Charset) -> Signature {
    charset::from_charset(charset)
        .map(|info| info.signature)
        .unwrap_or_default()
}

/// Signed pixel-height difference between a request and a bitmap face
///
/// A positive request height is a cell height; a negative one is a
/// character height, compared without the face's internal leading.
pub(crate) fn bitmap_height_diff(height: i32, face: &Face) -> i32 {
    let size = face.size;
    if height > 0 {
        height - i32::from(size.height)
    } else {
        height
            .saturating_neg()
            .saturating_sub(i32::from(size.height) - i32::from(size.internal_leading))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::registry::tests::desc;
    use crate::fonts::subst::SubstName;
    use crate::fonts::{FaceDesc, FontWeight, StyleFlags};

    struct Fixture {
        reg: Registry,
        subst: SubstTable,
        links: FontLinks,
        config: Config,
        fallbacks: ExtraFallbacks,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                reg: Registry::new(),
                subst: SubstTable::new(),
                links: FontLinks::new(),
                config: Config::default(),
                fallbacks: ExtraFallbacks::default(),
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

        fn add(&mut self, d: FaceDesc) -> FaceId {
            self.reg.add_face(&d).unwrap()
        }
    }

    fn bitmap(family: &str, height: i16, leading: i16, file: &str) -> FaceDesc {
        let mut d = desc(family, family, StyleFlags::REGULAR, file);
        d.scalable = false;
        d.size.height = height;
        d.size.y_ppem = height - leading;
        d.size.internal_leading = leading;
        d
    }

    #[test]
    fn style_scoring() {
        let mut fx = Fixture::new();
        let regular = fx.add(desc("Sans", "Sans", StyleFlags::REGULAR, "/s/r.ttf"));
        let bold = fx.add(desc("Sans", "Sans Bold", StyleFlags::BOLD, "/s/b.ttf"));
        let italic = fx.add(desc("Sans", "Sans Italic", StyleFlags::ITALIC, "/s/i.ttf"));
        let family = fx.reg.find_family("Sans").unwrap();
        let m = fx.matcher();

        let mut lf = LogFont::new("Sans", 12, Charset::ANSI);
        assert_eq!(m.best_in_family(family, &lf, Signature::empty(), false), Some(regular));
        lf.weight = FontWeight::BOLD;
        assert_eq!(m.best_in_family(family, &lf, Signature::empty(), false), Some(bold));
        lf.italic = true;
        lf.weight = FontWeight::SEMI_BOLD;
        // bold italic missing: of the equal-score faces the last listed wins
        assert_eq!(m.best_in_family(family, &lf, Signature::empty(), false), Some(italic));
        lf.weight = FontWeight::NORMAL;
        assert_eq!(m.best_in_family(family, &lf, Signature::empty(), false), Some(italic));
        // no face covers Cyrillic
        assert_eq!(m.best_in_family(family, &lf, Signature::CYRILLIC, false), None);
    }

    #[test]
    fn bitmap_size_preference() {
        let mut fx = Fixture::new();
        fx.add(bitmap("Fixed", 10, 0, "/b/10.fon"));
        let h13 = fx.add(bitmap("Fixed", 13, 0, "/b/13.fon"));
        let h16 = fx.add(bitmap("Fixed", 16, 2, "/b/16.fon"));
        let family = fx.reg.find_family("Fixed").unwrap();
        let m = fx.matcher();

        let pick = |height| {
            let lf = LogFont::new("Fixed", height, Charset::ANSI);
            m.best_in_family(family, &lf, Signature::empty(), true)
        };
        // closest size not exceeding the request
        assert_eq!(pick(15), Some(h13));
        assert_eq!(pick(13), Some(h13));
        assert_eq!(pick(30), Some(h16));
        // negative heights exclude internal leading: 16 - 2 = 14
        assert_eq!(pick(-14), Some(h16));
        // smaller than every face: the closest larger face
        assert_eq!(pick(8), Some(fx.reg.faces_of(family)[0]));

        let lf = LogFont::new("Fixed", 13, Charset::ANSI);
        assert_eq!(m.best_in_family(family, &lf, Signature::empty(), false), None);
    }

    #[test]
    fn name_matching_order() {
        let mut fx = Fixture::new();
        let tahoma = fx.add(desc("Tahoma", "Tahoma", StyleFlags::REGULAR, "/w/tahoma.ttf"));
        let mut gothic = desc("MS UI Gothic", "MS UI Gothic", StyleFlags::REGULAR, "/w/msgothic.ttc");
        gothic.signature = Signature::JISJAPAN;
        let gothic = fx.add(gothic);
        let dejavu = fx.add(desc("DejaVu Sans", "DejaVu Sans Book", StyleFlags::REGULAR, "/d/dv.ttf"));
        fx.subst.add(SubstName::parse("MS Shell Dlg"), SubstName::parse("Tahoma"));
        fx.links.get_or_create("Tahoma").add_entry(&FaceName::new("MS UI Gothic"), Signature::JISJAPAN);
        let m = fx.matcher();
        let lf = LogFont::new("", 12, Charset::ANSI);

        let found = m.match_by_name("Tahoma", None, &lf, Signature::LATIN1, false).unwrap();
        assert_eq!(found.face, tahoma);
        let found = m
            .match_by_name("MS Shell Dlg", Some("Tahoma"), &lf, Signature::LATIN1, false)
            .unwrap();
        assert_eq!(found.face, tahoma);
        // full face name
        let found = m.match_by_name("dejavu sans book", None, &lf, Signature::empty(), false);
        assert_eq!(found.map(|f| f.face), Some(dejavu));
        // Tahoma is selectable for Japanese through its link
        assert!(m.can_select(fx.reg.face(tahoma).unwrap(), Signature::JISJAPAN, false));
        let found = m.match_by_name("Tahoma", None, &lf, Signature::JISJAPAN, false).unwrap();
        assert_eq!(found.face, tahoma);
        assert!(m.match_by_name("Nothing", None, &lf, Signature::empty(), false).is_none());
        let _ = gothic;
    }

    #[test]
    fn link_fallback_by_name() {
        let mut fx = Fixture::new();
        let mut gothic = desc("MS UI Gothic", "MS UI Gothic", StyleFlags::REGULAR, "/w/msgothic.ttc");
        gothic.signature = Signature::JISJAPAN;
        let gothic = fx.add(gothic);
        fx.links.get_or_create("Segoe UI").add_entry(&FaceName::new("MS UI Gothic"), Signature::JISJAPAN);
        let m = fx.matcher();
        let lf = LogFont::new("Segoe UI", 12, Charset::SHIFTJIS);
        let found = m.match_by_name("Segoe UI", None, &lf, Signature::JISJAPAN, false);
        assert_eq!(found.map(|f| f.face), Some(gothic));
        assert!(m.match_by_name("Segoe UI", None, &lf, Signature::CYRILLIC, false).is_none());
    }

    #[test]
    fn link_entries_match_second_names() {
        let mut fx = Fixture::new();
        let mut gothic = desc("MS Gothic", "MS Gothic", StyleFlags::REGULAR, "/w/msgothic.ttc");
        gothic.second_name = Some("\u{ff2d}\u{ff33} \u{30b4}\u{30b7}\u{30c3}\u{30af}".to_string());
        gothic.signature = Signature::JISJAPAN;
        let gothic = fx.add(gothic);
        let local = FaceName::new("\u{ff2d}\u{ff33} \u{30b4}\u{30b7}\u{30c3}\u{30af}");
        fx.links.get_or_create("Segoe UI").add_entry(&local, Signature::JISJAPAN);
        let m = fx.matcher();
        let lf = LogFont::new("Segoe UI", 12, Charset::SHIFTJIS);
        let found = m.match_by_name("Segoe UI", None, &lf, Signature::JISJAPAN, false).unwrap();
        assert_eq!(found.face, gothic);
        assert_eq!(Some(found.family), fx.reg.find_family("MS Gothic"));
    }

    #[test]
    fn resolve_relaxes_constraints() {
        let mut fx = Fixture::new();
        let liberation = fx.add(desc("Liberation Sans", "Liberation Sans", StyleFlags::REGULAR, "/l/ls.ttf"));
        let mut mono = desc("Liberation Mono", "Liberation Mono", StyleFlags::REGULAR, "/l/lm.ttf");
        mono.signature = Signature::LATIN1 | Signature::CYRILLIC;
        let mono = fx.add(mono);
        let mut symbol = desc("Symbol", "Symbol", StyleFlags::REGULAR, "/s/symbol.ttf");
        symbol.signature = Signature::SYMBOL;
        let symbol = fx.add(symbol);
        fx.reg.add_replacement("Arial", "Liberation Sans");
        let m = fx.matcher();

        // by alias name: the alias name is reported
        let lf = LogFont::new("arial", 12, Charset::ANSI);
        let r = m.resolve(&lf, false).unwrap();
        assert_eq!(r.face, liberation);
        assert_eq!(r.name_override.as_ref().map(|n| n.as_str()), Some("Arial"));
        assert_eq!((r.charset, r.codepage), (Charset::ANSI, 1252));

        // unknown name: generic sans fallback via the alias
        let lf = LogFont::new("Unknown", 12, Charset::DEFAULT);
        let r = m.resolve(&lf, false).unwrap();
        assert_eq!(r.face, liberation);
        assert_eq!(r.signature, Signature::LATIN1);
        assert_eq!(r.name_override, None);

        // fixed pitch
        let mut lf = LogFont::new("", 12, Charset::RUSSIAN);
        lf.pitch_and_family.0 = crate::PitchAndFamily::FIXED_PITCH;
        assert_eq!(m.resolve(&lf, false).unwrap().face, mono);

        // Cyrillic with no fixed request: fallback list misses, scan finds mono
        let lf = LogFont::new("", 12, Charset::RUSSIAN);
        let r = m.resolve(&lf, false).unwrap();
        assert_eq!((r.face, r.charset), (mono, Charset::RUSSIAN));

        // Greek: nothing covers it, signature dropped, charset from the face
        let lf = LogFont::new("", 12, Charset::GREEK);
        let r = m.resolve(&lf, false).unwrap();
        assert_eq!(r.face, liberation);
        assert!(r.signature.is_empty());
        assert_eq!(r.charset, Charset::ANSI);

        // symbol by name
        let lf = LogFont::new("Symbol", 12, Charset::SYMBOL);
        assert_eq!(m.resolve(&lf, false).unwrap().face, symbol);

        // vertical request with no vertical families
        let lf = LogFont::new("@Nothing", 12, Charset::ANSI);
        assert_eq!(m.resolve(&lf, false).unwrap().face, liberation);
    }

    #[test]
    fn empty_registry_fails() {
        let fx = Fixture::new();
        let lf = LogFont::new("Arial", 12, Charset::ANSI);
        assert!(fx.matcher().resolve(&lf, true).is_err());
    }
}
