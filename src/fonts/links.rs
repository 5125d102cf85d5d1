// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font links: per-font fallback cascades

use super::registry::{FaceId, Registry};
use super::subst::SubstTable;
use super::{FaceName, Signature};
use crate::store::{ConfigStore, SYSTEM_LINK_KEY};
use log::{debug, trace};

/// The dialog font alias whose substitute selects the default cascade
pub const SHELL_DLG: &str = "MS Shell Dlg";
/// The font given a synthetic link mirroring Tahoma's
pub const SYSTEM_FONT: &str = "System";

/// Fonts receiving default CJK cascades
const UI_FONTS: [&str; 3] = ["Lucida Sans Unicode", "Microsoft Sans Serif", "Tahoma"];

/// Default cascades keyed by the substitute of [`SHELL_DLG`]
const DEFAULT_CASCADES: [(&str, [&str; 4]); 5] = [
    ("Tahoma", ["MS UI Gothic", "SimSun", "Gulim", "PMingLiU"]),
    ("MS UI Gothic", ["MS UI Gothic", "PMingLiU", "SimSun", "Gulim"]),
    ("SimSun", ["SimSun", "PMingLiU", "MS UI Gothic", "Batang"]),
    ("Gulim", ["Gulim", "PMingLiU", "MS UI Gothic", "SimSun"]),
    ("PMingLiU", ["PMingLiU", "SimSun", "MS UI Gothic", "Batang"]),
];

/// One fallback family of a link
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkEntry {
    pub family: FaceName,
    pub signature: Signature,
}

/// The fallback cascade of one font name
#[derive(Clone, Debug)]
pub struct FontLink {
    name: FaceName,
    entries: Vec<LinkEntry>,
    combined: Signature,
}

impl FontLink {
    fn new(name: &str) -> Self {
        FontLink {
            name: FaceName::new(name),
            entries: vec![],
            combined: Signature::empty(),
        }
    }

    pub fn name(&self) -> &FaceName {
        &self.name
    }

    /// Fallback families, in order
    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    /// Union of all entry signatures
    pub fn combined_signature(&self) -> Signature {
        self.combined
    }

    /// Append a fallback family (ignored if already listed)
    pub fn add_entry(&mut self, family: &FaceName, signature: Signature) {
        if self.entries.iter().any(|e| e.family == *family) {
            return;
        }
        trace!("font link {}: adding {} ({:?})", self.name, family, signature);
        self.entries.push(LinkEntry {
            family: family.clone(),
            signature,
        });
        self.combined |= signature;
    }
}

/// All font links
#[derive(Clone, Debug, Default)]
pub struct FontLinks {
    links: Vec<FontLink>,
}

impl FontLinks {
    /// Construct empty
    pub fn new() -> Self {
        FontLinks::default()
    }

    /// Find the link of `name`
    pub fn find(&self, name: &str) -> Option<&FontLink> {
        let name = FaceName::new(name);
        self.links.iter().find(|link| link.name == name)
    }

    /// Find or create the link of `name`
    pub fn get_or_create(&mut self, name: &str) -> &mut FontLink {
        let key = FaceName::new(name);
        let index = match self.links.iter().position(|link| link.name == key) {
            Some(i) => i,
            None => {
                self.links.push(FontLink::new(name));
                self.links.len() - 1
            }
        };
        &mut self.links[index]
    }

    /// All links, in creation order
    pub fn iter(&self) -> impl Iterator<Item = &FontLink> {
        self.links.iter()
    }

    /// Load `Fonts/SystemLink` declarations, then the built-in defaults
    pub fn load(&mut self, reg: &mut Registry, subst: &SubstTable, store: &dyn ConfigStore) {
        for (name, value) in store.values(SYSTEM_LINK_KEY) {
            if subst.is_substituted(&name) {
                debug!("{name}: SystemLink entry for substituted font, ignoring");
                continue;
            }
            self.get_or_create(&name);
            for entry in value.strings() {
                let (file, family) = match entry.split_once(',') {
                    Some((file, family)) => (file.trim(), Some(family.trim())),
                    None => (entry.trim(), None),
                };
                let family = family.map(|f| {
                    subst
                        .substitute_name(f)
                        .map(|n| n.as_str().to_string())
                        .unwrap_or_else(|| f.to_string())
                });
                let Some(face) = reg.find_face_from_filename(file, family.as_deref()) else {
                    trace!("{name}: no face for link entry {entry}");
                    continue;
                };
                self.add_face_entry(reg, &name, face);
                reg.release_face(face);
            }
        }

        self.bootstrap(reg, subst);
    }

    /// Seed the default cascades and the synthetic system-font link
    pub fn bootstrap(&mut self, reg: &mut Registry, subst: &SubstTable) {
        let shell_dlg = subst
            .substitute_name(SHELL_DLG)
            .map(|n| n.as_str().to_string())
            .unwrap_or_else(|| SHELL_DLG.to_string());

        for (key, cascade) in DEFAULT_CASCADES.iter() {
            if !FaceName::eq_str(&shell_dlg, key) {
                continue;
            }
            for name in UI_FONTS {
                self.populate(reg, subst, name, cascade);
            }
            if !FaceName::eq_str(&shell_dlg, cascade[0]) {
                self.populate(reg, subst, &shell_dlg, cascade);
            }
        }

        self.get_or_create(SYSTEM_FONT);
        if let Some(face) = reg.find_face_from_filename("tahoma.ttf", Some("Tahoma")) {
            self.add_face_entry(reg, SYSTEM_FONT, face);
            reg.release_face(face);
        }
        let tahoma_entries = self.find("Tahoma").map(|link| link.entries.clone());
        let system = self.get_or_create(SYSTEM_FONT);
        for entry in tahoma_entries.unwrap_or_default() {
            system.add_entry(&entry.family, entry.signature);
        }
    }

    fn populate(&mut self, reg: &mut Registry, subst: &SubstTable, name: &str, values: &[&str]) {
        if subst.is_substituted(name) {
            debug!("{name}: internal SystemLink entry for substituted font, ignoring");
            return;
        }
        self.get_or_create(name);

        for value in values {
            if FaceName::eq_str(name, value) {
                continue;
            }
            let value = subst
                .substitute_name(value)
                .map(|n| n.as_str().to_string())
                .unwrap_or_else(|| value.to_string());
            let Some(family) = reg.find_family(&value) else {
                continue;
            };

            // the first face of the family backed by a file
            let file = reg.faces_of(family).iter().find_map(|&id| {
                let path = reg.face(id)?.source().file()?;
                Some(path.file_name()?.to_string_lossy().into_owned())
            });
            let Some(file) = file else {
                continue;
            };
            let Some(face) = reg.find_face_from_filename(&file, Some(&value)) else {
                continue;
            };
            self.add_face_entry(reg, name, face);
            reg.release_face(face);
        }
    }

    fn add_face_entry(&mut self, reg: &Registry, name: &str, face: FaceId) {
        let Some(face) = reg.face(face) else {
            return;
        };
        let Some(family) = face.family().and_then(|id| reg.family(id)) else {
            return;
        };
        let family = family.name().clone();
        self.get_or_create(name).add_entry(&family, face.signature());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::registry::tests::desc;
    use crate::fonts::subst::SubstName;
    use crate::fonts::StyleFlags;
    use crate::store::{ConfigValue, MemoryStore};

    fn cjk_registry() -> Registry {
        let mut reg = Registry::new();
        for (family, file, sig) in [
            ("Tahoma", "/w/tahoma.ttf", Signature::LATIN1),
            ("MS UI Gothic", "/w/msgothic.ttc", Signature::JISJAPAN),
            ("SimSun", "/w/simsun.ttc", Signature::CHINESESIMP),
            ("PMingLiU", "/w/mingliu.ttc", Signature::CHINESETRAD),
        ] {
            let mut d = desc(family, family, StyleFlags::REGULAR, file);
            d.signature = sig;
            reg.add_face(&d);
        }
        reg
    }

    #[test]
    fn combined_signature() {
        let mut link = FontLink::new("X");
        link.add_entry(&FaceName::new("A"), Signature::LATIN1);
        link.add_entry(&FaceName::new("B"), Signature::GREEK);
        link.add_entry(&FaceName::new("a"), Signature::THAI);
        assert_eq!(link.entries().len(), 2);
        assert_eq!(link.combined_signature(), Signature::LATIN1 | Signature::GREEK);
    }

    #[test]
    fn bootstrap_from_shell_dlg() {
        let mut reg = cjk_registry();
        let mut subst = SubstTable::new();
        subst.add(SubstName::parse(SHELL_DLG), SubstName::parse("Tahoma"));
        let mut links = FontLinks::new();
        links.load(&mut reg, &subst, &MemoryStore::new());

        let tahoma = links.find("tahoma").unwrap();
        let names: Vec<_> = tahoma.entries().iter().map(|e| e.family.as_str()).collect();
        // Gulim is not installed
        assert_eq!(names, ["MS UI Gothic", "SimSun", "PMingLiU"]);
        assert!(tahoma.combined_signature().contains(Signature::JISJAPAN));
        assert!(links.find(SHELL_DLG).is_none());

        let system = links.find(SYSTEM_FONT).unwrap();
        let names: Vec<_> = system.entries().iter().map(|e| e.family.as_str()).collect();
        assert_eq!(names, ["Tahoma", "MS UI Gothic", "SimSun", "PMingLiU"]);

        // counted lookups were released
        let face = reg.find_face_by_full_name("Tahoma").unwrap();
        assert_eq!(reg.face(face).unwrap().refcount(), 1);
    }

    #[test]
    fn system_link_entries() {
        let mut reg = cjk_registry();
        let store = MemoryStore::new().with_value(
            SYSTEM_LINK_KEY,
            "Segoe UI",
            ConfigValue::MultiStr(vec![
                "SIMSUN.TTC,SimSun".into(),
                "missing.ttf".into(),
                "msgothic.ttc".into(),
            ]),
        );
        let mut links = FontLinks::new();
        links.load(&mut reg, &SubstTable::new(), &store);
        let link = links.find("Segoe UI").unwrap();
        let names: Vec<_> = link.entries().iter().map(|e| e.family.as_str()).collect();
        assert_eq!(names, ["SimSun", "MS UI Gothic"]);
        // no MS Shell Dlg substitute: no default cascades
        assert!(links.find("Tahoma").is_none());
    }
}
