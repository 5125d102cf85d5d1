// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Family replacement (aliasing)

use super::registry::{FamilyId, Registry};
use super::Signature;
use crate::store::{ConfigStore, REPLACEMENTS_KEY};
use log::{debug, trace};

impl Registry {
    /// Register `new_name` as an alias of the family `target_name`
    ///
    /// Fails if the target does not exist, is itself an alias, or if a
    /// family named `new_name` exists. When the target's first face covers a
    /// double-byte script, the vertical (`@`) forms are aliased too.
    pub fn add_replacement(&mut self, new_name: &str, target_name: &str) -> Option<FamilyId> {
        let Some(target) = self.find_family_any(target_name) else {
            trace!("replacement target {target_name} not found");
            return None;
        };
        if self.family(target)?.replacement().is_some() {
            debug!("{target_name} is itself a replacement, not aliasing {new_name}");
            return None;
        }

        let alias = self.create_family(new_name, None)?;
        self.family_mut(alias)?.replacement = Some(target);
        self.family_mut(target)?.refcount += 1;
        debug!("mapping {new_name} to {target_name}");

        if !target_name.starts_with('@') && self.first_face_is_dbcs(target) {
            let vertical_new = format!("@{new_name}");
            if self.find_family_any(&vertical_new).is_none() {
                self.add_replacement(&vertical_new, &format!("@{target_name}"));
            }
        }
        Some(alias)
    }

    fn first_face_is_dbcs(&self, family: FamilyId) -> bool {
        self.faces_of(family)
            .first()
            .and_then(|&id| self.face(id))
            .map(|face| face.signature().intersects(Signature::DBCS))
            .unwrap_or(false)
    }

    /// Load `Fonts/Replacements`
    ///
    /// Each value names a new family; its data lists one or more targets of
    /// which the first that succeeds is used. Names already registered are
    /// skipped.
    pub fn load_replacements(&mut self, store: &dyn ConfigStore) {
        for (name, value) in store.values(REPLACEMENTS_KEY) {
            if self.find_family_any(&name).is_some() {
                trace!("{name} is available, not replacing");
                continue;
            }
            for target in value.strings() {
                if self.add_replacement(&name, target).is_some() {
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::registry::tests::desc;
    use crate::fonts::StyleFlags;
    use crate::store::{ConfigValue, MemoryStore};

    #[test]
    fn alias_reads_through_target() {
        let mut reg = Registry::new();
        reg.add_face(&desc("Liberation Sans", "Liberation Sans", StyleFlags::REGULAR, "/l/r.ttf"));
        reg.add_face(&desc("Liberation Sans", "Liberation Sans Bold", StyleFlags::BOLD, "/l/b.ttf"));
        let target = reg.find_family("Liberation Sans").unwrap();
        let before = reg.family(target).unwrap().refcount();
        let index_len = reg.full_name_index_len();

        let alias = reg.add_replacement("Arial", "liberation sans").unwrap();
        assert_eq!(reg.faces_of(alias), reg.faces_of(target));
        assert_eq!(reg.family(target).unwrap().refcount(), before + 1);
        assert_eq!(reg.full_name_index_len(), index_len);

        // no chaining, no duplicates, no missing targets
        assert!(reg.add_replacement("Helvetica", "Arial").is_none());
        assert!(reg.add_replacement("Arial", "Liberation Sans").is_none());
        assert!(reg.add_replacement("Foo", "Missing").is_none());
        // non-CJK target: no vertical alias
        assert!(reg.find_family("@Arial").is_none());

        // faces added under the alias name land in the target
        reg.add_face(&desc("Arial", "Liberation Sans Italic", StyleFlags::ITALIC, "/l/i.ttf"));
        assert_eq!(reg.faces_of(target).len(), 3);
        assert!(reg.family(alias).unwrap().faces.is_empty());
    }

    #[test]
    fn vertical_alias_for_dbcs() {
        let mut reg = Registry::new();
        for name in ["Droid Sans Japanese", "@Droid Sans Japanese"] {
            let mut d = desc(name, name, StyleFlags::REGULAR, "/d/dsj.ttf");
            d.signature = Signature::JISJAPAN;
            reg.add_face(&d);
        }
        let store = MemoryStore::new().with_value(
            REPLACEMENTS_KEY,
            "MS Gothic",
            ConfigValue::MultiStr(vec!["Missing".into(), "Droid Sans Japanese".into()]),
        );
        reg.load_replacements(&store);
        let alias = reg.find_family("MS Gothic").unwrap();
        let vertical = reg.find_family("@MS Gothic").unwrap();
        let target = reg.find_family("@Droid Sans Japanese").unwrap();
        assert_eq!(reg.family(alias).unwrap().replacement(), reg.find_family("Droid Sans Japanese"));
        assert_eq!(reg.family(vertical).unwrap().replacement(), Some(target));
    }
}
