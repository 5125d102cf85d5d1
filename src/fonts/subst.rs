// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font substitution table

use super::{Charset, FaceName};
use crate::store::{ConfigStore, SUBSTITUTES_KEY};
use log::{debug, trace};

/// A name with an optional charset qualifier
///
/// `charset == None` means "any" on the source side and "unspecified" on the
/// target side.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstName {
    pub name: FaceName,
    pub charset: Option<Charset>,
}

impl SubstName {
    /// Construct
    pub fn new(name: &str, charset: Option<Charset>) -> Self {
        SubstName {
            name: FaceName::new(name),
            charset,
        }
    }

    /// Parse `"Name[,charset]"` where `charset` is a decimal number
    pub fn parse(s: &str) -> Self {
        match s.rsplit_once(',') {
            Some((name, cs)) => {
                let charset = cs.trim().parse::<u8>().ok().map(Charset);
                SubstName::new(name, charset)
            }
            None => SubstName::new(s, None),
        }
    }
}

/// One substitution
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubstEntry {
    pub from: SubstName,
    pub to: SubstName,
}

/// Ordered substitution table; first match wins
#[derive(Clone, Debug, Default)]
pub struct SubstTable {
    entries: Vec<SubstEntry>,
}

impl SubstTable {
    /// Construct an empty table
    pub fn new() -> Self {
        SubstTable::default()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry unless its source (name and charset) is present
    pub fn add(&mut self, from: SubstName, to: SubstName) -> bool {
        if self.entries.iter().any(|e| e.from == from) {
            trace!("substitute for {:?} already present", from);
            return false;
        }
        self.entries.push(SubstEntry { from, to });
        true
    }

    /// Find the substitution for `name` requested in `charset`
    ///
    /// Entries match on name and on either a wildcard source charset or one
    /// equal to `charset`.
    pub fn get(&self, name: &str, charset: Option<Charset>) -> Option<&SubstEntry> {
        let name = FaceName::new(name);
        self.entries.iter().find(|e| {
            e.from.name == name && (e.from.charset.is_none() || e.from.charset == charset)
        })
    }

    /// The substituted name, if any (wildcard entries only)
    pub fn substitute_name(&self, name: &str) -> Option<&FaceName> {
        self.get(name, None).map(|e| &e.to.name)
    }

    /// True if `name` has a wildcard substitution
    pub fn is_substituted(&self, name: &str) -> bool {
        self.get(name, None).is_some()
    }

    /// Load entries from the `Fonts/Substitutes` key
    ///
    /// Mappings between two different charsets and mappings to the default
    /// charset are rejected, except that an explicit ANSI source charset may
    /// map to anything but `DEFAULT`.
    pub fn load(&mut self, store: &dyn ConfigStore) {
        for (name, value) in store.values(SUBSTITUTES_KEY) {
            let Some(data) = value.as_str() else {
                continue;
            };
            let from = SubstName::parse(&name);
            let to = SubstName::parse(data);
            if !is_allowed(&from, &to) {
                debug!("rejecting substitute {name} -> {data}");
                continue;
            }
            self.add(from, to);
        }
    }
}

fn is_allowed(from: &SubstName, to: &SubstName) -> bool {
    let cross = from.charset != Some(Charset::ANSI) && to.charset != from.charset;
    !(cross || to.charset == Some(Charset::DEFAULT))
}
