// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font system configuration

use crate::fonts::charset::{self, Signature};
use crate::store::{ConfigStore, LOCALE_KEY};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Locale-dependent configuration
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// The active narrow ("ANSI") codepage
    ///
    /// This selects the signature preferred when a request names no usable
    /// charset, and whether double-byte fallback cascades are appended.
    pub ansi_codepage: u16,
    /// The OEM codepage
    pub oem_codepage: u16,
}

impl Config {
    /// Construct with the given codepages
    pub fn new(ansi_codepage: u16, oem_codepage: u16) -> Self {
        Config {
            ansi_codepage,
            oem_codepage,
        }
    }

    /// Read configuration from the `Locale` key
    ///
    /// Values `ACP` and `OEMCP` are read as numbers; missing or unparsable
    /// values keep their defaults.
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let mut config = Config::default();
        let read = |name| {
            store
                .get_value(LOCALE_KEY, name)
                .and_then(|v| v.as_u32())
                .and_then(|x| u16::try_from(x).ok())
        };
        if let Some(cp) = read("ACP") {
            config.ansi_codepage = cp;
        }
        if let Some(cp) = read("OEMCP") {
            config.oem_codepage = cp;
        }
        config
    }

    /// Signature implied by the ANSI codepage (empty if unknown)
    pub fn ansi_signature(&self) -> Signature {
        charset::from_codepage(self.ansi_codepage)
            .map(|info| info.signature)
            .unwrap_or_default()
    }

    /// True if the ANSI codepage is a double-byte codepage
    pub fn is_dbcs(&self) -> bool {
        charset::is_dbcs_codepage(self.ansi_codepage)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new(1252, 437)
    }
}
