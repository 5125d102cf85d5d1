// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Common font names
//!
//! Two sets of lists live here: the small built-in fallback lists tried by
//! the matcher for each generic class, and longer preference lists used to
//! pick a default family per class among the fonts available on a system.
//!
//! Font family ordering indicates usage preference.

use crate::backend::FallbackClass;
use crate::PitchAndFamily;

/// Built-in fallbacks for fixed-pitch requests
pub const FIXED_FALLBACKS: [&str; 3] = ["Courier New", "Liberation Mono", "Bitstream Vera Sans Mono"];
/// Built-in fallbacks for serif requests
pub const SERIF_FALLBACKS: [&str; 3] = ["Times New Roman", "Liberation Serif", "Bitstream Vera Serif"];
/// Built-in fallbacks for everything else
pub const SANS_FALLBACKS: [&str; 3] = ["Arial", "Liberation Sans", "Bitstream Vera Sans"];

/// The generic class of a request
///
/// Fixed pitch or the "modern" family selects [`FallbackClass::Fixed`];
/// the "roman" family selects [`FallbackClass::Serif`].
pub fn fallback_class(pitch_and_family: PitchAndFamily) -> FallbackClass {
    if pitch_and_family.is_fixed_pitch() || pitch_and_family.family() == PitchAndFamily::FF_MODERN
    {
        FallbackClass::Fixed
    } else if pitch_and_family.family() == PitchAndFamily::FF_ROMAN {
        FallbackClass::Serif
    } else {
        FallbackClass::Sans
    }
}

/// Built-in fallbacks for a class
pub fn builtin_fallbacks(class: FallbackClass) -> &'static [&'static str] {
    match class {
        FallbackClass::Fixed => &FIXED_FALLBACKS,
        FallbackClass::Serif => &SERIF_FALLBACKS,
        FallbackClass::Sans => &SANS_FALLBACKS,
    }
}

const DEFAULT_SERIF: [&str; 9] = [
    "Palatino Linotype",
    "Georgia",
    "Droid Serif",
    "Times New Roman",
    "Times",
    "DejaVu Serif",
    "Noto Serif",
    "Liberation Serif",
    "Bitstream Vera Serif",
];

const DEFAULT_SANS_SERIF: [&str; 11] = [
    "Tahoma",
    "Noto Sans",
    "DejaVu Sans",
    "Open Sans",
    "Droid Sans",
    "Arial",
    "Verdana",
    "Cantarell",
    "Liberation Sans",
    "Helvetica",
    "Bitstream Vera Sans",
];

const DEFAULT_MONOSPACE: [&str; 10] = [
    "Consolas",
    "Droid Sans Mono",
    "Menlo",
    "Noto Sans Mono",
    "DejaVu Sans Mono",
    "Source Code Pro",
    "Lucida Console",
    "Liberation Mono",
    "Courier New",
    "Bitstream Vera Sans Mono",
];

/// Use this to set default font families after loading fonts
pub fn set_defaults(db: &mut fontdb::Database) {
    // fontdb does not set a default font for each category, so we should do that now.
    macro_rules! set_family {
        ($lt:tt, $FAMILY:ident, $set_fn:ident) => {
            $lt: for name in $FAMILY.iter().cloned() {
                let found = db
                    .faces()
                    .any(|face| face.families.iter().any(|(family, _)| family == name));
                if found {
                    db.$set_fn(name);
                    break $lt;
                }
            }
        }
    }
    set_family!('a, DEFAULT_SERIF, set_serif_family);
    set_family!('b, DEFAULT_SANS_SERIF, set_sans_serif_family);
    set_family!('c, DEFAULT_MONOSPACE, set_monospace_family);
}
