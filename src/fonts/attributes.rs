// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Properties for specifying font weight and face style.

use bitflags::bitflags;
use core::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Visual weight class of a font, typically on a scale from 1 to 1000.
///
/// The default value is [`FontWeight::NORMAL`] or `400`. Zero means "don't
/// care" and is treated like normal weight when matching.
///
/// Face matching only distinguishes two classes: weights above
/// [`FontWeight::BOLD_THRESHOLD`] request a bold face.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FontWeight(u16);

impl FontWeight {
    /// Weight value of 0 ("don't care").
    pub const DONT_CARE: Self = Self(0);

    /// Weight value of 100.
    pub const THIN: Self = Self(100);

    /// Weight value of 200.
    pub const EXTRA_LIGHT: Self = Self(200);

    /// Weight value of 300.
    pub const LIGHT: Self = Self(300);

    /// Weight value of 400. This is the default value.
    pub const NORMAL: Self = Self(400);

    /// Weight value of 500.
    pub const MEDIUM: Self = Self(500);

    /// Weight value of 600.
    pub const SEMI_BOLD: Self = Self(600);

    /// Weight value of 700.
    pub const BOLD: Self = Self(700);

    /// Weight value of 800.
    pub const EXTRA_BOLD: Self = Self(800);

    /// Weight value of 900.
    pub const BLACK: Self = Self(900);

    /// Weights strictly above this select bold faces
    pub const BOLD_THRESHOLD: u16 = 550;
}

impl FontWeight {
    /// Creates a new weight attribute with the given value.
    pub fn new(weight: u16) -> Self {
        Self(weight)
    }

    /// Returns the underlying weight value.
    pub fn value(self) -> u16 {
        self.0
    }

    /// True if this weight selects a bold face
    pub fn is_bold(self) -> bool {
        self.0 > Self::BOLD_THRESHOLD
    }

    /// Parses a CSS style font weight attribute.
    ///
    /// # Examples
    ///
    /// ```
    /// # use kas_font_cache::fonts::FontWeight;
    /// assert_eq!(FontWeight::parse("normal"), Some(FontWeight::NORMAL));
    /// assert_eq!(FontWeight::parse("bold"), Some(FontWeight::BOLD));
    /// assert_eq!(FontWeight::parse("850"), Some(FontWeight::new(850)));
    /// assert_eq!(FontWeight::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Some(match s {
            "normal" => Self::NORMAL,
            "bold" => Self::BOLD,
            _ => Self(s.parse::<u16>().ok()?),
        })
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self.0 {
            100 => "thin",
            200 => "extra-light",
            300 => "light",
            400 => "normal",
            500 => "medium",
            600 => "semi-bold",
            700 => "bold",
            800 => "extra-bold",
            900 => "black",
            _ => return write!(f, "{}", self.0),
        };
        write!(f, "{keyword}")
    }
}

bitflags! {
    /// Style classification of a face
    ///
    /// Exactly one of the combinations `REGULAR`, `BOLD`, `ITALIC` or
    /// `BOLD | ITALIC` is expected; anything else sorts last within a family.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct StyleFlags: u32 {
        const ITALIC = 0x0000_0001;
        const BOLD = 0x0000_0020;
        const REGULAR = 0x0000_0040;
    }
}

impl StyleFlags {
    /// Classify from weight and slant
    pub fn from_style(bold: bool, italic: bool) -> Self {
        let mut flags = StyleFlags::empty();
        if bold {
            flags |= StyleFlags::BOLD;
        }
        if italic {
            flags |= StyleFlags::ITALIC;
        }
        if flags.is_empty() {
            flags = StyleFlags::REGULAR;
        }
        flags
    }

    /// Sort order of faces within a family
    ///
    /// Regular < bold < italic < bold-italic < anything unrecognised.
    pub fn order(self) -> u32 {
        let masked = self & (StyleFlags::REGULAR | StyleFlags::BOLD | StyleFlags::ITALIC);
        if masked == StyleFlags::REGULAR {
            0
        } else if masked == StyleFlags::BOLD {
            1
        } else if masked == StyleFlags::ITALIC {
            2
        } else if masked == StyleFlags::BOLD | StyleFlags::ITALIC {
            3
        } else {
            9999
        }
    }

    #[inline]
    pub fn is_bold(self) -> bool {
        self.contains(StyleFlags::BOLD)
    }

    #[inline]
    pub fn is_italic(self) -> bool {
        self.contains(StyleFlags::ITALIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_threshold() {
        assert!(!FontWeight::new(550).is_bold());
        assert!(FontWeight::new(551).is_bold());
        assert!(!FontWeight::DONT_CARE.is_bold());
    }

    #[test]
    fn style_order() {
        assert_eq!(StyleFlags::from_style(false, false).order(), 0);
        assert_eq!(StyleFlags::from_style(true, false).order(), 1);
        assert_eq!(StyleFlags::from_style(false, true).order(), 2);
        assert_eq!(StyleFlags::from_style(true, true).order(), 3);
        assert_eq!(StyleFlags::empty().order(), 9999);
        assert_eq!((StyleFlags::REGULAR | StyleFlags::BOLD).order(), 9999);
    }
}
