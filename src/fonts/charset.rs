// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Charsets, codepages and charset signatures
//!
//! A *charset signature* is a 32-bit mask where each bit stands for one
//! script/codepage coverage range. Bits 9-15 and 22-30 are reserved and never
//! map to a charset.

use bitflags::bitflags;
use std::fmt;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A charset identifier
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Charset(pub u8);

impl Charset {
    pub const ANSI: Charset = Charset(0);
    pub const DEFAULT: Charset = Charset(1);
    pub const SYMBOL: Charset = Charset(2);
    pub const MAC: Charset = Charset(77);
    pub const SHIFTJIS: Charset = Charset(128);
    pub const HANGUL: Charset = Charset(129);
    pub const JOHAB: Charset = Charset(130);
    pub const GB2312: Charset = Charset(134);
    pub const CHINESEBIG5: Charset = Charset(136);
    pub const GREEK: Charset = Charset(161);
    pub const TURKISH: Charset = Charset(162);
    pub const VIETNAMESE: Charset = Charset(163);
    pub const HEBREW: Charset = Charset(177);
    pub const ARABIC: Charset = Charset(178);
    pub const BALTIC: Charset = Charset(186);
    pub const RUSSIAN: Charset = Charset(204);
    pub const THAI: Charset = Charset(222);
    pub const EASTEUROPE: Charset = Charset(238);
    pub const OEM: Charset = Charset(255);

    /// OpenType script tag used to look up vertical substitutions
    pub fn opentype_script(self) -> [u8; 4] {
        match self {
            Charset::CHINESEBIG5 | Charset::GB2312 => *b"hani",
            Charset::GREEK => *b"grek",
            Charset::HANGUL => *b"hang",
            Charset::RUSSIAN => *b"cyrl",
            Charset::SHIFTJIS => *b"kana",
            Charset::ARABIC => *b"arab",
            Charset::HEBREW => *b"hebr",
            Charset::THAI => *b"thai",
            _ => *b"latn",
        }
    }
}

bitflags! {
    /// Charset signature: the codepage ranges covered by a face
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct Signature: u32 {
        const LATIN1 = 0x0000_0001;
        const LATIN2 = 0x0000_0002;
        const CYRILLIC = 0x0000_0004;
        const GREEK = 0x0000_0008;
        const TURKISH = 0x0000_0010;
        const HEBREW = 0x0000_0020;
        const ARABIC = 0x0000_0040;
        const BALTIC = 0x0000_0080;
        const VIETNAMESE = 0x0000_0100;
        const THAI = 0x0001_0000;
        const JISJAPAN = 0x0002_0000;
        const CHINESESIMP = 0x0004_0000;
        const WANSUNG = 0x0008_0000;
        const CHINESETRAD = 0x0010_0000;
        const JOHAB = 0x0020_0000;
        const SYMBOL = 0x8000_0000;

        const _ = !0;
    }
}

impl Signature {
    /// Double-byte (CJK) ranges
    pub const DBCS: Signature = Signature::JISJAPAN
        .union(Signature::CHINESESIMP)
        .union(Signature::WANSUNG)
        .union(Signature::CHINESETRAD)
        .union(Signature::JOHAB);

    /// True if any bit is shared
    #[inline]
    pub fn overlaps(self, other: Signature) -> bool {
        self.intersects(other)
    }
}

/// Script names reported for charset candidates
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Script {
    Western,
    CentralEuropean,
    Cyrillic,
    Greek,
    Turkish,
    Hebrew,
    Arabic,
    Baltic,
    Vietnamese,
    Thai,
    Japanese,
    ChineseSimplified,
    Hangul,
    ChineseTraditional,
    Johab,
    Symbol,
    OemDos,
    Other,
}

impl Script {
    /// Display name
    pub fn name(self) -> &'static str {
        match self {
            Script::Western => "Western",
            Script::CentralEuropean => "Central European",
            Script::Cyrillic => "Cyrillic",
            Script::Greek => "Greek",
            Script::Turkish => "Turkish",
            Script::Hebrew => "Hebrew",
            Script::Arabic => "Arabic",
            Script::Baltic => "Baltic",
            Script::Vietnamese => "Vietnamese",
            Script::Thai => "Thai",
            Script::Japanese => "Japanese",
            Script::ChineseSimplified => "CHINESE_GB2312",
            Script::Hangul => "Hangul",
            Script::ChineseTraditional => "CHINESE_BIG5",
            Script::Johab => "Hangul(Johab)",
            Script::Symbol => "Symbol",
            Script::OemDos => "OEM/DOS",
            Script::Other => "Other",
        }
    }
}

impl fmt::Display for Script {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of the charset table
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CharsetInfo {
    pub charset: Charset,
    pub codepage: u16,
    pub signature: Signature,
}

const RESERVED: (Charset, u16, Option<Script>) = (Charset::DEFAULT, 0, None);

/// Charset table indexed by signature bit
const TABLE: [(Charset, u16, Option<Script>); 32] = [
    (Charset::ANSI, 1252, Some(Script::Western)),
    (Charset::EASTEUROPE, 1250, Some(Script::CentralEuropean)),
    (Charset::RUSSIAN, 1251, Some(Script::Cyrillic)),
    (Charset::GREEK, 1253, Some(Script::Greek)),
    (Charset::TURKISH, 1254, Some(Script::Turkish)),
    (Charset::HEBREW, 1255, Some(Script::Hebrew)),
    (Charset::ARABIC, 1256, Some(Script::Arabic)),
    (Charset::BALTIC, 1257, Some(Script::Baltic)),
    (Charset::VIETNAMESE, 1258, Some(Script::Vietnamese)),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    (Charset::THAI, 874, Some(Script::Thai)),
    (Charset::SHIFTJIS, 932, Some(Script::Japanese)),
    (Charset::GB2312, 936, Some(Script::ChineseSimplified)),
    (Charset::HANGUL, 949, Some(Script::Hangul)),
    (Charset::CHINESEBIG5, 950, Some(Script::ChineseTraditional)),
    (Charset::JOHAB, 1361, Some(Script::Johab)),
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    RESERVED,
    (Charset::SYMBOL, 42, Some(Script::Symbol)),
];

fn row(bit: usize) -> Option<CharsetInfo> {
    let (charset, codepage, script) = TABLE[bit];
    script?;
    Some(CharsetInfo {
        charset,
        codepage,
        signature: Signature::from_bits_retain(1 << bit),
    })
}

fn script_for_bit(bit: usize) -> Script {
    TABLE[bit].2.unwrap_or(Script::Other)
}

/// Translate a charset to its table row
///
/// `DEFAULT`, `OEM` and unknown charsets have no row.
pub fn from_charset(charset: Charset) -> Option<CharsetInfo> {
    (0..32).find(|&bit| TABLE[bit].2.is_some() && TABLE[bit].0 == charset).and_then(row)
}

/// Translate an ANSI codepage to its table row
pub fn from_codepage(codepage: u16) -> Option<CharsetInfo> {
    (0..32).find(|&bit| TABLE[bit].2.is_some() && TABLE[bit].1 == codepage).and_then(row)
}

/// Translate a signature via its lowest set bit
///
/// Fails if that bit is reserved (higher bits are not considered) or if the
/// signature is empty.
pub fn from_signature(signature: Signature) -> Option<CharsetInfo> {
    let bits = signature.bits();
    if bits == 0 {
        return None;
    }
    row(bits.trailing_zeros() as usize)
}

/// True for ANSI codepages of complex (shaped, right-to-left or Thai) scripts
pub fn is_complex_codepage(codepage: u16) -> bool {
    matches!(codepage, 874 | 1255 | 1256)
}

/// True for double-byte ANSI codepages
pub fn is_dbcs_codepage(codepage: u16) -> bool {
    matches!(codepage, 932 | 936 | 949 | 950 | 1361)
}

/// One entry of a charset candidate list
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Candidate {
    pub mask: Signature,
    pub charset: Charset,
    pub script: Script,
}

/// Build the ordered charset candidates for a request
///
/// A charset with a known signature yields that single candidate. Otherwise
/// (`DEFAULT` or unknown) the candidates are: the ANSI codepage's charset
/// (unless it is a complex-script codepage), each remaining valid signature
/// bit in order, and finally a catch-all covering every bit not yet claimed.
/// The masks never overlap.
pub fn candidates(requested: Charset, ansi_codepage: u16) -> Vec<Candidate> {
    if let Some(info) = from_charset(requested) {
        let bit = info.signature.bits().trailing_zeros() as usize;
        return vec![Candidate {
            mask: info.signature,
            charset: info.charset,
            script: script_for_bit(bit),
        }];
    }

    let mut list = Vec::with_capacity(20);
    let mut mask = Signature::empty();

    if !is_complex_codepage(ansi_codepage) {
        if let Some(info) = from_codepage(ansi_codepage) {
            let bit = info.signature.bits().trailing_zeros() as usize;
            list.push(Candidate {
                mask: info.signature,
                charset: info.charset,
                script: script_for_bit(bit),
            });
            mask |= info.signature;
        }
    }

    for bit in 0..32 {
        let Some(info) = row(bit) else {
            continue;
        };
        if mask.intersects(info.signature) {
            continue;
        }
        list.push(Candidate {
            mask: info.signature,
            charset: info.charset,
            script: script_for_bit(bit),
        });
        mask |= info.signature;
    }

    if mask != Signature::all() {
        list.push(Candidate {
            mask: mask.complement(),
            charset: Charset::DEFAULT,
            script: Script::Other,
        });
    }
    list
}
