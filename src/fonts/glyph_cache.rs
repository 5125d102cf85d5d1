// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Per-font glyph metrics cache

use crate::GlyphId;

/// Entries per block
pub const BLOCK_SIZE: usize = 128;

/// Scaled metrics of one glyph, in pixels
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Horizontal advance
    pub advance: i32,
    /// Left side bearing
    pub left_side_bearing: i32,
    /// Black box origin, relative to the pen position (y up)
    pub origin: (i32, i32),
    /// Black box size
    pub size: (u32, u32),
}

type Block = Box<[Option<GlyphMetrics>; BLOCK_SIZE]>;

/// A two-level sparse array of glyph metrics
///
/// Blocks of [`BLOCK_SIZE`] entries are allocated on first write.
#[derive(Debug, Default)]
pub struct GlyphCache {
    blocks: Vec<Option<Block>>,
}

impl GlyphCache {
    /// Construct empty
    pub fn new() -> Self {
        GlyphCache::default()
    }

    fn split(glyph: GlyphId) -> (usize, usize) {
        let index = usize::from(glyph.0);
        (index / BLOCK_SIZE, index % BLOCK_SIZE)
    }

    /// Cached metrics of `glyph`, if set
    pub fn get(&self, glyph: GlyphId) -> Option<GlyphMetrics> {
        let (block, offset) = Self::split(glyph);
        self.blocks.get(block)?.as_ref()?[offset]
    }

    /// Store metrics of `glyph`
    pub fn set(&mut self, glyph: GlyphId, metrics: GlyphMetrics) {
        let (block, offset) = Self::split(glyph);
        if self.blocks.len() <= block {
            self.blocks.resize_with(block + 1, || None);
        }
        let block = self.blocks[block].get_or_insert_with(|| Box::new([None; BLOCK_SIZE]));
        block[offset] = Some(metrics);
    }

    /// Number of allocated blocks
    pub fn num_blocks(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sparse_blocks() {
        let mut cache = GlyphCache::new();
        let m = GlyphMetrics {
            advance: 7,
            ..Default::default()
        };
        assert!(cache.get(GlyphId(300)).is_none());
        cache.set(GlyphId(300), m);
        assert_eq!(cache.get(GlyphId(300)), Some(m));
        // same block, not initialized
        assert!(cache.get(GlyphId(301)).is_none());
        // earlier block never allocated
        assert!(cache.get(GlyphId(5)).is_none());
        assert_eq!(cache.num_blocks(), 1);

        cache.set(GlyphId(0), m);
        assert_eq!(cache.num_blocks(), 2);
        assert!(cache.get(GlyphId(u16::MAX)).is_none());
    }
}
