//! Free-block bitmap of the data region
//!
//! The map lives in memory, where allocation scans it first-fit, and is
//! mirrored to its fixed disk block whenever the filesystem syncs. Bit `i`
//! tracks data block `PFS_BLKN_FREE + i`; 0 means free, 1 means used.

use alloc::{vec, vec::Vec};

use crate::block::{BlockBuf, BLOCK_SZ};

/// Number of bits in a block
const BLOCK_BITS: usize = BLOCK_SZ * 8;

pub struct Bitmap {
    bits: Vec<u64>,
    len: usize,
}

/// Decompose a bit into (bits64_pos, inner_pos)
fn decomposition(bit: usize) -> (usize, usize) {
    (bit / 64, bit % 64)
}

impl Bitmap {
    /// A map of `len` free entries; at most one block worth of bits
    pub fn new(len: usize) -> Self {
        let len = len.min(BLOCK_BITS);
        Self {
            bits: vec![0u64; (len + 63) / 64],
            len,
        }
    }

    pub fn is_used(&self, bit: usize) -> bool {
        if bit >= self.len {
            return false;
        }
        let (bits64_pos, inner_pos) = decomposition(bit);
        self.bits[bits64_pos] & (1u64 << inner_pos) != 0
    }

    /// Mark `bit` used
    pub fn set(&mut self, bit: usize) {
        if bit < self.len {
            let (bits64_pos, inner_pos) = decomposition(bit);
            self.bits[bits64_pos] |= 1u64 << inner_pos;
        }
    }

    /// Find the first free bit, mark it used and return it
    pub fn alloc(&mut self) -> Option<usize> {
        let bit = self
            .bits
            .iter()
            .enumerate()
            .find(|(_, bits64)| **bits64 != u64::MAX)
            .map(|(bits64_pos, bits64)| bits64_pos * 64 + bits64.trailing_ones() as usize)?;
        // the tail of the last word lies past `len`
        if bit >= self.len {
            return None;
        }
        self.set(bit);
        Some(bit)
    }

    pub fn free_count(&self) -> usize {
        let used: usize = self.bits.iter().map(|w| w.count_ones() as usize).sum();
        self.len - used
    }

    /// Write the map into a block image, little-endian words from offset 0
    pub fn store(&self, block: &mut BlockBuf) {
        block.fill(0);
        let bytes = block.as_bytes_mut();
        for (i, word) in self.bits.iter().enumerate() {
            bytes[i * 8..i * 8 + 8].copy_from_slice(&word.to_le_bytes());
        }
    }

    /// Rebuild a map of `len` entries from a block image
    pub fn load(block: &BlockBuf, len: usize) -> Self {
        let mut bitmap = Self::new(len);
        let bytes = block.as_bytes();
        for (i, word) in bitmap.bits.iter_mut().enumerate() {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(&bytes[i * 8..i * 8 + 8]);
            *word = u64::from_le_bytes(raw);
        }
        bitmap
    }
}
