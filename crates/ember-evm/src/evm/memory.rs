//! # Linear Memory
//!
//! Byte-addressable memory that grows on demand in 32-byte words, with a
//! hard cap and quadratic expansion pricing. The expansion cost for a write
//! is computed and charged before the memory actually grows.

use crate::errors::VmError;

/// Hard cap on memory size (16 MiB).
pub const MAX_MEMORY_SIZE: usize = 16 * 1024 * 1024;

/// Word size in bytes.
pub const WORD_SIZE: usize = 32;

/// Expandable execution memory.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    /// Creates an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self { data: Vec::new() }
    }

    /// Current size in bytes (always a multiple of the word size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when nothing has been allocated yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Current size in 32-byte words.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.data.len() / WORD_SIZE
    }

    /// Gas cost of growing from the current size to cover `size` bytes.
    /// Zero when no growth is needed.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` past the hard cap.
    pub fn expansion_cost(&self, size: usize) -> Result<u64, VmError> {
        if size <= self.data.len() {
            return Ok(0);
        }
        if size > MAX_MEMORY_SIZE {
            return Err(VmError::MemoryLimitExceeded {
                requested: size,
                max: MAX_MEMORY_SIZE,
            });
        }
        let new_words = size.div_ceil(WORD_SIZE);
        Ok(words_gas(new_words) - words_gas(self.word_count()))
    }

    /// Grows memory (zero-filled, word-aligned) to cover `size` bytes.
    ///
    /// # Errors
    ///
    /// `MemoryLimitExceeded` past the hard cap.
    pub fn expand(&mut self, size: usize) -> Result<(), VmError> {
        if size <= self.data.len() {
            return Ok(());
        }
        if size > MAX_MEMORY_SIZE {
            return Err(VmError::MemoryLimitExceeded {
                requested: size,
                max: MAX_MEMORY_SIZE,
            });
        }
        self.data.resize(size.div_ceil(WORD_SIZE) * WORD_SIZE, 0);
        Ok(())
    }

    /// Reads a 32-byte word at `offset`, zero-padded past the allocation.
    #[must_use]
    pub fn read_word(&self, offset: usize) -> [u8; 32] {
        let mut word = [0u8; 32];
        self.read_into(offset, &mut word);
        word
    }

    /// Reads `size` bytes at `offset`, zero-padded past the allocation.
    #[must_use]
    pub fn read_bytes(&self, offset: usize, size: usize) -> Vec<u8> {
        let mut out = vec![0u8; size];
        self.read_into(offset, &mut out);
        out
    }

    fn read_into(&self, offset: usize, out: &mut [u8]) {
        if offset >= self.data.len() {
            return;
        }
        let available = self.data.len() - offset;
        let n = available.min(out.len());
        out[..n].copy_from_slice(&self.data[offset..offset + n]);
    }

    /// Writes a single byte. Callers must have expanded memory first.
    pub fn write_byte(&mut self, offset: usize, value: u8) {
        debug_assert!(offset < self.data.len());
        if let Some(slot) = self.data.get_mut(offset) {
            *slot = value;
        }
    }

    /// Writes a 32-byte word. Callers must have expanded memory first.
    pub fn write_word(&mut self, offset: usize, word: &[u8; 32]) {
        self.write_bytes(offset, word);
    }

    /// Writes a byte slice. Callers must have expanded memory first; writes
    /// past the allocation are truncated.
    pub fn write_bytes(&mut self, offset: usize, bytes: &[u8]) {
        debug_assert!(offset + bytes.len() <= self.data.len() || bytes.is_empty());
        if offset >= self.data.len() {
            return;
        }
        let n = bytes.len().min(self.data.len() - offset);
        self.data[offset..offset + n].copy_from_slice(&bytes[..n]);
    }
}

/// Total gas attributed to a memory of `words` words:
/// `words^2 / 512 + 3 * words`.
#[must_use]
pub fn words_gas(words: usize) -> u64 {
    let words = words as u64;
    words * words / 512 + 3 * words
}

// =============================================================================
// TESTS
// =============================================================================
