use std::ops::Range;

use super::layout::{VertexRecord, WORDS_PER_VERTEX};

/// Growable raw vertex storage addressed in 32-bit words.
///
/// One byte vector backs every field width. Words are written in host byte
/// order through explicit accessors, so a float, a packed color and a pair of
/// shorts can share a record without aliasing typed views.
///
/// Capacity only grows (doubling). Addressing a word past capacity is an
/// invariant violation and panics; callers grow before writing.
#[derive(Debug, Clone)]
pub struct AttributeBuffer {
    bytes: Vec<u8>,
    cursor: usize,
}

impl AttributeBuffer {
    /// Allocates `capacity_words` zeroed words. A zero capacity is bumped to one record.
    pub fn new(capacity_words: usize) -> Self {
        let words = capacity_words.max(WORDS_PER_VERTEX);
        Self {
            bytes: vec![0; words * 4],
            cursor: 0,
        }
    }

    #[inline]
    pub fn capacity_words(&self) -> usize {
        self.bytes.len() / 4
    }

    /// Write cursor, in words.
    #[inline]
    pub fn len_words(&self) -> usize {
        self.cursor
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    #[inline]
    pub fn remaining_words(&self) -> usize {
        self.capacity_words() - self.cursor
    }

    /// Grows storage to hold at least `word_count` words, doubling until it fits.
    ///
    /// Existing content is preserved. Never shrinks.
    pub fn reserve(&mut self, word_count: usize) {
        let mut cap = self.capacity_words();
        if word_count <= cap {
            return;
        }
        while cap < word_count {
            cap *= 2;
        }
        self.bytes.resize(cap * 4, 0);
    }

    /// Doubles capacity. Returns `(old, new)` in words.
    pub fn grow(&mut self) -> (usize, usize) {
        let old = self.capacity_words();
        self.reserve(old * 2);
        (old, self.capacity_words())
    }

    /// Resets the write cursor. Storage is kept.
    #[inline]
    pub fn clear(&mut self) {
        self.cursor = 0;
    }

    /// Moves the write cursor forward by `words`.
    #[inline]
    pub fn advance(&mut self, words: usize) {
        let end = self.cursor + words;
        assert!(
            end <= self.capacity_words(),
            "attribute buffer overrun: cursor {end} past capacity {}",
            self.capacity_words()
        );
        self.cursor = end;
    }

    #[inline]
    pub fn write_u32(&mut self, word: usize, value: u32) {
        let range = self.word_range(word, 1);
        self.bytes[range].copy_from_slice(&value.to_ne_bytes());
    }

    #[inline]
    pub fn write_f32(&mut self, word: usize, value: f32) {
        self.write_u32(word, value.to_bits());
    }

    #[inline]
    pub fn read_u32(&self, word: usize) -> u32 {
        let range = self.word_range(word, 1);
        let mut raw = [0u8; 4];
        raw.copy_from_slice(&self.bytes[range]);
        u32::from_ne_bytes(raw)
    }

    #[inline]
    pub fn read_f32(&self, word: usize) -> f32 {
        f32::from_bits(self.read_u32(word))
    }

    /// Reads a 16-bit value addressed in shorts (two per word).
    #[inline]
    pub fn read_i16(&self, short: usize) -> i16 {
        let range = self.word_range(short / 2, 1);
        let at = range.start + (short % 2) * 2;
        i16::from_ne_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    /// Reads one byte addressed in bytes.
    #[inline]
    pub fn read_u8(&self, byte: usize) -> u8 {
        let range = self.word_range(byte / 4, 1);
        self.bytes[range.start + byte % 4]
    }

    /// Copies `words` words from `src` to `dst` within the buffer.
    pub fn copy_words(&mut self, src: usize, dst: usize, words: usize) {
        let from = self.word_range(src, words);
        let to = self.word_range(dst, words);
        self.bytes.copy_within(from, to.start);
    }

    /// Decodes the record of vertex `index`.
    pub fn record(&self, index: usize) -> VertexRecord {
        let range = self.word_range(index * WORDS_PER_VERTEX, WORDS_PER_VERTEX);
        bytemuck::pod_read_unaligned(&self.bytes[range])
    }

    /// Bytes written so far (up to the cursor).
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.cursor * 4]
    }

    fn word_range(&self, word: usize, words: usize) -> Range<usize> {
        let end = word + words;
        assert!(
            end <= self.capacity_words(),
            "attribute buffer overrun: word {end} past capacity {}",
            self.capacity_words()
        );
        word * 4..end * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserve_doubles_until_it_fits() {
        let mut buf = AttributeBuffer::new(16);
        buf.reserve(40);
        assert_eq!(buf.capacity_words(), 64);
        buf.reserve(10);
        assert_eq!(buf.capacity_words(), 64);
    }

    #[test]
    fn growth_preserves_content() {
        let mut buf = AttributeBuffer::new(16);
        for w in 0..16 {
            buf.write_u32(w, 0xA000 + w as u32);
        }
        buf.advance(16);
        assert_eq!(buf.grow(), (16, 32));
        for w in 0..16 {
            assert_eq!(buf.read_u32(w), 0xA000 + w as u32);
        }
        assert_eq!(buf.len_words(), 16);
    }

    #[test]
    fn clear_keeps_storage() {
        let mut buf = AttributeBuffer::new(32);
        buf.advance(8);
        buf.clear();
        assert!(buf.is_empty());
        assert_eq!(buf.capacity_words(), 32);
    }

    #[test]
    fn mixed_width_views_share_bytes() {
        let mut buf = AttributeBuffer::new(8);
        buf.write_f32(0, 1.5);
        buf.write_u32(7, u32::from_ne_bytes([0x34, 0x12, 0x78, 0x56]));
        assert_eq!(buf.read_f32(0), 1.5);
        assert_eq!(buf.read_i16(14), i16::from_ne_bytes([0x34, 0x12]));
        assert_eq!(buf.read_i16(15), i16::from_ne_bytes([0x78, 0x56]));
        assert_eq!(buf.read_u8(28), 0x34);
        assert_eq!(buf.read_u8(31), 0x56);
    }

    #[test]
    fn copy_words_duplicates_a_record() {
        let mut buf = AttributeBuffer::new(16);
        for w in 0..8 {
            buf.write_u32(w, w as u32 + 1);
        }
        buf.copy_words(0, 8, 8);
        assert_eq!(buf.record(0), buf.record(1));
    }

    #[test]
    #[should_panic(expected = "attribute buffer overrun")]
    fn writing_past_capacity_panics() {
        let mut buf = AttributeBuffer::new(8);
        buf.write_u32(8, 1);
    }
}
