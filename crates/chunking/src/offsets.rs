//! Conversion between byte offsets (used internally) and character offsets
//! (used in hints, sections and chunk locations).

/// Byte offset of every character boundary of a text.
#[derive(Debug, Clone)]
pub struct CharOffsets {
    boundaries: Vec<usize>,
}

impl CharOffsets {
    pub fn new(text: &str) -> Self {
        let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
        boundaries.push(text.len());
        Self { boundaries }
    }

    /// Character count of the text.
    pub fn char_len(&self) -> usize {
        self.boundaries.len() - 1
    }

    /// Character index at `byte`, rounding down inside a multi-byte character.
    pub fn to_char(&self, byte: usize) -> usize {
        match self.boundaries.binary_search(&byte) {
            Ok(index) => index,
            Err(index) => index.saturating_sub(1),
        }
    }

    /// Byte offset of character `char_pos`, clamped to the text end.
    pub fn to_byte(&self, char_pos: usize) -> usize {
        self.boundaries[char_pos.min(self.char_len())]
    }
}
