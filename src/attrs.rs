// SPDX-License-Identifier: MIT OR Apache-2.0

use bitflags::bitflags;
use unicode_linebreak::BreakOpportunity;
use unicode_segmentation::UnicodeSegmentation;

bitflags! {
    /// Per code unit text attributes consumed by the line breaker and cursor logic.
    ///
    /// Boundary flags describe the position *before* the code unit they are attached to.
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct CharAttributes: u8 {
        /// A grapheme cluster starts here, so a cursor may be placed before this unit
        const GRAPHEME_BOUNDARY = 1 << 0;
        /// A word segment starts or ends here
        const WORD_BOUNDARY = 1 << 1;
        /// A word (alphanumeric segment) starts here
        const WORD_START = 1 << 2;
        /// A word ends just before this unit
        const WORD_END = 1 << 3;
        /// This unit is whitespace
        const WHITESPACE = 1 << 4;
        /// A line may be broken before this unit
        const LINE_BREAK = 1 << 5;
        /// A line must be broken before this unit
        const MANDATORY_BREAK = 1 << 6;
    }
}

impl CharAttributes {
    pub fn grapheme_boundary(&self) -> bool {
        self.contains(Self::GRAPHEME_BOUNDARY)
    }

    pub fn whitespace(&self) -> bool {
        self.contains(Self::WHITESPACE)
    }

    pub fn line_break(&self) -> bool {
        self.contains(Self::LINE_BREAK)
    }

    pub fn word_boundary(&self) -> bool {
        self.contains(Self::WORD_BOUNDARY)
    }
}

/// Supplies [`CharAttributes`] for a paragraph, one entry per UTF-16 code unit.
///
/// Implementations conventionally follow UAX #14 (line breaking) and UAX #29 (segmentation).
pub trait AttributeProvider {
    fn attributes(&self, text: &[u16]) -> Vec<CharAttributes>;
}

/// The default [`AttributeProvider`], backed by `unicode-segmentation` and `unicode-linebreak`
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeAttributes;

impl AttributeProvider for UnicodeAttributes {
    fn attributes(&self, text: &[u16]) -> Vec<CharAttributes> {
        let mut attrs = vec![CharAttributes::empty(); text.len()];
        if text.is_empty() {
            return attrs;
        }

        let decoded = Utf16Str::new(text);
        let line = decoded.string.as_str();

        for (i, c) in line.char_indices() {
            if c.is_whitespace() {
                attrs[decoded.unit_index(i)] |= CharAttributes::WHITESPACE;
            }
        }

        for (i, _egc) in line.grapheme_indices(true) {
            attrs[decoded.unit_index(i)] |= CharAttributes::GRAPHEME_BOUNDARY;
        }

        for (i, word) in line.split_word_bound_indices() {
            let start = decoded.unit_index(i);
            attrs[start] |= CharAttributes::WORD_BOUNDARY;
            if word.chars().next().is_some_and(char::is_alphanumeric) {
                attrs[start] |= CharAttributes::WORD_START;
                let end = i + word.len();
                if end < line.len() {
                    attrs[decoded.unit_index(end)] |= CharAttributes::WORD_END;
                }
            }
        }

        for (i, opportunity) in unicode_linebreak::linebreaks(line) {
            // The final opportunity sits at the end of the text
            if i >= line.len() {
                continue;
            }
            let unit = decoded.unit_index(i);
            attrs[unit] |= CharAttributes::LINE_BREAK;
            if opportunity == BreakOpportunity::Mandatory {
                attrs[unit] |= CharAttributes::MANDATORY_BREAK;
            }
        }

        attrs
    }
}

/// A UTF-8 copy of UTF-16 text that remembers where every char came from
pub(crate) struct Utf16Str {
    pub(crate) string: String,
    // UTF-8 byte offset of each char -> UTF-16 unit offset, sorted by byte offset
    map: Vec<(usize, usize)>,
}

impl Utf16Str {
    pub(crate) fn new(text: &[u16]) -> Self {
        let mut string = String::with_capacity(text.len());
        let mut map = Vec::with_capacity(text.len());
        let mut unit = 0;
        for result in char::decode_utf16(text.iter().copied()) {
            let (c, units) = match result {
                Ok(c) => (c, c.len_utf16()),
                // Lone surrogates keep their own slot
                Err(_) => (char::REPLACEMENT_CHARACTER, 1),
            };
            map.push((string.len(), unit));
            string.push(c);
            unit += units;
        }
        Self { string, map }
    }

    /// UTF-16 unit index of the char starting at `byte`
    pub(crate) fn unit_index(&self, byte: usize) -> usize {
        match self.map.binary_search_by_key(&byte, |&(b, _)| b) {
            Ok(i) => self.map[i].1,
            Err(i) => self.map.get(i).map_or_else(|| self.units(), |&(_, u)| u),
        }
    }

    /// Iterate `(byte offset, unit offset, char)` in order
    pub(crate) fn chars(&self) -> impl Iterator<Item = (usize, usize, char)> + '_ {
        self.map
            .iter()
            .zip(self.string.chars())
            .map(|(&(byte, unit), c)| (byte, unit, c))
    }

    fn units(&self) -> usize {
        self.map
            .last()
            .map_or(0, |&(b, u)| u + self.string[b..].chars().next().map_or(1, char::len_utf16))
    }
}

/// Is this code unit one of the non-breaking spaces that must not be collapsed into a
/// breakable whitespace run
pub(crate) fn is_no_break_space(unit: u16) -> bool {
    matches!(unit, 0x00A0 | 0x2007 | 0x202F | 0xFEFF)
}

#[cfg(test)]
mod test {
    use super::{AttributeProvider, CharAttributes, UnicodeAttributes};

    fn utf16(text: &str) -> Vec<u16> {
        text.encode_utf16().collect()
    }

    #[test]
    fn test_line_break_after_space() {
        let attrs = UnicodeAttributes.attributes(&utf16("ab cd"));
        assert!(attrs[2].whitespace());
        assert!(attrs[3].line_break());
        assert!(!attrs[2].line_break());
        assert!(!attrs[1].line_break());
        assert!(attrs.iter().all(CharAttributes::grapheme_boundary));
        assert!(attrs[0].contains(CharAttributes::WORD_START));
        assert!(attrs[2].contains(CharAttributes::WORD_END));
    }

    #[test]
    fn test_surrogate_pair_is_one_grapheme() {
        let attrs = UnicodeAttributes.attributes(&utf16("a\u{1F980}b"));
        assert_eq!(attrs.len(), 4);
        assert!(attrs[1].grapheme_boundary());
        assert!(!attrs[2].grapheme_boundary());
        assert!(attrs[3].grapheme_boundary());
    }

    #[test]
    fn test_combining_mark() {
        let attrs = UnicodeAttributes.attributes(&utf16("e\u{301}x"));
        assert!(attrs[0].grapheme_boundary());
        assert!(!attrs[1].grapheme_boundary());
        assert!(attrs[2].grapheme_boundary());
    }

    #[test]
    fn test_mandatory_break() {
        let attrs = UnicodeAttributes.attributes(&utf16("a\nb"));
        assert!(attrs[2].contains(CharAttributes::MANDATORY_BREAK));
        assert!(attrs[1].whitespace());
    }

    #[test]
    fn test_soft_hyphen_break() {
        let attrs = UnicodeAttributes.attributes(&utf16("a\u{AD}b"));
        assert!(attrs[2].line_break());
    }

    #[test]
    fn test_lone_surrogate() {
        let attrs = UnicodeAttributes.attributes(&[0x61, 0xD800, 0x62]);
        assert_eq!(attrs.len(), 3);
        assert!(attrs[1].grapheme_boundary());
    }
}
