// SPDX-License-Identifier: MIT OR Apache-2.0

use unicode_bidi::{BidiClass, BidiInfo, Level, ParagraphInfo};

use crate::attrs::Utf16Str;

/// Embedding levels for one paragraph, one entry per UTF-16 code unit
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BidiLevels {
    /// The paragraph embedding level, odd for right-to-left paragraphs
    pub base: Level,
    pub levels: Vec<Level>,
}

/// Supplies the embedding level of every code unit of a paragraph.
///
/// `base` is the requested paragraph level, `None` asks the resolver to derive it from the text.
pub trait BidiResolver {
    fn resolve(&self, text: &[u16], base: Option<Level>) -> BidiLevels;
}

/// The default [`BidiResolver`], running the Unicode bidi algorithm from `unicode-bidi`
#[derive(Clone, Copy, Debug, Default)]
pub struct UnicodeBidi;

impl BidiResolver for UnicodeBidi {
    fn resolve(&self, text: &[u16], base: Option<Level>) -> BidiLevels {
        let fallback = base.unwrap_or_else(Level::ltr);
        if text.is_empty() {
            return BidiLevels {
                base: fallback,
                levels: Vec::new(),
            };
        }

        let decoded = Utf16Str::new(text);
        let info = BidiInfo::new(&decoded.string, base);
        let mut byte_levels = info.levels.clone();
        for para in &info.paragraphs {
            reset_whitespace_levels(&info, para, &mut byte_levels);
        }

        let base = info.paragraphs.first().map_or(fallback, |para| para.level);
        let mut levels = vec![base; text.len()];
        for (byte, unit, c) in decoded.chars() {
            let level = byte_levels.get(byte).copied().unwrap_or(base);
            for slot in levels.iter_mut().skip(unit).take(c.len_utf16()) {
                *slot = level;
            }
        }

        BidiLevels { base, levels }
    }
}

/// A [`BidiResolver`] handing out levels computed elsewhere
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExplicitLevels {
    base: Level,
    levels: Vec<Level>,
}

impl ExplicitLevels {
    pub fn new(base: Level, levels: Vec<Level>) -> Self {
        Self { base, levels }
    }

    /// Build from raw level numbers, clamping anything above the maximum depth
    pub fn from_numbers(base: u8, levels: &[u8]) -> Self {
        let level = |n: u8| Level::new(n.min(Level::max_explicit_depth())).unwrap_or_else(|_| Level::ltr());
        Self {
            base: level(base),
            levels: levels.iter().copied().map(level).collect(),
        }
    }
}

impl BidiResolver for ExplicitLevels {
    fn resolve(&self, text: &[u16], base: Option<Level>) -> BidiLevels {
        // Missing entries take the paragraph level, surplus entries are ignored
        let base = base.unwrap_or(self.base);
        let mut levels = self.levels.clone();
        levels.resize(text.len(), base);
        BidiLevels { base, levels }
    }
}

// Rule L1: trailing whitespace and whitespace before separators goes back to the paragraph level.
// <http://www.unicode.org/reports/tr9/#L1>
fn reset_whitespace_levels(info: &BidiInfo, para: &ParagraphInfo, levels: &mut [Level]) {
    use BidiClass::*;

    let range = para.range.clone();
    let mut reset_from: Option<usize> = Some(range.start);
    for (offset, c) in info.text[range.clone()].char_indices() {
        let i = range.start + offset;
        match info.original_classes[i] {
            // Ignored by X9
            RLE | LRE | RLO | LRO | PDF | BN => {}
            // Segment separator, Paragraph separator
            B | S => {
                let from = reset_from.unwrap_or(i);
                for level in &mut levels[from..i + c.len_utf8()] {
                    *level = para.level;
                }
                reset_from = None;
            }
            // Whitespace, isolate formatting
            WS | FSI | LRI | RLI | PDI => {
                reset_from.get_or_insert(i);
            }
            _ => {
                reset_from = None;
            }
        }
    }
    if let Some(from) = reset_from {
        for level in &mut levels[from..range.end] {
            *level = para.level;
        }
    }
}

/// Visual order of runs with the given levels (rule L2).
///
/// Returns the logical index of the run shown at each visual slot, left to right. From the highest
/// level down to the lowest odd level, every maximal sequence at that level or higher is reversed.
pub fn bidi_reorder(levels: &[Level]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..levels.len()).collect();
    if levels.len() < 2 {
        return order;
    }

    let numbers: Vec<u8> = levels.iter().map(|level| level.number()).collect();
    let mut high = numbers.iter().copied().max().unwrap_or(0);
    let mut low = numbers.iter().copied().min().unwrap_or(0);
    // Reversing is only done down to the lowest odd level
    if low % 2 == 0 {
        low += 1;
    }

    let count = numbers.len() - 1;
    while high >= low {
        let mut i = 0;
        while i < count {
            while i < count && numbers[i] < high {
                i += 1;
            }
            let start = i;
            while i <= count && numbers[i] >= high {
                i += 1;
            }
            order[start..i].reverse();
            i += 1;
        }
        high -= 1;
    }

    order
}
