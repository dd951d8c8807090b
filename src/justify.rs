// SPDX-License-Identifier: MIT OR Apache-2.0

use core::ops::Range;

use unicode_script::Script;

use crate::layout::LayoutData;
use crate::{find_item, Align, Fixed, ItemKind, ScriptItem, ScriptLine, TextLayout};

/// Where extra space may go when justifying, in increasing priority
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
enum Opportunity {
    ArabicSpace,
    Character,
    Space,
}

impl Opportunity {
    // Scripts without word spaces stretch between characters first
    fn space_in(script: Script) -> Self {
        match script {
            Script::Arabic | Script::Syriac | Script::Nko | Script::Mandaic | Script::Mongolian => {
                Self::ArabicSpace
            }
            Script::Tibetan | Script::Hiragana | Script::Katakana | Script::Bopomofo | Script::Han => {
                Self::Character
            }
            _ => Self::Space,
        }
    }
}

/// Glyphs of `item` covering the code units `from..to` of the paragraph
pub(crate) fn glyph_range(item: &ScriptItem, from: usize, to: usize) -> Range<usize> {
    let glyphs = &item.glyphs;
    let start = from.saturating_sub(item.position).min(item.len);
    let end = to.saturating_sub(item.position).min(item.len);
    let glyph_start = glyphs.cluster(start);
    let glyph_end = if end == item.len {
        glyphs.len()
    } else {
        glyphs.cluster(end)
    };
    glyph_start..glyph_end.max(glyph_start)
}

impl TextLayout {
    /// Spread the free space of `line` over its justification opportunities.
    ///
    /// The last line of the paragraph and lines ending in a separator are left alone.
    pub(crate) fn justify(&mut self, line: &mut ScriptLine) {
        if self.option.alignment != Some(Align::Justify) || line.width == Fixed::MAX {
            return;
        }

        let end = line.end();
        let data = &self.data;
        if end >= data.string.len() {
            return;
        }
        if let Some(last) = end.checked_sub(1).and_then(|pos| find_item(&data.items, pos)) {
            if data.items[last].kind == ItemKind::LineOrParagraphSeparator {
                return;
            }
        }

        let mut length = line.length;
        while length > 0 && data.attributes[line.from + length - 1].whitespace() {
            length -= 1;
        }
        // No space can go after the last character
        if length <= 1 {
            return;
        }
        let length = length - 1;

        let (Some(first), Some(last)) = (
            find_item(&data.items, line.from),
            find_item(&data.items, line.from + length - 1),
        ) else {
            return;
        };

        let leading = self.leading_space_width(line);

        let LayoutData {
            string,
            attributes,
            items,
            ..
        } = &mut self.data;

        let mut points: Vec<(usize, usize, Opportunity)> = Vec::new();
        for (index, item) in items.iter_mut().enumerate().take(last + 1).skip(first) {
            let range = glyph_range(item, line.from, line.from + length);
            for glyph in &mut item.glyphs.glyphs[range.clone()] {
                glyph.justification_space = Fixed::ZERO;
            }
            if item.kind.is_tab_or_object() {
                continue;
            }

            let space = Opportunity::space_in(item.script);
            let glyphs = &item.glyphs;
            let start = line.from.max(item.position) - item.position;
            let end = (line.from + length).min(item.end()) - item.position;
            let mut pos = start;
            while pos < end {
                let cluster = glyphs.cluster(pos);
                let unit = item.position + pos;
                let c = char::decode_utf16(string[unit..].iter().copied())
                    .next()
                    .and_then(Result::ok);
                let whitespace = attributes[unit].whitespace();
                while pos < item.len && glyphs.cluster(pos) == cluster {
                    pos += 1;
                }

                // The opportunity sits after the last glyph of the cluster
                let mut glyph = cluster + 1;
                while glyph < glyphs.len() && !glyphs.is_cluster_start(glyph) {
                    glyph += 1;
                }
                let glyph = glyph - 1;
                if !range.contains(&glyph) {
                    continue;
                }

                let opportunity = match c {
                    Some(c) if c.is_alphanumeric() => Opportunity::Character,
                    _ if whitespace => space,
                    _ => continue,
                };
                points.push((index, glyph, opportunity));
            }
        }

        let mut need = line.width - line.text_width - leading;
        if need.is_negative() {
            // Already overflowing
            line.justified = true;
            return;
        }

        if need.is_positive() {
            if let Some(kind) = points.iter().map(|&(_, _, kind)| kind).max() {
                let mut count = points.iter().filter(|point| point.2 == kind).count();
                for &(index, glyph, _) in points.iter().filter(|point| point.2 == kind) {
                    let add = need / i32::try_from(count).unwrap_or(i32::MAX);
                    items[index].glyphs.glyphs[glyph].justification_space = add;
                    need -= add;
                    count -= 1;
                }
            }
        }

        line.justified = true;
    }

    /// Remove the justification of `line` from its glyphs
    pub(crate) fn reset_justification(&mut self, line: &ScriptLine) {
        let Some(first) = find_item(&self.data.items, line.from) else {
            return;
        };
        let end = line.end();
        for item in &mut self.data.items[first..] {
            if item.position >= end {
                break;
            }
            let range = glyph_range(item, line.from, end);
            for glyph in &mut item.glyphs.glyphs[range] {
                glyph.justification_space = Fixed::ZERO;
            }
        }
    }

    /// Horizontal offset of the text of `line` from its start for the paragraph alignment
    pub fn align_line(&self, line: &ScriptLine) -> Fixed {
        // Lines laid out by column count are always left aligned
        if line.justified || line.width == Fixed::MAX {
            return Fixed::ZERO;
        }
        let align = match self.option.alignment.unwrap_or(Align::Left) {
            Align::Justify if self.is_right_to_left() => Align::Right,
            align => align,
        };
        match align {
            Align::Right => line.width - line.text_advance,
            Align::Center => (line.width - line.text_advance) / 2,
            Align::Left | Align::Justify => Fixed::ZERO,
        }
    }

    /// Width of trailing spaces drawn at the start of a right to left line
    pub(crate) fn leading_space_width(&self, line: &ScriptLine) -> Fixed {
        if !line.has_trailing_spaces
            || self.option.include_trailing_spaces()
            || !self.is_right_to_left()
        {
            return Fixed::ZERO;
        }
        self.data
            .width(line.from + line.length, line.trailing_spaces, &self.option)
    }
}

#[cfg(test)]
mod test {
    use crate::{Align, Fixed, MonospaceShaper, TextDirection, TextLayout, TextOption};

    fn justified(text: &str, width: i32) -> TextLayout {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new(text)
            .with_text_option(TextOption::new().alignment(Some(Align::Justify)));
        layout.begin_layout();
        while let Some(mut line) = layout.create_line(&mut shaper) {
            line.set_line_width(&mut shaper, Fixed::from_int(width));
        }
        layout.end_layout(&mut shaper);
        layout
    }

    fn spacing(layout: &TextLayout) -> Vec<Fixed> {
        layout.items()[0]
            .glyphs
            .glyphs
            .iter()
            .map(|glyph| glyph.justification_space)
            .collect()
    }

    #[test]
    fn test_spaces_take_the_slack() {
        let layout = justified("a b c d", 55);
        let first = *layout.line_at(0).unwrap();
        assert_eq!(first.length, 5);
        assert!(first.justified);
        let half = Fixed::from_f32(2.5);
        assert_eq!(
            &spacing(&layout)[..5],
            &[Fixed::ZERO, half, Fixed::ZERO, half, Fixed::ZERO]
        );
        assert_eq!(layout.align_line(&first), Fixed::ZERO);
    }

    #[test]
    fn test_last_line_not_justified() {
        let layout = justified("a b c d", 55);
        let last = *layout.line_at(1).unwrap();
        assert!(!last.justified);
        assert_eq!(spacing(&layout)[6], Fixed::ZERO);
    }

    #[test]
    fn test_characters_without_spaces() {
        // One word on a line, stretched between its characters
        let layout = justified("abcd efgh", 70);
        let first = *layout.line_at(0).unwrap();
        assert_eq!(first.length, 4);
        assert_eq!(
            &spacing(&layout)[..4],
            &[
                Fixed::from_int(10),
                Fixed::from_int(10),
                Fixed::from_int(10),
                Fixed::ZERO
            ]
        );
    }

    #[test]
    fn test_relayout_resets_justification() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = justified("a b c d", 55);
        let mut line = layout.line_mut(0).unwrap();
        line.set_line_width(&mut shaper, Fixed::from_int(200));
        assert_eq!(layout.line_at(0).unwrap().length, 7);
        assert!(spacing(&layout).iter().all(|space| *space == Fixed::ZERO));
    }

    #[test]
    fn test_justify_right_to_left_last_line() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("ab").with_text_option(
            TextOption::new()
                .alignment(Some(Align::Justify))
                .direction(TextDirection::RightToLeft),
        );
        layout.begin_layout();
        while let Some(mut line) = layout.create_line(&mut shaper) {
            line.set_line_width(&mut shaper, Fixed::from_int(100));
        }
        layout.end_layout(&mut shaper);
        let line = *layout.line_at(0).unwrap();
        assert_eq!(layout.align_line(&line), Fixed::from_int(80));
    }
}
