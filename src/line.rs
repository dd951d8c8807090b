// SPDX-License-Identifier: MIT OR Apache-2.0

use core::ops::Deref;

use crate::{CursorPosition, Edge, Fixed, FontMetrics, Shaper, TextLayout};

/// Geometry of one laid out line
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct ScriptLine {
    /// Offset of the first code unit of the line
    pub from: usize,
    /// Number of code units, not counting trailing whitespace
    pub length: usize,
    /// Number of trailing whitespace code units after `length`
    pub trailing_spaces: usize,
    pub x: Fixed,
    pub y: Fixed,
    /// Width the line was laid out for, [`Fixed::MAX`] when laid out by column count
    pub width: Fixed,
    /// Width covered by text, including ink overhang and optionally trailing spaces
    pub text_width: Fixed,
    /// Distance to where text following the line would start
    pub text_advance: Fixed,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub leading: Fixed,
    pub justified: bool,
    pub has_trailing_spaces: bool,
    pub leading_included: bool,
    pub(crate) filled: bool,
}

impl ScriptLine {
    pub(crate) fn new(from: usize) -> Self {
        Self {
            from,
            ..Self::default()
        }
    }

    /// Offset one past the trailing whitespace of the line
    pub fn end(&self) -> usize {
        self.from + self.length + self.trailing_spaces
    }

    /// Has a width been set for this line
    pub fn is_filled(&self) -> bool {
        self.filled
    }

    /// Ascent plus descent, plus positive leading when included, rounded up to whole units
    pub fn height(&self) -> Fixed {
        let mut height = self.ascent + self.descent;
        if self.leading_included {
            height += self.leading.max(Fixed::ZERO);
        }
        Fixed::from_int(height.ceil())
    }

    pub fn natural_text_width(&self) -> Fixed {
        self.text_width
    }

    pub fn horizontal_advance(&self) -> Fixed {
        self.text_advance
    }

    pub fn text_start(&self) -> usize {
        self.from
    }

    /// Number of code units in the line, trailing whitespace included
    pub fn text_length(&self) -> usize {
        self.length + self.trailing_spaces
    }

    // Merge a run into this line, keeping the largest extents
    pub(crate) fn extend(&mut self, other: &ScriptLine) {
        self.leading = (self.leading + self.ascent).max(other.leading + other.ascent)
            - self.ascent.max(other.ascent);
        self.descent = self.descent.max(other.descent);
        self.ascent = self.ascent.max(other.ascent);
        self.text_width += other.text_width;
        self.length += other.length;
    }

    pub(crate) fn set_default_height(&mut self, metrics: FontMetrics) {
        self.leading = (self.leading + self.ascent).max(metrics.leading + metrics.ascent)
            - self.ascent.max(metrics.ascent);
        self.ascent = self.ascent.max(metrics.ascent);
        self.descent = self.descent.max(metrics.descent);
    }
}

/// A line of a [`TextLayout`] that is being laid out
pub struct TextLine<'a> {
    layout: &'a mut TextLayout,
    index: usize,
}

impl<'a> TextLine<'a> {
    pub(crate) fn new(layout: &'a mut TextLayout, index: usize) -> Self {
        Self { layout, index }
    }

    /// Index of the line in its layout
    pub fn index(&self) -> usize {
        self.index
    }

    /// Fill the line with as much text as fits in `width`.
    ///
    /// When the text cannot be split before the line is full, the line extends to the next break
    /// opportunity.
    pub fn set_line_width(&mut self, shaper: &mut dyn Shaper, width: Fixed) {
        self.layout.set_line_width(self.index, shaper, width);
    }

    /// Fill the line with at most `columns` clusters
    pub fn set_num_columns(&mut self, shaper: &mut dyn Shaper, columns: usize) {
        self.layout
            .set_num_columns(self.index, shaper, columns, Fixed::MAX);
    }

    /// Fill the line with at most `columns` clusters, aligning within `width`
    pub fn set_num_columns_with_width(
        &mut self,
        shaper: &mut dyn Shaper,
        columns: usize,
        width: Fixed,
    ) {
        self.layout.set_num_columns(
            self.index,
            shaper,
            columns,
            width.clamp(Fixed::ZERO, Fixed::MAX),
        );
    }

    /// Move the line, relative to the layout
    pub fn set_position(&mut self, x: Fixed, y: Fixed) {
        if let Some(line) = self.layout.lines.get_mut(self.index) {
            line.x = x;
            line.y = y;
        }
    }

    /// Include positive leading in [`ScriptLine::height`]
    pub fn set_leading_included(&mut self, included: bool) {
        if let Some(line) = self.layout.lines.get_mut(self.index) {
            line.leading_included = included;
        }
    }

    pub fn cursor_to_x(&self, cursor: &mut usize, edge: Edge) -> Fixed {
        self.layout.cursor_to_x(self.index, cursor, edge)
    }

    pub fn x_to_cursor(&self, x: Fixed, position: CursorPosition) -> usize {
        self.layout.x_to_cursor(self.index, x, position)
    }
}

impl Deref for TextLine<'_> {
    type Target = ScriptLine;

    fn deref(&self) -> &ScriptLine {
        &self.layout.lines[self.index]
    }
}

#[cfg(test)]
mod test {
    use super::ScriptLine;
    use crate::{Fixed, FontMetrics};

    #[test]
    fn test_extend_keeps_extents() {
        let mut line = ScriptLine {
            ascent: Fixed::from_int(10),
            descent: Fixed::from_int(2),
            leading: Fixed::from_int(1),
            length: 3,
            text_width: Fixed::from_int(30),
            ..ScriptLine::default()
        };
        let run = ScriptLine {
            ascent: Fixed::from_int(8),
            descent: Fixed::from_int(5),
            leading: Fixed::from_int(4),
            length: 2,
            text_width: Fixed::from_int(20),
            ..ScriptLine::default()
        };
        line.extend(&run);
        assert_eq!(line.ascent, Fixed::from_int(10));
        assert_eq!(line.descent, Fixed::from_int(5));
        assert_eq!(line.leading, Fixed::from_int(2));
        assert_eq!(line.length, 5);
        assert_eq!(line.text_width, Fixed::from_int(50));
    }

    #[test]
    fn test_height() {
        let mut line = ScriptLine::new(0);
        line.set_default_height(FontMetrics::new(
            Fixed::from_f32(11.5),
            Fixed::from_int(4),
            Fixed::from_int(3),
        ));
        assert_eq!(line.height(), Fixed::from_int(16));
        line.leading_included = true;
        assert_eq!(line.height(), Fixed::from_int(19));
        assert_eq!(line.end(), 0);
    }
}
