// SPDX-License-Identifier: MIT OR Apache-2.0

use core::fmt;
use std::collections::BTreeMap;

use unicode_bidi::Level;

use crate::{
    find_item, itemize, line_break, AttributeProvider, BidiLevels, BidiResolver, CharAttributes,
    Error, Fixed, GlyphLayout, ItemKind, Rect, ScriptItem, ScriptLine, Shaper, TabKind,
    TextDirection, TextLine, TextOption, UnicodeAttributes, UnicodeBidi,
};

/// Vertical placement of an inline object within its line
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum VerticalAlign {
    /// Sit on the baseline like text
    #[default]
    Baseline,
    Top,
    Middle,
    Bottom,
}

/// Metrics of the object shown for a U+FFFC placeholder
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct InlineObject {
    pub width: Fixed,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub align: VerticalAlign,
}

impl InlineObject {
    pub fn new(width: Fixed, ascent: Fixed, descent: Fixed) -> Self {
        Self {
            width,
            ascent,
            descent,
            align: VerticalAlign::Baseline,
        }
    }

    /// Set [`VerticalAlign`]
    pub fn align(mut self, align: VerticalAlign) -> Self {
        self.align = align;
        self
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum LayoutState {
    Empty,
    InLayout,
    Failed,
}

/// Everything derived from the text of a paragraph for one layout pass
pub(crate) struct LayoutData {
    /// The text with any pre-edit text spliced in
    pub(crate) string: Vec<u16>,
    pub(crate) attributes: Vec<CharAttributes>,
    pub(crate) items: Vec<ScriptItem>,
    pub(crate) base: Level,
    pub(crate) has_bidi: bool,
    /// Inline objects keyed by their offset in `string`
    pub(crate) objects: BTreeMap<usize, InlineObject>,
    pub(crate) current_max_width: Fixed,
    pub(crate) min_width: Fixed,
    pub(crate) max_width: Fixed,
}

impl LayoutData {
    fn new() -> Self {
        Self {
            string: Vec::new(),
            attributes: Vec::new(),
            items: Vec::new(),
            base: Level::ltr(),
            has_bidi: false,
            objects: BTreeMap::new(),
            current_max_width: Fixed::ZERO,
            min_width: Fixed::ZERO,
            max_width: Fixed::ZERO,
        }
    }

    pub(crate) fn is_right_to_left(&self) -> bool {
        self.base.is_rtl()
    }

    /// Whitespace the line breaker may break after, non-breaking spaces excluded
    pub(crate) fn is_breakable_space(&self, position: usize) -> bool {
        self.attributes
            .get(position)
            .is_some_and(CharAttributes::whitespace)
            && self
                .string
                .get(position)
                .is_some_and(|&unit| !crate::attrs::is_no_break_space(unit))
    }

    /// Shape item `index` unless it already has glyphs
    pub(crate) fn shape_item(&mut self, index: usize, shaper: &mut dyn Shaper, option: &TextOption) {
        let Some(item) = self.items.get_mut(index) else {
            return;
        };
        if item.shaped {
            return;
        }

        match item.kind {
            ItemKind::Object => {
                let object = self
                    .objects
                    .get(&item.position)
                    .copied()
                    .unwrap_or_default();
                item.ascent = object.ascent;
                item.descent = object.descent;
                item.leading = Fixed::ZERO;
                item.width = object.width;
                item.glyphs = GlyphLayout::placeholder(object.width);
            }
            ItemKind::Tab => {
                let metrics = shaper.font_metrics();
                item.ascent = metrics.ascent;
                item.descent = metrics.descent;
                item.leading = metrics.leading;
                item.glyphs = GlyphLayout::placeholder(Fixed::ZERO);
            }
            ItemKind::Text | ItemKind::LineOrParagraphSeparator => {
                let text = &self.string[item.position..item.end()];
                if option.show_separators() && text == [0x2028] {
                    // Visible line separator
                    shaper.shape(&[0x21B5], item);
                } else {
                    shaper.shape(text, item);
                }
                item.glyphs.repair(item.len);
                item.width = item.glyphs.width(0..item.glyphs.len());
            }
        }
        item.shaped = true;
    }

    /// Shape the items following tab `index` that explicit tab stops measure
    pub(crate) fn shape_tab_section(
        &mut self,
        index: usize,
        shaper: &mut dyn Shaper,
        option: &TextOption,
    ) {
        if option.tabs.is_empty() {
            return;
        }
        for next in index + 1..self.items.len() {
            self.shape_item(next, shaper, option);
        }
    }

    /// Width of tab `index` when it starts at `x`
    pub(crate) fn tab_width(&self, index: usize, x: Fixed, option: &TextOption) -> Fixed {
        let Some(tab_item) = self.items.get(index) else {
            return Fixed::ZERO;
        };

        let rtl = self.is_right_to_left();
        for stop in &option.tabs {
            if stop.position <= x {
                continue;
            }

            let kind = match stop.kind {
                TabKind::Left if rtl => TabKind::Right,
                TabKind::Right if rtl => TabKind::Left,
                kind => kind,
            };

            let mut section_end = self.string.len();
            match kind {
                TabKind::Right | TabKind::Center => {
                    if let Some(next) = self.items[index + 1..]
                        .iter()
                        .find(|item| item.kind == ItemKind::Tab)
                    {
                        section_end = next.position;
                    }
                }
                TabKind::Delimiter(c) => {
                    let mut buf = [0; 2];
                    let delimiter = c.encode_utf16(&mut buf);
                    section_end = self.string[tab_item.position..]
                        .windows(delimiter.len())
                        .position(|window| window == delimiter)
                        .map_or(tab_item.position, |found| {
                            tab_item.position + found + delimiter.len()
                        });
                }
                TabKind::Left => {}
            }

            if section_end > tab_item.position {
                let mut length = Fixed::ZERO;
                for item in &self.items[index..] {
                    if item.position > section_end || item.position <= tab_item.position {
                        continue;
                    }
                    if item.kind == ItemKind::Object {
                        length += item.width;
                        continue;
                    }
                    let glyphs = &item.glyphs;
                    let end = item.end().min(section_end) - item.position;
                    let glyph_end = if end == item.len {
                        glyphs.len()
                    } else {
                        glyphs.cluster(end)
                    };
                    length += glyphs.printed_width(0..glyph_end);
                    if matches!(kind, TabKind::Delimiter(_))
                        && item.position + end == section_end
                        && end > 0
                    {
                        // The stop aligns on the middle of the delimiter
                        length -= glyphs.printed_advance(glyphs.cluster(end - 1)) / 2;
                    }
                }

                match kind {
                    TabKind::Left => {}
                    TabKind::Right | TabKind::Center | TabKind::Delimiter(_) => {
                        if kind == TabKind::Center {
                            length = length / 2;
                        }
                        let tab = stop.position - length;
                        if tab < x {
                            return Fixed::ZERO;
                        }
                        return tab - x;
                    }
                }
            }
            return stop.position - x;
        }

        let tab = option.effective_tab_stop();
        let stops = i32::try_from(x.ratio(tab)).unwrap_or(i32::MAX).saturating_add(1);
        tab * stops - x
    }

    /// Natural width of `len` code units from `from`, partial clusters counted whole
    pub(crate) fn width(&self, from: usize, len: usize, option: &TextOption) -> Fixed {
        let mut width = Fixed::ZERO;
        if len == 0 {
            return width;
        }
        let to = from + len;
        for (index, item) in self.items.iter().enumerate() {
            if item.position >= to {
                break;
            }
            if item.end() <= from {
                continue;
            }
            match item.kind {
                ItemKind::Object => {
                    width += item.width;
                    continue;
                }
                ItemKind::Tab => {
                    width += self.tab_width(index, width, option);
                    continue;
                }
                ItemKind::Text | ItemKind::LineOrParagraphSeparator => {}
            }

            let glyphs = &item.glyphs;
            if glyphs.is_empty() {
                continue;
            }
            let mut char_from = from.saturating_sub(item.position);
            let glyph_start = glyphs.cluster(char_from);
            if char_from > 0 && glyphs.cluster(char_from - 1) == glyph_start {
                while char_from < item.len && glyphs.cluster(char_from) == glyph_start {
                    char_from += 1;
                }
            }
            if char_from < item.len {
                let glyph_start = glyphs.cluster(char_from);
                let mut char_end = (to - 1 - item.position).min(item.len - 1);
                let cluster = glyphs.cluster(char_end);
                while char_end < item.len && glyphs.cluster(char_end) == cluster {
                    char_end += 1;
                }
                let glyph_end = if char_end == item.len {
                    glyphs.len()
                } else {
                    glyphs.cluster(char_end)
                };
                width += glyphs.printed_width(glyph_start..glyph_end);
            }
        }
        width
    }

    /// Shape every item of `line` and resolve its tab widths from the start of the line
    pub(crate) fn shape_line(&mut self, line: &ScriptLine, shaper: &mut dyn Shaper, option: &TextOption) {
        let Some(first) = find_item(&self.items, line.from) else {
            return;
        };
        let last = line
            .end()
            .checked_sub(1)
            .and_then(|end| find_item(&self.items, end))
            .unwrap_or(first);

        let mut x = Fixed::ZERO;
        for index in first..=last {
            if self.items[index].kind == ItemKind::Tab {
                self.shape_item(index, shaper, option);
                self.shape_tab_section(index, shaper, option);
                let width = self.tab_width(index, x, option);
                self.items[index].width = width;
            } else {
                self.shape_item(index, shaper, option);
            }

            let item = &self.items[index];
            if index == first && item.position != line.from {
                // The line starts inside this item
                let glyphs = &item.glyphs;
                x -= glyphs.width(0..glyphs.cluster(line.from - item.position));
            }
            x += item.width;
        }
    }
}

/// A paragraph of text and its lines.
///
/// Lines are produced in a layout pass: [`TextLayout::begin_layout`], then
/// [`TextLayout::create_line`] and [`TextLine::set_line_width`] (or
/// [`TextLine::set_num_columns`]) for each line until `create_line` returns `None`, then
/// [`TextLayout::end_layout`]. Geometry queries work on the lines of the last pass.
///
/// Offsets are UTF-16 code unit indices into the laid out text, which includes any pre-edit text.
pub struct TextLayout {
    text: Vec<u16>,
    preedit: Option<(usize, Vec<u16>)>,
    pub(crate) option: TextOption,
    attribute_provider: Box<dyn AttributeProvider + Send + Sync>,
    bidi_resolver: Box<dyn BidiResolver + Send + Sync>,
    pub(crate) data: LayoutData,
    pub(crate) lines: Vec<ScriptLine>,
    state: LayoutState,
}

impl fmt::Debug for TextLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextLayout")
            .field("text", &self.text())
            .field("option", &self.option)
            .field("lines", &self.lines)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl TextLayout {
    /// Create a layout for `text` with default [`TextOption`]
    pub fn new(text: &str) -> Self {
        Self::from_utf16(text.encode_utf16().collect())
    }

    /// Create a layout for UTF-16 `text`
    pub fn from_utf16(text: Vec<u16>) -> Self {
        let mut layout = Self {
            text,
            preedit: None,
            option: TextOption::new(),
            attribute_provider: Box::new(UnicodeAttributes),
            bidi_resolver: Box::new(UnicodeBidi),
            data: LayoutData::new(),
            lines: Vec::new(),
            state: LayoutState::Empty,
        };
        layout.rebuild();
        layout
    }

    /// Set [`TextOption`]
    pub fn with_text_option(mut self, option: TextOption) -> Self {
        self.set_text_option(option);
        self
    }

    /// Replace the text, dropping all lines
    pub fn set_text(&mut self, text: &str) {
        self.text = text.encode_utf16().collect();
        self.invalidate();
    }

    /// Replace the text with UTF-16 `text`, dropping all lines
    pub fn set_text_utf16(&mut self, text: Vec<u16>) {
        self.text = text;
        self.invalidate();
    }

    /// The text, without pre-edit text, with lone surrogates replaced
    pub fn text(&self) -> String {
        String::from_utf16_lossy(&self.text)
    }

    /// The text, without pre-edit text
    pub fn text_utf16(&self) -> &[u16] {
        &self.text
    }

    /// The laid out text, pre-edit text included
    pub fn layout_text(&self) -> &[u16] {
        &self.data.string
    }

    pub fn set_text_option(&mut self, option: TextOption) {
        self.option = option;
        self.invalidate();
    }

    pub fn text_option(&self) -> &TextOption {
        &self.option
    }

    /// Set the [`crate::CursorMoveStyle`] without touching the lines
    pub fn set_cursor_move_style(&mut self, style: crate::CursorMoveStyle) {
        self.option.cursor_move_style = style;
    }

    /// Use `provider` for break and boundary attributes
    pub fn set_attribute_provider(&mut self, provider: Box<dyn AttributeProvider + Send + Sync>) {
        self.attribute_provider = provider;
        self.invalidate();
    }

    /// Use `resolver` for bidi embedding levels
    pub fn set_bidi_resolver(&mut self, resolver: Box<dyn BidiResolver + Send + Sync>) {
        self.bidi_resolver = resolver;
        self.invalidate();
    }

    /// Show input method text at `position` of the text; an empty `text` removes it
    pub fn set_preedit_area(&mut self, position: usize, text: &str) {
        if text.is_empty() {
            self.preedit = None;
        } else {
            let position = position.min(self.text.len());
            self.preedit = Some((position, text.encode_utf16().collect()));
        }
        self.invalidate();
    }

    pub fn preedit_area_position(&self) -> Option<usize> {
        self.preedit.as_ref().map(|(position, _)| *position)
    }

    pub fn preedit_area_text(&self) -> String {
        self.preedit
            .as_ref()
            .map(|(_, text)| String::from_utf16_lossy(text))
            .unwrap_or_default()
    }

    /// Give the U+FFFC placeholder at `position` of the laid out text the metrics of `object`
    pub fn set_inline_object(&mut self, position: usize, object: InlineObject) {
        self.data.objects.insert(position, object);
        self.invalidate();
    }

    pub fn inline_object(&self, position: usize) -> Option<&InlineObject> {
        self.data.objects.get(&position)
    }

    /// Is the paragraph laid out right to left
    pub fn is_right_to_left(&self) -> bool {
        match self.option.direction {
            TextDirection::LeftToRight => false,
            TextDirection::RightToLeft => true,
            TextDirection::Auto => self.data.is_right_to_left(),
        }
    }

    /// Script items of the laid out text, in logical order
    pub fn items(&self) -> &[ScriptItem] {
        &self.data.items
    }

    /// Character attributes of the laid out text
    pub fn attributes(&self) -> &[CharAttributes] {
        &self.data.attributes
    }

    /// Start a layout pass, dropping all lines
    pub fn begin_layout(&mut self) {
        if self.state == LayoutState::InLayout {
            log::warn!("begin_layout called while already laying out");
            return;
        }
        self.rebuild();
        self.lines.clear();
        self.state = LayoutState::InLayout;
    }

    /// Finish a layout pass, filling a last line that was never given a width
    pub fn end_layout(&mut self, shaper: &mut dyn Shaper) {
        if self.state == LayoutState::Empty {
            log::warn!("end_layout called without begin_layout");
            return;
        }
        if let Some(last) = self.lines.len().checked_sub(1) {
            if !self.lines[last].filled {
                self.set_num_columns(last, shaper, usize::MAX, Fixed::MAX);
            }
        }
        self.state = LayoutState::Empty;
        log::debug!(
            "laid out {} lines, minimum width {}, maximum width {}",
            self.lines.len(),
            self.data.min_width,
            self.data.max_width
        );
    }

    /// Drop all lines
    pub fn clear_layout(&mut self) {
        self.lines.clear();
    }

    /// Add a line after the last one.
    ///
    /// A previous line that was never given a width is first filled with the rest of the
    /// paragraph. Returns `Ok(None)` when all text is laid out. A text ending in a separator gets
    /// one extra empty line.
    pub fn try_create_line(&mut self, shaper: &mut dyn Shaper) -> Result<Option<TextLine<'_>>, Error> {
        match self.state {
            LayoutState::Empty => {
                log::warn!("create_line called without begin_layout");
                return Err(Error::NotLayingOut);
            }
            LayoutState::Failed => return Err(Error::TextTooLong),
            LayoutState::InLayout => {}
        }

        if let Some(last) = self.lines.len().checked_sub(1) {
            if !self.lines[last].filled {
                self.set_num_columns(last, shaper, usize::MAX, Fixed::MAX);
                if self.data.max_width > Fixed::MAX / 2 {
                    log::warn!("text too long, truncated");
                    self.state = LayoutState::Failed;
                    return Err(Error::TextTooLong);
                }
            }
        }

        let from = self.lines.last().map_or(0, ScriptLine::end);
        if let Some(last) = self.lines.last() {
            if from >= self.data.string.len() {
                let ends_with_separator = self.data.string.last().is_some_and(|&unit| {
                    ItemKind::of(unit) == ItemKind::LineOrParagraphSeparator
                });
                if last.length == 0 || !ends_with_separator {
                    return Ok(None);
                }
            }
        }

        let mut line = ScriptLine::new(from);
        line.set_default_height(shaper.font_metrics());
        let index = self.lines.len();
        self.lines.push(line);
        Ok(Some(TextLine::new(self, index)))
    }

    /// [`TextLayout::try_create_line`], returning `None` on errors
    pub fn create_line(&mut self, shaper: &mut dyn Shaper) -> Option<TextLine<'_>> {
        self.try_create_line(shaper).ok().flatten()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn line_at(&self, index: usize) -> Option<&ScriptLine> {
        self.lines.get(index)
    }

    /// A handle to relayout or move line `index`
    pub fn line_mut(&mut self, index: usize) -> Option<TextLine<'_>> {
        if index < self.lines.len() {
            Some(TextLine::new(self, index))
        } else {
            None
        }
    }

    pub fn lines(&self) -> &[ScriptLine] {
        &self.lines
    }

    /// Index of the line containing `position`, the last line for the end of the text
    pub fn line_for_text_position(&self, position: usize) -> Option<usize> {
        if position == self.data.string.len() && !self.lines.is_empty() {
            return Some(self.lines.len() - 1);
        }
        self.lines.iter().position(|line| line.end() > position)
    }

    /// Width of the widest unbreakable run seen while laying out
    pub fn minimum_width(&self) -> Fixed {
        self.data.min_width
    }

    /// Width the paragraph needs to be laid out without wrapping
    pub fn maximum_width(&self) -> Fixed {
        self.data.max_width
    }

    /// Smallest rectangle containing every line
    pub fn bounding_rect(&self) -> Rect {
        let Some(first) = self.lines.first() else {
            return Rect::default();
        };
        let mut x_min = first.x;
        let mut y_min = first.y;
        let mut x_max = Fixed::ZERO;
        let mut y_max = Fixed::ZERO;
        for line in &self.lines {
            x_min = x_min.min(line.x);
            y_min = y_min.min(line.y);
            let width = if line.width < Fixed::MAX {
                line.width.max(line.text_width)
            } else {
                line.text_width
            };
            x_max = x_max.max(line.x + width);
            y_max = y_max.max(line.y + line.height());
        }
        Rect::new(x_min, y_min, x_max - x_min, y_max - y_min)
    }

    pub fn bounding_height(&self) -> Fixed {
        self.bounding_rect().height
    }

    pub(crate) fn set_line_width(&mut self, index: usize, shaper: &mut dyn Shaper, width: Fixed) {
        let len = self.data.string.len();
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        line.width = width.clamp(Fixed::ZERO, Fixed::MAX);
        if line.filled
            && line.length > 0
            && line.text_width <= line.width
            && line.from + line.length == len
        {
            // Already the last line and it still fits
            return;
        }
        self.layout_line(index, shaper, usize::MAX);
    }

    pub(crate) fn set_num_columns(
        &mut self,
        index: usize,
        shaper: &mut dyn Shaper,
        columns: usize,
        width: Fixed,
    ) {
        let Some(line) = self.lines.get_mut(index) else {
            return;
        };
        line.width = width;
        self.layout_line(index, shaper, columns);
    }

    fn layout_line(&mut self, index: usize, shaper: &mut dyn Shaper, max_glyphs: usize) {
        let mut line = self.lines[index];
        if line.filled {
            self.reset_justification(&line);
        }
        line.ascent = Fixed::ZERO;
        line.descent = Fixed::ZERO;
        line.leading = Fixed::ZERO;

        line_break::fill_line(
            &mut self.data,
            &self.option,
            shaper,
            &mut line,
            max_glyphs,
            self.option.wrap_mode,
        );
        line.filled = true;
        self.data.shape_line(&line, shaper, &self.option);
        self.justify(&mut line);

        log::trace!(
            "line {}: from {} length {} trailing {} width {}",
            index,
            line.from,
            line.length,
            line.trailing_spaces,
            line.text_width
        );
        self.lines[index] = line;
    }

    fn invalidate(&mut self) {
        self.rebuild();
        self.lines.clear();
        if self.state == LayoutState::Failed {
            self.state = LayoutState::Empty;
        }
    }

    fn layout_string(&self) -> Vec<u16> {
        match &self.preedit {
            Some((position, preedit)) => {
                let position = (*position).min(self.text.len());
                let mut string = Vec::with_capacity(self.text.len() + preedit.len());
                string.extend_from_slice(&self.text[..position]);
                string.extend_from_slice(preedit);
                string.extend_from_slice(&self.text[position..]);
                string
            }
            None => self.text.clone(),
        }
    }

    // Recompute attributes, levels and items; all items become unshaped
    fn rebuild(&mut self) {
        let string = self.layout_string();

        let mut attributes = self.attribute_provider.attributes(&string);
        if attributes.len() != string.len() {
            log::warn!(
                "attribute provider returned {} entries for {} code units",
                attributes.len(),
                string.len()
            );
            attributes.resize(string.len(), CharAttributes::GRAPHEME_BOUNDARY);
        }

        let requested = match self.option.direction {
            TextDirection::Auto => None,
            TextDirection::LeftToRight => Some(Level::ltr()),
            TextDirection::RightToLeft => Some(Level::rtl()),
        };
        let BidiLevels { base, mut levels } = self.bidi_resolver.resolve(&string, requested);
        levels.resize(string.len(), base);

        let data = &mut self.data;
        data.has_bidi = base.is_rtl() || levels.iter().any(Level::is_rtl);
        data.items = itemize(&string, &levels, &attributes, base);
        data.base = base;
        data.attributes = attributes;
        data.string = string;
        data.current_max_width = Fixed::ZERO;
        data.min_width = Fixed::ZERO;
        data.max_width = Fixed::ZERO;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Align, MonospaceShaper, Tab, WrapMode};

    fn lay_out(layout: &mut TextLayout, shaper: &mut MonospaceShaper, width: i32) {
        layout.begin_layout();
        let mut y = Fixed::ZERO;
        while let Some(mut line) = layout.create_line(shaper) {
            line.set_line_width(shaper, Fixed::from_int(width));
            line.set_position(Fixed::ZERO, y);
            y += line.height();
        }
        layout.end_layout(shaper);
    }

    #[test]
    fn test_empty_text_has_one_line() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("");
        lay_out(&mut layout, &mut shaper, 100);
        assert_eq!(layout.line_count(), 1);
        let line = layout.line_at(0).unwrap();
        assert_eq!(line.length, 0);
        assert_eq!(line.ascent, Fixed::from_int(12));
        assert_eq!(layout.bounding_height(), Fixed::from_int(16));
    }

    #[test]
    fn test_create_line_outside_layout() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("abc");
        assert_eq!(
            layout.try_create_line(&mut shaper).err(),
            Some(Error::NotLayingOut)
        );
        assert!(layout.create_line(&mut shaper).is_none());
    }

    #[test]
    fn test_unfilled_line_takes_rest() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("one two three");
        layout.begin_layout();
        assert!(layout.create_line(&mut shaper).is_some());
        assert!(layout.create_line(&mut shaper).is_none());
        layout.end_layout(&mut shaper);
        let line = layout.line_at(0).unwrap();
        assert_eq!(line.length, 13);
        assert_eq!(line.width, Fixed::MAX);
        assert_eq!(layout.maximum_width(), Fixed::from_int(130));
    }

    #[test]
    fn test_text_too_long() {
        let mut shaper = MonospaceShaper::new(
            Fixed::from_int(1_000_000),
            crate::FontMetrics::default(),
        );
        let mut layout = TextLayout::new(&"x".repeat(20));
        layout.begin_layout();
        assert!(layout.create_line(&mut shaper).is_some());
        assert_eq!(
            layout.try_create_line(&mut shaper).err(),
            Some(Error::TextTooLong)
        );
        assert_eq!(
            layout.try_create_line(&mut shaper).err(),
            Some(Error::TextTooLong)
        );
        layout.end_layout(&mut shaper);
    }

    #[test]
    fn test_trailing_separator_line() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("ab\n");
        lay_out(&mut layout, &mut shaper, 100);
        assert_eq!(layout.line_count(), 2);
        assert_eq!(layout.line_at(0).unwrap().end(), 3);
        assert_eq!(layout.line_at(1).unwrap().from, 3);
        assert_eq!(layout.line_at(1).unwrap().length, 0);
        assert_eq!(layout.line_for_text_position(3), Some(1));
        assert_eq!(layout.line_for_text_position(1), Some(0));
    }

    #[test]
    fn test_preedit() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("ad");
        layout.set_preedit_area(1, "bc");
        assert_eq!(layout.preedit_area_position(), Some(1));
        assert_eq!(layout.preedit_area_text(), "bc");
        assert_eq!(String::from_utf16_lossy(layout.layout_text()), "abcd");
        assert_eq!(layout.text(), "ad");
        lay_out(&mut layout, &mut shaper, 100);
        assert_eq!(layout.line_at(0).unwrap().length, 4);
        layout.set_preedit_area(0, "");
        assert_eq!(layout.preedit_area_position(), None);
        assert_eq!(layout.line_count(), 0);
    }

    #[test]
    fn test_default_tab_stops() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("ab\tc");
        lay_out(&mut layout, &mut shaper, 1000);
        let line = layout.line_at(0).unwrap();
        assert_eq!(line.length, 4);
        // "ab" then a tab to 80 then "c"
        assert_eq!(line.text_width, Fixed::from_int(90));
        assert_eq!(layout.items()[1].width, Fixed::from_int(60));
    }

    #[test]
    fn test_right_tab() {
        let mut shaper = MonospaceShaper::default();
        let option = TextOption::new().tabs(vec![Tab::new(Fixed::from_int(100), TabKind::Right)]);
        let mut layout = TextLayout::new("a\tbcd").with_text_option(option);
        lay_out(&mut layout, &mut shaper, 1000);
        // "bcd" ends at the stop
        assert_eq!(layout.items()[1].width, Fixed::from_int(60));
        assert_eq!(layout.line_at(0).unwrap().text_width, Fixed::from_int(100));
    }

    #[test]
    fn test_delimiter_tab() {
        let mut shaper = MonospaceShaper::default();
        let option = TextOption::new()
            .tabs(vec![Tab::new(Fixed::from_int(100), TabKind::Delimiter('.'))]);
        let mut layout = TextLayout::new("\t12.5").with_text_option(option);
        lay_out(&mut layout, &mut shaper, 1000);
        // "12" and half of "." before the stop
        assert_eq!(layout.items()[0].width, Fixed::from_int(75));
    }

    #[test]
    fn test_tabs_without_alignment_break_like_spaces() {
        let mut shaper = MonospaceShaper::default();
        let option = TextOption::new().alignment(None).wrap_mode(WrapMode::WordWrap);
        let mut layout = TextLayout::new("ab\tcd").with_text_option(option);
        lay_out(&mut layout, &mut shaper, 30);
        assert_eq!(layout.line_count(), 2);
        let first = layout.line_at(0).unwrap();
        assert_eq!(first.length, 2);
        assert_eq!(first.trailing_spaces, 1);
    }

    #[test]
    fn test_inline_object() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("a\u{FFFC}b");
        layout.set_inline_object(
            1,
            InlineObject::new(Fixed::from_int(25), Fixed::from_int(30), Fixed::from_int(10)),
        );
        lay_out(&mut layout, &mut shaper, 1000);
        let line = layout.line_at(0).unwrap();
        assert_eq!(line.text_width, Fixed::from_int(45));
        assert_eq!(line.ascent, Fixed::from_int(30));
        assert_eq!(line.descent, Fixed::from_int(10));
    }

    #[test]
    fn test_top_aligned_object_grows_line() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("a\u{FFFC}");
        layout.set_inline_object(
            1,
            InlineObject::new(Fixed::from_int(10), Fixed::from_int(36), Fixed::from_int(4))
                .align(VerticalAlign::Top),
        );
        lay_out(&mut layout, &mut shaper, 1000);
        let line = layout.line_at(0).unwrap();
        // 40 high object in a 16 high line
        assert_eq!(line.ascent + line.descent, Fixed::from_int(40));
        assert_eq!(line.ascent, Fixed::from_int(24));
        let object = &layout.items()[1];
        assert_eq!(object.ascent, line.ascent);
    }

    #[test]
    fn test_alignment_offsets() {
        let mut shaper = MonospaceShaper::default();
        for (align, offset) in [(Align::Left, 0), (Align::Right, 60), (Align::Center, 30)] {
            let mut layout =
                TextLayout::new("abcd").with_text_option(TextOption::new().alignment(Some(align)));
            lay_out(&mut layout, &mut shaper, 100);
            let line = *layout.line_at(0).unwrap();
            assert_eq!(layout.align_line(&line), Fixed::from_int(offset));
        }
    }

    #[test]
    fn test_set_text_drops_lines() {
        let mut shaper = MonospaceShaper::default();
        let mut layout = TextLayout::new("abc");
        lay_out(&mut layout, &mut shaper, 100);
        assert_eq!(layout.line_count(), 1);
        layout.set_text("de");
        assert_eq!(layout.line_count(), 0);
        assert_eq!(layout.text(), "de");
        assert_eq!(layout.items().len(), 1);
    }
}
