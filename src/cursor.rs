// SPDX-License-Identifier: MIT OR Apache-2.0

use unicode_bidi::Level;
use unicode_script::Script;

use crate::{
    bidi_reorder, find_item, CursorMoveStyle, Fixed, ScriptItem, TextLayout, WrapMode,
};

/// Which side of a cluster a cursor position maps to
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Edge {
    /// The edge where the cluster starts in its direction
    #[default]
    Leading,
    /// The edge where the next cluster starts
    Trailing,
}

/// How [`TextLayout::x_to_cursor`] resolves a point inside a cluster
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CursorPosition {
    /// The closest boundary between clusters
    #[default]
    BetweenCharacters,
    /// The cluster under the point
    OnCharacter,
}

/// Step size of [`TextLayout::next_cursor_position`] and
/// [`TextLayout::previous_cursor_position`]
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CursorMode {
    #[default]
    SkipCharacters,
    SkipWords,
}

// Scripts whose multi-character clusters are split evenly for hit testing
fn splits_ligatures(script: Script) -> bool {
    matches!(
        script,
        Script::Common
            | Script::Greek
            | Script::Latin
            | Script::Hiragana
            | Script::Katakana
            | Script::Bopomofo
            | Script::Han
    )
}

fn is_word_separator(unit: u16) -> bool {
    matches!(
        char::from_u32(unit.into()),
        Some(
            '.' | ',' | '?' | '!' | '@' | '#' | '$' | ':' | ';' | '-' | '<' | '>' | '[' | ']' | '('
                | ')' | '{' | '}' | '=' | '/' | '+' | '%' | '&' | '^' | '*' | '\'' | '"' | '`'
                | '~' | '|' | '\\'
        )
    )
}

/// Distance from the start of cluster `glyph` to character `position` of `item` when the
/// character is inside the cluster, shared out evenly over the characters of the cluster
pub(crate) fn offset_in_ligature(
    item: &ScriptItem,
    position: usize,
    max: usize,
    glyph: usize,
) -> Fixed {
    let clusters = &item.glyphs.log_clusters;
    let offset = clusters[..position.min(clusters.len())]
        .iter()
        .rev()
        .take_while(|&&cluster| cluster == glyph)
        .count();
    if offset == 0 {
        return Fixed::ZERO;
    }

    let start = position - offset;
    let length = clusters[start..max.clamp(start, clusters.len())]
        .iter()
        .take_while(|&&cluster| cluster == glyph)
        .count();
    if length == 0 {
        return Fixed::ZERO;
    }
    item.glyphs
        .advance(glyph)
        .mul_div(offset as i64, length as i64)
}

impl TextLayout {
    fn visual_movement(&self) -> bool {
        self.option.cursor_move_style == CursorMoveStyle::Visual
    }

    /// First item covering `from..end` and the visual order of the covering items, relative to it
    pub(crate) fn visual_items(&self, from: usize, end: usize) -> (usize, Vec<usize>) {
        let items = &self.data.items;
        let last = end
            .checked_sub(1)
            .filter(|&last| last >= from)
            .and_then(|last| find_item(items, last));
        let (Some(first), Some(last)) = (find_item(items, from), last) else {
            return (0, Vec::new());
        };
        let levels: Vec<Level> = items[first..=last].iter().map(|item| item.level).collect();
        (first, bidi_reorder(&levels))
    }

    /// X position of `cursor` on line `line_index`.
    ///
    /// The cursor is moved into the line and onto a grapheme boundary first.
    pub fn cursor_to_x(&self, line_index: usize, cursor: &mut usize, edge: Edge) -> Fixed {
        let Some(line) = self.lines.get(line_index) else {
            return Fixed::ZERO;
        };
        let last_line = line_index + 1 >= self.lines.len();
        let mut x = line.x + self.align_line(line) - self.leading_space_width(line);

        let data = &self.data;
        let line_end = line.end();
        if data.items.is_empty() || line_end == line.from {
            *cursor = line.from;
            return x;
        }

        let mut pos = (*cursor).clamp(line.from, line_end);
        while pos < line_end && !data.attributes[pos].grapheme_boundary() {
            pos += 1;
        }
        // At the end of the line use the last item on it
        let lookup = if pos == line_end { pos - 1 } else { pos };
        let Some(mut index) = find_item(&data.items, lookup) else {
            *cursor = line.from;
            return x;
        };

        let rtl = self.is_right_to_left();
        let visual = self.visual_movement();
        if data.items[index].is_rtl() != rtl && !visual {
            // Between two runs of different direction, prefer the run in the paragraph direction
            let item = &data.items[index];
            let neighbor = if index > 0 && item.position == pos {
                index - 1
            } else if index + 1 < data.items.len() && item.end() == pos {
                index + 1
            } else {
                index
            };
            if neighbor != index && item.level != data.items[neighbor].level {
                index = neighbor;
            }
        }

        let item = &data.items[index];
        let glyphs = &item.glyphs;
        let length = item.len;
        let offset = pos.saturating_sub(item.position).min(length);

        let mut glyph_pos = if offset == length {
            glyphs.len()
        } else {
            glyphs.cluster(offset)
        };
        if edge == Edge::Trailing && glyph_pos < glyphs.len() {
            // The trailing edge is the leading edge of the next cluster
            glyph_pos += 1;
            while glyph_pos < glyphs.len() && !glyphs.is_cluster_start(glyph_pos) {
                glyph_pos += 1;
            }
        }
        let reverse = item.is_rtl();

        let (first, order) = self.visual_items(line.from, line_end);
        for &visual_index in &order {
            let other_index = first + visual_index;
            if other_index == index {
                break;
            }
            let other = &data.items[other_index];
            if other.kind.is_tab_or_object() {
                x += other.width;
                continue;
            }
            let start = line.from.max(other.position);
            let end = line_end.min(other.end());
            let other_glyphs = &other.glyphs;
            let glyph_start = other_glyphs.cluster(start - other.position);
            let glyph_end = if end == other.end() {
                other_glyphs.len()
            } else {
                other_glyphs.cluster(end - other.position - 1) + 1
            };
            x += other_glyphs.width(glyph_start..glyph_end);
        }

        if item.kind.is_tab_or_object() {
            if offset == if reverse { 0 } else { length } {
                x += item.width;
            }
        } else {
            let end = line_end.min(item.end()).saturating_sub(item.position);
            if reverse {
                let glyph_end = if end == length {
                    glyphs.len()
                } else {
                    glyphs.cluster(end)
                };
                let mut glyph_start = glyph_pos;
                let visually_last = order.last().is_some_and(|&v| first + v == index);
                if visual && !rtl && !(last_line && visually_last) {
                    glyph_start += 1;
                }
                x += glyphs.width(glyph_start..glyph_end);
                x -= offset_in_ligature(item, offset, end, glyph_pos);
            } else {
                let start = line.from.saturating_sub(item.position);
                let glyph_start = glyphs.cluster(start);
                let visually_first = order.first().is_some_and(|&v| first + v == index);
                let glyph_end = if !visual || !rtl || (last_line && visually_first) {
                    glyph_pos
                } else {
                    glyph_pos + 1
                };
                x += glyphs.width(glyph_start..glyph_end);
                x += offset_in_ligature(item, offset, end, glyph_pos);
            }
        }

        if self.option.wrap_mode != WrapMode::NoWrap {
            x = x.min(line.x + line.width).max(Fixed::ZERO);
        }

        *cursor = item.position + offset;
        x
    }

    /// Cursor position on line `line_index` closest to `x`
    pub fn x_to_cursor(&self, line_index: usize, x: Fixed, position: CursorPosition) -> usize {
        let Some(line) = self.lines.get(line_index) else {
            return 0;
        };
        let last_line = line_index + 1 >= self.lines.len();
        let line_length = line.text_length();
        if line_length == 0 {
            return line.from;
        }

        let (first, order) = self.visual_items(line.from, line.from + line_length);
        if order.is_empty() {
            return 0;
        }

        let x = x - line.x - self.align_line(line);
        let visual = self.visual_movement();
        let rtl = self.is_right_to_left();
        let on_character = position == CursorPosition::OnCharacter;

        if x <= Fixed::ZERO {
            // Left of the first item
            return if rtl {
                line.from + line_length
            } else {
                line.from
            };
        }

        if x < line.text_width || (line.justified && x < line.width) {
            let insertion_points = if visual && rtl {
                self.insertion_points_for_line(line_index)
            } else {
                Vec::new()
            };

            let mut pos = Fixed::ZERO;
            let mut chars = 0;
            for (i, &visual_index) in order.iter().enumerate() {
                let item = &self.data.items[first + visual_index];
                let glyphs = &item.glyphs;
                let start = line.from.saturating_sub(item.position);
                let end = (line.from + line_length - item.position).min(item.len);

                let glyph_end = if end == item.len {
                    glyphs.len()
                } else {
                    glyphs.cluster(end)
                };
                let mut gs = glyphs.cluster(start) as isize;
                let mut ge = glyph_end as isize - 1;
                let advance = |glyph: isize| glyphs.effective_advance(glyph as usize);
                let cluster_start = |glyph: isize| glyphs.is_cluster_start(glyph as usize);

                let item_width = if item.kind.is_tab_or_object() {
                    item.width
                } else {
                    glyphs.width(gs as usize..(ge + 1).max(gs) as usize)
                };

                if pos + item_width < x {
                    pos += item_width;
                    chars += end;
                    continue;
                }

                if item.kind.is_tab_or_object() {
                    if on_character {
                        return item.position;
                    }
                    let left_half = x - pos < item_width / 2;
                    if item.is_rtl() != left_half {
                        return item.position;
                    }
                    return item.position + 1;
                }

                let mut glyph_pos: Option<usize> = None;
                let mut edge = Fixed::ZERO;
                if on_character {
                    glyph_pos = Some(gs as usize);
                    if item.is_rtl() {
                        pos += item_width;
                        while gs <= ge {
                            if cluster_start(gs) {
                                if pos < x {
                                    break;
                                }
                                glyph_pos = Some(gs as usize);
                                edge = pos;
                            }
                            pos -= advance(gs);
                            gs += 1;
                        }
                    } else {
                        while gs <= ge {
                            if cluster_start(gs) {
                                if pos > x {
                                    break;
                                }
                                glyph_pos = Some(gs as usize);
                                edge = pos;
                            }
                            pos += advance(gs);
                            gs += 1;
                        }
                    }
                } else {
                    let mut dist = Fixed::from_int(i32::MAX / 256);
                    if item.is_rtl() {
                        if !visual || rtl || (last_line && i == order.len() - 1) {
                            pos += item_width;
                            while gs <= ge {
                                if cluster_start(gs) && (x - pos).abs() < dist {
                                    glyph_pos = Some(gs as usize);
                                    edge = pos;
                                    dist = (x - pos).abs();
                                }
                                pos -= advance(gs);
                                gs += 1;
                            }
                        } else {
                            while ge >= gs {
                                if cluster_start(ge) && (x - pos).abs() < dist {
                                    glyph_pos = Some(ge as usize);
                                    edge = pos;
                                    dist = (x - pos).abs();
                                }
                                pos += advance(ge);
                                ge -= 1;
                            }
                        }
                    } else if !visual || !rtl || (last_line && i == 0) {
                        while gs <= ge {
                            if cluster_start(gs) && (x - pos).abs() < dist {
                                glyph_pos = Some(gs as usize);
                                edge = pos;
                                dist = (x - pos).abs();
                            }
                            pos += advance(gs);
                            gs += 1;
                        }
                    } else {
                        let start_pos = pos;
                        while gs <= ge {
                            pos += advance(gs);
                            if cluster_start(gs) && (x - pos).abs() < dist {
                                glyph_pos = Some(gs as usize);
                                edge = pos;
                                dist = (x - pos).abs();
                            }
                            gs += 1;
                        }
                        pos = start_pos;
                    }

                    // The far edge of the item is closer than any cluster start
                    if (x - pos).abs() < dist {
                        if visual {
                            if !rtl && i + 1 < order.len() {
                                chars += end;
                                continue;
                            }
                            if rtl && chars > 0 {
                                let slot = if last_line { chars } else { chars - 1 };
                                if let Some(&point) = insertion_points.get(slot) {
                                    return point;
                                }
                            }
                        }
                        return self.position_in_ligature(item, end, x, pos, None, on_character);
                    }
                }
                return self.position_in_ligature(item, end, x, edge, glyph_pos, on_character);
            }
        }

        // Right of the last item
        let mut pos = line.from;
        if !rtl {
            pos += line_length;
        }
        // Stay before the space that ends a wrapped line
        if !last_line {
            pos = self.previous_logical_position(pos).min(pos);
        }
        pos
    }

    fn position_in_ligature(
        &self,
        item: &ScriptItem,
        end: usize,
        x: Fixed,
        edge: Fixed,
        glyph_pos: Option<usize>,
        on_character: bool,
    ) -> usize {
        let clusters = &item.glyphs.log_clusters;
        let end = end.min(clusters.len());

        if !splits_ligatures(item.script) {
            return match glyph_pos {
                None => item.position + end,
                Some(glyph) => {
                    item.position
                        + clusters[..end]
                            .iter()
                            .position(|&cluster| cluster == glyph)
                            .unwrap_or(end)
                }
            };
        }

        let glyph = match glyph_pos {
            None if end > 0 => Some(clusters[end - 1]),
            None => None,
            Some(glyph) if x <= edge => glyph.checked_sub(1),
            Some(glyph) => Some(glyph),
        };
        let Some(glyph) = glyph else {
            return item.position + end;
        };

        let attributes = &self.data.attributes[item.position..];
        let mut cluster_start = None;
        let mut cluster_length = 0;
        for i in 0..end {
            if clusters[i] == glyph && attributes[i].grapheme_boundary() {
                cluster_start.get_or_insert(i);
                cluster_length += 1;
            } else if cluster_length > 0 {
                break;
            }
        }

        let Some(cluster_start) = cluster_start else {
            return item.position + end;
        };
        let glyph_width = item.glyphs.effective_advance(glyph);
        // Approximate width of each character of the ligature
        let per_char = glyph_width / cluster_length;
        if !per_char.is_positive() {
            return item.position + cluster_start;
        }
        let left = if x > edge { edge } else { edge - glyph_width };
        let n = ((x - left) / per_char).floor().max(0);
        let dist = x - left - per_char * n;
        let mut closest = if dist > per_char / 2 { n + 1 } else { n };
        if on_character && closest > 0 {
            closest -= 1;
        }
        let mut pos = cluster_start + closest as usize;
        while pos < end && !attributes[pos].grapheme_boundary() {
            pos += 1;
        }
        item.position + pos
    }

    /// Cursor positions of line `line_index` in visual order, left to right
    pub fn insertion_points_for_line(&self, line_index: usize) -> Vec<usize> {
        let Some(line) = self.lines.get(line_index) else {
            return Vec::new();
        };
        let last_line = line_index + 1 >= self.lines.len();
        let line_end = line.from + line.length;
        let (first, order) = self.visual_items(line.from, line_end);
        let last_item = first + order.len().saturating_sub(1);

        let mut points = Vec::with_capacity(line.length + 1);
        for &visual_index in &order {
            let index = first + visual_index;
            let item = &self.data.items[index];
            let start = line.from.max(item.position);
            let mut end = line_end.min(item.end());
            if last_line && index == last_item {
                // The end of the paragraph
                end += 1;
            }
            if item.is_rtl() {
                points.extend((start..end).rev());
            } else {
                points.extend(start..end);
            }
        }
        points
    }

    /// Logical position of the visual end of line `line_index`
    pub fn end_of_line(&self, line_index: usize) -> usize {
        self.insertion_points_for_line(line_index)
            .last()
            .copied()
            .unwrap_or(0)
    }

    /// Logical position of the visual start of line `line_index`
    pub fn beginning_of_line(&self, line_index: usize) -> usize {
        self.insertion_points_for_line(line_index)
            .first()
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn previous_logical_position(&self, position: usize) -> usize {
        let len = self.data.string.len();
        if position == 0 || position > len {
            return position;
        }
        let mut position = position - 1;
        while position > 0 && !self.data.attributes[position].grapheme_boundary() {
            position -= 1;
        }
        position
    }

    pub(crate) fn next_logical_position(&self, position: usize) -> usize {
        let len = self.data.string.len();
        if position >= len {
            return position;
        }
        let mut position = position + 1;
        while position < len && !self.data.attributes[position].grapheme_boundary() {
            position += 1;
        }
        position
    }

    /// Is `position` on a grapheme boundary of the laid out text; the end of the text is valid
    pub fn is_valid_cursor_position(&self, position: usize) -> bool {
        let len = self.data.string.len();
        position == len
            || (position < len && self.data.attributes[position].grapheme_boundary())
    }

    /// The next cursor position after `position`, or `position` when there is none
    pub fn next_cursor_position(&self, position: usize, mode: CursorMode) -> usize {
        let len = self.data.string.len();
        if position >= len {
            return position;
        }
        let attributes = &self.data.attributes;
        let string = &self.data.string;
        let mut position = position;
        match mode {
            CursorMode::SkipCharacters => return self.next_logical_position(position),
            CursorMode::SkipWords => {
                if is_word_separator(string[position]) {
                    position += 1;
                    while position < len && is_word_separator(string[position]) {
                        position += 1;
                    }
                } else {
                    while position < len
                        && !attributes[position].whitespace()
                        && !is_word_separator(string[position])
                    {
                        position += 1;
                    }
                }
                while position < len && attributes[position].whitespace() {
                    position += 1;
                }
            }
        }
        position
    }

    /// The previous cursor position before `position`, or `position` when there is none
    pub fn previous_cursor_position(&self, position: usize, mode: CursorMode) -> usize {
        let len = self.data.string.len();
        if position == 0 || position > len {
            return position;
        }
        let attributes = &self.data.attributes;
        let string = &self.data.string;
        let mut position = position;
        match mode {
            CursorMode::SkipCharacters => return self.previous_logical_position(position),
            CursorMode::SkipWords => {
                while position > 0 && attributes[position - 1].whitespace() {
                    position -= 1;
                }
                if position > 0 && is_word_separator(string[position - 1]) {
                    position -= 1;
                    while position > 0 && is_word_separator(string[position - 1]) {
                        position -= 1;
                    }
                } else {
                    while position > 0
                        && !attributes[position - 1].whitespace()
                        && !is_word_separator(string[position - 1])
                    {
                        position -= 1;
                    }
                }
            }
        }
        position
    }

    /// The cursor position one step to the right of `position` on screen
    pub fn right_cursor_position(&self, position: usize) -> usize {
        self.cursor_position_after_move(position, true)
    }

    /// The cursor position one step to the left of `position` on screen
    pub fn left_cursor_position(&self, position: usize) -> usize {
        self.cursor_position_after_move(position, false)
    }

    fn cursor_position_after_move(&self, position: usize, move_right: bool) -> usize {
        let rtl = self.is_right_to_left();
        if !self.visual_movement() || !self.data.has_bidi {
            return if move_right ^ rtl {
                self.next_cursor_position(position, CursorMode::SkipCharacters)
            } else {
                self.previous_cursor_position(position, CursorMode::SkipCharacters)
            };
        }

        let Some(line_index) = self.line_for_text_position(position) else {
            return position;
        };
        let points = self.insertion_points_for_line(line_index);
        let Some(i) = points.iter().position(|&point| point == position) else {
            return position;
        };

        if move_right {
            if let Some(&point) = points.get(i + 1) {
                return point;
            }
        } else if i > 0 {
            return points[i - 1];
        }

        // Continue on the neighbouring line
        if move_right ^ rtl {
            if line_index + 1 < self.lines.len() {
                return if rtl {
                    self.end_of_line(line_index + 1)
                } else {
                    self.beginning_of_line(line_index + 1)
                };
            }
        } else if line_index > 0 {
            return if rtl {
                self.beginning_of_line(line_index - 1)
            } else {
                self.end_of_line(line_index - 1)
            };
        }
        position
    }
}
