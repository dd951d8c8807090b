// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::layout::{LayoutData, VerticalAlign};
use crate::{find_item, Fixed, ItemKind, ScriptItem, ScriptLine, Shaper, TextOption, WrapMode};

const SOFT_HYPHEN: u16 = 0x00AD;

/// State of one line break pass.
///
/// `tmp` holds the run since the last break opportunity and `space` the whitespace run after it.
/// Both are folded into the line once the break opportunity is known to fit.
#[derive(Default)]
struct LineBreakHelper {
    tmp: ScriptLine,
    space: ScriptLine,
    glyph_count: usize,
    max_glyphs: usize,
    current_position: usize,
    previous_glyph: Option<u32>,
    min_width: Fixed,
    current_soft_hyphen_width: Fixed,
    committed_soft_hyphen_width: Fixed,
    /// Right bearing of the last glyph, never positive, `None` until computed
    right_bearing: Option<Fixed>,
    minimum_right_bearing: Fixed,
    manual_wrap: bool,
    white_space_or_object: bool,
}

impl LineBreakHelper {
    fn save_current_glyph(&mut self, items: &[ScriptItem]) {
        self.previous_glyph = glyph_before(items, self.current_position);
    }

    fn calculate_right_bearing(&mut self, shaper: &dyn Shaper, items: &[ScriptItem]) {
        if let Some(glyph) = glyph_before(items, self.current_position) {
            self.right_bearing = Some(shaper.glyph_right_bearing(glyph).min(Fixed::ZERO));
        }
    }

    fn calculate_right_bearing_for_previous_glyph(&mut self, shaper: &dyn Shaper) {
        if let Some(glyph) = self.previous_glyph {
            self.right_bearing = Some(shaper.glyph_right_bearing(glyph).min(Fixed::ZERO));
        }
    }

    /// How far the ink of the last glyph reaches past its advance
    fn negative_right_bearing(&self) -> Fixed {
        self.right_bearing.map_or(Fixed::ZERO, Fixed::abs)
    }

    fn calculate_new_width(&self, line: &ScriptLine) -> Fixed {
        let soft_hyphen = if line.text_width.is_positive() {
            self.current_soft_hyphen_width
        } else {
            Fixed::ZERO
        };
        line.text_width
            + self.tmp.text_width
            + self.space.text_width
            + soft_hyphen
            + self.negative_right_bearing()
    }

    /// Returns true when the pending runs do not fit, otherwise commits them to `line`
    fn check_full_otherwise_extend(&mut self, line: &mut ScriptLine) -> bool {
        let new_width = self.calculate_new_width(line);
        if line.length > 0
            && !self.manual_wrap
            && (new_width > line.width || self.glyph_count > self.max_glyphs)
        {
            return true;
        }

        let old_text_width = line.text_width;
        line.extend(&self.tmp);
        line.text_width += self.space.text_width;
        line.length += self.space.length;
        self.tmp.text_width = Fixed::ZERO;
        self.tmp.length = 0;
        self.space.text_width = Fixed::ZERO;
        self.space.length = 0;

        if old_text_width != line.text_width || self.current_soft_hyphen_width.is_positive() {
            self.committed_soft_hyphen_width = self.current_soft_hyphen_width;
            self.current_soft_hyphen_width = Fixed::ZERO;
        }

        false
    }
}

// Glyph id of the cluster of the code unit before `position`
fn glyph_before(items: &[ScriptItem], position: usize) -> Option<u32> {
    let offset = position.checked_sub(1)?;
    let item = &items[find_item(items, offset)?];
    let glyphs = &item.glyphs;
    glyphs
        .glyphs
        .get(glyphs.cluster(offset - item.position))
        .map(|glyph| glyph.id)
}

// Move `position` past one cluster of `item`, adding it to `line`
fn add_next_cluster(
    position: &mut usize,
    end: usize,
    line: &mut ScriptLine,
    glyph_count: &mut usize,
    item: &ScriptItem,
    cluster_width: Option<&mut Fixed>,
) {
    let glyphs = &item.glyphs;
    let mut glyph = glyphs.cluster(*position - item.position);
    loop {
        *position += 1;
        line.length += 1;
        if *position >= end || glyphs.cluster(*position - item.position) != glyph {
            break;
        }
    }

    let before = line.text_width;
    loop {
        line.text_width += glyphs.printed_advance(glyph);
        glyph += 1;
        if glyph >= glyphs.len() || glyphs.is_cluster_start(glyph) {
            break;
        }
    }

    if let Some(width) = cluster_width {
        *width += line.text_width - before;
    }
    *glyph_count = glyph_count.saturating_add(1);
}

/// Fill `line` from `line.from`, within `line.width` or at most `max_glyphs` clusters.
///
/// Updates the paragraph minimum and maximum widths in `data`.
pub(crate) fn fill_line(
    data: &mut LayoutData,
    option: &TextOption,
    shaper: &mut dyn Shaper,
    line: &mut ScriptLine,
    max_glyphs: usize,
    wrap_mode: WrapMode,
) {
    line.length = 0;
    line.trailing_spaces = 0;
    line.text_width = Fixed::ZERO;
    line.has_trailing_spaces = false;

    let Some(mut new_item) = find_item(&data.items, line.from) else {
        line.set_default_height(shaper.font_metrics());
        return;
    };

    let mut lbh = LineBreakHelper {
        max_glyphs,
        current_position: line.from,
        manual_wrap: wrap_mode.is_manual(),
        white_space_or_object: true,
        ..LineBreakHelper::default()
    };

    let break_any = wrap_mode == WrapMode::WrapAnywhere;
    let break_word_or_any = break_any || wrap_mode == WrapMode::WrapAtWordBoundaryOrAnywhere;
    let include_trailing_spaces = option.include_trailing_spaces();
    let len = data.string.len();

    let mut item: Option<usize> = None;
    let mut end = 0;
    let mut manually_wrapped = false;
    let mut has_inline_object = false;
    let mut reached_end_of_line = false;
    let mut max_inline_object_height = Fixed::ZERO;

    'found: {
        while new_item < data.items.len() {
            lbh.right_bearing = None;
            if item != Some(new_item) {
                item = Some(new_item);
                data.shape_item(new_item, shaper, option);
                let current = &data.items[new_item];
                lbh.current_position = line.from.max(current.position);
                end = current.end();
                lbh.minimum_right_bearing = shaper.min_right_bearing().min(Fixed::ZERO);
                log::trace!(
                    "line at {}: item {} at {} ({:?})",
                    line.from,
                    new_item,
                    current.position,
                    current.kind
                );
            }
            let index = new_item;

            {
                let current = &data.items[index];
                let tmp = &mut lbh.tmp;
                tmp.leading = (tmp.leading + tmp.ascent).max(current.leading + current.ascent)
                    - tmp.ascent.max(current.ascent);
                if current.kind != ItemKind::Object {
                    tmp.ascent = tmp.ascent.max(current.ascent);
                    tmp.descent = tmp.descent.max(current.descent);
                }
            }

            let kind = data.items[index].kind;
            match kind {
                ItemKind::Tab if option.alignment.is_some() => {
                    lbh.white_space_or_object = true;
                    if lbh.check_full_otherwise_extend(line) {
                        break 'found;
                    }

                    let x = line.x + line.text_width + lbh.tmp.text_width + lbh.space.text_width;
                    data.shape_tab_section(index, shaper, option);
                    let tab_width = data.tab_width(index, x, option);

                    lbh.space.text_width += tab_width;
                    lbh.space.length += 1;
                    new_item = index + 1;

                    let average = shaper.average_char_width();
                    if average.is_positive() {
                        let columns = (tab_width / average).round().max(0);
                        lbh.glyph_count = lbh.glyph_count.saturating_add(columns as usize);
                    }

                    if lbh.check_full_otherwise_extend(line) {
                        break 'found;
                    }
                }
                ItemKind::LineOrParagraphSeparator => {
                    lbh.white_space_or_object = true;
                    // A line holding only a separator still needs a height
                    if line.length == 0 && lbh.tmp.length == 0 {
                        line.set_default_height(shaper.font_metrics());
                    }
                    if option.show_separators() {
                        if lbh.check_full_otherwise_extend(line) {
                            break 'found;
                        }
                        add_next_cluster(
                            &mut lbh.current_position,
                            end,
                            &mut lbh.tmp,
                            &mut lbh.glyph_count,
                            &data.items[index],
                            None,
                        );
                    } else {
                        lbh.tmp.length += 1;
                        lbh.calculate_right_bearing_for_previous_glyph(shaper);
                    }
                    line.extend(&lbh.tmp);
                    manually_wrapped = true;
                    break 'found;
                }
                ItemKind::Object => {
                    lbh.white_space_or_object = true;
                    lbh.tmp.length += 1;

                    let object = data
                        .objects
                        .get(&data.items[index].position)
                        .copied()
                        .unwrap_or_default();
                    let current = &mut data.items[index];
                    current.ascent = object.ascent;
                    current.descent = object.descent;
                    current.width = object.width;
                    if !matches!(object.align, VerticalAlign::Top | VerticalAlign::Bottom) {
                        lbh.tmp.ascent = lbh.tmp.ascent.max(current.ascent);
                        lbh.tmp.descent = lbh.tmp.descent.max(current.descent);
                    }

                    lbh.tmp.text_width += current.width;
                    let height = current.ascent + current.descent;

                    new_item = index + 1;
                    lbh.glyph_count = lbh.glyph_count.saturating_add(1);
                    if lbh.check_full_otherwise_extend(line) {
                        break 'found;
                    }

                    has_inline_object = true;
                    max_inline_object_height = max_inline_object_height.max(height);
                }
                _ if data.is_breakable_space(lbh.current_position) => {
                    // Keep the last glyph before the spaces for its right bearing
                    let at = lbh.current_position;
                    if at > 0 && !data.attributes[at - 1].whitespace() {
                        lbh.save_current_glyph(&data.items);
                    }
                    lbh.white_space_or_object = true;
                    let current = &data.items[index];
                    while lbh.current_position < end && data.is_breakable_space(lbh.current_position)
                    {
                        add_next_cluster(
                            &mut lbh.current_position,
                            end,
                            &mut lbh.space,
                            &mut lbh.glyph_count,
                            current,
                            None,
                        );
                    }
                }
                _ => {
                    if !lbh.manual_wrap && lbh.space.text_width > line.width {
                        break 'found;
                    }

                    lbh.white_space_or_object = false;
                    let at = lbh.current_position;
                    if at == 0
                        || lbh.previous_glyph.is_none()
                        || include_trailing_spaces
                        || !data.attributes[at - 1].whitespace()
                    {
                        lbh.save_current_glyph(&data.items);
                    }

                    let current = &data.items[index];
                    let mut sb_or_ws = false;
                    let mut accumulated_width = Fixed::ZERO;
                    loop {
                        add_next_cluster(
                            &mut lbh.current_position,
                            end,
                            &mut lbh.tmp,
                            &mut lbh.glyph_count,
                            current,
                            Some(&mut accumulated_width),
                        );

                        let at = lbh.current_position;
                        if at >= len
                            || data.is_breakable_space(at)
                            || data.attributes[at].line_break()
                            || lbh.tmp.text_width >= Fixed::MAX
                        {
                            sb_or_ws = true;
                            break;
                        } else if data.attributes[at].grapheme_boundary() {
                            if break_word_or_any {
                                lbh.min_width = lbh.min_width.max(accumulated_width);
                                accumulated_width = Fixed::ZERO;
                            }
                            if break_any {
                                break;
                            }
                        }
                        if lbh.current_position >= end {
                            break;
                        }
                    }
                    lbh.min_width = lbh.min_width.max(accumulated_width);

                    let at = lbh.current_position;
                    if at <= end
                        && (at == end || data.attributes[at].line_break())
                        && data.string[at - 1] == SOFT_HYPHEN
                    {
                        // Only shown when the line breaks right after it
                        let glyphs = &current.glyphs;
                        lbh.current_soft_hyphen_width =
                            glyphs.advance(glyphs.cluster(at - 1 - current.position));
                    }

                    if sb_or_ws || break_any {
                        let previous_right_bearing = lbh.right_bearing;

                        // Bearings only matter when the widest overhang could cross the edge
                        if lbh.calculate_new_width(line) + lbh.minimum_right_bearing.abs()
                            > line.width
                        {
                            lbh.calculate_right_bearing(shaper, &data.items);
                        }

                        if lbh.check_full_otherwise_extend(line) {
                            match previous_right_bearing {
                                Some(_) => lbh.right_bearing = previous_right_bearing,
                                None => lbh.calculate_right_bearing_for_previous_glyph(shaper),
                            }
                            line.text_width += lbh.committed_soft_hyphen_width;
                            break 'found;
                        }
                    }
                    lbh.save_current_glyph(&data.items);
                }
            }

            if lbh.current_position == end {
                new_item = index + 1;
            }
        }

        reached_end_of_line = true;
        lbh.check_full_otherwise_extend(line);
        line.text_width += lbh.committed_soft_hyphen_width;
    }

    line.text_advance = line.text_width;

    if lbh.right_bearing.is_none() && !lbh.white_space_or_object {
        lbh.calculate_right_bearing(shaper, &data.items);
    }
    let text_width_without_bearing = line.text_width;
    line.text_width += lbh.negative_right_bearing();

    if line.length == 0 {
        // Nothing fit, take the pending run anyway
        line.extend(&lbh.tmp);
    }

    if has_inline_object {
        place_inline_objects(data, line, max_inline_object_height);
    }

    let trailing_space = if include_trailing_spaces {
        lbh.space.text_width
    } else {
        Fixed::ZERO
    };

    if wrap_mode == WrapMode::WrapAtWordBoundaryOrAnywhere {
        let overflows = if lbh.max_glyphs != usize::MAX {
            lbh.glyph_count > lbh.max_glyphs
        } else {
            line.text_width > line.width - trailing_space
        };
        if overflows {
            log::trace!(
                "line at {} does not fit at word boundaries, breaking anywhere",
                line.from
            );
            fill_line(data, option, shaper, line, max_glyphs, WrapMode::WrapAnywhere);
            return;
        }
    }

    if lbh.manual_wrap {
        data.min_width = data.min_width.max(line.text_width);
        data.max_width = data.max_width.max(line.text_width);
    } else {
        data.min_width = data.min_width.max(lbh.min_width);

        let actual_text_width = if manually_wrapped || reached_end_of_line {
            line.text_width
        } else {
            text_width_without_bearing
        };
        data.current_max_width += actual_text_width;
        if !manually_wrapped {
            data.current_max_width += lbh.space.text_width;
        }
        data.max_width = data.max_width.max(data.current_max_width);
        if manually_wrapped {
            data.current_max_width = Fixed::ZERO;
        }
    }

    line.text_width += trailing_space;
    if lbh.space.length > 0 {
        line.trailing_spaces = lbh.space.length;
        line.has_trailing_spaces = true;
    }
    line.justified = false;
}

// Grow the line for tall objects, then place each object in it by its alignment
fn place_inline_objects(data: &mut LayoutData, line: &mut ScriptLine, max_height: Fixed) {
    if max_height > line.ascent + line.descent {
        let to_add = (max_height - line.ascent - line.descent) / 2;
        line.ascent += to_add;
        line.descent = max_height - line.ascent;
    }

    let Some(start) = find_item(&data.items, line.from) else {
        return;
    };
    let end = find_item(&data.items, line.from + line.length).unwrap_or(data.items.len());
    for item in &mut data.items[start..end] {
        if item.kind != ItemKind::Object {
            continue;
        }
        let align = data
            .objects
            .get(&item.position)
            .map(|object| object.align)
            .unwrap_or_default();
        let height = item.ascent + item.descent;
        match align {
            VerticalAlign::Top => {
                item.ascent = line.ascent;
                item.descent = height - line.ascent;
            }
            VerticalAlign::Middle => {
                item.ascent = (line.ascent + line.descent) / 2 - line.descent + height / 2;
                item.descent = height - line.ascent;
            }
            VerticalAlign::Bottom => {
                item.descent = line.descent;
                item.ascent = height - line.descent;
            }
            VerticalAlign::Baseline => {}
        }
    }
}
