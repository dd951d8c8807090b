// SPDX-License-Identifier: MIT OR Apache-2.0

//! Helpers for drawing laid out paragraphs

use core::ops::Range;

use crate::cursor::offset_in_ligature;
use crate::justify::glyph_range;
use crate::{Fixed, ScriptItem, TextLayout};

const SOFT_HYPHEN: u16 = 0x00AD;

/// An axis aligned rectangle
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rect {
    pub x: Fixed,
    pub y: Fixed,
    pub width: Fixed,
    pub height: Fixed,
}

impl Rect {
    pub fn new(x: Fixed, y: Fixed, width: Fixed, height: Fixed) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.width.is_positive() || !self.height.is_positive()
    }
}

/// A range of the laid out text and the caller's format for it
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FormatRange {
    pub start: usize,
    pub length: usize,
    /// Caller defined format index, passed back to the [`Renderer`]
    pub format: usize,
}

impl FormatRange {
    pub fn new(start: usize, length: usize, format: usize) -> Self {
        Self {
            start,
            length,
            format,
        }
    }

    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Why a rectangle is drawn
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Highlight {
    /// Background of the format of a [`FormatRange`]
    Format(usize),
    /// Selection drawn with the format of a [`FormatRange`]
    Selection(usize),
}

/// A glyph with its position on the line
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PositionedGlyph {
    pub id: u32,
    /// Left edge of the glyph
    pub x: Fixed,
    /// Advance including justification
    pub advance: Fixed,
}

/// The visible glyphs of one script item on one line
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GlyphRun {
    /// Index of the line in its layout
    pub line: usize,
    /// Code units of the laid out text covered by this run
    pub text: Range<usize>,
    /// Glyphs in logical order
    pub glyphs: Vec<PositionedGlyph>,
    pub baseline: Fixed,
    pub rtl: bool,
}

/// Receives what [`TextLayout::draw`] draws
pub trait Renderer {
    /// Fill `rect`
    fn rectangle(&mut self, rect: Rect, highlight: Highlight);

    /// Draw the glyphs of `run`
    fn glyph_run(&mut self, run: &GlyphRun);

    /// Draw the inline object at `position` of the laid out text into `rect`
    fn inline_object(&mut self, _rect: Rect, _position: usize) {}
}

// One item of a line, placed
struct PlacedItem<'a> {
    item: &'a ScriptItem,
    x: Fixed,
    width: Fixed,
    start: usize,
    end: usize,
    glyphs: Range<usize>,
    /// The last glyph is a soft hyphen ending the line
    show_hyphen: bool,
}

impl PlacedItem<'_> {
    fn advance(&self, glyph: usize) -> Fixed {
        let glyphs = &self.item.glyphs;
        if self.show_hyphen && glyph + 1 == self.glyphs.end {
            if let Some(g) = glyphs.glyphs.get(glyph) {
                return g.advance + g.justification_space;
            }
        }
        glyphs.effective_advance(glyph)
    }

    fn width_of(&self, glyphs: Range<usize>) -> Fixed {
        glyphs.fold(Fixed::ZERO, |width, glyph| width + self.advance(glyph))
    }

    // Offset and width of the part of `range` inside this item
    fn selection_bounds(&self, range: &FormatRange) -> Option<(Fixed, Fixed)> {
        let item = self.item;
        if item.kind.is_tab_or_object() {
            if item.position >= range.end() || item.end() <= range.start {
                return None;
            }
            return Some((Fixed::ZERO, self.width));
        }

        let from = self.start.max(range.start);
        let to = self.end.min(range.end());
        if from >= to {
            return None;
        }
        let from = from - item.position;
        let to = to - item.position;

        let glyphs = &item.glyphs;
        let start_glyph = glyphs.cluster(from);
        let end_glyph = if to == item.len {
            glyphs.len()
        } else {
            glyphs.cluster(to)
        };
        let (offset, width) = if item.is_rtl() {
            (
                self.width_of(end_glyph.max(self.glyphs.start)..self.glyphs.end),
                self.width_of(start_glyph..end_glyph),
            )
        } else {
            (
                self.width_of(self.glyphs.start..start_glyph),
                self.width_of(start_glyph..end_glyph),
            )
        };

        // Selections starting or ending inside a ligature cover part of it
        let left = offset_in_ligature(item, from, item.len, start_glyph);
        let right = offset_in_ligature(item, to, item.len, end_glyph);
        Some((offset + left, width - left + right))
    }
}

impl TextLayout {
    // Items of line `line_index` in visual order with their positions, relative to the line
    fn placed_items(&self, line_index: usize) -> Vec<PlacedItem<'_>> {
        let Some(line) = self.lines.get(line_index) else {
            return Vec::new();
        };
        let line_end = line.from + line.length;
        let (first, order) = self.visual_items(line.from, line_end);
        let string = &self.data.string;

        let mut x = line.x + self.align_line(line);
        let mut placed = Vec::with_capacity(order.len());
        for visual_index in order {
            let item = &self.data.items[first + visual_index];
            let start = line.from.max(item.position);
            let end = line_end.min(item.end());

            let mut place = PlacedItem {
                item,
                x,
                width: item.width,
                start,
                end,
                glyphs: 0..1,
                show_hyphen: false,
            };
            if !item.kind.is_tab_or_object() {
                place.glyphs = glyph_range(item, start, end);
                place.show_hyphen = item.end() >= line_end
                    && !place.glyphs.is_empty()
                    && line_end.checked_sub(1).and_then(|last| string.get(last))
                        == Some(&SOFT_HYPHEN);
                place.width = place.width_of(place.glyphs.clone());
            }
            x += place.width;
            placed.push(place);
        }
        placed
    }

    /// Draw every line at `x`, `y`.
    ///
    /// For each item, the backgrounds of `formats` are drawn first, then `selections`, then the
    /// glyphs.
    pub fn draw(
        &self,
        renderer: &mut dyn Renderer,
        x: Fixed,
        y: Fixed,
        selections: &[FormatRange],
        formats: &[FormatRange],
    ) {
        for (line_index, line) in self.lines.iter().enumerate() {
            let top = y + line.y;
            let height = line.height();
            let baseline = top + line.ascent;

            for place in self.placed_items(line_index) {
                let item_x = x + place.x;
                for range in formats {
                    if let Some((offset, width)) = place.selection_bounds(range) {
                        renderer.rectangle(
                            Rect::new(item_x + offset, top, width, height),
                            Highlight::Format(range.format),
                        );
                    }
                }
                for range in selections {
                    if let Some((offset, width)) = place.selection_bounds(range) {
                        renderer.rectangle(
                            Rect::new(item_x + offset, top, width, height),
                            Highlight::Selection(range.format),
                        );
                    }
                }

                let item = place.item;
                if item.kind.is_tab_or_object() {
                    if item.kind == crate::ItemKind::Object {
                        let ascent = item.ascent;
                        renderer.inline_object(
                            Rect::new(item_x, baseline - ascent, place.width, ascent + item.descent),
                            item.position,
                        );
                    }
                    continue;
                }

                let mut run = GlyphRun {
                    line: line_index,
                    text: place.start..place.end,
                    glyphs: Vec::with_capacity(place.glyphs.len()),
                    baseline,
                    rtl: item.is_rtl(),
                };
                let mut glyph_x = if run.rtl {
                    item_x + place.width
                } else {
                    item_x
                };
                for glyph in place.glyphs.clone() {
                    let advance = place.advance(glyph);
                    if run.rtl {
                        glyph_x -= advance;
                    }
                    let Some(shaped) = item.glyphs.glyphs.get(glyph) else {
                        continue;
                    };
                    let hyphen = place.show_hyphen && glyph + 1 == place.glyphs.end;
                    if !shaped.attributes.dont_print || hyphen {
                        run.glyphs.push(PositionedGlyph {
                            id: shaped.id,
                            x: glyph_x,
                            advance,
                        });
                    }
                    if !run.rtl {
                        glyph_x += advance;
                    }
                }
                if !run.glyphs.is_empty() {
                    renderer.glyph_run(&run);
                }
            }
        }
    }
}
