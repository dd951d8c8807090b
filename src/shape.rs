// SPDX-License-Identifier: MIT OR Apache-2.0

use core::ops::Range;
use std::collections::BTreeMap;

use crate::{Fixed, ScriptItem};

/// Vertical metrics of a font
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct FontMetrics {
    pub ascent: Fixed,
    pub descent: Fixed,
    pub leading: Fixed,
}

impl FontMetrics {
    pub fn new(ascent: Fixed, descent: Fixed, leading: Fixed) -> Self {
        Self {
            ascent,
            descent,
            leading,
        }
    }
}

/// Per glyph flags set by the shaper
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct GlyphAttributes {
    /// This glyph starts a cluster
    pub cluster_start: bool,
    /// This glyph takes no space and is not drawn
    pub dont_print: bool,
}

/// A shaped glyph
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Glyph {
    /// Font specific glyph index
    pub id: u32,
    pub advance: Fixed,
    pub attributes: GlyphAttributes,
    /// Extra space added after this glyph by justification
    pub justification_space: Fixed,
}

impl Glyph {
    pub fn new(id: u32, advance: Fixed) -> Self {
        Self {
            id,
            advance,
            attributes: GlyphAttributes {
                cluster_start: true,
                dont_print: false,
            },
            justification_space: Fixed::ZERO,
        }
    }

    /// The space this glyph takes on the line
    pub fn effective_advance(&self) -> Fixed {
        if self.attributes.dont_print {
            Fixed::ZERO
        } else {
            self.advance + self.justification_space
        }
    }
}

/// Glyphs of one script item, in logical order, plus the character to glyph mapping.
///
/// `log_clusters[i]` is the index of the first glyph of the cluster that character `i` of the item
/// belongs to. It never decreases; equal neighbouring entries mark a multi-character cluster.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct GlyphLayout {
    pub glyphs: Vec<Glyph>,
    pub log_clusters: Vec<usize>,
}

impl GlyphLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single glyph standing in for one character, used for tabs and inline objects
    pub fn placeholder(advance: Fixed) -> Self {
        let mut glyph = Glyph::new(0, advance);
        glyph.attributes.dont_print = true;
        Self {
            glyphs: vec![glyph],
            log_clusters: vec![0],
        }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// First glyph of the cluster of character `index`, or the glyph count past the end
    pub fn cluster(&self, index: usize) -> usize {
        self.log_clusters
            .get(index)
            .copied()
            .unwrap_or(self.glyphs.len())
            .min(self.glyphs.len())
    }

    pub fn effective_advance(&self, glyph: usize) -> Fixed {
        self.glyphs
            .get(glyph)
            .map_or(Fixed::ZERO, Glyph::effective_advance)
    }

    pub fn advance(&self, glyph: usize) -> Fixed {
        self.glyphs.get(glyph).map_or(Fixed::ZERO, |g| g.advance)
    }

    pub fn is_cluster_start(&self, glyph: usize) -> bool {
        self.glyphs
            .get(glyph)
            .is_some_and(|g| g.attributes.cluster_start)
    }

    /// Advance of `glyph` ignoring justification, zero when it is not printed
    pub fn printed_advance(&self, glyph: usize) -> Fixed {
        self.glyphs
            .get(glyph)
            .filter(|g| !g.attributes.dont_print)
            .map_or(Fixed::ZERO, |g| g.advance)
    }

    /// Sum of effective advances of `glyphs`
    pub fn width(&self, glyphs: Range<usize>) -> Fixed {
        self.clamped(glyphs)
            .iter()
            .fold(Fixed::ZERO, |w, g| w + g.effective_advance())
    }

    /// Sum of printed advances of `glyphs`, without justification
    pub fn printed_width(&self, glyphs: Range<usize>) -> Fixed {
        self.clamped(glyphs)
            .iter()
            .filter(|g| !g.attributes.dont_print)
            .fold(Fixed::ZERO, |w, g| w + g.advance)
    }

    fn clamped(&self, glyphs: Range<usize>) -> &[Glyph] {
        let end = glyphs.end.min(self.glyphs.len());
        let start = glyphs.start.min(end);
        &self.glyphs[start..end]
    }

    /// Check the cluster mapping against `chars` characters, replacing a broken layout with one
    /// invisible glyph per character
    pub(crate) fn repair(&mut self, chars: usize) -> bool {
        let valid = self.log_clusters.len() == chars
            && self
                .log_clusters
                .windows(2)
                .all(|pair| pair[0] <= pair[1])
            && self.log_clusters.iter().all(|&g| g < self.glyphs.len())
            && self
                .log_clusters
                .first()
                .is_none_or(|&g| g == 0);
        if valid {
            return true;
        }
        log::warn!(
            "shaper returned {} glyphs with {} clusters for {} characters, hiding run",
            self.glyphs.len(),
            self.log_clusters.len(),
            chars
        );
        self.glyphs = (0..chars)
            .map(|_| {
                let mut glyph = Glyph::new(0, Fixed::ZERO);
                glyph.attributes.dont_print = true;
                glyph
            })
            .collect();
        self.log_clusters = (0..chars).collect();
        false
    }
}

/// Maps runs of text to glyphs.
///
/// `shape` receives the UTF-16 text of one [`ScriptItem`] and must fill `item.glyphs` (with one
/// `log_clusters` entry per code unit of `text`) and the item's ascent, descent and leading. It
/// may be called again for the same item and must then produce the same result.
pub trait Shaper {
    fn shape(&mut self, text: &[u16], item: &mut ScriptItem);

    /// Metrics used for lines without any shaped text
    fn font_metrics(&self) -> FontMetrics;

    /// Width used to convert tab widths into column counts
    fn average_char_width(&self) -> Fixed;

    /// Signed distance from the ink edge of `glyph` to its advance, negative when the ink overhangs
    fn glyph_right_bearing(&self, _glyph: u32) -> Fixed {
        Fixed::ZERO
    }

    /// The most negative right bearing of any glyph, zero when no glyph overhangs
    fn min_right_bearing(&self) -> Fixed {
        Fixed::ZERO
    }
}

/// A [`Shaper`] giving every character the same advance unless overridden.
///
/// Glyph ids are the code points of the characters. Soft hyphens take the width of `-` but are
/// not printed, control characters and separators take no space, combining diacritical marks join
/// the preceding cluster with a zero advance, and configured ligatures produce one glyph for
/// several characters.
#[derive(Clone, Debug)]
pub struct MonospaceShaper {
    advance: Fixed,
    metrics: FontMetrics,
    overrides: BTreeMap<char, Fixed>,
    right_bearings: BTreeMap<u32, Fixed>,
    ligatures: Vec<(Vec<u16>, u32)>,
}

impl MonospaceShaper {
    /// Glyph id assigned to the first configured ligature
    pub const LIGATURE_BASE: u32 = 0x11_0000;

    pub fn new(advance: Fixed, metrics: FontMetrics) -> Self {
        Self {
            advance,
            metrics,
            overrides: BTreeMap::new(),
            right_bearings: BTreeMap::new(),
            ligatures: Vec::new(),
        }
    }

    /// Use `advance` for `c`
    pub fn with_advance(mut self, c: char, advance: Fixed) -> Self {
        self.overrides.insert(c, advance);
        self
    }

    /// Give the glyph of `c` a right bearing, negative values overhang the advance
    pub fn with_right_bearing(mut self, c: char, bearing: Fixed) -> Self {
        self.right_bearings.insert(c as u32, bearing);
        self
    }

    /// Shape `sequence` as a single glyph as wide as its characters together
    pub fn with_ligature(mut self, sequence: &str) -> Self {
        let id = Self::LIGATURE_BASE + self.ligatures.len() as u32;
        self.ligatures.push((sequence.encode_utf16().collect(), id));
        self
    }

    fn char_advance(&self, c: char) -> Fixed {
        if let Some(advance) = self.overrides.get(&c) {
            return *advance;
        }
        match c {
            '\u{AD}' => self.char_advance('-'),
            c if is_invisible(c) => Fixed::ZERO,
            c if is_combining_mark(c) => Fixed::ZERO,
            _ => self.advance,
        }
    }
}

impl Default for MonospaceShaper {
    fn default() -> Self {
        Self::new(
            Fixed::from_int(10),
            FontMetrics::new(Fixed::from_int(12), Fixed::from_int(4), Fixed::from_int(2)),
        )
    }
}

impl Shaper for MonospaceShaper {
    fn shape(&mut self, text: &[u16], item: &mut ScriptItem) {
        let mut layout = GlyphLayout {
            glyphs: Vec::with_capacity(text.len()),
            log_clusters: Vec::with_capacity(text.len()),
        };

        let mut i = 0;
        while i < text.len() {
            if let Some((sequence, id)) = self
                .ligatures
                .iter()
                .find(|(sequence, _)| !sequence.is_empty() && text[i..].starts_with(sequence))
            {
                let advance = char::decode_utf16(sequence.iter().copied())
                    .map(|c| self.char_advance(c.unwrap_or(char::REPLACEMENT_CHARACTER)))
                    .fold(Fixed::ZERO, |w, a| w + a);
                let glyph = layout.glyphs.len();
                layout.glyphs.push(Glyph::new(*id, advance));
                layout
                    .log_clusters
                    .extend(core::iter::repeat_n(glyph, sequence.len()));
                i += sequence.len();
                continue;
            }

            let (c, units) = match char::decode_utf16(text[i..].iter().copied()).next() {
                Some(Ok(c)) => (c, c.len_utf16()),
                _ => (char::REPLACEMENT_CHARACTER, 1),
            };

            if is_combining_mark(c) && !layout.glyphs.is_empty() {
                let cluster = layout.log_clusters.last().copied().unwrap_or(0);
                let mut glyph = Glyph::new(c as u32, Fixed::ZERO);
                glyph.attributes.cluster_start = false;
                layout.glyphs.push(glyph);
                layout.log_clusters.push(cluster);
            } else {
                let glyph = layout.glyphs.len();
                let mut shaped = Glyph::new(c as u32, self.char_advance(c));
                shaped.attributes.dont_print = c == '\u{AD}' || is_invisible(c);
                layout.glyphs.push(shaped);
                layout
                    .log_clusters
                    .extend(core::iter::repeat_n(glyph, units));
            }
            i += units;
        }

        item.glyphs = layout;
        item.ascent = self.metrics.ascent;
        item.descent = self.metrics.descent;
        item.leading = self.metrics.leading;
    }

    fn font_metrics(&self) -> FontMetrics {
        self.metrics
    }

    fn average_char_width(&self) -> Fixed {
        self.advance
    }

    fn glyph_right_bearing(&self, glyph: u32) -> Fixed {
        self.right_bearings
            .get(&glyph)
            .copied()
            .unwrap_or(Fixed::ZERO)
    }

    fn min_right_bearing(&self) -> Fixed {
        self.right_bearings
            .values()
            .copied()
            .min()
            .unwrap_or(Fixed::ZERO)
            .min(Fixed::ZERO)
    }
}

fn is_invisible(c: char) -> bool {
    c.is_control() || matches!(c, '\u{2028}' | '\u{2029}' | '\u{200B}'..='\u{200F}' | '\u{FEFF}')
}

fn is_combining_mark(c: char) -> bool {
    matches!(c, '\u{0300}'..='\u{036F}' | '\u{1AB0}'..='\u{1AFF}' | '\u{20D0}'..='\u{20FF}')
}
