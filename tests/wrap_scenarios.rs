// SPDX-License-Identifier: MIT OR Apache-2.0

use para_layout::{
    Fixed, GlyphRun, Highlight, LayoutFlags, MonospaceShaper, Rect, Renderer, TextOption,
    WrapMode,
};

mod common;
use common::{lay_out, lay_out_with, line_texts};

#[derive(Default)]
struct Runs(Vec<GlyphRun>);

impl Renderer for Runs {
    fn rectangle(&mut self, _rect: Rect, _highlight: Highlight) {}

    fn glyph_run(&mut self, run: &GlyphRun) {
        self.0.push(run.clone());
    }
}

// Breaking at exactly the width of "The quick" keeps it on the first line
#[test]
fn wrap_at_exact_word_width() {
    let layout = lay_out("The quick brown fox", TextOption::new(), 90);
    assert_eq!(line_texts(&layout), vec!["The quick", "brown fox"]);

    let first = layout.line_at(0).unwrap();
    assert_eq!(first.trailing_spaces, 1);
    assert_eq!(first.text_width, Fixed::from_int(90));
    assert_eq!(layout.line_at(1).unwrap().from, 10);
}

#[test]
fn wrap_at_soft_hyphen() {
    // Wide enough for "a-" but not for "ab" with the hidden hyphen
    let mut shaper = MonospaceShaper::default().with_advance('b', Fixed::from_int(15));
    let layout = lay_out_with(&mut shaper, "a\u{AD}b", TextOption::new(), 20);
    assert_eq!(line_texts(&layout), vec!["a\u{AD}", "b"]);
    assert_eq!(layout.line_at(0).unwrap().text_width, Fixed::from_int(20));

    let mut runs = Runs::default();
    layout.draw(&mut runs, Fixed::ZERO, Fixed::ZERO, &[], &[]);
    let first: Vec<(u32, Fixed)> = runs.0[0]
        .glyphs
        .iter()
        .map(|glyph| (glyph.id, glyph.advance))
        .collect();
    assert_eq!(
        first,
        vec![('a' as u32, Fixed::from_int(10)), (0xAD, Fixed::from_int(10))]
    );
}

#[test]
fn soft_hyphen_hidden_when_not_broken() {
    let layout = lay_out("a\u{AD}b", TextOption::new(), 100);
    assert_eq!(layout.line_count(), 1);
    assert_eq!(layout.line_at(0).unwrap().text_width, Fixed::from_int(20));

    let mut runs = Runs::default();
    layout.draw(&mut runs, Fixed::ZERO, Fixed::ZERO, &[], &[]);
    let ids: Vec<u32> = runs.0[0].glyphs.iter().map(|glyph| glyph.id).collect();
    assert_eq!(ids, vec!['a' as u32, 'b' as u32]);
}

#[test]
fn zero_width_makes_one_line_per_word() {
    let layout = lay_out("ab cd efg", TextOption::new(), 0);
    assert_eq!(line_texts(&layout), vec!["ab", "cd", "efg"]);
    assert!(layout.lines().iter().all(|line| line.length > 0));
}

#[test]
fn zero_width_wrap_anywhere_makes_one_line_per_grapheme() {
    let option = TextOption::new().wrap_mode(WrapMode::WrapAnywhere);
    let layout = lay_out("abe\u{301}", option, 0);
    assert_eq!(line_texts(&layout), vec!["a", "b", "e\u{301}"]);
}

#[test]
fn hard_breaks_end_lines() {
    let layout = lay_out("one\ntwo\u{2029}three\u{2028}", TextOption::new(), 1000);
    assert_eq!(layout.line_count(), 4);
    let last = layout.line_at(3).unwrap();
    assert_eq!(last.from, layout.layout_text().len());
    assert_eq!(last.text_length(), 0);
}

#[test]
fn visible_line_separator() {
    let option = TextOption::new().flags(LayoutFlags::SHOW_LINE_AND_PARAGRAPH_SEPARATORS);
    let layout = lay_out("a\u{2028}b", option, 1000);

    let mut runs = Runs::default();
    layout.draw(&mut runs, Fixed::ZERO, Fixed::ZERO, &[], &[]);
    let ids: Vec<u32> = runs
        .0
        .iter()
        .flat_map(|run| run.glyphs.iter().map(|glyph| glyph.id))
        .collect();
    assert!(ids.contains(&0x21B5));
}

#[test]
fn relayout_at_new_width() {
    let mut shaper = MonospaceShaper::default();
    let mut layout = lay_out_with(&mut shaper, "aaa bbb ccc ddd", TextOption::new(), 70);
    assert_eq!(line_texts(&layout), vec!["aaa bbb", "ccc ddd"]);

    common::relayout(&mut layout, &mut shaper, 30);
    assert_eq!(line_texts(&layout), vec!["aaa", "bbb", "ccc", "ddd"]);
    assert_eq!(layout.bounding_height(), Fixed::from_int(4 * 16));
}
