// SPDX-License-Identifier: MIT OR Apache-2.0

#![allow(dead_code)]

use para_layout::{Fixed, MonospaceShaper, TextLayout, TextOption};

/// Lay out `text` into lines of `width` units with the default monospace shaper
pub fn lay_out(text: &str, option: TextOption, width: i32) -> TextLayout {
    let mut shaper = MonospaceShaper::default();
    lay_out_with(&mut shaper, text, option, width)
}

pub fn lay_out_with(
    shaper: &mut MonospaceShaper,
    text: &str,
    option: TextOption,
    width: i32,
) -> TextLayout {
    let mut layout = TextLayout::new(text).with_text_option(option);
    relayout(&mut layout, shaper, width);
    layout
}

/// Run a complete layout pass over `layout`, stacking the lines vertically
pub fn relayout(layout: &mut TextLayout, shaper: &mut MonospaceShaper, width: i32) {
    layout.begin_layout();
    let mut y = Fixed::ZERO;
    while let Some(mut line) = layout.create_line(shaper) {
        line.set_line_width(shaper, Fixed::from_int(width));
        line.set_position(Fixed::ZERO, y);
        y += line.height();
    }
    layout.end_layout(shaper);
}

/// Text of each line, without trailing whitespace
pub fn line_texts(layout: &TextLayout) -> Vec<String> {
    let units = layout.layout_text();
    layout
        .lines()
        .iter()
        .map(|line| String::from_utf16_lossy(&units[line.from..line.from + line.length]))
        .collect()
}
