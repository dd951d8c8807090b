// SPDX-License-Identifier: MIT OR Apache-2.0

use para_layout::{CursorPosition, Edge, Fixed, TextDirection, TextLayout, TextOption};

mod common;
use common::lay_out;

const MIXED: &str = "abc \u{5d0}\u{5d1}\u{5d2} def";

fn x_of(layout: &TextLayout, mut cursor: usize) -> i32 {
    layout.cursor_to_x(0, &mut cursor, Edge::Leading).floor()
}

#[test]
fn hebrew_in_latin_is_one_line() {
    let layout = lay_out(MIXED, TextOption::new(), 200);
    assert_eq!(layout.line_count(), 1);
    assert!(!layout.is_right_to_left());
    assert!(layout.items().iter().any(|item| item.is_rtl()));
}

#[test]
fn hit_test_inside_hebrew_run() {
    let layout = lay_out(MIXED, TextOption::new(), 200);
    // The Hebrew run covers x 40..70, drawn right to left
    let middle = layout.x_to_cursor(0, Fixed::from_int(55), CursorPosition::BetweenCharacters);
    assert!((5..7).contains(&middle), "{middle}");
    assert_eq!(
        layout.x_to_cursor(0, Fixed::from_int(53), CursorPosition::BetweenCharacters),
        6
    );
    assert_eq!(
        layout.x_to_cursor(0, Fixed::from_int(57), CursorPosition::BetweenCharacters),
        5
    );
}

#[test]
fn cursor_x_follows_visual_order() {
    let layout = lay_out(MIXED, TextOption::new(), 200);
    // Boundaries with the Latin runs sit at the visual edges of the Hebrew run
    assert_eq!(x_of(&layout, 4), 40);
    assert_eq!(x_of(&layout, 7), 70);
    // Logically after the first Hebrew letter is visually left of it
    assert_eq!(x_of(&layout, 5), 60);
    assert_eq!(x_of(&layout, 6), 50);
    assert_eq!(x_of(&layout, 11), 110);
}

#[test]
fn insertion_points_in_visual_order() {
    let layout = lay_out(MIXED, TextOption::new(), 200);
    assert_eq!(
        layout.insertion_points_for_line(0),
        vec![0, 1, 2, 3, 6, 5, 4, 7, 8, 9, 10, 11]
    );
}

#[test]
fn right_to_left_paragraph_reads_from_the_right() {
    let option = TextOption::new().direction(TextDirection::RightToLeft);
    let layout = lay_out("\u{5d0}\u{5d1}", option, 100);
    assert!(layout.is_right_to_left());
    // Left alignment is absolute, the text covers x 0..20
    assert_eq!(x_of(&layout, 0), 20);
    assert_eq!(x_of(&layout, 2), 0);
    assert_eq!(
        layout.x_to_cursor(0, Fixed::from_int(19), CursorPosition::BetweenCharacters),
        0
    );
    assert_eq!(
        layout.x_to_cursor(0, Fixed::from_int(1), CursorPosition::BetweenCharacters),
        2
    );
}

#[test]
fn round_trip_on_latin_text() {
    let layout = lay_out("hello world", TextOption::new(), 200);
    for position in 0..=11 {
        let mut cursor = position;
        let x = layout.cursor_to_x(0, &mut cursor, Edge::Leading);
        assert_eq!(cursor, position);
        assert_eq!(
            layout.x_to_cursor(0, x, CursorPosition::BetweenCharacters),
            position
        );
    }
}
