// SPDX-License-Identifier: MIT OR Apache-2.0

//! # Para Layout
//!
//! This library lays out a paragraph of text into lines. It segments the text into script items
//! by bidi level and script, breaks those items into lines of a given width, and answers cursor
//! and hit testing queries on the result. Glyph shaping and drawing are left to the caller
//! through the [Shaper] and [Renderer] traits, and a [MonospaceShaper] is provided for testing.
//!
//! Text may be decoded from UTF-8, UTF-16, UTF-32 or Latin-1 in chunks with a [Decoder].
//!
//! ```
//! use para_layout::{Edge, Fixed, MonospaceShaper, TextLayout};
//!
//! // A shaper maps text to glyphs, here every character is 10 units wide
//! let mut shaper = MonospaceShaper::default();
//!
//! let mut layout = TextLayout::new("The quick brown fox");
//!
//! // Lay out lines of 90 units until the text runs out
//! layout.begin_layout();
//! let mut y = Fixed::ZERO;
//! while let Some(mut line) = layout.create_line(&mut shaper) {
//!     line.set_line_width(&mut shaper, Fixed::from_int(90));
//!     line.set_position(Fixed::ZERO, y);
//!     y += line.height();
//! }
//! layout.end_layout(&mut shaper);
//!
//! assert_eq!(layout.line_count(), 2);
//!
//! // Find the x position of the cursor before "brown"
//! let mut cursor = 10;
//! let x = layout.cursor_to_x(1, &mut cursor, Edge::Leading);
//! assert_eq!(x, Fixed::ZERO);
//! ```

pub use self::attrs::*;
mod attrs;

pub use self::bidi_para::*;
mod bidi_para;

pub use self::converter::*;
mod converter;

pub use self::cursor::*;
mod cursor;

pub use self::error::*;
mod error;

pub use self::fixed::*;
mod fixed;

pub use self::itemize::*;
mod itemize;

mod justify;

pub use self::layout::*;
mod layout;

pub use self::line::*;
mod line;

mod line_break;

pub use self::option::*;
mod option;

pub use self::render::*;
mod render;

pub use self::shape::*;
mod shape;
