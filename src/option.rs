// SPDX-License-Identifier: MIT OR Apache-2.0

use bitflags::bitflags;

use crate::Fixed;

/// How text is wrapped when it does not fit the line width
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum WrapMode {
    /// Never wrap, lines only end at separators
    NoWrap,
    /// Wrap at word boundaries
    #[default]
    WordWrap,
    /// Wrap at any grapheme boundary
    WrapAnywhere,
    /// Wrap at word boundaries, falling back to any grapheme boundary when a word does not fit
    WrapAtWordBoundaryOrAnywhere,
    /// Like [`WrapMode::NoWrap`], for callers that insert their own separators
    ManualWrap,
}

impl WrapMode {
    /// Does this mode ignore the line width
    pub fn is_manual(self) -> bool {
        matches!(self, Self::NoWrap | Self::ManualWrap)
    }
}

/// Horizontal alignment of lines
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Align {
    #[default]
    Left,
    Right,
    Center,
    Justify,
}

/// Base direction of the paragraph
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum TextDirection {
    /// Taken from the first strong character
    #[default]
    Auto,
    LeftToRight,
    RightToLeft,
}

/// How a tab stop aligns the text following it
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TabKind {
    Left,
    Right,
    Center,
    /// Align on the first occurrence of this character
    Delimiter(char),
}

/// A tab stop at `position` from the start of the line
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Tab {
    pub position: Fixed,
    pub kind: TabKind,
}

impl Tab {
    pub fn new(position: Fixed, kind: TabKind) -> Self {
        Self { position, kind }
    }
}

bitflags! {
    /// Layout behaviour switches
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct LayoutFlags: u8 {
        /// Count trailing whitespace in the line's natural width
        const INCLUDE_TRAILING_SPACES = 1 << 0;
        /// Give line and paragraph separators a visible glyph
        const SHOW_LINE_AND_PARAGRAPH_SEPARATORS = 1 << 1;
    }
}

/// How left/right cursor movement treats bidirectional text
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum CursorMoveStyle {
    /// Left and right follow the logical order in the direction of each run
    #[default]
    Logical,
    /// Left and right follow the on-screen order
    Visual,
}

/// Options for laying out a paragraph
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct TextOption {
    pub wrap_mode: WrapMode,
    /// `None` leaves lines unaligned and disables tab stops
    pub alignment: Option<Align>,
    pub direction: TextDirection,
    pub flags: LayoutFlags,
    pub tabs: Vec<Tab>,
    /// Distance between default tab stops, a non-positive value means 80
    pub tab_stop_distance: Fixed,
    pub cursor_move_style: CursorMoveStyle,
}

impl Default for TextOption {
    fn default() -> Self {
        Self::new()
    }
}

impl TextOption {
    /// Default tab stop distance in whole units
    pub const DEFAULT_TAB_STOP: i32 = 80;

    /// Create the default options: word wrap, left aligned, direction from text
    pub fn new() -> Self {
        Self {
            wrap_mode: WrapMode::WordWrap,
            alignment: Some(Align::Left),
            direction: TextDirection::Auto,
            flags: LayoutFlags::empty(),
            tabs: Vec::new(),
            tab_stop_distance: Fixed::from_int(Self::DEFAULT_TAB_STOP),
            cursor_move_style: CursorMoveStyle::Logical,
        }
    }

    /// Set [`WrapMode`]
    pub fn wrap_mode(mut self, wrap_mode: WrapMode) -> Self {
        self.wrap_mode = wrap_mode;
        self
    }

    /// Set alignment
    pub fn alignment(mut self, alignment: Option<Align>) -> Self {
        self.alignment = alignment;
        self
    }

    /// Set [`TextDirection`]
    pub fn direction(mut self, direction: TextDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Set [`LayoutFlags`]
    pub fn flags(mut self, flags: LayoutFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set explicit tab stops, sorted by position
    pub fn tabs(mut self, mut tabs: Vec<Tab>) -> Self {
        tabs.sort_by_key(|tab| tab.position);
        self.tabs = tabs;
        self
    }

    /// Set the distance between default tab stops
    pub fn tab_stop_distance(mut self, distance: Fixed) -> Self {
        self.tab_stop_distance = distance;
        self
    }

    /// Set [`CursorMoveStyle`]
    pub fn cursor_move_style(mut self, style: CursorMoveStyle) -> Self {
        self.cursor_move_style = style;
        self
    }

    pub fn include_trailing_spaces(&self) -> bool {
        self.flags.contains(LayoutFlags::INCLUDE_TRAILING_SPACES)
    }

    pub fn show_separators(&self) -> bool {
        self.flags
            .contains(LayoutFlags::SHOW_LINE_AND_PARAGRAPH_SEPARATORS)
    }

    pub(crate) fn effective_tab_stop(&self) -> Fixed {
        if self.tab_stop_distance.is_positive() {
            self.tab_stop_distance
        } else {
            Fixed::from_int(Self::DEFAULT_TAB_STOP)
        }
    }
}
