// SPDX-License-Identifier: MIT OR Apache-2.0

use unicode_bidi::Level;
use unicode_script::{Script, UnicodeScript};

use crate::{CharAttributes, Fixed, GlyphLayout};

/// The special category of a script item
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ItemKind {
    #[default]
    Text,
    /// A single tab character
    Tab,
    /// A single U+FFFC inline object placeholder
    Object,
    /// A single `\n`, U+2028 or U+2029
    LineOrParagraphSeparator,
}

impl ItemKind {
    /// Classify one code unit
    pub fn of(unit: u16) -> Self {
        match unit {
            0x0009 => Self::Tab,
            0xFFFC => Self::Object,
            0x000A | 0x2028 | 0x2029 => Self::LineOrParagraphSeparator,
            _ => Self::Text,
        }
    }

    /// Tabs and objects are measured by the item width instead of their glyphs
    pub fn is_tab_or_object(self) -> bool {
        matches!(self, Self::Tab | Self::Object)
    }
}

/// A maximal run of text with one bidi level, script and kind; the unit of shaping
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptItem {
    /// Start offset in the paragraph text
    pub position: usize,
    /// Number of code units
    pub len: usize,
    pub level: Level,
    pub kind: ItemKind,
    pub script: Script,
    pub ascent: Fixed,
    pub descent: Fixed,
    pub leading: Fixed,
    /// Total advance of the item, or the resolved width of a tab or object
    pub width: Fixed,
    pub glyphs: GlyphLayout,
    pub(crate) shaped: bool,
}

impl ScriptItem {
    pub fn new(position: usize, len: usize, kind: ItemKind) -> Self {
        Self {
            position,
            len,
            level: Level::ltr(),
            kind,
            script: Script::Common,
            ascent: Fixed::ZERO,
            descent: Fixed::ZERO,
            leading: Fixed::ZERO,
            width: Fixed::ZERO,
            glyphs: GlyphLayout::new(),
            shaped: false,
        }
    }

    /// Offset one past the last code unit
    pub fn end(&self) -> usize {
        self.position + self.len
    }

    pub fn is_rtl(&self) -> bool {
        self.level.is_rtl()
    }

    pub fn is_shaped(&self) -> bool {
        self.shaped
    }

    /// Drop the glyphs so the item is shaped again on next use
    pub fn invalidate_shaping(&mut self) {
        self.glyphs = GlyphLayout::new();
        self.shaped = false;
    }
}

/// Split a paragraph into script items, in logical order.
///
/// A new item starts wherever the bidi level, the script or the [`ItemKind`] changes, and before
/// and after every tab, object and separator. Tabs take the paragraph level `base`. `Common` and
/// `Inherited` characters join the script of the text around them.
pub fn itemize(
    text: &[u16],
    levels: &[Level],
    attributes: &[CharAttributes],
    base: Level,
) -> Vec<ScriptItem> {
    let mut items: Vec<ScriptItem> = Vec::new();
    if text.is_empty() {
        return items;
    }

    let scripts = resolve_scripts(text);

    for (i, &unit) in text.iter().enumerate() {
        let kind = ItemKind::of(unit);
        let level = if kind == ItemKind::Tab {
            base
        } else {
            levels.get(i).copied().unwrap_or(base)
        };
        let script = scripts[i];
        let forced = attributes
            .get(i)
            .is_some_and(|attrs| attrs.contains(CharAttributes::MANDATORY_BREAK));

        if let Some(last) = items.last_mut() {
            let continues = last.kind == kind
                && kind == ItemKind::Text
                && last.level == level
                && last.script == script
                && !forced;
            if continues {
                last.len += 1;
                continue;
            }
        }

        let mut item = ScriptItem::new(i, 1, kind);
        item.level = level;
        item.script = script;
        items.push(item);
    }

    log::debug!("itemized {} code units into {} items", text.len(), items.len());
    items
}

// One script per code unit, with Common and Inherited merged into their neighbours
fn resolve_scripts(text: &[u16]) -> Vec<Script> {
    let mut scripts = Vec::with_capacity(text.len());
    let mut current: Option<Script> = None;
    for result in char::decode_utf16(text.iter().copied()) {
        let (c, units) = match result {
            Ok(c) => (c, c.len_utf16()),
            Err(_) => (char::REPLACEMENT_CHARACTER, 1),
        };
        let script = match c.script() {
            Script::Common | Script::Inherited | Script::Unknown => current,
            script => {
                current = Some(script);
                Some(script)
            }
        };
        scripts.extend(core::iter::repeat_n(script, units));
    }

    // A neutral prefix takes the first real script
    let first = scripts.iter().flatten().next().copied();
    scripts
        .into_iter()
        .map(|script| script.or(first).unwrap_or(Script::Common))
        .collect()
}

/// Index of the item containing `position`, `None` past the end of the text
pub fn find_item(items: &[ScriptItem], position: usize) -> Option<usize> {
    let last = items.last()?;
    if position >= last.end() {
        return None;
    }
    let index = items.partition_point(|item| item.position <= position);
    index.checked_sub(1)
}

#[cfg(test)]
mod test {
    use unicode_bidi::Level;
    use unicode_script::Script;

    use super::{find_item, itemize, ItemKind};
    use crate::{AttributeProvider, UnicodeAttributes};

    fn run(text: &str, levels: &[u8]) -> Vec<(usize, usize, ItemKind, u8)> {
        let units: Vec<u16> = text.encode_utf16().collect();
        let levels: Vec<Level> = if levels.is_empty() {
            vec![Level::ltr(); units.len()]
        } else {
            levels.iter().map(|&n| Level::new(n).unwrap()).collect()
        };
        let attrs = UnicodeAttributes.attributes(&units);
        itemize(&units, &levels, &attrs, Level::ltr())
            .into_iter()
            .map(|item| (item.position, item.len, item.kind, item.level.number()))
            .collect()
    }

    #[test]
    fn test_empty() {
        assert!(run("", &[]).is_empty());
    }

    #[test]
    fn test_plain() {
        assert_eq!(run("hello world", &[]), vec![(0, 11, ItemKind::Text, 0)]);
    }

    #[test]
    fn test_levels() {
        assert_eq!(
            run("ab cd", &[0, 0, 0, 1, 1]),
            vec![(0, 3, ItemKind::Text, 0), (3, 2, ItemKind::Text, 1)]
        );
    }

    #[test]
    fn test_special_characters() {
        assert_eq!(
            run("a\t\tb\u{FFFC}\u{2028}c", &[]),
            vec![
                (0, 1, ItemKind::Text, 0),
                (1, 1, ItemKind::Tab, 0),
                (2, 1, ItemKind::Tab, 0),
                (3, 1, ItemKind::Text, 0),
                (4, 1, ItemKind::Object, 0),
                (5, 1, ItemKind::LineOrParagraphSeparator, 0),
                (6, 1, ItemKind::Text, 0),
            ]
        );
    }

    #[test]
    fn test_tab_takes_base_level() {
        assert_eq!(
            run("\u{5d0}\t\u{5d1}", &[1, 1, 1]),
            vec![
                (0, 1, ItemKind::Text, 1),
                (1, 1, ItemKind::Tab, 0),
                (2, 1, ItemKind::Text, 1),
            ]
        );
    }

    #[test]
    fn test_script_change() {
        let units: Vec<u16> = "(abc αβγ)".encode_utf16().collect();
        let levels = vec![Level::ltr(); units.len()];
        let items = itemize(&units, &levels, &[], Level::ltr());
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].script, Script::Latin);
        assert_eq!(items[0].len, 5);
        assert_eq!(items[1].script, Script::Greek);
    }

    #[test]
    fn test_find_item() {
        let units: Vec<u16> = "ab\tcd".encode_utf16().collect();
        let levels = vec![Level::ltr(); units.len()];
        let items = itemize(&units, &levels, &[], Level::ltr());
        assert_eq!(find_item(&items, 0), Some(0));
        assert_eq!(find_item(&items, 1), Some(0));
        assert_eq!(find_item(&items, 2), Some(1));
        assert_eq!(find_item(&items, 4), Some(2));
        assert_eq!(find_item(&items, 5), None);
        assert_eq!(find_item(&[], 0), None);
    }
}
