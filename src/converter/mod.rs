// SPDX-License-Identifier: MIT OR Apache-2.0

//! Stateful streaming conversion between byte encodings and UTF-16 text
//!
//! A [`Decoder`] or [`Encoder`] may be fed its input in arbitrary chunks. Sequences split across
//! chunk boundaries are kept in the [`ConverterState`] and completed by the next call.

use core::fmt;
use core::str::FromStr;
use std::env;

use crate::Error;

mod latin1;
mod utf16;
mod utf32;
mod utf8;

pub(crate) const REPLACEMENT: u16 = 0xFFFD;
pub(crate) const BYTE_ORDER_MARK: u16 = 0xFEFF;

/// A byte encoding known to the converters
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Encoding {
    Utf8,
    /// UTF-16 with the byte order taken from a byte order mark, host order otherwise
    Utf16,
    Utf16LE,
    Utf16BE,
    /// UTF-32 with the byte order taken from a byte order mark, host order otherwise
    Utf32,
    Utf32LE,
    Utf32BE,
    /// ISO-8859-1
    Latin1,
    /// The encoding of the current locale
    System,
}

impl Encoding {
    const ALL: [Self; 9] = [
        Self::Utf8,
        Self::Utf16,
        Self::Utf16LE,
        Self::Utf16BE,
        Self::Utf32,
        Self::Utf32LE,
        Self::Utf32BE,
        Self::Latin1,
        Self::System,
    ];

    /// Canonical name of the encoding
    pub const fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16LE => "UTF-16LE",
            Self::Utf16BE => "UTF-16BE",
            Self::Utf32 => "UTF-32",
            Self::Utf32LE => "UTF-32LE",
            Self::Utf32BE => "UTF-32BE",
            Self::Latin1 => "ISO-8859-1",
            Self::System => "Locale",
        }
    }

    /// Look up an encoding by name.
    ///
    /// Matching ignores ASCII case as well as `-` and `_`, so `utf8`, `UTF_8` and `Utf-8` all
    /// name [`Encoding::Utf8`]. `latin1` is accepted for [`Encoding::Latin1`].
    pub fn for_name(name: &str) -> Result<Self, Error> {
        if name_matches("latin1", name) {
            return Ok(Self::Latin1);
        }
        Self::ALL
            .into_iter()
            .find(|encoding| name_matches(encoding.name(), name))
            .ok_or_else(|| Error::UnknownEncoding(name.to_string()))
    }

    /// Guess the encoding of `data` from its byte order mark.
    ///
    /// If `expected_first` is given, data starting with that character in UTF-32 or UTF-16 is
    /// recognized too. Returns `None` if the encoding cannot be determined.
    pub fn for_data(data: &[u8], expected_first: Option<char>) -> Option<Self> {
        let expected = expected_first.map(u32::from);

        if let Some(&[a, b, c, d]) = data.get(..4) {
            let quad = [a, b, c, d];
            if quad == [0, 0, 0xFE, 0xFF] {
                return Some(Self::Utf32BE);
            }
            if quad == [0xFF, 0xFE, 0, 0] {
                return Some(Self::Utf32LE);
            }
            if let Some(expected) = expected {
                if u32::from_le_bytes(quad) == expected {
                    return Some(Self::Utf32LE);
                }
                if u32::from_be_bytes(quad) == expected {
                    return Some(Self::Utf32BE);
                }
            }
        }

        if data.starts_with(utf8::BOM) {
            return Some(Self::Utf8);
        }

        if let Some(&[a, b]) = data.get(..2) {
            let pair = [a, b];
            if pair == [0xFE, 0xFF] {
                return Some(Self::Utf16BE);
            }
            if pair == [0xFF, 0xFE] {
                return Some(Self::Utf16LE);
            }
            if let Some(expected) = expected {
                if u32::from(u16::from_le_bytes(pair)) == expected {
                    return Some(Self::Utf16LE);
                }
                if u32::from(u16::from_be_bytes(pair)) == expected {
                    return Some(Self::Utf16BE);
                }
            }
        }

        None
    }

    /// The concrete encoding used for this one, resolving [`Encoding::System`] from the locale
    pub fn resolve(self) -> Self {
        match self {
            Self::System => system_encoding(),
            other => other,
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::for_name(s)
    }
}

fn name_matches(canonical: &str, name: &str) -> bool {
    let strip = |s: &str| {
        s.bytes()
            .filter(|b| *b != b'-' && *b != b'_')
            .map(|b| b.to_ascii_lowercase())
            .collect::<Vec<u8>>()
    };
    strip(canonical) == strip(name)
}

/// Codeset of the locale from `LC_ALL`, `LC_CTYPE` or `LANG`, in that order
fn locale_codeset() -> Option<String> {
    let locale = ["LC_ALL", "LC_CTYPE", "LANG"]
        .into_iter()
        .filter_map(|key| env::var(key).ok())
        .find(|value| !value.is_empty())?;
    let codeset = locale.split_once('.')?.1;
    let codeset = codeset.split_once('@').map_or(codeset, |(codeset, _)| codeset);
    Some(codeset.to_string())
}

fn system_encoding() -> Encoding {
    let encoding = locale_codeset()
        .and_then(|codeset| Encoding::for_name(&codeset).ok())
        .filter(|encoding| *encoding == Encoding::Latin1);
    // Any other locale is treated as UTF-8
    encoding.unwrap_or(Encoding::Utf8)
}

bitflags::bitflags! {
    /// Behavior switches of a converter
    #[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
    pub struct ConverterFlags: u8 {
        /// Every call is complete input, nothing is buffered between calls
        const STATELESS = 1 << 0;
        /// Start the encoded output with a byte order mark
        const WRITE_BOM = 1 << 1;
        /// Substitute NUL instead of U+FFFD for invalid input
        const CONVERT_INVALID_TO_NULL = 1 << 2;
        /// Keep a leading byte order mark as a character instead of removing it
        const CONVERT_INITIAL_BOM = 1 << 3;
    }
}

/// Conversion state carried between calls
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ConverterState {
    pub flags: ConverterFlags,
    invalid_chars: usize,
    /// Bytes of an incomplete sequence waiting for the next call
    pub(crate) pending: Vec<u8>,
    /// High surrogate waiting for its low half
    pub(crate) pending_unit: Option<u16>,
    /// Byte order mark handled
    pub(crate) header_done: bool,
    /// Byte order resolved for the detecting UTF-16 and UTF-32 decoders
    pub(crate) big_endian: Option<bool>,
}

impl ConverterState {
    pub fn new(flags: ConverterFlags) -> Self {
        Self {
            flags,
            ..Self::default()
        }
    }

    /// Number of invalid characters seen since the last [`Self::clear`]
    pub fn invalid_chars(&self) -> usize {
        self.invalid_chars
    }

    /// Number of bytes or code units buffered for the next call
    pub fn remaining(&self) -> usize {
        self.pending.len() + usize::from(self.pending_unit.is_some())
    }

    /// Forget buffered input, counters and byte order, keeping the flags
    pub fn clear(&mut self) {
        *self = Self::new(self.flags);
    }

    /// Stateless conversions start every call afresh
    pub(crate) fn begin(&mut self) {
        if self.is_stateless() {
            self.pending.clear();
            self.pending_unit = None;
            self.header_done = false;
            self.big_endian = None;
        }
    }

    pub(crate) fn is_stateless(&self) -> bool {
        self.flags.contains(ConverterFlags::STATELESS)
    }

    /// Whether a leading byte order mark should still be removed
    pub(crate) fn strips_bom(&self) -> bool {
        !self.header_done && !self.flags.contains(ConverterFlags::CONVERT_INITIAL_BOM)
    }

    /// Whether a byte order mark should be written before the next output
    pub(crate) fn writes_bom(&self) -> bool {
        !self.header_done && self.flags.contains(ConverterFlags::WRITE_BOM)
    }

    /// Count one invalid character and return the unit that replaces it
    pub(crate) fn invalid(&mut self) -> u16 {
        self.invalid_chars += 1;
        if self.flags.contains(ConverterFlags::CONVERT_INVALID_TO_NULL) {
            0
        } else {
            REPLACEMENT
        }
    }
}

/// Byte order of the host, used when a detecting converter finds no byte order mark
pub(crate) const fn host_is_big_endian() -> bool {
    cfg!(target_endian = "big")
}

/// Decodes bytes in some [`Encoding`] to UTF-16 code units
#[derive(Clone, Debug)]
pub struct Decoder {
    encoding: Encoding,
    state: ConverterState,
}

impl Decoder {
    pub fn new(encoding: Encoding, flags: ConverterFlags) -> Self {
        Self {
            encoding: encoding.resolve(),
            state: ConverterState::new(flags),
        }
    }

    /// Create a decoder for the encoding called `name`, see [`Encoding::for_name`]
    pub fn for_name(name: &str, flags: ConverterFlags) -> Result<Self, Error> {
        Ok(Self::new(Encoding::for_name(name)?, flags))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    /// Whether invalid input has been seen since the last reset
    pub fn has_error(&self) -> bool {
        self.state.invalid_chars > 0
    }

    pub fn reset_state(&mut self) {
        self.state.clear();
    }

    /// Decode the next chunk of input
    pub fn decode(&mut self, bytes: &[u8]) -> Vec<u16> {
        let mut out = Vec::with_capacity(bytes.len() + 1);
        self.decode_into(bytes, &mut out);
        out
    }

    /// Decode the next chunk of input, appending to `out`
    pub fn decode_into(&mut self, bytes: &[u8], out: &mut Vec<u16>) {
        let invalid = self.state.invalid_chars;
        self.state.begin();
        match self.encoding {
            Encoding::Utf8 | Encoding::System => utf8::decode(bytes, &mut self.state, out),
            Encoding::Utf16 => utf16::decode(bytes, &mut self.state, None, out),
            Encoding::Utf16LE => utf16::decode(bytes, &mut self.state, Some(false), out),
            Encoding::Utf16BE => utf16::decode(bytes, &mut self.state, Some(true), out),
            Encoding::Utf32 => utf32::decode(bytes, &mut self.state, None, out),
            Encoding::Utf32LE => utf32::decode(bytes, &mut self.state, Some(false), out),
            Encoding::Utf32BE => utf32::decode(bytes, &mut self.state, Some(true), out),
            Encoding::Latin1 => latin1::decode(bytes, out),
        }
        self.report(invalid);
    }

    /// Decode the next chunk of input to a `String`.
    ///
    /// Surrogates left unpaired within this chunk become U+FFFD.
    pub fn decode_to_string(&mut self, bytes: &[u8]) -> String {
        String::from_utf16_lossy(&self.decode(bytes))
    }

    fn report(&self, before: usize) {
        let found = self.state.invalid_chars - before;
        if found > 0 && self.state.is_stateless() {
            log::warn!("{} invalid characters in {} input", found, self.encoding);
        }
    }
}

/// Encodes UTF-16 code units to bytes in some [`Encoding`]
#[derive(Clone, Debug)]
pub struct Encoder {
    encoding: Encoding,
    state: ConverterState,
}

impl Encoder {
    pub fn new(encoding: Encoding, flags: ConverterFlags) -> Self {
        Self {
            encoding: encoding.resolve(),
            state: ConverterState::new(flags),
        }
    }

    /// Create an encoder for the encoding called `name`, see [`Encoding::for_name`]
    pub fn for_name(name: &str, flags: ConverterFlags) -> Result<Self, Error> {
        Ok(Self::new(Encoding::for_name(name)?, flags))
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn state(&self) -> &ConverterState {
        &self.state
    }

    /// Whether unencodable input has been seen since the last reset
    pub fn has_error(&self) -> bool {
        self.state.invalid_chars > 0
    }

    pub fn reset_state(&mut self) {
        self.state.clear();
    }

    /// Encode the next chunk of UTF-16 code units
    pub fn encode(&mut self, units: &[u16]) -> Vec<u8> {
        let mut out = Vec::with_capacity(units.len() * 3 + 4);
        self.encode_into(units, &mut out);
        out
    }

    /// Encode the next chunk of text
    pub fn encode_str(&mut self, text: &str) -> Vec<u8> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.encode(&units)
    }

    /// Encode the next chunk of UTF-16 code units, appending to `out`
    pub fn encode_into(&mut self, units: &[u16], out: &mut Vec<u8>) {
        let invalid = self.state.invalid_chars;
        self.state.begin();
        match self.encoding {
            Encoding::Utf8 | Encoding::System => utf8::encode(units, &mut self.state, out),
            Encoding::Utf16 => utf16::encode(units, &mut self.state, host_is_big_endian(), out),
            Encoding::Utf16LE => utf16::encode(units, &mut self.state, false, out),
            Encoding::Utf16BE => utf16::encode(units, &mut self.state, true, out),
            Encoding::Utf32 => utf32::encode(units, &mut self.state, host_is_big_endian(), out),
            Encoding::Utf32LE => utf32::encode(units, &mut self.state, false, out),
            Encoding::Utf32BE => utf32::encode(units, &mut self.state, true, out),
            Encoding::Latin1 => latin1::encode(units, &mut self.state, out),
        }
        let found = self.state.invalid_chars - invalid;
        if found > 0 && self.state.is_stateless() {
            log::warn!("{} characters not representable in {}", found, self.encoding);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_names() {
        assert_eq!(Encoding::for_name("utf8"), Ok(Encoding::Utf8));
        assert_eq!(Encoding::for_name("UTF_16le"), Ok(Encoding::Utf16LE));
        assert_eq!(Encoding::for_name("iso8859-1"), Ok(Encoding::Latin1));
        assert_eq!(Encoding::for_name("Latin-1"), Ok(Encoding::Latin1));
        assert_eq!(Encoding::for_name("locale"), Ok(Encoding::System));
        assert_eq!(
            "koi8-r".parse::<Encoding>(),
            Err(Error::UnknownEncoding("koi8-r".to_string()))
        );
        for encoding in Encoding::ALL {
            assert_eq!(encoding.name().parse::<Encoding>(), Ok(encoding));
        }
    }

    #[test]
    fn test_for_data() {
        assert_eq!(
            Encoding::for_data(&[0xEF, 0xBB, 0xBF, b'a'], None),
            Some(Encoding::Utf8)
        );
        assert_eq!(
            Encoding::for_data(&[0xFF, 0xFE, 0, 0], None),
            Some(Encoding::Utf32LE)
        );
        assert_eq!(
            Encoding::for_data(&[0xFF, 0xFE, b'a', 0], None),
            Some(Encoding::Utf16LE)
        );
        assert_eq!(Encoding::for_data(&[0xFE, 0xFF], None), Some(Encoding::Utf16BE));
        assert_eq!(
            Encoding::for_data(&[0, 0, 0, b'<'], Some('<')),
            Some(Encoding::Utf32BE)
        );
        assert_eq!(Encoding::for_data(&[b'<', 0], Some('<')), Some(Encoding::Utf16LE));
        assert_eq!(Encoding::for_data(b"<html>", None), None);
        assert_eq!(Encoding::for_data(&[], Some('<')), None);
    }

    #[test]
    fn test_state_clear() {
        let mut decoder = Decoder::new(Encoding::Utf8, ConverterFlags::empty());
        decoder.decode(&[0xFF, 0xE2, 0x82]);
        assert!(decoder.has_error());
        assert_eq!(decoder.state().remaining(), 2);
        decoder.reset_state();
        assert!(!decoder.has_error());
        assert_eq!(decoder.state().remaining(), 0);
        assert_eq!(decoder.state().flags, ConverterFlags::empty());
    }

    #[test]
    fn test_stateless_decode_flags() {
        let mut decoder = Decoder::new(
            Encoding::Utf8,
            ConverterFlags::STATELESS | ConverterFlags::CONVERT_INVALID_TO_NULL,
        );
        assert_eq!(decoder.decode(&[b'a', 0xC0, b'b']), [0x61, 0, 0x62]);
        assert_eq!(decoder.state().invalid_chars(), 1);
    }

    #[test]
    fn test_decode_to_string() {
        let mut decoder = Decoder::new(Encoding::Latin1, ConverterFlags::empty());
        assert_eq!(decoder.decode_to_string(b"caf\xe9"), "café");
    }
}
