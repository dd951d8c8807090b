// SPDX-License-Identifier: MIT OR Apache-2.0

use super::ConverterState;

pub(super) fn decode(bytes: &[u8], out: &mut Vec<u16>) {
    out.extend(bytes.iter().map(|&byte| u16::from(byte)));
}

/// Encode each code unit to one byte, replacing units above U+00FF with `?` or NUL
pub(super) fn encode(units: &[u16], state: &mut ConverterState, out: &mut Vec<u8>) {
    out.extend(units.iter().map(|&unit| {
        u8::try_from(unit).unwrap_or_else(|_| match state.invalid() {
            0 => 0,
            _ => b'?',
        })
    }));
}

#[cfg(test)]
mod test {
    use crate::{ConverterFlags, Decoder, Encoder, Encoding};

    #[test]
    fn test_round_trip() {
        let mut encoder = Encoder::new(Encoding::Latin1, ConverterFlags::empty());
        let bytes = encoder.encode_str("naïve ©");
        assert_eq!(bytes, b"na\xefve \xa9");
        let mut decoder = Decoder::new(Encoding::Latin1, ConverterFlags::empty());
        assert_eq!(decoder.decode_to_string(&bytes), "naïve ©");
    }

    #[test]
    fn test_unrepresentable() {
        let mut encoder = Encoder::new(Encoding::Latin1, ConverterFlags::empty());
        assert_eq!(encoder.encode_str("a\u{20AC}b"), b"a?b");
        assert_eq!(encoder.state().invalid_chars(), 1);

        let mut encoder = Encoder::new(Encoding::Latin1, ConverterFlags::CONVERT_INVALID_TO_NULL);
        // Each half of a surrogate pair is replaced
        assert_eq!(encoder.encode_str("\u{1F600}"), [0, 0]);
        assert_eq!(encoder.state().invalid_chars(), 2);
    }
}
