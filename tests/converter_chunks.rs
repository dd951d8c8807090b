// SPDX-License-Identifier: MIT OR Apache-2.0

//! Streaming conversion across chunk boundaries.

use para_layout::{ConverterFlags, Decoder, Encoder, Encoding};
use proptest::prelude::*;

const UNICODE: [Encoding; 5] = [
    Encoding::Utf8,
    Encoding::Utf16LE,
    Encoding::Utf16BE,
    Encoding::Utf32LE,
    Encoding::Utf32BE,
];

fn decode_in_chunks(decoder: &mut Decoder, bytes: &[u8], sizes: &[usize]) -> Vec<u16> {
    let mut units = Vec::new();
    let mut rest = bytes;
    for &size in sizes.iter().cycle() {
        if rest.is_empty() {
            break;
        }
        let (chunk, tail) = rest.split_at(size.min(rest.len()));
        decoder.decode_into(chunk, &mut units);
        rest = tail;
    }
    units
}

#[test]
fn truncated_sequence_completed_by_next_chunk() {
    let bytes = "\u{20AC}".as_bytes();
    let mut whole = Decoder::new(Encoding::Utf8, ConverterFlags::empty());
    let expected = whole.decode(bytes);

    for split in 1..bytes.len() {
        let mut decoder = Decoder::new(Encoding::Utf8, ConverterFlags::empty());
        let mut units = decoder.decode(&bytes[..split]);
        assert!(units.is_empty());
        units.extend(decoder.decode(&bytes[split..]));
        assert_eq!(units, expected);
        assert!(!decoder.has_error());
    }
}

#[test]
fn stateless_truncated_sequence_is_invalid() {
    let bytes = "\u{20AC}".as_bytes();
    let mut decoder = Decoder::new(Encoding::Utf8, ConverterFlags::STATELESS);
    assert_eq!(decoder.decode(&bytes[..2]), [0xFFFD, 0xFFFD]);
    assert_eq!(decoder.decode(&bytes[2..]), [0xFFFD]);
    assert_eq!(decoder.state().invalid_chars(), 3);
}

#[test]
fn detected_byte_order_across_chunks() {
    let mut encoder = Encoder::new(Encoding::Utf16BE, ConverterFlags::WRITE_BOM);
    let bytes = encoder.encode_str("h\u{e9}llo");
    let data = Encoding::for_data(&bytes, None);
    assert_eq!(data, Some(Encoding::Utf16BE));

    let mut decoder = Decoder::new(Encoding::Utf16, ConverterFlags::empty());
    let units = decode_in_chunks(&mut decoder, &bytes, &[3, 1]);
    assert_eq!(String::from_utf16_lossy(&units), "h\u{e9}llo");
}

proptest! {
    /// Decoding what was encoded gives the text back, however the bytes are split.
    #[test]
    fn round_trip_in_chunks(
        text in "\\PC{0,40}",
        sizes in prop::collection::vec(1..7usize, 1..8),
        encoding in prop::sample::select(UNICODE.to_vec()),
    ) {
        prop_assume!(!text.starts_with('\u{feff}'));
        let mut encoder = Encoder::new(encoding, ConverterFlags::empty());
        let bytes = encoder.encode_str(&text);
        prop_assert!(!encoder.has_error());

        let mut whole = Decoder::new(encoding, ConverterFlags::empty());
        let expected = whole.decode(&bytes);
        let mut decoder = Decoder::new(encoding, ConverterFlags::empty());
        let units = decode_in_chunks(&mut decoder, &bytes, &sizes);

        prop_assert_eq!(&units, &expected);
        prop_assert_eq!(String::from_utf16_lossy(&units), text);
        prop_assert_eq!(decoder.state().remaining(), 0);
    }

    /// Arbitrary bytes decode the same whole or in chunks.
    #[test]
    fn invalid_utf8_in_chunks(
        bytes in prop::collection::vec(any::<u8>(), 0..64),
        sizes in prop::collection::vec(1..5usize, 1..8),
    ) {
        let mut whole = Decoder::new(Encoding::Utf8, ConverterFlags::empty());
        let expected = whole.decode(&bytes);
        let mut decoder = Decoder::new(Encoding::Utf8, ConverterFlags::empty());
        let units = decode_in_chunks(&mut decoder, &bytes, &sizes);
        prop_assert_eq!(units, expected);
        prop_assert_eq!(decoder.state().invalid_chars(), whole.state().invalid_chars());
        prop_assert_eq!(decoder.state().remaining(), whole.state().remaining());
    }

    /// Latin-1 carries every byte value.
    #[test]
    fn latin1_round_trip(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let mut decoder = Decoder::new(Encoding::Latin1, ConverterFlags::empty());
        let units = decoder.decode(&bytes);
        let mut encoder = Encoder::new(Encoding::Latin1, ConverterFlags::empty());
        prop_assert_eq!(encoder.encode(&units), bytes);
        prop_assert!(!encoder.has_error());
    }
}
