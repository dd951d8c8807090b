// SPDX-License-Identifier: MIT OR Apache-2.0

use super::utf8::{combine_surrogates, is_high_surrogate, is_low_surrogate};
use super::{host_is_big_endian, ConverterState, BYTE_ORDER_MARK};

fn byte_order(quad: [u8; 4], state: &mut ConverterState, fixed: Option<bool>) -> bool {
    if let Some(big_endian) = fixed.or(state.big_endian) {
        return big_endian;
    }
    let big_endian = match quad {
        [0, 0, 0xFE, 0xFF] => true,
        [0xFF, 0xFE, 0, 0] => false,
        _ => host_is_big_endian(),
    };
    state.big_endian = Some(big_endian);
    big_endian
}

fn push_code_point(
    quad: [u8; 4],
    state: &mut ConverterState,
    fixed: Option<bool>,
    out: &mut Vec<u16>,
) {
    let code = if byte_order(quad, state, fixed) {
        u32::from_be_bytes(quad)
    } else {
        u32::from_le_bytes(quad)
    };
    let strip = state.strips_bom() && code == u32::from(BYTE_ORDER_MARK);
    state.header_done = true;
    if strip {
        return;
    }
    match char::from_u32(code) {
        Some(c) => out.extend_from_slice(c.encode_utf16(&mut [0; 2])),
        None => {
            let unit = state.invalid();
            out.push(unit);
        }
    }
}

/// Decode UTF-32 in the byte order `fixed`, or detect it when `None`
pub(super) fn decode(
    mut bytes: &[u8],
    state: &mut ConverterState,
    fixed: Option<bool>,
    out: &mut Vec<u16>,
) {
    if !state.pending.is_empty() {
        let needed = 4 - state.pending.len();
        if bytes.len() < needed {
            state.pending.extend_from_slice(bytes);
            return;
        }
        let mut quad = [0; 4];
        let (buffered, rest) = quad.split_at_mut(state.pending.len());
        buffered.copy_from_slice(&state.pending);
        rest.copy_from_slice(&bytes[..needed]);
        state.pending.clear();
        push_code_point(quad, state, fixed, out);
        bytes = &bytes[needed..];
    }

    let mut quads = bytes.chunks_exact(4);
    for quad in &mut quads {
        if let Ok(quad) = <[u8; 4]>::try_from(quad) {
            push_code_point(quad, state, fixed, out);
        }
    }

    let rest = quads.remainder();
    if !rest.is_empty() {
        if state.is_stateless() {
            let unit = state.invalid();
            out.push(unit);
        } else {
            state.pending.extend_from_slice(rest);
        }
    }
}

pub(super) fn encode(
    mut units: &[u16],
    state: &mut ConverterState,
    big_endian: bool,
    out: &mut Vec<u8>,
) {
    if units.is_empty() {
        return;
    }
    let mut push = |code: u32| {
        if big_endian {
            out.extend_from_slice(&code.to_be_bytes());
        } else {
            out.extend_from_slice(&code.to_le_bytes());
        }
    };

    if state.writes_bom() {
        push(BYTE_ORDER_MARK.into());
    }
    state.header_done = true;

    if let Some(high) = state.pending_unit.take() {
        match units.first() {
            Some(&low) if is_low_surrogate(low) => {
                push(combine_surrogates(high, low));
                units = &units[1..];
            }
            _ => push(state.invalid().into()),
        }
    }

    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        i += 1;
        if is_high_surrogate(unit) {
            match units.get(i) {
                Some(&low) if is_low_surrogate(low) => {
                    push(combine_surrogates(unit, low));
                    i += 1;
                }
                None if !state.is_stateless() => state.pending_unit = Some(unit),
                _ => push(state.invalid().into()),
            }
        } else if is_low_surrogate(unit) {
            push(state.invalid().into());
        } else {
            push(unit.into());
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{ConverterFlags, Decoder, Encoder, Encoding};

    #[test]
    fn test_decode_chunks() {
        let bytes = [0, 0, 0xFE, 0xFF, 0, 0x01, 0xF6, 0x00, 0, 0, 0, b'a'];
        let mut decoder = Decoder::new(Encoding::Utf32, ConverterFlags::empty());
        let mut units = decoder.decode(&bytes[..3]);
        assert!(units.is_empty());
        assert_eq!(decoder.state().remaining(), 3);
        units.extend(decoder.decode(&bytes[3..7]));
        units.extend(decoder.decode(&bytes[7..]));
        assert_eq!(units, "\u{1F600}a".encode_utf16().collect::<Vec<u16>>());
    }

    #[test]
    fn test_invalid_code_points() {
        let mut decoder = Decoder::new(Encoding::Utf32LE, ConverterFlags::empty());
        assert_eq!(
            decoder.decode(&[0x00, 0xD8, 0, 0, 0, 0, 0x11, 0, b'a', 0, 0, 0]),
            [0xFFFD, 0xFFFD, 0x61]
        );
        assert_eq!(decoder.state().invalid_chars(), 2);

        let mut decoder = Decoder::new(Encoding::Utf32BE, ConverterFlags::STATELESS);
        assert_eq!(decoder.decode(&[0, 0, 0, b'a', 0]), [0x61, 0xFFFD]);
    }

    #[test]
    fn test_encode() {
        let mut encoder = Encoder::new(Encoding::Utf32LE, ConverterFlags::WRITE_BOM);
        let units: Vec<u16> = "\u{1F600}".encode_utf16().collect();
        assert_eq!(encoder.encode(&units[..1]), [0xFF, 0xFE, 0, 0]);
        assert_eq!(encoder.encode(&units[1..]), [0x00, 0xF6, 0x01, 0x00]);
        assert!(!encoder.has_error());
    }
}
