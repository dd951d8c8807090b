// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{ConverterState, BYTE_ORDER_MARK};

pub(super) const BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Outcome of reading one sequence from the start of a byte slice
#[derive(Debug, Eq, PartialEq)]
enum Sequence {
    /// A code point and the number of bytes it took
    Char(u32, usize),
    /// The lead byte starts no valid sequence, resume after it
    Invalid,
    /// Valid so far, more bytes are needed
    Incomplete,
}

fn next_sequence(bytes: &[u8]) -> Sequence {
    let Some(&lead) = bytes.first() else {
        return Sequence::Incomplete;
    };
    // Allowed range of the second byte rules out overlong forms, surrogates and values past U+10FFFF
    let (len, second) = match lead {
        0x00..=0x7F => return Sequence::Char(lead.into(), 1),
        0xC2..=0xDF => (2, 0x80..=0xBF),
        0xE0 => (3, 0xA0..=0xBF),
        0xE1..=0xEC | 0xEE..=0xEF => (3, 0x80..=0xBF),
        0xED => (3, 0x80..=0x9F),
        0xF0 => (4, 0x90..=0xBF),
        0xF1..=0xF3 => (4, 0x80..=0xBF),
        0xF4 => (4, 0x80..=0x8F),
        _ => return Sequence::Invalid,
    };

    let mut code = u32::from(lead & (0x7F >> len));
    for (i, &byte) in bytes.iter().enumerate().take(len).skip(1) {
        let valid = if i == 1 {
            second.contains(&byte)
        } else {
            (0x80..=0xBF).contains(&byte)
        };
        if !valid {
            return Sequence::Invalid;
        }
        code = (code << 6) | u32::from(byte & 0x3F);
    }

    if bytes.len() < len {
        Sequence::Incomplete
    } else {
        Sequence::Char(code, len)
    }
}

fn push_code_point(code: u32, out: &mut Vec<u16>) {
    if let Some(c) = char::from_u32(code) {
        out.extend_from_slice(c.encode_utf16(&mut [0; 2]));
    }
}

fn push_utf8(code: u32, out: &mut Vec<u8>) {
    if let Some(c) = char::from_u32(code) {
        out.extend_from_slice(c.encode_utf8(&mut [0; 4]).as_bytes());
    }
}

/// Append a decoded code point, dropping a byte order mark at the very start of the input
fn emit(code: u32, state: &mut ConverterState, out: &mut Vec<u16>) {
    let strip = state.strips_bom() && code == u32::from(BYTE_ORDER_MARK);
    state.header_done = true;
    if !strip {
        push_code_point(code, out);
    }
}

fn emit_invalid(state: &mut ConverterState, out: &mut Vec<u16>) {
    let unit = state.invalid();
    out.push(unit);
    state.header_done = true;
}

pub(super) fn decode(mut bytes: &[u8], state: &mut ConverterState, out: &mut Vec<u16>) {
    if bytes.is_empty() {
        return;
    }

    if !state.is_stateless() {
        // Finish the sequence left over from the previous call first
        while !state.pending.is_empty() {
            let mut buffer = state.pending.clone();
            let taken = bytes.len().min(4 - buffer.len());
            buffer.extend_from_slice(&bytes[..taken]);
            match next_sequence(&buffer) {
                Sequence::Incomplete => {
                    state.pending = buffer;
                    return;
                }
                Sequence::Invalid => {
                    emit_invalid(state, out);
                    state.pending.remove(0);
                }
                Sequence::Char(code, len) => {
                    let buffered = state.pending.len();
                    if len >= buffered {
                        bytes = &bytes[len - buffered..];
                        state.pending.clear();
                    } else {
                        state.pending.drain(..len);
                    }
                    emit(code, state, out);
                }
            }
        }
    }

    let mut pos = 0;
    while pos < bytes.len() {
        // ASCII runs skip the sequence decoder
        let ascii = bytes[pos..].iter().take_while(|byte| byte.is_ascii()).count();
        if ascii > 0 {
            out.extend(bytes[pos..pos + ascii].iter().map(|&byte| u16::from(byte)));
            state.header_done = true;
            pos += ascii;
            continue;
        }

        match next_sequence(&bytes[pos..]) {
            Sequence::Char(code, len) => {
                emit(code, state, out);
                pos += len;
            }
            Sequence::Invalid => {
                emit_invalid(state, out);
                pos += 1;
            }
            Sequence::Incomplete => {
                if state.is_stateless() {
                    // Every byte of an unterminated sequence is an error of its own
                    for _ in pos..bytes.len() {
                        emit_invalid(state, out);
                    }
                } else {
                    state.pending = bytes[pos..].to_vec();
                }
                break;
            }
        }
    }
}

pub(super) fn encode(mut units: &[u16], state: &mut ConverterState, out: &mut Vec<u8>) {
    if units.is_empty() {
        return;
    }

    if state.writes_bom() {
        out.extend_from_slice(BOM);
    }
    state.header_done = true;

    if let Some(high) = state.pending_unit.take() {
        match units.first() {
            Some(&low) if is_low_surrogate(low) => {
                push_utf8(combine_surrogates(high, low), out);
                units = &units[1..];
            }
            _ => {
                let unit = state.invalid();
                push_utf8(unit.into(), out);
            }
        }
    }

    let mut i = 0;
    while i < units.len() {
        let unit = units[i];
        i += 1;
        if is_high_surrogate(unit) {
            match units.get(i) {
                Some(&low) if is_low_surrogate(low) => {
                    push_utf8(combine_surrogates(unit, low), out);
                    i += 1;
                }
                None if !state.is_stateless() => {
                    state.pending_unit = Some(unit);
                }
                _ => {
                    let unit = state.invalid();
                    push_utf8(unit.into(), out);
                }
            }
        } else if is_low_surrogate(unit) {
            let unit = state.invalid();
            push_utf8(unit.into(), out);
        } else {
            push_utf8(unit.into(), out);
        }
    }
}

pub(super) fn is_high_surrogate(unit: u16) -> bool {
    (0xD800..0xDC00).contains(&unit)
}

pub(super) fn is_low_surrogate(unit: u16) -> bool {
    (0xDC00..0xE000).contains(&unit)
}

pub(super) fn combine_surrogates(high: u16, low: u16) -> u32 {
    0x10000 + ((u32::from(high) - 0xD800) << 10) + (u32::from(low) - 0xDC00)
}
