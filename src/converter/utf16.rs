// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{host_is_big_endian, ConverterState, BYTE_ORDER_MARK};

/// Byte order of the input, from `fixed` or else detected from its first two bytes
fn byte_order(pair: [u8; 2], state: &mut ConverterState, fixed: Option<bool>) -> bool {
    if let Some(big_endian) = fixed.or(state.big_endian) {
        return big_endian;
    }
    let big_endian = match pair {
        [0xFE, 0xFF] => true,
        [0xFF, 0xFE] => false,
        _ => host_is_big_endian(),
    };
    state.big_endian = Some(big_endian);
    big_endian
}

fn push_unit(pair: [u8; 2], state: &mut ConverterState, fixed: Option<bool>, out: &mut Vec<u16>) {
    let unit = if byte_order(pair, state, fixed) {
        u16::from_be_bytes(pair)
    } else {
        u16::from_le_bytes(pair)
    };
    let strip = state.strips_bom() && unit == BYTE_ORDER_MARK;
    state.header_done = true;
    if !strip {
        out.push(unit);
    }
}

/// Decode UTF-16 in the byte order `fixed`, or detect it when `None`
pub(super) fn decode(
    mut bytes: &[u8],
    state: &mut ConverterState,
    fixed: Option<bool>,
    out: &mut Vec<u16>,
) {
    if let Some(&first) = state.pending.first() {
        let Some((&second, rest)) = bytes.split_first() else {
            return;
        };
        state.pending.clear();
        push_unit([first, second], state, fixed, out);
        bytes = rest;
    }

    let mut pairs = bytes.chunks_exact(2);
    for pair in &mut pairs {
        if let Ok(pair) = <[u8; 2]>::try_from(pair) {
            push_unit(pair, state, fixed, out);
        }
    }

    if let &[odd] = pairs.remainder() {
        if state.is_stateless() {
            let unit = state.invalid();
            out.push(unit);
        } else {
            state.pending.push(odd);
        }
    }
}

pub(super) fn encode(units: &[u16], state: &mut ConverterState, big_endian: bool, out: &mut Vec<u8>) {
    let bytes = |unit: u16| {
        if big_endian {
            unit.to_be_bytes()
        } else {
            unit.to_le_bytes()
        }
    };
    if state.writes_bom() {
        out.extend_from_slice(&bytes(BYTE_ORDER_MARK));
    }
    state.header_done = true;
    for &unit in units {
        out.extend_from_slice(&bytes(unit));
    }
}
