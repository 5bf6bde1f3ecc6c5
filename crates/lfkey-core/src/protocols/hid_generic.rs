//! Variable-length HID Wiegand scan used by the format analyzer.
//!
//! Same physical framing as H10301 (raw 0x1D preamble, pair-coded body),
//! but the logical payload may be 26 to 37 bits. The format length is
//! recovered by locating the second logical one in the header: everything
//! after it is payload, so its position pins the bit count. Frames whose
//! scan finds no second one, or an unsupported length, are invalid.

use crate::bits;
use crate::protocols::Codec;

const PREAMBLE: u8 = 0x1D;
const PAIR_START: usize = 8;
const TOTAL_BITS: usize = 96;
const MIN_FORMAT_BITS: usize = 26;
const MAX_FORMAT_BITS: usize = 37;

/// Locate the second logical one in the pair-coded stream and derive the
/// format length from its position. `None` if the pairs are malformed, the
/// header never produces two ones, or the implied length is unsupported.
pub fn find_format_bits(encoded: &[u8]) -> Option<usize> {
    let mut ones = 0;
    let mut position = PAIR_START;
    while position + 2 <= TOTAL_BITS {
        let bit = match bits::get_bits(encoded, position, 2) {
            0b01 => false,
            0b10 => true,
            _ => return None,
        };
        if bit {
            ones += 1;
            if ones == 2 {
                let format_bits = (TOTAL_BITS - position - 2) / 2;
                if (MIN_FORMAT_BITS..=MAX_FORMAT_BITS).contains(&format_bits) {
                    return Some(format_bits);
                }
                return None;
            }
        }
        position += 2;
    }
    None
}

/// Generic HID frame: decoded form is the bit count followed by the
/// payload bits, MSB-aligned into five bytes.
pub struct HidGeneric;

impl Codec for HidGeneric {
    const ENCODED_SIZE: usize = 12;
    const DECODED_SIZE: usize = 6;

    fn encode(decoded: &[u8], encoded: &mut [u8]) {
        assert!(decoded.len() >= Self::DECODED_SIZE, "payload too short");
        assert!(encoded.len() >= Self::ENCODED_SIZE, "frame buffer too short");
        let format_bits = usize::from(decoded[0]);
        assert!(
            (MIN_FORMAT_BITS..=MAX_FORMAT_BITS).contains(&format_bits),
            "unsupported Wiegand length"
        );
        encoded[..Self::ENCODED_SIZE].fill(0);
        bits::set_bits(encoded, 0, u32::from(PREAMBLE), 8);

        // Header: zeros up to the OEM terminator, zeros again up to the
        // length-marking second one, as in the fixed 26-bit layout.
        let second_one = TOTAL_BITS - 2 - format_bits * 2;
        let first_one = 22.min(second_one - 2);
        let mut position = PAIR_START;
        while position < second_one {
            let bit = position == first_one;
            bits::set_bit(encoded, position, bit);
            bits::set_bit(encoded, position + 1, !bit);
            position += 2;
        }
        bits::set_bit(encoded, second_one, true);
        bits::set_bit(encoded, second_one + 1, false);

        position = second_one + 2;
        for i in 0..format_bits {
            let bit = bits::get_bit(&decoded[1..], i);
            bits::set_bit(encoded, position, bit);
            bits::set_bit(encoded, position + 1, !bit);
            position += 2;
        }
    }

    fn decode(encoded: &[u8], decoded: &mut [u8]) {
        assert!(encoded.len() >= Self::ENCODED_SIZE, "frame buffer too short");
        assert!(decoded.len() >= Self::DECODED_SIZE, "payload too short");
        decoded[..Self::DECODED_SIZE].fill(0);
        let Some(format_bits) = find_format_bits(encoded) else {
            return;
        };
        decoded[0] = format_bits as u8;
        let start = TOTAL_BITS - format_bits * 2;
        for i in 0..format_bits {
            let bit = bits::get_bit(encoded, start + i * 2);
            bits::set_bit(&mut decoded[1..], i, bit);
        }
    }

    fn can_be_decoded(encoded: &[u8]) -> bool {
        assert!(encoded.len() >= Self::ENCODED_SIZE, "frame buffer too short");
        encoded[0] == PREAMBLE && find_format_bits(encoded).is_some()
    }
}
