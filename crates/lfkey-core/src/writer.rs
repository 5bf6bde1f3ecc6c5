//! T55xx tag programming.
//!
//! A block write is a start gap, a two-bit page opcode, a lock bit, 32
//! data bits MSB first and a three-bit block address, all expressed as
//! timed carrier stretches with field-off gaps between bits, followed by
//! the tag's internal programming time and a reset. Block 0 receives the
//! per-protocol configuration word that selects the modulation and bit
//! rate the tag will use afterwards.
//!
//! Bit timing is jitter-sensitive, so preemption is suppressed for each
//! block write; the sequence yields normally between blocks.

use thiserror::Error;

use crate::bits;
use crate::hal::RfFrontend;
use crate::protocols::Codec;
use crate::protocols::em4100::Em4100;
use crate::protocols::h10301::HidH10301;
use crate::protocols::indala40134::Indala40134;
use crate::protocols::ioprox::IoProxXsf;

/// T55xx timing constants, in 125 kHz field clocks.
pub mod t55xx {
    pub const WAIT_TIME: u32 = 400;
    pub const START_GAP: u32 = 30;
    pub const WRITE_GAP: u32 = 18;
    pub const DATA_0: u32 = 24;
    pub const DATA_1: u32 = 56;
    pub const PROGRAM: u32 = 700;

    /// Configuration word fields (block 0).
    pub const MODULATION_MANCHESTER: u32 = 0x0000_8000;
    pub const MODULATION_FSK2A: u32 = 0x0000_7000;
    pub const MODULATION_PSK1: u32 = 0x0000_1000;
    pub const BITRATE_RF_32: u32 = 0x0008_0000;
    pub const BITRATE_RF_50: u32 = 0x0010_0000;
    pub const BITRATE_RF_64: u32 = 0x0014_0000;
    pub const MAXBLOCK_SHIFT: u32 = 5;
}

/// Verification outcomes of a write attempt (driven by the worker's
/// sequencing loop).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    #[error("tag already carries this credential")]
    SameKey,
    #[error("no tag detected after write")]
    NoDetect,
    #[error("tag read back a different credential")]
    CannotWrite,
}

/// Microseconds per field clock at 125 kHz.
const US_PER_CLOCK: u32 = 8;

/// T55xx write sequencer. Owns no state; every call runs one complete,
/// precisely-timed sequence against the front-end.
#[derive(Debug, Default)]
pub struct Writer;

impl Writer {
    pub fn new() -> Self {
        Self
    }

    /// Program an EM4100 credential: config plus two data blocks.
    pub fn write_em(&self, rf: &mut impl RfFrontend, data: &[u8]) {
        let mut frame = [0u8; 8];
        Em4100::encode(data, &mut frame);
        let config = t55xx::MODULATION_MANCHESTER
            | t55xx::BITRATE_RF_64
            | (2 << t55xx::MAXBLOCK_SHIFT);
        self.write_blocks(
            rf,
            config,
            &[bits::get_bits(&frame, 0, 32), bits::get_bits(&frame, 32, 32)],
        );
    }

    /// Program an HID H10301 credential: config plus three data blocks.
    pub fn write_hid(&self, rf: &mut impl RfFrontend, data: &[u8]) {
        let mut frame = [0u8; 12];
        HidH10301::encode(data, &mut frame);
        let config =
            t55xx::MODULATION_FSK2A | t55xx::BITRATE_RF_50 | (3 << t55xx::MAXBLOCK_SHIFT);
        self.write_blocks(
            rf,
            config,
            &[
                bits::get_bits(&frame, 0, 32),
                bits::get_bits(&frame, 32, 32),
                bits::get_bits(&frame, 64, 32),
            ],
        );
    }

    /// Program an Indala 40134 credential: config plus two data blocks.
    pub fn write_indala(&self, rf: &mut impl RfFrontend, data: &[u8]) {
        let mut frame = [0u8; 8];
        Indala40134::encode(data, &mut frame);
        let config =
            t55xx::MODULATION_PSK1 | t55xx::BITRATE_RF_32 | (2 << t55xx::MAXBLOCK_SHIFT);
        self.write_blocks(
            rf,
            config,
            &[bits::get_bits(&frame, 0, 32), bits::get_bits(&frame, 32, 32)],
        );
    }

    /// Program an IoProx credential: config plus two data blocks.
    pub fn write_ioprox(&self, rf: &mut impl RfFrontend, data: &[u8]) {
        let mut frame = [0u8; 8];
        IoProxXsf::encode(data, &mut frame);
        let config =
            t55xx::MODULATION_FSK2A | t55xx::BITRATE_RF_64 | (2 << t55xx::MAXBLOCK_SHIFT);
        self.write_blocks(
            rf,
            config,
            &[bits::get_bits(&frame, 0, 32), bits::get_bits(&frame, 32, 32)],
        );
    }

    fn write_blocks(&self, rf: &mut impl RfFrontend, config: u32, blocks: &[u32]) {
        rf.set_field(true);
        self.write_block(rf, 0, 0, false, config);
        for (index, data) in blocks.iter().enumerate() {
            self.write_block(rf, 0, (index + 1) as u8, false, *data);
        }
        self.write_reset(rf);
        rf.set_field(false);
    }

    fn write_block(&self, rf: &mut impl RfFrontend, page: u8, block: u8, lock: bool, data: u32) {
        // Jitter inside one block corrupts the write.
        rf.interrupts_disable();
        rf.delay_us(t55xx::WAIT_TIME * US_PER_CLOCK);
        self.write_gap(rf, t55xx::START_GAP);

        // Page opcode.
        self.write_bit(rf, true);
        self.write_bit(rf, page != 0);
        self.write_bit(rf, lock);
        for i in 0..32 {
            self.write_bit(rf, (data >> (31 - i)) & 1 != 0);
        }
        for i in 0..3 {
            self.write_bit(rf, (block >> (2 - i)) & 1 != 0);
        }

        rf.delay_us(t55xx::PROGRAM * US_PER_CLOCK);
        rf.interrupts_enable();
    }

    fn write_reset(&self, rf: &mut impl RfFrontend) {
        rf.delay_us(t55xx::WAIT_TIME * US_PER_CLOCK);
        self.write_gap(rf, t55xx::START_GAP);
        self.write_bit(rf, true);
        self.write_bit(rf, false);
    }

    fn write_bit(&self, rf: &mut impl RfFrontend, value: bool) {
        let clocks = if value { t55xx::DATA_1 } else { t55xx::DATA_0 };
        rf.delay_us(clocks * US_PER_CLOCK);
        self.write_gap(rf, t55xx::WRITE_GAP);
    }

    fn write_gap(&self, rf: &mut impl RfFrontend, clocks: u32) {
        rf.set_field(false);
        rf.delay_us(clocks * US_PER_CLOCK);
        rf.set_field(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Records the field gating and delays a write produces.
    #[derive(Default)]
    struct TraceFrontend {
        field_gaps: u32,
        delays_us: Vec<u32>,
        irq_depth: i32,
        max_irq_depth: i32,
    }

    impl RfFrontend for TraceFrontend {
        fn configure(&mut self, _frequency_hz: u32, _duty_cycle: f32) {}
        fn start_receive(&mut self) {}
        fn start_transmit(&mut self) {}
        fn stop(&mut self) {}
        fn set_field(&mut self, on: bool) {
            if !on {
                self.field_gaps += 1;
            }
        }
        fn delay_us(&mut self, us: u32) {
            self.delays_us.push(us);
        }
        fn interrupts_disable(&mut self) {
            self.irq_depth += 1;
            self.max_irq_depth = self.max_irq_depth.max(self.irq_depth);
        }
        fn interrupts_enable(&mut self) {
            self.irq_depth -= 1;
        }
    }

    #[test]
    fn em_write_sequences_three_blocks() {
        let mut rf = TraceFrontend::default();
        Writer::new().write_em(&mut rf, &[0x12, 0x34, 0x56, 0x78, 0x9A]);

        // Interrupts balanced, never nested across block boundaries.
        assert_eq!(rf.irq_depth, 0);
        assert_eq!(rf.max_irq_depth, 1);

        // Three blocks of 38 bits each (opcode, lock, data, address), plus
        // reset: every bit opens one write gap, every block and the reset
        // open a start gap.
        let expected_gaps = 3 * (1 + 38) + 1 + 2;
        assert_eq!(rf.field_gaps, expected_gaps + 1); // final field-off

        // Bit delays are only ever the 0/1 stretch or a gap.
        for &us in &rf.delays_us {
            assert!(
                [
                    t55xx::WAIT_TIME,
                    t55xx::START_GAP,
                    t55xx::WRITE_GAP,
                    t55xx::DATA_0,
                    t55xx::DATA_1,
                    t55xx::PROGRAM
                ]
                .map(|clocks| clocks * US_PER_CLOCK)
                .contains(&us)
            );
        }
    }

    #[test]
    fn config_words_compose_known_fields() {
        // EM4100: Manchester, RF/64, two data blocks.
        let em = t55xx::MODULATION_MANCHESTER | t55xx::BITRATE_RF_64 | (2 << t55xx::MAXBLOCK_SHIFT);
        assert_eq!(em, 0x0014_8040);
        // H10301: FSK2a, RF/50, three data blocks.
        let hid = t55xx::MODULATION_FSK2A | t55xx::BITRATE_RF_50 | (3 << t55xx::MAXBLOCK_SHIFT);
        assert_eq!(hid, 0x0010_7060);
        // Indala: PSK1, RF/32, two data blocks.
        let indala = t55xx::MODULATION_PSK1 | t55xx::BITRATE_RF_32 | (2 << t55xx::MAXBLOCK_SHIFT);
        assert_eq!(indala, 0x0008_1040);
    }
}
