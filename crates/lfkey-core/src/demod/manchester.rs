//! Table-driven Manchester bit recovery.
//!
//! Events are named after the line level *after* the edge that produced
//! them: a rising edge ends a low period and yields a `High` event. Data
//! bits fall out when the machine lands on a mid-bit state.

use crate::TICKS_PER_US;

/// Nominal half-bit time for RF/64 Manchester at 125 kHz.
pub const SHORT_US: u32 = 255;
/// Nominal full-bit time.
pub const LONG_US: u32 = 510;
/// Accepted deviation around either nominal time.
pub const JITTER_US: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManchesterEvent {
    ShortLow = 0,
    ShortHigh = 2,
    LongLow = 4,
    LongHigh = 6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ManchesterState {
    Start1 = 0,
    #[default]
    Mid1 = 1,
    Mid0 = 2,
    Start0 = 3,
}

const TRANSITIONS: [u8; 4] = [0b0000_0001, 0b1001_0001, 0b1001_1011, 0b1111_1011];

const STATES: [ManchesterState; 4] = [
    ManchesterState::Start1,
    ManchesterState::Mid1,
    ManchesterState::Mid0,
    ManchesterState::Start0,
];

/// The state every decoder re-arms to.
pub fn reset() -> ManchesterState {
    ManchesterState::Mid1
}

/// Advance the machine by one event; returns the next state and the
/// recovered data bit, if this event completed one.
pub fn advance(state: ManchesterState, event: ManchesterEvent) -> (ManchesterState, Option<bool>) {
    let next = STATES[usize::from((TRANSITIONS[state as usize] >> (event as u8)) & 0b11)];
    if next == state {
        // Illegal transition for this line code; re-arm.
        return (reset(), None);
    }
    let data = match next {
        ManchesterState::Mid0 => Some(false),
        ManchesterState::Mid1 => Some(true),
        _ => None,
    };
    (next, data)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfBit {
    Short,
    Long,
}

/// Classify an edge interval against the half/full bit windows.
///
/// Anything outside both windows is electrically invalid and yields
/// `None`; callers treat that as a reset, never an error.
pub fn classify(ticks: u32) -> Option<HalfBit> {
    let short_low = (SHORT_US - JITTER_US) * TICKS_PER_US;
    let short_high = (SHORT_US + JITTER_US) * TICKS_PER_US;
    let long_low = (LONG_US - JITTER_US) * TICKS_PER_US;
    let long_high = (LONG_US + JITTER_US) * TICKS_PER_US;
    if ticks > short_low && ticks < short_high {
        Some(HalfBit::Short)
    } else if ticks > long_low && ticks < long_high {
        Some(HalfBit::Long)
    } else {
        None
    }
}

/// Map a completed interval to its event, given the edge direction.
pub fn event(rising: bool, half: HalfBit) -> ManchesterEvent {
    match (half, rising) {
        (HalfBit::Short, true) => ManchesterEvent::ShortHigh,
        (HalfBit::Short, false) => ManchesterEvent::ShortLow,
        (HalfBit::Long, true) => ManchesterEvent::LongHigh,
        (HalfBit::Long, false) => ManchesterEvent::LongLow,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(events: &[ManchesterEvent]) -> Vec<bool> {
        let mut state = reset();
        let mut bits = Vec::new();
        for &event in events {
            let (next, data) = advance(state, event);
            state = next;
            if let Some(bit) = data {
                bits.push(bit);
            }
        }
        bits
    }

    #[test]
    fn alternating_shorts_decode_constant_ones() {
        use ManchesterEvent::*;
        // Halves of repeated 1 bits: high then low, all short.
        let bits = run(&[ShortLow, ShortHigh, ShortLow, ShortHigh, ShortLow]);
        assert_eq!(bits, vec![true, true]);
    }

    #[test]
    fn long_period_flips_the_bit() {
        use ManchesterEvent::*;
        // Halves of 1 1 0 0; the first bit is consumed for synchronization
        // and the 1->0 boundary shows up as a long high.
        let bits = run(&[ShortLow, ShortHigh, ShortLow, LongHigh, ShortLow, ShortHigh]);
        assert_eq!(bits, vec![true, false, false]);
    }

    #[test]
    fn classify_rejects_out_of_window_timing() {
        assert_eq!(classify(256 * TICKS_PER_US), Some(HalfBit::Short));
        assert_eq!(classify(512 * TICKS_PER_US), Some(HalfBit::Long));
        assert_eq!(classify(100 * TICKS_PER_US), None);
        assert_eq!(classify(700 * TICKS_PER_US), None);
        assert_eq!(classify(380 * TICKS_PER_US), None);
    }
}
