//! Emulation path: credential to timed antenna pulses.
//!
//! [`Encoder`] renders the wire frame as an infinite pulse sequence,
//! [`PulseJoiner`] merges it to the granularity the emulation timer can
//! express, and [`Emulator`] feeds the timer callback. Nothing here
//! allocates; the whole path runs under the timer interrupt.

mod emulator;
mod encoder;
mod pulse_joiner;

pub use emulator::Emulator;
pub use encoder::{EncodeError, Encoder, Pulse};
pub use pulse_joiner::PulseJoiner;
