//! Timer-callback driver for tag emulation.

use crate::credential::Credential;
use crate::hal::RfFrontend;

use super::{EncodeError, Encoder, PulseJoiner};

/// Drives the transmit timer from an encoder's pulse stream.
///
/// `on_timer` runs in the timer's interrupt context: it pulls sub-pulses
/// until one joined pulse is ready and returns the (period, pulse) pair to
/// program next. It never allocates and never blocks.
#[derive(Debug)]
pub struct Emulator {
    encoder: Encoder,
    joiner: PulseJoiner,
}

impl Emulator {
    pub fn new(credential: &Credential) -> Result<Self, EncodeError> {
        Ok(Self {
            encoder: Encoder::start(credential)?,
            joiner: PulseJoiner::new(),
        })
    }

    /// Configure the front-end and begin transmitting.
    pub fn start(&mut self, rf: &mut impl RfFrontend) {
        rf.start_transmit();
    }

    /// One timer callback: the next (period, pulse) pair in field clocks.
    pub fn on_timer(&mut self) -> (u16, u16) {
        loop {
            let pulse = self.encoder.get_next();
            if self.joiner.push_pulse(pulse.polarity, pulse.period, pulse.pulse) {
                return self.joiner.pop_pulse();
            }
        }
    }

    /// Stop transmitting and idle the front-end.
    pub fn stop(&mut self, rf: &mut impl RfFrontend) {
        rf.stop();
    }
}
