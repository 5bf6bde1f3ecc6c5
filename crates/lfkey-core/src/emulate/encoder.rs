//! Per-protocol pulse generation.

use thiserror::Error;

use crate::bits;
use crate::credential::{Credential, CredentialType};
use crate::demod::fsk::{CYCLE_HIGH, CYCLE_LOW, FskOsc};
use crate::protocols::em4100::Em4100;
use crate::protocols::h10301::{self, HidH10301};
use crate::protocols::indala40134::Indala40134;
use crate::protocols::ioprox::{self, IoProxXsf};
use crate::protocols::Codec;

/// One modulation step. Durations are in 125 kHz field clocks: the line
/// sits at `polarity` for `pulse` clocks, then at the opposite level for
/// the rest of `period`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub polarity: bool,
    pub period: u16,
    pub pulse: u16,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("credential type {0} cannot be emulated over RF")]
    Unsupported(CredentialType),
}

/// Restartable, infinite pulse sequence for one credential.
#[derive(Debug)]
pub struct Encoder {
    inner: Variant,
}

#[derive(Debug)]
enum Variant {
    Em4100(EmEncoder),
    H10301(FskEncoder<12>),
    IoProx(FskEncoder<8>),
    Indala(IndalaEncoder),
}

impl Encoder {
    /// Compute the wire frame and arm the sequence at its first step.
    pub fn start(credential: &Credential) -> Result<Self, EncodeError> {
        let data = credential.data();
        let inner = match credential.kind() {
            CredentialType::Em4100 => {
                let mut frame = [0u8; 8];
                Em4100::encode(data, &mut frame);
                Variant::Em4100(EmEncoder { frame, half: 0 })
            }
            CredentialType::HidH10301 => {
                let mut frame = [0u8; 12];
                HidH10301::encode(data, &mut frame);
                Variant::H10301(FskEncoder::new(frame, h10301::BIT_CLOCKS))
            }
            CredentialType::IoProxXsf => {
                let mut frame = [0u8; 8];
                IoProxXsf::encode(data, &mut frame);
                Variant::IoProx(FskEncoder::new(frame, ioprox::BIT_CLOCKS))
            }
            CredentialType::Indala40134 => {
                let mut frame = [0u8; 8];
                Indala40134::encode(data, &mut frame);
                Variant::Indala(IndalaEncoder {
                    frame,
                    bit: 0,
                    cycle: 0,
                    low_half: false,
                })
            }
            kind => return Err(EncodeError::Unsupported(kind)),
        };
        Ok(Self { inner })
    }

    /// Advance one modulation step; wraps at the frame boundary.
    pub fn get_next(&mut self) -> Pulse {
        match &mut self.inner {
            Variant::Em4100(encoder) => encoder.next(),
            Variant::H10301(encoder) => encoder.next(),
            Variant::IoProx(encoder) => encoder.next(),
            Variant::Indala(encoder) => encoder.next(),
        }
    }

    /// Field clocks of one full frame, for pacing repetitions.
    pub fn frame_clocks(&self) -> u32 {
        match &self.inner {
            Variant::Em4100(_) => 64 * 64,
            Variant::H10301(_) => 96 * u32::from(h10301::BIT_CLOCKS),
            Variant::IoProx(_) => 64 * u32::from(ioprox::BIT_CLOCKS),
            Variant::Indala(_) => 64 * 32,
        }
    }
}

/// EM4100: one Manchester half-bit per step, 32 field clocks each.
#[derive(Debug)]
struct EmEncoder {
    frame: [u8; 8],
    half: usize,
}

impl EmEncoder {
    fn next(&mut self) -> Pulse {
        let bit = bits::get_bit(&self.frame, self.half / 2);
        let polarity = if self.half % 2 == 0 { bit } else { !bit };
        self.half = (self.half + 1) % 128;
        Pulse {
            polarity,
            period: 32,
            pulse: 32,
        }
    }
}

/// FSK2a: one carrier half-cycle per step.
#[derive(Debug)]
struct FskEncoder<const N: usize> {
    frame: [u8; N],
    osc: FskOsc,
    bit: usize,
}

impl<const N: usize> FskEncoder<N> {
    fn new(frame: [u8; N], bit_clocks: u16) -> Self {
        Self {
            frame,
            osc: FskOsc::new(CYCLE_LOW, CYCLE_HIGH, bit_clocks),
            bit: 0,
        }
    }

    fn next(&mut self) -> Pulse {
        let bit = bits::get_bit(&self.frame, self.bit);
        let (polarity, half, advance) = self.osc.next_half(bit);
        if advance {
            self.bit = (self.bit + 1) % (N * 8);
        }
        Pulse {
            polarity,
            period: half,
            pulse: half,
        }
    }
}

/// Indala PSK1: a 2-clock carrier whose phase inverts on set bits,
/// 16 cycles per bit.
#[derive(Debug)]
struct IndalaEncoder {
    frame: [u8; 8],
    bit: usize,
    cycle: u8,
    low_half: bool,
}

impl IndalaEncoder {
    fn next(&mut self) -> Pulse {
        let bit = bits::get_bit(&self.frame, self.bit);
        let polarity = bit != self.low_half;
        if self.low_half {
            self.cycle += 1;
            if self.cycle == 16 {
                self.cycle = 0;
                self.bit = (self.bit + 1) % 64;
            }
        }
        self.low_half = !self.low_half;
        Pulse {
            polarity,
            period: 1,
            pulse: 1,
        }
    }
}
