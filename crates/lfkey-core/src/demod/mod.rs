//! Shared demodulation machinery.
//!
//! Each protocol decoder owns its own rolling register and framing check;
//! the modulation-family mechanics live here: the Manchester advance table,
//! the FSK oscillator and cycle classifier, and the differential-PSK slot
//! arithmetic. All of it is allocation-free and runs in the edge callback.

pub mod fsk;
pub mod manchester;
pub mod psk;
