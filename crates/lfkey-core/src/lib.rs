//! Core decode/encode engine for low-frequency proximity and contact keys.
//!
//! Edge events from the analog front-end drive per-protocol demodulators
//! (Manchester, FSK, differential PSK and the contact-key state machines);
//! each feeds a rolling register whose framing check gates extraction. The
//! [`Reader`] runs every decoder of the active mode against one edge
//! stream and reports a credential only after repeated identical decodes.
//! The reverse path renders a credential back into timed pulses for
//! emulation, or into a T55xx programming sequence.
//!
//! Invariants:
//! - No decode or encode path allocates; all hot-path buffers are fixed.
//! - Malformed signal is silently discarded; errors mean caller bugs or
//!   write-verification failures, never bad radio input.
//! - Decode state is mutated only from the edge callback; cross-context
//!   hand-off goes through [`LatestFrame`].
//!
//! # Examples
//! ```
//! use lfkey_core::{Credential, CredentialType, analysis, reader::ReadMode};
//!
//! let credential = Credential::new(CredentialType::Em4100, &[0x12, 0x34, 0x56, 0x78, 0x9A]);
//! let summary = analysis::analyze_trace(&[], ReadMode::Normal);
//! assert!(summary.reads.is_empty());
//! assert_eq!(credential.to_string(), "EM4100 12 34 56 78 9A");
//! ```

pub mod analysis;
pub mod bits;
mod credential;
pub mod demod;
pub mod emulate;
pub mod hal;
mod latest;
pub mod protocols;
pub mod reader;
mod worker;
pub mod writer;

pub use credential::{Credential, CredentialError, CredentialType, MAX_PAYLOAD};
pub use emulate::{EncodeError, Encoder, Emulator, Pulse, PulseJoiner};
pub use hal::{NullFrontend, RfFrontend};
pub use latest::LatestFrame;
pub use reader::{ReadMode, Reader};
pub use worker::{RfidWorker, WriteResult};
pub use writer::{WriteError, Writer};

/// Hardware timer resolution: ticks per microsecond.
pub const TICKS_PER_US: u32 = 64;

/// Ticks per second at that resolution.
pub const TICKS_PER_SECOND: u64 = 64_000_000;

/// One electrical transition: its direction and the elapsed time since
/// the previous one. Produced by the front-end's edge interrupt and
/// consumed synchronously; never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeEvent {
    /// True for a low-to-high transition.
    pub rising: bool,
    /// Ticks since the previous transition.
    pub ticks: u32,
}
