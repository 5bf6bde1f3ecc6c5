//! Reader orchestration: several decoders against one edge stream.
//!
//! The platform's edge interrupt calls [`Reader::feed`]; a lower-priority
//! loop polls [`Reader::read`] with a monotonic tick timestamp. Decode
//! failures are never surfaced; the only failure signal is the absence of
//! a ready decoder. A read becomes stable on the third consecutive
//! identical decode, and two seconds without any decode toggles the
//! receive mode between ASK and PSK carriers.

use crate::credential::{Credential, CredentialType, MAX_PAYLOAD};
use crate::hal::RfFrontend;
use crate::protocols::em4100::DecoderEm4100;
use crate::protocols::h10301::DecoderH10301;
use crate::protocols::indala40134::DecoderIndala;
use crate::protocols::ioprox::DecoderIoProx;
use crate::{EdgeEvent, TICKS_PER_SECOND};

/// Ticks without a decode before the receive mode toggles.
pub const MODE_SWITCH_TICKS: u64 = 2 * TICKS_PER_SECOND;

/// Consecutive identical decodes required for a stable read.
const STABLE_DECODES: u32 = 3;

/// Edges per poll interval that count as antenna activity.
const DETECT_EDGES: u32 = 10;

/// Receive carrier configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// ASK family: 125 kHz carrier, 50% comparator duty.
    #[default]
    Normal,
    /// Indala PSK: 62.5 kHz carrier, 25% duty.
    Indala,
}

impl ReadMode {
    pub fn frequency_hz(self) -> u32 {
        match self {
            ReadMode::Normal => 125_000,
            ReadMode::Indala => 62_500,
        }
    }

    pub fn duty_cycle(self) -> f32 {
        match self {
            ReadMode::Normal => 0.5,
            ReadMode::Indala => 0.25,
        }
    }

    fn toggled(self) -> Self {
        match self {
            ReadMode::Normal => ReadMode::Indala,
            ReadMode::Indala => ReadMode::Normal,
        }
    }
}

#[derive(Debug, Default)]
pub struct Reader {
    mode: ReadMode,
    running: bool,
    em4100: DecoderEm4100,
    h10301: DecoderH10301,
    ioprox: DecoderIoProx,
    indala: DecoderIndala,
    last_kind: Option<CredentialType>,
    last_data: [u8; MAX_PAYLOAD],
    scratch: [u8; MAX_PAYLOAD],
    repeats: u32,
    detect_edges: u32,
    switch_deadline: u64,
}

impl Reader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a read session in ASK mode.
    pub fn start(&mut self, rf: &mut impl RfFrontend, now: u64) {
        self.reset_session(ReadMode::Normal, now);
        rf.configure(self.mode.frequency_hz(), self.mode.duty_cycle());
        rf.start_receive();
        self.running = true;
    }

    /// Begin a read session pinned to `mode` (the mode timer still runs).
    pub fn start_forced(&mut self, rf: &mut impl RfFrontend, now: u64, mode: ReadMode) {
        self.start(rf, now);
        if mode != self.mode {
            self.switch_mode(rf, now);
        }
    }

    /// End the session and idle the front-end.
    pub fn stop(&mut self, rf: &mut impl RfFrontend) {
        self.running = false;
        self.reset_decoders();
        rf.stop();
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    /// Account for one electrical edge. Interrupt context: no allocation,
    /// no blocking, run-to-completion.
    pub fn feed(&mut self, edge: EdgeEvent) {
        if !self.running {
            return;
        }
        self.detect_edges = self.detect_edges.saturating_add(1);
        match self.mode {
            ReadMode::Normal => {
                self.em4100.process_front(edge.rising, edge.ticks);
                self.h10301.process_front(edge.rising, edge.ticks);
                self.ioprox.process_front(edge.rising, edge.ticks);
            }
            ReadMode::Indala => {
                self.em4100.process_front(edge.rising, edge.ticks);
                self.indala.process_front(edge.rising, edge.ticks);
            }
        }
    }

    /// Poll for a stable credential.
    ///
    /// Returns true only when the same value has been decoded three times
    /// in a row; `kind` and `data` are then filled. Also drives the
    /// mode-switch timer, so call it regularly even while idle.
    pub fn read(
        &mut self,
        rf: &mut impl RfFrontend,
        now: u64,
        kind: &mut CredentialType,
        data: &mut [u8],
    ) -> bool {
        let mut stable = false;
        if let Some(decoded) = self.poll_decoders() {
            self.switch_deadline = now + MODE_SWITCH_TICKS;
            if self.last_kind == Some(decoded) && self.last_data == self.scratch {
                self.repeats += 1;
            } else {
                self.last_kind = Some(decoded);
                self.last_data = self.scratch;
                self.repeats = 1;
            }
            if self.repeats >= STABLE_DECODES {
                *kind = decoded;
                data[..decoded.payload_size()].copy_from_slice(&self.scratch[..decoded.payload_size()]);
                stable = true;
            }
        }
        if self.running && now >= self.switch_deadline {
            self.switch_mode(rf, now);
        }
        stable
    }

    /// Coarse presence signal: more than ten edges since the last call.
    /// Resets the edge counter as a side effect.
    pub fn detect(&mut self) -> bool {
        let detected = self.detect_edges > DETECT_EDGES;
        self.detect_edges = 0;
        detected
    }

    /// True once something decoded but has not yet confirmed; lets a UI
    /// show "verifying" while `read` still returns false.
    pub fn any_read(&self) -> bool {
        self.repeats > 0
    }

    fn poll_decoders(&mut self) -> Option<CredentialType> {
        // Fixed priority: first ready decoder wins this poll.
        if self.em4100.read(&mut self.scratch) {
            return Some(CredentialType::Em4100);
        }
        if self.h10301.read(&mut self.scratch) {
            return Some(CredentialType::HidH10301);
        }
        if self.ioprox.read(&mut self.scratch) {
            return Some(CredentialType::IoProxXsf);
        }
        if self.indala.read(&mut self.scratch) {
            return Some(CredentialType::Indala40134);
        }
        None
    }

    fn switch_mode(&mut self, rf: &mut impl RfFrontend, now: u64) {
        self.mode = self.mode.toggled();
        self.reset_decoders();
        self.repeats = 0;
        self.last_kind = None;
        self.switch_deadline = now + MODE_SWITCH_TICKS;
        rf.configure(self.mode.frequency_hz(), self.mode.duty_cycle());
    }

    fn reset_session(&mut self, mode: ReadMode, now: u64) {
        self.mode = mode;
        self.reset_decoders();
        self.last_kind = None;
        self.last_data = [0; MAX_PAYLOAD];
        self.repeats = 0;
        self.detect_edges = 0;
        self.switch_deadline = now + MODE_SWITCH_TICKS;
    }

    fn reset_decoders(&mut self) {
        self.em4100.reset();
        self.h10301.reset();
        self.ioprox.reset();
        self.indala.reset();
    }

    /// Stable read as a credential value object.
    pub fn read_credential(&mut self, rf: &mut impl RfFrontend, now: u64) -> Option<Credential> {
        let mut kind = CredentialType::Em4100;
        let mut data = [0u8; MAX_PAYLOAD];
        if self.read(rf, now, &mut kind, &mut data) {
            Some(Credential::new(kind, &data))
        } else {
            None
        }
    }
}
