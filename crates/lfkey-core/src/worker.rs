//! Application façade binding one credential to the engine.

use crate::credential::{Credential, CredentialType};
use crate::emulate::{EncodeError, Emulator};
use crate::hal::RfFrontend;
use crate::reader::{ReadMode, Reader};
use crate::writer::{WriteError, Writer};
use crate::TICKS_PER_SECOND;

/// Outcome of one write-and-verify poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// The tag reads back the target credential.
    Ok,
    /// Nothing conclusive yet; keep polling.
    Nothing,
    /// Gave up: the tag cannot take this credential.
    NotWritable,
}

/// Total time the write loop keeps retrying before giving up.
const WRITE_RETRY_TICKS: u64 = 5 * 60 * TICKS_PER_SECOND;
/// Read-back window after each programming attempt.
const VERIFY_TICKS: u64 = TICKS_PER_SECOND / 2;

#[derive(Debug)]
enum Mode {
    Idle,
    Read,
    Emulate(Emulator),
    Write(WriteJob),
}

#[derive(Debug)]
struct WriteJob {
    deadline: u64,
    phase: WritePhase,
    saw_wrong_key: bool,
}

#[derive(Debug)]
enum WritePhase {
    /// Initial read-back: the tag may already carry the key.
    PreRead { until: u64 },
    Program,
    Verify { until: u64 },
}

/// One credential, one operation at a time.
///
/// The worker owns the Reader/Emulator/Writer wiring so the application
/// deals only in start/stop/poll calls. All polls are tick-driven and
/// non-blocking; the platform keeps routing edges via [`RfidWorker::feed`]
/// while a read or verify is in flight.
#[derive(Debug)]
pub struct RfidWorker {
    credential: Credential,
    reader: Reader,
    writer: Writer,
    mode: Mode,
}

impl RfidWorker {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            reader: Reader::new(),
            writer: Writer::new(),
            mode: Mode::Idle,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Route one edge event to whichever operation is listening.
    pub fn feed(&mut self, edge: crate::EdgeEvent) {
        match self.mode {
            Mode::Read | Mode::Write(_) => self.reader.feed(edge),
            _ => {}
        }
    }

    pub fn start_read(&mut self, rf: &mut impl RfFrontend, now: u64) {
        self.reader.start(rf, now);
        self.mode = Mode::Read;
    }

    /// Poll a running read; a stable read replaces and returns the bound
    /// credential.
    pub fn poll_read(&mut self, rf: &mut impl RfFrontend, now: u64) -> Option<Credential> {
        if !matches!(self.mode, Mode::Read) {
            return None;
        }
        let read = self.reader.read_credential(rf, now)?;
        self.credential = read;
        Some(read)
    }

    /// Unconfirmed-decode indicator for "verifying" UI states.
    pub fn any_read(&self) -> bool {
        self.reader.any_read()
    }

    pub fn detect(&mut self) -> bool {
        self.reader.detect()
    }

    pub fn start_emulate(&mut self, rf: &mut impl RfFrontend) -> Result<(), EncodeError> {
        let mut emulator = Emulator::new(&self.credential)?;
        emulator.start(rf);
        self.mode = Mode::Emulate(emulator);
        Ok(())
    }

    /// Timer callback while emulating.
    pub fn emulate_timer(&mut self) -> Option<(u16, u16)> {
        match &mut self.mode {
            Mode::Emulate(emulator) => Some(emulator.on_timer()),
            _ => None,
        }
    }

    /// Begin a write-and-verify job for the bound credential.
    pub fn start_write(&mut self, rf: &mut impl RfFrontend, now: u64) -> Result<(), EncodeError> {
        if !Self::writable(self.credential.kind()) {
            return Err(EncodeError::Unsupported(self.credential.kind()));
        }
        self.start_verify_read(rf, now);
        self.mode = Mode::Write(WriteJob {
            deadline: now + WRITE_RETRY_TICKS,
            phase: WritePhase::PreRead {
                until: now + VERIFY_TICKS,
            },
            saw_wrong_key: false,
        });
        Ok(())
    }

    /// Drive the write job forward. Keeps retrying failed attempts until
    /// the five-minute budget runs out.
    pub fn poll_write(&mut self, rf: &mut impl RfFrontend, now: u64) -> WriteResult {
        let Mode::Write(job) = &mut self.mode else {
            return WriteResult::Nothing;
        };
        if now >= job.deadline {
            let result = if job.saw_wrong_key {
                WriteResult::NotWritable
            } else {
                WriteResult::Nothing
            };
            self.finish(rf);
            return result;
        }

        match self.verify_step(rf, now) {
            Ok(()) => {
                self.finish(rf);
                WriteResult::Ok
            }
            Err(WriteError::SameKey) => {
                self.finish(rf);
                WriteResult::Ok
            }
            Err(WriteError::NoDetect) => WriteResult::Nothing,
            Err(WriteError::CannotWrite) => WriteResult::Nothing,
        }
    }

    pub fn stop(&mut self, rf: &mut impl RfFrontend) {
        self.reader.stop(rf);
        if let Mode::Emulate(emulator) = &mut self.mode {
            emulator.stop(rf);
        }
        rf.stop();
        self.mode = Mode::Idle;
    }

    fn writable(kind: CredentialType) -> bool {
        matches!(
            kind,
            CredentialType::Em4100
                | CredentialType::HidH10301
                | CredentialType::Indala40134
                | CredentialType::IoProxXsf
        )
    }

    /// One step of the program/verify cycle.
    fn verify_step(&mut self, rf: &mut impl RfFrontend, now: u64) -> Result<(), WriteError> {
        let Mode::Write(job) = &mut self.mode else {
            return Err(WriteError::NoDetect);
        };
        match job.phase {
            WritePhase::PreRead { until } => {
                if let Some(read) = self.reader.read_credential(rf, now) {
                    if read == self.credential {
                        return Err(WriteError::SameKey);
                    }
                }
                if now >= until {
                    job.phase = WritePhase::Program;
                }
                Err(WriteError::NoDetect)
            }
            WritePhase::Program => {
                self.reader.stop(rf);
                let data = self.credential.data();
                match self.credential.kind() {
                    CredentialType::Em4100 => self.writer.write_em(rf, data),
                    CredentialType::HidH10301 => self.writer.write_hid(rf, data),
                    CredentialType::Indala40134 => self.writer.write_indala(rf, data),
                    CredentialType::IoProxXsf => self.writer.write_ioprox(rf, data),
                    _ => unreachable!("gated by start_write"),
                }
                self.start_verify_read(rf, now);
                let Mode::Write(job) = &mut self.mode else {
                    unreachable!();
                };
                job.phase = WritePhase::Verify {
                    until: now + VERIFY_TICKS,
                };
                Err(WriteError::NoDetect)
            }
            WritePhase::Verify { until } => {
                if let Some(read) = self.reader.read_credential(rf, now) {
                    if read == self.credential {
                        return Ok(());
                    }
                    job.saw_wrong_key = true;
                    job.phase = WritePhase::Program;
                    return Err(WriteError::CannotWrite);
                }
                if now >= until {
                    job.phase = WritePhase::Program;
                    return Err(WriteError::NoDetect);
                }
                Err(WriteError::NoDetect)
            }
        }
    }

    fn start_verify_read(&mut self, rf: &mut impl RfFrontend, now: u64) {
        // Indala tags read back in PSK mode; everything else in ASK.
        if self.credential.kind() == CredentialType::Indala40134 {
            self.reader.start_forced(rf, now, ReadMode::Indala);
        } else {
            self.reader.start(rf, now);
        }
    }

    fn finish(&mut self, rf: &mut impl RfFrontend) {
        self.reader.stop(rf);
        self.mode = Mode::Idle;
    }
}
