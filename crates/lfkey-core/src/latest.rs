//! Explicit hand-off between the edge callback and the poll loop.
//!
//! The decode state machines themselves are single-context objects; when
//! the platform runs the edge callback and the application loop in
//! different execution contexts, the completed frame crosses over through
//! this cell instead of relying on run-to-completion ordering. The
//! producer overwrites, the consumer takes; neither side holds the lock
//! for more than a copy.

use parking_lot::Mutex;

use crate::credential::Credential;

/// Latest-complete-frame cell: single producer, single consumer.
#[derive(Debug, Default)]
pub struct LatestFrame {
    slot: Mutex<Option<Credential>>,
}

impl LatestFrame {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Publish a freshly confirmed credential, replacing any unread one.
    pub fn publish(&self, credential: Credential) {
        *self.slot.lock() = Some(credential);
    }

    /// Take the most recent credential, if one arrived since the last take.
    pub fn take(&self) -> Option<Credential> {
        self.slot.lock().take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::CredentialType;

    #[test]
    fn newest_value_wins_and_take_drains() {
        let cell = LatestFrame::new();
        assert_eq!(cell.take(), None);
        cell.publish(Credential::new(CredentialType::Cyfral, &[1, 2]));
        cell.publish(Credential::new(CredentialType::Cyfral, &[3, 4]));
        let taken = cell.take().unwrap();
        assert_eq!(taken.data(), &[3, 4]);
        assert_eq!(cell.take(), None);
    }

    #[test]
    fn shared_across_threads() {
        let cell = std::sync::Arc::new(LatestFrame::new());
        let producer = {
            let cell = cell.clone();
            std::thread::spawn(move || {
                cell.publish(Credential::new(CredentialType::Metakom, &[0x3C, 0x5A, 0x0F, 0xF0]));
            })
        };
        producer.join().unwrap();
        assert!(cell.take().is_some());
    }
}
