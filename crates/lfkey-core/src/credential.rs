//! Credential value object shared between the engine and the application.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest payload across all credential types (Dallas iButton ROM).
pub const MAX_PAYLOAD: usize = 8;

/// Closed set of supported credential types.
///
/// The serialized names are the strings the persisted key-file collaborator
/// records in its `Key type` field; they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialType {
    #[serde(rename = "EM4100")]
    Em4100,
    #[serde(rename = "H10301")]
    HidH10301,
    #[serde(rename = "I40134")]
    Indala40134,
    #[serde(rename = "IoProxXSF")]
    IoProxXsf,
    #[serde(rename = "Cyfral")]
    Cyfral,
    #[serde(rename = "Metakom")]
    Metakom,
    #[serde(rename = "Dallas")]
    DallasDs1990,
}

impl CredentialType {
    /// Every supported type, in reader priority order.
    pub const ALL: [CredentialType; 7] = [
        CredentialType::Em4100,
        CredentialType::HidH10301,
        CredentialType::IoProxXsf,
        CredentialType::Indala40134,
        CredentialType::Cyfral,
        CredentialType::Metakom,
        CredentialType::DallasDs1990,
    ];

    /// Decoded payload size in bytes.
    pub fn payload_size(self) -> usize {
        match self {
            CredentialType::Em4100 => 5,
            CredentialType::HidH10301 => 3,
            CredentialType::Indala40134 => 3,
            CredentialType::IoProxXsf => 4,
            CredentialType::Cyfral => 2,
            CredentialType::Metakom => 4,
            CredentialType::DallasDs1990 => 8,
        }
    }

    /// Canonical type-name string (the persisted-file agreement).
    pub fn name(self) -> &'static str {
        match self {
            CredentialType::Em4100 => "EM4100",
            CredentialType::HidH10301 => "H10301",
            CredentialType::Indala40134 => "I40134",
            CredentialType::IoProxXsf => "IoProxXSF",
            CredentialType::Cyfral => "Cyfral",
            CredentialType::Metakom => "Metakom",
            CredentialType::DallasDs1990 => "Dallas",
        }
    }

    /// Tag manufacturer, for presentation only.
    pub fn manufacturer(self) -> &'static str {
        match self {
            CredentialType::Em4100 => "EM-Micro",
            CredentialType::HidH10301 => "HID",
            CredentialType::Indala40134 => "Motorola",
            CredentialType::IoProxXsf => "Kantech",
            CredentialType::Cyfral => "Cyfral",
            CredentialType::Metakom => "Metakom",
            CredentialType::DallasDs1990 => "Dallas",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One decoded credential: a type plus its fixed-size payload.
///
/// Produced by a stable read, or constructed by the application for
/// emulation and writing. The payload holds decoded fields, never wire
/// bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential {
    kind: CredentialType,
    data: [u8; MAX_PAYLOAD],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("unknown credential type '{0}'")]
    UnknownType(String),
    #[error("invalid hex byte '{0}'")]
    BadHex(String),
    #[error("wrong payload length: expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

impl Credential {
    /// Build a credential from a decoded payload.
    ///
    /// Panics if `data` is shorter than the type's payload size; that is a
    /// caller bug, not a signal condition.
    pub fn new(kind: CredentialType, data: &[u8]) -> Self {
        assert!(
            data.len() >= kind.payload_size(),
            "payload too short for {kind}"
        );
        let mut buffer = [0u8; MAX_PAYLOAD];
        buffer[..kind.payload_size()].copy_from_slice(&data[..kind.payload_size()]);
        Self { kind, data: buffer }
    }

    /// Parse the persisted-file representation: a type name and
    /// space-separated uppercase hex bytes.
    pub fn from_parts(name: &str, hex: &str) -> Result<Self, CredentialError> {
        let kind = CredentialType::from_name(name)
            .ok_or_else(|| CredentialError::UnknownType(name.to_string()))?;
        let mut data = [0u8; MAX_PAYLOAD];
        let mut count = 0usize;
        for part in hex.split_whitespace() {
            if count >= kind.payload_size() {
                count += 1;
                continue;
            }
            data[count] = u8::from_str_radix(part, 16)
                .map_err(|_| CredentialError::BadHex(part.to_string()))?;
            count += 1;
        }
        if count != kind.payload_size() {
            return Err(CredentialError::WrongLength {
                expected: kind.payload_size(),
                actual: count,
            });
        }
        Ok(Self { kind, data })
    }

    pub fn kind(&self) -> CredentialType {
        self.kind
    }

    /// Decoded payload, sized for the credential type.
    pub fn data(&self) -> &[u8] {
        &self.data[..self.kind.payload_size()]
    }

    /// The persisted-file `Data` representation.
    pub fn data_hex(&self) -> String {
        self.data()
            .iter()
            .map(|b| format!("{b:02X}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.name(), self.data_hex())
    }
}

impl FromStr for Credential {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(2, ' ');
        let name = parts.next().unwrap_or("");
        let hex = parts.next().unwrap_or("");
        Credential::from_parts(name, hex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in CredentialType::ALL {
            assert_eq!(CredentialType::from_name(kind.name()), Some(kind));
        }
        assert_eq!(CredentialType::from_name("EM410x"), None);
    }

    #[test]
    fn serde_uses_canonical_names() {
        let json = serde_json::to_string(&CredentialType::IoProxXsf).unwrap();
        assert_eq!(json, "\"IoProxXSF\"");
        let back: CredentialType = serde_json::from_str("\"EM4100\"").unwrap();
        assert_eq!(back, CredentialType::Em4100);
    }

    #[test]
    fn hex_representation_round_trips() {
        let credential = Credential::new(CredentialType::Em4100, &[0x12, 0x34, 0x56, 0x78, 0x9A]);
        assert_eq!(credential.data_hex(), "12 34 56 78 9A");
        let parsed: Credential = credential.to_string().parse().unwrap();
        assert_eq!(parsed, credential);
    }

    #[test]
    fn wrong_length_is_reported() {
        let err = Credential::from_parts("H10301", "12 34").unwrap_err();
        assert_eq!(
            err,
            CredentialError::WrongLength {
                expected: 3,
                actual: 2
            }
        );
    }

    #[test]
    #[should_panic(expected = "payload too short")]
    fn short_payload_panics() {
        Credential::new(CredentialType::DallasDs1990, &[1, 2, 3]);
    }
}
