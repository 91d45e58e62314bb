// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RTPS GUID used as the opaque key of participants and endpoints.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Entity id of the participant entity inside a GUID prefix.
pub const ENTITYID_PARTICIPANT: [u8; 4] = [0x00, 0x00, 0x01, 0xC1];

/// RTPS GUID (Globally Unique Identifier)
///
/// 16-byte identifier: 12-byte prefix shared by every entity of one
/// participant, followed by a 4-byte entity id.
///
/// # Display Format
/// Hex with dots: "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Guid {
    pub prefix: [u8; 12],
    pub entity_id: [u8; 4],
}

impl Guid {
    /// Create GUID from separate prefix and entity ID
    pub const fn new(prefix: [u8; 12], entity_id: [u8; 4]) -> Self {
        Self { prefix, entity_id }
    }

    /// Create GUID from raw bytes (16 bytes total)
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        let mut prefix = [0u8; 12];
        let mut entity_id = [0u8; 4];
        prefix.copy_from_slice(&bytes[0..12]);
        entity_id.copy_from_slice(&bytes[12..16]);
        Self { prefix, entity_id }
    }

    /// Convert GUID to 16-byte array
    pub fn as_bytes(&self) -> [u8; 16] {
        let mut bytes = [0u8; 16];
        bytes[0..12].copy_from_slice(&self.prefix);
        bytes[12..16].copy_from_slice(&self.entity_id);
        bytes
    }

    /// GUID of the participant owning this entity (same prefix).
    pub fn participant(&self) -> Self {
        Self::new(self.prefix, ENTITYID_PARTICIPANT)
    }

    /// Check if GUID is zero (invalid)
    pub fn is_zero(&self) -> bool {
        self.prefix.iter().all(|&b| b == 0) && self.entity_id.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.prefix.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        for byte in &self.entity_id {
            write!(f, ".{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Guid({})", self)
    }
}

/// Error returned when a GUID string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid GUID '{0}': expected 16 hex bytes")]
pub struct ParseGuidError(String);

impl FromStr for Guid {
    type Err = ParseGuidError;

    /// Accepts the dotted display form or 32 contiguous hex digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits: String = s.chars().filter(|c| *c != '.' && *c != ':').collect();
        if digits.len() != 32 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseGuidError(s.to_string()));
        }

        let mut bytes = [0u8; 16];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseGuidError(s.to_string()))?;
        }
        Ok(Self::from_bytes(bytes))
    }
}

impl Serialize for Guid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Guid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_display() {
        let guid = Guid::new([1, 15, 172, 16, 0, 0, 0, 0, 0, 0, 0, 1], [0, 0, 1, 193]);
        assert_eq!(
            guid.to_string(),
            "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
        );
    }

    #[test]
    fn test_guid_parse_dotted_and_compact() {
        let dotted: Guid = "01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.c1"
            .parse()
            .expect("dotted form");
        let compact: Guid = "010fac100000000000000001000001c1"
            .parse()
            .expect("compact form");
        assert_eq!(dotted, compact);
        assert_eq!(dotted.entity_id, ENTITYID_PARTICIPANT);
    }

    #[test]
    fn test_guid_parse_rejects_short() {
        assert!("01.02.03".parse::<Guid>().is_err());
        assert!("zz0fac100000000000000001000001c1".parse::<Guid>().is_err());
    }

    #[test]
    fn test_guid_parse_rejects_sign_prefix() {
        assert!("+f0fac100000000000000001000001c1".parse::<Guid>().is_err());
        assert!("01.0f.ac.10.00.00.00.00.00.00.00.01.00.00.01.+1"
            .parse::<Guid>()
            .is_err());
    }

    #[test]
    fn test_guid_participant_shares_prefix() {
        let writer = Guid::new([7; 12], [0, 0, 0x12, 0x03]);
        let participant = writer.participant();
        assert_eq!(participant.prefix, writer.prefix);
        assert_eq!(participant.entity_id, ENTITYID_PARTICIPANT);
    }

    #[test]
    fn test_guid_serde_as_string() {
        let guid = Guid::new([0xAB; 12], [0, 0, 0, 2]);
        let json = serde_json::to_string(&guid).expect("serialize");
        assert_eq!(json, format!("\"{}\"", guid));
        let back: Guid = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, guid);
    }

    #[test]
    fn test_guid_zero() {
        assert!(Guid::from_bytes([0; 16]).is_zero());
        assert!(!Guid::new([1; 12], [0; 4]).is_zero());
    }
}
