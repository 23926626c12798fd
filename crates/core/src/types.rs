//! Core types shared across the meshtopo crates.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Point in time in whole seconds (Unix epoch by convention).
pub type Timestamp = u64;

/// Length of an IEEE EUI-64 address in bytes
pub const EUI64_LEN: usize = 8;

/// Opaque identifier of a mesh node.
///
/// Usually an 8-byte EUI-64, but any byte string is accepted. Equality is
/// byte-exact and ordering is lexicographic over the bytes, which keeps every
/// map keyed by addresses deterministic. A zero-length address is the null
/// address: it never names a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeAddress(Vec<u8>);

impl NodeAddress {
    /// Wrap raw address bytes without validation.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Build an address from an EUI-64.
    pub fn eui64(bytes: [u8; EUI64_LEN]) -> Self {
        Self(bytes.to_vec())
    }

    /// The null address.
    pub fn null() -> Self {
        Self(Vec::new())
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Number of address bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True for the null (zero-length) address.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Short label made of the last two bytes in upper-case hex.
    ///
    /// This is how topology visualizers traditionally tag motes, e.g. an
    /// address ending in `...:00:2a` is labelled `002A`.
    pub fn short_label(&self) -> String {
        let start = self.0.len().saturating_sub(2);
        hex::encode_upper(&self.0[start..])
    }
}

impl From<[u8; EUI64_LEN]> for NodeAddress {
    fn from(bytes: [u8; EUI64_LEN]) -> Self {
        Self::eui64(bytes)
    }
}

impl From<Vec<u8>> for NodeAddress {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl From<&[u8]> for NodeAddress {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }
}

impl fmt::Display for NodeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<null>");
        }
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("-")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl FromStr for NodeAddress {
    type Err = Error;

    /// Parse dash or colon separated hex (`14-15-92-00-00-00-00-01`) or a
    /// plain hex string (`1415920000000001`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let trimmed = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let compact: String = trimmed.chars().filter(|c| *c != '-' && *c != ':').collect();

        if compact.is_empty() {
            return Err(Error::InvalidAddress(format!("empty address: {:?}", s)));
        }

        hex::decode(&compact)
            .map(Self)
            .map_err(|e| Error::InvalidAddress(format!("{:?}: {}", s, e)))
    }
}

/// Serialized as the hex text form; the null address is the empty string.
impl Serialize for NodeAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0.is_empty() {
            return serializer.serialize_str("");
        }
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        if text.trim().is_empty() {
            return Ok(Self::null());
        }
        text.parse().map_err(serde::de::Error::custom)
    }
}
