//! IPv4 CIDR value type used by topology planning.
//!
//! A block must name its network address: `10.0.1.0/24` parses, while
//! `10.0.1.1/24` is rejected because host bits below the prefix are set.

use serde::de;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// Maximum prefix length for IPv4 (32 bits).
const MAX_PREFIX: u8 = 32;

/// Reason a CIDR string was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrParseError {
    /// No `/` separator, so no prefix length.
    #[error("missing '/<prefix>' suffix")]
    MissingPrefix,
    /// The address part is not a dotted-quad IPv4 address.
    #[error("invalid IPv4 address '{0}'")]
    InvalidAddress(String),
    /// The prefix part is not a number.
    #[error("invalid prefix length '{0}'")]
    InvalidPrefix(String),
    /// Prefix length greater than 32.
    #[error("prefix length /{0} exceeds /32")]
    PrefixTooLong(u8),
    /// Address has host bits set below the prefix.
    #[error("{addr}/{prefix} is not a network address (host bits set)")]
    HostBitsSet { addr: Ipv4Addr, prefix: u8 },
}

/// An IPv4 address block in CIDR notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ipv4Cidr {
    addr: Ipv4Addr,
    prefix: u8,
}

impl Ipv4Cidr {
    /// The block's network address.
    pub fn addr(&self) -> Ipv4Addr {
        self.addr
    }

    /// The prefix length (0-32).
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Subnet mask for a prefix length, e.g. /24 -> `0xFFFF_FF00`.
    fn mask(prefix: u8) -> u32 {
        if prefix == 0 {
            0
        } else {
            u32::MAX << (MAX_PREFIX - prefix)
        }
    }

    fn network_bits(&self) -> u32 {
        u32::from(self.addr)
    }

    /// Last address of the block.
    fn broadcast_bits(&self) -> u32 {
        self.network_bits() | !Self::mask(self.prefix)
    }

    /// Whether `other` lies entirely within this block.
    pub fn contains(&self, other: &Ipv4Cidr) -> bool {
        other.prefix >= self.prefix
            && self.network_bits() <= other.network_bits()
            && other.broadcast_bits() <= self.broadcast_bits()
    }
}

impl FromStr for Ipv4Cidr {
    type Err = CidrParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_part, prefix_part) = s.split_once('/').ok_or(CidrParseError::MissingPrefix)?;

        let addr: Ipv4Addr = addr_part
            .parse()
            .map_err(|_| CidrParseError::InvalidAddress(addr_part.to_string()))?;
        let prefix: u8 = prefix_part
            .parse()
            .map_err(|_| CidrParseError::InvalidPrefix(prefix_part.to_string()))?;

        if prefix > MAX_PREFIX {
            return Err(CidrParseError::PrefixTooLong(prefix));
        }
        if u32::from(addr) & !Self::mask(prefix) != 0 {
            return Err(CidrParseError::HostBitsSet { addr, prefix });
        }

        Ok(Self { addr, prefix })
    }
}

impl fmt::Display for Ipv4Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.addr, self.prefix)
    }
}

impl Serialize for Ipv4Cidr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Ipv4Cidr {
    fn deserialize<D>(deserializer: D) -> Result<Ipv4Cidr, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(de::Error::custom)
    }
}
