//! Chain identifiers understood by the token bridge.
//!
//! Every message on the wire names its chains with a `u16`. Known ids get a named variant; any
//! other id is carried losslessly as `Chain::Unknown` so that messages for chains added later can
//! still be parsed and routed.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Chain {
    /// On the wire, 0 indicates that a message is for any destination chain.
    #[default]
    Any,
    Solana,
    Ethereum,
    Terra,
    Bsc,
    Polygon,
    Avalanche,
    Oasis,
    Algorand,
    Aurora,
    Fantom,
    Karura,
    Acala,
    Klaytn,

    // Allow arbitrary u16s to support future chains
    Unknown(u16),
}

/// Named variants with their wire id, in id order.
const KNOWN: [(Chain, u16, &str); 13] = [
    (Chain::Solana, 1, "Solana"),
    (Chain::Ethereum, 2, "Ethereum"),
    (Chain::Terra, 3, "Terra"),
    (Chain::Bsc, 4, "Bsc"),
    (Chain::Polygon, 5, "Polygon"),
    (Chain::Avalanche, 6, "Avalanche"),
    (Chain::Oasis, 7, "Oasis"),
    (Chain::Algorand, 8, "Algorand"),
    (Chain::Aurora, 9, "Aurora"),
    (Chain::Fantom, 10, "Fantom"),
    (Chain::Karura, 11, "Karura"),
    (Chain::Acala, 12, "Acala"),
    (Chain::Klaytn, 13, "Klaytn"),
];

#[derive(Debug, Error)]
#[error("invalid chain: {0}")]
pub struct InvalidChainError(String);

impl From<u16> for Chain {
    fn from(other: u16) -> Chain {
        if other == 0 {
            return Chain::Any;
        }
        KNOWN
            .iter()
            .find(|(_, id, _)| *id == other)
            .map(|(chain, _, _)| *chain)
            .unwrap_or(Chain::Unknown(other))
    }
}

impl From<Chain> for u16 {
    fn from(other: Chain) -> u16 {
        match other {
            Chain::Any => 0,
            Chain::Unknown(c) => c,
            named => KNOWN
                .iter()
                .find(|(chain, _, _)| *chain == named)
                .map(|(_, id, _)| *id)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("Any"),
            Self::Unknown(v) => write!(f, "Unknown({v})"),
            named => {
                let name = KNOWN
                    .iter()
                    .find(|(chain, _, _)| chain == named)
                    .map(|(_, _, name)| *name)
                    .unwrap_or("Unknown");
                f.write_str(name)
            }
        }
    }
}

impl FromStr for Chain {
    type Err = InvalidChainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("any") {
            return Ok(Chain::Any);
        }

        if let Some((chain, _, _)) = KNOWN.iter().find(|(_, _, name)| name.eq_ignore_ascii_case(s)) {
            return Ok(*chain);
        }

        // Handle Unknown(n) format
        let mut parts = s.split(&['(', ')']);
        let _ = parts
            .next()
            .filter(|name| name.eq_ignore_ascii_case("unknown"))
            .ok_or_else(|| InvalidChainError(s.into()))?;

        parts
            .next()
            .and_then(|v| v.parse::<u16>().ok())
            .map(Chain::from)
            .ok_or_else(|| InvalidChainError(s.into()))
    }
}

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u16((*self).into())
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        <u16 as Deserialize>::deserialize(deserializer).map(Self::from)
    }
}
