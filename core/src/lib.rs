//! The `bridge_core` crate provides the chain-agnostic primitives the token bridge is built on.
//!
//! It includes:
//!
//! - A big-endian byte codec used by every wire format.
//! - Parsers for VAA envelopes and their double Keccak-256 digest.
//! - Guardian sets and the signature quorum check that authenticates a VAA.
//! - The core governance module (guardian set upgrades) and message publishing.

#![deny(unused_results)]

use std::fmt;

use serde::{Deserialize, Serialize};
use sha3::{Digest as _, Keccak256};

pub mod bytes;
mod config;
mod contract;
mod error;
pub mod fake;
pub mod governance;
pub mod guardian_set;
mod serde_hex;
pub mod vaa;

pub use bridge_supported_chains::Chain;
pub use {
    config::CoreConfig,
    contract::{CoreBridge, PostedMessage},
    error::Error,
    guardian_set::{GuardianSetInfo, GuardianSets},
    vaa::Vaa,
};

/// Guardians are identified by the last 20 bytes of the Keccak-256 hash of their uncompressed
/// secp256k1 public key, as on Ethereum.
#[derive(
    Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct GuardianAddress(#[serde(with = "serde_hex")] pub [u8; 20]);

impl GuardianAddress {
    pub fn from_verifying_key(key: &k256::ecdsa::VerifyingKey) -> Self {
        use k256::elliptic_curve::sec1::ToEncodedPoint;

        let point = k256::PublicKey::from(key).to_encoded_point(false);
        let hash = Keccak256::digest(&point.as_bytes()[1..]);
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&hash[12..]);
        GuardianAddress(addr)
    }
}

impl fmt::Debug for GuardianAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuardianAddress({})", hex::encode(self.0))
    }
}

/// Addresses on the wire are 32 bytes. Addresses that are shorter, for example 20 byte Ethereum
/// addresses, are left zero padded to 32.
#[derive(
    Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
pub struct Address(#[serde(with = "serde_hex")] pub [u8; 32]);

impl Address {
    /// Left-pads a 20 byte address.
    pub fn from_evm(addr: [u8; 20]) -> Self {
        let mut out = [0u8; 32];
        out[12..].copy_from_slice(&addr);
        Address(out)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|b| *b == 0)
    }
}

impl From<[u8; 32]> for Address {
    fn from(bytes: [u8; 32]) -> Self {
        Address(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// The (chain, address) pair that originated a message.
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Emitter {
    pub chain: Chain,
    pub address: Address,
}

impl fmt::Display for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain, self.address)
    }
}
