//! VAA's represent a collection of signatures combined with a message and its metadata. VAA's are
//! used as a form of proof; by submitting a VAA to a target contract, the receiving contract can
//! make assumptions about the validity of state on the source chain.
//!
//! Layout, all integers big-endian:
//!
//! ```markdown
//! 0   .. 1:   version (always 1)
//! 1   .. 5:   guardian set index
//! 5   .. 6:   signature count
//! 6   .. 6 + 66 * count: signatures
//! --- body, the hashed and signed region ---
//! 0   .. 4:   timestamp
//! 4   .. 8:   nonce
//! 8   .. 10:  emitter chain
//! 10  .. 42:  emitter address
//! 42  .. 50:  sequence
//! 50  .. 51:  consistency level
//! 51  ..:     payload
//! ```

use k256::ecdsa::{RecoveryId, VerifyingKey};
use sha3::{Digest as _, Keccak256};

use crate::{
    bytes::{BytesReader, MalformedField, WriteBytes},
    Address, Chain, Emitter, Error, GuardianAddress, GuardianSetInfo,
};

pub const VERSION: u8 = 1;
pub const HEADER_LEN: usize = 6;
pub const SIGNATURE_LEN: usize = 66;
pub const BODY_HEADER_LEN: usize = 51;

/// Signatures are ECDSA signatures prefixed with the signer's position in the guardian set:
/// ```markdown
/// 0  .. 1:  guardian index
/// 1  .. 33: r
/// 33 .. 65: s
/// 65 .. 66: recovery id
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub index: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
    pub recovery_id: u8,
}

impl Signature {
    fn parse(reader: &mut BytesReader<'_>) -> Result<Self, MalformedField> {
        Ok(Signature {
            index: reader.read_u8()?,
            r: reader.read_array()?,
            s: reader.read_array()?,
            recovery_id: reader.read_u8()?,
        })
    }

    fn write(&self, out: &mut Vec<u8>) {
        out.put_u8(self.index);
        out.put_slice(&self.r);
        out.put_slice(&self.s);
        out.put_u8(self.recovery_id);
    }

    /// Recovers the address of the key that produced this signature over `prehash`.
    pub fn recover(&self, prehash: &[u8; 32]) -> Option<GuardianAddress> {
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(&self.r);
        rs[32..].copy_from_slice(&self.s);

        let signature = k256::ecdsa::Signature::from_slice(&rs).ok()?;
        let recovery_id = RecoveryId::from_byte(self.recovery_id)?;
        let key = VerifyingKey::recover_from_prehash(prehash, &signature, recovery_id).ok()?;
        Some(GuardianAddress::from_verifying_key(&key))
    }
}

/// The signed portion of a VAA.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Body {
    /// Seconds since UNIX epoch.
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
}

impl Body {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        Ok(Body {
            timestamp: reader.read_u32()?,
            nonce: reader.read_u32()?,
            emitter_chain: reader.read_u16()?.into(),
            emitter_address: reader.read_address()?,
            sequence: reader.read_u64()?,
            consistency_level: reader.read_u8()?,
            payload: reader.remaining_bytes().to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(BODY_HEADER_LEN + self.payload.len());
        out.put_u32(self.timestamp);
        out.put_u32(self.nonce);
        out.put_u16(self.emitter_chain.into());
        out.put_address(&self.emitter_address);
        out.put_u64(self.sequence);
        out.put_u8(self.consistency_level);
        out.put_slice(&self.payload);
        out
    }

    pub fn digest(&self) -> Digest {
        digest(&self.serialize())
    }
}

/// Digest data for the Body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Digest {
    /// Keccak-256 of the body.
    pub hash: [u8; 32],

    /// Keccak-256 of `hash`. Guardians sign this value, so it is also the prehash that
    /// signer recovery runs against.
    pub secp256k_hash: [u8; 32],
}

/// Calculates the digest for `body` to be used in VAA operations.
pub fn digest(body: &[u8]) -> Digest {
    let hash: [u8; 32] = Keccak256::digest(body).into();
    let secp256k_hash: [u8; 32] = Keccak256::digest(hash).into();

    Digest {
        hash,
        secp256k_hash,
    }
}

/// A parsed VAA. Parsing alone proves nothing; see [`Vaa::verify_signatures`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Vaa {
    pub version: u8,
    pub guardian_set_index: u32,
    pub signatures: Vec<Signature>,
    pub timestamp: u32,
    pub nonce: u32,
    pub emitter_chain: Chain,
    pub emitter_address: Address,
    pub sequence: u64,
    pub consistency_level: u8,
    pub payload: Vec<u8>,
    pub digest: Digest,
}

impl Vaa {
    /// Splits the envelope into header and body. The version byte is returned as-is; checking it
    /// is part of verification.
    pub fn parse(data: &[u8]) -> Result<Self, Error> {
        let mut reader = BytesReader::new(data);
        let version = reader.read_u8()?;
        let guardian_set_index = reader.read_u32()?;
        let count = reader.read_u8()?;

        let signatures = (0..count)
            .map(|_| Signature::parse(&mut reader))
            .collect::<Result<Vec<_>, _>>()?;

        if reader.remaining() < BODY_HEADER_LEN {
            return Err(reader.malformed("VAA body is too short").into());
        }
        let body_bytes = reader.remaining_bytes();
        let body = Body::parse(body_bytes)?;

        Ok(Vaa {
            version,
            guardian_set_index,
            signatures,
            timestamp: body.timestamp,
            nonce: body.nonce,
            emitter_chain: body.emitter_chain,
            emitter_address: body.emitter_address,
            sequence: body.sequence,
            consistency_level: body.consistency_level,
            payload: body.payload,
            digest: digest(body_bytes),
        })
    }

    /// Assembles an envelope from its parts; the digest is recomputed from `body`.
    pub fn new(guardian_set_index: u32, signatures: Vec<Signature>, body: Body) -> Self {
        let digest = body.digest();
        Vaa {
            version: VERSION,
            guardian_set_index,
            signatures,
            timestamp: body.timestamp,
            nonce: body.nonce,
            emitter_chain: body.emitter_chain,
            emitter_address: body.emitter_address,
            sequence: body.sequence,
            consistency_level: body.consistency_level,
            payload: body.payload,
            digest,
        }
    }

    pub fn body(&self) -> Body {
        Body {
            timestamp: self.timestamp,
            nonce: self.nonce,
            emitter_chain: self.emitter_chain,
            emitter_address: self.emitter_address,
            sequence: self.sequence,
            consistency_level: self.consistency_level,
            payload: self.payload.clone(),
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        let body = self.body().serialize();
        let mut out =
            Vec::with_capacity(HEADER_LEN + SIGNATURE_LEN * self.signatures.len() + body.len());
        out.put_u8(self.version);
        out.put_u32(self.guardian_set_index);
        // Count is bounded by the u8 guardian index space.
        out.put_u8(self.signatures.len().min(u8::MAX as usize) as u8);
        for sig in self.signatures.iter().take(u8::MAX as usize) {
            sig.write(&mut out);
        }
        out.put_slice(&body);
        out
    }

    pub fn emitter(&self) -> Emitter {
        Emitter {
            chain: self.emitter_chain,
            address: self.emitter_address,
        }
    }

    pub fn check_emitter(&self, expected: Emitter) -> Result<(), Error> {
        let actual = self.emitter();
        if actual != expected {
            return Err(Error::EmitterMismatch { expected, actual });
        }
        Ok(())
    }

    /// Checks every signature against `guardian_set` and then the quorum. Signatures must be
    /// sorted by strictly increasing guardian index, which also rules out duplicates.
    pub fn verify_signatures(&self, guardian_set: &GuardianSetInfo) -> Result<(), Error> {
        let mut last_index: Option<u8> = None;

        for (position, sig) in self.signatures.iter().enumerate() {
            if last_index.is_some_and(|last| sig.index <= last) {
                return Err(Error::SignatureIndicesNotAscending {
                    index: sig.index,
                    position,
                });
            }
            last_index = Some(sig.index);

            let expected = guardian_set
                .addresses
                .get(usize::from(sig.index))
                .ok_or(Error::InvalidSignature { index: sig.index })?;
            match sig.recover(&self.digest.secp256k_hash) {
                Some(signer) if signer == *expected => {}
                _ => return Err(Error::InvalidSignature { index: sig.index }),
            }
        }

        if !guardian_set.has_quorum(self.signatures.len()) {
            return Err(Error::NoQuorum {
                signatures: self.signatures.len(),
                guardians: guardian_set.addresses.len(),
            });
        }

        Ok(())
    }
}
