use thiserror::Error;

use crate::{bytes::MalformedField, Emitter};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Envelope or payload byte layout violated
    #[error("Malformed: {0}")]
    Malformed(#[from] MalformedField),

    #[error("UnknownGuardianSet: no guardian set with index {0}")]
    UnknownGuardianSet(u32),

    #[error("GuardianSetExpired: guardian set {index} expired at {expired_at}")]
    GuardianSetExpired { index: u32, expired_at: u64 },

    /// Guardian indices must be strictly increasing
    #[error("SignatureIndicesNotAscending: guardian index {index} at position {position}")]
    SignatureIndicesNotAscending { index: u8, position: usize },

    #[error("InvalidSignature: signature from guardian index {index} does not verify")]
    InvalidSignature { index: u8 },

    #[error("NoQuorum: {signatures} signatures for a set of {guardians} guardians")]
    NoQuorum { signatures: usize, guardians: usize },

    #[error("EmitterMismatch: expected {expected}, got {actual}")]
    EmitterMismatch { expected: Emitter, actual: Emitter },

    #[error("ReplayedMessage: {emitter} sequence {sequence} was already consumed")]
    ReplayedMessage { emitter: Emitter, sequence: u64 },

    /// Governance module identifier is not the one this handler serves
    #[error("InvalidGovernanceModule")]
    InvalidGovernanceModule,

    #[error("UnknownGovernanceAction: {0}")]
    UnknownGovernanceAction(u8),

    /// Governance packet targets a chain other than this one
    #[error("InvalidGovernanceChain: {0}")]
    InvalidGovernanceChain(u16),

    /// Governance VAAs must be signed by the current guardian set
    #[error("NotCurrentGuardianSet: signed by set {0}")]
    NotCurrentGuardianSet(u32),

    #[error("GuardianSetIndexMismatch: expected {expected}, got {actual}")]
    GuardianSetIndexMismatch { expected: u32, actual: u32 },

    /// A guardian set with no members can never reach quorum
    #[error("EmptyGuardianSet: guardian set {0} has no guardians")]
    EmptyGuardianSet(u32),
}

