use bridge_core::{bytes::MalformedField, Address, Chain};
use primitive_types::U256;
use thiserror::Error;

/// Failures reported by the host's token and custody layer. The bridge surfaces them unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("InsufficientFunds: {account} holds {available} of {token}, needs {needed}")]
    InsufficientFunds {
        token: Address,
        account: Address,
        needed: U256,
        available: U256,
    },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("UnknownToken: {0}")]
    UnknownToken(Address),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContractError {
    /// Parsing, verification, governance header and replay failures
    #[error(transparent)]
    Core(#[from] bridge_core::Error),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("AssetNotAttested: no wrapped asset for {chain}/{address}")]
    AssetNotAttested { chain: Chain, address: Address },

    #[error("OutstandingSupplyOverflow: {token} has {outstanding} outstanding, cannot add {amount}")]
    OutstandingSupplyOverflow {
        token: Address,
        outstanding: u64,
        amount: U256,
    },

    #[error("OutstandingSupplyUnderflow: {token} has {outstanding} outstanding, cannot release {amount}")]
    OutstandingSupplyUnderflow {
        token: Address,
        outstanding: u64,
        amount: U256,
    },

    /// Outbound transfer addressed to the chain it leaves from
    #[error("SameSourceAndTarget: {0} is this chain")]
    SameSourceAndTarget(Chain),

    #[error("AmountTooLow: transfer amount is zero")]
    AmountTooLow,

    #[error("FeeExceedsAmount: fee {fee} is larger than amount {amount}")]
    FeeExceedsAmount { amount: U256, fee: U256 },

    /// Transfer is not directed at this chain
    #[error("WrongTargetChain: {0}")]
    WrongTargetChain(Chain),

    #[error("UnknownPayload: {0}")]
    UnknownPayload(u8),

    /// Attestation claims this chain as the token's origin
    #[error("NativeAssetAttestation: {0} is native to this chain")]
    NativeAssetAttestation(Address),

    /// Wrapped assets can not be attested back out
    #[error("WrappedAssetAttestation: {0} is a wrapped asset")]
    WrappedAssetAttestation(Address),

    #[error("WrappedNativeUnavailable: no wrapped native token configured")]
    WrappedNativeUnavailable,

    #[error("NotWrappedNative: {0} is not the wrapped native token")]
    NotWrappedNative(Address),

    #[error("RedeemerNotRecipient: {redeemer} may not redeem a transfer to {recipient}")]
    RedeemerNotRecipient {
        redeemer: Address,
        recipient: Address,
    },

    /// Denormalizing `amount` to `decimals` does not fit in 256 bits
    #[error("AmountOverflow: {amount} at {decimals} decimals")]
    AmountOverflow { amount: U256, decimals: u8 },
}

impl From<MalformedField> for ContractError {
    fn from(e: MalformedField) -> Self {
        ContractError::Core(e.into())
    }
}
