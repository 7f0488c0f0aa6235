//! The token bridge moves fungible tokens between chains on the strength of guardian-signed
//! messages (VAAs).
//!
//! Tokens native to this chain are locked in custody when they leave and released when they come
//! back; the bridge tracks how much of each is outstanding on other chains. Foreign tokens are
//! represented by wrapped tokens that the bridge mints on arrival and burns on departure, created
//! from attestations published by the token's origin chain.
//!
//! All amounts on the wire are normalized to 8 decimals, see [`normalize`].

mod config;
mod contract;
mod error;
pub mod fake;
pub mod governance;
pub mod host;
pub mod message;
pub mod normalize;
pub mod state;

pub use crate::{
    config::Config,
    contract::{
        CompletedTransfer, Env, GovernanceOutcome, MessageInfo, Submitted, TokenBridge,
        TransferRequest,
    },
    error::{ContractError, TokenError},
    host::{Host, TokenInfo},
};
