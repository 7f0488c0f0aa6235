use bridge_core::Address;
use primitive_types::U256;
use serde::{Deserialize, Serialize};

use crate::TokenError;

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
}

/// The token, custody and upgrade machinery of the chain the bridge runs on.
///
/// The bridge brackets every call with [`Host::checkpoint`] and then either [`Host::commit`] or
/// [`Host::rollback`], so a failed call leaves no balance change behind.
pub trait Host {
    fn token_info(&self, token: &Address) -> Result<TokenInfo, TokenError>;

    /// Moves `amount` of `token` from `owner` into bridge custody.
    fn lock(&mut self, token: &Address, owner: &Address, amount: U256) -> Result<(), TokenError>;

    /// Pays `amount` of `token` out of bridge custody.
    fn release(
        &mut self,
        token: &Address,
        recipient: &Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    fn mint(&mut self, token: &Address, recipient: &Address, amount: U256)
        -> Result<(), TokenError>;

    fn burn(&mut self, token: &Address, owner: &Address, amount: U256) -> Result<(), TokenError>;

    /// Deploys a new bridge-controlled token at `asset`.
    fn create_wrapped(&mut self, asset: &Address, info: &TokenInfo) -> Result<(), TokenError>;

    fn update_wrapped(&mut self, asset: &Address, info: &TokenInfo) -> Result<(), TokenError>;

    /// Converts `amount` of native currency sent by `sender` into `wrapped_native` tokens held in
    /// bridge custody.
    fn deposit_native(
        &mut self,
        wrapped_native: &Address,
        sender: &Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Unwraps `amount` of `wrapped_native` from bridge custody and pays it to `recipient` as
    /// native currency.
    fn withdraw_native(
        &mut self,
        wrapped_native: &Address,
        recipient: &Address,
        amount: U256,
    ) -> Result<(), TokenError>;

    fn upgrade_contract(&mut self, new_contract: &Address) -> Result<(), TokenError>;

    fn checkpoint(&mut self);
    fn commit(&mut self);
    fn rollback(&mut self);
}
