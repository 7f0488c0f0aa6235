//! An in-memory [`Host`] for tests and local simulation.

use std::collections::{BTreeMap, BTreeSet};

use bridge_core::Address;
use primitive_types::U256;

use crate::{Host, TokenError, TokenInfo};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FakeToken {
    pub info: TokenInfo,
    pub balances: BTreeMap<Address, U256>,
    pub total_supply: U256,
    /// Deployed by the bridge; only such tokens may be minted or burned by it.
    pub bridge_minted: bool,
}

#[derive(Debug, Default, Clone)]
struct Inner {
    tokens: BTreeMap<Address, FakeToken>,
    native: BTreeMap<Address, U256>,
    frozen: BTreeSet<Address>,
    upgrades: Vec<Address>,
}

impl Inner {
    fn token_mut(&mut self, token: &Address) -> Result<&mut FakeToken, TokenError> {
        self.tokens
            .get_mut(token)
            .ok_or(TokenError::UnknownToken(*token))
    }

    fn check_frozen(&self, account: &Address) -> Result<(), TokenError> {
        if self.frozen.contains(account) {
            return Err(TokenError::Unauthorized(format!("account {account} is frozen")));
        }
        Ok(())
    }

    fn debit(&mut self, token: &Address, account: &Address, amount: U256) -> Result<(), TokenError> {
        self.check_frozen(account)?;
        let t = self.token_mut(token)?;
        let balance = t.balances.entry(*account).or_default();
        if *balance < amount {
            return Err(TokenError::InsufficientFunds {
                token: *token,
                account: *account,
                needed: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&mut self, token: &Address, account: &Address, amount: U256) -> Result<(), TokenError> {
        self.check_frozen(account)?;
        let t = self.token_mut(token)?;
        let balance = t.balances.entry(*account).or_default();
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    fn move_tokens(
        &mut self,
        token: &Address,
        from: &Address,
        to: &Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.debit(token, from, amount)?;
        self.credit(token, to, amount)
    }

    fn mint_to(&mut self, token: &Address, to: &Address, amount: U256) -> Result<(), TokenError> {
        self.credit(token, to, amount)?;
        let t = self.token_mut(token)?;
        t.total_supply = t.total_supply.saturating_add(amount);
        Ok(())
    }

    fn burn_from(&mut self, token: &Address, from: &Address, amount: U256) -> Result<(), TokenError> {
        self.debit(token, from, amount)?;
        let t = self.token_mut(token)?;
        t.total_supply = t.total_supply.saturating_sub(amount);
        Ok(())
    }

    fn require_bridge_minted(&mut self, token: &Address) -> Result<(), TokenError> {
        if !self.token_mut(token)?.bridge_minted {
            return Err(TokenError::Unauthorized(format!(
                "{token} is not controlled by the bridge"
            )));
        }
        Ok(())
    }
}

/// Token balances, native currency balances and a custody account, with a stack of checkpoints
/// mirroring the bridge's transactions.
#[derive(Debug, Clone)]
pub struct FakeHost {
    custody: Address,
    inner: Inner,
    checkpoints: Vec<Inner>,
}

impl FakeHost {
    /// `custody` is the account holding locked tokens.
    pub fn new(custody: Address) -> Self {
        FakeHost {
            custody,
            inner: Inner::default(),
            checkpoints: Vec::new(),
        }
    }

    pub fn custody(&self) -> Address {
        self.custody
    }

    /// Registers a token native to this chain.
    pub fn add_token(&mut self, token: Address, info: TokenInfo) {
        let _ = self.inner.tokens.insert(
            token,
            FakeToken {
                info,
                ..FakeToken::default()
            },
        );
    }

    /// Test setup: mints any token to `account`.
    pub fn fund(&mut self, token: &Address, account: &Address, amount: U256) {
        let t = self.inner.tokens.entry(*token).or_default();
        let balance = t.balances.entry(*account).or_default();
        *balance = balance.saturating_add(amount);
        t.total_supply = t.total_supply.saturating_add(amount);
    }

    pub fn fund_native(&mut self, account: &Address, amount: U256) {
        let balance = self.inner.native.entry(*account).or_default();
        *balance = balance.saturating_add(amount);
    }

    /// Every later movement into or out of `account` fails.
    pub fn freeze(&mut self, account: Address) {
        let _ = self.inner.frozen.insert(account);
    }

    pub fn token(&self, token: &Address) -> Option<&FakeToken> {
        self.inner.tokens.get(token)
    }

    pub fn balance(&self, token: &Address, account: &Address) -> U256 {
        self.token(token)
            .and_then(|t| t.balances.get(account))
            .copied()
            .unwrap_or_default()
    }

    pub fn total_supply(&self, token: &Address) -> U256 {
        self.token(token).map(|t| t.total_supply).unwrap_or_default()
    }

    pub fn native_balance(&self, account: &Address) -> U256 {
        self.inner.native.get(account).copied().unwrap_or_default()
    }

    pub fn upgrades(&self) -> &[Address] {
        &self.inner.upgrades
    }

    /// Open checkpoints; zero between calls.
    pub fn depth(&self) -> usize {
        self.checkpoints.len()
    }
}

impl Host for FakeHost {
    fn token_info(&self, token: &Address) -> Result<TokenInfo, TokenError> {
        self.token(token)
            .map(|t| t.info.clone())
            .ok_or(TokenError::UnknownToken(*token))
    }

    fn lock(&mut self, token: &Address, owner: &Address, amount: U256) -> Result<(), TokenError> {
        let custody = self.custody;
        self.inner.move_tokens(token, owner, &custody, amount)
    }

    fn release(
        &mut self,
        token: &Address,
        recipient: &Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let custody = self.custody;
        self.inner.move_tokens(token, &custody, recipient, amount)
    }

    fn mint(
        &mut self,
        token: &Address,
        recipient: &Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        self.inner.require_bridge_minted(token)?;
        self.inner.mint_to(token, recipient, amount)
    }

    fn burn(&mut self, token: &Address, owner: &Address, amount: U256) -> Result<(), TokenError> {
        self.inner.require_bridge_minted(token)?;
        self.inner.burn_from(token, owner, amount)
    }

    fn create_wrapped(&mut self, asset: &Address, info: &TokenInfo) -> Result<(), TokenError> {
        if self.inner.tokens.contains_key(asset) {
            return Err(TokenError::Unauthorized(format!("{asset} already exists")));
        }
        let _ = self.inner.tokens.insert(
            *asset,
            FakeToken {
                info: info.clone(),
                bridge_minted: true,
                ..FakeToken::default()
            },
        );
        Ok(())
    }

    fn update_wrapped(&mut self, asset: &Address, info: &TokenInfo) -> Result<(), TokenError> {
        self.inner.require_bridge_minted(asset)?;
        self.inner.token_mut(asset)?.info = info.clone();
        Ok(())
    }

    fn deposit_native(
        &mut self,
        wrapped_native: &Address,
        sender: &Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let balance = self.native_balance(sender);
        if balance < amount {
            return Err(TokenError::InsufficientFunds {
                token: Address::default(),
                account: *sender,
                needed: amount,
                available: balance,
            });
        }
        let _ = self.inner.native.insert(*sender, balance - amount);
        let custody = self.custody;
        self.inner.mint_to(wrapped_native, &custody, amount)
    }

    fn withdraw_native(
        &mut self,
        wrapped_native: &Address,
        recipient: &Address,
        amount: U256,
    ) -> Result<(), TokenError> {
        let custody = self.custody;
        self.inner.burn_from(wrapped_native, &custody, amount)?;
        self.inner.check_frozen(recipient)?;
        self.fund_native(recipient, amount);
        Ok(())
    }

    fn upgrade_contract(&mut self, new_contract: &Address) -> Result<(), TokenError> {
        self.inner.upgrades.push(*new_contract);
        Ok(())
    }

    fn checkpoint(&mut self) {
        self.checkpoints.push(self.inner.clone());
    }

    fn commit(&mut self) {
        let _ = self.checkpoints.pop();
    }

    fn rollback(&mut self) {
        if let Some(inner) = self.checkpoints.pop() {
            self.inner = inner;
        }
    }
}
