use std::collections::{BTreeMap, BTreeSet, HashMap};

use bridge_core::{Address, Chain, Emitter};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::ContractError;

/// Identity of the wrapped representation of a foreign token: `keccak256(chain || address)`.
pub fn wrapped_asset_id(chain: Chain, address: &Address) -> Address {
    let mut hasher = Keccak256::new();
    hasher.update(u16::from(chain).to_be_bytes());
    hasher.update(address.0);
    Address(hasher.finalize().into())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct WrappedAssetRecord {
    /// Local address of the wrapped token.
    pub asset: Address,
    pub token_chain: Chain,
    pub token_address: Address,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    /// Sequence of the attestation the metadata was taken from.
    pub sequence: u64,
}

/// Identifies a consumed message.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplayKey {
    pub chain: Chain,
    pub emitter: Address,
    pub sequence: u64,
}

impl ReplayKey {
    pub fn new(emitter: Emitter, sequence: u64) -> Self {
        ReplayKey {
            chain: emitter.chain,
            emitter: emitter.address,
            sequence,
        }
    }

    fn replayed(&self) -> ContractError {
        bridge_core::Error::ReplayedMessage {
            emitter: Emitter {
                chain: self.chain,
                address: self.emitter,
            },
            sequence: self.sequence,
        }
        .into()
    }
}

/// Everything the bridge persists between calls.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BridgeState {
    bridge_contracts: BTreeMap<Chain, Address>,
    wrapped_assets: BTreeMap<(Chain, Address), WrappedAssetRecord>,
    wrapped_origins: HashMap<Address, (Chain, Address)>,
    /// Native tokens currently held on other chains, in wire units.
    outstanding: BTreeMap<Address, u64>,
    consumed: BTreeSet<ReplayKey>,
    consumed_governance: BTreeSet<ReplayKey>,
}

impl BridgeState {
    /// Returns the address previously registered for `chain`, if any.
    pub fn register_bridge(&mut self, chain: Chain, address: Address) -> Option<Address> {
        self.bridge_contracts.insert(chain, address)
    }

    pub fn bridge_contract(&self, chain: Chain) -> Option<Address> {
        self.bridge_contracts.get(&chain).copied()
    }

    pub fn wrapped(&self, chain: Chain, address: &Address) -> Option<&WrappedAssetRecord> {
        self.wrapped_assets.get(&(chain, *address))
    }

    pub fn wrapped_by_asset(&self, asset: &Address) -> Option<&WrappedAssetRecord> {
        self.wrapped_origins
            .get(asset)
            .and_then(|key| self.wrapped_assets.get(key))
    }

    pub fn is_wrapped(&self, asset: &Address) -> bool {
        self.wrapped_origins.contains_key(asset)
    }

    /// Inserts or replaces the record for its origin key and keeps the reverse index in step.
    pub fn put_wrapped(&mut self, record: WrappedAssetRecord) {
        let key = (record.token_chain, record.token_address);
        let _ = self.wrapped_origins.insert(record.asset, key);
        let _ = self.wrapped_assets.insert(key, record);
    }

    pub fn outstanding(&self, token: &Address) -> u64 {
        self.outstanding.get(token).copied().unwrap_or_default()
    }

    /// Adds `amount` wire units to the outstanding supply of a native token. Nothing changes if
    /// the total would leave the u64 range every chain can represent.
    pub fn bridge_out(&mut self, token: Address, amount: U256) -> Result<u64, ContractError> {
        let outstanding = self.outstanding(&token);
        let total = U256::from(outstanding)
            .checked_add(amount)
            .filter(|t| *t <= U256::from(u64::MAX))
            .ok_or(ContractError::OutstandingSupplyOverflow {
                token,
                outstanding,
                amount,
            })?;
        let total = total.low_u64();
        let _ = self.outstanding.insert(token, total);
        Ok(total)
    }

    /// Removes `amount` wire units from the outstanding supply of a native token.
    pub fn bridge_in(&mut self, token: Address, amount: U256) -> Result<u64, ContractError> {
        let outstanding = self.outstanding(&token);
        let underflow = ContractError::OutstandingSupplyUnderflow {
            token,
            outstanding,
            amount,
        };
        if amount > U256::from(outstanding) {
            return Err(underflow);
        }
        let left = outstanding - amount.low_u64();
        let _ = self.outstanding.insert(token, left);
        Ok(left)
    }

    pub fn is_consumed(&self, key: &ReplayKey) -> bool {
        self.consumed.contains(key)
    }

    /// Marks a transfer or attestation as processed; fails if it already was.
    pub fn consume(&mut self, key: ReplayKey) -> Result<(), ContractError> {
        if !self.consumed.insert(key) {
            return Err(key.replayed());
        }
        Ok(())
    }

    pub fn is_governance_consumed(&self, key: &ReplayKey) -> bool {
        self.consumed_governance.contains(key)
    }

    pub fn consume_governance(&mut self, key: ReplayKey) -> Result<(), ContractError> {
        if !self.consumed_governance.insert(key) {
            return Err(key.replayed());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn token() -> Address {
        Address::from_evm([0xaa; 20])
    }

    #[test]
    fn asset_id_depends_on_chain_and_address() {
        let a = wrapped_asset_id(Chain::Solana, &token());
        assert_eq!(a, wrapped_asset_id(Chain::Solana, &token()));
        assert_ne!(a, wrapped_asset_id(Chain::Ethereum, &token()));
        assert_ne!(a, wrapped_asset_id(Chain::Solana, &Address([0xaa; 32])));

        let mut preimage = vec![0x00, 0x01];
        preimage.extend_from_slice(&token().0);
        assert_eq!(a.0, <[u8; 32]>::from(Keccak256::digest(&preimage)));
    }

    #[test]
    fn wrapped_lookup_both_ways() {
        let mut state = BridgeState::default();
        let asset = wrapped_asset_id(Chain::Solana, &token());
        state.put_wrapped(WrappedAssetRecord {
            asset,
            token_chain: Chain::Solana,
            token_address: token(),
            decimals: 9,
            symbol: "SOL".into(),
            name: "Solana".into(),
            sequence: 3,
        });

        assert!(state.is_wrapped(&asset));
        assert!(!state.is_wrapped(&token()));
        assert_eq!(state.wrapped(Chain::Solana, &token()).unwrap().asset, asset);
        assert_eq!(state.wrapped_by_asset(&asset).unwrap().decimals, 9);
        assert!(state.wrapped(Chain::Ethereum, &token()).is_none());
    }

    #[test]
    fn outstanding_guards() {
        let mut state = BridgeState::default();
        let t = token();

        assert_eq!(state.bridge_out(t, U256::from(u64::MAX - 1)).unwrap(), u64::MAX - 1);
        assert_eq!(state.bridge_out(t, U256::one()).unwrap(), u64::MAX);
        assert_eq!(
            state.bridge_out(t, U256::one()).unwrap_err(),
            ContractError::OutstandingSupplyOverflow {
                token: t,
                outstanding: u64::MAX,
                amount: U256::one(),
            }
        );
        assert!(state.bridge_out(t, U256::MAX).is_err());
        assert_eq!(state.outstanding(&t), u64::MAX);

        assert_eq!(state.bridge_in(t, U256::from(u64::MAX)).unwrap(), 0);
        assert!(matches!(
            state.bridge_in(t, U256::one()),
            Err(ContractError::OutstandingSupplyUnderflow { outstanding: 0, .. })
        ));
    }

    #[test]
    fn consume_once() {
        let mut state = BridgeState::default();
        let key = ReplayKey {
            chain: Chain::Solana,
            emitter: token(),
            sequence: 7,
        };
        state.consume(key).unwrap();
        assert!(state.is_consumed(&key));
        assert!(matches!(
            state.consume(key),
            Err(ContractError::Core(bridge_core::Error::ReplayedMessage { sequence: 7, .. }))
        ));

        // The governance set is separate.
        assert!(!state.is_governance_consumed(&key));
        state.consume_governance(key).unwrap();
        assert!(state.consume_governance(key).is_err());
    }

    #[test]
    fn registration_overwrites() {
        let mut state = BridgeState::default();
        assert_eq!(state.register_bridge(Chain::Solana, Address([1; 32])), None);
        assert_eq!(
            state.register_bridge(Chain::Solana, Address([2; 32])),
            Some(Address([1; 32]))
        );
        assert_eq!(state.bridge_contract(Chain::Solana), Some(Address([2; 32])));
    }
}
