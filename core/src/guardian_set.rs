//! Guardian sets and their lifecycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Error, GuardianAddress};

/// A `GuardianSet` is a versioned set of keys that can sign messages.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct GuardianSetInfo {
    pub addresses: Vec<GuardianAddress>,

    /// Unix seconds after which the set can no longer authenticate. `None` while current.
    #[serde(default)]
    pub expiration_time: Option<u64>,
}

impl GuardianSetInfo {
    pub fn new(addresses: Vec<GuardianAddress>) -> Self {
        GuardianSetInfo {
            addresses,
            expiration_time: None,
        }
    }

    /// Smallest signature count that is strictly more than two thirds of the set.
    pub fn quorum(&self) -> usize {
        self.addresses.len() * 2 / 3 + 1
    }

    /// `signatures * 3 > guardians * 2`
    pub fn has_quorum(&self, signatures: usize) -> bool {
        signatures * 3 > self.addresses.len() * 2
    }

    pub fn is_expired(&self, block_time: u64) -> bool {
        self.expiration_time
            .map(|expiration| expiration < block_time)
            .unwrap_or(false)
    }
}

/// Every guardian set this chain has seen, keyed by index.
///
/// Superseded sets are kept (with an expiration) so that VAAs signed just before an upgrade can
/// still be redeemed during the grace period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSets {
    current: u32,
    expiry_period: u64,
    sets: BTreeMap<u32, GuardianSetInfo>,
}

impl GuardianSets {
    pub fn new(initial: GuardianSetInfo, expiry_period: u64) -> Self {
        GuardianSets {
            current: 0,
            expiry_period,
            sets: BTreeMap::from([(0, initial)]),
        }
    }

    pub fn current_index(&self) -> u32 {
        self.current
    }

    pub fn current(&self) -> Option<&GuardianSetInfo> {
        self.sets.get(&self.current)
    }

    pub fn get(&self, index: u32) -> Option<&GuardianSetInfo> {
        self.sets.get(&index)
    }

    /// Looks up a set that may still authenticate messages at `block_time`.
    pub fn active(&self, index: u32, block_time: u64) -> Result<&GuardianSetInfo, Error> {
        let set = self.get(index).ok_or(Error::UnknownGuardianSet(index))?;
        match set.expiration_time {
            Some(expired_at) if set.is_expired(block_time) => {
                Err(Error::GuardianSetExpired { index, expired_at })
            }
            _ => Ok(set),
        }
    }

    /// Installs `new_set` as `new_index`, which must directly follow the current index. The
    /// superseded set stays valid for the configured expiry period.
    pub fn upgrade(
        &mut self,
        new_index: u32,
        new_set: Vec<GuardianAddress>,
        block_time: u64,
    ) -> Result<(), Error> {
        let expected = self.current.wrapping_add(1);
        if new_index != expected {
            return Err(Error::GuardianSetIndexMismatch {
                expected,
                actual: new_index,
            });
        }

        if new_set.is_empty() {
            return Err(Error::EmptyGuardianSet(new_index));
        }

        let expiration = block_time.saturating_add(self.expiry_period);
        if let Some(old) = self.sets.get_mut(&self.current) {
            old.expiration_time = Some(expiration);
        }
        let _ = self.sets.insert(new_index, GuardianSetInfo::new(new_set));
        self.current = new_index;
        Ok(())
    }
}
