use serde::{Deserialize, Serialize};

use crate::{Address, Chain, Emitter, GuardianAddress};

/// Parameters of the core contract, fixed at instantiation.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Wire id of the chain this instance runs on.
    pub chain_id: Chain,

    /// Source of governance VAAs.
    pub governance_chain: Chain,
    pub governance_contract: Address,

    /// Seconds a superseded guardian set keeps authenticating messages.
    pub guardian_set_expiry: u64,

    pub initial_guardian_set: Vec<GuardianAddress>,
}

impl CoreConfig {
    pub fn governance_emitter(&self) -> Emitter {
        Emitter {
            chain: self.governance_chain,
            address: self.governance_contract,
        }
    }
}
