use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    bytes::MalformedField,
    governance::{GovernancePacket, GuardianSetUpgrade, ACTION_GUARDIAN_SET_UPGRADE, CORE_MODULE},
    vaa::VERSION,
    Address, Chain, CoreConfig, Emitter, Error, GuardianSetInfo, GuardianSets, Vaa,
};

/// A message published by a contract on this chain, waiting for guardians to observe and sign it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostedMessage {
    pub emitter: Emitter,
    pub sequence: u64,
    pub nonce: u32,
    pub consistency_level: u8,
    #[serde(with = "hex_payload")]
    pub payload: Vec<u8>,
}

mod hex_payload {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(v))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(D::Error::custom)
    }
}

/// The core contract: guardian sets, VAA verification and message publishing.
#[derive(Debug, Clone)]
pub struct CoreBridge {
    config: CoreConfig,
    guardian_sets: GuardianSets,
    consumed_governance: BTreeSet<(Chain, Address, u64)>,
    sequences: BTreeMap<Address, u64>,
}

impl CoreBridge {
    pub fn new(config: CoreConfig) -> Self {
        let initial = GuardianSetInfo::new(config.initial_guardian_set.clone());
        let guardian_sets = GuardianSets::new(initial, config.guardian_set_expiry);
        CoreBridge {
            config,
            guardian_sets,
            consumed_governance: BTreeSet::new(),
            sequences: BTreeMap::new(),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    pub fn chain_id(&self) -> Chain {
        self.config.chain_id
    }

    pub fn guardian_sets(&self) -> &GuardianSets {
        &self.guardian_sets
    }

    /// Parses `data` and authenticates it against the guardian set it names. Performs no
    /// mutation.
    pub fn parse_and_verify_vaa(&self, data: &[u8], block_time: u64) -> Result<Vaa, Error> {
        let vaa = Vaa::parse(data)?;

        if vaa.version != VERSION {
            return Err(MalformedField {
                offset: 0,
                reason: "unsupported VAA version",
            }
            .into());
        }

        let guardian_set = self
            .guardian_sets
            .active(vaa.guardian_set_index, block_time)?;
        vaa.verify_signatures(guardian_set)?;

        Ok(vaa)
    }

    /// Like [`CoreBridge::parse_and_verify_vaa`], additionally requiring the VAA to come from
    /// `expected` when given.
    pub fn verify(
        &self,
        data: &[u8],
        block_time: u64,
        expected: Option<Emitter>,
    ) -> Result<Vaa, Error> {
        let vaa = self.parse_and_verify_vaa(data, block_time)?;
        if let Some(expected) = expected {
            vaa.check_emitter(expected)?;
        }
        Ok(vaa)
    }

    pub fn is_governance_consumed(&self, sequence: u64) -> bool {
        self.consumed_governance.contains(&(
            self.config.governance_chain,
            self.config.governance_contract,
            sequence,
        ))
    }

    /// Applies a core governance VAA. Only guardian set upgrades are understood.
    pub fn submit_governance_vaa(
        &mut self,
        data: &[u8],
        block_time: u64,
    ) -> Result<GuardianSetUpgrade, Error> {
        let vaa = self.verify(data, block_time, Some(self.config.governance_emitter()))?;

        if vaa.guardian_set_index != self.guardian_sets.current_index() {
            return Err(Error::NotCurrentGuardianSet(vaa.guardian_set_index));
        }

        let packet = GovernancePacket::parse(&vaa.payload)?;
        packet.check_target(&CORE_MODULE, self.config.chain_id)?;

        if packet.action != ACTION_GUARDIAN_SET_UPGRADE {
            return Err(Error::UnknownGovernanceAction(packet.action));
        }

        let key = (vaa.emitter_chain, vaa.emitter_address, vaa.sequence);
        if self.consumed_governance.contains(&key) {
            return Err(Error::ReplayedMessage {
                emitter: vaa.emitter(),
                sequence: vaa.sequence,
            });
        }

        let upgrade = GuardianSetUpgrade::parse(&packet.payload)?;
        let mut guardian_sets = self.guardian_sets.clone();
        guardian_sets.upgrade(
            upgrade.new_guardian_set_index,
            upgrade.new_guardian_set.clone(),
            block_time,
        )?;

        let _ = self.consumed_governance.insert(key);
        self.guardian_sets = guardian_sets;

        info!(
            index = upgrade.new_guardian_set_index,
            guardians = upgrade.new_guardian_set.len(),
            sequence = vaa.sequence,
            "guardian set upgraded"
        );
        Ok(upgrade)
    }

    /// Publishes `payload` under `emitter`, assigning the emitter's next sequence number.
    pub fn post_message(
        &mut self,
        emitter: Address,
        nonce: u32,
        consistency_level: u8,
        payload: Vec<u8>,
    ) -> PostedMessage {
        let next = self.sequences.entry(emitter).or_default();
        let sequence = *next;
        *next = sequence.saturating_add(1);

        debug!(%emitter, sequence, nonce, len = payload.len(), "message published");
        PostedMessage {
            emitter: Emitter {
                chain: self.config.chain_id,
                address: emitter,
            },
            sequence,
            nonce,
            consistency_level,
            payload,
        }
    }

    pub fn next_sequence(&self, emitter: &Address) -> u64 {
        self.sequences.get(emitter).copied().unwrap_or_default()
    }
}
