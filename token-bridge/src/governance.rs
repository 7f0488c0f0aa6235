//! Token bridge governance actions, carried in a [`GovernancePacket`] addressed to the
//! `TokenBridge` module.

use bridge_core::{
    bytes::{BytesReader, MalformedField, WriteBytes},
    governance::{module_id, GovernancePacket},
    Address, Chain, Error,
};

pub const TOKEN_BRIDGE_MODULE: [u8; 32] = module_id(b"TokenBridge");

pub const ACTION_REGISTER_CHAIN: u8 = 1;
pub const ACTION_UPGRADE_CONTRACT: u8 = 2;

/// Trusts `emitter_address` as the token bridge of `emitter_chain`, replacing any earlier entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterChain {
    pub emitter_chain: Chain,
    pub emitter_address: Address,
}

impl RegisterChain {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        let action = RegisterChain {
            emitter_chain: reader.read_u16()?.into(),
            emitter_address: reader.read_address()?,
        };
        reader.finish()?;
        Ok(action)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpgradeContract {
    pub new_contract: Address,
}

impl UpgradeContract {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        let new_contract = reader.read_address()?;
        reader.finish()?;
        Ok(UpgradeContract { new_contract })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    RegisterChain(RegisterChain),
    UpgradeContract(UpgradeContract),
}

impl Action {
    pub fn code(&self) -> u8 {
        match self {
            Action::RegisterChain(_) => ACTION_REGISTER_CHAIN,
            Action::UpgradeContract(_) => ACTION_UPGRADE_CONTRACT,
        }
    }

    /// Decodes the action of a packet already checked to belong to [`TOKEN_BRIDGE_MODULE`].
    pub fn parse(packet: &GovernancePacket) -> Result<Self, Error> {
        match packet.action {
            ACTION_REGISTER_CHAIN => Ok(Action::RegisterChain(RegisterChain::parse(
                &packet.payload,
            )?)),
            ACTION_UPGRADE_CONTRACT => Ok(Action::UpgradeContract(UpgradeContract::parse(
                &packet.payload,
            )?)),
            other => Err(Error::UnknownGovernanceAction(other)),
        }
    }

    /// Full governance payload for this action addressed to `target`.
    pub fn to_packet(&self, target: Chain) -> GovernancePacket {
        let mut payload = Vec::new();
        match self {
            Action::RegisterChain(r) => {
                payload.put_u16(r.emitter_chain.into());
                payload.put_address(&r.emitter_address);
            }
            Action::UpgradeContract(u) => payload.put_address(&u.new_contract),
        }
        GovernancePacket {
            module: TOKEN_BRIDGE_MODULE,
            action: self.code(),
            chain: target,
            payload,
        }
    }
}
