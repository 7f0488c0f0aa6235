//! Governance packets.
//!
//! Every governance payload starts with the same header:
//!
//! ```markdown
//! 0  .. 32: module, ASCII name left-padded with zeros
//! 32 .. 33: action
//! 33 .. 35: target chain, 0 for every chain
//! 35 ..:    action specific fields
//! ```

use crate::{
    bytes::{BytesReader, MalformedField, WriteBytes},
    Chain, Error, GuardianAddress,
};

/// Module served by the core contract.
pub const CORE_MODULE: [u8; 32] = module_id(b"Core");

/// Action code of [`GuardianSetUpgrade`] in the core module.
pub const ACTION_GUARDIAN_SET_UPGRADE: u8 = 2;

/// Left-pads an ASCII module name to 32 bytes.
pub const fn module_id(name: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let offset = 32 - name.len();
    let mut i = 0;
    while i < name.len() {
        out[offset + i] = name[i];
        i += 1;
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GovernancePacket {
    pub module: [u8; 32],
    pub action: u8,
    pub chain: Chain,
    pub payload: Vec<u8>,
}

impl GovernancePacket {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        Ok(GovernancePacket {
            module: reader.read_array()?,
            action: reader.read_u8()?,
            chain: reader.read_u16()?.into(),
            payload: reader.remaining_bytes().to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(35 + self.payload.len());
        out.put_slice(&self.module);
        out.put_u8(self.action);
        out.put_u16(self.chain.into());
        out.put_slice(&self.payload);
        out
    }

    /// Checks that the packet belongs to `module` and targets `this_chain` or every chain.
    pub fn check_target(&self, module: &[u8; 32], this_chain: Chain) -> Result<(), Error> {
        if &self.module != module {
            return Err(Error::InvalidGovernanceModule);
        }
        if self.chain != Chain::Any && self.chain != this_chain {
            return Err(Error::InvalidGovernanceChain(self.chain.into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardianSetUpgrade {
    pub new_guardian_set_index: u32,
    pub new_guardian_set: Vec<GuardianAddress>,
}

impl GuardianSetUpgrade {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        let new_guardian_set_index = reader.read_u32()?;
        let n_guardians = reader.read_u8()?;
        let new_guardian_set = (0..n_guardians)
            .map(|_| reader.read_array().map(GuardianAddress))
            .collect::<Result<Vec<_>, _>>()?;
        reader.finish()?;

        Ok(GuardianSetUpgrade {
            new_guardian_set_index,
            new_guardian_set,
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + 20 * self.new_guardian_set.len());
        out.put_u32(self.new_guardian_set_index);
        out.put_u8(self.new_guardian_set.len().min(u8::MAX as usize) as u8);
        for g in self.new_guardian_set.iter().take(u8::MAX as usize) {
            out.put_slice(&g.0);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn module_ids_are_left_padded() {
        assert_eq!(
            hex::encode(module_id(b"TokenBridge")),
            "000000000000000000000000000000000000000000546f6b656e427269646765"
        );
        assert_eq!(&CORE_MODULE[28..], b"Core");
    }

    #[test]
    fn packet_header() {
        let data = hex::decode(
            "00000000000000000000000000000000000000000000000000000000436f7265\
             020000\
             0000000103\
             0000000000000000000000000000000000000000\
             0000000000000000000000000000000000000001\
             0000000000000000000000000000000000000002",
        )
        .unwrap();
        let packet = GovernancePacket::parse(&data).unwrap();
        assert_eq!(packet.module, CORE_MODULE);
        assert_eq!(packet.action, ACTION_GUARDIAN_SET_UPGRADE);
        assert_eq!(packet.chain, Chain::Any);
        assert_eq!(packet.serialize(), data);
        packet.check_target(&CORE_MODULE, Chain::Terra).unwrap();

        let upgrade = GuardianSetUpgrade::parse(&packet.payload).unwrap();
        assert_eq!(upgrade.new_guardian_set_index, 1);
        assert_eq!(upgrade.new_guardian_set.len(), 3);
        assert_eq!(upgrade.new_guardian_set[1].0[19], 1);
        assert_eq!(upgrade.new_guardian_set[2].0[19], 2);
        assert_eq!(upgrade.serialize(), packet.payload);
    }

    #[test]
    fn targets_are_checked() {
        let packet = GovernancePacket {
            module: module_id(b"TokenBridge"),
            action: 1,
            chain: Chain::Ethereum,
            payload: vec![],
        };
        assert_eq!(
            packet.check_target(&CORE_MODULE, Chain::Ethereum),
            Err(Error::InvalidGovernanceModule)
        );
        assert_eq!(
            packet.check_target(&module_id(b"TokenBridge"), Chain::Solana),
            Err(Error::InvalidGovernanceChain(2))
        );
        packet
            .check_target(&module_id(b"TokenBridge"), Chain::Ethereum)
            .unwrap();
    }

    #[test]
    fn guardian_set_upgrade_length_is_exact() {
        let upgrade = GuardianSetUpgrade {
            new_guardian_set_index: 4,
            new_guardian_set: vec![GuardianAddress([7; 20]); 2],
        };
        let mut data = upgrade.serialize();
        assert_eq!(GuardianSetUpgrade::parse(&data).unwrap(), upgrade);

        data.push(0);
        assert!(GuardianSetUpgrade::parse(&data).is_err());
        assert!(GuardianSetUpgrade::parse(&data[..data.len() - 2]).is_err());
    }
}
