//! Token bridge payloads. The first byte of every payload is its type tag.
//!
//! ```markdown
//! 1 Transfer:             [1][amount u256][token 32][token chain u16][to 32][to chain u16][fee u256]
//! 2 AssetMeta:            [2][token 32][token chain u16][decimals u8][symbol 32][name 32]
//! 3 TransferWithPayload:  [3][amount u256][token 32][token chain u16][to 32][to chain u16]
//!                         [from 32][payload ..]
//! ```
//!
//! Amounts and fees are in wire units, see [`crate::normalize`].

use bridge_core::{
    bytes::{BytesReader, MalformedField, WriteBytes},
    Address, Chain,
};
use primitive_types::U256;

use crate::ContractError;

pub const PAYLOAD_TRANSFER: u8 = 1;
pub const PAYLOAD_ASSET_META: u8 = 2;
pub const PAYLOAD_TRANSFER_WITH_PAYLOAD: u8 = 3;

pub const TRANSFER_LEN: usize = 133;
pub const ASSET_META_LEN: usize = 100;

fn read_tag(reader: &mut BytesReader<'_>, expected: u8) -> Result<(), MalformedField> {
    let start = reader.clone();
    if reader.read_u8()? != expected {
        return Err(start.malformed("unexpected payload type"));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transfer {
    pub amount: U256,
    pub token_address: Address,
    pub token_chain: Chain,
    pub recipient: Address,
    pub recipient_chain: Chain,
    pub fee: U256,
}

impl Transfer {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        read_tag(&mut reader, PAYLOAD_TRANSFER)?;
        let transfer = Transfer {
            amount: reader.read_u256()?,
            token_address: reader.read_address()?,
            token_chain: reader.read_u16()?.into(),
            recipient: reader.read_address()?,
            recipient_chain: reader.read_u16()?.into(),
            fee: reader.read_u256()?,
        };
        reader.finish()?;
        Ok(transfer)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TRANSFER_LEN);
        out.put_u8(PAYLOAD_TRANSFER);
        out.put_u256(self.amount);
        out.put_address(&self.token_address);
        out.put_u16(self.token_chain.into());
        out.put_address(&self.recipient);
        out.put_u16(self.recipient_chain.into());
        out.put_u256(self.fee);
        out
    }
}

/// Metadata of a token, published by its origin chain so other chains can create a wrapped
/// representation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetMeta {
    pub token_address: Address,
    pub token_chain: Chain,
    pub decimals: u8,
    /// At most 32 bytes on the wire; longer values are cut on a character boundary.
    pub symbol: String,
    pub name: String,
}

impl AssetMeta {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        read_tag(&mut reader, PAYLOAD_ASSET_META)?;
        let meta = AssetMeta {
            token_address: reader.read_address()?,
            token_chain: reader.read_u16()?.into(),
            decimals: reader.read_u8()?,
            symbol: reader.read_fixed_string::<32>()?,
            name: reader.read_fixed_string::<32>()?,
        };
        reader.finish()?;
        Ok(meta)
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ASSET_META_LEN);
        out.put_u8(PAYLOAD_ASSET_META);
        out.put_address(&self.token_address);
        out.put_u16(self.token_chain.into());
        out.put_u8(self.decimals);
        out.put_fixed_string::<32>(&self.symbol);
        out.put_fixed_string::<32>(&self.name);
        out
    }
}

/// A transfer carrying an opaque payload for the recipient contract. Only the recipient may
/// redeem it, and it carries no relayer fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferWithPayload {
    pub amount: U256,
    pub token_address: Address,
    pub token_chain: Chain,
    pub recipient: Address,
    pub recipient_chain: Chain,
    pub sender: Address,
    pub payload: Vec<u8>,
}

impl TransferWithPayload {
    pub fn parse(data: &[u8]) -> Result<Self, MalformedField> {
        let mut reader = BytesReader::new(data);
        read_tag(&mut reader, PAYLOAD_TRANSFER_WITH_PAYLOAD)?;
        Ok(TransferWithPayload {
            amount: reader.read_u256()?,
            token_address: reader.read_address()?,
            token_chain: reader.read_u16()?.into(),
            recipient: reader.read_address()?,
            recipient_chain: reader.read_u16()?.into(),
            sender: reader.read_address()?,
            payload: reader.remaining_bytes().to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(TRANSFER_LEN + self.payload.len());
        out.put_u8(PAYLOAD_TRANSFER_WITH_PAYLOAD);
        out.put_u256(self.amount);
        out.put_address(&self.token_address);
        out.put_u16(self.token_chain.into());
        out.put_address(&self.recipient);
        out.put_u16(self.recipient_chain.into());
        out.put_address(&self.sender);
        out.put_slice(&self.payload);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Transfer(Transfer),
    AssetMeta(AssetMeta),
    TransferWithPayload(TransferWithPayload),
}

impl Message {
    /// Dispatches on the leading type tag.
    pub fn parse(data: &[u8]) -> Result<Self, ContractError> {
        let tag = BytesReader::new(data).read_u8()?;
        match tag {
            PAYLOAD_TRANSFER => Ok(Message::Transfer(Transfer::parse(data)?)),
            PAYLOAD_ASSET_META => Ok(Message::AssetMeta(AssetMeta::parse(data)?)),
            PAYLOAD_TRANSFER_WITH_PAYLOAD => Ok(Message::TransferWithPayload(
                TransferWithPayload::parse(data)?,
            )),
            other => Err(ContractError::UnknownPayload(other)),
        }
    }

    pub fn payload_id(&self) -> u8 {
        match self {
            Message::Transfer(_) => PAYLOAD_TRANSFER,
            Message::AssetMeta(_) => PAYLOAD_ASSET_META,
            Message::TransferWithPayload(_) => PAYLOAD_TRANSFER_WITH_PAYLOAD,
        }
    }

    pub fn serialize(&self) -> Vec<u8> {
        match self {
            Message::Transfer(t) => t.serialize(),
            Message::AssetMeta(m) => m.serialize(),
            Message::TransferWithPayload(t) => t.serialize(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn token() -> Address {
        Address::from_evm([0x22; 20])
    }

    #[test]
    fn transfer_layout() {
        let transfer = Transfer {
            amount: U256::from(100_000_000u64),
            token_address: token(),
            token_chain: Chain::Ethereum,
            recipient: Address([0x33; 32]),
            recipient_chain: Chain::Fantom,
            fee: U256::from(10_000_000u64),
        };
        let bytes = transfer.serialize();
        assert_eq!(bytes.len(), TRANSFER_LEN);
        assert_eq!(bytes[0], PAYLOAD_TRANSFER);
        assert_eq!(&bytes[25..33], &100_000_000u64.to_be_bytes());
        assert_eq!(&bytes[33..65], &token().0);
        assert_eq!(&bytes[65..67], &[0x00, 0x02]);
        assert_eq!(&bytes[67..99], &[0x33; 32]);
        assert_eq!(&bytes[99..101], &[0x00, 0x0a]);
        assert_eq!(&bytes[125..133], &10_000_000u64.to_be_bytes());

        assert_eq!(Transfer::parse(&bytes).unwrap(), transfer);
        assert_eq!(
            Message::parse(&bytes).unwrap(),
            Message::Transfer(transfer)
        );
    }

    #[test]
    fn transfer_length_is_exact() {
        let bytes = Transfer {
            amount: U256::one(),
            token_address: token(),
            token_chain: Chain::Ethereum,
            recipient: token(),
            recipient_chain: Chain::Solana,
            fee: U256::zero(),
        }
        .serialize();

        let err = Transfer::parse(&bytes[..TRANSFER_LEN - 1]).unwrap_err();
        assert_eq!(err.offset, 101);

        let mut long = bytes.clone();
        long.push(0);
        let err = Transfer::parse(&long).unwrap_err();
        assert_eq!(err.offset, TRANSFER_LEN);
        assert_eq!(err.reason, "trailing bytes");
    }

    #[test]
    fn asset_meta_layout() {
        let meta = AssetMeta {
            token_address: token(),
            token_chain: Chain::Solana,
            decimals: 8,
            symbol: "SOL".into(),
            name: "Solana".into(),
        };
        let bytes = meta.serialize();
        assert_eq!(bytes.len(), ASSET_META_LEN);
        assert_eq!(bytes[0], PAYLOAD_ASSET_META);
        assert_eq!(&bytes[33..35], &[0x00, 0x01]);
        assert_eq!(bytes[35], 8);
        assert_eq!(&bytes[36..39], b"SOL");
        assert!(bytes[39..68].iter().all(|b| *b == 0));
        assert_eq!(&bytes[68..74], b"Solana");

        assert_eq!(AssetMeta::parse(&bytes).unwrap(), meta);
    }

    #[test]
    fn transfer_with_payload_keeps_tail() {
        let transfer = TransferWithPayload {
            amount: U256::from(5u8),
            token_address: token(),
            token_chain: Chain::Ethereum,
            recipient: Address([0x44; 32]),
            recipient_chain: Chain::Solana,
            sender: Address([0x55; 32]),
            payload: b"hello".to_vec(),
        };
        let bytes = transfer.serialize();
        assert_eq!(bytes.len(), TRANSFER_LEN + 5);
        assert_eq!(&bytes[TRANSFER_LEN..], b"hello");

        let parsed = Message::parse(&bytes).unwrap();
        assert_eq!(parsed.payload_id(), PAYLOAD_TRANSFER_WITH_PAYLOAD);
        assert_eq!(parsed, Message::TransferWithPayload(transfer));
    }

    #[test]
    fn unknown_and_empty_payloads() {
        assert_eq!(
            Message::parse(&[9, 0, 0]).unwrap_err(),
            ContractError::UnknownPayload(9)
        );
        assert!(matches!(
            Message::parse(&[]),
            Err(ContractError::Core(bridge_core::Error::Malformed(_)))
        ));
        // A transfer tag on a metadata parser is a decode failure, not a silent reinterpretation.
        assert!(AssetMeta::parse(&[1; ASSET_META_LEN]).is_err());
    }
}
