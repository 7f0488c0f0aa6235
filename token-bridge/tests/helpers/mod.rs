#![allow(dead_code)]

use bridge_core::{
    fake::{default_guardian_keys, guardian_set_of, sign_vaa},
    vaa::Body,
    Address, Chain, CoreConfig, Emitter,
};
use k256::ecdsa::SigningKey;
use primitive_types::U256;
use token_bridge::{
    fake::FakeHost,
    governance::{Action, RegisterChain},
    Config, Env, MessageInfo, TokenBridge, TokenInfo,
};
use tracing_subscriber::EnvFilter;

pub const CHAIN: Chain = Chain::Ethereum;
pub const GOVERNANCE_CHAIN: Chain = Chain::Solana;
pub const FOREIGN_CHAIN: Chain = Chain::Solana;

pub const fn addr(last: u8) -> Address {
    let mut a = [0u8; 32];
    a[31] = last;
    Address(a)
}

pub const GOVERNANCE_CONTRACT: Address = addr(0x04);
pub const BRIDGE: Address = addr(0xb0);
pub const CUSTODY: Address = addr(0xc0);
pub const FOREIGN_BRIDGE: Address = addr(0xff);

/// A native token with 18 decimals.
pub const TOKEN: Address = addr(0x71);
/// The wrapped native currency, 18 decimals.
pub const WETH: Address = addr(0x7e);

pub const ALICE: Address = addr(0xa1);
pub const BOB: Address = addr(0xb1);
pub const RELAYER: Address = addr(0x9e);

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn e(exp: usize) -> U256 {
    U256::exp10(exp)
}

pub fn config() -> Config {
    Config {
        core: CoreConfig {
            chain_id: CHAIN,
            governance_chain: GOVERNANCE_CHAIN,
            governance_contract: GOVERNANCE_CONTRACT,
            guardian_set_expiry: 86_400,
            initial_guardian_set: guardian_set_of(&default_guardian_keys()).addresses,
        },
        bridge_address: BRIDGE,
        wrapped_native: Some(WETH),
        consistency_level: 15,
    }
}

pub fn info(sender: Address) -> MessageInfo {
    MessageInfo {
        sender,
        funds: U256::zero(),
    }
}

pub struct Harness {
    pub bridge: TokenBridge<FakeHost>,
    pub keys: Vec<SigningKey>,
    pub guardian_set_index: u32,
    pub env: Env,
    governance_sequence: u64,
    foreign_sequence: u64,
}

impl Harness {
    /// A bridge with `TOKEN` and `WETH` deployed and no peers registered.
    pub fn new() -> Self {
        init_tracing();

        let mut host = FakeHost::new(CUSTODY);
        host.add_token(
            TOKEN,
            TokenInfo {
                decimals: 18,
                symbol: "TKN".into(),
                name: "Test Token".into(),
            },
        );
        host.add_token(
            WETH,
            TokenInfo {
                decimals: 18,
                symbol: "WETH".into(),
                name: "Wrapped Ether".into(),
            },
        );

        Harness {
            bridge: TokenBridge::new(config(), host),
            keys: default_guardian_keys(),
            guardian_set_index: 0,
            env: Env { block_time: 1_000 },
            governance_sequence: 0,
            foreign_sequence: 0,
        }
    }

    /// Like [`Harness::new`], with `FOREIGN_BRIDGE` registered for `FOREIGN_CHAIN`.
    pub fn with_foreign_bridge() -> Self {
        let mut h = Harness::new();
        let vaa = h.register_chain_vaa(FOREIGN_CHAIN, FOREIGN_BRIDGE);
        let _ = h.bridge.register_chain(&h.env, &vaa).unwrap();
        h
    }

    pub fn sign(&self, emitter: Emitter, sequence: u64, payload: Vec<u8>) -> Vec<u8> {
        let body = Body {
            timestamp: 1,
            nonce: 0,
            emitter_chain: emitter.chain,
            emitter_address: emitter.address,
            sequence,
            consistency_level: 15,
            payload,
        };
        sign_vaa(&self.keys, self.guardian_set_index, body)
    }

    /// Signs `payload` as the next governance message.
    pub fn governance_vaa(&mut self, payload: Vec<u8>) -> Vec<u8> {
        let sequence = self.governance_sequence;
        self.governance_sequence += 1;
        self.sign(
            Emitter {
                chain: GOVERNANCE_CHAIN,
                address: GOVERNANCE_CONTRACT,
            },
            sequence,
            payload,
        )
    }

    pub fn register_chain_vaa(&mut self, chain: Chain, emitter: Address) -> Vec<u8> {
        let packet = Action::RegisterChain(RegisterChain {
            emitter_chain: chain,
            emitter_address: emitter,
        })
        .to_packet(Chain::Any);
        self.governance_vaa(packet.serialize())
    }

    /// Signs `payload` as the next message of the foreign bridge.
    pub fn foreign_vaa(&mut self, payload: Vec<u8>) -> Vec<u8> {
        let sequence = self.foreign_sequence;
        self.foreign_sequence += 1;
        self.sign(
            Emitter {
                chain: FOREIGN_CHAIN,
                address: FOREIGN_BRIDGE,
            },
            sequence,
            payload,
        )
    }

    pub fn host(&self) -> &FakeHost {
        self.bridge.host()
    }

    pub fn host_mut(&mut self) -> &mut FakeHost {
        self.bridge.host_mut()
    }
}
