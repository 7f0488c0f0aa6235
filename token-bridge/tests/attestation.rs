mod helpers;

use bridge_core::{Address, Emitter, Error};
use helpers::*;
use token_bridge::{
    message::AssetMeta, state::wrapped_asset_id, ContractError, Submitted, TokenError,
};

/// A token native to the foreign chain.
const SOL: Address = addr(0x50);

fn sol_meta(name: &str) -> AssetMeta {
    AssetMeta {
        token_address: SOL,
        token_chain: FOREIGN_CHAIN,
        decimals: 9,
        symbol: "SOL".into(),
        name: name.into(),
    }
}

fn foreign_emitter() -> Emitter {
    Emitter {
        chain: FOREIGN_CHAIN,
        address: FOREIGN_BRIDGE,
    }
}

#[test]
fn attest_native_token() {
    let mut h = Harness::new();

    let msg = h.bridge.attest_token(TOKEN, 42).unwrap();
    assert_eq!(
        msg.emitter,
        Emitter {
            chain: CHAIN,
            address: BRIDGE,
        }
    );
    assert_eq!(msg.sequence, 0);
    assert_eq!(msg.nonce, 42);
    assert_eq!(msg.consistency_level, 15);
    assert_eq!(msg.payload.len(), 100);

    let meta = AssetMeta::parse(&msg.payload).unwrap();
    assert_eq!(
        meta,
        AssetMeta {
            token_address: TOKEN,
            token_chain: CHAIN,
            // 18 on chain, capped for the wire.
            decimals: 8,
            symbol: "TKN".into(),
            name: "Test Token".into(),
        }
    );

    assert_eq!(h.bridge.attest_token(TOKEN, 0).unwrap().sequence, 1);
}

#[test]
fn attest_unknown_token() {
    let mut h = Harness::new();
    assert_eq!(
        h.bridge.attest_token(addr(0x01), 0).unwrap_err(),
        ContractError::Token(TokenError::UnknownToken(addr(0x01)))
    );
    // Nothing was published.
    assert_eq!(h.bridge.core().next_sequence(&BRIDGE), 0);
}

#[test]
fn create_wrapped() {
    let mut h = Harness::with_foreign_bridge();

    let vaa = h.foreign_vaa(sol_meta("Wrapped SOL").serialize());
    let record = h.bridge.create_wrapped(&h.env, &vaa).unwrap();

    let asset = wrapped_asset_id(FOREIGN_CHAIN, &SOL);
    assert_eq!(record.asset, asset);
    assert_eq!(record.decimals, 9);
    assert_eq!(record.symbol, "SOL");
    assert_eq!(record.name, "Wrapped SOL");
    assert_eq!(record.sequence, 0);

    assert!(h.bridge.is_wrapped_asset(&asset));
    assert!(!h.bridge.is_wrapped_asset(&SOL));
    assert_eq!(h.bridge.wrapped_asset(FOREIGN_CHAIN, &SOL), Some(asset));
    assert_eq!(h.bridge.wrapped_asset_info(&asset), Some(&record));
    assert!(h.bridge.is_transfer_completed(foreign_emitter(), 0));

    let token = h.host().token(&asset).unwrap();
    assert!(token.bridge_minted);
    assert_eq!(token.info.decimals, 9);
    assert_eq!(token.info.name, "Wrapped SOL");
}

#[test]
fn reattestation_keeps_identity() {
    let mut h = Harness::with_foreign_bridge();
    let asset = wrapped_asset_id(FOREIGN_CHAIN, &SOL);

    let first = h.sign(foreign_emitter(), 5, sol_meta("Wrapped SOL").serialize());
    let _ = h.bridge.create_wrapped(&h.env, &first).unwrap();

    let renamed = h.sign(foreign_emitter(), 7, sol_meta("Solana").serialize());
    let record = h.bridge.create_wrapped(&h.env, &renamed).unwrap();
    assert_eq!(record.asset, asset);
    assert_eq!(record.name, "Solana");
    assert_eq!(record.sequence, 7);
    assert_eq!(h.host().token(&asset).unwrap().info.name, "Solana");

    // An older attestation arriving late is consumed but does not win.
    let stale = h.sign(foreign_emitter(), 6, sol_meta("Old SOL").serialize());
    let record = h.bridge.create_wrapped(&h.env, &stale).unwrap();
    assert_eq!(record.name, "Solana");
    assert_eq!(record.sequence, 7);
    assert!(h.bridge.is_transfer_completed(foreign_emitter(), 6));
    assert_eq!(h.host().token(&asset).unwrap().info.name, "Solana");
}

#[test]
fn attestation_replay_rejected() {
    let mut h = Harness::with_foreign_bridge();
    let vaa = h.foreign_vaa(sol_meta("Wrapped SOL").serialize());
    let _ = h.bridge.create_wrapped(&h.env, &vaa).unwrap();

    assert_eq!(
        h.bridge.create_wrapped(&h.env, &vaa).unwrap_err(),
        ContractError::Core(Error::ReplayedMessage {
            emitter: foreign_emitter(),
            sequence: 0,
        })
    );
}

#[test]
fn attestation_requires_registered_emitter() {
    let mut h = Harness::new();
    let vaa = h.foreign_vaa(sol_meta("Wrapped SOL").serialize());

    // Nothing registered for the chain yet.
    assert!(matches!(
        h.bridge.create_wrapped(&h.env, &vaa),
        Err(ContractError::Core(Error::EmitterMismatch { .. }))
    ));

    let register = h.register_chain_vaa(FOREIGN_CHAIN, FOREIGN_BRIDGE);
    let _ = h.bridge.register_chain(&h.env, &register).unwrap();

    let impostor = h.sign(
        Emitter {
            chain: FOREIGN_CHAIN,
            address: addr(0xee),
        },
        0,
        sol_meta("Wrapped SOL").serialize(),
    );
    assert_eq!(
        h.bridge.create_wrapped(&h.env, &impostor).unwrap_err(),
        ContractError::Core(Error::EmitterMismatch {
            expected: foreign_emitter(),
            actual: Emitter {
                chain: FOREIGN_CHAIN,
                address: addr(0xee),
            },
        })
    );
    assert!(!h.bridge.is_wrapped_asset(&wrapped_asset_id(FOREIGN_CHAIN, &SOL)));

    // The original VAA goes through now that its emitter is known.
    assert!(h.bridge.create_wrapped(&h.env, &vaa).is_ok());
}

#[test]
fn native_attestation_rejected() {
    let mut h = Harness::with_foreign_bridge();
    let meta = AssetMeta {
        token_address: TOKEN,
        token_chain: CHAIN,
        decimals: 8,
        symbol: "TKN".into(),
        name: "Test Token".into(),
    };
    let vaa = h.foreign_vaa(meta.serialize());

    assert_eq!(
        h.bridge.create_wrapped(&h.env, &vaa).unwrap_err(),
        ContractError::NativeAssetAttestation(TOKEN)
    );
    assert!(!h.bridge.is_transfer_completed(foreign_emitter(), 0));
}

#[test]
fn wrapped_asset_cannot_be_attested() {
    let mut h = Harness::with_foreign_bridge();
    let vaa = h.foreign_vaa(sol_meta("Wrapped SOL").serialize());
    let asset = h.bridge.create_wrapped(&h.env, &vaa).unwrap().asset;

    assert_eq!(
        h.bridge.attest_token(asset, 0).unwrap_err(),
        ContractError::WrappedAssetAttestation(asset)
    );
}

#[test]
fn submit_vaa_routes_attestations() {
    let mut h = Harness::new();

    let register = h.register_chain_vaa(FOREIGN_CHAIN, FOREIGN_BRIDGE);
    assert!(matches!(
        h.bridge.submit_vaa(&h.env, &info(RELAYER), &register),
        Ok(Submitted::Governance(_))
    ));

    let vaa = h.foreign_vaa(sol_meta("Wrapped SOL").serialize());
    match h.bridge.submit_vaa(&h.env, &info(RELAYER), &vaa).unwrap() {
        Submitted::Attestation(record) => {
            assert_eq!(record.token_chain, FOREIGN_CHAIN);
            assert_eq!(record.token_address, SOL);
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    let unknown = h.foreign_vaa(vec![9, 1, 2, 3]);
    assert_eq!(
        h.bridge.submit_vaa(&h.env, &info(RELAYER), &unknown).unwrap_err(),
        ContractError::UnknownPayload(9)
    );
}
