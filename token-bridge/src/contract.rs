use bridge_core::{
    governance::{GovernancePacket, GuardianSetUpgrade},
    Address, Chain, CoreBridge, Emitter, GuardianSetInfo, PostedMessage, Vaa,
};
use primitive_types::U256;
use tracing::{debug, info, warn};

use crate::{
    governance::{Action, ACTION_REGISTER_CHAIN, ACTION_UPGRADE_CONTRACT, TOKEN_BRIDGE_MODULE},
    message::{AssetMeta, Message, Transfer, TransferWithPayload},
    normalize::{denormalize_amount, normalize_amount, wire_decimals},
    state::{wrapped_asset_id, BridgeState, ReplayKey, WrappedAssetRecord},
    Config, ContractError, Host, TokenInfo,
};

/// Block context of a call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Env {
    /// Seconds since UNIX epoch.
    pub block_time: u64,
}

/// Caller of a call and the native currency attached to it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageInfo {
    pub sender: Address,
    pub funds: U256,
}

/// An outbound transfer. `amount` is in the token's own decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    pub token: Address,
    pub amount: U256,
    pub recipient_chain: Chain,
    pub recipient: Address,
    pub nonce: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernanceOutcome {
    ChainRegistered { chain: Chain, emitter: Address },
    ContractUpgraded(Address),
    /// Addressed to a different chain. The VAA is consumed regardless.
    Skipped { chain: Chain },
}

/// Result of redeeming an inbound transfer; amounts are in the local token's decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedTransfer {
    pub token: Address,
    pub recipient: Address,
    pub amount: U256,
    pub relayer: Address,
    pub fee: U256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submitted {
    Governance(GovernanceOutcome),
    Attestation(WrappedAssetRecord),
    Transfer(CompletedTransfer),
}

/// Fields shared by both inbound transfer payloads, in wire units.
struct Inbound {
    amount: U256,
    token_address: Address,
    token_chain: Chain,
    recipient: Address,
    recipient_chain: Chain,
    fee: U256,
}

impl From<Transfer> for Inbound {
    fn from(t: Transfer) -> Self {
        Inbound {
            amount: t.amount,
            token_address: t.token_address,
            token_chain: t.token_chain,
            recipient: t.recipient,
            recipient_chain: t.recipient_chain,
            fee: t.fee,
        }
    }
}

/// Origin and wire amounts of tokens taken from a sender.
struct Outbound {
    token_address: Address,
    token_chain: Chain,
    amount: U256,
    fee: U256,
}

/// The token bridge: verifies messages from its peers on other chains, keeps the wrapped asset
/// registry and accounts for every token that crosses.
///
/// Each public operation runs as a single transaction. On error the bridge state, the core
/// state and the host are all restored to where they were before the call.
#[derive(Debug)]
pub struct TokenBridge<H> {
    config: Config,
    core: CoreBridge,
    state: BridgeState,
    host: H,
}

impl<H: Host> TokenBridge<H> {
    pub fn new(config: Config, host: H) -> Self {
        let core = CoreBridge::new(config.core.clone());
        TokenBridge {
            config,
            core,
            state: BridgeState::default(),
            host,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn core(&self) -> &CoreBridge {
        &self.core
    }

    pub fn state(&self) -> &BridgeState {
        &self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn chain_id(&self) -> Chain {
        self.core.chain_id()
    }

    fn transact<T>(
        &mut self,
        op: &'static str,
        f: impl FnOnce(&mut Self) -> Result<T, ContractError>,
    ) -> Result<T, ContractError> {
        let state = self.state.clone();
        let core = self.core.clone();
        self.host.checkpoint();

        match f(self) {
            Ok(v) => {
                self.host.commit();
                Ok(v)
            }
            Err(e) => {
                self.state = state;
                self.core = core;
                self.host.rollback();
                warn!(op, error = %e, "call reverted");
                Err(e)
            }
        }
    }

    fn publish(&mut self, nonce: u32, payload: Vec<u8>) -> PostedMessage {
        self.core.post_message(
            self.config.bridge_address,
            nonce,
            self.config.consistency_level,
            payload,
        )
    }

    /// Verifies `data` and requires it to come from the registered bridge of its emitter chain.
    fn verify_from_bridge(&self, env: &Env, data: &[u8]) -> Result<Vaa, ContractError> {
        let vaa = self.core.parse_and_verify_vaa(data, env.block_time)?;
        let chain = vaa.emitter_chain;
        match self.state.bridge_contract(chain) {
            Some(address) => vaa.check_emitter(Emitter { chain, address })?,
            None => {
                return Err(bridge_core::Error::EmitterMismatch {
                    expected: Emitter {
                        chain,
                        address: Address::default(),
                    },
                    actual: vaa.emitter(),
                }
                .into())
            }
        }
        Ok(vaa)
    }

    // Governance

    /// Applies a core governance VAA (guardian set upgrade).
    pub fn submit_core_governance(
        &mut self,
        env: &Env,
        data: &[u8],
    ) -> Result<GuardianSetUpgrade, ContractError> {
        self.transact("submit_core_governance", |bridge| {
            Ok(bridge.core.submit_governance_vaa(data, env.block_time)?)
        })
    }

    pub fn submit_governance_vaa(
        &mut self,
        env: &Env,
        data: &[u8],
    ) -> Result<GovernanceOutcome, ContractError> {
        self.transact("submit_governance_vaa", |bridge| {
            bridge.handle_governance(env, data, None)
        })
    }

    pub fn register_chain(
        &mut self,
        env: &Env,
        data: &[u8],
    ) -> Result<GovernanceOutcome, ContractError> {
        self.transact("register_chain", |bridge| {
            bridge.handle_governance(env, data, Some(ACTION_REGISTER_CHAIN))
        })
    }

    pub fn upgrade_contract(
        &mut self,
        env: &Env,
        data: &[u8],
    ) -> Result<GovernanceOutcome, ContractError> {
        self.transact("upgrade_contract", |bridge| {
            bridge.handle_governance(env, data, Some(ACTION_UPGRADE_CONTRACT))
        })
    }

    fn handle_governance(
        &mut self,
        env: &Env,
        data: &[u8],
        expected_action: Option<u8>,
    ) -> Result<GovernanceOutcome, ContractError> {
        let governance = self.core.config().governance_emitter();
        let vaa = self.core.verify(data, env.block_time, Some(governance))?;

        let packet = GovernancePacket::parse(&vaa.payload)?;
        if packet.module != TOKEN_BRIDGE_MODULE {
            return Err(bridge_core::Error::InvalidGovernanceModule.into());
        }
        if expected_action.is_some_and(|a| a != packet.action) {
            return Err(bridge_core::Error::UnknownGovernanceAction(packet.action).into());
        }
        let action = Action::parse(&packet)?;

        self.state
            .consume_governance(ReplayKey::new(vaa.emitter(), vaa.sequence))?;

        let this_chain = self.chain_id();
        match action {
            Action::RegisterChain(r) if packet.chain == Chain::Any || packet.chain == this_chain => {
                let previous = self.state.register_bridge(r.emitter_chain, r.emitter_address);
                info!(
                    chain = %r.emitter_chain,
                    emitter = %r.emitter_address,
                    replaced = previous.is_some(),
                    sequence = vaa.sequence,
                    "bridge contract registered"
                );
                Ok(GovernanceOutcome::ChainRegistered {
                    chain: r.emitter_chain,
                    emitter: r.emitter_address,
                })
            }
            Action::UpgradeContract(u) if packet.chain == this_chain => {
                self.host.upgrade_contract(&u.new_contract)?;
                info!(
                    new_contract = %u.new_contract,
                    sequence = vaa.sequence,
                    "contract upgrade authorized"
                );
                Ok(GovernanceOutcome::ContractUpgraded(u.new_contract))
            }
            _ => {
                debug!(
                    chain = %packet.chain,
                    action = action.code(),
                    sequence = vaa.sequence,
                    "governance action for another chain"
                );
                Ok(GovernanceOutcome::Skipped {
                    chain: packet.chain,
                })
            }
        }
    }

    // Attestation

    /// Publishes the metadata of a token native to this chain.
    pub fn attest_token(
        &mut self,
        token: Address,
        nonce: u32,
    ) -> Result<PostedMessage, ContractError> {
        self.transact("attest_token", |bridge| {
            if bridge.state.is_wrapped(&token) {
                return Err(ContractError::WrappedAssetAttestation(token));
            }
            let info = bridge.host.token_info(&token)?;
            let meta = AssetMeta {
                token_address: token,
                token_chain: bridge.chain_id(),
                decimals: wire_decimals(info.decimals),
                symbol: info.symbol,
                name: info.name,
            };
            let msg = bridge.publish(nonce, meta.serialize());
            info!(%token, decimals = meta.decimals, sequence = msg.sequence, "token attested");
            Ok(msg)
        })
    }

    /// Creates the wrapped representation of a foreign token, or refreshes its metadata.
    pub fn create_wrapped(
        &mut self,
        env: &Env,
        data: &[u8],
    ) -> Result<WrappedAssetRecord, ContractError> {
        self.transact("create_wrapped", |bridge| {
            let vaa = bridge.verify_from_bridge(env, data)?;
            let meta = AssetMeta::parse(&vaa.payload)?;
            bridge.apply_attestation(&vaa, meta)
        })
    }

    fn apply_attestation(
        &mut self,
        vaa: &Vaa,
        meta: AssetMeta,
    ) -> Result<WrappedAssetRecord, ContractError> {
        if meta.token_chain == self.chain_id() {
            return Err(ContractError::NativeAssetAttestation(meta.token_address));
        }
        self.state
            .consume(ReplayKey::new(vaa.emitter(), vaa.sequence))?;

        match self.state.wrapped(meta.token_chain, &meta.token_address).cloned() {
            Some(existing) if vaa.sequence <= existing.sequence => {
                debug!(
                    asset = %existing.asset,
                    sequence = vaa.sequence,
                    current = existing.sequence,
                    "stale attestation ignored"
                );
                Ok(existing)
            }
            Some(existing) => {
                let record = WrappedAssetRecord {
                    symbol: meta.symbol,
                    name: meta.name,
                    sequence: vaa.sequence,
                    ..existing
                };
                self.host.update_wrapped(
                    &record.asset,
                    &TokenInfo {
                        decimals: record.decimals,
                        symbol: record.symbol.clone(),
                        name: record.name.clone(),
                    },
                )?;
                self.state.put_wrapped(record.clone());
                info!(asset = %record.asset, sequence = vaa.sequence, "wrapped asset updated");
                Ok(record)
            }
            None => {
                let record = WrappedAssetRecord {
                    asset: wrapped_asset_id(meta.token_chain, &meta.token_address),
                    token_chain: meta.token_chain,
                    token_address: meta.token_address,
                    decimals: meta.decimals,
                    symbol: meta.symbol,
                    name: meta.name,
                    sequence: vaa.sequence,
                };
                self.host.create_wrapped(
                    &record.asset,
                    &TokenInfo {
                        decimals: record.decimals,
                        symbol: record.symbol.clone(),
                        name: record.name.clone(),
                    },
                )?;
                self.state.put_wrapped(record.clone());
                info!(
                    asset = %record.asset,
                    token_chain = %record.token_chain,
                    token_address = %record.token_address,
                    "wrapped asset created"
                );
                Ok(record)
            }
        }
    }

    // Outbound transfers

    pub fn transfer_tokens(
        &mut self,
        info: &MessageInfo,
        req: TransferRequest,
        fee: U256,
    ) -> Result<PostedMessage, ContractError> {
        self.transact("transfer_tokens", |bridge| {
            bridge.check_outbound(req.recipient_chain, req.amount)?;
            let out = bridge.take_tokens(&info.sender, req.token, req.amount, fee)?;
            let payload = Transfer {
                amount: out.amount,
                token_address: out.token_address,
                token_chain: out.token_chain,
                recipient: req.recipient,
                recipient_chain: req.recipient_chain,
                fee: out.fee,
            }
            .serialize();
            Ok(bridge.publish_transfer(req, out, payload))
        })
    }

    pub fn transfer_tokens_with_payload(
        &mut self,
        info: &MessageInfo,
        req: TransferRequest,
        payload: Vec<u8>,
    ) -> Result<PostedMessage, ContractError> {
        self.transact("transfer_tokens_with_payload", |bridge| {
            bridge.check_outbound(req.recipient_chain, req.amount)?;
            let out = bridge.take_tokens(&info.sender, req.token, req.amount, U256::zero())?;
            let payload = TransferWithPayload {
                amount: out.amount,
                token_address: out.token_address,
                token_chain: out.token_chain,
                recipient: req.recipient,
                recipient_chain: req.recipient_chain,
                sender: info.sender,
                payload,
            }
            .serialize();
            Ok(bridge.publish_transfer(req, out, payload))
        })
    }

    /// Wraps the native currency attached to the call and sends it as the wrapped native token.
    pub fn wrap_and_transfer_native(
        &mut self,
        info: &MessageInfo,
        recipient_chain: Chain,
        recipient: Address,
        fee: U256,
        nonce: u32,
    ) -> Result<PostedMessage, ContractError> {
        self.transact("wrap_and_transfer_native", |bridge| {
            bridge.check_outbound(recipient_chain, info.funds)?;
            let wrapped_native = bridge
                .config
                .wrapped_native
                .ok_or(ContractError::WrappedNativeUnavailable)?;
            let out = bridge.account_native(wrapped_native, info.funds, fee)?;
            bridge
                .host
                .deposit_native(&wrapped_native, &info.sender, info.funds)?;

            let req = TransferRequest {
                token: wrapped_native,
                amount: info.funds,
                recipient_chain,
                recipient,
                nonce,
            };
            let payload = Transfer {
                amount: out.amount,
                token_address: out.token_address,
                token_chain: out.token_chain,
                recipient,
                recipient_chain,
                fee: out.fee,
            }
            .serialize();
            Ok(bridge.publish_transfer(req, out, payload))
        })
    }

    fn check_outbound(&self, recipient_chain: Chain, amount: U256) -> Result<(), ContractError> {
        if recipient_chain == self.chain_id() {
            return Err(ContractError::SameSourceAndTarget(recipient_chain));
        }
        if amount.is_zero() {
            return Err(ContractError::AmountTooLow);
        }
        Ok(())
    }

    fn publish_transfer(
        &mut self,
        req: TransferRequest,
        out: Outbound,
        payload: Vec<u8>,
    ) -> PostedMessage {
        let msg = self.publish(req.nonce, payload);
        info!(
            token = %req.token,
            amount = %req.amount,
            wire_amount = %out.amount,
            recipient_chain = %req.recipient_chain,
            recipient = %req.recipient,
            sequence = msg.sequence,
            "transfer sent"
        );
        msg
    }

    /// Burns wrapped tokens or locks native ones, returning what goes on the wire.
    fn take_tokens(
        &mut self,
        sender: &Address,
        token: Address,
        amount: U256,
        fee: U256,
    ) -> Result<Outbound, ContractError> {
        match self.state.wrapped_by_asset(&token).cloned() {
            Some(record) => {
                if fee > amount {
                    return Err(ContractError::FeeExceedsAmount { amount, fee });
                }
                // Wrapped supply is tracked by the token itself.
                self.host.burn(&token, sender, amount)?;
                Ok(Outbound {
                    token_address: record.token_address,
                    token_chain: record.token_chain,
                    amount: normalize_amount(amount, record.decimals),
                    fee: normalize_amount(fee, record.decimals),
                })
            }
            None => {
                let out = self.account_native(token, amount, fee)?;
                self.host.lock(&token, sender, amount)?;
                Ok(out)
            }
        }
    }

    /// Normalizes a native token amount and adds it to the outstanding supply.
    fn account_native(
        &mut self,
        token: Address,
        amount: U256,
        fee: U256,
    ) -> Result<Outbound, ContractError> {
        if fee > amount {
            return Err(ContractError::FeeExceedsAmount { amount, fee });
        }
        let decimals = self.host.token_info(&token)?.decimals;
        let wire_amount = normalize_amount(amount, decimals);
        let outstanding = self.state.bridge_out(token, wire_amount)?;
        debug!(%token, outstanding, "outstanding supply increased");

        Ok(Outbound {
            token_address: token,
            token_chain: self.chain_id(),
            amount: wire_amount,
            fee: normalize_amount(fee, decimals),
        })
    }

    // Inbound transfers

    /// Redeems a transfer. The fee goes to the caller.
    pub fn complete_transfer(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        data: &[u8],
    ) -> Result<CompletedTransfer, ContractError> {
        self.transact("complete_transfer", |bridge| {
            let vaa = bridge.verify_from_bridge(env, data)?;
            let transfer = Transfer::parse(&vaa.payload)?;
            bridge.redeem(&vaa, transfer.into(), info.sender, false)
        })
    }

    /// Redeems a transfer of the wrapped native token, paying out native currency.
    pub fn complete_transfer_and_unwrap(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        data: &[u8],
    ) -> Result<CompletedTransfer, ContractError> {
        self.transact("complete_transfer_and_unwrap", |bridge| {
            let vaa = bridge.verify_from_bridge(env, data)?;
            let transfer = Transfer::parse(&vaa.payload)?;
            bridge.redeem(&vaa, transfer.into(), info.sender, true)
        })
    }

    /// Redeems a transfer with payload. Only the recipient may call this.
    pub fn complete_transfer_with_payload(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        data: &[u8],
    ) -> Result<CompletedTransfer, ContractError> {
        self.transact("complete_transfer_with_payload", |bridge| {
            let vaa = bridge.verify_from_bridge(env, data)?;
            let transfer = TransferWithPayload::parse(&vaa.payload)?;
            bridge.redeem_with_payload(&vaa, transfer, info.sender)
        })
    }

    fn redeem_with_payload(
        &mut self,
        vaa: &Vaa,
        transfer: TransferWithPayload,
        redeemer: Address,
    ) -> Result<CompletedTransfer, ContractError> {
        if redeemer != transfer.recipient {
            return Err(ContractError::RedeemerNotRecipient {
                redeemer,
                recipient: transfer.recipient,
            });
        }
        let inbound = Inbound {
            amount: transfer.amount,
            token_address: transfer.token_address,
            token_chain: transfer.token_chain,
            recipient: transfer.recipient,
            recipient_chain: transfer.recipient_chain,
            fee: U256::zero(),
        };
        self.redeem(vaa, inbound, redeemer, false)
    }

    fn redeem(
        &mut self,
        vaa: &Vaa,
        t: Inbound,
        relayer: Address,
        unwrap: bool,
    ) -> Result<CompletedTransfer, ContractError> {
        let this_chain = self.chain_id();
        if t.recipient_chain != this_chain {
            return Err(ContractError::WrongTargetChain(t.recipient_chain));
        }
        self.state
            .consume(ReplayKey::new(vaa.emitter(), vaa.sequence))?;

        let native = t.token_chain == this_chain;
        let (token, decimals) = if native {
            (t.token_address, self.host.token_info(&t.token_address)?.decimals)
        } else {
            let record = self
                .state
                .wrapped(t.token_chain, &t.token_address)
                .ok_or(ContractError::AssetNotAttested {
                    chain: t.token_chain,
                    address: t.token_address,
                })?;
            (record.asset, record.decimals)
        };

        let wrapped_native = if unwrap {
            let wrapped_native = self
                .config
                .wrapped_native
                .ok_or(ContractError::WrappedNativeUnavailable)?;
            if !native || token != wrapped_native {
                return Err(ContractError::NotWrappedNative(token));
            }
            Some(wrapped_native)
        } else {
            None
        };

        let amount = denormalize_amount(t.amount, decimals).ok_or(ContractError::AmountOverflow {
            amount: t.amount,
            decimals,
        })?;
        let fee = denormalize_amount(t.fee, decimals).ok_or(ContractError::AmountOverflow {
            amount: t.fee,
            decimals,
        })?;
        if fee > amount {
            return Err(ContractError::FeeExceedsAmount { amount, fee });
        }
        let to_recipient = amount - fee;

        if native {
            let outstanding = self.state.bridge_in(token, t.amount)?;
            debug!(%token, outstanding, "outstanding supply decreased");
        }

        match wrapped_native {
            Some(wrapped_native) => {
                self.host
                    .withdraw_native(&wrapped_native, &t.recipient, to_recipient)?;
                if !fee.is_zero() {
                    self.host.withdraw_native(&wrapped_native, &relayer, fee)?;
                }
            }
            None if native => {
                self.host.release(&token, &t.recipient, to_recipient)?;
                if !fee.is_zero() {
                    self.host.release(&token, &relayer, fee)?;
                }
            }
            None => {
                self.host.mint(&token, &t.recipient, to_recipient)?;
                if !fee.is_zero() {
                    self.host.mint(&token, &relayer, fee)?;
                }
            }
        }

        info!(
            %token,
            recipient = %t.recipient,
            amount = %to_recipient,
            %fee,
            emitter_chain = %vaa.emitter_chain,
            sequence = vaa.sequence,
            "transfer completed"
        );
        Ok(CompletedTransfer {
            token,
            recipient: t.recipient,
            amount: to_recipient,
            relayer,
            fee,
        })
    }

    /// Routes a VAA by its emitter and payload type.
    pub fn submit_vaa(
        &mut self,
        env: &Env,
        info: &MessageInfo,
        data: &[u8],
    ) -> Result<Submitted, ContractError> {
        let vaa = Vaa::parse(data)?;
        if vaa.emitter() == self.core.config().governance_emitter() {
            return self
                .submit_governance_vaa(env, data)
                .map(Submitted::Governance);
        }

        self.transact("submit_vaa", |bridge| {
            let vaa = bridge.verify_from_bridge(env, data)?;
            let message = Message::parse(&vaa.payload)?;
            debug!(
                payload = message.payload_id(),
                emitter = %vaa.emitter(),
                sequence = vaa.sequence,
                "routing message"
            );
            match message {
                Message::Transfer(t) => bridge
                    .redeem(&vaa, t.into(), info.sender, false)
                    .map(Submitted::Transfer),
                Message::AssetMeta(meta) => bridge
                    .apply_attestation(&vaa, meta)
                    .map(Submitted::Attestation),
                Message::TransferWithPayload(t) => bridge
                    .redeem_with_payload(&vaa, t, info.sender)
                    .map(Submitted::Transfer),
            }
        })
    }

    // Queries

    pub fn bridge_contract(&self, chain: Chain) -> Option<Address> {
        self.state.bridge_contract(chain)
    }

    /// Local address of the wrapped form of `(chain, address)`, once attested.
    pub fn wrapped_asset(&self, chain: Chain, address: &Address) -> Option<Address> {
        self.state.wrapped(chain, address).map(|r| r.asset)
    }

    pub fn wrapped_asset_info(&self, asset: &Address) -> Option<&WrappedAssetRecord> {
        self.state.wrapped_by_asset(asset)
    }

    pub fn is_wrapped_asset(&self, asset: &Address) -> bool {
        self.state.is_wrapped(asset)
    }

    /// Wire units of a native token currently held on other chains.
    pub fn outstanding_bridged(&self, token: &Address) -> u64 {
        self.state.outstanding(token)
    }

    pub fn is_transfer_completed(&self, emitter: Emitter, sequence: u64) -> bool {
        self.state.is_consumed(&ReplayKey::new(emitter, sequence))
    }

    pub fn is_governance_consumed(&self, sequence: u64) -> bool {
        let governance = self.core.config().governance_emitter();
        self.state
            .is_governance_consumed(&ReplayKey::new(governance, sequence))
    }

    pub fn guardian_set(&self, index: u32) -> Option<&GuardianSetInfo> {
        self.core.guardian_sets().get(index)
    }
}
