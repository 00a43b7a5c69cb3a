use std::collections::HashMap;
use std::sync::Arc;

use alloy_primitives::TxHash;
use bon::Builder;
use parking_lot::{Mutex, RwLock};
use tracing::{error, info, warn, Instrument};

use super::transfer::{Transfer, TransferId, TransferParams, TransferState};
use crate::attestation_client::AttestationClient;
use crate::config::PollingConfig;
use crate::error::{RelayError, Result};
use crate::protocol::{address_word, AttestationRequest, BurnMessage, Domain, Message};
use crate::registry::DomainRegistry;
use crate::spans;
use crate::traits::{
    AttestationProvider, Clock, DestinationChain, ReceiveOutcome, ReceiveRequest, SourceChain,
    TransferIntent,
};

/// Revert reason fragment the transmitter uses for replayed messages
const NONCE_USED_REASON: &str = "nonce already used";

/// One tracked transfer.
///
/// `checkpoint` serializes workflow steps on the transfer and is held across
/// awaits; `state` is only locked for short synchronous reads and writes so
/// snapshots stay available while a step is in flight.
#[derive(Debug)]
struct Slot {
    checkpoint: tokio::sync::Mutex<()>,
    state: Mutex<Transfer>,
}

impl Slot {
    fn new(transfer: Transfer) -> Self {
        Self {
            checkpoint: tokio::sync::Mutex::new(()),
            state: Mutex::new(transfer),
        }
    }

    fn snapshot(&self) -> Transfer {
        self.state.lock().clone()
    }

    fn update<R>(&self, f: impl FnOnce(&mut Transfer) -> R) -> R {
        f(&mut self.state.lock())
    }

    fn set_state(&self, state: TransferState) -> Transfer {
        self.update(|transfer| {
            transfer.state = state;
            transfer.clone()
        })
    }

    fn fail(&self, error: &RelayError) {
        let reason = error.to_string();
        self.update(|transfer| {
            error!(
                transfer_id = %transfer.id,
                from_state = transfer.state.name(),
                reason = %reason,
                event = "transfer_failed"
            );
            transfer.state = TransferState::Failed { reason };
        });
    }
}

/// Drives transfers from initiation to finalization.
///
/// ```rust,ignore
/// let orchestrator = RelayOrchestrator::builder()
///     .registry(Arc::new(DomainRegistry::testnet()))
///     .attestation(AttestationClient::new(IrisAttestationProvider::sandbox(), TokioClock::new()))
///     .source(source_chain)
///     .destination(destination_chain)
///     .build();
///
/// let transfer = orchestrator.relay(params).await?;
/// assert!(transfer.is_finalized());
/// ```
#[derive(Builder)]
pub struct RelayOrchestrator<A, C, S, D> {
    registry: Arc<DomainRegistry>,
    attestation: AttestationClient<A, C>,
    source: S,
    destination: D,
    #[builder(default)]
    polling: PollingConfig,
    #[builder(skip)]
    transfers: RwLock<HashMap<TransferId, Arc<Slot>>>,
}

impl<A, C, S, D> RelayOrchestrator<A, C, S, D>
where
    A: AttestationProvider,
    C: Clock,
    S: SourceChain,
    D: DestinationChain,
{
    pub fn registry(&self) -> &Arc<DomainRegistry> {
        &self.registry
    }

    pub fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    pub fn attestation(&self) -> &AttestationClient<A, C> {
        &self.attestation
    }

    /// Builds the outgoing message and submits it on the source chain.
    ///
    /// # Errors
    ///
    /// - [`RelayError::UnknownDomain`] if either domain is not registered
    ///   (nothing is tracked in that case)
    /// - [`RelayError::HookUnsupported`] if `params.hook` is set and the source
    ///   chain cannot put hook data on chain (nothing is tracked either)
    /// - the source chain's error, verbatim, after marking the transfer failed
    pub async fn initiate(&self, params: TransferParams) -> Result<Transfer> {
        let destination_contract = self.registry.resolve(params.destination_domain)?;
        let source = self.registry.config(params.source_domain)?;
        let source_contract = address_word(source.relay_contract);
        // TokenMessengerV2 shares one address across domains; a full
        // destination record wins when present.
        let destination_messenger = self
            .registry
            .config(params.destination_domain)
            .map_or(source.token_messenger, |config| config.token_messenger);

        if params.hook.is_some() && !self.source.carries_hook_data() {
            return Err(RelayError::HookUnsupported {
                domain: params.source_domain,
            });
        }

        let hook_data = match &params.hook {
            Some(hook) => hook.encode()?,
            None => Default::default(),
        };
        let body = BurnMessage::builder()
            .burn_token(address_word(source.usdc))
            .mint_recipient(address_word(params.mint_recipient))
            .amount(params.amount)
            .message_sender(source_contract)
            .max_fee(params.max_fee)
            .hook_data(hook_data)
            .build();
        let message = Message::builder()
            .source_domain(params.source_domain)
            .destination_domain(params.destination_domain)
            .sender(address_word(source.token_messenger))
            .recipient(address_word(destination_messenger))
            .destination_caller(destination_contract)
            .min_finality_threshold(params.min_finality_threshold.as_u32())
            .body(body.encode())
            .build();

        let intent = TransferIntent {
            source_domain: params.source_domain,
            destination_domain: params.destination_domain,
            mint_recipient: body.mint_recipient,
            burn_token: body.burn_token,
            destination_caller: destination_contract,
            amount: params.amount,
            max_fee: params.max_fee,
            min_finality_threshold: params.min_finality_threshold,
            encoded_message: message.encode()?,
        };

        let mut transfer = Transfer::new(params.source_domain, params.destination_domain);
        transfer.intent = Some(message);
        let id = transfer.id;
        let slot = self.track(transfer);

        let span = spans::initiate(
            id,
            params.source_domain,
            params.destination_domain,
            &params.amount,
        );
        async {
            let _checkpoint = slot.checkpoint.lock().await;
            info!(
                transfer_id = %id,
                mint_recipient = %params.mint_recipient,
                finality = %params.min_finality_threshold,
                has_hook = params.hook.is_some(),
                event = "transfer_built"
            );

            match self.source.submit(&intent).await {
                Ok(tx_hash) => {
                    info!(transfer_id = %id, tx_hash = %tx_hash, event = "source_submitted");
                    Ok(slot.update(|transfer| {
                        transfer.source_tx_hash = Some(tx_hash);
                        transfer.state = TransferState::SubmittedSource;
                        transfer.clone()
                    }))
                }
                Err(e) => {
                    spans::record_error(&e);
                    slot.fail(&e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Tracks a transfer whose source transaction is already known.
    ///
    /// # Errors
    ///
    /// [`RelayError::UnknownDomain`] if either domain is not registered.
    pub fn resume(
        &self,
        source_domain: Domain,
        destination_domain: Domain,
        tx_hash: TxHash,
    ) -> Result<Transfer> {
        self.registry.resolve(source_domain)?;
        self.registry.resolve(destination_domain)?;

        let mut transfer = Transfer::new(source_domain, destination_domain);
        transfer.source_tx_hash = Some(tx_hash);
        transfer.state = TransferState::SubmittedSource;
        info!(
            transfer_id = %transfer.id,
            source_domain = %source_domain,
            destination_domain = %destination_domain,
            tx_hash = %tx_hash,
            event = "transfer_resumed"
        );
        let snapshot = transfer.clone();
        self.track(transfer);
        Ok(snapshot)
    }

    /// Waits for the attestation and validates the attested message.
    ///
    /// Returns the snapshot unchanged if the transfer is already attested or
    /// beyond. A timeout leaves the transfer in `AwaitingAttestation` so it can
    /// be awaited again; dropping the future has the same effect.
    pub async fn await_finalization(&self, id: TransferId) -> Result<Transfer> {
        let slot = self.slot(id)?;
        let _checkpoint = slot.checkpoint.lock().await;

        let transfer = slot.snapshot();
        if matches!(
            transfer.state,
            TransferState::Attested | TransferState::SubmittedDest | TransferState::Finalized
        ) {
            return Ok(transfer);
        }
        let tx_hash = match (&transfer.state, transfer.source_tx_hash) {
            (TransferState::SubmittedSource | TransferState::AwaitingAttestation, Some(tx)) => tx,
            (state, _) => {
                return Err(RelayError::InvalidTransition {
                    from: state.name(),
                    operation: "await_finalization",
                })
            }
        };

        slot.set_state(TransferState::AwaitingAttestation);
        let request = AttestationRequest::new(transfer.source_domain, tx_hash);

        let attestation = match self
            .attestation
            .await_attestation(&request, &self.polling)
            .await
        {
            Ok(attestation) => attestation,
            Err(e) => {
                if e.is_fatal() {
                    slot.fail(&e);
                } else {
                    warn!(
                        transfer_id = %id,
                        error = %e,
                        event = "attestation_wait_interrupted"
                    );
                }
                return Err(e);
            }
        };

        let message = match self.validate_attested(&transfer, &attestation.message) {
            Ok(message) => message,
            Err(e) => {
                slot.fail(&e);
                return Err(e);
            }
        };

        let hook = match message.hook_instruction() {
            Ok(hook) => hook,
            Err(e) => {
                warn!(
                    transfer_id = %id,
                    error = %e,
                    event = "hook_data_malformed"
                );
                None
            }
        };

        info!(
            transfer_id = %id,
            nonce = %message.nonce,
            has_hook = hook.is_some(),
            event = "transfer_attested"
        );
        Ok(slot.update(|transfer| {
            transfer.attestation = Some(attestation);
            transfer.message = Some(message);
            transfer.hook = hook;
            transfer.state = TransferState::Attested;
            transfer.clone()
        }))
    }

    /// The transmitter stamps TokenMessengerV2 into the header, so the relay
    /// contract that burned is identified by the body's `message_sender`.
    fn validate_attested(&self, transfer: &Transfer, raw: &[u8]) -> Result<Message> {
        let message = Message::decode(raw)?;
        let body = message.burn_body()?;

        if !self
            .registry
            .is_trusted_sender(message.source_domain, body.message_sender)
        {
            return Err(RelayError::UntrustedSender {
                domain: message.source_domain,
                sender: body.message_sender.to_string(),
            });
        }
        if let Ok(config) = self.registry.config(message.source_domain) {
            if message.sender != address_word(config.token_messenger) {
                return Err(RelayError::UntrustedSender {
                    domain: message.source_domain,
                    sender: message.sender.to_string(),
                });
            }
        }
        if message.source_domain != transfer.source_domain {
            return Err(RelayError::ProtocolInvariant(format!(
                "attested source {} does not match transfer source {}",
                message.source_domain, transfer.source_domain
            )));
        }
        if message.destination_domain != transfer.destination_domain {
            return Err(RelayError::ProtocolInvariant(format!(
                "attested destination {} does not match transfer destination {}",
                message.destination_domain, transfer.destination_domain
            )));
        }
        Ok(message)
    }

    /// Delivers the attested message on the destination chain.
    ///
    /// A replayed-nonce revert means someone already delivered the message and
    /// counts as success. Transport errors leave the transfer `Attested`.
    pub async fn finalize(&self, id: TransferId) -> Result<Transfer> {
        let slot = self.slot(id)?;
        let _checkpoint = slot.checkpoint.lock().await;

        let transfer = slot.snapshot();
        if transfer.is_finalized() {
            return Ok(transfer);
        }
        let (attestation, hook) = match (&transfer.state, &transfer.attestation) {
            (TransferState::Attested | TransferState::SubmittedDest, Some(attestation)) => {
                (attestation.clone(), transfer.hook.clone())
            }
            (state, _) => {
                return Err(RelayError::InvalidTransition {
                    from: state.name(),
                    operation: "finalize",
                })
            }
        };

        let span = spans::finalize(id, transfer.destination_domain, attestation.attestation.len());
        async {
            slot.set_state(TransferState::SubmittedDest);
            let request = ReceiveRequest {
                destination_domain: transfer.destination_domain,
                message: attestation.message,
                attestation: attestation.attestation,
                hook,
            };

            match self.destination.receive(&request).await {
                Ok(ReceiveOutcome::Received { tx_hash }) => {
                    info!(transfer_id = %id, tx_hash = %tx_hash, event = "transfer_finalized");
                    Ok(slot.update(|transfer| {
                        transfer.destination_tx_hash = Some(tx_hash);
                        transfer.state = TransferState::Finalized;
                        transfer.clone()
                    }))
                }
                Ok(ReceiveOutcome::Reverted { reason })
                    if reason.to_ascii_lowercase().contains(NONCE_USED_REASON) =>
                {
                    info!(
                        transfer_id = %id,
                        reason = %reason,
                        event = "transfer_already_finalized"
                    );
                    Ok(slot.set_state(TransferState::Finalized))
                }
                Ok(ReceiveOutcome::Reverted { reason }) => {
                    let e = RelayError::DestinationReverted { reason };
                    spans::record_error(&e);
                    slot.fail(&e);
                    Err(e)
                }
                Err(e) => {
                    spans::record_error(&e);
                    warn!(
                        transfer_id = %id,
                        error = %e,
                        event = "destination_submit_failed"
                    );
                    slot.set_state(TransferState::Attested);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Initiates a transfer and drives it to `Finalized`.
    pub async fn relay(&self, params: TransferParams) -> Result<Transfer> {
        let span = spans::relay(params.source_domain, params.destination_domain);
        async {
            let transfer = self.initiate(params).await?;
            tracing::Span::current().record("transfer_id", tracing::field::display(transfer.id));
            self.await_finalization(transfer.id).await?;
            self.finalize(transfer.id).await
        }
        .instrument(span)
        .await
    }

    pub fn transfer(&self, id: TransferId) -> Result<Transfer> {
        Ok(self.slot(id)?.snapshot())
    }

    pub fn transfers(&self) -> Vec<Transfer> {
        self.transfers
            .read()
            .values()
            .map(|slot| slot.snapshot())
            .collect()
    }

    /// Stops tracking a finalized or failed transfer and returns its last snapshot.
    pub fn archive(&self, id: TransferId) -> Result<Transfer> {
        let mut transfers = self.transfers.write();
        let slot = transfers.get(&id).ok_or(RelayError::UnknownTransfer(id))?;
        let snapshot = slot.snapshot();
        if !snapshot.state.is_terminal() {
            return Err(RelayError::InvalidTransition {
                from: snapshot.state.name(),
                operation: "archive",
            });
        }
        transfers.remove(&id);

        // The completion record is shared by every transfer resumed from the
        // same source transaction; release it with the last one.
        if let Some(tx_hash) = snapshot.source_tx_hash {
            let request = AttestationRequest::new(snapshot.source_domain, tx_hash);
            let shared = transfers.values().any(|slot| {
                let other = slot.snapshot();
                other.source_domain == request.source_domain
                    && other.source_tx_hash == Some(tx_hash)
            });
            if !shared {
                self.attestation.forget(&request);
            }
        }

        info!(transfer_id = %id, state = snapshot.state.name(), event = "transfer_archived");
        Ok(snapshot)
    }

    fn track(&self, transfer: Transfer) -> Arc<Slot> {
        let slot = Arc::new(Slot::new(transfer));
        let id = slot.snapshot().id;
        self.transfers.write().insert(id, Arc::clone(&slot));
        slot
    }

    fn slot(&self, id: TransferId) -> Result<Arc<Slot>> {
        self.transfers
            .read()
            .get(&id)
            .cloned()
            .ok_or(RelayError::UnknownTransfer(id))
    }
}
