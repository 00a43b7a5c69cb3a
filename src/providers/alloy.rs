//! Alloy-based source and destination chain adapters.

use alloy_network::{Ethereum, ReceiptResponse};
use alloy_primitives::{Address, TxHash};
use alloy_rpc_types::TransactionRequest;
use alloy_provider::Provider;
use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use crate::contracts::erc20::Erc20Contract;
use crate::contracts::relay::RelayContract;
use crate::error::{RelayError, Result};
use crate::protocol::{bytes32_to_address, Message};
use crate::registry::DomainConfig;
use crate::traits::{
    DestinationChain, ReceiveOutcome, ReceiveRequest, SourceChain, TransferIntent,
};

/// Submits `cross` on one domain's relay contract.
///
/// Approves the relay contract for the burned amount first when the current
/// USDC allowance does not cover it, then waits for `cross` to be included so
/// the attestation service can index it. `cross` has no hook argument, so
/// intents whose message carries hook data are refused before anything is
/// sent.
///
/// # Examples
///
/// ```rust,no_run
/// use cctp_relay::providers::AlloySourceChain;
/// use cctp_relay::{Domain, DomainRegistry};
/// use alloy_primitives::address;
/// use alloy_provider::ProviderBuilder;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = ProviderBuilder::new()
///     .connect("https://sepolia-rollup.arbitrum.io/rpc")
///     .await?;
/// let config = DomainRegistry::testnet().config(Domain::ARBITRUM)?;
/// let sender = address!("7f7d7c8b1c8a2c5b1f0e3c1f4a9d7e2b3c4d0192");
///
/// let source = AlloySourceChain::new(provider, sender, config);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlloySourceChain<P> {
    provider: P,
    sender: Address,
    config: DomainConfig,
}

impl<P> AlloySourceChain<P>
where
    P: Provider<Ethereum> + Clone,
{
    pub fn new(provider: P, sender: Address, config: DomainConfig) -> Self {
        Self {
            provider,
            sender,
            config,
        }
    }

    pub fn inner(&self) -> &P {
        &self.provider
    }

    async fn send_and_wait(&self, tx: TransactionRequest) -> Result<TxHash> {
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| RelayError::SourceSubmission(e.to_string()))?;
        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| RelayError::SourceSubmission(e.to_string()))?;
        if !receipt.status() {
            return Err(RelayError::SourceSubmission(format!(
                "transaction {} reverted",
                receipt.transaction_hash()
            )));
        }
        Ok(receipt.transaction_hash())
    }
}

#[async_trait]
impl<P> SourceChain for AlloySourceChain<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
{
    #[instrument(
        skip(self, intent),
        fields(source_domain = %intent.source_domain, destination_domain = %intent.destination_domain)
    )]
    async fn submit(&self, intent: &TransferIntent) -> Result<TxHash> {
        if intent.source_domain != self.config.domain {
            return Err(RelayError::SourceSubmission(format!(
                "chain adapter serves {}, intent is for {}",
                self.config.domain, intent.source_domain
            )));
        }
        if Message::decode(&intent.encoded_message)?.burn_body()?.has_hooks() {
            return Err(RelayError::HookUnsupported {
                domain: intent.source_domain,
            });
        }

        let token = bytes32_to_address(intent.burn_token.as_slice())?;
        let usdc = Erc20Contract::new(token, self.provider.clone());
        let allowance = usdc
            .allowance(self.sender, self.config.relay_contract)
            .await
            .map_err(|e| RelayError::SourceSubmission(e.to_string()))?;

        if allowance < intent.amount {
            let approve_tx =
                usdc.approve_transaction(self.sender, self.config.relay_contract, intent.amount);
            let approve_hash = self.send_and_wait(approve_tx).await?;
            info!(
                tx_hash = %approve_hash,
                allowance = %allowance,
                amount = %intent.amount,
                event = "usdc_approved"
            );
        }

        let relay = RelayContract::new(self.config.relay_contract, self.provider.clone());
        let tx_hash = self
            .send_and_wait(relay.cross_transaction(intent, self.sender))
            .await?;
        info!(tx_hash = %tx_hash, event = "cross_included");
        Ok(tx_hash)
    }
}

/// Delivers attested messages through one domain's relay contract.
///
/// Messages with a decoded hook go through `receiveUSDCAndData`, everything
/// else through `receiveUSDC`. JSON-RPC error responses (typically gas estimation reverts) and mined
/// transactions with a failed status are reported as reverts; anything else
/// the node or transport throws is an error the caller may retry.
#[derive(Debug, Clone)]
pub struct AlloyDestinationChain<P> {
    provider: P,
    sender: Address,
    config: DomainConfig,
}

impl<P> AlloyDestinationChain<P>
where
    P: Provider<Ethereum> + Clone,
{
    pub fn new(provider: P, sender: Address, config: DomainConfig) -> Self {
        Self {
            provider,
            sender,
            config,
        }
    }

    pub fn inner(&self) -> &P {
        &self.provider
    }
}

#[async_trait]
impl<P> DestinationChain for AlloyDestinationChain<P>
where
    P: Provider<Ethereum> + Clone + Send + Sync,
{
    #[instrument(skip(self, request), fields(destination_domain = %request.destination_domain))]
    async fn receive(&self, request: &ReceiveRequest) -> Result<ReceiveOutcome> {
        if request.destination_domain != self.config.domain {
            return Err(RelayError::UnknownDomain {
                domain: request.destination_domain,
            });
        }
        if let Some(hook) = &request.hook {
            debug!(
                hook_source_domain = %hook.source_domain,
                hook_destination_domain = %hook.destination_domain,
                event = "hook_instruction_attached"
            );
        }

        let relay = RelayContract::new(self.config.relay_contract, self.provider.clone());
        let tx = receive_transaction_for(&relay, request, self.sender);

        let pending = match self.provider.send_transaction(tx).await {
            Ok(pending) => pending,
            Err(e) => {
                if let Some(payload) = e.as_error_resp() {
                    warn!(
                        code = payload.code,
                        reason = %payload.message,
                        event = "receive_rejected"
                    );
                    return Ok(ReceiveOutcome::Reverted {
                        reason: payload.message.to_string(),
                    });
                }
                return Err(RelayError::Rpc(e));
            }
        };

        let receipt = pending
            .get_receipt()
            .await
            .map_err(|e| RelayError::TransientTransport(e.to_string()))?;
        let tx_hash = receipt.transaction_hash();
        if !receipt.status() {
            return Ok(ReceiveOutcome::Reverted {
                reason: format!("transaction {tx_hash} reverted"),
            });
        }
        Ok(ReceiveOutcome::Received { tx_hash })
    }
}

fn receive_transaction_for<P: Provider<Ethereum>>(
    relay: &RelayContract<P>,
    request: &ReceiveRequest,
    from: Address,
) -> TransactionRequest {
    let message = request.message.clone();
    let attestation = request.attestation.clone();
    match request.hook {
        Some(_) => relay.receive_transaction(message, attestation, from),
        None => relay.receive_usdc_transaction(message, attestation, from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::relay::CctpRelayV2;
    use crate::protocol::{address_word, BurnMessage, Domain, FinalityThreshold};
    use crate::registry::DomainRegistry;
    use alloy_primitives::{Bytes, B256, U256};
    use alloy_provider::ProviderBuilder;
    use alloy_sol_types::SolCall;

    fn hook() -> Message {
        Message::builder()
            .source_domain(Domain::ARBITRUM)
            .destination_domain(Domain::UNICHAIN)
            .sender(Address::repeat_byte(0x11).into_word())
            .recipient(Address::repeat_byte(0x22).into_word())
            .min_finality_threshold(2000)
            .build()
    }

    fn intent_with_hook(config: &DomainConfig) -> TransferIntent {
        let body = BurnMessage::builder()
            .burn_token(address_word(config.usdc))
            .mint_recipient(Address::repeat_byte(0x7f).into_word())
            .amount(U256::from(10_000))
            .message_sender(address_word(config.relay_contract))
            .hook_data(hook().encode().unwrap())
            .build();
        let message = Message::builder()
            .source_domain(Domain::ARBITRUM)
            .destination_domain(Domain::UNICHAIN)
            .sender(address_word(config.token_messenger))
            .recipient(address_word(config.token_messenger))
            .min_finality_threshold(2000)
            .body(body.encode())
            .build();
        TransferIntent {
            source_domain: Domain::ARBITRUM,
            destination_domain: Domain::UNICHAIN,
            mint_recipient: body.mint_recipient,
            burn_token: body.burn_token,
            destination_caller: B256::ZERO,
            amount: body.amount,
            max_fee: U256::ZERO,
            min_finality_threshold: FinalityThreshold::Standard,
            encoded_message: message.encode().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_source_refuses_hook_data_before_sending() {
        // Nothing listens on this port; the refusal must happen before any RPC.
        let provider = ProviderBuilder::new().connect_http("http://127.0.0.1:1".parse().unwrap());
        let config = DomainRegistry::testnet().config(Domain::ARBITRUM).unwrap();
        let source = AlloySourceChain::new(provider, Address::repeat_byte(1), config.clone());

        assert!(!source.carries_hook_data());
        let err = source.submit(&intent_with_hook(&config)).await.unwrap_err();
        assert!(matches!(err, RelayError::HookUnsupported { domain } if domain == Domain::ARBITRUM));
    }

    #[test]
    fn test_receive_entry_point_follows_hook() {
        let provider = ProviderBuilder::new().connect_http("http://localhost:8545".parse().unwrap());
        let relay = RelayContract::new(Address::repeat_byte(0x64), provider);
        let mut request = ReceiveRequest {
            destination_domain: Domain::UNICHAIN,
            message: Bytes::from_static(&[1; 148]),
            attestation: Bytes::from_static(&[2; 65]),
            hook: None,
        };
        let from = Address::repeat_byte(1);

        let tx = receive_transaction_for(&relay, &request, from);
        assert_eq!(
            tx.input.input().unwrap()[..4],
            CctpRelayV2::receiveUSDCCall::SELECTOR
        );

        request.hook = Some(hook());
        let tx = receive_transaction_for(&relay, &request, from);
        assert_eq!(
            tx.input.input().unwrap()[..4],
            CctpRelayV2::receiveUSDCAndDataCall::SELECTOR
        );
    }
}
