//! Integration tests for the relay using fake chains and attestation service

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address, Bytes, U256};
use cctp_relay::providers::TokioClock;
use cctp_relay::testing::{
    FakeAttestationProvider, FakeClock, FakeDestinationChain, FakeSourceChain, ScriptedResponse,
};
use cctp_relay::{
    address_word, AttestationClient, AttestationRequest, AttestationStatus, BurnMessage, Clock,
    Domain, DomainRegistry, FinalityThreshold, Message, PollingConfig, RelayError,
    RelayOrchestrator, Transfer, TransferId, TransferParams, TransferState,
};

const RECIPIENT: Address = address!("7f7d7c8b1c8a2c5b1f0e3c1f4a9d7e2b3c4d0192");

type Orchestrator<C> =
    RelayOrchestrator<FakeAttestationProvider, C, FakeSourceChain, FakeDestinationChain>;

struct Setup<C> {
    orchestrator: Arc<Orchestrator<C>>,
    provider: FakeAttestationProvider,
    destination: FakeDestinationChain,
}

fn setup_with_clock<C: Clock>(clock: C, polling: PollingConfig) -> Setup<C> {
    let provider = FakeAttestationProvider::new();
    let destination = FakeDestinationChain::new();
    let orchestrator = RelayOrchestrator::builder()
        .registry(Arc::new(DomainRegistry::testnet()))
        .attestation(AttestationClient::new(provider.clone(), clock))
        .source(FakeSourceChain::new())
        .destination(destination.clone())
        .polling(polling)
        .build();
    Setup {
        orchestrator: Arc::new(orchestrator),
        provider,
        destination,
    }
}

fn setup() -> Setup<FakeClock> {
    setup_with_clock(FakeClock::new(), PollingConfig::default())
}

/// Arbitrum Sepolia → Unichain Sepolia, 10000 units, standard finality
fn arbitrum_to_unichain() -> TransferParams {
    TransferParams::builder()
        .source_domain(Domain::ARBITRUM)
        .destination_domain(Domain::UNICHAIN)
        .amount(U256::from(10_000))
        .mint_recipient(RECIPIENT)
        .min_finality_threshold(FinalityThreshold::Standard)
        .build()
}

fn request_for(transfer: &Transfer) -> AttestationRequest {
    AttestationRequest::new(transfer.source_domain, transfer.source_tx_hash.unwrap())
}

fn complete(message: Bytes) -> ScriptedResponse {
    ScriptedResponse::complete(message, Bytes::from_static(&[0x5a; 65]))
}

fn intent_bytes(transfer: &Transfer) -> Bytes {
    transfer.intent.as_ref().unwrap().encode().unwrap()
}

#[tokio::test]
async fn test_arbitrum_to_unichain_end_to_end() {
    let s = setup();

    let transfer = s.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap();
    assert_eq!(transfer.state, TransferState::SubmittedSource);

    s.provider
        .add_script(request_for(&transfer), vec![complete(intent_bytes(&transfer))]);

    let attested = s.orchestrator.await_finalization(transfer.id).await.unwrap();
    assert_eq!(attested.state, TransferState::Attested);

    let finalized = s.orchestrator.finalize(transfer.id).await.unwrap();
    assert_eq!(finalized.state, TransferState::Finalized);

    let message = finalized.message.unwrap();
    assert_eq!(message.destination_domain.as_u32(), 10);
    assert_eq!(message.source_domain.as_u32(), 3);
    assert_eq!(message.min_finality_threshold, 2000);

    let body = message.burn_body().unwrap();
    assert_eq!(body.amount, U256::from(10_000));
    assert_eq!(body.mint_recipient_address().unwrap(), RECIPIENT);
}

#[tokio::test]
async fn test_relay_polls_through_not_found() {
    let s = setup();
    let registry = DomainRegistry::testnet();
    let arbitrum = registry.config(Domain::ARBITRUM).unwrap();
    let unichain = registry.resolve(Domain::UNICHAIN).unwrap();

    // The fake source chain's first hash is known up front, so the authority
    // can be scripted with the message initiate is going to build.
    let expected = Message::builder()
        .source_domain(Domain::ARBITRUM)
        .destination_domain(Domain::UNICHAIN)
        .sender(address_word(arbitrum.token_messenger))
        .recipient(address_word(arbitrum.token_messenger))
        .destination_caller(unichain)
        .min_finality_threshold(2000)
        .body(
            BurnMessage::builder()
                .burn_token(address_word(arbitrum.usdc))
                .mint_recipient(address_word(RECIPIENT))
                .amount(U256::from(10_000))
                .message_sender(address_word(arbitrum.relay_contract))
                .build()
                .encode(),
        )
        .build();
    let request = AttestationRequest::new(Domain::ARBITRUM, FakeSourceChain::tx_hash_for(1));
    let not_found = 4;
    let mut script = vec![ScriptedResponse::NotFound; not_found];
    script.push(complete(expected.encode().unwrap()));
    s.provider.add_script(request, script);

    let transfer = s.orchestrator.relay(arbitrum_to_unichain()).await.unwrap();

    assert!(transfer.is_finalized());
    assert_eq!(transfer.intent.as_ref(), Some(&expected));
    assert_eq!(s.provider.call_count(&request), not_found + 1);
    assert_eq!(s.destination.call_count(), 1);
}

#[tokio::test]
async fn test_hook_instruction_reaches_destination() {
    let s = setup();
    let hook = Message::builder()
        .source_domain(Domain::UNICHAIN)
        .destination_domain(Domain::ARBITRUM)
        .sender(Address::repeat_byte(0x11).into_word())
        .recipient(Address::repeat_byte(0x22).into_word())
        .min_finality_threshold(1000)
        .body(Bytes::from_static(b"swap"))
        .build();
    let mut params = arbitrum_to_unichain();
    params.hook = Some(hook.clone());

    let transfer = s.orchestrator.initiate(params).await.unwrap();
    s.provider
        .add_script(request_for(&transfer), vec![complete(intent_bytes(&transfer))]);

    let attested = s.orchestrator.await_finalization(transfer.id).await.unwrap();
    assert_eq!(attested.hook.as_ref(), Some(&hook));

    s.orchestrator.finalize(transfer.id).await.unwrap();
    let requests = s.destination.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].hook.as_ref(), Some(&hook));
}

#[tokio::test]
async fn test_malformed_hook_finalizes_without_hook() {
    let s = setup();
    let transfer = s.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap();

    let mut attested_message = transfer.intent.clone().unwrap();
    let mut body = attested_message.burn_body().unwrap();
    body.hook_data = Bytes::from_static(&[0xde, 0xad, 0xbe, 0xef]);
    attested_message.body = body.encode();
    s.provider.add_script(
        request_for(&transfer),
        vec![complete(attested_message.encode().unwrap())],
    );

    let attested = s.orchestrator.await_finalization(transfer.id).await.unwrap();
    assert_eq!(attested.state, TransferState::Attested);
    assert_eq!(attested.hook, None);

    let finalized = s.orchestrator.finalize(transfer.id).await.unwrap();
    assert!(finalized.is_finalized());
    assert_eq!(s.destination.requests()[0].hook, None);
}

#[tokio::test]
async fn test_status_regression_fails_transfer() {
    let s = setup();
    let transfer = s.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap();
    let resumed = s
        .orchestrator
        .resume(Domain::ARBITRUM, Domain::UNICHAIN, transfer.source_tx_hash.unwrap())
        .unwrap();
    s.provider.add_script(
        request_for(&transfer),
        vec![
            complete(intent_bytes(&transfer)),
            ScriptedResponse::Status(AttestationStatus::Pending),
        ],
    );

    s.orchestrator.await_finalization(transfer.id).await.unwrap();
    let err = s
        .orchestrator
        .await_finalization(resumed.id)
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::ProtocolInvariant(_)));
    assert!(s.orchestrator.transfer(resumed.id).unwrap().is_failed());
    assert_eq!(
        s.orchestrator.transfer(transfer.id).unwrap().state,
        TransferState::Attested
    );
}

#[tokio::test]
async fn test_two_relayers_finalize_same_message() {
    let first = setup();
    // A second relayer with its own view of the authority, delivering on the
    // same destination chain.
    let second_provider = FakeAttestationProvider::new();
    let second = RelayOrchestrator::builder()
        .registry(Arc::new(DomainRegistry::testnet()))
        .attestation(AttestationClient::new(second_provider.clone(), FakeClock::new()))
        .source(FakeSourceChain::new())
        .destination(first.destination.clone())
        .build();

    let transfer = first.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap();
    for provider in [&first.provider, &second_provider] {
        provider.add_script(request_for(&transfer), vec![complete(intent_bytes(&transfer))]);
    }
    let resumed = second
        .resume(
            Domain::ARBITRUM,
            Domain::UNICHAIN,
            transfer.source_tx_hash.unwrap(),
        )
        .unwrap();

    first.orchestrator.await_finalization(transfer.id).await.unwrap();
    second.await_finalization(resumed.id).await.unwrap();

    let a = first.orchestrator.finalize(transfer.id).await.unwrap();
    let b = second.finalize(resumed.id).await.unwrap();

    assert!(a.is_finalized());
    assert!(b.is_finalized());
    assert!(a.destination_tx_hash.is_some());
    assert_eq!(b.destination_tx_hash, None);
    assert_eq!(first.destination.call_count(), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_transfers_progress_independently() {
    let s = setup();

    let mut transfers = Vec::new();
    for _ in 0..8 {
        transfers.push(s.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap());
    }
    for (i, transfer) in transfers.iter().enumerate() {
        let mut script = vec![ScriptedResponse::NotFound; i];
        script.push(complete(intent_bytes(transfer)));
        s.provider.add_script(request_for(transfer), script);
    }

    let handles: Vec<_> = transfers
        .iter()
        .map(|transfer| {
            let orchestrator = Arc::clone(&s.orchestrator);
            let id = transfer.id;
            tokio::spawn(async move {
                orchestrator.await_finalization(id).await?;
                orchestrator.finalize(id).await
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.await.unwrap().unwrap().is_finalized());
    }
    assert_eq!(s.destination.call_count(), 8);
    assert!(s.orchestrator.transfers().iter().all(Transfer::is_finalized));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_wait_is_resumable() {
    let s = setup_with_clock(TokioClock::new(), PollingConfig::default());
    let transfer = s.orchestrator.initiate(arbitrum_to_unichain()).await.unwrap();

    let cancelled = tokio::time::timeout(
        Duration::from_secs(150),
        s.orchestrator.await_finalization(transfer.id),
    )
    .await;
    assert!(cancelled.is_err());
    assert_eq!(
        s.orchestrator.transfer(transfer.id).unwrap().state,
        TransferState::AwaitingAttestation
    );

    s.provider
        .add_script(request_for(&transfer), vec![complete(intent_bytes(&transfer))]);
    let attested = s.orchestrator.await_finalization(transfer.id).await.unwrap();
    assert_eq!(attested.state, TransferState::Attested);
    assert!(s.orchestrator.finalize(transfer.id).await.unwrap().is_finalized());
}

#[tokio::test]
async fn test_unknown_transfer() {
    let s = setup();
    let id = TransferId::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);

    assert!(matches!(
        s.orchestrator.await_finalization(id).await.unwrap_err(),
        RelayError::UnknownTransfer(unknown) if unknown == id
    ));
    assert!(s.orchestrator.archive(id).is_err());
}
