// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Relays 0.01 USDC from Arbitrum Sepolia to Unichain Sepolia through the
//! deployed relay contracts.
//!
//! Environment variables (set these in .env file):
//! - TESTNET_PRIVATE_KEY: Your wallet private key (must start with 0x)
//! - ARBITRUM_SEPOLIA_RPC_URL: RPC endpoint for Arbitrum Sepolia
//! - UNICHAIN_SEPOLIA_RPC_URL: RPC endpoint for Unichain Sepolia
//! - CCTP_RELAY_IRIS_URL, CCTP_RELAY_POLL_INTERVAL_SECS, CCTP_RELAY_MAX_ATTEMPTS,
//!   CCTP_RELAY_DEADLINE_SECS: optional overrides for attestation polling
//!
//! Set REGISTER_COUNTERPARTS=1 to whitelist each relay contract on the other
//! domain first (requires the wallet to own both contracts).
//!
//! Run with: `cargo run --example relay_transfer`

use std::sync::Arc;

use alloy_network::EthereumWallet;
use alloy_primitives::U256;
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer_local::PrivateKeySigner;
use cctp_relay::providers::{
    AlloyDestinationChain, AlloySourceChain, IrisAttestationProvider, TokioClock,
};
use cctp_relay::{
    address_word, AttestationClient, Domain, DomainRegistry, FinalityThreshold, RelayConfig,
    RelayContract, RelayOrchestrator, TransferParams,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!("🌉 CCTP v2 Relay: Arbitrum Sepolia → Unichain Sepolia");
    println!("=====================================================\n");

    let config = RelayConfig::from_env()?;
    println!("📍 Attestation service: {}", config.iris_url);
    println!(
        "   Polling: {} attempts every {:?}\n",
        config.polling.max_attempts,
        config.polling.poll_interval()
    );

    let signer: PrivateKeySigner = std::env::var("TESTNET_PRIVATE_KEY")
        .expect("TESTNET_PRIVATE_KEY must be set in .env file")
        .parse()
        .expect("Invalid TESTNET_PRIVATE_KEY format");
    let wallet_address = signer.address();
    let wallet = EthereumWallet::from(signer);
    println!("📍 Wallet: {wallet_address}\n");

    let arbitrum_rpc = std::env::var("ARBITRUM_SEPOLIA_RPC_URL")
        .unwrap_or_else(|_| "https://sepolia-rollup.arbitrum.io/rpc".to_string());
    let unichain_rpc = std::env::var("UNICHAIN_SEPOLIA_RPC_URL")
        .unwrap_or_else(|_| "https://sepolia.unichain.org".to_string());

    println!("1️⃣  Creating providers...");
    let arbitrum = ProviderBuilder::new()
        .wallet(wallet.clone())
        .connect_http(arbitrum_rpc.parse()?);
    let unichain = ProviderBuilder::new()
        .wallet(wallet)
        .connect_http(unichain_rpc.parse()?);
    println!("   ✅ Arbitrum Sepolia chain id: {}", arbitrum.get_chain_id().await?);
    println!("   ✅ Unichain Sepolia chain id: {}\n", unichain.get_chain_id().await?);

    let registry = Arc::new(DomainRegistry::testnet());
    let arbitrum_config = registry.config(Domain::ARBITRUM)?;
    let unichain_config = registry.config(Domain::UNICHAIN)?;

    if std::env::var("REGISTER_COUNTERPARTS").is_ok_and(|v| v == "1") {
        println!("2️⃣  Registering counterpart relay contracts...");
        let arbitrum_relay = RelayContract::new(arbitrum_config.relay_contract, arbitrum.clone());
        let tx = arbitrum_relay.set_valid_contract_transaction(
            address_word(unichain_config.relay_contract),
            true,
            wallet_address,
        );
        let receipt = arbitrum.send_transaction(tx).await?.get_receipt().await?;
        println!("   ✅ Arbitrum relay trusts Unichain relay: {}", receipt.transaction_hash);

        let unichain_relay = RelayContract::new(unichain_config.relay_contract, unichain.clone());
        let tx = unichain_relay.set_valid_contract_transaction(
            address_word(arbitrum_config.relay_contract),
            true,
            wallet_address,
        );
        let receipt = unichain.send_transaction(tx).await?.get_receipt().await?;
        println!("   ✅ Unichain relay trusts Arbitrum relay: {}\n", receipt.transaction_hash);
    }

    let orchestrator = RelayOrchestrator::builder()
        .registry(Arc::clone(&registry))
        .attestation(AttestationClient::new(
            IrisAttestationProvider::from_config(&config),
            TokioClock::new(),
        ))
        .source(AlloySourceChain::new(arbitrum, wallet_address, arbitrum_config))
        .destination(AlloyDestinationChain::new(
            unichain,
            wallet_address,
            unichain_config,
        ))
        .polling(config.polling)
        .build();

    let params = TransferParams::builder()
        .source_domain(Domain::ARBITRUM)
        .destination_domain(Domain::UNICHAIN)
        .amount(U256::from(10_000))
        .mint_recipient(wallet_address)
        .max_fee(U256::from(2_000))
        .min_finality_threshold(FinalityThreshold::Standard)
        .build();

    println!("3️⃣  Burning on Arbitrum Sepolia and waiting for the attestation...");
    println!("   ⏳ This can take up to 20 minutes at standard finality\n");
    let transfer = orchestrator.relay(params).await?;

    println!("🎉 Transfer {} is {}", transfer.id, transfer.state);
    if let Some(tx) = transfer.source_tx_hash {
        println!("   Source tx:      {tx}");
    }
    if let Some(tx) = transfer.destination_tx_hash {
        println!("   Destination tx: {tx}");
    }
    if let Some(amount) = transfer.amount() {
        println!("   Amount:         {amount} (6 decimals)");
    }

    Ok(())
}
