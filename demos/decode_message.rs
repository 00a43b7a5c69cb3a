// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0
//! Decodes a CCTP v2 message, its burn body and any nested hook message.
//!
//! Pass the hex-encoded message as the first argument. Without one, a sample
//! Arbitrum Sepolia → Unichain Sepolia message carrying a hook is built and
//! decoded instead.
//!
//! Run with: `cargo run --example decode_message -- 0x00000001...`

use alloy_primitives::{hex, U256};
use cctp_relay::{
    address_word, BurnMessage, Domain, DomainRegistry, FinalityThreshold, Message, RelayError,
};

fn sample_message() -> Result<Vec<u8>, RelayError> {
    let registry = DomainRegistry::testnet();
    let arbitrum = registry.config(Domain::ARBITRUM)?;
    let unichain = registry.config(Domain::UNICHAIN)?;

    let hook = Message::builder()
        .source_domain(Domain::ARBITRUM)
        .destination_domain(Domain::UNICHAIN)
        .sender(address_word(arbitrum.relay_contract))
        .recipient(address_word(unichain.relay_contract))
        .min_finality_threshold(FinalityThreshold::Standard.as_u32())
        .build();

    let body = BurnMessage::builder()
        .burn_token(address_word(arbitrum.usdc))
        .mint_recipient(address_word(unichain.relay_contract))
        .amount(U256::from(10_000))
        .message_sender(address_word(arbitrum.relay_contract))
        .max_fee(U256::from(2_000))
        .hook_data(hook.encode()?)
        .build();

    let message = Message::builder()
        .source_domain(Domain::ARBITRUM)
        .destination_domain(Domain::UNICHAIN)
        .sender(address_word(arbitrum.token_messenger))
        .recipient(address_word(unichain.token_messenger))
        .destination_caller(address_word(unichain.relay_contract))
        .min_finality_threshold(FinalityThreshold::Standard.as_u32())
        .body(body.encode())
        .build();

    Ok(message.encode()?.to_vec())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw = match std::env::args().nth(1) {
        Some(arg) => hex::decode(arg.trim())?,
        None => {
            println!("ℹ️  No message given, decoding a sample\n");
            sample_message()?
        }
    };

    println!("🔍 Message ({} bytes)", raw.len());
    println!("===================\n");

    let message = Message::decode(&raw)?;
    println!("📨 Header:");
    println!("   Version:              {}", message.version);
    println!("   Source domain:        {}", message.source_domain);
    println!("   Destination domain:   {}", message.destination_domain);
    println!("   Nonce:                {}", message.nonce);
    println!("   Sender:               {}", message.sender);
    println!("   Recipient:            {}", message.recipient);
    println!("   Destination caller:   {}", message.destination_caller);
    println!("   Permissionless:       {}", message.is_permissionless());
    match FinalityThreshold::from_u32(message.min_finality_threshold) {
        Some(threshold) => println!("   Min finality:         {threshold}"),
        None => println!("   Min finality:         {}", message.min_finality_threshold),
    }
    println!("   Finality executed:    {}", message.finality_threshold_executed);
    println!("   Hash:                 {}\n", message.hash()?);

    let body = match message.burn_body() {
        Ok(body) => body,
        Err(e) => {
            println!("⚠️  Body is not a burn message: {e}");
            return Ok(());
        }
    };
    println!("🔥 Burn body:");
    println!("   Version:              {}", body.version);
    println!("   Burn token:           {}", body.burn_token);
    println!("   Mint recipient:       {}", body.mint_recipient_address()?);
    println!("   Amount:               {}", body.amount);
    println!("   Message sender:       {}", body.message_sender);
    println!("   Max fee:              {}", body.max_fee);
    println!("   Fee executed:         {}", body.fee_executed);
    println!("   Expiration block:     {}", body.expiration_block);
    println!("   Fast transfer:        {}\n", body.is_fast_transfer());

    if !body.has_hooks() {
        println!("🪝 No hook data");
        return Ok(());
    }

    match message.hook_instruction() {
        Ok(Some(hook)) => {
            println!("🪝 Hook instruction ({} bytes):", body.hook_data.len());
            println!("   Source domain:        {}", hook.source_domain);
            println!("   Destination domain:   {}", hook.destination_domain);
            println!("   Sender:               {}", hook.sender);
            println!("   Recipient:            {}", hook.recipient);
        }
        Ok(None) => println!("🪝 No hook data"),
        Err(e) => println!("⚠️  Hook data is not a message: {e}"),
    }

    Ok(())
}
