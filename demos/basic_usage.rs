//! Basic usage examples for XdrAsm

use tracing_subscriber::EnvFilter;
use xdrasm::config::TESTNET_PASSPHRASE;
use xdrasm::fee_calculator::FeeCalculator;
use xdrasm::payload::normalize_text;
use xdrasm::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    println!("=== XdrAsm Basic Usage Examples ===\n");

    // Example 1: Building, signing and serializing a payment
    let encoded = example_payment()?;

    // Example 2: Encoding a contract call
    example_contract_call()?;

    // Example 3: Fee calculation
    example_fee_calculation()?;

    // Example 4: Deserializing and verifying
    example_deserialization(&encoded)?;

    Ok(())
}

fn demo_keypair() -> Keypair {
    Keypair::from_seed(&[42u8; 32])
}

fn example_payment() -> Result<String, Box<dyn std::error::Error>> {
    println!("Example 1: Payment");
    println!("------------------");

    let payer = demo_keypair();
    let destination = AccountId([7u8; 32]).to_strkey();

    let unsigned = TransactionBuilder::new(&payer.public_key().to_strkey(), 1)
        .memo(Memo::text("demo")?)
        .timeout(300)
        .add_intent(Intent::payment(&destination, Asset::Native, "12500000"))
        .build()?;

    let signed = sign(unsigned, &payer.secret_strkey(), TESTNET_PASSPHRASE)?;
    let encoded = serialize(&signed)?;

    println!("✓ Payment signed");
    println!("  Source: {}", payer.public_key());
    println!("  Fee: {} stroops", signed.transaction.fee);
    println!("  Hash: {}", signed.hash(TESTNET_PASSPHRASE)?);
    println!("  Envelope: {} base64 chars", encoded.len());
    println!();

    Ok(encoded)
}

fn example_contract_call() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 2: Contract Call");
    println!("------------------------");

    let payer = demo_keypair();
    let contract = ContractId([9u8; 32]).to_strkey();

    let call = ContractCall::new(&contract, "mint")
        .arg("to", ArgType::AccountAddress, payer.public_key().to_strkey())
        .arg("token_id", ArgType::U32, 17u32)
        .arg("uri", ArgType::String, "ipfs://pin")
        .arg("metadata", ArgType::Bytes, r#"{"lat":48.85,"lng":2.35}"#)
        .arg("note", ArgType::String, ArgValue::Null);

    let unsigned = TransactionBuilder::new(&payer.public_key().to_strkey(), 2)
        .add_intent(call)
        .build()?;

    println!("✓ Contract call encoded");
    println!("  Needs simulation: {}", unsigned.requires_simulation());
    println!("  Warnings: {:?}", unsigned.warnings);
    println!(
        "  Byte payload for JSON text: {} bytes",
        normalize_text(r#"{"lat":48.85,"lng":2.35}"#).len()
    );
    println!("  Simulation request: {} base64 chars", unsigned.to_xdr_base64()?.len());

    match unsigned.into_prepared() {
        Err(XdrAsmError::PreparationRequired) => println!("  Signing refused until prepared"),
        other => println!("  Unexpected: {:?}", other.map(|_| ())),
    }
    println!();

    Ok(())
}

fn example_fee_calculation() -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 3: Fee Calculation");
    println!("--------------------------");

    let calculator = FeeCalculator::with_base_fee(250);
    let inclusion = calculator.inclusion_fee(3)?;
    let total = calculator.with_resource_fee(inclusion, 58_181)?;

    println!("✓ Fees computed");
    println!("  Inclusion fee (3 ops @ 250): {} stroops", inclusion);
    println!("  With resource fee: {} stroops", total);
    println!();

    Ok(())
}

fn example_deserialization(encoded: &str) -> Result<(), Box<dyn std::error::Error>> {
    println!("Example 4: Deserialization");
    println!("--------------------------");

    let envelope = deserialize(encoded)?;
    let payer = demo_keypair().public_key();

    println!("✓ Envelope parsed");
    println!("  Operations: {}", envelope.transaction.operations.len());
    println!("  Signatures: {}", envelope.signatures.len());
    println!(
        "  Valid on testnet: {}",
        envelope.verify_signature(&payer, TESTNET_PASSPHRASE)?
    );
    println!(
        "  Valid on public network: {}",
        envelope.verify_signature(&payer, &Network::public().passphrase)?
    );
    println!();

    Ok(())
}
