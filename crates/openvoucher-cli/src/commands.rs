//! Subcommand implementations. Each returns the text to print.

use std::path::Path;

use openvoucher_auth::{AuthoritySigner, SignatureVerifier};
use openvoucher_types::{Address, Result, Voucher, VoucherTerms};
use serde_json::json;

pub fn keygen() -> Result<String> {
    let signer = AuthoritySigner::random();
    tracing::info!(address = %signer.address(), "Generated authority key");
    Ok(serde_json::to_string_pretty(&json!({
        "address": signer.address(),
        "secret_key": signer.secret_hex(),
    }))?)
}

pub fn sign(key: &str, terms: VoucherTerms) -> Result<String> {
    let signer = AuthoritySigner::from_hex(key)?;
    let voucher = signer.sign(terms)?;
    tracing::info!(
        authority = %signer.address(),
        unique_id = %terms.unique_id,
        recipient = %terms.recipient,
        expires_at = terms.expires_at,
        "Voucher issued"
    );
    voucher.to_json_pretty()
}

pub fn read_voucher(path: &Path) -> Result<Voucher> {
    let raw = std::fs::read_to_string(path)?;
    Voucher::from_json_str(&raw)
}

pub fn digest(voucher: &Voucher) -> String {
    let report = json!({
        "encoded": format!("0x{}", hex::encode(voucher.terms.encode_packed())),
        "digest": format!("0x{}", hex::encode(voucher.terms.digest())),
        "signing_hash": format!("0x{}", hex::encode(voucher.terms.signing_hash())),
    });
    // A json! object of strings always serializes.
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
}

/// Recover the signer and compare with `authority`.
///
/// Fails with the verifier's error when the voucher does not check out.
pub fn verify(voucher: &Voucher, authority: Address) -> Result<String> {
    let signer = SignatureVerifier::recover_signer(&voucher.terms.digest(), &voucher.signature)?;
    SignatureVerifier::new(authority).verify_voucher(voucher)?;
    Ok(serde_json::to_string_pretty(&json!({
        "valid": true,
        "signer": signer,
        "unique_id": voucher.terms.unique_id.to_string(),
    }))?)
}
