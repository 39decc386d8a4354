//! Solana 消息签名验证
//! ed25519 分离签名，消息为原始 UTF-8 字节（无前缀）

use ed25519_dalek::{Signature, VerifyingKey};

use super::VerifyFailure;

fn decode_public_key(address: &str) -> Result<VerifyingKey, VerifyFailure> {
    let bytes = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| VerifyFailure::MalformedIdentity(format!("public key is not base58: {}", e)))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
        VerifyFailure::MalformedIdentity(format!("expected 32 bytes, got {}", v.len()))
    })?;
    VerifyingKey::from_bytes(&bytes)
        .map_err(|_| VerifyFailure::MalformedIdentity("not an ed25519 point".into()))
}

fn decode_signature(signature_b58: &str) -> Result<Signature, VerifyFailure> {
    let bytes = bs58::decode(signature_b58.trim())
        .into_vec()
        .map_err(|e| VerifyFailure::MalformedSignature(format!("signature is not base58: {}", e)))?;
    let bytes: [u8; 64] = bytes.try_into().map_err(|v: Vec<u8>| {
        VerifyFailure::MalformedSignature(format!("expected 64 bytes, got {}", v.len()))
    })?;
    Ok(Signature::from_bytes(&bytes))
}

/// 验证 base58 签名是否由 base58 公钥（即 Solana 地址）产生
pub fn verify_message(
    message: &str,
    signature_b58: &str,
    address: &str,
) -> Result<(), VerifyFailure> {
    let signature = decode_signature(signature_b58)?;
    let public_key = decode_public_key(address)?;

    public_key
        .verify_strict(message.as_bytes(), &signature)
        .map_err(|_| VerifyFailure::Mismatch)
}
