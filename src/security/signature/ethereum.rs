//! Ethereum personal_sign 验证（EIP-191）
//!
//! keccak256("\x19Ethereum Signed Message:\n" + len + message)，
//! 从 65 字节 (r, s, v) 签名恢复签名者地址后与声明地址做大小写无关比较。

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use super::{strip_hex_prefix, VerifyFailure};

/// EIP-191 消息哈希
pub fn hash_message(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// 公钥 -> 0x 小写地址
pub fn public_key_to_address(key: &VerifyingKey) -> String {
    let encoded = key.to_encoded_point(false);
    let hash = Keccak256::digest(&encoded.as_bytes()[1..]);
    format!("0x{}", hex::encode(&hash[12..]))
}

/// 从签名恢复签名者地址
pub fn recover_address(message: &str, signature_hex: &str) -> Result<String, VerifyFailure> {
    let bytes = hex::decode(strip_hex_prefix(signature_hex.trim()))
        .map_err(|e| VerifyFailure::MalformedSignature(format!("signature is not hex: {}", e)))?;
    if bytes.len() != 65 {
        return Err(VerifyFailure::MalformedSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }

    // v 兼容 {0,1} 与 {27,28}
    let v = bytes[64];
    let v = match v {
        0 | 1 => v,
        27 | 28 => v - 27,
        other => {
            return Err(VerifyFailure::MalformedSignature(format!(
                "invalid recovery byte v={}",
                other
            )))
        }
    };

    let mut signature = Signature::from_slice(&bytes[..64])
        .map_err(|_| VerifyFailure::MalformedSignature("invalid r/s scalar".into()))?;
    let mut recovery_id = RecoveryId::from_byte(v)
        .ok_or_else(|| VerifyFailure::MalformedSignature("invalid recovery id".into()))?;

    // 高 S 签名规范化时 y 奇偶性随之翻转
    if let Some(normalized) = signature.normalize_s() {
        signature = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let digest = hash_message(message.as_bytes());
    let key = VerifyingKey::recover_from_prehash(&digest, &signature, recovery_id)
        .map_err(|_| VerifyFailure::Mismatch)?;

    Ok(public_key_to_address(&key))
}

/// 验证签名是否由 `expected_address` 产生
pub fn verify_message(
    message: &str,
    signature_hex: &str,
    expected_address: &str,
) -> Result<(), VerifyFailure> {
    let expected = expected_address.trim();
    let hex_part = strip_hex_prefix(expected);
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(VerifyFailure::MalformedIdentity(
            "expected a 20-byte hex address".into(),
        ));
    }

    let recovered = recover_address(message, signature_hex)?;
    if strip_hex_prefix(&recovered).eq_ignore_ascii_case(hex_part) {
        Ok(())
    } else {
        Err(VerifyFailure::Mismatch)
    }
}
