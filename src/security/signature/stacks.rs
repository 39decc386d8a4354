//! Stacks 消息签名验证
//!
//! 哈希：sha256(prefix || varint(len) || message)
//! 签名：65 字节 RSV（r || s || v）十六进制
//! 公钥：SEC1 十六进制（压缩 33 字节或未压缩 65 字节）

use anyhow::{anyhow, bail, Result};
use bitcoin::hashes::{hash160, Hash};
use k256::ecdsa::{signature::hazmat::PrehashVerifier, Signature, VerifyingKey};
use sha2::{Digest, Sha256};

use super::{strip_hex_prefix, VerifyFailure};

pub const STACKS_MESSAGE_PREFIX: &str = "\x17Stacks Signed Message:\n";
pub const LEGACY_STACKS_MESSAGE_PREFIX: &str = "\x18Stacks Message Signing:\n";

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Stacks 网络地址版本号
pub const MAINNET_SINGLE_SIG: u8 = 22;
pub const TESTNET_SINGLE_SIG: u8 = 26;

/// Bitcoin 风格 varint
fn encode_varint(n: u64) -> Vec<u8> {
    match n {
        0..=0xfc => vec![n as u8],
        0xfd..=0xffff => {
            let mut out = vec![0xfd];
            out.extend_from_slice(&(n as u16).to_le_bytes());
            out
        }
        0x1_0000..=0xffff_ffff => {
            let mut out = vec![0xfe];
            out.extend_from_slice(&(n as u32).to_le_bytes());
            out
        }
        _ => {
            let mut out = vec![0xff];
            out.extend_from_slice(&n.to_le_bytes());
            out
        }
    }
}

/// 按 Stacks 结构化签名规则计算消息哈希
pub fn hash_message(message: &str, prefix: &str) -> [u8; 32] {
    let bytes = message.as_bytes();
    let mut hasher = Sha256::new();
    hasher.update(prefix.as_bytes());
    hasher.update(encode_varint(bytes.len() as u64));
    hasher.update(bytes);
    hasher.finalize().into()
}

fn parse_public_key(public_key_hex: &str) -> Result<VerifyingKey, VerifyFailure> {
    let bytes = hex::decode(strip_hex_prefix(public_key_hex.trim()))
        .map_err(|e| VerifyFailure::MalformedIdentity(format!("public key is not hex: {}", e)))?;
    VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|_| VerifyFailure::MalformedIdentity("not a secp256k1 public key".into()))
}

fn parse_rsv_signature(signature_hex: &str) -> Result<Signature, VerifyFailure> {
    let bytes = hex::decode(strip_hex_prefix(signature_hex.trim()))
        .map_err(|e| VerifyFailure::MalformedSignature(format!("signature is not hex: {}", e)))?;
    if bytes.len() != 65 {
        return Err(VerifyFailure::MalformedSignature(format!(
            "expected 65 bytes, got {}",
            bytes.len()
        )));
    }

    let signature = Signature::from_slice(&bytes[..64])
        .map_err(|_| VerifyFailure::MalformedSignature("invalid r/s scalar".into()))?;
    // 钱包库不强制 low-S，这里统一规范化
    Ok(signature.normalize_s().unwrap_or(signature))
}

/// 验证 Stacks 钱包对消息的签名
pub fn verify_message(
    message: &str,
    signature_hex: &str,
    public_key_hex: &str,
) -> Result<(), VerifyFailure> {
    let signature = parse_rsv_signature(signature_hex)?;
    let public_key = parse_public_key(public_key_hex)?;

    for prefix in [STACKS_MESSAGE_PREFIX, LEGACY_STACKS_MESSAGE_PREFIX] {
        let digest = hash_message(message, prefix);
        if public_key.verify_prehash(&digest, &signature).is_ok() {
            return Ok(());
        }
    }

    Err(VerifyFailure::Mismatch)
}

/// c32 编码（大整数按 5 bit 分组，保留前导零字节）
pub fn c32_encode(data: &[u8]) -> String {
    let mut out: Vec<u8> = Vec::with_capacity(data.len() * 8 / 5 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits = 0u32;

    for &byte in data.iter().rev() {
        carry |= (byte as u16) << carry_bits;
        carry_bits += 8;
        while carry_bits >= 5 {
            out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
            carry >>= 5;
            carry_bits -= 5;
        }
    }
    if carry_bits > 0 {
        out.push(C32_ALPHABET[(carry & 0x1f) as usize]);
    }

    while out.last() == Some(&b'0') {
        out.pop();
    }
    let leading_zero_bytes = data.iter().take_while(|b| **b == 0).count();
    out.extend(std::iter::repeat(b'0').take(leading_zero_bytes));
    out.reverse();

    out.into_iter().map(char::from).collect()
}

/// c32 解码（c32_encode 的逆运算）
pub fn c32_decode(input: &str) -> Result<Vec<u8>> {
    let input = input.to_ascii_uppercase();
    let mut out: Vec<u8> = Vec::with_capacity(input.len() * 5 / 8 + 1);
    let mut carry: u16 = 0;
    let mut carry_bits = 0u32;

    for ch in input.bytes().rev() {
        let value = C32_ALPHABET
            .iter()
            .position(|c| *c == ch)
            .ok_or_else(|| anyhow!("Invalid c32 character: {}", char::from(ch)))?;
        carry |= (value as u16) << carry_bits;
        carry_bits += 5;
        if carry_bits >= 8 {
            out.push((carry & 0xff) as u8);
            carry >>= 8;
            carry_bits -= 8;
        }
    }
    if carry_bits > 0 && carry > 0 {
        out.push(carry as u8);
    }

    while out.last() == Some(&0) {
        out.pop();
    }
    let leading_zero_chars = input.bytes().take_while(|c| *c == b'0').count();
    out.extend(std::iter::repeat(0u8).take(leading_zero_chars));
    out.reverse();

    Ok(out)
}

/// c32check 地址：'S' + 版本字符 + c32(hash160 || checksum)
pub fn c32_address(version: u8, hash160: &[u8; 20]) -> Result<String> {
    if version >= 32 {
        bail!("c32 version must be < 32, got {}", version);
    }

    let mut versioned = Vec::with_capacity(21);
    versioned.push(version);
    versioned.extend_from_slice(hash160);
    let checksum = Sha256::digest(Sha256::digest(&versioned));

    let mut payload = hash160.to_vec();
    payload.extend_from_slice(&checksum[..4]);

    Ok(format!(
        "S{}{}",
        char::from(C32_ALPHABET[version as usize]),
        c32_encode(&payload)
    ))
}

/// 从 Stacks 地址前缀读取版本号（SP=22, ST=26, SM=20, SN=21）
pub fn address_version(stacks_address: &str) -> Result<u8> {
    let mut chars = stacks_address.chars();
    if chars.next() != Some('S') {
        bail!("Stacks address must start with 'S': {}", stacks_address);
    }
    let version_char = chars
        .next()
        .ok_or_else(|| anyhow!("Stacks address too short: {}", stacks_address))?
        .to_ascii_uppercase();

    C32_ALPHABET
        .iter()
        .position(|c| char::from(*c) == version_char)
        .map(|v| v as u8)
        .ok_or_else(|| anyhow!("Invalid Stacks address version: {}", version_char))
}

/// 校验 Stacks 地址格式与 c32check 校验和
pub fn is_valid_address(stacks_address: &str) -> bool {
    let Ok(version) = address_version(stacks_address) else {
        return false;
    };
    let Some(body) = stacks_address.get(2..) else {
        return false;
    };
    let Ok(payload) = c32_decode(body) else {
        return false;
    };
    if payload.len() != 24 {
        return false;
    }
    let Ok(hash160) = <[u8; 20]>::try_from(&payload[..20]) else {
        return false;
    };

    // 重新编码后与原地址一致，即校验和正确
    c32_address(version, &hash160)
        .map(|encoded| encoded == stacks_address.to_ascii_uppercase())
        .unwrap_or(false)
}

/// 由公钥推导 Stacks 地址
pub fn address_from_public_key(public_key_hex: &str, version: u8) -> Result<String> {
    let bytes = hex::decode(strip_hex_prefix(public_key_hex.trim()))?;
    VerifyingKey::from_sec1_bytes(&bytes).map_err(|_| anyhow!("Invalid secp256k1 public key"))?;

    let digest = hash160::Hash::hash(&bytes).to_byte_array();
    c32_address(version, &digest)
}

/// 公钥是否属于给定 Stacks 地址
pub fn public_key_matches_address(public_key_hex: &str, stacks_address: &str) -> bool {
    let Ok(version) = address_version(stacks_address) else {
        return false;
    };
    match address_from_public_key(public_key_hex, version) {
        Ok(derived) => derived.eq_ignore_ascii_case(stacks_address),
        Err(_) => false,
    }
}
