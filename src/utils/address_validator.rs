//! 地址验证模块
//!
//! 绑定前的格式校验：只拒绝明显不合法的地址，地址归属由签名证明。

use std::str::FromStr;

use crate::{domain::Chain, security::signature::stacks};

/// 地址验证器
pub struct AddressValidator;

impl AddressValidator {
    /// 验证链上地址格式
    pub fn validate(chain: Chain, address: &str) -> bool {
        match chain {
            Chain::Btc => Self::validate_bitcoin_address(address),
            Chain::Eth => Self::validate_evm_address(address),
            Chain::Sol => Self::validate_solana_address(address),
        }
    }

    /// 地址的规范形式（唯一性与查找都基于规范形式）
    ///
    /// ETH 统一为小写十六进制；BTC bech32 / bech32m 统一为小写；
    /// base58 地址（SOL、BTC P2PKH / P2SH）大小写敏感，原样保留
    pub fn canonicalize(chain: Chain, address: &str) -> String {
        let address = address.trim();
        match chain {
            Chain::Eth => address.to_ascii_lowercase(),
            Chain::Btc if Self::is_bech32_bitcoin(address) => address.to_ascii_lowercase(),
            Chain::Btc | Chain::Sol => address.to_string(),
        }
    }

    fn is_bech32_bitcoin(address: &str) -> bool {
        let lower = address.to_ascii_lowercase();
        ["bc1", "tb1", "bcrt1"]
            .iter()
            .any(|hrp| lower.starts_with(hrp))
    }

    /// 验证 Stacks 地址（域名所有者）
    pub fn validate_stacks_address(address: &str) -> bool {
        stacks::is_valid_address(address)
    }

    /// 验证EVM地址（支持EIP-55 Checksum）
    fn validate_evm_address(address: &str) -> bool {
        let Some(hex_part) = address.strip_prefix("0x") else {
            return false;
        };
        if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }

        // 全小写/全大写不带校验和；大小写混合时必须满足 EIP-55
        let has_upper = hex_part.chars().any(|c| c.is_ascii_uppercase());
        let has_lower = hex_part.chars().any(|c| c.is_ascii_lowercase());
        if has_upper && has_lower {
            return Self::verify_eip55_checksum(hex_part);
        }

        true
    }

    /// 验证EIP-55 Checksum
    /// https://eips.ethereum.org/EIPS/eip-55
    fn verify_eip55_checksum(hex_part: &str) -> bool {
        use sha3::{Digest, Keccak256};

        let hash = Keccak256::digest(hex_part.to_lowercase().as_bytes());

        hex_part.chars().enumerate().all(|(i, ch)| {
            if !ch.is_ascii_alphabetic() {
                return true;
            }
            let hash_byte = hash[i / 2];
            let hash_nibble = if i % 2 == 0 {
                hash_byte >> 4
            } else {
                hash_byte & 0x0f
            };
            ch.is_ascii_uppercase() == (hash_nibble >= 8)
        })
    }

    /// 验证Solana地址（Base58编码，32字节）
    fn validate_solana_address(address: &str) -> bool {
        if address.len() < 32 || address.len() > 44 {
            return false;
        }

        match bs58::decode(address).into_vec() {
            Ok(decoded) => decoded.len() == 32,
            Err(_) => false,
        }
    }

    /// 验证Bitcoin地址
    ///
    /// P2PKH / P2SH（base58check）与 SegWit / Taproot（bech32 / bech32m），主网与测试网均可
    fn validate_bitcoin_address(address: &str) -> bool {
        bitcoin::Address::from_str(address).is_ok()
    }
}
